//! Message protocol definitions
//!
//! JSON-based wire protocol. Inbound frames are routed by an `action`
//! tag; outbound payloads are plain objects whose shape identifies them
//! (`{"systemMessage"}`, `{"members"}`, `{"from","message"}`).

use serde::{Deserialize, Serialize};

/// Client → Server message
///
/// All messages from client to server. Routed by the `action` field with
/// camelCase naming. Frames whose action is missing or unrecognized fail
/// to parse and are surfaced as an unknown route.
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Set the sender's display name
    SetName {
        /// Missing name falls back to "Anonymous"
        #[serde(default)]
        name: Option<String>,
    },
    /// Send a chat message to all members
    SendMessage {
        /// Missing message defaults to empty and is rejected by validation
        #[serde(default)]
        message: String,
    },
}

/// Server → Client payload
///
/// Broadcast and reply payloads. Serialized untagged: each variant's
/// field set is its wire shape.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ServerMessage {
    /// System notice, e.g. a join announcement
    #[serde(rename_all = "camelCase")]
    System { system_message: String },
    /// Full member-list snapshot
    Members { members: Vec<String> },
    /// Chat message relayed from one member to everyone
    Chat { from: String, message: String },
    /// Direct error reply to a single connection (never broadcast)
    Error { error: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_name_deserialize() {
        let json = r#"{"action": "setName", "name": "Alice"}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        match msg {
            ClientMessage::SetName { name } => assert_eq!(name.as_deref(), Some("Alice")),
            _ => panic!("Wrong variant"),
        }
    }

    #[test]
    fn test_set_name_without_name() {
        let json = r#"{"action": "setName"}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        match msg {
            ClientMessage::SetName { name } => assert!(name.is_none()),
            _ => panic!("Wrong variant"),
        }
    }

    #[test]
    fn test_send_message_defaults_empty() {
        let json = r#"{"action": "sendMessage"}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        match msg {
            ClientMessage::SendMessage { message } => assert_eq!(message, ""),
            _ => panic!("Wrong variant"),
        }
    }

    #[test]
    fn test_unknown_action_fails() {
        let json = r#"{"action": "teleport"}"#;
        assert!(serde_json::from_str::<ClientMessage>(json).is_err());
    }

    #[test]
    fn test_system_message_serialize() {
        let msg = ServerMessage::System {
            system_message: "Alice joined the chat".to_string(),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"systemMessage":"Alice joined the chat"}"#);
    }

    #[test]
    fn test_members_serialize() {
        let msg = ServerMessage::Members {
            members: vec!["Alice".to_string(), "Anonymous".to_string()],
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"members":["Alice","Anonymous"]}"#);
    }

    #[test]
    fn test_chat_serialize() {
        let msg = ServerMessage::Chat {
            from: "Alice".to_string(),
            message: "hi".to_string(),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"from":"Alice","message":"hi"}"#);
    }
}
