//! Session event handler
//!
//! The control state machine of the relay: reacts to session events by
//! mutating the connection directory and invoking the fanout broadcaster.
//! State is implicit in directory membership and metadata; the machine is
//! a tagged-variant dispatch with one case per event kind, and every path
//! terminates as ok, invalid input, or internal error.

use std::sync::Arc;

use tracing::{info, warn};

use crate::broadcast::Broadcaster;
use crate::directory::{ConnectionDirectory, ConnectionRecord};
use crate::error::RelayError;
use crate::message::ServerMessage;
use crate::types::{ConnectionId, ANONYMOUS};

/// Inbound session events, one variant per kind the relay reacts to
#[derive(Debug)]
pub enum SessionEvent {
    /// A new connection was accepted by the transport
    Connect,
    /// The connection ended
    Disconnect,
    /// The client supplied or changed its display name
    Identify { name: String },
    /// The client sent a chat message
    SendMessage { text: String },
    /// The transport routed an event kind the relay does not know
    Unknown { route: String },
}

/// Uniform outcome for every handled event
///
/// Internal failures travel separately as `Err(RelayError)`; the caller
/// formats all three outcome classes for the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    /// Event processed
    Ok,
    /// Client-visible validation failure; no state was mutated
    InvalidInput(String),
}

/// Reacts to session events against injected collaborators
///
/// The directory and broadcaster are passed in at construction, never
/// reached through globals, so the handler can be driven with fakes.
pub struct SessionHandler {
    directory: Arc<dyn ConnectionDirectory>,
    broadcaster: Broadcaster,
}

impl SessionHandler {
    /// Create a handler over the given directory and broadcaster
    pub fn new(directory: Arc<dyn ConnectionDirectory>, broadcaster: Broadcaster) -> Self {
        Self {
            directory,
            broadcaster,
        }
    }

    /// Process a single session event
    ///
    /// An event is all-or-nothing with respect to its own directory
    /// mutation; a storage failure aborts it without partial recovery.
    pub async fn handle(
        &self,
        id: ConnectionId,
        event: SessionEvent,
    ) -> Result<EventOutcome, RelayError> {
        match event {
            SessionEvent::Connect => self.handle_connect(id).await,
            SessionEvent::Disconnect => self.handle_disconnect(id).await,
            SessionEvent::Identify { name } => self.handle_identify(id, name).await,
            SessionEvent::SendMessage { text } => self.handle_send_message(id, text).await,
            SessionEvent::Unknown { route } => self.handle_unknown(id, route),
        }
    }

    /// Handle a new connection: record it, announce nothing
    async fn handle_connect(&self, id: ConnectionId) -> Result<EventOutcome, RelayError> {
        self.directory.upsert(ConnectionRecord::new(id)).await?;
        info!("Client {} connected", id);
        Ok(EventOutcome::Ok)
    }

    /// Handle a disconnect: reachability update only
    ///
    /// No leave notice or roster is broadcast; members observe the change
    /// on the next identify-driven roster. Deleting an already-absent id
    /// is a no-op, so disconnect racing a stale-reap converges.
    async fn handle_disconnect(&self, id: ConnectionId) -> Result<EventOutcome, RelayError> {
        self.directory.delete(id).await?;
        info!("Client {} disconnected", id);
        Ok(EventOutcome::Ok)
    }

    /// Handle an identify: store the name, announce the join, rebroadcast
    /// the member list
    async fn handle_identify(
        &self,
        id: ConnectionId,
        name: String,
    ) -> Result<EventOutcome, RelayError> {
        self.directory
            .upsert(ConnectionRecord::named(id, name.clone()))
            .await?;
        info!("Client {} identified as '{}'", id, name);

        self.broadcaster
            .broadcast(&ServerMessage::System {
                system_message: format!("{} joined the chat", name),
            })
            .await?;

        // Fresh snapshot so the roster includes the upsert above
        let members = self
            .directory
            .list_all()
            .await?
            .iter()
            .map(|record| record.display_name().to_string())
            .collect();

        self.broadcaster
            .broadcast(&ServerMessage::Members { members })
            .await?;

        Ok(EventOutcome::Ok)
    }

    /// Handle a chat message: validate, resolve the sender, relay
    async fn handle_send_message(
        &self,
        id: ConnectionId,
        text: String,
    ) -> Result<EventOutcome, RelayError> {
        // Rejected before any directory read or broadcast
        if text.is_empty() {
            return Ok(EventOutcome::InvalidInput("Message required".to_string()));
        }

        // Sender name comes from a snapshot taken at send time; a sender
        // that never identified relays as Anonymous rather than failing
        let snapshot = self.directory.list_all().await?;
        let from = snapshot
            .iter()
            .find(|record| record.id == id)
            .map(|record| record.display_name().to_string())
            .unwrap_or_else(|| ANONYMOUS.to_string());

        info!("{}: {}", from, text);

        self.broadcaster
            .broadcast(&ServerMessage::Chat {
                from,
                message: text,
            })
            .await?;

        Ok(EventOutcome::Ok)
    }

    /// Handle an unrecognized event kind
    fn handle_unknown(
        &self,
        id: ConnectionId,
        route: String,
    ) -> Result<EventOutcome, RelayError> {
        warn!("Unknown route '{}' from {}", route, id);
        Ok(EventOutcome::InvalidInput(format!("Invalid route: {}", route)))
    }
}
