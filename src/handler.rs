//! WebSocket connection handler
//!
//! Handles individual client connections: WebSocket handshake, frame
//! parsing, event dispatch into the session handler, and the write task
//! that drains this connection's outbound channel.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

use crate::delivery::{ChannelRegistry, DeliveryChannel};
use crate::error::RelayError;
use crate::message::{ClientMessage, ServerMessage};
use crate::session::{EventOutcome, SessionEvent, SessionHandler};
use crate::types::{ConnectionId, ANONYMOUS};

/// Handle a new TCP connection
///
/// Performs the WebSocket handshake, assigns the connection identifier,
/// registers the outbound channel, and runs the connection's read and
/// write tasks until either side closes.
pub async fn handle_connection(
    stream: TcpStream,
    session: Arc<SessionHandler>,
    registry: Arc<ChannelRegistry>,
) -> Result<(), RelayError> {
    let peer_addr = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    debug!("New TCP connection from {}", peer_addr);

    // WebSocket handshake
    let ws_stream = tokio_tungstenite::accept_async(stream).await?;
    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    // The transport assigns the identifier before the core sees the session
    let id = ConnectionId::new();
    info!("Client {} connected from {}", id, peer_addr);

    // Outbound channel: fanout deliveries land here, the write task drains
    let mut msg_rx = registry.register(id);

    if let Err(e) = session.handle(id, SessionEvent::Connect).await {
        error!("Failed to register client {}: {}", id, e);
        registry.unregister(id);
        return Err(e);
    }

    // Spawn read task (WebSocket frame -> SessionEvent)
    let session_read = session.clone();
    let registry_read = registry.clone();
    let read_task = tokio::spawn(async move {
        while let Some(msg_result) = ws_receiver.next().await {
            match msg_result {
                Ok(Message::Text(text)) => {
                    let event = parse_event(&text);
                    match session_read.handle(id, event).await {
                        Ok(EventOutcome::Ok) => {}
                        Ok(EventOutcome::InvalidInput(reason)) => {
                            // Surfaced to the offending client only
                            let _ = registry_read
                                .send(id, &ServerMessage::Error { error: reason })
                                .await;
                        }
                        Err(e) => {
                            error!("Event from {} failed: {}", id, e);
                            let _ = registry_read
                                .send(
                                    id,
                                    &ServerMessage::Error {
                                        error: "Internal server error".to_string(),
                                    },
                                )
                                .await;
                        }
                    }
                }
                Ok(Message::Close(_)) => {
                    debug!("Client {} sent close frame", id);
                    break;
                }
                Ok(Message::Ping(_)) => {
                    // Pong is handled automatically by tungstenite
                    debug!("Ping from {}", id);
                }
                Ok(Message::Pong(_)) => {
                    debug!("Pong from {}", id);
                }
                Ok(_) => {
                    // Binary or other message types - ignore
                }
                Err(e) => {
                    error!("WebSocket error for {}: {}", id, e);
                    break;
                }
            }
        }
        debug!("Read task ended for {}", id);
    });

    // Spawn write task (outbound channel -> WebSocket)
    let write_task = tokio::spawn(async move {
        while let Some(msg) = msg_rx.recv().await {
            match serde_json::to_string(&msg) {
                Ok(json) => {
                    if ws_sender.send(Message::Text(json.into())).await.is_err() {
                        debug!("WebSocket send failed, ending write task");
                        break;
                    }
                }
                Err(e) => {
                    error!("Failed to serialize message: {}", e);
                    // Continue - don't break on serialization errors
                }
            }
        }
        debug!("Write task ended for {}", id);

        // Send close frame when done
        let _ = ws_sender.close().await;
    });

    // Wait for either task to complete
    tokio::select! {
        _ = read_task => {
            debug!("Read task completed for {}", id);
        }
        _ = write_task => {
            debug!("Write task completed for {}", id);
        }
    }

    // Tear down the push channel, then let the directory catch up
    registry.unregister(id);
    if let Err(e) = session.handle(id, SessionEvent::Disconnect).await {
        warn!("Disconnect cleanup for {} failed: {}", id, e);
    }

    info!("Client {} disconnected", id);

    Ok(())
}

/// Map an inbound text frame to a session event
///
/// Frames whose action is unrecognized (or that are not valid JSON at
/// all) become `Unknown` so the session handler reports the invalid
/// route. An absent or empty name on setName falls back to "Anonymous",
/// so identify always carries a usable display name.
fn parse_event(text: &str) -> SessionEvent {
    match serde_json::from_str::<ClientMessage>(text) {
        Ok(ClientMessage::SetName { name }) => SessionEvent::Identify {
            name: name
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| ANONYMOUS.to_string()),
        },
        Ok(ClientMessage::SendMessage { message }) => SessionEvent::SendMessage { text: message },
        Err(_) => {
            let route = serde_json::from_str::<serde_json::Value>(text)
                .ok()
                .and_then(|v| {
                    v.get("action")
                        .and_then(|a| a.as_str())
                        .map(str::to_string)
                })
                .unwrap_or_default();
            SessionEvent::Unknown { route }
        }
    }
}
