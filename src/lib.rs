//! Broadcast WebSocket Chat Relay Library
//!
//! Relays chat messages among a dynamic set of concurrently connected
//! clients over long-lived WebSocket connections, built with
//! tokio-tungstenite.
//!
//! # Features
//! - Connection directory tracking every live connection and its name
//! - Concurrent fanout broadcast with best-effort delivery
//! - Stale-connection reaping driven by delivery failures
//! - Join notices and member-list snapshots on identify
//! - Chat relay with Anonymous fallback for unidentified senders
//!
//! # Architecture
//! The core is a pair of primitives plus a state machine:
//! - `ConnectionDirectory` is the system-of-record for who receives
//!   broadcasts (in-memory by default, swappable for any durable
//!   point-write/point-delete/full-scan store)
//! - `DeliveryChannel` pushes one payload to one connection and
//!   classifies failures as gone or transient
//! - `Broadcaster` fans a payload out over a directory snapshot and
//!   reaps gone targets
//! - `SessionHandler` reacts to connect/disconnect/identify/sendMessage
//!   events, with all collaborators injected at construction
//!
//! # Example
//! ```ignore
//! use std::sync::Arc;
//! use tokio::net::TcpListener;
//! use chat_relay::{
//!     handle_connection, Broadcaster, ChannelRegistry, ConnectionDirectory,
//!     MemoryDirectory, SessionHandler,
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     let listener = TcpListener::bind("127.0.0.1:8080").await.unwrap();
//!     let directory: Arc<dyn ConnectionDirectory> = Arc::new(MemoryDirectory::new());
//!     let registry = Arc::new(ChannelRegistry::new());
//!     let broadcaster = Broadcaster::new(directory.clone(), registry.clone());
//!     let session = Arc::new(SessionHandler::new(directory, broadcaster));
//!
//!     while let Ok((stream, _)) = listener.accept().await {
//!         tokio::spawn(handle_connection(stream, session.clone(), registry.clone()));
//!     }
//! }
//! ```

pub mod broadcast;
pub mod delivery;
pub mod directory;
pub mod error;
pub mod handler;
pub mod message;
pub mod session;
pub mod types;

// Re-export main types for convenience
pub use broadcast::Broadcaster;
pub use delivery::{ChannelRegistry, DeliveryChannel, DeliveryStatus};
pub use directory::{ConnectionDirectory, ConnectionRecord, MemoryDirectory};
pub use error::{DirectoryError, RelayError};
pub use handler::handle_connection;
pub use message::{ClientMessage, ServerMessage};
pub use session::{EventOutcome, SessionEvent, SessionHandler};
pub use types::{ConnectionId, ANONYMOUS};
