//! Delivery channel
//!
//! The single-target push primitive: send one payload to one addressed
//! connection and classify the result. The three-way classification is
//! what keeps stale-connection reaping correct: `Gone` comes from the
//! transport's own "recipient no longer exists" signal, never from
//! generic error detection, so live connections are never evicted on a
//! transient hiccup and dead ones never linger.

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::mpsc;

use crate::message::ServerMessage;
use crate::types::ConnectionId;

/// Per-connection outbound channel capacity
const OUTBOUND_BUFFER: usize = 32;

/// Outcome of one delivery attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryStatus {
    /// Payload handed off to the connection
    Delivered,
    /// The connection no longer exists; the caller must reap its
    /// directory record
    Gone,
    /// Delivery failed for a reason other than "connection gone";
    /// the target may still be reachable and must not be reaped
    Transient(String),
}

/// Push primitive over the transport's per-connection channel
///
/// Every call settles to one of the three [`DeliveryStatus`] outcomes;
/// there is no separate error path.
#[async_trait]
pub trait DeliveryChannel: Send + Sync {
    /// Attempt delivery of `payload` to the connection `id`
    async fn send(&self, id: ConnectionId, payload: &ServerMessage) -> DeliveryStatus;
}

/// Registry of outbound senders, one per live connection
///
/// The transport shell registers a sender at accept time and unregisters
/// it when the connection task ends. Classification:
/// - no sender registered: the connection was torn down (`Gone`)
/// - receiver dropped: the write task is dead (`Gone`)
/// - buffer full: slow consumer, possibly still live (`Transient`)
#[derive(Debug, Default)]
pub struct ChannelRegistry {
    senders: DashMap<ConnectionId, mpsc::Sender<ServerMessage>>,
}

impl ChannelRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new connection, returning the receiving end of its
    /// outbound channel for the write task to drain
    pub fn register(&self, id: ConnectionId) -> mpsc::Receiver<ServerMessage> {
        let (tx, rx) = mpsc::channel(OUTBOUND_BUFFER);
        self.senders.insert(id, tx);
        rx
    }

    /// Drop the outbound sender for a closed connection
    pub fn unregister(&self, id: ConnectionId) {
        self.senders.remove(&id);
    }

    /// Number of registered connections
    pub fn len(&self) -> usize {
        self.senders.len()
    }

    /// Whether no connections are registered
    pub fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }
}

#[async_trait]
impl DeliveryChannel for ChannelRegistry {
    async fn send(&self, id: ConnectionId, payload: &ServerMessage) -> DeliveryStatus {
        let Some(sender) = self.senders.get(&id) else {
            return DeliveryStatus::Gone;
        };

        match sender.try_send(payload.clone()) {
            Ok(()) => DeliveryStatus::Delivered,
            Err(mpsc::error::TrySendError::Closed(_)) => DeliveryStatus::Gone,
            Err(mpsc::error::TrySendError::Full(_)) => {
                DeliveryStatus::Transient("outbound buffer full".to_string())
            }
        }
    }
}
