//! Basic type definitions for the chat relay
//!
//! Provides the `ConnectionId` newtype: the opaque, transport-assigned
//! identifier for one active client session.

use uuid::Uuid;

/// Display name used wherever a connection has not identified itself.
pub const ANONYMOUS: &str = "Anonymous";

/// Unique connection identifier (newtype pattern)
///
/// Wraps a UUID v4 assigned by the transport layer at accept time,
/// before the core ever sees the connection. Opaque to everything
/// downstream: nothing inspects its structure.
/// Implements Hash and Eq for use as map keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    /// Create a new random connection ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
