//! Connection directory
//!
//! Durable mapping from connection identifier to connection metadata.
//! The directory is the system-of-record for broadcast membership: a
//! record exists if and only if the relay believes that connection is
//! reachable. It may briefly lag transport reality; a dropped connection
//! lingers until a disconnect event or a failed delivery reaps it.

use async_trait::async_trait;
use dashmap::DashMap;

use crate::error::DirectoryError;
use crate::types::{ConnectionId, ANONYMOUS};

/// One directory entry: a connected client and its metadata
///
/// Holds the transport-assigned id and the optional display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionRecord {
    /// Unique identifier for this connection
    pub id: ConnectionId,
    /// Display name (None until the client identifies itself)
    pub name: Option<String>,
}

impl ConnectionRecord {
    /// Create a record for a connection that has not identified yet
    pub fn new(id: ConnectionId) -> Self {
        Self { id, name: None }
    }

    /// Create a record carrying a display name
    pub fn named(id: ConnectionId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: Some(name.into()),
        }
    }

    /// Get the display name for this connection
    ///
    /// Returns the name if set, otherwise "Anonymous".
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(ANONYMOUS)
    }
}

/// Directory contract: point-write, point-delete, full-scan
///
/// The trait is the stable interface; the backing store is swappable
/// (any point-write/point-delete/full-scan capable store suffices).
/// No multi-record transaction exists: every mutation is a single-key
/// upsert or delete, and racing writers for the same id converge.
#[async_trait]
pub trait ConnectionDirectory: Send + Sync {
    /// Insert or overwrite the record for `record.id`
    ///
    /// Idempotent by id: at most one record per id exists afterwards.
    async fn upsert(&self, record: ConnectionRecord) -> Result<(), DirectoryError>;

    /// Remove the record for `id` if present
    ///
    /// Deleting an absent id is a no-op, not an error.
    async fn delete(&self, id: ConnectionId) -> Result<(), DirectoryError>;

    /// Snapshot of all current records
    ///
    /// Unordered, point-in-time. Eventual consistency with recent writes
    /// is sufficient; stale entries self-heal through the reaping path.
    async fn list_all(&self) -> Result<Vec<ConnectionRecord>, DirectoryError>;
}

/// In-process directory backend
///
/// Keeps records in a concurrent map. Suits a single-node relay; swapping
/// in a durable store only means implementing [`ConnectionDirectory`]
/// against it.
#[derive(Debug, Default)]
pub struct MemoryDirectory {
    records: DashMap<ConnectionId, ConnectionRecord>,
}

impl MemoryDirectory {
    /// Create an empty directory
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConnectionDirectory for MemoryDirectory {
    async fn upsert(&self, record: ConnectionRecord) -> Result<(), DirectoryError> {
        self.records.insert(record.id, record);
        Ok(())
    }

    async fn delete(&self, id: ConnectionId) -> Result<(), DirectoryError> {
        self.records.remove(&id);
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<ConnectionRecord>, DirectoryError> {
        Ok(self
            .records
            .iter()
            .map(|entry| entry.value().clone())
            .collect())
    }
}
