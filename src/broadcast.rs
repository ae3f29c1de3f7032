//! Fanout broadcaster
//!
//! Delivers one payload to every directory member concurrently and reaps
//! the targets the transport reports as permanently gone. Failures feed
//! back into the directory, which keeps membership converging on the set
//! of connections that are actually reachable.

use std::sync::Arc;

use futures_util::future::join_all;
use tracing::{debug, warn};

use crate::delivery::{DeliveryChannel, DeliveryStatus};
use crate::directory::ConnectionDirectory;
use crate::error::RelayError;
use crate::message::ServerMessage;

/// Concurrent all-attempted delivery over a directory snapshot
///
/// Collaborators are injected at construction so the broadcaster can be
/// exercised against fakes.
pub struct Broadcaster {
    directory: Arc<dyn ConnectionDirectory>,
    channel: Arc<dyn DeliveryChannel>,
}

impl Broadcaster {
    /// Create a broadcaster over the given directory and delivery channel
    pub fn new(directory: Arc<dyn ConnectionDirectory>, channel: Arc<dyn DeliveryChannel>) -> Self {
        Self { directory, channel }
    }

    /// Deliver `payload` to every current directory member
    ///
    /// Each member in the snapshot gets exactly one delivery attempt,
    /// scheduled concurrently and joined before returning; a slow or
    /// failing target never aborts or delays its siblings, and there is
    /// no global success verdict. Targets classified [`DeliveryStatus::Gone`]
    /// are deleted from the directory; transient failures are logged and
    /// the record kept. An empty snapshot is an immediate no-op.
    ///
    /// Only a directory snapshot failure surfaces as an error.
    pub async fn broadcast(&self, payload: &ServerMessage) -> Result<(), RelayError> {
        let snapshot = self.directory.list_all().await?;
        if snapshot.is_empty() {
            return Ok(());
        }

        debug!("Broadcasting to {} connection(s)", snapshot.len());

        let attempts = snapshot.iter().map(|record| {
            let id = record.id;
            async move { (id, self.channel.send(id, payload).await) }
        });

        for (id, status) in join_all(attempts).await {
            match status {
                DeliveryStatus::Delivered => {}
                DeliveryStatus::Transient(reason) => {
                    warn!("Delivery to {} failed ({}), keeping connection", id, reason);
                }
                DeliveryStatus::Gone => {
                    debug!("Connection {} is stale, deleting", id);
                    // Cleanup is attempted for every gone target; a failed
                    // delete leaves a stale record for the next broadcast
                    // to reap, never fails the broadcast itself
                    if let Err(e) = self.directory.delete(id).await {
                        warn!("Failed to reap stale connection {}: {}", id, e);
                    }
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use dashmap::DashMap;

    use super::*;
    use crate::directory::{ConnectionRecord, MemoryDirectory};
    use crate::error::DirectoryError;
    use crate::types::ConnectionId;

    /// Delivery fake: per-id scripted statuses, records every attempt
    #[derive(Default)]
    struct ScriptedChannel {
        statuses: DashMap<ConnectionId, DeliveryStatus>,
        attempts: Mutex<Vec<ConnectionId>>,
    }

    impl ScriptedChannel {
        fn script(&self, id: ConnectionId, status: DeliveryStatus) {
            self.statuses.insert(id, status);
        }

        fn attempts(&self) -> Vec<ConnectionId> {
            self.attempts.lock().unwrap().clone()
        }

        fn clear(&self) {
            self.attempts.lock().unwrap().clear();
        }
    }

    #[async_trait]
    impl DeliveryChannel for ScriptedChannel {
        async fn send(&self, id: ConnectionId, _payload: &ServerMessage) -> DeliveryStatus {
            self.attempts.lock().unwrap().push(id);
            self.statuses
                .get(&id)
                .map(|s| s.value().clone())
                .unwrap_or(DeliveryStatus::Delivered)
        }
    }

    /// Directory fake whose scan always fails
    struct DownDirectory;

    #[async_trait]
    impl ConnectionDirectory for DownDirectory {
        async fn upsert(&self, _record: ConnectionRecord) -> Result<(), DirectoryError> {
            Err(DirectoryError::Store("store offline".to_string()))
        }

        async fn delete(&self, _id: ConnectionId) -> Result<(), DirectoryError> {
            Err(DirectoryError::Store("store offline".to_string()))
        }

        async fn list_all(&self) -> Result<Vec<ConnectionRecord>, DirectoryError> {
            Err(DirectoryError::Store("store offline".to_string()))
        }
    }

    fn payload() -> ServerMessage {
        ServerMessage::Chat {
            from: "Alice".to_string(),
            message: "hi".to_string(),
        }
    }

    async fn populated(n: usize) -> (Arc<MemoryDirectory>, Vec<ConnectionId>) {
        let dir = Arc::new(MemoryDirectory::new());
        let mut ids = Vec::new();
        for _ in 0..n {
            let id = ConnectionId::new();
            dir.upsert(ConnectionRecord::new(id)).await.unwrap();
            ids.push(id);
        }
        (dir, ids)
    }

    #[tokio::test]
    async fn test_empty_directory_is_noop() {
        let dir = Arc::new(MemoryDirectory::new());
        let channel = Arc::new(ScriptedChannel::default());
        let broadcaster = Broadcaster::new(dir, channel.clone());

        broadcaster.broadcast(&payload()).await.unwrap();

        assert!(channel.attempts().is_empty());
    }

    #[tokio::test]
    async fn test_gone_target_is_reaped_others_delivered() {
        let (dir, ids) = populated(3).await;
        let channel = Arc::new(ScriptedChannel::default());
        channel.script(ids[1], DeliveryStatus::Gone);
        let broadcaster = Broadcaster::new(dir.clone(), channel.clone());

        broadcaster.broadcast(&payload()).await.unwrap();

        // All three attempted exactly once
        let mut attempts = channel.attempts();
        attempts.sort_by_key(|id| id.to_string());
        let mut expected = ids.clone();
        expected.sort_by_key(|id| id.to_string());
        assert_eq!(attempts, expected);

        // Directory shrank by exactly the gone record
        let remaining: Vec<_> = dir.list_all().await.unwrap().iter().map(|r| r.id).collect();
        assert_eq!(remaining.len(), 2);
        assert!(!remaining.contains(&ids[1]));
    }

    #[tokio::test]
    async fn test_second_broadcast_skips_reaped_connection() {
        let (dir, ids) = populated(3).await;
        let channel = Arc::new(ScriptedChannel::default());
        channel.script(ids[0], DeliveryStatus::Gone);
        let broadcaster = Broadcaster::new(dir, channel.clone());

        broadcaster.broadcast(&payload()).await.unwrap();
        channel.clear();

        broadcaster.broadcast(&payload()).await.unwrap();

        let attempts = channel.attempts();
        assert_eq!(attempts.len(), 2);
        assert!(!attempts.contains(&ids[0]));
    }

    #[tokio::test]
    async fn test_transient_failure_keeps_connection() {
        let (dir, ids) = populated(2).await;
        let channel = Arc::new(ScriptedChannel::default());
        channel.script(ids[0], DeliveryStatus::Transient("buffer full".to_string()));
        let broadcaster = Broadcaster::new(dir.clone(), channel.clone());

        broadcaster.broadcast(&payload()).await.unwrap();

        // Both attempted, nothing reaped
        assert_eq!(channel.attempts().len(), 2);
        assert_eq!(dir.list_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_mixed_outcomes_reap_exactly_the_gone_subset() {
        let (dir, ids) = populated(12).await;
        let channel = Arc::new(ScriptedChannel::default());
        let mut gone = Vec::new();
        for (i, id) in ids.iter().enumerate() {
            match i % 3 {
                0 => {} // delivered
                1 => channel.script(*id, DeliveryStatus::Transient("slow".to_string())),
                _ => {
                    channel.script(*id, DeliveryStatus::Gone);
                    gone.push(*id);
                }
            }
        }
        let broadcaster = Broadcaster::new(dir.clone(), channel.clone());

        broadcaster.broadcast(&payload()).await.unwrap();

        // Every connection attempted exactly once
        let attempts = channel.attempts();
        assert_eq!(attempts.len(), ids.len());
        for id in &ids {
            assert_eq!(attempts.iter().filter(|a| *a == id).count(), 1);
        }

        // Exactly the gone subset is absent afterwards
        let remaining: Vec<_> = dir.list_all().await.unwrap().iter().map(|r| r.id).collect();
        assert_eq!(remaining.len(), ids.len() - gone.len());
        for id in &gone {
            assert!(!remaining.contains(id));
        }
    }

    #[tokio::test]
    async fn test_snapshot_failure_propagates() {
        let channel = Arc::new(ScriptedChannel::default());
        let broadcaster = Broadcaster::new(Arc::new(DownDirectory), channel);

        let result = broadcaster.broadcast(&payload()).await;
        assert!(matches!(result, Err(RelayError::Directory(_))));
    }
}
