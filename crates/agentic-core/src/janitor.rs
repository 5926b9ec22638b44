//! Deferred deletion of uploaded artifacts
//!
//! Generated documents are public only for a short window. Each upload
//! schedules a delete that can be cancelled by key or, through the parent
//! token, by process shutdown. Deletion is best-effort: failures are logged
//! and never reach the request that scheduled them.

use agentic_tools::ObjectStorage;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Default lifetime of an uploaded artifact
pub const DEFAULT_ARTIFACT_TTL: Duration = Duration::from_secs(600);

struct PendingDeletion {
    generation: u64,
    token: CancellationToken,
}

/// Cancellable scheduled deletions, keyed by storage key
pub struct ArtifactJanitor {
    storage: Arc<dyn ObjectStorage>,
    pending: Arc<DashMap<String, PendingDeletion>>,
    parent: CancellationToken,
    generation: AtomicU64,
}

impl ArtifactJanitor {
    /// Create a janitor whose timers die with `parent`
    #[must_use]
    pub fn new(storage: Arc<dyn ObjectStorage>, parent: CancellationToken) -> Self {
        Self {
            storage,
            pending: Arc::new(DashMap::new()),
            parent,
            generation: AtomicU64::new(0),
        }
    }

    /// Delete `key` after `delay`
    ///
    /// Scheduling a key that is already pending restarts its timer.
    pub fn schedule_deletion(&self, key: impl Into<String>, delay: Duration) {
        let key = key.into();
        let token = self.parent.child_token();
        let generation = self.generation.fetch_add(1, Ordering::Relaxed);

        if let Some(previous) = self.pending.insert(
            key.clone(),
            PendingDeletion {
                generation,
                token: token.clone(),
            },
        ) {
            previous.token.cancel();
        }

        let storage = Arc::clone(&self.storage);
        let pending = Arc::clone(&self.pending);
        debug!(key = %key, delay_secs = delay.as_secs(), "Scheduled artifact deletion");

        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    debug!(key = %key, "Artifact deletion cancelled");
                }
                _ = tokio::time::sleep(delay) => {
                    match storage.delete(&key).await {
                        Ok(()) => info!(key = %key, "Deleted expired artifact"),
                        Err(e) => warn!(key = %key, error = %e, "Failed to delete expired artifact"),
                    }
                }
            }
            pending.remove_if(&key, |_, entry| entry.generation == generation);
        });
    }

    /// Cancel a pending deletion; `false` when nothing was pending
    pub fn cancel(&self, key: &str) -> bool {
        match self.pending.remove(key) {
            Some((_, entry)) => {
                entry.token.cancel();
                true
            }
            None => false,
        }
    }

    /// Keys still waiting for deletion, sorted
    #[must_use]
    pub fn pending(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.pending.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }

    /// Cancel every outstanding timer
    pub fn shutdown(&self) {
        let count = self.pending.len();
        for entry in self.pending.iter() {
            entry.token.cancel();
        }
        self.pending.clear();
        if count > 0 {
            info!(count, "Cancelled pending artifact deletions");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentic_tools::Result as ToolResult;
    use std::path::Path;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingStorage {
        deleted: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait::async_trait]
    impl ObjectStorage for RecordingStorage {
        async fn upload(&self, _path: &Path, key: &str) -> ToolResult<String> {
            Ok(format!("https://cdn.test/{key}"))
        }

        async fn delete(&self, key: &str) -> ToolResult<()> {
            self.deleted.lock().unwrap().push(key.to_string());
            if self.fail {
                return Err(agentic_tools::Error::Network("down".into()));
            }
            Ok(())
        }
    }

    async fn settle() {
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_deletes_after_delay() {
        let storage = Arc::new(RecordingStorage::default());
        let janitor = ArtifactJanitor::new(storage.clone(), CancellationToken::new());

        janitor.schedule_deletion("resume/u1/a.pdf", Duration::from_secs(600));
        assert_eq!(janitor.pending(), vec!["resume/u1/a.pdf"]);

        tokio::time::sleep(Duration::from_secs(599)).await;
        settle().await;
        assert!(storage.deleted.lock().unwrap().is_empty());

        tokio::time::sleep(Duration::from_secs(2)).await;
        settle().await;
        assert_eq!(*storage.deleted.lock().unwrap(), vec!["resume/u1/a.pdf"]);
        assert!(janitor.pending().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_by_key() {
        let storage = Arc::new(RecordingStorage::default());
        let janitor = ArtifactJanitor::new(storage.clone(), CancellationToken::new());

        janitor.schedule_deletion("a.pdf", Duration::from_secs(10));
        assert!(janitor.cancel("a.pdf"));
        assert!(!janitor.cancel("a.pdf"));

        tokio::time::sleep(Duration::from_secs(20)).await;
        settle().await;
        assert!(storage.deleted.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_parent_cancellation_stops_timers() {
        let storage = Arc::new(RecordingStorage::default());
        let parent = CancellationToken::new();
        let janitor = ArtifactJanitor::new(storage.clone(), parent.clone());

        janitor.schedule_deletion("a.pdf", Duration::from_secs(10));
        janitor.schedule_deletion("b.pdf", Duration::from_secs(10));
        parent.cancel();
        settle().await;

        tokio::time::sleep(Duration::from_secs(20)).await;
        settle().await;
        assert!(storage.deleted.lock().unwrap().is_empty());
        assert!(janitor.pending().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reschedule_restarts_timer() {
        let storage = Arc::new(RecordingStorage::default());
        let janitor = ArtifactJanitor::new(storage.clone(), CancellationToken::new());

        janitor.schedule_deletion("a.pdf", Duration::from_secs(10));
        tokio::time::sleep(Duration::from_secs(5)).await;
        janitor.schedule_deletion("a.pdf", Duration::from_secs(10));

        tokio::time::sleep(Duration::from_secs(6)).await;
        settle().await;
        assert!(storage.deleted.lock().unwrap().is_empty());
        assert_eq!(janitor.pending(), vec!["a.pdf"]);

        tokio::time::sleep(Duration::from_secs(5)).await;
        settle().await;
        assert_eq!(storage.deleted.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_failure_is_swallowed() {
        let storage = Arc::new(RecordingStorage {
            fail: true,
            ..RecordingStorage::default()
        });
        let janitor = ArtifactJanitor::new(storage.clone(), CancellationToken::new());

        janitor.schedule_deletion("a.pdf", Duration::from_secs(1));
        tokio::time::sleep(Duration::from_secs(2)).await;
        settle().await;
        assert_eq!(storage.deleted.lock().unwrap().len(), 1);
        assert!(janitor.pending().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancels_everything() {
        let storage = Arc::new(RecordingStorage::default());
        let janitor = ArtifactJanitor::new(storage.clone(), CancellationToken::new());

        janitor.schedule_deletion("a.pdf", Duration::from_secs(10));
        janitor.shutdown();
        assert!(janitor.pending().is_empty());

        tokio::time::sleep(Duration::from_secs(20)).await;
        settle().await;
        assert!(storage.deleted.lock().unwrap().is_empty());
    }
}
