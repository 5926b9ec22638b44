//! Background task startup functions

use agentic_core::{MemoryConversationStore, ShutdownController};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Periodically drop expired conversations from the memory store
///
/// The Redis store expires keys on its own and needs no sweeper.
pub fn start_conversation_cleanup_task(
    store: Arc<MemoryConversationStore>,
    interval: Duration,
    shutdown_controller: &ShutdownController,
) -> JoinHandle<()> {
    let cleanup_shutdown = shutdown_controller.token();
    let handle = tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = tokio::time::sleep(interval) => {
                    let removed = store.cleanup_expired().await;
                    if removed > 0 {
                        info!(removed, "Cleanup: dropped expired conversations");
                    } else {
                        debug!("Cleanup: no expired conversations");
                    }
                }
                _ = cleanup_shutdown.cancelled() => {
                    info!("Conversation cleanup task shutting down");
                    break;
                }
            }
        }
    });
    info!(interval_secs = interval.as_secs(), "Conversation cleanup task started");
    handle
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentic_core::{ConversationKind, ConversationState, ConversationStep, ConversationStore};

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_task_sweeps_and_stops() {
        let store = Arc::new(MemoryConversationStore::new_unsafe().with_ttl(Duration::from_secs(5)));
        let mut state =
            ConversationState::new("u1", ConversationKind::Resume, ConversationStep::Second);
        state.updated_at = chrono::Utc::now() - chrono::Duration::seconds(60);
        store.put(&state).await.unwrap();

        let controller = ShutdownController::new();
        let handle =
            start_conversation_cleanup_task(store.clone(), Duration::from_secs(1), &controller);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(store.cleanup_expired().await, 0);

        controller.shutdown().await;
        handle.await.unwrap();
    }
}
