//! Graceful shutdown
//!
//! The controller owns the root cancellation token. Components take child
//! tokens (the artifact janitor does, so pending deletions stop with the
//! process) and in-flight requests hold a [`TaskGuard`] that shutdown waits
//! for, up to a timeout.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Notify};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// How long in-flight requests get to finish
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Shutdown phases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownPhase {
    /// Serving requests
    Running,
    /// No new work is accepted
    Stopping,
    /// Waiting for in-flight requests
    Draining,
    /// Drain timed out
    Terminating,
    /// Done
    Terminated,
}

impl std::fmt::Display for ShutdownPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Draining => "draining",
            Self::Terminating => "terminating",
            Self::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

/// Coordinates shutdown of the server, the janitor and in-flight requests
pub struct ShutdownController {
    cancel_token: CancellationToken,
    phase: watch::Sender<ShutdownPhase>,
    initiated: AtomicBool,
    active_tasks: AtomicU32,
    drained: Notify,
    timeout: Duration,
}

impl ShutdownController {
    /// Controller with the default drain timeout
    #[must_use]
    pub fn new() -> Arc<Self> {
        Self::with_timeout(DEFAULT_SHUTDOWN_TIMEOUT)
    }

    /// Controller with a custom drain timeout
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Arc<Self> {
        let (phase, _) = watch::channel(ShutdownPhase::Running);
        Arc::new(Self {
            cancel_token: CancellationToken::new(),
            phase,
            initiated: AtomicBool::new(false),
            active_tasks: AtomicU32::new(0),
            drained: Notify::new(),
            timeout,
        })
    }

    /// Child token, cancelled when draining starts
    #[must_use]
    pub fn token(&self) -> CancellationToken {
        self.cancel_token.child_token()
    }

    /// Watch phase changes
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ShutdownPhase> {
        self.phase.subscribe()
    }

    /// Current phase
    #[must_use]
    pub fn phase(&self) -> ShutdownPhase {
        *self.phase.borrow()
    }

    /// Shutdown has been requested
    #[must_use]
    pub fn is_shutting_down(&self) -> bool {
        self.initiated.load(Ordering::SeqCst)
    }

    /// New requests are still welcome
    #[must_use]
    pub fn is_accepting_work(&self) -> bool {
        self.phase() == ShutdownPhase::Running
    }

    /// Track an in-flight request until the guard drops
    #[must_use]
    pub fn register_task(self: &Arc<Self>) -> TaskGuard {
        self.active_tasks.fetch_add(1, Ordering::SeqCst);
        TaskGuard {
            controller: Arc::clone(self),
        }
    }

    /// In-flight requests
    #[must_use]
    pub fn active_task_count(&self) -> u32 {
        self.active_tasks.load(Ordering::SeqCst)
    }

    fn set_phase(&self, phase: ShutdownPhase) {
        self.phase.send_replace(phase);
        info!(phase = %phase, "Shutdown phase changed");
    }

    fn finish_task(&self) {
        if self.active_tasks.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.drained.notify_waiters();
        }
    }

    async fn wait_drained(&self) {
        loop {
            let notified = self.drained.notified();
            if self.active_task_count() == 0 {
                return;
            }
            notified.await;
        }
    }

    /// Stop accepting work, cancel background timers, wait for in-flight
    /// requests up to the timeout. Only the first call does anything.
    pub async fn shutdown(&self) {
        if self
            .initiated
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Shutdown already initiated");
            return;
        }

        info!("Initiating graceful shutdown");
        self.set_phase(ShutdownPhase::Stopping);

        self.set_phase(ShutdownPhase::Draining);
        self.cancel_token.cancel();

        match tokio::time::timeout(self.timeout, self.wait_drained()).await {
            Ok(()) => info!("All requests completed"),
            Err(_) => {
                warn!(
                    active_tasks = self.active_task_count(),
                    timeout_secs = self.timeout.as_secs(),
                    "Drain timed out"
                );
                self.set_phase(ShutdownPhase::Terminating);
            }
        }

        self.set_phase(ShutdownPhase::Terminated);
    }

    /// Cancel everything without draining
    pub fn force_shutdown(&self) {
        if self
            .initiated
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            warn!("Force shutdown initiated");
            self.set_phase(ShutdownPhase::Terminating);
            self.cancel_token.cancel();
            self.set_phase(ShutdownPhase::Terminated);
        }
    }
}

/// Keeps an in-flight request counted until dropped
pub struct TaskGuard {
    controller: Arc<ShutdownController>,
}

impl TaskGuard {
    /// Shutdown has started draining
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.controller.cancel_token.is_cancelled()
    }
}

impl Drop for TaskGuard {
    fn drop(&mut self) {
        self.controller.finish_task();
    }
}

/// Resolves on Ctrl+C or SIGTERM
///
/// A handler that cannot be installed is logged and that signal ignored.
pub async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}

/// Signal future for `axum::serve(..).with_graceful_shutdown`
pub async fn shutdown_signal_with_controller(controller: Arc<ShutdownController>) {
    wait_for_shutdown_signal().await;
    controller.shutdown().await;
}
