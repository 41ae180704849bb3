//! Periodic background sweep of expired sessions.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use session_guard_seaorm::{CleanupTask, MemoryStore, SessionConfig, SessionManager};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() {
//! let config = SessionConfig::default();
//! let period = config.cleanup_interval();
//! let manager = Arc::new(SessionManager::new(Arc::new(MemoryStore::new()), config));
//!
//! let shutdown = CancellationToken::new();
//! let handle = CleanupTask::spawn(manager, period, shutdown.clone());
//!
//! // ... on shutdown
//! shutdown.cancel();
//! let _ = handle.await;
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::manager::SessionManager;

/// Runs [`SessionManager::cleanup_expired_sessions`] on a fixed period.
#[derive(Debug)]
pub struct CleanupTask;

impl CleanupTask {
    /// Spawns the sweep loop onto the current Tokio runtime.
    ///
    /// The first sweep runs immediately. The loop exits once `cancel` fires.
    pub fn spawn(
        manager: Arc<SessionManager>,
        period: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(Self::run(manager, period, cancel))
    }

    /// The sweep loop itself, for callers that manage their own tasks.
    pub async fn run(manager: Arc<SessionManager>, period: Duration, cancel: CancellationToken) {
        info!(
            interval_secs = period.as_secs(),
            "Session cleanup task started"
        );

        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Session cleanup task stopping");
                    break;
                }
                _ = interval.tick() => {
                    // Failures are retried on the next tick
                    if let Err(e) = manager.cleanup_expired_sessions().await {
                        error!(error = %e, "Session cleanup failed");
                    }
                }
            }
        }
    }
}
