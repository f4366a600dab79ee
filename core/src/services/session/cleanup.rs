//! Session cleanup service for periodic removal of expired session rows
//!
//! Expired rows are already treated as absent by the engine; this removes
//! them physically. Deployments with an external scheduler call
//! [`SessionCleanupService::run_cleanup`] directly, others can start the
//! background task.

use std::sync::Arc;

use se_shared::utils::time::now_millis;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::errors::DomainResult;
use crate::repositories::SessionRepository;

/// Configuration for session cleanup service
#[derive(Debug, Clone)]
pub struct SessionCleanupConfig {
    /// How often the background task runs (in seconds)
    pub interval_seconds: u64,
    /// Whether to enable cleanup
    pub enabled: bool,
}

impl Default for SessionCleanupConfig {
    fn default() -> Self {
        Self {
            interval_seconds: 3600, // Run every hour
            enabled: true,
        }
    }
}

/// Service for deleting expired session rows
pub struct SessionCleanupService<R: SessionRepository + 'static> {
    repository: Arc<R>,
    config: SessionCleanupConfig,
}

impl<R: SessionRepository> SessionCleanupService<R> {
    /// Create a new session cleanup service
    pub fn new(repository: Arc<R>, config: SessionCleanupConfig) -> Self {
        Self { repository, config }
    }

    /// Run a single cleanup cycle
    ///
    /// Storage failures are recorded in the result rather than returned, so
    /// a scheduler keeps running.
    ///
    /// # Returns
    /// * `Ok(CleanupResult)` - Summary of the cycle
    pub async fn run_cleanup(&self) -> DomainResult<CleanupResult> {
        if !self.config.enabled {
            return Ok(CleanupResult::default());
        }

        info!("Starting session cleanup cycle");

        let mut result = CleanupResult::default();

        match self.repository.delete_expired_sessions(now_millis()).await {
            Ok(count) => {
                result.expired_sessions_deleted = count;
                info!("Deleted {} expired sessions", count);
            }
            Err(e) => {
                error!("Failed to cleanup expired sessions: {}", e);
                result.errors.push(format!("Session cleanup error: {}", e));
            }
        }

        Ok(result)
    }

    /// Start the cleanup service as a background task
    ///
    /// Returns `None` when cleanup is disabled.
    pub fn start_background_task(self: Arc<Self>) -> Option<JoinHandle<()>> {
        if !self.config.enabled {
            warn!("Session cleanup service is disabled");
            return None;
        }

        let interval = std::time::Duration::from_secs(self.config.interval_seconds);

        Some(tokio::spawn(async move {
            info!(
                "Session cleanup service started - will run every {} seconds",
                self.config.interval_seconds
            );

            let mut interval_timer = tokio::time::interval(interval);

            loop {
                interval_timer.tick().await;

                match self.run_cleanup().await {
                    Ok(result) => {
                        if !result.errors.is_empty() {
                            warn!("Cleanup completed with errors: {:?}", result.errors);
                        }
                    }
                    Err(e) => {
                        error!("Session cleanup cycle failed: {}", e);
                    }
                }
            }
        }))
    }
}

/// Result of a cleanup operation
#[derive(Debug, Default)]
pub struct CleanupResult {
    /// Number of expired session rows deleted
    pub expired_sessions_deleted: u64,
    /// Any errors encountered during cleanup
    pub errors: Vec<String>,
}

impl CleanupResult {
    /// Check if the cleanup was successful (no errors)
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}
