//! One cleanup cycle over the sessions table.
//!
//! Meant to be invoked by an external scheduler (cron, a Kubernetes CronJob).
//! Exits non-zero when the cycle could not delete expired rows.

use std::sync::Arc;

use se_core::repositories::Storage;
use se_core::services::{SessionCleanupConfig, SessionCleanupService};
use se_infra::telemetry::init_tracing;
use se_infra::{DatabasePool, MySqlStorage};
use se_shared::EngineConfig;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = EngineConfig::from_env();
    init_tracing(&config.logging)?;

    info!(environment = %config.environment, "Starting session cleanup");

    let pool = DatabasePool::new(&config.database).await?;
    let storage = MySqlStorage::new(&pool, &config.database)?;
    storage.health_check().await?;

    let service = SessionCleanupService::new(Arc::new(storage), SessionCleanupConfig::default());
    let result = service.run_cleanup().await?;
    pool.close().await;

    if !result.is_success() {
        anyhow::bail!("session cleanup failed: {}", result.errors.join("; "));
    }

    info!(
        deleted = result.expired_sessions_deleted,
        "Session cleanup finished"
    );
    Ok(())
}
