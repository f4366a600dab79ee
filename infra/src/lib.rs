//! # Infrastructure Layer
//!
//! Concrete implementations behind the session engine's storage contract.
//!
//! ## Architecture
//!
//! - **Database**: MySQL connection pool and the [`MySqlStorage`] unit-of-work
//!   implementation using SQLx
//! - **Telemetry**: `tracing-subscriber` installation from [`LoggingConfig`]
//! - **Binaries**: `session_cleanup`, one cleanup cycle for an external scheduler
//!
//! ## Features
//!
//! - `mysql`: Enable MySQL database support (default)
//!
//! [`LoggingConfig`]: se_shared::LoggingConfig

use std::sync::Arc;

use se_core::errors::DomainError;
use se_core::services::{SessionEngine, SessionEngineConfig};
use se_shared::DatabaseConfig;

/// Database module - MySQL implementations using SQLx
#[cfg(feature = "mysql")]
pub mod database;

/// Logging initialisation
pub mod telemetry;

#[cfg(feature = "mysql")]
pub use database::{DatabasePool, MySqlStorage, MySqlUnitOfWork, PoolStatistics};

/// Build a session engine over MySQL and run its `init`
///
/// The returned pool handle is the one the engine uses; close it on shutdown.
#[cfg(feature = "mysql")]
pub async fn connect_engine(
    database: &DatabaseConfig,
    engine_config: SessionEngineConfig,
) -> Result<(SessionEngine<MySqlStorage>, DatabasePool), InfrastructureError> {
    tracing::info!("Connecting session engine to MySQL");

    let pool = DatabasePool::new(database).await?;
    let storage = MySqlStorage::new(&pool, database)?;
    let engine = SessionEngine::new(Arc::new(storage), engine_config);
    engine.init().await?;

    tracing::info!("Session engine initialised");
    Ok((engine, pool))
}

/// Infrastructure-specific error types
#[derive(Debug, thiserror::Error)]
pub enum InfrastructureError {
    /// Database connection error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Engine initialisation error
    #[error("Engine error: {0}")]
    Engine(#[from] DomainError),

    /// Subscriber installation error
    #[error("Telemetry error: {0}")]
    Telemetry(String),
}
