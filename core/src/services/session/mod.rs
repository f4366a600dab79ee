//! Session service module
//!
//! - The rotation engine (create / get / refresh / revoke)
//! - Engine configuration and the theft hook
//! - Periodic cleanup of expired session rows

mod cleanup;
mod config;
mod engine;

#[cfg(test)]
mod tests;

pub use cleanup::{CleanupResult, SessionCleanupConfig, SessionCleanupService};
pub use config::{SessionEngineConfig, TheftHandler};
pub use engine::SessionEngine;
