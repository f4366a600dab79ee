//! Shared configuration and utilities for the session engine
//!
//! This crate provides functionality used by both the core and infra crates:
//! - Configuration types (database, tokens, logging)
//! - Utility functions (clock, identifier validation)

pub mod config;
pub mod utils;

// Re-export commonly used items at crate root
pub use config::{DatabaseConfig, EngineConfig, Environment, LogFormat, LoggingConfig, TokenConfig};
pub use utils::{time, validation};
