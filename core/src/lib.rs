//! # Session Engine Core
//!
//! Token rotation protocol and signing key lifecycle.
//! This crate contains the domain entities, the error taxonomy, the storage
//! contract (with an in-memory implementation), the token codec, the signing
//! key stores and the session engine itself.

pub mod domain;
pub mod errors;
pub mod repositories;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::*;
pub use errors::*;
pub use repositories::{
    MemoryStorage, MemoryUnitOfWork, SessionRepository, SessionTransaction, SigningKeyTransaction,
    Storage, UnitOfWork,
};
pub use services::{
    CleanupResult, SessionCleanupConfig, SessionCleanupService, SessionEngine,
    SessionEngineConfig, SigningKeyConfig, SigningKeyOverride, SigningKeyStore, TheftHandler,
};
