//! Engine services: token codec, signing key lifecycle and the session protocol.

pub mod session;
pub mod signing_key;
pub mod token;

// Re-export commonly used types
pub use session::{
    CleanupResult, SessionCleanupConfig, SessionCleanupService, SessionEngine,
    SessionEngineConfig, TheftHandler,
};
pub use signing_key::{SigningKeyConfig, SigningKeyOverride, SigningKeyStore};
