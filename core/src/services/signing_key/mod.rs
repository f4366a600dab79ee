//! Signing key lifecycle
//!
//! One [`SigningKeyStore`] per token kind lazily creates its secret on first
//! use, optionally rotates it, and caches it in process.

mod config;
mod store;


pub use config::{SigningKeyConfig, SigningKeyOverride};
pub use store::SigningKeyStore;
