//! Token codec
//!
//! Stateless encode/verify functions used by the session engine:
//! - HMAC-SHA256 signed access tokens
//! - AES-256-GCM encrypted, nonce-bearing refresh tokens
//! - SHA-256 hashing and secret generation helpers

pub mod access_token;
pub mod crypto;
pub mod refresh_token;

#[cfg(test)]
mod tests;

pub use crypto::{generate_signing_secret, random_hex, sha256_hex};
