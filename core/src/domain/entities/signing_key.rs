//! Signing key entity.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Row name of the access token signing key
pub const ACCESS_TOKEN_SIGNING_KEY_NAME: &str = "access_token_signing_key";

/// Row name of the refresh token signing key
pub const REFRESH_TOKEN_SIGNING_KEY_NAME: &str = "refresh_token_signing_key";

/// Which token kind a signing key protects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SigningKeyKind {
    AccessToken,
    RefreshToken,
}

impl SigningKeyKind {
    /// Primary key of this kind's row in the signing key table
    pub fn key_name(&self) -> &'static str {
        match self {
            SigningKeyKind::AccessToken => ACCESS_TOKEN_SIGNING_KEY_NAME,
            SigningKeyKind::RefreshToken => REFRESH_TOKEN_SIGNING_KEY_NAME,
        }
    }
}

impl fmt::Display for SigningKeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key_name())
    }
}

/// One row of the signing key relation
#[derive(Clone, PartialEq, Eq)]
pub struct SigningKey {
    pub key_name: String,
    pub key_value: String,
    /// Creation time in epoch milliseconds
    pub created_at_time: i64,
}

impl SigningKey {
    pub fn new(kind: SigningKeyKind, key_value: String, created_at_time: i64) -> Self {
        Self {
            key_name: kind.key_name().to_string(),
            key_value,
            created_at_time,
        }
    }

    /// Check whether a rotating key has outlived `update_interval_ms` at `now_ms`
    pub fn is_stale_at(&self, now_ms: i64, update_interval_ms: i64) -> bool {
        now_ms > self.created_at_time.saturating_add(update_interval_ms)
    }
}

// Secrets stay out of logs.
impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("key_name", &self.key_name)
            .field("key_value", &"<redacted>")
            .field("created_at_time", &self.created_at_time)
            .finish()
    }
}
