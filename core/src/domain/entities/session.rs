//! Session row entity.

use serde::{Deserialize, Serialize};

use super::payload::Payload;

/// One row of the sessions relation
///
/// Only hashes of the session handle and of the current refresh token are
/// stored; the plaintext values never reach the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// SHA-256 of the session handle (primary key)
    pub session_handle_hash1: String,

    pub user_id: String,

    /// SHA-256(SHA-256(current refresh token))
    pub refresh_token_hash2: String,

    /// Opaque per-session data
    pub session_data: Option<Payload>,

    /// Payload embedded into every access token issued for this session
    pub jwt_payload: Payload,

    /// Expiry in epoch milliseconds
    pub expires_at: i64,
}

impl SessionRecord {
    /// Check whether the row has expired at `now_ms`
    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        self.expires_at < now_ms
    }
}

/// Result of a non-locking session data read
#[derive(Debug, Clone, PartialEq)]
pub struct SessionDataRecord {
    pub session_data: Option<Payload>,
    pub expires_at: i64,
}

impl SessionDataRecord {
    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        self.expires_at < now_ms
    }
}
