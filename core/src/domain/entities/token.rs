//! Token payload entities.

use serde::{Deserialize, Serialize};

use super::payload::Payload;

/// Claims carried by an access token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenPayload {
    pub session_handle: String,

    pub user_id: String,

    /// SHA-256 of the refresh token this access token was issued with
    pub refresh_token_hash1: String,

    /// Present until the paired refresh token has been promoted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_refresh_token_hash1: Option<String>,

    /// Expiry in epoch milliseconds
    pub expiry_time: i64,

    pub user_payload: Payload,
}

impl AccessTokenPayload {
    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        self.expiry_time < now_ms
    }
}

/// Plaintext of an encrypted refresh token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenPayload {
    pub session_handle: String,

    pub user_id: String,

    /// Must equal the token's plaintext suffix
    pub nonce: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_refresh_token_hash1: Option<String>,
}

/// A token string together with its expiry (epoch milliseconds)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub token: String,
    pub expires_at: i64,
}

impl TokenInfo {
    pub fn new(token: String, expires_at: i64) -> Self {
        Self { token, expires_at }
    }
}
