//! Internal error conditions raised below the engine boundary
//!
//! These never leave the engine as-is: the engine folds them into one of the
//! three [`DomainError`](super::DomainError) kinds depending on context.

use thiserror::Error;

/// Token codec failures
///
/// Every rejection is a distinct condition so callers and tests can tell
/// them apart before they are normalised.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Invalid access token format")]
    InvalidFormat,

    #[error("Access token header mismatch")]
    HeaderMismatch,

    #[error("Access token signature mismatch")]
    SignatureMismatch,

    #[error("Access token payload is not a JSON object")]
    NonObjectPayload,

    #[error("Invalid token payload: {message}")]
    InvalidPayload { message: String },

    #[error("Invalid refresh token format")]
    InvalidRefreshTokenFormat,

    #[error("Refresh token decryption failed")]
    RefreshTokenDecryptionFailed,

    #[error("Refresh token nonce mismatch")]
    NonceMismatch,

    #[error("Token encoding failed: {message}")]
    EncodingFailed { message: String },
}

/// Storage contract failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("Storage connection error: {message}")]
    Connection { message: String },

    #[error("Storage query error: {message}")]
    Query { message: String },

    /// Duplicate key, deadlock or lock wait timeout; the statement may be retried
    #[error("Storage conflict: {message}")]
    Conflict { message: String },

    #[error("Storage operation timed out")]
    Timeout,

    /// A persisted value could not be decoded
    #[error("Corrupt stored value: {message}")]
    Corrupt { message: String },
}

impl StorageError {
    /// Check if the failed operation can be retried from scratch
    pub fn is_conflict(&self) -> bool {
        matches!(self, StorageError::Conflict { .. })
    }
}

pub type StorageResult<T> = Result<T, StorageError>;
