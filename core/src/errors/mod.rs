//! Engine error taxonomy.

mod types;

pub use types::{StorageError, StorageResult, TokenError};

use thiserror::Error;
use tracing::{debug, error};

/// Boxed source error carried by [`DomainError::General`]
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The only error type that crosses the engine boundary
#[derive(Error, Debug)]
pub enum DomainError {
    /// Infrastructure or programmer error; retry or alert
    #[error("General error: {message}")]
    General {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// The session is conclusively invalid; full re-authentication is required
    #[error("Unauthorised: {message}")]
    Unauthorised { message: String },

    /// The access token could not be verified; try refreshing the session
    #[error("Try refresh token: {message}")]
    TryRefreshToken { message: String },
}

impl DomainError {
    /// Create a general error and log it
    pub fn general(message: impl Into<String>) -> Self {
        let message = message.into();
        error!(error = %message, "general error");
        DomainError::General {
            message,
            source: None,
        }
    }

    /// Create a general error wrapping a cause and log it
    pub fn general_with(
        message: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        let message = message.into();
        let source = source.into();
        error!(error = %message, cause = %source, "general error");
        DomainError::General {
            message,
            source: Some(source),
        }
    }

    pub fn unauthorised(message: impl Into<String>) -> Self {
        let message = message.into();
        debug!(reason = %message, "unauthorised");
        DomainError::Unauthorised { message }
    }

    pub fn try_refresh_token(message: impl Into<String>) -> Self {
        let message = message.into();
        debug!(reason = %message, "try refresh token");
        DomainError::TryRefreshToken { message }
    }

    /// Stable error code exposed to callers
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::General { .. } => "GENERAL_ERROR",
            DomainError::Unauthorised { .. } => "UNAUTHORISED",
            DomainError::TryRefreshToken { .. } => "TRY_REFRESH_TOKEN",
        }
    }

    pub fn is_general(&self) -> bool {
        matches!(self, DomainError::General { .. })
    }

    pub fn is_unauthorised(&self) -> bool {
        matches!(self, DomainError::Unauthorised { .. })
    }

    pub fn is_try_refresh_token(&self) -> bool {
        matches!(self, DomainError::TryRefreshToken { .. })
    }
}

impl From<StorageError> for DomainError {
    fn from(err: StorageError) -> Self {
        DomainError::general_with("storage operation failed", err)
    }
}

pub type DomainResult<T> = Result<T, DomainError>;

#[cfg(test)]
mod tests;
