//! Session engine configuration

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use se_shared::config::TokenConfig;

use crate::errors::{BoxError, DomainError, DomainResult};
use crate::services::signing_key::{SigningKeyConfig, SigningKeyOverride};

/// Hook invoked after a refresh detects token reuse
///
/// Typical implementations revoke every session of the user. Errors are
/// logged by the engine and never reach the refresh caller.
#[async_trait]
pub trait TheftHandler: Send + Sync {
    async fn on_theft_detected(&self, user_id: &str, session_handle: &str) -> Result<(), BoxError>;
}

/// Engine-facing configuration
#[derive(Clone)]
pub struct SessionEngineConfig {
    pub access_token_validity: Duration,

    /// Also the lifetime of a session row since its last promotion
    pub refresh_token_validity: Duration,

    pub access_token_signing_key: SigningKeyConfig,

    /// Deadline applied to every public operation
    pub operation_timeout: Option<Duration>,

    pub theft_handler: Option<Arc<dyn TheftHandler>>,
}

impl Default for SessionEngineConfig {
    fn default() -> Self {
        Self::from_token_config(&TokenConfig::default())
    }
}

impl SessionEngineConfig {
    /// Build from the serialisable token configuration
    pub fn from_token_config(tokens: &TokenConfig) -> Self {
        let access_token_signing_key = if tokens.access_token_signing_key_dynamic {
            SigningKeyConfig::dynamic(Duration::from_secs(
                tokens.access_token_signing_key_update_interval,
            ))
        } else {
            SigningKeyConfig::static_key()
        };

        Self {
            access_token_validity: Duration::from_secs(tokens.access_token_validity),
            refresh_token_validity: Duration::from_secs(tokens.refresh_token_validity),
            access_token_signing_key,
            operation_timeout: tokens.operation_timeout_ms.map(Duration::from_millis),
            theft_handler: None,
        }
    }

    pub fn with_theft_handler(mut self, handler: Arc<dyn TheftHandler>) -> Self {
        self.theft_handler = Some(handler);
        self
    }

    /// Take the access token signing secret from a caller-supplied source
    pub fn with_access_key_override(mut self, user_override: Arc<dyn SigningKeyOverride>) -> Self {
        self.access_token_signing_key = self.access_token_signing_key.with_override(user_override);
        self
    }

    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = Some(timeout);
        self
    }

    /// Reject zero lifetimes and intervals
    pub fn validate(&self) -> DomainResult<()> {
        if self.access_token_validity.is_zero() {
            return Err(DomainError::general("access token validity must be greater than zero"));
        }
        if self.refresh_token_validity.is_zero() {
            return Err(DomainError::general("refresh token validity must be greater than zero"));
        }
        if self.access_token_signing_key.dynamic && self.access_token_signing_key.update_interval.is_zero() {
            return Err(DomainError::general(
                "access token signing key update interval must be greater than zero",
            ));
        }
        if self.operation_timeout.is_some_and(|timeout| timeout.is_zero()) {
            return Err(DomainError::general("operation timeout must be greater than zero"));
        }
        Ok(())
    }
}

impl fmt::Debug for SessionEngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionEngineConfig")
            .field("access_token_validity", &self.access_token_validity)
            .field("refresh_token_validity", &self.refresh_token_validity)
            .field("access_token_signing_key", &self.access_token_signing_key)
            .field("operation_timeout", &self.operation_timeout)
            .field("theft_handler", &self.theft_handler.is_some())
            .finish()
    }
}
