//! Signing key store configuration

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::errors::BoxError;

/// Caller-supplied source of the access token signing secret
///
/// When configured, the store calls it on every lookup and neither persists
/// nor rotates the returned secret.
#[async_trait]
pub trait SigningKeyOverride: Send + Sync {
    async fn signing_key(&self) -> Result<String, BoxError>;
}

/// Configuration for one signing key store
#[derive(Clone)]
pub struct SigningKeyConfig {
    /// Rotate the key once it is older than `update_interval`
    pub dynamic: bool,
    pub update_interval: Duration,
    pub user_override: Option<Arc<dyn SigningKeyOverride>>,
}

impl Default for SigningKeyConfig {
    fn default() -> Self {
        Self::dynamic(Duration::from_secs(24 * 3600))
    }
}

impl SigningKeyConfig {
    /// A key that is generated once and never rotated
    pub fn static_key() -> Self {
        Self {
            dynamic: false,
            update_interval: Duration::from_secs(24 * 3600),
            user_override: None,
        }
    }

    /// A key rotated after `update_interval`
    pub fn dynamic(update_interval: Duration) -> Self {
        Self {
            dynamic: true,
            update_interval,
            user_override: None,
        }
    }

    /// Take the secret from `user_override` instead of storage
    pub fn with_override(mut self, user_override: Arc<dyn SigningKeyOverride>) -> Self {
        self.user_override = Some(user_override);
        self
    }

    pub(crate) fn update_interval_ms(&self) -> i64 {
        i64::try_from(self.update_interval.as_millis()).unwrap_or(i64::MAX)
    }
}

impl fmt::Debug for SigningKeyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKeyConfig")
            .field("dynamic", &self.dynamic)
            .field("update_interval", &self.update_interval)
            .field("user_override", &self.user_override.is_some())
            .finish()
    }
}
