//! Token lifetime and signing key rotation configuration

use serde::{Deserialize, Serialize};

/// Access/refresh token configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenConfig {
    /// Access token validity in seconds
    pub access_token_validity: u64,

    /// Refresh token (and session row) validity in seconds
    pub refresh_token_validity: u64,

    /// Whether the access token signing key rotates
    #[serde(default = "default_dynamic")]
    pub access_token_signing_key_dynamic: bool,

    /// Access token signing key rotation interval in seconds
    #[serde(default = "default_update_interval")]
    pub access_token_signing_key_update_interval: u64,

    /// Deadline for a single engine operation in milliseconds
    #[serde(default)]
    pub operation_timeout_ms: Option<u64>,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            access_token_validity: 3600,         // 1 hour
            refresh_token_validity: 8_640_000,   // 100 days
            access_token_signing_key_dynamic: default_dynamic(),
            access_token_signing_key_update_interval: default_update_interval(),
            operation_timeout_ms: None,
        }
    }
}

impl TokenConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            access_token_validity: env_or("ACCESS_TOKEN_VALIDITY", defaults.access_token_validity),
            refresh_token_validity: env_or("REFRESH_TOKEN_VALIDITY", defaults.refresh_token_validity),
            access_token_signing_key_dynamic: env_or(
                "ACCESS_TOKEN_SIGNING_KEY_DYNAMIC",
                defaults.access_token_signing_key_dynamic,
            ),
            access_token_signing_key_update_interval: env_or(
                "ACCESS_TOKEN_SIGNING_KEY_UPDATE_INTERVAL",
                defaults.access_token_signing_key_update_interval,
            ),
            operation_timeout_ms: std::env::var("SESSION_OPERATION_TIMEOUT_MS")
                .ok()
                .and_then(|value| value.parse().ok()),
        }
    }

    /// Set access token validity in minutes
    pub fn with_access_validity_minutes(mut self, minutes: u64) -> Self {
        self.access_token_validity = minutes * 60;
        self
    }

    /// Set refresh token validity in days
    pub fn with_refresh_validity_days(mut self, days: u64) -> Self {
        self.refresh_token_validity = days * 86400;
        self
    }

    /// Use a static access token signing key
    pub fn with_static_signing_key(mut self) -> Self {
        self.access_token_signing_key_dynamic = false;
        self
    }
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

fn default_dynamic() -> bool {
    true
}

fn default_update_interval() -> u64 {
    86400 // 24 hours
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_config_default() {
        let config = TokenConfig::default();
        assert_eq!(config.access_token_validity, 3600);
        assert_eq!(config.refresh_token_validity, 100 * 86400);
        assert!(config.access_token_signing_key_dynamic);
        assert_eq!(config.access_token_signing_key_update_interval, 86400);
        assert!(config.operation_timeout_ms.is_none());
    }

    #[test]
    fn test_token_config_builder() {
        let config = TokenConfig::default()
            .with_access_validity_minutes(30)
            .with_refresh_validity_days(14)
            .with_static_signing_key();

        assert_eq!(config.access_token_validity, 1800);
        assert_eq!(config.refresh_token_validity, 1_209_600);
        assert!(!config.access_token_signing_key_dynamic);
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: TokenConfig = serde_json::from_str(
            r#"{"access_token_validity": 60, "refresh_token_validity": 120}"#,
        )
        .unwrap();
        assert_eq!(config.access_token_validity, 60);
        assert!(config.access_token_signing_key_dynamic);
        assert_eq!(config.access_token_signing_key_update_interval, 86400);
    }
}
