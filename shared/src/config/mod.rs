//! Configuration module
//!
//! - `database` - MySQL pool and table name configuration
//! - `environment` - Environment detection and logging configuration
//! - `token` - Token lifetimes and signing key rotation

pub mod database;
pub mod environment;
pub mod token;

use serde::{Deserialize, Serialize};

pub use database::DatabaseConfig;
pub use environment::{Environment, LogFormat, LoggingConfig};
pub use token::TokenConfig;

/// Complete session engine configuration combining all sub-configurations
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineConfig {
    /// Environment configuration
    pub environment: Environment,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Token configuration
    #[serde(default)]
    pub tokens: TokenConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let env = Environment::default();
        Self {
            environment: env,
            database: DatabaseConfig::default(),
            tokens: TokenConfig::default(),
            logging: LoggingConfig::for_environment(env),
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment
    pub fn from_env() -> Self {
        let env = Environment::from_env();
        Self {
            environment: env,
            database: DatabaseConfig::from_env(),
            tokens: TokenConfig::from_env(),
            logging: LoggingConfig::from_env(env),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_config_default() {
        let config = EngineConfig::default();
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.tokens.access_token_validity, 3600);
        assert!(config.database.validate_table_names().is_ok());
    }

    #[test]
    fn test_engine_config_deserialize() {
        let config: EngineConfig = serde_json::from_str(
            r#"{
                "environment": "production",
                "database": {
                    "url": "mysql://db/app",
                    "max_connections": 20,
                    "connect_timeout": 5,
                    "idle_timeout": 60,
                    "max_lifetime": 600
                }
            }"#,
        )
        .unwrap();

        assert!(config.environment.is_production());
        assert_eq!(config.database.sessions_table, "sessions");
        assert_eq!(config.tokens.refresh_token_validity, 8_640_000);
    }
}
