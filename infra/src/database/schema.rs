//! Table definitions and the statements run against them
//!
//! Table names are configurable, so every statement is rendered once from
//! validated identifiers when the storage is built.

use se_shared::DatabaseConfig;

use crate::InfrastructureError;

/// `CREATE TABLE` for the signing key relation
pub fn signing_key_table_ddl(table: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS `{table}` (\
            key_name VARCHAR(128) NOT NULL, \
            key_value VARCHAR(255) NOT NULL, \
            created_at_time BIGINT UNSIGNED NOT NULL, \
            PRIMARY KEY (key_name)\
        )"
    )
}

/// `CREATE TABLE` for the sessions relation
pub fn sessions_table_ddl(table: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS `{table}` (\
            session_handle_hash1 VARCHAR(256) NOT NULL, \
            user_id VARCHAR(256) NOT NULL, \
            refresh_token_hash2 VARCHAR(128) NOT NULL, \
            session_info TEXT NULL, \
            jwt_payload TEXT NULL, \
            expires_at BIGINT UNSIGNED NOT NULL, \
            PRIMARY KEY (session_handle_hash1), \
            INDEX idx_{table}_user_id (user_id), \
            INDEX idx_{table}_expires_at (expires_at)\
        )"
    )
}

const SESSION_COLUMNS: &str =
    "session_handle_hash1, user_id, refresh_token_hash2, session_info, jwt_payload, expires_at";

/// Every statement the MySQL storage issues, rendered for one pair of tables
#[derive(Debug, Clone)]
pub struct Statements {
    pub create_signing_key_table: String,
    pub create_sessions_table: String,

    pub insert_session: String,
    pub delete_session: String,
    pub select_session_data: String,
    pub update_session_data: String,
    pub select_user_sessions: String,
    pub delete_expired_sessions: String,
    pub select_session_for_update: String,
    pub update_session: String,

    pub select_key_for_update: String,
    pub insert_key: String,
    pub update_key: String,
}

impl Statements {
    /// Render the statements for the tables named in `config`
    ///
    /// # Errors
    /// * `InfrastructureError::Config` - A table name is not a plain identifier
    pub fn for_config(config: &DatabaseConfig) -> Result<Self, InfrastructureError> {
        config
            .validate_table_names()
            .map_err(InfrastructureError::Config)?;
        Ok(Self::render(&config.sessions_table, &config.signing_key_table))
    }

    fn render(sessions: &str, keys: &str) -> Self {
        Self {
            create_signing_key_table: signing_key_table_ddl(keys),
            create_sessions_table: sessions_table_ddl(sessions),

            insert_session: format!("INSERT INTO `{sessions}` ({SESSION_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?)"),
            delete_session: format!("DELETE FROM `{sessions}` WHERE session_handle_hash1 = ?"),
            select_session_data: format!(
                "SELECT session_info, expires_at FROM `{sessions}` WHERE session_handle_hash1 = ?"
            ),
            update_session_data: format!(
                "UPDATE `{sessions}` SET session_info = ? WHERE session_handle_hash1 = ?"
            ),
            select_user_sessions: format!(
                "SELECT session_handle_hash1 FROM `{sessions}` WHERE user_id = ?"
            ),
            delete_expired_sessions: format!("DELETE FROM `{sessions}` WHERE expires_at < ?"),
            select_session_for_update: format!(
                "SELECT {SESSION_COLUMNS} FROM `{sessions}` WHERE session_handle_hash1 = ? FOR UPDATE"
            ),
            update_session: format!(
                "UPDATE `{sessions}` SET refresh_token_hash2 = ?, session_info = ?, expires_at = ? \
                 WHERE session_handle_hash1 = ?"
            ),

            select_key_for_update: format!(
                "SELECT key_name, key_value, created_at_time FROM `{keys}` WHERE key_name = ? FOR UPDATE"
            ),
            insert_key: format!(
                "INSERT INTO `{keys}` (key_name, key_value, created_at_time) VALUES (?, ?, ?)"
            ),
            update_key: format!(
                "UPDATE `{keys}` SET key_value = ?, created_at_time = ? WHERE key_name = ?"
            ),
        }
    }
}
