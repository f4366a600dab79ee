//! MySQL implementation of the session engine's storage contract.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{MySqlPool, Row};
use tracing::{debug, info};

use se_core::domain::entities::{Payload, SessionDataRecord, SessionRecord};
use se_core::errors::StorageResult;
use se_core::repositories::{SessionRepository, Storage};
use se_shared::DatabaseConfig;

use super::rows::{session_data_from_row, session_from_row};
use super::{map_sqlx_error, MySqlUnitOfWork};
use crate::database::connection::{DatabasePool, PoolStatistics};
use crate::database::schema::Statements;
use crate::InfrastructureError;

/// Sessions and signing keys stored in MySQL
///
/// Non-transactional operations run on any pooled connection in autocommit
/// mode. [`Storage::begin`] hands out a [`MySqlUnitOfWork`] that owns one
/// connection until it commits or is dropped.
#[derive(Clone)]
pub struct MySqlStorage {
    pool: MySqlPool,
    statements: Arc<Statements>,
}

impl MySqlStorage {
    /// Create a storage over `pool` using the table names in `config`
    ///
    /// # Errors
    /// * `InfrastructureError::Config` - A configured table name is not a plain identifier
    pub fn new(pool: &DatabasePool, config: &DatabaseConfig) -> Result<Self, InfrastructureError> {
        Ok(Self {
            pool: pool.get_pool().clone(),
            statements: Arc::new(Statements::for_config(config)?),
        })
    }

    /// Current pool statistics
    pub fn statistics(&self) -> PoolStatistics {
        PoolStatistics::of(&self.pool)
    }
}

#[async_trait]
impl SessionRepository for MySqlStorage {
    async fn create_session(&self, session: &SessionRecord) -> StorageResult<()> {
        sqlx::query(&self.statements.insert_session)
            .bind(&session.session_handle_hash1)
            .bind(&session.user_id)
            .bind(&session.refresh_token_hash2)
            .bind(session.session_data.as_ref().map(Payload::to_json_string))
            .bind(session.jwt_payload.to_json_string())
            .bind(session.expires_at)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn delete_session(&self, session_handle_hash1: &str) -> StorageResult<u64> {
        let result = sqlx::query(&self.statements.delete_session)
            .bind(session_handle_hash1)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }

    async fn get_session_data(
        &self,
        session_handle_hash1: &str,
    ) -> StorageResult<Option<SessionDataRecord>> {
        let row = sqlx::query(&self.statements.select_session_data)
            .bind(session_handle_hash1)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.as_ref().map(session_data_from_row).transpose()
    }

    async fn update_session_data(
        &self,
        session_handle_hash1: &str,
        session_data: Option<&Payload>,
    ) -> StorageResult<u64> {
        let result = sqlx::query(&self.statements.update_session_data)
            .bind(session_data.map(Payload::to_json_string))
            .bind(session_handle_hash1)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }

    async fn list_session_handles_for_user(&self, user_id: &str) -> StorageResult<Vec<String>> {
        let rows = sqlx::query(&self.statements.select_user_sessions)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        rows.iter()
            .map(|row| row.try_get("session_handle_hash1").map_err(map_sqlx_error))
            .collect()
    }

    async fn delete_expired_sessions(&self, now_ms: i64) -> StorageResult<u64> {
        let result = sqlx::query(&self.statements.delete_expired_sessions)
            .bind(now_ms)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        debug!(deleted = result.rows_affected(), "deleted expired session rows");
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl Storage for MySqlStorage {
    type Tx = MySqlUnitOfWork;

    async fn begin(&self) -> StorageResult<MySqlUnitOfWork> {
        MySqlUnitOfWork::begin(&self.pool, Arc::clone(&self.statements)).await
    }

    async fn health_check(&self) -> StorageResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn ensure_schema(&self) -> StorageResult<()> {
        for ddl in [
            &self.statements.create_signing_key_table,
            &self.statements.create_sessions_table,
        ] {
            sqlx::query(ddl)
                .execute(&self.pool)
                .await
                .map_err(map_sqlx_error)?;
        }
        info!("session tables are in place");
        Ok(())
    }
}
