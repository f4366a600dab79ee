//! Scoped transaction over one pooled MySQL connection.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::pool::PoolConnection;
use sqlx::{MySql, MySqlConnection, MySqlPool};
use tracing::warn;

use se_core::domain::entities::{Payload, SessionRecord, SigningKey};
use se_core::errors::{StorageError, StorageResult};
use se_core::repositories::{SessionTransaction, SigningKeyTransaction, UnitOfWork};

use super::map_sqlx_error;
use super::rows::{session_from_row, signing_key_from_row};
use crate::database::schema::Statements;

/// One connection with an open transaction
///
/// The connection goes back to the pool only after a successful commit. On
/// any other exit, including a dropped future, it is detached from the pool
/// and closed so the server rolls the transaction back.
pub struct MySqlUnitOfWork {
    conn: Option<PoolConnection<MySql>>,
    statements: Arc<Statements>,
    committed: bool,
    destroy: bool,
}

impl MySqlUnitOfWork {
    pub(super) async fn begin(pool: &MySqlPool, statements: Arc<Statements>) -> StorageResult<Self> {
        let mut conn = pool.acquire().await.map_err(map_sqlx_error)?;

        if let Err(e) = sqlx::query("START TRANSACTION").execute(&mut *conn).await {
            drop(conn.detach());
            return Err(map_sqlx_error(e));
        }

        Ok(Self {
            conn: Some(conn),
            statements,
            committed: false,
            destroy: false,
        })
    }

    fn connection(&mut self) -> StorageResult<&mut MySqlConnection> {
        self.conn.as_deref_mut().ok_or_else(|| StorageError::Connection {
            message: "unit of work has no connection".to_string(),
        })
    }
}

#[async_trait]
impl SessionTransaction for MySqlUnitOfWork {
    async fn get_session_for_update(
        &mut self,
        session_handle_hash1: &str,
    ) -> StorageResult<Option<SessionRecord>> {
        let statements = Arc::clone(&self.statements);
        let row = sqlx::query(&statements.select_session_for_update)
            .bind(session_handle_hash1)
            .fetch_optional(self.connection()?)
            .await
            .map_err(map_sqlx_error)?;

        row.as_ref().map(session_from_row).transpose()
    }

    async fn update_session(
        &mut self,
        session_handle_hash1: &str,
        refresh_token_hash2: &str,
        session_data: Option<&Payload>,
        expires_at: i64,
    ) -> StorageResult<u64> {
        let statements = Arc::clone(&self.statements);
        let result = sqlx::query(&statements.update_session)
            .bind(refresh_token_hash2)
            .bind(session_data.map(Payload::to_json_string))
            .bind(expires_at)
            .bind(session_handle_hash1)
            .execute(self.connection()?)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }
}

#[async_trait]
impl SigningKeyTransaction for MySqlUnitOfWork {
    async fn get_key_for_update(&mut self, key_name: &str) -> StorageResult<Option<SigningKey>> {
        let statements = Arc::clone(&self.statements);
        let row = sqlx::query(&statements.select_key_for_update)
            .bind(key_name)
            .fetch_optional(self.connection()?)
            .await
            .map_err(map_sqlx_error)?;

        row.as_ref().map(signing_key_from_row).transpose()
    }

    async fn insert_key(&mut self, key: &SigningKey) -> StorageResult<()> {
        let statements = Arc::clone(&self.statements);
        sqlx::query(&statements.insert_key)
            .bind(&key.key_name)
            .bind(&key.key_value)
            .bind(key.created_at_time)
            .execute(self.connection()?)
            .await
            .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn update_key(&mut self, key: &SigningKey) -> StorageResult<u64> {
        let statements = Arc::clone(&self.statements);
        let result = sqlx::query(&statements.update_key)
            .bind(&key.key_value)
            .bind(key.created_at_time)
            .bind(&key.key_name)
            .execute(self.connection()?)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }
}

#[async_trait]
impl UnitOfWork for MySqlUnitOfWork {
    async fn commit(mut self) -> StorageResult<()> {
        sqlx::query("COMMIT")
            .execute(self.connection()?)
            .await
            .map_err(map_sqlx_error)?;
        self.committed = true;
        Ok(())
    }

    fn mark_for_destruction(&mut self) {
        self.destroy = true;
    }
}

impl Drop for MySqlUnitOfWork {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            if self.destroy || !self.committed {
                warn!("destroying connection with an unfinished transaction");
                drop(conn.detach());
            }
        }
    }
}
