//! Session repository traits defining the persistence contract for session rows.

use async_trait::async_trait;

use crate::domain::entities::{Payload, SessionDataRecord, SessionRecord};
use crate::errors::StorageResult;

/// Non-transactional operations on the sessions relation
///
/// Every method is keyed by the already-hashed session handle. None of these
/// take a lock that outlives the statement; concurrent writers of session data
/// race and the last write wins.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Insert a new session row
    ///
    /// # Arguments
    /// * `session` - The row to insert
    ///
    /// # Returns
    /// * `Ok(())` - Row inserted
    /// * `Err(StorageError::Conflict)` - A row already exists for this handle hash
    ///
    /// # Example
    /// ```no_run
    /// # use se_core::repositories::SessionRepository;
    /// # use se_core::domain::entities::{Payload, SessionRecord};
    /// # async fn example(repo: &impl SessionRepository) -> Result<(), Box<dyn std::error::Error>> {
    /// let row = SessionRecord {
    ///     session_handle_hash1: "9f86d081...".to_string(),
    ///     user_id: "user-1".to_string(),
    ///     refresh_token_hash2: "60303ae2...".to_string(),
    ///     session_data: None,
    ///     jwt_payload: Payload::empty(),
    ///     expires_at: 1_700_000_000_000,
    /// };
    /// repo.create_session(&row).await?;
    /// # Ok(())
    /// # }
    /// ```
    async fn create_session(&self, session: &SessionRecord) -> StorageResult<()>;

    /// Delete a session row
    ///
    /// # Returns
    /// * `Ok(n)` - Rows affected (0 or 1)
    async fn delete_session(&self, session_handle_hash1: &str) -> StorageResult<u64>;

    /// Read only the opaque session data and expiry of a row
    ///
    /// # Returns
    /// * `Ok(Some(record))` - Row found (expiry is not checked here)
    /// * `Ok(None)` - No row for this handle hash
    async fn get_session_data(
        &self,
        session_handle_hash1: &str,
    ) -> StorageResult<Option<SessionDataRecord>>;

    /// Overwrite the opaque session data of a row
    ///
    /// # Returns
    /// * `Ok(n)` - Rows affected (0 when the session no longer exists)
    async fn update_session_data(
        &self,
        session_handle_hash1: &str,
        session_data: Option<&Payload>,
    ) -> StorageResult<u64>;

    /// List the handle hashes of every session belonging to a user
    async fn list_session_handles_for_user(&self, user_id: &str) -> StorageResult<Vec<String>>;

    /// Delete every row with `expires_at < now_ms`
    ///
    /// # Returns
    /// * `Ok(n)` - Number of rows deleted
    async fn delete_expired_sessions(&self, now_ms: i64) -> StorageResult<u64>;
}

/// Session operations that run inside an open unit of work
///
/// Reads take a row lock held until the unit of work commits or is dropped,
/// which serializes concurrent promotions of the same session.
#[async_trait]
pub trait SessionTransaction: Send {
    /// Lock and load a session row
    ///
    /// # Returns
    /// * `Ok(Some(row))` - Row found and locked
    /// * `Ok(None)` - No row for this handle hash
    async fn get_session_for_update(
        &mut self,
        session_handle_hash1: &str,
    ) -> StorageResult<Option<SessionRecord>>;

    /// Update the current refresh token pointer, data and expiry of a row
    ///
    /// # Returns
    /// * `Ok(n)` - Rows affected (0 or 1)
    async fn update_session(
        &mut self,
        session_handle_hash1: &str,
        refresh_token_hash2: &str,
        session_data: Option<&Payload>,
        expires_at: i64,
    ) -> StorageResult<u64>;
}
