//! Signing key persistence contract.

use async_trait::async_trait;

use crate::domain::entities::SigningKey;
use crate::errors::StorageResult;

/// Signing key operations that run inside an open unit of work
///
/// The locking read is what keeps two processes from both minting a first
/// key: the second blocks until the first commits, then sees its row.
#[async_trait]
pub trait SigningKeyTransaction: Send {
    /// Lock and load a signing key row by name
    ///
    /// # Returns
    /// * `Ok(Some(key))` - Row found and locked
    /// * `Ok(None)` - No row yet; the gap is locked where the store supports it
    async fn get_key_for_update(&mut self, key_name: &str) -> StorageResult<Option<SigningKey>>;

    /// Insert a freshly generated key
    ///
    /// # Returns
    /// * `Err(StorageError::Conflict)` - Another writer inserted the row first
    async fn insert_key(&mut self, key: &SigningKey) -> StorageResult<()>;

    /// Replace the value and creation time of an existing key
    ///
    /// # Returns
    /// * `Ok(n)` - Rows affected (0 or 1)
    async fn update_key(&mut self, key: &SigningKey) -> StorageResult<u64>;
}
