//! Storage contract: scoped units of work over a relational store.

use async_trait::async_trait;

use crate::errors::StorageResult;
use crate::repositories::session::{SessionRepository, SessionTransaction};
use crate::repositories::signing_key::SigningKeyTransaction;

/// One borrowed connection with an open transaction
///
/// Dropping a unit of work without calling [`UnitOfWork::commit`] rolls the
/// transaction back by destroying the connection instead of returning it to
/// the pool. The same happens on drop after [`UnitOfWork::mark_for_destruction`].
#[async_trait]
pub trait UnitOfWork: SessionTransaction + SigningKeyTransaction + Send {
    /// Commit the transaction and release the connection
    async fn commit(self) -> StorageResult<()>;

    /// Flag the connection so it is destroyed rather than released
    fn mark_for_destruction(&mut self);
}

/// A relational store holding the sessions and signing key relations
#[async_trait]
pub trait Storage: SessionRepository + 'static {
    type Tx: UnitOfWork + 'static;

    /// Borrow a connection and start a transaction
    async fn begin(&self) -> StorageResult<Self::Tx>;

    /// Verify the store is reachable
    async fn health_check(&self) -> StorageResult<()>;

    /// Create both relations if they do not exist
    async fn ensure_schema(&self) -> StorageResult<()>;
}
