//! In-memory storage with real row locks
//!
//! Each unit of work holds an owned per-row mutex guard for every row it has
//! read for update or written, and buffers its writes until commit. This gives
//! the same serialization a `SELECT ... FOR UPDATE` transaction gives on MySQL,
//! so race properties can be exercised without a database.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::domain::entities::{Payload, SessionDataRecord, SessionRecord, SigningKey};
use crate::errors::{StorageError, StorageResult};
use crate::repositories::session::{SessionRepository, SessionTransaction};
use crate::repositories::signing_key::SigningKeyTransaction;

use super::r#trait::{Storage, UnitOfWork};

#[derive(Default)]
struct MemoryState {
    sessions: RwLock<HashMap<String, SessionRecord>>,
    keys: RwLock<HashMap<String, SigningKey>>,
    row_locks: StdMutex<HashMap<String, Arc<Mutex<()>>>>,
    key_inserts: AtomicUsize,
    commits: AtomicUsize,
    destroyed_connections: AtomicUsize,
    latency_ms: AtomicU64,
    unavailable: AtomicBool,
    lose_session_update: AtomicBool,
}

impl MemoryState {
    /// Simulated network round trip
    async fn round_trip(&self) -> StorageResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StorageError::Connection {
                message: "memory storage is unavailable".to_string(),
            });
        }
        let latency = self.latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }
        Ok(())
    }

    async fn lock_row(self: &Arc<Self>, row: String) -> RowGuard {
        let lock = {
            let mut locks = self
                .row_locks
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(row.clone()).or_insert_with(|| Arc::new(Mutex::new(()))))
        };
        RowGuard {
            state: Arc::clone(self),
            row,
            guard: Some(lock.lock_owned().await),
        }
    }

    /// Forget the row's mutex once nobody holds or waits on it
    fn release_row(&self, row: &str) {
        let mut locks = self
            .row_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if matches!(locks.get(row), Some(lock) if Arc::strong_count(lock) == 1) {
            locks.remove(row);
        }
    }
}

/// Held row lock; the map entry is pruned on drop when it is the last user
struct RowGuard {
    state: Arc<MemoryState>,
    row: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for RowGuard {
    fn drop(&mut self) {
        self.guard.take();
        self.state.release_row(&self.row);
    }
}

fn session_row(session_handle_hash1: &str) -> String {
    format!("session:{}", session_handle_hash1)
}

fn key_row(key_name: &str) -> String {
    format!("key:{}", key_name)
}

/// In-memory implementation of the storage contract
#[derive(Clone, Default)]
pub struct MemoryStorage {
    state: Arc<MemoryState>,
}

impl MemoryStorage {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every round trip by `latency`
    pub fn set_latency(&self, latency: Duration) {
        self.state
            .latency_ms
            .store(latency.as_millis() as u64, Ordering::SeqCst);
    }

    /// Make every round trip fail with a connection error
    pub fn set_available(&self, available: bool) {
        self.state.unavailable.store(!available, Ordering::SeqCst);
    }

    /// Number of signing key rows inserted by committed units of work
    pub fn key_inserts(&self) -> usize {
        self.state.key_inserts.load(Ordering::SeqCst)
    }

    /// Number of committed units of work
    pub fn commits(&self) -> usize {
        self.state.commits.load(Ordering::SeqCst)
    }

    /// Number of units of work dropped without a successful commit
    pub fn destroyed_connections(&self) -> usize {
        self.state.destroyed_connections.load(Ordering::SeqCst)
    }

    /// Committed session row, if any
    pub async fn session(&self, session_handle_hash1: &str) -> Option<SessionRecord> {
        self.state
            .sessions
            .read()
            .await
            .get(session_handle_hash1)
            .cloned()
    }

    /// Committed signing key row, if any
    pub async fn signing_key(&self, key_name: &str) -> Option<SigningKey> {
        self.state.keys.read().await.get(key_name).cloned()
    }

    /// Write a signing key row directly, bypassing row locks
    pub async fn put_signing_key(&self, key: SigningKey) {
        self.state
            .keys
            .write()
            .await
            .insert(key.key_name.clone(), key);
    }

    /// Overwrite the expiry of a session row directly
    pub async fn set_session_expiry(&self, session_handle_hash1: &str, expires_at: i64) -> bool {
        match self.state.sessions.write().await.get_mut(session_handle_hash1) {
            Some(row) => {
                row.expires_at = expires_at;
                true
            }
            None => false,
        }
    }

    pub async fn session_count(&self) -> usize {
        self.state.sessions.read().await.len()
    }

    /// Number of rows with a live lock entry
    pub fn row_lock_count(&self) -> usize {
        self.state
            .row_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Make the next `update_session` inside a unit of work report zero rows
    pub fn lose_next_session_update(&self) {
        self.state.lose_session_update.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl SessionRepository for MemoryStorage {
    async fn create_session(&self, session: &SessionRecord) -> StorageResult<()> {
        self.state.round_trip().await?;
        let _guard = self
            .state
            .lock_row(session_row(&session.session_handle_hash1))
            .await;

        let mut sessions = self.state.sessions.write().await;
        if sessions.contains_key(&session.session_handle_hash1) {
            return Err(StorageError::Conflict {
                message: format!(
                    "Duplicate entry '{}' for key 'PRIMARY'",
                    session.session_handle_hash1
                ),
            });
        }
        sessions.insert(session.session_handle_hash1.clone(), session.clone());
        Ok(())
    }

    async fn delete_session(&self, session_handle_hash1: &str) -> StorageResult<u64> {
        self.state.round_trip().await?;
        let _guard = self.state.lock_row(session_row(session_handle_hash1)).await;

        let removed = self.state.sessions.write().await.remove(session_handle_hash1);
        Ok(u64::from(removed.is_some()))
    }

    async fn get_session_data(
        &self,
        session_handle_hash1: &str,
    ) -> StorageResult<Option<SessionDataRecord>> {
        self.state.round_trip().await?;
        let sessions = self.state.sessions.read().await;
        Ok(sessions.get(session_handle_hash1).map(|row| SessionDataRecord {
            session_data: row.session_data.clone(),
            expires_at: row.expires_at,
        }))
    }

    async fn update_session_data(
        &self,
        session_handle_hash1: &str,
        session_data: Option<&Payload>,
    ) -> StorageResult<u64> {
        self.state.round_trip().await?;
        let _guard = self.state.lock_row(session_row(session_handle_hash1)).await;

        let mut sessions = self.state.sessions.write().await;
        match sessions.get_mut(session_handle_hash1) {
            Some(row) => {
                row.session_data = session_data.cloned();
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn list_session_handles_for_user(&self, user_id: &str) -> StorageResult<Vec<String>> {
        self.state.round_trip().await?;
        let sessions = self.state.sessions.read().await;
        Ok(sessions
            .values()
            .filter(|row| row.user_id == user_id)
            .map(|row| row.session_handle_hash1.clone())
            .collect())
    }

    async fn delete_expired_sessions(&self, now_ms: i64) -> StorageResult<u64> {
        self.state.round_trip().await?;
        let mut sessions = self.state.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, row| !row.is_expired_at(now_ms));
        Ok((before - sessions.len()) as u64)
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    type Tx = MemoryUnitOfWork;

    async fn begin(&self) -> StorageResult<MemoryUnitOfWork> {
        self.state.round_trip().await?;
        Ok(MemoryUnitOfWork {
            state: Arc::clone(&self.state),
            guards: HashMap::new(),
            pending_sessions: HashMap::new(),
            pending_keys: HashMap::new(),
            inserted_keys: 0,
            committed: false,
            destroy: false,
        })
    }

    async fn health_check(&self) -> StorageResult<()> {
        self.state.round_trip().await
    }

    async fn ensure_schema(&self) -> StorageResult<()> {
        self.state.round_trip().await
    }
}

/// Unit of work over [`MemoryStorage`]
pub struct MemoryUnitOfWork {
    state: Arc<MemoryState>,
    guards: HashMap<String, RowGuard>,
    pending_sessions: HashMap<String, SessionRecord>,
    pending_keys: HashMap<String, SigningKey>,
    inserted_keys: usize,
    committed: bool,
    destroy: bool,
}

impl MemoryUnitOfWork {
    async fn acquire(&mut self, row: String) {
        if !self.guards.contains_key(&row) {
            let guard = self.state.lock_row(row.clone()).await;
            self.guards.insert(row, guard);
        }
    }

    async fn current_session(&self, session_handle_hash1: &str) -> Option<SessionRecord> {
        match self.pending_sessions.get(session_handle_hash1) {
            Some(row) => Some(row.clone()),
            None => self
                .state
                .sessions
                .read()
                .await
                .get(session_handle_hash1)
                .cloned(),
        }
    }

    async fn current_key(&self, key_name: &str) -> Option<SigningKey> {
        match self.pending_keys.get(key_name) {
            Some(key) => Some(key.clone()),
            None => self.state.keys.read().await.get(key_name).cloned(),
        }
    }
}

#[async_trait]
impl SessionTransaction for MemoryUnitOfWork {
    async fn get_session_for_update(
        &mut self,
        session_handle_hash1: &str,
    ) -> StorageResult<Option<SessionRecord>> {
        self.state.round_trip().await?;
        self.acquire(session_row(session_handle_hash1)).await;
        Ok(self.current_session(session_handle_hash1).await)
    }

    async fn update_session(
        &mut self,
        session_handle_hash1: &str,
        refresh_token_hash2: &str,
        session_data: Option<&Payload>,
        expires_at: i64,
    ) -> StorageResult<u64> {
        self.state.round_trip().await?;
        self.acquire(session_row(session_handle_hash1)).await;
        if self.state.lose_session_update.swap(false, Ordering::SeqCst) {
            return Ok(0);
        }

        match self.current_session(session_handle_hash1).await {
            Some(mut row) => {
                row.refresh_token_hash2 = refresh_token_hash2.to_string();
                row.session_data = session_data.cloned();
                row.expires_at = expires_at;
                self.pending_sessions
                    .insert(session_handle_hash1.to_string(), row);
                Ok(1)
            }
            None => Ok(0),
        }
    }
}

#[async_trait]
impl SigningKeyTransaction for MemoryUnitOfWork {
    async fn get_key_for_update(&mut self, key_name: &str) -> StorageResult<Option<SigningKey>> {
        self.state.round_trip().await?;
        self.acquire(key_row(key_name)).await;
        Ok(self.current_key(key_name).await)
    }

    async fn insert_key(&mut self, key: &SigningKey) -> StorageResult<()> {
        self.state.round_trip().await?;
        self.acquire(key_row(&key.key_name)).await;

        if self.current_key(&key.key_name).await.is_some() {
            return Err(StorageError::Conflict {
                message: format!("Duplicate entry '{}' for key 'PRIMARY'", key.key_name),
            });
        }
        self.pending_keys.insert(key.key_name.clone(), key.clone());
        self.inserted_keys += 1;
        Ok(())
    }

    async fn update_key(&mut self, key: &SigningKey) -> StorageResult<u64> {
        self.state.round_trip().await?;
        self.acquire(key_row(&key.key_name)).await;

        if self.current_key(&key.key_name).await.is_none() {
            return Ok(0);
        }
        self.pending_keys.insert(key.key_name.clone(), key.clone());
        Ok(1)
    }
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn commit(mut self) -> StorageResult<()> {
        self.state.round_trip().await?;

        // Both write locks are taken before anything is applied so a
        // cancelled commit leaves no partial writes behind.
        let state = Arc::clone(&self.state);
        let mut sessions = state.sessions.write().await;
        let mut keys = state.keys.write().await;
        sessions.extend(std::mem::take(&mut self.pending_sessions));
        keys.extend(std::mem::take(&mut self.pending_keys));
        drop(keys);
        drop(sessions);

        self.state
            .key_inserts
            .fetch_add(self.inserted_keys, Ordering::SeqCst);
        self.state.commits.fetch_add(1, Ordering::SeqCst);
        self.committed = true;
        Ok(())
    }

    fn mark_for_destruction(&mut self) {
        self.destroy = true;
    }
}

impl Drop for MemoryUnitOfWork {
    fn drop(&mut self) {
        if !self.committed || self.destroy {
            self.state
                .destroyed_connections
                .fetch_add(1, Ordering::SeqCst);
        }
    }
}
