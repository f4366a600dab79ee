//! Race-safe signing key store

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use se_shared::utils::time::now_millis;
use tracing::{debug, info, warn};

use crate::domain::entities::{SigningKey, SigningKeyKind};
use crate::errors::{DomainError, DomainResult, StorageResult};
use crate::repositories::{SigningKeyTransaction, Storage, UnitOfWork};
use crate::services::token::generate_signing_secret;

use super::config::SigningKeyConfig;

/// Attempts made when concurrent first inserts conflict
const MAX_GENERATION_ATTEMPTS: u32 = 3;

/// Owns the secret of one token kind
///
/// Generation and rotation happen inside a unit of work holding the key's row
/// lock, so concurrent callers (in this process or others) agree on a single
/// secret. The cache is only written once that unit of work has committed.
pub struct SigningKeyStore<S: Storage> {
    storage: Arc<S>,
    kind: SigningKeyKind,
    config: SigningKeyConfig,
    cache: RwLock<Option<SigningKey>>,
    initialized: AtomicBool,
}

impl<S: Storage> SigningKeyStore<S> {
    pub fn new(storage: Arc<S>, kind: SigningKeyKind, config: SigningKeyConfig) -> Self {
        Self {
            storage,
            kind,
            config,
            cache: RwLock::new(None),
            initialized: AtomicBool::new(false),
        }
    }

    pub fn kind(&self) -> SigningKeyKind {
        self.kind
    }

    pub fn config(&self) -> &SigningKeyConfig {
        &self.config
    }

    /// Allow lookups; called once storage has been verified
    pub fn mark_initialized(&self) {
        self.initialized.store(true, Ordering::SeqCst);
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    /// Return the current secret, creating or rotating it when needed
    pub async fn get_key(&self) -> DomainResult<String> {
        if !self.is_initialized() {
            return Err(DomainError::general("call init first"));
        }

        if let Some(user_override) = &self.config.user_override {
            return user_override.signing_key().await.map_err(|e| {
                DomainError::general_with(format!("{} override failed", self.kind), e)
            });
        }

        if let Some(value) = self.cached_value(now_millis()) {
            return Ok(value);
        }

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.load_or_generate().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_conflict() && attempt < MAX_GENERATION_ATTEMPTS => {
                    warn!(key = %self.kind, attempt, error = %err, "signing key write conflicted, retrying");
                }
                Err(err) => {
                    return Err(DomainError::general_with(
                        format!("failed to load {}", self.kind),
                        err,
                    ))
                }
            }
        }
    }

    fn is_stale(&self, key: &SigningKey, now_ms: i64) -> bool {
        self.config.dynamic && key.is_stale_at(now_ms, self.config.update_interval_ms())
    }

    fn cached_value(&self, now_ms: i64) -> Option<String> {
        let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
        cache
            .as_ref()
            .filter(|key| !self.is_stale(key, now_ms))
            .map(|key| key.key_value.clone())
    }

    fn store_cache(&self, key: Option<SigningKey>) {
        *self.cache.write().unwrap_or_else(PoisonError::into_inner) = key;
    }

    async fn load_or_generate(&self) -> StorageResult<String> {
        let mut tx = self.storage.begin().await?;

        match self.read_or_rotate(&mut tx).await {
            Ok(key) => {
                // A key whose commit never finished may have been rolled back,
                // so the cache only sees it after commit returns.
                tx.commit().await?;
                let value = key.key_value.clone();
                self.store_cache(Some(key));
                Ok(value)
            }
            Err(err) => {
                tx.mark_for_destruction();
                Err(err)
            }
        }
    }

    async fn read_or_rotate(&self, tx: &mut S::Tx) -> StorageResult<SigningKey> {
        let existing = tx.get_key_for_update(self.kind.key_name()).await?;
        // Clock is read once the row lock is granted.
        let now = now_millis();

        match existing {
            Some(key) if self.is_stale(&key, now) => {
                let rotated = SigningKey::new(self.kind, generate_signing_secret(), now);
                tx.update_key(&rotated).await?;
                info!(key = %self.kind, "rotated signing key");
                Ok(rotated)
            }
            Some(key) => {
                debug!(key = %self.kind, "loaded signing key");
                Ok(key)
            }
            None => {
                let created = SigningKey::new(self.kind, generate_signing_secret(), now);
                tx.insert_key(&created).await?;
                info!(key = %self.kind, "generated signing key");
                Ok(created)
            }
        }
    }
}
