//! Session rotation engine
//!
//! Implements the session protocol on top of the token codec, the signing key
//! stores and the storage contract:
//! - `create_new_session` issues a handle, a parentless refresh token and an access token
//! - `get_session` verifies an access token and promotes its refresh token if still pending
//! - `refresh_session` rotates the refresh token and detects reuse of superseded tokens
//! - revocation and session data pass-throughs
//!
//! A refresh token is *current* when its double hash equals the row's
//! `refresh_token_hash2`, a *pending child* when it names the current token as
//! its parent, and a theft signal otherwise.

use std::future::Future;
use std::sync::Arc;

use se_shared::utils::time::{millis_after, now_millis};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::domain::entities::{
    AccessTokenPayload, Payload, RefreshTokenPayload, SessionRecord, SigningKeyKind, TokenInfo,
};
use crate::domain::value_objects::{NewSession, RefreshOutcome, SessionInfo, VerifiedSession};
use crate::errors::{DomainError, DomainResult};
use crate::repositories::{SessionTransaction, Storage, UnitOfWork};
use crate::services::signing_key::{SigningKeyConfig, SigningKeyStore};
use crate::services::token::{
    access_token as access_codec, random_hex, refresh_token as refresh_codec, sha256_hex,
};

use super::config::SessionEngineConfig;

/// A pending child needs at most one promotion before it is current.
const MAX_REFRESH_ROUNDS: usize = 2;

/// Outcome of one locked pass over the session row during a refresh
enum RefreshStep {
    Promoted,
    Issued(RefreshOutcome),
    Theft(SessionInfo),
}

/// Secrets fetched once per refresh, before any row is locked
struct SigningSecrets {
    access: String,
    refresh: String,
}

/// The session engine context, constructed once and shared by handle
pub struct SessionEngine<S: Storage> {
    storage: Arc<S>,
    config: SessionEngineConfig,
    access_keys: SigningKeyStore<S>,
    refresh_keys: SigningKeyStore<S>,
}

impl<S: Storage> SessionEngine<S> {
    /// Wire the key stores; call [`SessionEngine::init`] before use
    pub fn new(storage: Arc<S>, config: SessionEngineConfig) -> Self {
        let access_keys = SigningKeyStore::new(
            Arc::clone(&storage),
            SigningKeyKind::AccessToken,
            config.access_token_signing_key.clone(),
        );
        // Refresh token keys are static.
        let refresh_keys = SigningKeyStore::new(
            Arc::clone(&storage),
            SigningKeyKind::RefreshToken,
            SigningKeyConfig::static_key(),
        );

        Self {
            storage,
            config,
            access_keys,
            refresh_keys,
        }
    }

    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    pub fn config(&self) -> &SessionEngineConfig {
        &self.config
    }

    /// Validate configuration, verify storage reachability and create the tables
    pub async fn init(&self) -> DomainResult<()> {
        self.config.validate()?;

        self.with_deadline("init", async move {
            self.storage
                .health_check()
                .await
                .map_err(|e| DomainError::general_with("storage is unreachable", e))?;
            self.storage
                .ensure_schema()
                .await
                .map_err(|e| DomainError::general_with("failed to create session tables", e))?;
            Ok(())
        })
        .await?;

        self.access_keys.mark_initialized();
        self.refresh_keys.mark_initialized();
        info!(config = ?self.config, "session engine initialised");
        Ok(())
    }

    /// Start a new session for `user_id`
    ///
    /// # Arguments
    /// * `user_id` - Identifier of the authenticated user
    /// * `jwt_payload` - Embedded into every access token of this session (empty object if absent)
    /// * `session_data` - Opaque data stored with the session row
    pub async fn create_new_session(
        &self,
        user_id: &str,
        jwt_payload: Option<Payload>,
        session_data: Option<Payload>,
    ) -> DomainResult<NewSession> {
        self.with_deadline("create_new_session", async move {
            let access_key = self.access_keys.get_key().await?;
            let refresh_key = self.refresh_keys.get_key().await?;
            let now = now_millis();

            let session = SessionInfo {
                handle: Uuid::new_v4().to_string(),
                user_id: user_id.to_string(),
                jwt_payload: jwt_payload.unwrap_or_default(),
            };

            let refresh_token = self.mint_refresh_token(&refresh_key, &session, None, now)?;
            let refresh_token_hash1 = sha256_hex(&refresh_token.token);
            let access_token = Self::sign_access_token(
                &access_key,
                &self.access_payload(&session, refresh_token_hash1.clone(), None, now),
            )?;

            let record = SessionRecord {
                session_handle_hash1: sha256_hex(&session.handle),
                user_id: session.user_id.clone(),
                refresh_token_hash2: sha256_hex(&refresh_token_hash1),
                session_data,
                jwt_payload: session.jwt_payload.clone(),
                expires_at: refresh_token.expires_at,
            };
            self.storage.create_session(&record).await?;
            info!(session = %record.session_handle_hash1, user_id = %session.user_id, "created session");

            Ok(NewSession {
                id_refresh_token: Self::mint_id_refresh_token(refresh_token.expires_at),
                session,
                access_token,
                refresh_token,
            })
        })
        .await
    }

    /// Authenticate a request by its access token
    ///
    /// Returns a replacement access token when the presented one still names a
    /// parent refresh token; that parent is promoted on the way.
    ///
    /// # Errors
    /// * `TryRefreshToken` - Access token missing, unverifiable or expired
    /// * `Unauthorised` - Id refresh token missing, or the session is gone or inconsistent
    pub async fn get_session(
        &self,
        id_refresh_token: Option<&str>,
        access_token: Option<&str>,
    ) -> DomainResult<VerifiedSession> {
        self.with_deadline("get_session", async move {
            if id_refresh_token.is_none() {
                return Err(DomainError::unauthorised("id refresh token is missing"));
            }
            let access_token = access_token
                .ok_or_else(|| DomainError::try_refresh_token("access token is missing"))?;

            let access_key = self.access_keys.get_key().await?;
            let payload: AccessTokenPayload = access_codec::verify_as(access_token, &access_key)
                .map_err(|e| DomainError::try_refresh_token(format!("access token rejected: {}", e)))?;

            let now = now_millis();
            if payload.is_expired_at(now) {
                return Err(DomainError::try_refresh_token("access token has expired"));
            }

            let parent = match &payload.parent_refresh_token_hash1 {
                Some(parent) => parent.clone(),
                None => {
                    return Ok(VerifiedSession {
                        session: SessionInfo {
                            handle: payload.session_handle,
                            user_id: payload.user_id,
                            jwt_payload: payload.user_payload,
                        },
                        new_access_token: None,
                    })
                }
            };

            let mut tx = self.storage.begin().await?;
            let result = self.promote_on_access(&mut tx, &payload, &parent, now).await;
            let session = Self::finish(tx, result).await?;

            let new_access_token = Self::sign_access_token(
                &access_key,
                &self.access_payload(&session, payload.refresh_token_hash1, None, now_millis()),
            )?;

            Ok(VerifiedSession {
                session,
                new_access_token: Some(new_access_token),
            })
        })
        .await
    }

    /// Rotate a refresh token
    ///
    /// # Returns
    /// * `RefreshOutcome::Rotated` - New access, refresh and id refresh tokens
    /// * `RefreshOutcome::TheftDetected` - The token was superseded; no tokens issued
    ///
    /// # Errors
    /// * `Unauthorised` - Token missing, undecryptable, or its session is gone
    pub async fn refresh_session(
        &self,
        id_refresh_token: Option<&str>,
        refresh_token: Option<&str>,
    ) -> DomainResult<RefreshOutcome> {
        self.with_deadline("refresh_session", async move {
            if id_refresh_token.is_none() {
                return Err(DomainError::unauthorised("id refresh token is missing"));
            }
            let refresh_token = refresh_token
                .ok_or_else(|| DomainError::unauthorised("refresh token is missing"))?;

            let secrets = SigningSecrets {
                refresh: self.refresh_keys.get_key().await?,
                access: self.access_keys.get_key().await?,
            };
            let payload = refresh_codec::decode(refresh_token, &secrets.refresh)
                .map_err(|e| DomainError::unauthorised(format!("refresh token rejected: {}", e)))?;
            let token_hash1 = sha256_hex(refresh_token);

            for _ in 0..MAX_REFRESH_ROUNDS {
                let mut tx = self.storage.begin().await?;
                let result = self
                    .refresh_step(&mut tx, &payload, &token_hash1, &secrets)
                    .await;

                match Self::finish(tx, result).await? {
                    RefreshStep::Issued(outcome) => return Ok(outcome),
                    RefreshStep::Promoted => continue,
                    RefreshStep::Theft(session) => {
                        self.report_theft(&session).await;
                        return Ok(RefreshOutcome::TheftDetected { session });
                    }
                }
            }

            Err(DomainError::general("refresh token promotion did not settle"))
        })
        .await
    }

    /// Delete one session
    ///
    /// # Returns
    /// * `Ok(true)` - A row was deleted
    /// * `Ok(false)` - No such session
    pub async fn revoke_session_using_session_handle(&self, session_handle: &str) -> DomainResult<bool> {
        self.with_deadline("revoke_session", async move {
            let hash1 = sha256_hex(session_handle);
            let deleted = self.storage.delete_session(&hash1).await?;
            info!(session = %hash1, deleted, "revoked session");
            Ok(deleted > 0)
        })
        .await
    }

    /// Delete every session of a user, one row at a time
    ///
    /// Not atomic: on error, sessions deleted so far stay deleted.
    pub async fn revoke_all_sessions_for_user(&self, user_id: &str) -> DomainResult<usize> {
        self.with_deadline("revoke_all_sessions", async move {
            let handles = self.storage.list_session_handles_for_user(user_id).await?;
            let mut revoked = 0;
            for hash1 in &handles {
                revoked += self.storage.delete_session(hash1).await? as usize;
            }
            info!(user_id = %user_id, revoked, "revoked all sessions for user");
            Ok(revoked)
        })
        .await
    }

    /// Read the opaque session data
    pub async fn get_session_data(&self, session_handle: &str) -> DomainResult<Option<Payload>> {
        self.with_deadline("get_session_data", async move {
            match self.storage.get_session_data(&sha256_hex(session_handle)).await? {
                Some(record) if !record.is_expired_at(now_millis()) => Ok(record.session_data),
                _ => Err(DomainError::unauthorised("session does not exist anymore")),
            }
        })
        .await
    }

    /// Overwrite the opaque session data; last write wins
    pub async fn update_session_data(
        &self,
        session_handle: &str,
        session_data: Option<Payload>,
    ) -> DomainResult<()> {
        self.with_deadline("update_session_data", async move {
            let updated = self
                .storage
                .update_session_data(&sha256_hex(session_handle), session_data.as_ref())
                .await?;
            if updated == 0 {
                return Err(DomainError::unauthorised("session does not exist anymore"));
            }
            Ok(())
        })
        .await
    }

    async fn promote_on_access(
        &self,
        tx: &mut S::Tx,
        payload: &AccessTokenPayload,
        parent_hash1: &str,
        now: i64,
    ) -> DomainResult<SessionInfo> {
        let hash1 = sha256_hex(&payload.session_handle);
        let row = match tx.get_session_for_update(&hash1).await? {
            Some(row) if !row.is_expired_at(now) => row,
            _ => return Err(DomainError::unauthorised("session does not exist or has expired")),
        };

        let own_hash2 = sha256_hex(&payload.refresh_token_hash1);
        if row.refresh_token_hash2 == sha256_hex(parent_hash1) {
            self.promote(tx, &row, &own_hash2, now).await?;
            info!(session = %hash1, "promoted refresh token on access");
        } else if row.refresh_token_hash2 != own_hash2 {
            return Err(DomainError::unauthorised(
                "access token does not match the session's refresh token",
            ));
        }

        Ok(SessionInfo {
            handle: payload.session_handle.clone(),
            user_id: row.user_id,
            jwt_payload: row.jwt_payload,
        })
    }

    async fn refresh_step(
        &self,
        tx: &mut S::Tx,
        payload: &RefreshTokenPayload,
        token_hash1: &str,
        secrets: &SigningSecrets,
    ) -> DomainResult<RefreshStep> {
        let hash1 = sha256_hex(&payload.session_handle);
        let now = now_millis();
        let row = match tx.get_session_for_update(&hash1).await? {
            Some(row) if !row.is_expired_at(now) => row,
            _ => return Err(DomainError::unauthorised("session does not exist or has expired")),
        };
        if row.user_id != payload.user_id {
            return Err(DomainError::unauthorised("refresh token user does not match the session"));
        }

        let session = SessionInfo {
            handle: payload.session_handle.clone(),
            user_id: row.user_id.clone(),
            jwt_payload: row.jwt_payload.clone(),
        };
        let own_hash2 = sha256_hex(token_hash1);

        if row.refresh_token_hash2 == own_hash2 {
            let parent = Some(token_hash1.to_string());
            let new_refresh_token =
                self.mint_refresh_token(&secrets.refresh, &session, parent.clone(), now)?;
            let new_access_token = Self::sign_access_token(
                &secrets.access,
                &self.access_payload(&session, sha256_hex(&new_refresh_token.token), parent, now),
            )?;
            debug!(session = %hash1, "issued child refresh token");

            return Ok(RefreshStep::Issued(RefreshOutcome::Rotated {
                new_id_refresh_token: Self::mint_id_refresh_token(new_refresh_token.expires_at),
                session,
                new_access_token,
                new_refresh_token,
            }));
        }

        if let Some(parent) = &payload.parent_refresh_token_hash1 {
            if row.refresh_token_hash2 == sha256_hex(parent) {
                self.promote(tx, &row, &own_hash2, now).await?;
                info!(session = %hash1, "promoted refresh token on refresh");
                return Ok(RefreshStep::Promoted);
            }
        }

        warn!(session = %hash1, user_id = %row.user_id, "refresh token reuse detected");
        Ok(RefreshStep::Theft(session))
    }

    /// Make `own_hash2` the current refresh token of the locked `row`
    async fn promote(
        &self,
        tx: &mut S::Tx,
        row: &SessionRecord,
        own_hash2: &str,
        now: i64,
    ) -> DomainResult<()> {
        let updated = tx
            .update_session(
                &row.session_handle_hash1,
                own_hash2,
                row.session_data.as_ref(),
                millis_after(now, self.config.refresh_token_validity),
            )
            .await?;
        if updated == 0 {
            return Err(DomainError::general("locked session row vanished during promotion"));
        }
        Ok(())
    }

    async fn report_theft(&self, session: &SessionInfo) {
        if let Some(handler) = &self.config.theft_handler {
            if let Err(err) = handler
                .on_theft_detected(&session.user_id, &session.handle)
                .await
            {
                error!(user_id = %session.user_id, error = %err, "theft handler failed");
            }
        }
    }

    /// Commit on success and on caller-facing rejections; destroy the
    /// connection on general errors, where the transaction state is unknown.
    async fn finish<T>(mut tx: S::Tx, result: DomainResult<T>) -> DomainResult<T> {
        match result {
            Ok(value) => {
                tx.commit().await?;
                Ok(value)
            }
            Err(err) if err.is_general() => {
                tx.mark_for_destruction();
                Err(err)
            }
            Err(err) => {
                tx.commit().await?;
                Err(err)
            }
        }
    }

    async fn with_deadline<T, F>(&self, operation: &'static str, future: F) -> DomainResult<T>
    where
        F: Future<Output = DomainResult<T>>,
    {
        match self.config.operation_timeout {
            Some(limit) => match tokio::time::timeout(limit, future).await {
                Ok(result) => result,
                Err(_) => Err(DomainError::general(format!(
                    "{} exceeded its {:?} deadline",
                    operation, limit
                ))),
            },
            None => future.await,
        }
    }

    fn mint_refresh_token(
        &self,
        secret: &str,
        session: &SessionInfo,
        parent_refresh_token_hash1: Option<String>,
        now: i64,
    ) -> DomainResult<TokenInfo> {
        let payload = RefreshTokenPayload {
            session_handle: session.handle.clone(),
            user_id: session.user_id.clone(),
            nonce: random_hex(32),
            parent_refresh_token_hash1,
        };
        let token = refresh_codec::encode(&payload, secret)
            .map_err(|e| DomainError::general_with("failed to encode refresh token", e))?;
        Ok(TokenInfo::new(
            token,
            millis_after(now, self.config.refresh_token_validity),
        ))
    }

    fn access_payload(
        &self,
        session: &SessionInfo,
        refresh_token_hash1: String,
        parent_refresh_token_hash1: Option<String>,
        now: i64,
    ) -> AccessTokenPayload {
        AccessTokenPayload {
            session_handle: session.handle.clone(),
            user_id: session.user_id.clone(),
            refresh_token_hash1,
            parent_refresh_token_hash1,
            expiry_time: millis_after(now, self.config.access_token_validity),
            user_payload: session.jwt_payload.clone(),
        }
    }

    fn sign_access_token(secret: &str, payload: &AccessTokenPayload) -> DomainResult<TokenInfo> {
        let token = access_codec::encode(payload, secret)
            .map_err(|e| DomainError::general_with("failed to sign access token", e))?;
        Ok(TokenInfo::new(token, payload.expiry_time))
    }

    fn mint_id_refresh_token(expires_at: i64) -> TokenInfo {
        TokenInfo::new(Uuid::new_v4().to_string(), expires_at)
    }
}
