//! Results of the public session operations.

use serde::Serialize;

use crate::domain::entities::{Payload, TokenInfo};

/// Identity of an authenticated session
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    /// Plaintext session handle, needed for revocation and session data access
    pub handle: String,
    pub user_id: String,
    pub jwt_payload: Payload,
}

/// Result of `create_new_session`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSession {
    pub session: SessionInfo,
    pub access_token: TokenInfo,
    pub refresh_token: TokenInfo,
    pub id_refresh_token: TokenInfo,
}

/// Result of `get_session`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedSession {
    pub session: SessionInfo,
    /// Set when the presented access token had to be replaced
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_access_token: Option<TokenInfo>,
}

/// Result of `refresh_session`
///
/// Theft is a successful result, not an error, so the caller decides policy.
#[derive(Debug, Clone)]
pub enum RefreshOutcome {
    Rotated {
        session: SessionInfo,
        new_access_token: TokenInfo,
        new_refresh_token: TokenInfo,
        new_id_refresh_token: TokenInfo,
    },
    TheftDetected { session: SessionInfo },
}

impl RefreshOutcome {
    pub fn session_theft_detected(&self) -> bool {
        matches!(self, RefreshOutcome::TheftDetected { .. })
    }

    pub fn session(&self) -> &SessionInfo {
        match self {
            RefreshOutcome::Rotated { session, .. } => session,
            RefreshOutcome::TheftDetected { session } => session,
        }
    }
}
