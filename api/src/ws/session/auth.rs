use chrono::{DateTime, Utc};
use db::models::session;
use sea_orm::DbErr;
use util::state::AppState;
use util::ws::{LifecycleState, close_code};

use crate::auth::{AuthError, Claims, verify_token};

/// Why a session connection was refused before binding.
///
/// `Display` is the close reason sent to the client.
#[derive(Debug, thiserror::Error)]
pub enum HandshakeError {
    #[error("Authentication token required")]
    MissingToken,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Only instructors can connect")]
    NotInstructor,
    #[error("session_id is required")]
    MissingSessionId,
    #[error("Invalid or inactive session")]
    SessionNotFound,
    #[error("Session has expired")]
    SessionExpired,
    #[error("Internal server error")]
    Database(#[from] DbErr),
}

impl HandshakeError {
    pub fn close_code(&self) -> u16 {
        match self {
            HandshakeError::Database(_) => close_code::ERROR,
            _ => close_code::POLICY,
        }
    }

    /// The lifecycle stage the connection failed in.
    pub fn stage(&self) -> LifecycleState {
        match self {
            HandshakeError::MissingToken | HandshakeError::InvalidToken => LifecycleState::Authenticating,
            _ => LifecycleState::Authorizing,
        }
    }
}

impl From<AuthError> for HandshakeError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::MissingToken => HandshakeError::MissingToken,
            AuthError::InvalidToken(_) => HandshakeError::InvalidToken,
        }
    }
}

/// Authenticates the token and authorizes the caller for `session_id` at `now`.
///
/// Checks run in order and the first failure wins: credential, role, session id,
/// ownership with `active`, then expiry.
pub async fn authorize_connection(
    state: &AppState,
    token: Option<&str>,
    session_id: Option<&str>,
    now: DateTime<Utc>,
) -> Result<(Claims, session::Model), HandshakeError> {
    let claims = verify_token(state.jwt(), token)?;

    if !claims.is_instructor() {
        return Err(HandshakeError::NotInstructor);
    }

    let session_id = session_id
        .filter(|s| !s.is_empty())
        .ok_or(HandshakeError::MissingSessionId)?;

    let session = session::Model::find_active_owned(state.db(), session_id, claims.sub)
        .await?
        .ok_or(HandshakeError::SessionNotFound)?;

    if session.is_expired(now) {
        return Err(HandshakeError::SessionExpired);
    }

    Ok((claims, session))
}
