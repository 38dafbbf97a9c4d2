pub mod claims;
pub mod extractors;
pub mod guards;
pub mod middleware;

pub use claims::{AuthUser, Claims};

use chrono::{Duration, Utc};
use db::models::user;
use util::jwt::{JwtError, JwtKeys};

/// Bearer credential failures shared by the HTTP guards and the WebSocket handshake.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Authentication token required")]
    MissingToken,
    #[error("Invalid token")]
    InvalidToken(#[source] JwtError),
}

/// Generates a JWT and its expiry timestamp for a given user.
pub fn generate_jwt(
    keys: &JwtKeys,
    user: &user::Model,
    duration_minutes: i64,
) -> Result<(String, String), JwtError> {
    let expiry = Utc::now() + Duration::minutes(duration_minutes);

    let claims = Claims {
        sub: user.id,
        name: user.name.clone(),
        role: user.role,
        exp: expiry.timestamp() as usize,
    };

    let token = keys.sign(&claims)?;
    Ok((token, expiry.to_rfc3339()))
}

/// Checks signature and expiry of a raw token. An empty string counts as missing.
pub fn verify_token(keys: &JwtKeys, token: Option<&str>) -> Result<Claims, AuthError> {
    let token = token.filter(|t| !t.is_empty()).ok_or(AuthError::MissingToken)?;
    keys.verify::<Claims>(token).map_err(AuthError::InvalidToken)
}
