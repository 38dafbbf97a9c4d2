use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
};
use axum_extra::extract::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use util::state::AppState;

use crate::auth::{AuthError, claims::AuthUser, verify_token};
use crate::response::{ApiResponse, Empty};

/// Implements extraction of `AuthUser` from request headers.
///
/// Reuses the `AuthUser` a guard already placed in the request extensions; otherwise
/// reads the Bearer token from the `Authorization` header and verifies it with the
/// keys held in `AppState`.
///
/// # Errors
/// - Returns `401 Unauthorized` if the header is missing, malformed, or the token is invalid or expired.
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = (StatusCode, Json<ApiResponse<Empty>>);

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }

        let bearer = TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
            .await
            .ok()
            .map(|TypedHeader(Authorization(bearer))| bearer);

        let claims = verify_token(state.jwt(), bearer.as_ref().map(|b| b.token())).map_err(|e| {
            let message = match e {
                AuthError::MissingToken => "Authentication required",
                AuthError::InvalidToken(_) => "Invalid or expired token",
            };
            (StatusCode::UNAUTHORIZED, Json(ApiResponse::error(message)))
        })?;

        Ok(AuthUser(claims))
    }
}
