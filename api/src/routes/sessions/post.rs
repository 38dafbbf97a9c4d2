use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use db::models::session;
use serde::{Deserialize, Serialize};
use util::state::AppState;
use validator::Validate;

use crate::auth::claims::AuthUser;
use crate::response::{ApiResponse, Empty};
use crate::routes::common::{SessionResponse, format_validation_errors};

/// Close reason sent to a live connection when its session is stopped over HTTP.
pub const REASON_STOPPED: &str = "session stopped";

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSessionRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 100, message = "name must be between 1 and 100 characters"))]
    pub name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedSession {
    pub ssn_id: String,
    pub name: Option<String>,
    pub expiry_time: DateTime<Utc>,
}

/// POST /api/sessions
///
/// Starts a new attendance session owned by the caller. It stays open for the
/// configured TTL unless stopped earlier.
///
/// ### Request Body
/// ```json
/// { "name": "Lecture 4" }
/// ```
/// `name` is optional; `{}` starts an unnamed session.
///
/// ### Response: 201 Created
/// ```json
/// {
///   "success": true,
///   "data": { "ssn_id": "K3F9QZ2A", "name": "Lecture 4", "expiry_time": "2025-10-18T10:10:00Z" },
///   "message": "Session created"
/// }
/// ```
///
/// ### Errors
/// - 400 Bad Request → validation failure
/// - 500 Internal Server Error → database error
pub async fn create_session(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Json(req): Json<CreateSessionRequest>,
) -> impl IntoResponse {
    if let Err(e) = req.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<Empty>::error(format_validation_errors(&e))),
        )
            .into_response();
    }

    let name = req.name.as_deref().map(str::trim).filter(|n| !n.is_empty());
    match session::Model::create(state.db(), claims.sub, name, state.session_ttl(), Utc::now()).await {
        Ok(s) => {
            tracing::info!(session_id = %s.id, owner_id = claims.sub, "Session created");
            (
                StatusCode::CREATED,
                Json(ApiResponse::success(
                    CreatedSession {
                        ssn_id: s.id,
                        name: s.name,
                        expiry_time: s.expiry_time,
                    },
                    "Session created",
                )),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!(owner_id = claims.sub, "Failed to create session: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<Empty>::error("Failed to create session")),
            )
                .into_response()
        }
    }
}

/// POST /api/sessions/{ssn_id}/stop
///
/// Deactivates an active session owned by the caller, clamps its expiry to now and
/// closes the instructor's live connection for it, if any.
///
/// ### Response: 200 OK
/// The stopped session, with `active: false`.
///
/// ### Errors
/// - 404 Not Found → no active session with that id owned by the caller
/// - 500 Internal Server Error → database error
pub async fn stop_session(
    State(state): State<AppState>,
    Path(ssn_id): Path<String>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
) -> impl IntoResponse {
    match session::Model::deactivate(state.db(), &ssn_id, Some(claims.sub), Utc::now()).await {
        Ok(Some(stopped)) => {
            let closed = state.registry().close_session(&ssn_id, REASON_STOPPED);
            tracing::info!(session_id = %ssn_id, owner_id = claims.sub, closed, "Session stopped");
            (
                StatusCode::OK,
                Json(ApiResponse::success(SessionResponse::from(stopped), "Session stopped")),
            )
                .into_response()
        }
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::<Empty>::error("Active session not found or already stopped")),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(session_id = %ssn_id, "Failed to stop session: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<Empty>::error("Failed to stop session")),
            )
                .into_response()
        }
    }
}
