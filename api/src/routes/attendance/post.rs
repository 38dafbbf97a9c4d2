use axum::{Extension, Json, http::StatusCode, response::IntoResponse};
use serde::Deserialize;
use validator::Validate;

use crate::auth::claims::AuthUser;
use crate::response::{ApiResponse, Empty};
use crate::routes::common::format_validation_errors;
use crate::services::checkin::{CheckinDispatcher, CheckinError};

#[derive(Debug, Deserialize, Validate)]
pub struct CheckinRequest {
    #[validate(length(min = 1, message = "ssn_id is required"))]
    pub ssn_id: String,
}

/// POST /api/attendance
///
/// Accepts a check-in for the caller. Only the session is checked before answering;
/// the cooldown, the write and the notification to the instructor happen afterwards.
///
/// ### Request Body
/// ```json
/// { "ssn_id": "K3F9QZ2A" }
/// ```
///
/// ### Response: 202 Accepted
/// ```json
/// { "success": true, "data": null, "message": "Attendance request received" }
/// ```
///
/// ### Errors
/// - 400 Bad Request → missing `ssn_id`
/// - 404 Not Found → unknown, stopped or expired session
/// - 500 Internal Server Error → database error
pub async fn submit_attendance(
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Extension(dispatcher): Extension<CheckinDispatcher>,
    Json(req): Json<CheckinRequest>,
) -> impl IntoResponse {
    if let Err(e) = req.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<Empty>::error(format_validation_errors(&e))),
        );
    }

    match dispatcher.submit(req.ssn_id.trim(), claims.sub).await {
        Ok(_) => (
            StatusCode::ACCEPTED,
            Json(ApiResponse::success(Empty, "Attendance request received")),
        ),
        Err(CheckinError::SessionNotFound) => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error("Session not found")),
        ),
        Err(e) => {
            tracing::error!(user_id = claims.sub, session_id = %req.ssn_id, "Check-in rejected: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error("Failed to process attendance request")),
            )
        }
    }
}
