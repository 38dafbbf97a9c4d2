use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use util::state::AppState;

use crate::auth::claims::AuthUser;
use crate::response::{ApiResponse, Empty};
use crate::services::cooldown;

/// GET /api/attendance/cooldown
///
/// Reports whether the caller may mark attendance now. Read-only.
///
/// ### Response: 200 OK
/// ```json
/// {
///   "success": true,
///   "data": {
///     "is_active": true,
///     "can_mark_attendance": false,
///     "timestamp": "2025-10-18T10:05:00Z",
///     "last_marked": "2025-10-18T10:00:00Z",
///     "cooldown": {
///       "total_minutes": 15,
///       "remaining_ms": 600000,
///       "remaining_formatted": { "minutes": 10, "seconds": 0 },
///       "expires_at": "2025-10-18T10:15:00Z",
///       "expires_in": 600
///     },
///     "cooldown_policy": { "minutes": 15, "milliseconds": 900000, "description": "15 minutes between attendance marks" }
///   },
///   "message": "Cooldown status retrieved"
/// }
/// ```
pub async fn get_cooldown(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
) -> impl IntoResponse {
    match cooldown::check_timeout(state.db(), claims.sub, Utc::now()).await {
        Ok(status) => (
            StatusCode::OK,
            Json(ApiResponse::success(status, "Cooldown status retrieved")),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(user_id = claims.sub, "Failed to check cooldown: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<Empty>::error("Failed to check cooldown status")),
            )
                .into_response()
        }
    }
}
