use axum::{Json, Router, extract::State, response::IntoResponse, routing::get};
use serde::Serialize;
use util::state::AppState;

use crate::response::ApiResponse;

/// Builds the `/health` route.
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub live_sessions: usize,
}

/// GET /api/health
///
/// Returns a success message and the number of sessions with a bound connection.
///
/// ### Response
/// - `200 OK`
///
/// ```json
/// {
///   "success": true,
///   "data": { "status": "OK", "live_sessions": 2 },
///   "message": "Health check passed"
/// }
/// ```
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let report = HealthReport {
        status: "OK",
        live_sessions: state.registry().len(),
    };
    Json(ApiResponse::success(report, "Health check passed"))
}
