use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use db::models::{attendance_mark, session};
use serde::{Deserialize, Serialize};
use util::state::AppState;

use crate::auth::claims::AuthUser;
use crate::response::{ApiResponse, Empty};
use crate::routes::common::{EntryResponse, SessionResponse};

/// Sessions returned per history page.
pub const HISTORY_PAGE_SIZE: u64 = 15;

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    /// `created_at` of the last item of the previous page (RFC 3339).
    pub cursor: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub sessions: Vec<SessionResponse>,
    pub has_more: bool,
    pub next_cursor: Option<DateTime<Utc>>,
    pub count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EntriesResponse {
    pub ssn_id: String,
    pub entries: Vec<EntryResponse>,
    pub count: usize,
}

/// GET /api/sessions/history
///
/// Lists the caller's sessions, newest first, one page at a time.
///
/// ### Query Parameters
/// - `cursor` (optional): RFC 3339 timestamp; only sessions created strictly before it are returned
///
/// ### Response: 200 OK
/// ```json
/// {
///   "success": true,
///   "data": {
///     "sessions": [ { "ssn_id": "K3F9QZ2A", "name": null, "active": false, "created_at": "...", "expiry_time": "..." } ],
///     "has_more": true,
///     "next_cursor": "2025-10-18T09:00:00Z",
///     "count": 15
///   },
///   "message": "Session history retrieved"
/// }
/// ```
///
/// ### Errors
/// - 400 Bad Request → `cursor` is not a valid timestamp
pub async fn get_history(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Query(query): Query<HistoryQuery>,
) -> impl IntoResponse {
    let cursor = match query.cursor.as_deref().filter(|c| !c.is_empty()) {
        None => None,
        Some(raw) => match DateTime::parse_from_rfc3339(raw) {
            Ok(dt) => Some(dt.with_timezone(&Utc)),
            Err(_) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(ApiResponse::<Empty>::error("cursor must be an RFC 3339 timestamp")),
                )
                    .into_response();
            }
        },
    };

    // one extra row tells us whether another page exists
    let mut rows = match session::Model::history_for_owner(state.db(), claims.sub, cursor, HISTORY_PAGE_SIZE + 1).await {
        Ok(rows) => rows,
        Err(e) => {
            tracing::error!(owner_id = claims.sub, "Failed to load session history: {e}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<Empty>::error("Failed to load session history")),
            )
                .into_response();
        }
    };

    let has_more = rows.len() as u64 > HISTORY_PAGE_SIZE;
    rows.truncate(HISTORY_PAGE_SIZE as usize);
    let next_cursor = if has_more { rows.last().map(|s| s.created_at) } else { None };
    let sessions: Vec<SessionResponse> = rows.into_iter().map(SessionResponse::from).collect();

    let response = HistoryResponse {
        count: sessions.len(),
        sessions,
        has_more,
        next_cursor,
    };
    (
        StatusCode::OK,
        Json(ApiResponse::success(response, "Session history retrieved")),
    )
        .into_response()
}

/// GET /api/sessions/{ssn_id}/entries
///
/// Every attendance mark of a session owned by the caller, newest first.
///
/// ### Errors
/// - 404 Not Found → unknown session, or owned by someone else
pub async fn get_entries(
    State(state): State<AppState>,
    Path(ssn_id): Path<String>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
) -> impl IntoResponse {
    let db = state.db();

    let owned = match session::Model::find_by_id(db, &ssn_id).await {
        Ok(found) => found.filter(|s| s.owner_id == claims.sub),
        Err(e) => {
            tracing::error!(session_id = %ssn_id, "Failed to load session: {e}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<Empty>::error("Failed to load entries")),
            )
                .into_response();
        }
    };
    if owned.is_none() {
        return (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::<Empty>::error("Session not found")),
        )
            .into_response();
    }

    match attendance_mark::Model::list_for_session(db, &ssn_id).await {
        Ok(marks) => {
            let entries: Vec<EntryResponse> = marks.into_iter().map(EntryResponse::from).collect();
            let response = EntriesResponse {
                ssn_id,
                count: entries.len(),
                entries,
            };
            (
                StatusCode::OK,
                Json(ApiResponse::success(response, "Entries retrieved")),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!(session_id = %ssn_id, "Failed to load entries: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<Empty>::error("Failed to load entries")),
            )
                .into_response()
        }
    }
}
