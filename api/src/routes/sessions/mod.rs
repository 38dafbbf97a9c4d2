//! # Session Routes
//!
//! - `POST /sessions` → start a session
//! - `POST /sessions/{ssn_id}/stop` → stop an owned session and close its connection
//! - `GET /sessions/history` → the caller's sessions, newest first
//! - `GET /sessions/{ssn_id}/entries` → marks of an owned session
//!
//! Instructor-only; the guard is attached in `routes`.

use axum::{
    Router,
    routing::{get, post},
};
use util::state::AppState;

pub mod get;
pub mod post;

use get::{get_history, get_entries};
use post::{create_session, stop_session};

pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/sessions", post(create_session))
        .route("/sessions/history", get(get_history))
        .route("/sessions/{ssn_id}/stop", post(stop_session))
        .route("/sessions/{ssn_id}/entries", get(get_entries))
}
