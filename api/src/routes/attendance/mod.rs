//! # Attendance Routes
//!
//! - `POST /attendance` → submit a check-in for a session
//! - `GET /attendance/cooldown` → the caller's cooldown status
//!
//! Open to any authenticated user.

use axum::{
    Router,
    routing::{get, post},
};
use util::state::AppState;

pub mod get;
pub mod post;

use get::get_cooldown;
use post::submit_attendance;

pub fn attendance_routes() -> Router<AppState> {
    Router::new()
        .route("/attendance", post(submit_attendance))
        .route("/attendance/cooldown", get(get_cooldown))
}
