use axum::{Router, routing::get};
use util::state::AppState;

use crate::ws::session::handlers::session_ws_handler;

pub mod session;

/// WebSocket entry points, mounted under `/ws`.
///
/// No auth layer here: the session socket authenticates from its query string so
/// that failures can be reported as close frames.
pub fn ws_routes() -> Router<AppState> {
    Router::new().route("/session", get(session_ws_handler))
}
