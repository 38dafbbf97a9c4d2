//! HTTP and WebSocket surface of the attendance server.
//!
//! `app` assembles the full router; the binary only adds configuration,
//! logging, migrations and graceful shutdown around it.

use axum::{
    Extension, Router,
    http::header::CONTENT_TYPE,
    middleware::from_fn_with_state,
};
use tower_http::cors::CorsLayer;
use util::state::AppState;

pub mod auth;
pub mod response;
pub mod routes;
pub mod services;
pub mod ws;

use auth::middleware::log_request;
use services::checkin::CheckinDispatcher;

/// Builds the application router:
/// - `/api/...` HTTP routes
/// - `/ws/session` instructor session socket
pub fn app(state: AppState) -> Router {
    let dispatcher = CheckinDispatcher::from_state(&state);
    let cors = CorsLayer::very_permissive().expose_headers([CONTENT_TYPE]);

    Router::new()
        .nest("/api", routes::routes(state.clone()).layer(Extension(dispatcher)))
        .nest("/ws", ws::ws_routes())
        .layer(from_fn_with_state(state.clone(), log_request))
        .layer(cors)
        .with_state(state)
}
