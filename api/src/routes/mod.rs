//! HTTP route entry point for `/api/...`.
//!
//! Route groups:
//! - `/health` → Health check endpoint (public)
//! - `/auth` → Registration and login (public)
//! - `/sessions` → Session lifecycle and history (instructors only)
//! - `/attendance` → Check-in and cooldown status (any authenticated user)

use crate::auth::guards::{allow_authenticated, allow_instructor};
use crate::routes::{
    attendance::attendance_routes, auth::auth_routes, health::health_routes, sessions::session_routes,
};
use axum::{Router, middleware::from_fn_with_state};
use util::state::AppState;

pub mod attendance;
pub mod auth;
pub mod common;
pub mod health;
pub mod sessions;

/// Builds the `/api` router. Guards are attached per group.
pub fn routes(app_state: AppState) -> Router<AppState> {
    Router::new()
        .merge(health_routes())
        .merge(auth_routes())
        .merge(session_routes().route_layer(from_fn_with_state(app_state.clone(), allow_instructor)))
        .merge(attendance_routes().route_layer(from_fn_with_state(app_state, allow_authenticated)))
}
