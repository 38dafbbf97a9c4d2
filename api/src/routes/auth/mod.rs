//! # auth Routes Module
//!
//! Public routes that issue bearer tokens.
//!
//! - `POST /auth/register` → `register`
//! - `POST /auth/login` → `login`

pub mod post;

use axum::{Router, routing::post};
use util::state::AppState;

use post::{login, register};

/// Builds the `/auth` route group. No guard: these are how a client gets a token.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}
