//! Application state container shared across Axum route handlers and services.
//!
//! This struct holds shared resources such as the database connection, the session
//! connection registry and the JWT keys. Every field is cheap to clone, so the state is
//! passed into route handlers by value via Axum's `State<T>` extractor.

use crate::jwt::JwtKeys;
use crate::ws::{ConnectionRegistry, WsServerOptions};
use sea_orm::DatabaseConnection;

/// Central application state shared across the server.
///
/// This includes:
/// - A cloned, thread-safe database connection for use with SeaORM.
/// - The process-wide `ConnectionRegistry` binding sessions to their live socket.
/// - HS256 keys for issuing and verifying tokens.
#[derive(Clone)]
pub struct AppState {
    db: DatabaseConnection,
    registry: ConnectionRegistry,
    jwt: JwtKeys,
    ws_options: WsServerOptions,
    session_ttl: chrono::Duration,
    jwt_duration_minutes: i64,
}

impl AppState {
    /// Creates a new `AppState` with default WebSocket options, a 10 minute session TTL
    /// and 60 minute tokens.
    pub fn new(db: DatabaseConnection, registry: ConnectionRegistry, jwt: JwtKeys) -> Self {
        Self {
            db,
            registry,
            jwt,
            ws_options: WsServerOptions::default(),
            session_ttl: chrono::Duration::minutes(10),
            jwt_duration_minutes: 60,
        }
    }

    pub fn with_ws_options(mut self, ws_options: WsServerOptions) -> Self {
        self.ws_options = ws_options;
        self
    }

    pub fn with_session_ttl(mut self, session_ttl: chrono::Duration) -> Self {
        self.session_ttl = session_ttl;
        self
    }

    pub fn with_jwt_duration(mut self, minutes: i64) -> Self {
        self.jwt_duration_minutes = minutes;
        self
    }

    /// Returns a shared reference to the internal `DatabaseConnection`.
    ///
    /// This is ideal when the caller does not need ownership.
    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Returns a shared reference to the session `ConnectionRegistry`.
    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    pub fn jwt(&self) -> &JwtKeys {
        &self.jwt
    }

    pub fn ws_options(&self) -> &WsServerOptions {
        &self.ws_options
    }

    /// How long a newly started session accepts check-ins.
    pub fn session_ttl(&self) -> chrono::Duration {
        self.session_ttl
    }

    /// Lifetime in minutes of tokens issued at login or registration.
    pub fn jwt_duration_minutes(&self) -> i64 {
        self.jwt_duration_minutes
    }
}

impl AppState {
    /// Returns a cloned copy of the database connection.
    ///
    /// Useful for async contexts or spawning tasks that require ownership.
    pub fn db_clone(&self) -> DatabaseConnection {
        self.db.clone()
    }

    /// Returns a cloned handle to the `ConnectionRegistry`.
    pub fn registry_clone(&self) -> ConnectionRegistry {
        self.registry.clone()
    }
}
