// util/src/ws/mod.rs
pub mod connection;
pub mod handler_trait;
pub mod registry;
pub mod serve;

pub use axum::extract::ws::close_code;
pub use connection::{Connection, ConnectionClosed, ConnectionId, LifecycleState, TrySendError};
pub use handler_trait::{Flow, WsHandler};
pub use registry::ConnectionRegistry;
pub use serve::{WsServerOptions, serve_session};
