use serde::de::DeserializeOwned;
use std::future::Future;

use super::connection::Connection;

/// What the lifecycle loop should do after a message was handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Close { code: u16, reason: String },
}

impl Flow {
    pub fn close(code: u16, reason: impl Into<String>) -> Self {
        Flow::Close {
            code,
            reason: reason.into(),
        }
    }
}

pub trait WsHandler: Send + Sync + 'static {
    /// The incoming message type your handler understands (tagged enum recommended)
    type In: DeserializeOwned + Send;

    /// Called once after the connection is bound in the registry.
    fn on_open(&self, conn: &Connection) -> impl Future<Output = ()> + Send {
        async move {
            let _ = conn;
        }
    }

    /// Called for every parsed text message of type `Self::In`.
    fn on_message(&self, conn: &Connection, msg: Self::In) -> impl Future<Output = Flow> + Send;

    /// Called when a text frame fails to parse as `Self::In`.
    fn on_malformed(
        &self,
        conn: &Connection,
        err: serde_json::Error,
    ) -> impl Future<Output = ()> + Send {
        async move {
            tracing::warn!(connection_id = %conn.id(), "WS invalid message: {err}");
        }
    }

    /// Called once while the connection is closing, after it has been unbound.
    fn on_close(&self, conn: &Connection) -> impl Future<Output = ()> + Send {
        async move {
            let _ = conn;
        }
    }
}
