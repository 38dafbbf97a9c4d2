use axum::extract::ws::{CloseFrame, Message, Utf8Bytes, WebSocket, close_code};
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::{sync::mpsc, time};

use super::connection::{Connection, LifecycleState};
use super::handler_trait::{Flow, WsHandler};
use super::registry::ConnectionRegistry;

#[derive(Debug, Clone)]
pub struct WsServerOptions {
    /// Interval between transport-level pings while bound.
    pub heartbeat: Duration,
    /// Outbound frames buffered per connection. Broadcasts past this are dropped, replies wait.
    pub queue_capacity: usize,
    /// How long teardown waits for the close frame to be written.
    pub close_grace: Duration,
}

impl Default for WsServerOptions {
    fn default() -> Self {
        Self {
            heartbeat: Duration::from_secs(30),
            queue_capacity: 64,
            close_grace: Duration::from_secs(2),
        }
    }
}

/// Runs the bound part of a session connection: bind, message loop, heartbeat and teardown.
///
/// The caller has already authenticated the user and authorized the session. Teardown
/// (unbind, `on_close`, close frame) runs on every exit path, whether the client closed,
/// the transport failed, a handler asked to close, or the registry shut down.
pub async fn serve_session<H: WsHandler>(
    socket: WebSocket,
    registry: ConnectionRegistry,
    session_id: String,
    user_id: i64,
    handler: Arc<H>,
    opts: WsServerOptions,
) {
    let (mut sink, mut stream) = socket.split();

    // Outbound queue and writer task
    let (out_tx, mut out_rx) = mpsc::channel::<Message>(opts.queue_capacity.max(1));
    let mut writer = tokio::spawn(async move {
        while let Some(frame) = out_rx.recv().await {
            let is_close = matches!(frame, Message::Close(_));
            if sink.send(frame).await.is_err() || is_close {
                break;
            }
        }
    });

    let conn = Arc::new(Connection::new(session_id.clone(), user_id, out_tx));
    if registry.bind(&session_id, Arc::clone(&conn)) {
        tracing::info!(session_id = %session_id, user_id, connection_id = %conn.id(), "Session connection bound");
        handler.on_open(&conn).await;
    }

    let mut heartbeat = time::interval(opts.heartbeat);
    heartbeat.set_missed_tick_behavior(time::MissedTickBehavior::Delay);
    // first tick completes immediately
    heartbeat.tick().await;

    loop {
        tokio::select! {
            biased;

            _ = conn.closing() => break,

            _ = heartbeat.tick() => {
                // a client that stopped reading must not hold the loop past a close request
                let sent = tokio::select! {
                    res = conn.send(Message::Ping(Bytes::new())) => res.is_ok(),
                    _ = conn.closing() => false,
                };
                if !sent {
                    break;
                }
            }

            incoming = stream.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    match serde_json::from_str::<H::In>(text.as_str()) {
                        Ok(msg) => {
                            if let Flow::Close { code, reason } = handler.on_message(&conn, msg).await {
                                conn.close(code, &reason);
                            }
                        }
                        Err(e) => handler.on_malformed(&conn, e).await,
                    }
                }
                // tungstenite answers pings on its own
                Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => {}
                Some(Ok(Message::Binary(_))) => {
                    tracing::warn!(connection_id = %conn.id(), "Ignoring binary frame");
                }
                Some(Ok(Message::Close(frame))) => {
                    tracing::debug!(connection_id = %conn.id(), ?frame, "Client closed connection");
                    break;
                }
                Some(Err(e)) => {
                    tracing::debug!(connection_id = %conn.id(), "WS transport error: {e}");
                    break;
                }
                None => break,
            }
        }
    }

    conn.set_state(LifecycleState::Closing);
    registry.unbind(&session_id, &conn);
    handler.on_close(&conn).await;

    if conn.is_terminated() {
        writer.abort();
    } else {
        let frame = conn.close_frame().unwrap_or(CloseFrame {
            code: close_code::NORMAL,
            reason: Utf8Bytes::from_static(""),
        });
        let flushed = tokio::select! {
            _ = conn.terminated() => false,
            res = time::timeout(opts.close_grace, async {
                let _ = conn.send(Message::Close(Some(frame))).await;
                (&mut writer).await
            }) => res.is_ok(),
        };
        if !flushed {
            writer.abort();
        }
    }

    conn.set_state(LifecycleState::Closed);
    tracing::info!(session_id = %session_id, connection_id = %conn.id(), "Session connection closed");
}
