//! A single bound WebSocket connection as seen by the rest of the server.
//!
//! The socket itself is owned by the lifecycle loop in [`super::serve`]; everything
//! else talks to the client through this handle, which only enqueues frames for the
//! writer task and records close requests.

use axum::extract::ws::{CloseFrame, Message, Utf8Bytes};
use serde::Serialize;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a connection. Used to tell a stale binding from a fresh one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Per-connection lifecycle states.
///
/// `Connecting`, `Authenticating` and `Authorizing` happen before a handle exists;
/// a [`Connection`] starts life in `Bound`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LifecycleState {
    Connecting = 0,
    Authenticating = 1,
    Authorizing = 2,
    Bound = 3,
    Closing = 4,
    Closed = 5,
}

impl LifecycleState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Connecting,
            1 => Self::Authenticating,
            2 => Self::Authorizing,
            3 => Self::Bound,
            4 => Self::Closing,
            _ => Self::Closed,
        }
    }
}

/// Returned when a frame cannot be queued because the connection is going away.
#[derive(Debug, thiserror::Error)]
#[error("connection is closed")]
pub struct ConnectionClosed;

/// Why [`Connection::try_send_json`] could not queue a frame.
#[derive(Debug, thiserror::Error)]
pub enum TrySendError {
    #[error("outbound queue is full")]
    Full,
    #[error(transparent)]
    Closed(#[from] ConnectionClosed),
}

pub struct Connection {
    id: ConnectionId,
    session_id: String,
    user_id: i64,
    // enqueue frames for the writer task
    out_tx: mpsc::Sender<Message>,
    state: AtomicU8,
    close_frame: Mutex<Option<CloseFrame>>,
    closing: CancellationToken,
    terminated: CancellationToken,
}

impl Connection {
    pub fn new(session_id: impl Into<String>, user_id: i64, out_tx: mpsc::Sender<Message>) -> Self {
        Self {
            id: ConnectionId::next(),
            session_id: session_id.into(),
            user_id,
            out_tx,
            state: AtomicU8::new(LifecycleState::Bound as u8),
            close_frame: Mutex::new(None),
            closing: CancellationToken::new(),
            terminated: CancellationToken::new(),
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    pub fn state(&self) -> LifecycleState {
        LifecycleState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub(crate) fn set_state(&self, state: LifecycleState) {
        self.state.store(state as u8, Ordering::Release);
    }

    /// `true` while the connection is bound and its writer is still accepting frames.
    pub fn is_writable(&self) -> bool {
        self.state() == LifecycleState::Bound
            && !self.closing.is_cancelled()
            && !self.out_tx.is_closed()
    }

    /// Queue a raw frame for this client only.
    ///
    /// Waits for queue space, but gives up as soon as the connection is terminated.
    pub async fn send(&self, msg: Message) -> Result<(), ConnectionClosed> {
        tokio::select! {
            biased;
            _ = self.terminated.cancelled() => Err(ConnectionClosed),
            res = self.out_tx.send(msg) => res.map_err(|_| ConnectionClosed),
        }
    }

    /// Queue a single text frame.
    pub async fn send_text(&self, text: impl Into<Utf8Bytes>) -> Result<(), ConnectionClosed> {
        self.send(Message::Text(text.into())).await
    }

    /// Serialize `event` as JSON and queue it.
    pub async fn send_json<T: Serialize>(&self, event: &T) -> Result<(), ConnectionClosed> {
        match serde_json::to_string(event) {
            Ok(json) => self.send_text(json).await,
            Err(e) => {
                tracing::error!(connection_id = %self.id, "Failed to serialize WS event: {e}");
                Ok(())
            }
        }
    }

    /// Serialize `event` and queue it without waiting. A full queue drops the frame.
    pub fn try_send_json<T: Serialize>(&self, event: &T) -> Result<(), TrySendError> {
        let json = match serde_json::to_string(event) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(connection_id = %self.id, "Failed to serialize WS event: {e}");
                return Ok(());
            }
        };
        self.out_tx
            .try_send(Message::Text(json.into()))
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => TrySendError::Full,
                mpsc::error::TrySendError::Closed(_) => TrySendError::Closed(ConnectionClosed),
            })
    }

    /// Ask the lifecycle loop to close with `code` and `reason`.
    ///
    /// Idempotent: the first close request wins and later ones are ignored.
    /// Returns `true` if this call initiated the close.
    pub fn close(&self, code: u16, reason: &str) -> bool {
        let mut initiated = false;
        if let Ok(mut slot) = self.close_frame.lock() {
            if slot.is_none() && !self.closing.is_cancelled() {
                *slot = Some(CloseFrame {
                    code,
                    reason: Utf8Bytes::from(reason),
                });
                initiated = true;
            }
        }
        self.closing.cancel();
        initiated
    }

    /// Drop the connection without waiting for the close handshake.
    pub fn terminate(&self) {
        self.closing.cancel();
        self.terminated.cancel();
    }

    pub fn is_closing(&self) -> bool {
        self.closing.is_cancelled()
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated.is_cancelled()
    }

    /// The close frame requested so far, if any.
    pub fn close_frame(&self) -> Option<CloseFrame> {
        self.close_frame.lock().ok().and_then(|slot| slot.clone())
    }

    pub(crate) async fn closing(&self) {
        self.closing.cancelled().await
    }

    pub(crate) async fn terminated(&self) {
        self.terminated.cancelled().await
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("session_id", &self.session_id)
            .field("user_id", &self.user_id)
            .field("state", &self.state())
            .finish()
    }
}
