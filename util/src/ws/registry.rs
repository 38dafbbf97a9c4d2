//! Process-wide map from session id to the one connection listening for it.
//!
//! Backed by a sharded `DashMap`, so operations on different sessions never contend
//! for the same lock. Guards are never held across an `.await`: lookups clone the
//! `Arc<Connection>` out before sending.

use axum::extract::ws::close_code;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::time::Instant;

use super::connection::{Connection, TrySendError};

pub const REASON_SUPERSEDED: &str = "superseded by new connection";
pub const REASON_SHUTDOWN: &str = "server shutting down";

/// Session id → bound connection.
///
/// - `bind` replaces (and closes) any previous connection for the same session
/// - `unbind` only removes the binding it is given, so a late close can't evict a newer socket
/// - `broadcast` drops events for sessions nobody is listening to
#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    bindings: Arc<DashMap<String, Arc<Connection>>>,
    shutting_down: Arc<AtomicBool>,
}

impl ConnectionRegistry {
    /// Creates a new, empty `ConnectionRegistry`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `conn` as the listener for `session_id`.
    ///
    /// A previous binding is closed with a normal-closure frame before it is replaced.
    /// While shutting down, `conn` itself is closed instead and `false` is returned.
    pub fn bind(&self, session_id: &str, conn: Arc<Connection>) -> bool {
        if self.is_shutting_down() {
            conn.close(close_code::AWAY, REASON_SHUTDOWN);
            return false;
        }

        match self.bindings.entry(session_id.to_string()) {
            Entry::Occupied(mut entry) => {
                let previous = entry.get();
                if previous.id() != conn.id() {
                    tracing::info!(
                        session_id,
                        old = %previous.id(),
                        new = %conn.id(),
                        "Replacing existing session connection"
                    );
                    previous.close(close_code::NORMAL, REASON_SUPERSEDED);
                }
                entry.insert(conn);
            }
            Entry::Vacant(entry) => {
                entry.insert(conn);
            }
        }
        true
    }

    /// Removes the binding for `session_id` only if it still points at `conn`.
    ///
    /// Returns whether a binding was removed. A `false` here is the expected outcome of a
    /// stale close racing a reconnect and is not an error.
    pub fn unbind(&self, session_id: &str, conn: &Connection) -> bool {
        let removed = self
            .bindings
            .remove_if(session_id, |_, current| current.id() == conn.id())
            .is_some();
        if !removed {
            tracing::debug!(session_id, connection_id = %conn.id(), "Stale unbind ignored");
        }
        removed
    }

    /// Returns the current binding for `session_id`, if any.
    pub fn lookup(&self, session_id: &str) -> Option<Arc<Connection>> {
        self.bindings.get(session_id).map(|entry| Arc::clone(entry.value()))
    }

    /// Serializes and queues `event` for the connection bound to `session_id`.
    ///
    /// Never waits. Returns whether the event was queued: it is dropped when no writable
    /// connection is bound or the listener's outbound queue is full.
    pub fn broadcast<T: Serialize>(&self, session_id: &str, event: &T) -> bool {
        let Some(conn) = self.lookup(session_id) else {
            tracing::debug!(session_id, "No listener bound; event dropped");
            return false;
        };
        if !conn.is_writable() {
            tracing::debug!(session_id, connection_id = %conn.id(), "Listener not writable; event dropped");
            return false;
        }
        match conn.try_send_json(event) {
            Ok(()) => true,
            Err(TrySendError::Full) => {
                tracing::warn!(session_id, connection_id = %conn.id(), "Listener is not keeping up; event dropped");
                false
            }
            Err(e) => {
                tracing::warn!(session_id, connection_id = %conn.id(), "Failed to deliver event: {e}");
                false
            }
        }
    }

    /// Closes and removes whatever connection is bound to `session_id`.
    pub fn close_session(&self, session_id: &str, reason: &str) -> bool {
        match self.bindings.remove(session_id) {
            Some((_, conn)) => {
                conn.close(close_code::NORMAL, reason);
                true
            }
            None => false,
        }
    }

    /// `true` if `session_id` has a writable listener.
    pub fn is_live(&self, session_id: &str) -> bool {
        self.lookup(session_id).is_some_and(|c| c.is_writable())
    }

    /// Session ids that currently have a binding.
    pub fn live_sessions(&self) -> Vec<String> {
        self.bindings.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::Acquire)
    }

    /// Closes every bound connection with "server shutting down" and waits up to `grace`
    /// for their lifecycles to unbind. Whatever is left afterwards is terminated and the
    /// map is cleared. Returns the number of connections that had to be forced.
    pub async fn shutdown(&self, grace: Duration) -> usize {
        self.shutting_down.store(true, Ordering::Release);

        let open: Vec<Arc<Connection>> = self
            .bindings
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        tracing::info!("Closing {} session connection(s)", open.len());
        for conn in &open {
            conn.close(close_code::AWAY, REASON_SHUTDOWN);
        }

        let deadline = Instant::now() + grace;
        while !self.bindings.is_empty() && Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(25)).await;
        }

        let remaining: Vec<Arc<Connection>> = self
            .bindings
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        if !remaining.is_empty() {
            tracing::warn!("Force closing {} connection(s) after grace period", remaining.len());
            for conn in &remaining {
                conn.terminate();
            }
            self.bindings.clear();
        }
        remaining.len()
    }
}
