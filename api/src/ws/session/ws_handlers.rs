use chrono::Utc;
use db::models::{attendance_mark, session};
use util::state::AppState;
use util::ws::{Connection, Flow, WsHandler, close_code};

use super::payload::{
    ConnectionEstablished, Entry, IncomingKind, Pong, SessionEnded, SessionEvent, SessionIncoming,
    SessionInfo,
};

/// Number of marks returned for `get_entries`.
pub const RECENT_ENTRIES_LIMIT: u64 = 20;

pub const REASON_ENDED: &str = "Session ended by instructor";
pub const REASON_INTERNAL: &str = "Internal server error";

/// Handles one instructor connection for one session.
pub struct SessionWsHandler {
    state: AppState,
    session: session::Model,
    user_name: String,
}

impl SessionWsHandler {
    pub fn new(state: AppState, session: session::Model, user_name: impl Into<String>) -> Self {
        Self {
            state,
            session,
            user_name: user_name.into(),
        }
    }

    async fn reply(&self, conn: &Connection, event: SessionEvent) {
        if let Err(e) = conn.send_json(&event).await {
            tracing::debug!(connection_id = %conn.id(), "Reply dropped: {e}");
        }
    }

    async fn send_entries(&self, conn: &Connection) {
        match attendance_mark::Model::list_recent(self.state.db(), &self.session.id, RECENT_ENTRIES_LIMIT).await {
            Ok(marks) => {
                let entries = marks.into_iter().map(Entry::from).collect();
                self.reply(conn, SessionEvent::EntriesList(entries)).await;
            }
            Err(e) => {
                tracing::error!(session_id = %self.session.id, "Failed to load entries: {e}");
                self.reply(conn, SessionEvent::error("Failed to load entries")).await;
            }
        }
    }

    async fn end_session(&self, conn: &Connection) -> Flow {
        let now = Utc::now();
        match session::Model::deactivate(self.state.db(), &self.session.id, Some(self.session.owner_id), now).await {
            Ok(_) => {
                tracing::info!(session_id = %self.session.id, "Session ended by instructor");
                self.reply(conn, SessionEvent::SessionEnded(SessionEnded { ended_at: now })).await;
                Flow::close(close_code::NORMAL, REASON_ENDED)
            }
            Err(e) => {
                tracing::error!(session_id = %self.session.id, "Failed to end session: {e}");
                self.reply(conn, SessionEvent::error("Failed to end session")).await;
                Flow::Continue
            }
        }
    }
}

impl WsHandler for SessionWsHandler {
    type In = SessionIncoming;

    async fn on_open(&self, conn: &Connection) {
        let now = Utc::now();
        self.reply(
            conn,
            SessionEvent::ConnectionEstablished(ConnectionEstablished {
                session_id: self.session.id.clone(),
                user_id: conn.user_id(),
                user: self.user_name.clone(),
                expires_at: self.session.expiry_time,
                connected_at: now,
            }),
        )
        .await;

        match attendance_mark::Model::count_for_session(self.state.db(), &self.session.id).await {
            Ok(total_entries) => {
                self.reply(
                    conn,
                    SessionEvent::SessionInfo(SessionInfo {
                        session_id: self.session.id.clone(),
                        total_entries,
                        session_created: self.session.created_at,
                        expires_in: self.session.remaining(now).num_milliseconds(),
                    }),
                )
                .await;
            }
            Err(e) => {
                tracing::error!(session_id = %self.session.id, "Failed to count entries: {e}");
                conn.close(close_code::ERROR, REASON_INTERNAL);
            }
        }
    }

    async fn on_message(&self, conn: &Connection, msg: Self::In) -> Flow {
        match msg.kind {
            IncomingKind::Ping => {
                self.reply(conn, SessionEvent::Pong(Pong { timestamp: Utc::now() })).await;
                Flow::Continue
            }
            IncomingKind::GetEntries => {
                self.send_entries(conn).await;
                Flow::Continue
            }
            IncomingKind::EndSession => self.end_session(conn).await,
            IncomingKind::Unknown => {
                self.reply(conn, SessionEvent::error("Unknown message type")).await;
                Flow::Continue
            }
        }
    }

    async fn on_malformed(&self, conn: &Connection, err: serde_json::Error) {
        tracing::debug!(connection_id = %conn.id(), "Malformed message: {err}");
        self.reply(conn, SessionEvent::error("Invalid message format")).await;
    }

    async fn on_close(&self, conn: &Connection) {
        tracing::info!(session_id = %self.session.id, connection_id = %conn.id(), "Instructor disconnected");
    }
}
