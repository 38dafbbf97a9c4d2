use chrono::{DateTime, Utc};
use db::models::attendance_mark;
use serde::{Deserialize, Serialize};

/// Every frame the server sends on a session connection: `{"type": ..., "data": ...}`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum SessionEvent {
    ConnectionEstablished(ConnectionEstablished),
    SessionInfo(SessionInfo),
    EntriesList(Vec<Entry>),
    Pong(Pong),
    AttendanceMarked(AttendanceNotice),
    AttendanceCooldown(AttendanceNotice),
    SessionEnded(SessionEnded),
    Error(ErrorPayload),
}

impl SessionEvent {
    pub fn error(message: impl Into<String>) -> Self {
        SessionEvent::Error(ErrorPayload {
            message: message.into(),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ConnectionEstablished {
    pub session_id: String,
    pub user_id: i64,
    pub user: String,
    pub expires_at: DateTime<Utc>,
    pub connected_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    pub session_id: String,
    pub total_entries: u64,
    pub session_created: DateTime<Utc>,
    /// Milliseconds until expiry, never negative.
    pub expires_in: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Entry {
    pub name: String,
    pub regd_no: String,
    pub created_at: DateTime<Utc>,
    pub user_id: i64,
}

impl From<attendance_mark::Model> for Entry {
    fn from(mark: attendance_mark::Model) -> Self {
        Self {
            name: mark.name,
            regd_no: mark.regd_no,
            created_at: mark.created_at,
            user_id: mark.user_id,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Pong {
    pub timestamp: DateTime<Utc>,
}

/// Sent for both new marks and repeat attempts inside the cooldown window.
#[derive(Debug, Clone, Serialize)]
pub struct AttendanceNotice {
    pub name: String,
    pub regd_no: String,
    pub created_at: DateTime<Utc>,
    pub is_cooldown: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionEnded {
    pub ended_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorPayload {
    pub message: String,
}

/// Client → server frame. Only `type` is read; any other fields are ignored.
#[derive(Debug, Deserialize)]
pub struct SessionIncoming {
    #[serde(rename = "type", default)]
    pub kind: IncomingKind,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncomingKind {
    Ping,
    GetEntries,
    EndSession,
    #[default]
    #[serde(other)]
    Unknown,
}
