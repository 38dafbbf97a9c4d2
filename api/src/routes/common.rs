use chrono::{DateTime, Utc};
use db::models::{attendance_mark, session};
use serde::{Deserialize, Serialize};
use validator::ValidationErrors;

/// Flattens validator errors into one human readable line.
pub fn format_validation_errors(errors: &ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(msg) => msg.to_string(),
                None => format!("{field} is invalid"),
            })
        })
        .collect();
    messages.sort();
    messages.join("; ")
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub ssn_id: String,
    pub name: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub expiry_time: DateTime<Utc>,
}

impl From<session::Model> for SessionResponse {
    fn from(s: session::Model) -> Self {
        Self {
            ssn_id: s.id,
            name: s.name,
            active: s.active,
            created_at: s.created_at,
            expiry_time: s.expiry_time,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EntryResponse {
    pub name: String,
    pub regd_no: String,
    pub created_at: DateTime<Utc>,
}

impl From<attendance_mark::Model> for EntryResponse {
    fn from(m: attendance_mark::Model) -> Self {
        Self {
            name: m.name,
            regd_no: m.regd_no,
            created_at: m.created_at,
        }
    }
}
