//! Check-in dispatcher.
//!
//! `submit` does the only synchronous check (the session must be open), then hands the
//! rest to a detached task: resolve the user, apply the cooldown, persist the mark and
//! notify the instructor's connection. Errors inside the task are logged and never
//! reach the already-answered HTTP caller.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use db::models::{attendance_mark, session, user};
use sea_orm::{DatabaseConnection, DbErr};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use util::state::AppState;
use util::ws::ConnectionRegistry;

use crate::services::cooldown;
use crate::ws::session::emit;
use crate::ws::session::payload::AttendanceNotice;

#[derive(Debug, thiserror::Error)]
pub enum CheckinError {
    #[error("Session not found")]
    SessionNotFound,
    #[error("User {0} not found")]
    UserNotFound(i64),
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum CheckinOutcome {
    /// A new mark was written.
    Marked {
        mark: attendance_mark::Model,
        delivered: bool,
    },
    /// A mark already exists inside the window; nothing was written.
    Cooldown {
        previous: attendance_mark::Model,
        delivered: bool,
    },
}

type CheckinKey = (i64, String);

#[derive(Clone)]
pub struct CheckinDispatcher {
    db: DatabaseConnection,
    registry: ConnectionRegistry,
    // serializes processing per (user, session) so the cooldown lookup and the insert
    // cannot interleave with a concurrent check-in from the same user
    in_flight: Arc<DashMap<CheckinKey, Arc<Mutex<()>>>>,
}

impl CheckinDispatcher {
    pub fn new(db: DatabaseConnection, registry: ConnectionRegistry) -> Self {
        Self {
            db,
            registry,
            in_flight: Arc::new(DashMap::new()),
        }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(state.db_clone(), state.registry_clone())
    }

    /// Validates the session and schedules processing.
    ///
    /// Only an unknown, inactive or expired session is reported to the caller. The
    /// returned handle may be dropped; the task keeps running.
    pub async fn submit(&self, session_id: &str, user_id: i64) -> Result<JoinHandle<()>, CheckinError> {
        session::Model::find_open(&self.db, session_id, Utc::now())
            .await?
            .ok_or(CheckinError::SessionNotFound)?;

        let this = self.clone();
        let session_id = session_id.to_owned();
        Ok(tokio::spawn(async move {
            match this.process(&session_id, user_id, Utc::now()).await {
                Ok(CheckinOutcome::Marked { delivered, .. }) => {
                    tracing::info!(session_id = %session_id, user_id, delivered, "Attendance marked");
                }
                Ok(CheckinOutcome::Cooldown { delivered, .. }) => {
                    tracing::info!(session_id = %session_id, user_id, delivered, "Repeat check-in inside cooldown");
                }
                Err(e) => {
                    tracing::error!(session_id = %session_id, user_id, "Check-in processing failed: {e}");
                }
            }
        }))
    }

    /// Applies the cooldown policy at `now`, persists and notifies.
    pub async fn process(
        &self,
        session_id: &str,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> Result<CheckinOutcome, CheckinError> {
        let key = (user_id, session_id.to_owned());
        let lock = Arc::clone(self.in_flight.entry(key.clone()).or_default().value());

        let outcome = {
            let _guard = lock.lock().await;
            self.process_locked(session_id, user_id, now).await
        };

        drop(lock);
        self.in_flight.remove_if(&key, |_, l| Arc::strong_count(l) == 1);
        outcome
    }

    async fn process_locked(
        &self,
        session_id: &str,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> Result<CheckinOutcome, CheckinError> {
        let user = user::Model::find_by_id(&self.db, user_id)
            .await?
            .ok_or(CheckinError::UserNotFound(user_id))?;

        let since = now - cooldown::window();
        if let Some(previous) = attendance_mark::Model::find_recent(&self.db, user.id, session_id, since).await? {
            let notice = AttendanceNotice {
                name: user.name,
                regd_no: user.regd_no,
                created_at: now,
                is_cooldown: true,
            };
            let delivered = emit::attendance_cooldown(&self.registry, session_id, notice);
            return Ok(CheckinOutcome::Cooldown { previous, delivered });
        }

        let mark = attendance_mark::Model::create(&self.db, session_id, &user, now).await?;
        let notice = AttendanceNotice {
            name: mark.name.clone(),
            regd_no: mark.regd_no.clone(),
            created_at: mark.created_at,
            is_cooldown: false,
        };
        let delivered = emit::attendance_marked(&self.registry, session_id, notice);
        Ok(CheckinOutcome::Marked { mark, delivered })
    }
}
