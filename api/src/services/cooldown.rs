use chrono::{DateTime, Duration, Utc};
use db::models::attendance_mark;
use sea_orm::{DatabaseConnection, DbErr};
use serde::Serialize;

pub const COOLDOWN_MINUTES: i64 = 15;

/// Marks older than the window by less than this many seconds still get a
/// `cooldown_expired_since`.
const EXPIRED_REPORT_SLACK_SECS: i64 = 60;

pub fn window() -> Duration {
    Duration::minutes(COOLDOWN_MINUTES)
}

/// Time left in the cooldown started by a mark at `last_marked`, if any.
pub fn remaining(last_marked: DateTime<Utc>, now: DateTime<Utc>) -> Option<Duration> {
    let left = last_marked + window() - now;
    (left > Duration::zero()).then_some(left)
}

#[derive(Debug, Clone, Serialize)]
pub struct CooldownStatus {
    pub is_active: bool,
    pub can_mark_attendance: bool,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_marked: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cooldown: Option<CooldownWindow>,
    /// Milliseconds since the window closed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cooldown_expired_since: Option<i64>,
    pub cooldown_policy: CooldownPolicy,
}

#[derive(Debug, Clone, Serialize)]
pub struct CooldownWindow {
    pub total_minutes: i64,
    pub remaining_ms: i64,
    pub remaining_formatted: RemainingFormatted,
    pub expires_at: DateTime<Utc>,
    /// Whole seconds, rounded up.
    pub expires_in: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RemainingFormatted {
    pub minutes: i64,
    pub seconds: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CooldownPolicy {
    pub minutes: i64,
    pub milliseconds: i64,
    pub description: &'static str,
}

impl Default for CooldownPolicy {
    fn default() -> Self {
        Self {
            minutes: COOLDOWN_MINUTES,
            milliseconds: window().num_milliseconds(),
            description: "15 minutes between attendance marks",
        }
    }
}

/// Builds the status report for a user whose latest mark was at `last_marked`.
pub fn status(last_marked: Option<DateTime<Utc>>, now: DateTime<Utc>) -> CooldownStatus {
    let mut report = CooldownStatus {
        is_active: false,
        can_mark_attendance: true,
        timestamp: now,
        last_marked: None,
        cooldown: None,
        cooldown_expired_since: None,
        cooldown_policy: CooldownPolicy::default(),
    };

    let Some(last) = last_marked.filter(|t| *t > now - window() - Duration::seconds(EXPIRED_REPORT_SLACK_SECS)) else {
        return report;
    };

    match remaining(last, now) {
        Some(left) => {
            let ms = left.num_milliseconds();
            report.is_active = true;
            report.can_mark_attendance = false;
            report.last_marked = Some(last);
            report.cooldown = Some(CooldownWindow {
                total_minutes: COOLDOWN_MINUTES,
                remaining_ms: ms,
                remaining_formatted: RemainingFormatted {
                    minutes: ms / 60_000,
                    seconds: (ms % 60_000) / 1000,
                },
                expires_at: last + window(),
                expires_in: (ms + 999) / 1000,
            });
        }
        None => {
            report.cooldown_expired_since = Some((now - (last + window())).num_milliseconds());
        }
    }
    report
}

/// Read-only cooldown report for `user_id` across all sessions.
pub async fn check_timeout(
    db: &DatabaseConnection,
    user_id: i64,
    now: DateTime<Utc>,
) -> Result<CooldownStatus, DbErr> {
    let latest = attendance_mark::Model::latest_for_user(db, user_id).await?;
    Ok(status(latest.map(|m| m.created_at), now))
}
