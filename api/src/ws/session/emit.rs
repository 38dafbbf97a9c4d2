use util::ws::ConnectionRegistry;

use super::payload::{AttendanceNotice, SessionEvent};

/* ---------- one-liner helpers ---------- */

pub fn attendance_marked(registry: &ConnectionRegistry, session_id: &str, notice: AttendanceNotice) -> bool {
    registry
        .broadcast(session_id, &SessionEvent::AttendanceMarked(notice))
}

pub fn attendance_cooldown(registry: &ConnectionRegistry, session_id: &str, notice: AttendanceNotice) -> bool {
    registry
        .broadcast(session_id, &SessionEvent::AttendanceCooldown(notice))
}
