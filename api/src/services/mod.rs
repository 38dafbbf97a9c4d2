//! Background and policy services behind the HTTP routes.
//!
//! - `checkin`: the check-in dispatcher (acknowledge, then process in a detached task)
//! - `cooldown`: the 15 minute repeat window and the read-only status report

pub mod checkin;
pub mod cooldown;
