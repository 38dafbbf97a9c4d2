use crate::helpers::make_test_app;
use axum::http::StatusCode;
use chrono::{Duration, Utc};
use db::models::{attendance_mark, session};
use serde_json::json;
use std::time::Duration as StdDuration;

/// Background check-ins finish shortly after the 202; poll the mark count.
async fn wait_for_marks(db: &sea_orm::DatabaseConnection, ssn_id: &str, expected: u64) {
    for _ in 0..100 {
        if attendance_mark::Model::count_for_session(db, ssn_id).await.unwrap() == expected {
            return;
        }
        tokio::time::sleep(StdDuration::from_millis(20)).await;
    }
    panic!("expected {expected} marks for {ssn_id}");
}

#[tokio::test]
async fn checkin_is_accepted_and_recorded() {
    let app = make_test_app().await;
    let (prof, _) = app.instructor("prof@example.com").await;
    let (_, token) = app.student("ada@example.com", "21BCE001").await;
    let s = app.open_session(&prof).await;

    let (status, json) = app
        .request("POST", "/api/attendance", Some(&token), Some(json!({ "ssn_id": s.id })))
        .await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(json["message"], "Attendance request received");
    wait_for_marks(app.state.db(), &s.id, 1).await;
}

#[tokio::test]
async fn checkin_for_unknown_or_stopped_session_is_not_found() {
    let app = make_test_app().await;
    let (prof, _) = app.instructor("prof@example.com").await;
    let (_, token) = app.student("ada@example.com", "21BCE001").await;

    let (status, json) = app
        .request("POST", "/api/attendance", Some(&token), Some(json!({ "ssn_id": "NOSUCHID" })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["message"], "Session not found");

    let s = app.open_session(&prof).await;
    session::Model::deactivate(app.state.db(), &s.id, None, Utc::now()).await.unwrap();
    let (status, _) = app
        .request("POST", "/api/attendance", Some(&token), Some(json!({ "ssn_id": s.id })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn checkin_requires_session_id_and_auth() {
    let app = make_test_app().await;
    let (_, token) = app.student("ada@example.com", "21BCE001").await;

    let (status, json) = app
        .request("POST", "/api/attendance", Some(&token), Some(json!({ "ssn_id": "" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "ssn_id is required");

    let (status, _) = app
        .request("POST", "/api/attendance", None, Some(json!({ "ssn_id": "X" })))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn cooldown_is_free_without_marks() {
    let app = make_test_app().await;
    let (_, token) = app.student("ada@example.com", "21BCE001").await;

    let (status, json) = app.request("GET", "/api/attendance/cooldown", Some(&token), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["is_active"], false);
    assert_eq!(json["data"]["can_mark_attendance"], true);
    assert!(json["data"].get("cooldown").is_none());
    assert_eq!(json["data"]["cooldown_policy"]["minutes"], 15);
}

#[tokio::test]
async fn cooldown_reports_remaining_time_after_a_mark() {
    let app = make_test_app().await;
    let (prof, _) = app.instructor("prof@example.com").await;
    let (student, token) = app.student("ada@example.com", "21BCE001").await;
    let s = app.open_session(&prof).await;
    attendance_mark::Model::create(app.state.db(), &s.id, &student, Utc::now() - Duration::minutes(5))
        .await
        .unwrap();

    let (status, json) = app.request("GET", "/api/attendance/cooldown", Some(&token), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["is_active"], true);
    assert_eq!(json["data"]["can_mark_attendance"], false);
    let remaining = json["data"]["cooldown"]["remaining_ms"].as_i64().unwrap();
    assert!(remaining > 9 * 60 * 1000 && remaining <= 10 * 60 * 1000);
    assert_eq!(json["data"]["cooldown"]["total_minutes"], 15);
}
