use crate::helpers::{TestApp, make_test_app};
use api::app;
use axum::http::StatusCode;
use chrono::{DateTime, Duration, Utc};
use db::models::{attendance_mark, session};
use serde_json::json;

#[tokio::test]
async fn instructor_creates_session() {
    let app = make_test_app().await;
    let (_, token) = app.instructor("prof@example.com").await;

    let (status, json) = app
        .request("POST", "/api/sessions", Some(&token), Some(json!({ "name": "Lecture 4" })))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    let ssn_id = json["data"]["ssn_id"].as_str().unwrap();
    assert_eq!(ssn_id.len(), session::SESSION_ID_LEN);
    assert_eq!(json["data"]["name"], "Lecture 4");

    let expiry: DateTime<Utc> = json["data"]["expiry_time"].as_str().unwrap().parse().unwrap();
    let left = expiry - Utc::now();
    assert!(left > Duration::minutes(9) && left <= Duration::minutes(10));

    let stored = session::Model::find_by_id(app.state.db(), ssn_id).await.unwrap().unwrap();
    assert!(stored.active);
}

#[tokio::test]
async fn create_session_without_name_is_unnamed() {
    let app = make_test_app().await;
    let (_, token) = app.instructor("prof@example.com").await;

    let (status, json) = app.request("POST", "/api/sessions", Some(&token), Some(json!({}))).await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(json["data"]["name"].is_null());
}

#[tokio::test]
async fn ttl_past_max_timestamp_fails_without_creating_a_session() {
    let base = make_test_app().await;
    let state = base.state.clone().with_session_ttl(Duration::days(365 * 300_000));
    let app = TestApp {
        router: app(state.clone()),
        state,
    };
    let (prof, token) = app.instructor("prof@example.com").await;

    let (status, json) = app.request("POST", "/api/sessions", Some(&token), Some(json!({}))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["message"], "Failed to create session");
    assert!(session::Model::history_for_owner(app.state.db(), prof.id, None, 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn students_and_anonymous_callers_cannot_manage_sessions() {
    let app = make_test_app().await;
    let (_, token) = app.student("ada@example.com", "21BCE001").await;

    let (status, json) = app.request("POST", "/api/sessions", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["message"], "Instructor access required");

    let (status, json) = app.request("POST", "/api/sessions", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["message"], "Authentication required");

    let (status, _) = app.request("GET", "/api/sessions/history", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn stop_session_deactivates_once() {
    let app = make_test_app().await;
    let (prof, token) = app.instructor("prof@example.com").await;
    let s = app.open_session(&prof).await;
    let uri = format!("/api/sessions/{}/stop", s.id);

    let (status, json) = app.request("POST", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["active"], false);

    let stored = session::Model::find_by_id(app.state.db(), &s.id).await.unwrap().unwrap();
    assert!(!stored.active);
    assert!(stored.expiry_time <= Utc::now());

    let (status, json) = app.request("POST", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["message"], "Active session not found or already stopped");
}

#[tokio::test]
async fn cannot_stop_someone_elses_session() {
    let app = make_test_app().await;
    let (owner, _) = app.instructor("owner@example.com").await;
    let (_, other_token) = app.instructor("other@example.com").await;
    let s = app.open_session(&owner).await;

    let (status, _) = app
        .request("POST", &format!("/api/sessions/{}/stop", s.id), Some(&other_token), None)
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(session::Model::find_by_id(app.state.db(), &s.id).await.unwrap().unwrap().active);
}

#[tokio::test]
async fn history_pages_with_cursor() {
    let app = make_test_app().await;
    let (prof, token) = app.instructor("prof@example.com").await;
    let base = Utc::now() - Duration::hours(2);
    for i in 0..17 {
        session::Model::create(app.state.db(), prof.id, None, Duration::minutes(10), base + Duration::minutes(i))
            .await
            .unwrap();
    }

    let (status, first) = app.request("GET", "/api/sessions/history", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["data"]["count"], 15);
    assert_eq!(first["data"]["has_more"], true);

    let cursor = first["data"]["next_cursor"].as_str().unwrap();
    let uri = format!("/api/sessions/history?cursor={}", cursor.replace('+', "%2B"));
    let (status, second) = app.request("GET", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["data"]["count"], 2);
    assert_eq!(second["data"]["has_more"], false);
    assert!(second["data"]["next_cursor"].is_null());
}

#[tokio::test]
async fn history_rejects_bad_cursor() {
    let app = make_test_app().await;
    let (_, token) = app.instructor("prof@example.com").await;

    let (status, _) = app
        .request("GET", "/api/sessions/history?cursor=yesterday", Some(&token), None)
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn entries_lists_marks_of_owned_session() {
    let app = make_test_app().await;
    let (prof, token) = app.instructor("prof@example.com").await;
    let (student, _) = app.student("ada@example.com", "21BCE001").await;
    let s = app.open_session(&prof).await;
    attendance_mark::Model::create(app.state.db(), &s.id, &student, Utc::now())
        .await
        .unwrap();

    let (status, json) = app
        .request("GET", &format!("/api/sessions/{}/entries", s.id), Some(&token), None)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["ssn_id"], s.id.as_str());
    assert_eq!(json["data"]["count"], 1);
    assert_eq!(json["data"]["entries"][0]["regd_no"], "21BCE001");

    let (_, other_token) = app.instructor("other@example.com").await;
    let (status, _) = app
        .request("GET", &format!("/api/sessions/{}/entries", s.id), Some(&other_token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
