use crate::helpers::{connect_session, expect_close, make_test_app, spawn_server};
use chrono::{Duration, Utc};
use db::models::session;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;

async fn assert_refused(addr: std::net::SocketAddr, token: Option<&str>, ssn_id: Option<&str>, reason: &str) {
    let mut ws = connect_session(addr, token, ssn_id).await;
    let frame = expect_close(&mut ws).await;
    assert_eq!(frame.code, CloseCode::Policy, "reason was {}", frame.reason.as_str());
    assert_eq!(frame.reason.as_str(), reason);
}

#[tokio::test]
async fn missing_or_bad_credentials_are_refused() {
    let app = make_test_app().await;
    let (prof, _) = app.instructor("prof@example.com").await;
    let s = app.open_session(&prof).await;
    let addr = spawn_server(app.router.clone()).await;

    assert_refused(addr, None, Some(&s.id), "Authentication token required").await;
    assert_refused(addr, Some("not-a-jwt"), Some(&s.id), "Invalid token").await;
}

#[tokio::test]
async fn students_cannot_open_a_session_connection() {
    let app = make_test_app().await;
    let (prof, _) = app.instructor("prof@example.com").await;
    let (_, student_token) = app.student("ada@example.com", "21BCE001").await;
    let s = app.open_session(&prof).await;
    let addr = spawn_server(app.router.clone()).await;

    assert_refused(addr, Some(&student_token), Some(&s.id), "Only instructors can connect").await;
}

#[tokio::test]
async fn session_must_be_named_owned_and_active() {
    let app = make_test_app().await;
    let (owner, owner_token) = app.instructor("owner@example.com").await;
    let (_, other_token) = app.instructor("other@example.com").await;
    let s = app.open_session(&owner).await;
    let addr = spawn_server(app.router.clone()).await;

    assert_refused(addr, Some(&owner_token), None, "session_id is required").await;
    assert_refused(addr, Some(&owner_token), Some("NOSUCHID"), "Invalid or inactive session").await;
    assert_refused(addr, Some(&other_token), Some(&s.id), "Invalid or inactive session").await;

    session::Model::deactivate(app.state.db(), &s.id, None, Utc::now()).await.unwrap();
    assert_refused(addr, Some(&owner_token), Some(&s.id), "Invalid or inactive session").await;
    assert!(app.state.registry().is_empty());
}

#[tokio::test]
async fn expired_session_is_refused() {
    let app = make_test_app().await;
    let (prof, token) = app.instructor("prof@example.com").await;
    let started = Utc::now() - Duration::minutes(20);
    let s = session::Model::create(app.state.db(), prof.id, None, Duration::minutes(10), started)
        .await
        .unwrap();
    let addr = spawn_server(app.router.clone()).await;

    assert_refused(addr, Some(&token), Some(&s.id), "Session has expired").await;
}

#[tokio::test]
async fn session_id_alias_is_accepted() {
    let app = make_test_app().await;
    let (prof, token) = app.instructor("prof@example.com").await;
    let s = app.open_session(&prof).await;
    let addr = spawn_server(app.router.clone()).await;

    let url = format!("ws://{addr}/ws/session?token={token}&session_id={}", s.id);
    let (mut ws, _) = tokio_tungstenite::connect_async(url).await.unwrap();

    let first = crate::helpers::next_json(&mut ws).await;
    assert_eq!(first["type"], "connection_established");
}

fn percent_encode_all(value: &str) -> String {
    value.bytes().map(|b| format!("%{b:02X}")).collect()
}

#[tokio::test]
async fn percent_encoded_query_values_are_decoded() {
    let app = make_test_app().await;
    let (prof, token) = app.instructor("prof@example.com").await;
    let s = app.open_session(&prof).await;
    let addr = spawn_server(app.router.clone()).await;

    let url = format!(
        "ws://{addr}/ws/session?token={}&ssn_id={}",
        percent_encode_all(&token),
        percent_encode_all(&s.id)
    );
    let (mut ws, _) = tokio_tungstenite::connect_async(url).await.unwrap();

    let first = crate::helpers::next_json(&mut ws).await;
    assert_eq!(first["type"], "connection_established");
    let bound = app.state.registry().lookup(&s.id).expect("session should be bound under its decoded id");
    assert_eq!(bound.user_id(), prof.id);
}
