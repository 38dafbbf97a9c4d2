use crate::helpers::{TestApp, make_test_app};
use api::app;
use axum::http::StatusCode;
use chrono::{DateTime, Duration, Utc};
use db::models::user;
use serde_json::json;

fn ada() -> serde_json::Value {
    json!({
        "name": "Ada Lovelace",
        "email": "ada@example.com",
        "regd_no": "21BCE001",
        "password": "analytical-engine"
    })
}

#[tokio::test]
async fn register_then_login_issues_usable_tokens() {
    let app = make_test_app().await;

    let (status, json) = app.request("POST", "/api/auth/register", None, Some(ada())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["data"]["user"]["role"], "student");
    assert_eq!(json["data"]["user"]["regd_no"], "21BCE001");
    assert!(json["data"]["user"].get("password_hash").is_none());

    let stored = user::Model::find_by_email(app.state.db(), "ada@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_ne!(stored.password_hash.as_deref(), Some("analytical-engine"));

    let (status, json) = app
        .request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": "ada@example.com", "password": "analytical-engine" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Login successful");
    let token = json["data"]["token"].as_str().unwrap().to_string();

    // a student token reaches the student routes but not the instructor ones
    let (status, _) = app.request("GET", "/api/attendance/cooldown", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.request("GET", "/api/sessions/history", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn registered_instructor_can_start_a_session() {
    let app = make_test_app().await;
    let mut body = ada();
    body["role"] = json!("instructor");
    body["email"] = json!("prof@example.com");

    let (status, json) = app.request("POST", "/api/auth/register", None, Some(body)).await;
    assert_eq!(status, StatusCode::CREATED);
    let token = json["data"]["token"].as_str().unwrap().to_string();

    let (status, _) = app.request("POST", "/api/sessions", Some(&token), Some(json!({}))).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn wrong_password_unknown_email_and_role_mismatch_are_unauthorized() {
    let app = make_test_app().await;
    app.request("POST", "/api/auth/register", None, Some(ada())).await;

    for body in [
        json!({ "email": "ada@example.com", "password": "difference-engine" }),
        json!({ "email": "nobody@example.com", "password": "analytical-engine" }),
        json!({ "email": "ada@example.com", "password": "analytical-engine", "role": "instructor" }),
    ] {
        let (status, json) = app.request("POST", "/api/auth/login", None, Some(body)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["message"], "Invalid email or password");
    }
}

#[tokio::test]
async fn duplicate_email_conflicts() {
    let app = make_test_app().await;
    let (status, _) = app.request("POST", "/api/auth/register", None, Some(ada())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, json) = app.request("POST", "/api/auth/register", None, Some(ada())).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["message"], "A user with this email already exists");
}

#[tokio::test]
async fn register_validates_input() {
    let app = make_test_app().await;
    let mut body = ada();
    body["email"] = json!("not-an-email");
    body["password"] = json!("short");

    let (status, json) = app.request("POST", "/api/auth/register", None, Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let message = json["message"].as_str().unwrap();
    assert!(message.contains("Invalid email format"));
    assert!(message.contains("Password must be at least 8 characters"));
}

#[tokio::test]
async fn token_lifetime_follows_configured_duration() {
    let base = make_test_app().await;
    let state = base.state.clone().with_jwt_duration(5);
    let app = TestApp {
        router: app(state.clone()),
        state,
    };

    let (status, json) = app.request("POST", "/api/auth/register", None, Some(ada())).await;
    assert_eq!(status, StatusCode::CREATED);

    let expires_at: DateTime<Utc> = json["data"]["expires_at"].as_str().unwrap().parse().unwrap();
    let left = expires_at - Utc::now();
    assert!(left > Duration::minutes(4) && left <= Duration::minutes(5));
}
