use api::{app, auth::generate_jwt};
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use chrono::{Duration, Utc};
use db::models::{session, user};
use db::test_utils::setup_test_db;
use serde_json::Value;
use tower::ServiceExt;
use util::jwt::JwtKeys;
use util::state::AppState;
use util::ws::{ConnectionRegistry, WsServerOptions};

pub const TEST_SECRET: &str = "integration-test-secret";

/// Router plus the state behind it, so tests can reach the registry and database.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

pub async fn make_test_app() -> TestApp {
    make_test_app_with_options(WsServerOptions::default()).await
}

pub async fn make_test_app_with_options(ws_options: WsServerOptions) -> TestApp {
    let state = AppState::new(
        setup_test_db().await,
        ConnectionRegistry::new(),
        JwtKeys::from_secret(TEST_SECRET),
    )
    .with_ws_options(ws_options);

    TestApp {
        router: app(state.clone()),
        state,
    }
}

impl TestApp {
    pub async fn instructor(&self, email: &str) -> (user::Model, String) {
        self.user("Prof Turing", email, "FAC-001", user::Role::Instructor).await
    }

    pub async fn student(&self, email: &str, regd_no: &str) -> (user::Model, String) {
        self.user("Ada Lovelace", email, regd_no, user::Role::Student).await
    }

    async fn user(&self, name: &str, email: &str, regd_no: &str, role: user::Role) -> (user::Model, String) {
        let u = user::Model::create(self.state.db(), name, email, regd_no, role)
            .await
            .unwrap();
        let (token, _) = generate_jwt(self.state.jwt(), &u, 60).unwrap();
        (u, token)
    }

    pub async fn open_session(&self, owner: &user::Model) -> session::Model {
        session::Model::create(self.state.db(), owner.id, Some("Lecture"), Duration::minutes(10), Utc::now())
            .await
            .unwrap()
    }

    /// Sends one request through a fresh copy of the router.
    pub async fn request(&self, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }
}
