use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use db::models::user::{self, Role};
use serde::{Deserialize, Serialize};
use util::state::AppState;
use validator::Validate;

use crate::auth::generate_jwt;
use crate::response::{ApiResponse, Empty};
use crate::routes::common::format_validation_errors;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Registration number is required"))]
    pub regd_no: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    #[serde(default)]
    pub role: Option<Role>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,

    /// When present, the account must have this role.
    #[serde(default)]
    pub role: Option<Role>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub regd_no: String,
    pub role: Role,
}

impl From<user::Model> for UserResponse {
    fn from(u: user::Model) -> Self {
        Self {
            id: u.id,
            name: u.name,
            email: u.email,
            regd_no: u.regd_no,
            role: u.role,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
    pub expires_at: String,
    pub user: UserResponse,
}

fn issue_token(state: &AppState, user: user::Model) -> Result<TokenResponse, String> {
    let (token, expires_at) =
        generate_jwt(state.jwt(), &user, state.jwt_duration_minutes()).map_err(|e| e.to_string())?;
    Ok(TokenResponse {
        token,
        expires_at,
        user: user.into(),
    })
}

fn error(status: StatusCode, message: &str) -> axum::response::Response {
    (status, Json(ApiResponse::<Empty>::error(message))).into_response()
}

/// POST /api/auth/register
///
/// Creates an account and logs it in.
///
/// ### Request Body
/// ```json
/// {
///   "name": "Ada Lovelace",
///   "email": "ada@example.com",
///   "regd_no": "21BCE001",
///   "password": "strongpassword",
///   "role": "student"
/// }
/// ```
/// `role` is optional and defaults to `student`.
///
/// ### Response: 201 Created
/// ```json
/// {
///   "success": true,
///   "data": {
///     "token": "jwt_token_here",
///     "expires_at": "2025-10-18T11:00:00+00:00",
///     "user": { "id": 1, "name": "Ada Lovelace", "email": "ada@example.com", "regd_no": "21BCE001", "role": "student" }
///   },
///   "message": "User registered successfully"
/// }
/// ```
///
/// ### Errors
/// - 400 Bad Request → validation failure
/// - 409 Conflict → email already registered
/// - 500 Internal Server Error → database or token error
pub async fn register(State(state): State<AppState>, Json(req): Json<RegisterRequest>) -> impl IntoResponse {
    if let Err(e) = req.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<Empty>::error(format_validation_errors(&e))),
        )
            .into_response();
    }

    let email = req.email.trim();
    match user::Model::find_by_email(state.db(), email).await {
        Ok(Some(_)) => return error(StatusCode::CONFLICT, "A user with this email already exists"),
        Ok(None) => {}
        Err(e) => {
            tracing::error!("Failed to look up email: {e}");
            return error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to register user");
        }
    }

    let role = req.role.unwrap_or(Role::Student);
    let created = user::Model::register(
        state.db(),
        req.name.trim(),
        email,
        req.regd_no.trim(),
        role,
        &req.password,
    )
    .await;

    match created {
        Ok(user) => {
            tracing::info!(user_id = user.id, %role, "User registered");
            match issue_token(&state, user) {
                Ok(body) => (
                    StatusCode::CREATED,
                    Json(ApiResponse::success(body, "User registered successfully")),
                )
                    .into_response(),
                Err(e) => {
                    tracing::error!("Failed to sign token: {e}");
                    error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to issue token")
                }
            }
        }
        // lost a race with another registration for the same email
        Err(e) if e.to_string().contains("users.email") => {
            error(StatusCode::CONFLICT, "A user with this email already exists")
        }
        Err(e) => {
            tracing::error!("Failed to register user: {e}");
            error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to register user")
        }
    }
}

/// POST /api/auth/login
///
/// Checks an email and password and issues a bearer token.
///
/// ### Request Body
/// ```json
/// { "email": "ada@example.com", "password": "strongpassword" }
/// ```
/// An optional `role` restricts the login to accounts with that role.
///
/// ### Response: 200 OK
/// Same body as registration, with message `"Login successful"`.
///
/// ### Errors
/// - 400 Bad Request → validation failure
/// - 401 Unauthorized → unknown email, wrong password or role mismatch
/// - 500 Internal Server Error → database or token error
pub async fn login(State(state): State<AppState>, Json(req): Json<LoginRequest>) -> impl IntoResponse {
    if let Err(e) = req.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<Empty>::error(format_validation_errors(&e))),
        )
            .into_response();
    }

    let user = match user::Model::verify_credentials(state.db(), &req.email, &req.password).await {
        Ok(Some(user)) if req.role.is_none_or(|role| role == user.role) => user,
        Ok(_) => return error(StatusCode::UNAUTHORIZED, "Invalid email or password"),
        Err(e) => {
            tracing::error!("Failed to verify credentials: {e}");
            return error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to log in");
        }
    };

    let user_id = user.id;
    match issue_token(&state, user) {
        Ok(body) => {
            tracing::info!(user_id, "User logged in");
            (StatusCode::OK, Json(ApiResponse::success(body, "Login successful"))).into_response()
        }
        Err(e) => {
            tracing::error!("Failed to sign token: {e}");
            error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to issue token")
        }
    }
}
