use axum::{Json, extract::State, http::StatusCode};
use common::format_validation_errors;
use db::models::user::{Model as UserModel, Role};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use util::state::AppState;
use validator::Validate;

use crate::auth::generate_jwt;
use crate::response::ApiResponse;
use crate::routes::common::UserResponse;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    #[validate(length(min = 1, message = "Name must not be empty"))]
    pub name: String,

    pub role: String,

    pub department: Option<String>,
    pub student_number: Option<String>,
}

#[derive(Debug, Serialize, Default)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_at: String,
    pub user: UserResponse,
}

/// POST /auth/register
///
/// Register a new account and issue a JWT.
///
/// ### Request Body
/// ```json
/// {
///   "email": "user@example.com",
///   "password": "strongpassword",
///   "name": "Alice Kim",
///   "role": "student",
///   "department": "Computer Science",
///   "student_number": "CS-1001"
/// }
/// ```
///
/// ### Responses
/// - `201 Created` with `{access_token, token_type: "bearer", expires_at, user}`
/// - `400 Bad Request` on validation failure or unknown role
/// - `409 Conflict` when the email is already registered
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> (StatusCode, Json<ApiResponse<TokenResponse>>) {
    if let Err(validation_errors) = req.validate() {
        let error_message = format_validation_errors(&validation_errors);
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error(error_message)),
        );
    }

    let Ok(role) = Role::from_str(&req.role) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error(
                "Role must be one of: student, faculty, admin",
            )),
        );
    };

    let db = state.db();

    match UserModel::find_by_email(db, &req.email).await {
        Ok(Some(_)) => {
            return (
                StatusCode::CONFLICT,
                Json(ApiResponse::error("A user with this email already exists")),
            );
        }
        Ok(None) => {}
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(format!("Database error: {e}"))),
            );
        }
    }

    match UserModel::create(
        db,
        &req.email,
        &req.password,
        &req.name,
        role,
        req.department.as_deref(),
        req.student_number.as_deref(),
    )
    .await
    {
        Ok(user) => {
            let (token, expiry) = generate_jwt(&user.id);
            let response = TokenResponse {
                access_token: token,
                token_type: "bearer".to_string(),
                expires_at: expiry,
                user: UserResponse::from(user),
            };
            (
                StatusCode::CREATED,
                Json(ApiResponse::success(response, "User registered successfully")),
            )
        }
        Err(e) => {
            // Concurrent registration can still lose on the unique index
            if e.to_string().contains("users.email") {
                return (
                    StatusCode::CONFLICT,
                    Json(ApiResponse::error("A user with this email already exists")),
                );
            }
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(format!("Database error: {e}"))),
            )
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// POST /auth/login
///
/// Authenticate an existing user and issue a JWT.
///
/// ### Responses
/// - `200 OK` with the same token payload as registration
/// - `401 Unauthorized` "Incorrect email or password" — the message never
///   distinguishes an unknown email from a wrong password
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> (StatusCode, Json<ApiResponse<TokenResponse>>) {
    match UserModel::verify_credentials(state.db(), &req.email, &req.password).await {
        Ok(Some(user)) => {
            let (token, expiry) = generate_jwt(&user.id);
            let response = TokenResponse {
                access_token: token,
                token_type: "bearer".to_string(),
                expires_at: expiry,
                user: UserResponse::from(user),
            };
            (
                StatusCode::OK,
                Json(ApiResponse::success(response, "Login successful")),
            )
        }
        Ok(None) => (
            StatusCode::UNAUTHORIZED,
            Json(ApiResponse::error("Incorrect email or password")),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!("Database error: {e}"))),
        ),
    }
}
