/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /register` - Register a new user
/// - `POST /auth` - Exchange email and password for a bearer token
/// - `GET /profile` - The acting user (authenticated)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};
use tasktrack_shared::{
    auth::middleware::AuthContext, projection::UserResponse, services::Registration,
};
use tracing::info;
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Email address, used as the login name
    #[validate(
        email(message = "Invalid email format"),
        length(max = 255, message = "Email must be at most 255 characters")
    )]
    pub email: String,

    #[validate(length(min = 1, max = 255, message = "Password must be 1 to 255 characters"))]
    pub password: String,

    /// Display name
    #[validate(length(min = 1, max = 255, message = "Name must be 1 to 255 characters"))]
    pub name: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Bearer token whose subject is the user's email
    pub token: String,
}

/// Registers a new user
///
/// # Endpoint
///
/// ```text
/// POST /register
/// Content-Type: application/json
///
/// {"email": "ada@example.com", "password": "hunter2", "name": "Ada"}
/// ```
///
/// # Response
///
/// ```json
/// {"id": 1, "name": "Ada", "email": "ada@example.com"}
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Email already in use
/// - `422 Unprocessable Entity`: Validation failed
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<Json<UserResponse>> {
    req.validate().map_err(ApiError::from_validation)?;

    let user = state
        .services
        .users
        .register(Registration {
            name: req.name,
            email: req.email,
            password: req.password,
        })
        .await?;

    Ok(Json(UserResponse::from(&user)))
}

/// Logs in and returns a bearer token
///
/// # Errors
///
/// - `400 Bad Request`: Unknown email or wrong password
/// - `422 Unprocessable Entity`: Validation failed
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    req.validate().map_err(ApiError::from_validation)?;

    let user = state
        .services
        .users
        .authenticate(&req.email, &req.password)
        .await?;
    let token = state.tokens.issue(&user.email)?;

    info!(user_id = user.id, "User logged in");
    Ok(Json(LoginResponse { token }))
}

/// Returns the acting user
pub async fn profile(Extension(auth): Extension<AuthContext>) -> Json<UserResponse> {
    Json(UserResponse::from(&auth.user))
}
