//! Handlers for the `/auth` resource.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use thesis_core::error::CoreError;
use thesis_core::roles::ROLE_STUDENT;
use thesis_db::models::user::{User, UserResponse};
use thesis_db::repositories::UserRepo;

use crate::auth::jwt::generate_access_token;
use crate::auth::password::verify_password;
use crate::error::{AppError, AppResult};
use crate::handlers::admin::{prepare_user, CreateUserRequest};
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Request body for `POST /auth/register`.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub student_number: Option<String>,
}

/// Successful authentication response.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    pub user: UserResponse,
}

/// POST /api/v1/auth/login
///
/// Authenticate with username + password and return an access token.
/// Unknown usernames and wrong passwords are indistinguishable.
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<DataResponse<AuthResponse>>> {
    let invalid = || {
        AppError::Core(CoreError::Unauthorized(
            "Invalid username or password".into(),
        ))
    };

    let user = UserRepo::find_by_username(&state.pool, &input.username)
        .await?
        .ok_or_else(invalid)?;

    let password_valid = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !password_valid {
        tracing::debug!(username = %input.username, "Rejected login attempt");
        return Err(invalid());
    }

    let response = issue_token(&state, user)?;
    tracing::info!(user_id = response.user.id, role = %response.user.role, "User logged in");
    Ok(Json(DataResponse { data: response }))
}

/// POST /api/v1/auth/register
///
/// Self-service sign-up, always with the `STUDENT` role. Returns 201 with an
/// access token, or 409 if the username or email is taken.
pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<AuthResponse>>)> {
    let dto = prepare_user(CreateUserRequest {
        username: input.username,
        email: input.email,
        password: input.password,
        full_name: input.full_name,
        role: ROLE_STUDENT.to_string(),
        student_number: input.student_number,
        postal_address: None,
        mobile_phone: None,
        landline_phone: None,
    })?;

    let taken = UserRepo::find_taken_identities(
        &state.pool,
        std::slice::from_ref(&dto.username),
        std::slice::from_ref(&dto.email),
    )
    .await?;
    if !taken.is_empty() {
        return Err(AppError::Core(CoreError::Conflict(
            "Username or email already exists".into(),
        )));
    }

    let user = UserRepo::create(&state.pool, &dto).await?;
    let response = issue_token(&state, user)?;

    tracing::info!(user_id = response.user.id, "Student registered");

    Ok((StatusCode::CREATED, Json(DataResponse { data: response })))
}

fn issue_token(state: &AppState, user: User) -> AppResult<AuthResponse> {
    let role = user.role()?;
    let access_token = generate_access_token(user.id, role, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;
    Ok(AuthResponse {
        access_token,
        expires_in: state.config.jwt.access_token_expiry_mins * 60,
        user: user.into(),
    })
}
