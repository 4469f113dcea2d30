//! Handlers for the `/admin` resource (account management).
//!
//! All handlers require the `SECRETARY` role via [`RequireSecretary`].

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use thesis_core::error::CoreError;
use thesis_core::roles::Role;
use thesis_core::types::DbId;
use thesis_core::users::{
    find_duplicates, validate_bulk_size, validate_email, validate_password_strength,
    validate_required,
};
use thesis_db::models::user::{CreateUser, UserResponse};
use thesis_db::repositories::UserRepo;

use crate::auth::password::hash_password;
use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireSecretary;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /admin/users` and one entry of `POST /admin/users/bulk`.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: String,
    /// One of `STUDENT`, `FACULTY`, `SECRETARY`.
    pub role: String,
    pub student_number: Option<String>,
    pub postal_address: Option<String>,
    pub mobile_phone: Option<String>,
    pub landline_phone: Option<String>,
}

/// Validate one account request and turn it into an insertable DTO with a
/// hashed password.
pub(crate) fn prepare_user(input: CreateUserRequest) -> AppResult<CreateUser> {
    validate_required("Username", &input.username)?;
    validate_required("Full name", &input.full_name)?;
    validate_email(&input.email)?;
    validate_password_strength(&input.password)?;
    let role: Role = input.role.parse()?;

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    Ok(CreateUser {
        username: input.username.trim().to_string(),
        email: input.email,
        password_hash,
        full_name: input.full_name.trim().to_string(),
        role,
        student_number: input.student_number,
        postal_address: input.postal_address,
        mobile_phone: input.mobile_phone,
        landline_phone: input.landline_phone,
    })
}

/// POST /api/v1/admin/users
///
/// Create one account. Returns 201 with the safe [`UserResponse`].
pub async fn create_user(
    State(state): State<AppState>,
    RequireSecretary(admin): RequireSecretary,
    Json(input): Json<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<UserResponse>>)> {
    let dto = prepare_user(input)?;
    let user = UserRepo::create(&state.pool, &dto).await?;

    tracing::info!(user_id = admin.user_id, created_id = user.id, role = %dto.role, "User created");

    Ok((StatusCode::CREATED, Json(DataResponse { data: user.into() })))
}

/// POST /api/v1/admin/users/bulk
///
/// Create up to 100 accounts in one transaction. The batch is rejected as a
/// whole if any entry is invalid, repeats a username or email within the
/// batch, or collides with an existing account.
pub async fn bulk_create_users(
    State(state): State<AppState>,
    RequireSecretary(admin): RequireSecretary,
    Json(inputs): Json<Vec<CreateUserRequest>>,
) -> AppResult<(StatusCode, Json<DataResponse<Vec<UserResponse>>>)> {
    validate_bulk_size(inputs.len())?;

    let dup_usernames = find_duplicates(inputs.iter().map(|u| u.username.trim()));
    if !dup_usernames.is_empty() {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Duplicate usernames: {}",
            dup_usernames.join(", ")
        ))));
    }
    let dup_emails = find_duplicates(inputs.iter().map(|u| u.email.as_str()));
    if !dup_emails.is_empty() {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Duplicate emails: {}",
            dup_emails.join(", ")
        ))));
    }

    let mut dtos = Vec::with_capacity(inputs.len());
    for (index, input) in inputs.into_iter().enumerate() {
        let dto = prepare_user(input).map_err(|e| match e {
            AppError::Core(CoreError::Validation(msg)) => {
                AppError::Core(CoreError::Validation(format!("User {index}: {msg}")))
            }
            other => other,
        })?;
        dtos.push(dto);
    }

    let usernames: Vec<String> = dtos.iter().map(|u| u.username.clone()).collect();
    let emails: Vec<String> = dtos.iter().map(|u| u.email.clone()).collect();
    let taken = UserRepo::find_taken_identities(&state.pool, &usernames, &emails).await?;
    if !taken.is_empty() {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "Users already exist: {}",
            taken.join(", ")
        ))));
    }

    let users = UserRepo::create_many(&state.pool, &dtos).await?;

    tracing::info!(user_id = admin.user_id, count = users.len(), "Users created in bulk");

    let data = users.into_iter().map(UserResponse::from).collect();
    Ok((StatusCode::CREATED, Json(DataResponse { data })))
}

/// GET /api/v1/admin/users/{id}
pub async fn get_user(
    State(state): State<AppState>,
    RequireSecretary(_admin): RequireSecretary,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    let user = UserRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "User", id }))?;
    Ok(Json(DataResponse { data: user.into() }))
}

/// DELETE /api/v1/admin/users/{id}
///
/// Delete an account with its invitations, selection, owned theses and
/// assigned theses. Returns 204.
pub async fn delete_user(
    State(state): State<AppState>,
    RequireSecretary(admin): RequireSecretary,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    UserRepo::delete(&state.pool, id).await?;

    tracing::info!(user_id = admin.user_id, deleted_id = id, "User deleted");

    Ok(StatusCode::NO_CONTENT)
}
