//! Handlers for the `/users` resource: directory listing and own profile.

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use thesis_core::error::CoreError;
use thesis_core::users::{validate_email, validate_required};
use thesis_db::models::user::{UpdateProfile, UserResponse};
use thesis_db::repositories::UserRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::query::RoleFilterParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `PUT /users/me`.
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub postal_address: Option<String>,
    pub mobile_phone: Option<String>,
    pub landline_phone: Option<String>,
}

/// GET /api/v1/users?role=FACULTY
///
/// List users, optionally filtered by role. Used to pick supervisors and
/// students.
pub async fn list_users(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(params): Query<RoleFilterParams>,
) -> AppResult<Json<DataResponse<Vec<UserResponse>>>> {
    let users = UserRepo::list(&state.pool, params.role).await?;
    let data = users.into_iter().map(UserResponse::from).collect();
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/users/me
pub async fn get_me(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    let me = UserRepo::find_by_id(&state.pool, user.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: user.user_id,
        }))?;
    Ok(Json(DataResponse { data: me.into() }))
}

/// PUT /api/v1/users/me
///
/// Update contact details. Username, role and student number are managed
/// by the secretariat and cannot be changed here.
pub async fn update_me(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<UpdateProfileRequest>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    if let Some(email) = &input.email {
        validate_email(email)?;
    }
    if let Some(full_name) = &input.full_name {
        validate_required("Full name", full_name)?;
    }

    let update = UpdateProfile {
        email: input.email,
        full_name: input.full_name,
        postal_address: input.postal_address,
        mobile_phone: input.mobile_phone,
        landline_phone: input.landline_phone,
    };
    let updated = UserRepo::update_profile(&state.pool, user.user_id, &update)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: user.user_id,
        }))?;

    tracing::info!(user_id = user.user_id, "Profile updated");

    Ok(Json(DataResponse {
        data: updated.into(),
    }))
}
