//! Role-based access control (RBAC) extractors.
//!
//! Each extractor wraps [`AuthUser`] and rejects requests whose role does not
//! match. Ownership checks (owning faculty, assigned student, invited
//! faculty) happen inside the repositories, under the thesis row lock.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use thesis_core::error::CoreError;
use thesis_core::roles::Role;

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// Authenticate and require `role`, rejecting with 403 otherwise.
async fn require_role(
    parts: &mut Parts,
    state: &AppState,
    role: Role,
) -> Result<AuthUser, AppError> {
    let user = AuthUser::from_request_parts(parts, state).await?;
    if user.role != role {
        return Err(AppError::Core(CoreError::Forbidden(format!(
            "{role} role required"
        ))));
    }
    Ok(user)
}

/// Requires the `STUDENT` role. Rejects with 403 Forbidden otherwise.
///
/// ```ignore
/// async fn student_only(RequireStudent(user): RequireStudent) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
pub struct RequireStudent(pub AuthUser);

impl FromRequestParts<AppState> for RequireStudent {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        require_role(parts, state, Role::Student)
            .await
            .map(RequireStudent)
    }
}

/// Requires the `FACULTY` role. Rejects with 403 Forbidden otherwise.
pub struct RequireFaculty(pub AuthUser);

impl FromRequestParts<AppState> for RequireFaculty {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        require_role(parts, state, Role::Faculty)
            .await
            .map(RequireFaculty)
    }
}

/// Requires the `SECRETARY` role. Rejects with 403 Forbidden otherwise.
pub struct RequireSecretary(pub AuthUser);

impl FromRequestParts<AppState> for RequireSecretary {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        require_role(parts, state, Role::Secretary)
            .await
            .map(RequireSecretary)
    }
}
