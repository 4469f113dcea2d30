//! Handlers for the co-supervisor invitation protocol.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use thesis_core::error::CoreError;
use thesis_core::types::DbId;
use thesis_db::models::supervision::{PendingInvitation, SupervisingFaculty};
use thesis_db::repositories::{SupervisionRepo, ThesisRepo};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireFaculty;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /theses/{id}/invitations`.
#[derive(Debug, Deserialize)]
pub struct InviteRequest {
    pub faculty_id: DbId,
}

/// GET /api/v1/theses/{id}/invitations
pub async fn list_for_thesis(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(thesis_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<SupervisingFaculty>>>> {
    ThesisRepo::find_by_id(&state.pool, thesis_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Thesis",
            id: thesis_id,
        }))?;
    let records = SupervisionRepo::list_for_thesis(&state.pool, thesis_id).await?;
    Ok(Json(DataResponse { data: records }))
}

/// POST /api/v1/theses/{id}/invitations
///
/// Invite a faculty member to co-supervise. The assigned student and the
/// owning faculty member may both invite.
pub async fn invite(
    State(state): State<AppState>,
    user: AuthUser,
    Path(thesis_id): Path<DbId>,
    Json(input): Json<InviteRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<SupervisingFaculty>>)> {
    let invitation =
        SupervisionRepo::invite(&state.pool, user.user_id, thesis_id, input.faculty_id).await?;

    tracing::info!(
        user_id = user.user_id,
        thesis_id,
        faculty_id = input.faculty_id,
        "Supervisor invited"
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: invitation })))
}

/// POST /api/v1/theses/{id}/invitations/accept
///
/// Accept the caller's pending invitation. Fails with 409
/// `CAPACITY_EXCEEDED` when both supervisor slots are already taken.
pub async fn accept(
    State(state): State<AppState>,
    RequireFaculty(user): RequireFaculty,
    Path(thesis_id): Path<DbId>,
) -> AppResult<Json<DataResponse<SupervisingFaculty>>> {
    let accepted = SupervisionRepo::accept(&state.pool, user.user_id, thesis_id).await?;

    tracing::info!(
        user_id = user.user_id,
        thesis_id,
        slot = accepted.slot_index,
        "Invitation accepted"
    );

    Ok(Json(DataResponse { data: accepted }))
}

/// POST /api/v1/theses/{id}/invitations/reject
pub async fn reject(
    State(state): State<AppState>,
    RequireFaculty(user): RequireFaculty,
    Path(thesis_id): Path<DbId>,
) -> AppResult<StatusCode> {
    SupervisionRepo::reject(&state.pool, user.user_id, thesis_id).await?;

    tracing::info!(user_id = user.user_id, thesis_id, "Invitation rejected");

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/invitations/pending
///
/// The calling faculty member's open invitations.
pub async fn list_pending(
    State(state): State<AppState>,
    RequireFaculty(user): RequireFaculty,
) -> AppResult<Json<DataResponse<Vec<PendingInvitation>>>> {
    let pending = SupervisionRepo::list_pending_for_faculty(&state.pool, user.user_id).await?;
    Ok(Json(DataResponse { data: pending }))
}
