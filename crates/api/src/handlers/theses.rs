//! Handlers for the `/theses` resource: proposals, selection, assignment
//! and cancellation.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use thesis_core::error::CoreError;
use thesis_core::types::DbId;
use thesis_db::models::selection::ThesisSelection;
use thesis_db::models::thesis::{CreateThesis, Thesis, ThesisDetail, ThesisFilter, UpdateThesis};
use thesis_db::repositories::{SelectionRepo, ThesisRepo};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::{RequireFaculty, RequireStudent};
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /theses/{id}/assign`.
#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    pub student_id: DbId,
}

/// Request body for `PUT /theses/{id}/student-pdf`.
#[derive(Debug, Deserialize)]
pub struct StudentPdfRequest {
    pub url: String,
}

/// GET /api/v1/theses?status=OPEN&faculty_id=3
pub async fn list_theses(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(filter): Query<ThesisFilter>,
) -> AppResult<Json<DataResponse<Vec<Thesis>>>> {
    let theses = ThesisRepo::list(&state.pool, &filter).await?;
    Ok(Json(DataResponse { data: theses }))
}

/// POST /api/v1/theses
///
/// Propose a new thesis. The caller becomes its main faculty.
pub async fn create_thesis(
    State(state): State<AppState>,
    RequireFaculty(user): RequireFaculty,
    Json(input): Json<CreateThesis>,
) -> AppResult<(StatusCode, Json<DataResponse<Thesis>>)> {
    let thesis = ThesisRepo::create(&state.pool, user.user_id, &input).await?;

    tracing::info!(user_id = user.user_id, thesis_id = thesis.id, "Thesis created");

    Ok((StatusCode::CREATED, Json(DataResponse { data: thesis })))
}

/// GET /api/v1/theses/{id}
///
/// Thesis with its selection pool and supervision records.
pub async fn get_thesis(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ThesisDetail>>> {
    let detail = ThesisRepo::find_detail(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Thesis",
            id,
        }))?;
    Ok(Json(DataResponse { data: detail }))
}

/// PUT /api/v1/theses/{id}
pub async fn update_thesis(
    State(state): State<AppState>,
    RequireFaculty(user): RequireFaculty,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateThesis>,
) -> AppResult<Json<DataResponse<Thesis>>> {
    let thesis = ThesisRepo::update(&state.pool, user.user_id, id, &input).await?;

    tracing::info!(user_id = user.user_id, thesis_id = id, "Thesis updated");

    Ok(Json(DataResponse { data: thesis }))
}

/// DELETE /api/v1/theses/{id}
pub async fn delete_thesis(
    State(state): State<AppState>,
    RequireFaculty(user): RequireFaculty,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    ThesisRepo::delete(&state.pool, user.user_id, id).await?;

    tracing::info!(user_id = user.user_id, thesis_id = id, "Thesis deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/theses/{id}/select
///
/// Add the calling student to the thesis's selection pool.
pub async fn select_thesis(
    State(state): State<AppState>,
    RequireStudent(user): RequireStudent,
    Path(id): Path<DbId>,
) -> AppResult<(StatusCode, Json<DataResponse<ThesisSelection>>)> {
    let selection = SelectionRepo::select(&state.pool, user.user_id, id).await?;

    tracing::info!(user_id = user.user_id, thesis_id = id, "Thesis selected");

    Ok((StatusCode::CREATED, Json(DataResponse { data: selection })))
}

/// POST /api/v1/theses/{id}/unselect
pub async fn unselect_thesis(
    State(state): State<AppState>,
    RequireStudent(user): RequireStudent,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    SelectionRepo::unselect(&state.pool, user.user_id, id).await?;

    tracing::info!(user_id = user.user_id, thesis_id = id, "Thesis unselected");

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/theses/{id}/assign
///
/// Assign an `OPEN` thesis to a student. Owner only.
pub async fn assign_thesis(
    State(state): State<AppState>,
    RequireFaculty(user): RequireFaculty,
    Path(id): Path<DbId>,
    Json(input): Json<AssignRequest>,
) -> AppResult<Json<DataResponse<Thesis>>> {
    let thesis = ThesisRepo::assign(&state.pool, user.user_id, id, input.student_id).await?;

    tracing::info!(
        user_id = user.user_id,
        thesis_id = id,
        student_id = input.student_id,
        "Thesis assigned"
    );

    Ok(Json(DataResponse { data: thesis }))
}

/// POST /api/v1/theses/{id}/cancel
///
/// Cancel an `OPEN` or `ASSIGNED` thesis. Owner or any secretary.
pub async fn cancel_thesis(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Thesis>>> {
    let thesis = ThesisRepo::cancel(&state.pool, user.user_id, user.role, id).await?;

    tracing::info!(user_id = user.user_id, role = %user.role, thesis_id = id, "Thesis cancelled");

    Ok(Json(DataResponse { data: thesis }))
}

/// PUT /api/v1/theses/{id}/student-pdf
///
/// Attach the assigned student's manuscript reference.
pub async fn upload_student_pdf(
    State(state): State<AppState>,
    RequireStudent(user): RequireStudent,
    Path(id): Path<DbId>,
    Json(input): Json<StudentPdfRequest>,
) -> AppResult<Json<DataResponse<Thesis>>> {
    let thesis = ThesisRepo::attach_student_pdf(&state.pool, user.user_id, id, &input.url).await?;

    tracing::info!(user_id = user.user_id, thesis_id = id, "Student document attached");

    Ok(Json(DataResponse { data: thesis }))
}
