//! Handler for mark submission.

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use thesis_core::types::DbId;
use thesis_db::repositories::grading_repo::GradeSubmission;
use thesis_db::repositories::GradingRepo;

use crate::error::AppResult;
use crate::middleware::rbac::RequireFaculty;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /theses/{id}/grade`.
#[derive(Debug, Deserialize)]
pub struct GradeRequest {
    pub mark: f64,
}

/// POST /api/v1/theses/{id}/grade
///
/// Record the caller's mark. The owner grades as main faculty; accepted
/// supervisors grade into the slot they were given at acceptance. The
/// response says whether this mark completed the thesis.
pub async fn grade_thesis(
    State(state): State<AppState>,
    RequireFaculty(user): RequireFaculty,
    Path(thesis_id): Path<DbId>,
    Json(input): Json<GradeRequest>,
) -> AppResult<Json<DataResponse<GradeSubmission>>> {
    let submission = GradingRepo::grade(&state.pool, user.user_id, thesis_id, input.mark).await?;

    tracing::info!(
        user_id = user.user_id,
        thesis_id,
        slot = ?submission.slot,
        completed = submission.completed,
        "Mark recorded"
    );

    Ok(Json(DataResponse { data: submission }))
}
