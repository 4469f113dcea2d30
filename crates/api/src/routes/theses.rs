//! Route definitions for the `/theses` resource, including the nested
//! invitation and grading endpoints.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::{grading, invitations, theses};
use crate::state::AppState;

/// Routes mounted at `/theses`.
///
/// ```text
/// GET    /                           -> list_theses
/// POST   /                           -> create_thesis
/// GET    /{id}                       -> get_thesis
/// PUT    /{id}                       -> update_thesis
/// DELETE /{id}                       -> delete_thesis
/// POST   /{id}/select                -> select_thesis
/// POST   /{id}/unselect              -> unselect_thesis
/// POST   /{id}/assign                -> assign_thesis
/// POST   /{id}/cancel                -> cancel_thesis
/// PUT    /{id}/student-pdf           -> upload_student_pdf
/// POST   /{id}/grade                 -> grade_thesis
/// GET    /{id}/invitations           -> invitations::list_for_thesis
/// POST   /{id}/invitations           -> invitations::invite
/// POST   /{id}/invitations/accept    -> invitations::accept
/// POST   /{id}/invitations/reject    -> invitations::reject
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(theses::list_theses).post(theses::create_thesis))
        .route(
            "/{id}",
            get(theses::get_thesis)
                .put(theses::update_thesis)
                .delete(theses::delete_thesis),
        )
        .route("/{id}/select", post(theses::select_thesis))
        .route("/{id}/unselect", post(theses::unselect_thesis))
        .route("/{id}/assign", post(theses::assign_thesis))
        .route("/{id}/cancel", post(theses::cancel_thesis))
        .route("/{id}/student-pdf", put(theses::upload_student_pdf))
        .route("/{id}/grade", post(grading::grade_thesis))
        .route(
            "/{id}/invitations",
            get(invitations::list_for_thesis).post(invitations::invite),
        )
        .route("/{id}/invitations/accept", post(invitations::accept))
        .route("/{id}/invitations/reject", post(invitations::reject))
}
