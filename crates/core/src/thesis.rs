//! Thesis field validation and the status transition table.
//!
//! ```text
//! OPEN ──assign──▶ ASSIGNED ──grading complete──▶ COMPLETED
//!   │                 │
//!   └─────cancel──────┴──────▶ CANCELLED
//! ```
//!
//! Nothing ever moves back to `OPEN`, and `OPEN` never jumps straight to
//! `COMPLETED`.

use crate::error::CoreError;
use crate::status::ThesisStatus;
use crate::types::DbId;

/// Maximum length of a thesis title.
pub const MAX_TITLE_LENGTH: usize = 255;

/// Maximum length of a thesis description.
pub const MAX_DESCRIPTION_LENGTH: usize = 10_000;

/// Maximum length of a stored file-store reference.
pub const MAX_URL_LENGTH: usize = 2_048;

/* --------------------------------------------------------------------------
Field validation
-------------------------------------------------------------------------- */

/// Validate a thesis title: required, non-blank, bounded.
pub fn validate_title(title: &str) -> Result<(), CoreError> {
    if title.trim().is_empty() {
        return Err(CoreError::Validation("Title is required".to_string()));
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(CoreError::Validation(format!(
            "Title exceeds maximum length of {MAX_TITLE_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Validate a thesis description: required, non-blank, bounded.
pub fn validate_description(description: &str) -> Result<(), CoreError> {
    if description.trim().is_empty() {
        return Err(CoreError::Validation("Description is required".to_string()));
    }
    if description.chars().count() > MAX_DESCRIPTION_LENGTH {
        return Err(CoreError::Validation(format!(
            "Description exceeds maximum length of {MAX_DESCRIPTION_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Validate the fields required to create a thesis.
pub fn validate_new_thesis(title: &str, description: &str) -> Result<(), CoreError> {
    validate_title(title)?;
    validate_description(description)
}

/// Validate an opaque file-store reference (`pdf_url`, `student_pdf_url`).
pub fn validate_file_reference(url: &str) -> Result<(), CoreError> {
    if url.trim().is_empty() {
        return Err(CoreError::Validation(
            "File reference must not be empty".to_string(),
        ));
    }
    if url.len() > MAX_URL_LENGTH {
        return Err(CoreError::Validation(format!(
            "File reference exceeds maximum length of {MAX_URL_LENGTH} characters"
        )));
    }
    Ok(())
}

/* --------------------------------------------------------------------------
Status transitions
-------------------------------------------------------------------------- */

impl ThesisStatus {
    /// Whether the lifecycle allows moving from `self` to `next`.
    pub fn can_transition_to(self, next: ThesisStatus) -> bool {
        use ThesisStatus::*;
        matches!(
            (self, next),
            (Open, Assigned) | (Assigned, Completed) | (Open, Cancelled) | (Assigned, Cancelled)
        )
    }

    /// Like [`can_transition_to`](Self::can_transition_to) but as a
    /// `Result` carrying an `InvalidState` error.
    pub fn ensure_transition(self, next: ThesisStatus) -> Result<(), CoreError> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(CoreError::InvalidState(format!(
                "Thesis cannot move from {self} to {next}"
            )))
        }
    }
}

/// Only the proposing faculty member may manage a thesis.
pub fn ensure_owner(thesis_faculty_id: DbId, actor_id: DbId) -> Result<(), CoreError> {
    if thesis_faculty_id != actor_id {
        return Err(CoreError::Forbidden(
            "Only the proposing faculty member can manage this thesis".to_string(),
        ));
    }
    Ok(())
}

/// Editing title, description or the proposal PDF is allowed until the
/// thesis reaches a terminal status.
pub fn ensure_editable(status: ThesisStatus) -> Result<(), CoreError> {
    if status.is_terminal() {
        return Err(CoreError::InvalidState(format!(
            "A {status} thesis can no longer be edited"
        )));
    }
    Ok(())
}

/// Only the assigned student uploads the manuscript, and only while the
/// thesis is `ASSIGNED`.
pub fn ensure_student_upload(
    status: ThesisStatus,
    assigned_to_id: Option<DbId>,
    student_id: DbId,
) -> Result<(), CoreError> {
    if assigned_to_id != Some(student_id) {
        return Err(CoreError::Forbidden(
            "Only the assigned student can upload the thesis document".to_string(),
        ));
    }
    if status != ThesisStatus::Assigned {
        return Err(CoreError::InvalidState(format!(
            "A {status} thesis no longer accepts uploads"
        )));
    }
    Ok(())
}

/* --------------------------------------------------------------------------
Selection
-------------------------------------------------------------------------- */

/// Check whether a student may add `thesis_id` to their selection.
///
/// `existing_selection` is the thesis the student currently holds, if any.
/// A student holds at most one selection across all theses.
pub fn ensure_can_select(
    thesis_id: DbId,
    status: ThesisStatus,
    existing_selection: Option<DbId>,
) -> Result<(), CoreError> {
    if status != ThesisStatus::Open {
        return Err(CoreError::InvalidState(format!(
            "Thesis is {status} and not available for selection"
        )));
    }
    match existing_selection {
        Some(current) if current == thesis_id => Err(CoreError::Conflict(
            "You have already selected this thesis".to_string(),
        )),
        Some(_) => Err(CoreError::Conflict(
            "You have already selected a thesis".to_string(),
        )),
        None => Ok(()),
    }
}
