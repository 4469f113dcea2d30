//! Thesis entity model and DTOs.

use serde::{Deserialize, Serialize, Serializer};
use sqlx::FromRow;
use thesis_core::error::CoreError;
use thesis_core::grading::Marks;
use thesis_core::lifecycle::ThesisAggregate;
use thesis_core::status::{StatusId, ThesisStatus};
use thesis_core::types::{DbId, Timestamp};

use crate::models::selection::ThesisSelection;
use crate::models::supervision::SupervisingFaculty;

/// A row from the `theses` table.
///
/// Serialized with the status name (`"status": "OPEN"`) instead of the
/// lookup id.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Thesis {
    pub id: DbId,
    pub title: String,
    pub description: String,
    #[serde(rename = "status", serialize_with = "serialize_thesis_status")]
    pub status_id: StatusId,
    pub faculty_id: DbId,
    pub assigned_to_id: Option<DbId>,
    pub pdf_url: Option<String>,
    pub student_pdf_url: Option<String>,
    pub main_faculty_mark: Option<f64>,
    pub supervisor1_mark: Option<f64>,
    pub supervisor2_mark: Option<f64>,
    pub final_mark: Option<f64>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

fn serialize_thesis_status<S: Serializer>(id: &StatusId, serializer: S) -> Result<S::Ok, S::Error> {
    let status = ThesisStatus::from_id(*id)
        .ok_or_else(|| serde::ser::Error::custom(format!("unknown thesis status_id {id}")))?;
    status.serialize(serializer)
}

impl Thesis {
    pub fn status(&self) -> Result<ThesisStatus, CoreError> {
        ThesisStatus::from_id(self.status_id).ok_or_else(|| {
            CoreError::Internal(format!(
                "Thesis {} has unknown status_id {}",
                self.id, self.status_id
            ))
        })
    }

    pub fn marks(&self) -> Marks {
        Marks {
            main_faculty: self.main_faculty_mark,
            supervisor1: self.supervisor1_mark,
            supervisor2: self.supervisor2_mark,
        }
    }

    /// Build the domain aggregate from this row and its invitation rows.
    pub fn to_aggregate(
        &self,
        invitations: &[SupervisingFaculty],
    ) -> Result<ThesisAggregate, CoreError> {
        Ok(ThesisAggregate {
            id: self.id,
            faculty_id: self.faculty_id,
            status: self.status()?,
            assigned_to_id: self.assigned_to_id,
            marks: self.marks(),
            final_mark: self.final_mark,
            invitations: invitations
                .iter()
                .map(SupervisingFaculty::to_invitation)
                .collect::<Result<_, _>>()?,
        })
    }
}

/// A thesis with its selection pool and invitation records.
#[derive(Debug, Clone, Serialize)]
pub struct ThesisDetail {
    #[serde(flatten)]
    pub thesis: Thesis,
    pub selected_by: Vec<ThesisSelection>,
    pub supervising_faculty: Vec<SupervisingFaculty>,
}

/// DTO for proposing a new thesis. The owner comes from the caller.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateThesis {
    pub title: String,
    pub description: String,
    pub pdf_url: Option<String>,
}

/// DTO for editing a thesis. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateThesis {
    pub title: Option<String>,
    pub description: Option<String>,
    pub pdf_url: Option<String>,
}

/// Optional filters for listing theses.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ThesisFilter {
    pub status: Option<ThesisStatus>,
    pub faculty_id: Option<DbId>,
}
