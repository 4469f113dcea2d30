//! Thesis selection model.

use serde::Serialize;
use sqlx::FromRow;
use thesis_core::types::{DbId, Timestamp};

/// A student's interest in an `OPEN` thesis. At most one per student.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ThesisSelection {
    pub id: DbId,
    pub thesis_id: DbId,
    pub student_id: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
