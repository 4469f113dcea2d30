//! Repository for the `thesis_selections` table.

use sqlx::PgPool;
use thesis_core::error::CoreError;
use thesis_core::thesis::ensure_can_select;
use thesis_core::types::DbId;

use crate::error::RepoError;
use crate::models::selection::ThesisSelection;
use crate::repositories::thesis_repo::lock_thesis;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, thesis_id, student_id, created_at, updated_at";

/// Provides select / unselect for students browsing `OPEN` theses.
pub struct SelectionRepo;

impl SelectionRepo {
    /// Students that currently selected `thesis_id`, oldest first.
    pub async fn list_for_thesis(
        pool: &PgPool,
        thesis_id: DbId,
    ) -> Result<Vec<ThesisSelection>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM thesis_selections
             WHERE thesis_id = $1
             ORDER BY created_at ASC, id ASC"
        );
        sqlx::query_as::<_, ThesisSelection>(&query)
            .bind(thesis_id)
            .fetch_all(pool)
            .await
    }

    /// The selection held by `student_id`, if any.
    pub async fn find_for_student(
        pool: &PgPool,
        student_id: DbId,
    ) -> Result<Option<ThesisSelection>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM thesis_selections WHERE student_id = $1");
        sqlx::query_as::<_, ThesisSelection>(&query)
            .bind(student_id)
            .fetch_optional(pool)
            .await
    }

    /// Record that `student_id` selected `thesis_id`.
    ///
    /// The thesis must be `OPEN` and the student must hold no selection.
    /// `uq_thesis_selections_student` backs the in-transaction check, so two
    /// concurrent selections by one student cannot both commit.
    pub async fn select(
        pool: &PgPool,
        student_id: DbId,
        thesis_id: DbId,
    ) -> Result<ThesisSelection, RepoError> {
        let mut tx = pool.begin().await?;
        let thesis = lock_thesis(&mut tx, thesis_id).await?;

        let existing: Option<(DbId,)> =
            sqlx::query_as("SELECT thesis_id FROM thesis_selections WHERE student_id = $1")
                .bind(student_id)
                .fetch_optional(&mut *tx)
                .await?;
        ensure_can_select(thesis_id, thesis.status()?, existing.map(|(id,)| id))?;

        let query = format!(
            "INSERT INTO thesis_selections (thesis_id, student_id)
             VALUES ($1, $2)
             RETURNING {COLUMNS}"
        );
        let selection = sqlx::query_as::<_, ThesisSelection>(&query)
            .bind(thesis_id)
            .bind(student_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(selection)
    }

    /// Remove the selection of `thesis_id` by `student_id`.
    pub async fn unselect(
        pool: &PgPool,
        student_id: DbId,
        thesis_id: DbId,
    ) -> Result<(), RepoError> {
        let result =
            sqlx::query("DELETE FROM thesis_selections WHERE thesis_id = $1 AND student_id = $2")
                .bind(thesis_id)
                .bind(student_id)
                .execute(pool)
                .await?;
        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound {
                entity: "ThesisSelection",
                id: thesis_id,
            }
            .into());
        }
        Ok(())
    }
}
