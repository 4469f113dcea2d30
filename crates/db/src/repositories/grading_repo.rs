//! Mark submission against the `theses` mark columns.

use serde::Serialize;
use sqlx::PgPool;
use thesis_core::grading::{Completion, GradingSlot};
use thesis_core::types::DbId;

use crate::error::RepoError;
use crate::models::thesis::Thesis;
use crate::repositories::thesis_repo::{delete_pending_invitations, lock_aggregate, COLUMNS};

/// Result of one accepted mark submission.
#[derive(Debug, Clone, Serialize)]
pub struct GradeSubmission {
    pub thesis: Thesis,
    pub slot: GradingSlot,
    /// Whether this mark completed the thesis.
    pub completed: bool,
}

/// Records marks and completes theses once every expected grader submitted.
pub struct GradingRepo;

impl GradingRepo {
    /// Record `mark` from `grader_id` on `thesis_id`.
    ///
    /// The grader writes into the main-faculty slot if they own the thesis,
    /// otherwise into the supervisor slot stored at acceptance. Each slot is
    /// write-once. Runs under the thesis row lock so concurrent submissions
    /// observe each other's marks when evaluating completion.
    pub async fn grade(
        pool: &PgPool,
        grader_id: DbId,
        thesis_id: DbId,
        mark: f64,
    ) -> Result<GradeSubmission, RepoError> {
        let mut tx = pool.begin().await?;
        let (_, mut aggregate) = lock_aggregate(&mut tx, thesis_id).await?;
        let outcome = aggregate.grade(grader_id, mark)?;

        // The column name comes from a closed enum, never from input.
        let query = format!(
            "UPDATE theses SET {column} = $2, status_id = $3, final_mark = $4
             WHERE id = $1
             RETURNING {COLUMNS}",
            column = outcome.slot.column(),
        );
        let thesis = sqlx::query_as::<_, Thesis>(&query)
            .bind(thesis_id)
            .bind(outcome.mark)
            .bind(aggregate.status.id())
            .bind(aggregate.final_mark)
            .fetch_one(&mut *tx)
            .await?;

        if !outcome.purged.is_empty() {
            delete_pending_invitations(&mut tx, thesis_id).await?;
        }

        tx.commit().await?;

        match outcome.completion {
            Completion::Complete { final_mark } => {
                tracing::info!(thesis_id, final_mark, "Thesis completed");
            }
            Completion::NoCompletionPath => {
                tracing::warn!(
                    thesis_id,
                    "Thesis has no accepted supervisors; it cannot complete until one accepts"
                );
            }
            Completion::Pending => {}
        }

        Ok(GradeSubmission {
            thesis,
            slot: outcome.slot,
            completed: matches!(outcome.completion, Completion::Complete { .. }),
        })
    }
}
