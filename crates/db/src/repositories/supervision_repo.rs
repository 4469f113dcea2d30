//! Repository for the `supervising_faculty` table: the invitation protocol.

use chrono::Utc;
use sqlx::{PgConnection, PgPool};
use thesis_core::error::CoreError;
use thesis_core::lifecycle::AcceptOutcome;
use thesis_core::roles::Role;
use thesis_core::status::InvitationStatus;
use thesis_core::supervision;
use thesis_core::types::DbId;

use crate::error::RepoError;
use crate::models::supervision::{PendingInvitation, SupervisingFaculty};
use crate::repositories::thesis_repo::{delete_pending_invitations, lock_aggregate};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, thesis_id, faculty_id, invited_by_id, status_id, slot_index, \
                        accepted_at, created_at, updated_at";

/// Provides the invite / accept / reject protocol for co-supervisors.
pub struct SupervisionRepo;

impl SupervisionRepo {
    /// All invitation records of a thesis: accepted ones in slot order,
    /// then pending ones oldest first.
    pub async fn list_for_thesis(
        pool: &PgPool,
        thesis_id: DbId,
    ) -> Result<Vec<SupervisingFaculty>, sqlx::Error> {
        let mut conn = pool.acquire().await?;
        Self::list_for_thesis_in(&mut conn, thesis_id).await
    }

    pub(crate) async fn list_for_thesis_in(
        conn: &mut PgConnection,
        thesis_id: DbId,
    ) -> Result<Vec<SupervisingFaculty>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM supervising_faculty
             WHERE thesis_id = $1
             ORDER BY slot_index ASC NULLS LAST, created_at ASC, id ASC"
        );
        sqlx::query_as::<_, SupervisingFaculty>(&query)
            .bind(thesis_id)
            .fetch_all(&mut *conn)
            .await
    }

    /// Pending invitations addressed to `faculty_id`, newest first.
    pub async fn list_pending_for_faculty(
        pool: &PgPool,
        faculty_id: DbId,
    ) -> Result<Vec<PendingInvitation>, sqlx::Error> {
        sqlx::query_as::<_, PendingInvitation>(
            "SELECT sf.id, sf.thesis_id, t.title AS thesis_title, sf.invited_by_id, sf.created_at
             FROM supervising_faculty sf
             JOIN theses t ON t.id = sf.thesis_id
             WHERE sf.faculty_id = $1 AND sf.status_id = $2
             ORDER BY sf.created_at DESC, sf.id DESC",
        )
        .bind(faculty_id)
        .bind(InvitationStatus::Pending.id())
        .fetch_all(pool)
        .await
    }

    /// Invite `faculty_id` to co-supervise `thesis_id`.
    ///
    /// The inviter must be the owner or the assigned student; the target must
    /// be an existing faculty member other than the owner.
    pub async fn invite(
        pool: &PgPool,
        inviter_id: DbId,
        thesis_id: DbId,
        faculty_id: DbId,
    ) -> Result<SupervisingFaculty, RepoError> {
        let mut tx = pool.begin().await?;
        let (_, mut aggregate) = lock_aggregate(&mut tx, thesis_id).await?;
        supervision::ensure_inviter_standing(
            inviter_id,
            aggregate.faculty_id,
            aggregate.assigned_to_id,
        )?;

        let target: Option<(String,)> = sqlx::query_as("SELECT role FROM users WHERE id = $1")
            .bind(faculty_id)
            .fetch_optional(&mut *tx)
            .await?;
        let target_role: Role = match target {
            Some((role,)) => role.parse()?,
            None => {
                return Err(CoreError::NotFound {
                    entity: "User",
                    id: faculty_id,
                }
                .into())
            }
        };

        let invitation = aggregate.invite(inviter_id, faculty_id, target_role)?;

        let query = format!(
            "INSERT INTO supervising_faculty (thesis_id, faculty_id, invited_by_id, status_id)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, SupervisingFaculty>(&query)
            .bind(thesis_id)
            .bind(invitation.faculty_id)
            .bind(invitation.invited_by_id)
            .bind(invitation.state.status().id())
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(row)
    }

    /// Accept the pending invitation of `faculty_id` on `thesis_id`.
    ///
    /// On success the returned row carries the 1-indexed `slot_index`. When
    /// both slots are already taken the invitation is deleted, the deletion
    /// committed, and `Capacity` returned. Filling the second slot deletes
    /// every other pending invitation of the thesis.
    pub async fn accept(
        pool: &PgPool,
        faculty_id: DbId,
        thesis_id: DbId,
    ) -> Result<SupervisingFaculty, RepoError> {
        let mut tx = pool.begin().await?;
        let (_, mut aggregate) = lock_aggregate(&mut tx, thesis_id).await?;
        let outcome = aggregate.accept(faculty_id, Utc::now())?;

        let AcceptOutcome::Accepted {
            slot,
            accepted_at,
            purged,
        } = outcome
        else {
            sqlx::query("DELETE FROM supervising_faculty WHERE thesis_id = $1 AND faculty_id = $2")
                .bind(thesis_id)
                .bind(faculty_id)
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;
            tracing::info!(thesis_id, faculty_id, "Invitation refused: no free supervisor slot");
            return Err(supervision::supervisors_full().into());
        };

        let query = format!(
            "UPDATE supervising_faculty
             SET status_id = $3, slot_index = $4, accepted_at = $5
             WHERE thesis_id = $1 AND faculty_id = $2
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, SupervisingFaculty>(&query)
            .bind(thesis_id)
            .bind(faculty_id)
            .bind(InvitationStatus::Accepted.id())
            .bind(slot.index())
            .bind(accepted_at)
            .fetch_one(&mut *tx)
            .await?;

        if !purged.is_empty() {
            delete_pending_invitations(&mut tx, thesis_id).await?;
            tracing::debug!(thesis_id, ?purged, "Dropped pending invitations after second acceptance");
        }

        tx.commit().await?;
        Ok(row)
    }

    /// Reject (delete) the pending invitation of `faculty_id` on `thesis_id`.
    pub async fn reject(pool: &PgPool, faculty_id: DbId, thesis_id: DbId) -> Result<(), RepoError> {
        let mut tx = pool.begin().await?;
        let (_, mut aggregate) = lock_aggregate(&mut tx, thesis_id).await?;
        aggregate.reject(faculty_id)?;

        sqlx::query("DELETE FROM supervising_faculty WHERE thesis_id = $1 AND faculty_id = $2")
            .bind(thesis_id)
            .bind(faculty_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}
