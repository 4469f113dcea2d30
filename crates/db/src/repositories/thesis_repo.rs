//! Repository for the `theses` table and its status transitions.

use sqlx::{PgConnection, PgPool};
use thesis_core::error::CoreError;
use thesis_core::lifecycle::ThesisAggregate;
use thesis_core::roles::Role;
use thesis_core::status::{InvitationStatus, ThesisStatus};
use thesis_core::thesis::{
    ensure_editable, ensure_owner, ensure_student_upload, validate_description,
    validate_file_reference, validate_new_thesis, validate_title,
};
use thesis_core::types::DbId;

use crate::error::RepoError;
use crate::models::thesis::{CreateThesis, Thesis, ThesisDetail, ThesisFilter, UpdateThesis};
use crate::repositories::{SelectionRepo, SupervisionRepo};

/// Column list shared across queries to avoid repetition.
pub(crate) const COLUMNS: &str = "id, title, description, status_id, faculty_id, assigned_to_id, \
                                  pdf_url, student_pdf_url, main_faculty_mark, supervisor1_mark, \
                                  supervisor2_mark, final_mark, created_at, updated_at";

/// Lock the thesis row for the rest of the transaction.
pub(crate) async fn lock_thesis(conn: &mut PgConnection, id: DbId) -> Result<Thesis, RepoError> {
    let query = format!("SELECT {COLUMNS} FROM theses WHERE id = $1 FOR UPDATE");
    sqlx::query_as::<_, Thesis>(&query)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(RepoError::Core(CoreError::NotFound {
            entity: "Thesis",
            id,
        }))
}

/// Lock the thesis row and load it together with its invitation records.
pub(crate) async fn lock_aggregate(
    conn: &mut PgConnection,
    id: DbId,
) -> Result<(Thesis, ThesisAggregate), RepoError> {
    let thesis = lock_thesis(&mut *conn, id).await?;
    let invitations = SupervisionRepo::list_for_thesis_in(&mut *conn, id).await?;
    let aggregate = thesis.to_aggregate(&invitations)?;
    Ok((thesis, aggregate))
}

/// Drop every pending invitation of a thesis. Returns the number removed.
pub(crate) async fn delete_pending_invitations(
    conn: &mut PgConnection,
    thesis_id: DbId,
) -> Result<u64, sqlx::Error> {
    let result =
        sqlx::query("DELETE FROM supervising_faculty WHERE thesis_id = $1 AND status_id = $2")
            .bind(thesis_id)
            .bind(InvitationStatus::Pending.id())
            .execute(&mut *conn)
            .await?;
    Ok(result.rows_affected())
}

/// Provides CRUD operations and lifecycle transitions for theses.
pub struct ThesisRepo;

impl ThesisRepo {
    /// Insert a new `OPEN` thesis owned by `faculty_id`.
    pub async fn create(
        pool: &PgPool,
        faculty_id: DbId,
        input: &CreateThesis,
    ) -> Result<Thesis, RepoError> {
        validate_new_thesis(&input.title, &input.description)?;
        if let Some(url) = &input.pdf_url {
            validate_file_reference(url)?;
        }

        let query = format!(
            "INSERT INTO theses (title, description, faculty_id, pdf_url, status_id)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        let thesis = sqlx::query_as::<_, Thesis>(&query)
            .bind(input.title.trim())
            .bind(input.description.trim())
            .bind(faculty_id)
            .bind(&input.pdf_url)
            .bind(ThesisStatus::Open.id())
            .fetch_one(pool)
            .await?;
        Ok(thesis)
    }

    /// Find a thesis by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Thesis>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM theses WHERE id = $1");
        sqlx::query_as::<_, Thesis>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a thesis with its selection pool and invitation records.
    pub async fn find_detail(pool: &PgPool, id: DbId) -> Result<Option<ThesisDetail>, RepoError> {
        let Some(thesis) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };
        let selected_by = SelectionRepo::list_for_thesis(pool, id).await?;
        let supervising_faculty = SupervisionRepo::list_for_thesis(pool, id).await?;
        Ok(Some(ThesisDetail {
            thesis,
            selected_by,
            supervising_faculty,
        }))
    }

    /// List theses, newest first, optionally filtered by status and owner.
    pub async fn list(pool: &PgPool, filter: &ThesisFilter) -> Result<Vec<Thesis>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM theses
             WHERE ($1::SMALLINT IS NULL OR status_id = $1)
               AND ($2::BIGINT IS NULL OR faculty_id = $2)
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, Thesis>(&query)
            .bind(filter.status.map(ThesisStatus::id))
            .bind(filter.faculty_id)
            .fetch_all(pool)
            .await
    }

    /// Edit title, description or proposal PDF. Owner only, and only while
    /// the thesis is not yet `COMPLETED` or `CANCELLED`.
    pub async fn update(
        pool: &PgPool,
        actor_id: DbId,
        id: DbId,
        input: &UpdateThesis,
    ) -> Result<Thesis, RepoError> {
        if let Some(title) = &input.title {
            validate_title(title)?;
        }
        if let Some(description) = &input.description {
            validate_description(description)?;
        }
        if let Some(url) = &input.pdf_url {
            validate_file_reference(url)?;
        }

        let mut tx = pool.begin().await?;
        let current = lock_thesis(&mut tx, id).await?;
        ensure_owner(current.faculty_id, actor_id)?;
        ensure_editable(current.status()?)?;

        let query = format!(
            "UPDATE theses SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                pdf_url = COALESCE($4, pdf_url)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let thesis = sqlx::query_as::<_, Thesis>(&query)
            .bind(id)
            .bind(input.title.as_deref().map(str::trim))
            .bind(input.description.as_deref().map(str::trim))
            .bind(&input.pdf_url)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(thesis)
    }

    /// Delete a thesis. Owner only; selections and invitations cascade.
    pub async fn delete(pool: &PgPool, actor_id: DbId, id: DbId) -> Result<(), RepoError> {
        let mut tx = pool.begin().await?;
        let current = lock_thesis(&mut tx, id).await?;
        ensure_owner(current.faculty_id, actor_id)?;

        sqlx::query("DELETE FROM theses WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Assign `student_id` to an `OPEN` thesis.
    ///
    /// The thesis's selection pool is cleared, as is any selection the
    /// assigned student still holds elsewhere.
    pub async fn assign(
        pool: &PgPool,
        actor_id: DbId,
        id: DbId,
        student_id: DbId,
    ) -> Result<Thesis, RepoError> {
        let mut tx = pool.begin().await?;
        let (_, mut aggregate) = lock_aggregate(&mut tx, id).await?;
        aggregate.assign(actor_id, student_id)?;

        let student: Option<(String,)> = sqlx::query_as("SELECT role FROM users WHERE id = $1")
            .bind(student_id)
            .fetch_optional(&mut *tx)
            .await?;
        if !matches!(&student, Some((role,)) if role.as_str() == Role::Student.as_str()) {
            return Err(CoreError::NotFound {
                entity: "Student",
                id: student_id,
            }
            .into());
        }

        let query = format!(
            "UPDATE theses SET status_id = $2, assigned_to_id = $3
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let thesis = sqlx::query_as::<_, Thesis>(&query)
            .bind(id)
            .bind(aggregate.status.id())
            .bind(student_id)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM thesis_selections WHERE thesis_id = $1 OR student_id = $2")
            .bind(id)
            .bind(student_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(thesis)
    }

    /// Cancel an `OPEN` or `ASSIGNED` thesis.
    ///
    /// Allowed for the owner and for any secretary. Pending invitations and
    /// selections are dropped; accepted supervisors stay on record.
    pub async fn cancel(
        pool: &PgPool,
        actor_id: DbId,
        actor_role: Role,
        id: DbId,
    ) -> Result<Thesis, RepoError> {
        let mut tx = pool.begin().await?;
        let (_, mut aggregate) = lock_aggregate(&mut tx, id).await?;
        aggregate.cancel(actor_id, actor_role)?;

        let query = format!(
            "UPDATE theses SET status_id = $2
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let thesis = sqlx::query_as::<_, Thesis>(&query)
            .bind(id)
            .bind(aggregate.status.id())
            .fetch_one(&mut *tx)
            .await?;

        let purged = delete_pending_invitations(&mut tx, id).await?;
        sqlx::query("DELETE FROM thesis_selections WHERE thesis_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::debug!(thesis_id = id, purged, "Pending invitations dropped on cancel");
        Ok(thesis)
    }

    /// Attach the assigned student's manuscript reference.
    pub async fn attach_student_pdf(
        pool: &PgPool,
        student_id: DbId,
        id: DbId,
        url: &str,
    ) -> Result<Thesis, RepoError> {
        validate_file_reference(url)?;

        let mut tx = pool.begin().await?;
        let current = lock_thesis(&mut tx, id).await?;
        ensure_student_upload(current.status()?, current.assigned_to_id, student_id)?;

        let query = format!(
            "UPDATE theses SET student_pdf_url = $2
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let thesis = sqlx::query_as::<_, Thesis>(&query)
            .bind(id)
            .bind(url)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(thesis)
    }
}

