//! Repository for the `users` table.

use sqlx::{PgConnection, PgPool};
use thesis_core::error::CoreError;
use thesis_core::roles::Role;
use thesis_core::types::DbId;

use crate::error::RepoError;
use crate::models::user::{CreateUser, UpdateProfile, User};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, username, email, password_hash, full_name, role, student_number, \
                        postal_address, mobile_phone, landline_phone, created_at, updated_at";

/// Provides CRUD operations for users.
pub struct UserRepo;

impl UserRepo {
    /// Insert a new user, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateUser) -> Result<User, sqlx::Error> {
        let mut conn = pool.acquire().await?;
        Self::insert(&mut conn, input).await
    }

    /// Insert every user in `inputs` or none of them.
    pub async fn create_many(
        pool: &PgPool,
        inputs: &[CreateUser],
    ) -> Result<Vec<User>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let mut users = Vec::with_capacity(inputs.len());
        for input in inputs {
            users.push(Self::insert(&mut tx, input).await?);
        }
        tx.commit().await?;
        Ok(users)
    }

    async fn insert(conn: &mut PgConnection, input: &CreateUser) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (username, email, password_hash, full_name, role, student_number,
                                postal_address, mobile_phone, landline_phone)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&input.username)
            .bind(&input.email)
            .bind(&input.password_hash)
            .bind(&input.full_name)
            .bind(input.role.as_str())
            .bind(&input.student_number)
            .bind(&input.postal_address)
            .bind(&input.mobile_phone)
            .bind(&input.landline_phone)
            .fetch_one(&mut *conn)
            .await
    }

    /// Find a user by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a user by username (case-sensitive).
    pub async fn find_by_username(
        pool: &PgPool,
        username: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE username = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(username)
            .fetch_optional(pool)
            .await
    }

    /// Usernames and emails from the given lists that are already taken.
    pub async fn find_taken_identities(
        pool: &PgPool,
        usernames: &[String],
        emails: &[String],
    ) -> Result<Vec<String>, sqlx::Error> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT username FROM users WHERE username = ANY($1)
             UNION
             SELECT email FROM users WHERE email = ANY($2)",
        )
        .bind(usernames)
        .bind(emails)
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(|(value,)| value).collect())
    }

    /// List users ordered by full name, optionally restricted to one role.
    pub async fn list(pool: &PgPool, role: Option<Role>) -> Result<Vec<User>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM users
             WHERE ($1::TEXT IS NULL OR role = $1)
             ORDER BY full_name ASC, id ASC"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(role.map(Role::as_str))
            .fetch_all(pool)
            .await
    }

    /// Update the caller's own profile. Only non-`None` fields are applied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update_profile(
        pool: &PgPool,
        id: DbId,
        input: &UpdateProfile,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!(
            "UPDATE users SET
                email = COALESCE($2, email),
                full_name = COALESCE($3, full_name),
                postal_address = COALESCE($4, postal_address),
                mobile_phone = COALESCE($5, mobile_phone),
                landline_phone = COALESCE($6, landline_phone)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(&input.email)
            .bind(&input.full_name)
            .bind(&input.postal_address)
            .bind(&input.mobile_phone)
            .bind(&input.landline_phone)
            .fetch_optional(pool)
            .await
    }

    /// Delete an account together with everything that references it.
    ///
    /// In one transaction: invitations naming the user as invitee or
    /// inviter, the user's selection, theses the user owns and theses
    /// assigned to the user, then the user row. Deleting an accepted
    /// supervisor frees that slot on the thesis.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<(), RepoError> {
        let mut tx = pool.begin().await?;

        let exists: Option<(DbId,)> =
            sqlx::query_as("SELECT id FROM users WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if exists.is_none() {
            return Err(CoreError::NotFound { entity: "User", id }.into());
        }

        let invitations = sqlx::query(
            "DELETE FROM supervising_faculty WHERE faculty_id = $1 OR invited_by_id = $1",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        sqlx::query("DELETE FROM thesis_selections WHERE student_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let theses =
            sqlx::query("DELETE FROM theses WHERE faculty_id = $1 OR assigned_to_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?
                .rows_affected();

        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::debug!(user_id = id, invitations, theses, "User and dependent rows deleted");
        Ok(())
    }
}
