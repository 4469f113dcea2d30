//! User entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thesis_core::error::CoreError;
use thesis_core::roles::Role;
use thesis_core::types::{DbId, Timestamp};

/// Full user row from the `users` table.
///
/// Contains the password hash -- NEVER serialize this to API responses directly.
/// Use [`UserResponse`] for external-facing output.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: DbId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub role: String,
    pub student_number: Option<String>,
    pub postal_address: Option<String>,
    pub mobile_phone: Option<String>,
    pub landline_phone: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl User {
    /// Parsed role. The `CHECK` constraint keeps stored values valid.
    pub fn role(&self) -> Result<Role, CoreError> {
        self.role.parse()
    }
}

/// Safe user representation for API responses (no password hash).
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: DbId,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub role: String,
    pub student_number: Option<String>,
    pub postal_address: Option<String>,
    pub mobile_phone: Option<String>,
    pub landline_phone: Option<String>,
    pub created_at: Timestamp,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            role: user.role,
            student_number: user.student_number,
            postal_address: user.postal_address,
            mobile_phone: user.mobile_phone,
            landline_phone: user.landline_phone,
            created_at: user.created_at,
        }
    }
}

/// DTO for creating a new user. The password is already hashed.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub role: Role,
    pub student_number: Option<String>,
    pub postal_address: Option<String>,
    pub mobile_phone: Option<String>,
    pub landline_phone: Option<String>,
}

/// DTO for a user editing their own profile. All fields are optional.
///
/// Username and role are not editable here.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfile {
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub postal_address: Option<String>,
    pub mobile_phone: Option<String>,
    pub landline_phone: Option<String>,
}
