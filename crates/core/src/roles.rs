//! Well-known role names and the [`Role`] enum.
//!
//! Role names are stored verbatim in `users.role` and embedded in JWT
//! claims, so they must match the `CHECK` constraint in
//! `20250301000002_create_users_table.sql`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

pub const ROLE_STUDENT: &str = "STUDENT";
pub const ROLE_FACULTY: &str = "FACULTY";
pub const ROLE_SECRETARY: &str = "SECRETARY";

/// All valid role names.
pub const VALID_ROLES: &[&str] = &[ROLE_STUDENT, ROLE_FACULTY, ROLE_SECRETARY];

/// The role an actor acts under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Student,
    Faculty,
    Secretary,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Student => ROLE_STUDENT,
            Role::Faculty => ROLE_FACULTY,
            Role::Secretary => ROLE_SECRETARY,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            ROLE_STUDENT => Ok(Role::Student),
            ROLE_FACULTY => Ok(Role::Faculty),
            ROLE_SECRETARY => Ok(Role::Secretary),
            other => Err(CoreError::Validation(format!(
                "Invalid role '{other}'. Must be one of: {}",
                VALID_ROLES.join(", ")
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_names_round_trip_through_from_str() {
        for name in VALID_ROLES {
            let role: Role = name.parse().unwrap();
            assert_eq!(role.as_str(), *name);
        }
    }

    #[test]
    fn lowercase_role_is_rejected() {
        let err = "faculty".parse::<Role>().unwrap_err();
        assert!(err.to_string().contains("Invalid role"));
    }

    #[test]
    fn display_matches_stored_name() {
        assert_eq!(Role::Secretary.to_string(), "SECRETARY");
        assert_eq!(Role::Student.to_string(), ROLE_STUDENT);
    }
}
