//! Shared query parameter types for API handlers.

use serde::Deserialize;
use thesis_core::roles::Role;

/// Optional `?role=` filter for user listings.
#[derive(Debug, Deserialize)]
pub struct RoleFilterParams {
    pub role: Option<Role>,
}
