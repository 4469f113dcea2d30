//! Authentication and authorization middleware extractors.
//!
//! - [`auth::AuthUser`] -- Extracts the authenticated user from a JWT Bearer token.
//! - [`rbac::RequireStudent`] -- Requires the `STUDENT` role.
//! - [`rbac::RequireFaculty`] -- Requires the `FACULTY` role.
//! - [`rbac::RequireSecretary`] -- Requires the `SECRETARY` role.

pub mod auth;
pub mod rbac;
