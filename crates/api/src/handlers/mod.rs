//! Request handlers.
//!
//! Each submodule provides async handler functions for one resource.
//! Handlers check the caller's role through the RBAC extractors, delegate
//! to the corresponding repository in `thesis_db`, and map errors via
//! [`AppError`](crate::error::AppError).

pub mod admin;
pub mod auth;
pub mod grading;
pub mod invitations;
pub mod theses;
pub mod users;
