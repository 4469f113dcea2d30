//! Domain layer for the thesis assignment service.
//!
//! Everything in this crate is pure: no I/O, no clocks except the
//! timestamps callers pass in. The database and HTTP crates load state,
//! hand it to the transitions defined here, and persist what comes back.

pub mod error;
pub mod grading;
pub mod lifecycle;
pub mod roles;
pub mod status;
pub mod supervision;
pub mod thesis;
pub mod types;
pub mod users;
