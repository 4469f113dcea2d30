//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument. Workflow methods open their own
//! transaction and lock the thesis row with `SELECT ... FOR UPDATE` before
//! reading anything that the transition depends on.

pub mod grading_repo;
pub mod selection_repo;
pub mod supervision_repo;
pub mod thesis_repo;
pub mod user_repo;

pub use grading_repo::GradingRepo;
pub use selection_repo::SelectionRepo;
pub use supervision_repo::SupervisionRepo;
pub use thesis_repo::ThesisRepo;
pub use user_repo::UserRepo;
