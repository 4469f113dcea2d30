use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// The caller could not be authenticated at all.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The caller is known but lacks standing for the operation.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// A thesis already holds its maximum number of supervisors.
    #[error("Capacity exceeded: {0}")]
    Capacity(String),

    /// The operation is not valid for the thesis's current status.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
