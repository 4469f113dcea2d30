use thesis_core::error::CoreError;

/// Error returned by transactional workflow methods.
///
/// `Core` means the domain refused the operation; the transaction has been
/// rolled back unless the refusal itself had to be committed (see
/// `SupervisionRepo::accept`). `Database` is a storage failure.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}
