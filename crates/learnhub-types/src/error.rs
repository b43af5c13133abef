use thiserror::Error;

/// Errors related to skill operations.
#[derive(Debug, Error)]
pub enum SkillError {
    #[error("skill not found")]
    NotFound,

    #[error("skill '{0}' already exists")]
    NameConflict(String),

    #[error("invalid skill name: {0}")]
    InvalidName(String),

    #[error("skill still owns {0} active resource(s)")]
    HasActiveResources(usize),

    #[error("storage error: {0}")]
    StorageError(String),
}

/// Errors related to resource operations.
#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("resource not found")]
    NotFound,

    #[error("owning skill not found")]
    SkillNotFound,

    #[error("invalid resource title: {0}")]
    InvalidTitle(String),

    #[error("rating must be between 0 and 5, got {0}")]
    InvalidRating(f64),

    #[error("storage error: {0}")]
    StorageError(String),
}

impl From<SkillError> for ResourceError {
    fn from(e: SkillError) -> Self {
        match e {
            SkillError::NotFound => ResourceError::SkillNotFound,
            other => ResourceError::StorageError(other.to_string()),
        }
    }
}

/// Errors from repository operations (used by trait definitions in learnhub-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}
