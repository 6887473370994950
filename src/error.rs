use thiserror::Error;

#[derive(Debug, Error)]
pub enum GradebookError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

pub type GradebookResult<T> = Result<T, GradebookError>;

impl GradebookError {
    pub fn validation(message: impl Into<String>) -> Self {
        GradebookError::Validation(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        GradebookError::Conflict(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        GradebookError::NotFound(message.into())
    }

    /// Stable wire code reported in `error.code`.
    pub fn code(&self) -> &'static str {
        match self {
            GradebookError::Validation(_) => "bad_params",
            GradebookError::Conflict(_) => "conflict",
            GradebookError::NotFound(_) => "not_found",
            GradebookError::Database(_) => "db_query_failed",
        }
    }
}
