//! Common error types for the civic services

use thiserror::Error;

/// Common result type for civic operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across civic services
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A uniqueness or state constraint rejected the write
    #[error("Constraint violation: {0}")]
    Conflict(String),

    /// Retryable failure (lock contention, timeout)
    #[error("Transient error: {0}")]
    Transient(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether retrying the same operation may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Transient(_) => true,
            #[cfg(feature = "sqlx")]
            Error::Database(err) => is_lock_error(err),
            _ => false,
        }
    }

    /// Whether the error came from a constraint rejecting the write
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Conflict(_))
    }
}

/// SQLite reports both busy and snapshot-busy conditions with this message
#[cfg(feature = "sqlx")]
pub fn is_lock_error(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.message().contains("database is locked"),
        sqlx::Error::PoolTimedOut => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(Error::Transient("busy".to_string()).is_transient());
        assert!(!Error::Conflict("dup".to_string()).is_transient());
        assert!(!Error::NotFound("x".to_string()).is_transient());
    }

    #[test]
    fn test_conflict_classification() {
        assert!(Error::Conflict("dup".to_string()).is_conflict());
        assert!(!Error::Internal("boom".to_string()).is_conflict());
    }

    #[cfg(feature = "sqlx")]
    #[test]
    fn test_pool_timeout_counts_as_lock_error() {
        assert!(is_lock_error(&sqlx::Error::PoolTimedOut));
        assert!(!is_lock_error(&sqlx::Error::RowNotFound));
    }
}
