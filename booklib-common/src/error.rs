//! Common error types for booklib

use thiserror::Error;

/// Common result type for booklib operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across booklib services
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
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

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True when this wraps a database unique-constraint violation.
    ///
    /// Storage-level unique constraints are the authoritative guard
    /// against concurrent duplicate creation; callers use this to map a
    /// lost race to the same conflict error as their own pre-checks.
    pub fn is_unique_violation(&self) -> bool {
        let Error::Database(e) = self else {
            return false;
        };
        e.as_database_error()
            .map(|db| matches!(db.kind(), sqlx::error::ErrorKind::UniqueViolation))
            .unwrap_or(false)
    }
}
