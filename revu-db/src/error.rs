//! Error types for database operations

use thiserror::Error;

/// Database error types
#[derive(Error, Debug)]
pub enum Error {
    /// SQLx database error
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Migration error
    #[error("Migration error: {0}")]
    Migration(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(String),

    /// A single-row lookup matched nothing
    #[error("Not found: {0}")]
    NotFound(String),

    /// An existence pre-check found a row that must not exist yet
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// A stored value could not be turned back into a model
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl Error {
    /// True when the store rejected a write because of a primary key or
    /// unique constraint.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Error::Sqlx(sqlx::Error::Database(e)) => e.is_unique_violation(),
            _ => false,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}

/// Result type alias for database operations
pub type Result<T> = std::result::Result<T, Error>;
