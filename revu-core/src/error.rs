//! Error types for Revu

use serde::Serialize;
use thiserror::Error;

/// Result type alias for Revu operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for Revu operations
#[derive(Error, Debug)]
pub enum Error {
    /// A team with this name already exists
    #[error("Team {0} already exists")]
    TeamExists(String),

    /// A pull request with this id already exists
    #[error("Pull request {0} already exists")]
    PrExists(String),

    /// The pull request is merged and its reviewers can no longer change
    #[error("Pull request {0} is merged")]
    PrMerged(String),

    /// The user is not a reviewer of the pull request
    #[error("User {user_id} is not assigned to pull request {pr_id}")]
    NotAssigned { pr_id: String, user_id: String },

    /// No active team member is left to take over the review
    #[error("No active replacement candidate for pull request {0}")]
    NoCandidate(String),

    /// Team, user or pull request does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Unclassified storage failure
    #[error("Internal error: {0}")]
    Internal(#[source] revu_db::Error),
}

/// Coarse classification of [`Error`] variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Conflict,
    PreconditionViolated,
    ResourceExhausted,
    NotFound,
    Unexpected,
}

impl Error {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::TeamExists(_) | Error::PrExists(_) => ErrorCategory::Conflict,
            Error::PrMerged(_) | Error::NotAssigned { .. } => ErrorCategory::PreconditionViolated,
            Error::NoCandidate(_) => ErrorCategory::ResourceExhausted,
            Error::NotFound(_) => ErrorCategory::NotFound,
            Error::Config(_) | Error::Io(_) | Error::Internal(_) => ErrorCategory::Unexpected,
        }
    }

    /// Stable machine-readable code, as exposed on the wire
    pub fn code(&self) -> &'static str {
        match self {
            Error::TeamExists(_) => "TEAM_EXISTS",
            Error::PrExists(_) => "PR_EXISTS",
            Error::PrMerged(_) => "PR_MERGED",
            Error::NotAssigned { .. } => "NOT_ASSIGNED",
            Error::NoCandidate(_) => "NO_CANDIDATE",
            Error::NotFound(_) => "NOT_FOUND",
            Error::Config(_) | Error::Io(_) | Error::Internal(_) => "INTERNAL",
        }
    }

    /// Suggested HTTP status for adapters that speak HTTP
    pub fn http_status(&self) -> u16 {
        match self {
            Error::TeamExists(_) => 400,
            Error::PrExists(_)
            | Error::PrMerged(_)
            | Error::NotAssigned { .. }
            | Error::NoCandidate(_) => 409,
            Error::NotFound(_) => 404,
            Error::Config(_) | Error::Io(_) | Error::Internal(_) => 500,
        }
    }

    /// `{"error": {"code": ..., "message": ...}}` body
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "error": {
                "code": self.code(),
                "message": self.to_string(),
            }
        })
    }
}

/// Storage misses become [`Error::NotFound`]; everything else is internal.
impl From<revu_db::Error> for Error {
    fn from(e: revu_db::Error) -> Self {
        match e {
            revu_db::Error::NotFound(what) => Error::NotFound(what),
            other => Error::Internal(other),
        }
    }
}
