//! Revu Core - reviewer assignment for pull requests
//!
//! The [`AssignmentService`] validates requests, drives the pull request
//! lifecycle and chooses reviewers; persistence lives in `revu-db`.

pub mod config;
pub mod error;
pub mod service;

pub use config::Config;
pub use error::{Error, ErrorCategory, Result};
pub use service::{AssignmentService, Reassignment, INITIAL_REVIEWERS};

pub use revu_db::{PrStatus, PullRequest, PullRequestShort, ReviewerStat, Team, TeamMember, User};
