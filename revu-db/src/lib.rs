//! Database layer for Revu
//!
//! Provides persistence for teams, users, pull requests and reviewer links,
//! with every multi-row write wrapped in a transaction.

pub mod connection;
pub mod error;
pub mod models;
pub mod picker;
pub mod repos;
pub mod store;

pub use connection::{Database, DatabaseConfig};
pub use error::{Error, Result};
pub use models::{PrStatus, PullRequest, PullRequestShort, ReviewerStat, Team, TeamMember, User};
pub use picker::{CandidatePicker, OrderedPicker, RandomPicker, SeededPicker};
pub use store::ReviewStore;
