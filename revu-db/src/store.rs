//! Storage contract consumed by the assignment service

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{PullRequest, PullRequestShort, ReviewerStat, Team, User};
use crate::{Database, Result};

/// Everything the assignment service needs from persistent storage.
///
/// Multi-row writes are atomic: either every row lands or none does.
/// Single-row lookups that match nothing return [`crate::Error::NotFound`].
/// No method maps failures onto business errors; that is the caller's job.
#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// Insert the team and upsert every member keyed by `user_id`.
    ///
    /// Returns [`crate::Error::AlreadyExists`] if the team name is taken.
    async fn create_team_with_members(&self, team: &Team) -> Result<()>;

    /// Team with its current members
    async fn get_team(&self, name: &str) -> Result<Team>;

    async fn get_user(&self, user_id: &str) -> Result<User>;

    /// Set the active flag and return the updated user
    async fn set_user_active(&self, user_id: &str, is_active: bool) -> Result<User>;

    async fn pr_exists(&self, id: &str) -> Result<bool>;

    /// Insert an OPEN pull request and its reviewer links
    async fn create_pull_request(&self, pr: &PullRequest) -> Result<()>;

    /// Pull request with reviewers in assignment order
    async fn get_pull_request(&self, id: &str) -> Result<PullRequest>;

    /// Mark an OPEN pull request MERGED at `merged_at` and return it.
    /// Already merged pull requests come back unchanged.
    async fn set_pr_merged(&self, id: &str, merged_at: DateTime<Utc>) -> Result<PullRequest>;

    /// Rewrite the whole reviewer set
    async fn replace_reviewers(&self, id: &str, reviewers: &[String]) -> Result<()>;

    /// Up to `limit` distinct active members of `team_name` outside
    /// `exclude`, in random order. Fewer results is not an error.
    async fn random_active_candidates(
        &self,
        team_name: &str,
        exclude: &[String],
        limit: usize,
    ) -> Result<Vec<String>>;

    async fn pull_requests_by_reviewer(&self, user_id: &str) -> Result<Vec<PullRequestShort>>;

    /// Link-row counts per reviewer, descending, ties by user id
    async fn reviewer_stats(&self) -> Result<Vec<ReviewerStat>>;
}

#[async_trait]
impl ReviewStore for Database {
    async fn create_team_with_members(&self, team: &Team) -> Result<()> {
        self.teams().create_with_members(team).await
    }

    async fn get_team(&self, name: &str) -> Result<Team> {
        self.teams().find_by_name(name).await
    }

    async fn get_user(&self, user_id: &str) -> Result<User> {
        self.users().find_by_id(user_id).await
    }

    async fn set_user_active(&self, user_id: &str, is_active: bool) -> Result<User> {
        self.users().set_active(user_id, is_active).await
    }

    async fn pr_exists(&self, id: &str) -> Result<bool> {
        self.pull_requests().exists(id).await
    }

    async fn create_pull_request(&self, pr: &PullRequest) -> Result<()> {
        self.pull_requests().insert(pr).await
    }

    async fn get_pull_request(&self, id: &str) -> Result<PullRequest> {
        self.pull_requests().find_by_id(id).await
    }

    async fn set_pr_merged(&self, id: &str, merged_at: DateTime<Utc>) -> Result<PullRequest> {
        self.pull_requests().mark_merged(id, merged_at).await
    }

    async fn replace_reviewers(&self, id: &str, reviewers: &[String]) -> Result<()> {
        self.pull_requests().replace_reviewers(id, reviewers).await
    }

    async fn random_active_candidates(
        &self,
        team_name: &str,
        exclude: &[String],
        limit: usize,
    ) -> Result<Vec<String>> {
        self.users()
            .random_active_candidates(team_name, exclude, limit)
            .await
    }

    async fn pull_requests_by_reviewer(&self, user_id: &str) -> Result<Vec<PullRequestShort>> {
        self.pull_requests().find_by_reviewer(user_id).await
    }

    async fn reviewer_stats(&self) -> Result<Vec<ReviewerStat>> {
        self.pull_requests().reviewer_stats().await
    }
}
