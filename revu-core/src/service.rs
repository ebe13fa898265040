//! Reviewer assignment service
//!
//! Validates preconditions, drives the OPEN → MERGED lifecycle and picks
//! reviewers. All persistence goes through a [`ReviewStore`]; this module is
//! the only place store failures are turned into business errors.

use std::sync::Arc;

use chrono::Utc;
use revu_db::{PullRequest, PullRequestShort, ReviewStore, ReviewerStat, Team, User};
use tracing::{info, instrument, warn};

use crate::{Error, Result};

/// Reviewers drawn for a freshly opened pull request
pub const INITIAL_REVIEWERS: usize = 2;

/// Result of a successful reassignment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reassignment {
    /// Pull request with the new reviewer set
    pub pull_request: PullRequest,
    /// Id of the reviewer who replaced the old one
    pub replaced_by: String,
}

/// Stateless business logic over a shared store
#[derive(Clone)]
pub struct AssignmentService {
    store: Arc<dyn ReviewStore>,
}

impl AssignmentService {
    pub fn new(store: Arc<dyn ReviewStore>) -> Self {
        Self { store }
    }

    /// Create a team and upsert its members
    #[instrument(skip(self, team), fields(team = %team.team_name))]
    pub async fn create_team(&self, team: Team) -> Result<Team> {
        match self.store.create_team_with_members(&team).await {
            Ok(()) => {}
            Err(revu_db::Error::AlreadyExists(_)) => {
                return Err(Error::TeamExists(team.team_name));
            }
            Err(e) if e.is_unique_violation() => {
                // Lost a race with a concurrent create of the same team
                return Err(Error::TeamExists(team.team_name));
            }
            Err(e) => return Err(e.into()),
        }

        info!(members = team.members.len(), "Team created");
        Ok(team)
    }

    /// Team with its members
    pub async fn get_team(&self, name: &str) -> Result<Team> {
        Ok(self.store.get_team(name).await?)
    }

    /// Flip a user's active flag
    #[instrument(skip(self))]
    pub async fn set_user_active(&self, user_id: &str, is_active: bool) -> Result<User> {
        let user = self.store.set_user_active(user_id, is_active).await?;
        info!("User activity updated");
        Ok(user)
    }

    /// Open a pull request and assign up to two reviewers from the author's team
    #[instrument(skip(self, name))]
    pub async fn create_pr(&self, id: &str, name: &str, author_id: &str) -> Result<PullRequest> {
        if self.store.pr_exists(id).await? {
            return Err(Error::PrExists(id.to_string()));
        }

        let author = self.store.get_user(author_id).await?;

        let exclude = vec![author.user_id.clone()];
        let reviewers = self
            .store
            .random_active_candidates(&author.team_name, &exclude, INITIAL_REVIEWERS)
            .await?;

        if reviewers.len() < INITIAL_REVIEWERS {
            warn!(
                team = %author.team_name,
                found = reviewers.len(),
                "Not enough active reviewers"
            );
        }

        let pr = PullRequest::new(id, name, author_id).with_reviewers(reviewers);

        match self.store.create_pull_request(&pr).await {
            Ok(()) => {}
            Err(e) if e.is_unique_violation() => return Err(Error::PrExists(id.to_string())),
            Err(e) => return Err(e.into()),
        }

        info!(reviewers = ?pr.assigned_reviewers, "Pull request created");
        Ok(pr)
    }

    /// Merge a pull request; merging twice returns the first result unchanged
    #[instrument(skip(self))]
    pub async fn merge_pr(&self, id: &str) -> Result<PullRequest> {
        let pr = self.store.get_pull_request(id).await?;
        if pr.status.is_merged() {
            return Ok(pr);
        }

        let merged = self.store.set_pr_merged(id, Utc::now()).await?;
        info!("Pull request merged");
        Ok(merged)
    }

    /// Swap one reviewer for a random active member of that reviewer's team
    #[instrument(skip(self))]
    pub async fn reassign_reviewer(&self, pr_id: &str, old_reviewer_id: &str) -> Result<Reassignment> {
        let mut pr = self.store.get_pull_request(pr_id).await?;

        if pr.status.is_merged() {
            return Err(Error::PrMerged(pr_id.to_string()));
        }

        if !pr.has_reviewer(old_reviewer_id) {
            return Err(Error::NotAssigned {
                pr_id: pr_id.to_string(),
                user_id: old_reviewer_id.to_string(),
            });
        }

        let old_reviewer = self.store.get_user(old_reviewer_id).await?;

        let mut exclude = vec![old_reviewer_id.to_string(), pr.author_id.clone()];
        exclude.extend(pr.assigned_reviewers.iter().cloned());
        exclude.sort();
        exclude.dedup();

        let replaced_by = self
            .store
            .random_active_candidates(&old_reviewer.team_name, &exclude, 1)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::NoCandidate(pr_id.to_string()))?;

        for reviewer in pr.assigned_reviewers.iter_mut() {
            if reviewer == old_reviewer_id {
                *reviewer = replaced_by.clone();
            }
        }

        self.store
            .replace_reviewers(&pr.id, &pr.assigned_reviewers)
            .await?;

        info!(old = %old_reviewer_id, new = %replaced_by, "Reviewer reassigned");

        Ok(Reassignment {
            pull_request: pr,
            replaced_by,
        })
    }

    /// Pull requests the user currently reviews; empty for unknown users
    pub async fn get_user_reviews(&self, user_id: &str) -> Result<Vec<PullRequestShort>> {
        Ok(self.store.pull_requests_by_reviewer(user_id).await?)
    }

    /// Assignment counts per reviewer, busiest first
    pub async fn get_reviewer_stats(&self) -> Result<Vec<ReviewerStat>> {
        Ok(self.store.reviewer_stats().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::DateTime;
    use revu_db::{Database, OrderedPicker, PrStatus, SeededPicker, TeamMember};
    use std::collections::HashSet;

    fn service_with(db: Database) -> AssignmentService {
        AssignmentService::new(Arc::new(db))
    }

    async fn backend_service() -> AssignmentService {
        let db = Database::in_memory()
            .await
            .unwrap()
            .with_picker(Arc::new(SeededPicker::new(7)));
        let service = service_with(db);
        service
            .create_team(
                Team::new("backend")
                    .with_member(TeamMember::new("u1", "Alice"))
                    .with_member(TeamMember::new("u2", "Bob"))
                    .with_member(TeamMember::new("u3", "Carol")),
            )
            .await
            .unwrap();
        service
    }

    fn set<'a>(ids: impl IntoIterator<Item = &'a String>) -> HashSet<&'a str> {
        ids.into_iter().map(String::as_str).collect()
    }

    #[tokio::test]
    async fn test_create_and_get_team() {
        let service = backend_service().await;

        let team = service.get_team("backend").await.unwrap();
        let members: HashSet<_> = team.members.iter().map(|m| m.user_id.as_str()).collect();
        assert_eq!(members, HashSet::from(["u1", "u2", "u3"]));

        let err = service.get_team("nope").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_duplicate_team_conflicts() {
        let service = backend_service().await;

        let err = service.create_team(Team::new("backend")).await.unwrap_err();
        assert!(matches!(err, Error::TeamExists(ref name) if name == "backend"));
    }

    #[tokio::test]
    async fn test_set_user_active() {
        let service = backend_service().await;

        let user = service.set_user_active("u2", false).await.unwrap();
        assert!(!user.is_active);
        assert_eq!(user.team_name, "backend");

        let err = service.set_user_active("ghost", false).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_create_pr_scenario() {
        let service = backend_service().await;

        let pr = service.create_pr("pr-1", "Add feature", "u1").await.unwrap();
        assert_eq!(pr.status, PrStatus::Open);
        assert_eq!(set(&pr.assigned_reviewers), HashSet::from(["u2", "u3"]));

        let stored = service.merge_pr("pr-1").await.unwrap();
        assert_eq!(stored.assigned_reviewers.len(), 2);
    }

    #[tokio::test]
    async fn test_create_pr_never_assigns_author() {
        for seed in 0..10 {
            let db = Database::in_memory()
                .await
                .unwrap()
                .with_picker(Arc::new(SeededPicker::new(seed)));
            let service = service_with(db);
            service
                .create_team(
                    Team::new("backend")
                        .with_member(TeamMember::new("u1", "Alice"))
                        .with_member(TeamMember::new("u2", "Bob"))
                        .with_member(TeamMember::new("u3", "Carol"))
                        .with_member(TeamMember::new("u4", "Dave")),
                )
                .await
                .unwrap();

            for author in ["u1", "u2", "u3", "u4"] {
                let pr = service
                    .create_pr(&format!("pr-{}", author), "Change", author)
                    .await
                    .unwrap();
                assert_eq!(pr.assigned_reviewers.len(), 2);
                assert!(!pr.has_reviewer(author));
            }
        }
    }

    #[tokio::test]
    async fn test_create_pr_with_few_candidates() {
        let service = backend_service().await;
        service.set_user_active("u2", false).await.unwrap();

        let pr = service.create_pr("pr-1", "One", "u1").await.unwrap();
        assert_eq!(pr.assigned_reviewers, vec!["u3".to_string()]);

        service.set_user_active("u3", false).await.unwrap();
        let pr = service.create_pr("pr-2", "Two", "u1").await.unwrap();
        assert!(pr.assigned_reviewers.is_empty());
    }

    #[tokio::test]
    async fn test_create_pr_duplicate_and_unknown_author() {
        let service = backend_service().await;

        service.create_pr("pr-1", "Add feature", "u1").await.unwrap();
        let before = service.get_reviewer_stats().await.unwrap();

        let err = service.create_pr("pr-1", "Again", "u2").await.unwrap_err();
        assert!(matches!(err, Error::PrExists(_)));
        assert_eq!(service.get_reviewer_stats().await.unwrap(), before);

        let err = service.create_pr("pr-2", "Orphan", "ghost").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_merge_is_idempotent() {
        let service = backend_service().await;
        service.create_pr("pr-1", "Add feature", "u1").await.unwrap();

        let first = service.merge_pr("pr-1").await.unwrap();
        assert_eq!(first.status, PrStatus::Merged);
        assert!(first.merged_at.is_some());

        let second = service.merge_pr("pr-1").await.unwrap();
        assert_eq!(second.merged_at, first.merged_at);
        assert_eq!(second.assigned_reviewers, first.assigned_reviewers);

        let err = service.merge_pr("nope").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_reassign_on_merged_pr_fails() {
        let service = backend_service().await;
        let pr = service.create_pr("pr-1", "Add feature", "u1").await.unwrap();
        service.merge_pr("pr-1").await.unwrap();

        let err = service
            .reassign_reviewer("pr-1", &pr.assigned_reviewers[0])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::PrMerged(_)));

        let after = service.merge_pr("pr-1").await.unwrap();
        assert_eq!(after.assigned_reviewers, pr.assigned_reviewers);
    }

    #[tokio::test]
    async fn test_reassign_unassigned_user_fails() {
        let service = backend_service().await;
        let pr = service.create_pr("pr-1", "Add feature", "u1").await.unwrap();

        let err = service.reassign_reviewer("pr-1", "u1").await.unwrap_err();
        assert!(matches!(err, Error::NotAssigned { .. }));

        let err = service.reassign_reviewer("nope", "u2").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));

        assert!(pr.has_reviewer("u2"));
        assert_eq!(service.get_user_reviews("u2").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_reassign_without_candidates() {
        let service = backend_service().await;
        let pr = service.create_pr("pr-1", "Add feature", "u1").await.unwrap();
        assert_eq!(pr.assigned_reviewers.len(), 2);

        // Author and both reviewers are excluded, nobody is left
        let err = service
            .reassign_reviewer("pr-1", &pr.assigned_reviewers[0])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NoCandidate(_)));
    }

    #[tokio::test]
    async fn test_reassign_picks_outside_exclusion_set() {
        let db = Database::in_memory()
            .await
            .unwrap()
            .with_picker(Arc::new(OrderedPicker));
        let service = service_with(db);
        service
            .create_team(
                Team::new("backend")
                    .with_member(TeamMember::new("u1", "Alice"))
                    .with_member(TeamMember::new("u2", "Bob"))
                    .with_member(TeamMember::new("u3", "Carol"))
                    .with_member(TeamMember::new("u4", "Dave"))
                    .with_member(TeamMember::new("u5", "Erin").with_active(false)),
            )
            .await
            .unwrap();

        let pr = service.create_pr("pr-1", "Add feature", "u1").await.unwrap();
        assert_eq!(pr.assigned_reviewers, vec!["u2".to_string(), "u3".to_string()]);

        let result = service.reassign_reviewer("pr-1", "u2").await.unwrap();
        assert_eq!(result.replaced_by, "u4");
        assert_eq!(
            result.pull_request.assigned_reviewers,
            vec!["u4".to_string(), "u3".to_string()]
        );

        assert!(service.get_user_reviews("u2").await.unwrap().is_empty());
        assert_eq!(service.get_user_reviews("u4").await.unwrap()[0].id, "pr-1");

        // u2 is no longer assigned, so it is eligible again
        let result = service.reassign_reviewer("pr-1", "u4").await.unwrap();
        assert_eq!(result.replaced_by, "u2");

        // u1 is the author, u2/u3 are assigned, u4 and u5 are inactive
        service.set_user_active("u4", false).await.unwrap();
        let err = service.reassign_reviewer("pr-1", "u3").await.unwrap_err();
        assert!(matches!(err, Error::NoCandidate(_)));
    }

    #[tokio::test]
    async fn test_reassign_draws_from_old_reviewers_team() {
        let db = Database::in_memory()
            .await
            .unwrap()
            .with_picker(Arc::new(OrderedPicker));
        let service = service_with(db);
        service
            .create_team(
                Team::new("backend")
                    .with_member(TeamMember::new("u1", "Alice"))
                    .with_member(TeamMember::new("u2", "Bob")),
            )
            .await
            .unwrap();

        let pr = service.create_pr("pr-1", "Add feature", "u1").await.unwrap();
        assert_eq!(pr.assigned_reviewers, vec!["u2".to_string()]);

        // u2 moves to another team after being assigned
        service
            .create_team(
                Team::new("platform")
                    .with_member(TeamMember::new("u2", "Bob"))
                    .with_member(TeamMember::new("p1", "Pat")),
            )
            .await
            .unwrap();

        let result = service.reassign_reviewer("pr-1", "u2").await.unwrap();
        assert_eq!(result.replaced_by, "p1");
    }

    #[tokio::test]
    async fn test_user_reviews_and_stats() {
        let service = backend_service().await;

        assert!(service.get_user_reviews("ghost").await.unwrap().is_empty());
        assert!(service.get_reviewer_stats().await.unwrap().is_empty());

        for i in 0..5 {
            service.create_pr(&format!("pr-{}", i), "Change", "u1").await.unwrap();
        }

        let reviews = service.get_user_reviews("u3").await.unwrap();
        assert_eq!(reviews.len(), 5);
        assert!(reviews.iter().all(|r| r.author_id == "u1" && r.status == PrStatus::Open));

        let stats = service.get_reviewer_stats().await.unwrap();
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0], ReviewerStat { user_id: "u2".to_string(), assignments: 5 });
        assert_eq!(stats[1], ReviewerStat { user_id: "u3".to_string(), assignments: 5 });
    }

    /// Store whose reads always fail, for checking error classification
    struct BrokenStore;

    #[async_trait]
    impl ReviewStore for BrokenStore {
        async fn create_team_with_members(&self, _: &Team) -> revu_db::Result<()> {
            Err(revu_db::Error::Io("disk gone".to_string()))
        }
        async fn get_team(&self, _: &str) -> revu_db::Result<Team> {
            Err(revu_db::Error::Io("disk gone".to_string()))
        }
        async fn get_user(&self, _: &str) -> revu_db::Result<User> {
            Err(revu_db::Error::Io("disk gone".to_string()))
        }
        async fn set_user_active(&self, _: &str, _: bool) -> revu_db::Result<User> {
            Err(revu_db::Error::Io("disk gone".to_string()))
        }
        async fn pr_exists(&self, _: &str) -> revu_db::Result<bool> {
            Err(revu_db::Error::Io("disk gone".to_string()))
        }
        async fn create_pull_request(&self, _: &PullRequest) -> revu_db::Result<()> {
            Err(revu_db::Error::Io("disk gone".to_string()))
        }
        async fn get_pull_request(&self, _: &str) -> revu_db::Result<PullRequest> {
            Err(revu_db::Error::Io("disk gone".to_string()))
        }
        async fn set_pr_merged(
            &self,
            _: &str,
            _: DateTime<Utc>,
        ) -> revu_db::Result<PullRequest> {
            Err(revu_db::Error::Io("disk gone".to_string()))
        }
        async fn replace_reviewers(&self, _: &str, _: &[String]) -> revu_db::Result<()> {
            Err(revu_db::Error::Io("disk gone".to_string()))
        }
        async fn random_active_candidates(
            &self,
            _: &str,
            _: &[String],
            _: usize,
        ) -> revu_db::Result<Vec<String>> {
            Err(revu_db::Error::Io("disk gone".to_string()))
        }
        async fn pull_requests_by_reviewer(
            &self,
            _: &str,
        ) -> revu_db::Result<Vec<PullRequestShort>> {
            Err(revu_db::Error::Io("disk gone".to_string()))
        }
        async fn reviewer_stats(&self) -> revu_db::Result<Vec<ReviewerStat>> {
            Err(revu_db::Error::Io("disk gone".to_string()))
        }
    }

    #[tokio::test]
    async fn test_store_failures_are_internal() {
        let service = AssignmentService::new(Arc::new(BrokenStore));

        let err = service.create_team(Team::new("backend")).await.unwrap_err();
        assert!(matches!(err, Error::Internal(_)));

        let err = service.create_pr("pr-1", "x", "u1").await.unwrap_err();
        assert!(matches!(err, Error::Internal(_)));

        let err = service.get_user_reviews("u1").await.unwrap_err();
        assert!(matches!(err, Error::Internal(_)));
    }

    /// Real store whose user lookups always miss
    struct UserlessStore {
        inner: Database,
    }

    #[async_trait]
    impl ReviewStore for UserlessStore {
        async fn create_team_with_members(&self, team: &Team) -> revu_db::Result<()> {
            self.inner.create_team_with_members(team).await
        }
        async fn get_team(&self, name: &str) -> revu_db::Result<Team> {
            self.inner.get_team(name).await
        }
        async fn get_user(&self, user_id: &str) -> revu_db::Result<User> {
            Err(revu_db::Error::NotFound(format!("User {} not found", user_id)))
        }
        async fn set_user_active(&self, user_id: &str, active: bool) -> revu_db::Result<User> {
            self.inner.set_user_active(user_id, active).await
        }
        async fn pr_exists(&self, id: &str) -> revu_db::Result<bool> {
            self.inner.pr_exists(id).await
        }
        async fn create_pull_request(&self, pr: &PullRequest) -> revu_db::Result<()> {
            self.inner.create_pull_request(pr).await
        }
        async fn get_pull_request(&self, id: &str) -> revu_db::Result<PullRequest> {
            self.inner.get_pull_request(id).await
        }
        async fn set_pr_merged(
            &self,
            id: &str,
            merged_at: DateTime<Utc>,
        ) -> revu_db::Result<PullRequest> {
            self.inner.set_pr_merged(id, merged_at).await
        }
        async fn replace_reviewers(&self, id: &str, reviewers: &[String]) -> revu_db::Result<()> {
            self.inner.replace_reviewers(id, reviewers).await
        }
        async fn random_active_candidates(
            &self,
            team: &str,
            exclude: &[String],
            limit: usize,
        ) -> revu_db::Result<Vec<String>> {
            self.inner.random_active_candidates(team, exclude, limit).await
        }
        async fn pull_requests_by_reviewer(
            &self,
            user_id: &str,
        ) -> revu_db::Result<Vec<PullRequestShort>> {
            self.inner.pull_requests_by_reviewer(user_id).await
        }
        async fn reviewer_stats(&self) -> revu_db::Result<Vec<ReviewerStat>> {
            self.inner.reviewer_stats().await
        }
    }

    #[tokio::test]
    async fn test_reassign_with_missing_reviewer_record() {
        let db = Database::in_memory().await.unwrap();
        let mut pr = PullRequest::new("pr-1", "Add feature", "u1");
        pr.assigned_reviewers = vec!["u2".to_string()];
        let backend = Team::new("backend")
            .with_member(TeamMember::new("u1", "Alice"))
            .with_member(TeamMember::new("u2", "Bob"));
        db.create_team_with_members(&backend).await.unwrap();
        db.create_pull_request(&pr).await.unwrap();

        let service = AssignmentService::new(Arc::new(UserlessStore { inner: db }));

        let err = service.reassign_reviewer("pr-1", "u2").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));

        // Nothing was rewritten
        let stored = service.store.get_pull_request("pr-1").await.unwrap();
        assert_eq!(stored.assigned_reviewers, vec!["u2".to_string()]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_create_team_on_file_database() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = revu_db::DatabaseConfig::new(dir.path().join("revu.db")).with_max_connections(8);
        let service = Arc::new(service_with(Database::connect(config).await.unwrap()));

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let service = Arc::clone(&service);
                tokio::spawn(async move {
                    // Every second call collides on the same name
                    let name = if i % 2 == 0 { format!("team-{}", i) } else { "shared".to_string() };
                    service
                        .create_team(
                            Team::new(name).with_member(TeamMember::new(format!("u{}", i), "Member")),
                        )
                        .await
                })
            })
            .collect();

        let mut shared_created = 0;
        for (i, handle) in handles.into_iter().enumerate() {
            match handle.await.unwrap() {
                Ok(team) if team.team_name == "shared" => shared_created += 1,
                Ok(_) => assert_eq!(i % 2, 0),
                Err(Error::TeamExists(name)) => assert_eq!(name, "shared"),
                Err(e) => panic!("unexpected error: {:?}", e),
            }
        }
        assert_eq!(shared_created, 1);
        assert!(service.get_team("team-14").await.is_ok());
    }
}
