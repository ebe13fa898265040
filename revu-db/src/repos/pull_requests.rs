//! Repository for pull requests and their reviewer links

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};

use crate::models::{PrStatus, PullRequest, PullRequestShort, ReviewerStat};
use crate::{Error, Result};

#[derive(sqlx::FromRow)]
struct PullRequestRow {
    pull_request_id: String,
    pull_request_name: String,
    author_id: String,
    status: String,
    created_at: DateTime<Utc>,
    merged_at: Option<DateTime<Utc>>,
}

#[derive(sqlx::FromRow)]
struct PullRequestShortRow {
    pull_request_id: String,
    pull_request_name: String,
    author_id: String,
    status: String,
}

impl PullRequestShortRow {
    fn into_model(self) -> Result<PullRequestShort> {
        Ok(PullRequestShort {
            id: self.pull_request_id,
            name: self.pull_request_name,
            author_id: self.author_id,
            status: self.status.parse()?,
        })
    }
}

/// Repository for managing pull request records
#[derive(Clone)]
pub struct PullRequestsRepo {
    pool: SqlitePool,
}

impl PullRequestsRepo {
    /// Create a new repository instance
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Check whether a pull request with this id exists
    pub async fn exists(&self, id: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM pull_requests WHERE pull_request_id = ?)",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Insert an open pull request together with its reviewer links
    pub async fn insert(&self, pr: &PullRequest) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO pull_requests (pull_request_id, pull_request_name, author_id, status, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&pr.id)
        .bind(&pr.name)
        .bind(&pr.author_id)
        .bind(PrStatus::Open.as_str())
        .bind(pr.created_at)
        .execute(&mut *tx)
        .await?;

        insert_reviewers(&mut tx, &pr.id, &pr.assigned_reviewers).await?;

        tx.commit().await?;

        tracing::debug!(
            pr = %pr.id,
            reviewers = pr.assigned_reviewers.len(),
            "Stored pull request"
        );

        Ok(())
    }

    /// Find a pull request with its reviewers
    pub async fn find_by_id(&self, id: &str) -> Result<PullRequest> {
        let mut conn = self.pool.acquire().await?;
        fetch_pull_request(&mut conn, id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Pull request {} not found", id)))
    }

    /// Move an open pull request to MERGED and return it.
    ///
    /// An already merged pull request is returned untouched, so `merged_at`
    /// keeps its first value.
    pub async fn mark_merged(&self, id: &str, merged_at: DateTime<Utc>) -> Result<PullRequest> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            "UPDATE pull_requests SET status = ?, merged_at = ?
             WHERE pull_request_id = ? AND status = ?",
        )
        .bind(PrStatus::Merged.as_str())
        .bind(merged_at)
        .bind(id)
        .bind(PrStatus::Open.as_str())
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let pr = fetch_pull_request(&mut tx, id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Pull request {} not found", id)))?;

        tx.commit().await?;

        if updated > 0 {
            tracing::debug!(pr = %id, "Marked pull request merged");
        }

        Ok(pr)
    }

    /// Replace the full reviewer set of a pull request
    pub async fn replace_reviewers(&self, id: &str, reviewers: &[String]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM pull_request_reviewers WHERE pull_request_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        insert_reviewers(&mut tx, id, reviewers).await?;

        tx.commit().await?;

        tracing::debug!(pr = %id, reviewers = ?reviewers, "Replaced reviewers");

        Ok(())
    }

    /// Find all pull requests where the user is currently a reviewer
    pub async fn find_by_reviewer(&self, user_id: &str) -> Result<Vec<PullRequestShort>> {
        let rows = sqlx::query_as::<_, PullRequestShortRow>(
            "SELECT pr.pull_request_id, pr.pull_request_name, pr.author_id, pr.status
             FROM pull_requests pr
             JOIN pull_request_reviewers r ON r.pull_request_id = pr.pull_request_id
             WHERE r.user_id = ?
             ORDER BY pr.created_at, pr.pull_request_id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(PullRequestShortRow::into_model).collect()
    }

    /// Count reviewer link rows per user, busiest first, ties by user id
    pub async fn reviewer_stats(&self) -> Result<Vec<ReviewerStat>> {
        let stats = sqlx::query_as::<_, ReviewerStat>(
            "SELECT user_id, COUNT(*) AS assignments
             FROM pull_request_reviewers
             GROUP BY user_id
             ORDER BY assignments DESC, user_id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(stats)
    }
}

async fn insert_reviewers(conn: &mut SqliteConnection, pr_id: &str, reviewers: &[String]) -> Result<()> {
    for reviewer in reviewers {
        sqlx::query("INSERT INTO pull_request_reviewers (pull_request_id, user_id) VALUES (?, ?)")
            .bind(pr_id)
            .bind(reviewer)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

async fn fetch_pull_request(conn: &mut SqliteConnection, id: &str) -> Result<Option<PullRequest>> {
    let Some(row) = sqlx::query_as::<_, PullRequestRow>(
        "SELECT pull_request_id, pull_request_name, author_id, status, created_at, merged_at
         FROM pull_requests
         WHERE pull_request_id = ?",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?
    else {
        return Ok(None);
    };

    // rowid keeps reviewers in the order they were written
    let reviewers: Vec<String> = sqlx::query_scalar(
        "SELECT user_id FROM pull_request_reviewers
         WHERE pull_request_id = ?
         ORDER BY rowid",
    )
    .bind(id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(Some(PullRequest {
        id: row.pull_request_id,
        name: row.pull_request_name,
        author_id: row.author_id,
        status: row.status.parse()?,
        assigned_reviewers: reviewers,
        created_at: row.created_at,
        merged_at: row.merged_at,
    }))
}
