//! Repository for users and reviewer candidate lookups

use std::sync::Arc;

use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::models::User;
use crate::picker::CandidatePicker;
use crate::{Error, Result};

/// Repository for managing user records
#[derive(Clone)]
pub struct UsersRepo {
    pool: SqlitePool,
    picker: Arc<dyn CandidatePicker>,
}

impl UsersRepo {
    /// Create a new repository instance
    pub fn new(pool: SqlitePool, picker: Arc<dyn CandidatePicker>) -> Self {
        Self { pool, picker }
    }

    /// Find a user by ID
    pub async fn find_by_id(&self, user_id: &str) -> Result<User> {
        sqlx::query_as::<_, User>(
            "SELECT user_id, username, team_name, is_active
             FROM users
             WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("User {} not found", user_id)))
    }

    /// Set the active flag and return the updated user
    pub async fn set_active(&self, user_id: &str, is_active: bool) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET is_active = ?
             WHERE user_id = ?
             RETURNING user_id, username, team_name, is_active",
        )
        .bind(is_active)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("User {} not found", user_id)))?;

        tracing::debug!(user = %user.user_id, is_active, "Updated user active flag");

        Ok(user)
    }

    /// Draw up to `limit` active members of `team_name` whose ids are not in
    /// `exclude`.
    ///
    /// The exclusion list is bound parameter by parameter. Which candidates
    /// are returned, and in which order, is up to the configured picker.
    /// Fewer than `limit` results (possibly none) is not an error.
    pub async fn random_active_candidates(
        &self,
        team_name: &str,
        exclude: &[String],
        limit: usize,
    ) -> Result<Vec<String>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let mut query: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new("SELECT user_id FROM users WHERE team_name = ");
        query.push_bind(team_name);
        query.push(" AND is_active = 1");

        if !exclude.is_empty() {
            query.push(" AND user_id NOT IN (");
            let mut ids = query.separated(", ");
            for id in exclude {
                ids.push_bind(id.as_str());
            }
            ids.push_unseparated(")");
        }

        query.push(" ORDER BY user_id");

        let eligible: Vec<String> = query
            .build_query_scalar()
            .fetch_all(&self.pool)
            .await?;

        tracing::debug!(
            team = %team_name,
            eligible = eligible.len(),
            limit,
            "Fetched reviewer candidates"
        );

        Ok(self.picker.pick(eligible, limit))
    }
}
