//! Repository for teams and their members

use sqlx::{Row, SqlitePool};

use crate::models::{Team, TeamMember};
use crate::{Error, Result};

/// Repository for managing team records
#[derive(Clone)]
pub struct TeamsRepo {
    pool: SqlitePool,
}

impl TeamsRepo {
    /// Create a new repository instance
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a team and upsert every member in one transaction.
    ///
    /// Fails with [`Error::AlreadyExists`] when the team name is taken. A
    /// member whose `user_id` already exists is moved to this team and gets
    /// the submitted username and active flag.
    pub async fn create_with_members(&self, team: &Team) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        // The first statement must write, so the transaction takes the write
        // lock up front instead of upgrading from a read snapshot.
        sqlx::query("INSERT INTO teams (name) VALUES (?)")
            .bind(&team.team_name)
            .execute(&mut *tx)
            .await
            .map_err(|e| match Error::from(e) {
                e if e.is_unique_violation() => {
                    Error::AlreadyExists(format!("Team {} already exists", team.team_name))
                }
                e => e,
            })?;

        for member in &team.members {
            sqlx::query(
                "INSERT INTO users (user_id, username, team_name, is_active)
                 VALUES (?, ?, ?, ?)
                 ON CONFLICT (user_id) DO UPDATE SET
                    username = excluded.username,
                    team_name = excluded.team_name,
                    is_active = excluded.is_active",
            )
            .bind(&member.user_id)
            .bind(&member.username)
            .bind(&team.team_name)
            .bind(member.is_active)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::debug!(
            team = %team.team_name,
            members = team.members.len(),
            "Stored team"
        );

        Ok(())
    }

    /// Find a team and its current members.
    ///
    /// A team row without users is still found, with an empty member list.
    pub async fn find_by_name(&self, name: &str) -> Result<Team> {
        let rows = sqlx::query(
            "SELECT t.name, u.user_id, u.username, u.is_active
             FROM teams t
             LEFT JOIN users u ON u.team_name = t.name
             WHERE t.name = ?
             ORDER BY u.user_id",
        )
        .bind(name)
        .fetch_all(&self.pool)
        .await?;

        if rows.is_empty() {
            return Err(Error::NotFound(format!("Team {} not found", name)));
        }

        let mut team = Team::new(name);
        for row in rows {
            let user_id: Option<String> = row.try_get("user_id")?;
            if let Some(user_id) = user_id {
                team.members.push(TeamMember {
                    user_id,
                    username: row.try_get::<Option<String>, _>("username")?.unwrap_or_default(),
                    is_active: row.try_get::<Option<bool>, _>("is_active")?.unwrap_or(false),
                });
            }
        }

        Ok(team)
    }
}
