//! Database connection and configuration

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::ConnectOptions;

use crate::error::{Error, Result};
use crate::picker::{CandidatePicker, RandomPicker};
use crate::repos::{PullRequestsRepo, TeamsRepo, UsersRepo};

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Path to SQLite database file
    pub path: PathBuf,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// How long to wait for a free pooled connection
    pub acquire_timeout: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: Database::default_path().unwrap_or_else(|_| PathBuf::from("revu.db")),
            max_connections: 5,
            acquire_timeout: Duration::from_secs(30),
        }
    }
}

impl DatabaseConfig {
    /// Create a new database config with the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Set the maximum number of connections
    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }

    /// Set the pool acquire timeout
    pub fn with_acquire_timeout(mut self, acquire_timeout: Duration) -> Self {
        self.acquire_timeout = acquire_timeout;
        self
    }
}

/// Database connection pool plus the picker used for candidate draws
#[derive(Clone, Debug)]
pub struct Database {
    pool: SqlitePool,
    picker: Arc<dyn CandidatePicker>,
}

impl Database {
    /// Connect to the database with the given configuration and run migrations
    pub async fn connect(config: DatabaseConfig) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    Error::Io(format!("Failed to create database directory: {}", e))
                })?;
            }
        }

        let options =
            SqliteConnectOptions::from_str(&format!("sqlite://{}", config.path.display()))?
                .create_if_missing(true)
                .foreign_keys(true)
                .disable_statement_logging();

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect_with(options)
            .await?;

        tracing::debug!(path = %config.path.display(), "Opened database");

        Self::from_pool(pool).await
    }

    /// Create an in-memory database for testing
    ///
    /// Every pooled connection to `sqlite::memory:` gets its own database, so
    /// the pool is pinned to one connection that is never recycled.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?
            .foreign_keys(true)
            .disable_statement_logging();

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
            .connect_with(options)
            .await?;

        Self::from_pool(pool).await
    }

    async fn from_pool(pool: SqlitePool) -> Result<Self> {
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| Error::Migration(e.to_string()))?;

        Ok(Self {
            pool,
            picker: Arc::new(RandomPicker),
        })
    }

    /// Replace the candidate picker
    pub fn with_picker(mut self, picker: Arc<dyn CandidatePicker>) -> Self {
        self.picker = picker;
        self
    }

    /// Get the default database path (~/.cache/revu/revu.db)
    pub fn default_path() -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| Error::Io("Could not determine cache directory".to_string()))?;
        Ok(cache_dir.join("revu").join("revu.db"))
    }

    /// Get the underlying connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Get the teams repository
    pub fn teams(&self) -> TeamsRepo {
        TeamsRepo::new(self.pool.clone())
    }

    /// Get the users repository
    pub fn users(&self) -> UsersRepo {
        UsersRepo::new(self.pool.clone(), Arc::clone(&self.picker))
    }

    /// Get the pull requests repository
    pub fn pull_requests(&self) -> PullRequestsRepo {
        PullRequestsRepo::new(self.pool.clone())
    }

    /// Close the database connection
    pub async fn close(self) {
        self.pool.close().await;
    }
}
