//! Configuration management for Revu
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (REVU_*)
//! 3. Config file (~/.config/revu/config.toml)
//! 4. Default values

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use revu_db::{CandidatePicker, DatabaseConfig, RandomPicker, SeededPicker};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Database-related configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// Path to the SQLite file; the cache directory is used when unset
    pub path: Option<PathBuf>,

    /// Maximum number of pooled connections
    pub max_connections: u32,

    /// How long an operation may wait for a pooled connection
    #[serde(with = "humantime_serde")]
    pub acquire_timeout: Duration,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: None,
            max_connections: 5,
            acquire_timeout: Duration::from_secs(30),
        }
    }
}

/// Reviewer selection configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SelectionSettings {
    /// Fixed RNG seed for reproducible draws
    pub seed: Option<u64>,
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseSettings,
    pub selection: SelectionSettings,
}

impl Config {
    /// Load configuration from the default config file location
    ///
    /// Returns default config if file doesn't exist
    pub fn load() -> Result<Self> {
        if let Some(path) = Self::default_config_path() {
            if path.exists() {
                return Self::load_from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Get the default config file path
    ///
    /// Returns `~/.config/revu/config.toml` on Unix
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("revu").join("config.toml"))
    }

    /// Apply environment variable overrides
    ///
    /// Supported variables:
    /// - REVU_DATABASE_PATH: SQLite file
    /// - REVU_MAX_CONNECTIONS: pool size
    /// - REVU_ACQUIRE_TIMEOUT: pool acquire timeout, e.g. `10s`
    /// - REVU_RANDOM_SEED: fixed seed for reviewer draws
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    fn with_overrides_from(mut self, var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(path) = var("REVU_DATABASE_PATH") {
            self.database.path = Some(PathBuf::from(path));
        }

        if let Some(max) = var("REVU_MAX_CONNECTIONS") {
            self.database.max_connections = max
                .parse()
                .map_err(|e| Error::Config(format!("Invalid REVU_MAX_CONNECTIONS: {}", e)))?;
        }

        if let Some(timeout) = var("REVU_ACQUIRE_TIMEOUT") {
            self.database.acquire_timeout = humantime_serde::re::humantime::parse_duration(&timeout)
                .map_err(|e| Error::Config(format!("Invalid REVU_ACQUIRE_TIMEOUT: {}", e)))?;
        }

        if let Some(seed) = var("REVU_RANDOM_SEED") {
            self.selection.seed = Some(
                seed.parse()
                    .map_err(|e| Error::Config(format!("Invalid REVU_RANDOM_SEED: {}", e)))?,
            );
        }

        Ok(self)
    }

    /// Apply CLI flag overrides
    pub fn with_cli_overrides(mut self, database_path: Option<PathBuf>, seed: Option<u64>) -> Self {
        if let Some(path) = database_path {
            self.database.path = Some(path);
        }

        if let Some(seed) = seed {
            self.selection.seed = Some(seed);
        }

        self
    }

    /// Load configuration with all overrides applied
    ///
    /// Priority: CLI > env > config file > defaults
    pub fn load_with_overrides(database_path: Option<PathBuf>, seed: Option<u64>) -> Result<Self> {
        Ok(Self::load()?
            .with_env_overrides()?
            .with_cli_overrides(database_path, seed))
    }

    /// Connection settings for the database layer
    pub fn database_config(&self) -> DatabaseConfig {
        let config = match &self.database.path {
            Some(path) => DatabaseConfig::new(path),
            None => DatabaseConfig::default(),
        };
        config
            .with_max_connections(self.database.max_connections)
            .with_acquire_timeout(self.database.acquire_timeout)
    }

    /// Picker matching the selection settings
    pub fn picker(&self) -> Arc<dyn CandidatePicker> {
        match self.selection.seed {
            Some(seed) => Arc::new(SeededPicker::new(seed)),
            None => Arc::new(RandomPicker),
        }
    }
}
