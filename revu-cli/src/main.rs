//! Revu CLI - Command line interface for Revu
//!
//! Assigns and manages pull request reviewers within teams.

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use revu_core::{AssignmentService, Config};
use revu_db::Database;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{PrArgs, StatsArgs, TeamArgs, UserArgs};

/// Revu: pull request reviewer assignment
#[derive(Parser, Debug)]
#[command(name = "revu")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the SQLite database (overrides config and env)
    #[arg(long, global = true, env = "REVU_DATABASE_PATH")]
    database: Option<PathBuf>,

    /// Seed for reproducible reviewer draws (overrides config and env)
    #[arg(long, global = true, env = "REVU_RANDOM_SEED")]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show version information
    Version,

    /// Create or inspect teams
    Team(TeamArgs),

    /// Update users and list their reviews
    #[command(visible_alias = "u")]
    User(UserArgs),

    /// Create, merge and reassign pull requests
    Pr(PrArgs),

    /// Show reviewer assignment counts
    Stats(StatsArgs),

    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize tracing; logs go to stderr so stdout stays valid JSON
    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    // Load configuration with overrides
    let config = Config::load_with_overrides(cli.database.clone(), cli.seed)?;

    if cli.verbose {
        tracing::info!(
            database = ?config.database.path,
            max_connections = config.database.max_connections,
            seed = ?config.selection.seed,
            "Configuration loaded"
        );
    }

    let result = match cli.command {
        Some(Commands::Version) => {
            println!("revu {}", env!("CARGO_PKG_VERSION"));
            return Ok(ExitCode::SUCCESS);
        }
        Some(Commands::Config) => {
            print_config(&config);
            return Ok(ExitCode::SUCCESS);
        }
        Some(Commands::Team(args)) => args.execute(&open_service(&config).await?).await,
        Some(Commands::User(args)) => args.execute(&open_service(&config).await?).await,
        Some(Commands::Pr(args)) => args.execute(&open_service(&config).await?).await,
        Some(Commands::Stats(args)) => args.execute(&open_service(&config).await?).await,
        None => {
            println!("Revu - pull request reviewer assignment");
            println!();
            println!("Use --help for usage information");
            return Ok(ExitCode::SUCCESS);
        }
    };

    match result {
        Ok(output) => {
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => match e.downcast_ref::<revu_core::Error>() {
            Some(err) if err.category() != revu_core::ErrorCategory::Unexpected => {
                println!("{}", serde_json::to_string_pretty(&err.to_json())?);
                Ok(ExitCode::FAILURE)
            }
            _ => Err(e),
        },
    }
}

fn print_config(config: &Config) {
    println!("Revu Configuration");
    println!("==================");
    println!();
    println!("Database Settings:");
    println!("  path: {}", config.database_config().path.display());
    println!("  max_connections: {}", config.database.max_connections);
    println!("  acquire_timeout: {:?}", config.database.acquire_timeout);
    println!();
    println!("Selection Settings:");
    match config.selection.seed {
        Some(seed) => println!("  seed: {}", seed),
        None => println!("  seed: (random)"),
    }
    println!();
    if let Some(path) = Config::default_config_path() {
        println!("Config file: {}", path.display());
        if path.exists() {
            println!("  (exists)");
        } else {
            println!("  (not found - using defaults)");
        }
    }
}

/// Open the configured database and wrap it in a service
async fn open_service(config: &Config) -> anyhow::Result<AssignmentService> {
    let db = Database::connect(config.database_config())
        .await?
        .with_picker(config.picker());
    Ok(AssignmentService::new(Arc::new(db)))
}
