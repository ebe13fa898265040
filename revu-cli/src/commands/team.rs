//! Team management commands

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Subcommand};
use revu_core::{AssignmentService, Team};
use serde_json::{json, Value};

/// Team management commands
#[derive(Args, Debug)]
pub struct TeamArgs {
    #[command(subcommand)]
    pub command: TeamCommand,
}

#[derive(Subcommand, Debug)]
pub enum TeamCommand {
    /// Create a team from a JSON document (`{"team_name": ..., "members": [...]}`)
    Add {
        /// File holding the team JSON, or `-` for stdin
        #[arg(short, long, default_value = "-")]
        file: PathBuf,
    },

    /// Show a team and its members
    Get {
        /// Team name
        team_name: String,
    },
}

impl TeamArgs {
    /// Execute the team command
    pub async fn execute(&self, service: &AssignmentService) -> anyhow::Result<Value> {
        match &self.command {
            TeamCommand::Add { file } => {
                let team = read_team(file)?;
                let team = service.create_team(team).await?;
                Ok(json!({ "team": team }))
            }
            TeamCommand::Get { team_name } => {
                let team = service.get_team(team_name).await?;
                Ok(serde_json::to_value(team)?)
            }
        }
    }
}

fn read_team(file: &Path) -> anyhow::Result<Team> {
    let contents = if file.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read team from stdin")?;
        buf
    } else {
        std::fs::read_to_string(file)
            .with_context(|| format!("Failed to read {}", file.display()))?
    };

    serde_json::from_str(&contents).context("Invalid team JSON")
}
