//! Pull request commands

use clap::{Args, Subcommand};
use revu_core::AssignmentService;
use serde_json::{json, Value};

/// Pull request commands
#[derive(Args, Debug)]
pub struct PrArgs {
    #[command(subcommand)]
    pub command: PrCommand,
}

#[derive(Subcommand, Debug)]
pub enum PrCommand {
    /// Open a pull request and assign reviewers from the author's team
    Create {
        /// Pull request ID
        pull_request_id: String,

        /// Pull request name
        pull_request_name: String,

        /// Author's user ID
        author_id: String,
    },

    /// Mark a pull request merged
    Merge {
        /// Pull request ID
        pull_request_id: String,
    },

    /// Replace one reviewer with another member of that reviewer's team
    Reassign {
        /// Pull request ID
        pull_request_id: String,

        /// Reviewer to replace
        old_user_id: String,
    },
}

impl PrArgs {
    /// Execute the pull request command
    pub async fn execute(&self, service: &AssignmentService) -> anyhow::Result<Value> {
        match &self.command {
            PrCommand::Create {
                pull_request_id,
                pull_request_name,
                author_id,
            } => {
                let pr = service
                    .create_pr(pull_request_id, pull_request_name, author_id)
                    .await?;
                Ok(json!({ "pr": pr }))
            }
            PrCommand::Merge { pull_request_id } => {
                let pr = service.merge_pr(pull_request_id).await?;
                Ok(json!({ "pr": pr }))
            }
            PrCommand::Reassign {
                pull_request_id,
                old_user_id,
            } => {
                let result = service
                    .reassign_reviewer(pull_request_id, old_user_id)
                    .await?;
                Ok(json!({
                    "pr": result.pull_request,
                    "replaced_by": result.replaced_by,
                }))
            }
        }
    }
}
