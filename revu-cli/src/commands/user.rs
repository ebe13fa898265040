//! User commands

use clap::{Args, Subcommand};
use revu_core::AssignmentService;
use serde_json::{json, Value};

/// User commands
#[derive(Args, Debug)]
pub struct UserArgs {
    #[command(subcommand)]
    pub command: UserCommand,
}

#[derive(Subcommand, Debug)]
pub enum UserCommand {
    /// Mark a user active or inactive for reviewer selection
    SetActive {
        /// User ID
        user_id: String,

        /// New value of the active flag
        #[arg(action = clap::ArgAction::Set)]
        is_active: bool,
    },

    /// List pull requests the user currently reviews
    Reviews {
        /// User ID
        user_id: String,
    },
}

impl UserArgs {
    /// Execute the user command
    pub async fn execute(&self, service: &AssignmentService) -> anyhow::Result<Value> {
        match &self.command {
            UserCommand::SetActive { user_id, is_active } => {
                let user = service.set_user_active(user_id, *is_active).await?;
                Ok(json!({ "user": user }))
            }
            UserCommand::Reviews { user_id } => {
                let pull_requests = service.get_user_reviews(user_id).await?;
                Ok(json!({
                    "user_id": user_id,
                    "pull_requests": pull_requests,
                }))
            }
        }
    }
}
