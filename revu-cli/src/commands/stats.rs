//! Stats command - reviewer assignment counts

use clap::Args;
use revu_core::AssignmentService;
use serde_json::{json, Value};

/// Show how many reviews each user is assigned
#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Only show the N busiest reviewers
    #[arg(short, long)]
    top: Option<usize>,
}

impl StatsArgs {
    /// Execute the stats command
    pub async fn execute(&self, service: &AssignmentService) -> anyhow::Result<Value> {
        let mut stats = service.get_reviewer_stats().await?;
        if let Some(top) = self.top {
            stats.truncate(top);
        }
        Ok(json!({ "stats": stats }))
    }
}
