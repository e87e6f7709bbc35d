//! Close command

use crate::cli::commands::boot;
use crate::config::Config;
use crate::error::IdeResult;
use crate::ui::{self, UiContext};

/// Close the open project, discarding unsaved drafts
pub async fn execute(config: &Config) -> IdeResult<()> {
    let ctx = UiContext::detect();
    let mut workspace = boot::local_workspace(config).await?;

    match workspace.close().await? {
        Some(project) => ui::step_ok(&ctx, &format!("Closed {}", project.name)),
        None => ui::step_info(&ctx, "No project is open"),
    }
    Ok(())
}
