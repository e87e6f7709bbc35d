//! Save command

use crate::cli::commands::boot;
use crate::config::Config;
use crate::error::IdeResult;
use crate::ui::{self, BusyIndicator, UiContext};

/// Upload the drafts of the open project
pub async fn execute(config: &Config) -> IdeResult<()> {
    let ctx = UiContext::detect();
    let mut workspace = boot::workspace(&ctx, config).await?;

    let busy = BusyIndicator::attach(&ctx, workspace.client().busy(), "Saving...");
    let saved = workspace.save().await;
    busy.finish();

    let project = saved?;
    ui::step_ok(&ctx, &format!("Saved {}", project.name));
    Ok(())
}
