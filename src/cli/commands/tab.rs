//! Tab command - bind the script or markup slot to the editor

use crate::cli::args::TabArgs;
use crate::cli::commands::boot;
use crate::config::Config;
use crate::draft::Slot;
use crate::error::{IdeError, IdeResult};
use crate::ui::{self, UiContext};

/// Execute the tab command
pub async fn execute(args: TabArgs, config: &Config) -> IdeResult<()> {
    let ctx = UiContext::detect();
    let mut workspace = boot::local_workspace(config).await?;
    let project = workspace.project().ok_or(IdeError::NoActiveProject)?;

    let Some(slot) = args.slot else {
        println!("{}", workspace.drafts().active());
        return Ok(());
    };
    let slot: Slot = slot.parse()?;

    workspace.switch_slot(slot).await?;
    ui::step_ok(&ctx, &format!("{}: editing {}", project.name, slot));
    Ok(())
}
