//! Create command

use crate::cli::args::CreateArgs;
use crate::cli::commands::boot;
use crate::config::{Config, ConfigManager};
use crate::error::IdeResult;
use crate::ui::{self, BusyIndicator, UiContext};

/// Create a project and open it
pub async fn execute(args: CreateArgs, config: &Config) -> IdeResult<()> {
    let ctx = UiContext::detect();
    let mut workspace = boot::workspace(&ctx, config).await?;

    let busy = BusyIndicator::attach(&ctx, workspace.client().busy(), "Creating project...");
    let created = workspace.create(&args.name).await;
    busy.finish();
    let created = created?;

    ui::step_ok_detail(&ctx, &format!("Created {}", created.name), &created.id);
    ui::remark(
        &ctx,
        &format!(
            "Editing script in {}",
            ConfigManager::editor_path(config).display()
        ),
    );
    Ok(())
}
