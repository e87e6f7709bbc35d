//! Deploy command - save and publish a new version

use crate::cli::args::DeployArgs;
use crate::cli::commands::boot;
use crate::config::Config;
use crate::error::{IdeError, IdeResult};
use crate::ui::{self, BusyIndicator, UiContext};

/// Execute the deploy command
pub async fn execute(args: DeployArgs, config: &Config) -> IdeResult<()> {
    let ctx = UiContext::detect().with_auto_yes(args.yes);
    let mut workspace = boot::workspace(&ctx, config).await?;
    let project = workspace.project().ok_or(IdeError::NoActiveProject)?;

    let prompt = format!("Publish a new version of {}?", project.name);
    if !ui::confirm(&ctx, &prompt, false).await? {
        ui::step_info(&ctx, "Deploy cancelled. Pass --yes to skip this prompt");
        return Ok(());
    }

    let busy = BusyIndicator::attach(&ctx, workspace.client().busy(), "Deploying...");
    let deployed = workspace.deploy().await;
    busy.finish();
    let deployed = deployed?;

    ui::step_ok(&ctx, &format!("Deployed {}", project.name));
    ui::key_value(&ctx, "App URL", &deployed.app_url);
    Ok(())
}
