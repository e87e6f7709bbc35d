//! Delete command

use crate::cli::args::DeleteArgs;
use crate::cli::commands::boot;
use crate::config::Config;
use crate::error::IdeResult;
use crate::ui::{self, BusyIndicator, UiContext};

/// Execute the delete command
pub async fn execute(args: DeleteArgs, config: &Config) -> IdeResult<()> {
    let ctx = UiContext::detect().with_auto_yes(args.yes);
    let mut workspace = boot::workspace(&ctx, config).await?;

    let prompt = format!("Delete project {}? This cannot be undone", args.id);
    if !ui::confirm(&ctx, &prompt, false).await? {
        ui::step_info(&ctx, "Nothing deleted. Pass --yes to skip this prompt");
        return Ok(());
    }

    let was_open = workspace.project().is_some_and(|p| p.id == args.id);

    let busy = BusyIndicator::attach(&ctx, workspace.client().busy(), "Deleting...");
    let deleted = workspace.delete(&args.id).await;
    busy.finish();
    deleted?;

    ui::step_ok(&ctx, &format!("Deleted {}", args.id));
    if was_open {
        ui::remark(&ctx, "It was open; its drafts were discarded");
    }
    Ok(())
}
