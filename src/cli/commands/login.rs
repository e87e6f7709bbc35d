//! Login and logout

use crate::cli::args::LoginArgs;
use crate::cli::commands::boot;
use crate::config::Config;
use crate::error::{IdeError, IdeResult};
use crate::ui::{self, TaskSpinner, UiContext};

/// Store the access key, then check it with a project listing
pub async fn execute(args: LoginArgs, config: &Config) -> IdeResult<()> {
    let ctx = UiContext::detect();
    let mut workspace = boot::workspace(&ctx, config).await?;

    let key = match args.key {
        Some(key) => key,
        None => ui::password(&ctx, "Access key").await?,
    };
    workspace.login(&key).await?;

    let mut spinner = TaskSpinner::new(&ctx);
    spinner.start("Checking access key...");
    match workspace.list_projects().await {
        Ok(projects) => {
            spinner.stop(&format!("Logged in ({} project(s))", projects.len()));
            Ok(())
        }
        Err(e @ IdeError::Authentication(_)) => {
            spinner.stop_error("Access key rejected");
            Err(e)
        }
        Err(e) if e.is_retryable() => {
            // The key stays stored; it is checked again on the next call
            spinner.stop_error("Could not verify the access key");
            ui::step_warn_hint(&ctx, &e.to_string(), "The key was saved anyway");
            Ok(())
        }
        Err(e) => {
            spinner.clear();
            Err(e)
        }
    }
}

/// Forget the access key and discard local drafts
pub async fn logout(config: &Config) -> IdeResult<()> {
    let ctx = UiContext::detect();
    let mut workspace = boot::local_workspace(config).await?;

    if !workspace.client().is_logged_in() {
        ui::step_info(&ctx, "Not logged in");
        return Ok(());
    }

    workspace.logout().await?;
    ui::step_ok(&ctx, "Logged out");
    Ok(())
}
