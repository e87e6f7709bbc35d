//! Open command - make a project active and load its files

use crate::cli::args::OpenArgs;
use crate::cli::commands::boot;
use crate::config::{Config, ConfigManager};
use crate::error::{IdeError, IdeResult};
use crate::session::ActiveProject;
use crate::ui::{self, BusyIndicator, UiContext};

/// Execute the open command
pub async fn execute(args: OpenArgs, config: &Config) -> IdeResult<()> {
    let ctx = UiContext::detect();
    let mut workspace = boot::workspace(&ctx, config).await?;
    let busy = BusyIndicator::attach(&ctx, workspace.client().busy(), "Fetching latest code...");

    let project: ActiveProject = match args.project {
        Some(needle) => workspace.find_project(&needle).await?.into(),
        None => {
            let projects = workspace.list_projects().await?;
            let options: Vec<_> = projects
                .iter()
                .map(|p| (p.id.clone(), p.name.clone(), p.id.clone()))
                .collect();
            let Some(id) = ui::select(&ctx, "Open which project?", &options).await? else {
                return Err(IdeError::User(
                    "Name the project to open: pocketide open <id|name>".to_string(),
                ));
            };
            projects
                .into_iter()
                .find(|p| p.id == id)
                .ok_or(IdeError::ProjectNotFound(id))?
                .into()
        }
    };

    let name = project.name.clone();
    let opened = workspace.open(project).await;
    busy.finish();
    opened?;

    ui::step_ok(&ctx, &format!("Opened {}", name));
    ui::remark(
        &ctx,
        &format!(
            "Editing {} in {}",
            workspace.drafts().active(),
            ConfigManager::editor_path(config).display()
        ),
    );
    Ok(())
}
