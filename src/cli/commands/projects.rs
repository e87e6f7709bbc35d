//! Projects command - list the backend's projects

use crate::cli::args::{OutputFormat, ProjectsArgs};
use crate::cli::commands::boot;
use crate::config::Config;
use crate::error::IdeResult;
use crate::session::ProjectSummary;
use crate::ui::{self, BusyIndicator, UiContext};
use console::style;

/// Execute the projects command
pub async fn execute(args: ProjectsArgs, config: &Config) -> IdeResult<()> {
    let ctx = UiContext::detect();
    let mut workspace = boot::workspace(&ctx, config).await?;

    let busy = BusyIndicator::attach(&ctx, workspace.client().busy(), "Loading projects...");
    let projects = workspace.list_projects().await;
    busy.finish();
    let projects = projects?;

    let open_id = workspace.project().map(|p| p.id);

    if projects.is_empty() {
        match args.format {
            OutputFormat::Json => println!("[]"),
            OutputFormat::Plain => {}
            OutputFormat::Table => ui::step_info(&ctx, "No projects yet. Run: pocketide create <name>"),
        }
        return Ok(());
    }

    match args.format {
        OutputFormat::Table => print_table(&ctx, &projects, open_id.as_deref()),
        OutputFormat::Json => print_json(&projects)?,
        OutputFormat::Plain => print_plain(&projects),
    }

    Ok(())
}

fn print_table(ctx: &UiContext, projects: &[ProjectSummary], open_id: Option<&str>) {
    ui::intro(ctx, "Projects");

    println!(
        "{:<2} {:<28} {:<24} {:<17}",
        "",
        style("NAME").bold(),
        style("ID").bold(),
        style("UPDATED").bold()
    );
    println!("{}", "-".repeat(73));

    for project in projects {
        let marker = if open_id == Some(project.id.as_str()) {
            style("*").green().to_string()
        } else {
            " ".to_string()
        };
        let updated = project
            .updated_at()
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());

        println!(
            "{:<2} {:<28} {:<24} {:<17}",
            marker, project.name, project.id, updated
        );
        if let Some(url) = &project.url {
            println!("   {}", style(url).dim());
        }
    }

    println!();
    println!("{} project(s)", projects.len());
}

fn print_json(projects: &[ProjectSummary]) -> IdeResult<()> {
    println!("{}", serde_json::to_string_pretty(projects)?);
    Ok(())
}

fn print_plain(projects: &[ProjectSummary]) {
    for project in projects {
        println!("{}\t{}", project.id, project.name);
    }
}
