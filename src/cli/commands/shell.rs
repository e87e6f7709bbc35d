//! Shell command - inspect and manage the offline shell cache

use crate::cache::{RegisterOutcome, RegistrationRecord, StoreInfo, WorkerStatus};
use crate::cli::args::{OutputFormat, ShellAction, ShellArgs};
use crate::cli::commands::boot;
use crate::config::{Config, ConfigManager};
use crate::error::{IdeError, IdeResult};
use crate::fetch::{parse_url, resolve_url, Request};
use crate::ui::{self, TaskSpinner, UiContext};
use console::style;
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use tokio::fs;

/// Execute the shell command
pub async fn execute(args: ShellArgs, config: &Config) -> IdeResult<()> {
    match args.action {
        ShellAction::Status { format } => status(config, format).await,
        ShellAction::Update { force } => update(config, force).await,
        ShellAction::Reset { yes, no_reload } => reset(config, yes, no_reload).await,
        ShellAction::Fetch { url, output } => fetch(config, &url, output).await,
    }
}

#[derive(Serialize)]
struct ShellReport {
    configured_version: String,
    registration: Option<RegistrationRecord>,
    worker: Option<WorkerStatus>,
    stores: Vec<StoreInfo>,
}

async fn status(config: &Config, format: OutputFormat) -> IdeResult<()> {
    let ctx = UiContext::detect();
    let mut registration = boot::registration(config)?;
    registration.restore().await?;

    let worker = match registration.controller() {
        Some(handle) => Some(handle.status().await?),
        None => None,
    };
    let report = ShellReport {
        configured_version: config.shell.version.clone(),
        registration: RegistrationRecord::load(&ConfigManager::registration_path()).await?,
        worker,
        stores: registration.storage().describe().await?,
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Plain => {
            for store in &report.stores {
                println!("{}", store.name);
            }
        }
        OutputFormat::Table => print_status(&ctx, &report),
    }
    Ok(())
}

fn print_status(ctx: &UiContext, report: &ShellReport) {
    ui::intro(ctx, "Shell cache");

    ui::key_value(ctx, "Configured version", &report.configured_version);
    match (&report.worker, &report.registration) {
        (Some(worker), Some(record)) => {
            ui::key_value_status(
                ctx,
                "Controller",
                &format!("{} ({})", worker.version, worker.state),
                worker.version == report.configured_version,
            );
            ui::key_value(
                ctx,
                "Activated",
                &record.activated_at.format("%Y-%m-%d %H:%M").to_string(),
            );
        }
        _ => ui::key_value_status(ctx, "Controller", "none", false),
    }

    println!();
    println!(
        "{:<32} {:<8} {:<17}",
        style("STORE").bold(),
        style("ENTRIES").bold(),
        style("CREATED").bold()
    );
    println!("{}", "-".repeat(59));
    for store in &report.stores {
        println!(
            "{:<32} {:<8} {:<17}",
            store.name,
            store.entries,
            store.created_at.format("%Y-%m-%d %H:%M")
        );
    }
    if report.stores.is_empty() {
        println!("{}", style("(no cache stores)").dim());
    }
}

async fn update(config: &Config, force: bool) -> IdeResult<()> {
    let ctx = UiContext::detect();
    let mut registration = boot::registration(config)?;

    let mut spinner = TaskSpinner::new(&ctx);
    spinner.start(&format!("Installing shell {}...", config.shell.version));

    let outcome = match boot::register_shell(&ctx, &mut registration, config, force).await {
        Ok(outcome) => outcome,
        Err(e) => {
            spinner.stop_error("Install failed");
            return Err(e);
        }
    };

    match outcome {
        RegisterOutcome::Current { version } => {
            spinner.stop(&format!("Shell {} is already active", version));
        }
        RegisterOutcome::Activated {
            version,
            replaced,
            evicted,
        } => {
            spinner.stop(&format!("Shell {} active", version));
            if let Some(old) = replaced.filter(|old| *old != version) {
                ui::remark(&ctx, &format!("Replaced {}", old));
            }
            if !evicted.is_empty() {
                ui::remark(&ctx, &format!("Evicted {}", evicted.join(", ")));
            }
        }
    }
    Ok(())
}

async fn reset(config: &Config, yes: bool, no_reload: bool) -> IdeResult<()> {
    let ctx = UiContext::detect().with_auto_yes(yes);
    if !ui::confirm(&ctx, "Unregister the shell and delete every cache store?", false).await? {
        ui::step_info(&ctx, "Nothing reset. Pass --yes to skip this prompt");
        return Ok(());
    }

    let mut registration = boot::registration(config)?;
    let report = registration.reset().await?;

    match report.unregistered {
        Some(version) => ui::step_ok(&ctx, &format!("Unregistered shell {}", version)),
        None => ui::step_info(&ctx, "No shell was registered"),
    }
    ui::step_ok(
        &ctx,
        &format!("Deleted {} cache store(s)", report.deleted_stores.len()),
    );

    if no_reload {
        return Ok(());
    }

    // Hard reload
    boot::register_shell(&ctx, &mut registration, config, true).await?;
    ui::step_ok(&ctx, &format!("Reinstalled shell {}", config.shell.version));
    Ok(())
}

async fn fetch(config: &Config, url: &str, output: Option<PathBuf>) -> IdeResult<()> {
    let ctx = UiContext::detect();
    let mut registration = boot::registration(config)?;
    registration.restore().await?;

    let origin = parse_url(&config.shell.origin)?;
    let target = resolve_url(&origin, url)?;
    let response = registration
        .fetcher()
        .fetch(Request::get(target.as_str()))
        .await?;

    match output {
        Some(path) => {
            fs::write(&path, &response.body)
                .await
                .map_err(|e| IdeError::io(format!("writing {}", path.display()), e))?;
            ui::step_ok_detail(
                &ctx,
                &format!("HTTP {} {}", response.status, response.response_type),
                &path.display().to_string(),
            );
        }
        None => {
            std::io::stdout()
                .write_all(&response.body)
                .map_err(|e| IdeError::io("writing response to stdout", e))?;
        }
    }
    Ok(())
}
