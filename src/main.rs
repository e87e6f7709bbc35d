//! pocketide CLI entry point

use clap::Parser;
use console::style;
use pocketide::cli::{Cli, Commands};
use pocketide::config::ConfigManager;
use pocketide::error::{IdeError, IdeResult};
use pocketide::session::LocalStore;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report(&e);
            ExitCode::FAILURE
        }
    }
}

fn report(e: &IdeError) {
    if e.is_alertable() {
        eprintln!("{} {}", style("Error:").red().bold(), e);
    } else {
        // Already logged out; say so instead of raising an alert
        eprintln!("{} {}", style("Logged out:").yellow().bold(), e);
    }
    if let Some(hint) = e.hint() {
        eprintln!("{} {}", style("Hint:").yellow(), hint);
    }
}

async fn run() -> IdeResult<()> {
    let cli = Cli::parse();

    // Completions need neither config nor state
    if let Commands::Completions(args) = cli.command {
        pocketide::cli::commands::completions(args);
        return Ok(());
    }

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    let config = config_manager.load().await?;

    // 0 = warn, 1 = info, 2+ = debug
    let filter = match cli.verbose {
        0 => EnvFilter::new("pocketide=warn"),
        1 => EnvFilter::new("pocketide=info"),
        _ => EnvFilter::new("pocketide=debug"),
    };
    if config.general.log_format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .without_time()
            .with_writer(std::io::stderr)
            .init();
    }

    ConfigManager::ensure_state_dirs().await?;
    debug!("State directory: {}", ConfigManager::state_dir().display());

    let theme = LocalStore::new(ConfigManager::local_storage_path())
        .theme()
        .await
        .unwrap_or_default();
    pocketide::ui::init_theme(theme);

    use pocketide::cli::commands as cmd;
    match cli.command {
        Commands::Completions(_) => unreachable!("Completions handled above"),
        Commands::Login(args) => cmd::login(args, &config).await,
        Commands::Logout => cmd::logout(&config).await,
        Commands::Projects(args) => cmd::projects(args, &config).await,
        Commands::Create(args) => cmd::create(args, &config).await,
        Commands::Open(args) => cmd::open(args, &config).await,
        Commands::Tab(args) => cmd::tab(args, &config).await,
        Commands::Save => cmd::save(&config).await,
        Commands::Deploy(args) => cmd::deploy(args, &config).await,
        Commands::Delete(args) => cmd::delete(args, &config).await,
        Commands::Close => cmd::close(&config).await,
        Commands::Theme(args) => cmd::theme(args, &config).await,
        Commands::Shell(args) => cmd::shell(args, &config).await,
        Commands::Config(args) => cmd::config(args, &config, &config_manager).await,
    }
}
