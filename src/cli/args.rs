//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

/// pocketide - edit, save and deploy script projects from the terminal
///
/// Keeps drafts locally between commands, works against a single RPC
/// endpoint, and keeps the application shell cached for offline use.
#[derive(Parser, Debug)]
#[command(name = "pocketide")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "POCKETIDE_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Store the access key and check it against the backend
    Login(LoginArgs),

    /// Forget the access key and discard local drafts
    Logout,

    /// List projects
    Projects(ProjectsArgs),

    /// Create a project and open it
    Create(CreateArgs),

    /// Open a project by id or name
    Open(OpenArgs),

    /// Show or switch the file bound to the editor
    Tab(TabArgs),

    /// Upload the drafts of the open project
    Save,

    /// Upload the drafts and publish a new version
    Deploy(DeployArgs),

    /// Delete a project
    Delete(DeleteArgs),

    /// Close the open project, discarding unsaved drafts
    Close,

    /// Show or change the colour theme
    Theme(ThemeArgs),

    /// Inspect and manage the offline shell cache
    Shell(ShellArgs),

    /// Show or edit configuration
    Config(ConfigArgs),

    /// Print shell completions
    Completions(CompletionsArgs),
}

#[derive(Parser, Debug)]
pub struct LoginArgs {
    /// Access key (prompted for when omitted)
    #[arg(short, long, env = "POCKETIDE_KEY", hide_env_values = true)]
    pub key: Option<String>,
}

#[derive(Parser, Debug)]
pub struct ProjectsArgs {
    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

#[derive(Parser, Debug)]
pub struct CreateArgs {
    /// Project name
    pub name: String,
}

#[derive(Parser, Debug)]
pub struct OpenArgs {
    /// Project id or name (pick interactively when omitted)
    pub project: Option<String>,
}

#[derive(Parser, Debug)]
pub struct TabArgs {
    /// `script` or `markup`
    pub slot: Option<String>,
}

#[derive(Parser, Debug)]
pub struct DeployArgs {
    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Parser, Debug)]
pub struct DeleteArgs {
    /// Project id
    pub id: String,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Parser, Debug)]
pub struct ThemeArgs {
    /// New theme; prints the current one when omitted
    pub choice: Option<ThemeChoice>,
}

/// Theme argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ThemeChoice {
    Dark,
    Light,
    Toggle,
}

#[derive(Parser, Debug)]
pub struct ShellArgs {
    #[command(subcommand)]
    pub action: ShellAction,
}

/// Shell cache subcommands
#[derive(Subcommand, Debug)]
pub enum ShellAction {
    /// Show the controlling worker and the cache stores on disk
    Status {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Install and activate the configured shell version
    Update {
        /// Reinstall even if the version already controls the page
        #[arg(short, long)]
        force: bool,
    },

    /// Unregister the worker, delete every cache store, then reinstall
    Reset {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,

        /// Do not reinstall afterwards
        #[arg(long)]
        no_reload: bool,
    },

    /// Fetch a URL through the worker
    Fetch {
        /// Absolute URL, or a path relative to the shell origin
        url: String,

        /// Write the body to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., backend.endpoint)
        key: String,
        /// Value to set
        value: String,
    },
}

#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Target shell
    pub shell: Shell,
}

/// Output format for listings
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
    /// Simple text (one per line)
    Plain,
}
