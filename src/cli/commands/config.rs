//! Config command - show or edit configuration

use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::config::{Config, ConfigManager};
use crate::error::{IdeError, IdeResult};
use crate::ui::{self, UiContext};
use tokio::fs;
use toml_edit::{value, Array, DocumentMut, Item, Table};

/// Keys `config set` accepts
const KEYS: [&str; 8] = [
    "general.log_format",
    "backend.endpoint",
    "backend.timeout_secs",
    "backend.credential_rejection_marker",
    "shell.origin",
    "shell.version",
    "shell.assets",
    "editor.path",
];

/// Execute the config command
pub async fn execute(args: ConfigArgs, config: &Config, manager: &ConfigManager) -> IdeResult<()> {
    match args.action {
        None | Some(ConfigAction::Show) => show_config(config)?,
        Some(ConfigAction::Path) => println!("{}", manager.path().display()),
        Some(ConfigAction::Init { force }) => init_config(manager, force).await?,
        Some(ConfigAction::Set { key, value }) => set_value(manager, &key, &value).await?,
    }
    Ok(())
}

fn show_config(config: &Config) -> IdeResult<()> {
    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

async fn init_config(manager: &ConfigManager, force: bool) -> IdeResult<()> {
    let ctx = UiContext::detect();
    let path = manager.path();

    if path.exists() && !force {
        ui::step_warn_hint(
            &ctx,
            &format!("Config already exists at {}", path.display()),
            "Use --force to overwrite",
        );
        return Ok(());
    }

    manager.save(&Config::default()).await?;
    ui::step_ok_detail(&ctx, "Configuration initialized", &path.display().to_string());
    Ok(())
}

/// Edit one key in place, keeping the rest of the file (comments included) as is
async fn set_value(manager: &ConfigManager, key: &str, raw: &str) -> IdeResult<()> {
    let ctx = UiContext::detect();
    if !KEYS.contains(&key) {
        ui::step_error_detail(&ctx, "Unknown config key", key);
        ui::remark(&ctx, &format!("Valid keys: {}", KEYS.join(", ")));
        return Err(IdeError::User(format!("Unknown config key: {}", key)));
    }

    let path = manager.path().to_path_buf();
    let content = if path.exists() {
        fs::read_to_string(&path)
            .await
            .map_err(|e| IdeError::io(format!("reading {}", path.display()), e))?
    } else {
        String::new()
    };

    let updated = apply(&content, key, raw).map_err(|reason| IdeError::ConfigInvalid {
        path: path.clone(),
        reason,
    })?;

    check(&updated).map_err(|reason| IdeError::ConfigInvalid {
        path: path.clone(),
        reason,
    })?;

    manager.ensure_config_dir().await?;
    fs::write(&path, updated)
        .await
        .map_err(|e| IdeError::io(format!("writing {}", path.display()), e))?;

    ui::step_ok(&ctx, &format!("Set {} = {}", key, raw));
    Ok(())
}

/// Reject documents the client could not load
fn check(content: &str) -> Result<(), String> {
    let config: Config = toml::from_str(content).map_err(|e| e.to_string())?;
    config.validate()
}

/// Set `section.field` in a TOML document
fn apply(content: &str, key: &str, raw: &str) -> Result<String, String> {
    let mut doc: DocumentMut = content.parse().map_err(|e| format!("{}", e))?;
    let (section, field) = key
        .split_once('.')
        .ok_or_else(|| format!("expected section.field, got {}", key))?;

    let table = doc
        .entry(section)
        .or_insert(Item::Table(Table::new()))
        .as_table_mut()
        .ok_or_else(|| format!("[{}] is not a table", section))?;

    let item = match key {
        "backend.timeout_secs" => {
            let secs: i64 = raw
                .parse()
                .map_err(|_| format!("{} expects a number of seconds", key))?;
            value(secs)
        }
        "shell.assets" => {
            let assets: Array = raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .collect();
            value(assets)
        }
        _ => value(raw),
    };
    table.insert(field, item);

    Ok(doc.to_string())
}
