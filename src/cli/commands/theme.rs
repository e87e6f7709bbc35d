//! Theme command

use crate::cli::args::{ThemeArgs, ThemeChoice};
use crate::config::{Config, ConfigManager};
use crate::error::IdeResult;
use crate::session::{LocalStore, Theme};
use crate::ui::{self, UiContext};

/// Show or persist the theme preference
pub async fn execute(args: ThemeArgs, _config: &Config) -> IdeResult<()> {
    let ctx = UiContext::detect();
    let store = LocalStore::new(ConfigManager::local_storage_path());
    let current = store.theme().await?;

    let next = match args.choice {
        None => {
            println!("{}", current);
            return Ok(());
        }
        Some(ThemeChoice::Dark) => Theme::Dark,
        Some(ThemeChoice::Light) => Theme::Light,
        Some(ThemeChoice::Toggle) => current.toggled(),
    };

    store.set_theme(next).await?;
    ui::init_theme(next);
    ui::step_ok(&ctx, &format!("Theme set to {}", next));
    Ok(())
}
