//! Configuration management for pocketide

pub mod schema;

pub use schema::{Config, DEFAULT_REJECTION_MARKER};

use crate::error::{IdeError, IdeResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Environment variable that relocates all persisted client state
pub const STATE_DIR_ENV: &str = "POCKETIDE_STATE_DIR";

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("pocketide")
            .join("config.toml")
    }

    /// Get the state directory path
    pub fn state_dir() -> PathBuf {
        if let Some(dir) = std::env::var_os(STATE_DIR_ENV) {
            return PathBuf::from(dir);
        }
        dirs::state_dir()
            .or_else(dirs::data_local_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("pocketide")
    }

    /// Get the shell cache stores directory path
    pub fn caches_dir() -> PathBuf {
        Self::state_dir().join("caches")
    }

    /// Get the persisted key/value store path
    pub fn local_storage_path() -> PathBuf {
        Self::state_dir().join("local-storage.json")
    }

    /// Get the persisted workspace (open project + drafts) path
    pub fn workspace_path() -> PathBuf {
        Self::state_dir().join("workspace.json")
    }

    /// Get the worker registration record path
    pub fn registration_path() -> PathBuf {
        Self::state_dir().join("registration.json")
    }

    /// Get the editor surface file, honouring `editor.path`
    pub fn editor_path(config: &Config) -> PathBuf {
        config
            .editor
            .path
            .clone()
            .unwrap_or_else(|| Self::state_dir().join("editor.txt"))
    }

    /// Load configuration, creating default if not exists
    pub async fn load(&self) -> IdeResult<Config> {
        if !self.config_path.exists() {
            debug!("Config file not found, using defaults");
            return Ok(Config::default());
        }

        self.load_from_file(&self.config_path).await
    }

    /// Load configuration from a specific file
    pub async fn load_from_file(&self, path: &Path) -> IdeResult<Config> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| IdeError::io(format!("reading config from {}", path.display()), e))?;

        let config: Config = toml::from_str(&content).map_err(|e| IdeError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        config.validate().map_err(|reason| IdeError::ConfigInvalid {
            path: path.to_path_buf(),
            reason,
        })?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save(&self, config: &Config) -> IdeResult<()> {
        self.ensure_config_dir().await?;

        let content = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, content).await.map_err(|e| {
            IdeError::io(
                format!("writing config to {}", self.config_path.display()),
                e,
            )
        })?;

        info!("Configuration saved to {}", self.config_path.display());
        Ok(())
    }

    /// Ensure the config directory exists
    pub async fn ensure_config_dir(&self) -> IdeResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| IdeError::ConfigDirCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }
        Ok(())
    }

    /// Ensure all state directories exist
    pub async fn ensure_state_dirs() -> IdeResult<()> {
        let dirs = [Self::state_dir(), Self::caches_dir()];

        for dir in &dirs {
            fs::create_dir_all(dir).await.map_err(|e| {
                IdeError::io(format!("creating directory {}", dir.display()), e)
            })?;
        }

        // The access key lives in here
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o700);
            std::fs::set_permissions(Self::state_dir(), perms)
                .map_err(|e| IdeError::io("setting state dir permissions", e))?;
        }

        Ok(())
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_default_when_missing() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nonexistent.toml");
        let manager = ConfigManager::with_path(path);

        let config = manager.load().await.unwrap();
        assert_eq!(config.general.log_format, "text");
    }

    #[tokio::test]
    async fn save_and_load_roundtrip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        let manager = ConfigManager::with_path(path);

        let mut config = Config::default();
        config.backend.endpoint = "https://backend.test/exec".to_string();

        manager.save(&config).await.unwrap();
        let loaded = manager.load().await.unwrap();

        assert_eq!(loaded.backend.endpoint, "https://backend.test/exec");
    }

    #[tokio::test]
    async fn invalid_config_reports_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "[shell\nversion = ").unwrap();

        let err = ConfigManager::with_path(path.clone())
            .load()
            .await
            .unwrap_err();
        assert!(matches!(err, IdeError::ConfigInvalid { path: p, .. } if p == path));
    }

    #[tokio::test]
    async fn blank_rejection_marker_fails_to_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "[backend]\ncredential_rejection_marker = \"\"\n").unwrap();

        let err = ConfigManager::with_path(path).load().await.unwrap_err();
        assert!(
            matches!(err, IdeError::ConfigInvalid { ref reason, .. } if reason.contains("credential_rejection_marker"))
        );
    }

    #[test]
    #[serial]
    fn state_dir_env_override() {
        let temp = TempDir::new().unwrap();
        std::env::set_var(STATE_DIR_ENV, temp.path());
        assert_eq!(ConfigManager::state_dir(), temp.path());
        assert_eq!(ConfigManager::caches_dir(), temp.path().join("caches"));
        std::env::remove_var(STATE_DIR_ENV);
    }

    #[test]
    #[serial]
    fn editor_path_prefers_config() {
        let mut config = Config::default();
        config.editor.path = Some(PathBuf::from("/tmp/editor.gs"));
        assert_eq!(
            ConfigManager::editor_path(&config),
            PathBuf::from("/tmp/editor.gs")
        );
    }
}
