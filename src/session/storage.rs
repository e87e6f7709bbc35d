//! Persisted client key/value state
//!
//! A small JSON object on disk that outlives the process, read and
//! written under fixed key names.

use crate::error::{IdeError, IdeResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tokio::fs;
use tracing::debug;

/// Key holding the access key
pub const ACCESS_KEY: &str = "ide_key";

/// Key holding the theme preference
pub const THEME_KEY: &str = "theme";

/// Theme preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Light => write!(f, "light"),
            Self::Dark => write!(f, "dark"),
        }
    }
}

impl FromStr for Theme {
    type Err = IdeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            other => Err(IdeError::User(format!(
                "Unknown theme: {}. Use dark or light",
                other
            ))),
        }
    }
}

/// File-backed key/value store
#[derive(Debug, Clone)]
pub struct LocalStore {
    path: PathBuf,
}

impl LocalStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> IdeResult<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = fs::read_to_string(&self.path)
            .await
            .map_err(|e| IdeError::io(format!("reading {}", self.path.display()), e))?;
        Ok(serde_json::from_str(&content)?)
    }

    async fn write_all(&self, values: &BTreeMap<String, String>) -> IdeResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| IdeError::io("creating state directory", e))?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(values)?)
            .await
            .map_err(|e| IdeError::io(format!("writing {}", self.path.display()), e))?;

        // Holds the access key
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&self.path, perms)
                .map_err(|e| IdeError::io("setting local storage permissions", e))?;
        }
        Ok(())
    }

    pub async fn get(&self, key: &str) -> IdeResult<Option<String>> {
        Ok(self.read_all().await?.remove(key))
    }

    pub async fn set(&self, key: &str, value: &str) -> IdeResult<()> {
        let mut values = self.read_all().await?;
        values.insert(key.to_string(), value.to_string());
        self.write_all(&values).await?;
        debug!("Stored {}", key);
        Ok(())
    }

    /// Remove a key. Returns whether it was present.
    pub async fn remove(&self, key: &str) -> IdeResult<bool> {
        let mut values = self.read_all().await?;
        let existed = values.remove(key).is_some();
        if existed {
            self.write_all(&values).await?;
            debug!("Removed {}", key);
        }
        Ok(existed)
    }

    /// Stored theme, defaulting to light
    pub async fn theme(&self) -> IdeResult<Theme> {
        match self.get(THEME_KEY).await? {
            Some(raw) => raw.parse(),
            None => Ok(Theme::default()),
        }
    }

    pub async fn set_theme(&self, theme: Theme) -> IdeResult<()> {
        self.set(THEME_KEY, &theme.to_string()).await
    }
}
