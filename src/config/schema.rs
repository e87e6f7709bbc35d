//! Configuration schema for pocketide
//!
//! Configuration is stored at `~/.config/pocketide/config.toml`

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default shell cache version. Bump whenever the asset set changes.
pub const DEFAULT_SHELL_VERSION: &str = "ide-network-first-v2";

/// Server error text that means the access key was rejected
pub const DEFAULT_REJECTION_MARKER: &str = "Wrong Password";

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// RPC backend settings
    pub backend: BackendConfig,

    /// Application shell cache settings
    pub shell: ShellConfig,

    /// Editor surface settings
    pub editor: EditorConfig,
}

impl Config {
    /// Check values serde accepts but the client cannot work with
    pub fn validate(&self) -> Result<(), String> {
        if self.backend.credential_rejection_marker.trim().is_empty() {
            // An empty marker matches every server error and logs out on each one
            return Err("backend.credential_rejection_marker cannot be empty".to_string());
        }
        if !matches!(self.general.log_format.as_str(), "text" | "json") {
            return Err(format!(
                "general.log_format must be text or json, got {}",
                self.general.log_format
            ));
        }
        Ok(())
    }
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// RPC backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// The single RPC endpoint every action is POSTed to
    pub endpoint: String,

    /// Global request timeout in seconds. Deploys take around 30 seconds.
    pub timeout_secs: u64,

    /// Substring of a server error that means the access key was rejected
    pub credential_rejection_marker: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            timeout_secs: 90,
            credential_rejection_marker: DEFAULT_REJECTION_MARKER.to_string(),
        }
    }
}

/// Application shell configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Origin the shell is served from; relative assets resolve against it
    pub origin: String,

    /// Cache version baked into the current worker
    pub version: String,

    /// Assets that must all be cached for a version to install
    pub assets: Vec<String>,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            origin: "http://localhost:8080/".to_string(),
            version: DEFAULT_SHELL_VERSION.to_string(),
            assets: vec![
                "./".to_string(),
                "./index.html".to_string(),
                "./app.js".to_string(),
                "./manifest.json".to_string(),
                "https://cdn.tailwindcss.com".to_string(),
            ],
        }
    }
}

/// Editor surface configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// File that mirrors the visible editor (defaults to `<state>/editor.txt`)
    pub path: Option<PathBuf>,
}
