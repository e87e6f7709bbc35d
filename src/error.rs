//! Error types for pocketide
//!
//! All modules use `IdeResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pocketide operations
pub type IdeResult<T> = Result<T, IdeError>;

/// Coarse failure classes that callers act on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Network unreachable or the server answered with something that is not the protocol
    Connectivity,
    /// The server rejected the access key; the session has been torn down
    Authentication,
    /// The server reported any other failure
    Application,
    /// A shell asset could not be fetched while installing a worker version
    CacheInstall,
    /// Everything that happens on this machine (IO, config, local state)
    Local,
}

/// All errors that can occur in pocketide
#[derive(Error, Debug)]
pub enum IdeError {
    // Backend errors
    #[error("Cannot reach the backend: {0}")]
    Connectivity(String),

    #[error("Access key rejected: {0}")]
    Authentication(String),

    #[error("{0}")]
    Application(String),

    // Session errors
    #[error("Not logged in")]
    NotLoggedIn,

    #[error("No project is open")]
    NoActiveProject,

    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    // Shell cache errors
    #[error("Failed to install shell version {version}: {url}: {reason}")]
    CacheInstall {
        version: String,
        url: String,
        reason: String,
    },

    #[error("Offline and no cached copy of {0}")]
    Offline(String),

    #[error("Shell worker is not running")]
    WorkerUnavailable,

    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    // Draft errors
    #[error("Unknown slot: {0}. Use script or markup")]
    UnknownSlot(String),

    #[error("Draft payload is not valid encoded text: {0}")]
    DraftDecode(String),

    #[error("The project's files have not been loaded; refusing to upload placeholders")]
    DraftsNotLoaded,

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

impl IdeError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a connectivity error
    pub fn connectivity(message: impl Into<String>) -> Self {
        Self::Connectivity(message.into())
    }

    /// Classify the error
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Connectivity(_) => ErrorClass::Connectivity,
            Self::Authentication(_) => ErrorClass::Authentication,
            Self::Application(_) => ErrorClass::Application,
            Self::CacheInstall { .. } => ErrorClass::CacheInstall,
            _ => ErrorClass::Local,
        }
    }

    /// Check if error is retryable by the user without changing anything
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.class(),
            ErrorClass::Connectivity | ErrorClass::Application
        ) || matches!(self, Self::Offline(_))
    }

    /// Whether the error should be shown as an alert.
    ///
    /// A credential rejection has already logged the user out.
    pub fn is_alertable(&self) -> bool {
        self.class() != ErrorClass::Authentication
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Connectivity(_) => Some(
                "Check your network connection and that the backend deployment allows access for anyone",
            ),
            Self::Authentication(_) | Self::NotLoggedIn => Some("Run: pocketide login"),
            Self::NoActiveProject => Some("Run: pocketide open <project>"),
            Self::Offline(_) => Some("Reconnect and retry, or run: pocketide shell update"),
            Self::CacheInstall { .. } => {
                Some("The previous shell version keeps serving. Retry: pocketide shell update")
            }
            Self::WorkerUnavailable => Some("Run: pocketide shell reset"),
            Self::DraftsNotLoaded => Some("Reload the files first: pocketide open <id|name>"),
            _ => None,
        }
    }
}
