//! Session management module
//!
//! The credential, the open project and the single RPC dispatch path.

pub mod busy;
pub mod client;
pub mod protocol;
pub mod state;
pub mod storage;

pub use busy::{BusyGauge, BusyGuard};
pub use client::SessionClient;
pub use protocol::{
    Action, CreatedProject, DeployResult, EncodedFiles, ProjectFiles, ProjectSummary,
};
pub use state::{ActiveProject, Session};
pub use storage::{LocalStore, Theme, ACCESS_KEY, THEME_KEY};
