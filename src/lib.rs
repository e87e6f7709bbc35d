//! pocketide - terminal client for a single-endpoint script IDE backend
//!
//! Keeps drafts of a project's script and markup files locally, sends
//! every backend action through one authenticated RPC, and serves the
//! application shell from a versioned offline cache.

pub mod cache;
pub mod cli;
pub mod config;
pub mod draft;
pub mod error;
pub mod fetch;
pub mod session;
pub mod ui;
pub mod workspace;

pub use error::{IdeError, IdeResult};
