//! CLI command implementations

pub(crate) mod boot;
pub mod close;
pub mod completions;
pub mod config;
pub mod create;
pub mod delete;
pub mod deploy;
pub mod login;
pub mod open;
pub mod projects;
pub mod save;
pub mod shell;
pub mod tab;
pub mod theme;

pub use close::execute as close;
pub use completions::execute as completions;
pub use config::execute as config;
pub use create::execute as create;
pub use delete::execute as delete;
pub use deploy::execute as deploy;
pub use login::execute as login;
pub use login::logout;
pub use open::execute as open;
pub use projects::execute as projects;
pub use save::execute as save;
pub use shell::execute as shell;
pub use tab::execute as tab;
pub use theme::execute as theme;
