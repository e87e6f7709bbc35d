//! Terminal UI
//!
//! `cliclack` framing, spinners and prompts on an interactive terminal,
//! with plain bracketed output in CI or when piped.
//!
//! # Example
//!
//! ```rust,ignore
//! use pocketide::ui::{self, BusyIndicator, UiContext};
//!
//! let ctx = UiContext::detect().with_auto_yes(args.yes);
//! if !ui::confirm(&ctx, "Publish a new version?", false).await? {
//!     return Ok(());
//! }
//!
//! let busy = BusyIndicator::attach(&ctx, client.busy(), "Deploying...");
//! let deployed = workspace.deploy().await;
//! busy.finish();
//!
//! ui::key_value(&ctx, "App URL", &deployed?.app_url);
//! ```

mod context;
mod output;
mod progress;
mod prompts;
mod theme;

pub use context::{UiContext, PLAIN_ENV};
pub use output::{
    intro, key_value, key_value_status, remark, step_error_detail, step_info, step_ok,
    step_ok_detail, step_warn_hint,
};
pub use progress::{BusyIndicator, TaskSpinner};
pub use prompts::{confirm, password, select};
pub use theme::{init_theme, IdeTheme};
