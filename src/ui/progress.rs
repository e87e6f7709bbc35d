//! Progress indicators with CI fallback

use super::context::UiContext;
use crate::session::BusyGauge;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tokio::task::JoinHandle;

/// A task spinner with CI fallback
pub struct TaskSpinner {
    spinner: Option<cliclack::ProgressBar>,
    interactive: bool,
}

impl TaskSpinner {
    pub fn new(ctx: &UiContext) -> Self {
        Self {
            spinner: None,
            interactive: ctx.use_fancy_output(),
        }
    }

    /// Start the spinner with a message
    pub fn start(&mut self, message: &str) {
        if self.interactive {
            let spinner = cliclack::spinner();
            spinner.start(message);
            self.spinner = Some(spinner);
        } else {
            println!("{} {}", style("...").dim(), message);
        }
    }

    /// Stop with success message
    pub fn stop(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.stop(message);
        } else if self.interactive {
            println!("{} {}", style("✓").green(), message);
        } else {
            println!("{} {}", style("[OK]").green(), message);
        }
    }

    /// Stop with error message
    pub fn stop_error(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.error(message);
        } else if self.interactive {
            println!("{} {}", style("✗").red(), message);
        } else {
            println!("{} {}", style("[FAIL]").red(), message);
        }
    }

    /// Clear the spinner without any message
    pub fn clear(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.clear();
        }
    }
}

/// Spinner shown while any backend call is outstanding.
///
/// Follows a [`BusyGauge`]: it appears when the count leaves zero and
/// hides when it returns. Plain mode prints nothing.
pub struct BusyIndicator {
    bar: Option<ProgressBar>,
    watcher: Option<JoinHandle<()>>,
}

impl BusyIndicator {
    /// Start following `gauge`
    pub fn attach(ctx: &UiContext, gauge: &BusyGauge, label: &str) -> Self {
        if !ctx.use_fancy_output() {
            return Self {
                bar: None,
                watcher: None,
            };
        }

        let bar = ProgressBar::hidden();
        if let Ok(spinner_style) = ProgressStyle::default_spinner().template("  {spinner:.cyan} {msg}")
        {
            bar.set_style(spinner_style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ "));
        }
        bar.set_message(label.to_string());

        let mut rx = gauge.subscribe();
        let shown = bar.clone();
        let watcher = tokio::spawn(async move {
            loop {
                let outstanding = *rx.borrow_and_update();
                if outstanding > 0 {
                    shown.set_draw_target(indicatif::ProgressDrawTarget::stderr());
                    shown.enable_steady_tick(Duration::from_millis(100));
                } else {
                    shown.disable_steady_tick();
                    shown.set_draw_target(indicatif::ProgressDrawTarget::hidden());
                }
                if rx.changed().await.is_err() {
                    break;
                }
            }
        });

        Self {
            bar: Some(bar),
            watcher: Some(watcher),
        }
    }

    /// Stop following the gauge and clear the line
    pub fn finish(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(watcher) = self.watcher.take() {
            watcher.abort();
        }
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}

impl Drop for BusyIndicator {
    fn drop(&mut self) {
        self.shutdown();
    }
}
