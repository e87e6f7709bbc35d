//! Prompt theme following the persisted light/dark preference

use crate::session::Theme;
use cliclack::ThemeState;
use console::Style;

/// cliclack theme; dark terminals get cyan accents, light ones blue
#[derive(Debug, Clone, Copy, Default)]
pub struct IdeTheme {
    mode: Theme,
}

impl IdeTheme {
    pub fn new(mode: Theme) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> Theme {
        self.mode
    }

    fn accent(&self) -> Style {
        match self.mode {
            Theme::Dark => Style::new().cyan(),
            Theme::Light => Style::new().blue(),
        }
    }
}

impl cliclack::Theme for IdeTheme {
    fn bar_color(&self, state: &ThemeState) -> Style {
        match state {
            ThemeState::Active => self.accent(),
            ThemeState::Error(_) => Style::new().red(),
            ThemeState::Cancel => Style::new().dim(),
            ThemeState::Submit => self.accent().dim(),
        }
    }

    fn state_symbol_color(&self, state: &ThemeState) -> Style {
        match state {
            ThemeState::Active => self.accent(),
            ThemeState::Error(_) => Style::new().red(),
            ThemeState::Cancel => Style::new().dim(),
            ThemeState::Submit => Style::new().green(),
        }
    }
}

/// Install the theme for every prompt that follows
pub fn init_theme(mode: Theme) {
    cliclack::set_theme(IdeTheme::new(mode));
}
