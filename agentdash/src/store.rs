//! Session-wide view state: theme, last stats snapshot and the command log
//! shown on the dashboard. Owned by the app and mutated on the UI task only.

use crate::history::CommandHistory;
use crate::types::{CommandRecord, TelemetrySample};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

#[derive(Debug, Default)]
pub struct ViewState {
    theme: Theme,
    system_stats: Option<TelemetrySample>,
    command_history: CommandHistory,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn system_stats(&self) -> Option<&TelemetrySample> {
        self.system_stats.as_ref()
    }

    pub fn command_history(&self) -> &CommandHistory {
        &self.command_history
    }

    pub fn toggle_theme(&mut self) {
        self.theme = self.theme.toggled();
    }

    pub fn set_system_stats(&mut self, stats: TelemetrySample) {
        self.system_stats = Some(stats);
    }

    pub fn add_command_to_history(&mut self, record: CommandRecord) {
        self.command_history.push_front_capped(record);
    }
}
