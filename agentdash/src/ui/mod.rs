//! UI module root: exposes drawing functions for individual panels.

pub mod chart;
pub mod commands;
pub mod header;
pub mod stats;
pub mod status;
pub mod theme;
pub mod util;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Dashboard,
    Commands,
}

impl View {
    pub fn next(self) -> Self {
        match self {
            View::Dashboard => View::Commands,
            View::Commands => View::Dashboard,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            View::Dashboard => "Dashboard",
            View::Commands => "Commands",
        }
    }
}
