//! agentdash: terminal dashboard for a local AI agent. Live CPU / memory /
//! disk telemetry over WebSocket and a console for natural-language commands.

pub mod api;
pub mod app;
pub mod commands;
pub mod history;
pub mod logging;
pub mod profiles;
pub mod store;
pub mod types;
pub mod ui;
pub mod ws;
