//! Tracing setup. The dashboard owns the terminal, so interactive runs log
//! to a file; one-shot queries log to stderr.

use std::{
    fs::{self, OpenOptions},
    path::PathBuf,
    sync::Mutex,
};

use tracing_subscriber::EnvFilter;

use crate::profiles::config_dir;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    File,
    Stderr,
}

pub fn log_path() -> PathBuf {
    std::env::var_os("AGENTDASH_LOG_FILE")
        .map(PathBuf::from)
        .unwrap_or_else(|| config_dir().join("agentdash.log"))
}

// AGENTDASH_LOG takes EnvFilter syntax, e.g. "agentdash=debug"
fn filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_env("AGENTDASH_LOG").unwrap_or_else(|_| EnvFilter::new(default))
}

pub fn init(target: LogTarget) -> anyhow::Result<()> {
    let res = match target {
        LogTarget::Stderr => tracing_subscriber::fmt()
            .with_env_filter(filter("warn"))
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init(),
        LogTarget::File => {
            let path = log_path();
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(&path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter("info"))
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .try_init()
        }
    };
    res.map_err(|e| anyhow::anyhow!("tracing init failed: {e}"))
}
