//! Command console: submits free-text commands to the agent, one at a time,
//! and keeps the most-recent-first log of outcomes.

use std::future::Future;

use tracing::warn;

use crate::api::{ApiClient, ApiError};
use crate::history::CommandHistory;
use crate::types::{CommandRecord, ExecuteResponse};

/// Records fetched to seed the console on startup.
pub const SEED_HISTORY_LIMIT: usize = 20;

pub type CommandOutcome = Result<ExecuteResponse, ApiError>;

/// Anything that can run a command remotely.
pub trait CommandBackend: Send + Sync {
    fn execute(&self, command: &str) -> impl Future<Output = CommandOutcome> + Send;
}

/// A submission accepted by [`CommandConsole::begin`]; hand it back to
/// [`CommandConsole::complete`] with the outcome.
#[derive(Debug)]
pub struct PendingCommand {
    command: String,
}

impl PendingCommand {
    pub fn command(&self) -> &str {
        &self.command
    }
}

#[derive(Debug, Default)]
pub struct CommandConsole {
    history: CommandHistory,
    in_flight: bool,
}

impl CommandConsole {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> &CommandHistory {
        &self.history
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    /// Replace the log with records fetched from the agent.
    pub fn seed(&mut self, records: Vec<CommandRecord>) {
        self.history.replace(records);
    }

    /// Accept a submission. `None` for blank input or while another
    /// submission is in flight; a rejected call is dropped, not queued.
    pub fn begin(&mut self, text: &str) -> Option<PendingCommand> {
        let command = text.trim();
        if command.is_empty() || self.in_flight {
            return None;
        }
        self.in_flight = true;
        Some(PendingCommand {
            command: command.to_string(),
        })
    }

    pub fn complete(&mut self, pending: PendingCommand, outcome: CommandOutcome) -> &CommandRecord {
        self.in_flight = false;
        let timestamp = chrono::Utc::now().to_rfc3339();
        match outcome {
            Ok(resp) => self.history.push_front_capped(CommandRecord {
                result: resp.text(),
                success: resp.success,
                command: pending.command,
                timestamp,
            }),
            // No structured reply. This path does not enforce the history
            // cap; tests pin that behaviour.
            Err(e) => {
                warn!(command = %pending.command, "command submission failed: {e}");
                self.history.push_front_uncapped(CommandRecord {
                    result: e.to_string(),
                    success: false,
                    command: pending.command,
                    timestamp,
                })
            }
        }
    }

    pub async fn execute<B: CommandBackend>(
        &mut self,
        backend: &B,
        text: &str,
    ) -> Option<&CommandRecord> {
        let pending = self.begin(text)?;
        let outcome = backend.execute(pending.command()).await;
        Some(self.complete(pending, outcome))
    }
}

/// Fetch the most recent `limit` records once. Failures are logged and
/// yield an empty list.
pub async fn fetch_history(api: &ApiClient, limit: usize) -> Vec<CommandRecord> {
    match api.history(limit).await {
        Ok(records) => records,
        Err(e) => {
            warn!("loading command history failed: {e}");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::COMMAND_HISTORY_CAP;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Scripted {
        calls: AtomicUsize,
        fail: bool,
    }

    impl Scripted {
        fn ok() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail: true,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl CommandBackend for Scripted {
        async fn execute(&self, command: &str) -> CommandOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ApiError::Remote("network is unreachable".into()));
            }
            Ok(ExecuteResponse {
                success: true,
                response: Some(format!("ran {command}")),
                error: None,
            })
        }
    }

    fn ok_reply(text: &str) -> CommandOutcome {
        Ok(ExecuteResponse {
            success: true,
            response: Some(text.into()),
            error: None,
        })
    }

    #[tokio::test]
    async fn success_record_is_first_and_matches_reply() {
        let mut console = CommandConsole::new();
        let p = console.begin("  show system info ").unwrap();
        assert_eq!(p.command(), "show system info");
        let rec = console.complete(p, ok_reply("OK: 4 cores")).clone();
        assert_eq!(rec.command, "show system info");
        assert_eq!(rec.result, "OK: 4 cores");
        assert!(rec.success);
        assert!(!rec.timestamp.is_empty());
        assert_eq!(console.history().front(), Some(&rec));
        assert!(!console.in_flight());
    }

    #[tokio::test]
    async fn unsuccessful_reply_uses_error_text() {
        let mut console = CommandConsole::new();
        let p = console.begin("reboot").unwrap();
        let rec = console.complete(
            p,
            Ok(ExecuteResponse {
                success: false,
                response: None,
                error: Some("not allowed".into()),
            }),
        );
        assert!(!rec.success);
        assert_eq!(rec.result, "not allowed");
    }

    #[tokio::test]
    async fn blank_input_sends_nothing() {
        let backend = Scripted::ok();
        let mut console = CommandConsole::new();
        assert!(console.execute(&backend, "").await.is_none());
        assert!(console.execute(&backend, "   \t ").await.is_none());
        assert_eq!(backend.calls(), 0);
        assert!(console.history().is_empty());
    }

    #[tokio::test]
    async fn second_submission_while_in_flight_is_dropped() {
        let backend = Scripted::ok();
        let mut console = CommandConsole::new();
        let first = console.begin("first").unwrap();
        assert!(console.begin("second").is_none());
        assert!(console.execute(&backend, "third").await.is_none());
        assert_eq!(backend.calls(), 0);

        let outcome = backend.execute(first.command()).await;
        console.complete(first, outcome);
        assert_eq!(backend.calls(), 1);
        assert_eq!(console.history().len(), 1);
        assert_eq!(console.history().front().unwrap().result, "ran first");

        // guard released
        assert!(console.execute(&backend, "again").await.is_some());
        assert_eq!(backend.calls(), 2);
    }

    #[tokio::test]
    async fn successes_never_exceed_cap() {
        let backend = Scripted::ok();
        let mut console = CommandConsole::new();
        for i in 0..COMMAND_HISTORY_CAP + 15 {
            console.execute(&backend, &format!("c{i}")).await;
            assert!(console.history().len() <= COMMAND_HISTORY_CAP);
        }
        let first = console.history().front().unwrap();
        assert_eq!(first.command, format!("c{}", COMMAND_HISTORY_CAP + 14));
    }

    // Failure records bypass the cap (kept as the dashboard always behaved).
    #[tokio::test]
    async fn failures_are_recorded_without_cap() {
        let ok = Scripted::ok();
        let down = Scripted::failing();
        let mut console = CommandConsole::new();
        for i in 0..COMMAND_HISTORY_CAP {
            console.execute(&ok, &format!("c{i}")).await;
        }
        let rec = console.execute(&down, "bogus").await.unwrap().clone();
        assert_eq!(rec.command, "bogus");
        assert!(!rec.success);
        assert!(rec.result.contains("network is unreachable"));
        assert_eq!(console.history().len(), COMMAND_HISTORY_CAP + 1);
        assert!(!console.in_flight());

        // a later success truncates again
        console.execute(&ok, "after").await;
        assert_eq!(console.history().len(), COMMAND_HISTORY_CAP);
    }

    #[test]
    fn seed_replaces_history() {
        let mut console = CommandConsole::new();
        console.seed(vec![CommandRecord {
            command: "old".into(),
            result: "r".into(),
            success: true,
            timestamp: "2024-01-01T00:00:00".into(),
        }]);
        assert_eq!(console.history().len(), 1);
        assert_eq!(console.history().front().unwrap().command, "old");
    }
}
