//! App state and main loop: input handling, live telemetry, command
//! submissions and drawing.

use std::{io, time::Duration};

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::Style,
    widgets::Block,
    Terminal,
};
use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::api::ApiClient;
use crate::commands::{fetch_history, CommandConsole, CommandOutcome, PendingCommand};
use crate::history::TimeSeriesBuffer;
use crate::store::ViewState;
use crate::types::{CommandRecord, TelemetryFrame, TelemetrySample};
use crate::ui::chart::draw_live_chart;
use crate::ui::commands::{draw_command_history, draw_command_input};
use crate::ui::header::draw_header;
use crate::ui::stats::draw_stats;
use crate::ui::status::{draw_recent, draw_status};
use crate::ui::theme::palette;
use crate::ui::View;
use crate::ws::{LiveClient, LiveStatus, WsConnector, RECONNECT_DELAY};

const TICK: Duration = Duration::from_millis(100);

// Reconnect delay override, read once per run
fn reconnect_delay() -> Duration {
    parse_reconnect_ms(std::env::var("AGENTDASH_RECONNECT_MS").ok().as_deref())
}

// Zero or garbage would redial in a tight loop; fall back to the default
fn parse_reconnect_ms(raw: Option<&str>) -> Duration {
    let Some(raw) = raw else {
        return RECONNECT_DELAY;
    };
    match raw.trim().parse::<u64>() {
        Ok(ms) if ms > 0 => Duration::from_millis(ms),
        _ => {
            warn!(value = raw, "ignoring AGENTDASH_RECONNECT_MS, using {RECONNECT_DELAY:?}");
            RECONNECT_DELAY
        }
    }
}

/// Results of background requests, applied on the UI loop.
#[derive(Debug)]
pub enum Inbound {
    Command(CommandOutcome),
    History(Vec<CommandRecord>),
    Stats(TelemetrySample),
}

/// What a key press asks the loop to do.
#[derive(Debug)]
pub enum Action {
    None,
    Quit,
    Submit(String),
}

pub struct App {
    api: ApiClient,
    history_limit: usize,

    view: View,
    store: ViewState,
    samples: TimeSeriesBuffer,
    live: LiveStatus,

    console: CommandConsole,
    pending: Option<PendingCommand>,
    input: String,
    history_scroll: usize,

    should_quit: bool,
}

impl App {
    pub fn new(api: ApiClient, history_limit: usize) -> Self {
        Self {
            api,
            history_limit,
            view: View::Dashboard,
            store: ViewState::new(),
            samples: TimeSeriesBuffer::new(),
            live: LiveStatus::default(),
            console: CommandConsole::new(),
            pending: None,
            input: String::new(),
            history_scroll: 0,
            should_quit: false,
        }
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn store(&self) -> &ViewState {
        &self.store
    }

    pub fn samples(&self) -> &TimeSeriesBuffer {
        &self.samples
    }

    pub fn console(&self) -> &CommandConsole {
        &self.console
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub async fn run(&mut self, url: &str) -> anyhow::Result<()> {
        let client = LiveClient::spawn_with_delay(url, WsConnector, reconnect_delay());
        let mut feed = client.subscribe();
        let (tx, mut rx) = mpsc::unbounded_channel();
        self.spawn_seed_requests(&tx);
        info!(url, api = %self.api.base(), "dashboard started");

        // Terminal setup
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;

        let res = self
            .event_loop(&mut terminal, &client, &mut feed, &tx, &mut rx)
            .await;

        // Teardown
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        feed.unsubscribe();
        client.shutdown().await;
        info!("dashboard stopped");
        res
    }

    // Initial history and stats; both are best effort and never block drawing
    fn spawn_seed_requests(&self, tx: &mpsc::UnboundedSender<Inbound>) {
        let api = self.api.clone();
        let limit = self.history_limit;
        let htx = tx.clone();
        tokio::spawn(async move {
            let _ = htx.send(Inbound::History(fetch_history(&api, limit).await));
        });

        let api = self.api.clone();
        let stx = tx.clone();
        tokio::spawn(async move {
            match api.system_stats().await {
                Ok(stats) => {
                    let _ = stx.send(Inbound::Stats(stats));
                }
                Err(e) => warn!("initial stats request failed: {e}"),
            }
        });
    }

    async fn event_loop<B: ratatui::backend::Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
        client: &LiveClient,
        feed: &mut crate::ws::Subscription,
        tx: &mpsc::UnboundedSender<Inbound>,
        rx: &mut mpsc::UnboundedReceiver<Inbound>,
    ) -> anyhow::Result<()> {
        loop {
            // Input (non-blocking)
            while event::poll(Duration::ZERO)? {
                if let Event::Key(k) = event::read()? {
                    match self.handle_key(k) {
                        Action::Quit => self.should_quit = true,
                        Action::Submit(text) => {
                            self.submit(&text, tx);
                        }
                        Action::None => {}
                    }
                }
            }
            if self.should_quit {
                break;
            }

            self.live = client.status();
            terminal.draw(|f| self.draw(f))?;

            tokio::select! {
                Some(frame) = feed.recv() => self.on_frame(frame),
                Some(msg) = rx.recv() => self.on_inbound(msg),
                _ = sleep(TICK) => {}
            }
        }
        Ok(())
    }

    pub fn handle_key(&mut self, k: KeyEvent) -> Action {
        if k.kind == KeyEventKind::Release {
            return Action::None;
        }
        let ctrl = k.modifiers.contains(KeyModifiers::CONTROL);
        match k.code {
            KeyCode::Char('c') if ctrl => return Action::Quit,
            KeyCode::Tab | KeyCode::BackTab => {
                self.view = self.view.next();
                return Action::None;
            }
            _ => {}
        }

        match self.view {
            View::Dashboard => match k.code {
                KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Action::Quit,
                KeyCode::Char('t') | KeyCode::Char('T') => {
                    self.store.toggle_theme();
                    Action::None
                }
                _ => Action::None,
            },
            View::Commands => match k.code {
                KeyCode::Char('t') if ctrl => {
                    self.store.toggle_theme();
                    Action::None
                }
                KeyCode::Esc => {
                    self.view = View::Dashboard;
                    Action::None
                }
                KeyCode::Enter => Action::Submit(self.input.clone()),
                KeyCode::Backspace => {
                    self.input.pop();
                    Action::None
                }
                KeyCode::Up => {
                    self.history_scroll = self.history_scroll.saturating_sub(1);
                    Action::None
                }
                KeyCode::Down => {
                    self.history_scroll = self.history_scroll.saturating_add(1);
                    Action::None
                }
                KeyCode::PageUp => {
                    self.history_scroll = self.history_scroll.saturating_sub(10);
                    Action::None
                }
                KeyCode::PageDown => {
                    self.history_scroll = self.history_scroll.saturating_add(10);
                    Action::None
                }
                KeyCode::Home => {
                    self.history_scroll = 0;
                    Action::None
                }
                KeyCode::Char(c) if !ctrl => {
                    self.input.push(c);
                    Action::None
                }
                _ => Action::None,
            },
        }
    }

    /// Start a submission; the request runs on its own task and its outcome
    /// comes back through `tx`. Blank input or a busy console is a no-op.
    pub fn submit(&mut self, text: &str, tx: &mpsc::UnboundedSender<Inbound>) -> bool {
        let Some(pending) = self.console.begin(text) else {
            return false;
        };
        self.input.clear();
        let api = self.api.clone();
        let command = pending.command().to_string();
        let tx = tx.clone();
        tokio::spawn(async move {
            let outcome = api.execute(&command).await;
            // receiver is gone once the app quit; the outcome is dropped
            let _ = tx.send(Inbound::Command(outcome));
        });
        self.pending = Some(pending);
        true
    }

    pub fn on_frame(&mut self, frame: TelemetryFrame) {
        self.store.set_system_stats(frame.data.clone());
        self.samples.append(frame.data);
    }

    pub fn on_inbound(&mut self, msg: Inbound) {
        match msg {
            Inbound::Command(outcome) => {
                let Some(pending) = self.pending.take() else {
                    return;
                };
                let record = self.console.complete(pending, outcome).clone();
                self.store.add_command_to_history(record);
                // view is left alone; the input keeps focus in the commands view
                self.history_scroll = 0;
            }
            Inbound::History(records) => self.console.seed(records),
            Inbound::Stats(stats) => {
                if self.store.system_stats().is_none() {
                    self.store.set_system_stats(stats);
                }
            }
        }
    }

    pub fn draw(&mut self, f: &mut ratatui::Frame<'_>) {
        let area = f.area();
        let p = palette(self.store.theme());
        f.render_widget(Block::default().style(Style::default().bg(p.bg).fg(p.fg)), area);

        // Root rows: header, body
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(2), Constraint::Min(0)])
            .split(area);
        draw_header(f, rows[0], self.view, &self.live, &p);

        match self.view {
            View::Dashboard => {
                let body = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([
                        Constraint::Length(3), // gauges
                        Constraint::Min(8),    // chart
                        Constraint::Length(7), // status + recent commands
                    ])
                    .split(rows[1]);
                draw_stats(f, body[0], self.store.system_stats(), &p);
                draw_live_chart(f, body[1], &self.samples, &p);

                let bottom = Layout::default()
                    .direction(Direction::Horizontal)
                    .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
                    .split(body[2]);
                draw_status(f, bottom[0], &self.live, self.api.base().as_str(), &p);
                draw_recent(f, bottom[1], self.store.command_history(), &p);
            }
            View::Commands => {
                let body = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([Constraint::Length(3), Constraint::Min(3)])
                    .split(rows[1]);
                draw_command_input(f, body[0], &self.input, self.console.in_flight(), &p);
                draw_command_history(
                    f,
                    body[1],
                    self.console.history(),
                    self.history_scroll,
                    &p,
                );
            }
        }
    }
}
