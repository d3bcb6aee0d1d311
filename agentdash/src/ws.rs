//! Live telemetry client: a WebSocket connection that the server pushes
//! samples over, reconnected on a fixed delay after every close.
//!
//! The lifecycle lives in [`ConnectionMachine`], a synchronous state machine
//! fed with transport events. [`LiveClient`] drives it on a tokio task,
//! publishes the status on a watch channel and hands decoded frames to
//! explicit subscribers in arrival order.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures_util::StreamExt;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use crate::types::TelemetryFrame;

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Fixed delay between a close and the next connection attempt.
pub const RECONNECT_DELAY: Duration = Duration::from_millis(3000);

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("websocket error: {0}")]
    Ws(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("{0}")]
    Other(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connected,
    Error,
}

/// What consumers observe about the connection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LiveStatus {
    pub state: ConnectionState,
    /// Last frame that decoded successfully.
    pub latest: Option<TelemetryFrame>,
    pub last_error: Option<String>,
    pub connect_attempts: u64,
}

impl LiveStatus {
    pub fn connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LinkEvent {
    Connecting,
    Opened,
    Text(String),
    TransportError(String),
    Closed,
}

/// What the driver must do after an event.
#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    Idle,
    Publish,
    Deliver(TelemetryFrame),
    Reconnect(Duration),
}

#[derive(Debug)]
pub struct ConnectionMachine {
    status: LiveStatus,
    reconnect_delay: Duration,
    reconnect_pending: bool,
    torn_down: bool,
}

impl ConnectionMachine {
    pub fn new(reconnect_delay: Duration) -> Self {
        Self {
            status: LiveStatus::default(),
            reconnect_delay,
            reconnect_pending: false,
            torn_down: false,
        }
    }

    pub fn status(&self) -> &LiveStatus {
        &self.status
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    pub fn apply(&mut self, ev: LinkEvent) -> Directive {
        if self.torn_down {
            return Directive::Idle;
        }
        match ev {
            LinkEvent::Connecting => {
                self.reconnect_pending = false;
                self.status.connect_attempts += 1;
                Directive::Publish
            }
            LinkEvent::Opened => {
                self.status.state = ConnectionState::Connected;
                self.status.last_error = None;
                Directive::Publish
            }
            LinkEvent::Text(text) => match serde_json::from_str::<TelemetryFrame>(&text) {
                Ok(frame) => {
                    self.status.latest = Some(frame.clone());
                    Directive::Deliver(frame)
                }
                Err(e) => {
                    warn!("dropping malformed telemetry frame: {e}");
                    Directive::Idle
                }
            },
            // Closure is reported separately; connected flag stays as is.
            LinkEvent::TransportError(msg) => {
                self.status.last_error = Some(msg);
                Directive::Publish
            }
            LinkEvent::Closed => {
                self.status.state = if self.status.last_error.is_some() {
                    ConnectionState::Error
                } else {
                    ConnectionState::Disconnected
                };
                if self.reconnect_pending {
                    // one pending attempt per close
                    return Directive::Publish;
                }
                self.reconnect_pending = true;
                Directive::Reconnect(self.reconnect_delay)
            }
        }
    }

    /// Terminal: no event yields a reconnect afterwards.
    pub fn teardown(&mut self) {
        self.torn_down = true;
        self.reconnect_pending = false;
        if self.status.state == ConnectionState::Connected {
            self.status.state = ConnectionState::Disconnected;
        }
    }
}

/// An open connection yielding text frames.
pub trait Link: Send {
    /// `None` once the peer closed; `Some(Err(_))` on a transport failure.
    fn next_text(&mut self) -> impl Future<Output = Option<Result<String, LinkError>>> + Send;
    fn close(&mut self) -> impl Future<Output = ()> + Send;
}

pub trait Connector: Send + Sync + 'static {
    type Link: Link + 'static;
    fn connect(&self, url: &str) -> impl Future<Output = Result<Self::Link, LinkError>> + Send;
}

// Connect to the telemetry endpoint and return the WS stream
pub async fn connect(url: &str) -> Result<WsStream, LinkError> {
    let (ws, _) = connect_async(url).await?;
    Ok(ws)
}

pub struct WsLink(WsStream);

impl Link for WsLink {
    async fn next_text(&mut self) -> Option<Result<String, LinkError>> {
        loop {
            match self.0.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(text)),
                Ok(Message::Binary(b)) => {
                    debug!(len = b.len(), "skipping binary frame");
                    continue;
                }
                Ok(Message::Close(_)) => return None,
                // ping/pong are answered by tungstenite
                Ok(_) => continue,
                Err(e) => return Some(Err(e.into())),
            }
        }
    }

    async fn close(&mut self) {
        let _ = self.0.close(None).await;
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

impl Connector for WsConnector {
    type Link = WsLink;

    async fn connect(&self, url: &str) -> Result<WsLink, LinkError> {
        Ok(WsLink(connect(url).await?))
    }
}

type Subscribers = Arc<Mutex<Vec<(u64, mpsc::UnboundedSender<TelemetryFrame>)>>>;

#[derive(Default, Clone)]
struct Registry {
    subs: Subscribers,
    next_id: Arc<Mutex<u64>>,
}

impl Registry {
    fn add(&self) -> (u64, mpsc::UnboundedReceiver<TelemetryFrame>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = {
            let mut n = self.next_id.lock().unwrap_or_else(PoisonError::into_inner);
            *n += 1;
            *n
        };
        self.subs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, tx));
        (id, rx)
    }

    fn remove(&self, id: u64) {
        self.subs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|(sid, _)| *sid != id);
    }

    fn deliver(&self, frame: &TelemetryFrame) {
        self.subs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|(_, tx)| tx.send(frame.clone()).is_ok());
    }

    fn clear(&self) {
        self.subs.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

/// Ordered feed of decoded frames. Dropping it (or calling
/// [`Subscription::unsubscribe`]) stops delivery.
pub struct Subscription {
    id: u64,
    rx: mpsc::UnboundedReceiver<TelemetryFrame>,
    registry: Registry,
}

impl Subscription {
    /// Next frame; `None` after the client shut down and the feed drained.
    pub async fn recv(&mut self) -> Option<TelemetryFrame> {
        self.rx.recv().await
    }

    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.registry.remove(self.id);
    }
}

pub struct LiveClient {
    status_rx: watch::Receiver<LiveStatus>,
    registry: Registry,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl LiveClient {
    pub fn spawn<C: Connector>(url: impl Into<String>, connector: C) -> Self {
        Self::spawn_with_delay(url, connector, RECONNECT_DELAY)
    }

    pub fn spawn_with_delay<C: Connector>(
        url: impl Into<String>,
        connector: C,
        reconnect_delay: Duration,
    ) -> Self {
        let (status_tx, status_rx) = watch::channel(LiveStatus::default());
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let registry = Registry::default();
        let driver = Driver {
            url: url.into(),
            connector,
            machine: ConnectionMachine::new(reconnect_delay),
            status_tx,
            registry: registry.clone(),
        };
        let task = tokio::spawn(driver.run(shutdown_rx));
        Self {
            status_rx,
            registry,
            shutdown: Some(shutdown_tx),
            task: Some(task),
        }
    }

    pub fn status(&self) -> LiveStatus {
        self.status_rx.borrow().clone()
    }

    pub fn watch_status(&self) -> watch::Receiver<LiveStatus> {
        self.status_rx.clone()
    }

    pub fn subscribe(&self) -> Subscription {
        let (id, rx) = self.registry.add();
        Subscription {
            id,
            rx,
            registry: self.registry.clone(),
        }
    }

    /// Cancel any pending reconnect, close the active connection and wait
    /// for the driver task to finish.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for LiveClient {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

struct Driver<C: Connector> {
    url: String,
    connector: C,
    machine: ConnectionMachine,
    status_tx: watch::Sender<LiveStatus>,
    registry: Registry,
}

impl<C: Connector> Driver<C> {
    fn step(&mut self, ev: LinkEvent) -> Directive {
        let d = self.machine.apply(ev);
        match &d {
            Directive::Idle => {}
            Directive::Deliver(frame) => {
                self.registry.deliver(frame);
                self.publish();
            }
            Directive::Publish | Directive::Reconnect(_) => self.publish(),
        }
        d
    }

    fn publish(&self) {
        self.status_tx.send_replace(self.machine.status().clone());
    }

    fn finish(&mut self) {
        self.machine.teardown();
        self.publish();
        self.registry.clear();
        debug!(url = %self.url, "live client torn down");
    }

    // Resolves on explicit shutdown or when the LiveClient is dropped
    async fn run(mut self, mut shutdown: oneshot::Receiver<()>) {
        loop {
            self.step(LinkEvent::Connecting);
            let attempt = tokio::select! {
                _ = &mut shutdown => return self.finish(),
                res = self.connector.connect(&self.url) => res,
            };
            match attempt {
                Ok(mut link) => {
                    info!(url = %self.url, "telemetry socket connected");
                    self.step(LinkEvent::Opened);
                    loop {
                        let next = tokio::select! {
                            _ = &mut shutdown => {
                                link.close().await;
                                return self.finish();
                            }
                            next = link.next_text() => next,
                        };
                        match next {
                            Some(Ok(text)) => {
                                self.step(LinkEvent::Text(text));
                            }
                            Some(Err(e)) => {
                                warn!(url = %self.url, "telemetry socket error: {e}");
                                self.step(LinkEvent::TransportError(e.to_string()));
                                break;
                            }
                            None => break,
                        }
                    }
                    info!(url = %self.url, "telemetry socket disconnected");
                }
                Err(e) => {
                    warn!(url = %self.url, "telemetry connect failed: {e}");
                    self.step(LinkEvent::TransportError(e.to_string()));
                }
            }

            if let Directive::Reconnect(delay) = self.step(LinkEvent::Closed) {
                debug!(url = %self.url, ?delay, "reconnect scheduled");
                tokio::select! {
                    _ = &mut shutdown => return self.finish(),
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }
    }
}
