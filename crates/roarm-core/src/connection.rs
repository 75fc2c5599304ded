// ── Connection manager ──
//
// Owns the station-mode lifecycle of the arm link: association, bounded
// automatic retry, and operator disconnect/reconnect. The state machine is
// a plain value (`Lifecycle`); `ConnectionManager` wraps it with a station
// backend, an event loop task, and a watch channel for observers.

use std::fmt;
use std::net::IpAddr;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::station::{LinkEvent, Station, StationRequest};

// ── ConnectionState ──────────────────────────────────────────────

/// Link state observable by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected(IpAddr),
    /// Retry budget exhausted. Only an explicit reconnect leaves this state.
    Failed,
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected(_))
    }

    pub fn address(&self) -> Option<IpAddr> {
        match self {
            Self::Connected(addr) => Some(*addr),
            _ => None,
        }
    }

    /// `true` once `start()` has nothing left to wait for.
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Connected(_) | Self::Failed)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => f.write_str("disconnected"),
            Self::Connecting => f.write_str("connecting"),
            Self::Connected(addr) => write!(f, "connected ({addr})"),
            Self::Failed => f.write_str("failed"),
        }
    }
}

// ── Lifecycle ────────────────────────────────────────────────────

/// Link state machine with a bounded retry counter.
#[derive(Debug, Clone)]
pub struct Lifecycle {
    state: ConnectionState,
    retries: u32,
    max_retries: u32,
}

impl Lifecycle {
    pub fn new(max_retries: u32) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            retries: 0,
            max_retries,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Apply a backend event, returning the request the backend should act on.
    pub fn on_event(&mut self, event: &LinkEvent) -> Option<StationRequest> {
        match (event, self.state) {
            (LinkEvent::Started, ConnectionState::Disconnected) => {
                self.state = ConnectionState::Connecting;
                Some(StationRequest::Connect)
            }
            (
                LinkEvent::Disconnected { .. },
                ConnectionState::Connecting | ConnectionState::Connected(_),
            ) => {
                if self.retries < self.max_retries {
                    self.retries += 1;
                    self.state = ConnectionState::Connecting;
                    Some(StationRequest::Connect)
                } else {
                    self.state = ConnectionState::Failed;
                    None
                }
            }
            (
                LinkEvent::GotAddress(addr),
                ConnectionState::Connecting | ConnectionState::Connected(_),
            ) => {
                self.retries = 0;
                self.state = ConnectionState::Connected(*addr);
                None
            }
            // Late events after an operator disconnect or retry exhaustion.
            _ => None,
        }
    }

    /// Operator disconnect. Never followed by an automatic retry.
    pub fn request_disconnect(&mut self) -> Option<StationRequest> {
        if self.state == ConnectionState::Disconnected {
            return None;
        }
        self.state = ConnectionState::Disconnected;
        Some(StationRequest::Disconnect)
    }

    /// Operator reconnect from any state, with a fresh retry budget.
    pub fn request_reconnect(&mut self) -> StationRequest {
        self.retries = 0;
        self.state = ConnectionState::Connecting;
        StationRequest::Connect
    }
}

// ── ConnectionManager ────────────────────────────────────────────

/// Handle to the arm link. Cheaply cloneable.
#[derive(Clone)]
pub struct ConnectionManager {
    inner: Arc<ManagerInner>,
}

struct ManagerInner {
    station: Box<dyn Station>,
    lifecycle: Mutex<Lifecycle>,
    state_tx: watch::Sender<ConnectionState>,
    events_tx: mpsc::UnboundedSender<LinkEvent>,
    events_rx: Mutex<Option<mpsc::UnboundedReceiver<LinkEvent>>>,
    cancel: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl ConnectionManager {
    /// Create a manager around a station backend. Does NOT start it;
    /// call [`start()`](Self::start).
    pub fn new<S: Station>(station: S, max_retries: u32) -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            inner: Arc::new(ManagerInner {
                station: Box::new(station),
                lifecycle: Mutex::new(Lifecycle::new(max_retries)),
                state_tx,
                events_tx,
                events_rx: Mutex::new(Some(events_rx)),
                cancel: CancellationToken::new(),
                task: Mutex::new(None),
            }),
        }
    }

    /// Start association and wait until the link is `Connected` or `Failed`.
    ///
    /// Calling this again after the first start only waits.
    pub async fn start(&self) -> ConnectionState {
        let receiver = self
            .inner
            .events_rx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(rx) = receiver {
            let handle = tokio::spawn(event_loop(self.clone(), rx, self.inner.cancel.clone()));
            *self.inner.task.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
            self.inner.station.start(self.inner.events_tx.clone());
        }

        let mut rx = self.subscribe();
        match rx.wait_for(ConnectionState::is_settled).await {
            Ok(state) => *state,
            Err(_) => self.status(),
        }
    }

    /// Current state, without blocking.
    pub fn status(&self) -> ConnectionState {
        *self.inner.state_tx.borrow()
    }

    pub fn is_connected(&self) -> bool {
        self.status().is_connected()
    }

    /// Assigned address while connected.
    pub fn current_address(&self) -> Option<IpAddr> {
        self.status().address()
    }

    /// Consecutive failed attempts since the last success or reconnect.
    pub fn retry_count(&self) -> u32 {
        self.lock().retries()
    }

    pub fn max_retries(&self) -> u32 {
        self.lock().max_retries()
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state_tx.subscribe()
    }

    /// Drop the link. No automatic reconnect follows.
    pub fn disconnect(&self) {
        let request = {
            let mut lifecycle = self.lock();
            let request = lifecycle.request_disconnect();
            self.publish(lifecycle.state());
            request
        };
        info!("link disconnect requested");
        if let Some(request) = request {
            self.perform(request);
        }
    }

    /// Reset the retry budget and associate again, from any state.
    pub fn reconnect(&self) {
        let request = {
            let mut lifecycle = self.lock();
            let request = lifecycle.request_reconnect();
            self.publish(lifecycle.state());
            request
        };
        info!("link reconnect requested");
        self.perform(request);
    }

    /// Stop the event loop and the station backend.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        self.inner.station.shutdown();
        let handle = self
            .inner
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
        debug!("connection manager stopped");
    }

    // ── Internals ────────────────────────────────────────────────

    fn lock(&self) -> std::sync::MutexGuard<'_, Lifecycle> {
        self.inner
            .lifecycle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, state: ConnectionState) {
        self.inner.state_tx.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                *current = state;
                true
            }
        });
    }

    fn perform(&self, request: StationRequest) {
        match request {
            StationRequest::Connect => self.inner.station.connect(),
            StationRequest::Disconnect => self.inner.station.disconnect(),
        }
    }

    fn apply(&self, event: &LinkEvent) {
        let (request, before, state, retries) = {
            let mut lifecycle = self.lock();
            let before = lifecycle.state();
            let request = lifecycle.on_event(event);
            let state = lifecycle.state();
            self.publish(state);
            (request, before, state, lifecycle.retries())
        };

        match (event, state) {
            (LinkEvent::GotAddress(addr), ConnectionState::Connected(_)) if !before.is_connected() => {
                info!(address = %addr, "link up");
            }
            (LinkEvent::Disconnected { reason }, ConnectionState::Connecting) => {
                debug!(%reason, retries, "association failed, retrying");
            }
            (LinkEvent::Disconnected { reason }, ConnectionState::Failed)
                if before != ConnectionState::Failed =>
            {
                warn!(%reason, retries, "retry budget exhausted, link failed");
            }
            _ => debug!(?event, %state, "link event"),
        }

        if let Some(request) = request {
            self.perform(request);
        }
    }
}

/// Apply station events until cancelled.
async fn event_loop(
    manager: ConnectionManager,
    mut rx: mpsc::UnboundedReceiver<LinkEvent>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            event = rx.recv() => {
                let Some(event) = event else { break };
                manager.apply(&event);
            }
        }
    }
}

// ── Health logging ───────────────────────────────────────────────

/// Log the link state every `period` until cancelled. Read-only.
pub fn spawn_health_logger(
    manager: ConnectionManager,
    period: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                _ = interval.tick() => {
                    match manager.status() {
                        ConnectionState::Connected(addr) => {
                            info!(address = %addr, "link healthy");
                        }
                        state => {
                            warn!(%state, retries = manager.retry_count(), "link not connected");
                        }
                    }
                }
            }
        }
    })
}
