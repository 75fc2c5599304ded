// ── Station backend ──
//
// The radio side of the link. A `Station` turns connect/disconnect
// requests into asynchronous `LinkEvent`s; the connection manager owns the
// state machine and decides when to ask for another attempt.

use std::net::IpAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::config::{LinkConfig, check_passphrase};

/// Event reported by a station backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// The backend is up and ready to associate.
    Started,
    /// An association attempt failed or an established link dropped.
    Disconnected { reason: String },
    /// The link is up and this address was assigned.
    GotAddress(IpAddr),
}

/// What the state machine asks the backend to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StationRequest {
    Connect,
    Disconnect,
}

/// Association backend.
///
/// Methods never block; outcomes arrive later on the channel handed to
/// [`start`](Station::start).
pub trait Station: Send + Sync + 'static {
    /// Bring the backend up. Must eventually send [`LinkEvent::Started`].
    fn start(&self, events: mpsc::UnboundedSender<LinkEvent>);

    /// Begin one association attempt.
    fn connect(&self);

    /// Drop the link. Results of in-flight attempts are discarded.
    fn disconnect(&self);

    /// Stop all background work.
    fn shutdown(&self) {}
}

// ── ProbeStation ─────────────────────────────────────────────────

/// Station that treats TCP reachability of the arm as association.
///
/// A connect attempt opens a TCP connection to the device; success reports
/// the local address of that connection as the acquired address. While up,
/// the device is re-probed every `keepalive` and a failed probe reports
/// link loss. A configured passphrase must pass the WPA2 key rules or every
/// attempt is rejected before any probe.
#[derive(Clone)]
pub struct ProbeStation {
    inner: Arc<ProbeInner>,
}

struct ProbeInner {
    ssid: String,
    secured: bool,
    /// Outcome of the pre-shared key check; an invalid key fails every attempt.
    auth: Result<(), String>,
    target: String,
    probe_timeout: Duration,
    retry_backoff: Duration,
    keepalive: Duration,
    /// Bumped on every connect/disconnect; stale probes compare and bail.
    generation: AtomicU64,
    link: Mutex<Option<ProbeLink>>,
    cancel: CancellationToken,
}

struct ProbeLink {
    events: mpsc::UnboundedSender<LinkEvent>,
    runtime: Handle,
}

impl ProbeStation {
    pub fn new(config: &LinkConfig) -> Self {
        Self {
            inner: Arc::new(ProbeInner {
                ssid: config.station.ssid.clone(),
                secured: config.station.passphrase.is_some(),
                auth: config
                    .station
                    .passphrase
                    .as_ref()
                    .map_or(Ok(()), check_passphrase),
                target: config.probe_target(),
                probe_timeout: config.station.probe_timeout,
                retry_backoff: config.station.retry_backoff,
                keepalive: config.station.keepalive,
                generation: AtomicU64::new(0),
                link: Mutex::new(None),
                cancel: CancellationToken::new(),
            }),
        }
    }

    /// `host:port` probed on each attempt.
    pub fn target(&self) -> &str {
        &self.inner.target
    }
}

impl Station for ProbeStation {
    fn start(&self, events: mpsc::UnboundedSender<LinkEvent>) {
        let runtime = match Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                warn!(error = %e, "station started outside an async runtime");
                let _ = events.send(LinkEvent::Disconnected {
                    reason: "no async runtime".into(),
                });
                return;
            }
        };
        info!(
            ssid = %self.inner.ssid,
            secured = self.inner.secured,
            target = %self.inner.target,
            "station started"
        );
        if let Err(reason) = &self.inner.auth {
            warn!(ssid = %self.inner.ssid, %reason, "passphrase invalid, association will fail");
        }
        // The link must be in place before `Started` reaches the state
        // machine, which answers it with an immediate `connect()`.
        *self
            .inner
            .link
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(ProbeLink {
            events: events.clone(),
            runtime,
        });
        let _ = events.send(LinkEvent::Started);
    }

    fn connect(&self) {
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let guard = self.inner.link.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(link) = guard.as_ref() else {
            debug!("connect requested before station start");
            return;
        };
        let inner = Arc::clone(&self.inner);
        let events = link.events.clone();
        link.runtime
            .spawn(async move { probe_task(inner, generation, events).await });
    }

    fn disconnect(&self) {
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        debug!(target = %self.inner.target, "station link dropped");
    }

    fn shutdown(&self) {
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        self.inner.cancel.cancel();
    }
}

impl ProbeInner {
    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    async fn probe(&self) -> Result<IpAddr, String> {
        match tokio::time::timeout(self.probe_timeout, TcpStream::connect(&self.target)).await {
            Ok(Ok(stream)) => stream
                .local_addr()
                .map(|addr| addr.ip())
                .map_err(|e| e.to_string()),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err(format!(
                "no answer within {}ms",
                self.probe_timeout.as_millis()
            )),
        }
    }
}

async fn probe_task(
    inner: Arc<ProbeInner>,
    generation: u64,
    events: mpsc::UnboundedSender<LinkEvent>,
) {
    let cancel = inner.cancel.clone();

    let address = match &inner.auth {
        Err(reason) => Err(format!("association rejected: {reason}")),
        Ok(()) => tokio::select! {
            biased;
            () = cancel.cancelled() => return,
            result = inner.probe() => result,
        },
    };

    let address = match address {
        Ok(address) => address,
        Err(reason) => {
            trace!(%reason, target = %inner.target, "probe failed");
            tokio::select! {
                biased;
                () = cancel.cancelled() => return,
                () = tokio::time::sleep(inner.retry_backoff) => {}
            }
            if inner.is_current(generation) {
                let _ = events.send(LinkEvent::Disconnected { reason });
            }
            return;
        }
    };

    if !inner.is_current(generation) {
        return;
    }
    let _ = events.send(LinkEvent::GotAddress(address));

    let mut keepalive = tokio::time::interval(inner.keepalive);
    keepalive.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    keepalive.tick().await;

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = keepalive.tick() => {
                if !inner.is_current(generation) {
                    break;
                }
                if let Err(reason) = inner.probe().await {
                    if inner.is_current(generation) {
                        warn!(%reason, target = %inner.target, "link lost");
                        let _ = events.send(LinkEvent::Disconnected { reason });
                    }
                    break;
                }
            }
        }
    }
}
