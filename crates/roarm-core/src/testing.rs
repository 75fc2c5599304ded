//! Fakes shared by the unit tests.

use std::collections::VecDeque;
use std::future::Future;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use roarm_api::{ArmReply, ResponseBuffer};
use tokio::sync::mpsc;
use url::Url;

use crate::channel::CommandTransport;
use crate::connection::ConnectionManager;
use crate::station::{LinkEvent, Station};

pub const TEST_ADDR: IpAddr = IpAddr::V4(Ipv4Addr::new(192, 168, 4, 2));

// ── ScriptedStation ──────────────────────────────────────────────

/// Station that answers each connect with the next scripted event.
#[derive(Clone, Default)]
pub struct ScriptedStation {
    inner: Arc<ScriptedInner>,
}

#[derive(Default)]
struct ScriptedInner {
    script: Mutex<VecDeque<LinkEvent>>,
    events: Mutex<Option<mpsc::UnboundedSender<LinkEvent>>>,
    connects: AtomicUsize,
    disconnects: AtomicUsize,
}

impl ScriptedStation {
    pub fn new(script: Vec<LinkEvent>) -> Self {
        let station = Self::default();
        *station.inner.script.lock().unwrap() = script.into();
        station
    }

    pub fn connects(&self) -> usize {
        self.inner.connects.load(Ordering::SeqCst)
    }

    pub fn disconnects(&self) -> usize {
        self.inner.disconnects.load(Ordering::SeqCst)
    }
}

impl Station for ScriptedStation {
    fn start(&self, events: mpsc::UnboundedSender<LinkEvent>) {
        events.send(LinkEvent::Started).unwrap();
        *self.inner.events.lock().unwrap() = Some(events);
    }

    fn connect(&self) {
        self.inner.connects.fetch_add(1, Ordering::SeqCst);
        let next = self.inner.script.lock().unwrap().pop_front();
        if let (Some(event), Some(tx)) = (next, self.inner.events.lock().unwrap().as_ref()) {
            let _ = tx.send(event);
        }
    }

    fn disconnect(&self) {
        self.inner.disconnects.fetch_add(1, Ordering::SeqCst);
    }
}

/// A started manager that is already `Connected`.
pub async fn connected_manager() -> ConnectionManager {
    let manager = ConnectionManager::new(
        ScriptedStation::new(vec![LinkEvent::GotAddress(TEST_ADDR)]),
        10,
    );
    assert!(manager.start().await.is_connected());
    manager
}

// ── CountingTransport ────────────────────────────────────────────

/// Transport that records every request and answers with a fixed status.
#[derive(Default)]
pub struct CountingTransport {
    status: Option<u16>,
    calls: AtomicUsize,
    urls: Mutex<Vec<Url>>,
}

impl CountingTransport {
    pub fn new(status: u16) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Every request times out.
    pub fn failing() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn urls(&self) -> Vec<Url> {
        self.urls.lock().unwrap().clone()
    }
}

impl CommandTransport for CountingTransport {
    fn get(&self, url: Url) -> impl Future<Output = Result<ArmReply, roarm_api::Error>> + Send {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.urls.lock().unwrap().push(url);
        let result = match self.status {
            Some(status) => Ok(ArmReply {
                status,
                body: ResponseBuffer::new(1024),
            }),
            None => Err(roarm_api::Error::Timeout { timeout_ms: 5000 }),
        };
        std::future::ready(result)
    }
}
