//! End-to-end checks of the probe station and control surface against
//! local listeners.
#![allow(clippy::unwrap_used)]

use std::net::{IpAddr, Ipv4Addr, TcpListener};
use std::time::Duration;

use secrecy::SecretString;

use roarm_core::{
    CommandResult, ConnectionManager, ConnectionState, ControlEvent, ControlId, ControlPanel,
    ControlSurface, LinkConfig, ProbeStation, StationConfig,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

fn fast_config(host: String, max_retries: u32) -> LinkConfig {
    LinkConfig {
        device_host: host,
        request_timeout: Duration::from_secs(2),
        station: StationConfig {
            max_retries,
            probe_timeout: Duration::from_millis(500),
            retry_backoff: Duration::from_millis(10),
            keepalive: Duration::from_secs(30),
            ..StationConfig::default()
        },
        ..LinkConfig::default()
    }
}

/// A port that nothing listens on.
fn closed_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

#[derive(Default)]
struct Panel {
    enabled: Option<bool>,
}

impl ControlPanel for Panel {
    fn set_controls_enabled(&mut self, enabled: bool) {
        self.enabled = Some(enabled);
    }
}

// ── ProbeStation ────────────────────────────────────────────────────

#[tokio::test]
async fn probe_connects_to_listening_device() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let config = fast_config(listener.local_addr().unwrap().to_string(), 3);

    let manager = ConnectionManager::new(ProbeStation::new(&config), 3);
    let state = manager.start().await;

    assert_eq!(
        state,
        ConnectionState::Connected(IpAddr::V4(Ipv4Addr::LOCALHOST))
    );
    assert_eq!(manager.retry_count(), 0);
    manager.shutdown().await;
}

#[tokio::test]
async fn probe_gives_up_after_retry_budget() {
    let config = fast_config(format!("127.0.0.1:{}", closed_port()), 2);

    let manager = ConnectionManager::new(ProbeStation::new(&config), 2);
    let state = tokio::time::timeout(Duration::from_secs(10), manager.start())
        .await
        .unwrap();

    assert_eq!(state, ConnectionState::Failed);
    assert_eq!(manager.retry_count(), 2);
    manager.shutdown().await;
}

#[tokio::test]
async fn invalid_passphrase_fails_every_attempt() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let mut config = fast_config(listener.local_addr().unwrap().to_string(), 1);
    config.station.passphrase = Some(SecretString::from("1234"));

    let manager = ConnectionManager::new(ProbeStation::new(&config), 1);
    let state = tokio::time::timeout(Duration::from_secs(5), manager.start())
        .await
        .unwrap();

    assert_eq!(state, ConnectionState::Failed);
    assert_eq!(manager.retry_count(), 1);
    manager.shutdown().await;
}

#[tokio::test]
async fn open_network_needs_no_passphrase() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let mut config = fast_config(listener.local_addr().unwrap().to_string(), 1);
    config.station.passphrase = None;

    let manager = ConnectionManager::new(ProbeStation::new(&config), 1);
    assert!(manager.start().await.is_connected());
    manager.shutdown().await;
}

// ── ProbeStation on a multi-thread runtime ──────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn start_settles_on_multi_thread_runtime() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let host = listener.local_addr().unwrap().to_string();

    for _ in 0..20 {
        let config = fast_config(host.clone(), 3);
        let manager = ConnectionManager::new(ProbeStation::new(&config), 3);
        let state = tokio::time::timeout(Duration::from_secs(3), manager.start())
            .await
            .expect("start() did not settle");

        assert_eq!(
            state,
            ConnectionState::Connected(IpAddr::V4(Ipv4Addr::LOCALHOST))
        );
        manager.shutdown().await;
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn operator_disconnect_stops_keepalive_and_retries() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let mut config = fast_config(listener.local_addr().unwrap().to_string(), 3);
    config.station.keepalive = Duration::from_millis(50);

    let manager = ConnectionManager::new(ProbeStation::new(&config), 3);
    assert!(manager.start().await.is_connected());

    manager.disconnect();
    drop(listener);
    tokio::time::sleep(Duration::from_millis(300)).await;

    assert_eq!(manager.status(), ConnectionState::Disconnected);
    assert_eq!(manager.retry_count(), 0);
    manager.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn disconnect_during_attempt_wins() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let config = fast_config(listener.local_addr().unwrap().to_string(), 3);
    let manager = ConnectionManager::new(ProbeStation::new(&config), 3);

    let mut rx = manager.subscribe();
    let starter = tokio::spawn({
        let manager = manager.clone();
        async move { manager.start().await }
    });
    tokio::time::timeout(
        Duration::from_secs(3),
        rx.wait_for(|s| *s != ConnectionState::Disconnected),
    )
    .await
    .unwrap()
    .unwrap();

    manager.disconnect();
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(manager.status(), ConnectionState::Disconnected);
    starter.abort();
    manager.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn reconnect_recovers_after_disconnect() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let config = fast_config(listener.local_addr().unwrap().to_string(), 3);
    let manager = ConnectionManager::new(ProbeStation::new(&config), 3);
    assert!(manager.start().await.is_connected());

    manager.disconnect();
    let mut rx = manager.subscribe();
    manager.reconnect();
    let settled = tokio::time::timeout(
        Duration::from_secs(3),
        rx.wait_for(ConnectionState::is_settled),
    )
    .await
    .unwrap();
    let state = *settled.unwrap();

    assert!(state.is_connected());
    assert_eq!(manager.retry_count(), 0);
    manager.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn reconnect_leaves_failed_once_device_appears() {
    let port = closed_port();
    let config = fast_config(format!("127.0.0.1:{port}"), 1);
    let manager = ConnectionManager::new(ProbeStation::new(&config), 1);
    assert_eq!(manager.start().await, ConnectionState::Failed);

    let _listener = TcpListener::bind(("127.0.0.1", port)).unwrap();
    let mut rx = manager.subscribe();
    manager.reconnect();
    let settled = tokio::time::timeout(
        Duration::from_secs(3),
        rx.wait_for(ConnectionState::is_settled),
    )
    .await
    .unwrap();
    let state = *settled.unwrap();

    assert!(state.is_connected());
    manager.shutdown().await;
}

// ── ControlSurface ──────────────────────────────────────────────────

#[tokio::test]
async fn surface_arms_and_moves_against_http_device() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/js"))
        .and(query_param("json", r#"{"T":210,"cmd":1}"#))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/js"))
        .and(query_param("json", r#"{"T":101,"joint":2,"rad":0.60,"spd":0,"acc":10}"#))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"T":1051}"#))
        .expect(1)
        .mount(&server)
        .await;

    let config = fast_config(server.address().to_string(), 3);
    let mut surface = ControlSurface::from_config(&config).unwrap();
    let mut panel = Panel::default();

    assert!(surface.link().start().await.is_connected());
    assert!(surface.on_link_tick(&mut panel).await.is_connected());
    assert_eq!(panel.enabled, Some(true));

    let result = surface
        .handle(ControlEvent::slider(ControlId::ShoulderSlider, 50))
        .await
        .unwrap();
    assert_eq!(result, CommandResult::Ok);

    surface.link().shutdown().await;
}

#[tokio::test]
async fn surface_reports_device_errors() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/js"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let config = fast_config(server.address().to_string(), 3);
    let mut surface = ControlSurface::from_config(&config).unwrap();

    surface.link().start().await;
    surface.on_link_tick(&mut Panel::default()).await;

    assert_eq!(surface.home().await, CommandResult::TransportError);
    surface.link().shutdown().await;
}

#[test]
fn empty_host_is_rejected() {
    let config = fast_config("  ".into(), 1);
    assert!(ControlSurface::from_config(&config).is_err());
}
