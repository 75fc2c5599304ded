// ── Runtime link configuration ──
//
// Everything the core needs to reach one arm. Built by the config crate
// (or directly by tests) and handed in; nothing here touches disk.

use std::net::{IpAddr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use roarm_api::TransportConfig;
use roarm_api::transport::{DEFAULT_RESPONSE_LIMIT, DEFAULT_TIMEOUT};
use secrecy::{ExposeSecret, SecretString};

use crate::command::MotionProfile;

/// Access point the arm brings up out of the box.
pub const DEFAULT_SSID: &str = "RoArm-M2";
pub const DEFAULT_PASSPHRASE: &str = "12345678";
/// The arm's own address on its access point.
pub const DEFAULT_DEVICE_HOST: &str = "192.168.4.1";
pub const DEFAULT_MAX_RETRIES: u32 = 10;

/// Station (association) settings.
#[derive(Debug, Clone)]
pub struct StationConfig {
    pub ssid: String,
    /// WPA2 pre-shared key. `None` joins an open network.
    pub passphrase: Option<SecretString>,
    /// Automatic reconnect attempts before the link is declared failed.
    pub max_retries: u32,
    /// TCP port probed when the device host carries none.
    pub probe_port: u16,
    pub probe_timeout: Duration,
    /// Pause between a failed probe and its report.
    pub retry_backoff: Duration,
    /// Re-probe period while connected.
    pub keepalive: Duration,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            ssid: DEFAULT_SSID.into(),
            passphrase: Some(SecretString::from(DEFAULT_PASSPHRASE)),
            max_retries: DEFAULT_MAX_RETRIES,
            probe_port: 80,
            probe_timeout: Duration::from_millis(1500),
            retry_backoff: Duration::from_millis(500),
            keepalive: Duration::from_secs(5),
        }
    }
}

/// Check a WPA2 pre-shared key: 8 to 63 printable ASCII characters, or
/// exactly 64 hex digits.
pub fn check_passphrase(passphrase: &SecretString) -> Result<(), String> {
    let key = passphrase.expose_secret();
    if key.len() == 64 {
        return if key.bytes().all(|b| b.is_ascii_hexdigit()) {
            Ok(())
        } else {
            Err("a 64-character key must be hex".into())
        };
    }
    if !(8..=63).contains(&key.len()) {
        return Err(format!("must be 8 to 63 characters, got {}", key.len()));
    }
    if !key.bytes().all(|b| (b' '..=b'~').contains(&b)) {
        return Err("must be printable ASCII".into());
    }
    Ok(())
}

/// Configuration for one arm link.
#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// Address (optionally `host:port`) of the arm's HTTP endpoint.
    pub device_host: String,
    pub request_timeout: Duration,
    /// Bytes of each response kept.
    pub response_limit: usize,
    pub station: StationConfig,
    pub motion: MotionProfile,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            device_host: DEFAULT_DEVICE_HOST.into(),
            request_timeout: DEFAULT_TIMEOUT,
            response_limit: DEFAULT_RESPONSE_LIMIT,
            station: StationConfig::default(),
            motion: MotionProfile::default(),
        }
    }
}

impl LinkConfig {
    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            timeout: self.request_timeout,
            response_limit: self.response_limit,
        }
    }

    /// Device host as a URL authority. Bare IPv6 addresses get brackets.
    pub fn authority(&self) -> String {
        let host = self.device_host.trim();
        match host.parse::<Ipv6Addr>() {
            Ok(ip) => format!("[{ip}]"),
            Err(_) => host.to_owned(),
        }
    }

    /// `host:port` for reachability probes.
    pub fn probe_target(&self) -> String {
        let host = self.device_host.trim();
        if host.parse::<SocketAddr>().is_ok() {
            return host.to_owned();
        }
        let bare = host.trim_start_matches('[').trim_end_matches(']');
        if let Ok(ip) = bare.parse::<IpAddr>() {
            return SocketAddr::new(ip, self.station.probe_port).to_string();
        }
        if host.contains(':') {
            host.to_owned()
        } else {
            format!("{host}:{}", self.station.probe_port)
        }
    }
}
