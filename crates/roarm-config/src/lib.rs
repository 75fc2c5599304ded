//! Shared configuration for the RoArm CLI and TUI.
//!
//! TOML file + `ROARM_*` environment, Wi-Fi passphrase resolution
//! (env → keyring → plaintext), and translation to
//! `roarm_core::LinkConfig`. Both binaries depend on this crate.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use roarm_core::config::{DEFAULT_DEVICE_HOST, DEFAULT_MAX_RETRIES, DEFAULT_PASSPHRASE, DEFAULT_SSID};
use roarm_core::config::check_passphrase;
use roarm_core::{LinkConfig, MotionProfile, StationConfig};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Keyring service name for stored passphrases.
pub const KEYRING_SERVICE: &str = "roarm";

/// Prefix for environment overrides. Nested keys split on `__`,
/// e.g. `ROARM_DEVICE__HOST`.
pub const ENV_PREFIX: &str = "ROARM_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("invalid Wi-Fi passphrase for '{ssid}': {reason}")]
    InvalidPassphrase { ssid: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration shared by CLI and TUI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub device: DeviceSection,

    #[serde(default)]
    pub station: StationSection,

    #[serde(default)]
    pub motion: MotionSection,

    #[serde(default)]
    pub ui: UiSection,
}

/// The arm's HTTP endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct DeviceSection {
    /// Address of the arm, optionally with a port.
    pub host: String,
    pub timeout_ms: u64,
    pub response_limit: usize,
}

impl Default for DeviceSection {
    fn default() -> Self {
        Self {
            host: DEFAULT_DEVICE_HOST.into(),
            timeout_ms: 5000,
            response_limit: 1024,
        }
    }
}

/// Wi-Fi station and link retry settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct StationSection {
    pub ssid: String,

    /// Plaintext passphrase. Prefer `passphrase_env` or the keyring.
    pub passphrase: Option<String>,

    /// Environment variable holding the passphrase.
    pub passphrase_env: Option<String>,

    pub max_retries: u32,
    pub probe_port: u16,
    pub probe_timeout_ms: u64,
    pub retry_backoff_ms: u64,
    pub keepalive_secs: u64,
}

impl Default for StationSection {
    fn default() -> Self {
        Self {
            ssid: DEFAULT_SSID.into(),
            passphrase: Some(DEFAULT_PASSPHRASE.into()),
            passphrase_env: None,
            max_retries: DEFAULT_MAX_RETRIES,
            probe_port: 80,
            probe_timeout_ms: 1500,
            retry_backoff_ms: 500,
            keepalive_secs: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct MotionSection {
    /// 0 lets the firmware choose.
    pub speed: u32,
    pub acceleration: u32,
}

impl Default for MotionSection {
    fn default() -> Self {
        let profile = MotionProfile::default();
        Self {
            speed: profile.speed,
            acceleration: profile.acceleration,
        }
    }
}

/// Tick periods for the terminal UI.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct UiSection {
    pub render_ms: u64,
    pub link_poll_ms: u64,
    pub status_ms: u64,
    pub health_log_secs: u64,
}

impl Default for UiSection {
    fn default() -> Self {
        Self {
            render_ms: 50,
            link_poll_ms: 1000,
            status_ms: 2000,
            health_log_secs: 10,
        }
    }
}

impl UiSection {
    pub fn render_interval(&self) -> Duration {
        Duration::from_millis(self.render_ms)
    }

    pub fn link_poll_interval(&self) -> Duration {
        Duration::from_millis(self.link_poll_ms)
    }

    pub fn status_interval(&self) -> Duration {
        Duration::from_millis(self.status_ms)
    }

    pub fn health_log_interval(&self) -> Duration {
        Duration::from_secs(self.health_log_secs)
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("org", "roarm", "roarm").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("roarm");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the default file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load defaults, then `path` (if it exists), then `ROARM_*` env vars.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    debug!(path = %path.display(), "loading config");
    let config: Config = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()?;
    Ok(config)
}

/// Load config, returning a default if loading fails.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve the Wi-Fi passphrase: env var → system keyring → plaintext.
///
/// `None` means an open network. A resolved key must pass the WPA2 rules.
pub fn resolve_passphrase(station: &StationSection) -> Result<Option<SecretString>, ConfigError> {
    let Some(secret) = lookup_passphrase(station) else {
        debug!(ssid = %station.ssid, "no passphrase, joining as open network");
        return Ok(None);
    };
    check_passphrase(&secret).map_err(|reason| ConfigError::InvalidPassphrase {
        ssid: station.ssid.clone(),
        reason,
    })?;
    Ok(Some(secret))
}

fn lookup_passphrase(station: &StationSection) -> Option<SecretString> {
    // 1. Named env var
    if let Some(ref env_name) = station.passphrase_env {
        if let Ok(val) = std::env::var(env_name) {
            return Some(SecretString::from(val));
        }
    }

    // 2. System keyring
    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &format!("{}/passphrase", station.ssid)) {
        if let Ok(secret) = entry.get_password() {
            return Some(SecretString::from(secret));
        }
    }

    // 3. Plaintext in config
    station
        .passphrase
        .as_ref()
        .map(|p| SecretString::from(p.clone()))
}

// ── Translation to core config ──────────────────────────────────────

fn nonzero(field: &str, value: u64) -> Result<u64, ConfigError> {
    if value == 0 {
        return Err(ConfigError::Validation {
            field: field.into(),
            reason: "must be greater than zero".into(),
        });
    }
    Ok(value)
}

/// Validate the file config and build a `LinkConfig`.
pub fn to_link_config(cfg: &Config) -> Result<LinkConfig, ConfigError> {
    let host = cfg.device.host.trim();
    if host.is_empty() {
        return Err(ConfigError::Validation {
            field: "device.host".into(),
            reason: "must not be empty".into(),
        });
    }
    if host.contains('/') {
        return Err(ConfigError::Validation {
            field: "device.host".into(),
            reason: format!("expected a host or host:port, got '{host}'"),
        });
    }
    if cfg.device.response_limit < 2 {
        return Err(ConfigError::Validation {
            field: "device.response_limit".into(),
            reason: "must be at least 2 bytes".into(),
        });
    }

    let station = &cfg.station;
    Ok(LinkConfig {
        device_host: host.to_owned(),
        request_timeout: Duration::from_millis(nonzero("device.timeout_ms", cfg.device.timeout_ms)?),
        response_limit: cfg.device.response_limit,
        station: StationConfig {
            ssid: station.ssid.clone(),
            passphrase: resolve_passphrase(station)?,
            max_retries: station.max_retries,
            probe_port: station.probe_port,
            probe_timeout: Duration::from_millis(nonzero(
                "station.probe_timeout_ms",
                station.probe_timeout_ms,
            )?),
            retry_backoff: Duration::from_millis(station.retry_backoff_ms),
            keepalive: Duration::from_secs(nonzero(
                "station.keepalive_secs",
                station.keepalive_secs,
            )?),
        },
        motion: MotionProfile {
            speed: cfg.motion.speed,
            acceleration: cfg.motion.acceleration,
        },
    })
}

/// Validate the UI tick periods.
pub fn validate_ui(ui: &UiSection) -> Result<(), ConfigError> {
    nonzero("ui.render_ms", ui.render_ms)?;
    nonzero("ui.link_poll_ms", ui.link_poll_ms)?;
    nonzero("ui.status_ms", ui.status_ms)?;
    nonzero("ui.health_log_secs", ui.health_log_secs)?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    use super::*;

    #[test]
    fn defaults_match_factory_arm() {
        let link = to_link_config(&Config::default()).unwrap();
        assert_eq!(link.device_host, "192.168.4.1");
        assert_eq!(link.request_timeout, Duration::from_millis(5000));
        assert_eq!(link.response_limit, 1024);
        assert_eq!(link.station.ssid, "RoArm-M2");
        assert_eq!(link.station.max_retries, 10);
        assert_eq!(link.motion, MotionProfile::default());
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[device]
host = "10.0.0.7:8080"
timeout_ms = 800

[station]
max_retries = 3

[motion]
speed = 200
"#,
        )
        .unwrap();

        let cfg = load_config_from(&path).unwrap();
        assert_eq!(cfg.device.host, "10.0.0.7:8080");
        assert_eq!(cfg.device.timeout_ms, 800);
        assert_eq!(cfg.device.response_limit, 1024);
        assert_eq!(cfg.station.max_retries, 3);
        assert_eq!(cfg.station.ssid, "RoArm-M2");
        assert_eq!(cfg.motion.speed, 200);
        assert_eq!(cfg.motion.acceleration, 10);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.ui, UiSection::default());
    }

    #[test]
    fn save_then_load_keeps_edits() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.device.host = "arm.local".into();
        cfg.ui.link_poll_ms = 750;
        save_config_to(&cfg, &path).unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.device.host, "arm.local");
        assert_eq!(loaded.ui.link_poll_ms, 750);
    }

    #[test]
    fn validation_rejects_bad_values() {
        let mut cfg = Config::default();
        cfg.device.host = "   ".into();
        assert!(matches!(
            to_link_config(&cfg),
            Err(ConfigError::Validation { ref field, .. }) if field == "device.host"
        ));

        let mut cfg = Config::default();
        cfg.device.host = "http://192.168.4.1".into();
        assert!(to_link_config(&cfg).is_err());

        let mut cfg = Config::default();
        cfg.device.timeout_ms = 0;
        assert!(to_link_config(&cfg).is_err());

        let mut cfg = Config::default();
        cfg.device.response_limit = 1;
        assert!(to_link_config(&cfg).is_err());

        let mut ui = UiSection::default();
        ui.status_ms = 0;
        assert!(validate_ui(&ui).is_err());
        assert!(validate_ui(&UiSection::default()).is_ok());
    }

    #[test]
    fn unset_env_falls_back_to_plaintext() {
        let station = StationSection {
            ssid: "roarm-test-no-keyring".into(),
            passphrase: Some("from-file-key".into()),
            passphrase_env: Some("ROARM_TEST_PASSPHRASE_UNSET".into()),
            ..StationSection::default()
        };
        let secret = resolve_passphrase(&station).unwrap().unwrap();
        assert_eq!(secret.expose_secret(), "from-file-key");
    }

    #[test]
    fn missing_passphrase_means_open_network() {
        let mut cfg = Config::default();
        cfg.station.ssid = "roarm-test-no-keyring".into();
        cfg.station.passphrase = None;
        cfg.station.passphrase_env = Some("ROARM_TEST_PASSPHRASE_UNSET".into());

        let link = to_link_config(&cfg).unwrap();
        assert!(link.station.passphrase.is_none());
    }

    #[test]
    fn short_passphrase_is_rejected() {
        let station = StationSection {
            ssid: "roarm-test-no-keyring".into(),
            passphrase: Some("1234".into()),
            passphrase_env: None,
            ..StationSection::default()
        };
        assert!(matches!(
            resolve_passphrase(&station),
            Err(ConfigError::InvalidPassphrase { ref reason, .. }) if reason.contains("8 to 63")
        ));
    }
}
