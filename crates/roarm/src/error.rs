//! CLI error types with miette diagnostics.
//!
//! Maps core and config errors into user-facing errors with actionable
//! help text and stable exit codes.

use miette::Diagnostic;
use roarm_config::ConfigError;
use roarm_core::CoreError;
use thiserror::Error;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const CREDENTIALS: i32 = 3;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
    pub const DEVICE: i32 = 9;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Link ─────────────────────────────────────────────────────────
    #[error("Arm at {host} is not connected (link {state})")]
    #[diagnostic(
        code(roarm::not_connected),
        help(
            "Check that the arm is powered and this machine is on its Wi-Fi network.\n\
             Try: roarm status -v"
        )
    )]
    NotConnected { host: String, state: String },

    #[error("Could not reach arm: {reason}")]
    #[diagnostic(code(roarm::connection_failed))]
    ConnectionFailed { reason: String },

    // ── Device ───────────────────────────────────────────────────────
    #[error("Arm did not acknowledge '{command}'")]
    #[diagnostic(
        code(roarm::command_failed),
        help("The request failed, timed out, or got a non-2xx answer. Re-run with -vv for details.")
    )]
    CommandFailed { command: String },

    #[error("Request timed out after {ms}ms")]
    #[diagnostic(
        code(roarm::timeout),
        help("Increase timeout with --timeout or check the arm's responsiveness.")
    )]
    Timeout { ms: u64 },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(roarm::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Invalid Wi-Fi passphrase for '{ssid}': {reason}")]
    #[diagnostic(
        code(roarm::invalid_passphrase),
        help(
            "Fix station.passphrase_env, station.passphrase, or the keyring entry\n\
             under service 'roarm', user '{ssid}/passphrase'. Leave all unset for an open network."
        )
    )]
    InvalidPassphrase { ssid: String, reason: String },

    #[error("Configuration file already exists at {path}")]
    #[diagnostic(code(roarm::config_exists), help("Use --force to overwrite it."))]
    ConfigExists { path: String },

    #[error("Configuration error: {message}")]
    #[diagnostic(code(roarm::config))]
    Config { message: String },

    // ── IO / Serialization ────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render output: {0}")]
    #[diagnostic(code(roarm::json))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NotConnected { .. } | Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::CommandFailed { .. } => exit_code::DEVICE,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } | Self::ConfigExists { .. } => exit_code::USAGE,
            Self::InvalidPassphrase { .. } => exit_code::CREDENTIALS,
            Self::Config { .. } | Self::Io(_) | Self::Json(_) => exit_code::GENERAL,
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::InvalidPassphrase { ssid, reason } => {
                CliError::InvalidPassphrase { ssid, reason }
            }
            ConfigError::Io(e) => CliError::Io(e),
            other => CliError::Config {
                message: other.to_string(),
            },
        }
    }
}

impl From<toml::ser::Error> for CliError {
    fn from(err: toml::ser::Error) -> Self {
        CliError::Config {
            message: format!("failed to serialize config: {err}"),
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { reason } => CliError::ConnectionFailed { reason },
            CoreError::Timeout { timeout_ms } => CliError::Timeout { ms: timeout_ms },
            CoreError::Device { status } => CliError::CommandFailed {
                command: format!("HTTP {status}"),
            },
            CoreError::ControlMismatch { control, expected } => CliError::Validation {
                field: control.to_string(),
                reason: format!("expected a {expected} value"),
            },
            CoreError::UnboundControl { control } => CliError::Validation {
                field: control.to_string(),
                reason: "no binding registered".into(),
            },
            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },
            CoreError::Internal(message) => CliError::Config { message },
        }
    }
}
