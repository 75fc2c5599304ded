// ── Core error types ──
//
// Errors surfaced by roarm-core. Command dispatch never fails with one of
// these: its outcome is a `CommandResult`. They cover setup and misuse of
// the control surface.

use thiserror::Error;

use crate::surface::ControlId;

#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach arm: {reason}")]
    ConnectionFailed { reason: String },

    #[error("Request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Arm rejected request with HTTP {status}")]
    Device { status: u16 },

    // ── Control errors ───────────────────────────────────────────────
    #[error("Control {control} expects a {expected} value")]
    ControlMismatch {
        control: ControlId,
        expected: &'static str,
    },

    #[error("No binding registered for control {control}")]
    UnboundControl { control: ControlId },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<roarm_api::Error> for CoreError {
    fn from(err: roarm_api::Error) -> Self {
        match err {
            roarm_api::Error::Timeout { timeout_ms } => CoreError::Timeout { timeout_ms },
            roarm_api::Error::Status { status } => CoreError::Device { status },
            roarm_api::Error::Transport(ref e) if e.is_timeout() => {
                CoreError::Timeout { timeout_ms: 0 }
            }
            roarm_api::Error::Transport(e) => CoreError::ConnectionFailed {
                reason: e.to_string(),
            },
            roarm_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid device address: {e}"),
            },
            roarm_api::Error::ClientBuild(message) => CoreError::Internal(message),
            roarm_api::Error::Encode(e) => CoreError::Internal(format!("encode: {e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::CoreError;

    #[test]
    fn api_errors_translate() {
        let err = CoreError::from(roarm_api::Error::Status { status: 503 });
        assert!(matches!(err, CoreError::Device { status: 503 }));

        let err = CoreError::from(roarm_api::Error::Timeout { timeout_ms: 5000 });
        assert_eq!(err.to_string(), "Request timed out after 5000ms");

        let err = CoreError::from(roarm_api::Error::ClientBuild("boom".into()));
        assert!(matches!(err, CoreError::Internal(_)));
    }
}
