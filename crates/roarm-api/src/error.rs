use thiserror::Error;

/// Top-level error type for the `roarm-api` crate.
///
/// Covers every way a single command request can fail before or after it
/// reaches the arm. `roarm-core` collapses all of these into a
/// `TransportError` outcome; the detail is kept for logging.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, reset, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("Request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// The arm answered with a non-2xx status.
    #[error("Device returned HTTP {status}")]
    Status { status: u16 },

    /// HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    // ── Data ────────────────────────────────────────────────────────
    /// A command payload could not be encoded as JSON.
    #[error("Failed to encode command payload: {0}")]
    Encode(#[from] serde_json::Error),
}

impl Error {
    /// Returns `true` if the request never got an answer in time.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout(),
            Self::Timeout { .. } => true,
            _ => false,
        }
    }

    /// Returns `true` if the device could not be reached at all.
    pub fn is_connect(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_connect())
    }

    /// HTTP status returned by the device, if the request got that far.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
