// Shared transport configuration for building the arm's reqwest::Client.
//
// The arm speaks plain HTTP on the local network: no TLS, no cookies,
// no auth headers. What matters is the per-request timeout and how much
// of the answer we are willing to keep.

use std::time::Duration;

/// Per-request timeout the arm firmware is known to tolerate.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

/// Bytes of response body kept per request.
pub const DEFAULT_RESPONSE_LIMIT: usize = 1024;

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub timeout: Duration,
    pub response_limit: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            response_limit: DEFAULT_RESPONSE_LIMIT,
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, crate::error::Error> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("roarm/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| crate::error::Error::ClientBuild(e.to_string()))
    }

    /// Timeout in whole milliseconds, for error reporting.
    pub fn timeout_ms(&self) -> u64 {
        u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX)
    }
}
