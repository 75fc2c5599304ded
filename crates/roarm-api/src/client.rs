// Arm HTTP client
//
// One request per command: `GET http://{host}/js?json={escaped}`. The
// response body is streamed into a bounded buffer; only a 2xx status
// counts as success.

use tracing::{debug, trace, warn};
use url::Url;

use crate::buffer::ResponseBuffer;
use crate::encoding::escape_json;
use crate::error::Error;
use crate::transport::TransportConfig;

/// Build the command URL for a JSON payload.
///
/// The escaped payload is spliced in verbatim so `url` does not re-encode
/// the device-specific escapes.
pub fn command_url(host: &str, json: &str) -> Result<Url, Error> {
    let raw = format!("http://{host}/js?json={}", escape_json(json));
    Ok(Url::parse(&raw)?)
}

/// What came back from a successful command request.
#[derive(Debug, Clone)]
pub struct ArmReply {
    pub status: u16,
    pub body: ResponseBuffer,
}

/// Thin `reqwest` wrapper for the arm's `/js` endpoint.
#[derive(Debug, Clone)]
pub struct ArmClient {
    http: reqwest::Client,
    response_limit: usize,
    timeout_ms: u64,
}

impl ArmClient {
    /// Create a client from a `TransportConfig`.
    pub fn new(transport: &TransportConfig) -> Result<Self, Error> {
        Ok(Self {
            http: transport.build_client()?,
            response_limit: transport.response_limit,
            timeout_ms: transport.timeout_ms(),
        })
    }

    /// Create a client around a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, transport: &TransportConfig) -> Self {
        Self {
            http,
            response_limit: transport.response_limit,
            timeout_ms: transport.timeout_ms(),
        }
    }

    pub fn response_limit(&self) -> usize {
        self.response_limit
    }

    /// Issue a GET and collect the body.
    pub async fn get(&self, url: Url) -> Result<ArmReply, Error> {
        debug!(%url, "GET");

        let mut response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status {
                status: status.as_u16(),
            });
        }

        let mut body = ResponseBuffer::new(self.response_limit);
        while let Some(chunk) = response.chunk().await.map_err(|e| self.classify(e))? {
            trace!(bytes = chunk.len(), "response chunk");
            body.push(&chunk);
        }

        if body.is_truncated() {
            warn!(
                kept = body.len(),
                limit = body.limit(),
                "response exceeded buffer, dropped overflow"
            );
        }

        Ok(ArmReply {
            status: status.as_u16(),
            body,
        })
    }

    fn classify(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::Timeout {
                timeout_ms: self.timeout_ms,
            }
        } else {
            Error::Transport(e)
        }
    }
}
