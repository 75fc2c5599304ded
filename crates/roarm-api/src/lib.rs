//! HTTP transport for the RoArm command endpoint.
//!
//! The arm exposes a single `GET /js?json=...` route. This crate owns the
//! wire details: the query escaping the firmware understands, the bounded
//! response buffer, and a small `reqwest` client. Command semantics live
//! in `roarm-core`.

pub mod buffer;
pub mod client;
pub mod encoding;
pub mod error;
pub mod transport;

pub use buffer::ResponseBuffer;
pub use client::{ArmClient, ArmReply, command_url};
pub use encoding::escape_json;
pub use error::Error;
pub use transport::TransportConfig;
