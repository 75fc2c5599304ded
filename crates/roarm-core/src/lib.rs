// roarm-core: link lifecycle, joint mapping and command dispatch between
// roarm-api and the front ends (CLI/TUI).

pub mod channel;
pub mod command;
pub mod config;
pub mod connection;
pub mod error;
pub mod joint;
pub mod station;
pub mod surface;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod testing;

// ── Primary re-exports ──────────────────────────────────────────────
pub use channel::{CommandChannel, CommandTransport, DeviceEndpoint};
pub use command::{Command, CommandResult, MotionProfile};
pub use config::{LinkConfig, StationConfig};
pub use connection::{ConnectionManager, ConnectionState, Lifecycle, spawn_health_logger};
pub use error::CoreError;
pub use joint::{Joint, JointSpec, closedness_pct, to_angle, to_raw};
pub use station::{LinkEvent, ProbeStation, Station, StationRequest};
pub use surface::{ControlEvent, ControlId, ControlPanel, ControlSurface, ControlValue};
