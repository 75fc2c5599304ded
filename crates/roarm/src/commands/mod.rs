//! Command dispatch: bridges CLI args -> control surface -> output.

pub mod config_cmd;
pub mod device;
