//! CLI-aware configuration: file + env from `roarm-config`, then flags.

use roarm_config::Config;
use roarm_core::LinkConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Load the config file and apply global flag overrides.
pub fn effective_config(global: &GlobalOpts) -> Result<Config, CliError> {
    let mut cfg = roarm_config::load_config()?;
    apply_overrides(&mut cfg, global);
    Ok(cfg)
}

pub fn apply_overrides(cfg: &mut Config, global: &GlobalOpts) {
    if let Some(ref host) = global.host {
        cfg.device.host.clone_from(host);
    }
    if let Some(timeout) = global.timeout {
        cfg.device.timeout_ms = timeout;
    }
    if let Some(retries) = global.retries {
        cfg.station.max_retries = retries;
    }
}

/// Build the runtime link config with flag overrides applied.
pub fn resolve_link_config(global: &GlobalOpts) -> Result<LinkConfig, CliError> {
    let cfg = effective_config(global)?;
    Ok(roarm_config::to_link_config(&cfg)?)
}
