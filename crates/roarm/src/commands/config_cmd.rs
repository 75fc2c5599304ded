//! Config subcommand handlers.

use roarm_config::Config;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::config;
use crate::error::CliError;
use crate::output;

const MASK: &str = "********";

/// Copy of `cfg` that is safe to print.
fn masked(cfg: &Config) -> Config {
    let mut cfg = cfg.clone();
    if cfg.station.passphrase.is_some() {
        cfg.station.passphrase = Some(MASK.into());
    }
    cfg
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: &ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Show => {
            let cfg = masked(&config::effective_config(global)?);
            let rendered = match global.output {
                OutputFormat::Text => toml::to_string_pretty(&cfg)?,
                OutputFormat::Json => serde_json::to_string_pretty(&cfg)?,
            };
            output::print_output(rendered.trim_end(), global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(&roarm_config::config_path().display().to_string(), false);
            Ok(())
        }

        ConfigCommand::Init { force } => {
            let path = roarm_config::config_path();
            if path.exists() && !force {
                return Err(CliError::ConfigExists {
                    path: path.display().to_string(),
                });
            }

            let mut cfg = Config::default();
            config::apply_overrides(&mut cfg, global);
            // Validate before writing anything.
            roarm_config::to_link_config(&cfg)?;
            let written = roarm_config::save_config(&cfg)?;

            output::print_output(&format!("wrote {}", written.display()), global.quiet);
            Ok(())
        }
    }
}
