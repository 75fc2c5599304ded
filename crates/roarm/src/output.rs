//! Output formatting for device and config commands.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use roarm_core::ConnectionState;
use serde::Serialize;

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

/// Link state, colored by health.
pub fn paint_state(state: &ConnectionState, color: bool) -> String {
    let text = state.to_string();
    if !color {
        return text;
    }
    match state {
        ConnectionState::Connected(_) => text.green().bold().to_string(),
        ConnectionState::Connecting => text.yellow().to_string(),
        ConnectionState::Disconnected => text.dimmed().to_string(),
        ConnectionState::Failed => text.red().bold().to_string(),
    }
}

// ── Reports ──────────────────────────────────────────────────────────

/// Result of `roarm status`.
#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub host: String,
    pub state: String,
    pub address: Option<String>,
    pub retries: u32,
    pub max_retries: u32,
}

/// Result of a single device command.
#[derive(Debug, Serialize)]
pub struct CommandReport {
    pub command: String,
    pub host: String,
    pub result: String,
    pub payload: String,
}

/// Render a report as text or JSON.
pub fn render<T: Serialize>(
    format: OutputFormat,
    data: &T,
    text: impl FnOnce(&T) -> String,
) -> Result<String, CliError> {
    match format {
        OutputFormat::Text => Ok(text(data)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(data)?),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}
