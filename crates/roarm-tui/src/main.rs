//! `roarm-tui`: terminal control surface for a RoArm robotic arm.
//!
//! Four joint sliders and a light switch, driven from the keyboard. The
//! controls stay disabled until the arm's link is up; on first connect the
//! arm gets a torque-enable command and the controls unlock.
//!
//! Logs go to a file (default `/tmp/roarm-tui.log`) so they never corrupt
//! the terminal.

mod action;
mod app;
mod event;
mod panel;
mod theme;
mod tui;
mod widgets;

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::Result;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use roarm_core::{ControlSurface, spawn_health_logger};

use crate::app::App;
use crate::event::TickRates;

/// Drive a RoArm from the terminal.
#[derive(Parser, Debug)]
#[command(name = "roarm-tui", version, about)]
struct Cli {
    /// Arm address, host or host:port (overrides the config file)
    #[arg(short = 'H', long, env = "ROARM_HOST")]
    host: Option<String>,

    /// Config file (defaults to the platform config dir)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log file path
    #[arg(long, default_value = "/tmp/roarm-tui.log")]
    log_file: PathBuf,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// File-based tracing. Nothing may go to stdout/stderr while the TUI is up.
/// Hold the returned guard for the whole run so logs flush.
fn setup_tracing(cli: &Cli) -> WorkerGuard {
    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "roarm_tui={log_level},roarm_core={log_level},roarm_api={log_level}"
        ))
    });

    let log_dir = cli
        .log_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(std::path::Path::new("/tmp"));
    let log_filename = cli
        .log_file
        .file_name()
        .unwrap_or(std::ffi::OsStr::new("roarm-tui.log"));

    let file_appender = tracing_appender::rolling::never(log_dir, log_filename);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true),
        )
        .init();

    guard
}

fn load_config(cli: &Cli) -> Result<roarm_config::Config> {
    let mut cfg = match &cli.config {
        Some(path) => roarm_config::load_config_from(path)?,
        None => roarm_config::load_config()?,
    };
    if let Some(host) = &cli.host {
        cfg.device.host.clone_from(host);
    }
    roarm_config::validate_ui(&cfg.ui)?;
    Ok(cfg)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Hooks BEFORE entering the terminal
    tui::install_hooks()?;

    let _log_guard = setup_tracing(&cli);

    let cfg = load_config(&cli)?;
    let link_config = roarm_config::to_link_config(&cfg)?;
    let surface = ControlSurface::from_config(&link_config)?;

    info!(
        host = %link_config.device_host,
        ssid = %link_config.station.ssid,
        max_retries = link_config.station.max_retries,
        "starting roarm-tui"
    );

    let cancel = CancellationToken::new();
    let health = spawn_health_logger(
        surface.link().clone(),
        cfg.ui.health_log_interval(),
        cancel.clone(),
    );

    let rates = TickRates {
        render: cfg.ui.render_interval(),
        link_poll: cfg.ui.link_poll_interval(),
        status: cfg.ui.status_interval(),
    };
    let mut app = App::new(surface, rates);
    let outcome = app.run().await;

    cancel.cancel();
    let _ = health.await;
    app.shutdown().await;

    outcome
}
