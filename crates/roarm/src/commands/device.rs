//! Device command handlers: status, home, torque, move, led.

use roarm_core::{
    Command as ArmCommand, CommandResult, ConnectionState, ControlEvent, ControlId,
    ControlSurface, LinkConfig, to_angle,
};
use tracing::debug;

use crate::cli::{Command, GlobalOpts, LedLevel, MoveArgs};
use crate::config;
use crate::error::CliError;
use crate::output::{self, CommandReport, StatusReport};

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    let mut link = config::resolve_link_config(global)?;
    if let Command::Move(ref args) = cmd {
        apply_motion_overrides(&mut link, args);
    }

    let surface = ControlSurface::from_config(&link)?;
    debug!(host = %link.device_host, "bringing link up");
    let state = surface.link().start().await;

    let result = run(&cmd, &surface, state, global).await;
    surface.link().shutdown().await;
    result
}

fn apply_motion_overrides(link: &mut LinkConfig, args: &MoveArgs) {
    if let Some(speed) = args.speed {
        link.motion.speed = speed;
    }
    if let Some(acc) = args.acc {
        link.motion.acceleration = acc;
    }
}

async fn run(
    cmd: &Command,
    surface: &ControlSurface,
    state: ConnectionState,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let host = surface.device_host().to_owned();

    if matches!(cmd, Command::Status) {
        return status(surface, state, global);
    }

    if !state.is_connected() {
        return Err(CliError::NotConnected {
            host,
            state: state.to_string(),
        });
    }
    surface.channel().configure(host.clone());

    let (command, result) = match cmd {
        Command::Home => (ArmCommand::Home, surface.home().await),
        Command::Torque { state: switch } => (
            ArmCommand::torque(switch.is_on()),
            surface.set_torque(switch.is_on()).await,
        ),
        Command::Move(args) => move_joint(surface, args).await?,
        Command::Led { level } => led(surface, *level).await?,
        Command::Status | Command::Config(_) | Command::Completions { .. } => {
            return Err(CliError::Validation {
                field: "command".into(),
                reason: "not a device command".into(),
            });
        }
    };

    let name = command.name().to_owned();
    match result {
        CommandResult::Ok => {
            let report = CommandReport {
                command: name,
                host,
                result: result.to_string(),
                payload: command.to_json().unwrap_or_default(),
            };
            let rendered = output::render(global.output, &report, |r| {
                format!("{} -> {}: {}", r.command, r.host, r.result)
            })?;
            output::print_output(&rendered, global.quiet);
            Ok(())
        }
        CommandResult::NotConnected => Err(CliError::NotConnected {
            host,
            state: surface.link().status().to_string(),
        }),
        CommandResult::TransportError => Err(CliError::CommandFailed { command: name }),
    }
}

fn status(
    surface: &ControlSurface,
    state: ConnectionState,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let link = surface.link();
    let report = StatusReport {
        host: surface.device_host().to_owned(),
        state: state.to_string(),
        address: state.address().map(|a| a.to_string()),
        retries: link.retry_count(),
        max_retries: link.max_retries(),
    };
    let color = output::should_color(global.color);
    let rendered = output::render(global.output, &report, |r| {
        format!(
            "arm      {}\nlink     {}\nretries  {}/{}",
            r.host,
            output::paint_state(&state, color),
            r.retries,
            r.max_retries
        )
    })?;
    output::print_output(&rendered, global.quiet);
    Ok(())
}

async fn move_joint(
    surface: &ControlSurface,
    args: &MoveArgs,
) -> Result<(ArmCommand, CommandResult), CliError> {
    let motion = surface.motion();
    let spec = args.joint.spec();

    if let Some(raw) = args.raw {
        let command = ArmCommand::move_joint(args.joint, to_angle(raw, &spec), motion);
        let result = surface
            .handle(ControlEvent::slider(ControlId::for_joint(args.joint), raw))
            .await?;
        return Ok((command, result));
    }

    let rad = args.rad.ok_or_else(|| CliError::Validation {
        field: "move".into(),
        reason: "one of --raw or --rad is required".into(),
    })?;
    if !rad.is_finite() {
        return Err(CliError::Validation {
            field: "--rad".into(),
            reason: format!("'{rad}' is not a finite angle"),
        });
    }
    let command = ArmCommand::move_joint(args.joint, spec.clamp(rad), motion);
    Ok((command, surface.move_to(args.joint, rad).await))
}

async fn led(
    surface: &ControlSurface,
    level: LedLevel,
) -> Result<(ArmCommand, CommandResult), CliError> {
    Ok(match level {
        LedLevel::On | LedLevel::Off => {
            let on = level == LedLevel::On;
            let brightness = if on {
                roarm_core::surface::LED_ON
            } else {
                roarm_core::surface::LED_OFF
            };
            (
                ArmCommand::SetLed { brightness },
                surface.handle(ControlEvent::switch(on)).await?,
            )
        }
        LedLevel::Brightness(brightness) => (
            ArmCommand::SetLed { brightness },
            surface.set_brightness(brightness).await,
        ),
    })
}
