//! Clap derive structures for the `roarm` CLI.

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use roarm_core::Joint;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// roarm -- drive a RoArm robotic arm over its HTTP command endpoint
#[derive(Debug, Parser)]
#[command(
    name = "roarm",
    version,
    about = "Drive a RoArm robotic arm from the command line",
    long_about = "Sends JSON commands to a RoArm arm over Wi-Fi.\n\n\
        Each device command brings the link up, sends exactly one request\n\
        and reports whether the arm acknowledged it.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Arm address, optionally host:port (overrides config)
    #[arg(long, short = 'H', env = "ROARM_HOST", global = true)]
    pub host: Option<String>,

    /// Request timeout in milliseconds (overrides config)
    #[arg(long, short = 't', env = "ROARM_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Automatic link retries before giving up (overrides config)
    #[arg(long, global = true)]
    pub retries: Option<u32>,

    /// Output format
    #[arg(long, short = 'o', default_value = "text", global = true)]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// Pretty-printed JSON
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Bring the link up and report its state
    Status,

    /// Return every joint to its rest pose
    Home,

    /// Switch joint torque lock on or off
    Torque {
        #[arg(value_enum)]
        state: Switch,
    },

    /// Move one joint
    Move(MoveArgs),

    /// Set LED brightness: on, off, or 0-255
    Led {
        #[arg(value_parser = parse_led)]
        level: LedLevel,
    },

    /// Manage the configuration file
    Config(ConfigArgs),

    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Switch {
    On,
    Off,
}

impl Switch {
    pub fn is_on(self) -> bool {
        self == Self::On
    }
}

#[derive(Debug, Args)]
pub struct MoveArgs {
    /// Joint name (base, shoulder, elbow/arm, gripper) or id 1-4
    #[arg(value_parser = parse_joint)]
    pub joint: Joint,

    /// Slider position 0-100, mapped onto the joint's range
    #[arg(long, conflicts_with = "rad", required_unless_present = "rad", allow_hyphen_values = true)]
    pub raw: Option<i32>,

    /// Absolute angle in radians, clamped to the joint's range
    #[arg(long, allow_hyphen_values = true)]
    pub rad: Option<f32>,

    /// Speed (0 = firmware default)
    #[arg(long)]
    pub speed: Option<u32>,

    /// Acceleration
    #[arg(long)]
    pub acc: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedLevel {
    On,
    Off,
    Brightness(i32),
}

fn parse_led(s: &str) -> Result<LedLevel, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "on" => Ok(LedLevel::On),
        "off" => Ok(LedLevel::Off),
        other => other
            .parse::<i32>()
            .map(LedLevel::Brightness)
            .map_err(|_| format!("expected on, off or a brightness 0-255, got '{s}'")),
    }
}

fn parse_joint(s: &str) -> Result<Joint, String> {
    s.parse()
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the effective configuration (passphrase masked)
    Show,

    /// Print the configuration file path
    Path,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_tree_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn led_levels() {
        assert_eq!(parse_led("ON").unwrap(), LedLevel::On);
        assert_eq!(parse_led("off").unwrap(), LedLevel::Off);
        assert_eq!(parse_led("300").unwrap(), LedLevel::Brightness(300));
        assert!(parse_led("dim").is_err());
    }

    #[test]
    fn move_takes_raw_or_rad() {
        let cli = Cli::try_parse_from(["roarm", "move", "shoulder", "--raw", "50"]).unwrap();
        let Command::Move(args) = cli.command else {
            panic!("expected move");
        };
        assert_eq!(args.joint, Joint::Shoulder);
        assert_eq!(args.raw, Some(50));

        assert!(Cli::try_parse_from(["roarm", "move", "base"]).is_err());
        assert!(
            Cli::try_parse_from(["roarm", "move", "base", "--raw", "1", "--rad", "0.5"]).is_err()
        );
        assert!(Cli::try_parse_from(["roarm", "move", "base", "--rad", "-1.2"]).is_ok());
    }
}
