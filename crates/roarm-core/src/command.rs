// ── Arm commands ──
//
// Every command is a small JSON object whose integer "T" field selects the
// firmware handler. Commands are built fresh for each dispatch and never
// queued or retried.

use serde::Serialize;
use serde_json::value::RawValue;

use crate::joint::Joint;

/// Torque lock on/off.
pub const OP_TORQUE: u16 = 210;
/// Return every joint to its rest pose.
pub const OP_HOME: u16 = 100;
/// Move one joint to an absolute angle.
pub const OP_MOVE_JOINT: u16 = 101;
/// Set the LED brightness.
pub const OP_LED: u16 = 114;

// ── MotionProfile ────────────────────────────────────────────────

/// Speed and acceleration sent with every joint move.
///
/// A speed of 0 lets the firmware pick its own maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, serde::Deserialize)]
pub struct MotionProfile {
    pub speed: u32,
    pub acceleration: u32,
}

impl Default for MotionProfile {
    fn default() -> Self {
        Self {
            speed: 0,
            acceleration: 10,
        }
    }
}

// ── Command ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    EnableTorque,
    DisableTorque,
    Home,
    MoveJoint {
        joint: Joint,
        angle: f32,
        speed: u32,
        acceleration: u32,
    },
    /// Brightness is clamped to 0..=255 when serialized.
    SetLed { brightness: i32 },
}

/// Wire shape of each command. Field order is the order on the wire.
#[derive(Serialize)]
#[serde(untagged)]
enum Payload {
    Torque {
        #[serde(rename = "T")]
        op: u16,
        cmd: u8,
    },
    Home {
        #[serde(rename = "T")]
        op: u16,
    },
    Move {
        #[serde(rename = "T")]
        op: u16,
        joint: u8,
        rad: Box<RawValue>,
        spd: u32,
        acc: u32,
    },
    Led {
        #[serde(rename = "T")]
        op: u16,
        led: u8,
    },
}

impl Command {
    /// Build a joint move with the given motion profile.
    pub fn move_joint(joint: Joint, angle: f32, profile: MotionProfile) -> Self {
        Self::MoveJoint {
            joint,
            angle,
            speed: profile.speed,
            acceleration: profile.acceleration,
        }
    }

    pub fn torque(enabled: bool) -> Self {
        if enabled {
            Self::EnableTorque
        } else {
            Self::DisableTorque
        }
    }

    pub fn opcode(&self) -> u16 {
        match self {
            Self::EnableTorque | Self::DisableTorque => OP_TORQUE,
            Self::Home => OP_HOME,
            Self::MoveJoint { .. } => OP_MOVE_JOINT,
            Self::SetLed { .. } => OP_LED,
        }
    }

    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::EnableTorque => "enable_torque",
            Self::DisableTorque => "disable_torque",
            Self::Home => "home",
            Self::MoveJoint { .. } => "move_joint",
            Self::SetLed { .. } => "set_led",
        }
    }

    /// Serialize to the exact JSON the firmware parses.
    ///
    /// Fails only for a non-finite joint angle.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let op = self.opcode();
        let payload = match *self {
            Self::EnableTorque => Payload::Torque { op, cmd: 1 },
            Self::DisableTorque => Payload::Torque { op, cmd: 0 },
            Self::Home => Payload::Home { op },
            Self::MoveJoint {
                joint,
                angle,
                speed,
                acceleration,
            } => Payload::Move {
                op,
                joint: joint.id(),
                // Two decimals, written as a bare JSON number. NaN and
                // infinities are not valid JSON and fail here.
                rad: RawValue::from_string(format!("{angle:.2}"))?,
                spd: speed,
                acc: acceleration,
            },
            Self::SetLed { brightness } => Payload::Led {
                op,
                led: u8::try_from(brightness.clamp(0, 255)).unwrap_or(u8::MAX),
            },
        };
        serde_json::to_string(&payload)
    }
}

// ── CommandResult ────────────────────────────────────────────────

/// Outcome of a single dispatch attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum CommandResult {
    /// The arm answered with a 2xx status.
    Ok,
    /// The request was attempted and failed (timeout, network fault, non-2xx).
    #[strum(to_string = "transport error")]
    TransportError,
    /// Nothing was sent: the link is down or no device is configured.
    #[strum(to_string = "not connected")]
    NotConnected,
}

impl CommandResult {
    pub fn is_ok(self) -> bool {
        self == Self::Ok
    }
}
