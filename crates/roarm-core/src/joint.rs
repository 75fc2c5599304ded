// ── Joint mapping ──
//
// Pure conversions between a UI control position (0..=100) and a joint
// angle in radians. Every joint has a fixed, asymmetric range; the wire
// ids 1..=4 are what the arm firmware expects and must stay stable.

use std::fmt;

/// Lowest raw control position.
pub const RAW_MIN: i32 = 0;
/// Highest raw control position.
pub const RAW_MAX: i32 = 100;

/// The four controllable joints, numbered as on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum Joint {
    Base,
    Shoulder,
    Elbow,
    Gripper,
}

impl Joint {
    pub const ALL: [Self; 4] = [Self::Base, Self::Shoulder, Self::Elbow, Self::Gripper];

    /// Wire id (1 = base ... 4 = gripper).
    pub fn id(self) -> u8 {
        match self {
            Self::Base => 1,
            Self::Shoulder => 2,
            Self::Elbow => 3,
            Self::Gripper => 4,
        }
    }

    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|j| j.id() == id)
    }

    /// Physical range of this joint.
    pub fn spec(self) -> JointSpec {
        match self {
            Self::Base => BASE,
            Self::Shoulder => SHOULDER,
            Self::Elbow => ELBOW,
            Self::Gripper => GRIPPER,
        }
    }

    pub fn name(self) -> &'static str {
        self.into()
    }
}

impl fmt::Display for Joint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Joint {
    type Err = String;

    /// Accepts a joint name (`"arm"` is an alias for the elbow) or its wire id.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        match lower.as_str() {
            "base" | "1" => Ok(Self::Base),
            "shoulder" | "2" => Ok(Self::Shoulder),
            "elbow" | "arm" | "3" => Ok(Self::Elbow),
            "gripper" | "hand" | "4" => Ok(Self::Gripper),
            _ => Err(format!(
                "unknown joint '{s}' (expected base, shoulder, elbow, gripper or 1-4)"
            )),
        }
    }
}

// ── JointSpec ────────────────────────────────────────────────────

/// Angular range of one joint, in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointSpec {
    pub joint: Joint,
    pub min: f32,
    pub max: f32,
}

pub const BASE: JointSpec = JointSpec {
    joint: Joint::Base,
    min: -1.57,
    max: 1.57,
};

pub const SHOULDER: JointSpec = JointSpec {
    joint: Joint::Shoulder,
    min: -0.2,
    max: 1.4,
};

pub const ELBOW: JointSpec = JointSpec {
    joint: Joint::Elbow,
    min: -1.0,
    max: 1.5,
};

pub const GRIPPER: JointSpec = JointSpec {
    joint: Joint::Gripper,
    min: 1.08,
    max: 3.14,
};

impl JointSpec {
    fn span(&self) -> f32 {
        self.max - self.min
    }

    /// Clamp an angle into this joint's range.
    pub fn clamp(&self, angle: f32) -> f32 {
        angle.clamp(self.min, self.max)
    }

    /// Angle in degrees, for logs.
    pub fn degrees(angle: f32) -> f32 {
        angle.to_degrees()
    }
}

// ── Conversions ──────────────────────────────────────────────────

/// Map a raw control position to an angle. `raw` is clamped to 0..=100.
pub fn to_angle(raw: i32, spec: &JointSpec) -> f32 {
    let raw = u8::try_from(raw.clamp(RAW_MIN, RAW_MAX)).unwrap_or(u8::MAX);
    spec.min + f32::from(raw) * spec.span() / 100.0
}

/// Map an angle back to a raw control position, rounded and clamped.
#[allow(
    clippy::as_conversions,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn to_raw(angle: f32, spec: &JointSpec) -> u8 {
    let angle = spec.clamp(angle);
    let raw = ((angle - spec.min) * 100.0 / spec.span()).round();
    // Clamped to 0..=100 above, so the cast cannot wrap.
    raw.clamp(0.0, 100.0) as u8
}

/// How far the gripper is closed, in percent. Not clamped.
pub fn closedness_pct(angle: f32, spec: &JointSpec) -> f32 {
    (angle - spec.min) / spec.span() * 100.0
}
