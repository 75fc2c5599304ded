// ── Control surface adapter ──
//
// Binds the five on-screen controls to arm commands. Sliders go through
// the joint mapper into joint moves; the switch drives the LED. On every
// link tick the adapter also arms the channel on first connect and
// enables or disables all controls together.

use std::sync::atomic::{AtomicBool, Ordering};

use indexmap::IndexMap;
use tracing::{debug, info, warn};

use crate::channel::{CommandChannel, CommandTransport};
use crate::command::{Command, CommandResult, MotionProfile};
use crate::config::LinkConfig;
use crate::connection::{ConnectionManager, ConnectionState};
use crate::error::CoreError;
use crate::joint::{self, Joint, JointSpec};
use crate::station::ProbeStation;
use roarm_api::ArmClient;

/// LED brightness sent when the switch is on.
pub const LED_ON: i32 = 255;
pub const LED_OFF: i32 = 0;

/// Named controls on the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum ControlId {
    BaseSlider,
    ShoulderSlider,
    ArmSlider,
    GripperSlider,
    LightSwitch,
}

impl ControlId {
    pub const ALL: [Self; 5] = [
        Self::BaseSlider,
        Self::ShoulderSlider,
        Self::ArmSlider,
        Self::GripperSlider,
        Self::LightSwitch,
    ];

    pub const SLIDERS: [Self; 4] = [
        Self::BaseSlider,
        Self::ShoulderSlider,
        Self::ArmSlider,
        Self::GripperSlider,
    ];

    /// Slider bound to a joint.
    pub fn for_joint(joint: Joint) -> Self {
        match joint {
            Joint::Base => Self::BaseSlider,
            Joint::Shoulder => Self::ShoulderSlider,
            Joint::Elbow => Self::ArmSlider,
            Joint::Gripper => Self::GripperSlider,
        }
    }

    /// Joint driven by this control, if it is a slider.
    pub fn joint(self) -> Option<Joint> {
        match self {
            Self::BaseSlider => Some(Joint::Base),
            Self::ShoulderSlider => Some(Joint::Shoulder),
            Self::ArmSlider => Some(Joint::Elbow),
            Self::GripperSlider => Some(Joint::Gripper),
            Self::LightSwitch => None,
        }
    }
}

/// New value carried by a change notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlValue {
    /// Slider position, nominally 0..=100.
    Raw(i32),
    /// Switch state.
    Toggle(bool),
}

/// A control changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlEvent {
    pub control: ControlId,
    pub value: ControlValue,
}

impl ControlEvent {
    pub fn slider(control: ControlId, raw: i32) -> Self {
        Self {
            control,
            value: ControlValue::Raw(raw),
        }
    }

    pub fn switch(on: bool) -> Self {
        Self {
            control: ControlId::LightSwitch,
            value: ControlValue::Toggle(on),
        }
    }
}

/// Handler registered against a control.
#[derive(Debug, Clone, Copy)]
enum Binding {
    Joint(JointSpec),
    Led,
}

/// The UI side of the surface.
pub trait ControlPanel {
    /// Enable or disable all five controls at once.
    fn set_controls_enabled(&mut self, enabled: bool);
}

// ── ControlSurface ───────────────────────────────────────────────

pub struct ControlSurface<T = ArmClient> {
    channel: CommandChannel<T>,
    bindings: IndexMap<ControlId, Binding>,
    motion: MotionProfile,
    device_host: String,
    armed: bool,
    enabled: Option<bool>,
    /// Torque state last acknowledged by the arm.
    torque: AtomicBool,
}

impl ControlSurface<ArmClient> {
    /// Wire up a probe station, connection manager and HTTP client.
    pub fn from_config(config: &LinkConfig) -> Result<Self, CoreError> {
        if config.device_host.trim().is_empty() {
            return Err(CoreError::Config {
                message: "device host is empty".into(),
            });
        }
        let link = ConnectionManager::new(ProbeStation::new(config), config.station.max_retries);
        let client = ArmClient::new(&config.transport())?;
        let channel = CommandChannel::new(link, client);
        Ok(Self::new(channel, config.authority(), config.motion))
    }
}

impl<T: CommandTransport> ControlSurface<T> {
    pub fn new(channel: CommandChannel<T>, device_host: String, motion: MotionProfile) -> Self {
        let mut bindings = IndexMap::new();
        for control in ControlId::SLIDERS {
            if let Some(joint) = control.joint() {
                bindings.insert(control, Binding::Joint(joint.spec()));
            }
        }
        bindings.insert(ControlId::LightSwitch, Binding::Led);

        Self {
            channel,
            bindings,
            motion,
            device_host,
            armed: false,
            enabled: None,
            torque: AtomicBool::new(false),
        }
    }

    pub fn channel(&self) -> &CommandChannel<T> {
        &self.channel
    }

    pub fn link(&self) -> &ConnectionManager {
        self.channel.link()
    }

    pub fn motion(&self) -> MotionProfile {
        self.motion
    }

    pub fn device_host(&self) -> &str {
        &self.device_host
    }

    /// Whether the arm has acknowledged torque on. `false` until it has.
    pub fn torque_enabled(&self) -> bool {
        self.torque.load(Ordering::Relaxed)
    }

    /// Group enablement last applied to the panel.
    pub fn controls_enabled(&self) -> bool {
        self.enabled.unwrap_or(false)
    }

    /// React to a control change.
    pub async fn handle(&self, event: ControlEvent) -> Result<CommandResult, CoreError> {
        let binding = self
            .bindings
            .get(&event.control)
            .copied()
            .ok_or(CoreError::UnboundControl {
                control: event.control,
            })?;

        let result = match (binding, event.value) {
            (Binding::Joint(spec), ControlValue::Raw(raw)) => self.move_joint(&spec, raw).await,
            (Binding::Led, ControlValue::Toggle(on)) => {
                let result = self
                    .set_brightness(if on { LED_ON } else { LED_OFF })
                    .await;
                info!(on, %result, "light switch");
                result
            }
            (Binding::Joint(_), ControlValue::Toggle(_)) => {
                return Err(CoreError::ControlMismatch {
                    control: event.control,
                    expected: "slider",
                });
            }
            (Binding::Led, ControlValue::Raw(_)) => {
                return Err(CoreError::ControlMismatch {
                    control: event.control,
                    expected: "switch",
                });
            }
        };
        Ok(result)
    }

    async fn move_joint(&self, spec: &JointSpec, raw: i32) -> CommandResult {
        let angle = joint::to_angle(raw, spec);
        let command = Command::move_joint(spec.joint, angle, self.motion);
        let result = self.channel.dispatch(&command).await;

        if spec.joint == Joint::Gripper {
            info!(
                joint = %spec.joint,
                raw,
                rad = angle,
                closed_pct = joint::closedness_pct(angle, spec),
                %result,
                "gripper move"
            );
        } else {
            info!(
                joint = %spec.joint,
                raw,
                rad = angle,
                deg = JointSpec::degrees(angle),
                %result,
                "joint move"
            );
        }
        result
    }

    /// Periodic link check: arm on first connect, then sync enablement.
    pub async fn on_link_tick<P: ControlPanel + ?Sized>(&mut self, panel: &mut P) -> ConnectionState {
        let state = self.link().status();

        if state.is_connected() && !self.armed {
            self.armed = true;
            self.channel.configure(self.device_host.clone());
            let result = self.channel.dispatch(&Command::EnableTorque).await;
            if result.is_ok() {
                self.torque.store(true, Ordering::Relaxed);
                info!(host = %self.device_host, "arm ready, torque enabled");
            } else {
                warn!(host = %self.device_host, %result, "arm linked but torque enable failed");
            }
        }

        let enable = state.is_connected();
        if self.enabled != Some(enable) {
            debug!(enable, %state, "control group enablement");
            panel.set_controls_enabled(enable);
            self.enabled = Some(enable);
        }
        state
    }

    // ── Operator extras ──────────────────────────────────────────

    pub async fn home(&self) -> CommandResult {
        let result = self.channel.dispatch(&Command::Home).await;
        info!(%result, "home");
        result
    }

    pub async fn set_torque(&self, enabled: bool) -> CommandResult {
        let result = self.channel.dispatch(&Command::torque(enabled)).await;
        if result.is_ok() {
            self.torque.store(enabled, Ordering::Relaxed);
        }
        info!(enabled, %result, "torque");
        result
    }

    pub async fn set_brightness(&self, brightness: i32) -> CommandResult {
        self.channel
            .dispatch(&Command::SetLed { brightness })
            .await
    }

    /// Move a joint straight to an angle, clamped to its range.
    pub async fn move_to(&self, joint: Joint, angle: f32) -> CommandResult {
        let spec = joint.spec();
        let command = Command::move_joint(joint, spec.clamp(angle), self.motion);
        self.channel.dispatch(&command).await
    }

    pub fn reconnect(&self) {
        self.link().reconnect();
    }

    pub fn disconnect(&self) {
        self.link().disconnect();
    }
}
