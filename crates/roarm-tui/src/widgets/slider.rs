//! One slider row: label, gauge and the mapped joint angle.

use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{LineGauge, Paragraph},
};
use roarm_core::joint::RAW_MAX;
use roarm_core::{ControlId, Joint, JointSpec, to_angle};

use crate::theme;

/// Short label shown to the left of a control.
pub fn control_label(control: ControlId) -> &'static str {
    match control {
        ControlId::BaseSlider => "Base",
        ControlId::ShoulderSlider => "Shoulder",
        ControlId::ArmSlider => "Arm",
        ControlId::GripperSlider => "Gripper",
        ControlId::LightSwitch => "Light",
    }
}

/// Angle readout for a slider position, e.g. `0.60 rad (34.4°)`.
pub fn angle_text(joint: Joint, raw: i32) -> String {
    let angle = to_angle(raw, &joint.spec());
    format!("{angle:>5.2} rad ({:>6.1}°)", JointSpec::degrees(angle))
}

fn label_style(selected: bool, enabled: bool) -> Style {
    match (selected, enabled) {
        (true, _) => theme::control_selected(),
        (false, true) => theme::control_label(),
        (false, false) => theme::control_disabled(),
    }
}

/// Render a slider row into `area`.
pub fn render_slider(
    frame: &mut Frame,
    area: Rect,
    control: ControlId,
    raw: i32,
    selected: bool,
    enabled: bool,
) {
    let [label_area, gauge_area, angle_area] = Layout::horizontal([
        Constraint::Length(12),
        Constraint::Min(10),
        Constraint::Length(22),
    ])
    .areas(area);

    let marker = if selected { "▸ " } else { "  " };
    let label = Paragraph::new(Span::styled(
        format!("{marker}{}", control_label(control)),
        label_style(selected, enabled),
    ));
    frame.render_widget(label, label_area);

    let ratio = f64::from(raw.clamp(0, RAW_MAX)) / f64::from(RAW_MAX);
    let gauge = LineGauge::default()
        .filled_style(theme::gauge_fill(enabled))
        .unfilled_style(theme::control_disabled())
        .label(format!("{raw:>3}"))
        .ratio(ratio);
    frame.render_widget(gauge, gauge_area);

    if let Some(joint) = control.joint() {
        let style = if enabled {
            theme::control_label()
        } else {
            theme::control_disabled()
        };
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(angle_text(joint, raw), style))),
            angle_area,
        );
    }
}

/// Render the light switch row.
pub fn render_switch(frame: &mut Frame, area: Rect, on: bool, selected: bool, enabled: bool) {
    let marker = if selected { "▸ " } else { "  " };
    let state_style = match (on, enabled) {
        (_, false) => theme::control_disabled(),
        (true, true) => Style::default().fg(theme::ELECTRIC_YELLOW),
        (false, true) => theme::control_label(),
    };
    let line = Line::from(vec![
        Span::styled(
            format!("{marker}{:<10}", control_label(ControlId::LightSwitch)),
            label_style(selected, enabled),
        ),
        Span::styled(if on { "[■ on ]" } else { "[  off]" }, state_style),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn angle_text_for_shoulder_midpoint() {
        assert_eq!(angle_text(Joint::Shoulder, 50), " 0.60 rad (  34.4°)");
    }

    #[test]
    fn labels_follow_control_names() {
        assert_eq!(control_label(ControlId::ArmSlider), "Arm");
        assert_eq!(control_label(ControlId::LightSwitch), "Light");
    }
}
