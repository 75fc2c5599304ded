//! On-screen control state: four slider positions, the light switch, the
//! selection cursor and group enablement.

use indexmap::IndexMap;
use roarm_core::joint::{RAW_MAX, RAW_MIN};
use roarm_core::{ControlEvent, ControlId, ControlPanel};

/// Slider position every control starts at.
pub const SLIDER_START: i32 = 25;

#[derive(Debug, Clone)]
pub struct PanelState {
    sliders: IndexMap<ControlId, i32>,
    light: bool,
    selected: usize,
    enabled: bool,
}

impl Default for PanelState {
    fn default() -> Self {
        Self {
            sliders: ControlId::SLIDERS
                .into_iter()
                .map(|id| (id, SLIDER_START))
                .collect(),
            light: false,
            selected: 0,
            enabled: false,
        }
    }
}

impl ControlPanel for PanelState {
    fn set_controls_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}

impl PanelState {
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn light(&self) -> bool {
        self.light
    }

    /// Slider positions in display order.
    pub fn sliders(&self) -> impl Iterator<Item = (ControlId, i32)> + '_ {
        self.sliders.iter().map(|(id, value)| (*id, *value))
    }

    #[cfg(test)]
    pub fn value(&self, control: ControlId) -> Option<i32> {
        self.sliders.get(&control).copied()
    }

    /// Currently selected control. The light switch sits after the sliders.
    pub fn selected(&self) -> ControlId {
        ControlId::ALL
            .get(self.selected)
            .copied()
            .unwrap_or(ControlId::BaseSlider)
    }

    pub fn select_next(&mut self) {
        self.selected = (self.selected + 1) % ControlId::ALL.len();
    }

    pub fn select_prev(&mut self) {
        self.selected = self
            .selected
            .checked_sub(1)
            .unwrap_or(ControlId::ALL.len() - 1);
    }

    /// Move the selected slider. Returns the change notification, if any.
    ///
    /// Nothing moves while the group is disabled, when the selection is the
    /// switch, or when the slider is already pinned at the end of its track.
    pub fn nudge(&mut self, delta: i32) -> Option<ControlEvent> {
        if !self.enabled {
            return None;
        }
        let control = self.selected();
        let value = self.sliders.get_mut(&control)?;
        let next = value.saturating_add(delta).clamp(RAW_MIN, RAW_MAX);
        if next == *value {
            return None;
        }
        *value = next;
        Some(ControlEvent::slider(control, next))
    }

    /// Flip the light switch. Returns the change notification, if enabled.
    pub fn toggle_light(&mut self) -> Option<ControlEvent> {
        if !self.enabled {
            return None;
        }
        self.light = !self.light;
        Some(ControlEvent::switch(self.light))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use roarm_core::ControlValue;

    use super::*;

    fn enabled_panel() -> PanelState {
        let mut panel = PanelState::default();
        panel.set_controls_enabled(true);
        panel
    }

    #[test]
    fn starts_disabled_at_quarter_travel() {
        let panel = PanelState::default();
        assert!(!panel.enabled());
        let values: Vec<i32> = panel.sliders().map(|(_, v)| v).collect();
        assert_eq!(values, [25, 25, 25, 25]);
        assert_eq!(panel.selected(), ControlId::BaseSlider);
    }

    #[test]
    fn disabled_panel_emits_nothing() {
        let mut panel = PanelState::default();
        assert_eq!(panel.nudge(5), None);
        assert_eq!(panel.toggle_light(), None);
        assert_eq!(panel.value(ControlId::BaseSlider), Some(25));
        assert!(!panel.light());
    }

    #[test]
    fn nudge_moves_selected_slider() {
        let mut panel = enabled_panel();
        panel.select_next();
        let event = panel.nudge(5);
        assert_eq!(event, Some(ControlEvent::slider(ControlId::ShoulderSlider, 30)));
        assert_eq!(panel.value(ControlId::ShoulderSlider), Some(30));
        assert_eq!(panel.value(ControlId::BaseSlider), Some(25));
    }

    #[test]
    fn nudge_stops_at_track_ends() {
        let mut panel = enabled_panel();
        for _ in 0..10 {
            panel.nudge(-5);
        }
        assert_eq!(panel.value(ControlId::BaseSlider), Some(0));
        assert_eq!(panel.nudge(-5), None);

        for _ in 0..30 {
            panel.nudge(5);
        }
        assert_eq!(panel.value(ControlId::BaseSlider), Some(100));
    }

    #[test]
    fn selection_wraps_through_switch() {
        let mut panel = enabled_panel();
        panel.select_prev();
        assert_eq!(panel.selected(), ControlId::LightSwitch);
        assert_eq!(panel.nudge(5), None);
        panel.select_next();
        assert_eq!(panel.selected(), ControlId::BaseSlider);
    }

    #[test]
    fn toggle_light_flips_switch() {
        let mut panel = enabled_panel();
        let on = panel.toggle_light().map(|e| e.value);
        let off = panel.toggle_light().map(|e| e.value);
        assert_eq!(on, Some(ControlValue::Toggle(true)));
        assert_eq!(off, Some(ControlValue::Toggle(false)));
    }
}
