//! Application core: event loop, action dispatch, rendering.
//!
//! The `App` owns the control surface and the panel state. Every timer and
//! key press is handled on this one loop with `&mut self`, and device
//! dispatches are awaited inline.

use std::time::{Duration, Instant};

use color_eyre::eyre::Result;
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
};
use roarm_core::{CommandResult, ConnectionManager, ConnectionState, ControlEvent, ControlId, ControlSurface};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::action::{Action, map_key};
use crate::event::{Event, EventReader, TickRates};
use crate::panel::PanelState;
use crate::theme;
use crate::tui::Tui;
use crate::widgets::{slider, status_indicator};

/// Link details shown in the status bar, refreshed on the status tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LinkSnapshot {
    state: ConnectionState,
    retries: u32,
    max_retries: u32,
}

impl LinkSnapshot {
    fn read(link: &ConnectionManager) -> Self {
        Self {
            state: link.status(),
            retries: link.retry_count(),
            max_retries: link.max_retries(),
        }
    }
}

/// Outcome of the most recent operator command.
#[derive(Debug, Clone)]
struct LastCommand {
    label: String,
    ok: bool,
    at: Instant,
}

pub struct App {
    surface: ControlSurface,
    panel: PanelState,
    running: bool,
    help_visible: bool,
    link: LinkSnapshot,
    last: Option<LastCommand>,
    started: Instant,
    rates: TickRates,
    action_tx: mpsc::UnboundedSender<Action>,
    action_rx: mpsc::UnboundedReceiver<Action>,
}

impl App {
    pub fn new(surface: ControlSurface, rates: TickRates) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        let link = LinkSnapshot::read(surface.link());
        Self {
            surface,
            panel: PanelState::default(),
            running: true,
            help_visible: false,
            link,
            last: None,
            started: Instant::now(),
            rates,
            action_tx,
            action_rx,
        }
    }

    /// Run the main loop until the operator quits.
    pub async fn run(&mut self) -> Result<()> {
        let mut tui = Tui::new()?;
        tui.enter()?;
        let (width, height) = tui.size().unwrap_or((80, 24));
        debug!(width, height, "terminal size");

        // Association can take several retries; the link poll picks up the result.
        let link = self.surface.link().clone();
        tokio::spawn(async move {
            let state = link.start().await;
            info!(%state, "link settled");
        });

        let mut events = EventReader::new(self.rates);
        info!(host = %self.surface.device_host(), "TUI event loop started");

        while self.running {
            let Some(event) = events.next().await else {
                break;
            };

            let action = match event {
                Event::Key(key) => map_key(key, self.help_visible),
                Event::Resize(w, h) => Some(Action::Resize(w, h)),
                Event::Render => Some(Action::Render),
                Event::LinkPoll => Some(Action::LinkPoll),
                Event::Status => Some(Action::RefreshStatus),
            };
            if let Some(action) = action {
                self.action_tx.send(action)?;
            }

            while let Ok(action) = self.action_rx.try_recv() {
                self.process_action(action).await;

                if action == Action::Render {
                    tui.draw(|frame| self.render(frame))?;
                }
            }
        }

        events.stop();
        info!("TUI event loop ended");
        Ok(())
    }

    /// Stop the link task and the station.
    pub async fn shutdown(&self) {
        self.surface.link().shutdown().await;
    }

    async fn process_action(&mut self, action: Action) {
        match action {
            Action::Quit => self.running = false,
            Action::Resize(width, height) => debug!(width, height, "terminal resized"),
            Action::Render => {}
            Action::ToggleHelp => self.help_visible = !self.help_visible,

            Action::LinkPoll => {
                let armed = self.surface.channel().is_configured();
                let state = self.surface.on_link_tick(&mut self.panel).await;
                self.link.state = state;
                if !armed && self.surface.channel().is_configured() {
                    let result = if self.surface.torque_enabled() {
                        CommandResult::Ok
                    } else {
                        CommandResult::TransportError
                    };
                    self.record("arm torque on", result);
                }
            }
            Action::RefreshStatus => {
                self.link = LinkSnapshot::read(self.surface.link());
            }

            Action::SelectNext => self.panel.select_next(),
            Action::SelectPrev => self.panel.select_prev(),
            Action::Nudge(delta) => {
                if let Some(event) = self.panel.nudge(delta) {
                    self.dispatch(event).await;
                }
            }
            Action::ToggleLight => {
                if let Some(event) = self.panel.toggle_light() {
                    self.dispatch(event).await;
                }
            }

            Action::Home => {
                let result = self.surface.home().await;
                self.record("home", result);
            }
            Action::ToggleTorque => {
                let next = !self.surface.torque_enabled();
                let result = self.surface.set_torque(next).await;
                let label = if next { "torque on" } else { "torque off" };
                self.record(label, result);
            }
            Action::Reconnect => {
                self.surface.reconnect();
                self.link = LinkSnapshot::read(self.surface.link());
            }
            Action::Disconnect => {
                self.surface.disconnect();
                self.link = LinkSnapshot::read(self.surface.link());
            }
        }
    }

    async fn dispatch(&mut self, event: ControlEvent) {
        match self.surface.handle(event).await {
            Ok(result) => self.record(&event.control.to_string(), result),
            Err(e) => {
                warn!(control = %event.control, error = %e, "control event rejected");
                self.last = Some(LastCommand {
                    label: format!("{}: {e}", event.control),
                    ok: false,
                    at: Instant::now(),
                });
            }
        }
    }

    fn record(&mut self, name: &str, result: CommandResult) {
        debug!(command = %name, %result, "command finished");
        self.last = Some(LastCommand {
            label: format!("{name}: {result}"),
            ok: result.is_ok(),
            at: Instant::now(),
        });
    }

    // ── Rendering ────────────────────────────────────────────────

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        let [content_area, hint_area, status_area] = Layout::vertical([
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(area);

        self.render_controls(frame, content_area);
        Self::render_hints(frame, hint_area);
        self.render_status_bar(frame, status_area);

        if self.help_visible {
            Self::render_help_overlay(frame, area);
        }
    }

    fn render_controls(&self, frame: &mut Frame, area: Rect) {
        let border = if self.panel.enabled() {
            theme::border_focused()
        } else {
            theme::border_default()
        };
        let title = if self.panel.enabled() {
            format!(" RoArm · {} ", self.surface.device_host())
        } else {
            format!(" RoArm · {} (controls disabled) ", self.surface.device_host())
        };
        let block = Block::default()
            .title(title)
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(border);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let rows = Layout::vertical([Constraint::Length(2); 5]).split(inner);
        let selected = self.panel.selected();
        let enabled = self.panel.enabled();

        for ((control, raw), row) in self.panel.sliders().zip(rows.iter()) {
            slider::render_slider(frame, *row, control, raw, control == selected, enabled);
        }
        if let Some(row) = rows.get(ControlId::SLIDERS.len()) {
            slider::render_switch(
                frame,
                *row,
                self.panel.light(),
                selected == ControlId::LightSwitch,
                enabled,
            );
        }
    }

    fn render_hints(frame: &mut Frame, area: Rect) {
        let hints = Line::from(vec![
            Span::styled(" ↑↓ ", theme::key_hint_key()),
            Span::styled("select  ", theme::key_hint()),
            Span::styled("←→ ", theme::key_hint_key()),
            Span::styled("move  ", theme::key_hint()),
            Span::styled("space ", theme::key_hint_key()),
            Span::styled("light  ", theme::key_hint()),
            Span::styled("? ", theme::key_hint_key()),
            Span::styled("help  ", theme::key_hint()),
            Span::styled("q ", theme::key_hint_key()),
            Span::styled("quit", theme::key_hint()),
        ]);
        frame.render_widget(Paragraph::new(hints), area);
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let mut spans = vec![
            Span::raw(" "),
            status_indicator::status_span(&self.link.state),
            Span::styled(
                format!(" │ retries {}/{}", self.link.retries, self.link.max_retries),
                theme::key_hint(),
            ),
            Span::styled(
                format!(" │ torque {}", if self.surface.torque_enabled() { "on" } else { "off" }),
                theme::key_hint(),
            ),
        ];

        if let Some(last) = &self.last {
            let color = if last.ok {
                theme::SUCCESS_GREEN
            } else {
                theme::ERROR_RED
            };
            let ago = Duration::from_secs(last.at.elapsed().as_secs());
            spans.push(Span::styled(" │ ", theme::key_hint()));
            spans.push(Span::styled(last.label.clone(), Style::default().fg(color)));
            spans.push(Span::styled(
                format!(" ({} ago)", humantime::format_duration(ago)),
                theme::key_hint(),
            ));
        }

        let uptime = Duration::from_secs(self.started.elapsed().as_secs());
        spans.push(Span::styled(
            format!(" │ up {}", humantime::format_duration(uptime)),
            theme::key_hint(),
        ));

        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn render_help_overlay(frame: &mut Frame, area: Rect) {
        let help_width = 44u16.min(area.width.saturating_sub(4));
        let help_height = 15u16.min(area.height.saturating_sub(2));
        let x = area.width.saturating_sub(help_width) / 2;
        let y = area.height.saturating_sub(help_height) / 2;
        let help_area = Rect::new(area.x + x, area.y + y, help_width, help_height);

        frame.render_widget(Clear, help_area);
        let block = Block::default()
            .title(" Keyboard Shortcuts ")
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_focused())
            .style(Style::default().bg(theme::BG_DARK));
        let inner = block.inner(help_area);
        frame.render_widget(block, help_area);

        let entry = |key: &'static str, text: &'static str| {
            Line::from(vec![
                Span::styled(format!("  {key:<10}"), theme::key_hint_key()),
                Span::styled(text, theme::key_hint()),
            ])
        };
        let help_text = vec![
            Line::from(""),
            entry("↑/↓ j/k", "Select control"),
            entry("←/→ h/l", "Move slider by 5"),
            entry("Space", "Toggle light"),
            entry("H", "Home position"),
            entry("t", "Toggle torque"),
            entry("r", "Reconnect link"),
            entry("d", "Disconnect link"),
            entry("q", "Quit"),
            Line::from(""),
            Line::from(Span::styled("        Esc or ? to close", theme::key_hint())),
        ];
        frame.render_widget(Paragraph::new(help_text), inner);
    }
}
