//! Link status indicator: ●/○/◐/✕ with color mapping.

use ratatui::style::Style;
use ratatui::text::Span;
use roarm_core::ConnectionState;

use crate::theme;

/// Returns a styled `Span` with the status dot and the state text.
pub fn status_span(state: &ConnectionState) -> Span<'static> {
    let color = match state {
        ConnectionState::Connected(_) => theme::SUCCESS_GREEN,
        ConnectionState::Connecting => theme::ELECTRIC_YELLOW,
        ConnectionState::Disconnected => theme::DIM_WHITE,
        ConnectionState::Failed => theme::ERROR_RED,
    };
    Span::styled(
        format!("{} {state}", status_char(state)),
        Style::default().fg(color),
    )
}

/// Returns the status dot without styling.
pub fn status_char(state: &ConnectionState) -> &'static str {
    match state {
        ConnectionState::Connected(_) => "●",
        ConnectionState::Connecting => "◐",
        ConnectionState::Disconnected => "○",
        ConnectionState::Failed => "✕",
    }
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn dots_per_state() {
        let addr = IpAddr::V4(Ipv4Addr::new(192, 168, 4, 2));
        assert_eq!(status_char(&ConnectionState::Connected(addr)), "●");
        assert_eq!(status_char(&ConnectionState::Connecting), "◐");
        assert_eq!(status_char(&ConnectionState::Failed), "✕");
    }

    #[test]
    fn span_carries_state_text() {
        let span = status_span(&ConnectionState::Connecting);
        assert_eq!(span.content, format!("◐ {}", ConnectionState::Connecting));
        assert_eq!(span.style.fg, Some(theme::ELECTRIC_YELLOW));
    }
}
