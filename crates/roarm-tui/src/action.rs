//! Actions produced by key handling and timers, consumed by `App::process_action`.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Slider step per arrow key press.
pub const NUDGE_STEP: i32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    Resize(u16, u16),
    Render,
    LinkPoll,
    RefreshStatus,
    ToggleHelp,

    // ── Control surface ──
    SelectNext,
    SelectPrev,
    /// Move the selected slider by a signed amount.
    Nudge(i32),
    ToggleLight,

    // ── Operator extras ──
    Home,
    ToggleTorque,
    Reconnect,
    Disconnect,
}

/// Map a key press to an action.
///
/// While the help overlay is open only the keys that close it (and quit) apply.
pub fn map_key(key: KeyEvent, help_visible: bool) -> Option<Action> {
    if let (KeyModifiers::CONTROL, KeyCode::Char('c')) = (key.modifiers, key.code) {
        return Some(Action::Quit);
    }

    if help_visible {
        return match key.code {
            KeyCode::Esc | KeyCode::Char('?') => Some(Action::ToggleHelp),
            KeyCode::Char('q') => Some(Action::Quit),
            _ => None,
        };
    }

    match key.code {
        KeyCode::Char('q') => Some(Action::Quit),
        KeyCode::Char('?') => Some(Action::ToggleHelp),
        KeyCode::Down | KeyCode::Char('j') | KeyCode::Tab => Some(Action::SelectNext),
        KeyCode::Up | KeyCode::Char('k') | KeyCode::BackTab => Some(Action::SelectPrev),
        KeyCode::Right | KeyCode::Char('l') => Some(Action::Nudge(NUDGE_STEP)),
        KeyCode::Left | KeyCode::Char('h') => Some(Action::Nudge(-NUDGE_STEP)),
        KeyCode::Char(' ') | KeyCode::Enter => Some(Action::ToggleLight),
        KeyCode::Char('H') => Some(Action::Home),
        KeyCode::Char('t') => Some(Action::ToggleTorque),
        KeyCode::Char('r') => Some(Action::Reconnect),
        KeyCode::Char('d') => Some(Action::Disconnect),
        _ => None,
    }
}
