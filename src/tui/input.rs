//! Input dispatch layer for Elm Architecture (TEA) pattern.
//!
//! Maps key events to messages based on the current viewer mode.
//! Handles the `gg` chord with a non-blocking pending-key state machine.

use super::app::PromptKind;
use super::{App, Message};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::time::Instant;

/// Pending first key of a chord.
///
/// Instead of blocking with `event::poll()` inline, the pending key is kept
/// here and expired from the main event loop.
#[derive(Debug, Default)]
pub struct InputState {
    pub pending: Option<KeyCode>,
    pub pending_since: Option<Instant>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if there's a pending chord that has timed out (500ms).
    pub fn has_timed_out(&self) -> bool {
        self.pending_since
            .is_some_and(|since| since.elapsed().as_millis() > 500)
    }

    pub fn clear(&mut self) {
        self.pending = None;
        self.pending_since = None;
    }

    pub fn set_pending(&mut self, key: KeyCode) {
        self.pending = Some(key);
        self.pending_since = Some(Instant::now());
    }
}

/// Map key events to messages based on the current mode.
pub fn dispatch(app: &App, input: &mut InputState, key: KeyEvent) -> Message {
    if let Some(pending) = input.pending.take() {
        input.pending_since = None;
        return handle_chord(pending, key.code);
    }

    if app.prompt.is_some() {
        dispatch_prompt(key)
    } else if app.model.is_search_mode() {
        dispatch_search_mode(key)
    } else if app.model.is_sort_popup_open() {
        dispatch_sort_menu(key)
    } else {
        dispatch_normal_mode(input, key)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Mode-specific dispatch functions
// ─────────────────────────────────────────────────────────────────────────────

fn dispatch_normal_mode(input: &mut InputState, key: KeyEvent) -> Message {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('q') => Message::Quit,
        KeyCode::Char('r') => Message::Reload,

        KeyCode::Char('j') | KeyCode::Down => Message::MoveDown,
        KeyCode::Char('k') | KeyCode::Up => Message::MoveUp,
        KeyCode::Char('G') | KeyCode::End => Message::GotoBottom,
        KeyCode::Home => Message::GotoTop,
        KeyCode::Char('g') => {
            input.set_pending(KeyCode::Char('g'));
            Message::None
        }
        KeyCode::Char('d') if ctrl => Message::PageDown,
        KeyCode::Char('u') if ctrl => Message::PageUp,
        KeyCode::Char('f') if ctrl => Message::PageForwardFull,
        KeyCode::Char('b') if ctrl => Message::PageBackwardFull,
        KeyCode::PageDown => Message::PageForwardFull,
        KeyCode::PageUp => Message::PageBackwardFull,
        KeyCode::Char('p') => Message::JumpToParent,
        KeyCode::Char(']') => Message::NextSibling,
        KeyCode::Char('[') => Message::PrevSibling,
        KeyCode::Char('{') => Message::FirstSibling,
        KeyCode::Char('}') => Message::LastSibling,

        KeyCode::Char('l') | KeyCode::Right => Message::ExpandOrChild,
        KeyCode::Char('h') | KeyCode::Left => Message::CollapseOrParent,
        KeyCode::Char(' ') => Message::ToggleExpand,
        KeyCode::Enter => Message::CycleNodeVisibility,
        KeyCode::BackTab => Message::CycleGlobalVisibility,
        KeyCode::Char('E') => Message::ToggleExpandAll,
        KeyCode::Char(c @ '1'..='9') => Message::ExpandToLevel(c as usize - '0' as usize),

        KeyCode::Char('m') => Message::ToggleMark,
        KeyCode::Char('M') => Message::UnmarkAll,
        KeyCode::Char('b') => Message::ToggleBookmark,
        KeyCode::Char('B') => Message::CycleBookmark,

        KeyCode::Char('x') => Message::ToggleXRay,
        KeyCode::Char('t') => Message::ToggleFlatMode,
        KeyCode::Char('w') => Message::ToggleFollowMode,
        KeyCode::Esc => Message::Escape,

        KeyCode::Char('s') => Message::CycleSortMode,
        KeyCode::Char('S') => Message::ToggleSortMenu,
        KeyCode::Char('f') => Message::CycleFilter,
        KeyCode::Char(':') => Message::OpenPrompt(PromptKind::Filter),
        KeyCode::Char('o') => Message::OpenPrompt(PromptKind::Occur),

        KeyCode::Char('/') => Message::EnterSearch,
        KeyCode::Char('n') => Message::NextMatch,
        KeyCode::Char('N') => Message::PrevMatch,
        _ => Message::None,
    }
}

fn dispatch_search_mode(key: KeyEvent) -> Message {
    match key.code {
        KeyCode::Esc => Message::CancelSearch,
        KeyCode::Enter => Message::ConfirmSearch,
        KeyCode::Backspace => Message::SearchBackspace,
        KeyCode::Char(c) => Message::SearchInput(c),
        _ => Message::None,
    }
}

fn dispatch_sort_menu(key: KeyEvent) -> Message {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('S') => Message::ToggleSortMenu,
        KeyCode::Char('j') | KeyCode::Down => Message::SortMenuDown,
        KeyCode::Char('k') | KeyCode::Up => Message::SortMenuUp,
        KeyCode::Enter => Message::SortMenuSelect,
        _ => Message::None,
    }
}

fn dispatch_prompt(key: KeyEvent) -> Message {
    match key.code {
        KeyCode::Esc => Message::PromptCancel,
        KeyCode::Enter => Message::PromptConfirm,
        KeyCode::Backspace => Message::PromptBackspace,
        KeyCode::Char(c) => Message::PromptInput(c),
        _ => Message::None,
    }
}

fn handle_chord(first: KeyCode, second: KeyCode) -> Message {
    match (first, second) {
        (KeyCode::Char('g'), KeyCode::Char('g')) => Message::GotoTop,
        _ => Message::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEventKind, KeyEventState};

    fn key_event(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::empty(),
            kind: KeyEventKind::Press,
            state: KeyEventState::empty(),
        }
    }

    fn key_event_ctrl(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::CONTROL,
            kind: KeyEventKind::Press,
            state: KeyEventState::empty(),
        }
    }

    #[test]
    fn test_normal_mode_quit() {
        let mut input = InputState::new();
        let msg = dispatch_normal_mode(&mut input, key_event(KeyCode::Char('q')));
        assert_eq!(msg, Message::Quit);
    }

    #[test]
    fn test_normal_mode_navigation() {
        let mut input = InputState::new();
        assert_eq!(
            dispatch_normal_mode(&mut input, key_event(KeyCode::Char('j'))),
            Message::MoveDown
        );
        assert_eq!(
            dispatch_normal_mode(&mut input, key_event(KeyCode::Char(']'))),
            Message::NextSibling
        );
        assert_eq!(
            dispatch_normal_mode(&mut input, key_event(KeyCode::Left)),
            Message::CollapseOrParent
        );
    }

    #[test]
    fn test_half_and_full_page_keys() {
        let mut input = InputState::new();
        assert_eq!(
            dispatch_normal_mode(&mut input, key_event_ctrl(KeyCode::Char('d'))),
            Message::PageDown
        );
        assert_eq!(
            dispatch_normal_mode(&mut input, key_event_ctrl(KeyCode::Char('f'))),
            Message::PageForwardFull
        );
        // Without ctrl, `f` cycles the filter
        assert_eq!(
            dispatch_normal_mode(&mut input, key_event(KeyCode::Char('f'))),
            Message::CycleFilter
        );
    }

    #[test]
    fn test_level_digits() {
        let mut input = InputState::new();
        assert_eq!(
            dispatch_normal_mode(&mut input, key_event(KeyCode::Char('3'))),
            Message::ExpandToLevel(3)
        );
        assert_eq!(
            dispatch_normal_mode(&mut input, key_event(KeyCode::Char('0'))),
            Message::None
        );
    }

    #[test]
    fn test_chord_pending_state() {
        let mut input = InputState::new();
        let msg = dispatch_normal_mode(&mut input, key_event(KeyCode::Char('g')));
        assert_eq!(msg, Message::None);
        assert_eq!(input.pending, Some(KeyCode::Char('g')));
        assert_eq!(handle_chord(KeyCode::Char('g'), KeyCode::Char('g')), Message::GotoTop);
        assert_eq!(handle_chord(KeyCode::Char('g'), KeyCode::Char('x')), Message::None);
    }

    #[test]
    fn test_search_mode() {
        assert_eq!(dispatch_search_mode(key_event(KeyCode::Esc)), Message::CancelSearch);
        assert_eq!(dispatch_search_mode(key_event(KeyCode::Enter)), Message::ConfirmSearch);
        assert_eq!(
            dispatch_search_mode(key_event(KeyCode::Char('q'))),
            Message::SearchInput('q')
        );
    }

    #[test]
    fn test_prompt_keys() {
        assert_eq!(dispatch_prompt(key_event(KeyCode::Enter)), Message::PromptConfirm);
        assert_eq!(dispatch_prompt(key_event(KeyCode::Char('x'))), Message::PromptInput('x'));
    }

    #[test]
    fn test_input_state_timeout() {
        let mut input = InputState::new();
        assert!(!input.has_timed_out());
        input.set_pending(KeyCode::Char('g'));
        assert!(!input.has_timed_out());
        input.clear();
        assert!(input.pending.is_none());
    }
}
