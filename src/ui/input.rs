/// Keyboard input → `KeyCommand` queue.
///
/// Every Press/Repeat event that maps to a command is queued; the game
/// loop takes at most one per tick. The queue is short so that holding a
/// key down does not build up a backlog of moves that keep playing after
/// release.
///
/// ### Key map
/// ┌─────────────────────────┬───────────────┐
/// │ Key                     │ Command       │
/// ├─────────────────────────┼───────────────┤
/// │ ←↑↓→ / WASD             │ Move          │
/// │ Space                   │ Fire squirt   │
/// │ Z                       │ Sonar         │
/// │ Tab                     │ Drop gold     │
/// │ Esc                     │ Give up       │
/// └─────────────────────────┴───────────────┘

use std::collections::VecDeque;
use std::time::Duration;

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::domain::entity::{Direction, KeyCommand};

/// Commands waiting for a tick beyond this are dropped.
const MAX_PENDING: usize = 3;

pub struct InputState {
    pending: VecDeque<KeyCommand>,

    /// Raw key events collected during the last drain, for meta keys.
    pub raw_events: Vec<KeyEvent>,
}

/// Map a key to its game command.
pub fn decode_key(code: KeyCode) -> Option<KeyCommand> {
    let cmd = match code {
        KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('A') => KeyCommand::Move(Direction::Left),
        KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('D') => KeyCommand::Move(Direction::Right),
        KeyCode::Up | KeyCode::Char('w') | KeyCode::Char('W') => KeyCommand::Move(Direction::Up),
        KeyCode::Down | KeyCode::Char('s') | KeyCode::Char('S') => KeyCommand::Move(Direction::Down),
        KeyCode::Char(' ') => KeyCommand::Fire,
        KeyCode::Char('z') | KeyCode::Char('Z') => KeyCommand::Sonar,
        KeyCode::Tab => KeyCommand::DropGold,
        KeyCode::Esc => KeyCommand::Quit,
        _ => return None,
    };
    Some(cmd)
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            pending: VecDeque::with_capacity(MAX_PENDING),
            raw_events: Vec::with_capacity(8),
        }
    }

    /// Drain all pending terminal events without blocking.
    /// Call once per frame.
    pub fn drain_events(&mut self) {
        self.raw_events.clear();

        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.accept(key);
            }
        }
    }

    fn accept(&mut self, key: KeyEvent) {
        if key.kind == KeyEventKind::Release { return; }
        self.raw_events.push(key);
        if key.modifiers.contains(KeyModifiers::CONTROL) { return; }
        if let Some(cmd) = decode_key(key.code) {
            if self.pending.len() < MAX_PENDING {
                self.pending.push_back(cmd);
            }
        }
    }

    /// The command for this tick, if any.
    pub fn next_command(&mut self) -> Option<KeyCommand> {
        self.pending.pop_front()
    }

    pub fn clear_pending(&mut self) {
        self.pending.clear();
    }

    /// Was any of these keys pressed during the last drain?
    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        self.raw_events.iter().any(|k| codes.contains(&k.code))
    }

    /// Check if any raw event this frame has Ctrl+C
    pub fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }
}

impl Default for InputState {
    fn default() -> Self {
        InputState::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn key_map() {
        assert_eq!(decode_key(KeyCode::Left), Some(KeyCommand::Move(Direction::Left)));
        assert_eq!(decode_key(KeyCode::Char('w')), Some(KeyCommand::Move(Direction::Up)));
        assert_eq!(decode_key(KeyCode::Char(' ')), Some(KeyCommand::Fire));
        assert_eq!(decode_key(KeyCode::Char('Z')), Some(KeyCommand::Sonar));
        assert_eq!(decode_key(KeyCode::Tab), Some(KeyCommand::DropGold));
        assert_eq!(decode_key(KeyCode::Esc), Some(KeyCommand::Quit));
        assert_eq!(decode_key(KeyCode::Char('q')), None);
    }

    #[test]
    fn one_command_per_tick_in_order() {
        let mut input = InputState::new();
        input.accept(press(KeyCode::Left));
        input.accept(press(KeyCode::Char(' ')));
        assert_eq!(input.next_command(), Some(KeyCommand::Move(Direction::Left)));
        assert_eq!(input.next_command(), Some(KeyCommand::Fire));
        assert_eq!(input.next_command(), None);
    }

    #[test]
    fn backlog_is_capped() {
        let mut input = InputState::new();
        for _ in 0..10 {
            input.accept(press(KeyCode::Right));
        }
        let mut n = 0;
        while input.next_command().is_some() {
            n += 1;
        }
        assert_eq!(n, MAX_PENDING);
    }

    #[test]
    fn ctrl_c_is_not_a_command() {
        let mut input = InputState::new();
        input.accept(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(input.ctrl_c_pressed());
        assert_eq!(input.next_command(), None);
    }

    #[test]
    fn releases_are_ignored() {
        let mut input = InputState::new();
        let mut key = press(KeyCode::Tab);
        key.kind = KeyEventKind::Release;
        input.accept(key);
        assert_eq!(input.next_command(), None);
        assert!(!input.any_pressed(&[KeyCode::Tab]));
    }
}
