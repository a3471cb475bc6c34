/// Input collector.
///
/// Drains every pending terminal event once per frame and keeps them in
/// arrival order, so two quick taps inside one frame are two punches.
///
///   - Key presses (Press only; auto-repeat from a held key is not a
///     new tap, and Release is ignored)
///   - Left mouse button presses, with the column they landed on
///
/// Mouse reporting must be switched on by the renderer
/// (`EnableMouseCapture`) for clicks to arrive.

use std::time::Duration;

use crossterm::event::{
    self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEventKind,
};

/// One discrete input, in the order it happened.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RawInput {
    Key(KeyCode),
    /// Left click / touch at terminal column `column`.
    Click { column: u16 },
}

pub struct InputState {
    /// Inputs collected during the most recent drain_events() call.
    pub inputs: Vec<RawInput>,

    /// Raw key events collected during drain, for modifier checks.
    raw_keys: Vec<KeyEvent>,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            inputs: Vec::with_capacity(8),
            raw_keys: Vec::with_capacity(8),
        }
    }

    /// Drain all pending terminal events.
    /// Call this once per frame, before the simulation tick.
    pub fn drain_events(&mut self) {
        self.inputs.clear();
        self.raw_keys.clear();

        // Read all available events without blocking
        while poll(Duration::ZERO).unwrap_or(false) {
            match event::read() {
                Ok(ev) => self.push_event(ev),
                Err(e) => {
                    log::warn!("input: event read failed: {e}");
                    break;
                }
            }
        }
    }

    fn push_event(&mut self, ev: Event) {
        match ev {
            Event::Key(key) => {
                match key.kind {
                    KeyEventKind::Press => {
                        self.raw_keys.push(key);
                        self.inputs.push(RawInput::Key(key.code));
                    }
                    KeyEventKind::Repeat => self.raw_keys.push(key),
                    KeyEventKind::Release => {}
                }
            }
            Event::Mouse(mouse) => {
                if let MouseEventKind::Down(MouseButton::Left) = mouse.kind {
                    self.inputs.push(RawInput::Click { column: mouse.column });
                }
            }
            _ => {}
        }
    }

    /// Was any of these keys pressed this frame?
    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        self.inputs.iter().any(|i| matches!(i, RawInput::Key(c) if codes.contains(c)))
    }

    /// Check if any raw event this frame has Ctrl+C
    pub fn ctrl_c_pressed(&self) -> bool {
        self.raw_keys.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEventState, MouseEvent};

    fn key(code: KeyCode, kind: KeyEventKind, modifiers: KeyModifiers) -> Event {
        Event::Key(KeyEvent { code, modifiers, kind, state: KeyEventState::NONE })
    }

    fn click(kind: MouseEventKind, column: u16) -> Event {
        Event::Mouse(MouseEvent { kind, column, row: 3, modifiers: KeyModifiers::NONE })
    }

    #[test]
    fn keeps_arrival_order() {
        let mut s = InputState::new();
        s.push_event(key(KeyCode::Left, KeyEventKind::Press, KeyModifiers::NONE));
        s.push_event(click(MouseEventKind::Down(MouseButton::Left), 70));
        s.push_event(key(KeyCode::Left, KeyEventKind::Press, KeyModifiers::NONE));
        assert_eq!(
            s.inputs,
            vec![
                RawInput::Key(KeyCode::Left),
                RawInput::Click { column: 70 },
                RawInput::Key(KeyCode::Left),
            ]
        );
    }

    #[test]
    fn held_key_is_one_tap() {
        let mut s = InputState::new();
        s.push_event(key(KeyCode::Left, KeyEventKind::Press, KeyModifiers::NONE));
        s.push_event(key(KeyCode::Left, KeyEventKind::Repeat, KeyModifiers::NONE));
        s.push_event(key(KeyCode::Left, KeyEventKind::Repeat, KeyModifiers::NONE));
        assert_eq!(s.inputs, vec![RawInput::Key(KeyCode::Left)]);
    }

    #[test]
    fn repeated_ctrl_c_still_quits() {
        let mut s = InputState::new();
        s.push_event(key(KeyCode::Char('c'), KeyEventKind::Repeat, KeyModifiers::CONTROL));
        assert!(s.inputs.is_empty());
        assert!(s.ctrl_c_pressed());
    }

    #[test]
    fn ignores_releases_and_other_mouse_events() {
        let mut s = InputState::new();
        s.push_event(key(KeyCode::Right, KeyEventKind::Release, KeyModifiers::NONE));
        s.push_event(click(MouseEventKind::Up(MouseButton::Left), 5));
        s.push_event(click(MouseEventKind::Down(MouseButton::Right), 5));
        s.push_event(click(MouseEventKind::Moved, 5));
        s.push_event(Event::FocusGained);
        assert!(s.inputs.is_empty());
    }

    #[test]
    fn ctrl_c_detection() {
        let mut s = InputState::new();
        s.push_event(key(KeyCode::Char('c'), KeyEventKind::Press, KeyModifiers::NONE));
        assert!(!s.ctrl_c_pressed());
        assert!(s.any_pressed(&[KeyCode::Char('c')]));
        s.push_event(key(KeyCode::Char('c'), KeyEventKind::Press, KeyModifiers::CONTROL));
        assert!(s.ctrl_c_pressed());
    }
}
