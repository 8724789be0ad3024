use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind};

/// Device-neutral key identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Enter,
    Backspace,
    Escape,
    Up,
    Down,
    Left,
    Right,
    Other,
}

/// One discrete player response: a key or a pointer press at a cell position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Key(Key),
    Pointer { x: u16, y: u16 },
}

impl InputEvent {
    pub fn char(c: char) -> Self {
        InputEvent::Key(Key::Char(c))
    }
}

impl From<KeyCode> for Key {
    fn from(code: KeyCode) -> Self {
        match code {
            KeyCode::Char(c) => Key::Char(c),
            KeyCode::Enter => Key::Enter,
            KeyCode::Backspace => Key::Backspace,
            KeyCode::Esc => Key::Escape,
            KeyCode::Up => Key::Up,
            KeyCode::Down => Key::Down,
            KeyCode::Left => Key::Left,
            KeyCode::Right => Key::Right,
            _ => Key::Other,
        }
    }
}

/// Key releases and repeats are not responses
pub fn from_key_event(key: &KeyEvent) -> Option<InputEvent> {
    match key.kind {
        KeyEventKind::Press => Some(InputEvent::Key(key.code.into())),
        _ => None,
    }
}

/// Only button presses count; moves, drags and releases are dropped
pub fn from_mouse_event(mouse: &MouseEvent) -> Option<InputEvent> {
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => Some(InputEvent::Pointer {
            x: mouse.column,
            y: mouse.row,
        }),
        _ => None,
    }
}
