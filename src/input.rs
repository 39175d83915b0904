//! Keyboard and mouse state fed by the host window.

use std::collections::HashSet;

/// Named keys plus printable characters.
///
/// Letters are stored uppercase so `Char('w')` and `Char('W')` are the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Char(char),
    Space,
    Enter,
    Tab,
    Backspace,
    Shift,
    Ctrl,
    Alt,
    Escape,
    Up,
    Down,
    Left,
    Right,
}

impl Key {
    pub fn char(c: char) -> Self {
        Key::Char(c.to_ascii_uppercase())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MouseState {
    pub down: bool,
    /// Cursor position relative to the render surface, in pixels.
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone)]
pub struct InputState {
    keys: HashSet<Key>,
    mouse: MouseState,
    has_focus: bool,
}

impl Default for InputState {
    fn default() -> Self {
        Self {
            keys: HashSet::new(),
            mouse: MouseState::default(),
            has_focus: true,
        }
    }
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key_down(&mut self, key: Key) {
        self.keys.insert(normalize(key));
    }

    pub fn key_up(&mut self, key: Key) {
        self.keys.remove(&normalize(key));
    }

    pub fn is_pressed(&self, key: Key) -> bool {
        self.keys.contains(&normalize(key))
    }

    /// True if any of `keys` is held.
    pub fn any_pressed(&self, keys: &[Key]) -> bool {
        keys.iter().any(|k| self.is_pressed(*k))
    }

    pub fn mouse(&self) -> MouseState {
        self.mouse
    }

    pub fn mouse_down(&mut self) {
        self.mouse.down = true;
    }

    pub fn mouse_up(&mut self) {
        self.mouse.down = false;
    }

    pub fn mouse_move(&mut self, x: f32, y: f32) {
        self.mouse.x = x;
        self.mouse.y = y;
    }

    pub fn has_focus(&self) -> bool {
        self.has_focus
    }

    /// Focus left the surface: drop every held key and the mouse button.
    pub fn blur(&mut self) {
        self.has_focus = false;
        self.reset();
    }

    /// Focus came back. State is only reset on an actual transition.
    pub fn focus(&mut self) {
        if !self.has_focus {
            self.has_focus = true;
            self.reset();
        }
    }

    pub fn reset(&mut self) {
        self.keys.clear();
        self.mouse = MouseState::default();
    }
}

fn normalize(key: Key) -> Key {
    match key {
        Key::Char(c) => Key::char(c),
        other => other,
    }
}
