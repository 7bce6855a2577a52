//! Keyboard state tracking with both edge-triggered and level-triggered queries.
//!
//! - **Level-triggered (held):** `is_held(key)` is true every frame the key is
//!   physically down. Movement commands are derived from this.
//!
//! - **Edge-triggered (just_pressed / just_released):** true only during the
//!   frame the transition happened, cleared by `end_frame()` which the frame
//!   driver calls after the frame sequence has consumed them.

use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    ArrowUp,
    ArrowRight,
    ArrowDown,
    ArrowLeft,
    W,
    A,
    S,
    D,
    Space,
    Escape,
}

impl Key {
    pub const ALL: &'static [Key] = &[
        Key::ArrowUp,
        Key::ArrowRight,
        Key::ArrowDown,
        Key::ArrowLeft,
        Key::W,
        Key::A,
        Key::S,
        Key::D,
        Key::Space,
        Key::Escape,
    ];

    /// Parse a DOM-style key name ("ArrowUp", "w", " ", "Escape").
    /// Letter keys are matched case-insensitively.
    pub fn from_name(name: &str) -> Option<Key> {
        match name {
            "ArrowUp" => Some(Key::ArrowUp),
            "ArrowRight" => Some(Key::ArrowRight),
            "ArrowDown" => Some(Key::ArrowDown),
            "ArrowLeft" => Some(Key::ArrowLeft),
            "w" | "W" => Some(Key::W),
            "a" | "A" => Some(Key::A),
            "s" | "S" => Some(Key::S),
            "d" | "D" => Some(Key::D),
            " " | "Space" => Some(Key::Space),
            "Escape" => Some(Key::Escape),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Key::ArrowUp => "ArrowUp",
            Key::ArrowRight => "ArrowRight",
            Key::ArrowDown => "ArrowDown",
            Key::ArrowLeft => "ArrowLeft",
            Key::W => "w",
            Key::A => "a",
            Key::S => "s",
            Key::D => "d",
            Key::Space => "Space",
            Key::Escape => "Escape",
        }
    }
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Default)]
pub struct InputState {
    held: HashSet<Key>,
    just_pressed: HashSet<Key>,
    just_released: HashSet<Key>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key_down(&mut self, key: Key) {
        if self.held.insert(key) {
            self.just_pressed.insert(key);
        }
    }

    pub fn key_up(&mut self, key: Key) {
        if self.held.remove(&key) {
            self.just_released.insert(key);
        }
    }

    /// Replace the held set wholesale, synthesizing edges for the difference.
    /// Replays describe each frame as "keys held this frame".
    pub fn set_held(&mut self, keys: &[Key]) {
        let next: HashSet<Key> = keys.iter().copied().collect();
        let released: Vec<Key> = self.held.difference(&next).copied().collect();
        for key in released {
            self.key_up(key);
        }
        for key in next {
            self.key_down(key);
        }
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    pub fn is_just_pressed(&self, key: Key) -> bool {
        self.just_pressed.contains(&key)
    }

    pub fn is_just_released(&self, key: Key) -> bool {
        self.just_released.contains(&key)
    }

    pub fn held_keys(&self) -> impl Iterator<Item = Key> + '_ {
        self.held.iter().copied()
    }

    /// Drop every held key, e.g. when the window loses focus or on teardown.
    pub fn release_all(&mut self) {
        let held: Vec<Key> = self.held.drain().collect();
        self.just_released.extend(held);
    }

    pub fn end_frame(&mut self) {
        self.just_pressed.clear();
        self.just_released.clear();
    }
}
