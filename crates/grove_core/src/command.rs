//! Discrete movement commands derived from raw key state.
//!
//! Each command is bound to one or more keys (arrow keys plus WASD by
//! default). The mapper is evaluated once per frame against the level-triggered
//! key state and yields the set of active commands; order is irrelevant.

use glam::Vec2;
use serde::Deserialize;

use crate::input::{InputState, Key};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Command {
    MoveUp,
    MoveRight,
    MoveDown,
    MoveLeft,
}

impl Command {
    pub const ALL: [Command; 4] = [
        Command::MoveUp,
        Command::MoveRight,
        Command::MoveDown,
        Command::MoveLeft,
    ];

    fn bit(self) -> u8 {
        match self {
            Command::MoveUp => 1,
            Command::MoveRight => 1 << 1,
            Command::MoveDown => 1 << 2,
            Command::MoveLeft => 1 << 3,
        }
    }

    /// Screen-space axis contribution (+y is down).
    pub fn axis(self) -> Vec2 {
        match self {
            Command::MoveUp => Vec2::new(0.0, -1.0),
            Command::MoveRight => Vec2::new(1.0, 0.0),
            Command::MoveDown => Vec2::new(0.0, 1.0),
            Command::MoveLeft => Vec2::new(-1.0, 0.0),
        }
    }
}

/// Set of currently active commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CommandState {
    bits: u8,
}

impl CommandState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_commands(commands: &[Command]) -> Self {
        let mut state = Self::new();
        for &command in commands {
            state.insert(command);
        }
        state
    }

    pub fn insert(&mut self, command: Command) {
        self.bits |= command.bit();
    }

    pub fn remove(&mut self, command: Command) {
        self.bits &= !command.bit();
    }

    pub fn contains(&self, command: Command) -> bool {
        self.bits & command.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Command> + '_ {
        Command::ALL.into_iter().filter(|c| self.contains(*c))
    }

    /// Sum of the active axes, not normalized. Opposing commands cancel.
    pub fn direction(&self) -> Vec2 {
        self.iter().map(Command::axis).sum()
    }
}

#[derive(Debug, Clone)]
pub struct CommandMapper {
    bindings: Vec<(Command, Vec<Key>)>,
}

impl CommandMapper {
    pub fn new(bindings: Vec<(Command, Vec<Key>)>) -> Self {
        Self { bindings }
    }

    /// Rebind a command, replacing its previous keys.
    pub fn bind(&mut self, command: Command, keys: Vec<Key>) {
        if let Some(entry) = self.bindings.iter_mut().find(|(c, _)| *c == command) {
            entry.1 = keys;
        } else {
            self.bindings.push((command, keys));
        }
    }

    pub fn keys_for(&self, command: Command) -> &[Key] {
        self.bindings
            .iter()
            .find(|(c, _)| *c == command)
            .map(|(_, keys)| keys.as_slice())
            .unwrap_or(&[])
    }

    pub fn map(&self, input: &InputState) -> CommandState {
        let mut state = CommandState::new();
        for (command, keys) in &self.bindings {
            if keys.iter().any(|k| input.is_held(*k)) {
                state.insert(*command);
            }
        }
        state
    }
}

impl Default for CommandMapper {
    fn default() -> Self {
        Self::new(vec![
            (Command::MoveUp, vec![Key::ArrowUp, Key::W]),
            (Command::MoveRight, vec![Key::ArrowRight, Key::D]),
            (Command::MoveDown, vec![Key::ArrowDown, Key::S]),
            (Command::MoveLeft, vec![Key::ArrowLeft, Key::A]),
        ])
    }
}
