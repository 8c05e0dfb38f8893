use std::{collections::HashMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::InputError;

/// Prefix carried by every action identifier the chat adapter emits.
pub const ACTION_ID_PREFIX: &str = "GAME_INPUT_";

/// Origin recorded when the chat adapter cannot name the submitting user.
pub const UNKNOWN_ORIGIN: &str = "unknown";

/// The closed set of control inputs a crowd member can send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GameInput {
    Up,
    Down,
    Left,
    Right,
    A,
    B,
    Start,
    Select,
}

impl GameInput {
    pub const ALL: [GameInput; 8] = [
        GameInput::Up,
        GameInput::Down,
        GameInput::Left,
        GameInput::Right,
        GameInput::A,
        GameInput::B,
        GameInput::Start,
        GameInput::Select,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            GameInput::Up => "UP",
            GameInput::Down => "DOWN",
            GameInput::Left => "LEFT",
            GameInput::Right => "RIGHT",
            GameInput::A => "A",
            GameInput::B => "B",
            GameInput::Start => "START",
            GameInput::Select => "SELECT",
        }
    }

    /// Action identifier the chat adapter attaches to this input's button.
    pub fn action_id(self) -> String {
        format!("{ACTION_ID_PREFIX}{}", self.as_str())
    }

    /// Parses an action identifier of the form `GAME_INPUT_<NAME>`.
    pub fn from_action_id(action_id: &str) -> Result<Self, InputError> {
        action_id
            .strip_prefix(ACTION_ID_PREFIX)
            .and_then(|name| name.parse().ok())
            .ok_or_else(|| InputError::UnknownCommand(action_id.to_string()))
    }

    /// Button label shown on the control pad.
    pub fn label(self) -> &'static str {
        match self {
            GameInput::Up => "⬆",
            GameInput::Down => "⬇",
            GameInput::Left => "⬅",
            GameInput::Right => "➡️",
            GameInput::A => "🅰️",
            GameInput::B => "🅱️",
            GameInput::Start => "START",
            GameInput::Select => "SELECT",
        }
    }

    fn default_key(self) -> &'static str {
        match self {
            GameInput::Up => "Up",
            GameInput::Down => "Down",
            GameInput::Left => "Left",
            GameInput::Right => "Right",
            GameInput::A => "Z",
            GameInput::B => "X",
            GameInput::Start => "Enter",
            GameInput::Select => "Backspace",
        }
    }
}

impl fmt::Display for GameInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameInput {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GameInput::ALL
            .into_iter()
            .find(|input| input.as_str() == s)
            .ok_or_else(|| InputError::UnknownCommand(s.to_string()))
    }
}

/// A validated input paired with the key the target understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputCommand {
    pub input: GameInput,
    pub target_key: String,
}

/// Maps each input to the primitive key sent to the target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyMap {
    keys: HashMap<GameInput, String>,
}

impl Default for KeyMap {
    fn default() -> Self {
        Self {
            keys: GameInput::ALL
                .into_iter()
                .map(|input| (input, input.default_key().to_string()))
                .collect(),
        }
    }
}

impl KeyMap {
    pub fn set(&mut self, input: GameInput, key: impl Into<String>) {
        self.keys.insert(input, key.into());
    }

    pub fn key_for(&self, input: GameInput) -> &str {
        self.keys
            .get(&input)
            .map(String::as_str)
            .unwrap_or_else(|| input.default_key())
    }

    pub fn command_for(&self, input: GameInput) -> InputCommand {
        InputCommand {
            input,
            target_key: self.key_for(input).to_string(),
        }
    }
}

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod tests;
