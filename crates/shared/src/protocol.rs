use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{GameInput, InputCommand};

/// One accepted action. Created once by the gateway and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputEvent {
    pub timestamp: DateTime<Utc>,
    pub origin_id: String,
    pub command: InputCommand,
}

impl InputEvent {
    pub fn new(origin_id: impl Into<String>, command: InputCommand) -> Self {
        Self {
            timestamp: Utc::now(),
            origin_id: origin_id.into(),
            command,
        }
    }

    pub fn ledger_record(&self) -> LedgerRecord {
        LedgerRecord {
            date: self.timestamp,
            username: self.origin_id.clone(),
            input: self.command.input,
        }
    }

    pub fn observer_frame(&self) -> ObserverFrame {
        ObserverFrame {
            username: self.origin_id.clone(),
            input: self.command.input,
        }
    }
}

/// A single line of the input ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRecord {
    pub date: DateTime<Utc>,
    pub username: String,
    pub input: GameInput,
}

/// Text frame pushed to every live observer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObserverFrame {
    pub username: String,
    pub input: GameInput,
}

/// Payload the chat adapter posts for each button press.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionRequest {
    pub action_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// A control pad button: the action identifier and its label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlButton {
    pub action_id: String,
    pub label: String,
}

pub fn control_pad() -> Vec<ControlButton> {
    GameInput::ALL
        .into_iter()
        .map(|input| ControlButton {
            action_id: input.action_id(),
            label: input.label().to_string(),
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DispatchStats {
    pub enqueued: u64,
    pub completed: u64,
    pub failed: u64,
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
