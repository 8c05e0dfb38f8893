use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    UnknownCommand,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Rejections raised while validating an inbound action.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("unknown command: {0}")]
    UnknownCommand(String),
}

impl From<InputError> for ApiError {
    fn from(value: InputError) -> Self {
        match value {
            InputError::UnknownCommand(_) => {
                Self::new(ErrorCode::UnknownCommand, value.to_string())
            }
        }
    }
}
