use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    NotFound,
    Config,
    Internal,
}

#[derive(Debug, Error)]
pub enum BotError {
    #[error("user {0} not found")]
    UserNotFound(UserId),
    #[error("user {0} has no profile card to edit")]
    MissingProfileCard(UserId),
    #[error("configuration error: {0}")]
    Config(String),
}

impl BotError {
    pub fn code(&self) -> ErrorCode {
        match self {
            BotError::UserNotFound(_) | BotError::MissingProfileCard(_) => ErrorCode::NotFound,
            BotError::Config(_) => ErrorCode::Config,
        }
    }
}

/// Walks an error's source chain and reports the first [`BotError`] code found.
pub fn classify(error: &(dyn std::error::Error + 'static)) -> ErrorCode {
    let mut current = Some(error);
    while let Some(err) = current {
        if let Some(bot_error) = err.downcast_ref::<BotError>() {
            return bot_error.code();
        }
        current = err.source();
    }
    ErrorCode::Internal
}
