//! Text generation boundary.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Speaker of a generation input turn.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::System => "system",
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

impl From<rapport_memory::Role> for ChatRole {
    fn from(role: rapport_memory::Role) -> Self {
        match role {
            rapport_memory::Role::User => ChatRole::User,
            rapport_memory::Role::Assistant => ChatRole::Assistant,
        }
    }
}

/// One entry of the model input.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(ChatRole::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ChatRole::User, content)
    }
}

/// Errors surfaced by a text generator.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(String),
    /// The provider answered with a non-success status.
    #[error("provider returned {status}: {message}")]
    Status { status: u16, message: String },
    /// The provider answered but the body had no usable text.
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),
    /// Generator is not usable as configured.
    #[error("generator misconfigured: {0}")]
    Config(String),
}

/// Black-box text completion used for replies, summaries, and scoring.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, turns: &[ChatTurn]) -> Result<String, GenerationError>;
}
