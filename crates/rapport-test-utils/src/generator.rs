use async_trait::async_trait;
use parking_lot::Mutex;
use rapport_core::{ChatTurn, GenerationError, TextGenerator};
use std::collections::VecDeque;
use std::sync::Arc;

/// Every input a generator has been called with, in call order.
pub type SeenTurns = Arc<Mutex<Vec<Vec<ChatTurn>>>>;

/// Answers with the same text and records every input.
#[derive(Debug, Clone)]
pub struct RecordingGenerator {
    response: String,
    seen: SeenTurns,
}

impl RecordingGenerator {
    pub fn new(response: impl Into<String>) -> (Self, SeenTurns) {
        let seen = SeenTurns::default();
        (
            Self {
                response: response.into(),
                seen: seen.clone(),
            },
            seen,
        )
    }
}

#[async_trait]
impl TextGenerator for RecordingGenerator {
    async fn generate(&self, turns: &[ChatTurn]) -> Result<String, GenerationError> {
        self.seen.lock().push(turns.to_vec());
        Ok(self.response.clone())
    }
}

/// Replays queued outcomes in order and records every input. Calls beyond
/// the script fail with a transport error.
#[derive(Debug, Clone, Default)]
pub struct ScriptedGenerator {
    script: Arc<Mutex<VecDeque<Result<String, String>>>>,
    seen: SeenTurns,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful reply.
    pub fn then_reply(self, reply: impl Into<String>) -> Self {
        self.script.lock().push_back(Ok(reply.into()));
        self
    }

    /// Queue a transport failure.
    pub fn then_fail(self, message: impl Into<String>) -> Self {
        self.script.lock().push_back(Err(message.into()));
        self
    }

    /// Queue more replies after construction.
    pub fn push_reply(&self, reply: impl Into<String>) {
        self.script.lock().push_back(Ok(reply.into()));
    }

    pub fn seen(&self) -> SeenTurns {
        self.seen.clone()
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().len()
    }

    pub fn remaining(&self) -> usize {
        self.script.lock().len()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, turns: &[ChatTurn]) -> Result<String, GenerationError> {
        self.seen.lock().push(turns.to_vec());
        match self.script.lock().pop_front() {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(message)) => Err(GenerationError::Transport(message)),
            None => Err(GenerationError::Transport("script exhausted".to_string())),
        }
    }
}

/// Fails every call.
#[derive(Debug, Clone)]
pub struct FailingGenerator {
    message: String,
}

impl FailingGenerator {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl TextGenerator for FailingGenerator {
    async fn generate(&self, _turns: &[ChatTurn]) -> Result<String, GenerationError> {
        Err(GenerationError::Transport(self.message.clone()))
    }
}
