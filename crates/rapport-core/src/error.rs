//! Error types for the conversation and recommendation services.

use crate::directory::DirectoryError;
use crate::generation::GenerationError;
use crate::recommendation::ExtractError;
use rapport_memory::MemoryError;
use thiserror::Error;

/// Errors returned by the turn controller and recommendation engine.
///
/// Unknown personas and empty conversations are outcomes, not errors; see
/// `TurnOutcome` and `AdvanceOutcome`.
#[derive(Debug, Error)]
pub enum RapportCoreError {
    /// Turn store, semantic index, or cursor store failure.
    #[error("memory error: {0}")]
    Memory(#[from] MemoryError),
    /// Text generation failed.
    #[error("generation error: {0}")]
    Generation(#[from] GenerationError),
    /// Persona or profile lookup failed.
    #[error("directory error: {0}")]
    Directory(#[from] DirectoryError),
    /// Scoring reply for the pair at `message_index` had no usable object.
    #[error("malformed scoring output for message {message_index}: {source}")]
    MalformedOutput {
        message_index: usize,
        #[source]
        source: ExtractError,
    },
}

/// Coarse failure category for callers that map errors to responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MalformedModelOutput,
    CollaboratorUnavailable,
    Storage,
}

impl RapportCoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RapportCoreError::Memory(_) => ErrorKind::Storage,
            RapportCoreError::Generation(_) | RapportCoreError::Directory(_) => {
                ErrorKind::CollaboratorUnavailable
            }
            RapportCoreError::MalformedOutput { .. } => ErrorKind::MalformedModelOutput,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorKind, RapportCoreError};
    use crate::generation::GenerationError;
    use crate::recommendation::ExtractError;
    use pretty_assertions::assert_eq;

    #[test]
    fn kinds_follow_the_failing_collaborator() {
        let generation = RapportCoreError::from(GenerationError::Transport("refused".into()));
        assert_eq!(generation.kind(), ErrorKind::CollaboratorUnavailable);

        let storage = RapportCoreError::from(rapport_memory::MemoryError::UnsupportedSchema(9));
        assert_eq!(storage.kind(), ErrorKind::Storage);

        let malformed = RapportCoreError::MalformedOutput {
            message_index: 2,
            source: ExtractError::NoObject,
        };
        assert_eq!(malformed.kind(), ErrorKind::MalformedModelOutput);
        assert!(malformed.to_string().contains("message 2"));
    }
}
