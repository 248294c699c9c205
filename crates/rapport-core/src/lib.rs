//! Conversation orchestration for Rapport.
//!
//! This crate owns the context assembler, the turn controller that answers
//! each user message as a persona, and the recommendation engine that coaches
//! the user pair by pair. Storage lives in `rapport-memory`; text generation
//! and persona/profile lookup are collaborator traits defined here.

pub mod context;
pub mod conversation;
pub mod directory;
pub mod error;
pub mod generation;
pub mod locks;
mod prompt;
pub mod providers;
pub mod recommendation;
pub mod stores;
pub mod types;

/// Prompt assembly.
pub use context::{ContextAssembler, ELISION_MARKER, HistoryCompaction, compress_history};
/// Turn controller.
pub use conversation::{
    ForgetOutcome, PERSONA_NOT_FOUND_REPLY, TurnController, TurnOutcome, TurnSettings,
};
/// Persona and profile lookup.
pub use directory::{DirectoryError, PersonaDirectory, ProfileDirectory, StaticDirectory};
pub use error::{ErrorKind, RapportCoreError};
/// Text generation boundary.
pub use generation::{ChatRole, ChatTurn, GenerationError, TextGenerator};
pub use locks::KeyLocks;
pub use providers::{OpenAiCompatibleGenerator, generator_from_config};
/// Recommendation engine and structured output extraction.
pub use recommendation::{
    AdvanceOutcome, CoachingReply, ExtractError, RecommendationEngine, extract_object,
};
pub use stores::MemoryStores;
pub use types::{Persona, PersonaTraits, UserProfile};
