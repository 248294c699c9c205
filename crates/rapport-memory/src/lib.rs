//! Conversation memory for Rapport.
//!
//! Everything here is partitioned by [`ConversationKey`]: the ordered turn
//! log with its rolling summary, the embedded fragments used for semantic
//! recall, and the recommendation cursor.

pub mod cursor;
pub mod embedding;
pub mod error;
mod layout;
pub mod model;
pub mod semantic;
pub mod turns;

/// Recommendation cursor persistence.
pub use cursor::{CursorStore, FileCursorStore};
/// Text embedders.
pub use embedding::{DEFAULT_DIMENSIONS, Embedder, HashingEmbedder, cosine_similarity};
/// Memory error type.
pub use error::MemoryError;
/// Records shared by every store.
pub use model::{
    ConversationKey, MemoryFragment, Message, Recommendation, RecommendationCursor,
    RecalledFragment, Role,
};
/// Semantic memory index.
pub use semantic::{FileSemanticIndex, SemanticIndex};
/// Turn log and rolling summary.
pub use turns::{FileTurnStore, TurnStore};
