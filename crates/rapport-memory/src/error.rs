//! Error types for memory operations.

/// Errors returned by the turn store, semantic index, and cursor store.
#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization error.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    /// A turn log was written by a newer schema.
    #[error("unsupported turn log schema version: {0}")]
    UnsupportedSchema(u32),
    /// The embedder could not produce a vector.
    #[error("embedding error: {0}")]
    Embedding(String),
}
