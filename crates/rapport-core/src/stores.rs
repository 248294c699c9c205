//! The three per-conversation stores, bundled for the services.

use rapport_memory::{
    CursorStore, Embedder, FileCursorStore, FileSemanticIndex, FileTurnStore, MemoryError,
    SemanticIndex, TurnStore,
};
use std::path::Path;
use std::sync::Arc;

/// Turn log, semantic index, and recommendation cursors.
#[derive(Clone)]
pub struct MemoryStores {
    pub turns: Arc<dyn TurnStore>,
    pub index: Arc<dyn SemanticIndex>,
    pub cursors: Arc<dyn CursorStore>,
}

impl MemoryStores {
    pub fn new(
        turns: Arc<dyn TurnStore>,
        index: Arc<dyn SemanticIndex>,
        cursors: Arc<dyn CursorStore>,
    ) -> Self {
        Self {
            turns,
            index,
            cursors,
        }
    }

    /// File-backed stores under `root/{turns,fragments,cursors}`.
    pub fn open_files(root: &Path, embedder: Arc<dyn Embedder>) -> Result<Self, MemoryError> {
        Ok(Self::new(
            Arc::new(FileTurnStore::new(root.join("turns"))?),
            Arc::new(FileSemanticIndex::new(root.join("fragments"), embedder)?),
            Arc::new(FileCursorStore::new(root.join("cursors"))?),
        ))
    }
}
