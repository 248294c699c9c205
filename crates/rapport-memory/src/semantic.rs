//! Per-conversation similarity recall over embedded messages.

use crate::embedding::{Embedder, cosine_similarity};
use crate::error::MemoryError;
use crate::layout::{key_path, open_append, read_jsonl, remove_if_exists};
use crate::model::{ConversationKey, MemoryFragment, RecalledFragment, Role};
use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info, warn};
use parking_lot::Mutex;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

/// k-NN text store partitioned by conversation key.
#[async_trait]
pub trait SemanticIndex: Send + Sync {
    /// Embed and store one message.
    async fn index(&self, key: &ConversationKey, role: Role, text: &str)
    -> Result<(), MemoryError>;

    /// Up to `top_k` fragments of `key` nearest to `text`, most similar first.
    /// Equal similarities keep insertion order.
    async fn query(
        &self,
        key: &ConversationKey,
        text: &str,
        top_k: usize,
    ) -> Result<Vec<RecalledFragment>, MemoryError>;

    /// Drop every fragment of `key`. Returns whether any existed.
    async fn delete(&self, key: &ConversationKey) -> Result<bool, MemoryError>;
}

/// Semantic index storing one JSONL file of fragments per key and ranking
/// them by brute-force cosine similarity.
pub struct FileSemanticIndex {
    root: PathBuf,
    embedder: Arc<dyn Embedder>,
    write_lock: Mutex<()>,
}

impl FileSemanticIndex {
    pub fn new(root: impl AsRef<Path>, embedder: Arc<dyn Embedder>) -> Result<Self, MemoryError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        info!(
            "initialized file semantic index (root={}, dimensions={})",
            root.display(),
            embedder.dimensions()
        );
        Ok(Self {
            root,
            embedder,
            write_lock: Mutex::new(()),
        })
    }

    fn fragments_path(&self, key: &ConversationKey) -> PathBuf {
        key_path(&self.root, key, "fragments.jsonl")
    }

    fn load_fragments(&self, key: &ConversationKey) -> Result<Vec<MemoryFragment>, MemoryError> {
        read_jsonl(&self.fragments_path(key))
    }
}

#[async_trait]
impl SemanticIndex for FileSemanticIndex {
    async fn index(
        &self,
        key: &ConversationKey,
        role: Role,
        text: &str,
    ) -> Result<(), MemoryError> {
        let embedding = self.embedder.embed(text).await?;
        let fragment = MemoryFragment {
            id: Uuid::new_v4(),
            role,
            text: text.to_string(),
            embedding,
            created_at: Utc::now(),
        };
        let mut line = serde_json::to_string(&fragment)?;
        line.push('\n');

        let _guard = self.write_lock.lock();
        let (mut file, _) = open_append(&self.fragments_path(key))?;
        file.write_all(line.as_bytes())?;
        file.sync_data()?;
        debug!(
            "indexed fragment (key={}, id={}, role={})",
            key, fragment.id, role
        );
        Ok(())
    }

    async fn query(
        &self,
        key: &ConversationKey,
        text: &str,
        top_k: usize,
    ) -> Result<Vec<RecalledFragment>, MemoryError> {
        if top_k == 0 {
            return Ok(Vec::new());
        }
        let fragments = self.load_fragments(key)?;
        if fragments.is_empty() {
            return Ok(Vec::new());
        }
        let query = self.embedder.embed(text).await?;

        let mut scored = Vec::with_capacity(fragments.len());
        let mut skipped = 0usize;
        for fragment in fragments {
            if fragment.embedding.len() != query.len() {
                skipped += 1;
                continue;
            }
            let similarity = cosine_similarity(&query, &fragment.embedding);
            scored.push(RecalledFragment {
                role: fragment.role,
                text: fragment.text,
                similarity,
            });
        }
        if skipped > 0 {
            warn!(
                "skipped fragments with mismatched dimensions (key={}, skipped={}, expected={})",
                key,
                skipped,
                query.len()
            );
        }
        // sort_by is stable, so ties keep insertion order.
        scored.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        scored.truncate(top_k);
        debug!("queried fragments (key={}, returned={})", key, scored.len());
        Ok(scored)
    }

    async fn delete(&self, key: &ConversationKey) -> Result<bool, MemoryError> {
        let _guard = self.write_lock.lock();
        let existed = remove_if_exists(&self.fragments_path(key))?;
        info!("deleted fragments (key={}, existed={})", key, existed);
        Ok(existed)
    }
}

#[cfg(test)]
mod tests {
    use super::{FileSemanticIndex, SemanticIndex};
    use crate::embedding::{Embedder, HashingEmbedder};
    use crate::error::MemoryError;
    use crate::model::{ConversationKey, Role};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn index_at(path: &std::path::Path) -> FileSemanticIndex {
        FileSemanticIndex::new(path, Arc::new(HashingEmbedder::default())).expect("index")
    }

    /// Maps every text to the same vector so every similarity ties.
    struct ConstantEmbedder;

    #[async_trait]
    impl Embedder for ConstantEmbedder {
        fn dimensions(&self) -> usize {
            2
        }

        async fn embed(&self, _text: &str) -> Result<Vec<f32>, MemoryError> {
            Ok(vec![1.0, 0.0])
        }
    }

    #[tokio::test]
    async fn query_ranks_by_similarity() {
        let temp = tempdir().expect("tempdir");
        let index = index_at(temp.path());
        let key = ConversationKey::new("s1", "p1");
        index
            .index(&key, Role::User, "pizza for dinner tonight")
            .await
            .expect("index");
        index
            .index(&key, Role::Assistant, "my dog loves the beach")
            .await
            .expect("index");
        index
            .index(&key, Role::User, "we took the dog to the beach")
            .await
            .expect("index");

        let recalled = index
            .query(&key, "dog at the beach", 2)
            .await
            .expect("query");
        assert_eq!(recalled.len(), 2);
        assert!(recalled.iter().all(|f| f.text.contains("beach")));
        assert!(recalled[0].similarity >= recalled[1].similarity);
    }

    #[tokio::test]
    async fn ties_keep_insertion_order() {
        let temp = tempdir().expect("tempdir");
        let index = FileSemanticIndex::new(temp.path(), Arc::new(ConstantEmbedder)).expect("index");
        let key = ConversationKey::new("s1", "p1");
        for text in ["first", "second", "third"] {
            index.index(&key, Role::User, text).await.expect("index");
        }
        let recalled = index.query(&key, "anything", 5).await.expect("query");
        let texts = recalled.iter().map(|f| f.text.as_str()).collect::<Vec<_>>();
        assert_eq!(texts, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn retrieval_is_isolated_per_key() {
        let temp = tempdir().expect("tempdir");
        let index = index_at(temp.path());
        let a = ConversationKey::new("s1", "p1");
        let b = ConversationKey::new("s2", "p1");
        index
            .index(&a, Role::User, "secret about the lake house")
            .await
            .expect("index");

        let recalled = index
            .query(&b, "secret about the lake house", 5)
            .await
            .expect("query");
        assert!(recalled.is_empty());
        let own = index
            .query(&a, "secret about the lake house", 5)
            .await
            .expect("query");
        assert_eq!(own.len(), 1);
    }

    #[tokio::test]
    async fn mismatched_dimensions_are_skipped() {
        let temp = tempdir().expect("tempdir");
        let key = ConversationKey::new("s1", "p1");
        {
            let index = FileSemanticIndex::new(temp.path(), Arc::new(ConstantEmbedder))
                .expect("index");
            index.index(&key, Role::User, "old width").await.expect("index");
        }
        let index = index_at(temp.path());
        index.index(&key, Role::User, "new width").await.expect("index");
        let recalled = index.query(&key, "width", 5).await.expect("query");
        let texts = recalled.iter().map(|f| f.text.as_str()).collect::<Vec<_>>();
        assert_eq!(texts, vec!["new width"]);
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let temp = tempdir().expect("tempdir");
        let index = index_at(temp.path());
        let key = ConversationKey::new("s1", "p1");
        index.index(&key, Role::User, "remember me").await.expect("index");

        assert_eq!(index.delete(&key).await.expect("delete"), true);
        assert_eq!(index.delete(&key).await.expect("delete again"), false);
        assert_eq!(
            index
                .delete(&ConversationKey::new("never", "existed"))
                .await
                .expect("delete unknown"),
            false
        );
        assert!(
            index
                .query(&key, "remember me", 5)
                .await
                .expect("query")
                .is_empty()
        );
    }

    #[tokio::test]
    async fn torn_trailing_fragment_is_ignored() {
        let temp = tempdir().expect("tempdir");
        let index = index_at(temp.path());
        let key = ConversationKey::new("s1", "p1");
        index.index(&key, Role::User, "climbing trip").await.expect("index");
        {
            let mut file = std::fs::OpenOptions::new()
                .append(true)
                .open(index.fragments_path(&key))
                .expect("open");
            std::io::Write::write_all(&mut file, b"{\"id\":\"").expect("torn write");
        }

        let recalled = index.query(&key, "climbing", 5).await.expect("query");
        assert_eq!(recalled.len(), 1);
        index.index(&key, Role::Assistant, "climbing again").await.expect("index");
        let recalled = index.query(&key, "climbing", 5).await.expect("query");
        assert_eq!(recalled.len(), 2);
    }
}
