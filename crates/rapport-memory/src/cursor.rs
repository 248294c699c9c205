//! Persistence for recommendation checkpoints.

use crate::error::MemoryError;
use crate::layout::{key_path, remove_if_exists, write_atomic};
use crate::model::{ConversationKey, RecommendationCursor};
use async_trait::async_trait;
use log::{debug, info};
use parking_lot::Mutex;
use std::fs;
use std::path::{Path, PathBuf};

#[async_trait]
pub trait CursorStore: Send + Sync {
    /// Stored cursor, or `None` if the key was never checkpointed.
    async fn load(&self, key: &ConversationKey)
    -> Result<Option<RecommendationCursor>, MemoryError>;

    /// Replace the stored cursor.
    async fn save(
        &self,
        key: &ConversationKey,
        cursor: &RecommendationCursor,
    ) -> Result<(), MemoryError>;

    /// Returns whether a cursor existed.
    async fn delete(&self, key: &ConversationKey) -> Result<bool, MemoryError>;
}

/// One JSON document per key, replaced atomically on every save so a crash
/// leaves either the previous or the next checkpoint.
pub struct FileCursorStore {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl FileCursorStore {
    pub fn new(root: impl AsRef<Path>) -> Result<Self, MemoryError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        info!("initialized file cursor store (root={})", root.display());
        Ok(Self {
            root,
            write_lock: Mutex::new(()),
        })
    }

    fn cursor_path(&self, key: &ConversationKey) -> PathBuf {
        key_path(&self.root, key, "cursor.json")
    }
}

#[async_trait]
impl CursorStore for FileCursorStore {
    async fn load(
        &self,
        key: &ConversationKey,
    ) -> Result<Option<RecommendationCursor>, MemoryError> {
        let path = self.cursor_path(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_slice(&fs::read(path)?)?))
    }

    async fn save(
        &self,
        key: &ConversationKey,
        cursor: &RecommendationCursor,
    ) -> Result<(), MemoryError> {
        let payload = serde_json::to_vec_pretty(cursor)?;
        let _guard = self.write_lock.lock();
        write_atomic(&self.cursor_path(key), &payload)?;
        debug!(
            "saved cursor (key={}, last_scored_index={}, recommendations={})",
            key,
            cursor.last_scored_index,
            cursor.recommendations.len()
        );
        Ok(())
    }

    async fn delete(&self, key: &ConversationKey) -> Result<bool, MemoryError> {
        let _guard = self.write_lock.lock();
        let existed = remove_if_exists(&self.cursor_path(key))?;
        info!("deleted cursor (key={}, existed={})", key, existed);
        Ok(existed)
    }
}

#[cfg(test)]
mod tests {
    use super::{CursorStore, FileCursorStore};
    use crate::model::{ConversationKey, Recommendation, RecommendationCursor};
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[tokio::test]
    async fn missing_cursor_loads_as_none() {
        let temp = tempdir().expect("tempdir");
        let store = FileCursorStore::new(temp.path()).expect("store");
        let loaded = store
            .load(&ConversationKey::new("s1", "p1"))
            .await
            .expect("load");
        assert_eq!(loaded, None);
    }

    #[tokio::test]
    async fn save_replaces_previous_checkpoint() {
        let temp = tempdir().expect("tempdir");
        let store = FileCursorStore::new(temp.path()).expect("store");
        let key = ConversationKey::new("s1", "p1");

        let mut cursor = RecommendationCursor::default();
        store.save(&key, &cursor).await.expect("save");
        cursor.record(
            "User: hey\nAssistant: hi!\n",
            Recommendation {
                message_index: 0,
                user_message: "hey".to_string(),
                assistant_response: "hi!".to_string(),
                rating: 3,
                suggestion: "Say more than one word.".to_string(),
                next_move: "Ask about their weekend.".to_string(),
            },
        );
        store.save(&key, &cursor).await.expect("save");

        let reopened = FileCursorStore::new(temp.path()).expect("store");
        assert_eq!(reopened.load(&key).await.expect("load"), Some(cursor));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let temp = tempdir().expect("tempdir");
        let store = FileCursorStore::new(temp.path()).expect("store");
        let key = ConversationKey::new("s1", "p1");
        store
            .save(&key, &RecommendationCursor::default())
            .await
            .expect("save");
        assert_eq!(store.delete(&key).await.expect("delete"), true);
        assert_eq!(store.delete(&key).await.expect("delete again"), false);
        assert_eq!(
            store
                .delete(&ConversationKey::new("never", "existed"))
                .await
                .expect("delete unknown"),
            false
        );
    }
}
