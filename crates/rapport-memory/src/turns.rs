//! Append-only turn log and rolling summary per conversation.

use crate::error::MemoryError;
use crate::layout::{key_path, open_append, read_jsonl, remove_if_exists, write_atomic};
use crate::model::{ConversationKey, Message, Role};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, info};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

const SCHEMA_VERSION: u32 = 1;

/// Ordered message log plus an optional rolling summary, keyed by conversation.
#[async_trait]
pub trait TurnStore: Send + Sync {
    /// Append a message at the end of the log. No deduplication.
    async fn append(
        &self,
        key: &ConversationKey,
        role: Role,
        content: &str,
    ) -> Result<(), MemoryError>;

    /// Full ordered log; empty for an unknown key.
    async fn read(&self, key: &ConversationKey) -> Result<Vec<Message>, MemoryError>;

    /// The last `limit` messages of the log, oldest first.
    async fn read_recent(
        &self,
        key: &ConversationKey,
        limit: usize,
    ) -> Result<Vec<Message>, MemoryError> {
        let mut messages = self.read(key).await?;
        let start = messages.len().saturating_sub(limit);
        Ok(messages.split_off(start))
    }

    async fn read_summary(&self, key: &ConversationKey) -> Result<Option<String>, MemoryError>;

    /// Replace any previous summary.
    async fn write_summary(&self, key: &ConversationKey, summary: &str)
    -> Result<(), MemoryError>;

    /// Remove the log and summary. Returns whether anything existed; an
    /// unknown key is not an error.
    async fn delete(&self, key: &ConversationKey) -> Result<bool, MemoryError>;
}

/// Line format of a turn log file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum TurnEvent {
    SchemaVersion {
        version: u32,
    },
    Message {
        role: Role,
        content: String,
        created_at: DateTime<Utc>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SummaryRecord {
    summary: String,
    updated_at: DateTime<Utc>,
}

/// JSONL-backed turn store: `<stem>.jsonl` holds the log and
/// `<stem>.summary.json` the current summary.
pub struct FileTurnStore {
    root: PathBuf,
    /// Serialize write access to log files.
    write_lock: Mutex<()>,
}

impl FileTurnStore {
    /// Create a new turn store under the given root.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, MemoryError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        info!("initialized file turn store (root={})", root.display());
        Ok(Self {
            root,
            write_lock: Mutex::new(()),
        })
    }

    fn log_path(&self, key: &ConversationKey) -> PathBuf {
        key_path(&self.root, key, "jsonl")
    }

    fn summary_path(&self, key: &ConversationKey) -> PathBuf {
        key_path(&self.root, key, "summary.json")
    }

    fn load_messages(&self, key: &ConversationKey) -> Result<Vec<Message>, MemoryError> {
        let mut messages = Vec::new();
        for event in read_jsonl::<TurnEvent>(&self.log_path(key))? {
            match event {
                TurnEvent::SchemaVersion { version } if version > SCHEMA_VERSION => {
                    return Err(MemoryError::UnsupportedSchema(version));
                }
                TurnEvent::SchemaVersion { .. } => {}
                TurnEvent::Message {
                    role,
                    content,
                    created_at,
                } => messages.push(Message {
                    role,
                    content,
                    created_at,
                }),
            }
        }
        Ok(messages)
    }
}

#[async_trait]
impl TurnStore for FileTurnStore {
    async fn append(
        &self,
        key: &ConversationKey,
        role: Role,
        content: &str,
    ) -> Result<(), MemoryError> {
        let _guard = self.write_lock.lock();
        let (mut file, is_new) = open_append(&self.log_path(key))?;
        let mut lines = String::new();
        if is_new {
            let header = TurnEvent::SchemaVersion {
                version: SCHEMA_VERSION,
            };
            lines.push_str(&serde_json::to_string(&header)?);
            lines.push('\n');
        }
        let event = TurnEvent::Message {
            role,
            content: content.to_string(),
            created_at: Utc::now(),
        };
        lines.push_str(&serde_json::to_string(&event)?);
        lines.push('\n');
        file.write_all(lines.as_bytes())?;
        file.sync_data()?;
        debug!(
            "appended turn (key={}, role={}, content_len={})",
            key,
            role,
            content.len()
        );
        Ok(())
    }

    async fn read(&self, key: &ConversationKey) -> Result<Vec<Message>, MemoryError> {
        self.load_messages(key)
    }

    async fn read_summary(&self, key: &ConversationKey) -> Result<Option<String>, MemoryError> {
        let path = self.summary_path(key);
        if !path.exists() {
            return Ok(None);
        }
        let record: SummaryRecord = serde_json::from_slice(&fs::read(path)?)?;
        Ok(Some(record.summary))
    }

    async fn write_summary(
        &self,
        key: &ConversationKey,
        summary: &str,
    ) -> Result<(), MemoryError> {
        let record = SummaryRecord {
            summary: summary.to_string(),
            updated_at: Utc::now(),
        };
        let _guard = self.write_lock.lock();
        write_atomic(&self.summary_path(key), &serde_json::to_vec(&record)?)?;
        debug!(
            "wrote summary (key={}, summary_len={})",
            key,
            summary.len()
        );
        Ok(())
    }

    async fn delete(&self, key: &ConversationKey) -> Result<bool, MemoryError> {
        let _guard = self.write_lock.lock();
        let removed_log = remove_if_exists(&self.log_path(key))?;
        let removed_summary = remove_if_exists(&self.summary_path(key))?;
        info!(
            "deleted turn log (key={}, existed={})",
            key,
            removed_log || removed_summary
        );
        Ok(removed_log || removed_summary)
    }
}
