//! Configuration schema for Rapport.

use serde::{Deserialize, Serialize};

/// Root config for a Rapport deployment.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RapportConfig {
    #[serde(default, rename = "$schema")]
    pub schema: Option<String>,
    #[serde(default)]
    pub conversation: ConversationConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub directory: DirectoryConfig,
}

impl RapportConfig {
    /// Start building a config programmatically with defaults applied.
    pub fn builder() -> RapportConfigBuilder {
        RapportConfigBuilder::new()
    }
}

/// Builder for assembling a `RapportConfig` in code.
#[derive(Debug, Default, Clone)]
pub struct RapportConfigBuilder {
    config: RapportConfig,
}

impl RapportConfigBuilder {
    /// Create a new builder seeded with default config values.
    pub fn new() -> Self {
        Self {
            config: RapportConfig::default(),
        }
    }

    /// Replace the conversation tuning block.
    pub fn conversation(mut self, conversation: ConversationConfig) -> Self {
        self.config.conversation = conversation;
        self
    }

    /// Replace the storage block.
    pub fn storage(mut self, storage: StorageConfig) -> Self {
        self.config.storage = storage;
        self
    }

    /// Replace the embedding block.
    pub fn embedding(mut self, embedding: EmbeddingConfig) -> Self {
        self.config.embedding = embedding;
        self
    }

    /// Replace the text generation block.
    pub fn generation(mut self, generation: GenerationConfig) -> Self {
        self.config.generation = generation;
        self
    }

    /// Replace the persona/profile directory block.
    pub fn directory(mut self, directory: DirectoryConfig) -> Self {
        self.config.directory = directory;
        self
    }

    pub fn build(self) -> RapportConfig {
        self.config
    }
}

/// Memory tier sizes and the summarization trigger for chat turns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationConfig {
    /// Number of most recent messages replayed verbatim to the model.
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,
    /// Re-summarize when the recent window plus the new reply exceeds this.
    /// The window never holds more than `max_turns` messages, so this only
    /// fires when `summary_trigger <= max_turns`.
    #[serde(default = "default_summary_trigger")]
    pub summary_trigger: usize,
    /// Number of semantically similar fragments recalled per turn.
    #[serde(default = "default_recall_k")]
    pub recall_k: usize,
    /// Relationship history longer than this many words is compressed.
    #[serde(default = "default_history_max_words")]
    pub history_max_words: usize,
    /// Words kept from each end of a compressed relationship history.
    #[serde(default = "default_history_edge_words")]
    pub history_edge_words: usize,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            max_turns: default_max_turns(),
            summary_trigger: default_summary_trigger(),
            recall_k: default_recall_k(),
            history_max_words: default_history_max_words(),
            history_edge_words: default_history_edge_words(),
        }
    }
}

fn default_max_turns() -> usize {
    10
}

fn default_summary_trigger() -> usize {
    25
}

fn default_recall_k() -> usize {
    5
}

fn default_history_max_words() -> usize {
    150
}

fn default_history_edge_words() -> usize {
    75
}

/// On-disk location for turn logs, memory fragments, and recommendation cursors.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    /// Root directory; defaults to the platform data dir when unset.
    #[serde(default)]
    pub path: Option<String>,
}

/// Settings for the built-in hashing embedder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_dimensions")]
    pub dimensions: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            dimensions: default_embedding_dimensions(),
        }
    }
}

fn default_embedding_dimensions() -> usize {
    384
}

/// Text generation backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_generation_provider")]
    pub provider: String,
    #[serde(default = "default_generation_base_url")]
    pub base_url: String,
    #[serde(default = "default_generation_model")]
    pub model: String,
    /// Environment variable holding the bearer token.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: default_generation_provider(),
            base_url: default_generation_base_url(),
            model: default_generation_model(),
            api_key_env: default_api_key_env(),
            timeout_secs: None,
        }
    }
}

fn default_generation_provider() -> String {
    "openai".to_string()
}

fn default_generation_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_generation_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

/// Source file for personas and user profiles.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DirectoryConfig {
    #[serde(default)]
    pub path: Option<String>,
}
