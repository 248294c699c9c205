//! One persona reply per user message, with rolling summarization.

use crate::context::{ContextAssembler, HistoryCompaction};
use crate::directory::PersonaDirectory;
use crate::error::RapportCoreError;
use crate::generation::{ChatTurn, TextGenerator};
use crate::locks::KeyLocks;
use crate::prompt::summary_request;
use crate::stores::MemoryStores;
use log::{debug, info, warn};
use rapport_config::ConversationConfig;
use rapport_memory::{ConversationKey, Message, Role};
use std::sync::Arc;

/// Reply text used when the persona cannot be resolved.
pub const PERSONA_NOT_FOUND_REPLY: &str = "Select Valid Persona";

/// Result of [`TurnController::respond`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    Replied {
        reply: String,
        /// Whether the stored summary was regenerated after this turn.
        summarized: bool,
    },
    /// The user message was recorded but no persona answered it.
    PersonaNotFound,
}

impl TurnOutcome {
    /// Text to show the user.
    pub fn text(&self) -> &str {
        match self {
            TurnOutcome::Replied { reply, .. } => reply,
            TurnOutcome::PersonaNotFound => PERSONA_NOT_FOUND_REPLY,
        }
    }
}

/// What a [`TurnController::forget`] call removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ForgetOutcome {
    pub turns: bool,
    pub fragments: bool,
    pub cursor: bool,
}

impl ForgetOutcome {
    pub fn removed_anything(&self) -> bool {
        self.turns || self.fragments || self.cursor
    }
}

/// Window and recall sizes for a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnSettings {
    pub max_turns: usize,
    pub summary_trigger: usize,
    pub recall_k: usize,
    pub compaction: HistoryCompaction,
}

impl Default for TurnSettings {
    fn default() -> Self {
        Self::from(&ConversationConfig::default())
    }
}

impl From<&ConversationConfig> for TurnSettings {
    fn from(config: &ConversationConfig) -> Self {
        Self {
            max_turns: config.max_turns,
            summary_trigger: config.summary_trigger,
            recall_k: config.recall_k,
            compaction: HistoryCompaction::from(config),
        }
    }
}

/// Drives persist, assemble, generate, persist, and maybe summarize for
/// each user message.
pub struct TurnController {
    stores: MemoryStores,
    personas: Arc<dyn PersonaDirectory>,
    generator: Arc<dyn TextGenerator>,
    locks: Arc<KeyLocks>,
    assembler: ContextAssembler,
    settings: TurnSettings,
}

impl TurnController {
    pub fn new(
        stores: MemoryStores,
        personas: Arc<dyn PersonaDirectory>,
        generator: Arc<dyn TextGenerator>,
        locks: Arc<KeyLocks>,
        settings: TurnSettings,
    ) -> Self {
        Self {
            stores,
            personas,
            generator,
            locks,
            assembler: ContextAssembler::new(settings.compaction),
            settings,
        }
    }

    /// Answer one user message as the conversation's persona.
    ///
    /// The user message is stored before anything can fail and is not rolled
    /// back if generation fails.
    pub async fn respond(
        &self,
        key: &ConversationKey,
        user_text: &str,
    ) -> Result<TurnOutcome, RapportCoreError> {
        let _guard = self.locks.lock(key).await;
        info!(
            "turn started (key={}, text_len={})",
            key,
            user_text.len()
        );
        self.stores.turns.append(key, Role::User, user_text).await?;
        self.stores.index.index(key, Role::User, user_text).await?;

        let window = self
            .stores
            .turns
            .read_recent(key, self.settings.max_turns)
            .await?;
        let summary = self.stores.turns.read_summary(key).await?;
        let fragments = self
            .stores
            .index
            .query(key, user_text, self.settings.recall_k)
            .await?;
        let Some(persona) = self.personas.persona(&key.persona_id).await? else {
            warn!("turn aborted (key={}, reason=unknown_persona)", key);
            return Ok(TurnOutcome::PersonaNotFound);
        };

        let input = self.assembler.model_input(
            &window,
            &persona,
            summary.as_deref(),
            &fragments,
            user_text,
        );
        debug!(
            "generating reply (key={}, window={}, summary={}, fragments={})",
            key,
            window.len(),
            summary.is_some(),
            fragments.len()
        );
        let reply = self.generator.generate(&input).await?;

        self.stores.turns.append(key, Role::Assistant, &reply).await?;
        self.stores.index.index(key, Role::Assistant, &reply).await?;

        let summarized = window.len() + 1 > self.settings.summary_trigger;
        if summarized {
            self.resummarize(key).await?;
        }
        info!(
            "turn finished (key={}, reply_len={}, summarized={})",
            key,
            reply.len(),
            summarized
        );
        Ok(TurnOutcome::Replied { reply, summarized })
    }

    /// Full ordered log of the conversation.
    pub async fn history(&self, key: &ConversationKey) -> Result<Vec<Message>, RapportCoreError> {
        Ok(self.stores.turns.read(key).await?)
    }

    /// Remove the conversation from every store. Safe to repeat.
    pub async fn forget(&self, key: &ConversationKey) -> Result<ForgetOutcome, RapportCoreError> {
        let _guard = self.locks.lock(key).await;
        let outcome = ForgetOutcome {
            turns: self.stores.turns.delete(key).await?,
            fragments: self.stores.index.delete(key).await?,
            cursor: self.stores.cursors.delete(key).await?,
        };
        info!(
            "conversation forgotten (key={}, removed_anything={})",
            key,
            outcome.removed_anything()
        );
        Ok(outcome)
    }

    /// Regenerate the summary from the whole log and replace the stored one.
    async fn resummarize(&self, key: &ConversationKey) -> Result<(), RapportCoreError> {
        let messages = self.stores.turns.read(key).await?;
        let request = summary_request(&messages);
        let summary = self.generator.generate(&[ChatTurn::user(request)]).await?;
        self.stores.turns.write_summary(key, &summary).await?;
        info!(
            "summary regenerated (key={}, messages={}, summary_len={})",
            key,
            messages.len(),
            summary.len()
        );
        Ok(())
    }
}
