//! Bounded prompt assembly from the four memory tiers.
//!
//! Everything here is pure: the caller loads the recent window, summary,
//! persona, and recalled fragments, and gets back the model input.

use crate::generation::ChatTurn;
use crate::prompt::{
    HISTORY_HEADING, MEMORIES_HEADING, SUMMARY_HEADING, persona_identity, reply_cue,
};
use crate::types::Persona;
use rapport_config::ConversationConfig;
use rapport_memory::{Message, RecalledFragment};

/// Stands in for the dropped middle of a compressed history.
pub const ELISION_MARKER: &str = "[...]";

/// Upper bound on recalled fragments rendered into one prompt.
pub const MAX_RECALLED_FRAGMENTS: usize = 5;

/// Word limits for relationship-history compression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryCompaction {
    /// Histories at or under this many words are kept verbatim.
    pub max_words: usize,
    /// Words kept from each end of a longer history.
    pub edge_words: usize,
}

impl Default for HistoryCompaction {
    fn default() -> Self {
        Self {
            max_words: 150,
            edge_words: 75,
        }
    }
}

impl From<&ConversationConfig> for HistoryCompaction {
    fn from(config: &ConversationConfig) -> Self {
        Self {
            max_words: config.history_max_words,
            edge_words: config.history_edge_words,
        }
    }
}

/// Keep the first and last `edge_words` of a long history around
/// [`ELISION_MARKER`]; shorter histories come back unchanged.
pub fn compress_history(history: &str, compaction: HistoryCompaction) -> String {
    let words = history.split_whitespace().collect::<Vec<_>>();
    if words.len() <= compaction.max_words {
        return history.to_string();
    }
    let edge = compaction.edge_words.min(words.len() / 2);
    let head = &words[..edge];
    let tail = &words[words.len() - edge..];
    let mut out = Vec::with_capacity(edge * 2 + 1);
    out.extend_from_slice(head);
    out.push(ELISION_MARKER);
    out.extend_from_slice(tail);
    out.join(" ")
}

/// Builds the model input for one persona reply.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextAssembler {
    compaction: HistoryCompaction,
}

impl ContextAssembler {
    pub fn new(compaction: HistoryCompaction) -> Self {
        Self { compaction }
    }

    /// Instruction block: identity, then summary, compressed history, and
    /// recalled fragments, each only when present.
    pub fn instructions(
        &self,
        persona: &Persona,
        summary: Option<&str>,
        fragments: &[RecalledFragment],
    ) -> String {
        let mut block = persona_identity(persona);

        if let Some(summary) = summary.map(str::trim)
            && !summary.is_empty()
        {
            block.push_str(&format!("\n\n{SUMMARY_HEADING}\n{summary}"));
        }

        if !persona.chat_history.trim().is_empty() {
            let compressed = compress_history(persona.chat_history.trim(), self.compaction);
            block.push_str(&format!("\n\n{HISTORY_HEADING}\n{compressed}"));
        }

        if !fragments.is_empty() {
            let memories = fragments
                .iter()
                .take(MAX_RECALLED_FRAGMENTS)
                .map(|fragment| format!("{}: {}", fragment.role, fragment.text))
                .collect::<Vec<_>>()
                .join("\n");
            block.push_str(&format!("\n\n{MEMORIES_HEADING}\n{memories}"));
        }

        block
    }

    /// Recent window in order, then one system turn carrying the instruction
    /// block, the new user text, and the reply cue.
    pub fn model_input(
        &self,
        window: &[Message],
        persona: &Persona,
        summary: Option<&str>,
        fragments: &[RecalledFragment],
        user_text: &str,
    ) -> Vec<ChatTurn> {
        let mut turns = window
            .iter()
            .map(|message| ChatTurn::new(message.role.into(), message.content.clone()))
            .collect::<Vec<_>>();
        let instructions = self.instructions(persona, summary, fragments);
        turns.push(ChatTurn::system(format!(
            "{instructions}\n\n{}",
            reply_cue(user_text, &persona.name)
        )));
        turns
    }
}
