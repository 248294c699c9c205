//! Incremental coaching over a conversation's completed user/assistant pairs.

mod extract;

pub use extract::{ExtractError, extract_object};

use crate::directory::{PersonaDirectory, ProfileDirectory};
use crate::error::RapportCoreError;
use crate::generation::{ChatTurn, TextGenerator};
use crate::locks::KeyLocks;
use crate::prompt::coaching_request;
use crate::stores::MemoryStores;
use crate::types::{Persona, UserProfile};
use log::{debug, info, warn};
use rapport_memory::{ConversationKey, Message, Recommendation, Role};
use serde::Deserialize;
use std::sync::Arc;

/// Result of one [`RecommendationEngine::advance`] pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// The conversation has no messages; the cursor was not touched.
    NoHistory,
    /// The persona is unknown; the cursor was not touched.
    UnknownPersona,
    Advanced {
        /// Pairs scored during this pass.
        new_count: usize,
        /// Every recommendation for the conversation, oldest first.
        recommendations: Vec<Recommendation>,
    },
}

/// Structured reply expected from the scoring call.
#[derive(Debug, Clone, Deserialize)]
pub struct CoachingReply {
    pub rating: i64,
    pub suggestion: String,
    pub next_move: String,
    #[serde(default)]
    pub reasoning: String,
}

impl CoachingReply {
    /// Parse a scoring reply out of raw model output.
    pub fn parse(text: &str) -> Result<Self, ExtractError> {
        let reply: CoachingReply = extract_object(text)?;
        if !(1..=5).contains(&reply.rating) {
            return Err(ExtractError::Field(format!(
                "rating {} outside 1..=5",
                reply.rating
            )));
        }
        Ok(reply)
    }
}

/// Scores each completed pair exactly once, checkpointing after every pair.
pub struct RecommendationEngine {
    stores: MemoryStores,
    personas: Arc<dyn PersonaDirectory>,
    profiles: Arc<dyn ProfileDirectory>,
    generator: Arc<dyn TextGenerator>,
    locks: Arc<KeyLocks>,
}

impl RecommendationEngine {
    pub fn new(
        stores: MemoryStores,
        personas: Arc<dyn PersonaDirectory>,
        profiles: Arc<dyn ProfileDirectory>,
        generator: Arc<dyn TextGenerator>,
        locks: Arc<KeyLocks>,
    ) -> Self {
        Self {
            stores,
            personas,
            profiles,
            generator,
            locks,
        }
    }

    /// Score every pair after the stored checkpoint.
    ///
    /// A failed pair stops the pass with an error; pairs scored before it
    /// stay checkpointed and the failed pair is retried on the next call.
    pub async fn advance(&self, key: &ConversationKey) -> Result<AdvanceOutcome, RapportCoreError> {
        let _guard = self.locks.lock(key).await;
        let messages = self.stores.turns.read(key).await?;
        if messages.is_empty() {
            info!("recommendation pass skipped (key={}, reason=no_history)", key);
            return Ok(AdvanceOutcome::NoHistory);
        }
        let Some(persona) = self.personas.persona(&key.persona_id).await? else {
            warn!("recommendation pass skipped (key={}, reason=unknown_persona)", key);
            return Ok(AdvanceOutcome::UnknownPersona);
        };
        let profile = self.profiles.profile(&key.session_id).await?;
        let mut cursor = self.stores.cursors.load(key).await?.unwrap_or_default();

        let start = cursor.resume_index();
        info!(
            "recommendation pass started (key={}, messages={}, resume_index={})",
            key,
            messages.len(),
            start
        );
        let mut new_count = 0usize;
        let mut idx = start;
        while idx + 1 < messages.len() {
            let (user, assistant) = (&messages[idx], &messages[idx + 1]);
            if user.role != Role::User || assistant.role != Role::Assistant {
                idx += 1;
                continue;
            }
            let pair_transcript = format!(
                "User: {}\nAssistant: {}\n",
                user.content, assistant.content
            );
            let running = format!("{}{}", cursor.accumulated_transcript, pair_transcript);
            let recommendation = self
                .score_pair(idx, user, assistant, &running, &persona, &profile)
                .await?;
            cursor.record(&pair_transcript, recommendation);
            self.stores.cursors.save(key, &cursor).await?;
            new_count += 1;
            idx += 2;
        }

        info!(
            "recommendation pass finished (key={}, new={}, total={})",
            key,
            new_count,
            cursor.recommendations.len()
        );
        Ok(AdvanceOutcome::Advanced {
            new_count,
            recommendations: cursor.recommendations,
        })
    }

    /// Stored recommendations without scoring anything new.
    pub async fn recommendations(
        &self,
        key: &ConversationKey,
    ) -> Result<Vec<Recommendation>, RapportCoreError> {
        Ok(self
            .stores
            .cursors
            .load(key)
            .await?
            .map(|cursor| cursor.recommendations)
            .unwrap_or_default())
    }

    async fn score_pair(
        &self,
        message_index: usize,
        user: &Message,
        assistant: &Message,
        transcript: &str,
        persona: &Persona,
        profile: &UserProfile,
    ) -> Result<Recommendation, RapportCoreError> {
        let request = coaching_request(&user.content, transcript, persona, profile);
        let output = self.generator.generate(&[ChatTurn::user(request)]).await?;
        let reply = CoachingReply::parse(&output).map_err(|source| {
            warn!(
                "scoring output rejected (message_index={}, output_len={}, error={})",
                message_index,
                output.len(),
                source
            );
            RapportCoreError::MalformedOutput {
                message_index,
                source,
            }
        })?;
        debug!(
            "scored pair (message_index={}, rating={})",
            message_index, reply.rating
        );
        Ok(Recommendation {
            message_index,
            user_message: user.content.clone(),
            assistant_response: assistant.content.clone(),
            // 1..=5 checked by CoachingReply::parse.
            rating: reply.rating as u8,
            suggestion: reply.suggestion,
            next_move: reply.next_move,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::CoachingReply;

    #[test]
    fn coaching_reply_accepts_wrapped_object() {
        let reply = CoachingReply::parse(
            "Here is my take:\n{\"rating\": 3, \"suggestion\": \"be specific\", \"next_move\": \"ask about the trip\", \"reasoning\": \"she loves travel\"}",
        )
        .expect("reply");
        assert_eq!(reply.rating, 3);
        assert_eq!(reply.next_move, "ask about the trip");
    }

    #[test]
    fn coaching_reply_rejects_out_of_range_rating() {
        let err = CoachingReply::parse(
            r#"{"rating": 9, "suggestion": "x", "next_move": "y", "reasoning": "z"}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("rating 9"));
    }

    #[test]
    fn coaching_reply_tolerates_missing_reasoning() {
        let reply =
            CoachingReply::parse(r#"{"rating": 1, "suggestion": "x", "next_move": "y"}"#)
                .expect("reply");
        assert_eq!(reply.reasoning, "");
    }
}
