//! Records persisted by the memory stores.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifies one chat thread: a session talking to one persona.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationKey {
    pub session_id: String,
    pub persona_id: String,
}

impl ConversationKey {
    pub fn new(session_id: impl Into<String>, persona_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            persona_id: persona_id.into(),
        }
    }
}

impl fmt::Display for ConversationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.session_id, self.persona_id)
    }
}

/// Speaker of a stored message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Return the role as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a conversation's turn log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: String,
    /// Informational only; log order is the sole ordering.
    pub created_at: DateTime<Utc>,
}

/// Embedded message text stored for similarity recall.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MemoryFragment {
    pub id: Uuid,
    pub role: Role,
    pub text: String,
    pub embedding: Vec<f32>,
    pub created_at: DateTime<Utc>,
}

/// Fragment returned by a similarity query.
#[derive(Debug, Clone, PartialEq)]
pub struct RecalledFragment {
    pub role: Role,
    pub text: String,
    /// Cosine similarity to the query, in `[-1, 1]`.
    pub similarity: f32,
}

/// Coaching feedback for one scored user/assistant pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Recommendation {
    /// Index of the user message of the pair within the turn log.
    pub message_index: usize,
    pub user_message: String,
    pub assistant_response: String,
    /// 1 (poor) to 5 (excellent).
    pub rating: u8,
    pub suggestion: String,
    pub next_move: String,
}

/// Resumable checkpoint of the recommendation pipeline for one conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecommendationCursor {
    /// Index of the last scored user message, or -1 before the first pair.
    pub last_scored_index: i64,
    /// `User: ..\nAssistant: ..\n` lines for every scored pair so far.
    pub accumulated_transcript: String,
    pub recommendations: Vec<Recommendation>,
}

impl Default for RecommendationCursor {
    fn default() -> Self {
        Self {
            last_scored_index: -1,
            accumulated_transcript: String::new(),
            recommendations: Vec::new(),
        }
    }
}

impl RecommendationCursor {
    /// First message index that has not been considered for scoring yet.
    pub fn resume_index(&self) -> usize {
        usize::try_from(self.last_scored_index + 1).unwrap_or(0)
    }

    /// Record a freshly scored pair and move the checkpoint onto it.
    pub fn record(&mut self, pair_transcript: &str, recommendation: Recommendation) {
        self.accumulated_transcript.push_str(pair_transcript);
        self.last_scored_index = recommendation.message_index as i64;
        self.recommendations.push(recommendation);
    }
}
