//! Persona and user records supplied by the directories.

use serde::{Deserialize, Serialize};

/// Simulated chat partner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Persona {
    /// Persona identifier.
    pub id: String,
    /// Display name the persona answers as.
    pub name: String,
    /// Who the persona is to the user (friend, crush, boss, ...).
    pub description: String,
    /// Personality fields rendered into prose at prompt-build time.
    #[serde(default)]
    pub traits: PersonaTraits,
    /// Free-text relationship history imported by the user.
    #[serde(default)]
    pub chat_history: String,
}

/// Structured personality description.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PersonaTraits {
    #[serde(default)]
    pub traits: String,
    #[serde(default)]
    pub interests: String,
    #[serde(default, alias = "writingStyle")]
    pub writing_style: String,
}

impl PersonaTraits {
    /// Render the non-empty fields as one line of prose.
    pub fn to_prose(&self) -> String {
        let mut parts = Vec::new();
        for (label, value) in [
            ("Traits", &self.traits),
            ("Interests", &self.interests),
            ("Writing style", &self.writing_style),
        ] {
            let value = value.trim();
            if !value.is_empty() {
                parts.push(format!("{label}: {value}."));
            }
        }
        parts.join(" ")
    }
}

/// Self-description of the person being coached. Every field is optional; an
/// unknown user is the default profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserProfile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub goals: Option<String>,
    #[serde(default)]
    pub interests: Option<String>,
    #[serde(default, alias = "communicationStyle")]
    pub communication_style: Option<String>,
}
