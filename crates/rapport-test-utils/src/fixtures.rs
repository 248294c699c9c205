use rapport_core::{Persona, PersonaTraits, UserProfile};

pub fn sample_persona(id: &str, name: &str) -> Persona {
    Persona {
        id: id.to_string(),
        name: name.to_string(),
        description: "close friend from college".to_string(),
        traits: PersonaTraits {
            traits: "playful, blunt".to_string(),
            interests: "bouldering, indie films".to_string(),
            writing_style: "lowercase, short bursts".to_string(),
        },
        chat_history: String::new(),
    }
}

pub fn sample_profile(name: &str) -> UserProfile {
    UserProfile {
        name: Some(name.to_string()),
        bio: Some("software engineer".to_string()),
        goals: Some("keep in touch more".to_string()),
        interests: Some("running".to_string()),
        communication_style: Some("dry".to_string()),
    }
}

/// A scoring reply wrapped in chatter, as models tend to produce.
pub fn coaching_json(rating: u8, suggestion: &str) -> String {
    let object = serde_json::json!({
        "rating": rating,
        "suggestion": suggestion,
        "next_move": "ask a follow-up question",
        "reasoning": "keeps the thread alive",
    });
    format!("Here's my analysis:\n```json\n{object}\n```")
}
