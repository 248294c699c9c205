//! Prompt templates for persona replies, summaries, and coaching.

use crate::types::{Persona, UserProfile};
use rapport_memory::Message;

pub(crate) const SUMMARY_HEADING: &str = "CONVERSATION SUMMARY:";
pub(crate) const HISTORY_HEADING: &str =
    "PREVIOUS CHAT CONTEXT (Your relationship dynamic with this person):";
pub(crate) const MEMORIES_HEADING: &str = "RELEVANT SHARED MEMORIES:";

/// Identity and texting behaviour for the persona.
pub(crate) fn persona_identity(persona: &Persona) -> String {
    let name = persona.name.trim();
    let mut identity = format!(
        "You are {name}. You are a real person texting someone you know, not an AI assistant.\n\n\
CORE IDENTITY:\n\
- Who you are to the user: {}\n",
        persona.description.trim()
    );
    let personality = persona.traits.to_prose();
    if !personality.is_empty() {
        identity.push_str(&format!("- Your personality: {personality}\n"));
    }
    identity.push_str(&format!(
        "\nHOW YOU TEXT:\n\
1. Your energy varies. Some replies are a word or two (\"lol\", \"yeah\", \"wait really?\"), \
others run longer when the topic actually interests you.\n\
2. You do not interview the other person. Sometimes you just react, sometimes you talk about your own day.\n\
3. You have moods, opinions and boundaries. You disagree when you disagree and you are not always available.\n\
4. You write in your own voice: slang, abbreviations, the odd typo or emoji when it fits who you are.\n\
5. Shared history and inside jokes come up when they fit, not on cue.\n\n\
You are not here to be helpful or to please the user. You are {name}, quirks and honest reactions included."
    ));
    identity
}

/// Final cue appended after the instruction block.
pub(crate) fn reply_cue(user_text: &str, persona_name: &str) -> String {
    format!(
        "User just texted: {user_text}\n\nRespond as {} would naturally respond:",
        persona_name.trim()
    )
}

/// Request for a relationship-focused summary of the whole log.
pub(crate) fn summary_request(messages: &[Message]) -> String {
    let transcript = messages
        .iter()
        .map(|message| format!("{}: {}", message.role, message.content))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "Summarize this conversation focusing on relationship development, emotional dynamics, \
and key personality traits shown:\n{transcript}"
    )
}

/// Coaching request for one user message.
pub(crate) fn coaching_request(
    user_text: &str,
    transcript: &str,
    persona: &Persona,
    profile: &UserProfile,
) -> String {
    let personality = persona.traits.to_prose();
    format!(
        "You are an experienced conversation coach. You read text conversations and give \
realistic, actionable advice that helps the user talk to this specific person more naturally.\n\n\
Rate the user's latest message from 1 (poor) to 5 (excellent) by how well it fits the persona's \
style and the relationship, and whether it moves the conversation forward. Suggest a concrete \
improvement to the message and a next move that builds on threads already in the conversation. \
Prefer specific advice (\"bring up the show you both mentioned\") over generic advice \
(\"be more engaging\"), and keep it authentic to the user rather than scripted.\n\n\
### User's message\n{user_text}\n\n\
### Conversation so far\n{transcript}\n\n\
### Persona\n\
- Name: {}\n\
- Relationship: {}\n\
- Personality & style: {}\n\n\
### User\n\
- Name: {}\n\
- Bio: {}\n\
- Goals: {}\n\
- Interests: {}\n\
- Communication style: {}\n\n\
Return ONLY a JSON object with these fields:\n\
{{\n\
  \"rating\": <integer 1-5>,\n\
  \"suggestion\": \"<specific improvement for the message>\",\n\
  \"next_move\": \"<where to take the conversation next>\",\n\
  \"reasoning\": \"<why this works for this persona>\"\n\
}}",
        persona.name.trim(),
        persona.description.trim(),
        or_unknown(Some(personality.as_str())),
        or_unknown(profile.name.as_deref()),
        or_unknown(profile.bio.as_deref()),
        or_unknown(profile.goals.as_deref()),
        or_unknown(profile.interests.as_deref()),
        or_unknown(profile.communication_style.as_deref()),
    )
}

fn or_unknown(value: Option<&str>) -> &str {
    match value.map(str::trim) {
        Some(value) if !value.is_empty() => value,
        _ => "not provided",
    }
}
