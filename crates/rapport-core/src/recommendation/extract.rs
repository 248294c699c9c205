//! Pull a JSON object out of free-form model output.

use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("no JSON object in output")]
    NoObject,
    #[error("JSON object is never closed")]
    Unterminated,
    #[error("invalid JSON object: {0}")]
    Invalid(#[from] serde_json::Error),
    #[error("invalid field: {0}")]
    Field(String),
}

/// Parse the JSON object in `text` as `T`.
///
/// A ```` ```json ```` fence wins when its body parses. Otherwise every `{` is
/// tried in order as the start of a balanced object and the first span that
/// parses as `T` is returned, so stray braces in surrounding chatter are
/// skipped. Braces inside JSON strings, escaped quotes included, do not count
/// toward the balance.
pub fn extract_object<T: DeserializeOwned>(text: &str) -> Result<T, ExtractError> {
    if let Some(Ok(value)) = fenced_json(text).map(serde_json::from_str::<T>) {
        return Ok(value);
    }

    let mut first_error = None;
    for (start, _) in text.match_indices('{') {
        let Some(candidate) = balanced_object(&text[start..]) else {
            continue;
        };
        match serde_json::from_str(candidate) {
            Ok(value) => return Ok(value),
            Err(err) => {
                first_error.get_or_insert(err);
            }
        }
    }
    match first_error {
        Some(err) => Err(ExtractError::Invalid(err)),
        None if text.contains('{') => Err(ExtractError::Unterminated),
        None => Err(ExtractError::NoObject),
    }
}

fn fenced_json(text: &str) -> Option<&str> {
    let after = &text[text.find("```json")? + "```json".len()..];
    let end = after.find("```")?;
    Some(after[..end].trim())
}

/// The balanced `{...}` at the start of `text`, if it closes.
fn balanced_object(text: &str) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, ch) in text.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[..=offset]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::{ExtractError, extract_object};
    use pretty_assertions::assert_eq;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Reply {
        rating: u8,
        suggestion: String,
    }

    #[test]
    fn finds_object_inside_chatter_and_fences() {
        let text = "Sure! Here you go:\n```json\n{\"rating\": 4, \"suggestion\": \"ask more\"}\n```\nHope it helps {really}.";
        let reply: Reply = extract_object(text).expect("reply");
        assert_eq!(
            reply,
            Reply {
                rating: 4,
                suggestion: "ask more".to_string()
            }
        );
    }

    #[test]
    fn nested_objects_and_braces_in_strings_stay_balanced() {
        let text = r#"{"rating": 2, "suggestion": "say \"{hi}\" less", "extra": {"a": {"b": 1}}} trailing }"#;
        let reply: Reply = extract_object(text).expect("reply");
        assert_eq!(reply.suggestion, "say \"{hi}\" less");
    }

    #[test]
    fn reports_missing_and_unterminated_objects() {
        assert!(matches!(
            extract_object::<Reply>("rating: 5"),
            Err(ExtractError::NoObject)
        ));
        assert!(matches!(
            extract_object::<Reply>(r#"{"rating": 5, "suggestion": "}"#),
            Err(ExtractError::Unterminated)
        ));
    }

    #[test]
    fn skips_stray_braces_in_leading_commentary() {
        let text = "Careful with { in texts. Here it is:\n{\"rating\": 4, \"suggestion\": \"ask about the trip\"}";
        let reply: Reply = extract_object(text).expect("reply");
        assert_eq!(reply.suggestion, "ask about the trip");

        let text = "My {honest} take:\n{\"rating\": 3, \"suggestion\": \"slow down\"}";
        let reply: Reply = extract_object(text).expect("reply");
        assert_eq!(
            reply,
            Reply {
                rating: 3,
                suggestion: "slow down".to_string()
            }
        );
    }

    #[test]
    fn json_fence_is_preferred_over_earlier_objects() {
        let text = "Example shape: {\"rating\": 1, \"suggestion\": \"placeholder\"}\n```json\n{\"rating\": 5, \"suggestion\": \"real\"}\n```";
        let reply: Reply = extract_object(text).expect("reply");
        assert_eq!(reply.suggestion, "real");
    }

    #[test]
    fn reports_invalid_json() {
        assert!(matches!(
            extract_object::<Reply>("{rating: five}"),
            Err(ExtractError::Invalid(_))
        ));
    }
}
