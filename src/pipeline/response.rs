//! Validation of raw model output.
//!
//! Models are asked for bare JSON but still wrap it in ` ```json ` fences or
//! add wrapper objects now and then. These functions strip those quirks,
//! check the JSON shape, and turn anything unusable into a
//! [`RemoteError::Malformed`] before it reaches the pipeline.

use crate::cefr::CefrLevel;
use crate::error::RemoteError;
use crate::output::Flashcard;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

static RE_FENCED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```[A-Za-z]*[ \t]*\r?\n(.*?)\r?\n?```$").unwrap());

/// Remove one pair of outer markdown code fences, if present.
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    match RE_FENCED.captures(trimmed).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str().trim(),
        None => trimmed,
    }
}

fn parse_json(raw: &str) -> Result<Value, RemoteError> {
    let body = strip_code_fences(raw);
    if body.is_empty() {
        return Err(RemoteError::Malformed("empty response".into()));
    }
    serde_json::from_str(body).map_err(|e| RemoteError::Malformed(format!("invalid JSON: {e}")))
}

/// Parse a `{ "word": "B2", ... }` classification response.
///
/// Values that are not a recognised level (null, "unknown", numbers) are
/// dropped; the rest is keyed by the lowercased word.
pub fn parse_classification(raw: &str) -> Result<HashMap<String, CefrLevel>, RemoteError> {
    let Value::Object(map) = parse_json(raw)? else {
        return Err(RemoteError::Malformed("expected a JSON object".into()));
    };

    let total = map.len();
    let levels: HashMap<String, CefrLevel> = map
        .into_iter()
        .filter_map(|(word, value)| {
            let level = value.as_str()?.parse::<CefrLevel>().ok()?;
            Some((word.trim().to_lowercase(), level))
        })
        .collect();

    if levels.len() < total {
        debug!("Dropped {} unrated entries from classification", total - levels.len());
    }
    Ok(levels)
}

/// Parse a flashcard array response.
///
/// Accepts a bare array or an object with exactly one array-valued field
/// (`{"flashcards": [...]}`). Every element must carry the required fields.
pub fn parse_flashcards(raw: &str) -> Result<Vec<Flashcard>, RemoteError> {
    let items = match parse_json(raw)? {
        Value::Array(items) => items,
        Value::Object(map) => {
            let mut arrays = map.into_iter().filter_map(|(_, v)| match v {
                Value::Array(items) => Some(items),
                _ => None,
            });
            match (arrays.next(), arrays.next()) {
                (Some(items), None) => items,
                _ => return Err(RemoteError::Malformed("expected a JSON array".into())),
            }
        }
        _ => return Err(RemoteError::Malformed("expected a JSON array".into())),
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            serde_json::from_value::<Flashcard>(item)
                .map(tidy_card)
                .map_err(|e| RemoteError::Malformed(format!("flashcard {}: {e}", i + 1)))
        })
        .collect()
}

/// Strip slashes from IPA, drop empty optional fields.
fn tidy_card(mut card: Flashcard) -> Flashcard {
    card.ipa = card
        .ipa
        .map(|ipa| ipa.trim().trim_matches('/').trim().to_string())
        .filter(|ipa| !ipa.is_empty());
    card.synonyms.retain(|s| !s.trim().is_empty());
    card
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_json_fences() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```\n[1]\n```  "), "[1]");
        assert_eq!(strip_code_fences("  {\"a\":1} "), "{\"a\":1}");
    }

    #[test]
    fn classification_drops_unrated_values() {
        let raw = r#"{"Vivid": "b2", "stranger": "C1", "bob": null, "lol": "slang", "x": 3}"#;
        let levels = parse_classification(raw).unwrap();
        assert_eq!(levels.len(), 2);
        assert_eq!(levels["vivid"], CefrLevel::B2);
        assert_eq!(levels["stranger"], CefrLevel::C1);
    }

    #[test]
    fn classification_rejects_non_object() {
        assert!(matches!(parse_classification("[\"B2\"]"), Err(RemoteError::Malformed(_))));
        assert!(matches!(parse_classification("sorry, I can't"), Err(RemoteError::Malformed(_))));
        assert!(matches!(parse_classification(""), Err(RemoteError::Malformed(_))));
    }

    #[test]
    fn flashcards_parse_and_tidy() {
        let raw = "```json\n[{\"word\":\"vivid\",\"partOfSpeech\":\"adjective\",\"ipa\":\"/ˈvɪvɪd/\",\"definition\":\"very bright\",\"exampleSentence\":\"A vivid dream.\",\"synonyms\":[\"bright\",\"\"]}]\n```";
        let cards = parse_flashcards(raw).unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].ipa.as_deref(), Some("ˈvɪvɪd"));
        assert_eq!(cards[0].synonyms, vec!["bright"]);
    }

    #[test]
    fn flashcards_accept_single_wrapper_object() {
        let raw = r#"{"flashcards":[{"word":"vivid","partOfSpeech":"adjective","definition":"bright","exampleSentence":"A vivid dream."}]}"#;
        assert_eq!(parse_flashcards(raw).unwrap().len(), 1);
    }

    #[test]
    fn flashcards_missing_field_is_malformed() {
        let raw = r#"[{"word":"vivid","definition":"bright","exampleSentence":"A vivid dream."}]"#;
        let err = parse_flashcards(raw).unwrap_err();
        assert!(err.to_string().contains("flashcard 1"), "got: {err}");
    }

    #[test]
    fn flashcards_reject_scalar() {
        assert!(parse_flashcards("42").is_err());
        assert!(parse_flashcards(r#"{"a":[],"b":[]}"#).is_err());
    }
}
