//! CEFR band filter and context-sentence binding.

use crate::cefr::CefrLevel;
use crate::error::DeckError;
use crate::pipeline::classify::WordClassification;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Context bound to a word that appears in no context line.
pub const NO_CONTEXT_SENTENCE: &str = "No context sentence found.";

/// A word selected for a flashcard, with the sentence it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetWord {
    pub word: String,
    pub level: CefrLevel,
    pub context_sentence: String,
}

impl TargetWord {
    /// `false` when bound to [`NO_CONTEXT_SENTENCE`].
    pub fn has_context(&self) -> bool {
        self.context_sentence != NO_CONTEXT_SENTENCE
    }
}

/// First line containing `word` as a whole word, ignoring case.
///
/// Falls back to [`NO_CONTEXT_SENTENCE`].
pub fn bind_context(word: &str, lines: &[String]) -> String {
    match whole_word_pattern(word) {
        Some(re) => lines
            .iter()
            .find(|line| re.is_match(line))
            .cloned()
            .unwrap_or_else(|| NO_CONTEXT_SENTENCE.to_string()),
        None => NO_CONTEXT_SENTENCE.to_string(),
    }
}

fn whole_word_pattern(word: &str) -> Option<Regex> {
    RegexBuilder::new(&format!(r"\b{}\b", regex::escape(word)))
        .case_insensitive(true)
        .build()
        .map_err(|e| warn!("Cannot build context pattern for '{}': {}", word, e))
        .ok()
}

/// Keep the words at or above `threshold` and bind each to its context.
///
/// Output follows the classification's order.
///
/// # Errors
/// [`DeckError::NoTargetWords`] when no word qualifies.
pub fn select_targets(
    classification: &WordClassification,
    threshold: CefrLevel,
    context_lines: &[String],
) -> Result<Vec<TargetWord>, DeckError> {
    let targets: Vec<TargetWord> = classification
        .iter()
        .filter(|(_, level)| level.meets(threshold))
        .map(|(word, level)| TargetWord {
            word: word.clone(),
            level: *level,
            context_sentence: bind_context(word, context_lines),
        })
        .collect();

    debug!(
        "{} of {} classified words at or above {}",
        targets.len(),
        classification.len(),
        threshold
    );

    if targets.is_empty() {
        return Err(DeckError::NoTargetWords { threshold });
    }
    Ok(targets)
}

/// Drop targets without a context sentence.
///
/// # Errors
/// [`DeckError::NoTargetWords`] when that leaves nothing.
pub fn drop_words_without_context(
    targets: Vec<TargetWord>,
    threshold: CefrLevel,
) -> Result<Vec<TargetWord>, DeckError> {
    let before = targets.len();
    let kept: Vec<TargetWord> = targets.into_iter().filter(TargetWord::has_context).collect();
    if kept.len() < before {
        debug!("Dropped {} target words without context", before - kept.len());
    }
    if kept.is_empty() {
        return Err(DeckError::NoTargetWords { threshold });
    }
    Ok(kept)
}
