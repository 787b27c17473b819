//! Tokenizing and stop-word filtering.

use crate::error::DeckError;
use crate::stopwords::is_builtin_stop_word;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::ops::Deref;
use tracing::debug;

/// Shortest word kept as a candidate, in characters.
pub const MIN_WORD_LEN: usize = 3;

static RE_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[a-z']+\b").unwrap());

/// Ordered, deduplicated lowercase candidate words, first-seen order.
///
/// Only [`extract_candidates`] builds one, so every instance upholds: no
/// duplicates, nothing shorter than [`MIN_WORD_LEN`], nothing in the stop set
/// it was built with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateWords(Vec<String>);

impl CandidateWords {
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<String> {
        self.0
    }
}

impl Deref for CandidateWords {
    type Target = [String];

    fn deref(&self) -> &[String] {
        &self.0
    }
}

/// Extract candidate vocabulary from `full_text`.
///
/// Lower-cases the text, takes every match of `\b[a-z']+\b`, keeps the first
/// occurrence of each word, and drops words shorter than three characters or
/// present in the built-in stop list or `user_stop_words`. User entries are
/// trimmed and compared case-insensitively.
///
/// # Errors
/// [`DeckError::EmptyCandidateSet`] when nothing survives.
pub fn extract_candidates(
    full_text: &str,
    user_stop_words: &HashSet<String>,
) -> Result<CandidateWords, DeckError> {
    let user_stop_words: HashSet<String> = user_stop_words
        .iter()
        .map(|w| w.trim().to_lowercase())
        .filter(|w| !w.is_empty())
        .collect();
    let lower = full_text.to_lowercase();
    let mut seen: HashSet<&str> = HashSet::new();
    let mut words = Vec::new();
    let mut tokens = 0usize;

    for m in RE_WORD.find_iter(&lower) {
        tokens += 1;
        let word = m.as_str();
        if !seen.insert(word) {
            continue;
        }
        if word.chars().count() < MIN_WORD_LEN
            || is_builtin_stop_word(word)
            || user_stop_words.contains(word)
        {
            continue;
        }
        words.push(word.to_string());
    }

    debug!("Tokenized {} tokens into {} candidate words", tokens, words.len());

    if words.is_empty() {
        return Err(DeckError::EmptyCandidateSet);
    }
    Ok(CandidateWords(words))
}

/// Parse a comma-separated stop-word list: lower-case, split on `,`, trim,
/// drop empty entries.
pub fn parse_stop_words(raw: &str) -> HashSet<String> {
    raw.to_lowercase()
        .split(',')
        .map(str::trim)
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}
