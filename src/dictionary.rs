//! Static word → CEFR level dictionary.
//!
//! The bundled list (`data/cefr_wordlist.tsv`) is embedded at compile time and
//! parsed once on first use. Words found here are classified locally and never
//! sent to the remote classifier; the dictionary is authoritative over any
//! remote answer for the same word.
//!
//! Tests and callers with their own word lists can build a dictionary with
//! [`CefrDictionary::from_pairs`] and inject it through
//! [`crate::config::DeckConfigBuilder::dictionary`].

use crate::cefr::CefrLevel;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

const BUNDLED_WORDLIST: &str = include_str!("../data/cefr_wordlist.tsv");

static BUNDLED: Lazy<Arc<CefrDictionary>> =
    Lazy::new(|| Arc::new(CefrDictionary::parse_tsv(BUNDLED_WORDLIST)));

/// Lookup table from lowercase word to CEFR level.
#[derive(Debug, Clone, Default)]
pub struct CefrDictionary {
    entries: HashMap<String, CefrLevel>,
}

impl CefrDictionary {
    /// The dictionary shipped with the crate.
    pub fn bundled() -> Arc<CefrDictionary> {
        Arc::clone(&BUNDLED)
    }

    /// An empty dictionary: every word goes to the remote classifier.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a dictionary from `(word, level)` pairs. Words are lowercased;
    /// a later duplicate does not replace an earlier one.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, CefrLevel)>,
        S: AsRef<str>,
    {
        let mut entries = HashMap::new();
        for (word, level) in pairs {
            entries
                .entry(word.as_ref().trim().to_lowercase())
                .or_insert(level);
        }
        Self { entries }
    }

    /// Parse `word<TAB>level` lines. Blank lines and `#` comments are skipped;
    /// malformed lines are logged and ignored.
    pub fn parse_tsv(source: &str) -> Self {
        let mut entries = HashMap::new();
        for (lineno, line) in source.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut fields = line.split('\t');
            let (Some(word), Some(level)) = (fields.next(), fields.next()) else {
                warn!("Wordlist line {}: expected 'word<TAB>level'", lineno + 1);
                continue;
            };
            match level.parse::<CefrLevel>() {
                Ok(level) => {
                    entries.entry(word.trim().to_lowercase()).or_insert(level);
                }
                Err(e) => warn!("Wordlist line {}: {}", lineno + 1, e),
            }
        }
        Self { entries }
    }

    pub fn get(&self, word: &str) -> Option<CefrLevel> {
        self.entries.get(word).copied()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.entries.contains_key(word)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_list_loads() {
        let dict = CefrDictionary::bundled();
        assert!(dict.len() > 1000, "bundled list too small: {}", dict.len());
        assert_eq!(dict.get("apple"), Some(CefrLevel::A1));
        assert_eq!(dict.get("abandon"), Some(CefrLevel::B2));
        assert_eq!(dict.get("zenith"), Some(CefrLevel::C2));
    }

    #[test]
    fn bundled_list_has_no_stop_words() {
        let dict = CefrDictionary::bundled();
        for w in crate::stopwords::STOP_WORDS {
            assert!(!dict.contains(w), "stop word in dictionary: {w}");
        }
    }

    #[test]
    fn parse_skips_comments_and_bad_lines() {
        let dict = CefrDictionary::parse_tsv("# header\nhouse\tA1\n\nbroken line\nodd\tZ9\nLake\tA2\n");
        assert_eq!(dict.len(), 2);
        assert_eq!(dict.get("house"), Some(CefrLevel::A1));
        assert_eq!(dict.get("lake"), Some(CefrLevel::A2));
    }

    #[test]
    fn first_entry_wins_on_duplicates() {
        let dict = CefrDictionary::from_pairs([("Bank", CefrLevel::A1), ("bank", CefrLevel::B2)]);
        assert_eq!(dict.get("bank"), Some(CefrLevel::A1));
    }
}
