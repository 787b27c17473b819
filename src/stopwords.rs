//! Built-in English stop-word list.
//!
//! Function words carry no vocabulary value for a learner, so they are
//! removed before classification. Entries are lowercase; contractions are
//! listed with a plain ASCII apostrophe to match the tokenizer output.

use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Function words excluded from every deck.
pub const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "ain", "all", "also", "am", "an", "and",
    "any", "are", "aren", "aren't", "as", "at", "be", "because", "been", "before", "being",
    "below", "between", "both", "but", "by", "can", "can't", "cannot", "could", "couldn",
    "couldn't", "did", "didn", "didn't", "do", "does", "doesn", "doesn't", "doing", "don",
    "don't", "down", "during", "each", "else", "ever", "few", "for", "from", "further", "get",
    "gets", "got", "had", "hadn", "hadn't", "has", "hasn", "hasn't", "have", "haven", "haven't",
    "having", "he", "he'd", "he'll", "he's", "her", "here", "here's", "hers", "herself", "him",
    "himself", "his", "how", "how's", "i", "i'd", "i'll", "i'm", "i've", "if", "in", "into",
    "is", "isn", "isn't", "it", "it'd", "it'll", "it's", "its", "itself", "just", "let's", "ll",
    "may", "me", "might", "mightn", "mightn't", "more", "most", "must", "mustn", "mustn't", "my",
    "myself", "needn", "needn't", "no", "nor", "not", "now", "of", "off", "oh", "ok", "okay",
    "on", "once", "only", "or", "other", "ought", "our", "ours", "ourselves", "out", "over",
    "own", "re", "same", "shall", "shan", "shan't", "she", "she'd", "she'll", "she's", "should",
    "should've", "shouldn", "shouldn't", "so", "some", "such", "than", "that", "that'll",
    "that's", "the", "their", "theirs", "them", "themselves", "then", "there", "there's",
    "these", "they", "they'd", "they'll", "they're", "they've", "this", "those", "through", "to",
    "too", "under", "until", "up", "upon", "us", "ve", "very", "was", "wasn", "wasn't", "we",
    "we'd", "we'll", "we're", "we've", "were", "weren", "weren't", "what", "what's", "when",
    "when's", "where", "where's", "which", "while", "who", "who's", "whom", "why", "why's",
    "will", "with", "won", "won't", "would", "wouldn", "wouldn't", "yeah", "yes", "yet", "you",
    "you'd", "you'll", "you're", "you've", "your", "yours", "yourself", "yourselves",
];

static STOP_WORD_SET: Lazy<HashSet<&'static str>> = Lazy::new(|| STOP_WORDS.iter().copied().collect());

/// `true` when `word` (already lowercase) is in the built-in list.
pub fn is_builtin_stop_word(word: &str) -> bool {
    STOP_WORD_SET.contains(word)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_is_lowercase_and_unique() {
        let mut seen = HashSet::new();
        for w in STOP_WORDS {
            assert_eq!(*w, w.to_lowercase(), "stop word not lowercase: {w}");
            assert!(seen.insert(*w), "duplicate stop word: {w}");
        }
    }

    #[test]
    fn common_function_words_are_present() {
        for w in ["the", "this", "and", "would", "don't", "they're"] {
            assert!(is_builtin_stop_word(w), "{w} should be a stop word");
        }
        assert!(!is_builtin_stop_word("journey"));
    }
}
