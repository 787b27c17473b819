//! Property tests for the pure pipeline stages.
//!
//! Run with:
//!   cargo test --test properties

use futures::future::BoxFuture;
use futures::FutureExt;
use proptest::prelude::*;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use vocab2deck::pipeline::classify::{classify_local, classify_remote, merge, RemoteClassification};
use vocab2deck::pipeline::select::select_targets;
use vocab2deck::pipeline::tokenize::{extract_candidates, MIN_WORD_LEN};
use vocab2deck::stopwords::is_builtin_stop_word;
use vocab2deck::{
    export_csv, CefrClassifier, CefrDictionary, CefrLevel, DeckConfig, Flashcard, RemoteError,
    WordClassification,
};

fn level() -> impl Strategy<Value = CefrLevel> {
    prop::sample::select(CefrLevel::ALL.to_vec())
}

fn text() -> impl Strategy<Value = String> {
    prop::collection::vec(("[a-zA-Z']{1,9}", prop::sample::select(vec![" ", ", ", ". ", "\n"])), 0..40)
        .prop_map(|parts| parts.into_iter().map(|(w, sep)| format!("{w}{sep}")).collect())
}

/// Rates every word by its length.
struct LengthClassifier;

impl CefrClassifier for LengthClassifier {
    fn classify_batch<'a>(
        &'a self,
        words: &'a [String],
    ) -> BoxFuture<'a, Result<HashMap<String, CefrLevel>, RemoteError>> {
        async move {
            Ok(words
                .iter()
                .map(|w| (w.clone(), CefrLevel::ALL[w.len() % 6]))
                .collect())
        }
        .boxed()
    }
}

proptest! {
    #[test]
    fn candidates_are_unique_long_and_not_stop_words(
        text in text(),
        user in prop::collection::hash_set("[a-z]{3,6}", 0..5),
    ) {
        match extract_candidates(&text, &user) {
            Ok(words) => {
                let distinct: HashSet<&String> = words.iter().collect();
                prop_assert_eq!(distinct.len(), words.len());
                for w in words.iter() {
                    prop_assert!(w.chars().count() >= MIN_WORD_LEN, "short word {:?}", w);
                    prop_assert!(!is_builtin_stop_word(w), "stop word {:?}", w);
                    prop_assert!(!user.contains(w), "user stop word {:?}", w);
                    prop_assert_eq!(w.to_lowercase(), w.clone());
                }
            }
            Err(e) => prop_assert!(matches!(e, vocab2deck::DeckError::EmptyCandidateSet)),
        }
    }

    #[test]
    fn raising_the_threshold_never_adds_targets(
        levels in prop::collection::vec(("[a-z]{3,8}", level()), 1..30),
        low in level(),
        high in level(),
    ) {
        let (low, high) = if low <= high { (low, high) } else { (high, low) };
        let classification: WordClassification = levels.into_iter().collect();
        let pick = |t| -> HashSet<String> {
            select_targets(&classification, t, &[])
                .map(|ts| ts.into_iter().map(|t| t.word).collect())
                .unwrap_or_default()
        };
        let wide = pick(low);
        let narrow = pick(high);
        prop_assert!(narrow.is_subset(&wide));
        for word in &narrow {
            prop_assert!(classification[word].meets(high));
        }
    }

    #[test]
    fn dictionary_level_wins_over_remote(
        words in prop::collection::hash_set("[a-z]{3,8}", 1..20),
        dict_levels in prop::collection::vec(level(), 20),
        remote_level in level(),
    ) {
        let words: Vec<String> = words.into_iter().collect();
        // Every other word is in the dictionary.
        let dictionary = CefrDictionary::from_pairs(
            words.iter().zip(&dict_levels).step_by(2).map(|(w, l)| (w.as_str(), *l)),
        );
        let (local, unresolved) = classify_local(&words, &dictionary);
        // A remote tier that rates everything, including local words.
        let remote = RemoteClassification {
            resolved: words.iter().map(|w| (w.clone(), remote_level)).collect(),
            ..Default::default()
        };
        let merged = merge(&words, local, remote).levels;

        prop_assert_eq!(merged.len(), words.len());
        for w in &words {
            match dictionary.get(w) {
                Some(l) => prop_assert_eq!(merged[w], l),
                None => {
                    prop_assert!(unresolved.contains(w));
                    prop_assert_eq!(merged[w], remote_level);
                }
            }
        }
        let order: Vec<&String> = merged.keys().collect();
        let expected: Vec<&String> = words.iter().collect();
        prop_assert_eq!(order, expected);
    }

    #[test]
    fn local_classification_is_idempotent(
        words in prop::collection::vec("[a-z]{3,8}", 0..25),
        known in prop::collection::vec(("[a-z]{3,8}", level()), 0..25),
    ) {
        // Half the lookups hit: the dictionary also holds the first words.
        let dictionary = CefrDictionary::from_pairs(
            known
                .iter()
                .map(|(w, l)| (w.as_str(), *l))
                .chain(words.iter().step_by(2).map(|w| (w.as_str(), CefrLevel::B2))),
        );
        let first = classify_local(&words, &dictionary);
        let second = classify_local(&words, &dictionary);
        prop_assert_eq!(&first.0, &second.0);
        prop_assert_eq!(&first.1, &second.1);
        for (word, level) in &first.0 {
            prop_assert_eq!(dictionary.get(word), Some(*level));
        }
    }

    #[test]
    fn remote_results_follow_input_order(
        words in prop::collection::hash_set("[a-z]{3,8}", 1..25),
        batch_size in 1usize..6,
        concurrency in 1usize..5,
    ) {
        let words: Vec<String> = words.into_iter().collect();
        let classifier: Arc<dyn CefrClassifier> = Arc::new(LengthClassifier);
        let config = DeckConfig::builder()
            .batch_size(batch_size)
            .concurrency(concurrency)
            .build()
            .unwrap();

        let remote = tokio_test::block_on(classify_remote(&words, &classifier, &config));
        let got: Vec<&String> = remote.resolved.iter().map(|(w, _)| w).collect();
        let expected: Vec<&String> = words.iter().collect();
        prop_assert_eq!(got, expected);
        prop_assert_eq!(remote.batches, words.len().div_ceil(batch_size));
        prop_assert!(remote.warnings.is_empty());
    }

    #[test]
    fn deck_has_one_line_per_card_plus_header(
        cards in prop::collection::vec(
            ("[a-z]{3,10}", "[a-zA-Z \";<>&\n]{0,30}", "[a-zA-Z ,.\"]{0,40}"),
            0..15,
        ),
    ) {
        let cards: Vec<Flashcard> = cards
            .into_iter()
            .map(|(word, definition, example)| Flashcard {
                word,
                part_of_speech: "noun".into(),
                ipa: None,
                definition,
                example_sentence: example,
                synonyms: vec![],
            })
            .collect();
        let csv = export_csv(&cards);
        prop_assert_eq!(csv.split("\r\n").count(), cards.len() + 1);
        prop_assert!(csv.starts_with("Front;Back"));
    }
}
