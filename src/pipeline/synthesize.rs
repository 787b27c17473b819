//! Flashcard synthesis: target words in, validated flashcards out.
//!
//! Targets are sent in chunks of `synthesis_batch_size`. Chunks may run
//! concurrently but results are consumed in chunk order. Unlike
//! classification there is no partial success: one failing chunk fails the
//! whole run with [`DeckError::SynthesisFailure`].

use crate::config::DeckConfig;
use crate::error::{DeckError, RemoteError};
use crate::output::Flashcard;
use crate::pipeline::select::TargetWord;
use futures::future::BoxFuture;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Produces flashcards for word/context pairs.
///
/// Implementations must return exactly one card per target, in target
/// order, with `example_sentence` echoing the target's context. The pipeline
/// enforces the first two and repairs the third.
pub trait FlashcardSynthesizer: Send + Sync {
    fn synthesize<'a>(
        &'a self,
        targets: &'a [TargetWord],
    ) -> BoxFuture<'a, Result<Vec<Flashcard>, RemoteError>>;
}

/// Generate cards for all `targets`.
///
/// `on_chunk(done, total)` is called after each chunk completes, in order.
pub async fn synthesize_cards(
    targets: &[TargetWord],
    synthesizer: &Arc<dyn FlashcardSynthesizer>,
    config: &DeckConfig,
    mut on_chunk: impl FnMut(usize, usize),
) -> Result<Vec<Flashcard>, DeckError> {
    if targets.is_empty() {
        return Ok(Vec::new());
    }

    let chunk_size = config.synthesis_batch_size.max(1);
    let total = targets.len().div_ceil(chunk_size);
    let timeout_secs = config.api_timeout_secs;
    info!(
        "Generating {} flashcards in {} chunk(s) of up to {}",
        targets.len(),
        total,
        chunk_size
    );

    let mut chunks = stream::iter(targets.chunks(chunk_size).enumerate().map(|(idx, chunk)| {
        let synthesizer = Arc::clone(synthesizer);
        async move {
            let chunk_no = idx + 1;
            let call = synthesizer.synthesize(chunk);
            let cards = match tokio::time::timeout(Duration::from_secs(timeout_secs), call).await {
                Ok(Ok(cards)) => cards,
                Ok(Err(e)) => {
                    return Err(DeckError::SynthesisFailure {
                        detail: format!("chunk {chunk_no}/{total}: {e}"),
                    })
                }
                Err(_) => {
                    return Err(DeckError::SynthesisFailure {
                        detail: format!("chunk {chunk_no}/{total}: timed out after {timeout_secs}s"),
                    })
                }
            };
            validate_chunk(chunk, cards).map_err(|detail| DeckError::SynthesisFailure {
                detail: format!("chunk {chunk_no}/{total}: {detail}"),
            })
        }
    }))
    .buffered(config.classification_concurrency.max(1));

    let mut cards = Vec::with_capacity(targets.len());
    let mut done = 0;
    while let Some(result) = chunks.next().await {
        cards.extend(result?);
        done += 1;
        debug!("Synthesis chunk {}/{} complete", done, total);
        on_chunk(done, total);
    }
    Ok(cards)
}

/// Check one chunk's cards against its targets.
///
/// Counts and words (case-insensitive, in order) must match. The returned
/// cards carry the target's word and context sentence.
pub fn validate_chunk(
    targets: &[TargetWord],
    cards: Vec<Flashcard>,
) -> Result<Vec<Flashcard>, String> {
    if cards.len() != targets.len() {
        return Err(format!(
            "expected {} flashcards, got {}",
            targets.len(),
            cards.len()
        ));
    }

    targets
        .iter()
        .zip(cards)
        .enumerate()
        .map(|(i, (target, mut card))| {
            if card.word.trim().to_lowercase() != target.word.to_lowercase() {
                return Err(format!(
                    "flashcard {} is for '{}', expected '{}'",
                    i + 1,
                    card.word,
                    target.word
                ));
            }
            if card.example_sentence != target.context_sentence {
                debug!(
                    "'{}': replacing generated example sentence with the document context",
                    target.word
                );
                card.example_sentence = target.context_sentence.clone();
            }
            card.word = target.word.clone();
            Ok(card)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cefr::CefrLevel;
    use futures::FutureExt;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn target(word: &str, context: &str) -> TargetWord {
        TargetWord {
            word: word.into(),
            level: CefrLevel::B2,
            context_sentence: context.into(),
        }
    }

    fn card(word: &str, example: &str) -> Flashcard {
        Flashcard {
            word: word.into(),
            part_of_speech: "noun".into(),
            ipa: None,
            definition: format!("meaning of {word}"),
            example_sentence: example.into(),
            synonyms: vec![],
        }
    }

    /// Echoes a card per target; fails when a target word is `fail`.
    struct EchoSynthesizer {
        calls: AtomicUsize,
    }

    impl FlashcardSynthesizer for EchoSynthesizer {
        fn synthesize<'a>(
            &'a self,
            targets: &'a [TargetWord],
        ) -> BoxFuture<'a, Result<Vec<Flashcard>, RemoteError>> {
            async move {
                self.calls.fetch_add(1, Ordering::SeqCst);
                if targets.iter().any(|t| t.word == "fail") {
                    return Err(RemoteError::Malformed("not an array".into()));
                }
                Ok(targets.iter().map(|t| card(&t.word, "made up")).collect())
            }
            .boxed()
        }
    }

    #[test]
    fn validation_forces_context_sentence() {
        let targets = vec![target("vivid", "A vivid dream.")];
        let cards = validate_chunk(&targets, vec![card("Vivid", "Something else.")]).unwrap();
        assert_eq!(cards[0].example_sentence, "A vivid dream.");
        assert_eq!(cards[0].word, "vivid");
    }

    #[test]
    fn validation_rejects_count_mismatch() {
        let targets = vec![target("vivid", "x"), target("zeal", "y")];
        let err = validate_chunk(&targets, vec![card("vivid", "x")]).unwrap_err();
        assert!(err.contains("expected 2"));
    }

    #[test]
    fn validation_rejects_reordered_words() {
        let targets = vec![target("vivid", "x"), target("zeal", "y")];
        let err = validate_chunk(&targets, vec![card("zeal", "y"), card("vivid", "x")]).unwrap_err();
        assert!(err.contains("expected 'vivid'"));
    }

    #[tokio::test]
    async fn chunks_preserve_order_and_report_progress() {
        let fake = Arc::new(EchoSynthesizer {
            calls: AtomicUsize::new(0),
        });
        let synth: Arc<dyn FlashcardSynthesizer> = fake.clone();
        let config = DeckConfig::builder()
            .synthesis_batch_size(2)
            .concurrency(2)
            .build()
            .unwrap();
        let targets: Vec<_> = ["aaa", "bbb", "ccc", "ddd", "eee"]
            .iter()
            .map(|w| target(w, "ctx"))
            .collect();

        let mut ticks = Vec::new();
        let cards = synthesize_cards(&targets, &synth, &config, |d, t| ticks.push((d, t)))
            .await
            .unwrap();

        let words: Vec<_> = cards.iter().map(|c| c.word.as_str()).collect();
        assert_eq!(words, ["aaa", "bbb", "ccc", "ddd", "eee"]);
        assert!(cards.iter().all(|c| c.example_sentence == "ctx"));
        assert_eq!(ticks, vec![(1, 3), (2, 3), (3, 3)]);
        assert_eq!(fake.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn failing_chunk_is_fatal() {
        let synth: Arc<dyn FlashcardSynthesizer> = Arc::new(EchoSynthesizer {
            calls: AtomicUsize::new(0),
        });
        let targets = vec![target("vivid", "x"), target("fail", "y")];
        let err = synthesize_cards(&targets, &synth, &DeckConfig::default(), |_, _| {})
            .await
            .unwrap_err();
        assert!(matches!(err, DeckError::SynthesisFailure { .. }));
    }
}
