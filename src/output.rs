//! Result types returned by the generation API.

use crate::error::BatchError;
use crate::pipeline::select::TargetWord;
use serde::{Deserialize, Serialize};

/// One vocabulary flashcard.
///
/// Field names serialise in camelCase (`partOfSpeech`, `exampleSentence`),
/// which is also the schema the synthesis backend is asked to produce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flashcard {
    pub word: String,
    pub part_of_speech: String,
    /// IPA transcription without surrounding slashes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipa: Option<String>,
    pub definition: String,
    pub example_sentence: String,
    #[serde(default)]
    pub synonyms: Vec<String>,
}

/// Counters and timings for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationStats {
    /// Distinct words left after tokenizing and stop-word filtering.
    pub candidate_words: usize,
    /// Words resolved by the bundled dictionary.
    pub locally_classified: usize,
    /// Words resolved by the remote classifier.
    pub remotely_classified: usize,
    /// Remote classification batches dispatched.
    pub classification_batches: usize,
    /// Batches that failed and resolved nothing.
    pub failed_batches: usize,
    /// Words at or above the selected level.
    pub target_words: usize,
    /// Targets bound to the "no context" sentinel.
    pub words_without_context: usize,
    pub cards: usize,
    pub classification_duration_ms: u64,
    pub synthesis_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Everything a successful run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeckOutput {
    pub cards: Vec<Flashcard>,
    /// The word/context pairs the cards were generated from, in card order.
    pub targets: Vec<TargetWord>,
    /// Classification batches that failed without stopping the run.
    pub warnings: Vec<BatchError>,
    pub stats: GenerationStats,
}

impl DeckOutput {
    /// Render the cards as an Anki CSV deck.
    pub fn to_csv(&self) -> String {
        crate::deck::export_csv(&self.cards)
    }

    /// `true` when some classification batches failed.
    pub fn is_degraded(&self) -> bool {
        !self.warnings.is_empty()
    }
}
