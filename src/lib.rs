//! # vocab2deck
//!
//! Turn subtitles (SRT/VTT) and PDFs into CEFR-graded vocabulary flashcards,
//! exported as an Anki-ready CSV deck.
//!
//! ## Why this crate?
//!
//! Learners pick up vocabulary best from material they actually watch or
//! read. This crate pulls every candidate word out of a document, grades it
//! on the CEFR scale (A1–C2), keeps the words at or above the learner's
//! level, and writes a flashcard for each one that quotes the sentence the
//! word appeared in.
//!
//! ## Pipeline Overview
//!
//! ```text
//! document
//!  │
//!  ├─ 1. Input      resolve local file or download from URL
//!  ├─ 2. Normalize  strip cues/timestamps (subtitles) or extract text (pdfium)
//!  ├─ 3. Tokenize   lowercase words, dedup, drop short and stop words
//!  ├─ 4. Classify   bundled word list first, LLM batches for the rest
//!  ├─ 5. Select     keep level ≥ threshold, bind each to its first sentence
//!  ├─ 6. Generate   LLM flashcards, schema-checked, in chunks
//!  └─ 7. Deck       `Front;Back` CSV for Anki
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use vocab2deck::{generate, CefrLevel, DeckConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / GEMINI_API_KEY / …
//!     let config = DeckConfig::builder()
//!         .level(CefrLevel::B2)
//!         .exclude_words("gonna, wanna")
//!         .build()?;
//!     let output = generate("episode01.srt", &config).await?;
//!     std::fs::write("anki_deck.csv", output.to_csv())?;
//!     eprintln!("{} cards, {} words classified by AI",
//!         output.stats.cards,
//!         output.stats.remotely_classified);
//!     Ok(())
//! }
//! ```
//!
//! ## Custom backends
//!
//! [`CefrClassifier`] and [`FlashcardSynthesizer`] are plain traits. Inject
//! your own through [`DeckConfigBuilder::classifier`] and
//! [`DeckConfigBuilder::synthesizer`] to use another service, a cache, or a
//! fake in tests; no provider is then needed.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `vocab2deck` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! vocab2deck = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod cefr;
pub mod config;
pub mod deck;
pub mod dictionary;
pub mod error;
pub mod generate;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod state;
pub mod stopwords;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use cefr::{CefrLevel, ParseCefrLevelError};
pub use config::{DeckConfig, DeckConfigBuilder};
pub use deck::{export_csv, format_card, write_deck, DeckRecord, DEFAULT_DECK_FILE_NAME};
pub use dictionary::CefrDictionary;
pub use error::{BatchError, DeckError, RemoteError};
pub use generate::{
    generate, generate_from_bytes, generate_from_document, generate_sync, generate_to_file,
    Session,
};
pub use output::{DeckOutput, Flashcard, GenerationStats};
pub use pipeline::classify::{CefrClassifier, WordClassification};
pub use pipeline::normalize::NormalizedDocument;
pub use pipeline::select::{TargetWord, NO_CONTEXT_SENTENCE};
pub use pipeline::synthesize::FlashcardSynthesizer;
pub use progress::{NoopProgressCallback, PipelineProgressCallback, ProgressCallback};
pub use state::{PipelineStage, PipelineState};
