//! Error types for the vocab2deck library.
//!
//! Three error types reflect three distinct failure modes:
//!
//! * [`DeckError`]: **fatal**, the run cannot produce a deck (no input,
//!   unreadable document, nothing left after filtering, synthesis failed).
//!   Returned as `Err(DeckError)` from the top-level `generate*` functions and
//!   recorded as the single terminal error of a [`crate::state::PipelineState`].
//!
//! * [`BatchError`]: **non-fatal**, one remote classification batch failed.
//!   The words in that batch stay unclassified and the run continues. Stored in
//!   [`crate::pipeline::classify::ClassificationOutcome::warnings`] so callers
//!   can see a degraded-but-successful run without reading logs.
//!
//! * [`RemoteError`]: what a collaborator (classifier or synthesizer) reports.
//!   The pipeline decides whether it becomes a `BatchError` or a fatal
//!   [`DeckError::SynthesisFailure`].

use crate::cefr::CefrLevel;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the vocab2deck library.
#[derive(Debug, Error)]
pub enum DeckError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// No document was supplied.
    #[error("No input document provided")]
    InputMissing,

    /// Input file was not found at the given path.
    #[error("Input file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file extension is not one of `.srt`, `.vtt`, `.pdf`.
    #[error("Unsupported document '{name}': expected a .srt, .vtt or .pdf file")]
    UnsupportedFormat { name: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    // ── Document errors ───────────────────────────────────────────────────
    /// The normalizer could not extract any text.
    #[error("Could not extract text from '{name}': {detail}")]
    DocumentParseFailure { name: String, detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
PDFium is normally downloaded automatically on first run.\n\
If the auto-download failed, you can:\n\
  • Check your internet connection and try again.\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Vocabulary errors ─────────────────────────────────────────────────
    /// Nothing survived tokenizing and stop-word filtering.
    #[error("No candidate words left after length and stop-word filtering")]
    EmptyCandidateSet,

    /// No classified word reaches the selected level.
    #[error("No classified words at or above {threshold}")]
    NoTargetWords { threshold: CefrLevel },

    // ── Backend errors ────────────────────────────────────────────────────
    /// Flashcard generation failed or returned data that does not fit the schema.
    #[error("Flashcard synthesis failed: {detail}")]
    SynthesisFailure { detail: String },

    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the deck file.
    #[error("Failed to write deck file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DeckError {
    /// The one short message shown to the end user for this failure.
    ///
    /// `Display` carries the diagnostic detail meant for logs; this is the
    /// learner-facing wording.
    pub fn user_message(&self) -> String {
        match self {
            DeckError::InputMissing => "Please upload a subtitle or PDF file first.".into(),
            DeckError::FileNotFound { .. } | DeckError::PermissionDenied { .. } => {
                "The selected file could not be opened.".into()
            }
            DeckError::UnsupportedFormat { .. } => {
                "Unsupported file type. Please choose a .srt, .vtt or .pdf file.".into()
            }
            DeckError::DownloadFailed { .. } | DeckError::DownloadTimeout { .. } => {
                "The document could not be downloaded.".into()
            }
            DeckError::DocumentParseFailure { .. } | DeckError::PdfiumBindingFailed(_) => {
                "Could not read any text from the document.".into()
            }
            DeckError::EmptyCandidateSet => {
                "No valid words found in the document after filtering.".into()
            }
            DeckError::NoTargetWords { .. } => {
                "No words found for the selected level. Try a lower level or a different file."
                    .into()
            }
            DeckError::SynthesisFailure { .. } => {
                "Failed to generate flashcards. The response might have been invalid.".into()
            }
            DeckError::ProviderNotConfigured { .. } => {
                "No language model is configured. Set an API key and try again.".into()
            }
            DeckError::InvalidConfig(msg) => format!("Invalid options: {msg}"),
            DeckError::OutputWriteFailed { .. } | DeckError::Internal(_) => {
                "An unexpected error occurred during processing. Check the logs for details."
                    .into()
            }
        }
    }

    /// `true` for failures the user can fix by changing the file or options
    /// and running again.
    pub fn is_user_actionable(&self) -> bool {
        matches!(
            self,
            DeckError::InputMissing
                | DeckError::UnsupportedFormat { .. }
                | DeckError::EmptyCandidateSet
                | DeckError::NoTargetWords { .. }
                | DeckError::InvalidConfig(_)
        )
    }
}

/// A non-fatal failure of one remote classification batch.
///
/// The batch's words stay unclassified; other batches are unaffected.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum BatchError {
    /// The classifier call failed or returned an unusable response.
    #[error("Batch {batch} ({words} words): classification failed: {detail}")]
    Failed {
        batch: usize,
        words: usize,
        detail: String,
    },

    /// The classifier call did not answer in time.
    #[error("Batch {batch} ({words} words): classification timed out after {secs}s")]
    Timeout { batch: usize, words: usize, secs: u64 },
}

impl BatchError {
    /// 1-indexed batch number.
    pub fn batch(&self) -> usize {
        match self {
            BatchError::Failed { batch, .. } | BatchError::Timeout { batch, .. } => *batch,
        }
    }
}

/// Failure reported by a remote collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// Transport or provider-side failure.
    #[error("provider error: {0}")]
    Provider(String),

    /// The response did not match the expected schema.
    #[error("malformed response: {0}")]
    Malformed(String),
}
