//! Run orchestration: the only place stages are sequenced and the only
//! owner of [`PipelineState`].
//!
//! ```text
//! Idle → Parsing → Tokenizing → ClassifyingLocal → [ClassifyingRemote]
//!      → Filtering → Synthesizing → Done | Failed
//! ```
//!
//! Every stage is awaited before the next starts. The first fatal error
//! ends the run: it is logged, reported through the progress callback,
//! stored as the state's single user-facing message, and returned.
//! Classification batch failures are not fatal; they travel in
//! [`DeckOutput::warnings`].

use crate::config::DeckConfig;
use crate::deck::write_deck;
use crate::error::DeckError;
use crate::output::{DeckOutput, GenerationStats};
use crate::pipeline::classify::{self, CefrClassifier, RemoteClassification};
use crate::pipeline::input::{self, SourceDocument};
use crate::pipeline::llm::{LlmCefrClassifier, LlmFlashcardSynthesizer, LlmSettings};
use crate::pipeline::normalize::{self, NormalizedDocument};
use crate::pipeline::select;
use crate::pipeline::synthesize::{self, FlashcardSynthesizer};
use crate::pipeline::tokenize;
use crate::state::{PipelineStage, PipelineState};
use edgequake_llm::{LLMProvider, ProviderFactory};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// Generate flashcards from a subtitle or PDF file path or URL.
///
/// This is the primary entry point for the library.
///
/// # Returns
/// `Ok(DeckOutput)` on success, even if some classification batches failed
/// (check `output.warnings`).
///
/// # Errors
/// Returns `Err(DeckError)` for fatal errors: missing or unsupported input,
/// unreadable document, no candidate or target words, synthesis failure,
/// or no usable LLM provider.
///
/// # Example
/// ```rust,no_run
/// use vocab2deck::{generate, CefrLevel, DeckConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = DeckConfig::builder().level(CefrLevel::B2).build()?;
/// let output = generate("episode01.srt", &config).await?;
/// println!("{}", output.to_csv());
/// # Ok(())
/// # }
/// ```
pub async fn generate(
    input: impl AsRef<str>,
    config: &DeckConfig,
) -> Result<DeckOutput, DeckError> {
    let mut state = PipelineState::new();
    execute(RunInput::Location(input.as_ref().to_string()), config, &mut state).await
}

/// Generate flashcards from an in-memory document.
///
/// The kind is taken from `file_name`'s extension.
pub async fn generate_from_bytes(
    file_name: impl Into<String>,
    bytes: Vec<u8>,
    config: &DeckConfig,
) -> Result<DeckOutput, DeckError> {
    let mut state = PipelineState::new();
    let input = RunInput::Bytes {
        name: file_name.into(),
        bytes,
    };
    execute(input, config, &mut state).await
}

/// Generate flashcards from text that is already normalized.
pub async fn generate_from_document(
    document: NormalizedDocument,
    config: &DeckConfig,
) -> Result<DeckOutput, DeckError> {
    let mut state = PipelineState::new();
    execute(RunInput::Document(document), config, &mut state).await
}

/// Generate flashcards and write the deck to `output_path`.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn generate_to_file(
    input: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    config: &DeckConfig,
) -> Result<DeckOutput, DeckError> {
    let output = generate(input, config).await?;
    write_deck(output_path, &output.cards).await?;
    Ok(output)
}

/// Synchronous wrapper around [`generate`].
///
/// Creates a temporary tokio runtime internally.
pub fn generate_sync(
    input: impl AsRef<str>,
    config: &DeckConfig,
) -> Result<DeckOutput, DeckError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| DeckError::Internal(format!("Failed to create tokio runtime: {e}")))?
        .block_on(generate(input, config))
}

/// Runs one generation at a time and keeps the state of the latest run.
///
/// No error escapes a run: a failure lands in [`PipelineState::error`] as
/// one user-facing message. Starting a run discards the previous state.
///
/// ```rust,no_run
/// use vocab2deck::{DeckConfig, Session};
///
/// # #[tokio::main]
/// # async fn main() {
/// let mut session = Session::new(DeckConfig::default());
/// let state = session.run("lecture.pdf").await;
/// match state.error() {
///     Some(msg) => eprintln!("{msg}"),
///     None => println!("{} cards", state.cards().len()),
/// }
/// # }
/// ```
#[derive(Debug)]
pub struct Session {
    config: DeckConfig,
    state: PipelineState,
    output: Option<DeckOutput>,
}

impl Session {
    pub fn new(config: DeckConfig) -> Self {
        Self {
            config,
            state: PipelineState::new(),
            output: None,
        }
    }

    pub fn config(&self) -> &DeckConfig {
        &self.config
    }

    /// State of the latest run (`Idle` before the first).
    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    /// Full output of the latest run, if it succeeded.
    pub fn output(&self) -> Option<&DeckOutput> {
        self.output.as_ref()
    }

    /// Run on a file path or URL.
    pub async fn run(&mut self, input: impl AsRef<str>) -> &PipelineState {
        self.start(RunInput::Location(input.as_ref().to_string())).await
    }

    /// Run on an in-memory document named `file_name`.
    pub async fn run_bytes(&mut self, file_name: impl Into<String>, bytes: Vec<u8>) -> &PipelineState {
        let input = RunInput::Bytes {
            name: file_name.into(),
            bytes,
        };
        self.start(input).await
    }

    async fn start(&mut self, input: RunInput) -> &PipelineState {
        self.state = PipelineState::new();
        self.output = execute(input, &self.config, &mut self.state).await.ok();
        &self.state
    }
}

// ── Internal helpers ─────────────────────────────────────────────────────

enum RunInput {
    Location(String),
    Bytes { name: String, bytes: Vec<u8> },
    Document(NormalizedDocument),
}

/// Applies stage transitions to the state and mirrors them to the callback.
struct Tracker<'a> {
    state: &'a mut PipelineState,
    config: &'a DeckConfig,
}

impl Tracker<'_> {
    fn advance(&mut self, stage: PipelineStage, progress: u8, message: impl Into<String>) {
        let message = message.into();
        if self.state.advance(stage, progress, message.clone()) {
            info!("[{:>3}%] {}: {}", self.state.progress(), stage, message);
            if let Some(ref cb) = self.config.progress_callback {
                cb.on_stage(stage, self.state.progress(), message);
            }
        }
    }

    fn progress(&mut self, progress: u8, message: impl Into<String>) {
        let message = message.into();
        self.state.set_progress(progress, message.clone());
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_stage(self.state.stage(), self.state.progress(), message);
        }
    }
}

async fn execute(
    input: RunInput,
    config: &DeckConfig,
    state: &mut PipelineState,
) -> Result<DeckOutput, DeckError> {
    let mut tracker = Tracker { state, config };
    match run_stages(input, config, &mut tracker).await {
        Ok(output) => {
            tracker.state.finish(output.cards.clone());
            info!(
                "Generated {} flashcards in {}ms ({} batch warning(s))",
                output.cards.len(),
                output.stats.total_duration_ms,
                output.warnings.len()
            );
            if let Some(ref cb) = config.progress_callback {
                cb.on_stage(PipelineStage::Done, 100, tracker.state.message().to_string());
                cb.on_run_complete(output.cards.len());
            }
            Ok(output)
        }
        Err(e) => {
            error!("Run failed: {}", e);
            let message = e.user_message();
            tracker.state.fail(message.clone());
            if let Some(ref cb) = config.progress_callback {
                cb.on_run_failed(message);
            }
            Err(e)
        }
    }
}

async fn run_stages(
    input: RunInput,
    config: &DeckConfig,
    tracker: &mut Tracker<'_>,
) -> Result<DeckOutput, DeckError> {
    let total_start = Instant::now();
    let mut stats = GenerationStats::default();
    let mut provider: Option<Arc<dyn LLMProvider>> = None;

    // ── Parsing ──────────────────────────────────────────────────────────
    tracker.advance(PipelineStage::Parsing, 0, "Parsing document...");
    let document = match input {
        RunInput::Location(location) => {
            let source = input::resolve_input(&location, config.download_timeout_secs).await?;
            normalize::normalize(source).await?
        }
        RunInput::Bytes { name, bytes } => {
            normalize::normalize(SourceDocument::from_bytes(name, bytes)?).await?
        }
        RunInput::Document(document) => document,
    };

    // ── Tokenizing ───────────────────────────────────────────────────────
    tracker.advance(PipelineStage::Tokenizing, 10, "Extracting words...");
    let candidates = tokenize::extract_candidates(&document.full_text, &config.stop_words)?;
    stats.candidate_words = candidates.len();

    // ── Classifying ──────────────────────────────────────────────────────
    let classify_start = Instant::now();
    tracker.advance(
        PipelineStage::ClassifyingLocal,
        10,
        format!("Classifying {} words...", candidates.len()),
    );
    let dictionary = config.effective_dictionary();
    let (local, unresolved) = classify::classify_local(&candidates, &dictionary);
    tracker.progress(25, format!("{} words found in the word list", local.len()));

    let remote = if unresolved.is_empty() {
        RemoteClassification::default()
    } else {
        tracker.advance(
            PipelineStage::ClassifyingRemote,
            25,
            format!("Classifying {} unknown words with AI...", unresolved.len()),
        );
        let classifier = resolve_classifier(config, &mut provider)?;
        classify::classify_remote(&unresolved, &classifier, config).await
    };
    let outcome = classify::merge(&candidates, local, remote);
    stats.locally_classified = outcome.local_count;
    stats.remotely_classified = outcome.remote_count;
    stats.classification_batches = outcome.batches;
    stats.failed_batches = outcome.warnings.len();
    stats.classification_duration_ms = classify_start.elapsed().as_millis() as u64;
    tracker.progress(40, format!("{} words classified", outcome.levels.len()));

    // ── Filtering ────────────────────────────────────────────────────────
    tracker.advance(
        PipelineStage::Filtering,
        40,
        format!("Selecting words at {} and above...", config.level),
    );
    let mut targets = select::select_targets(&outcome.levels, config.level, &document.context_lines)?;
    stats.words_without_context = targets.iter().filter(|t| !t.has_context()).count();
    if config.skip_words_without_context {
        targets = select::drop_words_without_context(targets, config.level)?;
    }
    stats.target_words = targets.len();
    tracker.progress(45, format!("{} target words", targets.len()));

    // ── Synthesizing ─────────────────────────────────────────────────────
    let synthesis_start = Instant::now();
    tracker.advance(
        PipelineStage::Synthesizing,
        45,
        format!("Generating {} flashcards...", targets.len()),
    );
    let synthesizer = resolve_synthesizer(config, &mut provider)?;
    let cards = synthesize::synthesize_cards(&targets, &synthesizer, config, |done, total| {
        let pct = 40 + (60 * done / total.max(1)) as u8;
        tracker.progress(pct.min(99), format!("Generated chunk {done}/{total}"));
    })
    .await?;
    stats.synthesis_duration_ms = synthesis_start.elapsed().as_millis() as u64;
    stats.cards = cards.len();
    stats.total_duration_ms = total_start.elapsed().as_millis() as u64;

    Ok(DeckOutput {
        cards,
        targets,
        warnings: outcome.warnings,
        stats,
    })
}

fn resolve_classifier(
    config: &DeckConfig,
    provider: &mut Option<Arc<dyn LLMProvider>>,
) -> Result<Arc<dyn CefrClassifier>, DeckError> {
    if let Some(ref classifier) = config.classifier {
        return Ok(Arc::clone(classifier));
    }
    let provider = cached_provider(config, provider)?;
    Ok(Arc::new(LlmCefrClassifier::new(
        provider,
        LlmSettings::from_config(config),
    )))
}

fn resolve_synthesizer(
    config: &DeckConfig,
    provider: &mut Option<Arc<dyn LLMProvider>>,
) -> Result<Arc<dyn FlashcardSynthesizer>, DeckError> {
    if let Some(ref synthesizer) = config.synthesizer {
        return Ok(Arc::clone(synthesizer));
    }
    let provider = cached_provider(config, provider)?;
    Ok(Arc::new(LlmFlashcardSynthesizer::new(
        provider,
        LlmSettings::from_config(config),
    )))
}

/// Resolve the provider once per run, on first need.
fn cached_provider(
    config: &DeckConfig,
    cache: &mut Option<Arc<dyn LLMProvider>>,
) -> Result<Arc<dyn LLMProvider>, DeckError> {
    if let Some(ref provider) = cache {
        return Ok(Arc::clone(provider));
    }
    let provider = resolve_provider(config)?;
    *cache = Some(Arc::clone(&provider));
    Ok(provider)
}

/// Default model for a named provider when none is configured.
fn default_model(provider_name: &str) -> &'static str {
    match provider_name {
        "gemini" => "gemini-2.5-flash",
        _ => "gpt-4.1-nano",
    }
}

fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, DeckError> {
    info!("Using LLM provider '{}' with model '{}'", provider_name, model);
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        DeckError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the LLM provider, from most-specific to least-specific.
///
/// 1. **Pre-built provider** (`config.provider`), used as-is.
/// 2. **Named provider + model** (`config.provider_name`), API key read from
///    the environment by [`ProviderFactory::create_llm_provider`].
/// 3. **Environment pair** (`EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`).
/// 4. **`OPENAI_API_KEY`**, then **`GEMINI_API_KEY`**, when set.
/// 5. **Full auto-detection** ([`ProviderFactory::from_env`]).
fn resolve_provider(config: &DeckConfig) -> Result<Arc<dyn LLMProvider>, DeckError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        let model = config.model.as_deref().unwrap_or(default_model(name));
        return create_provider(name, model);
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_provider(&prov, &model);
        }
    }

    for (var, name) in [("OPENAI_API_KEY", "openai"), ("GEMINI_API_KEY", "gemini")] {
        if std::env::var(var).is_ok_and(|key| !key.is_empty()) {
            let model = config.model.as_deref().unwrap_or(default_model(name));
            return create_provider(name, model);
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| DeckError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, GEMINI_API_KEY, or configure a provider.\n\
                Error: {e}"
            ),
        })?;

    Ok(llm_provider)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_models() {
        assert_eq!(default_model("gemini"), "gemini-2.5-flash");
        assert_eq!(default_model("openai"), "gpt-4.1-nano");
    }

    #[tokio::test]
    async fn missing_input_fails_before_any_provider_lookup() {
        let mut session = Session::new(DeckConfig::default());
        let state = session.run("").await;
        assert!(state.is_failed());
        assert_eq!(state.error(), Some("Please upload a subtitle or PDF file first."));
        assert!(session.output().is_none());
    }

    #[tokio::test]
    async fn unsupported_bytes_fail_the_run() {
        let err = generate_from_bytes("notes.docx", b"hello".to_vec(), &DeckConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DeckError::UnsupportedFormat { .. }));
    }

    #[test]
    fn generate_sync_reports_missing_file() {
        let err = generate_sync("/no/such/file.srt", &DeckConfig::default()).unwrap_err();
        assert!(matches!(err, DeckError::FileNotFound { .. }));
    }
}
