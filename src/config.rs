//! Configuration types for deck generation.
//!
//! All run behaviour is controlled through [`DeckConfig`], built via its
//! [`DeckConfigBuilder`]. Setters clamp out-of-range values; `build()`
//! validates what clamping cannot fix.

use crate::cefr::CefrLevel;
use crate::dictionary::CefrDictionary;
use crate::error::DeckError;
use crate::pipeline::classify::CefrClassifier;
use crate::pipeline::synthesize::FlashcardSynthesizer;
use crate::pipeline::tokenize::parse_stop_words;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Upper bound on words per remote classification call.
pub const MAX_CLASSIFICATION_BATCH: usize = 300;

/// Configuration for one deck-generation run.
///
/// Built via [`DeckConfig::builder()`] or using [`DeckConfig::default()`].
///
/// # Example
/// ```rust
/// use vocab2deck::{CefrLevel, DeckConfig};
///
/// let config = DeckConfig::builder()
///     .level(CefrLevel::B2)
///     .exclude_words("gonna, wanna")
///     .model("gpt-4.1-mini")
///     .build()
///     .unwrap();
/// assert!(config.stop_words.contains("gonna"));
/// ```
#[derive(Clone)]
pub struct DeckConfig {
    /// Lowest CEFR level that gets a flashcard. Default: B1.
    pub level: CefrLevel,

    /// Extra words to exclude on top of the built-in stop list (lowercase).
    pub stop_words: HashSet<String>,

    /// Words per remote classification call. Range: 1–300. Default: 300.
    ///
    /// Large uploads produce thousands of unknown words; batching keeps each
    /// prompt within provider payload limits.
    pub batch_size: usize,

    /// Remote calls in flight at once, for classification batches and
    /// synthesis chunks. Default: 1 (sequential).
    ///
    /// Batches are independent and merged in batch order, so raising this
    /// only changes wall-clock time, never the result.
    pub classification_concurrency: usize,

    /// Targets per flashcard-synthesis call. Default: 40.
    ///
    /// Generated cards are long; smaller chunks keep each response well under
    /// the model's output-token limit.
    pub synthesis_batch_size: usize,

    /// LLM model identifier, e.g. "gpt-4.1-nano", "gemini-2.5-flash".
    /// If None, uses the provider default.
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "gemini", "ollama").
    /// If None along with `provider`, the provider is auto-detected.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Custom word classifier. Takes precedence over the LLM-backed one.
    pub classifier: Option<Arc<dyn CefrClassifier>>,

    /// Custom flashcard synthesizer. Takes precedence over the LLM-backed one.
    pub synthesizer: Option<Arc<dyn FlashcardSynthesizer>>,

    /// Local word list. If None, uses [`CefrDictionary::bundled`].
    pub dictionary: Option<Arc<CefrDictionary>>,

    /// Sampling temperature for LLM calls. Default: 0.2.
    pub temperature: f32,

    /// Maximum tokens the LLM may generate per call. Default: 8192.
    pub max_tokens: usize,

    /// Per-LLM-call timeout in seconds. Default: 120.
    pub api_timeout_secs: u64,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Drop target words with no matching context line before synthesis.
    /// Default: false (they are sent with the "no context" sentinel).
    pub skip_words_without_context: bool,

    /// Receives stage and batch events. Default: None.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for DeckConfig {
    fn default() -> Self {
        Self {
            level: CefrLevel::default(),
            stop_words: HashSet::new(),
            batch_size: MAX_CLASSIFICATION_BATCH,
            classification_concurrency: 1,
            synthesis_batch_size: 40,
            model: None,
            provider_name: None,
            provider: None,
            classifier: None,
            synthesizer: None,
            dictionary: None,
            temperature: 0.2,
            max_tokens: 8192,
            api_timeout_secs: 120,
            download_timeout_secs: 120,
            skip_words_without_context: false,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for DeckConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeckConfig")
            .field("level", &self.level)
            .field("stop_words", &self.stop_words.len())
            .field("batch_size", &self.batch_size)
            .field("classification_concurrency", &self.classification_concurrency)
            .field("synthesis_batch_size", &self.synthesis_batch_size)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("classifier", &self.classifier.as_ref().map(|_| "<dyn CefrClassifier>"))
            .field(
                "synthesizer",
                &self.synthesizer.as_ref().map(|_| "<dyn FlashcardSynthesizer>"),
            )
            .field("dictionary", &self.dictionary.as_ref().map(|d| d.len()))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("skip_words_without_context", &self.skip_words_without_context)
            .finish()
    }
}

impl DeckConfig {
    /// Create a new builder for `DeckConfig`.
    pub fn builder() -> DeckConfigBuilder {
        DeckConfigBuilder {
            config: Self::default(),
        }
    }

    /// The dictionary this run classifies against.
    pub fn effective_dictionary(&self) -> Arc<CefrDictionary> {
        self.dictionary
            .as_ref()
            .map(Arc::clone)
            .unwrap_or_else(CefrDictionary::bundled)
    }
}

/// Builder for [`DeckConfig`].
pub struct DeckConfigBuilder {
    config: DeckConfig,
}

impl fmt::Debug for DeckConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeckConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl DeckConfigBuilder {
    pub fn level(mut self, level: CefrLevel) -> Self {
        self.config.level = level;
        self
    }

    /// Add user stop words from a comma-separated list (`"gonna, Wanna,,"`).
    pub fn exclude_words(mut self, raw: &str) -> Self {
        self.config.stop_words.extend(parse_stop_words(raw));
        self
    }

    /// Add user stop words one by one.
    pub fn stop_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.config.stop_words.extend(
            words
                .into_iter()
                .map(|w| w.as_ref().trim().to_lowercase())
                .filter(|w| !w.is_empty()),
        );
        self
    }

    pub fn batch_size(mut self, n: usize) -> Self {
        self.config.batch_size = n.clamp(1, MAX_CLASSIFICATION_BATCH);
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.classification_concurrency = n.max(1);
        self
    }

    pub fn synthesis_batch_size(mut self, n: usize) -> Self {
        self.config.synthesis_batch_size = n.max(1);
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn classifier(mut self, classifier: Arc<dyn CefrClassifier>) -> Self {
        self.config.classifier = Some(classifier);
        self
    }

    pub fn synthesizer(mut self, synthesizer: Arc<dyn FlashcardSynthesizer>) -> Self {
        self.config.synthesizer = Some(synthesizer);
        self
    }

    pub fn dictionary(mut self, dictionary: Arc<CefrDictionary>) -> Self {
        self.config.dictionary = Some(dictionary);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn skip_words_without_context(mut self, v: bool) -> Self {
        self.config.skip_words_without_context = v;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<DeckConfig, DeckError> {
        let c = &self.config;
        if c.batch_size == 0 || c.batch_size > MAX_CLASSIFICATION_BATCH {
            return Err(DeckError::InvalidConfig(format!(
                "Batch size must be 1–{MAX_CLASSIFICATION_BATCH}, got {}",
                c.batch_size
            )));
        }
        if c.classification_concurrency == 0 {
            return Err(DeckError::InvalidConfig("Concurrency must be ≥ 1".into()));
        }
        if c.synthesis_batch_size == 0 {
            return Err(DeckError::InvalidConfig(
                "Synthesis batch size must be ≥ 1".into(),
            ));
        }
        if c.max_tokens == 0 {
            return Err(DeckError::InvalidConfig("max_tokens must be ≥ 1".into()));
        }
        if c.api_timeout_secs == 0 {
            return Err(DeckError::InvalidConfig(
                "API timeout must be at least 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}
