//! LLM-backed classifier and synthesizer.
//!
//! Both are thin: prompt wording lives in [`crate::prompts`] and response
//! validation in [`crate::pipeline::response`]. Timeouts and failure policy
//! are applied by the calling stage, so these types make exactly one
//! provider call per batch or chunk.

use crate::cefr::CefrLevel;
use crate::config::DeckConfig;
use crate::error::RemoteError;
use crate::output::Flashcard;
use crate::pipeline::classify::CefrClassifier;
use crate::pipeline::response::{parse_classification, parse_flashcards};
use crate::pipeline::select::TargetWord;
use crate::pipeline::synthesize::FlashcardSynthesizer;
use crate::prompts::{
    classify_user_prompt, flashcard_user_prompt, CLASSIFY_SYSTEM_PROMPT, FLASHCARD_SYSTEM_PROMPT,
};
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use futures::future::BoxFuture;
use futures::FutureExt;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Sampling settings shared by both collaborators.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LlmSettings {
    pub temperature: f32,
    pub max_tokens: usize,
}

impl LlmSettings {
    pub fn from_config(config: &DeckConfig) -> Self {
        Self {
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }
}

fn build_options(settings: LlmSettings) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(settings.temperature),
        max_tokens: Some(settings.max_tokens),
        ..Default::default()
    }
}

async fn complete(
    provider: &Arc<dyn LLMProvider>,
    settings: LlmSettings,
    system: &str,
    user: String,
) -> Result<String, RemoteError> {
    let messages = vec![ChatMessage::system(system), ChatMessage::user(user)];
    let options = build_options(settings);
    let response = provider
        .chat(&messages, Some(&options))
        .await
        .map_err(|e| RemoteError::Provider(e.to_string()))?;
    debug!(
        "LLM call: {} input tokens, {} output tokens",
        response.prompt_tokens, response.completion_tokens
    );
    Ok(response.content)
}

/// Classifies words by asking the model for a `{word: level}` object.
pub struct LlmCefrClassifier {
    provider: Arc<dyn LLMProvider>,
    settings: LlmSettings,
}

impl LlmCefrClassifier {
    pub fn new(provider: Arc<dyn LLMProvider>, settings: LlmSettings) -> Self {
        Self { provider, settings }
    }
}

impl CefrClassifier for LlmCefrClassifier {
    fn classify_batch<'a>(
        &'a self,
        words: &'a [String],
    ) -> BoxFuture<'a, Result<HashMap<String, CefrLevel>, RemoteError>> {
        async move {
            let raw = complete(
                &self.provider,
                self.settings,
                CLASSIFY_SYSTEM_PROMPT,
                classify_user_prompt(words),
            )
            .await?;
            parse_classification(&raw)
        }
        .boxed()
    }
}

#[derive(Serialize)]
struct WordWithContext<'a> {
    word: &'a str,
    context: &'a str,
}

/// JSON payload sent for one synthesis chunk.
pub fn synthesis_payload(targets: &[TargetWord]) -> Result<String, RemoteError> {
    let items: Vec<WordWithContext<'_>> = targets
        .iter()
        .map(|t| WordWithContext {
            word: &t.word,
            context: &t.context_sentence,
        })
        .collect();
    serde_json::to_string(&items).map_err(|e| RemoteError::Provider(format!("payload: {e}")))
}

/// Generates flashcards by asking the model for a JSON array of cards.
pub struct LlmFlashcardSynthesizer {
    provider: Arc<dyn LLMProvider>,
    settings: LlmSettings,
}

impl LlmFlashcardSynthesizer {
    pub fn new(provider: Arc<dyn LLMProvider>, settings: LlmSettings) -> Self {
        Self { provider, settings }
    }
}

impl FlashcardSynthesizer for LlmFlashcardSynthesizer {
    fn synthesize<'a>(
        &'a self,
        targets: &'a [TargetWord],
    ) -> BoxFuture<'a, Result<Vec<Flashcard>, RemoteError>> {
        async move {
            let payload = synthesis_payload(targets)?;
            let raw = complete(
                &self.provider,
                self.settings,
                FLASHCARD_SYSTEM_PROMPT,
                flashcard_user_prompt(&payload),
            )
            .await?;
            parse_flashcards(&raw)
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_options_defaults() {
        let opts = build_options(LlmSettings::from_config(&DeckConfig::default()));
        assert_eq!(opts.temperature, Some(0.2));
        assert_eq!(opts.max_tokens, Some(8192));
    }

    #[test]
    fn payload_pairs_word_and_context() {
        let targets = vec![TargetWord {
            word: "vivid".into(),
            level: CefrLevel::B2,
            context_sentence: "A \"vivid\" dream.".into(),
        }];
        let payload = synthesis_payload(&targets).unwrap();
        let value: serde_json::Value = serde_json::from_str(&payload).unwrap();
        assert_eq!(value[0]["word"], "vivid");
        assert_eq!(value[0]["context"], "A \"vivid\" dream.");
    }
}
