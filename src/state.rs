//! Per-run pipeline state.
//!
//! One [`PipelineState`] exists per generation run. It is owned by the
//! orchestrator (or by a [`crate::Session`] between runs) and is the only
//! place cross-stage progress lives; every stage function is pure over its
//! inputs. Starting a new run replaces the previous state wholesale.

use crate::output::Flashcard;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Pipeline stages, in the only order a run may visit them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum PipelineStage {
    #[default]
    Idle,
    Parsing,
    Tokenizing,
    ClassifyingLocal,
    ClassifyingRemote,
    Filtering,
    Synthesizing,
    Done,
    Failed,
}

impl PipelineStage {
    /// `true` for `Done` and `Failed`.
    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineStage::Done | PipelineStage::Failed)
    }

    pub fn label(self) -> &'static str {
        match self {
            PipelineStage::Idle => "Idle",
            PipelineStage::Parsing => "Parsing",
            PipelineStage::Tokenizing => "Tokenizing",
            PipelineStage::ClassifyingLocal => "Classifying",
            PipelineStage::ClassifyingRemote => "Classifying (AI)",
            PipelineStage::Filtering => "Filtering",
            PipelineStage::Synthesizing => "Generating",
            PipelineStage::Done => "Done",
            PipelineStage::Failed => "Failed",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Progress, stage, terminal error and result of one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineState {
    stage: PipelineStage,
    progress: u8,
    message: String,
    error: Option<String>,
    cards: Vec<Flashcard>,
}

impl PipelineState {
    /// A fresh state at `Idle`, 0 %.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&self) -> PipelineStage {
        self.stage
    }

    /// Progress in percent, 0–100.
    pub fn progress(&self) -> u8 {
        self.progress
    }

    /// Latest human-readable stage message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The run's terminal, user-facing error, if it failed.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn cards(&self) -> &[Flashcard] {
        &self.cards
    }

    pub fn into_cards(self) -> Vec<Flashcard> {
        self.cards
    }

    pub fn is_done(&self) -> bool {
        self.stage == PipelineStage::Done
    }

    pub fn is_failed(&self) -> bool {
        self.stage == PipelineStage::Failed
    }

    /// Move to `stage` with at least `progress` percent.
    ///
    /// Returns `false` and leaves the state untouched when the transition
    /// would go backwards or leave a terminal stage. Progress never
    /// decreases and is capped at 100.
    pub fn advance(&mut self, stage: PipelineStage, progress: u8, message: impl Into<String>) -> bool {
        if self.stage.is_terminal() || stage < self.stage {
            return false;
        }
        self.stage = stage;
        self.progress = self.progress.max(progress.min(100));
        self.message = message.into();
        true
    }

    /// Raise progress within the current stage.
    pub fn set_progress(&mut self, progress: u8, message: impl Into<String>) {
        if self.stage.is_terminal() {
            return;
        }
        self.progress = self.progress.max(progress.min(100));
        self.message = message.into();
    }

    /// Terminal success.
    pub fn finish(&mut self, cards: Vec<Flashcard>) {
        if self.stage.is_terminal() {
            return;
        }
        self.stage = PipelineStage::Done;
        self.progress = 100;
        self.message = format!("Generated {} flashcards", cards.len());
        self.cards = cards;
    }

    /// Terminal failure. Only the first error of a run is kept.
    pub fn fail(&mut self, user_message: impl Into<String>) {
        if self.stage.is_terminal() {
            return;
        }
        let msg = user_message.into();
        self.stage = PipelineStage::Failed;
        self.message = msg.clone();
        self.error = Some(msg);
        self.cards.clear();
    }
}
