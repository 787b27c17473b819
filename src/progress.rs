//! Progress-callback trait for pipeline events.
//!
//! Inject an [`Arc<dyn PipelineProgressCallback>`] via
//! [`crate::config::DeckConfigBuilder::progress_callback`] to receive stage
//! changes and per-batch classification results as a run proceeds.
//!
//! Callers can forward events to a channel, a UI, or a terminal progress bar
//! without the library knowing how the host application communicates. The
//! trait is `Send + Sync` because classification batches may complete
//! concurrently.
//!
//! # Example
//!
//! ```rust
//! use vocab2deck::{DeckConfig, PipelineProgressCallback, PipelineStage};
//! use std::sync::Arc;
//!
//! struct Printer;
//!
//! impl PipelineProgressCallback for Printer {
//!     fn on_stage(&self, stage: PipelineStage, progress: u8, message: String) {
//!         eprintln!("[{progress:>3}%] {stage}: {message}");
//!     }
//! }
//!
//! let config = DeckConfig::builder()
//!     .progress_callback(Arc::new(Printer) as Arc<dyn PipelineProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::state::PipelineStage;
use std::sync::Arc;

/// Called by the pipeline as a run moves through its stages.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Message arguments are owned `String`s so an
/// implementation can move them into a spawned task.
pub trait PipelineProgressCallback: Send + Sync {
    /// Called on every stage transition and progress checkpoint.
    ///
    /// # Arguments
    /// * `stage`   : the stage just entered
    /// * `progress`: overall progress, 0–100, never decreasing within a run
    /// * `message` : short human-readable description
    fn on_stage(&self, stage: PipelineStage, progress: u8, message: String) {
        let _ = (stage, progress, message);
    }

    /// Called when a remote classification batch answers.
    ///
    /// # Arguments
    /// * `batch`   : 1-indexed batch number
    /// * `total`   : number of batches in this run
    /// * `resolved`: words the batch classified
    fn on_batch_complete(&self, batch: usize, total: usize, resolved: usize) {
        let _ = (batch, total, resolved);
    }

    /// Called when a remote classification batch fails. The run continues.
    fn on_batch_error(&self, batch: usize, total: usize, error: String) {
        let _ = (batch, total, error);
    }

    /// Called once when the run produced its flashcards.
    fn on_run_complete(&self, cards: usize) {
        let _ = cards;
    }

    /// Called once when the run stops on a fatal error.
    ///
    /// `message` is the user-facing text, not the diagnostic detail.
    fn on_run_failed(&self, message: String) {
        let _ = message;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl PipelineProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::DeckConfig`].
pub type ProgressCallback = Arc<dyn PipelineProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        stages: Mutex<Vec<(PipelineStage, u8)>>,
        batch_errors: AtomicUsize,
    }

    impl PipelineProgressCallback for Recorder {
        fn on_stage(&self, stage: PipelineStage, progress: u8, _message: String) {
            self.stages.lock().unwrap().push((stage, progress));
        }

        fn on_batch_error(&self, _batch: usize, _total: usize, _error: String) {
            self.batch_errors.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_stage(PipelineStage::Parsing, 0, "Parsing".into());
        cb.on_batch_complete(1, 2, 10);
        cb.on_batch_error(2, 2, "timeout".into());
        cb.on_run_complete(5);
        cb.on_run_failed("nope".into());
    }

    #[test]
    fn recorder_receives_events() {
        let rec = Recorder::default();
        rec.on_stage(PipelineStage::Parsing, 0, String::new());
        rec.on_stage(PipelineStage::Tokenizing, 10, String::new());
        rec.on_batch_error(1, 1, "boom".into());

        let stages = rec.stages.lock().unwrap().clone();
        assert_eq!(
            stages,
            vec![(PipelineStage::Parsing, 0), (PipelineStage::Tokenizing, 10)]
        );
        assert_eq!(rec.batch_errors.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn arc_dyn_callback_moves_into_spawn() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        tokio::spawn(async move {
            cb.on_batch_error(1, 3, "provider error".to_string());
        })
        .await
        .expect("spawn must succeed");
    }
}
