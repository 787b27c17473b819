//! Two-tier CEFR classification.
//!
//! 1. **Local**: every candidate found in the [`CefrDictionary`] is resolved
//!    immediately and never sent anywhere.
//! 2. **Remote**: the rest goes to a [`CefrClassifier`] in consecutive
//!    batches of at most `batch_size` words.
//!
//! ## Failure policy
//!
//! A failing batch (provider error, timeout, malformed response) resolves
//! nothing, is logged at WARN and recorded as a [`BatchError`]; the other
//! batches and the run carry on. There is no retry.
//!
//! ## Ordering
//!
//! Batches may run concurrently (`classification_concurrency`), but their
//! results are sorted by batch index before merging and the final map is
//! laid out in candidate discovery order, so the outcome never depends on
//! completion order.

use crate::cefr::CefrLevel;
use crate::config::DeckConfig;
use crate::dictionary::CefrDictionary;
use crate::error::{BatchError, RemoteError};
use futures::future::BoxFuture;
use futures::stream::{self, StreamExt};
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Word → level, in candidate discovery order.
pub type WordClassification = IndexMap<String, CefrLevel>;

/// Classifies words the local dictionary does not know.
///
/// Implementations receive one batch of lowercase words and return the
/// levels they could determine. Words they cannot rate are simply left out.
/// Keys outside the batch are ignored by the pipeline.
pub trait CefrClassifier: Send + Sync {
    fn classify_batch<'a>(
        &'a self,
        words: &'a [String],
    ) -> BoxFuture<'a, Result<HashMap<String, CefrLevel>, RemoteError>>;
}

/// Result of classifying one run's candidates.
#[derive(Debug, Clone, Default)]
pub struct ClassificationOutcome {
    pub levels: WordClassification,
    /// Words resolved by the dictionary.
    pub local_count: usize,
    /// Words resolved by the remote classifier.
    pub remote_count: usize,
    /// Remote batches dispatched.
    pub batches: usize,
    /// One entry per failed batch.
    pub warnings: Vec<BatchError>,
}

/// What the remote tier produced, already in batch order.
#[derive(Debug, Clone, Default)]
pub struct RemoteClassification {
    pub resolved: Vec<(String, CefrLevel)>,
    pub batches: usize,
    pub warnings: Vec<BatchError>,
}

/// Resolve words through the dictionary.
///
/// Returns the resolved words (in input order) and the unresolved rest.
pub fn classify_local(
    words: &[String],
    dictionary: &CefrDictionary,
) -> (WordClassification, Vec<String>) {
    let mut resolved = WordClassification::new();
    let mut unresolved = Vec::new();
    for word in words {
        match dictionary.get(word) {
            Some(level) => {
                resolved.insert(word.clone(), level);
            }
            None => unresolved.push(word.clone()),
        }
    }
    debug!(
        "Local classification: {} resolved, {} unresolved",
        resolved.len(),
        unresolved.len()
    );
    (resolved, unresolved)
}

/// Send `unresolved` to the classifier in batches.
///
/// Never fails as a whole: each batch either contributes its words or a
/// [`BatchError`].
pub async fn classify_remote(
    unresolved: &[String],
    classifier: &Arc<dyn CefrClassifier>,
    config: &DeckConfig,
) -> RemoteClassification {
    if unresolved.is_empty() {
        return RemoteClassification::default();
    }

    let batch_size = config.batch_size.max(1);
    let total = unresolved.len().div_ceil(batch_size);
    let timeout_secs = config.api_timeout_secs;
    info!(
        "Classifying {} unknown words in {} batch(es) of up to {}",
        unresolved.len(),
        total,
        batch_size
    );

    let mut results: Vec<(usize, Result<Vec<(String, CefrLevel)>, BatchError>)> =
        stream::iter(unresolved.chunks(batch_size).enumerate().map(|(idx, batch)| {
            let classifier = Arc::clone(classifier);
            async move {
                let batch_no = idx + 1;
                let outcome = run_batch(classifier.as_ref(), batch, batch_no, timeout_secs).await;
                if let Some(ref cb) = config.progress_callback {
                    match &outcome {
                        Ok(resolved) => cb.on_batch_complete(batch_no, total, resolved.len()),
                        Err(e) => cb.on_batch_error(batch_no, total, e.to_string()),
                    }
                }
                (idx, outcome)
            }
        }))
        .buffer_unordered(config.classification_concurrency.max(1))
        .collect()
        .await;

    results.sort_by_key(|(idx, _)| *idx);

    let mut out = RemoteClassification {
        batches: total,
        ..Default::default()
    };
    for (_, outcome) in results {
        match outcome {
            Ok(resolved) => out.resolved.extend(resolved),
            Err(e) => {
                warn!("{}", e);
                out.warnings.push(e);
            }
        }
    }
    out
}

async fn run_batch(
    classifier: &dyn CefrClassifier,
    batch: &[String],
    batch_no: usize,
    timeout_secs: u64,
) -> Result<Vec<(String, CefrLevel)>, BatchError> {
    let call = classifier.classify_batch(batch);
    let response = match tokio::time::timeout(Duration::from_secs(timeout_secs), call).await {
        Ok(Ok(map)) => map,
        Ok(Err(e)) => {
            return Err(BatchError::Failed {
                batch: batch_no,
                words: batch.len(),
                detail: e.to_string(),
            })
        }
        Err(_) => {
            return Err(BatchError::Timeout {
                batch: batch_no,
                words: batch.len(),
                secs: timeout_secs,
            })
        }
    };

    let returned = response.len();
    let by_word: HashMap<String, CefrLevel> = response
        .into_iter()
        .map(|(word, level)| (word.trim().to_lowercase(), level))
        .collect();

    // Keep only this batch's own words, in batch order.
    let resolved: Vec<(String, CefrLevel)> = batch
        .iter()
        .filter_map(|w| by_word.get(w).map(|level| (w.clone(), *level)))
        .collect();

    debug!(
        "Batch {}: {} words sent, {} returned, {} kept",
        batch_no,
        batch.len(),
        returned,
        resolved.len()
    );
    Ok(resolved)
}

/// Combine local and remote results into the final classification.
///
/// Local entries are never overwritten. The map follows `candidates` order
/// and contains only candidate words.
pub fn merge(
    candidates: &[String],
    local: WordClassification,
    remote: RemoteClassification,
) -> ClassificationOutcome {
    let local_count = local.len();
    let mut combined: HashMap<String, CefrLevel> = local.into_iter().collect();
    for (word, level) in remote.resolved {
        combined.entry(word).or_insert(level);
    }

    let mut seen = HashSet::new();
    let levels: WordClassification = candidates
        .iter()
        .filter(|w| seen.insert(w.as_str()))
        .filter_map(|w| combined.get(w).map(|level| (w.clone(), *level)))
        .collect();

    ClassificationOutcome {
        remote_count: levels.len().saturating_sub(local_count),
        local_count,
        batches: remote.batches,
        warnings: remote.warnings,
        levels,
    }
}

/// Both tiers in one call: dictionary first, then `classifier` for the rest.
///
/// The classifier is not invoked when the dictionary resolves everything.
pub async fn classify(
    words: &[String],
    dictionary: &CefrDictionary,
    classifier: &Arc<dyn CefrClassifier>,
    config: &DeckConfig,
) -> ClassificationOutcome {
    let (local, unresolved) = classify_local(words, dictionary);
    let remote = classify_remote(&unresolved, classifier, config).await;
    merge(words, local, remote)
}
