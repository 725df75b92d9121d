//! # Batch Coordinator
//!
//! Drives the full pipeline over an arbitrarily large batch of samples with
//! a bounded working set.
//!
//! ## Algorithm
//! 1. Sort all samples by timestamp and split them into chunks of `batch_size`
//! 2. Per chunk: filter, cluster, extract patterns, categorize and score
//! 3. Between chunks: check the cancellation token and yield the thread
//! 4. Merge candidates from different chunks whose centroids are close
//! 5. Merge the result against the caller's prior places
//!
//! Chunks are independent until step 4, so with the `parallel` feature they
//! are processed on rayon threads. Results are always merged in chunk order,
//! so the output does not depend on scheduling.

pub mod merge;
pub mod progress;

pub use merge::{merge_nearby_candidates, merge_with_prior};
pub use progress::{
    AtomicProgressTracker, BatchPhase, BatchProgressCallback, CancellationToken, NoopProgress,
};

use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::info;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    cluster_samples, filter_samples_with_reference, PlaceCandidate, PlaceConfig, PlaceError,
    Result, SamplePoint,
};

/// How a batch run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    /// Stopped at a chunk boundary; candidates cover the processed chunks only.
    Cancelled { chunks_processed: usize },
}

/// Counters describing one batch run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchStats {
    pub input_points: usize,
    /// Samples that survived quality filtering
    pub filtered_points: usize,
    /// Filtered samples that ended up in no cluster
    pub noise_points: usize,
    pub clusters: usize,
    pub chunks_total: usize,
    pub chunks_processed: usize,
    /// Chunk candidates absorbed into a neighbour from another chunk
    pub chunk_merges: usize,
    /// Fresh candidates absorbed into a prior place
    pub prior_merges: usize,
}

/// Result of a batch run.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub candidates: Vec<PlaceCandidate>,
    pub status: RunStatus,
    pub stats: BatchStats,
}

impl BatchOutcome {
    pub fn is_cancelled(&self) -> bool {
        matches!(self.status, RunStatus::Cancelled { .. })
    }

    /// The candidates of a completed run, or `PlaceError::Cancelled`.
    ///
    /// Callers that want the partial candidates of a cancelled run should
    /// read `candidates` directly instead.
    pub fn into_completed(self) -> Result<Vec<PlaceCandidate>> {
        match self.status {
            RunStatus::Completed => Ok(self.candidates),
            RunStatus::Cancelled { chunks_processed } => Err(PlaceError::Cancelled {
                chunks_processed,
                chunks_total: self.stats.chunks_total,
            }),
        }
    }
}

/// Output of the per-chunk pipeline.
#[derive(Debug, Default)]
struct ChunkResult {
    candidates: Vec<PlaceCandidate>,
    filtered_points: usize,
    clustered_points: usize,
    clusters: usize,
}

/// Infer places from a batch of samples.
///
/// Fails only on an invalid configuration. Empty input, or input without
/// any dense enough cluster, yields the prior places unchanged.
///
/// # Example
/// ```
/// use placematch::{run, PlaceConfig};
///
/// let places = run(&[], &PlaceConfig::default(), &[]).unwrap();
/// assert!(places.is_empty());
/// ```
pub fn run(
    points: &[SamplePoint],
    config: &PlaceConfig,
    prior: &[PlaceCandidate],
) -> Result<Vec<PlaceCandidate>> {
    let outcome = run_with_progress(
        points,
        config,
        prior,
        Arc::new(NoopProgress),
        &CancellationToken::new(),
    )?;
    Ok(outcome.candidates)
}

/// Infer places from a batch of samples with progress reporting and
/// cooperative cancellation.
///
/// The token is checked before every chunk. A cancelled run still merges
/// and returns the candidates of the chunks that finished, with
/// [`RunStatus::Cancelled`].
pub fn run_with_progress(
    points: &[SamplePoint],
    config: &PlaceConfig,
    prior: &[PlaceCandidate],
    progress: Arc<dyn BatchProgressCallback>,
    cancel: &CancellationToken,
) -> Result<BatchOutcome> {
    config.validate()?;

    let mut sorted = points.to_vec();
    sorted.sort_by_key(|p| p.timestamp);

    let chunks: Vec<&[SamplePoint]> = sorted.chunks(config.batch_size as usize).collect();
    let mut stats = BatchStats {
        input_points: sorted.len(),
        chunks_total: chunks.len(),
        ..BatchStats::default()
    };

    info!(
        "[Batch] Processing {} samples in {} chunks against {} prior places",
        sorted.len(),
        chunks.len(),
        prior.len()
    );

    let chunk_results = match sorted.last().map(|p| p.timestamp) {
        Some(reference) => process_chunks(&chunks, config, reference, &progress, cancel),
        None => Vec::new(),
    };

    stats.chunks_processed = chunk_results.len();
    let mut fresh: Vec<PlaceCandidate> = Vec::new();
    for result in chunk_results {
        stats.filtered_points += result.filtered_points;
        stats.noise_points += result.filtered_points - result.clustered_points;
        stats.clusters += result.clusters;
        fresh.extend(result.candidates);
    }

    progress.on_phase(BatchPhase::MergingChunks, fresh.len() as u32);
    let (fresh, chunk_merges) = merge_nearby_candidates(fresh, config);
    stats.chunk_merges = chunk_merges;

    progress.on_phase(BatchPhase::MergingPrior, prior.len() as u32);
    let (candidates, prior_merges) = merge_with_prior(fresh, prior, config);
    stats.prior_merges = prior_merges;

    let status = if stats.chunks_processed < stats.chunks_total {
        RunStatus::Cancelled {
            chunks_processed: stats.chunks_processed,
        }
    } else {
        RunStatus::Completed
    };

    info!(
        "[Batch] {} places ({} filtered samples, {} clusters, {} chunk merges, {} prior merges){}",
        candidates.len(),
        stats.filtered_points,
        stats.clusters,
        stats.chunk_merges,
        stats.prior_merges,
        if status == RunStatus::Completed {
            ""
        } else {
            " - cancelled"
        }
    );

    Ok(BatchOutcome {
        candidates,
        status,
        stats,
    })
}

/// Run every chunk that starts before cancellation, in chunk order.
#[cfg(not(feature = "parallel"))]
fn process_chunks(
    chunks: &[&[SamplePoint]],
    config: &PlaceConfig,
    reference: DateTime<Utc>,
    progress: &Arc<dyn BatchProgressCallback>,
    cancel: &CancellationToken,
) -> Vec<ChunkResult> {
    progress.on_phase(BatchPhase::ProcessingChunks, chunks.len() as u32);

    let mut results = Vec::with_capacity(chunks.len());
    for chunk in chunks {
        if cancel.is_cancelled() {
            info!(
                "[Batch] Cancelled after {} of {} chunks",
                results.len(),
                chunks.len()
            );
            break;
        }
        results.push(process_chunk(chunk, config, reference));
        progress.on_progress();
        std::thread::yield_now();
    }
    results
}

/// Run every chunk that starts before cancellation on rayon threads.
///
/// Results are kept in chunk order. A chunk that was skipped because of
/// cancellation ends the usable prefix, so a cancelled parallel run reports
/// the same kind of partial result as a sequential one.
#[cfg(feature = "parallel")]
fn process_chunks(
    chunks: &[&[SamplePoint]],
    config: &PlaceConfig,
    reference: DateTime<Utc>,
    progress: &Arc<dyn BatchProgressCallback>,
    cancel: &CancellationToken,
) -> Vec<ChunkResult> {
    progress.on_phase(BatchPhase::ProcessingChunks, chunks.len() as u32);

    let results: Vec<Option<ChunkResult>> = chunks
        .par_iter()
        .map(|chunk| {
            if cancel.is_cancelled() {
                return None;
            }
            let result = process_chunk(chunk, config, reference);
            progress.on_progress();
            Some(result)
        })
        .collect();

    let completed: Vec<ChunkResult> = results.into_iter().map_while(|r| r).collect();
    if completed.len() < chunks.len() {
        info!(
            "[Batch] Cancelled after {} of {} chunks",
            completed.len(),
            chunks.len()
        );
    }
    completed
}

fn process_chunk(
    chunk: &[SamplePoint],
    config: &PlaceConfig,
    reference: DateTime<Utc>,
) -> ChunkResult {
    let filtered = filter_samples_with_reference(chunk, config, reference);
    let clusters = cluster_samples(&filtered, config.distance_threshold_m, config.min_points);

    let candidates: Vec<PlaceCandidate> = clusters
        .iter()
        .filter_map(|cluster| PlaceCandidate::from_cluster(cluster, config))
        .collect();

    ChunkResult {
        filtered_points: filtered.len(),
        clustered_points: clusters.iter().map(|c| c.len()).sum(),
        clusters: clusters.len(),
        candidates,
    }
}
