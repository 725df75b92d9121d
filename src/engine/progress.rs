//! Progress reporting and cancellation for batch runs.
//!
//! Progress is reported once per processed chunk. With the `parallel`
//! feature chunks finish on rayon threads, so implementations must be
//! `Send + Sync`.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

/// Batch phases, ordered by execution sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchPhase {
    /// Filter, cluster and score each chunk
    ProcessingChunks,
    /// Merge candidates that straddle chunk boundaries
    MergingChunks,
    /// Merge fresh candidates into the caller's prior places
    MergingPrior,
}

impl BatchPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchPhase::ProcessingChunks => "processing_chunks",
            BatchPhase::MergingChunks => "merging_chunks",
            BatchPhase::MergingPrior => "merging_prior",
        }
    }
}

/// Trait for receiving progress updates during a batch run.
pub trait BatchProgressCallback: Send + Sync {
    /// Called when entering a new phase. `total` is the number of items in this phase.
    fn on_phase(&self, phase: BatchPhase, total: u32);
    /// Called after completing one item in the current phase.
    fn on_progress(&self);
}

/// Progress sink that ignores every update.
pub struct NoopProgress;

impl BatchProgressCallback for NoopProgress {
    fn on_phase(&self, _phase: BatchPhase, _total: u32) {}
    fn on_progress(&self) {}
}

/// Simple atomic progress tracker that can be polled from another thread.
pub struct AtomicProgressTracker {
    pub phase: Mutex<String>,
    pub completed: AtomicU32,
    pub total: AtomicU32,
}

impl Default for AtomicProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl AtomicProgressTracker {
    pub fn new() -> Self {
        Self {
            phase: Mutex::new(String::new()),
            completed: AtomicU32::new(0),
            total: AtomicU32::new(0),
        }
    }

    /// Name of the current phase.
    pub fn current_phase(&self) -> String {
        match self.phase.lock() {
            Ok(phase) => phase.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl BatchProgressCallback for AtomicProgressTracker {
    fn on_phase(&self, phase: BatchPhase, total: u32) {
        match self.phase.lock() {
            Ok(mut current) => *current = phase.as_str().to_string(),
            Err(poisoned) => *poisoned.into_inner() = phase.as_str().to_string(),
        }
        self.completed.store(0, Ordering::SeqCst);
        self.total.store(total, Ordering::SeqCst);
    }

    fn on_progress(&self) {
        self.completed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Caller-owned cancellation flag, checked at every chunk boundary.
///
/// Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request that the run stop at the next chunk boundary.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
