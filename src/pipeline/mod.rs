//! The three top-level runs: parametric synthesis, chunk-grounded synthesis
//! and document vectorization.
//!
//! Each run is a strictly sequential loop. Provider failures skip the current
//! item; only setup and persistence failures end the run early.

pub mod grounded;
pub mod parametric;
pub mod vectorize;

pub use grounded::{run_grounded, GroundedOptions};
pub use parametric::{run_parametric, ParametricOptions};
pub use vectorize::{run_vectorize, VectorizeOptions, VectorizeStats};

/// Counters for one synthesis run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Questions produced by the model.
    pub questions: usize,
    pub accepted: usize,
    /// Dropped by validation, including duplicates caught before answering.
    pub rejected: usize,
    /// Generation, embedding or search calls that failed.
    pub failed: usize,
}

impl RunStats {
    pub fn log_summary(&self, run: &str, dataset_len: usize) {
        tracing::info!(
            "{} run finished: {} questions, {} accepted, {} rejected, {} failed calls; dataset now has {} records",
            run,
            self.questions,
            self.accepted,
            self.rejected,
            self.failed,
            dataset_len
        );
    }
}
