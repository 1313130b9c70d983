//! Shared statistics for one sweep.
//!
//! - [`RunningStats`] / [`SharedRunningStats`]: online mean and deviation.
//! - [`FailureCounter`]: IDs that could not be processed.
//! - [`StatsTracked`]: times any [`Task`] into a shared accumulator.
//! - [`MemorySnapshot`]: diagnostic memory usage.
//!
//! [`BatchStats`] bundles the timing accumulator and failure counter so one
//! instance can be built per run and handed to every worker explicitly.

mod counter;
mod memory;
mod running;
mod tracked;

pub use counter::*;
pub use memory::*;
pub use running::*;
pub use tracked::*;

/// Timing and failure statistics for a single run, shared by all workers.
///
/// Cloning is cheap; all clones feed the same underlying counters.
#[derive(Debug, Clone, Default)]
pub struct BatchStats {
    timing: SharedRunningStats,
    failures: FailureCounter,
}

impl BatchStats {
    /// Fresh statistics for a new run.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds statistics from existing handles, e.g. to share a failure
    /// counter with an outer wrapper.
    pub const fn from_parts(timing: SharedRunningStats, failures: FailureCounter) -> Self {
        Self { timing, failures }
    }

    /// Per-item processing time in milliseconds.
    pub const fn timing(&self) -> &SharedRunningStats {
        &self.timing
    }

    /// IDs that could not be processed.
    pub const fn failures(&self) -> &FailureCounter {
        &self.failures
    }

    /// Logs the average time per item (rounded down to whole milliseconds), a
    /// [`MemorySnapshot`], and the number of failures so far.
    ///
    /// A no-op when the `tracing` feature is disabled.
    pub fn log_summary(&self) {
        #[cfg(feature = "tracing")]
        {
            tracing::info!(
                "Average time per recommendation: {}ms",
                self.timing.average() as u64
            );
            log_memory_statistics();
            tracing::info!("Unable to recommend in {} cases", self.failures.get());
        }
    }

    /// Wraps `task` so its duration is recorded in [`Self::timing`].
    pub fn track<W>(&self, task: W, log_stats: bool) -> StatsTracked<W>
    where
        W: Task,
    {
        StatsTracked::new(task, log_stats, self.timing.clone(), self.failures.clone())
    }
}
