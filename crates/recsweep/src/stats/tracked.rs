use crate::{BatchStats, FailureCounter, SharedRunningStats};
use std::time::Instant;

/// A unit of work that runs to completion and either produces a value or
/// fails.
///
/// Implemented for every `FnMut() -> Result<T, E>` closure, so most callers
/// never implement it by hand.
pub trait Task {
    /// Value produced on success.
    type Output;
    /// Error produced on failure.
    type Error;

    /// Runs the work once.
    fn call(&mut self) -> Result<Self::Output, Self::Error>;
}

impl<F, T, E> Task for F
where
    F: FnMut() -> Result<T, E>,
{
    type Output = T;
    type Error = E;

    fn call(&mut self) -> Result<T, E> {
        self()
    }
}

/// Decorates a [`Task`] with wall-clock timing.
///
/// Every successful [`call`](Task::call) adds the elapsed milliseconds to a
/// shared [`SharedRunningStats`]. A failing delegate's error is returned
/// unchanged and no sample is recorded for it.
///
/// When `log_stats` is set, each call also logs the summary described in
/// [`BatchStats::log_summary`].
///
/// The wrapper only *reads* the failure counter. Bumping it when the delegate
/// could not produce a result is the caller's job.
///
/// # Example
///
/// ```
/// use recsweep::{FailureCounter, SharedRunningStats, StatsTracked, Task};
///
/// let timing = SharedRunningStats::new();
/// let failures = FailureCounter::new();
///
/// let mut tracked = StatsTracked::new(|| Ok::<_, ()>(21 * 2), false, timing.clone(), failures);
/// assert_eq!(tracked.call(), Ok(42));
/// assert_eq!(timing.count(), 1);
/// ```
pub struct StatsTracked<W> {
    delegate: W,
    log_stats: bool,
    stats: BatchStats,
    last_sample: Option<f64>,
}

impl<W> StatsTracked<W>
where
    W: Task,
{
    /// Wraps `delegate`, feeding `timing` and reporting `failures`.
    pub const fn new(
        delegate: W,
        log_stats: bool,
        timing: SharedRunningStats,
        failures: FailureCounter,
    ) -> Self {
        Self {
            delegate,
            log_stats,
            stats: BatchStats::from_parts(timing, failures),
            last_sample: None,
        }
    }

    /// Milliseconds recorded by the most recent successful call, if any.
    pub const fn last_sample(&self) -> Option<f64> {
        self.last_sample
    }

    /// Unwraps the decorated task.
    pub fn into_inner(self) -> W {
        self.delegate
    }
}

impl<W> Task for StatsTracked<W>
where
    W: Task,
{
    type Output = W::Output;
    type Error = W::Error;

    fn call(&mut self) -> Result<W::Output, W::Error> {
        let start = Instant::now();
        let output = self.delegate.call()?;
        let elapsed_ms = start.elapsed().as_secs_f64() * 1_000.0;
        self.stats.timing().add_datum(elapsed_ms);
        self.last_sample = Some(elapsed_ms);
        if self.log_stats {
            self.stats.log_summary();
        }
        Ok(output)
    }
}
