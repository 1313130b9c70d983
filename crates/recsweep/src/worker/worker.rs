use crate::{
    BatchStats, Computation, Error, IdSource, Identifier, Pull, Result, Sink, Task,
    log_memory_statistics,
};
use core::time::Duration;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::Instant;
use tokio_util::sync::CancellationToken;
#[cfg(feature = "tracing")]
use tracing::instrument;

/// Items between memory snapshots when debug logging is enabled.
#[cfg_attr(not(feature = "tracing"), allow(dead_code))]
const SNAPSHOT_EVERY_DEBUG: u64 = 100;
/// Items between memory snapshots otherwise.
const SNAPSHOT_EVERY: u64 = 1_000;

/// Outcome of one [`Worker::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerReport {
    /// The worker's ordinal number.
    pub worker: usize,
    /// IDs computed and written successfully.
    pub succeeded: u64,
    /// IDs whose computation or write failed.
    pub failed: u64,
    /// Wall time from the start of `run` to its return.
    pub elapsed: Duration,
    /// `true` if the worker exited because it was stopped rather than because
    /// the source ran dry.
    pub stopped: bool,
}

impl WorkerReport {
    const fn new(worker: usize) -> Self {
        Self {
            worker,
            succeeded: 0,
            failed: 0,
            elapsed: Duration::ZERO,
            stopped: false,
        }
    }

    /// IDs this worker finished, successfully or not.
    pub const fn processed(&self) -> u64 {
        self.succeeded + self.failed
    }
}

/// Drains a shared [`IdSource`], one ID at a time.
///
/// For every ID the worker runs the [`Computation`], hands the result to the
/// [`Sink`], and records the elapsed time in the run's [`BatchStats`]. A
/// failure for one ID is logged, counted, and skipped; it never ends the
/// worker.
///
/// [`run`](Self::run) blocks the calling thread and is meant to be given its
/// own thread (see [`WorkerPool`](crate::WorkerPool)). [`stop`](Self::stop)
/// may be called from any thread and takes effect before the next pull: the
/// ID in flight, if any, is finished first.
///
/// Each worker holds a child of the pool's [`CancellationToken`], so it also
/// stops when the whole pool is cancelled. A worker runs at most once.
pub struct Worker<S, C, K> {
    number: usize,
    source: Arc<S>,
    computation: Arc<C>,
    sink: Arc<K>,
    result_size: usize,
    stats: BatchStats,
    token: CancellationToken,
    started: AtomicBool,
}

impl<S, C, K> Worker<S, C, K>
where
    S: IdSource,
    C: Computation,
    K: Sink,
{
    /// Creates worker `number` bound to the given collaborators.
    ///
    /// `parent` is typically the pool's shutdown token; cancelling it stops
    /// this worker too.
    pub fn new(
        number: usize,
        source: Arc<S>,
        computation: Arc<C>,
        sink: Arc<K>,
        result_size: usize,
        stats: BatchStats,
        parent: &CancellationToken,
    ) -> Self {
        Self {
            number,
            source,
            computation,
            sink,
            result_size,
            stats,
            token: parent.child_token(),
            started: AtomicBool::new(false),
        }
    }

    /// The worker's ordinal number.
    pub const fn number(&self) -> usize {
        self.number
    }

    /// Requests a cooperative stop. Never blocks.
    pub fn stop(&self) {
        #[cfg(feature = "tracing")]
        tracing::debug!("Worker {} received stop request", self.number);
        self.token.cancel();
    }

    /// Returns `true` once [`stop`](Self::stop) was called or the parent token
    /// was cancelled.
    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Pulls and processes IDs until the source is exhausted or the worker is
    /// stopped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WorkerReused`] if this worker has already run. Per-item
    /// failures are never returned; they are reflected in the report.
    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip(self), fields(worker = self.number)))]
    pub fn run(&self) -> Result<WorkerReport> {
        if self.started.swap(true, Ordering::AcqRel) {
            return Err(Error::WorkerReused {
                worker: self.number,
            });
        }

        let start = Instant::now();
        let mut report = WorkerReport::new(self.number);
        let snapshot_every = snapshot_interval();

        #[cfg(feature = "tracing")]
        tracing::info!("Worker {} is started.", self.number);

        loop {
            if self.token.is_cancelled() {
                report.stopped = true;
                break;
            }

            let id = match self.source.pull() {
                Pull::Ready { id } => id,
                Pull::Exhausted => break,
            };

            let index = report.processed();
            match self.process(id) {
                Ok(()) => report.succeeded += 1,
                Err(e) if e.is_cancelled() => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!("User {id} abandoned: worker {} stopping", self.number);
                    report.stopped = true;
                    break;
                }
                Err(_e) => {
                    #[cfg(feature = "tracing")]
                    tracing::error!(user_id = id, error = %_e, "User {id} could not be processed.");
                    self.stats.failures().increment();
                    report.failed += 1;
                }
            }

            if index % snapshot_every == 0 {
                log_memory_statistics();
            }
        }

        report.elapsed = start.elapsed();

        #[cfg(feature = "tracing")]
        tracing::info!(
            "Worker {} processed {} users at {} ms.",
            self.number,
            report.processed(),
            report.elapsed.as_millis()
        );

        Ok(report)
    }

    /// Computes and writes one ID, timing the pair into the shared stats.
    fn process(&self, id: Identifier) -> Result<()> {
        let mut task = self.stats.track(
            || {
                let items = self.computation.compute(id, self.result_size)?;
                self.sink.write(id, &items)?;
                Ok::<_, Error>(items)
            },
            false,
        );
        let _items = task.call()?;
        // Same measurement the timing accumulator just recorded.
        let _elapsed_ms = task.last_sample().unwrap_or_default();

        #[cfg(feature = "tracing")]
        {
            if tracing::enabled!(tracing::Level::DEBUG) {
                tracing::debug!("User {id} => Time: {_elapsed_ms:.0} ms, Result: {_items:?}");
            } else {
                tracing::info!(
                    "User {id} => Time: {_elapsed_ms:.0} ms, Result: {} items",
                    _items.len()
                );
            }
        }

        Ok(())
    }
}

fn snapshot_interval() -> u64 {
    #[cfg(feature = "tracing")]
    {
        if tracing::enabled!(tracing::Level::DEBUG) {
            return SNAPSHOT_EVERY_DEBUG;
        }
    }
    SNAPSHOT_EVERY
}
