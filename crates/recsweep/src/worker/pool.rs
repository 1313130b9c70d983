//! Thread-per-worker pool draining one shared [`IdSource`].
//!
//! [`WorkerPool`] owns `num_workers` [`Worker`]s that share a single source,
//! computation, sink and [`BatchStats`]. Each worker gets its own named OS
//! thread, and there is no scheduling beyond "whoever pulls first gets the
//! next ID".
//!
//! Shutdown is cooperative. [`WorkerPool::stop_all`] asks every worker to stop
//! before its next pull, and cancelling [`WorkerPool::shutdown_token`] (e.g.
//! from a signal handler) does the same through the token hierarchy. In both
//! cases in-flight items finish normally; [`WorkerPool::join`] waits for that.

use crate::{BatchStats, Computation, Error, IdSource, Result, Sink, Worker, WorkerReport};
use std::{sync::Arc, thread::JoinHandle};
use tokio_util::sync::CancellationToken;

/// Default prefix for worker thread names.
pub const DEFAULT_THREAD_NAME_PREFIX: &str = "recsweep-worker";

/// Sizing for a [`WorkerPool`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Number of worker threads. Must be greater than zero.
    pub num_workers: usize,
    /// Items requested from the computation per ID. Must be greater than zero.
    pub result_size: usize,
    /// Worker threads are named `{prefix}-{number}`.
    pub thread_name_prefix: String,
}

impl PoolConfig {
    pub fn new(num_workers: usize, result_size: usize) -> Self {
        Self {
            num_workers,
            result_size,
            thread_name_prefix: DEFAULT_THREAD_NAME_PREFIX.to_string(),
        }
    }

    #[must_use]
    pub fn with_thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    fn validate(&self) -> Result<()> {
        if self.num_workers == 0 {
            return Err(Error::InvalidConfig {
                reason: "num_workers must be greater than 0".to_string(),
            });
        }
        if self.result_size == 0 {
            return Err(Error::InvalidConfig {
                reason: "result_size must be greater than 0".to_string(),
            });
        }
        Ok(())
    }
}

/// Per-worker reports of a finished pool.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolReport {
    /// One report per worker, ordered by worker number.
    pub workers: Vec<WorkerReport>,
}

impl PoolReport {
    /// IDs finished across all workers, successfully or not.
    pub fn processed(&self) -> u64 {
        self.workers.iter().map(WorkerReport::processed).sum()
    }

    /// IDs computed and written successfully.
    pub fn succeeded(&self) -> u64 {
        self.workers.iter().map(|w| w.succeeded).sum()
    }

    /// IDs whose computation or write failed.
    pub fn failed(&self) -> u64 {
        self.workers.iter().map(|w| w.failed).sum()
    }

    /// `true` if any worker exited because it was stopped.
    pub fn stopped(&self) -> bool {
        self.workers.iter().any(|w| w.stopped)
    }
}

/// A pool of [`Worker`]s sharing one [`IdSource`], [`Computation`] and
/// [`Sink`].
///
/// Lifecycle: [`new`](Self::new) builds the workers, [`start`](Self::start)
/// spawns their threads, [`stop_all`](Self::stop_all) asks them to stop, and
/// [`join`](Self::join) waits for them. Workers are never restarted. Dropping
/// a pool without joining cancels its workers and detaches their threads.
pub struct WorkerPool<S, C, K> {
    workers: Vec<Arc<Worker<S, C, K>>>,
    handles: Vec<(usize, JoinHandle<Result<WorkerReport>>)>,
    shutdown_token: CancellationToken,
    thread_name_prefix: String,
    stats: BatchStats,
    started: bool,
}

impl<S, C, K> WorkerPool<S, C, K>
where
    S: IdSource + 'static,
    C: Computation + 'static,
    K: Sink + 'static,
{
    /// Builds `config.num_workers` workers over the shared collaborators.
    ///
    /// No threads are spawned until [`start`](Self::start).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if `num_workers` or `result_size` is
    /// zero.
    pub fn new(
        config: PoolConfig,
        source: S,
        computation: C,
        sink: K,
        stats: BatchStats,
    ) -> Result<Self> {
        config.validate()?;

        let source = Arc::new(source);
        let computation = Arc::new(computation);
        let sink = Arc::new(sink);
        let shutdown_token = CancellationToken::new();

        let workers = (0..config.num_workers)
            .map(|number| {
                Arc::new(Worker::new(
                    number,
                    Arc::clone(&source),
                    Arc::clone(&computation),
                    Arc::clone(&sink),
                    config.result_size,
                    stats.clone(),
                    &shutdown_token,
                ))
            })
            .collect();

        Ok(Self {
            workers,
            handles: Vec::with_capacity(config.num_workers),
            shutdown_token,
            thread_name_prefix: config.thread_name_prefix,
            stats,
            started: false,
        })
    }

    /// Number of workers in the pool.
    pub fn num_workers(&self) -> usize {
        self.workers.len()
    }

    /// The statistics shared by every worker.
    pub const fn stats(&self) -> &BatchStats {
        &self.stats
    }

    /// The parent token of every worker's token. Cancelling it stops the
    /// whole pool, exactly like [`stop_all`](Self::stop_all).
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    /// Spawns one thread per worker.
    ///
    /// # Errors
    ///
    /// - [`Error::AlreadyStarted`] if called twice.
    /// - [`Error::Spawn`] if a thread could not be created. Workers already
    ///   spawned are stopped; [`join`](Self::join) still collects them.
    pub fn start(&mut self) -> Result<()> {
        if self.started {
            return Err(Error::AlreadyStarted);
        }
        self.started = true;

        #[cfg(feature = "tracing")]
        tracing::info!("Starting {} workers", self.workers.len());

        for worker in &self.workers {
            let number = worker.number();
            let worker = Arc::clone(worker);
            let spawned = std::thread::Builder::new()
                .name(format!("{}-{number}", self.thread_name_prefix))
                .spawn(move || worker.run());

            match spawned {
                Ok(handle) => self.handles.push((number, handle)),
                Err(e) => {
                    #[cfg(feature = "tracing")]
                    tracing::error!("Failed to spawn worker {number}: {e}");
                    self.shutdown_token.cancel();
                    return Err(Error::Spawn(e));
                }
            }
        }

        Ok(())
    }

    /// Asks every worker to stop before its next pull. Never blocks.
    pub fn stop_all(&self) {
        #[cfg(feature = "tracing")]
        tracing::info!("Stopping {} workers", self.workers.len());
        for worker in &self.workers {
            worker.stop();
        }
    }

    /// Waits for every spawned worker thread to return.
    ///
    /// A pool that was never started yields an empty report.
    ///
    /// # Errors
    ///
    /// If any worker panicked, every other worker is still joined and then
    /// [`Error::WorkerPanicked`] is returned for the first one, carrying the
    /// reports of the workers that did return.
    pub fn join(mut self) -> Result<PoolReport> {
        let handles = core::mem::take(&mut self.handles);
        let mut report = PoolReport {
            workers: Vec::with_capacity(handles.len()),
        };
        let mut first_error = None;
        let mut first_panic = None;

        for (number, handle) in handles {
            match handle.join() {
                Ok(Ok(worker_report)) => report.workers.push(worker_report),
                Ok(Err(e)) => {
                    first_error.get_or_insert(e);
                }
                Err(_) => {
                    #[cfg(feature = "tracing")]
                    tracing::error!("Worker {number} panicked");
                    first_panic.get_or_insert(number);
                }
            }
        }

        #[cfg(feature = "tracing")]
        tracing::info!(
            "Worker pool finished: {} processed, {} failed",
            report.processed(),
            report.failed()
        );

        if let Some(worker) = first_panic {
            return Err(Error::WorkerPanicked {
                worker,
                partial: report,
            });
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(report),
        }
    }

    /// Starts the pool and waits for it to finish.
    pub fn run(mut self) -> Result<PoolReport> {
        if let Err(e) = self.start() {
            // Collect whatever did spawn before surfacing the error.
            let _ = self.join();
            return Err(e);
        }
        self.join()
    }
}

impl<S, C, K> Drop for WorkerPool<S, C, K> {
    fn drop(&mut self) {
        if !self.handles.is_empty() {
            self.shutdown_token.cancel();
        }
    }
}
