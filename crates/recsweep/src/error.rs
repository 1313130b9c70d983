//! Error types for the sweep engine.
//!
//! Two families share the [`Error`] enum:
//!
//! - **Per-item failures** (`Compute`, `Write`) are produced by
//!   [`Computation`] and [`Sink`] implementations. A [`Worker`] logs and
//!   counts them, then moves on to the next ID. They never escape the worker.
//! - **Lifecycle failures** (`InvalidConfig`, `AlreadyStarted`,
//!   `WorkerReused`, `WorkerPanicked`, `Spawn`) are returned to whoever drives
//!   the [`WorkerPool`].
//!
//! `Cancelled` sits in between: a collaborator returns it when it notices the
//! run is being stopped, and the worker exits quietly instead of logging an
//! error.
//!
//! Running out of IDs is not an error; see [`crate::Pull::Exhausted`].
//!
//! [`Computation`]: crate::Computation
//! [`Sink`]: crate::Sink
//! [`Worker`]: crate::Worker
//! [`WorkerPool`]: crate::WorkerPool

/// A boxed error as returned by external collaborators.
pub type BoxError = Box<dyn core::error::Error + Send + Sync + 'static>;

/// A result type defaulting to [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All errors `recsweep` can produce or carry.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The computation could not produce a result for an ID.
    #[error("computation failed: {0}")]
    Compute(#[source] BoxError),

    /// The sink could not persist a result for an ID.
    #[error("write failed: {0}")]
    Write(#[source] BoxError),

    /// The operation observed a stop request and gave up.
    #[error("operation cancelled")]
    Cancelled,

    /// The pool configuration is unusable.
    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    /// [`crate::WorkerPool::start`] was called more than once.
    #[error("worker pool already started")]
    AlreadyStarted,

    /// [`crate::Worker::run`] was called on a worker that already ran.
    #[error("worker {worker} has already run and cannot be restarted")]
    WorkerReused { worker: usize },

    /// A worker thread panicked before returning its report.
    ///
    /// `partial` holds the reports of the workers that returned normally.
    #[error("worker {worker} panicked")]
    WorkerPanicked {
        worker: usize,
        partial: crate::PoolReport,
    },

    /// The OS refused to spawn a worker thread.
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),
}

impl Error {
    /// Wraps any error as a [`Error::Compute`] failure.
    pub fn compute<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::Compute(err.into())
    }

    /// Wraps any error as a [`Error::Write`] failure.
    pub fn write<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::Write(err.into())
    }

    /// Returns `true` for [`Error::Cancelled`].
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
