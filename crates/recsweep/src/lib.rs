//! # recsweep
//!
//! A small engine for sweeping a finite set of IDs in parallel. A
//! [`WorkerPool`] spawns one OS thread per [`Worker`]; every worker pulls the
//! next ID from a shared [`IdSource`], runs a [`Computation`] for it, hands the
//! result to a [`Sink`], and records timing and failures in the run's
//! [`BatchStats`].
//!
//! ## Guarantees
//!
//! - Every ID is delivered to exactly one worker, exactly once.
//! - A failure for one ID is logged and counted; the worker moves on.
//! - Stopping is cooperative: a worker checks its [`CancellationToken`] before
//!   every pull and finishes the item it is working on.
//! - Statistics updates are never lost or double counted.
//!
//! ## Example
//!
//! ```
//! use recsweep::{
//!     BatchStats, ComputationResult, Identifier, LockIdSource, PoolConfig, Result, ScoredItem,
//!     WorkerPool,
//! };
//!
//! struct Echo;
//! impl recsweep::Computation for Echo {
//!     fn compute(&self, id: Identifier, result_size: usize) -> Result<ComputationResult> {
//!         Ok((0..result_size as u64).map(|i| ScoredItem::new(id + i, 1.0)).collect())
//!     }
//! }
//!
//! struct Discard;
//! impl recsweep::Sink for Discard {
//!     fn write(&self, _id: Identifier, _result: &ComputationResult) -> Result<()> {
//!         Ok(())
//!     }
//! }
//!
//! let stats = BatchStats::new();
//! let pool = WorkerPool::new(
//!     PoolConfig::new(4, 3),
//!     LockIdSource::from_range(0..100),
//!     Echo,
//!     Discard,
//!     stats.clone(),
//! )
//! .unwrap();
//!
//! let report = pool.run().unwrap();
//! assert_eq!(report.processed(), 100);
//! assert_eq!(stats.timing().count(), 100);
//! ```
//!
//! [`CancellationToken`]: tokio_util::sync::CancellationToken

mod error;
mod source;
mod stats;
mod status;
mod worker;

pub use crate::error::*;
pub use crate::source::*;
pub use crate::stats::*;
pub use crate::status::*;
pub use crate::worker::*;
pub use tokio_util::sync::CancellationToken;
