use crate::{Identifier, Result};
use std::sync::Arc;

/// One scored entry of a [`ComputationResult`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScoredItem {
    /// The recommended item.
    pub item_id: u64,
    /// Higher is better.
    pub score: f32,
}

impl ScoredItem {
    pub const fn new(item_id: u64, score: f32) -> Self {
        Self { item_id, score }
    }
}

/// Ordered (best first) output of a [`Computation`] for one ID.
pub type ComputationResult = Vec<ScoredItem>;

/// The pluggable per-ID work, e.g. a recommender.
///
/// Called concurrently from every worker thread, so implementations must not
/// mutate shared state without their own synchronization. A computation that
/// notices the sweep is being stopped may return [`crate::Error::Cancelled`];
/// the worker then exits quietly instead of logging a failure.
pub trait Computation: Send + Sync {
    /// Produces at most `result_size` scored items for `id`.
    fn compute(&self, id: Identifier, result_size: usize) -> Result<ComputationResult>;
}

/// The pluggable persistence step for one ID's result.
///
/// Called concurrently from every worker thread for different IDs. The order
/// of writes across workers is unspecified.
pub trait Sink: Send + Sync {
    /// Persists `result` for `id`.
    fn write(&self, id: Identifier, result: &ComputationResult) -> Result<()>;
}

impl<C> Computation for Arc<C>
where
    C: Computation + ?Sized,
{
    fn compute(&self, id: Identifier, result_size: usize) -> Result<ComputationResult> {
        (**self).compute(id, result_size)
    }
}

impl<K> Sink for Arc<K>
where
    K: Sink + ?Sized,
{
    fn write(&self, id: Identifier, result: &ComputationResult) -> Result<()> {
        (**self).write(id, result)
    }
}
