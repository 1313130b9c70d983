use portable_atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[cfg(feature = "cache-padded")]
type Slot = crossbeam_utils::CachePadded<AtomicU64>;
#[cfg(not(feature = "cache-padded"))]
type Slot = AtomicU64;

/// Shared count of IDs that could not be processed.
///
/// Cloning is cheap and every clone refers to the same counter. The value only
/// ever grows.
///
/// With the `cache-padded` feature the counter sits on its own cache line so
/// increments from many workers don't false-share with neighbouring data.
#[derive(Debug, Clone, Default)]
pub struct FailureCounter {
    count: Arc<Slot>,
}

impl FailureCounter {
    /// Creates a counter starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one failure and returns the new total.
    pub fn increment(&self) -> u64 {
        self.count.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Current number of failures.
    pub fn get(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}
