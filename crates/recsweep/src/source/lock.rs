use crate::{IdSource, Identifier, Pull};
use core::iter::Fuse;
use core::ops::Range;
use parking_lot::Mutex;
#[cfg(feature = "tracing")]
use tracing::instrument;

/// A mutex-guarded cursor over any sequence of IDs.
///
/// The backing iterator does not need to be thread-safe: every
/// [`pull`](IdSource::pull) takes the lock, advances the iterator by one, and
/// releases the lock before returning. The iterator is fused, so once it ends
/// the source stays exhausted even if the iterator would resume.
///
/// ## Features
///
/// - ✅ Thread-safe
/// - ✅ Works with any `Iterator<Item = u64>`, lazily
/// - ❌ Every pull takes the same lock
///
/// ## Recommended When
/// - IDs come from a lazy or very large sequence you don't want to buffer
/// - Per-item work is long compared to a lock acquisition
///
/// ## See Also
/// - [`ChannelIdSource`]
///
/// [`ChannelIdSource`]: crate::ChannelIdSource
pub struct LockIdSource<I>
where
    I: Iterator<Item = Identifier>,
{
    cursor: Mutex<Fuse<I>>,
}

impl<I> LockIdSource<I>
where
    I: Iterator<Item = Identifier>,
{
    /// Creates a new [`LockIdSource`] that yields every ID produced by `ids`,
    /// in order, exactly once.
    ///
    /// # Example
    ///
    /// ```
    /// use recsweep::{IdSource, LockIdSource};
    ///
    /// let source = LockIdSource::new([3, 1, 2].into_iter());
    /// assert_eq!(source.pull().ready(), Some(3));
    /// ```
    pub fn new(ids: I) -> Self {
        Self {
            cursor: Mutex::new(ids.fuse()),
        }
    }
}

impl LockIdSource<Range<Identifier>> {
    /// Creates a source over a contiguous range of IDs.
    pub fn from_range(range: Range<Identifier>) -> Self {
        Self::new(range)
    }
}

impl From<Vec<Identifier>> for LockIdSource<std::vec::IntoIter<Identifier>> {
    fn from(ids: Vec<Identifier>) -> Self {
        Self::new(ids.into_iter())
    }
}

impl<I> IdSource for LockIdSource<I>
where
    I: Iterator<Item = Identifier> + Send,
{
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    fn pull(&self) -> Pull {
        // The guard is a temporary and is dropped at the end of this statement.
        self.cursor.lock().next().into()
    }
}
