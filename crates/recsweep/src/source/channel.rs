use crate::{IdSource, Identifier, Pull};
use crossbeam_channel::{Receiver, TryRecvError, unbounded};
#[cfg(feature = "tracing")]
use tracing::instrument;

/// A source backed by a closed, pre-loaded channel.
///
/// All IDs are pushed into an unbounded [`crossbeam_channel`] up front and the
/// sending half is dropped. Workers then race on
/// [`try_recv`](Receiver::try_recv), which the channel serializes internally;
/// once the queue drains the channel reports disconnection forever.
///
/// ## Features
///
/// - ✅ Thread-safe
/// - ✅ No user-visible lock; pulls scale well under contention
/// - ❌ Buffers every ID in memory
///
/// ## Recommended When
/// - The ID set fits comfortably in memory
/// - Per-item work is short and many workers pull at once
///
/// ## See Also
/// - [`LockIdSource`]
///
/// [`LockIdSource`]: crate::LockIdSource
pub struct ChannelIdSource {
    rx: Receiver<Identifier>,
}

impl ChannelIdSource {
    /// Creates a new [`ChannelIdSource`] holding every ID from `ids`.
    ///
    /// # Example
    ///
    /// ```
    /// use recsweep::{ChannelIdSource, IdSource, Pull};
    ///
    /// let source = ChannelIdSource::new([10, 20]);
    /// assert_eq!(source.remaining(), 2);
    /// assert_eq!(source.pull(), Pull::Ready { id: 10 });
    /// assert_eq!(source.pull(), Pull::Ready { id: 20 });
    /// assert_eq!(source.pull(), Pull::Exhausted);
    /// ```
    pub fn new<I>(ids: I) -> Self
    where
        I: IntoIterator<Item = Identifier>,
    {
        let (tx, rx) = unbounded();
        for id in ids {
            // Cannot fail: `rx` is alive for the whole loop.
            let _ = tx.send(id);
        }
        // Dropping the only sender closes the channel, so exhaustion sticks.
        drop(tx);
        Self { rx }
    }

    /// Number of IDs not yet pulled.
    pub fn remaining(&self) -> usize {
        self.rx.len()
    }
}

impl IdSource for ChannelIdSource {
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    fn pull(&self) -> Pull {
        match self.rx.try_recv() {
            Ok(id) => Pull::Ready { id },
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => Pull::Exhausted,
        }
    }
}
