use crate::Pull;
use std::sync::Arc;

/// Opaque 64-bit key naming one unit of work (for example, a user).
pub type Identifier = u64;

/// A thread-safe, single-pass, finite supply of [`Identifier`]s.
///
/// Implementations must hand every ID to exactly one caller, even when many
/// workers pull concurrently, and must keep reporting [`Pull::Exhausted`] once
/// they run dry. Any synchronization must cover only the act of taking the
/// next ID: never hold a lock across work done with it.
pub trait IdSource: Send + Sync {
    /// Takes the next ID, or reports that none are left.
    fn pull(&self) -> Pull;
}

impl<S> IdSource for Arc<S>
where
    S: IdSource + ?Sized,
{
    fn pull(&self) -> Pull {
        (**self).pull()
    }
}
