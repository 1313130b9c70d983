use crate::Identifier;

/// Represents the result of pulling from an [`IdSource`].
///
/// - [`Pull::Ready`] hands out an ID that no other caller will ever see.
/// - [`Pull::Exhausted`] means the source has nothing left. This is the normal
///   end of a sweep, not an error, and it is sticky: once a source reports
///   `Exhausted` it never produces another ID.
///
/// # Example
///
/// ```
/// use recsweep::{IdSource, LockIdSource, Pull};
///
/// let source = LockIdSource::from_range(7..8);
/// assert_eq!(source.pull(), Pull::Ready { id: 7 });
/// assert_eq!(source.pull(), Pull::Exhausted);
/// assert_eq!(source.pull(), Pull::Exhausted);
/// ```
///
/// [`IdSource`]: crate::IdSource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pull {
    /// An ID was taken from the source and now belongs to the caller.
    Ready {
        /// The pulled ID.
        id: Identifier,
    },
    /// The source has no IDs left.
    Exhausted,
}

impl Pull {
    /// Returns the ID if one was pulled.
    pub const fn ready(self) -> Option<Identifier> {
        match self {
            Self::Ready { id } => Some(id),
            Self::Exhausted => None,
        }
    }

    /// Returns `true` if the source is exhausted.
    pub const fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted)
    }

    /// Returns the ID, panicking if the source is exhausted.
    ///
    /// Intended for tests.
    #[track_caller]
    pub fn unwrap_ready(self) -> Identifier {
        match self {
            Self::Ready { id } => id,
            Self::Exhausted => panic!("called `Pull::unwrap_ready()` on an exhausted source"),
        }
    }
}

impl From<Option<Identifier>> for Pull {
    fn from(value: Option<Identifier>) -> Self {
        match value {
            Some(id) => Self::Ready { id },
            None => Self::Exhausted,
        }
    }
}
