use core::fmt;

/// A result type defaulting to this crate's [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All errors that `sonyflake` can produce.
///
/// Construction problems are reported eagerly by
/// [`Settings::build`](crate::Settings::build) and [`RoundRobin::new`]; the
/// only runtime failure of an id generator is [`Error::TimeOverflow`]. Use
/// [`Error::kind`] to branch on the broad category instead of matching every
/// variant.
///
/// [`RoundRobin::new`]: crate::RoundRobin::new
#[derive(Clone, Debug, PartialEq, Eq, Hash, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The configured start time lies after the clock's current time.
    #[error("start_time cannot be in future")]
    StartTimeInFuture,

    /// The resolved machine ID does not fit in 16 bits.
    #[error("machine_id must be in range [0x0000, 0xFFFF], got {0}")]
    MachineIdOutOfRange(i64),

    /// The machine ID validator returned `false`.
    #[error("machine_id {0:#06x} rejected by validator")]
    MachineIdRejected(u16),

    /// A [`RoundRobin`](crate::RoundRobin) needs at least one generator.
    #[error("round robin requires at least one generator")]
    NoGenerators,

    /// [`random_machine_ids`](crate::random_machine_ids) was asked for an
    /// unsatisfiable number of IDs.
    #[error("n must be in range (0, 65535], got {0}")]
    InvalidMachineIdCount(usize),

    /// The 39-bit time field is exhausted. The generator cannot recover.
    #[error("over the time limit")]
    TimeOverflow,

    /// The operation failed because the lock was **poisoned**.
    ///
    /// This occurs when a thread panics while holding the lock. When the
    /// `parking-lot` feature is enabled, mutexes do **not** poison, so this
    /// variant is not available.
    #[cfg_attr(docsrs, doc(cfg(not(feature = "parking-lot"))))]
    #[cfg(not(feature = "parking-lot"))]
    #[error("lock poisoned")]
    LockPoisoned,
}

/// The broad category an [`Error`] belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Rejected at construction. Rebuild with corrected inputs.
    InvalidConfiguration,
    /// The id space is exhausted. Retrying is pointless.
    Overflow,
    /// A thread panicked while holding a generator's lock.
    LockPoisoned,
}

impl Error {
    /// Returns the category of this error.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::StartTimeInFuture
            | Self::MachineIdOutOfRange(_)
            | Self::MachineIdRejected(_)
            | Self::NoGenerators
            | Self::InvalidMachineIdCount(_) => ErrorKind::InvalidConfiguration,
            Self::TimeOverflow => ErrorKind::Overflow,
            #[cfg(not(feature = "parking-lot"))]
            Self::LockPoisoned => ErrorKind::LockPoisoned,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfiguration => f.write_str("invalid configuration"),
            Self::Overflow => f.write_str("overflow"),
            Self::LockPoisoned => f.write_str("lock poisoned"),
        }
    }
}

#[cfg(not(feature = "parking-lot"))]
use crate::mutex::{MutexGuard, PoisonError};
#[cfg(not(feature = "parking-lot"))]
impl<T> From<PoisonError<MutexGuard<'_, T>>> for Error {
    fn from(_: PoisonError<MutexGuard<'_, T>>) -> Self {
        Self::LockPoisoned
    }
}
