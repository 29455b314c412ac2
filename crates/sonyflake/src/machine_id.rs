use core::fmt;

use rand::{Rng, rng, seq::index};

use crate::{Error, MAX_MACHINE_ID, Result};

/// Where a generator's machine ID comes from.
///
/// The source is resolved exactly once, when the generator is built.
/// Literals are carried as `i64` so that out-of-range values can be reported
/// instead of silently truncated.
///
/// # Example
/// ```
/// use sonyflake::MachineIdSource;
///
/// assert_eq!(MachineIdSource::from(7).resolve().unwrap(), 7);
/// assert_eq!(MachineIdSource::factory(|| 0x7F7F).resolve().unwrap(), 0x7F7F);
/// assert!(MachineIdSource::from(-1).resolve().is_err());
/// ```
#[derive(Default)]
pub enum MachineIdSource {
    /// A literal machine ID.
    Fixed(i64),
    /// A function called once to produce the machine ID.
    Factory(Box<dyn FnOnce() -> i64 + Send>),
    /// A uniformly random machine ID.
    #[default]
    Random,
}

impl MachineIdSource {
    /// Wraps a closure as a [`MachineIdSource::Factory`].
    pub fn factory<F>(f: F) -> Self
    where
        F: FnOnce() -> i64 + Send + 'static,
    {
        Self::Factory(Box::new(f))
    }

    /// Produces the machine ID and checks that it fits in 16 bits.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MachineIdOutOfRange`] if the value is outside
    /// `[0, 0xFFFF]`.
    pub fn resolve(self) -> Result<u16> {
        let raw = match self {
            Self::Fixed(machine_id) => machine_id,
            Self::Factory(f) => f(),
            Self::Random => return Ok(random_machine_id()),
        };
        u16::try_from(raw).map_err(|_| Error::MachineIdOutOfRange(raw))
    }
}

impl fmt::Debug for MachineIdSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(machine_id) => f.debug_tuple("Fixed").field(machine_id).finish(),
            Self::Factory(_) => f.write_str("Factory(..)"),
            Self::Random => f.write_str("Random"),
        }
    }
}

impl From<i64> for MachineIdSource {
    fn from(machine_id: i64) -> Self {
        Self::Fixed(machine_id)
    }
}

/// Returns a uniformly random machine ID.
pub fn random_machine_id() -> u16 {
    rng().random()
}

/// Returns `n` distinct random machine IDs in ascending order.
///
/// Handy for building a [`RoundRobin`](crate::RoundRobin), which needs
/// pairwise-distinct machine IDs.
///
/// # Errors
///
/// Returns [`Error::InvalidMachineIdCount`] unless `0 < n <= 0xFFFF`.
///
/// # Example
/// ```
/// let ids = sonyflake::random_machine_ids(4).unwrap();
/// assert_eq!(ids.len(), 4);
/// assert!(ids.windows(2).all(|w| w[0] < w[1]));
/// ```
pub fn random_machine_ids(n: usize) -> Result<Vec<u16>> {
    let space = usize::from(MAX_MACHINE_ID);
    if n == 0 || n > space {
        return Err(Error::InvalidMachineIdCount(n));
    }

    let mut ids: Vec<u16> = index::sample(&mut rng(), space + 1, n)
        .into_iter()
        .map(|i| i as u16)
        .collect();
    ids.sort_unstable();
    Ok(ids)
}
