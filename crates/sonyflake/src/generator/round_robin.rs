use portable_atomic::{AtomicUsize, Ordering};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{Error, IdGenerator, Result};

/// A thread-safe wrapper around multiple [`IdGenerator`] instances,
/// distributing ID generation evenly across a pool of generators.
///
/// A single [`SonyFlake`] is capped at 256 IDs per 10 ms tick. Rotating
/// through `N` generators raises that cap towards `N` times as many, because
/// each generator's sequence quota is independent.
///
/// The IDs are only unique if every wrapped generator has a **distinct machine
/// ID**. This is not checked.
///
/// ## Features
///
/// - ✅ Thread-safe: the cursor advances with a single atomic update, so
///   concurrent callers never pick the same slot for one turn
/// - ✅ Strict round-robin in construction order
/// - ❌ A blocked generator blocks the caller that drew it; the cursor does not
///   skip it
///
/// [`SonyFlake`]: crate::SonyFlake
#[derive(Debug)]
pub struct RoundRobin<G>
where
    G: IdGenerator,
{
    generators: Vec<G>,
    next: AtomicUsize,
}

impl<G> RoundRobin<G>
where
    G: IdGenerator,
{
    /// Creates a new [`RoundRobin`] over `generators`, starting with the first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoGenerators`] if `generators` is empty.
    ///
    /// # Example
    /// ```
    /// use sonyflake::{RoundRobin, SonyFlake, random_machine_ids};
    ///
    /// let generators = random_machine_ids(4)
    ///     .unwrap()
    ///     .into_iter()
    ///     .map(|machine_id| {
    ///         SonyFlake::builder()
    ///             .machine_id(i64::from(machine_id))
    ///             .build()
    ///     })
    ///     .collect::<Result<Vec<_>, _>>()
    ///     .unwrap();
    ///
    /// let rr = RoundRobin::new(generators).unwrap();
    /// let id = rr.next_id().unwrap();
    /// ```
    pub fn new(generators: impl IntoIterator<Item = G>) -> Result<Self> {
        let generators: Vec<G> = generators.into_iter().collect();
        if generators.is_empty() {
            return Err(Error::NoGenerators);
        }
        Ok(Self {
            generators,
            next: AtomicUsize::new(0),
        })
    }

    /// Returns the next ID from the generator whose turn it is.
    ///
    /// # Errors
    ///
    /// Propagates the selected generator's error. The turn is consumed either
    /// way.
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn next_id(&self) -> Result<u64> {
        self.generators[self.advance()].next_id()
    }

    /// The wrapped generators, in rotation order.
    pub fn generators(&self) -> &[G] {
        &self.generators
    }

    /// Claims the current slot and moves the cursor to the following one.
    fn advance(&self) -> usize {
        let len = self.generators.len();
        match self
            .next
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |i| Some((i + 1) % len))
        {
            Ok(i) | Err(i) => i,
        }
    }
}

impl<G> IdGenerator for RoundRobin<G>
where
    G: IdGenerator,
{
    fn next_id(&self) -> Result<u64> {
        self.next_id()
    }
}
