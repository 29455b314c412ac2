use std::sync::Arc;

use crate::Result;

/// A minimal interface for producing IDs.
///
/// Implemented by [`SonyFlake`](crate::SonyFlake) and
/// [`RoundRobin`](crate::RoundRobin), and forwarded through references, `Box`
/// and `Arc` so generators can be shared or nested.
pub trait IdGenerator {
    /// Returns the next ID, blocking if the generator must wait for the next
    /// tick.
    ///
    /// # Errors
    ///
    /// Returns an error once the generator's time field is exhausted, or if
    /// its lock was poisoned.
    fn next_id(&self) -> Result<u64>;

    /// An endless iterator over [`Self::next_id`].
    ///
    /// # Example
    /// ```
    /// use sonyflake::{IdGenerator, SonyFlake};
    ///
    /// let sf = SonyFlake::new().unwrap();
    /// let ids: Vec<u64> = sf.ids().take(3).collect::<Result<_, _>>().unwrap();
    /// assert!(ids[0] < ids[1] && ids[1] < ids[2]);
    /// ```
    fn ids(&self) -> impl Iterator<Item = Result<u64>> + '_
    where
        Self: Sized,
    {
        core::iter::repeat_with(move || self.next_id())
    }
}

impl<G: IdGenerator + ?Sized> IdGenerator for &G {
    fn next_id(&self) -> Result<u64> {
        (**self).next_id()
    }
}

impl<G: IdGenerator + ?Sized> IdGenerator for Box<G> {
    fn next_id(&self) -> Result<u64> {
        (**self).next_id()
    }
}

impl<G: IdGenerator + ?Sized> IdGenerator for Arc<G> {
    fn next_id(&self) -> Result<u64> {
        (**self).next_id()
    }
}
