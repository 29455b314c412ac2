use crate::{Error, MAX_ELAPSED_TIME, MAX_SEQUENCE, Result};

/// The mutable half of a generator: the last tick handed out and the sequence
/// used within it.
///
/// Only [`SequenceState::allocate`] mutates it, and the owning generator
/// only calls that while holding its lock.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct SequenceState {
    elapsed_time: u64,
    sequence: u8,
}

impl SequenceState {
    /// Starts at `elapsed_time` with the sequence at its maximum, so the first
    /// allocation either moves to a fresh tick or wraps to sequence zero.
    pub(crate) const fn new(elapsed_time: u64) -> Self {
        Self {
            elapsed_time,
            sequence: MAX_SEQUENCE,
        }
    }

    /// Hands out the next `(elapsed_time, sequence)` pair.
    ///
    /// `current` is the clock's elapsed time in ticks. When the 256 sequence
    /// values of the current tick are used up, the state moves one tick ahead
    /// and `wait_for` is called with that tick; it must block until the wall
    /// clock reaches it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TimeOverflow`] once the elapsed time no longer fits in
    /// the ID. The state never moves back, so every later call fails too.
    pub(crate) fn allocate(
        &mut self,
        current: u64,
        wait_for: impl FnOnce(u64),
    ) -> Result<(u64, u8)> {
        if self.elapsed_time < current {
            self.elapsed_time = current;
            self.sequence = 0;
        } else {
            self.sequence = self.sequence.wrapping_add(1);
            if self.sequence == 0 {
                self.elapsed_time = self.elapsed_time.saturating_add(1);
                if self.elapsed_time > MAX_ELAPSED_TIME {
                    return Err(Error::TimeOverflow);
                }
                wait_for(self.elapsed_time);
            }
        }

        if self.elapsed_time > MAX_ELAPSED_TIME {
            return Err(Error::TimeOverflow);
        }
        Ok((self.elapsed_time, self.sequence))
    }
}
