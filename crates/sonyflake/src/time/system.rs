use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::{SleepProvider, TimeSource};

/// The operating system's wall clock, paired with [`std::thread::sleep`].
///
/// This is the default clock for [`SonyFlake`](crate::SonyFlake). It is a
/// zero-sized type, so every generator may hold its own copy.
#[derive(Default, Clone, Copy, Debug)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    /// Returns the time since the Unix epoch, or zero if the system clock is
    /// set before 1970.
    fn current_time(&self) -> Duration {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
    }
}

impl SleepProvider for SystemClock {
    fn sleep_for(&self, dur: Duration) {
        std::thread::sleep(dur);
    }
}
