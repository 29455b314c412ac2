use core::time::Duration;

/// A trait for time sources that return wall-clock time.
///
/// This abstraction allows you to plug in the real system clock or a mocked
/// time source in tests.
///
/// # Example
///
/// ```
/// use core::time::Duration;
/// use sonyflake::TimeSource;
///
/// struct FixedTime;
/// impl TimeSource for FixedTime {
///     fn current_time(&self) -> Duration {
///         Duration::from_secs(1_409_529_600)
///     }
/// }
///
/// assert_eq!(FixedTime.current_time().as_secs(), 1_409_529_600);
/// ```
pub trait TimeSource {
    /// Returns the current time as a duration since the Unix epoch.
    fn current_time(&self) -> Duration;
}

/// A trait that abstracts over how a generator blocks while it waits for the
/// next tick.
///
/// Generators only call this while their per-tick quota is exhausted. Mock
/// clocks typically implement it by advancing their own time.
pub trait SleepProvider {
    /// Blocks the calling thread for `dur`.
    fn sleep_for(&self, dur: Duration);
}
