use core::time::Duration;

/// Length of one tick of the ID's time field.
pub const TICK: Duration = Duration::from_millis(10);

/// Default epoch: Monday, September 1, 2014 00:00:00 UTC
pub const SONYFLAKE_EPOCH: Duration = Duration::from_secs(1_409_529_600);

const TICK_MILLIS: u128 = TICK.as_millis();

/// Converts a time since the Unix epoch into whole ticks since the Unix
/// epoch.
///
/// ```
/// use sonyflake::{SONYFLAKE_EPOCH, to_sonyflake_time};
///
/// assert_eq!(to_sonyflake_time(SONYFLAKE_EPOCH), 140_952_960_000);
/// ```
pub const fn to_sonyflake_time(time: Duration) -> u64 {
    (time.as_millis() / TICK_MILLIS) as u64
}

/// Number of whole ticks between `epoch` and `now`.
///
/// Tick boundaries are aligned to the Unix epoch, so for a 10 ms aligned
/// `epoch` this is exactly `floor((now - epoch) / 10ms)`. A `now` before
/// `epoch` yields zero.
pub const fn elapsed_ticks(epoch: Duration, now: Duration) -> u64 {
    to_sonyflake_time(now).saturating_sub(to_sonyflake_time(epoch))
}

/// The wall-clock instant, since the Unix epoch, at which elapsed tick `tick`
/// begins for a generator whose start time is `start_time` ticks.
pub const fn tick_start(start_time: u64, tick: u64) -> Duration {
    let ticks = start_time.saturating_add(tick);
    Duration::from_millis(ticks.saturating_mul(TICK_MILLIS as u64))
}
