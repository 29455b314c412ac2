use core::fmt;
use core::time::Duration;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    Decomposed, Error, IdGenerator, MachineIdSource, Result, SONYFLAKE_EPOCH, SleepProvider,
    SystemClock, TimeSource,
    generator::state::SequenceState,
    mutex::{Mutex, MutexGuard},
    tick_start, to_sonyflake_time,
};

type Validator = Box<dyn FnOnce(u16) -> bool>;

/// A lock-based Sonyflake ID generator suitable for multi-threaded
/// environments.
///
/// Each instance owns one sequence counter behind a mutex and grants at most
/// 256 IDs per 10 ms tick. When the quota is spent, [`Self::next_id`] sleeps
/// until the next tick **while holding the lock**, so no other thread can
/// overdraw the same tick. IDs from one instance are strictly increasing in
/// the order they are granted.
///
/// ## Features
/// - ✅ Thread-safe (`Send + Sync` when the clock is)
/// - ✅ Backpressure instead of rejection when a tick is exhausted
/// - ❌ Machine ID uniqueness across instances is the caller's job
///
/// ## See Also
/// - [`RoundRobin`] to go beyond 25,600 IDs per second
///
/// [`RoundRobin`]: crate::RoundRobin
///
/// # Example
/// ```
/// use sonyflake::{SONYFLAKE_EPOCH, SonyFlake};
///
/// let sf = SonyFlake::builder()
///     .start_time(SONYFLAKE_EPOCH)
///     .machine_id(0x7F7F)
///     .build()
///     .unwrap();
///
/// assert_eq!(sf.start_time(), 140_952_960_000);
///
/// let parts = sf.decompose(sf.next_id().unwrap());
/// assert_eq!(parts.sequence, 0);
/// assert_eq!(parts.machine_id, 0x7F7F);
/// ```
#[derive(Debug)]
pub struct SonyFlake<C = SystemClock>
where
    C: TimeSource + SleepProvider,
{
    #[cfg(feature = "cache-padded")]
    state: crossbeam_utils::CachePadded<Mutex<SequenceState>>,
    #[cfg(not(feature = "cache-padded"))]
    state: Mutex<SequenceState>,
    start_time: u64,
    machine_id: u16,
    clock: C,
}

impl SonyFlake<SystemClock> {
    /// Creates a generator with every default: the system clock,
    /// [`SONYFLAKE_EPOCH`] and a random machine ID.
    ///
    /// # Errors
    ///
    /// Only fails if the system clock is set before [`SONYFLAKE_EPOCH`].
    pub fn new() -> Result<Self> {
        Settings::new().build()
    }

    /// Starts configuring a generator that uses the system clock.
    pub fn builder() -> Settings<SystemClock> {
        Settings::new()
    }
}

impl<C> SonyFlake<C>
where
    C: TimeSource + SleepProvider,
{
    /// Returns the next ID.
    ///
    /// Blocks for up to one tick when the current tick's 256 IDs are spent, or
    /// longer if the wall clock has fallen behind this generator's logical
    /// time.
    ///
    /// # Errors
    ///
    /// - [`Error::TimeOverflow`] once 2^39 ticks have elapsed since the start
    ///   time. The generator stays unusable afterwards.
    /// - `Error::LockPoisoned` if another thread panicked inside this method
    ///   (std mutex only).
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self), fields(machine_id = self.machine_id)))]
    pub fn next_id(&self) -> Result<u64> {
        let mut state = self.lock()?;
        let current = self.current_elapsed_time();
        let (elapsed_time, sequence) =
            state.allocate(current, |tick| self.wait_for_tick(tick))?;
        crate::encode(elapsed_time, sequence, self.machine_id)
    }

    /// Splits an ID into its fields. See [`decompose`](crate::decompose).
    pub const fn decompose(&self, id: u64) -> Decomposed {
        crate::decompose(id)
    }

    /// The start time in ticks since the Unix epoch.
    pub const fn start_time(&self) -> u64 {
        self.start_time
    }

    /// The machine ID embedded in every ID from this generator.
    pub const fn machine_id(&self) -> u16 {
        self.machine_id
    }

    /// Ticks elapsed between the start time and the clock's current time.
    pub fn current_elapsed_time(&self) -> u64 {
        to_sonyflake_time(self.clock.current_time()).saturating_sub(self.start_time)
    }

    fn lock(&self) -> Result<MutexGuard<'_, SequenceState>> {
        #[cfg(feature = "parking-lot")]
        {
            Ok(self.state.lock())
        }
        #[cfg(not(feature = "parking-lot"))]
        {
            Ok(self.state.lock()?)
        }
    }

    /// Sleeps until the wall clock reaches the start of `tick`.
    #[cold]
    #[inline(never)]
    fn wait_for_tick(&self, tick: u64) {
        let wake_at = tick_start(self.start_time, tick);
        let now = self.clock.current_time();
        if let Some(dur) = wake_at.checked_sub(now).filter(|dur| !dur.is_zero()) {
            #[cfg(feature = "tracing")]
            tracing::debug!(
                machine_id = self.machine_id,
                tick,
                sleep_us = dur.as_micros() as u64,
                "sequence exhausted, waiting for next tick"
            );
            self.clock.sleep_for(dur);
        }
    }
}

impl<C> IdGenerator for SonyFlake<C>
where
    C: TimeSource + SleepProvider,
{
    fn next_id(&self) -> Result<u64> {
        self.next_id()
    }
}

/// Construction options for [`SonyFlake`].
///
/// Options are validated by [`Settings::build`], in this order: the start time
/// must not be in the future, the machine ID must fit in 16 bits, and the
/// validator (if any) must accept it.
///
/// # Example
/// ```
/// use core::time::Duration;
/// use sonyflake::{ErrorKind, Settings, SystemClock, TimeSource};
///
/// let tomorrow = SystemClock.current_time() + Duration::from_secs(86_400);
/// let err = Settings::new().start_time(tomorrow).build().unwrap_err();
/// assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);
///
/// let sf = Settings::new()
///     .machine_id_factory(|| 0x00FF)
///     .machine_id_validator(|id| id % 2 == 1)
///     .build()
///     .unwrap();
/// assert_eq!(sf.machine_id(), 0x00FF);
/// ```
pub struct Settings<C = SystemClock> {
    start_time: Duration,
    machine_id: MachineIdSource,
    machine_id_validator: Option<Validator>,
    clock: C,
}

impl Settings<SystemClock> {
    /// Defaults: [`SONYFLAKE_EPOCH`], a random machine ID, no validator and the
    /// system clock.
    pub fn new() -> Self {
        Self {
            start_time: SONYFLAKE_EPOCH,
            machine_id: MachineIdSource::Random,
            machine_id_validator: None,
            clock: SystemClock,
        }
    }
}

impl Default for Settings<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Settings<C> {
    /// Sets the epoch, as a duration since the Unix epoch.
    #[must_use]
    pub fn start_time(mut self, start_time: Duration) -> Self {
        self.start_time = start_time;
        self
    }

    /// Uses a literal machine ID.
    #[must_use]
    pub fn machine_id(self, machine_id: i64) -> Self {
        self.machine_id_source(MachineIdSource::Fixed(machine_id))
    }

    /// Calls `f` once during [`Self::build`] to obtain the machine ID.
    #[must_use]
    pub fn machine_id_factory<F>(self, f: F) -> Self
    where
        F: FnOnce() -> i64 + Send + 'static,
    {
        self.machine_id_source(MachineIdSource::factory(f))
    }

    /// Sets how the machine ID is obtained.
    #[must_use]
    pub fn machine_id_source(mut self, source: MachineIdSource) -> Self {
        self.machine_id = source;
        self
    }

    /// Rejects the build if `f` returns `false` for the resolved machine ID.
    #[must_use]
    pub fn machine_id_validator<F>(mut self, f: F) -> Self
    where
        F: FnOnce(u16) -> bool + 'static,
    {
        self.machine_id_validator = Some(Box::new(f));
        self
    }

    /// Replaces the clock, e.g. with a mock for deterministic tests.
    pub fn clock<T>(self, clock: T) -> Settings<T> {
        Settings {
            start_time: self.start_time,
            machine_id: self.machine_id,
            machine_id_validator: self.machine_id_validator,
            clock,
        }
    }

    /// Validates the options and creates the generator.
    ///
    /// # Errors
    ///
    /// - [`Error::StartTimeInFuture`] if the start time is after the clock's
    ///   current time.
    /// - [`Error::MachineIdOutOfRange`] if the machine ID is outside
    ///   `[0, 0xFFFF]`.
    /// - [`Error::MachineIdRejected`] if the validator returned `false`.
    pub fn build(self) -> Result<SonyFlake<C>>
    where
        C: TimeSource + SleepProvider,
    {
        let now = self.clock.current_time();
        if now < self.start_time {
            return Err(Error::StartTimeInFuture);
        }

        let machine_id = self.machine_id.resolve()?;
        if let Some(validate) = self.machine_id_validator {
            if !validate(machine_id) {
                return Err(Error::MachineIdRejected(machine_id));
            }
        }

        let start_time = to_sonyflake_time(self.start_time);
        let elapsed_time = to_sonyflake_time(now).saturating_sub(start_time);
        let state = Mutex::new(SequenceState::new(elapsed_time));

        #[cfg(feature = "tracing")]
        tracing::debug!(machine_id, start_time, elapsed_time, "sonyflake generator created");

        Ok(SonyFlake {
            #[cfg(feature = "cache-padded")]
            state: crossbeam_utils::CachePadded::new(state),
            #[cfg(not(feature = "cache-padded"))]
            state,
            start_time,
            machine_id,
            clock: self.clock,
        })
    }
}

impl<C: fmt::Debug> fmt::Debug for Settings<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("start_time", &self.start_time)
            .field("machine_id", &self.machine_id)
            .field(
                "machine_id_validator",
                &self.machine_id_validator.as_ref().map(|_| ".."),
            )
            .field("clock", &self.clock)
            .finish()
    }
}
