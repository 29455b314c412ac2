use crate::{
    Error, ErrorKind, IdGenerator, MAX_ELAPSED_TIME, MAX_SEQUENCE, MachineIdSource, RoundRobin,
    SONYFLAKE_EPOCH, Settings, SleepProvider, SonyFlake, SystemClock, TICK, TimeSource, decompose,
    tick_start, to_sonyflake_time,
};
use core::time::Duration;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::thread::scope;

/// A hand-driven clock. Sleeping advances it by exactly the requested amount.
#[derive(Clone, Debug)]
struct MockClock {
    now: Arc<Mutex<Duration>>,
    sleeps: Arc<Mutex<Vec<Duration>>>,
}

impl MockClock {
    fn at(now: Duration) -> Self {
        Self {
            now: Arc::new(Mutex::new(now)),
            sleeps: Arc::default(),
        }
    }

    fn set(&self, now: Duration) {
        *self.now.lock().unwrap() = now;
    }

    fn advance(&self, by: Duration) {
        *self.now.lock().unwrap() += by;
    }

    fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

impl TimeSource for MockClock {
    fn current_time(&self) -> Duration {
        *self.now.lock().unwrap()
    }
}

impl SleepProvider for MockClock {
    fn sleep_for(&self, dur: Duration) {
        self.sleeps.lock().unwrap().push(dur);
        self.advance(dur);
    }
}

const START_TICKS: u64 = 140_952_960_000;

/// Wall-clock time at the beginning of elapsed tick `tick` after
/// [`SONYFLAKE_EPOCH`].
fn at_tick(tick: u64) -> Duration {
    tick_start(START_TICKS, tick)
}

fn mock_generator(clock: &MockClock, machine_id: i64) -> SonyFlake<MockClock> {
    Settings::new()
        .machine_id(machine_id)
        .clock(clock.clone())
        .build()
        .unwrap()
}

#[test]
fn worked_example_at_the_default_epoch() {
    let sf = SonyFlake::builder()
        .start_time(SONYFLAKE_EPOCH)
        .machine_id(0x7F7F)
        .build()
        .unwrap();
    assert_eq!(sf.start_time(), START_TICKS);
    assert_eq!(sf.machine_id(), 32639);

    let parts = sf.decompose(sf.next_id().unwrap());
    assert_eq!(parts.msb, 0);
    assert_eq!(parts.sequence, 0);
    assert_eq!(parts.machine_id, 32639);
}

#[test]
fn time_field_counts_ticks_since_start() {
    let clock = MockClock::at(at_tick(100) + Duration::from_millis(5));
    let sf = mock_generator(&clock, 1);

    // Wait until the generator's first tick has passed.
    clock.advance(Duration::from_millis(20));
    let parts = decompose(sf.next_id().unwrap());
    assert_eq!(parts.time, 102);
    assert_eq!(parts.sequence, 0);
    assert!(clock.sleeps().is_empty());
}

#[test]
fn first_id_in_the_construction_tick_waits_for_the_boundary() {
    let clock = MockClock::at(at_tick(100) + Duration::from_millis(4));
    let sf = mock_generator(&clock, 1);

    let parts = decompose(sf.next_id().unwrap());
    assert_eq!(parts.time, 101);
    assert_eq!(parts.sequence, 0);
    assert_eq!(clock.sleeps(), [Duration::from_millis(6)]);
    assert_eq!(clock.current_time(), at_tick(101));
}

#[test]
fn quota_is_256_ids_per_tick() {
    let clock = MockClock::at(at_tick(7));
    let sf = mock_generator(&clock, 3);
    clock.set(at_tick(8));

    for sequence in 0..=MAX_SEQUENCE {
        let parts = decompose(sf.next_id().unwrap());
        assert_eq!((parts.time, parts.sequence), (8, sequence));
    }
    assert!(clock.sleeps().is_empty());

    // The 257th request in tick 8 blocks until tick 9 starts.
    let parts = decompose(sf.next_id().unwrap());
    assert_eq!((parts.time, parts.sequence), (9, 0));
    assert_eq!(clock.sleeps(), [TICK]);
    assert_eq!(clock.current_time(), at_tick(9));
}

#[test]
fn overflow_wait_aligns_to_the_tick_boundary() {
    let clock = MockClock::at(at_tick(7));
    let sf = mock_generator(&clock, 3);
    clock.set(at_tick(8) + Duration::from_micros(7_250));

    for _ in 0..=MAX_SEQUENCE {
        sf.next_id().unwrap();
    }
    sf.next_id().unwrap();
    assert_eq!(clock.sleeps(), [Duration::from_micros(2_750)]);
}

#[test]
fn new_tick_resets_the_sequence() {
    let clock = MockClock::at(at_tick(1));
    let sf = mock_generator(&clock, 9);
    clock.set(at_tick(2));

    for _ in 0..10 {
        sf.next_id().unwrap();
    }
    clock.advance(TICK * 3);
    let parts = decompose(sf.next_id().unwrap());
    assert_eq!((parts.time, parts.sequence), (5, 0));
}

#[test]
fn clock_stepping_back_never_reuses_a_tick() {
    let clock = MockClock::at(at_tick(50));
    let sf = mock_generator(&clock, 2);
    clock.set(at_tick(60));

    let mut last = sf.next_id().unwrap();
    clock.set(at_tick(20));

    for _ in 0..MAX_SEQUENCE {
        let id = sf.next_id().unwrap();
        assert!(id > last);
        assert_eq!(decompose(id).time, 60);
        last = id;
    }

    // Quota spent while real time is far behind: sleep all the way to tick 61.
    let id = sf.next_id().unwrap();
    assert!(id > last);
    assert_eq!(decompose(id).time, 61);
    assert_eq!(clock.sleeps(), [at_tick(61) - at_tick(20)]);
}

#[test]
fn ids_are_strictly_increasing() {
    const TOTAL_IDS: usize = 256 * 64;

    let sf = SonyFlake::builder().machine_id(0x7F7F).build().unwrap();
    let mut last = 0;
    let mut max_sequence = 0;
    for _ in 0..TOTAL_IDS {
        let id = sf.next_id().unwrap();
        assert!(id > last, "duplicated or decreasing id: {id} after {last}");
        let parts = decompose(id);
        assert_eq!(parts.msb, 0);
        assert_eq!(parts.machine_id, 0x7F7F);
        max_sequence = max_sequence.max(parts.sequence);
        last = id;
    }
    assert_eq!(max_sequence, MAX_SEQUENCE);
}

#[test]
fn ids_never_run_ahead_of_the_wall_clock() {
    let sf = SonyFlake::new().unwrap();
    for _ in 0..256 * 8 {
        let parts = decompose(sf.next_id().unwrap());
        let now = to_sonyflake_time(SystemClock.current_time()) - sf.start_time();
        assert!(parts.time <= now, "tick {} issued at {now}", parts.time);
    }
}

#[test]
fn concurrent_callers_get_distinct_ids() {
    const THREADS: usize = 10;
    const IDS_PER_THREAD: usize = 1_000;

    let sf = SonyFlake::new().unwrap();
    let seen = Mutex::new(HashSet::with_capacity(THREADS * IDS_PER_THREAD));

    scope(|s| {
        for _ in 0..THREADS {
            s.spawn(|| {
                let mut last = 0;
                for _ in 0..IDS_PER_THREAD {
                    let id = sf.next_id().unwrap();
                    // Grants observed by one thread are ordered too.
                    assert!(id > last);
                    last = id;
                    assert!(seen.lock().unwrap().insert(id), "duplicate id {id}");
                }
            });
        }
    });

    assert_eq!(seen.lock().unwrap().len(), THREADS * IDS_PER_THREAD);
}

#[test]
fn generator_is_shareable_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<SonyFlake>();
    assert_send_sync::<RoundRobin<SonyFlake>>();
    assert_send_sync::<RoundRobin<Arc<SonyFlake>>>();
}

#[test]
fn future_start_time_is_rejected() {
    let future = SystemClock.current_time() + Duration::from_secs(60);
    let err = SonyFlake::builder().start_time(future).build().unwrap_err();
    assert_eq!(err, Error::StartTimeInFuture);
    assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);
}

#[test]
fn start_time_equal_to_now_is_accepted() {
    let clock = MockClock::at(at_tick(10));
    let sf = Settings::new()
        .start_time(at_tick(10))
        .clock(clock)
        .build()
        .unwrap();
    assert_eq!(sf.current_elapsed_time(), 0);
}

#[test]
fn out_of_range_machine_ids_are_rejected() {
    for machine_id in [-1, 0xFFFF + 1] {
        let err = SonyFlake::builder()
            .machine_id(machine_id)
            .build()
            .unwrap_err();
        assert_eq!(err, Error::MachineIdOutOfRange(machine_id));
        assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);
    }
}

#[test]
fn start_time_is_checked_before_machine_id() {
    let future = SystemClock.current_time() + Duration::from_secs(60);
    let err = SonyFlake::builder()
        .start_time(future)
        .machine_id(-1)
        .build()
        .unwrap_err();
    assert_eq!(err, Error::StartTimeInFuture);
}

#[test]
fn validator_can_reject_the_machine_id() {
    let err = SonyFlake::builder()
        .machine_id(0x0100)
        .machine_id_validator(|machine_id| machine_id < 0x0100)
        .build()
        .unwrap_err();
    assert_eq!(err, Error::MachineIdRejected(0x0100));
    assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);

    let sf = SonyFlake::builder()
        .machine_id(0x00FF)
        .machine_id_validator(|machine_id| machine_id < 0x0100)
        .build()
        .unwrap();
    assert_eq!(sf.machine_id(), 0x00FF);
}

#[test]
fn validator_sees_the_resolved_random_id() {
    let seen = Arc::new(Mutex::new(None));
    let sf = {
        let seen = Arc::clone(&seen);
        SonyFlake::builder()
            .machine_id_validator(move |machine_id| {
                *seen.lock().unwrap() = Some(machine_id);
                true
            })
            .build()
            .unwrap()
    };
    assert_eq!(*seen.lock().unwrap(), Some(sf.machine_id()));
}

#[test]
fn machine_id_factory_is_used() {
    let sf = SonyFlake::builder()
        .machine_id_factory(|| 0xBEEF)
        .build()
        .unwrap();
    assert_eq!(sf.machine_id(), 0xBEEF);
    assert_eq!(decompose(sf.next_id().unwrap()).machine_id, 0xBEEF);

    let err = SonyFlake::builder()
        .machine_id_source(MachineIdSource::factory(|| -5))
        .build()
        .unwrap_err();
    assert_eq!(err, Error::MachineIdOutOfRange(-5));
}

#[test]
fn every_id_carries_the_machine_id() {
    for machine_id in [0, 1, 0x7F7F, 0xFFFF] {
        let sf = SonyFlake::builder().machine_id(machine_id).build().unwrap();
        for id in sf.ids().take(300) {
            assert_eq!(i64::from(decompose(id.unwrap()).machine_id), machine_id);
        }
    }
}

#[test]
fn time_overflow_is_fatal() {
    let clock = MockClock::at(at_tick(MAX_ELAPSED_TIME));
    let sf = mock_generator(&clock, 1);

    let err = sf.next_id().unwrap_err();
    assert_eq!(err, Error::TimeOverflow);
    assert_eq!(err.kind(), ErrorKind::Overflow);
    assert!(clock.sleeps().is_empty());

    clock.advance(TICK * 100);
    assert_eq!(sf.next_id(), Err(Error::TimeOverflow));
}

#[test]
fn last_tick_still_issues_ids() {
    let clock = MockClock::at(at_tick(MAX_ELAPSED_TIME - 1));
    let sf = mock_generator(&clock, 1);
    clock.set(at_tick(MAX_ELAPSED_TIME));

    let parts = decompose(sf.next_id().unwrap());
    assert_eq!(parts.time, MAX_ELAPSED_TIME);
    assert_eq!(parts.msb, 0);
}

#[test]
fn round_robin_cycles_machine_ids() {
    let rr = RoundRobin::new(
        [0x0000, 0x7F7F, 0xFFFF].map(|machine_id| {
            SonyFlake::builder().machine_id(machine_id).build().unwrap()
        }),
    )
    .unwrap();

    let machine_ids: Vec<u16> = (0..6)
        .map(|_| decompose(rr.next_id().unwrap()).machine_id)
        .collect();
    assert_eq!(machine_ids, [0x0000_u16, 0x7F7F, 0xFFFF].repeat(2));
}

#[test]
fn round_robin_outpaces_a_single_generator() {
    // Four generators share one frozen tick: 1024 IDs without any sleep.
    let clock = MockClock::at(at_tick(3));
    let rr = RoundRobin::new((0..4).map(|machine_id| mock_generator(&clock, machine_id))).unwrap();
    clock.set(at_tick(4));

    let mut seen = HashSet::new();
    for _ in 0..4 * 256 {
        let parts = decompose(rr.next_id().unwrap());
        assert_eq!(parts.time, 4);
        assert!(seen.insert(parts.id));
    }
    assert!(clock.sleeps().is_empty());
}

#[test]
fn shared_round_robin_stays_fair_under_contention() {
    const THREADS: usize = 8;
    const IDS_PER_THREAD: usize = 500;
    const GENERATORS: usize = 4;

    let generators = crate::random_machine_ids(GENERATORS)
        .unwrap()
        .into_iter()
        .map(|machine_id| {
            SonyFlake::builder()
                .machine_id(i64::from(machine_id))
                .build()
                .map(Arc::new)
        })
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    let rr = RoundRobin::new(generators).unwrap();
    let ids = Mutex::new(Vec::with_capacity(THREADS * IDS_PER_THREAD));

    scope(|s| {
        for _ in 0..THREADS {
            s.spawn(|| {
                let local: Vec<u64> = rr.ids().take(IDS_PER_THREAD).map(Result::unwrap).collect();
                ids.lock().unwrap().extend(local);
            });
        }
    });

    let ids = ids.into_inner().unwrap();
    assert_eq!(ids.iter().collect::<HashSet<_>>().len(), ids.len());

    let mut histogram: HashMap<u16, usize> = HashMap::new();
    for id in &ids {
        *histogram.entry(decompose(*id).machine_id).or_default() += 1;
    }
    assert_eq!(histogram.len(), GENERATORS);
    for generator in rr.generators() {
        assert_eq!(
            histogram[&generator.machine_id()],
            THREADS * IDS_PER_THREAD / GENERATORS
        );
    }
}
