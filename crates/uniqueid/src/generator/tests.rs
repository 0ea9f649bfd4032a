use crate::{
    Error, IdGenStatus, MonotonicClock, SystemClock, Tag, TimeSource, UniqueId, UniqueIdGenerator,
};
use core::time::Duration;
use portable_atomic::{AtomicU64, Ordering};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::thread::scope;

struct MockTime {
    millis: u64,
}

impl TimeSource for MockTime {
    fn current_millis(&self) -> u64 {
        self.millis
    }
}

/// A clock the test can hold, step or rewind while a generator reads it.
#[derive(Clone)]
struct SharedMockTime {
    millis: Arc<AtomicU64>,
}

impl SharedMockTime {
    fn at(millis: u64) -> Self {
        Self {
            millis: Arc::new(AtomicU64::new(millis)),
        }
    }

    fn set(&self, millis: u64) {
        self.millis.store(millis, Ordering::Relaxed);
    }
}

impl TimeSource for SharedMockTime {
    fn current_millis(&self) -> u64 {
        self.millis.load(Ordering::Relaxed)
    }
}

trait IdGenStatusExt {
    fn unwrap_ready(self) -> UniqueId;
    fn unwrap_pending(self) -> u64;
}

impl IdGenStatusExt for IdGenStatus {
    fn unwrap_ready(self) -> UniqueId {
        match self {
            Self::Ready { id } => id,
            Self::Pending { yield_for } => {
                panic!("unexpected pending (yield for: {yield_for})")
            }
        }
    }

    fn unwrap_pending(self) -> u64 {
        match self {
            Self::Ready { id } => panic!("unexpected ready ({id})"),
            Self::Pending { yield_for } => yield_for,
        }
    }
}

#[test]
fn rejects_out_of_range_tags() {
    assert_eq!(
        UniqueIdGenerator::new(32, 0, MockTime { millis: 1 }).err(),
        Some(Error::OutOfRange {
            tag: Tag::Server,
            value: 32
        })
    );
    assert_eq!(
        UniqueIdGenerator::new(0, 32, MockTime { millis: 1 }).err(),
        Some(Error::OutOfRange {
            tag: Tag::Machine,
            value: 32
        })
    );

    // -1 reinterpreted as an unsigned tag.
    let negative = -1_i32 as u32;
    assert_eq!(
        UniqueIdGenerator::new(negative, 0, MockTime { millis: 1 }).err(),
        Some(Error::OutOfRange {
            tag: Tag::Server,
            value: u32::MAX
        })
    );

    // Server is reported first when both are invalid.
    assert!(matches!(
        UniqueIdGenerator::new(40, 40, MockTime { millis: 1 }),
        Err(Error::OutOfRange {
            tag: Tag::Server,
            ..
        })
    ));
}

#[test]
fn out_of_range_message_names_the_tag() {
    let err = UniqueIdGenerator::new(1, 99, SystemClock).err().unwrap();
    assert_eq!(err.to_string(), "machine must be between 0 and 31, got 99");
}

#[test]
fn accepts_max_tags() {
    let generator = UniqueIdGenerator::new(31, 31, MockTime { millis: 42 }).unwrap();
    assert_eq!(generator.server(), 31);
    assert_eq!(generator.machine(), 31);

    let id = generator.next_id();
    assert_eq!(id.server(), 31);
    assert_eq!(id.machine(), 31);
}

#[test]
fn seeds_with_current_tick_and_zero_sequence() {
    let generator = UniqueIdGenerator::new(2, 3, MockTime { millis: 42 }).unwrap();
    assert_eq!(generator.last_id(), UniqueId::from_components(42, 2, 3, 0));
}

#[test]
fn sequence_increments_within_same_tick() {
    let generator = UniqueIdGenerator::new(1, 1, MockTime { millis: 42 }).unwrap();

    let id1 = generator.poll_id().unwrap_ready();
    let id2 = generator.poll_id().unwrap_ready();
    let id3 = generator.poll_id().unwrap_ready();

    assert_eq!(id1.timestamp(), 42);
    assert_eq!(id2.timestamp(), 42);
    assert_eq!(id3.timestamp(), 42);
    // The seed holds sequence 0, so the first issued ID in its tick is 1.
    assert_eq!(id1.sequence(), 1);
    assert_eq!(id2.sequence(), 2);
    assert_eq!(id3.sequence(), 3);
    assert!(id1 < id2 && id2 < id3);
    assert_eq!(generator.last_id(), id3);
}

#[test]
fn new_tick_resets_sequence() {
    let time = SharedMockTime::at(42);
    let generator = UniqueIdGenerator::new(1, 1, time.clone()).unwrap();
    generator.poll_id().unwrap_ready();
    generator.poll_id().unwrap_ready();

    time.set(43);
    let id = generator.poll_id().unwrap_ready();
    assert_eq!(id.timestamp(), 43);
    assert_eq!(id.sequence(), 0);
}

#[test]
fn pending_when_sequence_exhausted() {
    let time = MockTime { millis: 0 };
    let generator =
        UniqueIdGenerator::from_components(0, 0, 0, UniqueId::MAX_SEQUENCE, time).unwrap();
    assert_eq!(generator.poll_id().unwrap_pending(), 1);
    // Nothing was committed.
    assert_eq!(generator.last_id().sequence(), UniqueId::MAX_SEQUENCE);
}

#[test]
fn exhaustion_uses_every_sequence_before_advancing() {
    const TOTAL_IDS: usize = 5000;

    // Start one tick earlier so the held tick opens at sequence 0.
    let time = SharedMockTime::at(41);
    let generator = UniqueIdGenerator::new(1, 1, time.clone()).unwrap();
    time.set(42);

    let mut ids = Vec::with_capacity(TOTAL_IDS);
    while ids.len() < TOTAL_IDS {
        match generator.poll_id() {
            IdGenStatus::Ready { id } => ids.push(id),
            IdGenStatus::Pending { yield_for: 0 } => unreachable!("no contention"),
            IdGenStatus::Pending { yield_for } => {
                assert_eq!(yield_for, 1);
                // Only allowed once the held tick is full.
                assert_eq!(ids.len(), 4096);
                time.set(43);
            }
        }
    }

    for (i, id) in ids.iter().take(4096).enumerate() {
        assert_eq!(id.timestamp(), 42);
        assert_eq!(id.sequence(), i as u64);
    }
    for (i, id) in ids.iter().skip(4096).enumerate() {
        assert_eq!(id.timestamp(), 43);
        assert_eq!(id.sequence(), i as u64);
    }
    assert!(ids.iter().all(|id| id.sequence() <= UniqueId::MAX_SEQUENCE));
    assert!(ids.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn next_id_waits_out_exhaustion() {
    const TOTAL_IDS: usize = 5000;

    let time = SharedMockTime::at(41);
    let generator = UniqueIdGenerator::new(1, 1, time.clone()).unwrap();
    time.set(42);

    let ids = scope(|s| {
        // Advance the clock only once the held tick is full.
        s.spawn(|| {
            while generator.last_id().sequence() < UniqueId::MAX_SEQUENCE {
                std::thread::sleep(Duration::from_millis(1));
            }
            std::thread::sleep(Duration::from_millis(5));
            time.set(43);
        });

        (0..TOTAL_IDS).map(|_| generator.next_id()).collect::<Vec<_>>()
    });

    let held = ids.iter().filter(|id| id.timestamp() == 42).count();
    assert_eq!(held, 4096);
    assert!(ids.iter().skip(4096).all(|id| id.timestamp() == 43));
    assert!(ids.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn clock_regression_keeps_last_tick() {
    let time = SharedMockTime::at(100);
    let generator = UniqueIdGenerator::new(1, 1, time.clone()).unwrap();
    let before = generator.poll_id().unwrap_ready();

    time.set(50);
    let during: Vec<_> = (0..10).map(|_| generator.poll_id().unwrap_ready()).collect();
    for (i, id) in during.iter().enumerate() {
        assert_eq!(id.timestamp(), 100);
        assert_eq!(id.sequence(), before.sequence() + 1 + i as u64);
    }

    // Still behind the committed tick: sequence keeps climbing.
    time.set(100);
    let tied = generator.poll_id().unwrap_ready();
    assert_eq!(tied.timestamp(), 100);
    assert!(tied > during[9]);

    time.set(101);
    let after = generator.poll_id().unwrap_ready();
    assert_eq!(after.timestamp(), 101);
    assert_eq!(after.sequence(), 0);
}

#[test]
fn clock_regression_with_full_tick_is_pending() {
    let time = SharedMockTime::at(10);
    let full = UniqueId::MAX_SEQUENCE;
    let generator = UniqueIdGenerator::from_components(100, 1, 1, full, time.clone()).unwrap();
    assert_eq!(generator.poll_id().unwrap_pending(), 1);

    time.set(101);
    assert_eq!(generator.poll_id().unwrap_ready().timestamp(), 101);
}

#[test]
fn clock_is_truncated_to_timestamp_width() {
    let over = (UniqueId::MAX_TIMESTAMP + 1) + 7;
    let generator = UniqueIdGenerator::new(1, 1, MockTime { millis: over }).unwrap();
    let a = generator.poll_id().unwrap_ready();
    let b = generator.poll_id().unwrap_ready();
    assert_eq!(a.timestamp(), 7);
    assert_eq!(b.timestamp(), 7);
    assert!(b > a);
}

#[test]
fn monotonic_single_threaded() {
    const TOTAL_IDS: usize = 4096 * 64;

    let generator = UniqueIdGenerator::new(3, 4, SystemClock).unwrap();
    let mut last = generator.last_id();
    for _ in 0..TOTAL_IDS {
        let id = generator.next_id();
        assert!(id > last);
        assert!(id.timestamp() >= last.timestamp());
        assert_eq!(id.server(), 3);
        assert_eq!(id.machine(), 4);
        last = id;
    }
}

#[test]
fn monotonic_with_monotonic_clock() {
    const TOTAL_IDS: usize = 4096 * 16;

    let generator = UniqueIdGenerator::new(0, 0, MonotonicClock::new()).unwrap();
    let mut last = generator.last_id();
    for _ in 0..TOTAL_IDS {
        let id = generator.next_id();
        assert!(id > last);
        last = id;
    }
}

fn run_threaded<T>(
    generator: &UniqueIdGenerator<T>,
    threads: usize,
    per_thread: usize,
) -> Vec<UniqueId>
where
    T: TimeSource + Sync,
{
    let results = Mutex::new(Vec::with_capacity(threads * per_thread));
    scope(|s| {
        for _ in 0..threads {
            s.spawn(|| {
                let ids: Vec<_> = (0..per_thread).map(|_| generator.next_id()).collect();
                results.lock().unwrap().extend(ids);
            });
        }
    });
    results.into_inner().unwrap()
}

#[test]
fn concurrent_callers_get_distinct_ids() {
    let generator = UniqueIdGenerator::new(1, 1, SystemClock).unwrap();
    let ids = run_threaded(&generator, 10, 819);

    let unique: HashSet<_> = ids.iter().copied().collect();
    assert_eq!(ids.len(), 8190);
    assert_eq!(unique.len(), 8190, "duplicate ids issued");
    assert!(ids.iter().all(|id| id.server() == 1 && id.machine() == 1));
}

#[test]
fn concurrent_callers_get_distinct_ids_at_scale() {
    let threads = num_cpus::get().max(2);
    let per_thread = 4096 * 64 / threads;

    let generator = UniqueIdGenerator::new(7, 9, SystemClock).unwrap();
    let ids = run_threaded(&generator, threads, per_thread);

    let unique: HashSet<_> = ids.iter().copied().collect();
    assert_eq!(unique.len(), threads * per_thread);
    assert!(ids.iter().all(|id| id.server() == 7 && id.machine() == 9));
    assert!(ids.iter().all(|id| id.sequence() <= UniqueId::MAX_SEQUENCE));
}

#[test]
fn committed_ticks_never_decrease_under_contention() {
    const THREADS: usize = 8;
    const IDS_PER_THREAD: usize = 20_000;

    let generator = UniqueIdGenerator::new(4, 5, SystemClock).unwrap();
    let done = AtomicU64::new(0);
    let issued = Mutex::new(Vec::with_capacity(THREADS * IDS_PER_THREAD));

    let observed = scope(|s| {
        for _ in 0..THREADS {
            s.spawn(|| {
                for _ in 0..IDS_PER_THREAD {
                    let id = generator.next_id();
                    let stored = generator.last_id();
                    // The stored word is at or past anything this thread committed.
                    assert!(stored >= id);
                    issued.lock().unwrap().push((id, stored));
                }
                done.fetch_add(1, Ordering::Relaxed);
            });
        }

        // Successive loads of the word follow the commit order.
        let mut observed = Vec::new();
        while done.load(Ordering::Relaxed) < THREADS as u64 {
            observed.push(generator.last_id());
        }
        observed.push(generator.last_id());
        observed
    });

    assert!(observed.windows(2).all(|w| w[0] <= w[1]));
    assert!(observed.windows(2).all(|w| w[0].timestamp() <= w[1].timestamp()));

    let issued = issued.into_inner().unwrap();
    assert_eq!(issued.len(), THREADS * IDS_PER_THREAD);

    // Ordering the committed ids by value must also order their ticks.
    let mut committed: Vec<_> = issued.iter().map(|&(id, _)| id).collect();
    committed.sort_unstable();
    committed.dedup();
    assert_eq!(committed.len(), THREADS * IDS_PER_THREAD);
    assert!(committed.windows(2).all(|w| w[0].timestamp() <= w[1].timestamp()));
    assert_eq!(committed.last(), observed.last());
}

#[test]
fn per_thread_order_is_increasing() {
    let generator = UniqueIdGenerator::new(1, 2, SystemClock).unwrap();
    scope(|s| {
        for _ in 0..8 {
            s.spawn(|| {
                let mut last = UniqueId::default();
                for _ in 0..10_000 {
                    let id = generator.next_id();
                    assert!(id > last);
                    last = id;
                }
            });
        }
    });
}

#[test]
fn independent_generators_do_not_share_state() {
    let a = UniqueIdGenerator::new(1, 1, MockTime { millis: 5 }).unwrap();
    let b = UniqueIdGenerator::new(2, 1, MockTime { millis: 5 }).unwrap();

    for _ in 0..10 {
        a.poll_id().unwrap_ready();
    }
    let first_b = b.poll_id().unwrap_ready();
    assert_eq!(first_b.sequence(), 1);
    assert_eq!(a.last_id().sequence(), 10);
    assert_ne!(a.last_id(), b.last_id());
}
