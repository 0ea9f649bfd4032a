use core::{cmp, time::Duration};

use portable_atomic::{AtomicU64, Ordering};
#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    error::{Result, Tag},
    generator::IdGenStatus,
    id::UniqueId,
    time::TimeSource,
};

/// A lock-free ID generator for one (server, machine) pair.
///
/// The entire state is the last issued [`UniqueId`], stored in one
/// [`AtomicU64`]. Every commit is a single compare-and-swap of that word, so
/// the tick check and the sequence bump can never be separated by another
/// caller's update. Losers of a race re-read the word and try again.
///
/// A generator is an ordinary value: create one per (server, machine) pair
/// and share it (e.g. behind an `Arc`) between the threads that need IDs.
/// Uniqueness across processes relies on each process owning a distinct
/// pair.
///
/// ## Caveats
/// - Throughput per generator is capped at 4096 IDs per millisecond. Past
///   that, [`Self::next_id`] sleeps for a millisecond.
/// - If the clock moves backwards the generator keeps issuing IDs at its last
///   tick until the clock catches up, so the tick may trail wall time.
pub struct UniqueIdGenerator<T>
where
    T: TimeSource,
{
    #[cfg(feature = "cache-padded")]
    state: crossbeam_utils::CachePadded<AtomicU64>,
    #[cfg(not(feature = "cache-padded"))]
    state: AtomicU64,
    time: T,
}

impl<T> UniqueIdGenerator<T>
where
    T: TimeSource,
{
    /// Creates a generator for the given tags, seeded with the current time
    /// and sequence zero.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] if `server` or `machine` is above 31.
    /// The server tag is checked first.
    ///
    /// # Example
    /// ```
    /// use uniqueid::{Error, SystemClock, Tag, UniqueIdGenerator};
    ///
    /// assert!(UniqueIdGenerator::new(31, 31, SystemClock).is_ok());
    /// assert_eq!(
    ///     UniqueIdGenerator::new(32, 0, SystemClock).err(),
    ///     Some(Error::OutOfRange { tag: Tag::Server, value: 32 }),
    /// );
    /// ```
    ///
    /// [`Error::OutOfRange`]: crate::Error::OutOfRange
    pub fn new(server: u32, machine: u32, time: T) -> Result<Self> {
        let now = time.current_millis() & UniqueId::TIMESTAMP_MASK;
        Self::from_components(now, server, machine, 0, time)
    }

    /// Creates a generator whose last issued ID is built from the given
    /// components.
    ///
    /// Useful to control the starting point, e.g. in tests. Prefer
    /// [`Self::new`] otherwise. `timestamp` and `sequence` are masked to
    /// their field widths.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] if `server` or `machine` is above 31.
    ///
    /// [`Error::OutOfRange`]: crate::Error::OutOfRange
    pub fn from_components(
        timestamp: u64,
        server: u32,
        machine: u32,
        sequence: u64,
        time: T,
    ) -> Result<Self> {
        let server = Tag::Server.validate(server)?;
        let machine = Tag::Machine.validate(machine)?;
        let initial = UniqueId::from_components(
            timestamp & UniqueId::TIMESTAMP_MASK,
            server,
            machine,
            sequence & UniqueId::SEQUENCE_MASK,
        );

        #[cfg(feature = "tracing")]
        tracing::debug!(server, machine, initial = ?initial, "created id generator");

        Ok(Self {
            #[cfg(feature = "cache-padded")]
            state: crossbeam_utils::CachePadded::new(AtomicU64::new(initial.to_raw())),
            #[cfg(not(feature = "cache-padded"))]
            state: AtomicU64::new(initial.to_raw()),
            time,
        })
    }

    /// The server tag embedded in every ID from this generator.
    pub fn server(&self) -> u64 {
        self.last_id().server()
    }

    /// The machine tag embedded in every ID from this generator.
    pub fn machine(&self) -> u64 {
        self.last_id().machine()
    }

    /// The most recently committed ID (or the seed if nothing was issued yet).
    pub fn last_id(&self) -> UniqueId {
        UniqueId::from_raw(self.state.load(Ordering::Relaxed))
    }

    /// Generates the next ID, waiting out tick exhaustion if necessary.
    ///
    /// Never fails. Lost races are retried immediately; when all 4096
    /// sequence values of the current tick are used up, the calling thread
    /// sleeps for a millisecond before retrying.
    ///
    /// # Example
    /// ```
    /// use uniqueid::{SystemClock, UniqueIdGenerator};
    ///
    /// let generator = UniqueIdGenerator::new(1, 2, SystemClock)?;
    /// let id = generator.next_id();
    /// assert_eq!((id.server(), id.machine()), (1, 2));
    /// # Ok::<(), uniqueid::Error>(())
    /// ```
    pub fn next_id(&self) -> UniqueId {
        loop {
            match self.poll_id() {
                IdGenStatus::Ready { id } => break id,
                IdGenStatus::Pending { yield_for: 0 } => core::hint::spin_loop(),
                IdGenStatus::Pending { yield_for } => {
                    std::thread::sleep(Duration::from_millis(yield_for));
                }
            }
        }
    }

    /// Makes one attempt at committing the next ID.
    ///
    /// Returns [`IdGenStatus::Ready`] if this call's compare-and-swap
    /// committed a new ID, otherwise [`IdGenStatus::Pending`] with the number
    /// of milliseconds to wait before the next attempt.
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn poll_id(&self) -> IdGenStatus {
        let now = self.time.current_millis() & UniqueId::TIMESTAMP_MASK;

        let current_raw = self.state.load(Ordering::Relaxed);
        let current_id = UniqueId::from_raw(current_raw);
        let current_ts = current_id.timestamp();

        let next_id = match now.cmp(&current_ts) {
            cmp::Ordering::Greater => current_id.rollover_to_timestamp(now),
            cmp::Ordering::Equal if current_id.has_sequence_room() => {
                current_id.increment_sequence()
            }
            cmp::Ordering::Less if current_id.has_sequence_room() => {
                Self::cold_clock_behind(now, current_id)
            }
            _ => {
                #[cfg(feature = "tracing")]
                tracing::debug!(tick = current_ts, "sequence exhausted for tick");
                return IdGenStatus::Pending { yield_for: 1 };
            }
        };

        let next_raw = next_id.to_raw();

        if self
            .state
            .compare_exchange(current_raw, next_raw, Ordering::Relaxed, Ordering::Relaxed)
            .is_ok()
        {
            IdGenStatus::Ready { id: next_id }
        } else {
            IdGenStatus::Pending { yield_for: 0 }
        }
    }

    /// The clock reads earlier than the last committed tick. Keep issuing at
    /// the committed tick so the timestamp never regresses.
    #[cold]
    #[inline(never)]
    fn cold_clock_behind(now: u64, current_id: UniqueId) -> UniqueId {
        #[cfg(feature = "tracing")]
        tracing::debug!(now, tick = current_id.timestamp(), "clock behind last tick");
        let next_id = current_id.increment_sequence();
        debug_assert_eq!(next_id.timestamp(), cmp::max(now, current_id.timestamp()));
        next_id
    }
}
