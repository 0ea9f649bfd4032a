use crate::TimeSource;
use core::time::Duration;
use portable_atomic::{AtomicU64, Ordering};
use std::{
    io,
    sync::{Arc, Weak},
    thread,
    time::{Instant, SystemTime, UNIX_EPOCH},
};

#[derive(Debug)]
struct Ticker {
    elapsed_ms: AtomicU64,
}

/// A clock that never goes backwards.
///
/// At construction the wall clock is sampled once to anchor the clock to the
/// Unix epoch. From then on a background thread advances a shared counter
/// once per millisecond using [`Instant`], so later wall-clock steps have no
/// effect and reads are a single atomic load.
///
/// Clones share the same ticker. The thread exits once the last clone is
/// dropped.
#[derive(Clone, Debug)]
pub struct MonotonicClock {
    ticker: Arc<Ticker>,
    epoch_offset: u64,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

type TickerTask = Box<dyn FnOnce() + Send + 'static>;

impl MonotonicClock {
    /// Starts a new ticker anchored to the current wall-clock time.
    ///
    /// # Panics
    ///
    /// Panics if the ticker thread cannot be spawned. Use [`Self::try_new`]
    /// to handle that case.
    pub fn new() -> Self {
        Self::try_new().expect("failed to spawn clock ticker thread")
    }

    /// Starts a new ticker anchored to the current wall-clock time.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the ticker thread cannot be spawned. A clock
    /// without its ticker would never advance.
    pub fn try_new() -> io::Result<Self> {
        Self::start_with(|task| {
            thread::Builder::new()
                .name("uniqueid-clock".into())
                .spawn(task)
                .map(drop)
        })
    }

    fn start_with(spawn: impl FnOnce(TickerTask) -> io::Result<()>) -> io::Result<Self> {
        let start = Instant::now();
        let epoch_offset = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as u64)
            .unwrap_or_default();

        let ticker = Arc::new(Ticker {
            elapsed_ms: AtomicU64::new(0),
        });
        let weak = Arc::downgrade(&ticker);
        spawn(Box::new(move || run_ticker(&weak, start)))?;

        Ok(Self {
            ticker,
            epoch_offset,
        })
    }
}

fn run_ticker(ticker: &Weak<Ticker>, start: Instant) {
    let mut next_tick = 0;
    loop {
        let Some(ticker) = ticker.upgrade() else {
            break;
        };

        let target = start + Duration::from_millis(next_tick);
        let now = Instant::now();
        if now < target {
            thread::sleep(target - now);
        }

        let elapsed_ms = start.elapsed().as_millis() as u64;
        ticker.elapsed_ms.store(elapsed_ms, Ordering::Relaxed);
        next_tick = elapsed_ms + 1;
    }
}

impl TimeSource for MonotonicClock {
    fn current_millis(&self) -> u64 {
        self.epoch_offset + self.ticker.elapsed_ms.load(Ordering::Relaxed)
    }
}
