use crate::TimeSource;
use std::time::{SystemTime, UNIX_EPOCH};

/// The wall clock, read with [`SystemTime::now`] on every call.
///
/// Wall time can step backwards (NTP corrections, manual changes). Generators
/// tolerate this by holding their last tick until the clock catches up.
///
/// A system clock set before 1970 reads as `0`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn current_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as u64)
            .unwrap_or_default()
    }
}
