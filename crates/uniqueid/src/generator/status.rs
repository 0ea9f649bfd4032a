use crate::UniqueId;

/// The outcome of a single generation attempt.
///
/// - [`IdGenStatus::Ready`] carries a freshly committed ID.
/// - [`IdGenStatus::Pending`] means no ID was committed. `yield_for` is how
///   many milliseconds to wait before trying again: `0` when another caller
///   won the race (retry immediately), `1` when every sequence value of the
///   current tick has been issued.
///
/// # Example
///
/// ```
/// use uniqueid::{IdGenStatus, TimeSource, UniqueIdGenerator};
///
/// struct FixedTime;
/// impl TimeSource for FixedTime {
///     fn current_millis(&self) -> u64 {
///         1
///     }
/// }
///
/// let generator = UniqueIdGenerator::new(0, 1, FixedTime)?;
/// match generator.poll_id() {
///     IdGenStatus::Ready { id } => println!("ID: {id}"),
///     IdGenStatus::Pending { yield_for } => println!("Back off for {yield_for}ms"),
/// }
/// # Ok::<(), uniqueid::Error>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdGenStatus {
    /// A unique ID was committed and is ready to use.
    Ready {
        /// The committed ID.
        id: UniqueId,
    },
    /// No ID was committed on this attempt.
    Pending {
        /// Milliseconds to wait before the next attempt.
        yield_for: u64,
    },
}
