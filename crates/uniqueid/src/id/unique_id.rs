use core::fmt;

/// A 64-bit identifier tagged with the server and machine that issued it.
///
/// - 42 bits timestamp (ms since the Unix epoch, truncated)
/// - 5 bits server tag
/// - 5 bits machine tag
/// - 12 bits sequence
///
/// ```text
///  Bit Index:  63             22 21         17 16          12 11             0
///              +----------------+-------------+--------------+---------------+
///  Field:      | timestamp (42) | server (5)  | machine (5)  | sequence (12) |
///              +----------------+-------------+--------------+---------------+
///              |<----------- MSB ---------- 64 bits --------- LSB ---------->|
/// ```
///
/// IDs order by their raw value, so a later tick always sorts after an earlier
/// one and ties within a tick are broken by the sequence.
///
/// # Example
///
/// ```
/// use uniqueid::UniqueId;
///
/// let id = UniqueId::from_components(1_700_000_000_000, 3, 7, 42);
/// assert_eq!(id.timestamp(), 1_700_000_000_000);
/// assert_eq!(id.server(), 3);
/// assert_eq!(id.machine(), 7);
/// assert_eq!(id.sequence(), 42);
/// assert_eq!(UniqueId::from_raw(id.to_raw()), id);
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct UniqueId {
    id: u64,
}

impl UniqueId {
    /// Bitmask for the 42-bit timestamp field. Occupies bits 22 through 63.
    pub const TIMESTAMP_MASK: u64 = (1 << 42) - 1;

    /// Bitmask for the 5-bit server field. Occupies bits 17 through 21.
    pub const SERVER_MASK: u64 = (1 << 5) - 1;

    /// Bitmask for the 5-bit machine field. Occupies bits 12 through 16.
    pub const MACHINE_MASK: u64 = (1 << 5) - 1;

    /// Bitmask for the 12-bit sequence field. Occupies bits 0 through 11.
    pub const SEQUENCE_MASK: u64 = (1 << 12) - 1;

    pub const TIMESTAMP_SHIFT: u64 = 22;
    pub const SERVER_SHIFT: u64 = 17;
    pub const MACHINE_SHIFT: u64 = 12;
    pub const SEQUENCE_SHIFT: u64 = 0;

    pub const MAX_TIMESTAMP: u64 = Self::TIMESTAMP_MASK;
    pub const MAX_SERVER: u64 = Self::SERVER_MASK;
    pub const MAX_MACHINE: u64 = Self::MACHINE_MASK;
    pub const MAX_SEQUENCE: u64 = Self::SEQUENCE_MASK;

    /// Packs the four fields into an ID.
    ///
    /// Each component is masked to its field width. Callers are expected to
    /// pass in-range values; debug builds assert it.
    pub const fn from_components(timestamp: u64, server: u64, machine: u64, sequence: u64) -> Self {
        debug_assert!(timestamp <= Self::TIMESTAMP_MASK, "timestamp overflow");
        debug_assert!(server <= Self::SERVER_MASK, "server overflow");
        debug_assert!(machine <= Self::MACHINE_MASK, "machine overflow");
        debug_assert!(sequence <= Self::SEQUENCE_MASK, "sequence overflow");

        let timestamp = (timestamp & Self::TIMESTAMP_MASK) << Self::TIMESTAMP_SHIFT;
        let server = (server & Self::SERVER_MASK) << Self::SERVER_SHIFT;
        let machine = (machine & Self::MACHINE_MASK) << Self::MACHINE_SHIFT;
        let sequence = (sequence & Self::SEQUENCE_MASK) << Self::SEQUENCE_SHIFT;
        Self {
            id: timestamp | server | machine | sequence,
        }
    }

    /// Extracts the millisecond tick.
    pub const fn timestamp(&self) -> u64 {
        (self.id >> Self::TIMESTAMP_SHIFT) & Self::TIMESTAMP_MASK
    }

    /// Extracts the server tag.
    pub const fn server(&self) -> u64 {
        (self.id >> Self::SERVER_SHIFT) & Self::SERVER_MASK
    }

    /// Extracts the machine tag.
    pub const fn machine(&self) -> u64 {
        (self.id >> Self::MACHINE_SHIFT) & Self::MACHINE_MASK
    }

    /// Extracts the per-tick sequence.
    pub const fn sequence(&self) -> u64 {
        (self.id >> Self::SEQUENCE_SHIFT) & Self::SEQUENCE_MASK
    }

    pub const fn to_raw(&self) -> u64 {
        self.id
    }

    pub const fn from_raw(raw: u64) -> Self {
        Self { id: raw }
    }

    /// Returns true if the sequence can be incremented within this tick.
    pub const fn has_sequence_room(&self) -> bool {
        self.sequence() < Self::MAX_SEQUENCE
    }

    /// Returns the ID for the same tick and tags with the sequence bumped by
    /// one. Check [`Self::has_sequence_room`] first.
    pub const fn increment_sequence(&self) -> Self {
        Self::from_components(
            self.timestamp(),
            self.server(),
            self.machine(),
            self.sequence() + 1,
        )
    }

    /// Returns the ID for a newer tick with the same tags and sequence zero.
    pub const fn rollover_to_timestamp(&self, timestamp: u64) -> Self {
        Self::from_components(timestamp, self.server(), self.machine(), 0)
    }
}

impl From<u64> for UniqueId {
    fn from(raw: u64) -> Self {
        Self::from_raw(raw)
    }
}

impl From<UniqueId> for u64 {
    fn from(id: UniqueId) -> Self {
        id.to_raw()
    }
}

/// Renders the decimal value followed by its binary form, e.g.
/// `7134960386191364096 (110001100...)`.
impl fmt::Display for UniqueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:b})", self.id, self.id)
    }
}

impl fmt::Debug for UniqueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UniqueId")
            .field("raw", &format_args!("0x{:016x}", self.id))
            .field("timestamp", &self.timestamp())
            .field("server", &self.server())
            .field("machine", &self.machine())
            .field("sequence", &self.sequence())
            .finish()
    }
}
