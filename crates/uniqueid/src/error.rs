use core::fmt;

/// A result type defaulting to this crate's [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Names the tag that failed validation in [`Error::OutOfRange`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Tag {
    Server,
    Machine,
}

impl Tag {
    /// The largest value this tag's field can hold.
    pub const fn max_value(self) -> u64 {
        match self {
            Self::Server => crate::UniqueId::MAX_SERVER,
            Self::Machine => crate::UniqueId::MAX_MACHINE,
        }
    }

    /// Checks that `value` fits in this tag's field.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] naming this tag if it does not.
    ///
    /// ```
    /// use uniqueid::{Error, Tag};
    ///
    /// assert_eq!(Tag::Machine.validate(31), Ok(31));
    /// assert_eq!(
    ///     Tag::Machine.validate(32),
    ///     Err(Error::OutOfRange { tag: Tag::Machine, value: 32 }),
    /// );
    /// ```
    pub fn validate(self, value: u32) -> Result<u64> {
        let wide = u64::from(value);
        if wide > self.max_value() {
            return Err(Error::OutOfRange { tag: self, value });
        }
        Ok(wide)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Server => f.write_str("server"),
            Self::Machine => f.write_str("machine"),
        }
    }
}

/// All errors that `uniqueid` can emit.
///
/// Only generator construction is fallible. Once a generator exists,
/// [`UniqueIdGenerator::next_id`] always succeeds.
///
/// [`UniqueIdGenerator::next_id`]: crate::UniqueIdGenerator::next_id
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A server or machine tag does not fit in its 5-bit field.
    #[error("{tag} must be between 0 and {max}, got {value}", max = tag.max_value())]
    OutOfRange { tag: Tag, value: u32 },
}
