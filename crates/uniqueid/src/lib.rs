//! Lock-free generation of roughly time-ordered 64-bit identifiers.
//!
//! Every [`UniqueId`] packs a millisecond tick, a 5-bit server tag, a 5-bit
//! machine tag and a 12-bit per-tick sequence. A [`UniqueIdGenerator`] owns a
//! single atomic word holding the last issued ID and advances it with
//! compare-and-swap only, so any number of threads can share one generator
//! without a lock.
//!
//! ```
//! use uniqueid::{SystemClock, UniqueIdGenerator};
//!
//! let generator = UniqueIdGenerator::new(1, 1, SystemClock)?;
//! let a = generator.next_id();
//! let b = generator.next_id();
//!
//! assert!(a < b);
//! assert_eq!(b.server(), 1);
//! assert_eq!(b.machine(), 1);
//! # Ok::<(), uniqueid::Error>(())
//! ```
#![cfg_attr(docsrs, feature(doc_cfg))]

mod error;
mod generator;
mod id;
mod time;

pub use crate::error::*;
pub use crate::generator::*;
pub use crate::id::*;
pub use crate::time::*;
