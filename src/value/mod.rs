//! Type-erased values and the comparators that order them
//!
//! A [`Value`] pairs a caller-declared [`TypeTag`] with an owned copy of the
//! caller's bytes. All generic containers store values; comparators decide how
//! tags and bytes are interpreted.

mod compare;
mod descriptor;
mod tag;

pub use compare::{Comparator, RawComparator, Reverse, ValueComparator};
pub use descriptor::{Value, WIDE_UNIT_SIZE};
pub use tag::TypeTag;
