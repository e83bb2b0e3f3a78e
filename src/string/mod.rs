//! Growable strings in narrow and wide widths
//!
//! [`Text`] is generic over a [`CharWidth`]: [`NarrowString`] stores UTF-8
//! code units, [`WideString`] stores one Unicode scalar per 32-bit unit. Both
//! keep a terminator unit past the last character and convert to and from
//! [`Value`](crate::Value)s tagged as text.

mod splitter;
mod text;
mod width;

pub use splitter::Splitter;
pub use text::{Extended, NarrowString, Text, WideString};
pub use width::{CharWidth, Narrow, Wide};
