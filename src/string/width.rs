//! Character-width policies for [`Text`](super::Text)
//!
//! A width decides the code unit stored per character position, how native
//! text is encoded into units and decoded back, and which [`TypeTag`] the
//! units carry when stored as a [`Value`](crate::Value).

use crate::value::{TypeTag, WIDE_UNIT_SIZE};
use std::fmt;
use std::hash::Hash;

/// Encoding policy shared by the narrow and wide string types
pub trait CharWidth: Clone + Copy + Default + fmt::Debug + 'static {
    /// One stored code unit
    type Unit: Copy + Eq + Ord + Hash + Default + fmt::Debug + 'static;

    /// Unit written one slot past the last character
    const TERMINATOR: Self::Unit;

    /// Tag used when a string is stored as a value
    const TAG: TypeTag;

    /// Short name used in logs and errors
    const NAME: &'static str;

    /// Append the encoding of `text` to `out`
    fn encode(text: &str, out: &mut Vec<Self::Unit>);

    /// Decode units into native text, replacing invalid sequences
    fn decode(units: &[Self::Unit]) -> String;

    /// Append the native-endian bytes of `units` to `out`
    fn write_bytes(units: &[Self::Unit], out: &mut Vec<u8>);

    /// Read units from native-endian bytes, stopping at the first terminator
    fn read_bytes(bytes: &[u8]) -> Vec<Self::Unit>;

    /// The unit encoding an ASCII character
    fn from_ascii(byte: u8) -> Self::Unit;
}

/// Byte-wide strings holding UTF-8 code units
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Narrow;

impl CharWidth for Narrow {
    type Unit = u8;

    const TERMINATOR: u8 = 0;
    const TAG: TypeTag = TypeTag::CharPtr;
    const NAME: &'static str = "narrow";

    fn encode(text: &str, out: &mut Vec<u8>) {
        out.extend_from_slice(text.as_bytes());
    }

    fn decode(units: &[u8]) -> String {
        String::from_utf8_lossy(units).into_owned()
    }

    fn write_bytes(units: &[u8], out: &mut Vec<u8>) {
        out.extend_from_slice(units);
    }

    fn read_bytes(bytes: &[u8]) -> Vec<u8> {
        bytes.iter().copied().take_while(|&b| b != 0).collect()
    }

    #[inline]
    fn from_ascii(byte: u8) -> u8 {
        byte
    }
}

/// Strings holding one Unicode scalar value per 32-bit unit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Wide;

impl CharWidth for Wide {
    type Unit = u32;

    const TERMINATOR: u32 = 0;
    const TAG: TypeTag = TypeTag::WideCharPtr;
    const NAME: &'static str = "wide";

    fn encode(text: &str, out: &mut Vec<u32>) {
        out.extend(text.chars().map(u32::from));
    }

    fn decode(units: &[u32]) -> String {
        units
            .iter()
            .map(|&u| char::from_u32(u).unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect()
    }

    fn write_bytes(units: &[u32], out: &mut Vec<u8>) {
        out.reserve(units.len() * WIDE_UNIT_SIZE);
        for unit in units {
            out.extend_from_slice(&unit.to_ne_bytes());
        }
    }

    fn read_bytes(bytes: &[u8]) -> Vec<u32> {
        bytes
            .chunks_exact(WIDE_UNIT_SIZE)
            .map(|c| u32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
            .take_while(|&u| u != 0)
            .collect()
    }

    #[inline]
    fn from_ascii(byte: u8) -> u32 {
        u32::from(byte)
    }
}
