//! Type tags describing how a value's bytes are to be read

use serde::{Deserialize, Serialize};
use std::fmt;
use std::mem;

/// Discriminant attached to every stored value
///
/// The tag is caller-declared and never checked against the payload size;
/// comparators and typed readers interpret bytes according to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TypeTag {
    /// Signed 8-bit integer
    Int8,
    /// Signed 16-bit integer
    Int16,
    /// Signed 32-bit integer
    Int32,
    /// Signed 64-bit integer
    Int64,
    /// Unsigned 8-bit integer
    UInt8,
    /// Unsigned 16-bit integer
    UInt16,
    /// Unsigned 32-bit integer
    UInt32,
    /// Unsigned 64-bit integer
    UInt64,
    /// IEEE-754 single precision
    Float32,
    /// IEEE-754 double precision
    Float64,
    /// One byte, zero is false
    Bool,
    /// Machine address stored as a native-endian `usize`
    Pointer,
    /// Narrow, NUL-terminated character data
    CharPtr,
    /// Wide (32-bit unit), NUL-terminated character data
    WideCharPtr,
    /// Opaque bytes
    Blob,
    /// Caller-defined discriminant
    Custom(u16),
}

impl TypeTag {
    /// Natural byte width of fixed-width tags, `None` for variable-width ones
    pub fn natural_width(self) -> Option<usize> {
        match self {
            Self::Int8 | Self::UInt8 | Self::Bool => Some(1),
            Self::Int16 | Self::UInt16 => Some(2),
            Self::Int32 | Self::UInt32 | Self::Float32 => Some(4),
            Self::Int64 | Self::UInt64 | Self::Float64 => Some(8),
            Self::Pointer => Some(mem::size_of::<usize>()),
            Self::CharPtr | Self::WideCharPtr | Self::Blob | Self::Custom(_) => None,
        }
    }

    /// Whether the tag denotes NUL-terminated character data
    pub fn is_text(self) -> bool {
        matches!(self, Self::CharPtr | Self::WideCharPtr)
    }

    /// Whether the tag denotes an integer
    pub fn is_integer(self) -> bool {
        matches!(
            self,
            Self::Int8
                | Self::Int16
                | Self::Int32
                | Self::Int64
                | Self::UInt8
                | Self::UInt16
                | Self::UInt32
                | Self::UInt64
        )
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Custom(id) => write!(f, "custom#{}", id),
            other => write!(f, "{:?}", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_natural_width() {
        assert_eq!(TypeTag::Int32.natural_width(), Some(4));
        assert_eq!(TypeTag::UInt64.natural_width(), Some(8));
        assert_eq!(TypeTag::Pointer.natural_width(), Some(mem::size_of::<usize>()));
        assert_eq!(TypeTag::CharPtr.natural_width(), None);
        assert_eq!(TypeTag::Custom(3).natural_width(), None);
    }

    #[test]
    fn test_classification() {
        assert!(TypeTag::CharPtr.is_text());
        assert!(TypeTag::WideCharPtr.is_text());
        assert!(!TypeTag::Blob.is_text());
        assert!(TypeTag::UInt16.is_integer());
        assert!(!TypeTag::Float64.is_integer());
    }

    #[test]
    fn test_display() {
        assert_eq!(TypeTag::Int32.to_string(), "Int32");
        assert_eq!(TypeTag::Custom(7).to_string(), "custom#7");
    }
}
