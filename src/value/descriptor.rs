//! Value: a type-tagged, owned byte buffer
//!
//! Containers deep-copy caller bytes into a `Value` on insertion, so the
//! caller's buffer may be released as soon as the call returns. Replacing or
//! removing an element drops the previously owned buffer.

use super::tag::TypeTag;
use crate::error::{Result, StowageError};
use std::fmt;
use std::mem;

/// Size in bytes of one wide character unit
pub const WIDE_UNIT_SIZE: usize = mem::size_of::<u32>();

/// Type-erased stored value
///
/// # Examples
///
/// ```rust
/// use stowage::{TypeTag, Value};
///
/// let v = Value::from_i32(-42);
/// assert_eq!(v.tag(), TypeTag::Int32);
/// assert_eq!(v.size(), 4);
/// assert_eq!(v.as_i32()?, -42);
///
/// let s = Value::from_str("key");
/// assert_eq!(s.size(), 4); // terminator included
/// assert_eq!(s.as_c_str()?, "key");
/// # Ok::<(), stowage::StowageError>(())
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Value {
    tag: TypeTag,
    data: Box<[u8]>,
}

impl Value {
    /// Deep-copy `bytes` under the given tag
    #[inline]
    pub fn new(tag: TypeTag, bytes: &[u8]) -> Self {
        Self {
            tag,
            data: bytes.into(),
        }
    }

    /// Take ownership of an existing buffer
    #[inline]
    pub fn from_vec(tag: TypeTag, bytes: Vec<u8>) -> Self {
        Self {
            tag,
            data: bytes.into_boxed_slice(),
        }
    }

    /// The caller-declared tag
    #[inline]
    pub fn tag(&self) -> TypeTag {
        self.tag
    }

    /// The owned bytes
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Mutable access to the owned bytes (size is fixed)
    #[inline]
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Payload size in bytes
    #[inline]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Read accessor returning `(tag, bytes, size)`
    #[inline]
    pub fn parts(&self) -> (TypeTag, &[u8], usize) {
        (self.tag, &self.data, self.data.len())
    }

    /// Replace the payload and tag in place, releasing the old buffer
    pub fn rebind(&mut self, tag: TypeTag, bytes: &[u8]) {
        self.tag = tag;
        self.data = bytes.into();
    }

    /// Consume the value, returning its buffer
    pub fn into_bytes(self) -> Box<[u8]> {
        self.data
    }

    /// Bytes up to (not including) the first NUL, or all bytes if none
    pub fn c_bytes(&self) -> &[u8] {
        let end = self.data.iter().position(|&b| b == 0).unwrap_or(self.data.len());
        &self.data[..end]
    }

    fn fixed<const N: usize>(&self) -> Result<[u8; N]> {
        self.data
            .get(..N)
            .and_then(|head| head.try_into().ok())
            .ok_or_else(|| {
                StowageError::invalid_argument(format!(
                    "{} payload holds {} bytes, {} required",
                    self.tag,
                    self.data.len(),
                    N
                ))
            })
    }
}

macro_rules! numeric_value {
    ($($from:ident, $as:ident, $ty:ty, $tag:ident;)*) => {
        impl Value {
            $(
                #[doc = concat!("Store a native-endian `", stringify!($ty), "` under `TypeTag::", stringify!($tag), "`")]
                #[inline]
                pub fn $from(value: $ty) -> Self {
                    Self::new(TypeTag::$tag, &value.to_ne_bytes())
                }

                #[doc = concat!("Read the leading bytes as a native-endian `", stringify!($ty), "`")]
                #[inline]
                pub fn $as(&self) -> Result<$ty> {
                    self.fixed().map(<$ty>::from_ne_bytes)
                }
            )*
        }
    };
}

numeric_value! {
    from_i8, as_i8, i8, Int8;
    from_i16, as_i16, i16, Int16;
    from_i32, as_i32, i32, Int32;
    from_i64, as_i64, i64, Int64;
    from_u8, as_u8, u8, UInt8;
    from_u16, as_u16, u16, UInt16;
    from_u32, as_u32, u32, UInt32;
    from_u64, as_u64, u64, UInt64;
    from_f32, as_f32, f32, Float32;
    from_f64, as_f64, f64, Float64;
}

impl Value {
    /// Store a flag as a single byte
    pub fn from_bool(value: bool) -> Self {
        Self::new(TypeTag::Bool, &[value as u8])
    }

    /// Read the first byte as a flag
    pub fn as_bool(&self) -> Result<bool> {
        self.fixed::<1>().map(|[b]| b != 0)
    }

    /// Store an address under `TypeTag::Pointer`
    pub fn from_pointer<T>(ptr: *const T) -> Self {
        Self::new(TypeTag::Pointer, &(ptr as usize).to_ne_bytes())
    }

    /// Read the stored address
    pub fn as_pointer(&self) -> Result<usize> {
        self.fixed().map(usize::from_ne_bytes)
    }

    /// Store narrow text with a trailing NUL under `TypeTag::CharPtr`
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(text: &str) -> Self {
        let mut bytes = Vec::with_capacity(text.len() + 1);
        bytes.extend_from_slice(text.as_bytes());
        bytes.push(0);
        Self::from_vec(TypeTag::CharPtr, bytes)
    }

    /// Read the payload as NUL-terminated UTF-8 text
    pub fn as_c_str(&self) -> Result<&str> {
        std::str::from_utf8(self.c_bytes())
            .map_err(|e| StowageError::invalid_argument(format!("payload is not UTF-8: {}", e)))
    }

    /// Store wide units with a trailing zero unit under `TypeTag::WideCharPtr`
    pub fn from_wide(units: &[u32]) -> Self {
        let mut bytes = Vec::with_capacity((units.len() + 1) * WIDE_UNIT_SIZE);
        for unit in units.iter().chain(std::iter::once(&0u32)) {
            bytes.extend_from_slice(&unit.to_ne_bytes());
        }
        Self::from_vec(TypeTag::WideCharPtr, bytes)
    }

    /// Read the payload as wide units up to the first zero unit
    pub fn as_wide(&self) -> Result<Vec<u32>> {
        if self.data.len() % WIDE_UNIT_SIZE != 0 {
            return Err(StowageError::invalid_argument(format!(
                "wide payload of {} bytes is not a whole number of units",
                self.data.len()
            )));
        }
        Ok(self
            .data
            .chunks_exact(WIDE_UNIT_SIZE)
            .map(|chunk| u32::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .take_while(|&unit| unit != 0)
            .collect())
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("Value");
        out.field("tag", &self.tag).field("size", &self.data.len());
        match self.tag {
            TypeTag::CharPtr => out.field("text", &String::from_utf8_lossy(self.c_bytes())),
            _ => out.field("data", &&self.data[..]),
        };
        out.finish()
    }
}
