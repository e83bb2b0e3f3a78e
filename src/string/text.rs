//! Text: growable, terminator-padded string over a character width
//!
//! The unit buffer always holds one terminator slot past the last character,
//! so [`Text::units_with_terminator`] can be handed to C-string style
//! consumers without copying. Positions and lengths count code units: bytes
//! for [`NarrowString`], Unicode scalar values for [`WideString`].

use super::splitter::Splitter;
use super::width::{CharWidth, Narrow, Wide};
use crate::config::{Config, ContainerConfig};
use crate::error::{check_bounds, check_disjoint, check_range, Result, StowageError};
use crate::memory::{next_capacity, DEFAULT_GROWTH_FACTOR};
use crate::value::Value;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::mem;

/// Floating-point type returned by [`Text::to_extended`]
///
/// Rust has no portable type wider than `f64`, so extended precision is
/// `f64` precision.
pub type Extended = f64;

/// Byte-wide string of UTF-8 code units
pub type NarrowString = Text<Narrow>;

/// String of 32-bit Unicode scalar units
pub type WideString = Text<Wide>;

/// Growable string parameterized over its character width
///
/// # Examples
///
/// ```rust
/// use stowage::NarrowString;
///
/// let mut s = NarrowString::from_str("Hello ctl world!");
/// s.remove_range(6, 4)?;
/// s.append_chr(b'!')?;
/// assert_eq!(s.to_std_string(), "Hello world!!");
///
/// assert_eq!(s.find_first_chr(b'o'), Some(4));
/// assert_eq!(s.find_last_str("!"), Some(12));
/// assert!(s.starts_with_str("Hello"));
/// # Ok::<(), stowage::StowageError>(())
/// ```
pub struct Text<W: CharWidth> {
    // invariant: never empty; the last unit is the terminator
    units: Vec<W::Unit>,
    growth_factor: f64,
    _width: PhantomData<W>,
}

impl<W: CharWidth> Text<W> {
    /// Create an empty string
    pub fn new() -> Self {
        Self {
            units: vec![W::TERMINATOR],
            growth_factor: DEFAULT_GROWTH_FACTOR,
            _width: PhantomData,
        }
    }

    /// Create an empty string with room for `capacity` units
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        let mut text = Self::new();
        text.reserve(capacity)?;
        Ok(text)
    }

    /// Create an empty string sized and grown according to `config`
    pub fn with_config(config: &ContainerConfig) -> Result<Self> {
        config.validate()?;
        let mut text = Self::new();
        text.growth_factor = config.growth_factor;
        text.reserve(config.string_initial_capacity)?;
        Ok(text)
    }

    /// Encode native text
    ///
    /// Like a C string, the content ends at the first NUL character; anything
    /// after it is dropped.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(text: &str) -> Self {
        let mut units = Vec::with_capacity(text.len() + 1);
        W::encode(text, &mut units);
        if let Some(end) = units.iter().position(|&u| u == W::TERMINATOR) {
            units.truncate(end);
        }
        units.push(W::TERMINATOR);
        Self {
            units,
            growth_factor: DEFAULT_GROWTH_FACTOR,
            _width: PhantomData,
        }
    }

    /// Copy raw code units
    ///
    /// Fails with [`StowageError::InvalidArgument`] if `units` contains the
    /// terminator.
    pub fn from_units(units: &[W::Unit]) -> Result<Self> {
        Self::check_content(units)?;
        Ok(Self::from_content(units))
    }

    // `units` must be free of terminators
    pub(crate) fn from_content(units: &[W::Unit]) -> Self {
        let mut owned = Vec::with_capacity(units.len() + 1);
        owned.extend_from_slice(units);
        owned.push(W::TERMINATOR);
        Self {
            units: owned,
            growth_factor: DEFAULT_GROWTH_FACTOR,
            _width: PhantomData,
        }
    }

    /// Convert from a narrow string
    pub fn from_narrow(other: &NarrowString) -> Self {
        Self::from_str(&other.to_std_string())
    }

    /// Convert from a wide string
    pub fn from_wide(other: &WideString) -> Self {
        Self::from_str(&other.to_std_string())
    }

    /// Read a string stored as a value of this width's text tag
    pub fn from_value(value: &Value) -> Result<Self> {
        if value.tag() != W::TAG {
            return Err(StowageError::invalid_argument(format!(
                "expected a {} value for a {} string, found {}",
                W::TAG,
                W::NAME,
                value.tag()
            )));
        }
        Ok(Self::from_content(&W::read_bytes(value.data())))
    }

    /// Store the string, terminator included, as a value
    pub fn to_value(&self) -> Value {
        let mut bytes = Vec::with_capacity(self.units.len() * mem::size_of::<W::Unit>());
        W::write_bytes(&self.units, &mut bytes);
        Value::from_vec(W::TAG, bytes)
    }

    /// Number of units, terminator excluded
    #[inline]
    pub fn len(&self) -> usize {
        self.units.len() - 1
    }

    /// Whether the string has no characters
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.units.len() == 1
    }

    /// Units that fit without reallocating, terminator slot excluded
    #[inline]
    pub fn capacity(&self) -> usize {
        self.units.capacity().saturating_sub(1)
    }

    /// The characters as code units
    #[inline]
    pub fn units(&self) -> &[W::Unit] {
        &self.units[..self.len()]
    }

    #[inline]
    fn units_mut(&mut self) -> &mut [W::Unit] {
        let len = self.len();
        &mut self.units[..len]
    }

    /// The characters followed by the terminator unit
    #[inline]
    pub fn units_with_terminator(&self) -> &[W::Unit] {
        &self.units
    }

    /// Unit at `index`
    pub fn unit_at(&self, index: usize) -> Result<W::Unit> {
        check_bounds(index, self.len())?;
        Ok(self.units[index])
    }

    /// Decode into a native string (lossy for invalid sequences)
    pub fn to_std_string(&self) -> String {
        W::decode(self.units())
    }

    /// Make room for `additional` more units, growing geometrically
    ///
    /// On failure the contents and capacity are unchanged.
    pub fn reserve(&mut self, additional: usize) -> Result<()> {
        let required = self
            .units
            .len()
            .checked_add(additional)
            .ok_or_else(|| StowageError::allocation_failure(usize::MAX))?;
        let capacity = self.units.capacity();
        if required <= capacity {
            return Ok(());
        }
        let target = next_capacity(capacity, required, self.growth_factor);
        log::debug!(
            "growing {} string from {} to {} units",
            W::NAME,
            capacity,
            target
        );
        self.units
            .try_reserve_exact(target - self.units.len())
            .map_err(|_| StowageError::allocation_failure(target.saturating_mul(mem::size_of::<W::Unit>())))
    }

    /// Replace `remove` units at `pos` with `insert`; the range is pre-checked
    fn splice(&mut self, pos: usize, remove: usize, insert: &[W::Unit]) -> Result<()> {
        if insert.len() > remove {
            self.reserve(insert.len() - remove)?;
        }
        self.units.splice(pos..pos + remove, insert.iter().copied());
        Ok(())
    }

    fn encoded(text: &str) -> Vec<W::Unit> {
        let mut units = Vec::with_capacity(text.len());
        W::encode(text, &mut units);
        units
    }

    /// Encode text headed for the buffer, rejecting embedded terminators
    fn encoded_content(text: &str) -> Result<Vec<W::Unit>> {
        let units = Self::encoded(text);
        Self::check_content(&units)?;
        Ok(units)
    }

    fn check_content(units: &[W::Unit]) -> Result<()> {
        match units.iter().position(|&u| u == W::TERMINATOR) {
            Some(at) => Err(StowageError::invalid_argument(format!(
                "terminator unit at offset {} cannot be stored in a {} string",
                at,
                W::NAME
            ))),
            None => Ok(()),
        }
    }

    fn check_insert_pos(&self, pos: usize) -> Result<()> {
        if pos > self.len() {
            return Err(StowageError::out_of_range(pos, self.len()));
        }
        Ok(())
    }

    // ---- editing ----

    /// Append one unit
    pub fn append_chr(&mut self, c: W::Unit) -> Result<()> {
        Self::check_content(&[c])?;
        self.splice(self.len(), 0, &[c])
    }

    /// Append native text
    pub fn append_str(&mut self, text: &str) -> Result<()> {
        self.splice(self.len(), 0, &Self::encoded_content(text)?)
    }

    /// Append raw units
    pub fn append_units(&mut self, units: &[W::Unit]) -> Result<()> {
        Self::check_content(units)?;
        self.splice(self.len(), 0, units)
    }

    /// Append another string of the same width
    pub fn append_text(&mut self, other: &Self) -> Result<()> {
        self.splice(self.len(), 0, other.units())
    }

    /// Insert one unit before position `pos` (`pos == len` appends)
    pub fn insert_chr(&mut self, pos: usize, c: W::Unit) -> Result<()> {
        self.check_insert_pos(pos)?;
        Self::check_content(&[c])?;
        self.splice(pos, 0, &[c])
    }

    /// Insert native text before position `pos`
    pub fn insert_str(&mut self, pos: usize, text: &str) -> Result<()> {
        self.check_insert_pos(pos)?;
        self.splice(pos, 0, &Self::encoded_content(text)?)
    }

    /// Insert another string before position `pos`
    pub fn insert_text(&mut self, pos: usize, other: &Self) -> Result<()> {
        self.check_insert_pos(pos)?;
        self.splice(pos, 0, other.units())
    }

    /// Remove `count` units starting at `pos`
    pub fn remove_range(&mut self, pos: usize, count: usize) -> Result<()> {
        check_range(pos, count, self.len())?;
        self.units.drain(pos..pos + count);
        Ok(())
    }

    /// Alias of [`Text::remove_range`]
    #[inline]
    pub fn erase(&mut self, pos: usize, count: usize) -> Result<()> {
        self.remove_range(pos, count)
    }

    /// Overwrite `count` units at `pos` with `repeat` copies of `c`
    ///
    /// The length changes by `repeat - count`.
    pub fn replace_chr(&mut self, pos: usize, count: usize, c: W::Unit, repeat: usize) -> Result<()> {
        check_range(pos, count, self.len())?;
        if repeat > 0 {
            Self::check_content(&[c])?;
        }
        self.splice(pos, count, &vec![c; repeat])
    }

    /// Overwrite `count` units at `pos` with native text
    pub fn replace_str(&mut self, pos: usize, count: usize, text: &str) -> Result<()> {
        check_range(pos, count, self.len())?;
        self.splice(pos, count, &Self::encoded_content(text)?)
    }

    /// Overwrite `count` units at `pos` with `src_len` units of `text`
    /// starting at `src_pos`
    pub fn replace_strex(
        &mut self,
        pos: usize,
        count: usize,
        text: &str,
        src_pos: usize,
        src_len: usize,
    ) -> Result<()> {
        check_range(pos, count, self.len())?;
        let source = Self::encoded(text);
        check_range(src_pos, src_len, source.len())?;
        let window = &source[src_pos..src_pos + src_len];
        Self::check_content(window)?;
        self.splice(pos, count, window)
    }

    /// Overwrite `count` units at `pos` with another string
    pub fn replace_text(&mut self, pos: usize, count: usize, other: &Self) -> Result<()> {
        check_range(pos, count, self.len())?;
        self.splice(pos, count, other.units())
    }

    /// Reverse the whole string in place
    pub fn reverse(&mut self) {
        self.units_mut().reverse();
    }

    /// Reverse `count` units starting at `pos`
    pub fn reverse_range(&mut self, pos: usize, count: usize) -> Result<()> {
        check_range(pos, count, self.len())?;
        self.units[pos..pos + count].reverse();
        Ok(())
    }

    /// Exchange two non-overlapping windows of `count` units
    pub fn swap_range(&mut self, pos_a: usize, pos_b: usize, count: usize) -> Result<()> {
        check_range(pos_a, count, self.len())?;
        check_range(pos_b, count, self.len())?;
        check_disjoint(pos_a, pos_b, count)?;
        let (lo, hi) = if pos_a < pos_b { (pos_a, pos_b) } else { (pos_b, pos_a) };
        let (left, right) = self.units_mut().split_at_mut(hi);
        left[lo..lo + count].swap_with_slice(&mut right[..count]);
        Ok(())
    }

    /// Remove every character, keeping the capacity
    pub fn clear(&mut self) {
        self.units.truncate(1);
        self.units[0] = W::TERMINATOR;
    }

    /// Replace the contents with native text
    pub fn assign_str(&mut self, text: &str) -> Result<()> {
        self.splice(0, self.len(), &Self::encoded_content(text)?)
    }

    /// Replace the contents with a copy of another string
    pub fn assign(&mut self, other: &Self) -> Result<()> {
        self.splice(0, self.len(), other.units())
    }

    // ---- derived construction ----

    /// New string holding `count` units starting at `pos`
    pub fn substr(&self, pos: usize, count: usize) -> Result<Self> {
        check_range(pos, count, self.len())?;
        let mut out = Self::from_content(&self.units[pos..pos + count]);
        out.growth_factor = self.growth_factor;
        Ok(out)
    }

    /// New string equal to `self` followed by `c`
    pub fn add_chr(&self, c: W::Unit) -> Result<Self> {
        let mut out = self.clone();
        out.append_chr(c)?;
        Ok(out)
    }

    /// New string equal to `self` followed by native text
    pub fn add_str(&self, text: &str) -> Result<Self> {
        let mut out = self.clone();
        out.append_str(text)?;
        Ok(out)
    }

    /// New string equal to `self` followed by `other`
    pub fn add_text(&self, other: &Self) -> Result<Self> {
        let mut out = self.clone();
        out.append_text(other)?;
        Ok(out)
    }

    // ---- queries ----

    /// Ordinal comparison of units
    pub fn compare(&self, other: &Self) -> Ordering {
        self.units().cmp(other.units())
    }

    /// Ordinal comparison against native text
    pub fn compare_str(&self, text: &str) -> Ordering {
        self.units().cmp(&Self::encoded(text)[..])
    }

    /// Whether unit `c` occurs
    pub fn contains_chr(&self, c: W::Unit) -> bool {
        self.units().contains(&c)
    }

    /// Whether native text occurs as a substring
    pub fn contains_str(&self, text: &str) -> bool {
        self.find_first_str(text).is_some()
    }

    /// Whether another string occurs as a substring
    pub fn contains_text(&self, other: &Self) -> bool {
        find_first(self.units(), other.units()).is_some()
    }

    /// Position of the first `c`
    pub fn find_first_chr(&self, c: W::Unit) -> Option<usize> {
        self.units().iter().position(|&u| u == c)
    }

    /// Position of the last `c`
    pub fn find_last_chr(&self, c: W::Unit) -> Option<usize> {
        self.units().iter().rposition(|&u| u == c)
    }

    /// Position of the first occurrence of native text
    pub fn find_first_str(&self, text: &str) -> Option<usize> {
        find_first(self.units(), &Self::encoded(text))
    }

    /// Position of the last occurrence of native text
    pub fn find_last_str(&self, text: &str) -> Option<usize> {
        find_last(self.units(), &Self::encoded(text))
    }

    /// Whether the first unit is `c`
    pub fn starts_with_chr(&self, c: W::Unit) -> bool {
        self.units().first() == Some(&c)
    }

    /// Whether the string starts with native text (case-sensitive)
    pub fn starts_with_str(&self, text: &str) -> bool {
        self.units().starts_with(&Self::encoded(text))
    }

    /// Whether the last unit is `c`
    pub fn ends_with_chr(&self, c: W::Unit) -> bool {
        self.units().last() == Some(&c)
    }

    /// Whether the string ends with native text (case-sensitive)
    pub fn ends_with_str(&self, text: &str) -> bool {
        self.units().ends_with(&Self::encoded(text))
    }

    // ---- numeric conversion ----

    fn parse_as<T: std::str::FromStr>(&self, target: &'static str) -> Result<T> {
        let content = self.to_std_string();
        content
            .trim()
            .parse()
            .map_err(|_| StowageError::parse_failure(content, target))
    }

    /// Parse the whole content (surrounding whitespace ignored) as `f64`
    pub fn to_f64(&self) -> Result<f64> {
        self.parse_as("f64")
    }

    /// Parse the whole content as an [`Extended`] float
    pub fn to_extended(&self) -> Result<Extended> {
        self.parse_as("extended float")
    }

    /// Parse the whole content as a signed integer
    pub fn to_i64(&self) -> Result<i64> {
        self.parse_as("i64")
    }

    /// Parse the whole content as an unsigned integer
    pub fn to_u64(&self) -> Result<u64> {
        self.parse_as("u64")
    }

    /// Format the shortest text that parses back to exactly `value`
    pub fn from_f64(value: f64) -> Self {
        Self::from_str(&format!("{:?}", value))
    }

    /// Format an [`Extended`] float; see [`Text::from_f64`]
    pub fn from_extended(value: Extended) -> Self {
        Self::from_f64(value)
    }

    /// Format a signed integer
    pub fn from_i64(value: i64) -> Self {
        Self::from_str(&value.to_string())
    }

    /// Format an unsigned integer
    pub fn from_u64(value: u64) -> Self {
        Self::from_str(&value.to_string())
    }

    // ---- splitting ----

    /// Split on every occurrence of unit `delimiter`
    ///
    /// Delimiters are consumed; empty segments (leading, trailing or between
    /// adjacent delimiters) are kept.
    pub fn create_splitter_chr(&self, delimiter: W::Unit) -> Result<Splitter<W>> {
        if delimiter == W::TERMINATOR {
            return Err(StowageError::invalid_argument("delimiter must not be the terminator unit"));
        }
        Splitter::from_segments(self.units().split(|&u| u == delimiter))
    }

    /// Split on every non-overlapping occurrence of native text `delimiter`
    ///
    /// Same segment policy as [`Text::create_splitter_chr`]; an empty
    /// delimiter is rejected.
    pub fn create_splitter_str(&self, delimiter: &str) -> Result<Splitter<W>> {
        let needle = Self::encoded(delimiter);
        if needle.is_empty() {
            return Err(StowageError::invalid_argument("delimiter must not be empty"));
        }
        let units = self.units();
        let mut segments = Vec::new();
        let (mut start, mut i) = (0, 0);
        while i + needle.len() <= units.len() {
            if units[i..i + needle.len()] == needle[..] {
                segments.push(&units[start..i]);
                i += needle.len();
                start = i;
            } else {
                i += 1;
            }
        }
        segments.push(&units[start..]);
        Splitter::from_segments(segments)
    }
}

fn find_first<U: PartialEq>(haystack: &[U], needle: &[U]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn find_last<U: PartialEq>(haystack: &[U], needle: &[U]) -> Option<usize> {
    if needle.is_empty() {
        return Some(haystack.len());
    }
    haystack.windows(needle.len()).rposition(|w| w == needle)
}

impl<W: CharWidth> Default for Text<W> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: CharWidth> Clone for Text<W> {
    fn clone(&self) -> Self {
        Self {
            units: self.units.clone(),
            growth_factor: self.growth_factor,
            _width: PhantomData,
        }
    }
}

impl<W: CharWidth> PartialEq for Text<W> {
    fn eq(&self, other: &Self) -> bool {
        self.units == other.units
    }
}

impl<W: CharWidth> Eq for Text<W> {}

impl<W: CharWidth> PartialOrd for Text<W> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<W: CharWidth> Ord for Text<W> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

impl<W: CharWidth> Hash for Text<W> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.units().hash(state);
    }
}

impl<W: CharWidth> From<&str> for Text<W> {
    fn from(text: &str) -> Self {
        Self::from_str(text)
    }
}

impl<W: CharWidth> fmt::Display for Text<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_std_string())
    }
}

impl<W: CharWidth> fmt::Debug for Text<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:?}", W::NAME, self.to_std_string())
    }
}

impl<W: CharWidth> From<Text<W>> for Value {
    fn from(text: Text<W>) -> Value {
        text.to_value()
    }
}
