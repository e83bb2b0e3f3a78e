//! Splitter results
//!
//! A [`Splitter`] owns the segments produced by
//! [`Text::create_splitter_chr`] and [`Text::create_splitter_str`]. Each
//! segment is stored in a [`GenericVector`] as a text value of the splitter's
//! width, terminator included, so the segments can be walked with the
//! vector's own accessors and cursor.

use super::text::Text;
use super::width::CharWidth;
use crate::containers::{GenericVector, GenericVectorCursor};
use crate::error::Result;
use crate::value::Value;
use std::marker::PhantomData;
use std::slice;

/// Ordered segments of a split string
///
/// # Examples
///
/// ```rust
/// use stowage::NarrowString;
///
/// let text = NarrowString::from_str("one, two,, three");
/// let parts = text.create_splitter_str(", ")?;
/// assert_eq!(parts.to_strings(), vec!["one", "two,", "three"]);
///
/// let parts = text.create_splitter_chr(b',')?;
/// assert_eq!(parts.len(), 4);
/// assert_eq!(parts.segment(2)?.to_std_string(), "");
/// parts.release();
/// # Ok::<(), stowage::StowageError>(())
/// ```
pub struct Splitter<W: CharWidth> {
    segments: GenericVector,
    _width: PhantomData<W>,
}

impl<W: CharWidth> Splitter<W> {
    pub(crate) fn from_segments<'a, I>(segments: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a [W::Unit]>,
    {
        let mut vector = GenericVector::new();
        for units in segments {
            vector.push_value(Text::<W>::from_content(units).to_value())?;
        }
        log::trace!("split {} string into {} segments", W::NAME, vector.len());
        Ok(Self {
            segments: vector,
            _width: PhantomData,
        })
    }

    /// Number of segments
    #[inline]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Whether there are no segments
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Borrow the stored value of segment `index`
    pub fn item_direct(&self, index: usize) -> Result<&Value> {
        self.segments.item_direct(index)
    }

    /// Copy segment `index` out as a string
    pub fn segment(&self, index: usize) -> Result<Text<W>> {
        Text::from_value(self.segments.item_direct(index)?)
    }

    /// Decode every segment into native strings
    pub fn to_strings(&self) -> Vec<String> {
        self.segments
            .iter()
            .map(|value| W::decode(&W::read_bytes(value.data())))
            .collect()
    }

    /// The underlying vector of segment values
    pub fn as_vector(&self) -> &GenericVector {
        &self.segments
    }

    /// Take ownership of the underlying vector
    pub fn into_vector(self) -> GenericVector {
        self.segments
    }

    /// Iterate over the segment values
    pub fn iter(&self) -> slice::Iter<'_, Value> {
        self.segments.iter()
    }

    /// Cursor over the segment values
    pub fn cursor(&mut self) -> GenericVectorCursor<'_> {
        self.segments.cursor()
    }

    /// Release the splitter and every segment it owns
    pub fn release(self) {
        log::trace!("releasing splitter of {} segments", self.segments.len());
        drop(self);
    }
}

impl<'a, W: CharWidth> IntoIterator for &'a Splitter<W> {
    type Item = &'a Value;
    type IntoIter = slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<W: CharWidth> std::fmt::Debug for Splitter<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.to_strings()).finish()
    }
}
