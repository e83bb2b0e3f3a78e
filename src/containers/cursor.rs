//! Cursor protocol shared by every container
//!
//! A cursor holds an exclusive borrow of its container for as long as it
//! lives, so the only mutation possible during a traversal is the cursor's own
//! in-place replacement. The state machine is:
//!
//! ```text
//! BeforeFirst --next--> Positioned --next--> Positioned | Exhausted
//! Positioned | Exhausted --reset--> BeforeFirst
//! ```
//!
//! Exhausted is terminal until `reset`. Reading or replacing through a cursor
//! that is not positioned reports [`StowageError::CursorNotPositioned`].
//!
//! [`StowageError::CursorNotPositioned`]: crate::error::StowageError::CursorNotPositioned

use crate::error::{Result, StowageError};

/// Where a cursor stands in its traversal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    /// Created or reset; `next` has not been called since
    BeforeFirst,
    /// Referencing a live element
    Positioned,
    /// Walked past the last element
    Exhausted,
}

impl CursorState {
    /// Fail unless positioned on an element
    #[inline]
    pub fn ensure_positioned(self) -> Result<()> {
        match self {
            Self::Positioned => Ok(()),
            Self::BeforeFirst | Self::Exhausted => Err(StowageError::CursorNotPositioned),
        }
    }
}

/// Uniform traversal over a container
///
/// # Examples
///
/// ```rust
/// use stowage::{Cursor, GenericVector, TypeTag, Value};
///
/// let mut vec = GenericVector::new();
/// for i in 0..4u64 {
///     vec.push_value(Value::from_u64(i))?;
/// }
///
/// let mut cursor = vec.cursor();
/// while cursor.next() {
///     let doubled = cursor.value()?.as_u64()? * 2;
///     cursor.replace_current(&Value::from_u64(doubled))?;
/// }
/// drop(cursor);
///
/// assert_eq!(vec.item(3)?.as_u64()?, 6);
/// # Ok::<(), stowage::StowageError>(())
/// ```
pub trait Cursor {
    /// The element type observed through the cursor
    type Item: ?Sized;

    /// Advance; `false` means the end was reached (terminal until `reset`)
    fn next(&mut self) -> bool;

    /// Return to the before-first state
    fn reset(&mut self);

    /// Current traversal state
    fn state(&self) -> CursorState;

    /// The element the cursor references
    fn value(&self) -> Result<&Self::Item>;

    /// Overwrite the referenced element in place without moving the cursor
    fn replace_current(&mut self, replacement: &Self::Item) -> Result<()>;
}

/// Index-walking state shared by the array-backed cursors
#[derive(Debug, Clone, Copy)]
pub(crate) struct IndexWalk {
    state: CursorState,
    index: usize,
}

impl IndexWalk {
    pub(crate) fn new() -> Self {
        Self {
            state: CursorState::BeforeFirst,
            index: 0,
        }
    }

    /// Advance over `len` logical positions
    pub(crate) fn advance(&mut self, len: usize) -> bool {
        let candidate = match self.state {
            CursorState::BeforeFirst => 0,
            CursorState::Positioned => self.index + 1,
            CursorState::Exhausted => return false,
        };
        if candidate < len {
            self.index = candidate;
            self.state = CursorState::Positioned;
            true
        } else {
            self.state = CursorState::Exhausted;
            false
        }
    }

    pub(crate) fn reset(&mut self) {
        self.state = CursorState::BeforeFirst;
        self.index = 0;
    }

    pub(crate) fn state(&self) -> CursorState {
        self.state
    }

    /// The current logical index, if positioned
    pub(crate) fn position(&self) -> Result<usize> {
        self.state.ensure_positioned()?;
        Ok(self.index)
    }
}
