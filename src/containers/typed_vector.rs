//! TypedVector: homogeneous fixed-stride dynamic array
//!
//! Elements are opaque byte blobs of exactly `stride` bytes, copied in and out
//! by value. The vector never interprets element contents except through a
//! caller-supplied comparator for `sort` and `find`. Capacity grows
//! geometrically and never shrinks implicitly.

use super::cursor::{Cursor, CursorState, IndexWalk};
use crate::config::{Config, ContainerConfig};
use crate::error::{check_bounds, check_disjoint, check_range, Result, StowageError};
use crate::memory::{ContainerAllocator, RawBuf, SystemAllocator, DEFAULT_GROWTH_FACTOR};
use crate::value::Comparator;
use std::fmt;
use std::ptr;
use std::slice;

/// Fixed-stride vector of byte blobs
///
/// # Examples
///
/// ```rust
/// use stowage::TypedVector;
///
/// let mut vec = TypedVector::new(8)?;
/// for i in 0..10u64 {
///     vec.push_back(&i.to_ne_bytes())?;
/// }
/// vec.remove_range(2, 3)?;
/// assert_eq!(vec.len(), 7);
/// assert_eq!(vec.item_direct(2)?, &5u64.to_ne_bytes());
/// # Ok::<(), stowage::StowageError>(())
/// ```
pub struct TypedVector<A: ContainerAllocator = SystemAllocator> {
    buf: RawBuf<u8, A>,
    len: usize,
    stride: usize,
    growth_factor: f64,
}

impl TypedVector<SystemAllocator> {
    /// Create an empty vector of `stride`-byte elements
    pub fn new(stride: usize) -> Result<Self> {
        Self::new_in(stride, SystemAllocator)
    }

    /// Create a vector with room for `capacity` elements
    pub fn with_capacity(capacity: usize, stride: usize) -> Result<Self> {
        Self::with_capacity_in(capacity, stride, SystemAllocator)
    }

    /// Create a vector sized and grown according to `config`
    pub fn with_config(stride: usize, config: &ContainerConfig) -> Result<Self> {
        config.validate()?;
        let mut vec = Self::with_capacity_in(config.initial_capacity, stride, SystemAllocator)?;
        vec.growth_factor = config.growth_factor;
        Ok(vec)
    }
}

impl<A: ContainerAllocator> TypedVector<A> {
    /// Create an empty vector whose storage comes from `alloc`
    pub fn new_in(stride: usize, alloc: A) -> Result<Self> {
        if stride == 0 {
            return Err(StowageError::invalid_argument("element stride must be non-zero"));
        }
        log::trace!("creating typed vector with stride {}", stride);
        Ok(Self {
            buf: RawBuf::new_in(alloc),
            len: 0,
            stride,
            growth_factor: DEFAULT_GROWTH_FACTOR,
        })
    }

    /// Create a vector with room for `capacity` elements from `alloc`
    pub fn with_capacity_in(capacity: usize, stride: usize, alloc: A) -> Result<Self> {
        let mut vec = Self::new_in(stride, alloc)?;
        vec.grow_slots(capacity)?;
        Ok(vec)
    }

    /// Number of elements
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the vector holds no elements
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of elements that fit without growing
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buf.capacity() / self.stride
    }

    /// Size of every element in bytes
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// The allocator backing this vector
    pub fn allocator(&self) -> &A {
        self.buf.allocator()
    }

    /// All elements as one contiguous byte slice
    pub fn as_bytes(&self) -> &[u8] {
        if self.len == 0 {
            &[]
        } else {
            unsafe { slice::from_raw_parts(self.buf.as_ptr(), self.len * self.stride) }
        }
    }

    fn as_bytes_mut(&mut self) -> &mut [u8] {
        if self.len == 0 {
            &mut []
        } else {
            let bytes = self.len * self.stride;
            unsafe { slice::from_raw_parts_mut(self.buf.as_mut_ptr(), bytes) }
        }
    }

    #[inline]
    fn span(&self, index: usize) -> std::ops::Range<usize> {
        index * self.stride..(index + 1) * self.stride
    }

    fn check_elem(&self, elem: &[u8]) -> Result<()> {
        if elem.len() != self.stride {
            return Err(StowageError::invalid_argument(format!(
                "element of {} bytes does not match stride {}",
                elem.len(),
                self.stride
            )));
        }
        Ok(())
    }

    fn grow_slots(&mut self, slots: usize) -> Result<()> {
        let bytes = slots
            .checked_mul(self.stride)
            .ok_or_else(|| StowageError::allocation_failure(usize::MAX))?;
        self.buf.grow_exact(bytes)
    }

    fn reserve_slots(&mut self, required: usize) -> Result<()> {
        let capacity = self.capacity();
        if required <= capacity {
            return Ok(());
        }
        let target = crate::memory::next_capacity(capacity, required, self.growth_factor);
        log::debug!(
            "growing typed vector (stride {}) from {} to {} elements",
            self.stride,
            capacity,
            target
        );
        self.grow_slots(target)
    }

    /// Make room for at least `additional` more elements
    pub fn reserve(&mut self, additional: usize) -> Result<()> {
        let required = self
            .len
            .checked_add(additional)
            .ok_or_else(|| StowageError::allocation_failure(usize::MAX))?;
        self.reserve_slots(required)
    }

    /// Append one element, growing if full (amortized O(1))
    pub fn push_back(&mut self, elem: &[u8]) -> Result<()> {
        self.check_elem(elem)?;
        self.reserve_slots(self.len + 1)?;
        unsafe {
            ptr::copy_nonoverlapping(
                elem.as_ptr(),
                self.buf.slot_mut(self.len * self.stride),
                self.stride,
            );
        }
        self.len += 1;
        Ok(())
    }

    /// Remove the last element and return a copy of it
    pub fn pop_back(&mut self) -> Option<Vec<u8>> {
        if self.len == 0 {
            return None;
        }
        let last = self.as_bytes()[self.span(self.len - 1)].to_vec();
        self.len -= 1;
        Some(last)
    }

    /// Insert an element at `index` (`index == len` appends)
    pub fn insert(&mut self, index: usize, elem: &[u8]) -> Result<()> {
        if index > self.len {
            return Err(StowageError::out_of_range(index, self.len));
        }
        self.check_elem(elem)?;
        self.reserve_slots(self.len + 1)?;
        unsafe {
            let at = self.buf.slot_mut(index * self.stride);
            ptr::copy(at, at.add(self.stride), (self.len - index) * self.stride);
            ptr::copy_nonoverlapping(elem.as_ptr(), at, self.stride);
        }
        self.len += 1;
        Ok(())
    }

    /// Copy of the element at `index`
    pub fn item(&self, index: usize) -> Result<Vec<u8>> {
        self.item_direct(index).map(<[u8]>::to_vec)
    }

    /// Copy the element at `index` into `out` (which must be `stride` bytes)
    pub fn item_into(&self, index: usize, out: &mut [u8]) -> Result<()> {
        self.check_elem(out)?;
        out.copy_from_slice(self.item_direct(index)?);
        Ok(())
    }

    /// Borrow the element at `index`, valid until the next mutation
    pub fn item_direct(&self, index: usize) -> Result<&[u8]> {
        check_bounds(index, self.len)?;
        let span = self.span(index);
        Ok(&self.as_bytes()[span])
    }

    /// Mutably borrow the element at `index`
    pub fn item_direct_mut(&mut self, index: usize) -> Result<&mut [u8]> {
        check_bounds(index, self.len)?;
        let span = self.span(index);
        Ok(&mut self.as_bytes_mut()[span])
    }

    /// Overwrite the element at `index`
    pub fn set_item(&mut self, index: usize, elem: &[u8]) -> Result<()> {
        self.check_elem(elem)?;
        self.item_direct_mut(index)?.copy_from_slice(elem);
        Ok(())
    }

    /// Remove the element at `index`, shifting later elements left
    pub fn remove_item(&mut self, index: usize) -> Result<()> {
        check_bounds(index, self.len)?;
        self.remove_range(index, 1)
    }

    /// Remove `count` elements starting at `start`, shifting later elements
    /// left (O(n))
    pub fn remove_range(&mut self, start: usize, count: usize) -> Result<()> {
        check_range(start, count, self.len)?;
        if count == 0 {
            return Ok(());
        }
        let stride = self.stride;
        self.as_bytes_mut()
            .copy_within((start + count) * stride.., start * stride);
        self.len -= count;
        Ok(())
    }

    /// Exchange the elements at `a` and `b`
    pub fn swap(&mut self, a: usize, b: usize) -> Result<()> {
        check_bounds(a, self.len)?;
        check_bounds(b, self.len)?;
        if a != b {
            self.swap_range(a, b, 1)?;
        }
        Ok(())
    }

    /// Exchange two non-overlapping windows of `count` elements
    ///
    /// Applying the same call twice restores the original order.
    pub fn swap_range(&mut self, a: usize, b: usize, count: usize) -> Result<()> {
        check_range(a, count, self.len)?;
        check_range(b, count, self.len)?;
        check_disjoint(a, b, count)?;
        if count == 0 {
            return Ok(());
        }
        let stride = self.stride;
        let base = self.buf.as_mut_ptr();
        unsafe {
            ptr::swap_nonoverlapping(base.add(a * stride), base.add(b * stride), count * stride);
        }
        Ok(())
    }

    /// Reverse element order in place
    pub fn revert(&mut self) {
        let (stride, len) = (self.stride, self.len);
        let base = self.buf.as_mut_ptr();
        for i in 0..len / 2 {
            unsafe {
                ptr::swap_nonoverlapping(base.add(i * stride), base.add((len - 1 - i) * stride), stride);
            }
        }
    }

    /// Stable sort by `cmp`
    ///
    /// Elements that compare equal keep their relative order. The permuted
    /// elements are written to a fresh buffer, so an allocation failure leaves
    /// the vector unchanged.
    pub fn sort<C: Comparator<[u8]> + ?Sized>(&mut self, cmp: &C) -> Result<()> {
        if self.len < 2 {
            return Ok(());
        }
        let bytes = self.as_bytes();
        let stride = self.stride;
        let mut order: Vec<usize> = (0..self.len).collect();
        order.sort_by(|&l, &r| {
            cmp.compare(&bytes[l * stride..(l + 1) * stride], &bytes[r * stride..(r + 1) * stride])
        });

        let mut sorted = self.buf.sibling(self.buf.capacity())?;
        for (dst, &src) in order.iter().enumerate() {
            unsafe {
                ptr::copy_nonoverlapping(
                    self.buf.slot(src * stride),
                    sorted.slot_mut(dst * stride),
                    stride,
                );
            }
        }
        self.buf.swap_storage(&mut sorted);
        Ok(())
    }

    /// Index of the first element equal to `needle` under `cmp` (linear scan)
    pub fn find<C: Comparator<[u8]> + ?Sized>(&self, needle: &[u8], cmp: &C) -> Option<usize> {
        self.iter()
            .position(|elem| cmp.compare(elem, needle) == std::cmp::Ordering::Equal)
    }

    /// Deep copy sharing nothing with `self`
    pub fn try_clone(&self) -> Result<Self> {
        let mut buf = self.buf.sibling(self.len * self.stride)?;
        if self.len > 0 {
            unsafe {
                ptr::copy_nonoverlapping(self.buf.as_ptr(), buf.as_mut_ptr(), self.len * self.stride);
            }
        }
        Ok(Self {
            buf,
            len: self.len,
            stride: self.stride,
            growth_factor: self.growth_factor,
        })
    }

    /// Drop all elements, keeping the capacity
    #[inline]
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Iterate over elements as byte slices
    pub fn iter(&self) -> slice::ChunksExact<'_, u8> {
        self.as_bytes().chunks_exact(self.stride)
    }

    /// Cursor with in-place replacement
    pub fn cursor(&mut self) -> TypedVectorCursor<'_, A> {
        TypedVectorCursor {
            vec: self,
            walk: IndexWalk::new(),
        }
    }
}

impl<A: ContainerAllocator> fmt::Debug for TypedVector<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedVector")
            .field("len", &self.len)
            .field("capacity", &self.capacity())
            .field("stride", &self.stride)
            .finish()
    }
}

impl<A: ContainerAllocator> Drop for TypedVector<A> {
    fn drop(&mut self) {
        log::trace!("releasing typed vector of {} elements", self.len);
    }
}

impl<'a, A: ContainerAllocator> IntoIterator for &'a TypedVector<A> {
    type Item = &'a [u8];
    type IntoIter = slice::ChunksExact<'a, u8>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Cursor over a [`TypedVector`]
pub struct TypedVectorCursor<'a, A: ContainerAllocator = SystemAllocator> {
    vec: &'a mut TypedVector<A>,
    walk: IndexWalk,
}

impl<A: ContainerAllocator> Cursor for TypedVectorCursor<'_, A> {
    type Item = [u8];

    fn next(&mut self) -> bool {
        self.walk.advance(self.vec.len)
    }

    fn reset(&mut self) {
        self.walk.reset();
    }

    fn state(&self) -> CursorState {
        self.walk.state()
    }

    fn value(&self) -> Result<&[u8]> {
        self.vec.item_direct(self.walk.position()?)
    }

    fn replace_current(&mut self, replacement: &[u8]) -> Result<()> {
        let index = self.walk.position()?;
        self.vec.set_item(index, replacement)
    }
}
