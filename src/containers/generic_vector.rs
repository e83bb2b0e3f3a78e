//! GenericVector: heterogeneous dynamic array of [`Value`]s
//!
//! Same shape as [`TypedVector`](super::TypedVector) but every slot owns a
//! tagged payload, so removing or replacing an element releases the old
//! payload. Comparators see whole values, tags included.

use super::cursor::{Cursor, CursorState, IndexWalk};
use crate::config::{Config, ContainerConfig};
use crate::error::{check_bounds, check_disjoint, check_range, Result, StowageError};
use crate::memory::{ContainerAllocator, RawBuf, SystemAllocator, DEFAULT_GROWTH_FACTOR};
use crate::value::{Comparator, RawComparator, TypeTag, Value};
use std::cmp::Ordering;
use std::fmt;
use std::ptr;
use std::slice;

/// Dynamic array of tagged values
///
/// # Examples
///
/// ```rust
/// use stowage::{GenericVector, TypeTag, Value};
///
/// let mut vec = GenericVector::new();
/// vec.push_value(Value::from_str("zulu"))?;
/// vec.push_value(Value::from_str("alpha"))?;
/// vec.push_back(TypeTag::CharPtr, b"mike\0")?;
///
/// vec.sort()?;
/// assert_eq!(vec.item_direct(0)?.as_c_str()?, "alpha");
/// assert_eq!(vec.find_item(b"mike\0", TypeTag::CharPtr, &stowage::RawComparator), Some(1));
/// # Ok::<(), stowage::StowageError>(())
/// ```
pub struct GenericVector<A: ContainerAllocator = SystemAllocator> {
    buf: RawBuf<Value, A>,
    len: usize,
    growth_factor: f64,
}

impl GenericVector<SystemAllocator> {
    /// Create an empty vector backed by the system allocator
    pub fn new() -> Self {
        Self::new_in(SystemAllocator)
    }

    /// Create a vector with room for `capacity` values
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        Self::with_capacity_in(capacity, SystemAllocator)
    }

    /// Create a vector sized and grown according to `config`
    pub fn with_config(config: &ContainerConfig) -> Result<Self> {
        config.validate()?;
        let mut vec = Self::with_capacity_in(config.initial_capacity, SystemAllocator)?;
        vec.growth_factor = config.growth_factor;
        Ok(vec)
    }
}

impl Default for GenericVector<SystemAllocator> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: ContainerAllocator> GenericVector<A> {
    /// Create an empty vector whose slot array comes from `alloc`
    pub fn new_in(alloc: A) -> Self {
        log::trace!("creating generic vector");
        Self {
            buf: RawBuf::new_in(alloc),
            len: 0,
            growth_factor: DEFAULT_GROWTH_FACTOR,
        }
    }

    /// Create a vector with room for `capacity` values from `alloc`
    pub fn with_capacity_in(capacity: usize, alloc: A) -> Result<Self> {
        let mut vec = Self::new_in(alloc);
        vec.buf.grow_exact(capacity)?;
        Ok(vec)
    }

    /// Number of values
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the vector holds no values
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of values that fit without growing
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    /// The allocator backing the slot array
    pub fn allocator(&self) -> &A {
        self.buf.allocator()
    }

    /// The live values as a slice
    pub fn as_slice(&self) -> &[Value] {
        if self.len == 0 {
            &[]
        } else {
            unsafe { slice::from_raw_parts(self.buf.as_ptr(), self.len) }
        }
    }

    fn as_mut_slice(&mut self) -> &mut [Value] {
        if self.len == 0 {
            &mut []
        } else {
            unsafe { slice::from_raw_parts_mut(self.buf.as_mut_ptr(), self.len) }
        }
    }

    /// Make room for at least `additional` more values
    pub fn reserve(&mut self, additional: usize) -> Result<()> {
        let required = self
            .len
            .checked_add(additional)
            .ok_or_else(|| StowageError::allocation_failure(usize::MAX))?;
        self.buf.reserve_for(required, self.growth_factor)
    }

    /// Deep-copy `bytes` under `tag` and append it
    pub fn push_back(&mut self, tag: TypeTag, bytes: &[u8]) -> Result<()> {
        self.push_value(Value::new(tag, bytes))
    }

    /// Append an owned value
    pub fn push_value(&mut self, value: Value) -> Result<()> {
        self.reserve(1)?;
        unsafe { self.buf.slot_mut(self.len).write(value) };
        self.len += 1;
        Ok(())
    }

    /// Remove and return the last value
    pub fn pop_back(&mut self) -> Option<Value> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        Some(unsafe { self.buf.slot(self.len).read() })
    }

    /// Insert a value at `index` (`index == len` appends)
    pub fn insert(&mut self, index: usize, tag: TypeTag, bytes: &[u8]) -> Result<()> {
        self.insert_value(index, Value::new(tag, bytes))
    }

    /// Insert an owned value at `index`
    pub fn insert_value(&mut self, index: usize, value: Value) -> Result<()> {
        if index > self.len {
            return Err(StowageError::out_of_range(index, self.len));
        }
        self.reserve(1)?;
        unsafe {
            let at = self.buf.slot_mut(index);
            ptr::copy(at, at.add(1), self.len - index);
            at.write(value);
        }
        self.len += 1;
        Ok(())
    }

    /// Copy of the value at `index`
    pub fn item(&self, index: usize) -> Result<Value> {
        self.item_direct(index).cloned()
    }

    /// Borrow the value at `index`, valid until the next mutation
    pub fn item_direct(&self, index: usize) -> Result<&Value> {
        check_bounds(index, self.len)?;
        Ok(&self.as_slice()[index])
    }

    /// Mutably borrow the value at `index`
    pub fn item_direct_mut(&mut self, index: usize) -> Result<&mut Value> {
        check_bounds(index, self.len)?;
        Ok(&mut self.as_mut_slice()[index])
    }

    /// Overwrite the value at `index` and rebind its tag
    pub fn replace_item(&mut self, index: usize, tag: TypeTag, bytes: &[u8]) -> Result<()> {
        self.item_direct_mut(index)?.rebind(tag, bytes);
        Ok(())
    }

    /// Remove the value at `index`, releasing its payload
    pub fn remove_item(&mut self, index: usize) -> Result<()> {
        check_bounds(index, self.len)?;
        self.remove_range(index, 1)
    }

    /// Remove `count` values starting at `start`, shifting later values left
    pub fn remove_range(&mut self, start: usize, count: usize) -> Result<()> {
        check_range(start, count, self.len)?;
        if count == 0 {
            return Ok(());
        }
        let tail = self.len - start - count;
        unsafe {
            let at = self.buf.slot_mut(start);
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(at, count));
            ptr::copy(at.add(count), at, tail);
        }
        self.len -= count;
        Ok(())
    }

    /// Exchange the values at `a` and `b`
    pub fn swap(&mut self, a: usize, b: usize) -> Result<()> {
        check_bounds(a, self.len)?;
        check_bounds(b, self.len)?;
        self.as_mut_slice().swap(a, b);
        Ok(())
    }

    /// Exchange two non-overlapping windows of `count` values
    pub fn swap_range(&mut self, a: usize, b: usize, count: usize) -> Result<()> {
        check_range(a, count, self.len)?;
        check_range(b, count, self.len)?;
        check_disjoint(a, b, count)?;
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        let (left, right) = self.as_mut_slice().split_at_mut(hi);
        left[lo..lo + count].swap_with_slice(&mut right[..count]);
        Ok(())
    }

    /// Reverse value order in place
    pub fn revert(&mut self) {
        self.as_mut_slice().reverse();
    }

    /// Stable sort using the default [`RawComparator`]
    pub fn sort(&mut self) -> Result<()> {
        self.sort_by(&RawComparator)
    }

    /// Stable sort by `cmp`
    pub fn sort_by<C: Comparator<Value> + ?Sized>(&mut self, cmp: &C) -> Result<()> {
        self.as_mut_slice().sort_by(|l, r| cmp.compare(l, r));
        Ok(())
    }

    /// Index of the first value equal to `needle` under `cmp`
    pub fn find<C: Comparator<Value> + ?Sized>(&self, needle: &Value, cmp: &C) -> Option<usize> {
        self.iter()
            .position(|value| cmp.compare(value, needle) == Ordering::Equal)
    }

    /// Index of the first value equal to `(tag, bytes)` under `cmp` (linear scan)
    pub fn find_item<C: Comparator<Value> + ?Sized>(
        &self,
        bytes: &[u8],
        tag: TypeTag,
        cmp: &C,
    ) -> Option<usize> {
        self.find(&Value::new(tag, bytes), cmp)
    }

    /// Deep copy sharing nothing with `self`
    pub fn try_clone(&self) -> Result<Self> {
        let mut copy = Self {
            buf: self.buf.sibling(self.len)?,
            len: 0,
            growth_factor: self.growth_factor,
        };
        for value in self.iter() {
            unsafe { copy.buf.slot_mut(copy.len).write(value.clone()) };
            copy.len += 1;
        }
        Ok(copy)
    }

    /// Release every value, keeping the capacity
    pub fn clear(&mut self) {
        let live = self.len;
        self.len = 0;
        if live > 0 {
            unsafe {
                ptr::drop_in_place(ptr::slice_from_raw_parts_mut(self.buf.as_mut_ptr(), live));
            }
        }
    }

    /// Iterate over the values
    pub fn iter(&self) -> slice::Iter<'_, Value> {
        self.as_slice().iter()
    }

    /// Cursor with in-place replacement
    pub fn cursor(&mut self) -> GenericVectorCursor<'_, A> {
        GenericVectorCursor {
            vec: self,
            walk: IndexWalk::new(),
        }
    }
}

impl<A: ContainerAllocator> Drop for GenericVector<A> {
    fn drop(&mut self) {
        log::trace!("releasing generic vector of {} values", self.len);
        self.clear();
    }
}

impl<A: ContainerAllocator> fmt::Debug for GenericVector<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<'a, A: ContainerAllocator> IntoIterator for &'a GenericVector<A> {
    type Item = &'a Value;
    type IntoIter = slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Cursor over a [`GenericVector`]
pub struct GenericVectorCursor<'a, A: ContainerAllocator = SystemAllocator> {
    vec: &'a mut GenericVector<A>,
    walk: IndexWalk,
}

impl<A: ContainerAllocator> GenericVectorCursor<'_, A> {
    /// Overwrite the current value from raw bytes, rebinding its tag
    pub fn replace_item(&mut self, tag: TypeTag, bytes: &[u8]) -> Result<()> {
        let index = self.walk.position()?;
        self.vec.replace_item(index, tag, bytes)
    }

    /// Index of the current value
    pub fn index(&self) -> Result<usize> {
        self.walk.position()
    }
}

impl<A: ContainerAllocator> Cursor for GenericVectorCursor<'_, A> {
    type Item = Value;

    fn next(&mut self) -> bool {
        self.walk.advance(self.vec.len)
    }

    fn reset(&mut self) {
        self.walk.reset();
    }

    fn state(&self) -> CursorState {
        self.walk.state()
    }

    fn value(&self) -> Result<&Value> {
        self.vec.item_direct(self.walk.position()?)
    }

    fn replace_current(&mut self, replacement: &Value) -> Result<()> {
        let index = self.walk.position()?;
        *self.vec.item_direct_mut(index)? = replacement.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::TrackingAllocator;
    use crate::value::Reverse;

    fn numbers(n: u64) -> GenericVector {
        let mut vec = GenericVector::new();
        for i in 0..n {
            vec.push_value(Value::from_u64(i)).unwrap();
        }
        vec
    }

    fn as_u64s(vec: &GenericVector) -> Vec<u64> {
        vec.iter().map(|v| v.as_u64().unwrap()).collect()
    }

    #[test]
    fn test_mixed_tags() {
        let mut vec = GenericVector::new();
        vec.push_back(TypeTag::Int32, &(-5i32).to_ne_bytes()).unwrap();
        vec.push_value(Value::from_str("text")).unwrap();
        vec.push_value(Value::from_f64(2.5)).unwrap();

        assert_eq!(vec.len(), 3);
        assert_eq!(vec.item(0).unwrap().as_i32().unwrap(), -5);
        assert_eq!(vec.item_direct(1).unwrap().as_c_str().unwrap(), "text");
        assert_eq!(vec.item_direct(2).unwrap().tag(), TypeTag::Float64);
        assert_eq!(vec.item(3), Err(StowageError::out_of_range(3, 3)));
    }

    #[test]
    fn test_replace_rebinds_tag() {
        let mut vec = numbers(3);
        vec.replace_item(1, TypeTag::CharPtr, b"one\0").unwrap();
        let (tag, data, size) = vec.item_direct(1).unwrap().parts();
        assert_eq!(tag, TypeTag::CharPtr);
        assert_eq!(data, b"one\0");
        assert_eq!(size, 4);
        assert!(vec.replace_item(3, TypeTag::Blob, &[]).is_err());
    }

    #[test]
    fn test_insert_remove() {
        let mut vec = numbers(5);
        vec.insert(0, TypeTag::UInt64, &100u64.to_ne_bytes()).unwrap();
        vec.insert(6, TypeTag::UInt64, &200u64.to_ne_bytes()).unwrap();
        assert_eq!(as_u64s(&vec), vec![100, 0, 1, 2, 3, 4, 200]);

        vec.remove_range(1, 3).unwrap();
        assert_eq!(as_u64s(&vec), vec![100, 3, 4, 200]);
        vec.remove_item(3).unwrap();
        assert_eq!(as_u64s(&vec), vec![100, 3, 4]);
        assert!(vec.remove_range(2, 2).is_err());
        assert_eq!(vec.pop_back().unwrap().as_u64().unwrap(), 4);
    }

    #[test]
    fn test_swap_and_revert() {
        let mut vec = numbers(6);
        vec.swap_range(4, 0, 2).unwrap();
        assert_eq!(as_u64s(&vec), vec![4, 5, 2, 3, 0, 1]);
        vec.swap_range(4, 0, 2).unwrap();
        assert_eq!(as_u64s(&vec), vec![0, 1, 2, 3, 4, 5]);
        assert!(vec.swap_range(0, 1, 2).is_err());

        vec.swap(0, 5).unwrap();
        vec.revert();
        assert_eq!(as_u64s(&vec), vec![0, 4, 3, 2, 1, 5]);
    }

    #[test]
    fn test_sort_default_and_custom() {
        let mut vec = GenericVector::new();
        for word in ["delta", "alpha", "charlie", "bravo"] {
            vec.push_value(Value::from_str(word)).unwrap();
        }
        vec.sort().unwrap();
        let words: Vec<&str> = vec.iter().map(|v| v.as_c_str().unwrap()).collect();
        assert_eq!(words, ["alpha", "bravo", "charlie", "delta"]);

        vec.sort_by(&Reverse(RawComparator)).unwrap();
        assert_eq!(vec.item_direct(0).unwrap().as_c_str().unwrap(), "delta");

        let by_size = |l: &Value, r: &Value| l.size().cmp(&r.size());
        vec.sort_by(&by_size).unwrap();
        let words: Vec<&str> = vec.iter().map(|v| v.as_c_str().unwrap()).collect();
        // equal sizes keep their previous (reversed) order
        assert_eq!(words, ["delta", "bravo", "alpha", "charlie"]);
    }

    #[test]
    fn test_find_item() {
        let vec = numbers(10);
        let cmp = RawComparator;
        assert_eq!(vec.find_item(&7u64.to_ne_bytes(), TypeTag::UInt64, &cmp), Some(7));
        assert_eq!(vec.find_item(&7u64.to_ne_bytes(), TypeTag::Int64, &cmp), None);
        assert_eq!(vec.find(&Value::from_u64(42), &cmp), None);
    }

    #[test]
    fn test_clone_is_independent() {
        let mut vec = numbers(4);
        let mut copy = vec.try_clone().unwrap();
        copy.replace_item(0, TypeTag::UInt64, &9u64.to_ne_bytes()).unwrap();
        vec.remove_item(3).unwrap();
        assert_eq!(as_u64s(&vec), vec![0, 1, 2]);
        assert_eq!(as_u64s(&copy), vec![9, 1, 2, 3]);
    }

    #[test]
    fn test_cursor_replace_then_reset() {
        let mut vec = numbers(5);
        let mut cursor = vec.cursor();
        while cursor.next() {
            if cursor.index().unwrap() == 2 {
                cursor.replace_item(TypeTag::CharPtr, b"two\0").unwrap();
            }
        }
        assert!(cursor.value().is_err());

        cursor.reset();
        let mut text_seen = 0;
        while cursor.next() {
            if cursor.value().unwrap().tag() == TypeTag::CharPtr {
                text_seen += 1;
            }
        }
        assert_eq!(text_seen, 1);
    }

    #[test]
    fn test_teardown_releases_slots() {
        let tracker = TrackingAllocator::new();
        {
            let mut vec = GenericVector::new_in(tracker.clone());
            for i in 0..100u32 {
                vec.push_back(TypeTag::UInt32, &i.to_ne_bytes()).unwrap();
            }
            vec.clear();
            assert!(vec.is_empty());
            assert!(vec.capacity() >= 100);
        }
        assert_eq!(tracker.stats().live_bytes, 0);
        assert_eq!(tracker.stats().live_blocks(), 0);
    }
}
