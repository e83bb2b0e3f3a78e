//! TypedQueue: FIFO ring buffer of fixed-stride byte blobs
//!
//! Slots are addressed modulo the capacity from `head`. When the ring is full
//! a push either fails with [`StowageError::CapacityExceeded`] (auto-grow off)
//! or moves the contents into a larger buffer in FIFO order starting at slot 0
//! (auto-grow on).

use super::cursor::{Cursor, CursorState, IndexWalk};
use crate::config::{Config, ContainerConfig};
use crate::error::{check_bounds, Result, StowageError};
use crate::memory::{next_capacity, ContainerAllocator, RawBuf, SystemAllocator, DEFAULT_GROWTH_FACTOR};
use std::fmt;
use std::iter::Chain;
use std::ptr;
use std::slice::{self, ChunksExact};

/// Physical slot of logical position `offset` in a ring starting at `head`
#[inline]
pub(crate) fn ring_index(head: usize, offset: usize, capacity: usize) -> usize {
    let raw = head + offset;
    if raw >= capacity {
        raw - capacity
    } else {
        raw
    }
}

/// Ring-buffer queue of `stride`-byte elements
///
/// # Examples
///
/// ```rust
/// use stowage::{StowageError, TypedQueue};
///
/// let mut queue = TypedQueue::with_capacity(2, 4, false)?;
/// queue.push(&1u32.to_ne_bytes())?;
/// queue.push(&2u32.to_ne_bytes())?;
/// assert!(matches!(queue.push(&3u32.to_ne_bytes()), Err(StowageError::CapacityExceeded { .. })));
///
/// assert_eq!(queue.pop(), Some(1u32.to_ne_bytes().to_vec()));
/// queue.push(&3u32.to_ne_bytes())?;
/// assert_eq!(queue.item(1)?, 3u32.to_ne_bytes());
/// # Ok::<(), StowageError>(())
/// ```
pub struct TypedQueue<A: ContainerAllocator = SystemAllocator> {
    buf: RawBuf<u8, A>,
    stride: usize,
    slots: usize,
    head: usize,
    len: usize,
    auto_grow: bool,
    growth_factor: f64,
}

impl TypedQueue<SystemAllocator> {
    /// Create an empty auto-growing queue of `stride`-byte elements
    pub fn new(stride: usize) -> Result<Self> {
        Self::new_in(stride, true, SystemAllocator)
    }

    /// Create a queue with `capacity` slots and the given growth policy
    pub fn with_capacity(capacity: usize, stride: usize, auto_grow: bool) -> Result<Self> {
        Self::with_capacity_in(capacity, stride, auto_grow, SystemAllocator)
    }

    /// Create a queue sized, grown and policed according to `config`
    pub fn with_config(stride: usize, config: &ContainerConfig) -> Result<Self> {
        config.validate()?;
        let mut queue = Self::with_capacity_in(
            config.initial_capacity,
            stride,
            config.queue_auto_grow,
            SystemAllocator,
        )?;
        queue.growth_factor = config.growth_factor;
        Ok(queue)
    }
}

impl<A: ContainerAllocator> TypedQueue<A> {
    /// Create an empty queue whose ring comes from `alloc`
    pub fn new_in(stride: usize, auto_grow: bool, alloc: A) -> Result<Self> {
        if stride == 0 {
            return Err(StowageError::invalid_argument("element stride must be non-zero"));
        }
        log::trace!("creating typed queue with stride {}, auto-grow {}", stride, auto_grow);
        Ok(Self {
            buf: RawBuf::new_in(alloc),
            stride,
            slots: 0,
            head: 0,
            len: 0,
            auto_grow,
            growth_factor: DEFAULT_GROWTH_FACTOR,
        })
    }

    /// Create a queue with `capacity` slots from `alloc`
    pub fn with_capacity_in(capacity: usize, stride: usize, auto_grow: bool, alloc: A) -> Result<Self> {
        let mut queue = Self::new_in(stride, auto_grow, alloc)?;
        let bytes = capacity
            .checked_mul(stride)
            .ok_or_else(|| StowageError::allocation_failure(usize::MAX))?;
        queue.buf.grow_exact(bytes)?;
        queue.slots = capacity;
        Ok(queue)
    }

    /// Number of queued elements
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the queue is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of slots in the ring
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots
    }

    /// Whether every slot is occupied
    #[inline]
    pub fn is_full(&self) -> bool {
        self.len == self.slots
    }

    /// Element size in bytes
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Whether a push into a full ring grows it
    #[inline]
    pub fn auto_grow(&self) -> bool {
        self.auto_grow
    }

    /// Change the growth policy
    pub fn set_auto_grow(&mut self, auto_grow: bool) {
        self.auto_grow = auto_grow;
    }

    #[inline]
    fn slot_bytes(&self, physical: usize) -> &[u8] {
        unsafe { slice::from_raw_parts(self.buf.slot(physical * self.stride), self.stride) }
    }

    #[inline]
    fn slot_bytes_mut(&mut self, physical: usize) -> &mut [u8] {
        let stride = self.stride;
        unsafe { slice::from_raw_parts_mut(self.buf.slot_mut(physical * stride), stride) }
    }

    /// Move the contents into a ring of `new_slots` slots, head at slot 0
    fn grow_to(&mut self, new_slots: usize) -> Result<()> {
        let bytes = new_slots
            .checked_mul(self.stride)
            .ok_or_else(|| StowageError::allocation_failure(usize::MAX))?;
        let mut fresh = self.buf.sibling(bytes)?;

        let (first, second) = self.as_byte_slices();
        unsafe {
            let dst = fresh.as_mut_ptr();
            ptr::copy_nonoverlapping(first.as_ptr(), dst, first.len());
            ptr::copy_nonoverlapping(second.as_ptr(), dst.add(first.len()), second.len());
        }
        log::debug!(
            "growing typed queue from {} to {} slots, {} elements relinearized",
            self.slots,
            new_slots,
            self.len
        );
        self.buf.swap_storage(&mut fresh);
        self.slots = new_slots;
        self.head = 0;
        Ok(())
    }

    /// Enqueue a copy of `elem` at the tail
    pub fn push(&mut self, elem: &[u8]) -> Result<()> {
        if elem.len() != self.stride {
            return Err(StowageError::invalid_argument(format!(
                "element of {} bytes does not match stride {}",
                elem.len(),
                self.stride
            )));
        }
        if self.is_full() {
            if !self.auto_grow {
                return Err(StowageError::capacity_exceeded(self.slots));
            }
            self.grow_to(next_capacity(self.slots, self.len + 1, self.growth_factor))?;
        }
        let tail = ring_index(self.head, self.len, self.slots);
        self.slot_bytes_mut(tail).copy_from_slice(elem);
        self.len += 1;
        Ok(())
    }

    /// Dequeue the head element
    pub fn pop(&mut self) -> Option<Vec<u8>> {
        if self.len == 0 {
            return None;
        }
        let out = self.slot_bytes(self.head).to_vec();
        self.head = ring_index(self.head, 1, self.slots);
        self.len -= 1;
        Some(out)
    }

    /// Borrow the head element without consuming it
    pub fn front(&self) -> Option<&[u8]> {
        if self.len == 0 {
            None
        } else {
            Some(self.slot_bytes(self.head))
        }
    }

    /// Borrow the element at logical position `index` (0 is the head)
    pub fn item_direct(&self, index: usize) -> Result<&[u8]> {
        check_bounds(index, self.len)?;
        Ok(self.slot_bytes(ring_index(self.head, index, self.slots)))
    }

    /// Copy of the element at logical position `index`
    pub fn item(&self, index: usize) -> Result<Vec<u8>> {
        self.item_direct(index).map(<[u8]>::to_vec)
    }

    /// Overwrite the element at logical position `index`
    pub fn set_item(&mut self, index: usize, elem: &[u8]) -> Result<()> {
        check_bounds(index, self.len)?;
        if elem.len() != self.stride {
            return Err(StowageError::invalid_argument(format!(
                "element of {} bytes does not match stride {}",
                elem.len(),
                self.stride
            )));
        }
        let physical = ring_index(self.head, index, self.slots);
        self.slot_bytes_mut(physical).copy_from_slice(elem);
        Ok(())
    }

    /// Drop every element, keeping the ring
    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }

    /// The occupied bytes as the run up to the ring's end and the wrapped run
    pub fn as_byte_slices(&self) -> (&[u8], &[u8]) {
        if self.len == 0 {
            return (&[], &[]);
        }
        let first_len = self.len.min(self.slots - self.head);
        unsafe {
            let base = self.buf.as_ptr();
            let first = slice::from_raw_parts(base.add(self.head * self.stride), first_len * self.stride);
            let second = slice::from_raw_parts(base, (self.len - first_len) * self.stride);
            (first, second)
        }
    }

    /// Iterate from head to tail without consuming
    pub fn iter(&self) -> Chain<ChunksExact<'_, u8>, ChunksExact<'_, u8>> {
        let (first, second) = self.as_byte_slices();
        first
            .chunks_exact(self.stride)
            .chain(second.chunks_exact(self.stride))
    }

    /// Cursor with in-place replacement
    pub fn cursor(&mut self) -> TypedQueueCursor<'_, A> {
        TypedQueueCursor {
            queue: self,
            walk: IndexWalk::new(),
        }
    }
}

impl<A: ContainerAllocator> Drop for TypedQueue<A> {
    fn drop(&mut self) {
        log::trace!("releasing typed queue of {} elements", self.len);
    }
}

impl<A: ContainerAllocator> fmt::Debug for TypedQueue<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedQueue")
            .field("len", &self.len)
            .field("capacity", &self.slots)
            .field("stride", &self.stride)
            .field("auto_grow", &self.auto_grow)
            .finish()
    }
}

/// Cursor over a [`TypedQueue`], head to tail
pub struct TypedQueueCursor<'a, A: ContainerAllocator = SystemAllocator> {
    queue: &'a mut TypedQueue<A>,
    walk: IndexWalk,
}

impl<A: ContainerAllocator> Cursor for TypedQueueCursor<'_, A> {
    type Item = [u8];

    fn next(&mut self) -> bool {
        self.walk.advance(self.queue.len)
    }

    fn reset(&mut self) {
        self.walk.reset();
    }

    fn state(&self) -> CursorState {
        self.walk.state()
    }

    fn value(&self) -> Result<&[u8]> {
        self.queue.item_direct(self.walk.position()?)
    }

    fn replace_current(&mut self, replacement: &[u8]) -> Result<()> {
        let index = self.walk.position()?;
        self.queue.set_item(index, replacement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::TrackingAllocator;

    fn drain(queue: &mut TypedQueue<impl ContainerAllocator>) -> Vec<u32> {
        std::iter::from_fn(|| queue.pop())
            .map(|e| u32::from_ne_bytes(e.try_into().unwrap()))
            .collect()
    }

    #[test]
    fn test_ring_index() {
        assert_eq!(ring_index(0, 3, 4), 3);
        assert_eq!(ring_index(3, 1, 4), 0);
        assert_eq!(ring_index(2, 3, 4), 1);
    }

    #[test]
    fn test_fifo_order() {
        let mut queue = TypedQueue::new(4).unwrap();
        assert!(queue.pop().is_none());
        for i in 0..100u32 {
            queue.push(&i.to_ne_bytes()).unwrap();
        }
        assert_eq!(queue.len(), 100);
        assert_eq!(drain(&mut queue), (0..100).collect::<Vec<_>>());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_full_without_auto_grow() {
        let mut queue = TypedQueue::with_capacity(3, 4, false).unwrap();
        for i in 0..3u32 {
            queue.push(&i.to_ne_bytes()).unwrap();
        }
        assert!(queue.is_full());
        assert_eq!(
            queue.push(&9u32.to_ne_bytes()),
            Err(StowageError::capacity_exceeded(3))
        );
        assert_eq!(queue.capacity(), 3);
        assert_eq!(drain(&mut queue), vec![0, 1, 2]);
    }

    #[test]
    fn test_wrapped_growth_relinearizes() {
        let mut queue = TypedQueue::with_capacity(4, 4, true).unwrap();
        for i in 0..4u32 {
            queue.push(&i.to_ne_bytes()).unwrap();
        }
        queue.pop().unwrap();
        queue.pop().unwrap();
        queue.push(&4u32.to_ne_bytes()).unwrap();
        queue.push(&5u32.to_ne_bytes()).unwrap();
        // ring is full and wrapped: [4, 5, 2, 3] with head at 2
        assert_eq!(queue.as_byte_slices().1.len(), 8);

        queue.push(&6u32.to_ne_bytes()).unwrap();
        assert_eq!(queue.capacity(), 8);
        assert_eq!(queue.as_byte_slices().1.len(), 0);
        assert_eq!(queue.item(0).unwrap(), 2u32.to_ne_bytes());
        assert_eq!(drain(&mut queue), vec![2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_item_is_modular_and_non_consuming() {
        let mut queue = TypedQueue::with_capacity(4, 4, false).unwrap();
        for i in 0..4u32 {
            queue.push(&i.to_ne_bytes()).unwrap();
        }
        queue.pop().unwrap();
        queue.push(&10u32.to_ne_bytes()).unwrap();
        assert_eq!(queue.item(3).unwrap(), 10u32.to_ne_bytes());
        assert_eq!(queue.front().unwrap(), &1u32.to_ne_bytes());
        assert!(queue.item(4).is_err());
        assert_eq!(queue.len(), 4);

        let seen: Vec<u32> = queue
            .iter()
            .map(|e| u32::from_ne_bytes(e.try_into().unwrap()))
            .collect();
        assert_eq!(seen, vec![1, 2, 3, 10]);
    }

    #[test]
    fn test_cursor_replace() {
        let mut queue = TypedQueue::with_capacity(2, 4, true).unwrap();
        for i in 0..3u32 {
            queue.push(&i.to_ne_bytes()).unwrap();
        }
        let mut cursor = queue.cursor();
        assert!(cursor.next());
        assert!(cursor.next());
        cursor.replace_current(&7u32.to_ne_bytes()).unwrap();
        assert!(cursor.replace_current(&[1, 2]).is_err());
        assert!(cursor.next());
        assert!(!cursor.next());
        drop(cursor);
        assert_eq!(drain(&mut queue), vec![0, 7, 2]);
    }

    #[test]
    fn test_failed_growth_keeps_contents() {
        let tracker = TrackingAllocator::with_byte_limit(16 + 24);
        let mut queue = TypedQueue::with_capacity_in(4, 4, true, tracker.clone()).unwrap();
        for i in 0..4u32 {
            queue.push(&i.to_ne_bytes()).unwrap();
        }
        let err = queue.push(&4u32.to_ne_bytes()).unwrap_err();
        assert_eq!(err.category(), "memory");
        assert_eq!(queue.capacity(), 4);
        assert_eq!(drain(&mut queue), vec![0, 1, 2, 3]);
        drop(queue);
        assert_eq!(tracker.stats().live_bytes, 0);
    }

    #[test]
    fn test_zero_capacity_fixed_queue() {
        let mut queue = TypedQueue::with_capacity(0, 1, false).unwrap();
        assert!(queue.is_full());
        assert!(matches!(queue.push(&[1]), Err(StowageError::CapacityExceeded { capacity: 0 })));
        queue.set_auto_grow(true);
        queue.push(&[1]).unwrap();
        assert_eq!(queue.capacity(), 4);
    }
}
