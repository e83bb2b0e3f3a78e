//! GenericQueue: FIFO ring buffer of tagged [`Value`]s
//!
//! Shares the ring arithmetic and growth policy of
//! [`TypedQueue`](super::TypedQueue); slots own their payloads instead of
//! holding fixed-stride blobs.

use super::cursor::{Cursor, CursorState, IndexWalk};
use super::typed_queue::ring_index;
use crate::config::{Config, ContainerConfig};
use crate::error::{check_bounds, Result, StowageError};
use crate::memory::{next_capacity, ContainerAllocator, RawBuf, SystemAllocator, DEFAULT_GROWTH_FACTOR};
use crate::value::{TypeTag, Value};
use std::fmt;
use std::iter::Chain;
use std::ptr;
use std::slice;

/// Ring-buffer queue of tagged values
///
/// # Examples
///
/// ```rust
/// use stowage::{GenericQueue, TypeTag, Value};
///
/// let mut queue = GenericQueue::new();
/// queue.push(TypeTag::CharPtr, b"first\0")?;
/// queue.push_value(Value::from_f64(2.0))?;
///
/// assert_eq!(queue.item(1)?.as_f64()?, 2.0);
/// assert_eq!(queue.pop().map(|v| v.tag()), Some(TypeTag::CharPtr));
/// assert_eq!(queue.len(), 1);
/// # Ok::<(), stowage::StowageError>(())
/// ```
pub struct GenericQueue<A: ContainerAllocator = SystemAllocator> {
    buf: RawBuf<Value, A>,
    head: usize,
    len: usize,
    auto_grow: bool,
    growth_factor: f64,
}

impl GenericQueue<SystemAllocator> {
    /// Create an empty auto-growing queue
    pub fn new() -> Self {
        Self::new_in(true, SystemAllocator)
    }

    /// Create a queue with `capacity` slots and the given growth policy
    pub fn with_capacity(capacity: usize, auto_grow: bool) -> Result<Self> {
        Self::with_capacity_in(capacity, auto_grow, SystemAllocator)
    }

    /// Create a queue sized, grown and policed according to `config`
    pub fn with_config(config: &ContainerConfig) -> Result<Self> {
        config.validate()?;
        let mut queue =
            Self::with_capacity_in(config.initial_capacity, config.queue_auto_grow, SystemAllocator)?;
        queue.growth_factor = config.growth_factor;
        Ok(queue)
    }
}

impl Default for GenericQueue<SystemAllocator> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: ContainerAllocator> GenericQueue<A> {
    /// Create an empty queue whose ring comes from `alloc`
    pub fn new_in(auto_grow: bool, alloc: A) -> Self {
        log::trace!("creating generic queue, auto-grow {}", auto_grow);
        Self {
            buf: RawBuf::new_in(alloc),
            head: 0,
            len: 0,
            auto_grow,
            growth_factor: DEFAULT_GROWTH_FACTOR,
        }
    }

    /// Create a queue with `capacity` slots from `alloc`
    pub fn with_capacity_in(capacity: usize, auto_grow: bool, alloc: A) -> Result<Self> {
        let mut queue = Self::new_in(auto_grow, alloc);
        queue.buf.grow_exact(capacity)?;
        Ok(queue)
    }

    /// Number of queued values
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
        self.buf.capacity()
    }

    /// Whether every slot is occupied
    #[inline]
    pub fn is_full(&self) -> bool {
        self.len == self.buf.capacity()
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

    fn grow_to(&mut self, new_cap: usize) -> Result<()> {
        let mut fresh = self.buf.sibling(new_cap)?;
        let (first, second) = self.as_slices();
        unsafe {
            let dst = fresh.as_mut_ptr();
            ptr::copy_nonoverlapping(first.as_ptr(), dst, first.len());
            ptr::copy_nonoverlapping(second.as_ptr(), dst.add(first.len()), second.len());
        }
        log::debug!(
            "growing generic queue from {} to {} slots, {} values relinearized",
            self.buf.capacity(),
            new_cap,
            self.len
        );
        // values were moved bitwise; the old block is released without drops
        self.buf.swap_storage(&mut fresh);
        self.head = 0;
        Ok(())
    }

    /// Enqueue a copy of `bytes` under `tag`
    pub fn push(&mut self, tag: TypeTag, bytes: &[u8]) -> Result<()> {
        self.push_value(Value::new(tag, bytes))
    }

    /// Enqueue an owned value
    pub fn push_value(&mut self, value: Value) -> Result<()> {
        if self.is_full() {
            let capacity = self.buf.capacity();
            if !self.auto_grow {
                return Err(StowageError::capacity_exceeded(capacity));
            }
            self.grow_to(next_capacity(capacity, self.len + 1, self.growth_factor))?;
        }
        let tail = ring_index(self.head, self.len, self.buf.capacity());
        unsafe { self.buf.slot_mut(tail).write(value) };
        self.len += 1;
        Ok(())
    }

    /// Dequeue the head value
    pub fn pop(&mut self) -> Option<Value> {
        if self.len == 0 {
            return None;
        }
        let value = unsafe { self.buf.slot(self.head).read() };
        self.head = ring_index(self.head, 1, self.buf.capacity());
        self.len -= 1;
        Some(value)
    }

    /// Borrow the head value without consuming it
    pub fn front(&self) -> Option<&Value> {
        self.as_slices().0.first()
    }

    /// Borrow the value at logical position `index` (0 is the head)
    pub fn item_direct(&self, index: usize) -> Result<&Value> {
        check_bounds(index, self.len)?;
        let physical = ring_index(self.head, index, self.buf.capacity());
        Ok(unsafe { &*self.buf.slot(physical) })
    }

    /// Copy of the value at logical position `index`
    pub fn item(&self, index: usize) -> Result<Value> {
        self.item_direct(index).cloned()
    }

    /// Mutably borrow the value at logical position `index`
    pub fn item_direct_mut(&mut self, index: usize) -> Result<&mut Value> {
        check_bounds(index, self.len)?;
        let physical = ring_index(self.head, index, self.buf.capacity());
        Ok(unsafe { &mut *self.buf.slot_mut(physical) })
    }

    /// Overwrite the value at logical position `index`, rebinding its tag
    pub fn replace_item(&mut self, index: usize, tag: TypeTag, bytes: &[u8]) -> Result<()> {
        self.item_direct_mut(index)?.rebind(tag, bytes);
        Ok(())
    }

    /// Release every value, keeping the ring
    pub fn clear(&mut self) {
        while self.pop().is_some() {}
        self.head = 0;
    }

    /// The occupied slots as the run up to the ring's end and the wrapped run
    pub fn as_slices(&self) -> (&[Value], &[Value]) {
        if self.len == 0 {
            return (&[], &[]);
        }
        let first_len = self.len.min(self.buf.capacity() - self.head);
        unsafe {
            let base = self.buf.as_ptr();
            (
                slice::from_raw_parts(base.add(self.head), first_len),
                slice::from_raw_parts(base, self.len - first_len),
            )
        }
    }

    /// Iterate from head to tail without consuming
    pub fn iter(&self) -> Chain<slice::Iter<'_, Value>, slice::Iter<'_, Value>> {
        let (first, second) = self.as_slices();
        first.iter().chain(second.iter())
    }

    /// Cursor with in-place replacement
    pub fn cursor(&mut self) -> GenericQueueCursor<'_, A> {
        GenericQueueCursor {
            queue: self,
            walk: IndexWalk::new(),
        }
    }
}

impl<A: ContainerAllocator> Drop for GenericQueue<A> {
    fn drop(&mut self) {
        log::trace!("releasing generic queue of {} values", self.len);
        self.clear();
    }
}

impl<A: ContainerAllocator> fmt::Debug for GenericQueue<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// Cursor over a [`GenericQueue`], head to tail
pub struct GenericQueueCursor<'a, A: ContainerAllocator = SystemAllocator> {
    queue: &'a mut GenericQueue<A>,
    walk: IndexWalk,
}

impl<A: ContainerAllocator> GenericQueueCursor<'_, A> {
    /// Overwrite the current value from raw bytes, rebinding its tag
    pub fn replace_item(&mut self, tag: TypeTag, bytes: &[u8]) -> Result<()> {
        let index = self.walk.position()?;
        self.queue.replace_item(index, tag, bytes)
    }
}

impl<A: ContainerAllocator> Cursor for GenericQueueCursor<'_, A> {
    type Item = Value;

    fn next(&mut self) -> bool {
        self.walk.advance(self.queue.len)
    }

    fn reset(&mut self) {
        self.walk.reset();
    }

    fn state(&self) -> CursorState {
        self.walk.state()
    }

    fn value(&self) -> Result<&Value> {
        self.queue.item_direct(self.walk.position()?)
    }

    fn replace_current(&mut self, replacement: &Value) -> Result<()> {
        let index = self.walk.position()?;
        *self.queue.item_direct_mut(index)? = replacement.clone();
        Ok(())
    }
}
