//! SList: singly linked list of [`Value`]s
//!
//! Nodes are obtained one at a time from the list's allocator. The list keeps
//! a tail pointer so `push_back` is O(1); every other positional operation
//! walks from the head and is O(index).

use super::cursor::{Cursor, CursorState};
use crate::error::{check_bounds, Result, StowageError};
use crate::memory::{ContainerAllocator, SystemAllocator};
use crate::value::{TypeTag, Value};
use std::alloc::Layout;
use std::fmt;
use std::marker::PhantomData;
use std::ptr::NonNull;

struct Node {
    value: Value,
    next: Option<NonNull<Node>>,
}

/// Singly linked list of tagged values
///
/// # Examples
///
/// ```rust
/// use stowage::{SList, TypeTag};
///
/// let mut list = SList::new();
/// list.push_back(TypeTag::Int32, &2i32.to_ne_bytes())?;
/// list.push_front(TypeTag::Int32, &1i32.to_ne_bytes())?;
/// list.insert(2, TypeTag::Int32, &3i32.to_ne_bytes())?;
///
/// assert!(list.replace_item(&2i32.to_ne_bytes(), TypeTag::Int32, &20i32.to_ne_bytes()));
/// let items: Vec<i32> = list.iter().map(|v| v.as_i32()).collect::<Result<_, _>>()?;
/// assert_eq!(items, [1, 20, 3]);
/// # Ok::<(), stowage::StowageError>(())
/// ```
pub struct SList<A: ContainerAllocator = SystemAllocator> {
    head: Option<NonNull<Node>>,
    tail: Option<NonNull<Node>>,
    len: usize,
    alloc: A,
    _marker: PhantomData<Box<Node>>,
}

impl SList<SystemAllocator> {
    /// Create an empty list backed by the system allocator
    pub fn new() -> Self {
        Self::new_in(SystemAllocator)
    }
}

impl Default for SList<SystemAllocator> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: ContainerAllocator> SList<A> {
    /// Create an empty list whose nodes come from `alloc`
    pub fn new_in(alloc: A) -> Self {
        log::trace!("creating singly linked list");
        Self {
            head: None,
            tail: None,
            len: 0,
            alloc,
            _marker: PhantomData,
        }
    }

    /// Number of values
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the list is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The allocator backing the nodes
    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    fn alloc_node(&self, value: Value) -> Result<NonNull<Node>> {
        let node = self.alloc.allocate(Layout::new::<Node>())?.cast::<Node>();
        unsafe { node.as_ptr().write(Node { value, next: None }) };
        Ok(node)
    }

    /// Drop the node's value and return its memory to the allocator
    unsafe fn free_node(&self, node: NonNull<Node>) -> Value {
        let Node { value, .. } = unsafe { node.as_ptr().read() };
        unsafe { self.alloc.deallocate(node.cast(), Layout::new::<Node>()) };
        value
    }

    fn node_at(&self, index: usize) -> Option<NonNull<Node>> {
        let mut current = self.head;
        for _ in 0..index {
            current = current.and_then(|node| unsafe { (*node.as_ptr()).next });
        }
        current
    }

    /// Prepend a copy of `bytes` under `tag`
    pub fn push_front(&mut self, tag: TypeTag, bytes: &[u8]) -> Result<()> {
        self.insert_value(0, Value::new(tag, bytes))
    }

    /// Append a copy of `bytes` under `tag` in O(1)
    pub fn push_back(&mut self, tag: TypeTag, bytes: &[u8]) -> Result<()> {
        self.push_value(Value::new(tag, bytes))
    }

    /// Append an owned value in O(1)
    pub fn push_value(&mut self, value: Value) -> Result<()> {
        let node = self.alloc_node(value)?;
        match self.tail {
            Some(tail) => unsafe { (*tail.as_ptr()).next = Some(node) },
            None => self.head = Some(node),
        }
        self.tail = Some(node);
        self.len += 1;
        Ok(())
    }

    /// Insert at `index` (0 prepends, `len` appends)
    pub fn insert(&mut self, index: usize, tag: TypeTag, bytes: &[u8]) -> Result<()> {
        self.insert_value(index, Value::new(tag, bytes))
    }

    /// Insert an owned value at `index`
    pub fn insert_value(&mut self, index: usize, value: Value) -> Result<()> {
        if index > self.len {
            return Err(StowageError::out_of_range(index, self.len));
        }
        if index == self.len {
            return self.push_value(value);
        }
        let prev = match index {
            0 => None,
            _ => Some(
                self.node_at(index - 1)
                    .ok_or_else(|| StowageError::out_of_range(index, self.len))?,
            ),
        };
        let node = self.alloc_node(value)?;
        unsafe {
            match prev {
                None => {
                    (*node.as_ptr()).next = self.head;
                    self.head = Some(node);
                }
                Some(prev) => {
                    (*node.as_ptr()).next = (*prev.as_ptr()).next;
                    (*prev.as_ptr()).next = Some(node);
                }
            }
        }
        self.len += 1;
        Ok(())
    }

    /// Remove and return the first value
    pub fn pop_front(&mut self) -> Option<Value> {
        let head = self.head?;
        unsafe {
            self.head = (*head.as_ptr()).next;
            if self.head.is_none() {
                self.tail = None;
            }
            self.len -= 1;
            Some(self.free_node(head))
        }
    }

    /// Remove the value at `index` and return it
    pub fn remove(&mut self, index: usize) -> Result<Value> {
        check_bounds(index, self.len)?;
        if index == 0 {
            return self
                .pop_front()
                .ok_or_else(|| StowageError::out_of_range(index, self.len));
        }
        let prev = self
            .node_at(index - 1)
            .ok_or_else(|| StowageError::out_of_range(index, self.len))?;
        unsafe {
            let target = (*prev.as_ptr())
                .next
                .ok_or_else(|| StowageError::out_of_range(index, self.len))?;
            (*prev.as_ptr()).next = (*target.as_ptr()).next;
            if self.tail == Some(target) {
                self.tail = Some(prev);
            }
            self.len -= 1;
            Ok(self.free_node(target))
        }
    }

    /// Borrow the value at `index`
    pub fn item_direct(&self, index: usize) -> Result<&Value> {
        check_bounds(index, self.len)?;
        self.node_at(index)
            .map(|node| unsafe { &(*node.as_ptr()).value })
            .ok_or_else(|| StowageError::out_of_range(index, self.len))
    }

    /// Copy of the value at `index`
    pub fn item(&self, index: usize) -> Result<Value> {
        self.item_direct(index).cloned()
    }

    /// The first value, if any
    pub fn front(&self) -> Option<&Value> {
        self.head.map(|node| unsafe { &(*node.as_ptr()).value })
    }

    /// The last value, if any
    pub fn back(&self) -> Option<&Value> {
        self.tail.map(|node| unsafe { &(*node.as_ptr()).value })
    }

    /// Replace the first value whose bytes equal `old_bytes`
    ///
    /// Matching is size-and-bytewise and ignores tags. Returns `false` and
    /// leaves the list untouched when nothing matches.
    pub fn replace_item(&mut self, old_bytes: &[u8], tag: TypeTag, new_bytes: &[u8]) -> bool {
        let mut current = self.head;
        while let Some(node) = current {
            let node = unsafe { &mut *node.as_ptr() };
            if node.value.data() == old_bytes {
                node.value.rebind(tag, new_bytes);
                return true;
            }
            current = node.next;
        }
        false
    }

    /// Index of the first value whose bytes equal `bytes`
    pub fn position(&self, bytes: &[u8]) -> Option<usize> {
        self.iter().position(|value| value.data() == bytes)
    }

    /// Release every node and value
    pub fn clear(&mut self) {
        while self.pop_front().is_some() {}
    }

    /// Deep copy sharing nothing with `self`
    pub fn try_clone(&self) -> Result<Self> {
        let mut copy = Self::new_in(self.alloc.clone());
        for value in self.iter() {
            copy.push_value(value.clone())?;
        }
        Ok(copy)
    }

    /// Iterate from head to tail
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            next: self.head,
            remaining: self.len,
            _marker: PhantomData,
        }
    }

    /// Cursor with in-place replacement
    pub fn cursor(&mut self) -> SListCursor<'_, A> {
        SListCursor {
            list: self,
            current: None,
            state: CursorState::BeforeFirst,
        }
    }
}

impl<A: ContainerAllocator> Drop for SList<A> {
    fn drop(&mut self) {
        log::trace!("releasing singly linked list of {} values", self.len);
        self.clear();
    }
}

// Safety: the list exclusively owns its nodes
unsafe impl<A: ContainerAllocator + Send> Send for SList<A> {}

impl<A: ContainerAllocator> fmt::Debug for SList<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<'a, A: ContainerAllocator> IntoIterator for &'a SList<A> {
    type Item = &'a Value;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Borrowing iterator over an [`SList`]
pub struct Iter<'a> {
    next: Option<NonNull<Node>>,
    remaining: usize,
    _marker: PhantomData<&'a Value>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Value;

    fn next(&mut self) -> Option<&'a Value> {
        let node = self.next?;
        let node = unsafe { &*node.as_ptr() };
        self.next = node.next;
        self.remaining -= 1;
        Some(&node.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Iter<'_> {}

/// Cursor over an [`SList`]
pub struct SListCursor<'a, A: ContainerAllocator = SystemAllocator> {
    list: &'a mut SList<A>,
    current: Option<NonNull<Node>>,
    state: CursorState,
}

impl<A: ContainerAllocator> SListCursor<'_, A> {
    fn current_node(&self) -> Result<NonNull<Node>> {
        self.state.ensure_positioned()?;
        self.current.ok_or(StowageError::CursorNotPositioned)
    }

    /// Overwrite the current value from raw bytes, rebinding its tag
    pub fn replace_item(&mut self, tag: TypeTag, bytes: &[u8]) -> Result<()> {
        let node = self.current_node()?;
        unsafe { (*node.as_ptr()).value.rebind(tag, bytes) };
        Ok(())
    }
}

impl<A: ContainerAllocator> Cursor for SListCursor<'_, A> {
    type Item = Value;

    fn next(&mut self) -> bool {
        let candidate = match self.state {
            CursorState::BeforeFirst => self.list.head,
            CursorState::Positioned => self.current.and_then(|node| unsafe { (*node.as_ptr()).next }),
            CursorState::Exhausted => return false,
        };
        self.current = candidate;
        self.state = if candidate.is_some() {
            CursorState::Positioned
        } else {
            CursorState::Exhausted
        };
        candidate.is_some()
    }

    fn reset(&mut self) {
        self.current = None;
        self.state = CursorState::BeforeFirst;
    }

    fn state(&self) -> CursorState {
        self.state
    }

    fn value(&self) -> Result<&Value> {
        let node = self.current_node()?;
        Ok(unsafe { &(*node.as_ptr()).value })
    }

    fn replace_current(&mut self, replacement: &Value) -> Result<()> {
        let node = self.current_node()?;
        unsafe { (*node.as_ptr()).value = replacement.clone() };
        Ok(())
    }
}
