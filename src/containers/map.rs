//! Map: ordered associative container over [`Value`] keys
//!
//! Backed by an AVL tree ordered by the injected comparator, so lookups,
//! inserts and removals are O(log n) and iteration yields keys in ascending
//! comparator order. Keys are unique under the comparator; inserting an
//! existing key replaces its value. Tree nodes come from the map's allocator.

use super::cursor::{Cursor, CursorState};
use crate::error::{Result, StowageError};
use crate::memory::{ContainerAllocator, SystemAllocator};
use crate::value::{Comparator, RawComparator, TypeTag, Value};
use std::alloc::Layout;
use std::cmp::Ordering;
use std::fmt;
use std::marker::PhantomData;
use std::ptr::NonNull;

type Link = Option<NonNull<MapNode>>;

struct MapNode {
    key: Value,
    value: Value,
    left: Link,
    right: Link,
    height: u8,
}

#[inline]
fn height(link: Link) -> u8 {
    link.map_or(0, |node| unsafe { (*node.as_ptr()).height })
}

/// Recompute `node`'s height from its children
unsafe fn update(node: NonNull<MapNode>) {
    let n = unsafe { &mut *node.as_ptr() };
    n.height = 1 + height(n.left).max(height(n.right));
}

fn balance(node: NonNull<MapNode>) -> i16 {
    let n = unsafe { &*node.as_ptr() };
    height(n.left) as i16 - height(n.right) as i16
}

unsafe fn rotate_right(node: NonNull<MapNode>) -> NonNull<MapNode> {
    unsafe {
        let Some(pivot) = (*node.as_ptr()).left else {
            return node;
        };
        (*node.as_ptr()).left = (*pivot.as_ptr()).right;
        (*pivot.as_ptr()).right = Some(node);
        update(node);
        update(pivot);
        pivot
    }
}

unsafe fn rotate_left(node: NonNull<MapNode>) -> NonNull<MapNode> {
    unsafe {
        let Some(pivot) = (*node.as_ptr()).right else {
            return node;
        };
        (*node.as_ptr()).right = (*pivot.as_ptr()).left;
        (*pivot.as_ptr()).left = Some(node);
        update(node);
        update(pivot);
        pivot
    }
}

/// Restore the AVL invariant at `node`, returning the new subtree root
unsafe fn rebalance(node: NonNull<MapNode>) -> NonNull<MapNode> {
    unsafe {
        update(node);
        let n = node.as_ptr();
        match balance(node) {
            b if b > 1 => {
                if let Some(left) = (*n).left {
                    if balance(left) < 0 {
                        (*n).left = Some(rotate_left(left));
                    }
                }
                rotate_right(node)
            }
            b if b < -1 => {
                if let Some(right) = (*n).right {
                    if balance(right) > 0 {
                        (*n).right = Some(rotate_right(right));
                    }
                }
                rotate_left(node)
            }
            _ => node,
        }
    }
}

/// Detach the leftmost node of the subtree at `node`
unsafe fn remove_min(node: NonNull<MapNode>) -> (Link, NonNull<MapNode>) {
    unsafe {
        match (*node.as_ptr()).left {
            None => ((*node.as_ptr()).right, node),
            Some(left) => {
                let (rest, min) = remove_min(left);
                (*node.as_ptr()).left = rest;
                (Some(rebalance(node)), min)
            }
        }
    }
}

/// Push `link` and its chain of left children onto `stack`
fn push_left_spine(stack: &mut Vec<NonNull<MapNode>>, mut link: Link) {
    while let Some(node) = link {
        stack.push(node);
        link = unsafe { (*node.as_ptr()).left };
    }
}

/// Ordered map from [`Value`] keys to [`Value`]s
///
/// # Examples
///
/// ```rust
/// use stowage::{Map, TypeTag, Value};
///
/// let mut map = Map::new();
/// assert!(map.insert(TypeTag::CharPtr, b"beta\0", TypeTag::Int32, &2i32.to_ne_bytes())?);
/// assert!(map.insert(TypeTag::CharPtr, b"alpha\0", TypeTag::Int32, &1i32.to_ne_bytes())?);
/// // same key again: value replaced, size unchanged
/// assert!(!map.insert(TypeTag::CharPtr, b"beta\0", TypeTag::Int32, &20i32.to_ne_bytes())?);
///
/// assert_eq!(map.len(), 2);
/// assert_eq!(map.value_by_key(&Value::from_str("beta"))?.as_i32()?, 20);
///
/// let keys: Vec<&str> = map.iter().map(|(k, _)| k.as_c_str()).collect::<Result<_, _>>()?;
/// assert_eq!(keys, ["alpha", "beta"]);
/// # Ok::<(), stowage::StowageError>(())
/// ```
pub struct Map<C: Comparator<Value> = RawComparator, A: ContainerAllocator = SystemAllocator> {
    root: Link,
    len: usize,
    cmp: C,
    alloc: A,
    _marker: PhantomData<Box<MapNode>>,
}

impl Map<RawComparator, SystemAllocator> {
    /// Create an empty map with the default comparator and allocator
    pub fn new() -> Self {
        Self::with_comparator_in(RawComparator, SystemAllocator)
    }
}

impl Default for Map<RawComparator, SystemAllocator> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Comparator<Value>> Map<C, SystemAllocator> {
    /// Create an empty map ordered by `cmp`
    pub fn with_comparator(cmp: C) -> Self {
        Self::with_comparator_in(cmp, SystemAllocator)
    }
}

impl<A: ContainerAllocator> Map<RawComparator, A> {
    /// Create an empty map whose nodes come from `alloc`
    pub fn new_in(alloc: A) -> Self {
        Self::with_comparator_in(RawComparator, alloc)
    }
}

impl<C: Comparator<Value>, A: ContainerAllocator> Map<C, A> {
    /// Create an empty map ordered by `cmp` with nodes from `alloc`
    pub fn with_comparator_in(cmp: C, alloc: A) -> Self {
        log::trace!("creating ordered map");
        Self {
            root: None,
            len: 0,
            cmp,
            alloc,
            _marker: PhantomData,
        }
    }

    /// Number of entries
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the map is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The comparator ordering the keys
    pub fn comparator(&self) -> &C {
        &self.cmp
    }

    /// The allocator backing the nodes
    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    fn find_node(&self, key: &Value) -> Link {
        let mut current = self.root;
        while let Some(node) = current {
            let n = unsafe { &*node.as_ptr() };
            current = match self.cmp.compare(key, &n.key) {
                Ordering::Less => n.left,
                Ordering::Greater => n.right,
                Ordering::Equal => return Some(node),
            };
        }
        None
    }

    /// Insert a copy of `key_bytes` mapped to a copy of `value_bytes`
    ///
    /// Returns `true` when the key was new and `false` when an existing value
    /// was replaced.
    pub fn insert(
        &mut self,
        key_tag: TypeTag,
        key_bytes: &[u8],
        value_tag: TypeTag,
        value_bytes: &[u8],
    ) -> Result<bool> {
        self.insert_value(Value::new(key_tag, key_bytes), Value::new(value_tag, value_bytes))
    }

    /// Insert an owned key/value pair; see [`Map::insert`]
    pub fn insert_value(&mut self, key: Value, value: Value) -> Result<bool> {
        if let Some(node) = self.find_node(&key) {
            unsafe { (*node.as_ptr()).value = value };
            return Ok(false);
        }

        let node = self.alloc.allocate(Layout::new::<MapNode>())?.cast::<MapNode>();
        unsafe {
            node.as_ptr().write(MapNode {
                key,
                value,
                left: None,
                right: None,
                height: 1,
            });
            self.root = Some(self.attach(self.root, node));
        }
        self.len += 1;
        Ok(true)
    }

    /// Attach a fresh leaf below `link`; its key is known to be absent
    unsafe fn attach(&self, link: Link, leaf: NonNull<MapNode>) -> NonNull<MapNode> {
        let Some(node) = link else {
            return leaf;
        };
        unsafe {
            let n = node.as_ptr();
            if self.cmp.compare(&(*leaf.as_ptr()).key, &(*n).key) == Ordering::Less {
                (*n).left = Some(self.attach((*n).left, leaf));
            } else {
                (*n).right = Some(self.attach((*n).right, leaf));
            }
            rebalance(node)
        }
    }

    /// Borrow the value stored under `key`
    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.find_node(key).map(|node| unsafe { &(*node.as_ptr()).value })
    }

    /// Mutably borrow the value stored under `key`
    pub fn get_mut(&mut self, key: &Value) -> Option<&mut Value> {
        self.find_node(key).map(|node| unsafe { &mut (*node.as_ptr()).value })
    }

    /// Copy of the value stored under `key`
    pub fn value_by_key(&self, key: &Value) -> Result<Value> {
        self.get(key)
            .cloned()
            .ok_or_else(|| StowageError::not_found(format!("map key {:?}", key)))
    }

    /// Whether `key` is present
    pub fn contains_key(&self, key: &Value) -> bool {
        self.find_node(key).is_some()
    }

    /// Remove `key` and its value
    pub fn key_remove(&mut self, key: &Value) -> Result<()> {
        self.remove_entry(key)
            .map(drop)
            .ok_or_else(|| StowageError::not_found(format!("map key {:?}", key)))
    }

    /// Remove `key`, returning the stored key and value
    pub fn remove_entry(&mut self, key: &Value) -> Option<(Value, Value)> {
        let (root, detached) = unsafe { self.detach(self.root, key) };
        self.root = root;
        let node = detached?;
        self.len -= 1;
        unsafe {
            let MapNode { key, value, .. } = node.as_ptr().read();
            self.alloc.deallocate(node.cast(), Layout::new::<MapNode>());
            Some((key, value))
        }
    }

    /// Unlink the node matching `key` from the subtree at `link`
    unsafe fn detach(&self, link: Link, key: &Value) -> (Link, Link) {
        let Some(node) = link else {
            return (None, None);
        };
        unsafe {
            let n = node.as_ptr();
            match self.cmp.compare(key, &(*n).key) {
                Ordering::Less => {
                    let (left, found) = self.detach((*n).left, key);
                    (*n).left = left;
                    (Some(rebalance(node)), found)
                }
                Ordering::Greater => {
                    let (right, found) = self.detach((*n).right, key);
                    (*n).right = right;
                    (Some(rebalance(node)), found)
                }
                Ordering::Equal => {
                    let replacement = match ((*n).left, (*n).right) {
                        (None, right) => right,
                        (left, None) => left,
                        (left, Some(right)) => {
                            let (rest, successor) = remove_min(right);
                            (*successor.as_ptr()).left = left;
                            (*successor.as_ptr()).right = rest;
                            Some(rebalance(successor))
                        }
                    };
                    (replacement, Some(node))
                }
            }
        }
    }

    unsafe fn free_subtree(&self, link: Link) {
        if let Some(node) = link {
            unsafe {
                self.free_subtree((*node.as_ptr()).left);
                self.free_subtree((*node.as_ptr()).right);
                node.as_ptr().drop_in_place();
                self.alloc.deallocate(node.cast(), Layout::new::<MapNode>());
            }
        }
    }

    /// Remove every entry, releasing all nodes
    pub fn clear(&mut self) {
        let root = self.root.take();
        self.len = 0;
        unsafe { self.free_subtree(root) };
    }

    /// Height of the tree (0 when empty)
    pub fn height(&self) -> usize {
        height(self.root) as usize
    }

    /// Iterate over entries in ascending key order
    pub fn iter(&self) -> Iter<'_> {
        let mut stack = Vec::with_capacity(self.height());
        push_left_spine(&mut stack, self.root);
        Iter {
            stack,
            remaining: self.len,
            _marker: PhantomData,
        }
    }

    /// Iterate over keys in ascending order
    pub fn keys(&self) -> impl Iterator<Item = &Value> + '_ {
        self.iter().map(|(key, _)| key)
    }

    /// Cursor over entries; replacement rewrites the current value
    pub fn cursor(&mut self) -> MapCursor<'_, C, A> {
        MapCursor {
            stack: Vec::with_capacity(self.height()),
            current: None,
            state: CursorState::BeforeFirst,
            map: self,
        }
    }
}

impl<C: Comparator<Value> + Clone, A: ContainerAllocator> Map<C, A> {
    /// Deep copy sharing nothing with `self`
    pub fn try_clone(&self) -> Result<Self> {
        let mut copy = Self::with_comparator_in(self.cmp.clone(), self.alloc.clone());
        for (key, value) in self.iter() {
            copy.insert_value(key.clone(), value.clone())?;
        }
        Ok(copy)
    }
}

impl<C: Comparator<Value>, A: ContainerAllocator> Drop for Map<C, A> {
    fn drop(&mut self) {
        log::trace!("releasing ordered map of {} entries", self.len);
        self.clear();
    }
}

// Safety: the map exclusively owns its nodes
unsafe impl<C: Comparator<Value> + Send, A: ContainerAllocator + Send> Send for Map<C, A> {}

impl<C: Comparator<Value>, A: ContainerAllocator> fmt::Debug for Map<C, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'a, C: Comparator<Value>, A: ContainerAllocator> IntoIterator for &'a Map<C, A> {
    type Item = (&'a Value, &'a Value);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// In-order iterator over a [`Map`]
pub struct Iter<'a> {
    stack: Vec<NonNull<MapNode>>,
    remaining: usize,
    _marker: PhantomData<&'a Value>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a Value, &'a Value);

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        let n = unsafe { &*node.as_ptr() };
        push_left_spine(&mut self.stack, n.right);
        self.remaining -= 1;
        Some((&n.key, &n.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Iter<'_> {}

/// Cursor over a [`Map`] in ascending key order
pub struct MapCursor<'a, C: Comparator<Value> = RawComparator, A: ContainerAllocator = SystemAllocator> {
    map: &'a mut Map<C, A>,
    stack: Vec<NonNull<MapNode>>,
    current: Link,
    state: CursorState,
}

impl<C: Comparator<Value>, A: ContainerAllocator> MapCursor<'_, C, A> {
    fn current_node(&self) -> Result<NonNull<MapNode>> {
        self.state.ensure_positioned()?;
        self.current.ok_or(StowageError::CursorNotPositioned)
    }

    /// Key of the current entry
    pub fn key(&self) -> Result<&Value> {
        let node = self.current_node()?;
        Ok(unsafe { &(*node.as_ptr()).key })
    }

    /// Overwrite the current entry's value from raw bytes
    pub fn replace_item(&mut self, tag: TypeTag, bytes: &[u8]) -> Result<()> {
        let node = self.current_node()?;
        unsafe { (*node.as_ptr()).value.rebind(tag, bytes) };
        Ok(())
    }
}

impl<C: Comparator<Value>, A: ContainerAllocator> Cursor for MapCursor<'_, C, A> {
    type Item = Value;

    fn next(&mut self) -> bool {
        match self.state {
            CursorState::BeforeFirst => {
                self.stack.clear();
                push_left_spine(&mut self.stack, self.map.root);
            }
            CursorState::Positioned => {
                if let Some(node) = self.current {
                    push_left_spine(&mut self.stack, unsafe { (*node.as_ptr()).right });
                }
            }
            CursorState::Exhausted => return false,
        }
        self.current = self.stack.pop();
        self.state = if self.current.is_some() {
            CursorState::Positioned
        } else {
            CursorState::Exhausted
        };
        self.current.is_some()
    }

    fn reset(&mut self) {
        self.stack.clear();
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::TrackingAllocator;
    use crate::value::Reverse;

    fn check_avl<C: Comparator<Value>, A: ContainerAllocator>(map: &Map<C, A>) {
        fn walk(link: Link) -> u8 {
            match link {
                None => 0,
                Some(node) => {
                    let n = unsafe { &*node.as_ptr() };
                    let (l, r) = (walk(n.left), walk(n.right));
                    assert!((l as i16 - r as i16).abs() <= 1, "unbalanced node");
                    assert_eq!(n.height, 1 + l.max(r));
                    n.height
                }
            }
        }
        walk(map.root);
    }

    fn int_map(keys: impl IntoIterator<Item = i64>) -> Map {
        let mut map = Map::new();
        for k in keys {
            map.insert_value(Value::from_i64(k), Value::from_i64(k * 10)).unwrap();
        }
        map
    }

    #[test]
    fn test_insert_replace() {
        let mut map = Map::new();
        assert!(map.insert_value(Value::from_str("A"), Value::from_i32(1)).unwrap());
        assert!(!map.insert_value(Value::from_str("A"), Value::from_i32(2)).unwrap());
        assert_eq!(map.len(), 1);
        assert_eq!(map.value_by_key(&Value::from_str("A")).unwrap().as_i32().unwrap(), 2);
    }

    #[test]
    fn test_char_ptr_probe_without_terminator() {
        let mut map = Map::new();
        map.insert(TypeTag::CharPtr, b"key\0", TypeTag::UInt8, &[1]).unwrap();
        let probe = Value::new(TypeTag::CharPtr, b"key");
        assert!(map.contains_key(&probe));
        assert_eq!(map.get(&probe).unwrap().data(), &[1]);
    }

    #[test]
    fn test_remove() {
        let mut map = int_map(0..50);
        for k in (0..50).step_by(3) {
            map.key_remove(&Value::from_i64(k)).unwrap();
            check_avl(&map);
        }
        assert_eq!(map.len(), 33);
        assert!(!map.contains_key(&Value::from_i64(3)));
        assert!(map.contains_key(&Value::from_i64(4)));
        assert!(matches!(
            map.value_by_key(&Value::from_i64(3)),
            Err(StowageError::NotFound { .. })
        ));
        assert!(map.key_remove(&Value::from_i64(3)).is_err());

        let (key, value) = map.remove_entry(&Value::from_i64(49)).unwrap();
        assert_eq!(key.as_i64().unwrap(), 49);
        assert_eq!(value.as_i64().unwrap(), 490);
    }

    #[test]
    fn test_stays_balanced() {
        let map = int_map(0..1000);
        check_avl(&map);
        assert!(map.height() <= 15);

        let mut map = int_map((0..500).rev());
        check_avl(&map);
        for k in 100..400 {
            map.key_remove(&Value::from_i64(k)).unwrap();
        }
        check_avl(&map);
        assert_eq!(map.len(), 200);
    }

    #[test]
    fn test_iteration_in_comparator_order() {
        let by_number = |l: &Value, r: &Value| {
            l.as_i64().unwrap_or(0).cmp(&r.as_i64().unwrap_or(0))
        };
        let mut map = Map::with_comparator(by_number);
        for k in [5i64, -3, 12, 0, 7, -8] {
            map.insert_value(Value::from_i64(k), Value::from_bool(k > 0)).unwrap();
        }
        let keys: Vec<i64> = map.keys().map(|k| k.as_i64().unwrap()).collect();
        assert_eq!(keys, vec![-8, -3, 0, 5, 7, 12]);
        assert_eq!(map.iter().len(), 6);

        let mut reversed = Map::with_comparator(Reverse(by_number));
        for k in [1i64, 3, 2] {
            reversed.insert_value(Value::from_i64(k), Value::from_i64(k)).unwrap();
        }
        let keys: Vec<i64> = reversed.keys().map(|k| k.as_i64().unwrap()).collect();
        assert_eq!(keys, vec![3, 2, 1]);
    }

    #[test]
    fn test_cursor_replace_value() {
        let mut map = int_map([3, 1, 2]);
        let mut cursor = map.cursor();
        assert!(cursor.key().is_err());
        while cursor.next() {
            if cursor.key().unwrap().as_i64().unwrap() == 2 {
                cursor.replace_item(TypeTag::CharPtr, b"two\0").unwrap();
            }
        }
        assert_eq!(cursor.state(), CursorState::Exhausted);
        cursor.reset();
        assert!(cursor.next());
        assert_eq!(cursor.key().unwrap().as_i64().unwrap(), 1);
        cursor.replace_current(&Value::from_i64(-1)).unwrap();
        drop(cursor);

        assert_eq!(map.get(&Value::from_i64(1)).unwrap().as_i64().unwrap(), -1);
        assert_eq!(map.get(&Value::from_i64(2)).unwrap().as_c_str().unwrap(), "two");
        assert_eq!(map.get(&Value::from_i64(3)).unwrap().as_i64().unwrap(), 30);
    }

    #[test]
    fn test_clone_is_independent() {
        let mut map = int_map(0..10);
        let copy = map.try_clone().unwrap();
        map.clear();
        assert!(map.is_empty());
        assert_eq!(copy.len(), 10);
        assert_eq!(copy.value_by_key(&Value::from_i64(9)).unwrap().as_i64().unwrap(), 90);
    }

    #[test]
    fn test_nodes_released() {
        let tracker = TrackingAllocator::new();
        {
            let mut map = Map::new_in(tracker.clone());
            for k in 0..64i64 {
                map.insert_value(Value::from_i64(k), Value::from_i64(k)).unwrap();
            }
            map.insert_value(Value::from_i64(5), Value::from_i64(0)).unwrap();
            assert_eq!(tracker.stats().live_blocks(), 64);
            map.key_remove(&Value::from_i64(0)).unwrap();
            assert_eq!(tracker.stats().live_blocks(), 63);
        }
        assert_eq!(tracker.stats().live_bytes, 0);
    }

    #[test]
    fn test_failed_insert_leaves_map_intact() {
        let node = Layout::new::<MapNode>().size();
        let mut map = Map::new_in(TrackingAllocator::with_byte_limit(node * 3));
        for k in 0..3i64 {
            map.insert_value(Value::from_i64(k), Value::from_i64(k)).unwrap();
        }
        assert!(map.insert_value(Value::from_i64(9), Value::from_i64(9)).is_err());
        // replacing an existing key needs no node
        assert!(!map.insert_value(Value::from_i64(1), Value::from_i64(100)).unwrap());
        assert_eq!(map.len(), 3);
        check_avl(&map);
    }
}
