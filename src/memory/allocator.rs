//! Pluggable allocation hooks for container-internal storage
//!
//! Every container takes an allocator parameter that defaults to
//! [`SystemAllocator`]. Slot arrays, list nodes and map nodes are obtained
//! through it; value payloads are owned boxes and do not pass through here.

use crate::error::{Result, StowageError};
use std::alloc::{self, Layout};
use std::ptr::{self, NonNull};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Allocation hook pair used by containers for their internal storage
///
/// Implementations must be cheap to clone: cloning a container clones its
/// allocator, and both copies must be able to release blocks handed out by
/// either.
pub trait ContainerAllocator: Clone {
    /// Allocate a block satisfying `layout` (`layout.size() > 0`)
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>>;

    /// Release a block previously returned by this allocator
    ///
    /// # Safety
    ///
    /// `ptr` must have been returned by `allocate`/`reallocate` on this
    /// allocator (or a clone of it) with the same `layout`, and must not be
    /// used afterwards.
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout);

    /// Resize a block, preserving the first `min(old, new)` bytes
    ///
    /// On failure the original block is left untouched and still owned by the
    /// caller.
    ///
    /// # Safety
    ///
    /// Same contract as [`ContainerAllocator::deallocate`] for `ptr`/`old`.
    unsafe fn reallocate(&self, ptr: NonNull<u8>, old: Layout, new_size: usize) -> Result<NonNull<u8>> {
        let new_layout = Layout::from_size_align(new_size, old.align())
            .map_err(|_| StowageError::allocation_failure(new_size))?;
        let new_ptr = self.allocate(new_layout)?;
        unsafe {
            ptr::copy_nonoverlapping(ptr.as_ptr(), new_ptr.as_ptr(), old.size().min(new_size));
            self.deallocate(ptr, old);
        }
        Ok(new_ptr)
    }
}

/// The platform allocator (`std::alloc`)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SystemAllocator;

impl ContainerAllocator for SystemAllocator {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>> {
        debug_assert!(layout.size() > 0);
        let ptr = unsafe { alloc::alloc(layout) };
        NonNull::new(ptr).ok_or_else(|| StowageError::allocation_failure(layout.size()))
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        unsafe { alloc::dealloc(ptr.as_ptr(), layout) }
    }

    unsafe fn reallocate(&self, ptr: NonNull<u8>, old: Layout, new_size: usize) -> Result<NonNull<u8>> {
        // realloc keeps the old block alive when it returns null
        let new_ptr = unsafe { alloc::realloc(ptr.as_ptr(), old, new_size) };
        NonNull::new(new_ptr).ok_or_else(|| StowageError::allocation_failure(new_size))
    }
}

/// Signature of a caller-supplied allocation hook
pub type AllocFn = fn(Layout) -> *mut u8;

/// Signature of a caller-supplied release hook
pub type FreeFn = unsafe fn(*mut u8, Layout);

/// Adapter turning a plain allocate/free function pair into an allocator
///
/// A null return from the allocation hook is reported as
/// [`StowageError::AllocationFailure`].
///
/// # Examples
///
/// ```rust
/// use std::alloc::Layout;
/// use stowage::memory::FnAllocator;
/// use stowage::GenericVector;
///
/// fn my_alloc(layout: Layout) -> *mut u8 {
///     unsafe { std::alloc::alloc(layout) }
/// }
///
/// unsafe fn my_free(ptr: *mut u8, layout: Layout) {
///     unsafe { std::alloc::dealloc(ptr, layout) }
/// }
///
/// let hooks = FnAllocator::new(my_alloc, my_free);
/// let mut vec = GenericVector::new_in(hooks);
/// vec.push_back(stowage::TypeTag::UInt64, &7u64.to_ne_bytes())?;
/// assert_eq!(vec.len(), 1);
/// # Ok::<(), stowage::StowageError>(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct FnAllocator {
    alloc_fn: AllocFn,
    free_fn: FreeFn,
}

impl FnAllocator {
    /// Create an allocator from an allocate/free hook pair
    pub fn new(alloc_fn: AllocFn, free_fn: FreeFn) -> Self {
        Self { alloc_fn, free_fn }
    }
}

impl ContainerAllocator for FnAllocator {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>> {
        NonNull::new((self.alloc_fn)(layout)).ok_or_else(|| {
            log::warn!("allocation hook returned null for {} bytes", layout.size());
            StowageError::allocation_failure(layout.size())
        })
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        unsafe { (self.free_fn)(ptr.as_ptr(), layout) }
    }
}

/// Shared counters kept by [`TrackingAllocator`]
#[derive(Debug, Default)]
struct TrackingState {
    allocations: AtomicUsize,
    deallocations: AtomicUsize,
    live_bytes: AtomicUsize,
    peak_bytes: AtomicUsize,
    failures: AtomicUsize,
}

/// Point-in-time view of a [`TrackingAllocator`]'s counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AllocationStats {
    /// Successful allocations (reallocations count once)
    pub allocations: usize,
    /// Released blocks
    pub deallocations: usize,
    /// Bytes currently held
    pub live_bytes: usize,
    /// Highest value `live_bytes` reached
    pub peak_bytes: usize,
    /// Requests refused by the byte limit or the inner allocator
    pub failures: usize,
}

impl AllocationStats {
    /// Blocks allocated and not yet released
    pub fn live_blocks(&self) -> usize {
        self.allocations.saturating_sub(self.deallocations)
    }
}

/// Allocator wrapper that counts traffic and can enforce a byte limit
///
/// Clones share the same counters, so a test can keep one handle while a
/// container owns another.
///
/// # Examples
///
/// ```rust
/// use stowage::memory::TrackingAllocator;
/// use stowage::{SList, TypeTag};
///
/// let tracker = TrackingAllocator::new();
/// {
///     let mut list = SList::new_in(tracker.clone());
///     list.push_back(TypeTag::Int32, &5i32.to_ne_bytes())?;
///     assert_eq!(tracker.stats().live_blocks(), 1);
/// }
/// assert_eq!(tracker.stats().live_bytes, 0);
/// # Ok::<(), stowage::StowageError>(())
/// ```
#[derive(Debug, Clone)]
pub struct TrackingAllocator<A: ContainerAllocator = SystemAllocator> {
    inner: A,
    limit: Option<usize>,
    state: Arc<TrackingState>,
}

impl TrackingAllocator<SystemAllocator> {
    /// Track the system allocator without a limit
    pub fn new() -> Self {
        Self::wrap(SystemAllocator)
    }

    /// Track the system allocator, refusing to hold more than `limit` bytes
    pub fn with_byte_limit(limit: usize) -> Self {
        let mut tracker = Self::wrap(SystemAllocator);
        tracker.limit = Some(limit);
        tracker
    }
}

impl Default for TrackingAllocator<SystemAllocator> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: ContainerAllocator> TrackingAllocator<A> {
    /// Track an arbitrary inner allocator
    pub fn wrap(inner: A) -> Self {
        Self {
            inner,
            limit: None,
            state: Arc::new(TrackingState::default()),
        }
    }

    /// Snapshot the shared counters
    pub fn stats(&self) -> AllocationStats {
        AllocationStats {
            allocations: self.state.allocations.load(Ordering::Relaxed),
            deallocations: self.state.deallocations.load(Ordering::Relaxed),
            live_bytes: self.state.live_bytes.load(Ordering::Relaxed),
            peak_bytes: self.state.peak_bytes.load(Ordering::Relaxed),
            failures: self.state.failures.load(Ordering::Relaxed),
        }
    }

    fn admit(&self, additional: usize) -> Result<()> {
        if let Some(limit) = self.limit {
            let live = self.state.live_bytes.load(Ordering::Relaxed);
            if live.saturating_add(additional) > limit {
                self.state.failures.fetch_add(1, Ordering::Relaxed);
                log::warn!(
                    "allocation of {} bytes refused: {} of {} bytes in use",
                    additional,
                    live,
                    limit
                );
                return Err(StowageError::allocation_failure(additional));
            }
        }
        Ok(())
    }

    fn record_alloc(&self, size: usize) {
        self.state.allocations.fetch_add(1, Ordering::Relaxed);
        let live = self.state.live_bytes.fetch_add(size, Ordering::Relaxed) + size;
        self.state.peak_bytes.fetch_max(live, Ordering::Relaxed);
    }
}

impl<A: ContainerAllocator> ContainerAllocator for TrackingAllocator<A> {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>> {
        self.admit(layout.size())?;
        match self.inner.allocate(layout) {
            Ok(ptr) => {
                self.record_alloc(layout.size());
                Ok(ptr)
            }
            Err(err) => {
                self.state.failures.fetch_add(1, Ordering::Relaxed);
                Err(err)
            }
        }
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        self.state.deallocations.fetch_add(1, Ordering::Relaxed);
        self.state.live_bytes.fetch_sub(layout.size(), Ordering::Relaxed);
        unsafe { self.inner.deallocate(ptr, layout) }
    }

    unsafe fn reallocate(&self, ptr: NonNull<u8>, old: Layout, new_size: usize) -> Result<NonNull<u8>> {
        if new_size > old.size() {
            self.admit(new_size - old.size())?;
        }
        match unsafe { self.inner.reallocate(ptr, old, new_size) } {
            Ok(new_ptr) => {
                if new_size >= old.size() {
                    let live = self.state.live_bytes.fetch_add(new_size - old.size(), Ordering::Relaxed)
                        + (new_size - old.size());
                    self.state.peak_bytes.fetch_max(live, Ordering::Relaxed);
                } else {
                    self.state.live_bytes.fetch_sub(old.size() - new_size, Ordering::Relaxed);
                }
                Ok(new_ptr)
            }
            Err(err) => {
                self.state.failures.fetch_add(1, Ordering::Relaxed);
                Err(err)
            }
        }
    }
}
