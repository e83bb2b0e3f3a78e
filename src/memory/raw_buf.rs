//! RawBuf: capacity-managed slot storage behind every container
//!
//! `RawBuf` owns an allocation of `capacity` slots of `T` obtained through a
//! [`ContainerAllocator`]. It never tracks which slots are initialized and
//! never drops elements; the owning container does both. Growth goes through
//! `reallocate`, so a failed growth leaves the previous block and its contents
//! untouched.

use super::allocator::{ContainerAllocator, SystemAllocator};
use crate::error::{Result, StowageError};
use std::alloc::Layout;
use std::marker::PhantomData;
use std::mem;
use std::ptr::{self, NonNull};

/// Smallest non-zero capacity handed out by [`next_capacity`]
pub const MIN_CAPACITY: usize = 4;

/// Default geometric growth factor
pub const DEFAULT_GROWTH_FACTOR: f64 = 2.0;

/// Compute the capacity to grow to when `required` slots are needed
///
/// Growth is geometric: the result is at least `current * factor` (rounded
/// up), at least `required`, and at least [`MIN_CAPACITY`].
pub fn next_capacity(current: usize, required: usize, growth_factor: f64) -> usize {
    let scaled = (current as f64 * growth_factor).ceil();
    let scaled = if scaled >= usize::MAX as f64 {
        usize::MAX
    } else {
        scaled as usize
    };
    // A factor close to 1.0 must still make progress
    let scaled = scaled.max(current.saturating_add(1));
    scaled.max(required).max(MIN_CAPACITY)
}

/// Uninitialized slot storage of `T` allocated through `A`
pub struct RawBuf<T, A: ContainerAllocator = SystemAllocator> {
    ptr: Option<NonNull<T>>,
    cap: usize,
    alloc: A,
    _marker: PhantomData<T>,
}

impl<T, A: ContainerAllocator> RawBuf<T, A> {
    /// Create an empty buffer that has not allocated yet
    #[inline]
    pub fn new_in(alloc: A) -> Self {
        debug_assert!(mem::size_of::<T>() > 0, "zero-sized slots are not supported");
        Self {
            ptr: None,
            cap: 0,
            alloc,
            _marker: PhantomData,
        }
    }

    /// Create a buffer with exactly `cap` slots
    pub fn with_capacity_in(cap: usize, alloc: A) -> Result<Self> {
        let mut buf = Self::new_in(alloc);
        buf.grow_exact(cap)?;
        Ok(buf)
    }

    /// Number of slots
    #[inline]
    pub fn capacity(&self) -> usize {
        self.cap
    }

    /// The allocator backing this buffer
    #[inline]
    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    /// Pointer to slot 0 (null while unallocated)
    #[inline]
    pub fn as_ptr(&self) -> *const T {
        match self.ptr {
            Some(ptr) => ptr.as_ptr(),
            None => ptr::null(),
        }
    }

    /// Mutable pointer to slot 0 (null while unallocated)
    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        match self.ptr {
            Some(ptr) => ptr.as_ptr(),
            None => ptr::null_mut(),
        }
    }

    /// Pointer to slot `index`
    ///
    /// # Safety
    ///
    /// `index < self.capacity()`.
    #[inline]
    pub unsafe fn slot(&self, index: usize) -> *const T {
        debug_assert!(index < self.cap);
        unsafe { self.as_ptr().add(index) }
    }

    /// Mutable pointer to slot `index`
    ///
    /// # Safety
    ///
    /// `index < self.capacity()`.
    #[inline]
    pub unsafe fn slot_mut(&mut self, index: usize) -> *mut T {
        debug_assert!(index < self.cap);
        unsafe { self.as_mut_ptr().add(index) }
    }

    fn layout_for(cap: usize) -> Result<Layout> {
        Layout::array::<T>(cap)
            .map_err(|_| StowageError::allocation_failure(cap.saturating_mul(mem::size_of::<T>())))
    }

    /// Grow to exactly `new_cap` slots, preserving existing slot contents
    ///
    /// Does nothing when `new_cap <= capacity()`. On failure the buffer is
    /// unchanged.
    pub fn grow_exact(&mut self, new_cap: usize) -> Result<()> {
        if new_cap <= self.cap {
            return Ok(());
        }

        let new_layout = Self::layout_for(new_cap)?;
        let new_ptr = match self.ptr {
            Some(ptr) => {
                let old_layout = Self::layout_for(self.cap)?;
                unsafe {
                    self.alloc
                        .reallocate(ptr.cast(), old_layout, new_layout.size())?
                }
            }
            None => self.alloc.allocate(new_layout)?,
        };

        self.ptr = Some(new_ptr.cast());
        self.cap = new_cap;
        Ok(())
    }

    /// Grow geometrically so that at least `required` slots exist
    pub fn reserve_for(&mut self, required: usize, growth_factor: f64) -> Result<()> {
        if required <= self.cap {
            return Ok(());
        }
        let target = next_capacity(self.cap, required, growth_factor);
        log::debug!(
            "growing {}-byte slot buffer from {} to {} slots",
            mem::size_of::<T>(),
            self.cap,
            target
        );
        self.grow_exact(target)
    }

    /// Allocate a fresh, empty buffer of `cap` slots using a clone of this
    /// buffer's allocator
    pub fn sibling(&self, cap: usize) -> Result<Self> {
        Self::with_capacity_in(cap, self.alloc.clone())
    }

    /// Exchange storage with another buffer
    #[inline]
    pub fn swap_storage(&mut self, other: &mut Self) {
        mem::swap(&mut self.ptr, &mut other.ptr);
        mem::swap(&mut self.cap, &mut other.cap);
        mem::swap(&mut self.alloc, &mut other.alloc);
    }
}

impl<T, A: ContainerAllocator> Drop for RawBuf<T, A> {
    fn drop(&mut self) {
        if let Some(ptr) = self.ptr.take() {
            if let Ok(layout) = Self::layout_for(self.cap) {
                unsafe { self.alloc.deallocate(ptr.cast(), layout) }
            }
        }
    }
}

// Safety: RawBuf owns its block exclusively; sending it sends the slots
unsafe impl<T: Send, A: ContainerAllocator + Send> Send for RawBuf<T, A> {}
