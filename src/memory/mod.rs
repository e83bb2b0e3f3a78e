//! Memory management for container-internal storage
//!
//! This module provides the allocator hook interface every container is
//! generic over, the stock allocators, and the slot buffer that the vectors and
//! queues grow through.

mod allocator;
mod raw_buf;

pub use allocator::{
    AllocFn, AllocationStats, ContainerAllocator, FnAllocator, FreeFn, SystemAllocator,
    TrackingAllocator,
};
pub use raw_buf::{next_capacity, RawBuf, DEFAULT_GROWTH_FACTOR, MIN_CAPACITY};
