//! # Stowage: Type-Erased Containers and Dual-Width Strings
//!
//! Stowage stores opaque, runtime-tagged data in owned containers. Every
//! element is a byte payload plus a [`TypeTag`]; containers copy what they
//! are given, compare through an injected [`Comparator`], and obtain memory
//! through a [`ContainerAllocator`](memory::ContainerAllocator) chosen at
//! construction.
//!
//! ## Key Features
//!
//! - **Vectors**: [`TypedVector`] for fixed-stride blobs, [`GenericVector`] for tagged values
//! - **Linked list**: [`SList`] with O(1) append and value-match replacement
//! - **Ordered map**: [`Map`], a balanced tree iterated in key order
//! - **Queues**: [`TypedQueue`] and [`GenericQueue`] ring buffers with optional auto-grow
//! - **Strings**: [`NarrowString`] and [`WideString`] with search, splice, split and numeric conversion
//! - **Cursors**: one [`Cursor`] protocol for traversal and in-place replacement
//! - **Allocation hooks**: custom or tracking allocators, with failures reported as errors
//!
//! ## Quick Start
//!
//! ```rust
//! use stowage::{GenericVector, Map, NarrowString, SList, TypeTag, TypedQueue, Value};
//!
//! // Tagged values, copied in
//! let mut vec = GenericVector::new();
//! vec.push_back(TypeTag::Int32, &7i32.to_ne_bytes())?;
//! vec.push_value(Value::from_str("seven"))?;
//! assert_eq!(vec.item(0)?.as_i32()?, 7);
//!
//! // Ordered map with the default bytewise comparator
//! let mut map = Map::new();
//! map.insert_value(Value::from_str("b"), Value::from_u32(2))?;
//! map.insert_value(Value::from_str("a"), Value::from_u32(1))?;
//! let first = map.iter().next().map(|(k, _)| k.clone());
//! assert_eq!(first, Some(Value::from_str("a")));
//!
//! // Linked list
//! let mut list = SList::new();
//! list.push_back(TypeTag::UInt8, &[1])?;
//! list.push_front(TypeTag::UInt8, &[0])?;
//! assert_eq!(list.len(), 2);
//!
//! // Fixed-stride FIFO
//! let mut queue = TypedQueue::new(4)?;
//! queue.push(&1u32.to_ne_bytes())?;
//! assert_eq!(queue.pop(), Some(1u32.to_ne_bytes().to_vec()));
//!
//! // Strings
//! let mut s = NarrowString::from_str("Hello ctl world!");
//! s.remove_range(6, 4)?;
//! assert_eq!(s.to_std_string(), "Hello world!");
//! # Ok::<(), stowage::StowageError>(())
//! ```

#![warn(missing_docs)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod config;
pub mod containers;
pub mod error;
pub mod memory;
pub mod string;
pub mod value;

// Re-export core types
pub use error::{Result, StowageError};
pub use value::{Comparator, RawComparator, Reverse, TypeTag, Value, ValueComparator};

// Containers and their cursors
pub use containers::{
    Cursor, CursorState, GenericQueue, GenericQueueCursor, GenericVector, GenericVectorCursor,
    Map, MapCursor, SList, SListCursor, TypedQueue, TypedQueueCursor, TypedVector,
    TypedVectorCursor,
};

// Strings
pub use string::{CharWidth, Narrow, NarrowString, Splitter, Text, Wide, WideString};

// Configuration
pub use config::{Config, ContainerConfig};

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the library, logging its version at debug level
pub fn init() {
    log::debug!("Initializing stowage v{}", VERSION);
}
