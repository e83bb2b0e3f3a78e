//! Type-erased container types
//!
//! Every container copies caller bytes into storage it owns and exposes a
//! [`Cursor`] that can rewrite the current element in place.
//!
//! ## Sequences
//!
//! - **`TypedVector`** - Fixed-stride dynamic array of opaque byte blobs
//! - **`GenericVector`** - Dynamic array of tagged [`Value`](crate::Value)s
//! - **`SList`** - Singly linked list with O(1) append
//!
//! ## Associative
//!
//! - **`Map`** - AVL tree keyed by an injected comparator, iterated in order
//!
//! ## Queues
//!
//! - **`TypedQueue`** - Ring buffer of fixed-stride blobs with optional auto-grow
//! - **`GenericQueue`** - Ring buffer of tagged values with optional auto-grow

mod cursor;
mod generic_queue;
mod generic_vector;
mod map;
mod slist;
mod typed_queue;
mod typed_vector;

pub use cursor::{Cursor, CursorState};
pub use generic_queue::{GenericQueue, GenericQueueCursor};
pub use generic_vector::{GenericVector, GenericVectorCursor};
pub use map::{Iter as MapIter, Map, MapCursor};
pub use slist::{Iter as SListIter, SList, SListCursor};
pub use typed_queue::{TypedQueue, TypedQueueCursor};
pub use typed_vector::{TypedVector, TypedVectorCursor};
