//! # EMBER Core
//!
//! Memory primitives shared by the EMBER particle engine.
//!
//! ## Architecture Rules
//!
//! 1. **No heap allocations in hot path** - All memory is pre-allocated
//! 2. **Stable handles** - A handle is valid until its slot is explicitly freed
//! 3. **Stale handles are detected** - Reused slots carry a new generation
//!
//! ## Example
//!
//! ```rust
//! use ember_core::PoolAllocator;
//!
//! let mut pool: PoolAllocator<u32> = PoolAllocator::new(16);
//! let handle = pool.allocate(7).expect("pool has room");
//! assert_eq!(pool.get(handle), Some(&7));
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod memory;

pub use memory::{PoolAllocator, PoolHandle};
