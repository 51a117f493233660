//! # Memory Management
//!
//! Pre-allocated object slots for the simulation.
//!
//! Memory is reserved once when the owner is built. During a frame nothing
//! is allocated or freed on the heap, and acquire/release are O(1).

mod pool;

pub use pool::{PoolAllocator, PoolHandle};
