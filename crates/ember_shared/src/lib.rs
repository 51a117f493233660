//! # EMBER Shared
//!
//! Value types used by the particle engine and its collaborators.
//!
//! Only the subset of vector and color math the simulation needs lives here.
//! Everything is `Pod` so render backends can copy it straight into GPU buffers.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod color;
pub mod math;

pub use color::{ColorGradient, Rgba};
pub use math::{to_radians, Interval, Vec2};
