//! # EMBER Particles
//!
//! Fixed-capacity particle simulation designed for:
//! - Bounded memory: every pool and the emitter pool are sized up front
//! - Zero allocations during the per-frame update
//! - Cache-friendly iteration over struct-of-arrays particle storage
//!
//! ## Frame Contract
//!
//! ```text
//! frame N:
//!   update(ctx)   emitters spawn → particles advance → dead particles reaped
//!   sync()        emitters queued for release are detached and freed
//! ```
//!
//! Slot indices are NOT stable across frames. Reaping swaps the last alive
//! particle into the freed slot, so code must never keep a particle index
//! from one frame to the next.
//!
//! ## Example
//!
//! ```rust
//! use ember_particles::{EmitterKind, ParticleGenerator, ParticleSystem, ParticleUpdater, UpdateContext};
//! use ember_shared::Vec2;
//!
//! let mut system = ParticleSystem::new(4, 16);
//! system.allocate_pool(0, 256, ParticleUpdater::default()).unwrap();
//!
//! let emitter = system
//!     .attach_emitter(0, Vec2::ZERO, 2.0, 5.0, EmitterKind::Burst, ParticleGenerator::default())
//!     .unwrap()
//!     .expect("emitter pool has room");
//!
//! let stats = system.update(&UpdateContext::from_delta_s(0.016));
//! system.sync();
//!
//! assert_eq!(stats.spawned, 10);
//! assert!(system.emitter(emitter).unwrap().is_done());
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod context;
pub mod drawer;
pub mod emitter;
pub mod error;
pub mod generator;
pub mod pool;
pub mod shared;
pub mod system;

pub use config::{ParticleSystemConfig, PoolConfig};
pub use context::UpdateContext;
pub use drawer::{BlendMode, ParticleDrawer, ParticleInstance, Texture, TextureFactory, TextureRef, TransformSpace};
pub use emitter::{EmitterHandle, EmitterKind, ParticleEmitter};
pub use error::{ConfigError, ParticleError, ParticleResult};
pub use generator::{
    default_generator, default_updater, GeneratorProperties, ParticleGenerator, ParticleRng,
    ParticleUpdater, SizeSpread,
};
pub use pool::{ParticlePool, ParticleState, ParticleView};
pub use shared::SharedParticleSystem;
pub use system::{ParticleSystem, ParticleSystemStats, UpdateStats};
