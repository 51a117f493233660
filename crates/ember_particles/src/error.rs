//! # Particle Error Types
//!
//! All errors that can occur in the particle system.

use thiserror::Error;

/// Errors that can occur when operating on pools and emitters.
///
/// Every variant is a precondition violation: the call was rejected and no
/// state was changed. Running out of emitter slots is not an error, attach
/// calls report it as `Ok(None)`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParticleError {
    /// Pool identifier is outside the range the system was created with.
    #[error("pool id {id} out of range: system has {max_pools} pools")]
    PoolIdOutOfRange {
        /// The offending pool id.
        id: u32,
        /// Number of pool slots in the system.
        max_pools: usize,
    },

    /// Tried to allocate a pool that is already active.
    #[error("pool {0} is already active")]
    PoolAlreadyActive(u32),

    /// Tried to operate on a pool that is not active.
    #[error("pool {0} is not active")]
    PoolInactive(u32),

    /// Pools must hold at least one particle.
    #[error("pool {0} requested with zero capacity")]
    ZeroCapacity(u32),

    /// Damping outside `[0, 1)`.
    #[error("damping {0} outside [0, 1)")]
    InvalidDamping(f32),

    /// Generator properties hold a range that cannot be sampled.
    #[error("invalid generator properties: {0}")]
    InvalidGeneratorProperties(&'static str),

    /// Emitter handle was already released.
    #[error("emitter handle is stale")]
    StaleEmitter,

    /// Emitter is live but attached to a different pool.
    #[error("emitter is not attached to pool {pool_id}")]
    EmitterNotAttached {
        /// The pool the caller named.
        pool_id: u32,
    },
}

/// Result type for particle system operations.
pub type ParticleResult<T> = Result<T, ParticleError>;

/// Errors raised while loading configuration files.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is not valid TOML for the expected schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config parsed but holds unusable values.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
