//! # Configuration
//!
//! TOML-backed settings, loaded once at startup.
//!
//! ```toml
//! max_pools = 128
//! max_emitters = 512
//! rng_seed = 42
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::drawer::{BlendMode, TransformSpace};
use crate::error::ConfigError;

/// Sizing of a [`ParticleSystem`](crate::ParticleSystem).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleSystemConfig {
    /// Number of pool slots; pool ids range over `0..max_pools`.
    pub max_pools: usize,
    /// Capacity of the shared emitter pool.
    pub max_emitters: usize,
    /// Seed for the generator random source.
    pub rng_seed: u64,
}

impl ParticleSystemConfig {
    /// Default seed for the generator random source.
    pub const DEFAULT_SEED: u64 = 0x5EED_E3BE;

    /// Parses and validates a config from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on malformed TOML and
    /// [`ConfigError::Invalid`] on out-of-range values.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise the
    /// same errors as [`from_toml_str`](Self::from_toml_str).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Checks that every value is usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_pools == 0 {
            return Err(ConfigError::Invalid("max_pools must be greater than zero".into()));
        }
        if u32::try_from(self.max_pools).is_err() {
            return Err(ConfigError::Invalid("max_pools cannot exceed u32::MAX".into()));
        }
        if self.max_emitters == 0 {
            return Err(ConfigError::Invalid("max_emitters must be greater than zero".into()));
        }
        if u32::try_from(self.max_emitters).is_err() {
            return Err(ConfigError::Invalid("max_emitters cannot exceed u32::MAX".into()));
        }
        Ok(())
    }
}

impl Default for ParticleSystemConfig {
    fn default() -> Self {
        Self {
            max_pools: 64,
            max_emitters: 256,
            rng_seed: Self::DEFAULT_SEED,
        }
    }
}

/// Full configuration of one pool: storage, physics and draw state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Number of particle slots.
    pub capacity: usize,
    /// Texture name, resolved through a [`TextureFactory`](crate::TextureFactory).
    pub texture: String,
    /// Blend mode.
    pub blend_mode: BlendMode,
    /// Coordinate space.
    pub transform_space: TransformSpace,
    /// Velocity damping per update, in `[0, 1)`.
    pub damping: f32,
}

impl PoolConfig {
    /// Parses a pool config from TOML text.
    ///
    /// Values are checked when the config is applied to a pool.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on malformed TOML.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            capacity: 10,
            texture: String::new(),
            blend_mode: BlendMode::default(),
            transform_space: TransformSpace::default(),
            damping: 0.0,
        }
    }
}

/// Returns true if `damping` lies in `[0, 1)`.
pub(crate) fn is_valid_damping(damping: f32) -> bool {
    (0.0..1.0).contains(&damping)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_config_defaults() {
        let config = ParticleSystemConfig::from_toml_str("").unwrap();
        assert_eq!(config, ParticleSystemConfig::default());
    }

    #[test]
    fn test_system_config_parse() {
        let config = ParticleSystemConfig::from_toml_str(
            "max_pools = 8\nmax_emitters = 32\nrng_seed = 1\n",
        )
        .unwrap();
        assert_eq!(config.max_pools, 8);
        assert_eq!(config.max_emitters, 32);
        assert_eq!(config.rng_seed, 1);
    }

    #[test]
    fn test_system_config_rejects_zero() {
        let err = ParticleSystemConfig::from_toml_str("max_emitters = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_system_config_rejects_garbage() {
        let err = ParticleSystemConfig::from_toml_str("max_pools = \"many\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = ParticleSystemConfig::load("/nonexistent/ember/particles.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_pool_config_parse() {
        let config = PoolConfig::from_toml_str(
            r#"
            capacity = 500
            texture = "res/textures/spark.png"
            blend_mode = "additive"
            transform_space = "world"
            damping = 0.1
            "#,
        )
        .unwrap();

        assert_eq!(config.capacity, 500);
        assert_eq!(config.texture, "res/textures/spark.png");
        assert_eq!(config.blend_mode, BlendMode::Additive);
        assert_eq!(config.transform_space, TransformSpace::World);
        assert!(is_valid_damping(config.damping));
    }

    #[test]
    fn test_damping_range() {
        assert!(is_valid_damping(0.0));
        assert!(is_valid_damping(0.99));
        assert!(!is_valid_damping(1.0));
        assert!(!is_valid_damping(-0.1));
        assert!(!is_valid_damping(f32::NAN));
    }
}
