//! # Generators and Updaters
//!
//! Pluggable per-particle behaviour stored as shared callables:
//! - A generator fills a freshly admitted slot from a spawn position
//! - An updater advances an alive particle by one frame
//!
//! Both are `Arc`-backed, so cloning one into many emitters or pools costs a
//! reference count bump and nothing else.

use std::fmt;
use std::sync::Arc;

use ember_shared::{to_radians, ColorGradient, Interval, Rgba, Vec2};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{ParticleError, ParticleResult};
use crate::pool::ParticleView;

/// Random source handed to generators. Seeded, so runs are reproducible.
pub type ParticleRng = rand_chacha::ChaCha8Rng;

type GeneratorFn = dyn Fn(Vec2, &mut ParticleView<'_>, &mut ParticleRng) + Send + Sync;
type UpdaterFn = dyn Fn(&mut ParticleView<'_>, f32) + Send + Sync;

/// Initializes a newly spawned particle from a spawn position.
#[derive(Clone)]
pub struct ParticleGenerator(Arc<GeneratorFn>);

impl ParticleGenerator {
    /// Wraps a generator function.
    pub fn new<F>(generate: F) -> Self
    where
        F: Fn(Vec2, &mut ParticleView<'_>, &mut ParticleRng) + Send + Sync + 'static,
    {
        Self(Arc::new(generate))
    }

    /// Generator producing particles from [`GeneratorProperties`].
    #[must_use]
    pub fn from_properties(properties: GeneratorProperties) -> Self {
        Self::new(move |position, view, rng| properties.generate(position, view, rng))
    }

    /// Fills `view` with a new particle spawned at `position`.
    #[inline]
    pub fn generate(&self, position: Vec2, view: &mut ParticleView<'_>, rng: &mut ParticleRng) {
        (self.0)(position, view, rng);
    }
}

impl Default for ParticleGenerator {
    fn default() -> Self {
        Self::new(default_generator)
    }
}

impl fmt::Debug for ParticleGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ParticleGenerator")
    }
}

/// Advances one alive particle by `delta_s` seconds.
#[derive(Clone)]
pub struct ParticleUpdater(Arc<UpdaterFn>);

impl ParticleUpdater {
    /// Wraps an update function.
    pub fn new<F>(update: F) -> Self
    where
        F: Fn(&mut ParticleView<'_>, f32) + Send + Sync + 'static,
    {
        Self(Arc::new(update))
    }

    /// Advances `view` by `delta_s` seconds.
    #[inline]
    pub fn update(&self, view: &mut ParticleView<'_>, delta_s: f32) {
        (self.0)(view, delta_s);
    }
}

impl Default for ParticleUpdater {
    fn default() -> Self {
        Self::new(default_updater)
    }
}

impl fmt::Debug for ParticleUpdater {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ParticleUpdater")
    }
}

/// Returns true if `interval` has finite bounds and a finite span.
fn is_sampleable(interval: Interval) -> bool {
    interval.min.is_finite() && interval.max.is_finite() && (interval.max - interval.min).is_finite()
}

/// Uniform sample in `interval`; degenerate or inverted intervals yield `min`,
/// as do intervals whose span does not fit in an `f32`.
fn sample(rng: &mut ParticleRng, interval: Interval) -> f32 {
    if interval.min < interval.max && is_sampleable(interval) {
        rng.gen_range(interval.min..interval.max)
    } else {
        interval.min
    }
}

/// Fallback generator: a short-lived fountain cycling red, green, blue, white.
pub fn default_generator(position: Vec2, view: &mut ParticleView<'_>, rng: &mut ParticleRng) {
    let x = sample(rng, Interval::new(-2.0, 2.0));
    let y = sample(rng, Interval::new(0.5, 4.0));
    let life = 1.0 + sample(rng, Interval::new(0.0, 0.5));

    *view.position = position;
    *view.velocity = Vec2::new(x, y);
    *view.rotation = 0.0;
    *view.angular_velocity = 0.0;

    *view.gradient = ColorGradient::new(
        [0.0, 0.25, 0.5, 1.0],
        [Rgba::RED, Rgba::GREEN, Rgba::BLUE, Rgba::WHITE],
    );
    *view.color = view.gradient.color[0];

    *view.size = 32.0;
    *view.start_size = 32.0;
    *view.end_size = 24.0;

    *view.start_life = life;
    *view.life = life;
}

/// Integrates position and rotation, then derives color and size from age.
pub fn default_updater(view: &mut ParticleView<'_>, delta_s: f32) {
    let t = view.normalized_age();

    *view.position += *view.velocity * delta_s;
    *view.color = view.gradient.sample(t);
    *view.size = (1.0 - t) * *view.start_size + t * *view.end_size;
    *view.rotation += *view.angular_velocity * delta_s;
}

/// Base value plus a random spread.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SizeSpread {
    /// Base size.
    pub value: f32,
    /// Added uniformly at spawn.
    pub spread: Interval,
}

impl SizeSpread {
    /// Size with no randomness.
    #[must_use]
    pub const fn fixed(value: f32) -> Self {
        Self {
            value,
            spread: Interval::fixed(0.0),
        }
    }
}

/// Parameters for an area emitter.
///
/// Particles spawn uniformly inside `emit_area` centred on the emitter,
/// heading in a random direction from `direction_degrees` (0 is +Y).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorProperties {
    /// Width and height of the spawn rectangle.
    pub emit_area: Vec2,
    /// Launch direction range in degrees.
    pub direction_degrees: Interval,
    /// Launch speed range.
    pub magnitude: Interval,
    /// Spin range in radians per second.
    pub angular_velocity: Interval,
    /// Color over life.
    pub color_gradient: ColorGradient,
    /// Size at birth.
    pub start_size: SizeSpread,
    /// Size at death.
    pub end_size: SizeSpread,
    /// Lifetime range in seconds.
    pub life: Interval,
}

impl Default for GeneratorProperties {
    fn default() -> Self {
        Self {
            emit_area: Vec2::ZERO,
            direction_degrees: Interval::new(0.0, 360.0),
            magnitude: Interval::new(1.0, 2.0),
            angular_velocity: Interval::fixed(0.0),
            color_gradient: ColorGradient::default(),
            start_size: SizeSpread::fixed(16.0),
            end_size: SizeSpread::fixed(16.0),
            life: Interval::new(0.5, 1.0),
        }
    }
}

impl GeneratorProperties {
    /// Checks that every range can be sampled.
    ///
    /// # Errors
    ///
    /// Returns [`ParticleError::InvalidGeneratorProperties`] naming the first
    /// range with a non-finite bound or span.
    pub fn validate(&self) -> ParticleResult<()> {
        let half_area = self.emit_area / 2.0;
        let ranges = [
            ("emit_area.x", Interval::new(-half_area.x, half_area.x)),
            ("emit_area.y", Interval::new(-half_area.y, half_area.y)),
            ("direction_degrees", self.direction_degrees),
            ("magnitude", self.magnitude),
            ("angular_velocity", self.angular_velocity),
            ("start_size.spread", self.start_size.spread),
            ("end_size.spread", self.end_size.spread),
            ("life", self.life),
        ];
        if let Some(&(name, _)) = ranges.iter().find(|(_, range)| !is_sampleable(*range)) {
            return Err(ParticleError::InvalidGeneratorProperties(name));
        }
        if !self.start_size.value.is_finite() || !self.end_size.value.is_finite() {
            return Err(ParticleError::InvalidGeneratorProperties("size value"));
        }
        Ok(())
    }

    /// Fills `view` with a particle spawned around `position`.
    pub fn generate(&self, position: Vec2, view: &mut ParticleView<'_>, rng: &mut ParticleRng) {
        let half_area = self.emit_area / 2.0;
        let offset = Vec2::new(
            sample(rng, Interval::new(-half_area.x, half_area.x)),
            sample(rng, Interval::new(-half_area.y, half_area.y)),
        );

        let direction = to_radians(sample(rng, self.direction_degrees));
        let magnitude = sample(rng, self.magnitude);

        *view.position = position + offset;
        *view.velocity = Vec2::from_angle(direction) * magnitude;
        *view.rotation = 0.0;
        *view.angular_velocity = sample(rng, self.angular_velocity);
        *view.color = self.color_gradient.color[0];
        *view.gradient = self.color_gradient;
        *view.start_size = self.start_size.value + sample(rng, self.start_size.spread);
        *view.end_size = self.end_size.value + sample(rng, self.end_size.spread);
        *view.size = *view.start_size;
        *view.life = sample(rng, self.life);
        *view.start_life = *view.life;
    }
}
