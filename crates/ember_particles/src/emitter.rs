//! # Emitters
//!
//! Spawn policy attached to a particle pool.
//!
//! - `Continuous`: `emit_rate` particles per second, with fractional
//!   carry-over so low rates still emit
//! - `Burst`: `emit_rate * duration` particles in a single frame
//! - `BurstRemoveOnFinish`: a burst that detaches itself at the next sync

use ember_core::PoolHandle;
use ember_shared::Vec2;
use serde::{Deserialize, Serialize};

use crate::generator::ParticleGenerator;

/// Spawn policy of an emitter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmitterKind {
    /// Emits `emit_rate` particles per second until `duration` elapses.
    #[default]
    Continuous,
    /// Emits `emit_rate * duration` particles once.
    Burst,
    /// Like `Burst`, then releases itself at the next sync.
    BurstRemoveOnFinish,
}

impl EmitterKind {
    /// Returns true for the one-shot kinds.
    #[inline]
    #[must_use]
    pub const fn is_burst(self) -> bool {
        matches!(self, Self::Burst | Self::BurstRemoveOnFinish)
    }
}

/// Handle to an emitter in the shared emitter pool.
///
/// Valid until the emitter is released. A handle kept past release is
/// detected as stale rather than aliasing a newer emitter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EmitterHandle(pub(crate) PoolHandle);

/// Emitter state stored in the shared emitter pool.
#[derive(Clone, Debug)]
pub struct ParticleEmitter {
    kind: EmitterKind,
    position: Vec2,
    duration: f32,
    elapsed_time: f32,
    emit_rate: f32,
    carry_over: f32,
    burst_emitted: bool,
    pending_release: bool,
    generator: ParticleGenerator,
}

impl ParticleEmitter {
    /// Creates a fresh emitter.
    ///
    /// # Arguments
    ///
    /// * `duration` - Seconds to emit; `<= 0` never finishes for `Continuous`
    /// * `emit_rate` - Particles per second
    #[must_use]
    pub fn new(
        kind: EmitterKind,
        position: Vec2,
        duration: f32,
        emit_rate: f32,
        generator: ParticleGenerator,
    ) -> Self {
        Self {
            kind,
            position,
            duration,
            elapsed_time: 0.0,
            emit_rate,
            carry_over: 0.0,
            burst_emitted: false,
            pending_release: false,
            generator,
        }
    }

    /// Spawn policy.
    #[inline]
    #[must_use]
    pub const fn kind(&self) -> EmitterKind {
        self.kind
    }

    /// Spawn origin.
    #[inline]
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.position
    }

    /// Emission duration in seconds.
    #[inline]
    #[must_use]
    pub const fn duration(&self) -> f32 {
        self.duration
    }

    /// Seconds this emitter has been updated for.
    #[inline]
    #[must_use]
    pub const fn elapsed_time(&self) -> f32 {
        self.elapsed_time
    }

    /// Particles per second.
    #[inline]
    #[must_use]
    pub const fn emit_rate(&self) -> f32 {
        self.emit_rate
    }

    /// Accumulated emission not yet converted into particles.
    #[inline]
    #[must_use]
    pub const fn carry_over(&self) -> f32 {
        self.carry_over
    }

    /// True once a burst emitter has fired.
    #[inline]
    #[must_use]
    pub const fn burst_emitted(&self) -> bool {
        self.burst_emitted
    }

    /// True while queued for release at the next sync.
    #[inline]
    #[must_use]
    pub const fn is_pending_release(&self) -> bool {
        self.pending_release
    }

    /// Generator used for new particles.
    #[must_use]
    pub fn generator(&self) -> &ParticleGenerator {
        &self.generator
    }

    /// True when the emitter will not spawn again.
    #[must_use]
    pub fn is_done(&self) -> bool {
        if self.kind.is_burst() {
            return self.burst_emitted;
        }
        self.duration > 0.0 && self.elapsed_time > self.duration
    }

    pub(crate) fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    pub(crate) fn set_generator(&mut self, generator: ParticleGenerator) {
        self.generator = generator;
    }

    pub(crate) fn mark_pending_release(&mut self) {
        self.pending_release = true;
    }

    /// Rewinds the emitter so it emits again from the start.
    pub(crate) fn restart(&mut self) {
        self.elapsed_time = 0.0;
        self.carry_over = 0.0;
        self.burst_emitted = false;
        self.pending_release = false;
    }

    /// Advances the emitter clock and returns how many particles to spawn.
    ///
    /// A continuous emitter that truncates to zero adds its full rate to the
    /// carry-over, which grows until at least one particle is produced.
    pub(crate) fn tick(&mut self, delta_s: f32) -> usize {
        self.elapsed_time += delta_s;

        if self.kind.is_burst() {
            self.burst_emitted = true;
            return to_count(self.emit_rate * self.duration);
        }

        let count = to_count(delta_s * (self.emit_rate + self.carry_over));
        if count == 0 {
            self.carry_over += self.emit_rate;
        } else {
            self.carry_over = 0.0;
        }
        count
    }
}

/// Truncates a particle count; negative and NaN give zero.
#[inline]
fn to_count(value: f32) -> usize {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let count = value as usize;
    count
}
