//! # Particle Pool
//!
//! Struct-of-arrays particle storage with an alive/dead partition.
//!
//! ```text
//! index:   0 .. alive_count | alive_count .. capacity
//!          alive particles  | free slots (contents undefined)
//! ```
//!
//! Admission and reaping both swap a full attribute tuple with the slot at
//! the partition boundary and move the boundary, so both are O(1) and never
//! allocate. The price is that slot indices are not stable: a particle may
//! sit at a different index every frame.

use std::fmt;

use ember_shared::{ColorGradient, Rgba, Vec2};

use crate::drawer::ParticleInstance;
use crate::generator::ParticleUpdater;

/// Mutable view of one particle's attributes across the parallel arrays.
///
/// Generators fill every field of a freshly admitted slot; updaters advance
/// an alive one.
pub struct ParticleView<'a> {
    /// Position.
    pub position: &'a mut Vec2,
    /// Velocity in units per second.
    pub velocity: &'a mut Vec2,
    /// Rotation in radians.
    pub rotation: &'a mut f32,
    /// Angular velocity in radians per second.
    pub angular_velocity: &'a mut f32,
    /// Current color.
    pub color: &'a mut Rgba,
    /// Gradient sampled over normalized age.
    pub gradient: &'a mut ColorGradient,
    /// Current size.
    pub size: &'a mut f32,
    /// Size at birth.
    pub start_size: &'a mut f32,
    /// Size at death.
    pub end_size: &'a mut f32,
    /// Remaining life in seconds.
    pub life: &'a mut f32,
    /// Life at birth in seconds.
    pub start_life: &'a mut f32,
}

impl ParticleView<'_> {
    /// Overwrites every attribute with `state`.
    pub fn set(&mut self, state: &ParticleState) {
        *self.position = state.position;
        *self.velocity = state.velocity;
        *self.rotation = state.rotation;
        *self.angular_velocity = state.angular_velocity;
        *self.color = state.color;
        *self.gradient = state.gradient;
        *self.size = state.size;
        *self.start_size = state.start_size;
        *self.end_size = state.end_size;
        *self.life = state.life;
        *self.start_life = state.start_life;
    }

    /// Normalized age: 0 at birth, 1 at death.
    #[must_use]
    pub fn normalized_age(&self) -> f32 {
        if *self.start_life > 0.0 {
            1.0 - *self.life / *self.start_life
        } else {
            1.0
        }
    }
}

/// Owned copy of one particle's attributes.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ParticleState {
    /// Position.
    pub position: Vec2,
    /// Velocity in units per second.
    pub velocity: Vec2,
    /// Rotation in radians.
    pub rotation: f32,
    /// Angular velocity in radians per second.
    pub angular_velocity: f32,
    /// Current color.
    pub color: Rgba,
    /// Gradient sampled over normalized age.
    pub gradient: ColorGradient,
    /// Current size.
    pub size: f32,
    /// Size at birth.
    pub start_size: f32,
    /// Size at death.
    pub end_size: f32,
    /// Remaining life in seconds.
    pub life: f32,
    /// Life at birth in seconds.
    pub start_life: f32,
}

/// The parallel attribute arrays. Index `i` in every array is the same particle.
#[derive(Default)]
struct ParticleAttributes {
    position: Vec<Vec2>,
    velocity: Vec<Vec2>,
    rotation: Vec<f32>,
    angular_velocity: Vec<f32>,
    color: Vec<Rgba>,
    gradient: Vec<ColorGradient>,
    size: Vec<f32>,
    start_size: Vec<f32>,
    end_size: Vec<f32>,
    life: Vec<f32>,
    start_life: Vec<f32>,
}

impl ParticleAttributes {
    fn resize(&mut self, capacity: usize) {
        self.position.resize(capacity, Vec2::ZERO);
        self.velocity.resize(capacity, Vec2::ZERO);
        self.rotation.resize(capacity, 0.0);
        self.angular_velocity.resize(capacity, 0.0);
        self.color.resize(capacity, Rgba::WHITE);
        self.gradient.resize(capacity, ColorGradient::default());
        self.size.resize(capacity, 0.0);
        self.start_size.resize(capacity, 0.0);
        self.end_size.resize(capacity, 0.0);
        self.life.resize(capacity, 0.0);
        self.start_life.resize(capacity, 0.0);
    }

    /// Swaps the full attribute tuple of two slots.
    #[inline]
    fn swap(&mut self, first: usize, second: usize) {
        self.position.swap(first, second);
        self.velocity.swap(first, second);
        self.rotation.swap(first, second);
        self.angular_velocity.swap(first, second);
        self.color.swap(first, second);
        self.gradient.swap(first, second);
        self.size.swap(first, second);
        self.start_size.swap(first, second);
        self.end_size.swap(first, second);
        self.life.swap(first, second);
        self.start_life.swap(first, second);
    }

    #[inline]
    fn view(&mut self, index: usize) -> ParticleView<'_> {
        ParticleView {
            position: &mut self.position[index],
            velocity: &mut self.velocity[index],
            rotation: &mut self.rotation[index],
            angular_velocity: &mut self.angular_velocity[index],
            color: &mut self.color[index],
            gradient: &mut self.gradient[index],
            size: &mut self.size[index],
            start_size: &mut self.start_size[index],
            end_size: &mut self.end_size[index],
            life: &mut self.life[index],
            start_life: &mut self.start_life[index],
        }
    }

    fn state(&self, index: usize) -> ParticleState {
        ParticleState {
            position: self.position[index],
            velocity: self.velocity[index],
            rotation: self.rotation[index],
            angular_velocity: self.angular_velocity[index],
            color: self.color[index],
            gradient: self.gradient[index],
            size: self.size[index],
            start_size: self.start_size[index],
            end_size: self.end_size[index],
            life: self.life[index],
            start_life: self.start_life[index],
        }
    }
}

/// Fixed-capacity particle store.
///
/// The pool is sized when it is created or when its system (re)configures
/// it, and never grows during simulation. Alive particles always occupy
/// `[0, alive_count)`.
///
/// Capacity cannot be changed through a borrowed pool:
///
/// ```compile_fail
/// use ember_particles::{ParticlePool, ParticleUpdater};
///
/// let mut pool = ParticlePool::with_capacity(16, ParticleUpdater::default());
/// pool.configure(0, ParticleUpdater::default());
/// ```
pub struct ParticlePool {
    attributes: ParticleAttributes,
    capacity: usize,
    alive_count: usize,
    damping: f32,
    updater: ParticleUpdater,
}

impl Default for ParticlePool {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ParticlePool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParticlePool")
            .field("capacity", &self.capacity)
            .field("alive_count", &self.alive_count)
            .field("damping", &self.damping)
            .finish_non_exhaustive()
    }
}

impl ParticlePool {
    /// Creates an empty, zero-capacity pool using the default updater.
    #[must_use]
    pub fn new() -> Self {
        Self {
            attributes: ParticleAttributes::default(),
            capacity: 0,
            alive_count: 0,
            damping: 0.0,
            updater: ParticleUpdater::default(),
        }
    }

    /// Creates a pool ready to simulate `capacity` particles.
    #[must_use]
    pub fn with_capacity(capacity: usize, updater: ParticleUpdater) -> Self {
        let mut pool = Self::new();
        pool.configure(capacity, updater);
        pool
    }

    /// Resizes every attribute array to `capacity` and kills all particles.
    ///
    /// This is the only call that allocates. Capacity is checked by the
    /// owning system before it gets here.
    pub(crate) fn configure(&mut self, capacity: usize, updater: ParticleUpdater) {
        self.attributes.resize(capacity);
        self.capacity = capacity;
        self.alive_count = 0;
        self.updater = updater;
    }

    /// Returns the fixed capacity.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of alive particles.
    #[inline]
    #[must_use]
    pub const fn alive_count(&self) -> usize {
        self.alive_count
    }

    /// Highest alive count admission can reach.
    ///
    /// One slot is held back: admission never targets the last slot.
    #[inline]
    #[must_use]
    pub const fn spawn_ceiling(&self) -> usize {
        self.capacity.saturating_sub(1)
    }

    /// Returns the velocity damping factor.
    #[inline]
    #[must_use]
    pub const fn damping(&self) -> f32 {
        self.damping
    }

    /// Sets the velocity damping factor, expected in `[0, 1)`.
    pub(crate) fn set_damping(&mut self, damping: f32) {
        self.damping = damping;
    }

    /// Returns the per-particle update function.
    #[must_use]
    pub fn updater(&self) -> &ParticleUpdater {
        &self.updater
    }

    /// Replaces the per-particle update function.
    pub fn set_updater(&mut self, updater: ParticleUpdater) {
        self.updater = updater;
    }

    /// Kills every particle without touching the arrays.
    pub fn clear(&mut self) {
        self.alive_count = 0;
    }

    // =========================================================================
    // Swap compaction
    // =========================================================================

    /// Moves the particle at `index` into the alive partition.
    ///
    /// No-op when the pool is full.
    #[inline]
    fn wake(&mut self, index: usize) {
        if self.alive_count < self.capacity {
            self.attributes.swap(index, self.alive_count);
            self.alive_count += 1;
        }
    }

    /// Admits up to `count` new particles, initialising each with `init`.
    ///
    /// The batch is clipped so the alive count never passes
    /// [`spawn_ceiling`](Self::spawn_ceiling). Clipping is silent.
    ///
    /// # Returns
    ///
    /// The number of particles actually admitted.
    pub fn admit<F>(&mut self, count: usize, mut init: F) -> usize
    where
        F: FnMut(&mut ParticleView<'_>),
    {
        let start = self.alive_count;
        let end = start.saturating_add(count).min(self.spawn_ceiling());
        if end <= start {
            return 0;
        }

        for index in start..end {
            init(&mut self.attributes.view(index));
        }
        for index in start..end {
            self.wake(index);
        }

        end - start
    }

    /// Admits a single particle with the given state.
    ///
    /// # Returns
    ///
    /// `false` if the pool is at its spawn ceiling.
    pub fn spawn(&mut self, state: &ParticleState) -> bool {
        self.admit(1, |view| view.set(state)) == 1
    }

    /// Applies damping and the update function to every alive particle.
    pub fn advance(&mut self, delta_s: f32) {
        let Self {
            attributes,
            alive_count,
            damping,
            updater,
            ..
        } = self;

        let keep = 1.0 - *damping;
        for index in 0..*alive_count {
            attributes.velocity[index] *= keep;
            updater.update(&mut attributes.view(index), delta_s);
        }
    }

    /// Ages every alive particle by `delta_s` and reaps the dead ones.
    ///
    /// A dead particle is swapped with the last alive one and the boundary
    /// moves down. The particle swapped in has not been aged yet, so the same
    /// index is examined again before moving on: every alive particle is aged
    /// exactly once per call.
    ///
    /// # Returns
    ///
    /// The number of particles reaped.
    pub fn reap(&mut self, delta_s: f32) -> usize {
        let mut reaped = 0;
        let mut index = 0;

        while index < self.alive_count {
            let life = &mut self.attributes.life[index];
            *life -= delta_s;

            if *life <= 0.0 {
                self.alive_count -= 1;
                self.attributes.swap(index, self.alive_count);
                reaped += 1;
            } else {
                index += 1;
            }
        }

        reaped
    }

    // =========================================================================
    // Read access for renderers and diagnostics
    // =========================================================================

    /// Copies the alive particle at `index`.
    #[must_use]
    pub fn particle(&self, index: usize) -> Option<ParticleState> {
        (index < self.alive_count).then(|| self.attributes.state(index))
    }

    /// Iterates over copies of all alive particles, in slot order.
    pub fn iter(&self) -> impl Iterator<Item = ParticleState> + '_ {
        (0..self.alive_count).map(|index| self.attributes.state(index))
    }

    /// Positions of alive particles.
    #[inline]
    #[must_use]
    pub fn positions(&self) -> &[Vec2] {
        &self.attributes.position[..self.alive_count]
    }

    /// Velocities of alive particles.
    #[inline]
    #[must_use]
    pub fn velocities(&self) -> &[Vec2] {
        &self.attributes.velocity[..self.alive_count]
    }

    /// Rotations of alive particles.
    #[inline]
    #[must_use]
    pub fn rotations(&self) -> &[f32] {
        &self.attributes.rotation[..self.alive_count]
    }

    /// Colors of alive particles.
    #[inline]
    #[must_use]
    pub fn colors(&self) -> &[Rgba] {
        &self.attributes.color[..self.alive_count]
    }

    /// Sizes of alive particles.
    #[inline]
    #[must_use]
    pub fn sizes(&self) -> &[f32] {
        &self.attributes.size[..self.alive_count]
    }

    /// Remaining lives of alive particles.
    #[inline]
    #[must_use]
    pub fn lives(&self) -> &[f32] {
        &self.attributes.life[..self.alive_count]
    }

    /// Packs alive particles into `out` for GPU upload.
    ///
    /// # Returns
    ///
    /// Number of instances written; at most `out.len()`.
    pub fn write_instances(&self, out: &mut [ParticleInstance]) -> usize {
        let count = self.alive_count.min(out.len());
        let attributes = &self.attributes;
        for (index, instance) in out[..count].iter_mut().enumerate() {
            *instance = ParticleInstance::new(
                attributes.position[index],
                attributes.rotation[index],
                attributes.size[index],
                attributes.color[index],
            );
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_life(life: f32) -> ParticleState {
        ParticleState {
            life,
            start_life: life,
            size: 1.0,
            ..ParticleState::default()
        }
    }

    fn still_pool(capacity: usize) -> ParticlePool {
        ParticlePool::with_capacity(capacity, ParticleUpdater::new(|_, _| {}))
    }

    #[test]
    fn test_pool_configure() {
        let pool = still_pool(100);
        assert_eq!(pool.capacity(), 100);
        assert_eq!(pool.alive_count(), 0);
        assert_eq!(pool.spawn_ceiling(), 99);
    }

    #[test]
    fn test_admit_clips_to_ceiling() {
        let mut pool = still_pool(8);

        let admitted = pool.admit(100, |view| view.set(&with_life(1.0)));
        assert_eq!(admitted, 7);
        assert_eq!(pool.alive_count(), 7);

        // Already at the ceiling
        assert_eq!(pool.admit(5, |view| view.set(&with_life(1.0))), 0);
        assert!(!pool.spawn(&with_life(1.0)));
        assert_eq!(pool.alive_count(), 7);
    }

    #[test]
    fn test_admit_on_zero_capacity() {
        let mut pool = ParticlePool::new();
        assert_eq!(pool.admit(3, |view| view.set(&with_life(1.0))), 0);
        assert_eq!(pool.alive_count(), 0);
    }

    #[test]
    fn test_reap_exactly_once_per_particle() {
        let mut pool = still_pool(4);
        for life in [0.1, 5.0, 0.1] {
            assert!(pool.spawn(&with_life(life)));
        }

        let reaped = pool.reap(0.2);

        assert_eq!(reaped, 2);
        assert_eq!(pool.alive_count(), 1);
        assert!((pool.lives()[0] - 4.8).abs() < 1e-5);
    }

    #[test]
    fn test_reap_swapped_survivor_is_aged_once() {
        let mut pool = still_pool(4);
        for life in [0.1, 1.0, 2.0] {
            pool.spawn(&with_life(life));
        }

        pool.reap(0.5);

        let mut lives = pool.lives().to_vec();
        lives.sort_by(f32::total_cmp);
        assert_eq!(lives.len(), 2);
        assert!((lives[0] - 0.5).abs() < 1e-6);
        assert!((lives[1] - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_reap_keeps_tuples_together() {
        let mut pool = still_pool(8);
        for i in 0..5u8 {
            let life = if i % 2 == 0 { 0.05 } else { 10.0 };
            let state = ParticleState {
                position: Vec2::new(f32::from(i), 0.0),
                ..with_life(life)
            };
            pool.spawn(&state);
        }

        pool.reap(0.1);

        let mut xs: Vec<f32> = pool.iter().map(|p| p.position.x).collect();
        xs.sort_by(f32::total_cmp);
        assert_eq!(xs, vec![1.0, 3.0]);
        for particle in pool.iter() {
            assert!((particle.life - 9.9).abs() < 1e-5);
        }
    }

    #[test]
    fn test_advance_applies_damping_then_updater() {
        let mut pool = ParticlePool::with_capacity(4, ParticleUpdater::default());
        pool.set_damping(0.5);
        pool.spawn(&ParticleState {
            velocity: Vec2::new(2.0, 0.0),
            ..with_life(1.0)
        });

        pool.advance(1.0);

        let particle = pool.particle(0).unwrap();
        assert_eq!(particle.velocity, Vec2::new(1.0, 0.0));
        assert_eq!(particle.position, Vec2::new(1.0, 0.0));
    }

    #[test]
    fn test_write_instances() {
        let mut pool = still_pool(4);
        pool.spawn(&ParticleState {
            position: Vec2::new(3.0, 4.0),
            size: 2.0,
            ..with_life(1.0)
        });

        let mut out = [ParticleInstance::default(); 8];
        assert_eq!(pool.write_instances(&mut out), 1);
        assert_eq!(out[0].position, [3.0, 4.0]);
        assert_eq!(out[0].size, 2.0);
    }

    #[test]
    fn test_particle_out_of_alive_range() {
        let mut pool = still_pool(4);
        pool.spawn(&with_life(1.0));
        assert!(pool.particle(0).is_some());
        assert!(pool.particle(1).is_none());
    }
}
