//! # Particle System
//!
//! Owns every pool slot and the shared emitter pool, and drives them once per
//! frame.
//!
//! ## Frame Order
//!
//! ```text
//! update(ctx):
//!   for each active pool, in id order:
//!     1. update attached emitters      (may admit particles)
//!     2. damp + advance alive particles
//!     3. age alive particles, reap the dead (swap compaction)
//! sync():
//!   release emitters queued during update
//! ```
//!
//! Emitters never detach themselves during `update`. An emitter that wants to
//! go is queued and detached in `sync`, so the per-pool emitter list is never
//! mutated while it is being iterated.

use ember_core::PoolAllocator;
use ember_shared::Vec2;
use rand::SeedableRng;
use tracing::{debug, trace, warn};

use crate::config::{is_valid_damping, ParticleSystemConfig, PoolConfig};
use crate::context::UpdateContext;
use crate::drawer::{BlendMode, ParticleDrawer, TextureFactory, TextureRef, TransformSpace};
use crate::emitter::{EmitterHandle, EmitterKind, ParticleEmitter};
use crate::error::{ConfigError, ParticleError, ParticleResult};
use crate::generator::{GeneratorProperties, ParticleGenerator, ParticleRng, ParticleUpdater};
use crate::pool::ParticlePool;

/// Capacity used by [`ParticleSystem::allocate_pool_default`].
pub const DEFAULT_POOL_CAPACITY: usize = 10;

/// Diagnostics snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParticleSystemStats {
    /// Pools currently allocated.
    pub active_pools: usize,
    /// Emitters currently allocated from the shared pool.
    pub active_emitters: usize,
    /// Alive particles across all active pools.
    pub alive_particles: usize,
}

/// What one call to [`ParticleSystem::update`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateStats {
    /// Particles admitted by emitters.
    pub spawned: usize,
    /// Particles whose life ran out.
    pub reaped: usize,
}

/// One pool id's worth of state.
#[derive(Default)]
struct PoolSlot {
    active: bool,
    pool: ParticlePool,
    drawer: ParticleDrawer,
    /// Non-owning; the emitters live in the shared emitter pool.
    emitters: Vec<EmitterHandle>,
}

/// Emitter waiting for the next sync to be detached.
#[derive(Clone, Copy)]
struct DeferredRelease {
    pool_index: usize,
    handle: EmitterHandle,
}

/// The particle simulation.
///
/// All storage is sized at creation. The per-frame [`update`](Self::update)
/// and [`sync`](Self::sync) calls never allocate; attaching emitters and
/// (re)configuring pools may.
///
/// # Example
///
/// ```rust
/// use ember_particles::{EmitterKind, GeneratorProperties, ParticleSystem, ParticleUpdater, UpdateContext};
///
/// let mut system = ParticleSystem::new(8, 32);
/// system.allocate_pool(3, 1000, ParticleUpdater::default()).unwrap();
/// system
///     .attach_area_emitter(3, 0.0, 120.0, EmitterKind::Continuous, GeneratorProperties::default())
///     .unwrap();
///
/// let mut ctx = UpdateContext::from_delta_ms(0, 16, 0);
/// for _ in 0..60 {
///     system.update(&ctx);
///     system.sync();
///     ctx = ctx.next();
/// }
/// assert!(system.pool(3).unwrap().alive_count() > 0);
/// ```
pub struct ParticleSystem {
    slots: Box<[PoolSlot]>,
    emitters: PoolAllocator<ParticleEmitter>,
    deferred_release: Vec<DeferredRelease>,
    rng: ParticleRng,
}

impl ParticleSystem {
    /// Creates a system with `max_pools` pool slots and room for
    /// `max_emitters` emitters, using the default seed.
    ///
    /// # Panics
    ///
    /// Panics if either count is zero or exceeds `u32::MAX`.
    #[must_use]
    pub fn new(max_pools: usize, max_emitters: usize) -> Self {
        Self::with_seed(max_pools, max_emitters, ParticleSystemConfig::DEFAULT_SEED)
    }

    /// Like [`new`](Self::new) with an explicit generator seed.
    ///
    /// # Panics
    ///
    /// Panics if either count is zero or exceeds `u32::MAX`.
    #[must_use]
    pub fn with_seed(max_pools: usize, max_emitters: usize, seed: u64) -> Self {
        assert!(max_pools > 0, "Pool count must be greater than zero");
        assert!(
            u32::try_from(max_pools).is_ok(),
            "Pool count cannot exceed u32::MAX"
        );

        let slots: Vec<PoolSlot> = (0..max_pools).map(|_| PoolSlot::default()).collect();

        Self {
            slots: slots.into_boxed_slice(),
            emitters: PoolAllocator::new(max_emitters),
            deferred_release: Vec::with_capacity(max_emitters),
            rng: ParticleRng::seed_from_u64(seed),
        }
    }

    /// Creates a system sized by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the config does not validate.
    pub fn from_config(config: &ParticleSystemConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::with_seed(config.max_pools, config.max_emitters, config.rng_seed))
    }

    /// Number of pool slots.
    #[inline]
    #[must_use]
    pub fn max_pools(&self) -> usize {
        self.slots.len()
    }

    /// Capacity of the shared emitter pool.
    #[inline]
    #[must_use]
    pub fn max_emitters(&self) -> usize {
        self.emitters.capacity()
    }

    // =========================================================================
    // Precondition checks
    // =========================================================================

    fn slot_index(&self, id: u32) -> ParticleResult<usize> {
        let index = id as usize;
        if index < self.slots.len() {
            Ok(index)
        } else {
            warn!(pool_id = id, max_pools = self.slots.len(), "pool id out of range");
            Err(ParticleError::PoolIdOutOfRange {
                id,
                max_pools: self.slots.len(),
            })
        }
    }

    fn active_index(&self, id: u32) -> ParticleResult<usize> {
        let index = self.slot_index(id)?;
        if self.slots[index].active {
            Ok(index)
        } else {
            warn!(pool_id = id, "operation on inactive pool");
            Err(ParticleError::PoolInactive(id))
        }
    }

    // =========================================================================
    // Pool lifecycle
    // =========================================================================

    /// Activates pool `id` with room for `capacity` particles.
    ///
    /// Damping and draw state are left as they are, so a pool configured with
    /// [`set_pool_data`](Self::set_pool_data) while inactive keeps them.
    ///
    /// # Errors
    ///
    /// Fails if `id` is out of range, already active, or `capacity` is zero.
    pub fn allocate_pool(
        &mut self,
        id: u32,
        capacity: usize,
        updater: ParticleUpdater,
    ) -> ParticleResult<&mut ParticlePool> {
        let index = self.slot_index(id)?;
        if self.slots[index].active {
            warn!(pool_id = id, "pool allocated twice");
            return Err(ParticleError::PoolAlreadyActive(id));
        }
        if capacity == 0 {
            warn!(pool_id = id, "pool requested with zero capacity");
            return Err(ParticleError::ZeroCapacity(id));
        }

        let slot = &mut self.slots[index];
        slot.pool.configure(capacity, updater);
        slot.active = true;
        debug!(pool_id = id, capacity, "particle pool allocated");

        Ok(&mut slot.pool)
    }

    /// Activates pool `id` with the default capacity and updater.
    ///
    /// # Errors
    ///
    /// Same as [`allocate_pool`](Self::allocate_pool).
    pub fn allocate_pool_default(&mut self, id: u32) -> ParticleResult<&mut ParticlePool> {
        self.allocate_pool(id, DEFAULT_POOL_CAPACITY, ParticleUpdater::default())
    }

    /// Deactivates pool `id`, releasing every emitter attached to it.
    ///
    /// Particle arrays are left as they are; their contents no longer matter.
    ///
    /// # Errors
    ///
    /// Fails if `id` is out of range or not active.
    pub fn release_pool(&mut self, id: u32) -> ParticleResult<()> {
        let index = self.active_index(id)?;

        let slot = &mut self.slots[index];
        let released = slot.emitters.len();
        for handle in slot.emitters.drain(..) {
            self.emitters.free(handle.0);
        }
        slot.drawer.clear();
        slot.pool.clear();
        slot.pool.set_damping(0.0);
        slot.active = false;
        debug!(pool_id = id, emitters = released, "particle pool released");

        Ok(())
    }

    /// Reconfigures storage, physics and draw state of pool `id` in one go.
    ///
    /// Kills every particle. Works on active and inactive pools alike and
    /// does not change whether the pool is active.
    ///
    /// # Errors
    ///
    /// Fails if `id` is out of range, `config.capacity` is zero, or
    /// `config.damping` lies outside `[0, 1)`.
    pub fn set_pool_data(
        &mut self,
        id: u32,
        config: &PoolConfig,
        textures: &dyn TextureFactory,
        updater: ParticleUpdater,
    ) -> ParticleResult<()> {
        let index = self.slot_index(id)?;
        if config.capacity == 0 {
            warn!(pool_id = id, "pool configured with zero capacity");
            return Err(ParticleError::ZeroCapacity(id));
        }
        if !is_valid_damping(config.damping) {
            warn!(pool_id = id, damping = config.damping, "damping outside [0, 1)");
            return Err(ParticleError::InvalidDamping(config.damping));
        }

        let texture = textures.create_texture(&config.texture);

        let slot = &mut self.slots[index];
        slot.pool.configure(config.capacity, updater);
        slot.pool.set_damping(config.damping);
        slot.drawer.set(Some(texture), config.blend_mode, config.transform_space);
        debug!(
            pool_id = id,
            capacity = config.capacity,
            texture = %config.texture,
            "particle pool configured"
        );

        Ok(())
    }

    /// Sets the draw state of active pool `id`.
    ///
    /// # Errors
    ///
    /// Fails if `id` is out of range or not active.
    pub fn set_pool_draw_data(
        &mut self,
        id: u32,
        texture: Option<TextureRef>,
        blend_mode: BlendMode,
        transform_space: TransformSpace,
    ) -> ParticleResult<()> {
        let index = self.active_index(id)?;
        self.slots[index].drawer.set(texture, blend_mode, transform_space);
        Ok(())
    }

    /// Sets velocity damping of active pool `id`.
    ///
    /// # Errors
    ///
    /// Fails if `id` is out of range, not active, or `damping` lies outside
    /// `[0, 1)`.
    pub fn set_damping(&mut self, id: u32, damping: f32) -> ParticleResult<()> {
        let index = self.active_index(id)?;
        if !is_valid_damping(damping) {
            warn!(pool_id = id, damping, "damping outside [0, 1)");
            return Err(ParticleError::InvalidDamping(damping));
        }
        self.slots[index].pool.set_damping(damping);
        Ok(())
    }

    /// Returns true if pool `id` is allocated.
    #[must_use]
    pub fn is_active(&self, id: u32) -> bool {
        self.slots.get(id as usize).is_some_and(|slot| slot.active)
    }

    /// Active pool `id`.
    ///
    /// # Errors
    ///
    /// Fails if `id` is out of range or not active.
    pub fn pool(&self, id: u32) -> ParticleResult<&ParticlePool> {
        let index = self.active_index(id)?;
        Ok(&self.slots[index].pool)
    }

    /// Active pool `id`, mutably.
    ///
    /// # Errors
    ///
    /// Fails if `id` is out of range or not active.
    pub fn pool_mut(&mut self, id: u32) -> ParticleResult<&mut ParticlePool> {
        let index = self.active_index(id)?;
        Ok(&mut self.slots[index].pool)
    }

    /// Draw state of active pool `id`.
    ///
    /// # Errors
    ///
    /// Fails if `id` is out of range or not active.
    pub fn drawer(&self, id: u32) -> ParticleResult<&ParticleDrawer> {
        let index = self.active_index(id)?;
        Ok(&self.slots[index].drawer)
    }

    /// Iterates active pools in id order, for the renderer.
    pub fn active_pools(&self) -> impl Iterator<Item = (u32, &ParticlePool, &ParticleDrawer)> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.active)
            .map(|(index, slot)| {
                #[allow(clippy::cast_possible_truncation)]
                let id = index as u32;
                (id, &slot.pool, &slot.drawer)
            })
    }

    // =========================================================================
    // Emitters
    // =========================================================================

    /// Attaches a new emitter to active pool `pool_id`.
    ///
    /// # Returns
    ///
    /// `Ok(None)` if the shared emitter pool is exhausted.
    ///
    /// # Errors
    ///
    /// Fails if `pool_id` is out of range or not active.
    pub fn attach_emitter(
        &mut self,
        pool_id: u32,
        position: Vec2,
        duration: f32,
        emit_rate: f32,
        kind: EmitterKind,
        generator: ParticleGenerator,
    ) -> ParticleResult<Option<EmitterHandle>> {
        let index = self.active_index(pool_id)?;

        let emitter = ParticleEmitter::new(kind, position, duration, emit_rate, generator);
        let Some(handle) = self.emitters.allocate(emitter).map(EmitterHandle) else {
            warn!(
                pool_id,
                max_emitters = self.emitters.capacity(),
                "emitter pool exhausted"
            );
            return Ok(None);
        };

        self.slots[index].emitters.push(handle);
        Ok(Some(handle))
    }

    /// Attaches an area emitter at the origin, built from `properties`.
    ///
    /// # Errors
    ///
    /// Same as [`attach_emitter`](Self::attach_emitter), plus
    /// [`ParticleError::InvalidGeneratorProperties`] if `properties` does not
    /// validate.
    pub fn attach_area_emitter(
        &mut self,
        pool_id: u32,
        duration: f32,
        emit_rate: f32,
        kind: EmitterKind,
        properties: GeneratorProperties,
    ) -> ParticleResult<Option<EmitterHandle>> {
        check_properties(&properties)?;
        self.attach_emitter(
            pool_id,
            Vec2::ZERO,
            duration,
            emit_rate,
            kind,
            ParticleGenerator::from_properties(properties),
        )
    }

    /// Detaches and frees an emitter immediately.
    ///
    /// Must not be called for an emitter while [`update`](Self::update) is
    /// running; emitters that finish on their own are released in
    /// [`sync`](Self::sync) instead.
    ///
    /// # Errors
    ///
    /// Fails if `pool_id` is out of range or inactive, the handle is stale, or
    /// the emitter belongs to another pool.
    pub fn release_emitter(&mut self, pool_id: u32, handle: EmitterHandle) -> ParticleResult<()> {
        let index = self.active_index(pool_id)?;
        if !self.emitters.contains(handle.0) {
            warn!(pool_id, emitter_slot = handle.0.index(), "release of stale emitter");
            return Err(ParticleError::StaleEmitter);
        }
        if !self.slots[index].emitters.contains(&handle) {
            warn!(pool_id, emitter_slot = handle.0.index(), "emitter not attached to pool");
            return Err(ParticleError::EmitterNotAttached { pool_id });
        }

        self.detach(index, handle);
        Ok(())
    }

    /// Frees `handle` and drops it from the pool's emitter list.
    fn detach(&mut self, pool_index: usize, handle: EmitterHandle) -> bool {
        if self.emitters.free(handle.0).is_none() {
            return false;
        }
        self.slots[pool_index].emitters.retain(|attached| *attached != handle);
        true
    }

    fn emitter_mut(&mut self, handle: EmitterHandle) -> ParticleResult<&mut ParticleEmitter> {
        self.emitters.get_mut(handle.0).ok_or_else(|| {
            warn!(emitter_slot = handle.0.index(), "operation on stale emitter");
            ParticleError::StaleEmitter
        })
    }

    /// Emitter behind `handle`, if it is still allocated.
    #[must_use]
    pub fn emitter(&self, handle: EmitterHandle) -> Option<&ParticleEmitter> {
        self.emitters.get(handle.0)
    }

    /// Moves the spawn origin of an emitter.
    ///
    /// # Errors
    ///
    /// Fails with [`ParticleError::StaleEmitter`] for released emitters.
    pub fn set_emitter_position(&mut self, handle: EmitterHandle, position: Vec2) -> ParticleResult<()> {
        self.emitter_mut(handle)?.set_position(position);
        Ok(())
    }

    /// Replaces an emitter's generator with an area generator.
    ///
    /// # Errors
    ///
    /// Fails with [`ParticleError::StaleEmitter`] for released emitters and
    /// [`ParticleError::InvalidGeneratorProperties`] if `properties` does not
    /// validate.
    pub fn set_generator_properties(
        &mut self,
        handle: EmitterHandle,
        properties: GeneratorProperties,
    ) -> ParticleResult<()> {
        check_properties(&properties)?;
        self.emitter_mut(handle)?
            .set_generator(ParticleGenerator::from_properties(properties));
        Ok(())
    }

    /// Replaces an emitter's generator.
    ///
    /// # Errors
    ///
    /// Fails with [`ParticleError::StaleEmitter`] for released emitters.
    pub fn set_generator(&mut self, handle: EmitterHandle, generator: ParticleGenerator) -> ParticleResult<()> {
        self.emitter_mut(handle)?.set_generator(generator);
        Ok(())
    }

    /// Rewinds an emitter so it emits again from the start.
    ///
    /// Restarting a `BurstRemoveOnFinish` emitter that is queued for release
    /// cancels the release.
    ///
    /// # Errors
    ///
    /// Fails with [`ParticleError::StaleEmitter`] for released emitters.
    pub fn restart_emitter(&mut self, handle: EmitterHandle) -> ParticleResult<()> {
        self.emitter_mut(handle)?.restart();
        Ok(())
    }

    /// Emitters attached to pool `pool_id`; empty for inactive pools.
    ///
    /// # Errors
    ///
    /// Fails if `pool_id` is out of range.
    pub fn attached_emitters(&self, pool_id: u32) -> ParticleResult<&[EmitterHandle]> {
        let index = self.slot_index(pool_id)?;
        Ok(&self.slots[index].emitters)
    }

    // =========================================================================
    // Frame
    // =========================================================================

    /// Advances every active pool by one frame.
    ///
    /// This is a **zero-allocation** operation.
    pub fn update(&mut self, ctx: &UpdateContext) -> UpdateStats {
        let Self {
            slots,
            emitters,
            deferred_release,
            rng,
        } = self;

        let delta_s = ctx.delta_s;
        let mut stats = UpdateStats::default();

        for (pool_index, slot) in slots.iter_mut().enumerate() {
            if !slot.active {
                continue;
            }

            for &handle in &slot.emitters {
                let Some(emitter) = emitters.get_mut(handle.0) else {
                    continue;
                };
                stats.spawned += update_emitter(emitter, &mut slot.pool, rng, delta_s);

                if emitter.kind() == EmitterKind::BurstRemoveOnFinish
                    && emitter.is_done()
                    && !emitter.is_pending_release()
                {
                    emitter.mark_pending_release();
                    deferred_release.push(DeferredRelease { pool_index, handle });
                }
            }

            slot.pool.advance(delta_s);
            stats.reaped += slot.pool.reap(delta_s);
        }

        stats
    }

    /// Releases every emitter queued during [`update`](Self::update).
    ///
    /// Call once per frame, after `update`. Entries whose emitter was already
    /// released are skipped.
    ///
    /// # Returns
    ///
    /// Number of emitters released.
    pub fn sync(&mut self) -> usize {
        let mut released = 0;

        for entry in 0..self.deferred_release.len() {
            let DeferredRelease { pool_index, handle } = self.deferred_release[entry];
            if !self.emitters.get(handle.0).is_some_and(ParticleEmitter::is_pending_release) {
                continue;
            }
            if self.detach(pool_index, handle) {
                trace!(pool_index, "finished emitter released");
                released += 1;
            }
        }

        self.deferred_release.clear();
        released
    }

    /// Diagnostics snapshot.
    #[must_use]
    pub fn stats(&self) -> ParticleSystemStats {
        let mut stats = ParticleSystemStats {
            active_emitters: self.emitters.allocated_count(),
            ..ParticleSystemStats::default()
        };
        for slot in self.slots.iter().filter(|slot| slot.active) {
            stats.active_pools += 1;
            stats.alive_particles += slot.pool.alive_count();
        }
        stats
    }
}

/// Rejects area generator settings that would fail mid-frame.
fn check_properties(properties: &GeneratorProperties) -> ParticleResult<()> {
    properties.validate().map_err(|err| {
        warn!(%err, "generator properties rejected");
        err
    })
}

/// Runs one emitter for one frame, admitting whatever it spawns.
///
/// # Returns
///
/// Number of particles admitted.
fn update_emitter(
    emitter: &mut ParticleEmitter,
    pool: &mut ParticlePool,
    rng: &mut ParticleRng,
    delta_s: f32,
) -> usize {
    if emitter.is_pending_release() || emitter.is_done() {
        return 0;
    }

    let count = emitter.tick(delta_s);
    let position = emitter.position();
    let generator = emitter.generator();
    pool.admit(count, |view| generator.generate(position, view, rng))
}
