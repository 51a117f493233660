//! # Shared Particle System
//!
//! The simulation itself is single-threaded. Callers on other threads (asset
//! loaders attaching emitters, gameplay code moving them) go through this
//! handle, which serializes every access behind one lock.
//!
//! A frame holds the lock across both `update` and `sync`, so no caller can
//! observe an emitter that finished during `update` but has not been released.

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use crate::context::UpdateContext;
use crate::system::{ParticleSystem, UpdateStats};

/// Cloneable, thread-safe handle to a [`ParticleSystem`].
#[derive(Clone)]
pub struct SharedParticleSystem {
    inner: Arc<Mutex<ParticleSystem>>,
}

impl SharedParticleSystem {
    /// Wraps `system` for shared use.
    #[must_use]
    pub fn new(system: ParticleSystem) -> Self {
        Self {
            inner: Arc::new(Mutex::new(system)),
        }
    }

    /// Locks the system for direct access.
    ///
    /// Do not hold the guard across a frame boundary.
    pub fn lock(&self) -> MutexGuard<'_, ParticleSystem> {
        self.inner.lock()
    }

    /// Runs one full frame: `update` then `sync`, under a single lock.
    ///
    /// # Returns
    ///
    /// The update statistics of the frame.
    pub fn frame(&self, ctx: &UpdateContext) -> UpdateStats {
        let mut system = self.inner.lock();
        let stats = system.update(ctx);
        system.sync();
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emitter::EmitterKind;
    use crate::generator::{ParticleGenerator, ParticleUpdater};
    use ember_shared::Vec2;
    use std::thread;

    #[test]
    fn test_frame_releases_finished_emitters() {
        let shared = SharedParticleSystem::new(ParticleSystem::new(1, 4));
        let handle = {
            let mut system = shared.lock();
            system.allocate_pool(0, 64, ParticleUpdater::default()).unwrap();
            system
                .attach_emitter(0, Vec2::ZERO, 1.0, 4.0, EmitterKind::BurstRemoveOnFinish, ParticleGenerator::default())
                .unwrap()
                .unwrap()
        };

        let stats = shared.frame(&UpdateContext::from_delta_s(0.016));

        assert_eq!(stats.spawned, 4);
        let system = shared.lock();
        assert!(system.emitter(handle).is_none());
        assert!(system.attached_emitters(0).unwrap().is_empty());
    }

    #[test]
    fn test_attach_from_other_threads() {
        let shared = SharedParticleSystem::new(ParticleSystem::new(1, 16));
        shared
            .lock()
            .allocate_pool(0, 256, ParticleUpdater::default())
            .unwrap();

        let workers: Vec<_> = (0..4)
            .map(|_| {
                let shared = shared.clone();
                thread::spawn(move || {
                    shared
                        .lock()
                        .attach_emitter(0, Vec2::ZERO, 1.0, 2.0, EmitterKind::Burst, ParticleGenerator::default())
                        .unwrap()
                        .is_some()
                })
            })
            .collect();
        for worker in workers {
            assert!(worker.join().unwrap());
        }

        let stats = shared.frame(&UpdateContext::from_delta_s(0.016));
        assert_eq!(stats.spawned, 8);
        assert_eq!(shared.lock().stats().active_emitters, 4);
    }
}
