//! # Particle Simulation Benchmark
//!
//! REQUIREMENTS:
//! - 100,000 alive particles in one pool
//! - 0 allocations during update and sync
//!
//! Run with: `cargo bench --package ember_particles`

// Benchmarks don't need docs
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ember_particles::{
    EmitterKind, ParticleGenerator, ParticlePool, ParticleState, ParticleSystem, ParticleUpdater,
    UpdateContext,
};
use ember_shared::Vec2;

/// Particle count for the steady-state benchmarks.
const PARTICLE_COUNT: usize = 100_000;

/// Builds a pool filled with particles that outlive the benchmark.
fn filled_pool(count: usize) -> ParticlePool {
    let mut pool = ParticlePool::with_capacity(count + 1, ParticleUpdater::default());
    let state = ParticleState {
        velocity: Vec2::new(1.0, 2.0),
        life: 1.0e9,
        start_life: 1.0e9,
        start_size: 8.0,
        end_size: 4.0,
        ..ParticleState::default()
    };
    pool.admit(count, |view| view.set(&state));
    pool
}

/// Benchmark: damping plus default updater over a full pool.
fn bench_advance(c: &mut Criterion) {
    let mut group = c.benchmark_group("advance");

    for count in [1_000, 10_000, PARTICLE_COUNT] {
        let mut pool = filled_pool(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| pool.advance(black_box(0.016)));
        });
    }

    group.finish();
}

/// Benchmark: aging with no deaths, the common case.
fn bench_reap_no_deaths(c: &mut Criterion) {
    let mut pool = filled_pool(PARTICLE_COUNT);
    c.bench_function("reap_no_deaths_100k", |b| {
        b.iter(|| black_box(pool.reap(black_box(0.016))));
    });
}

/// Benchmark: every particle dies in the same frame.
fn bench_reap_all(c: &mut Criterion) {
    let state = ParticleState {
        life: 0.01,
        start_life: 0.01,
        ..ParticleState::default()
    };
    let mut pool = ParticlePool::with_capacity(PARTICLE_COUNT + 1, ParticleUpdater::default());
    c.bench_function("reap_all_100k", |b| {
        b.iter(|| {
            pool.admit(PARTICLE_COUNT, |view| view.set(&state));
            black_box(pool.reap(0.016))
        });
    });
}

/// Benchmark: full frame with emitters feeding one pool.
fn bench_frame(c: &mut Criterion) {
    let mut system = ParticleSystem::new(1, 64);
    if system
        .allocate_pool(0, PARTICLE_COUNT, ParticleUpdater::default())
        .is_err()
    {
        return;
    }
    for i in 0..32u8 {
        let position = Vec2::new(f32::from(i) * 10.0, 0.0);
        let _ = system.attach_emitter(
            0,
            position,
            0.0,
            2_000.0,
            EmitterKind::Continuous,
            ParticleGenerator::default(),
        );
    }

    let mut ctx = UpdateContext::from_delta_ms(0, 16, 0);
    c.bench_function("frame_32_emitters", |b| {
        b.iter(|| {
            let stats = system.update(&ctx);
            system.sync();
            ctx = ctx.next();
            black_box(stats)
        });
    });
}

criterion_group!(
    benches,
    bench_advance,
    bench_reap_no_deaths,
    bench_reap_all,
    bench_frame
);
criterion_main!(benches);
