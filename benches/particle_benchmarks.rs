//! 粒子模拟性能基准测试
//!
//! 测试发射、积分和粒子池快照的性能

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use particle_workshop::config::EmitterConfig;
use particle_workshop::core::XorShift32;
use particle_workshop::render::{Emitter, Integrator, ParticlePool};
use std::num::NonZeroUsize;

fn filled_pool(capacity: usize) -> ParticlePool {
    let mut pool = ParticlePool::new(NonZeroUsize::new(capacity).unwrap());
    let mut emitter = Emitter::new(EmitterConfig {
        spawn_rate: capacity as f32,
        ..Default::default()
    });
    let mut rng = XorShift32::default();
    emitter.emit(1.0, &mut pool, &mut rng);
    pool
}

fn bench_integrator_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("integrator_step");
    let integrator = Integrator::new(-40.0);

    for capacity in [1_000, 10_000, 100_000].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(capacity),
            capacity,
            |b, &capacity| {
                let mut pool = filled_pool(capacity);
                b.iter(|| integrator.step(black_box(1.0 / 60.0), &mut pool));
            },
        );
    }

    group.finish();
}

fn bench_emitter(c: &mut Criterion) {
    let mut group = c.benchmark_group("emitter_emit");

    for rate in [60.0_f32, 6_000.0, 600_000.0].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(rate), rate, |b, &rate| {
            let mut pool = ParticlePool::new(NonZeroUsize::new(10_000).unwrap());
            let mut emitter = Emitter::new(EmitterConfig {
                spawn_rate: rate,
                ..Default::default()
            });
            let mut rng = XorShift32::default();
            b.iter(|| black_box(emitter.emit(1.0 / 60.0, &mut pool, &mut rng)));
        });
    }

    group.finish();
}

fn bench_full_tick_simulation(c: &mut Criterion) {
    c.bench_function("simulate_and_snapshot_10k", |b| {
        let mut pool = filled_pool(10_000);
        let mut emitter = Emitter::new(EmitterConfig::default());
        let integrator = Integrator::new(-40.0);
        let mut rng = XorShift32::default();
        b.iter(|| {
            emitter.emit(1.0 / 60.0, &mut pool, &mut rng);
            integrator.step(1.0 / 60.0, &mut pool);
            black_box(pool.as_bytes().len())
        });
    });
}

criterion_group!(
    benches,
    bench_integrator_step,
    bench_emitter,
    bench_full_tick_simulation
);
criterion_main!(benches);
