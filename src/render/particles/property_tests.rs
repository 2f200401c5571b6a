//! 粒子模拟属性测试
//!
//! 使用proptest验证环形池、发射累加器和角度回绕的不变量

#[cfg(test)]
mod tests {
    use crate::config::{EmitterConfig, SampleRange};
    use crate::core::rng::XorShift32;
    use crate::render::particles::{Emitter, Integrator, Particle, ParticlePool};
    use glam::Vec2;
    use proptest::prelude::*;
    use std::f32::consts::TAU;
    use std::num::NonZeroUsize;

    fn finite_f32() -> impl Strategy<Value = f32> {
        (-1000.0f32..1000.0).prop_filter("must be finite", |&x| x.is_finite())
    }

    fn valid_particle() -> impl Strategy<Value = Particle> {
        (
            finite_f32(),
            finite_f32(),
            finite_f32(),
            finite_f32(),
            -TAU * 0.999..TAU * 0.999,
            -50.0f32..50.0,
            0.01f32..10.0,
            0.0f32..100.0,
        )
            .prop_map(|(px, py, vx, vy, angle, spin, size, age)| Particle {
                position: Vec2::new(px, py),
                velocity: Vec2::new(vx, vy),
                angle,
                spin,
                size,
                age,
            })
    }

    fn pool_of(particles: &[Particle]) -> ParticlePool {
        let capacity = NonZeroUsize::new(particles.len().max(1)).unwrap();
        let mut pool = ParticlePool::new(capacity);
        for p in particles {
            pool.spawn(*p);
        }
        pool
    }

    // 环形池不变量
    proptest! {
        #[test]
        fn ring_cursor_is_spawn_count_mod_capacity(
            capacity in 1usize..64,
            spawns in 0usize..500
        ) {
            let mut pool = ParticlePool::new(NonZeroUsize::new(capacity).unwrap());
            for i in 0..spawns {
                let slot = pool.spawn(Particle { age: i as f32, ..Default::default() });
                prop_assert_eq!(slot, i % capacity);
            }
            prop_assert_eq!(pool.cursor(), spawns % capacity);
            prop_assert_eq!(pool.capacity(), capacity);
            prop_assert_eq!(pool.snapshot().len(), capacity);
        }

        #[test]
        fn ring_holds_most_recent_spawns(
            capacity in 1usize..32,
            spawns in 1usize..200
        ) {
            let mut pool = ParticlePool::new(NonZeroUsize::new(capacity).unwrap());
            for i in 0..spawns {
                pool.spawn(Particle { age: i as f32, ..Default::default() });
            }
            // 最近一次写入的槽位保存最后一个粒子
            let last_slot = (spawns - 1) % capacity;
            prop_assert_eq!(pool.snapshot()[last_slot].age, (spawns - 1) as f32);
        }
    }

    // 发射累加器不变量
    proptest! {
        #[test]
        fn accumulator_stays_in_unit_interval(
            spawn_rate in 0.0f32..10_000.0,
            steps in prop::collection::vec(-1.0f32..1.0, 1..50),
            seed in any::<u32>()
        ) {
            let config = EmitterConfig { spawn_rate, ..Default::default() };
            let mut emitter = Emitter::new(config);
            let mut pool = ParticlePool::new(NonZeroUsize::new(16).unwrap());
            let mut rng = XorShift32::new(seed);
            for dt in steps {
                let before = emitter.accumulator();
                let count = emitter.emit(dt, &mut pool, &mut rng);
                let after = emitter.accumulator();
                prop_assert!((0.0..1.0).contains(&after));
                if dt <= 0.0 {
                    prop_assert_eq!(count, 0);
                    prop_assert_eq!(after, before);
                }
            }
        }

        #[test]
        fn accumulator_survives_huge_amounts(
            spawn_rate in 1.0e30f32..f32::MAX,
            timestep in 1.0e-3f32..1.0e9,
            capacity in 1usize..8,
            seed in any::<u32>()
        ) {
            let config = EmitterConfig { spawn_rate, ..Default::default() };
            let mut emitter = Emitter::new(config);
            let mut pool = ParticlePool::new(NonZeroUsize::new(capacity).unwrap());
            let mut rng = XorShift32::new(seed);
            for dt in [timestep, 0.01] {
                let count = emitter.emit(dt, &mut pool, &mut rng);
                prop_assert!(count > 0);
                prop_assert!((0.0..1.0).contains(&emitter.accumulator()));
                prop_assert!(pool.cursor() < capacity);
            }
        }

        #[test]
        fn emitted_sizes_are_positive(
            min in -8.0f32..0.0,
            width in 0.0f32..8.0,
            seed in any::<u32>()
        ) {
            let config = EmitterConfig {
                size_exponent: SampleRange::new(min, min + width),
                ..Default::default()
            };
            let emitter = Emitter::new(config);
            let mut rng = XorShift32::new(seed);
            for _ in 0..32 {
                let p = emitter.sample(0.016, &mut rng);
                prop_assert!(p.size > 0.0 && p.size.is_finite());
            }
        }
    }

    // 积分器不变量
    proptest! {
        #[test]
        fn zero_step_leaves_particles_unchanged(
            particles in prop::collection::vec(valid_particle(), 1..32),
            gravity in -100.0f32..0.0
        ) {
            let mut pool = pool_of(&particles);
            let before = pool.snapshot().to_vec();
            Integrator::new(gravity).step(0.0, &mut pool);
            prop_assert_eq!(pool.snapshot(), &before[..]);
        }

        #[test]
        fn angle_stays_within_open_turn(
            particles in prop::collection::vec(valid_particle(), 1..32),
            steps in prop::collection::vec(0.0f32..0.5, 1..20)
        ) {
            let mut pool = pool_of(&particles);
            let integrator = Integrator::new(-40.0);
            for dt in steps {
                integrator.step(dt, &mut pool);
                for p in pool.snapshot() {
                    prop_assert!(p.angle > -TAU && p.angle < TAU);
                }
            }
        }
    }
}
