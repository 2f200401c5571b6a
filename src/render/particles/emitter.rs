//! 粒子发射器
//!
//! 把经过的时间换算成发射数量。小数部分保存在累加器中跨帧累积，
//! 因此虽然每帧只能生成整数个粒子，期望发射速率仍然准确。

use glam::Vec2;
use rand::RngCore;
use std::f32::consts::TAU;

use super::particle::{Particle, ParticlePool};
use crate::config::EmitterConfig;
use crate::core::rng::range_f32;

/// 粒子发射器
#[derive(Debug, Clone)]
pub struct Emitter {
    config: EmitterConfig,
    /// 跨帧累积的小数发射量，每次 `emit` 之后总在 `[0, 1)` 内
    accumulator: f32,
    /// 累计发射的粒子数
    spawned_total: u64,
}

impl Emitter {
    pub fn new(config: EmitterConfig) -> Self {
        Self {
            config,
            accumulator: 0.0,
            spawned_total: 0,
        }
    }

    /// 按 `timestep` 发射粒子到 `pool`，返回本次发射数量
    ///
    /// 非正（或非有限）的步长不发射任何粒子，累加器保持不变。
    /// 一帧内最多实际写入容量个粒子；更早的那些本来就会在同一帧被覆盖。
    /// 新粒子的 `age` 在 `[0, timestep)` 内随机，模拟帧内不同时刻出生。
    pub fn emit<R: RngCore + ?Sized>(
        &mut self,
        timestep: f32,
        pool: &mut ParticlePool,
        rng: &mut R,
    ) -> u32 {
        if !(timestep > 0.0 && timestep.is_finite()) {
            return 0;
        }

        let capacity = pool.capacity() as u64;
        let total = self.accumulator + self.config.spawn_rate * timestep;
        let count = if total.is_finite() {
            let whole = total.floor();
            self.accumulator = total - whole;
            whole as u64
        } else {
            tracing::debug!(target: "particles", timestep, "Spawn amount overflowed, refilling the pool");
            self.accumulator = 0.0;
            capacity
        };

        // 超过容量的部分在本帧内就会被覆盖，只前移游标，不再采样
        let written = count.min(capacity);
        pool.skip(((count - written) % capacity) as usize);
        for _ in 0..written {
            let particle = self.sample(timestep, rng);
            pool.spawn(particle);
        }

        self.spawned_total = self.spawned_total.saturating_add(count);
        if count > 0 {
            tracing::trace!(target: "particles", count, written, cursor = pool.cursor(), "Emitted particles");
        }
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    /// 按配置采样一个新粒子
    ///
    /// 采样顺序固定（vx, vy, angle, spin, size, age），同一种子产生同一序列。
    pub fn sample<R: RngCore + ?Sized>(&self, timestep: f32, rng: &mut R) -> Particle {
        let c = &self.config;
        let velocity = Vec2::new(
            range_f32(rng, c.velocity_x.min, c.velocity_x.max),
            range_f32(rng, c.velocity_y.min, c.velocity_y.max),
        );
        let angle = range_f32(rng, 0.0, TAU) % TAU;
        let spin = range_f32(rng, c.spin.min, c.spin.max);
        let size = range_f32(rng, c.size_exponent.min, c.size_exponent.max).exp2();
        let age = range_f32(rng, 0.0, timestep.max(0.0));

        Particle {
            position: c.origin,
            velocity,
            angle,
            spin,
            size,
            age,
        }
    }

    pub fn accumulator(&self) -> f32 {
        self.accumulator
    }

    pub fn spawned_total(&self) -> u64 {
        self.spawned_total
    }

    pub fn config(&self) -> &EmitterConfig {
        &self.config
    }
}
