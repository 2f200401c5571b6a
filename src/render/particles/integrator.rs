//! 显式欧拉积分

use std::f32::consts::TAU;

use super::particle::ParticlePool;

/// 欧拉积分器
#[derive(Debug, Clone, Copy)]
pub struct Integrator {
    /// y 方向重力加速度（负值向下）
    pub gravity: f32,
}

impl Integrator {
    pub fn new(gravity: f32) -> Self {
        Self { gravity }
    }

    /// 把池中每个粒子推进 `timestep` 秒
    ///
    /// 位置使用更新前的速度。角度用浮点取余回绕，结果符号跟随被除数，
    /// 因此落在 `(-2π, 2π)` 内。`timestep == 0` 时不改变任何字段。
    pub fn step(&self, timestep: f32, pool: &mut ParticlePool) {
        let gravity = self.gravity;
        pool.for_each_mutable(|p| {
            p.position += p.velocity * timestep;
            p.velocity.y += gravity * timestep;
            p.angle = (p.angle + p.spin * timestep) % TAU;
            p.age += timestep;
        });
    }
}
