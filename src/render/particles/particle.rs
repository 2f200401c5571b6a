//! 粒子记录与固定容量环形粒子池

use glam::Vec2;
use std::num::NonZeroUsize;

/// 单个粒子
///
/// 直接作为实例数据上传到 GPU，布局必须与粒子顶点着色器的实例输入一致：
/// location 1 = position，location 2 = velocity，location 3 = (angle, spin, size, age)。
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Particle {
    /// 位置（世界坐标）
    pub position: Vec2,
    /// 速度（世界单位/秒）
    pub velocity: Vec2,
    /// 旋转角（弧度）
    pub angle: f32,
    /// 旋转速度（弧度/秒）
    pub spin: f32,
    /// 缩放系数，发射出的粒子总是大于 0
    pub size: f32,
    /// 自创建以来经过的模拟时间（秒）
    pub age: f32,
}

impl Particle {
    /// 单个粒子的字节大小
    pub const SIZE: u64 = std::mem::size_of::<Self>() as u64;
}

/// 固定容量的环形粒子池
///
/// 池中始终恰好有 `capacity` 个槽位。`spawn` 覆盖游标所指的槽位并前移游标，
/// 没有存活标记：粒子的"死亡"就是被后来者覆盖。未被写入过的槽位是全零粒子（size 为 0，不可见）。
#[derive(Debug, Clone)]
pub struct ParticlePool {
    slots: Vec<Particle>,
    next_index: usize,
}

impl ParticlePool {
    /// 创建容量为 `capacity` 的粒子池
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            slots: vec![Particle::default(); capacity.get()],
            next_index: 0,
        }
    }

    /// 写入 `next_index` 处的槽位并前移游标，返回被写入的槽位索引
    pub fn spawn(&mut self, particle: Particle) -> usize {
        let index = self.next_index;
        self.slots[index] = particle;
        self.next_index = (index + 1) % self.slots.len();
        index
    }

    /// 不写入任何槽位，只把游标前移 `count` 个位置
    pub fn skip(&mut self, count: usize) {
        let len = self.slots.len();
        self.next_index = (self.next_index + count % len) % len;
    }

    /// 按索引顺序对每个槽位恰好调用一次 `f`
    pub fn for_each_mutable<F>(&mut self, f: F)
    where
        F: FnMut(&mut Particle),
    {
        self.slots.iter_mut().for_each(f);
    }

    /// 所有槽位的只读视图（索引顺序）
    pub fn snapshot(&self) -> &[Particle] {
        &self.slots
    }

    /// 快照的原始字节，用于上传
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.slots)
    }

    /// 下一个要覆盖的槽位
    pub fn cursor(&self) -> usize {
        self.next_index
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn get(&self, index: usize) -> Option<&Particle> {
        self.slots.get(index)
    }
}
