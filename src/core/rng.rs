//! 确定性伪随机数生成器
//!
//! Marsaglia xorshift32。状态显式保存在结构体中，便于在测试之间重置或重新播种。
//! 同时实现了 `rand::RngCore` / `rand::SeedableRng`，可以与 `rand` 生态互换使用。

use rand::{RngCore, SeedableRng};

/// 默认种子
pub const DEFAULT_SEED: u32 = 0xf2ee_c0de;

/// 单步 xorshift32（无状态 API）
///
/// 输入当前状态，返回下一个状态。状态 0 是不动点，调用方需避免。
#[inline]
pub const fn xorshift32(mut state: u32) -> u32 {
    state ^= state << 13;
    state ^= state >> 17;
    state ^= state << 5;
    state
}

/// xorshift32 生成器
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XorShift32 {
    state: u32,
}

impl XorShift32 {
    /// 用给定种子创建生成器，种子 0 被替换为默认种子
    pub fn new(seed: u32) -> Self {
        let state = if seed == 0 { DEFAULT_SEED } else { seed };
        Self { state }
    }

    /// 当前内部状态
    pub fn state(&self) -> u32 {
        self.state
    }

    /// 重新播种
    pub fn reseed(&mut self, seed: u32) {
        *self = Self::new(seed);
    }
}

impl Default for XorShift32 {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}

impl RngCore for XorShift32 {
    fn next_u32(&mut self) -> u32 {
        self.state = xorshift32(self.state);
        self.state
    }

    fn next_u64(&mut self) -> u64 {
        let hi = self.next_u32() as u64;
        let lo = self.next_u32() as u64;
        (hi << 32) | lo
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let bytes = self.next_u32().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl SeedableRng for XorShift32 {
    type Seed = [u8; 4];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::new(u32::from_le_bytes(seed))
    }
}

/// 从 `[0, 1)` 均匀采样
///
/// 只取高 24 位，保证结果严格小于 1.0。
#[inline]
pub fn unit_f32<R: RngCore + ?Sized>(rng: &mut R) -> f32 {
    (rng.next_u32() >> 8) as f32 * (1.0 / 16_777_216.0)
}

/// 从 `[min, max)` 均匀采样；`min == max` 时返回 `min`
#[inline]
pub fn range_f32<R: RngCore + ?Sized>(rng: &mut R, min: f32, max: f32) -> f32 {
    min + (max - min) * unit_f32(rng)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xorshift_known_sequence() {
        // 手工展开第一步
        let mut s = DEFAULT_SEED;
        s ^= s << 13;
        s ^= s >> 17;
        s ^= s << 5;
        assert_eq!(xorshift32(DEFAULT_SEED), s);

        let mut rng = XorShift32::default();
        assert_eq!(rng.next_u32(), s);
        assert_eq!(rng.next_u32(), xorshift32(s));
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = XorShift32::new(1234);
        let mut b = XorShift32::new(1234);
        for _ in 0..100 {
            assert_eq!(a.next_u32(), b.next_u32());
        }

        a.reseed(1234);
        let mut c = XorShift32::new(1234);
        assert_eq!(a.next_u64(), c.next_u64());
    }

    #[test]
    fn test_zero_seed_replaced() {
        let mut rng = XorShift32::new(0);
        assert_eq!(rng.state(), DEFAULT_SEED);
        assert_ne!(rng.next_u32(), 0);
    }

    #[test]
    fn test_range_bounds() {
        let mut rng = XorShift32::new(42);
        for _ in 0..10_000 {
            let v = range_f32(&mut rng, -12.0, 12.0);
            assert!((-12.0..12.0).contains(&v));
            let u = unit_f32(&mut rng);
            assert!((0.0..1.0).contains(&u));
        }
        assert_eq!(range_f32(&mut rng, 3.0, 3.0), 3.0);
    }

    #[test]
    fn test_seedable_and_fill_bytes() {
        let mut a = XorShift32::from_seed(7u32.to_le_bytes());
        let mut b = XorShift32::new(7);
        let mut buf = [0u8; 6];
        a.fill_bytes(&mut buf);
        let first = b.next_u32().to_le_bytes();
        let second = b.next_u32().to_le_bytes();
        assert_eq!(&buf[..4], &first);
        assert_eq!(&buf[4..], &second[..2]);
    }
}
