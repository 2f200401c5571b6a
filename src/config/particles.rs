use super::{ConfigError, ConfigResult};
use crate::core::rng::DEFAULT_SEED;
use glam::Vec2;
use serde::{Deserialize, Serialize};

/// 均匀采样区间 `[min, max)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleRange {
    pub min: f32,
    pub max: f32,
}

impl SampleRange {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// 关于零点对称的区间 `[-half_width, half_width)`
    pub const fn symmetric(half_width: f32) -> Self {
        Self::new(-half_width, half_width)
    }

    pub fn contains(&self, value: f32) -> bool {
        value >= self.min && value <= self.max
    }

    fn validate(&self, name: &str) -> ConfigResult<()> {
        if !self.min.is_finite() || !self.max.is_finite() || self.min > self.max {
            return Err(ConfigError::ValidationError(format!(
                "{name}: invalid range [{}, {})",
                self.min, self.max
            )));
        }
        Ok(())
    }
}

/// 粒子池与模拟配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleConfig {
    /// 粒子池容量（固定，不会增长）
    pub capacity: usize,
    /// 随机数种子
    pub seed: u32,
    /// 重力加速度（y 方向，负值向下）
    pub gravity: f32,
    /// 发射器配置
    pub emitter: EmitterConfig,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            capacity: 1000,
            seed: DEFAULT_SEED,
            gravity: -40.0,
            emitter: EmitterConfig::default(),
        }
    }
}

impl ParticleConfig {
    /// 验证配置
    pub fn validate(&self) -> ConfigResult<()> {
        if self.capacity == 0 {
            return Err(ConfigError::ValidationError(
                "particles.capacity must be greater than zero".to_string(),
            ));
        }
        if !self.gravity.is_finite() {
            return Err(ConfigError::ValidationError(
                "particles.gravity must be finite".to_string(),
            ));
        }
        self.emitter.validate()
    }
}

/// 发射器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitterConfig {
    /// 每秒发射数量
    pub spawn_rate: f32,
    /// 发射原点（世界坐标）
    pub origin: Vec2,
    /// 初始速度 x 分量
    pub velocity_x: SampleRange,
    /// 初始速度 y 分量
    pub velocity_y: SampleRange,
    /// 旋转速度（弧度/秒）
    pub spin: SampleRange,
    /// 大小指数：size = 2^sample，得到对数均匀分布
    pub size_exponent: SampleRange,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            spawn_rate: 50.0,
            origin: Vec2::ZERO,
            velocity_x: SampleRange::symmetric(12.0),
            velocity_y: SampleRange::new(24.0, 48.0),
            spin: SampleRange::symmetric(5.0),
            size_exponent: SampleRange::new(-2.0, 0.5),
        }
    }
}

impl EmitterConfig {
    /// 验证配置
    pub fn validate(&self) -> ConfigResult<()> {
        if !self.spawn_rate.is_finite() || self.spawn_rate < 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "emitter.spawn_rate must be a non-negative number, got {}",
                self.spawn_rate
            )));
        }
        if !self.origin.is_finite() {
            return Err(ConfigError::ValidationError(
                "emitter.origin must be finite".to_string(),
            ));
        }
        self.velocity_x.validate("emitter.velocity_x")?;
        self.velocity_y.validate("emitter.velocity_y")?;
        self.spin.validate("emitter.spin")?;
        if self.spin.min != -self.spin.max {
            return Err(ConfigError::ValidationError(format!(
                "emitter.spin must be symmetric around zero, got [{}, {})",
                self.spin.min, self.spin.max
            )));
        }
        self.size_exponent.validate("emitter.size_exponent")?;
        // 2^x 在 f32 内必须保持为正且有限
        if self.size_exponent.min < -100.0 || self.size_exponent.max > 100.0 {
            return Err(ConfigError::ValidationError(
                "emitter.size_exponent must stay within [-100, 100]".to_string(),
            ));
        }
        Ok(())
    }
}
