use super::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};

/// 窗口配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// 窗口标题
    pub title: String,
    /// 宽度（像素）
    pub width: u32,
    /// 高度（像素）
    pub height: u32,
    /// 垂直同步
    pub vsync: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Particle Workshop".to_string(),
            width: 1280,
            height: 720,
            vsync: true,
        }
    }
}

impl WindowConfig {
    /// 验证配置
    pub fn validate(&self) -> ConfigResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::ValidationError(
                "Invalid window size".to_string(),
            ));
        }
        Ok(())
    }
}

/// 渲染配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// 窗口较短边可见的世界单位数
    pub world_size: f32,
    /// 视口中心高度（world_size 的倍数）
    pub center_height: f32,
    /// 背景颜色
    pub clear_color: [f32; 4],
    /// 光线追踪模式的光照方向（会被归一化）
    pub light_dir: [f32; 3],
    /// 星形粒子的角数
    pub star_points: u32,
    /// 星形内半径
    pub star_inner_radius: f32,
    /// 星形外半径
    pub star_outer_radius: f32,
    /// 启动时是否使用光线追踪模式
    pub start_in_ray_trace: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            world_size: 30.0,
            center_height: 0.4,
            clear_color: [0.0, 0.6, 1.0, 1.0],
            light_dir: [-1.0, 1.0, 1.0],
            star_points: 5,
            star_inner_radius: 0.5,
            star_outer_radius: 1.0,
            start_in_ray_trace: false,
        }
    }
}

impl RenderConfig {
    /// 验证配置
    pub fn validate(&self) -> ConfigResult<()> {
        if !self.world_size.is_finite() || self.world_size <= 0.0 {
            return Err(ConfigError::ValidationError(
                "render.world_size must be positive".to_string(),
            ));
        }
        if self.star_points < 3 {
            return Err(ConfigError::ValidationError(
                "render.star_points must be at least 3".to_string(),
            ));
        }
        if self.star_inner_radius <= 0.0 || self.star_outer_radius <= 0.0 {
            return Err(ConfigError::ValidationError(
                "render star radii must be positive".to_string(),
            ));
        }
        if glam::Vec3::from_array(self.light_dir).length_squared() == 0.0 {
            return Err(ConfigError::ValidationError(
                "render.light_dir must not be zero".to_string(),
            ));
        }
        Ok(())
    }
}
