use super::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 一对顶点/片元着色器源文件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShaderPairConfig {
    pub vertex: PathBuf,
    pub fragment: PathBuf,
}

impl ShaderPairConfig {
    pub fn new(vertex: impl Into<PathBuf>, fragment: impl Into<PathBuf>) -> Self {
        Self {
            vertex: vertex.into(),
            fragment: fragment.into(),
        }
    }
}

/// 着色器管线配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShaderConfig {
    /// 查找源文件的起始目录；找不到时再尝试上一级目录
    pub base_dir: PathBuf,
    /// 热重载轮询间隔（模拟秒）
    pub reload_interval: f32,
    /// uniform 块的类型名
    pub uniform_block: String,
    /// uniform 块的绑定点
    pub uniform_binding: u32,
    /// 光栅化粒子程序
    pub particles: ShaderPairConfig,
    /// 光线追踪程序（可选）
    pub ray_trace: Option<ShaderPairConfig>,
}

impl Default for ShaderConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            reload_interval: 0.5,
            uniform_block: "uniform_data".to_string(),
            uniform_binding: 0,
            particles: ShaderPairConfig::new(
                "shaders/particle_vertex.wgsl",
                "shaders/particle_fragment.wgsl",
            ),
            ray_trace: Some(ShaderPairConfig::new(
                "shaders/raytrace_vertex.wgsl",
                "shaders/raytrace_fragment.wgsl",
            )),
        }
    }
}

impl ShaderConfig {
    /// 验证配置
    pub fn validate(&self) -> ConfigResult<()> {
        if !self.reload_interval.is_finite() || self.reload_interval <= 0.0 {
            return Err(ConfigError::ValidationError(
                "shaders.reload_interval must be positive".to_string(),
            ));
        }
        if self.uniform_block.is_empty() {
            return Err(ConfigError::ValidationError(
                "shaders.uniform_block must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
