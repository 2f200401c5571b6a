/// 统一配置系统
///
/// 提供TOML/JSON配置文件、环境变量覆盖和配置验证
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub mod graphics;
pub mod particles;
pub mod shaders;

pub use graphics::{RenderConfig, WindowConfig};
pub use particles::{EmitterConfig, ParticleConfig, SampleRange};
pub use shaders::{ShaderConfig, ShaderPairConfig};

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 文件读取错误
    #[error("Config file error: {0}")]
    FileError(#[from] std::io::Error),
    /// 解析错误
    #[error("Config parse error: {0}")]
    ParseError(String),
    /// 验证错误
    #[error("Config validation error: {0}")]
    ValidationError(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// 应用主配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// 窗口配置
    pub window: WindowConfig,
    /// 粒子配置
    pub particles: ParticleConfig,
    /// 渲染配置
    pub render: RenderConfig,
    /// 着色器配置
    pub shaders: ShaderConfig,
    /// 日志配置
    pub logging: LoggingConfig,
}

/// 配置来源
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// 从文件加载
    File(PathBuf),
    /// 使用默认配置
    Defaults,
}

impl AppConfig {
    /// 从TOML文件加载配置
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// 从TOML字符串解析配置
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// 从JSON文件加载配置
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// 从JSON字符串解析配置
    pub fn from_json_str(content: &str) -> ConfigResult<Self> {
        serde_json::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// 保存为TOML文件
    pub fn save_toml<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// 从环境变量覆盖配置
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| env::var(key).ok());
    }

    /// 用任意键值来源覆盖配置（便于测试）
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(width) = lookup("PARTICLES_WINDOW_WIDTH").and_then(|v| v.parse().ok()) {
            self.window.width = width;
        }
        if let Some(height) = lookup("PARTICLES_WINDOW_HEIGHT").and_then(|v| v.parse().ok()) {
            self.window.height = height;
        }
        if let Some(capacity) = lookup("PARTICLES_CAPACITY").and_then(|v| v.parse().ok()) {
            self.particles.capacity = capacity;
        }
        if let Some(rate) = lookup("PARTICLES_SPAWN_RATE").and_then(|v| v.parse().ok()) {
            self.particles.emitter.spawn_rate = rate;
        }
        if let Some(seed) = lookup("PARTICLES_SEED").and_then(|v| parse_seed(&v)) {
            self.particles.seed = seed;
        }
        if let Some(dir) = lookup("PARTICLES_SHADER_DIR") {
            self.shaders.base_dir = PathBuf::from(dir);
        }
    }

    /// 验证配置
    pub fn validate(&self) -> ConfigResult<()> {
        self.window.validate()?;
        self.particles.validate()?;
        self.render.validate()?;
        self.shaders.validate()?;
        Ok(())
    }

    /// 自动查找并加载配置文件
    ///
    /// 按以下顺序查找：
    /// 1. ./particles.toml
    /// 2. ./particles.json
    /// 3. {config_dir}/particle_workshop/config.toml
    /// 4. 使用默认配置
    ///
    /// 存在但无法解析的文件会被跳过，错误随结果一并返回，由调用方在日志初始化后报告。
    pub fn load_or_default() -> (Self, ConfigSource, Vec<ConfigError>) {
        let mut candidates = vec![
            PathBuf::from("particles.toml"),
            PathBuf::from("particles.json"),
        ];
        if let Some(dir) = dirs::config_dir() {
            candidates.push(dir.join("particle_workshop").join("config.toml"));
        }
        Self::load_first(&candidates)
    }

    /// 依次尝试候选文件，返回第一个成功加载的配置
    pub fn load_first(candidates: &[PathBuf]) -> (Self, ConfigSource, Vec<ConfigError>) {
        let mut errors = Vec::new();
        for path in candidates {
            if !path.is_file() {
                continue;
            }
            let loaded = match path.extension().and_then(|e| e.to_str()) {
                Some("json") => Self::from_json_file(path),
                _ => Self::from_toml_file(path),
            };
            match loaded {
                Ok(config) => return (config, ConfigSource::File(path.clone()), errors),
                Err(e) => errors.push(e),
            }
        }
        (Self::default(), ConfigSource::Defaults, errors)
    }
}

fn parse_seed(value: &str) -> Option<u32> {
    let value = value.trim();
    match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => value.parse().ok(),
    }
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别（`RUST_LOG` 优先）
    pub level: LogLevel,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
        }
    }
}

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// 跟踪
    Trace,
    /// 调试
    Debug,
    /// 信息
    Info,
    /// 警告
    Warn,
    /// 错误
    Error,
}

impl LogLevel {
    /// 转换为 `EnvFilter` 指令
    pub fn as_directive(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_serialization() {
        let config = AppConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed = AppConfig::from_toml_str(&toml_str).unwrap();
        assert_eq!(config.particles.capacity, parsed.particles.capacity);
        assert_eq!(config.shaders.particles, parsed.shaders.particles);
    }

    #[test]
    fn test_json_serialization() {
        let config = AppConfig::default();
        let json_str = serde_json::to_string(&config).unwrap();
        let parsed = AppConfig::from_json_str(&json_str).unwrap();
        assert_eq!(config.window.width, parsed.window.width);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            [particles]
            capacity = 4

            [particles.emitter]
            spawn_rate = 10.0

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();
        assert_eq!(config.particles.capacity, 4);
        assert_eq!(config.particles.emitter.spawn_rate, 10.0);
        assert_eq!(config.particles.gravity, -40.0);
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.window.width, 1280);
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("PARTICLES_CAPACITY", "16"),
            ("PARTICLES_SEED", "0x1234"),
            ("PARTICLES_WINDOW_WIDTH", "not a number"),
            ("PARTICLES_SHADER_DIR", "assets"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));
        assert_eq!(config.particles.capacity, 16);
        assert_eq!(config.particles.seed, 0x1234);
        assert_eq!(config.window.width, 1280);
        assert_eq!(config.shaders.base_dir, PathBuf::from("assets"));
    }

    #[test]
    fn test_load_first_skips_broken_files() {
        let dir = TempDir::new().unwrap();
        let broken = dir.path().join("broken.toml");
        let good = dir.path().join("good.json");
        fs::write(&broken, "particles = [").unwrap();
        let mut config = AppConfig::default();
        config.particles.capacity = 8;
        fs::write(&good, serde_json::to_string(&config).unwrap()).unwrap();

        let candidates = vec![dir.path().join("missing.toml"), broken, good.clone()];
        let (loaded, source, errors) = AppConfig::load_first(&candidates);
        assert_eq!(loaded.particles.capacity, 8);
        assert_eq!(source, ConfigSource::File(good));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("particles.toml");
        let mut config = AppConfig::default();
        config.render.world_size = 60.0;
        config.save_toml(&path).unwrap();
        let loaded = AppConfig::from_toml_file(&path).unwrap();
        assert_eq!(loaded.render.world_size, 60.0);
    }
}
