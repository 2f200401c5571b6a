//! 统一错误处理模块
//!
//! 错误按照恢复策略分层：
//!
//! - **启动期致命错误** (`StartupError`): 窗口、表面、适配器或设备创建失败，主循环开始前终止进程
//! - **资源警告** (`ResourceWarning`): 本帧某个缓冲区无法写入，跳过该缓冲区，继续运行
//! - **着色器加载失败** (`ShaderLoadError`): 源文件缺失、编译或链接失败，保留之前的程序
//! - **渲染错误** (`RenderError`): 提交帧时表面不可用
//!
//! 启动之后的所有错误都不致命，会在下一帧或下一次重载轮询时自愈。

use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigError;
use crate::render::gpu::BufferHandle;

/// 应用顶层错误
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Startup failed: {0}")]
    Startup(#[from] StartupError),

    #[error("Event loop error: {0}")]
    EventLoop(String),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),
}

pub type AppResult<T> = Result<T, AppError>;

/// 启动期致命错误
#[derive(Error, Debug)]
pub enum StartupError {
    #[error("Failed to create event loop: {0}")]
    EventLoop(String),

    #[error("Window creation failed: {0}")]
    Window(String),

    #[error("Failed to create surface: {0}")]
    SurfaceCreation(String),

    #[error("Failed to request adapter: no compatible GPU found")]
    NoAdapter,

    #[error("Failed to request device: {0}")]
    DeviceRequest(String),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

/// 缓冲区写入失败（本帧跳过该缓冲区）
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResourceWarning {
    #[error("Buffer '{label}' could not be mapped for writing this frame")]
    BufferBusy { label: String },

    #[error("Unknown buffer handle {0:?}")]
    UnknownBuffer(BufferHandle),

    #[error("Write of {actual} bytes does not fit buffer '{label}' ({capacity} bytes)")]
    SizeMismatch {
        label: String,
        capacity: u64,
        actual: u64,
    },
}

/// 着色器加载失败
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShaderLoadError {
    #[error("Couldn't find shader source file {path:?}")]
    NotFound { path: PathBuf },

    #[error("Couldn't read shader source file {path:?}: {reason}")]
    Io { path: PathBuf, reason: String },

    #[error("{path:?} did not compile:\n{log}")]
    Compile { path: PathBuf, log: String },

    #[error("Program '{program}' did not link:\n{log}")]
    Link { program: String, log: String },
}

impl ShaderLoadError {
    /// 诊断文本（编译/链接日志），其他变体返回错误描述本身
    pub fn diagnostic(&self) -> String {
        match self {
            Self::Compile { log, .. } | Self::Link { log, .. } => log.clone(),
            other => other.to_string(),
        }
    }
}

/// 渲染错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("Surface lost or outdated, reconfigured")]
    SurfaceLost,

    #[error("Timed out acquiring the next surface texture")]
    SurfaceTimeout,

    #[error("Out of GPU memory")]
    OutOfMemory,

    #[error("Unknown program handle {0}")]
    UnknownProgram(u32),
}

impl RenderError {
    /// 是否应该终止主循环
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::OutOfMemory)
    }
}
