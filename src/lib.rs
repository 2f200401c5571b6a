//! # Particle Workshop
//!
//! 一个最小的实时二维 GPU 粒子渲染器，用于图形编程工作坊。
//!
//! ## 功能
//!
//! - **粒子模拟**: 固定容量的环形粒子池、按速率发射的发射器和显式欧拉积分
//! - **GPU 上传**: 每帧整体覆盖的粒子实例缓冲，缓冲忙时跳过本帧而不是阻塞
//! - **着色器热重载**: 轮询 WGSL 源文件的修改时间，新程序链接成功后才替换旧程序
//! - **两种渲染模式**: 实例化星形粒子，或全屏四边形光线追踪
//!
//! ## 模块
//!
//! - [`core`]: 应用入口、帧编排、时钟和错误类型
//! - [`config`]: 配置加载与校验
//! - [`platform`]: 窗口与输入抽象
//! - [`render`]: 粒子、GPU 资源和着色器管理
//!
//! ### Example
//!
//! ```no_run
//! fn main() {
//!     if let Err(e) = particle_workshop::core::App::run() {
//!         eprintln!("{e}");
//!     }
//! }
//! ```

/// Core functionality including the frame loop and error types
pub mod core;
/// Configuration system
pub mod config;
/// Platform abstraction layer for windowing and input
pub mod platform;
/// Particle simulation, GPU resources and shader management
pub mod render;
