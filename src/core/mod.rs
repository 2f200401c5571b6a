//! 核心模块
//!
//! 包含应用的核心功能：
//! - `app` - 应用入口和事件循环
//! - `frame` - 每帧的模拟、上传和绘制编排
//! - `clock` - 帧时钟
//! - `rng` - 确定性随机数生成器
//! - `error` - 错误类型定义

pub mod app;
pub mod clock;
pub mod error;
pub mod frame;
pub mod rng;

// 重新导出错误类型
pub use error::{
    AppError, AppResult, RenderError, ResourceWarning, ShaderLoadError, StartupError,
};

// 重新导出主要类型
pub use app::App;
pub use clock::{FrameClock, WallClock};
pub use frame::{FrameInput, FrameOrchestrator, FrameStats, RenderMode, SkipReason, TickOutcome};
pub use rng::XorShift32;
