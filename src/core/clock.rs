//! 帧时钟
//!
//! 把墙钟时间转换成每帧的时间步长。第一帧的步长为 0。

use std::time::Instant;

/// 帧时钟
#[derive(Debug, Clone)]
pub struct FrameClock {
    /// 上一帧的时间（秒）
    prev_time: Option<f64>,
    /// 当前时间（秒）
    now: f64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            prev_time: None,
            now: 0.0,
        }
    }

    /// 推进到 `now`（秒），返回距上一帧的步长
    ///
    /// 时间倒退时返回负值，由调用方决定如何处理；发射器对非正步长不产生粒子。
    pub fn advance(&mut self, now: f64) -> f32 {
        let timestep = match self.prev_time {
            Some(prev) => (now - prev) as f32,
            None => 0.0,
        };
        self.prev_time = Some(now);
        self.now = now;
        timestep
    }

    /// 当前时间（秒）
    pub fn now(&self) -> f64 {
        self.now
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

/// 以进程启动时刻为零点的墙钟
#[derive(Debug, Clone, Copy)]
pub struct WallClock {
    start: Instant,
}

impl WallClock {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// 自启动以来经过的秒数
    pub fn seconds(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}
