pub mod winit;

use crate::core::frame::FrameInput;

// ============================================================================
// Platform Window Abstraction
// ============================================================================

/// 平台窗口抽象
pub trait Window {
    /// 帧缓冲的像素尺寸
    fn size(&self) -> (u32, u32);
    fn request_redraw(&self);
}

// ============================================================================
// Input Abstraction
// ============================================================================

/// 帧核心关心的离散输入事件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    KeyPressed { key: KeyCode },
    WindowResized { width: u32, height: u32 },
    WindowCloseRequested,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Escape,
    Space,
    R,
    Unknown,
}

/// 在两个 tick 之间累积输入，每个 tick 开始时取出一次
///
/// 回调只写入这里，帧核心在 tick 边界读取，避免在一帧中途修改状态。
#[derive(Debug, Clone, Copy, Default)]
pub struct InputState {
    toggles: u32,
    shutdown: bool,
    resized: Option<(u32, u32)>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: InputEvent) {
        match event {
            InputEvent::KeyPressed { key: KeyCode::Escape } | InputEvent::WindowCloseRequested => {
                self.shutdown = true;
            }
            InputEvent::KeyPressed {
                key: KeyCode::Space | KeyCode::R,
            } => {
                self.toggles += 1;
            }
            InputEvent::KeyPressed { key: KeyCode::Unknown } => {}
            InputEvent::WindowResized { width, height } => {
                self.resized = Some((width, height));
            }
        }
    }

    /// 是否已请求退出（退出请求一旦出现就保持）
    pub fn shutdown_requested(&self) -> bool {
        self.shutdown
    }

    /// 取出最近一次的尺寸变化
    pub fn take_resize(&mut self) -> Option<(u32, u32)> {
        self.resized.take()
    }

    /// 取出本 tick 的输入；两次切换互相抵消
    pub fn take_frame_input(&mut self) -> FrameInput {
        let input = FrameInput {
            toggle_ray_trace: self.toggles % 2 == 1,
            shutdown: self.shutdown,
        };
        self.toggles = 0;
        input
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_consumed_once() {
        let mut input = InputState::new();
        input.push(InputEvent::KeyPressed { key: KeyCode::Space });
        assert!(input.take_frame_input().toggle_ray_trace);
        assert!(!input.take_frame_input().toggle_ray_trace);
    }

    #[test]
    fn test_double_toggle_cancels() {
        let mut input = InputState::new();
        input.push(InputEvent::KeyPressed { key: KeyCode::Space });
        input.push(InputEvent::KeyPressed { key: KeyCode::R });
        assert!(!input.take_frame_input().toggle_ray_trace);
    }

    #[test]
    fn test_shutdown_is_sticky() {
        let mut input = InputState::new();
        input.push(InputEvent::KeyPressed { key: KeyCode::Unknown });
        assert!(!input.shutdown_requested());
        input.push(InputEvent::KeyPressed { key: KeyCode::Escape });
        assert!(input.take_frame_input().shutdown);
        assert!(input.take_frame_input().shutdown);

        let mut input = InputState::new();
        input.push(InputEvent::WindowCloseRequested);
        assert!(input.shutdown_requested());
    }

    #[test]
    fn test_latest_resize_wins() {
        let mut input = InputState::new();
        input.push(InputEvent::WindowResized { width: 10, height: 20 });
        input.push(InputEvent::WindowResized { width: 30, height: 40 });
        assert_eq!(input.take_resize(), Some((30, 40)));
        assert_eq!(input.take_resize(), None);
    }
}
