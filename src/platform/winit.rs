use std::sync::Arc;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::EventLoop;
use winit::keyboard::{KeyCode as WinitKeyCode, PhysicalKey};
use winit::window::{Window as WinitWindowRaw, WindowBuilder};

use super::{InputEvent, KeyCode};
use crate::config::WindowConfig;
use crate::core::error::StartupError;

#[derive(Clone)]
pub struct WinitWindow {
    window: Arc<WinitWindowRaw>,
}

impl WinitWindow {
    pub fn new(event_loop: &EventLoop<()>, config: &WindowConfig) -> Result<Self, StartupError> {
        let window = WindowBuilder::new()
            .with_title(config.title.as_str())
            .with_inner_size(PhysicalSize::new(config.width, config.height))
            .build(event_loop)
            .map_err(|e| StartupError::Window(e.to_string()))?;
        Ok(Self {
            window: Arc::new(window),
        })
    }

    pub fn raw(&self) -> &WinitWindowRaw {
        &self.window
    }

    /// 共享句柄，用于创建 `'static` 的 wgpu 表面
    pub fn shared(&self) -> Arc<WinitWindowRaw> {
        Arc::clone(&self.window)
    }
}

impl crate::platform::Window for WinitWindow {
    fn size(&self) -> (u32, u32) {
        let s = self.window.inner_size();
        (s.width, s.height)
    }
    fn request_redraw(&self) {
        self.window.request_redraw();
    }
}

/// 把 winit 窗口事件翻译成帧核心的输入事件
pub fn translate_event(event: &WindowEvent) -> Option<InputEvent> {
    match event {
        WindowEvent::CloseRequested => Some(InputEvent::WindowCloseRequested),
        WindowEvent::Resized(size) => Some(InputEvent::WindowResized {
            width: size.width,
            height: size.height,
        }),
        WindowEvent::KeyboardInput { event, .. }
            if event.state == ElementState::Pressed && !event.repeat =>
        {
            let key = match event.physical_key {
                PhysicalKey::Code(WinitKeyCode::Escape) => KeyCode::Escape,
                PhysicalKey::Code(WinitKeyCode::Space) => KeyCode::Space,
                PhysicalKey::Code(WinitKeyCode::KeyR) => KeyCode::R,
                _ => KeyCode::Unknown,
            };
            Some(InputEvent::KeyPressed { key })
        }
        _ => None,
    }
}
