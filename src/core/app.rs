//! 应用入口与事件循环

use tracing_subscriber::EnvFilter;
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};

use crate::config::{AppConfig, ConfigSource, LogLevel};
use crate::core::clock::WallClock;
use crate::core::error::{AppError, AppResult, RenderError, StartupError};
use crate::core::frame::{FrameOrchestrator, TickOutcome};
use crate::platform::winit::{translate_event, WinitWindow};
use crate::platform::{InputState, Window};
use crate::render::gpu::WgpuDevice;

/// 应用
pub struct App;

impl App {
    /// 加载配置并运行直到窗口关闭
    ///
    /// 启动失败（事件循环、窗口、表面、适配器、设备或配置无效）返回错误。
    pub fn run() -> AppResult<()> {
        let (mut config, source, errors) = AppConfig::load_or_default();
        config.apply_env_overrides();

        Self::initialize_logging(config.logging.level);
        for error in errors {
            tracing::warn!(target: "config", "Ignoring unreadable config file: {error}");
        }
        match &source {
            ConfigSource::File(path) => {
                tracing::info!(target: "config", "Loaded configuration from {}", path.display())
            }
            ConfigSource::Defaults => tracing::info!(target: "config", "Using default configuration"),
        }

        config.validate().map_err(StartupError::from)?;
        Self::run_with_config(config)
    }

    /// 初始化日志系统
    ///
    /// `RUST_LOG` 优先，否则使用配置的级别。重复初始化会被忽略。
    pub fn initialize_logging(level: LogLevel) {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(level.as_directive()));
        let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
    }

    /// 使用给定配置创建窗口和设备并运行主循环
    pub fn run_with_config(config: AppConfig) -> AppResult<()> {
        let event_loop =
            EventLoop::new().map_err(|e| StartupError::EventLoop(e.to_string()))?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let window = WinitWindow::new(&event_loop, &config.window)?;
        let device = WgpuDevice::new(window.shared(), config.window.vsync)?;
        let mut frame = FrameOrchestrator::new(device, &config)?;

        tracing::info!(
            target: "app",
            "Controls: Space or R toggles ray tracing, Escape quits"
        );

        let clock = WallClock::start();
        let mut input = InputState::new();
        let mut fatal: Option<RenderError> = None;

        let result = event_loop.run(|event, elwt| match event {
            Event::WindowEvent { event, window_id } if window_id == window.raw().id() => {
                if let Some(input_event) = translate_event(&event) {
                    input.push(input_event);
                }

                // 调整大小时立即重绘，保持画面连续
                if let Some((width, height)) = input.take_resize() {
                    frame.device_mut().resize(width, height);
                    window.request_redraw();
                }

                if let WindowEvent::RedrawRequested = event {
                    let frame_input = input.take_frame_input();
                    match frame.tick(frame_input, clock.seconds(), window.size()) {
                        Ok(TickOutcome::Shutdown) => elwt.exit(),
                        Ok(_) => {}
                        Err(error) => {
                            fatal = Some(error);
                            elwt.exit();
                        }
                    }
                }
            }
            Event::AboutToWait => {
                // 退出请求只在两个 tick 之间生效
                if input.shutdown_requested() {
                    elwt.exit();
                } else {
                    window.request_redraw();
                }
            }
            _ => {}
        });

        let stats = frame.stats();
        frame.shutdown();
        tracing::info!(
            target: "app",
            ticks = stats.ticks,
            spawned = stats.spawned_total,
            reloads = stats.reloads,
            skipped_uploads = stats.skipped_uploads,
            "Shutting down"
        );

        if let Some(error) = fatal {
            return Err(AppError::Render(error));
        }
        result.map_err(|e| AppError::EventLoop(e.to_string()))
    }
}
