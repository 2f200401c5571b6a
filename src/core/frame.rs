//! 帧编排
//!
//! 每个 tick 严格按顺序执行：
//!
//! 1. 由时钟计算时间步长
//! 2. 发射器生成新粒子
//! 3. 积分器推进所有粒子
//! 4. 着色器热重载轮询（按自己的间隔）
//! 5. 由帧缓冲尺寸和时钟计算 uniform
//! 6. 上传粒子快照和 uniform
//! 7. 选择当前模式的程序并提交绘制
//!
//! 所有可变状态都是编排器的字段，没有全局变量；tick 中途不会被打断。

use std::num::NonZeroUsize;

use crate::config::{AppConfig, ConfigError, RenderConfig};
use crate::core::clock::FrameClock;
use crate::core::error::{RenderError, StartupError};
use crate::core::rng::XorShift32;
use crate::render::gpu::{FramePass, GpuDevice, GpuResourceBridge, UniformBlock};
use crate::render::particles::{Emitter, Integrator, ParticlePool};
use crate::render::shader::{LoadReport, ProgramKind, ShaderManager};

/// 渲染模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    /// 实例化绘制星形粒子
    #[default]
    Raster,
    /// 全屏光线追踪
    RayTrace,
}

impl RenderMode {
    pub fn toggled(self) -> Self {
        match self {
            Self::Raster => Self::RayTrace,
            Self::RayTrace => Self::Raster,
        }
    }

    pub fn program_kind(self) -> ProgramKind {
        match self {
            Self::Raster => ProgramKind::Particles,
            Self::RayTrace => ProgramKind::RayTrace,
        }
    }
}

/// 每个 tick 开始时消费一次的输入
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameInput {
    /// 切换光栅/光线追踪模式
    pub toggle_ray_trace: bool,
    /// 请求退出，tick 不再做任何工作
    pub shutdown: bool,
}

/// 跳过绘制的原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// 帧缓冲面积为零（窗口最小化）
    ZeroArea,
    /// 表面暂时不可用
    Surface(RenderError),
}

/// tick 的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// 绘制了当前模式的程序
    Drawn,
    /// 当前模式没有可用程序，只清屏
    Cleared,
    /// 模拟照常推进，但没有提交绘制
    Skipped(SkipReason),
    /// 收到退出请求
    Shutdown,
}

/// 帧统计
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameStats {
    pub ticks: u64,
    pub last_timestep: f32,
    pub spawned_last_tick: u32,
    pub spawned_total: u64,
    pub skipped_uploads: u64,
    pub reloads: u64,
    pub reload_failures: u64,
    pub skipped_draws: u64,
}

/// 帧编排器
///
/// 拥有粒子池、发射器、积分器、随机数生成器、GPU 资源和着色器管理器。
pub struct FrameOrchestrator<D: GpuDevice> {
    device: D,
    pool: ParticlePool,
    emitter: Emitter,
    integrator: Integrator,
    rng: XorShift32,
    clock: FrameClock,
    bridge: GpuResourceBridge,
    shaders: ShaderManager,
    render: RenderConfig,
    mode: RenderMode,
    stats: FrameStats,
}

impl<D: GpuDevice> FrameOrchestrator<D> {
    /// 创建缓冲区并首次加载所有着色器
    ///
    /// 着色器加载失败不是致命错误：程序会在之后的轮询中重试。
    pub fn new(mut device: D, config: &AppConfig) -> Result<Self, StartupError> {
        config.validate()?;
        let capacity = NonZeroUsize::new(config.particles.capacity).ok_or_else(|| {
            ConfigError::ValidationError("particles.capacity must be greater than zero".into())
        })?;

        let pool = ParticlePool::new(capacity);
        let bridge = GpuResourceBridge::new(&mut device, capacity.get(), &config.render);
        let mut shaders = ShaderManager::new(&config.shaders);
        let report = shaders.load_all(&mut device);

        tracing::info!(
            target: "app",
            capacity = capacity.get(),
            seed = config.particles.seed,
            linked = report.linked.len(),
            failed = report.failures.len(),
            "Frame core ready"
        );

        let mode = if config.render.start_in_ray_trace {
            RenderMode::RayTrace
        } else {
            RenderMode::Raster
        };

        Ok(Self {
            device,
            pool,
            emitter: Emitter::new(config.particles.emitter.clone()),
            integrator: Integrator::new(config.particles.gravity),
            rng: XorShift32::new(config.particles.seed),
            clock: FrameClock::new(),
            bridge,
            shaders,
            render: config.render.clone(),
            mode,
            stats: FrameStats::default(),
        })
    }

    /// 推进一帧
    ///
    /// `now` 是单调时钟的秒数，`framebuffer` 是当前帧缓冲的像素尺寸。
    /// 只有致命的渲染错误（显存耗尽）会返回 `Err`。
    pub fn tick(
        &mut self,
        input: FrameInput,
        now: f64,
        framebuffer: (u32, u32),
    ) -> Result<TickOutcome, RenderError> {
        if input.shutdown {
            return Ok(TickOutcome::Shutdown);
        }
        if input.toggle_ray_trace {
            self.set_mode(self.mode.toggled());
        }

        let raw_timestep = self.clock.advance(now);
        // 时间倒退或非有限值按零步长处理
        let timestep = if raw_timestep.is_finite() {
            raw_timestep.max(0.0)
        } else {
            0.0
        };
        if timestep != raw_timestep {
            tracing::debug!(target: "app", raw_timestep, "Clamping frame step to zero");
        }

        self.stats.ticks += 1;
        self.stats.last_timestep = timestep;

        let spawned = self.emitter.emit(timestep, &mut self.pool, &mut self.rng);
        self.stats.spawned_last_tick = spawned;
        self.stats.spawned_total += u64::from(spawned);

        self.integrator.step(timestep, &mut self.pool);

        if let Some(report) = self.shaders.check_and_reload(&mut self.device, timestep) {
            self.record_reload(&report);
        }

        let Some(uniforms) = UniformBlock::compute(framebuffer, &self.render, now) else {
            self.stats.skipped_draws += 1;
            return Ok(TickOutcome::Skipped(SkipReason::ZeroArea));
        };

        let upload = self
            .bridge
            .upload_frame(&mut self.device, &self.pool, &uniforms);
        self.stats.skipped_uploads += upload.warnings.len() as u64;

        let draw = self
            .shaders
            .active(self.mode.program_kind())
            .map(|program| match self.mode {
                RenderMode::Raster => self.bridge.particle_draw(program),
                RenderMode::RayTrace => self.bridge.ray_trace_draw(program),
            });
        let pass = FramePass {
            clear_color: self.render.clear_color,
            draw,
        };

        match self.device.draw(&pass) {
            Ok(()) if pass.draw.is_some() => Ok(TickOutcome::Drawn),
            Ok(()) => Ok(TickOutcome::Cleared),
            Err(error) if error.is_fatal() => {
                tracing::error!(target: "app", "Fatal render error: {error}");
                Err(error)
            }
            Err(error) => {
                tracing::debug!(target: "app", "Skipping frame: {error}");
                self.stats.skipped_draws += 1;
                Ok(TickOutcome::Skipped(SkipReason::Surface(error)))
            }
        }
    }

    fn record_reload(&mut self, report: &LoadReport) {
        self.stats.reloads += report.linked.len() as u64;
        self.stats.reload_failures += report.failures.len() as u64;
    }

    /// 切换渲染模式
    pub fn set_mode(&mut self, mode: RenderMode) {
        if mode != self.mode {
            tracing::info!(target: "app", "Render mode: {:?}", mode);
            if self.shaders.active(mode.program_kind()).is_none() {
                tracing::warn!(
                    target: "app",
                    "No '{}' program is linked; frames will only be cleared",
                    mode.program_kind().label()
                );
            }
            self.mode = mode;
        }
    }

    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    pub fn pool(&self) -> &ParticlePool {
        &self.pool
    }

    pub fn emitter(&self) -> &Emitter {
        &self.emitter
    }

    pub fn shaders(&self) -> &ShaderManager {
        &self.shaders
    }

    pub fn bridge(&self) -> &GpuResourceBridge {
        &self.bridge
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// 立即重新加载所有着色器（不等待轮询间隔）
    pub fn reload_shaders(&mut self) -> LoadReport {
        let report = self.shaders.load_all(&mut self.device);
        self.record_reload(&report);
        report
    }

    /// 释放程序并交还设备
    pub fn shutdown(mut self) -> D {
        self.shaders.release(&mut self.device);
        tracing::info!(
            target: "app",
            ticks = self.stats.ticks,
            spawned = self.stats.spawned_total,
            "Frame core shut down"
        );
        self.device
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ShaderPairConfig;
    use crate::render::gpu::HeadlessDevice;

    fn config_without_shaders() -> AppConfig {
        let mut config = AppConfig::default();
        config.particles.capacity = 8;
        config.shaders.base_dir = std::env::temp_dir().join("particle_workshop_no_shaders");
        config.shaders.particles = ShaderPairConfig::new("absent_vs.wgsl", "absent_fs.wgsl");
        config.shaders.ray_trace = None;
        config
    }

    #[test]
    fn test_mode_toggle() {
        assert_eq!(RenderMode::Raster.toggled(), RenderMode::RayTrace);
        assert_eq!(RenderMode::RayTrace.toggled(), RenderMode::Raster);
        assert_eq!(RenderMode::RayTrace.program_kind(), ProgramKind::RayTrace);
    }

    #[test]
    fn test_clear_only_without_program() {
        let mut frame = FrameOrchestrator::new(HeadlessDevice::new(), &config_without_shaders()).unwrap();
        let outcome = frame.tick(FrameInput::default(), 0.0, (640, 480)).unwrap();
        assert_eq!(outcome, TickOutcome::Cleared);
        let pass = frame.device().last_frame().unwrap();
        assert_eq!(pass.draw, None);
        assert_eq!(pass.clear_color, [0.0, 0.6, 1.0, 1.0]);
    }

    #[test]
    fn test_shutdown_does_no_work() {
        let mut frame = FrameOrchestrator::new(HeadlessDevice::new(), &config_without_shaders()).unwrap();
        let input = FrameInput {
            shutdown: true,
            ..Default::default()
        };
        assert_eq!(frame.tick(input, 1.0, (640, 480)).unwrap(), TickOutcome::Shutdown);
        assert_eq!(frame.stats().ticks, 0);
        assert!(frame.device().frames().is_empty());
    }

    #[test]
    fn test_zero_area_still_simulates() {
        let mut frame = FrameOrchestrator::new(HeadlessDevice::new(), &config_without_shaders()).unwrap();
        frame.tick(FrameInput::default(), 0.0, (0, 0)).unwrap();
        let outcome = frame.tick(FrameInput::default(), 0.1, (0, 0)).unwrap();
        assert_eq!(outcome, TickOutcome::Skipped(SkipReason::ZeroArea));
        assert_eq!(frame.stats().spawned_total, 5);
        assert!(frame.device().frames().is_empty());
    }

    #[test]
    fn test_surface_errors() {
        let mut frame = FrameOrchestrator::new(HeadlessDevice::new(), &config_without_shaders()).unwrap();
        frame.device_mut().fail_next_draw(RenderError::SurfaceLost);
        assert_eq!(
            frame.tick(FrameInput::default(), 0.0, (64, 64)).unwrap(),
            TickOutcome::Skipped(SkipReason::Surface(RenderError::SurfaceLost))
        );
        frame.device_mut().fail_next_draw(RenderError::OutOfMemory);
        assert_eq!(
            frame.tick(FrameInput::default(), 0.1, (64, 64)),
            Err(RenderError::OutOfMemory)
        );
    }

    #[test]
    fn test_invalid_config_is_startup_error() {
        let mut config = config_without_shaders();
        config.particles.capacity = 0;
        assert!(matches!(
            FrameOrchestrator::new(HeadlessDevice::new(), &config),
            Err(StartupError::Config(_))
        ));
    }
}
