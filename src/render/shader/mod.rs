//! 着色器管线管理
//!
//! 管理两对程序（光栅粒子程序和可选的光线追踪程序），负责加载、编译、链接，
//! 并按固定间隔轮询源文件修改时间实现热重载。
//!
//! ## 状态机
//!
//! ```text
//! Unloaded ──load──► Compiling ──ok──► Linked
//!                        │
//!                        └──err──► Failed
//! ```
//!
//! 新程序确认有效后才销毁旧程序并替换。编译或链接失败时保留之前链接成功的程序，
//! 活动句柄永远不会变成无效值。失败的程序对在之后的每次轮询中都会重试，
//! 直到源文件修改时间不再比上次成功加载时新。

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::config::{ShaderConfig, ShaderPairConfig};
use crate::core::error::ShaderLoadError;
use crate::render::gpu::{GpuDevice, ProgramDesc, ProgramHandle, StageSource, VertexLayout};

pub mod reflect;
pub mod source;

pub use reflect::{ProgramReflection, UniformBlockInfo};

/// 程序种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgramKind {
    /// 实例化绘制星形粒子
    Particles,
    /// 全屏四边形上的解析光线追踪
    RayTrace,
}

impl ProgramKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Particles => "particles",
            Self::RayTrace => "ray_trace",
        }
    }

    pub fn layout(&self) -> VertexLayout {
        match self {
            Self::Particles => VertexLayout::Particles,
            Self::RayTrace => VertexLayout::FullScreenQuad,
        }
    }
}

/// 程序对的加载状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramState {
    Unloaded,
    Compiling,
    Linked,
    Failed,
}

/// 程序对的公开视图
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramBinding {
    pub vertex_path: PathBuf,
    pub fragment_path: PathBuf,
    /// 上次成功加载时顶点源文件的修改时间
    pub last_vertex_mtime: Option<SystemTime>,
    /// 上次成功加载时片元源文件的修改时间
    pub last_fragment_mtime: Option<SystemTime>,
    /// 当前活动的程序（最近一次尝试失败时仍是之前的程序）
    pub program: Option<ProgramHandle>,
    pub state: ProgramState,
}

/// 一次加载或重载的结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub linked: Vec<ProgramKind>,
    pub failures: Vec<(ProgramKind, ShaderLoadError)>,
}

impl LoadReport {
    /// 本次没有尝试任何加载
    pub fn is_empty(&self) -> bool {
        self.linked.is_empty() && self.failures.is_empty()
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

type Revision = (Option<SystemTime>, Option<SystemTime>);

#[derive(Debug)]
struct ProgramSlot {
    kind: ProgramKind,
    sources: ShaderPairConfig,
    state: ProgramState,
    active: Option<ProgramHandle>,
    loaded: Revision,
    /// 最近一次失败时源文件的修改时间，用于避免重复输出同一份诊断
    failed_revision: Option<Revision>,
    last_error: Option<ShaderLoadError>,
}

impl ProgramSlot {
    fn new(kind: ProgramKind, sources: ShaderPairConfig) -> Self {
        Self {
            kind,
            sources,
            state: ProgramState::Unloaded,
            active: None,
            loaded: (None, None),
            failed_revision: None,
            last_error: None,
        }
    }

    fn current_revision(&self, base_dir: &Path) -> Revision {
        (
            source::modified_time(base_dir, &self.sources.vertex),
            source::modified_time(base_dir, &self.sources.fragment),
        )
    }

    /// 任一源文件比上次成功加载时新
    fn is_stale(&self, base_dir: &Path) -> bool {
        let (vertex, fragment) = self.current_revision(base_dir);
        newer(vertex, self.loaded.0) || newer(fragment, self.loaded.1)
    }
}

fn newer(current: Option<SystemTime>, loaded: Option<SystemTime>) -> bool {
    match (current, loaded) {
        (Some(current), Some(loaded)) => current > loaded,
        (Some(_), None) => true,
        (None, _) => false,
    }
}

/// 着色器管线管理器
#[derive(Debug)]
pub struct ShaderManager {
    base_dir: PathBuf,
    reload_interval: f32,
    uniform_block: String,
    uniform_binding: u32,
    slots: Vec<ProgramSlot>,
    reload_timer: f32,
    reload_count: u64,
}

impl ShaderManager {
    /// 创建管理器，所有程序处于 `Unloaded` 状态
    pub fn new(config: &ShaderConfig) -> Self {
        let mut slots = vec![ProgramSlot::new(
            ProgramKind::Particles,
            config.particles.clone(),
        )];
        if let Some(ray_trace) = &config.ray_trace {
            slots.push(ProgramSlot::new(ProgramKind::RayTrace, ray_trace.clone()));
        }

        Self {
            base_dir: config.base_dir.clone(),
            reload_interval: config.reload_interval,
            uniform_block: config.uniform_block.clone(),
            uniform_binding: config.uniform_binding,
            slots,
            reload_timer: 0.0,
            reload_count: 0,
        }
    }

    /// 加载（或重新加载）所有程序对
    pub fn load_all<D: GpuDevice + ?Sized>(&mut self, device: &mut D) -> LoadReport {
        let mut report = LoadReport::default();
        for index in 0..self.slots.len() {
            self.load_slot(index, device, &mut report);
        }
        report
    }

    /// 累加计时器，到达轮询间隔时检查源文件并重载变化的程序对
    ///
    /// 未到间隔时返回 `None`。
    pub fn check_and_reload<D: GpuDevice + ?Sized>(
        &mut self,
        device: &mut D,
        timestep: f32,
    ) -> Option<LoadReport> {
        if timestep.is_finite() && timestep > 0.0 {
            self.reload_timer += timestep;
        }
        if self.reload_timer < self.reload_interval {
            return None;
        }
        self.reload_timer = 0.0;
        Some(self.reload_changed(device))
    }

    /// 立即检查所有程序对，只重载源文件比上次成功加载更新的那些
    pub fn reload_changed<D: GpuDevice + ?Sized>(&mut self, device: &mut D) -> LoadReport {
        let mut report = LoadReport::default();
        for index in 0..self.slots.len() {
            if self.slots[index].is_stale(&self.base_dir) {
                self.load_slot(index, device, &mut report);
            }
        }
        report
    }

    fn load_slot<D: GpuDevice + ?Sized>(
        &mut self,
        index: usize,
        device: &mut D,
        report: &mut LoadReport,
    ) {
        let base_dir = self.base_dir.clone();
        let slot = &mut self.slots[index];
        let kind = slot.kind;
        slot.state = ProgramState::Compiling;

        let result = compile_pair(
            device,
            &base_dir,
            kind,
            &slot.sources,
            self.uniform_binding,
        );

        match result {
            Ok((handle, revision)) => {
                if !device.resolve_uniform_block(handle, &self.uniform_block, self.uniform_binding) {
                    tracing::debug!(
                        target: "shaders",
                        "Program '{}' has no uniform block '{}', linked without binding",
                        kind.label(),
                        self.uniform_block
                    );
                }
                if let Some(old) = slot.active.replace(handle) {
                    device.destroy_program(old);
                    self.reload_count += 1;
                }
                slot.loaded = revision;
                slot.state = ProgramState::Linked;
                slot.failed_revision = None;
                slot.last_error = None;

                tracing::info!(
                    target: "shaders",
                    "Linked '{}' program from {:?} + {:?}",
                    kind.label(),
                    slot.sources.vertex,
                    slot.sources.fragment
                );
                report.linked.push(kind);
            }
            Err(error) => {
                let revision = slot.current_revision(&base_dir);
                if slot.failed_revision != Some(revision) {
                    tracing::warn!(
                        target: "shaders",
                        "Failed to load '{}' program, keeping previous program: {}",
                        kind.label(),
                        error
                    );
                } else {
                    tracing::debug!(
                        target: "shaders",
                        "'{}' program still fails to load: {}",
                        kind.label(),
                        error
                    );
                }
                slot.failed_revision = Some(revision);
                slot.state = ProgramState::Failed;
                slot.last_error = Some(error.clone());
                report.failures.push((kind, error));
            }
        }
    }

    /// 当前活动的程序
    pub fn active(&self, kind: ProgramKind) -> Option<ProgramHandle> {
        self.slot(kind).and_then(|slot| slot.active)
    }

    pub fn state(&self, kind: ProgramKind) -> ProgramState {
        self.slot(kind)
            .map_or(ProgramState::Unloaded, |slot| slot.state)
    }

    pub fn binding(&self, kind: ProgramKind) -> Option<ProgramBinding> {
        self.slot(kind).map(|slot| ProgramBinding {
            vertex_path: slot.sources.vertex.clone(),
            fragment_path: slot.sources.fragment.clone(),
            last_vertex_mtime: slot.loaded.0,
            last_fragment_mtime: slot.loaded.1,
            program: slot.active,
            state: slot.state,
        })
    }

    /// 最近一次失败的错误（成功加载后清除）
    pub fn last_error(&self, kind: ProgramKind) -> Option<&ShaderLoadError> {
        self.slot(kind).and_then(|slot| slot.last_error.as_ref())
    }

    /// 已配置的程序种类
    pub fn kinds(&self) -> impl Iterator<Item = ProgramKind> + '_ {
        self.slots.iter().map(|slot| slot.kind)
    }

    /// 成功替换旧程序的次数
    pub fn reload_count(&self) -> u64 {
        self.reload_count
    }

    /// 销毁所有活动程序
    pub fn release<D: GpuDevice + ?Sized>(&mut self, device: &mut D) {
        for slot in &mut self.slots {
            if let Some(handle) = slot.active.take() {
                device.destroy_program(handle);
            }
            slot.state = ProgramState::Unloaded;
        }
    }

    fn slot(&self, kind: ProgramKind) -> Option<&ProgramSlot> {
        self.slots.iter().find(|slot| slot.kind == kind)
    }
}

fn compile_pair<D: GpuDevice + ?Sized>(
    device: &mut D,
    base_dir: &Path,
    kind: ProgramKind,
    sources: &ShaderPairConfig,
    uniform_binding: u32,
) -> Result<(ProgramHandle, Revision), ShaderLoadError> {
    let vertex = source::read_source(base_dir, &sources.vertex)?;
    let fragment = source::read_source(base_dir, &sources.fragment)?;

    let handle = device.compile_program(&ProgramDesc {
        label: kind.label(),
        vertex: StageSource {
            path: &vertex.path,
            source: &vertex.text,
        },
        fragment: StageSource {
            path: &fragment.path,
            source: &fragment.text,
        },
        layout: kind.layout(),
        uniform_binding,
    })?;

    Ok((handle, (vertex.modified, fragment.modified)))
}
