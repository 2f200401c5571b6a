//! GPU 设备抽象
//!
//! 帧核心只依赖 [`GpuDevice`] 提供的几个原语：创建缓冲区、丢弃式整体写入、
//! 从两段源码编译程序、解析 uniform 块、提交一帧。
//! [`WgpuDevice`] 是窗口下的真实实现，[`HeadlessDevice`] 在内存中模拟同样的契约。

use std::num::NonZeroU32;
use std::path::Path;

use crate::core::error::{RenderError, ResourceWarning, ShaderLoadError};

pub mod bridge;
pub mod geometry;
pub mod headless;
pub mod uniforms;
pub mod wgpu_device;

pub use bridge::{GpuResourceBridge, UploadReport, UploadStats};
pub use geometry::{full_screen_quad, star_vertices, GeometryVertex};
pub use headless::HeadlessDevice;
pub use uniforms::UniformBlock;
pub use wgpu_device::WgpuDevice;

/// 缓冲区句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferHandle(pub(crate) u32);

impl BufferHandle {
    pub fn id(&self) -> u32 {
        self.0
    }
}

/// 程序句柄，永远非零
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramHandle(pub(crate) NonZeroU32);

impl ProgramHandle {
    pub fn id(&self) -> u32 {
        self.0.get()
    }
}

/// 缓冲区用途
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferUsage {
    /// 顶点或实例数据
    Vertex,
    /// uniform 块
    Uniform,
}

/// 更新频率提示
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateHint {
    /// 启动时写入一次
    Static,
    /// 每帧整体重写
    Dynamic,
}

/// 缓冲区描述
#[derive(Debug, Clone, Copy)]
pub struct BufferDesc<'a> {
    pub label: &'a str,
    pub size: u64,
    pub usage: BufferUsage,
    pub hint: UpdateHint,
    /// 初始内容，长度不能超过 `size`
    pub contents: Option<&'a [u8]>,
}

/// 程序的顶点输入布局
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexLayout {
    /// slot 0 = 几何顶点 (location 0)，slot 1 = 每实例的粒子 (location 1..=3)
    Particles,
    /// slot 0 = 全屏四边形角点 (location 0)
    FullScreenQuad,
}

impl VertexLayout {
    /// 该布局提供的顶点输入 location
    pub fn input_locations(&self) -> &'static [u32] {
        match self {
            Self::Particles => &[0, 1, 2, 3],
            Self::FullScreenQuad => &[0],
        }
    }
}

/// 单个着色器阶段的源码
#[derive(Debug, Clone, Copy)]
pub struct StageSource<'a> {
    pub path: &'a Path,
    pub source: &'a str,
}

/// 程序描述
#[derive(Debug, Clone, Copy)]
pub struct ProgramDesc<'a> {
    pub label: &'a str,
    pub vertex: StageSource<'a>,
    pub fragment: StageSource<'a>,
    pub layout: VertexLayout,
    /// uniform 块必须位于 group 0 的这个绑定点
    pub uniform_binding: u32,
}

/// 单次绘制
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawCall {
    pub program: ProgramHandle,
    pub geometry: BufferHandle,
    /// 实例缓冲区；`None` 表示普通（非实例化）绘制
    pub instances: Option<BufferHandle>,
    pub uniforms: BufferHandle,
    pub vertex_count: u32,
    pub instance_count: u32,
}

/// 一帧的提交内容：先清屏，再执行可选的绘制
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FramePass {
    pub clear_color: [f32; 4],
    pub draw: Option<DrawCall>,
}

/// GPU 设备契约
pub trait GpuDevice {
    /// 创建缓冲区
    fn create_buffer(&mut self, desc: &BufferDesc<'_>) -> BufferHandle;

    /// 以丢弃旧内容的方式整体写入缓冲区
    ///
    /// 设备本帧无法提供写入目标时返回 [`ResourceWarning`]，缓冲区保持上一帧的内容。
    fn write_buffer_discard(
        &mut self,
        buffer: BufferHandle,
        data: &[u8],
    ) -> Result<(), ResourceWarning>;

    /// 编译并链接程序
    fn compile_program(&mut self, desc: &ProgramDesc<'_>) -> Result<ProgramHandle, ShaderLoadError>;

    /// 把名为 `block` 的 uniform 块绑定到 `binding`；程序没有该块时返回 `false`
    fn resolve_uniform_block(&mut self, program: ProgramHandle, block: &str, binding: u32) -> bool;

    /// 销毁程序
    fn destroy_program(&mut self, program: ProgramHandle);

    /// 提交一帧
    fn draw(&mut self, pass: &FramePass) -> Result<(), RenderError>;
}
