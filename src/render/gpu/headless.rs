//! 无窗口 GPU 设备
//!
//! 在内存中实现 [`GpuDevice`] 契约：缓冲区是字节数组，程序经过与真实设备相同的
//! naga 编译和链接检查，提交的帧被记录下来。可以把某个缓冲区标记为"忙"来模拟
//! 本帧无法映射写入的情况。

use std::collections::HashMap;
use std::num::NonZeroU32;

use super::{
    BufferDesc, BufferHandle, BufferUsage, FramePass, GpuDevice, ProgramDesc, ProgramHandle,
    UpdateHint,
};
use crate::core::error::{RenderError, ResourceWarning, ShaderLoadError};
use crate::render::shader::reflect::{link_program, ProgramReflection};

/// 内存缓冲区
#[derive(Debug, Clone)]
pub struct HeadlessBuffer {
    pub label: String,
    pub usage: BufferUsage,
    pub hint: UpdateHint,
    pub data: Vec<u8>,
    /// 成功写入次数（不含创建时的初始内容）
    pub writes: u64,
    busy: bool,
}

/// 已链接的程序
#[derive(Debug, Clone)]
pub struct HeadlessProgram {
    pub label: String,
    pub reflection: ProgramReflection,
    /// 已解析的 uniform 绑定点
    pub uniform_binding: Option<u32>,
}

/// 无窗口设备
#[derive(Debug, Default)]
pub struct HeadlessDevice {
    buffers: HashMap<BufferHandle, HeadlessBuffer>,
    programs: HashMap<ProgramHandle, HeadlessProgram>,
    next_buffer: u32,
    next_program: u32,
    frames: Vec<FramePass>,
    pending_draw_error: Option<RenderError>,
    compile_count: u64,
}

impl HeadlessDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// 标记缓冲区本帧无法映射
    pub fn set_buffer_busy(&mut self, buffer: BufferHandle, busy: bool) {
        if let Some(entry) = self.buffers.get_mut(&buffer) {
            entry.busy = busy;
        }
    }

    /// 让下一次 `draw` 返回指定错误
    pub fn fail_next_draw(&mut self, error: RenderError) {
        self.pending_draw_error = Some(error);
    }

    pub fn buffer(&self, buffer: BufferHandle) -> Option<&HeadlessBuffer> {
        self.buffers.get(&buffer)
    }

    pub fn buffer_contents(&self, buffer: BufferHandle) -> Option<&[u8]> {
        self.buffers.get(&buffer).map(|b| b.data.as_slice())
    }

    pub fn program(&self, program: ProgramHandle) -> Option<&HeadlessProgram> {
        self.programs.get(&program)
    }

    pub fn is_program_live(&self, program: ProgramHandle) -> bool {
        self.programs.contains_key(&program)
    }

    /// 当前存活的程序数
    pub fn live_program_count(&self) -> usize {
        self.programs.len()
    }

    /// 调用 `compile_program` 的总次数（含失败）
    pub fn compile_count(&self) -> u64 {
        self.compile_count
    }

    /// 已提交的帧
    pub fn frames(&self) -> &[FramePass] {
        &self.frames
    }

    pub fn last_frame(&self) -> Option<&FramePass> {
        self.frames.last()
    }
}

impl GpuDevice for HeadlessDevice {
    fn create_buffer(&mut self, desc: &BufferDesc<'_>) -> BufferHandle {
        let handle = BufferHandle(self.next_buffer);
        self.next_buffer += 1;

        let mut data = vec![0u8; desc.size as usize];
        if let Some(contents) = desc.contents {
            let len = contents.len().min(data.len());
            data[..len].copy_from_slice(&contents[..len]);
        }

        self.buffers.insert(
            handle,
            HeadlessBuffer {
                label: desc.label.to_string(),
                usage: desc.usage,
                hint: desc.hint,
                data,
                writes: 0,
                busy: false,
            },
        );
        handle
    }

    fn write_buffer_discard(
        &mut self,
        buffer: BufferHandle,
        data: &[u8],
    ) -> Result<(), ResourceWarning> {
        let entry = self
            .buffers
            .get_mut(&buffer)
            .ok_or(ResourceWarning::UnknownBuffer(buffer))?;

        if entry.busy {
            return Err(ResourceWarning::BufferBusy {
                label: entry.label.clone(),
            });
        }
        if data.len() > entry.data.len() {
            return Err(ResourceWarning::SizeMismatch {
                label: entry.label.clone(),
                capacity: entry.data.len() as u64,
                actual: data.len() as u64,
            });
        }

        // 丢弃旧内容：未覆盖的部分清零，而不是与旧数据合并
        entry.data[..data.len()].copy_from_slice(data);
        entry.data[data.len()..].fill(0);
        entry.writes += 1;
        Ok(())
    }

    fn compile_program(&mut self, desc: &ProgramDesc<'_>) -> Result<ProgramHandle, ShaderLoadError> {
        self.compile_count += 1;
        let reflection = link_program(desc)?;

        self.next_program += 1;
        let id = NonZeroU32::new(self.next_program).ok_or_else(|| ShaderLoadError::Link {
            program: desc.label.to_string(),
            log: "program handles exhausted".to_string(),
        })?;
        let handle = ProgramHandle(id);
        self.programs.insert(
            handle,
            HeadlessProgram {
                label: desc.label.to_string(),
                reflection,
                uniform_binding: None,
            },
        );
        Ok(handle)
    }

    fn resolve_uniform_block(&mut self, program: ProgramHandle, block: &str, binding: u32) -> bool {
        match self.programs.get_mut(&program) {
            Some(entry) if entry.reflection.has_uniform_block(block, binding) => {
                entry.uniform_binding = Some(binding);
                true
            }
            _ => false,
        }
    }

    fn destroy_program(&mut self, program: ProgramHandle) {
        self.programs.remove(&program);
    }

    fn draw(&mut self, pass: &FramePass) -> Result<(), RenderError> {
        if let Some(error) = self.pending_draw_error.take() {
            return Err(error);
        }
        if let Some(draw) = &pass.draw {
            if !self.programs.contains_key(&draw.program) {
                return Err(RenderError::UnknownProgram(draw.program.id()));
            }
        }
        self.frames.push(*pass);
        Ok(())
    }
}
