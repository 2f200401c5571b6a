//! wgpu 设备实现

use std::borrow::Cow;
use std::collections::HashMap;
use std::num::{NonZeroU32, NonZeroU64};
use std::sync::Arc;

use wgpu::util::DeviceExt;
use winit::window::Window;

use super::{
    BufferDesc, BufferHandle, BufferUsage, FramePass, GeometryVertex, GpuDevice, ProgramDesc,
    ProgramHandle, VertexLayout,
};
use crate::core::error::{RenderError, ResourceWarning, ShaderLoadError, StartupError};
use crate::render::particles::Particle;
use crate::render::shader::reflect::{link_program, ProgramReflection};

const GEOMETRY_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];

// position, velocity, (angle, spin, size, age)
const PARTICLE_ATTRIBUTES: [wgpu::VertexAttribute; 3] =
    wgpu::vertex_attr_array![1 => Float32x2, 2 => Float32x2, 3 => Float32x4];

fn geometry_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<GeometryVertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &GEOMETRY_ATTRIBUTES,
    }
}

fn particle_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: Particle::SIZE,
        step_mode: wgpu::VertexStepMode::Instance,
        attributes: &PARTICLE_ATTRIBUTES,
    }
}

fn vertex_buffers(layout: VertexLayout) -> Vec<wgpu::VertexBufferLayout<'static>> {
    match layout {
        VertexLayout::Particles => vec![geometry_layout(), particle_layout()],
        VertexLayout::FullScreenQuad => vec![geometry_layout()],
    }
}

struct GpuBuffer {
    label: String,
    buffer: wgpu::Buffer,
}

struct GpuProgram {
    pipeline: wgpu::RenderPipeline,
    reflection: ProgramReflection,
    /// 程序使用 uniform 块时的绑定组布局
    uniform_layout: Option<(wgpu::BindGroupLayout, u32)>,
    /// 针对某个 uniform 缓冲区创建的绑定组
    bind_group: Option<(BufferHandle, wgpu::BindGroup)>,
}

/// 基于窗口表面的 wgpu 设备
pub struct WgpuDevice {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    buffers: HashMap<BufferHandle, GpuBuffer>,
    programs: HashMap<ProgramHandle, GpuProgram>,
    next_buffer: u32,
    next_program: u32,
}

impl WgpuDevice {
    /// 为窗口创建表面、适配器和设备
    pub fn new(window: Arc<Window>, vsync: bool) -> Result<Self, StartupError> {
        pollster::block_on(Self::new_async(window, vsync))
    }

    async fn new_async(window: Arc<Window>, vsync: bool) -> Result<Self, StartupError> {
        let size = window.inner_size();
        let instance = wgpu::Instance::default();
        let surface = instance
            .create_surface(window)
            .map_err(|e| StartupError::SurfaceCreation(e.to_string()))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(StartupError::NoAdapter)?;

        let info = adapter.get_info();
        tracing::info!(
            target: "gpu",
            "Adapter: {} ({:?}, {:?})",
            info.name,
            info.backend,
            info.device_type
        );

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("particle_workshop"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::downlevel_webgl2_defaults()
                        .using_resolution(adapter.limits()),
                },
                None,
            )
            .await
            .map_err(|e| StartupError::DeviceRequest(e.to_string()))?;

        // 未被错误作用域捕获的设备错误写入日志，而不是 panic
        device.on_uncaptured_error(Box::new(|error| {
            tracing::error!(target: "gpu", "Device error: {error}");
        }));

        let mut config = surface
            .get_default_config(&adapter, size.width.max(1), size.height.max(1))
            .ok_or_else(|| {
                StartupError::SurfaceCreation("surface is not supported by the adapter".into())
            })?;
        config.present_mode = if vsync {
            wgpu::PresentMode::AutoVsync
        } else {
            wgpu::PresentMode::AutoNoVsync
        };
        surface.configure(&device, &config);

        tracing::info!(
            target: "gpu",
            "Surface configured: {}x{} {:?}",
            config.width,
            config.height,
            config.format
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            buffers: HashMap::new(),
            programs: HashMap::new(),
            next_buffer: 0,
            next_program: 0,
        })
    }

    /// 窗口尺寸变化后重新配置表面；零面积时保持旧配置
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.config.width = width;
            self.config.height = height;
            self.surface.configure(&self.device, &self.config);
            tracing::debug!(target: "gpu", "Surface resized to {width}x{height}");
        }
    }

    fn create_pipeline(
        &self,
        desc: &ProgramDesc<'_>,
        vertex_entry: &str,
        fragment_entry: &str,
        uses_uniforms: bool,
    ) -> (wgpu::RenderPipeline, Option<(wgpu::BindGroupLayout, u32)>) {
        let vertex_module = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&format!("{} vertex", desc.label)),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(desc.vertex.source)),
        });
        let fragment_module = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&format!("{} fragment", desc.label)),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(desc.fragment.source)),
        });

        let uniform_layout = uses_uniforms.then(|| {
            let layout = self
                .device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some(&format!("{} uniforms", desc.label)),
                    entries: &[wgpu::BindGroupLayoutEntry {
                        binding: desc.uniform_binding,
                        visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    }],
                });
            (layout, desc.uniform_binding)
        });

        let bind_group_layouts: Vec<&wgpu::BindGroupLayout> =
            uniform_layout.iter().map(|(layout, _)| layout).collect();
        let pipeline_layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(desc.label),
                bind_group_layouts: &bind_group_layouts,
                push_constant_ranges: &[],
            });

        let buffers = vertex_buffers(desc.layout);
        let pipeline = self
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(desc.label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &vertex_module,
                    entry_point: vertex_entry,
                    compilation_options: Default::default(),
                    buffers: &buffers,
                },
                fragment: Some(wgpu::FragmentState {
                    module: &fragment_module,
                    entry_point: fragment_entry,
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: self.config.format,
                        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState::default(),
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
            });

        (pipeline, uniform_layout)
    }
}

impl GpuDevice for WgpuDevice {
    fn create_buffer(&mut self, desc: &BufferDesc<'_>) -> BufferHandle {
        let usage = match desc.usage {
            BufferUsage::Vertex => wgpu::BufferUsages::VERTEX,
            BufferUsage::Uniform => wgpu::BufferUsages::UNIFORM,
        } | wgpu::BufferUsages::COPY_DST;

        let buffer = match desc.contents {
            Some(contents) if contents.len() as u64 == desc.size => {
                self.device
                    .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some(desc.label),
                        contents,
                        usage,
                    })
            }
            contents => {
                let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some(desc.label),
                    size: desc.size,
                    usage,
                    mapped_at_creation: false,
                });
                if let Some(contents) = contents {
                    self.queue.write_buffer(&buffer, 0, contents);
                }
                buffer
            }
        };

        let handle = BufferHandle(self.next_buffer);
        self.next_buffer += 1;
        self.buffers.insert(
            handle,
            GpuBuffer {
                label: desc.label.to_string(),
                buffer,
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
            .get(&buffer)
            .ok_or(ResourceWarning::UnknownBuffer(buffer))?;

        let Some(size) = NonZeroU64::new(data.len() as u64) else {
            return Ok(());
        };
        if size.get() > entry.buffer.size() {
            return Err(ResourceWarning::SizeMismatch {
                label: entry.label.clone(),
                capacity: entry.buffer.size(),
                actual: size.get(),
            });
        }

        // 写入一块新的暂存区，由队列在提交时整体复制，不读取缓冲区旧内容
        match self.queue.write_buffer_with(&entry.buffer, 0, size) {
            Some(mut view) => {
                view.copy_from_slice(data);
                Ok(())
            }
            None => Err(ResourceWarning::BufferBusy {
                label: entry.label.clone(),
            }),
        }
    }

    fn compile_program(&mut self, desc: &ProgramDesc<'_>) -> Result<ProgramHandle, ShaderLoadError> {
        let reflection = link_program(desc)?;

        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let (pipeline, uniform_layout) = self.create_pipeline(
            desc,
            &reflection.vertex_entry,
            &reflection.fragment_entry,
            reflection.uses_uniforms(),
        );
        if let Some(error) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(ShaderLoadError::Link {
                program: desc.label.to_string(),
                log: error.to_string(),
            });
        }

        self.next_program += 1;
        let id = NonZeroU32::new(self.next_program).ok_or_else(|| ShaderLoadError::Link {
            program: desc.label.to_string(),
            log: "program handles exhausted".to_string(),
        })?;
        let handle = ProgramHandle(id);
        self.programs.insert(
            handle,
            GpuProgram {
                pipeline,
                reflection,
                uniform_layout,
                bind_group: None,
            },
        );
        Ok(handle)
    }

    fn resolve_uniform_block(&mut self, program: ProgramHandle, block: &str, binding: u32) -> bool {
        // 绑定点在链接检查时已固定在 group 0；这里确认该绑定上确实是同名的块
        self.programs.get(&program).is_some_and(|entry| {
            entry.reflection.has_uniform_block(block, binding)
                && matches!(&entry.uniform_layout, Some((_, b)) if *b == binding)
        })
    }

    fn destroy_program(&mut self, program: ProgramHandle) {
        self.programs.remove(&program);
    }

    fn draw(&mut self, pass: &FramePass) -> Result<(), RenderError> {
        let frame = match self.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                return Err(RenderError::SurfaceLost);
            }
            Err(wgpu::SurfaceError::Timeout) => return Err(RenderError::SurfaceTimeout),
            Err(wgpu::SurfaceError::OutOfMemory) => return Err(RenderError::OutOfMemory),
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        // 先准备绑定组，渲染通道借用期间不能再修改程序表
        if let Some(draw) = &pass.draw {
            let program = self
                .programs
                .get_mut(&draw.program)
                .ok_or(RenderError::UnknownProgram(draw.program.id()))?;
            if let Some((layout, binding)) = &program.uniform_layout {
                let stale = !matches!(&program.bind_group, Some((b, _)) if *b == draw.uniforms);
                if stale {
                    if let Some(uniforms) = self.buffers.get(&draw.uniforms) {
                        let group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                            label: Some("uniform_data"),
                            layout,
                            entries: &[wgpu::BindGroupEntry {
                                binding: *binding,
                                resource: uniforms.buffer.as_entire_binding(),
                            }],
                        });
                        program.bind_group = Some((draw.uniforms, group));
                    }
                }
            }
        }

        let [r, g, b, a] = pass.clear_color;
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame"),
            });
        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("particles"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: r as f64,
                            g: g as f64,
                            b: b as f64,
                            a: a as f64,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            if let Some(draw) = &pass.draw {
                let program = self
                    .programs
                    .get(&draw.program)
                    .ok_or(RenderError::UnknownProgram(draw.program.id()))?;
                let geometry = self.buffers.get(&draw.geometry);
                let instances = draw.instances.and_then(|h| self.buffers.get(&h));

                if let Some(geometry) = geometry {
                    rpass.set_pipeline(&program.pipeline);
                    if let Some((_, group)) = &program.bind_group {
                        rpass.set_bind_group(0, group, &[]);
                    }
                    rpass.set_vertex_buffer(0, geometry.buffer.slice(..));
                    if let Some(instances) = instances {
                        rpass.set_vertex_buffer(1, instances.buffer.slice(..));
                    }
                    rpass.draw(0..draw.vertex_count, 0..draw.instance_count);
                }
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }
}
