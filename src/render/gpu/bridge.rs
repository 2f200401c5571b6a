//! GPU 资源桥
//!
//! 持有帧核心用到的全部设备缓冲区：
//!
//! - 静态几何：星形顶点（光栅模式）和全屏四边形（光线追踪模式），启动时写入一次
//! - 粒子镜像：每帧用粒子池快照整体重写
//! - uniform 块：每帧整体重写
//!
//! 每帧的写入都丢弃缓冲区旧内容。某个缓冲区本帧无法写入时记录警告并跳过，
//! 保留上一帧的数据，不中断这一帧。

use super::{
    full_screen_quad, star_vertices, BufferDesc, BufferHandle, BufferUsage, DrawCall, GpuDevice,
    ProgramHandle, UniformBlock, UpdateHint,
};
use crate::config::RenderConfig;
use crate::core::error::ResourceWarning;
use crate::render::particles::{Particle, ParticlePool};

/// 单次上传的结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadReport {
    pub particles_written: bool,
    pub uniforms_written: bool,
    pub warnings: Vec<ResourceWarning>,
}

impl UploadReport {
    pub fn is_complete(&self) -> bool {
        self.particles_written && self.uniforms_written
    }
}

/// 累计上传统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadStats {
    pub uploads: u64,
    pub skipped_particle_writes: u64,
    pub skipped_uniform_writes: u64,
}

/// 静态几何缓冲区
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticGeometry {
    pub buffer: BufferHandle,
    pub vertex_count: u32,
}

/// 设备缓冲区所有者
#[derive(Debug)]
pub struct GpuResourceBridge {
    star: StaticGeometry,
    quad: StaticGeometry,
    particles: BufferHandle,
    uniforms: BufferHandle,
    particle_capacity: u32,
    stats: UploadStats,
}

impl GpuResourceBridge {
    /// 创建所有缓冲区，几何数据在这里一次性写入
    pub fn new<D: GpuDevice + ?Sized>(
        device: &mut D,
        particle_capacity: usize,
        render: &RenderConfig,
    ) -> Self {
        let star_vertices = star_vertices(
            render.star_points,
            render.star_inner_radius,
            render.star_outer_radius,
        );
        let star_bytes: &[u8] = bytemuck::cast_slice(&star_vertices);
        let star = StaticGeometry {
            buffer: device.create_buffer(&BufferDesc {
                label: "star_geometry",
                size: star_bytes.len() as u64,
                usage: BufferUsage::Vertex,
                hint: UpdateHint::Static,
                contents: Some(star_bytes),
            }),
            vertex_count: star_vertices.len() as u32,
        };

        let quad_vertices = full_screen_quad();
        let quad_bytes: &[u8] = bytemuck::cast_slice(&quad_vertices);
        let quad = StaticGeometry {
            buffer: device.create_buffer(&BufferDesc {
                label: "quad_geometry",
                size: quad_bytes.len() as u64,
                usage: BufferUsage::Vertex,
                hint: UpdateHint::Static,
                contents: Some(quad_bytes),
            }),
            vertex_count: quad_vertices.len() as u32,
        };

        let particles = device.create_buffer(&BufferDesc {
            label: "particles",
            size: Particle::SIZE * particle_capacity as u64,
            usage: BufferUsage::Vertex,
            hint: UpdateHint::Dynamic,
            contents: None,
        });

        let uniforms = device.create_buffer(&BufferDesc {
            label: "uniform_data",
            size: UniformBlock::SIZE,
            usage: BufferUsage::Uniform,
            hint: UpdateHint::Dynamic,
            contents: None,
        });

        tracing::debug!(
            target: "gpu",
            star_vertices = star.vertex_count,
            particle_capacity,
            "Created device buffers"
        );

        Self {
            star,
            quad,
            particles,
            uniforms,
            particle_capacity: particle_capacity as u32,
            stats: UploadStats::default(),
        }
    }

    /// 上传本帧的 uniform 和粒子快照
    ///
    /// 每个缓冲区独立处理：一个写入失败不影响另一个。
    pub fn upload_frame<D: GpuDevice + ?Sized>(
        &mut self,
        device: &mut D,
        pool: &ParticlePool,
        uniforms: &UniformBlock,
    ) -> UploadReport {
        let mut report = UploadReport::default();
        self.stats.uploads += 1;

        match device.write_buffer_discard(self.uniforms, bytemuck::bytes_of(uniforms)) {
            Ok(()) => report.uniforms_written = true,
            Err(warning) => {
                tracing::warn!(target: "gpu", "Skipping uniform upload this frame: {warning}");
                self.stats.skipped_uniform_writes += 1;
                report.warnings.push(warning);
            }
        }

        match device.write_buffer_discard(self.particles, pool.as_bytes()) {
            Ok(()) => report.particles_written = true,
            Err(warning) => {
                tracing::warn!(target: "gpu", "Skipping particle upload this frame: {warning}");
                self.stats.skipped_particle_writes += 1;
                report.warnings.push(warning);
            }
        }

        report
    }

    /// 光栅模式：每个粒子实例化绘制一个星形
    pub fn particle_draw(&self, program: ProgramHandle) -> DrawCall {
        DrawCall {
            program,
            geometry: self.star.buffer,
            instances: Some(self.particles),
            uniforms: self.uniforms,
            vertex_count: self.star.vertex_count,
            instance_count: self.particle_capacity,
        }
    }

    /// 光线追踪模式：单个全屏四边形
    pub fn ray_trace_draw(&self, program: ProgramHandle) -> DrawCall {
        DrawCall {
            program,
            geometry: self.quad.buffer,
            instances: None,
            uniforms: self.uniforms,
            vertex_count: self.quad.vertex_count,
            instance_count: 1,
        }
    }

    pub fn star(&self) -> StaticGeometry {
        self.star
    }

    pub fn quad(&self) -> StaticGeometry {
        self.quad
    }

    pub fn particle_buffer(&self) -> BufferHandle {
        self.particles
    }

    pub fn uniform_buffer(&self) -> BufferHandle {
        self.uniforms
    }

    pub fn stats(&self) -> UploadStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::gpu::HeadlessDevice;
    use glam::Vec2;
    use std::num::NonZeroUsize;

    fn setup(capacity: usize) -> (HeadlessDevice, GpuResourceBridge, ParticlePool) {
        let mut device = HeadlessDevice::new();
        let bridge = GpuResourceBridge::new(&mut device, capacity, &RenderConfig::default());
        let pool = ParticlePool::new(NonZeroUsize::new(capacity).unwrap());
        (device, bridge, pool)
    }

    fn uniforms() -> UniformBlock {
        UniformBlock::compute((800, 600), &RenderConfig::default(), 1.0).unwrap()
    }

    #[test]
    fn test_static_geometry_written_at_startup() {
        let (device, bridge, _) = setup(4);
        assert_eq!(bridge.star().vertex_count, 30);
        assert_eq!(bridge.quad().vertex_count, 6);
        let star = device.buffer(bridge.star().buffer).unwrap();
        assert_eq!(star.hint, UpdateHint::Static);
        assert_eq!(star.data.len(), 30 * 8);
        let particles = device.buffer(bridge.particle_buffer()).unwrap();
        assert_eq!(particles.data.len(), 4 * 32);
        assert_eq!(particles.hint, UpdateHint::Dynamic);
    }

    #[test]
    fn test_upload_copies_snapshot() {
        let (mut device, mut bridge, mut pool) = setup(2);
        pool.spawn(Particle {
            position: Vec2::new(1.0, 2.0),
            size: 1.0,
            ..Default::default()
        });
        let report = bridge.upload_frame(&mut device, &pool, &uniforms());
        assert!(report.is_complete());
        assert!(report.warnings.is_empty());
        assert_eq!(
            device.buffer_contents(bridge.particle_buffer()).unwrap(),
            pool.as_bytes()
        );
        assert_eq!(
            device.buffer_contents(bridge.uniform_buffer()).unwrap(),
            bytemuck::bytes_of(&uniforms())
        );
    }

    #[test]
    fn test_busy_buffer_is_skipped_not_fatal() {
        let (mut device, mut bridge, mut pool) = setup(2);
        bridge.upload_frame(&mut device, &pool, &uniforms());
        let before = device
            .buffer_contents(bridge.particle_buffer())
            .unwrap()
            .to_vec();

        device.set_buffer_busy(bridge.particle_buffer(), true);
        pool.spawn(Particle {
            size: 3.0,
            ..Default::default()
        });
        let report = bridge.upload_frame(&mut device, &pool, &uniforms());
        assert!(!report.particles_written);
        assert!(report.uniforms_written);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(
            device.buffer_contents(bridge.particle_buffer()).unwrap(),
            &before[..]
        );
        assert_eq!(bridge.stats().skipped_particle_writes, 1);

        // 下一帧恢复
        device.set_buffer_busy(bridge.particle_buffer(), false);
        assert!(bridge.upload_frame(&mut device, &pool, &uniforms()).is_complete());
        assert_eq!(
            device.buffer_contents(bridge.particle_buffer()).unwrap(),
            pool.as_bytes()
        );
    }

    #[test]
    fn test_draw_calls() {
        let (_, bridge, _) = setup(8);
        let program = ProgramHandle(std::num::NonZeroU32::new(1).unwrap());
        let raster = bridge.particle_draw(program);
        assert_eq!(raster.vertex_count, 30);
        assert_eq!(raster.instance_count, 8);
        assert_eq!(raster.instances, Some(bridge.particle_buffer()));

        let ray = bridge.ray_trace_draw(program);
        assert_eq!(ray.vertex_count, 6);
        assert_eq!(ray.instance_count, 1);
        assert_eq!(ray.instances, None);
    }
}
