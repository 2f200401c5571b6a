//! 每帧 uniform 块

use glam::Vec3;

use crate::config::RenderConfig;

/// 每帧重新计算的 uniform 数据
///
/// 与着色器中的 `UniformData` 结构一一对应（32 字节，`vec3` 后紧跟 `f32`）。
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct UniformBlock {
    /// 窗口覆盖的世界尺寸
    pub window_size: [f32; 2],
    /// 窗口中心的世界坐标
    pub window_center: [f32; 2],
    /// 归一化光照方向（光线追踪模式）
    pub light_dir: [f32; 3],
    /// 墙钟时间（秒）
    pub time: f32,
}

impl UniformBlock {
    pub const SIZE: u64 = std::mem::size_of::<Self>() as u64;

    /// 根据帧缓冲尺寸和渲染配置计算本帧的 uniform
    ///
    /// 较短的窗口边恰好覆盖 `world_size` 个世界单位。面积为零（最小化）时返回 `None`。
    pub fn compute(framebuffer: (u32, u32), render: &RenderConfig, time: f64) -> Option<Self> {
        let (width, height) = framebuffer;
        if width == 0 || height == 0 {
            return None;
        }

        let pixels_to_world = render.world_size / width.min(height) as f32;
        let light_dir = Vec3::from_array(render.light_dir).normalize_or_zero();

        Some(Self {
            window_size: [
                pixels_to_world * width as f32,
                pixels_to_world * height as f32,
            ],
            window_center: [0.0, render.center_height * render.world_size],
            light_dir: light_dir.to_array(),
            time: time as f32,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_layout() {
        assert_eq!(UniformBlock::SIZE, 32);
    }

    #[test]
    fn test_view_mapping_landscape() {
        let block = UniformBlock::compute((1280, 720), &RenderConfig::default(), 2.5).unwrap();
        assert!((block.window_size[1] - 30.0).abs() < 1e-4);
        assert!((block.window_size[0] - 30.0 * 1280.0 / 720.0).abs() < 1e-3);
        assert_eq!(block.window_center, [0.0, 12.0]);
        assert_eq!(block.time, 2.5);
    }

    #[test]
    fn test_view_mapping_portrait() {
        let block = UniformBlock::compute((400, 800), &RenderConfig::default(), 0.0).unwrap();
        assert!((block.window_size[0] - 30.0).abs() < 1e-4);
        assert!((block.window_size[1] - 60.0).abs() < 1e-4);
    }

    #[test]
    fn test_light_dir_normalized() {
        let block = UniformBlock::compute((10, 10), &RenderConfig::default(), 0.0).unwrap();
        let len = Vec3::from_array(block.light_dir).length();
        assert!((len - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_zero_area_framebuffer() {
        assert!(UniformBlock::compute((0, 720), &RenderConfig::default(), 0.0).is_none());
        assert!(UniformBlock::compute((1280, 0), &RenderConfig::default(), 0.0).is_none());
    }
}
