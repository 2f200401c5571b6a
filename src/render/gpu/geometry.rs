//! 静态几何体生成

use std::f32::consts::TAU;

/// 几何顶点（局部坐标，单位半径）
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GeometryVertex {
    pub position: [f32; 2],
}

impl GeometryVertex {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { position: [x, y] }
    }
}

/// 生成 `points` 角星形，每个角由两个三角形组成，共 `points * 6` 个顶点
///
/// 第 i 个角：中心、右内点、外尖点 / 中心、外尖点、左内点。角 0 指向 +y。
pub fn star_vertices(points: u32, inner_radius: f32, outer_radius: f32) -> Vec<GeometryVertex> {
    let n = points as f32;
    let at = |angle: f32, radius: f32| GeometryVertex::new(-angle.sin() * radius, angle.cos() * radius);

    let mut vertices = Vec::with_capacity(points as usize * 6);
    for i in 0..points as i64 {
        let i = i as f32;
        let left = TAU * (2.0 * i + 1.0) / (2.0 * n);
        let middle = TAU * i / n;
        let right = TAU * (2.0 * i - 1.0) / (2.0 * n);

        let center = GeometryVertex::default();
        let tip = at(middle, outer_radius);
        vertices.extend_from_slice(&[
            center,
            at(right, inner_radius),
            tip,
            center,
            tip,
            at(left, inner_radius),
        ]);
    }
    vertices
}

/// 覆盖整个裁剪空间的四边形（两个三角形）
pub fn full_screen_quad() -> [GeometryVertex; 6] {
    [
        GeometryVertex::new(-1.0, -1.0),
        GeometryVertex::new(1.0, -1.0),
        GeometryVertex::new(1.0, 1.0),
        GeometryVertex::new(-1.0, -1.0),
        GeometryVertex::new(1.0, 1.0),
        GeometryVertex::new(-1.0, 1.0),
    ]
}
