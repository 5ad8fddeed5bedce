//! Unit-cube proxy geometry bounding the raycast.

use crate::buffer::{create_index_buffer, create_vertex_buffer};

/// Quads per face, counter-clockwise seen from outside. Corner `i` is at
/// `(i & 1, (i >> 1) & 1, (i >> 2) & 1)`.
/// Face order: +X, -X, +Y, -Y, +Z, -Z
const FACES: [[u32; 4]; 6] = [
    [1, 3, 7, 5],
    [4, 6, 2, 0],
    [2, 6, 7, 3],
    [4, 0, 1, 5],
    [4, 5, 7, 6],
    [1, 0, 2, 3],
];

/// Vertex layout of the cube: one `vec3<f32>` position at location 0.
pub const CUBE_VERTEX_LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
    array_stride: 12,
    step_mode: wgpu::VertexStepMode::Vertex,
    attributes: &[wgpu::VertexAttribute {
        format: wgpu::VertexFormat::Float32x3,
        offset: 0,
        shader_location: 0,
    }],
};

/// Winding the cube is built with. Pipelines drawing it must use this.
pub const CUBE_FRONT_FACE: wgpu::FrontFace = wgpu::FrontFace::Cw;

/// Generates the 8 corners of `[0, 1]^3` and 36 indices wound clockwise from outside.
#[must_use]
pub fn unit_cube() -> (Vec<[f32; 3]>, Vec<u32>) {
    let positions = (0..8u32)
        .map(|i| [(i & 1) as f32, ((i >> 1) & 1) as f32, ((i >> 2) & 1) as f32])
        .collect();

    let mut indices = Vec::with_capacity(36);
    for [a, b, c, d] in FACES {
        // Reverse each counter-clockwise triangle.
        indices.extend_from_slice(&[a, c, b, a, d, c]);
    }

    (positions, indices)
}

/// GPU buffers of the proxy cube. Built once, read-only afterwards.
pub struct CubeGeometry {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

impl CubeGeometry {
    /// Uploads the unit cube.
    #[must_use]
    pub fn new(device: &wgpu::Device) -> Self {
        let (positions, indices) = unit_cube();
        Self {
            vertex_buffer: create_vertex_buffer(device, &positions, Some("cube vertices")),
            index_buffer: create_index_buffer(device, &indices, Some("cube indices")),
            index_count: indices.len() as u32,
        }
    }

    /// Binds the cube buffers and issues one indexed draw.
    pub fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        render_pass.draw_indexed(0..self.index_count, 0, 0..1);
    }

    /// Number of indices.
    #[must_use]
    pub fn index_count(&self) -> u32 {
        self.index_count
    }
}
