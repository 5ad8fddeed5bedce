//! Front/back position passes bounding each ray.

use glam::{Mat4, Vec3};

use crate::buffer::{create_uniform_buffer, update_buffer};
use crate::cube::{CubeGeometry, CUBE_FRONT_FACE, CUBE_VERTEX_LAYOUT};
use crate::render_targets::{RenderTargets, POSITION_FORMAT, PROXY_DEPTH_FORMAT};

/// GPU representation of the proxy transform.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PositionUniforms {
    pub model: [[f32; 4]; 4],
    pub view_proj: [[f32; 4]; 4],
    pub scale_factor: [f32; 4],
}

impl PositionUniforms {
    /// Packs the model and camera matrices with the cube scale.
    #[must_use]
    pub fn new(model: Mat4, view_proj: Mat4, scale_factor: Vec3) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            view_proj: view_proj.to_cols_array_2d(),
            scale_factor: scale_factor.extend(1.0).to_array(),
        }
    }
}

impl Default for PositionUniforms {
    fn default() -> Self {
        Self::new(Mat4::IDENTITY, Mat4::IDENTITY, Vec3::ONE)
    }
}

/// Renders the cube's nearest front faces and farthest back faces into the
/// entry and exit position buffers.
pub struct EntryExitPass {
    front_pipeline: wgpu::RenderPipeline,
    back_pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl EntryExitPass {
    /// Creates both pipelines and the uniform buffer.
    pub fn new(device: &wgpu::Device) -> Self {
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Positions Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Positions Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/positions.wgsl").into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Positions Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let front_pipeline = create_positions_pipeline(
            device,
            &pipeline_layout,
            &shader,
            wgpu::Face::Back,
            "Entry Positions Pipeline",
        );
        let back_pipeline = create_positions_pipeline(
            device,
            &pipeline_layout,
            &shader,
            wgpu::Face::Front,
            "Exit Positions Pipeline",
        );

        let uniform_buffer = create_uniform_buffer(
            device,
            &PositionUniforms::default(),
            Some("Positions Uniform Buffer"),
        );

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Positions Bind Group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        Self {
            front_pipeline,
            back_pipeline,
            uniform_buffer,
            bind_group,
        }
    }

    /// Uploads the transform for the next [`render`](Self::render).
    pub fn update_uniforms(&self, queue: &wgpu::Queue, uniforms: &PositionUniforms) {
        update_buffer(queue, &self.uniform_buffer, uniforms);
    }

    /// Records the front pass then the back pass.
    ///
    /// Each sub-pass sets its own pipeline; nothing carries over between them.
    pub fn render(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        cube: &CubeGeometry,
        targets: &RenderTargets,
    ) {
        self.render_faces(
            encoder,
            cube,
            &self.front_pipeline,
            targets.front().view(),
            targets,
            "Entry Positions Pass",
        );
        self.render_faces(
            encoder,
            cube,
            &self.back_pipeline,
            targets.back().view(),
            targets,
            "Exit Positions Pass",
        );
    }

    fn render_faces(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        cube: &CubeGeometry,
        pipeline: &wgpu::RenderPipeline,
        output_view: &wgpu::TextureView,
        targets: &RenderTargets,
        label: &str,
    ) {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: output_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: targets.proxy_depth().view(),
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Discard,
                }),
                stencil_ops: None,
            }),
            ..Default::default()
        });

        render_pass.set_pipeline(pipeline);
        render_pass.set_bind_group(0, &self.bind_group, &[]);
        cube.draw(&mut render_pass);
    }
}

fn create_positions_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    cull_mode: wgpu::Face,
    label: &str,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[CUBE_VERTEX_LAYOUT],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: POSITION_FORMAT,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            front_face: CUBE_FRONT_FACE,
            cull_mode: Some(cull_mode),
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: PROXY_DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_uniforms_layout() {
        assert_eq!(std::mem::size_of::<PositionUniforms>(), 144);
    }

    #[test]
    fn test_position_uniforms_pack_scale() {
        let uniforms = PositionUniforms::new(Mat4::IDENTITY, Mat4::IDENTITY, Vec3::new(1.0, 0.5, 0.25));
        assert_eq!(uniforms.scale_factor, [1.0, 0.5, 0.25, 1.0]);
        assert_eq!(uniforms.model, Mat4::IDENTITY.to_cols_array_2d());
    }
}
