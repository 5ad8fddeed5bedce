//! The raymarching stage.

use bytemuck::Zeroable;
use glam::{Mat4, Vec3};
use volray_core::{RaycastSettings, RenderingParams, VolumeGeometry};

use crate::buffer::{create_uniform_buffer, update_buffer};
use crate::camera::Camera;
use crate::render_targets::{
    RenderTargets, GBUFFER_COLOR_FORMAT, GBUFFER_DEPTH_FORMAT, GBUFFER_NORMAL_FORMAT,
};

/// GPU representation of the per-frame raycast state.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct RaycastUniforms {
    pub model: [[f32; 4]; 4],
    pub view_proj: [[f32; 4]; 4],
    pub normal_matrix: [[f32; 4]; 4],
    pub scale_factor: [f32; 4],
    pub step_size: [f32; 4],
    pub dimensions: [f32; 4],
    pub camera_position: [f32; 4],
    pub light_direction: [f32; 4],
    pub light_ambient: [f32; 4],
    pub light_diffuse: [f32; 4],
    pub threshold: f32,
    pub iterations: u32,
    pub diffuse_shading: u32, // 0 = off, 1 = on
    pub gamma: f32,
    pub exposure: f32,
    pub _pad0: f32,
    pub _pad1: f32,
    pub _pad2: f32,
}

impl RaycastUniforms {
    /// Gathers everything the shader needs for one frame.
    #[must_use]
    pub fn new(
        geometry: &VolumeGeometry,
        settings: &RaycastSettings,
        camera: &Camera,
        params: &RenderingParams,
        threshold: f32,
    ) -> Self {
        let model = settings.transform.matrix();
        let step_scale = settings.step_scale();
        let scale_factor = geometry.scale_factor();

        // Volume-space camera; stays outside the cube if the transform is singular.
        let to_volume = model * Mat4::from_scale(scale_factor);
        let camera_position = if to_volume.determinant().abs() > f32::EPSILON {
            to_volume.inverse().transform_point3(camera.position)
        } else {
            Vec3::splat(-1.0)
        };

        let light = settings.light;
        Self {
            model: model.to_cols_array_2d(),
            view_proj: camera.view_projection_matrix().to_cols_array_2d(),
            normal_matrix: Mat4::from_quat(settings.transform.rotation()).to_cols_array_2d(),
            scale_factor: scale_factor.extend(1.0).to_array(),
            step_size: (geometry.step_size() * step_scale).extend(step_scale).to_array(),
            dimensions: geometry.dimensions().extend(geometry.max_size()).to_array(),
            camera_position: camera_position.extend(1.0).to_array(),
            light_direction: light.direction.extend(0.0).to_array(),
            light_ambient: light.ambient.extend(1.0).to_array(),
            light_diffuse: light.diffuse.extend(1.0).to_array(),
            threshold,
            iterations: geometry.iterations(step_scale),
            diffuse_shading: u32::from(settings.diffuse_shading),
            gamma: params.gamma(),
            exposure: params.exposure(),
            _pad0: 0.0,
            _pad1: 0.0,
            _pad2: 0.0,
        }
    }
}

/// Texture views bound for one raycast.
pub struct RaycastBindings<'a> {
    pub volume: &'a wgpu::TextureView,
    pub gradients: &'a wgpu::TextureView,
    pub transfer_lookup: &'a wgpu::TextureView,
    pub noise: &'a wgpu::TextureView,
    pub targets: &'a RenderTargets,
}

/// Pipelines for direct and deferred raycasting.
pub struct RaycastPass {
    direct_pipeline: wgpu::RenderPipeline,
    deferred_pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    uniform_buffer: wgpu::Buffer,
    sampler: wgpu::Sampler,
    output_format: wgpu::TextureFormat,
}

impl RaycastPass {
    /// Creates the pass. Direct output must target views of `output_format`.
    pub fn new(device: &wgpu::Device, output_format: wgpu::TextureFormat) -> Self {
        let texture_entry = |binding: u32, view_dimension: wgpu::TextureViewDimension, filterable: bool| {
            wgpu::BindGroupLayoutEntry {
                binding,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable },
                    view_dimension,
                    multisampled: false,
                },
                count: None,
            }
        };

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Raycast Bind Group Layout"),
            entries: &[
                // Uniforms
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                texture_entry(1, wgpu::TextureViewDimension::D3, true),
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                texture_entry(3, wgpu::TextureViewDimension::D3, true),
                texture_entry(4, wgpu::TextureViewDimension::D2, true),
                texture_entry(5, wgpu::TextureViewDimension::D2, false),
                texture_entry(6, wgpu::TextureViewDimension::D2, false),
                texture_entry(7, wgpu::TextureViewDimension::D2, false),
            ],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Raycast Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/raycast.wgsl").into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Raycast Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let direct_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Raycast Direct Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_direct"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: output_format,
                    blend: Some(wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let deferred_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Raycast Deferred Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_deferred"),
                targets: &[
                    Some(wgpu::ColorTargetState {
                        format: GBUFFER_COLOR_FORMAT,
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    }),
                    Some(wgpu::ColorTargetState {
                        format: GBUFFER_NORMAL_FORMAT,
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    }),
                ],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: GBUFFER_DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Always,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let uniform_buffer = create_uniform_buffer(
            device,
            &RaycastUniforms::zeroed(),
            Some("Raycast Uniform Buffer"),
        );

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Raycast Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Self {
            direct_pipeline,
            deferred_pipeline,
            bind_group_layout,
            uniform_buffer,
            sampler,
            output_format,
        }
    }

    /// Format the direct pipeline writes.
    #[must_use]
    pub fn output_format(&self) -> wgpu::TextureFormat {
        self.output_format
    }

    /// Uploads the per-frame uniforms.
    pub fn update_uniforms(&self, queue: &wgpu::Queue, uniforms: &RaycastUniforms) {
        update_buffer(queue, &self.uniform_buffer, uniforms);
    }

    /// Creates a bind group over the given inputs.
    pub fn create_bind_group(
        &self,
        device: &wgpu::Device,
        bindings: &RaycastBindings<'_>,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Raycast Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(bindings.volume),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(bindings.gradients),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::TextureView(bindings.transfer_lookup),
                },
                wgpu::BindGroupEntry {
                    binding: 5,
                    resource: wgpu::BindingResource::TextureView(bindings.noise),
                },
                wgpu::BindGroupEntry {
                    binding: 6,
                    resource: wgpu::BindingResource::TextureView(bindings.targets.front().view()),
                },
                wgpu::BindGroupEntry {
                    binding: 7,
                    resource: wgpu::BindingResource::TextureView(bindings.targets.back().view()),
                },
            ],
        })
    }

    /// Blends the tone-mapped result over the existing contents of `output_view`.
    pub fn render_direct(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        output_view: &wgpu::TextureView,
        bind_group: &wgpu::BindGroup,
    ) {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Raycast Direct Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: output_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            ..Default::default()
        });

        render_pass.set_pipeline(&self.direct_pipeline);
        render_pass.set_bind_group(0, bind_group, &[]);
        render_pass.draw(0..3, 0..1); // Fullscreen triangle
    }

    /// Writes linear color, normal and depth into the G-buffer.
    pub fn render_deferred(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        targets: &RenderTargets,
        bind_group: &wgpu::BindGroup,
    ) {
        let clear = wgpu::Operations {
            load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
            store: wgpu::StoreOp::Store,
        };
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Raycast Deferred Pass"),
            color_attachments: &[
                Some(wgpu::RenderPassColorAttachment {
                    view: targets.color().view(),
                    resolve_target: None,
                    ops: clear,
                    depth_slice: None,
                }),
                Some(wgpu::RenderPassColorAttachment {
                    view: targets.normal().view(),
                    resolve_target: None,
                    ops: clear,
                    depth_slice: None,
                }),
            ],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: targets.depth().view(),
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            ..Default::default()
        });

        render_pass.set_pipeline(&self.deferred_pipeline);
        render_pass.set_bind_group(0, bind_group, &[]);
        render_pass.draw(0..3, 0..1); // Fullscreen triangle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Quat, UVec3};

    #[test]
    fn test_raycast_uniforms_layout() {
        assert_eq!(std::mem::size_of::<RaycastUniforms>(), 336);
        assert_eq!(std::mem::size_of::<RaycastUniforms>() % 16, 0);
    }

    #[test]
    fn test_raycast_uniforms_from_state() {
        let geometry = VolumeGeometry::new(UVec3::new(64, 32, 16), Vec3::ONE);
        let mut settings = RaycastSettings::default();
        settings.set_step_scale(0.5);
        settings.diffuse_shading = false;
        let camera = Camera::new(1.0);
        let params = RenderingParams::default();

        let uniforms = RaycastUniforms::new(&geometry, &settings, &camera, &params, 0.2);
        assert_eq!(uniforms.iterations, 256);
        assert_eq!(uniforms.diffuse_shading, 0);
        assert_eq!(uniforms.step_size[3], 0.5);
        assert!((uniforms.step_size[0] - 0.5 / 64.0).abs() < 1e-7);
        assert_eq!(uniforms.threshold, 0.2);
        assert_eq!(uniforms.gamma, params.gamma());
    }

    #[test]
    fn test_camera_mapped_into_volume_space() {
        let geometry = VolumeGeometry::new(UVec3::splat(8), Vec3::ONE);
        let mut settings = RaycastSettings::default();
        settings.transform.set_rotation(Quat::from_rotation_y(0.3));
        let mut camera = Camera::new(1.0);
        camera.position = settings.transform.matrix().transform_point3(Vec3::splat(0.5));

        let uniforms = RaycastUniforms::new(&geometry, &settings, &camera, &RenderingParams::default(), 0.0);
        let inside = Vec3::from_slice(&uniforms.camera_position[..3]);
        assert!((inside - Vec3::splat(0.5)).abs().max_element() < 1e-4);
    }
}
