//! Two-stage gradient field: raw central differences, then smoothing.

use glam::{UVec3, Vec4};
use half::f16;

use crate::error::RenderResult;
use crate::screenshot::read_texture;
use crate::volume_texture::{extent, voxel_workgroups, VolumeTexture};

/// Storage format of both gradient textures.
pub const GRADIENT_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

/// Smoothed gradient field on the GPU (`xyz` = gradient, `w` = magnitude).
pub struct GradientTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    dimensions: UVec3,
}

impl GradientTexture {
    fn new(device: &wgpu::Device, dimensions: UVec3, label: &str) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: extent(dimensions),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D3,
            format: GRADIENT_FORMAT,
            usage: wgpu::TextureUsages::STORAGE_BINDING
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            texture,
            view,
            dimensions,
        }
    }

    /// The 3D texture.
    #[must_use]
    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }

    /// Reads the field back in x-fastest order. Blocks until the copy is done.
    pub fn read_back(&self, device: &wgpu::Device, queue: &wgpu::Queue) -> RenderResult<Vec<Vec4>> {
        let bytes = read_texture(device, queue, &self.texture)?;
        Ok(decode_texels(&bytes))
    }

    /// Full view of the texture.
    #[must_use]
    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    /// Voxel dimensions.
    #[must_use]
    pub fn dimensions(&self) -> UVec3 {
        self.dimensions
    }
}

/// Unpacks tightly packed RGBA16Float texels.
fn decode_texels(bytes: &[u8]) -> Vec<Vec4> {
    bytes
        .chunks_exact(8)
        .map(|texel| {
            let channel = |i: usize| f16::from_le_bytes([texel[2 * i], texel[2 * i + 1]]).to_f32();
            Vec4::new(channel(0), channel(1), channel(2), channel(3))
        })
        .collect()
}

/// Raw and smoothing compute pipelines.
pub struct GradientCompute {
    raw_pipeline: wgpu::ComputePipeline,
    smooth_pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
}

impl GradientCompute {
    /// Creates both pipelines. They share one layout: a sampled input volume
    /// and a write-only storage output.
    pub fn new(device: &wgpu::Device) -> Self {
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Gradient Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D3,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::StorageTexture {
                        access: wgpu::StorageTextureAccess::WriteOnly,
                        format: GRADIENT_FORMAT,
                        view_dimension: wgpu::TextureViewDimension::D3,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Gradient Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let raw_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Raw Gradient Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/gradients.wgsl").into()),
        });
        let smooth_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Smooth Gradient Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/smooth_gradients.wgsl").into()),
        });

        let raw_pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("Raw Gradient Pipeline"),
            layout: Some(&pipeline_layout),
            module: &raw_shader,
            entry_point: Some("main"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            cache: None,
        });
        let smooth_pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("Smooth Gradient Pipeline"),
            layout: Some(&pipeline_layout),
            module: &smooth_shader,
            entry_point: Some("main"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            cache: None,
        });

        Self {
            raw_pipeline,
            smooth_pipeline,
            bind_group_layout,
        }
    }

    /// Computes the smoothed gradient field of `volume`.
    ///
    /// The raw and smoothing dispatches are recorded as separate compute
    /// passes, so the raw writes are visible before smoothing reads them.
    pub fn compute(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        volume: &VolumeTexture,
    ) -> GradientTexture {
        let dimensions = volume.dimensions();
        let raw = GradientTexture::new(device, dimensions, "Raw Gradient Texture");
        let smoothed = GradientTexture::new(device, dimensions, "Gradient Texture");

        let raw_bind_group = self.create_bind_group(device, volume.view(), raw.view(), "Raw Gradient Bind Group");
        let smooth_bind_group =
            self.create_bind_group(device, raw.view(), smoothed.view(), "Smooth Gradient Bind Group");

        let groups = voxel_workgroups(dimensions);
        log::debug!(
            "dispatching gradient passes over {}x{}x{} workgroups",
            groups.x,
            groups.y,
            groups.z
        );

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Gradient Encoder"),
        });
        {
            let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Raw Gradient Pass"),
                timestamp_writes: None,
            });
            compute_pass.set_pipeline(&self.raw_pipeline);
            compute_pass.set_bind_group(0, &raw_bind_group, &[]);
            compute_pass.dispatch_workgroups(groups.x, groups.y, groups.z);
        }
        // Pass boundary: raw writes complete before the smoothing pass samples them.
        {
            let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Smooth Gradient Pass"),
                timestamp_writes: None,
            });
            compute_pass.set_pipeline(&self.smooth_pipeline);
            compute_pass.set_bind_group(0, &smooth_bind_group, &[]);
            compute_pass.dispatch_workgroups(groups.x, groups.y, groups.z);
        }
        queue.submit(std::iter::once(encoder.finish()));

        smoothed
    }

    fn create_bind_group(
        &self,
        device: &wgpu::Device,
        input: &wgpu::TextureView,
        output: &wgpu::TextureView,
        label: &str,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(input),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(output),
                },
            ],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_texels() {
        let mut bytes = Vec::new();
        for value in [0.5f32, -0.25, 1.0, 0.0, 2.0, 0.125, -1.0, 3.5] {
            bytes.extend_from_slice(&f16::from_f32(value).to_le_bytes());
        }
        assert_eq!(
            decode_texels(&bytes),
            vec![Vec4::new(0.5, -0.25, 1.0, 0.0), Vec4::new(2.0, 0.125, -1.0, 3.5)]
        );
    }
}
