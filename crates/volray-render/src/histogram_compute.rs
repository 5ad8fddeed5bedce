//! GPU histogram reduction.

use volray_core::{Histogram, INTENSITY_BINS};

use crate::buffer::{create_storage_buffer, read_buffer};
use crate::error::{RenderError, RenderResult};
use crate::volume_texture::{voxel_workgroups, VolumeTexture};

/// Compute pipeline counting voxels per quantized intensity.
pub struct HistogramCompute {
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
}

impl HistogramCompute {
    /// Creates the histogram pipeline.
    pub fn new(device: &wgpu::Device) -> Self {
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Histogram Bind Group Layout"),
            entries: &[
                // Volume
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
                // Bin counters
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: false },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Histogram Compute Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/histogram.wgsl").into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Histogram Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("Histogram Compute Pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: Some("main"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            cache: None,
        });

        Self {
            pipeline,
            bind_group_layout,
        }
    }

    /// Counts every voxel of `volume` and returns the max-normalized bins.
    ///
    /// Blocks until the GPU has finished and the counters are mapped.
    pub fn compute(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        volume: &VolumeTexture,
    ) -> RenderResult<Histogram> {
        let counts_buffer = create_storage_buffer(
            device,
            &[0u32; INTENSITY_BINS],
            Some("Histogram Counts Buffer"),
        );

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Histogram Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(volume.view()),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: counts_buffer.as_entire_binding(),
                },
            ],
        });

        let groups = voxel_workgroups(volume.dimensions());
        log::debug!(
            "dispatching histogram over {}x{}x{} workgroups",
            groups.x,
            groups.y,
            groups.z
        );

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Histogram Encoder"),
        });
        {
            let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Histogram Compute Pass"),
                timestamp_writes: None,
            });
            compute_pass.set_pipeline(&self.pipeline);
            compute_pass.set_bind_group(0, &bind_group, &[]);
            compute_pass.dispatch_workgroups(groups.x, groups.y, groups.z);
        }
        queue.submit(std::iter::once(encoder.finish()));

        let bytes = read_buffer(
            device,
            queue,
            &counts_buffer,
            std::mem::size_of::<[u32; INTENSITY_BINS]>() as u64,
        )?;
        let counts = counts_from_bytes(&bytes)?;
        Ok(Histogram::from_counts(&counts))
    }
}

fn counts_from_bytes(bytes: &[u8]) -> RenderResult<[u32; INTENSITY_BINS]> {
    if bytes.len() != INTENSITY_BINS * 4 {
        return Err(RenderError::BufferMapFailed);
    }
    let mut counts = [0u32; INTENSITY_BINS];
    for (count, chunk) in counts.iter_mut().zip(bytes.chunks_exact(4)) {
        *count = u32::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
    Ok(counts)
}
