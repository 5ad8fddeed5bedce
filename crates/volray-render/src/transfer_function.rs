//! Transfer-function lookup textures.

use volray_core::{TransferCurve, INTENSITY_BINS};

/// Width of the lookup texture, one texel per intensity bin.
pub const LOOKUP_RESOLUTION: u32 = INTENSITY_BINS as u32;

/// Classification source consumed by the raycast pass.
///
/// The lookup is a `LOOKUP_RESOLUTION` x 1 RGBA texture indexed by
/// normalized intensity. Samples below `threshold` are treated as empty.
pub trait TransferFunction {
    /// View of the lookup texture.
    fn lookup_view(&self) -> &wgpu::TextureView;

    /// Intensity below which samples are clipped.
    fn threshold(&self) -> f32;
}

/// A transfer function backed by a texture built from RGBA8 entries.
pub struct TransferFunctionTexture {
    view: wgpu::TextureView,
    threshold: f32,
}

impl TransferFunctionTexture {
    /// Uploads the lookup table of `curve`.
    pub fn from_curve(device: &wgpu::Device, queue: &wgpu::Queue, curve: &TransferCurve) -> Self {
        let texture = create_lookup_texture(device);
        write_lookup(queue, &texture, &curve.to_lut());
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            view,
            threshold: curve.threshold(),
        }
    }
}

impl TransferFunction for TransferFunctionTexture {
    fn lookup_view(&self) -> &wgpu::TextureView {
        &self.view
    }

    fn threshold(&self) -> f32 {
        self.threshold
    }
}

fn create_lookup_texture(device: &wgpu::Device) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Transfer Function Texture"),
        size: lookup_extent(),
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8Unorm,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    })
}

fn write_lookup(queue: &wgpu::Queue, texture: &wgpu::Texture, lut: &[[u8; 4]]) {
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        bytemuck::cast_slice(lut),
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(LOOKUP_RESOLUTION * 4),
            rows_per_image: None,
        },
        lookup_extent(),
    );
}

fn lookup_extent() -> wgpu::Extent3d {
    wgpu::Extent3d {
        width: LOOKUP_RESOLUTION,
        height: 1,
        depth_or_array_layers: 1,
    }
}
