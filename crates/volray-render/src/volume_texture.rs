//! GPU 3D texture holding the scalar volume.

use glam::UVec3;
use half::f16;
use volray_core::{BitDepth, Volume, VoxelData};

use crate::error::{RenderError, RenderResult};

/// Texture format used for a given bit depth.
///
/// 16-bit samples are stored as normalized half floats so that both depths
/// sample as filterable `texture_3d<f32>` without optional device features.
#[must_use]
pub fn volume_format(bit_depth: BitDepth) -> wgpu::TextureFormat {
    match bit_depth {
        BitDepth::Eight => wgpu::TextureFormat::R8Unorm,
        BitDepth::Sixteen => wgpu::TextureFormat::R16Float,
    }
}

/// Converts samples into texel bytes for [`volume_format`].
#[must_use]
pub fn texel_bytes(volume: &Volume) -> Vec<u8> {
    match volume.data() {
        VoxelData::U8(samples) => samples.clone(),
        VoxelData::U16(samples) => {
            let halves: Vec<u16> = samples
                .iter()
                .map(|&s| f16::from_f32(f32::from(s) / f32::from(u16::MAX)).to_bits())
                .collect();
            bytemuck::cast_slice(&halves).to_vec()
        }
    }
}

/// Fails if any axis exceeds the device's 3D texture limit.
pub fn check_volume_limits(device: &wgpu::Device, dimensions: UVec3) -> RenderResult<()> {
    let limit = device.limits().max_texture_dimension_3d;
    let largest = dimensions.max_element();
    if largest > limit {
        return Err(RenderError::LimitExceeded {
            what: "volume dimension",
            requested: largest,
            limit,
        });
    }
    Ok(())
}

/// Edge length of the voxel tile covered by one compute workgroup.
pub const VOXEL_TILE: u32 = 8;

/// Workgroup grid covering `dimensions` in [`VOXEL_TILE`]-sized tiles.
#[must_use]
pub fn voxel_workgroups(dimensions: UVec3) -> UVec3 {
    (dimensions + UVec3::splat(VOXEL_TILE - 1)) / VOXEL_TILE
}

pub(crate) fn extent(dimensions: UVec3) -> wgpu::Extent3d {
    wgpu::Extent3d {
        width: dimensions.x,
        height: dimensions.y,
        depth_or_array_layers: dimensions.z,
    }
}

/// The uploaded volume.
pub struct VolumeTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    dimensions: UVec3,
    bit_depth: BitDepth,
}

impl VolumeTexture {
    /// Uploads `volume` as a single-channel 3D texture.
    pub fn upload(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        volume: &Volume,
    ) -> RenderResult<Self> {
        let dimensions = volume.dimensions();
        check_volume_limits(device, dimensions)?;

        let bit_depth = volume.bit_depth();
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Volume Texture"),
            size: extent(dimensions),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D3,
            format: volume_format(bit_depth),
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        let texel_width = bit_depth.sample_width() as u32;
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &texel_bytes(volume),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(dimensions.x * texel_width),
                rows_per_image: Some(dimensions.y),
            },
            extent(dimensions),
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Ok(Self {
            texture,
            view,
            dimensions,
            bit_depth,
        })
    }

    /// The 3D texture.
    #[must_use]
    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
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

    /// Bit depth of the source samples.
    #[must_use]
    pub fn bit_depth(&self) -> BitDepth {
        self.bit_depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_8bit_texels_are_samples() {
        let volume = Volume::from_u8(UVec3::new(2, 1, 1), vec![3, 250]).unwrap();
        assert_eq!(texel_bytes(&volume), vec![3, 250]);
        assert_eq!(volume_format(BitDepth::Eight), wgpu::TextureFormat::R8Unorm);
    }

    #[test]
    fn test_voxel_workgroups_round_up() {
        assert_eq!(voxel_workgroups(UVec3::new(4, 8, 9)), UVec3::new(1, 1, 2));
        assert_eq!(voxel_workgroups(UVec3::new(256, 1, 17)), UVec3::new(32, 1, 3));
    }

    #[test]
    fn test_16bit_texels_are_normalized_halves() {
        let volume = Volume::from_u16(UVec3::new(2, 1, 1), vec![0, u16::MAX]).unwrap();
        let bytes = texel_bytes(&volume);
        assert_eq!(bytes.len(), 4);
        let halves: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|pair| u16::from_ne_bytes([pair[0], pair[1]]))
            .collect();
        assert_eq!(halves[0], f16::ZERO.to_bits());
        assert_eq!(halves[1], f16::ONE.to_bits());
    }
}
