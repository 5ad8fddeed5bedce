//! Raw scalar volume ingestion.
//!
//! Volumes are headerless binary files holding `x * y * z` samples with x
//! varying fastest. Samples are one byte (8-bit) or two little-endian bytes
//! (16-bit). The caller supplies dimensions and bit depth out of band.

use std::path::Path;

use glam::UVec3;
use serde::{Deserialize, Serialize};

use crate::error::{Result, VolrayError};

/// Number of histogram bins an intensity is quantized into.
pub const INTENSITY_BINS: usize = 256;

/// Sample width of a raw volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum BitDepth {
    /// One unsigned byte per voxel.
    #[default]
    Eight,
    /// Two little-endian bytes per voxel.
    Sixteen,
}

impl BitDepth {
    /// Bytes per sample.
    #[must_use]
    pub fn sample_width(self) -> usize {
        match self {
            BitDepth::Eight => 1,
            BitDepth::Sixteen => 2,
        }
    }

    /// Bits per sample.
    #[must_use]
    pub fn bits(self) -> u32 {
        match self {
            BitDepth::Eight => 8,
            BitDepth::Sixteen => 16,
        }
    }
}

impl TryFrom<u32> for BitDepth {
    type Error = VolrayError;

    fn try_from(bits: u32) -> Result<Self> {
        match bits {
            8 => Ok(BitDepth::Eight),
            16 => Ok(BitDepth::Sixteen),
            other => Err(VolrayError::UnsupportedBitDepth(other)),
        }
    }
}

impl From<BitDepth> for u32 {
    fn from(depth: BitDepth) -> Self {
        depth.bits()
    }
}

/// Voxel samples in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoxelData {
    U8(Vec<u8>),
    U16(Vec<u16>),
}

impl VoxelData {
    fn len(&self) -> usize {
        match self {
            VoxelData::U8(samples) => samples.len(),
            VoxelData::U16(samples) => samples.len(),
        }
    }
}

/// Returns the voxel count for `dimensions`, rejecting empty or overflowing grids.
pub fn voxel_count(dimensions: UVec3) -> Result<usize> {
    if dimensions.min_element() == 0 {
        return Err(VolrayError::InvalidDimensions(
            dimensions.x,
            dimensions.y,
            dimensions.z,
        ));
    }
    (dimensions.x as usize)
        .checked_mul(dimensions.y as usize)
        .and_then(|xy| xy.checked_mul(dimensions.z as usize))
        .ok_or(VolrayError::InvalidDimensions(
            dimensions.x,
            dimensions.y,
            dimensions.z,
        ))
}

/// An immutable scalar volume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Volume {
    dimensions: UVec3,
    data: VoxelData,
}

impl Volume {
    /// Creates an 8-bit volume from samples. The sample count must match `dimensions`.
    pub fn from_u8(dimensions: UVec3, samples: Vec<u8>) -> Result<Self> {
        Self::with_data(dimensions, VoxelData::U8(samples))
    }

    /// Creates a 16-bit volume from samples. The sample count must match `dimensions`.
    pub fn from_u16(dimensions: UVec3, samples: Vec<u16>) -> Result<Self> {
        Self::with_data(dimensions, VoxelData::U16(samples))
    }

    fn with_data(dimensions: UVec3, data: VoxelData) -> Result<Self> {
        let expected = voxel_count(dimensions)?;
        if data.len() != expected {
            let width = match data {
                VoxelData::U8(_) => 1,
                VoxelData::U16(_) => 2,
            };
            return Err(VolrayError::SizeMismatch {
                expected: expected * width,
                actual: data.len() * width,
            });
        }
        Ok(Self { dimensions, data })
    }

    /// Decodes a raw byte buffer. The length must be exactly voxel count times sample width.
    pub fn from_bytes(dimensions: UVec3, bit_depth: BitDepth, bytes: &[u8]) -> Result<Self> {
        let expected = voxel_count(dimensions)? * bit_depth.sample_width();
        if bytes.len() != expected {
            return Err(VolrayError::SizeMismatch {
                expected,
                actual: bytes.len(),
            });
        }

        let data = match bit_depth {
            BitDepth::Eight => VoxelData::U8(bytes.to_vec()),
            BitDepth::Sixteen => VoxelData::U16(
                bytes
                    .chunks_exact(2)
                    .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                    .collect(),
            ),
        };

        Ok(Self { dimensions, data })
    }

    /// Reads a headerless raw file.
    ///
    /// Fails if the file cannot be opened or its size differs from the
    /// declared voxel count; nothing is returned for partial reads.
    pub fn read_raw(
        path: impl AsRef<Path>,
        dimensions: UVec3,
        bit_depth: BitDepth,
    ) -> Result<Self> {
        // Validate before touching the file so bad dimensions never allocate.
        voxel_count(dimensions)?;
        let bytes = std::fs::read(path.as_ref())?;
        Self::from_bytes(dimensions, bit_depth, &bytes)
    }

    /// Voxel dimensions.
    #[must_use]
    pub fn dimensions(&self) -> UVec3 {
        self.dimensions
    }

    /// Sample width of this volume.
    #[must_use]
    pub fn bit_depth(&self) -> BitDepth {
        match self.data {
            VoxelData::U8(_) => BitDepth::Eight,
            VoxelData::U16(_) => BitDepth::Sixteen,
        }
    }

    /// Total number of voxels.
    #[must_use]
    pub fn voxel_count(&self) -> usize {
        self.data.len()
    }

    /// Raw samples.
    #[must_use]
    pub fn data(&self) -> &VoxelData {
        &self.data
    }

    /// Linear index of a voxel.
    #[must_use]
    pub fn index(&self, x: u32, y: u32, z: u32) -> usize {
        let d = self.dimensions;
        (z as usize * d.y as usize + y as usize) * d.x as usize + x as usize
    }

    /// Sample at `index`, normalized to `[0, 1]`.
    #[must_use]
    pub fn normalized(&self, index: usize) -> f32 {
        match &self.data {
            VoxelData::U8(samples) => f32::from(samples[index]) / f32::from(u8::MAX),
            VoxelData::U16(samples) => f32::from(samples[index]) / f32::from(u16::MAX),
        }
    }

    /// Normalized sample at signed coordinates, clamped to the volume edge.
    #[must_use]
    pub fn normalized_clamped(&self, x: i64, y: i64, z: i64) -> f32 {
        let d = self.dimensions;
        let cx = x.clamp(0, i64::from(d.x) - 1) as u32;
        let cy = y.clamp(0, i64::from(d.y) - 1) as u32;
        let cz = z.clamp(0, i64::from(d.z) - 1) as u32;
        self.normalized(self.index(cx, cy, cz))
    }

    /// Histogram bin (0..256) of the sample at `index`.
    ///
    /// 8-bit samples map directly; 16-bit samples are rescaled with rounding.
    #[must_use]
    pub fn intensity_bin(&self, index: usize) -> usize {
        match &self.data {
            VoxelData::U8(samples) => samples[index] as usize,
            VoxelData::U16(samples) => {
                let max = u32::from(u16::MAX);
                ((u32::from(samples[index]) * 255 + max / 2) / max) as usize
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file(name: &str, bytes: &[u8]) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("volray-core-{}-{name}", std::process::id()));
        std::fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn test_bit_depth_from_bits() {
        assert_eq!(BitDepth::try_from(8).unwrap(), BitDepth::Eight);
        assert_eq!(BitDepth::try_from(16).unwrap(), BitDepth::Sixteen);
        assert!(matches!(
            BitDepth::try_from(12),
            Err(VolrayError::UnsupportedBitDepth(12))
        ));
    }

    #[test]
    fn test_read_8bit_exact_size() {
        let path = temp_file("exact8.raw", &[7u8; 64]);
        let volume = Volume::read_raw(&path, UVec3::splat(4), BitDepth::Eight).unwrap();
        assert_eq!(volume.voxel_count(), 64);
        assert_eq!(volume.bit_depth(), BitDepth::Eight);
        assert_eq!(volume.intensity_bin(10), 7);
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_read_short_file_fails() {
        let path = temp_file("short8.raw", &[0u8; 63]);
        let result = Volume::read_raw(&path, UVec3::splat(4), BitDepth::Eight);
        assert!(matches!(
            result,
            Err(VolrayError::SizeMismatch {
                expected: 64,
                actual: 63
            })
        ));
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_read_long_file_fails() {
        let path = temp_file("long16.raw", &[0u8; 130]);
        let result = Volume::read_raw(&path, UVec3::splat(4), BitDepth::Sixteen);
        assert!(matches!(result, Err(VolrayError::SizeMismatch { .. })));
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_missing_file_fails() {
        let result = Volume::read_raw(
            "/definitely/not/here.raw",
            UVec3::splat(2),
            BitDepth::Eight,
        );
        assert!(matches!(result, Err(VolrayError::IoError(_))));
    }

    #[test]
    fn test_zero_dimension_rejected() {
        let result = Volume::from_bytes(UVec3::new(4, 0, 4), BitDepth::Eight, &[]);
        assert!(matches!(result, Err(VolrayError::InvalidDimensions(4, 0, 4))));
    }

    #[test]
    fn test_16bit_little_endian_decode() {
        let bytes = [0x34, 0x12, 0xff, 0xff];
        let volume = Volume::from_bytes(UVec3::new(2, 1, 1), BitDepth::Sixteen, &bytes).unwrap();
        assert_eq!(volume.data(), &VoxelData::U16(vec![0x1234, 0xffff]));
        assert_eq!(volume.normalized(1), 1.0);
        assert_eq!(volume.intensity_bin(1), 255);
    }

    #[test]
    fn test_index_is_x_fastest() {
        let volume = Volume::from_u8(UVec3::new(2, 3, 4), (0..24).collect()).unwrap();
        assert_eq!(volume.index(1, 0, 0), 1);
        assert_eq!(volume.index(0, 1, 0), 2);
        assert_eq!(volume.index(0, 0, 1), 6);
        assert_eq!(volume.normalized_clamped(-5, 0, 0), 0.0);
        assert_eq!(volume.intensity_bin(volume.index(1, 2, 3)), 23);
    }
}
