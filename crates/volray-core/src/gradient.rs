//! CPU reference for the gradient field.
//!
//! Mirrors the two compute kernels: central differences on normalized
//! intensity, then a 3x3x3 binomial smoothing of the raw gradients. Borders
//! clamp to the nearest voxel, so a uniform volume yields zero everywhere.

use glam::{UVec3, Vec3, Vec4};

use crate::volume::Volume;

/// Per-axis smoothing weights; the 3D kernel is their outer product.
pub const SMOOTHING_WEIGHTS: [f32; 3] = [0.25, 0.5, 0.25];

/// Raw central-difference gradient of every voxel, in voxel units.
#[must_use]
pub fn raw_gradients(volume: &Volume) -> Vec<Vec3> {
    let d = volume.dimensions();
    let mut out = Vec::with_capacity(volume.voxel_count());
    for z in 0..i64::from(d.z) {
        for y in 0..i64::from(d.y) {
            for x in 0..i64::from(d.x) {
                let gx = volume.normalized_clamped(x + 1, y, z)
                    - volume.normalized_clamped(x - 1, y, z);
                let gy = volume.normalized_clamped(x, y + 1, z)
                    - volume.normalized_clamped(x, y - 1, z);
                let gz = volume.normalized_clamped(x, y, z + 1)
                    - volume.normalized_clamped(x, y, z - 1);
                out.push(Vec3::new(gx, gy, gz) * 0.5);
            }
        }
    }
    out
}

/// Smooths raw gradients with the separable binomial kernel.
///
/// Returns `xyz` = smoothed gradient and `w` = its magnitude, the layout
/// stored in the GPU gradient texture.
#[must_use]
pub fn smooth_gradients(raw: &[Vec3], dimensions: UVec3) -> Vec<Vec4> {
    let d = dimensions.as_ivec3();
    let at = |x: i32, y: i32, z: i32| -> Vec3 {
        let x = x.clamp(0, d.x - 1) as usize;
        let y = y.clamp(0, d.y - 1) as usize;
        let z = z.clamp(0, d.z - 1) as usize;
        raw[(z * d.y as usize + y) * d.x as usize + x]
    };

    let mut out = Vec::with_capacity(raw.len());
    for z in 0..d.z {
        for y in 0..d.y {
            for x in 0..d.x {
                let mut sum = Vec3::ZERO;
                for (k, wz) in SMOOTHING_WEIGHTS.iter().enumerate() {
                    for (j, wy) in SMOOTHING_WEIGHTS.iter().enumerate() {
                        for (i, wx) in SMOOTHING_WEIGHTS.iter().enumerate() {
                            let sample = at(x + i as i32 - 1, y + j as i32 - 1, z + k as i32 - 1);
                            sum += sample * (wx * wy * wz);
                        }
                    }
                }
                out.push(sum.extend(sum.length()));
            }
        }
    }
    out
}

/// Smoothed gradient field of a volume.
#[derive(Debug, Clone, PartialEq)]
pub struct GradientField {
    dimensions: UVec3,
    samples: Vec<Vec4>,
}

impl GradientField {
    /// Runs both passes in order: raw gradients, then smoothing.
    #[must_use]
    pub fn compute(volume: &Volume) -> Self {
        let raw = raw_gradients(volume);
        Self {
            dimensions: volume.dimensions(),
            samples: smooth_gradients(&raw, volume.dimensions()),
        }
    }

    /// Field dimensions (same as the volume).
    #[must_use]
    pub fn dimensions(&self) -> UVec3 {
        self.dimensions
    }

    /// Samples in x-fastest order.
    #[must_use]
    pub fn samples(&self) -> &[Vec4] {
        &self.samples
    }

    /// Sample at a voxel.
    #[must_use]
    pub fn get(&self, x: u32, y: u32, z: u32) -> Vec4 {
        let d = self.dimensions;
        self.samples[(z as usize * d.y as usize + y as usize) * d.x as usize + x as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_volume_has_zero_gradients() {
        let volume = Volume::from_u8(UVec3::new(5, 4, 3), vec![137; 60]).unwrap();
        let raw = raw_gradients(&volume);
        assert!(raw.iter().all(|g| *g == Vec3::ZERO));

        let field = GradientField::compute(&volume);
        assert!(field.samples().iter().all(|g| *g == Vec4::ZERO));
    }

    #[test]
    fn test_linear_ramp_gradient() {
        // Intensity increases along x by 51 per voxel (0.2 normalized).
        let samples: Vec<u8> = (0..6 * 3 * 3).map(|i| ((i % 6) * 51) as u8).collect();
        let volume = Volume::from_u8(UVec3::new(6, 3, 3), samples).unwrap();
        let raw = raw_gradients(&volume);

        let interior = raw[volume.index(2, 1, 1)];
        assert!((interior.x - 0.2).abs() < 1e-6);
        assert_eq!(interior.y, 0.0);
        assert_eq!(interior.z, 0.0);

        // Border clamps: one-sided difference halved.
        let edge = raw[volume.index(0, 1, 1)];
        assert!((edge.x - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_smoothing_preserves_constant_field() {
        let dims = UVec3::new(3, 3, 3);
        let raw = vec![Vec3::new(0.0, 0.3, 0.4); 27];
        let smoothed = smooth_gradients(&raw, dims);
        for sample in smoothed {
            assert!((sample.truncate() - Vec3::new(0.0, 0.3, 0.4)).length() < 1e-6);
            assert!((sample.w - 0.5).abs() < 1e-6);
        }
    }

    #[test]
    fn test_smoothing_spreads_spike() {
        let dims = UVec3::splat(3);
        let mut raw = vec![Vec3::ZERO; 27];
        raw[13] = Vec3::X;
        let smoothed = smooth_gradients(&raw, dims);
        // Center weight 0.5^3, face neighbor 0.5^2 * 0.25.
        assert!((smoothed[13].x - 0.125).abs() < 1e-6);
        assert!((smoothed[14].x - 0.0625).abs() < 1e-6);
    }
}
