//! Aspect, scale and step derivation for anisotropic voxel grids.

use glam::{UVec3, Vec3};

/// Derived sizing of the proxy cube and the ray-marching step.
///
/// The cube is scaled non-uniformly so that its longest physical axis spans
/// one unit, and the per-axis step advances `1 / max_size` so the largest
/// axis takes exactly `max_size` steps at step scale 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeGeometry {
    dimensions: Vec3,
    aspect_ratios: Vec3,
    max_size: f32,
    scale_factor: Vec3,
    step_size: Vec3,
}

impl Default for VolumeGeometry {
    fn default() -> Self {
        Self {
            dimensions: Vec3::ZERO,
            aspect_ratios: Vec3::ONE,
            max_size: 0.0,
            scale_factor: Vec3::ONE,
            step_size: Vec3::ZERO,
        }
    }
}

impl VolumeGeometry {
    /// Derives geometry for a volume of `dimensions` with physical voxel spacing `aspect_ratios`.
    #[must_use]
    pub fn new(dimensions: UVec3, aspect_ratios: Vec3) -> Self {
        let dimensions = dimensions.as_vec3();
        let max_size = dimensions.max_element();
        let step_size = if max_size > 0.0 {
            Vec3::ONE / (dimensions * (Vec3::splat(max_size) / dimensions))
        } else {
            Vec3::ZERO
        };

        let mut geometry = Self {
            dimensions,
            max_size,
            step_size,
            ..Self::default()
        };
        geometry.set_aspect_ratios(aspect_ratios);
        geometry
    }

    /// Sets the voxel spacing ratios (negative components clamp to zero) and rescales the cube.
    pub fn set_aspect_ratios(&mut self, aspect_ratios: Vec3) {
        self.aspect_ratios = aspect_ratios.max(Vec3::ZERO);
        self.scale_factor = if self.max_size > 0.0 {
            Vec3::ONE / (Vec3::splat(self.max_size) / (self.dimensions * self.aspect_ratios))
        } else {
            Vec3::ONE
        };
    }

    /// Voxel dimensions as floats.
    #[must_use]
    pub fn dimensions(&self) -> Vec3 {
        self.dimensions
    }

    /// Current voxel spacing ratios.
    #[must_use]
    pub fn aspect_ratios(&self) -> Vec3 {
        self.aspect_ratios
    }

    /// Largest voxel dimension.
    #[must_use]
    pub fn max_size(&self) -> f32 {
        self.max_size
    }

    /// Non-uniform scale applied to the unit proxy cube.
    #[must_use]
    pub fn scale_factor(&self) -> Vec3 {
        self.scale_factor
    }

    /// Per-axis marching increment in volume texture coordinates, at step scale 1.
    #[must_use]
    pub fn step_size(&self) -> Vec3 {
        self.step_size
    }

    /// Center of the scaled cube in model space.
    #[must_use]
    pub fn center_point(&self) -> Vec3 {
        Vec3::splat(0.5) * self.scale_factor
    }

    /// Upper bound on marching steps at `step_scale`.
    ///
    /// Twice the step count of the longest axis, which covers the cube diagonal.
    #[must_use]
    pub fn iterations(&self, step_scale: f32) -> u32 {
        (self.max_size / step_scale * 2.0).round() as u32
    }
}
