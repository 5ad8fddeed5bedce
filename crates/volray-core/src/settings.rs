//! Host-tunable raycasting state: step scale, light, model transform.

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Smallest allowed step scale. Anything lower could stall the march.
pub const MIN_STEP_SCALE: f32 = 0.1;

/// Directional light used for diffuse shading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Light {
    /// Light direction in model space.
    pub direction: Vec3,
    /// Diffuse color.
    pub diffuse: Vec3,
    /// Ambient color.
    pub ambient: Vec3,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            direction: Vec3::Z,
            diffuse: Vec3::ONE,
            ambient: Vec3::splat(0.1),
        }
    }
}

/// Rotation and offset applied to the proxy cube.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelTransform {
    rotation: Quat,
    position: Vec3,
}

impl Default for ModelTransform {
    fn default() -> Self {
        Self {
            rotation: Quat::IDENTITY,
            position: Vec3::ZERO,
        }
    }
}

impl ModelTransform {
    /// Rotation quaternion (always normalized).
    #[must_use]
    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    /// Sets the rotation. Degenerate quaternions fall back to identity.
    pub fn set_rotation(&mut self, rotation: Quat) {
        let length_squared = rotation.length_squared();
        self.rotation = if length_squared.is_finite() && length_squared > 0.0 {
            rotation.normalize()
        } else {
            Quat::IDENTITY
        };
    }

    /// Position offset.
    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Sets the position offset.
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    /// Model matrix: rotate, then translate in the rotated frame.
    #[must_use]
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_quat(self.rotation) * Mat4::from_translation(self.position)
    }
}

/// Raycasting parameters owned by the volume renderer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RaycastSettings {
    step_scale: f32,
    /// Light for diffuse shading.
    pub light: Light,
    /// Proxy cube transform.
    pub transform: ModelTransform,
    /// Whether the gradient field shades samples.
    pub diffuse_shading: bool,
}

impl Default for RaycastSettings {
    fn default() -> Self {
        Self {
            step_scale: 1.0,
            light: Light::default(),
            transform: ModelTransform::default(),
            diffuse_shading: true,
        }
    }
}

impl RaycastSettings {
    /// Current step scale.
    #[must_use]
    pub fn step_scale(&self) -> f32 {
        self.step_scale
    }

    /// Sets the step scale, clamped to [`MIN_STEP_SCALE`]. NaN clamps as well.
    pub fn set_step_scale(&mut self, value: f32) {
        self.step_scale = value.max(MIN_STEP_SCALE);
    }

    /// Replaces all light parameters.
    pub fn set_light(&mut self, direction: Vec3, ambient: Vec3, diffuse: Vec3) {
        self.light = Light {
            direction,
            diffuse,
            ambient,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_defaults() {
        let settings = RaycastSettings::default();
        assert_eq!(settings.step_scale(), 1.0);
        assert!(settings.diffuse_shading);
        assert_eq!(settings.light.direction, Vec3::Z);
        assert_eq!(settings.light.ambient, Vec3::splat(0.1));
        assert_eq!(settings.transform.matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn test_step_scale_nan_clamps() {
        let mut settings = RaycastSettings::default();
        settings.set_step_scale(f32::NAN);
        assert_eq!(settings.step_scale(), MIN_STEP_SCALE);
    }

    #[test]
    fn test_rotation_normalized() {
        let mut transform = ModelTransform::default();
        transform.set_rotation(Quat::from_xyzw(0.0, 0.0, 2.0, 0.0));
        assert!((transform.rotation().length() - 1.0).abs() < 1e-6);

    }

    #[test]
    fn test_zero_rotation_falls_back_to_identity() {
        let mut transform = ModelTransform::default();
        transform.set_rotation(Quat::from_rotation_x(1.0));
        transform.set_rotation(Quat::from_xyzw(0.0, 0.0, 0.0, 0.0));
        assert_eq!(transform.rotation(), Quat::IDENTITY);
        assert_eq!(transform.matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn test_nan_rotation_falls_back_to_identity() {
        let mut transform = ModelTransform::default();
        transform.set_rotation(Quat::from_xyzw(f32::NAN, 0.0, 0.0, 1.0));
        assert_eq!(transform.rotation(), Quat::IDENTITY);

        transform.set_rotation(Quat::from_xyzw(f32::INFINITY, 0.0, 0.0, 1.0));
        assert_eq!(transform.rotation(), Quat::IDENTITY);
    }

    #[test]
    fn test_model_matrix_translates_then_rotates() {
        let mut transform = ModelTransform::default();
        transform.set_rotation(Quat::from_rotation_z(std::f32::consts::FRAC_PI_2));
        transform.set_position(Vec3::X);
        let moved = transform.matrix().transform_point3(Vec3::ZERO);
        assert!((moved - Vec3::Y).length() < 1e-5);
    }

    proptest! {
        #[test]
        fn prop_step_scale_clamped(value in -100.0f32..100.0) {
            let mut settings = RaycastSettings::default();
            settings.set_step_scale(value);
            prop_assert_eq!(settings.step_scale(), value.max(MIN_STEP_SCALE));
        }
    }
}
