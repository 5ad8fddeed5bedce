//! Transfer-function curves mapping intensity to color and opacity.

use glam::Vec4;
use serde::{Deserialize, Serialize};

use crate::volume::INTENSITY_BINS;

/// A control point of a transfer curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlPoint {
    /// Intensity in `[0, 1]`.
    pub intensity: f32,
    /// Linear RGBA at this intensity.
    pub color: Vec4,
}

/// Piecewise-linear intensity to RGBA mapping with a clipping threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferCurve {
    points: Vec<ControlPoint>,
    threshold: f32,
}

impl TransferCurve {
    /// Creates a curve from control points, sorted by intensity.
    pub fn new(mut points: Vec<ControlPoint>, threshold: f32) -> Self {
        points.sort_by(|a, b| a.intensity.total_cmp(&b.intensity));
        Self {
            points,
            threshold: threshold.clamp(0.0, 1.0),
        }
    }

    /// Grayscale ramp with opacity equal to intensity.
    #[must_use]
    pub fn grayscale_ramp() -> Self {
        Self::new(
            vec![
                ControlPoint {
                    intensity: 0.0,
                    color: Vec4::ZERO,
                },
                ControlPoint {
                    intensity: 1.0,
                    color: Vec4::ONE,
                },
            ],
            0.0,
        )
    }

    /// Intensities below this are transparent.
    #[must_use]
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Control points in intensity order.
    #[must_use]
    pub fn points(&self) -> &[ControlPoint] {
        &self.points
    }

    /// Samples the curve at `t`, clamping outside the first and last points.
    #[must_use]
    pub fn sample(&self, t: f32) -> Vec4 {
        let t = t.clamp(0.0, 1.0);
        let (Some(first), Some(last)) = (self.points.first(), self.points.last()) else {
            return Vec4::ZERO;
        };
        if t <= first.intensity {
            return first.color;
        }
        if t >= last.intensity {
            return last.color;
        }

        for pair in self.points.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if t <= b.intensity {
                let span = b.intensity - a.intensity;
                if span <= f32::EPSILON {
                    return b.color;
                }
                return a.color.lerp(b.color, (t - a.intensity) / span);
            }
        }
        last.color
    }

    /// Bakes the curve into a 256-entry RGBA8 lookup table.
    #[must_use]
    pub fn to_lut(&self) -> Vec<[u8; 4]> {
        (0..INTENSITY_BINS)
            .map(|i| {
                let t = i as f32 / (INTENSITY_BINS - 1) as f32;
                let c = self.sample(t).clamp(Vec4::ZERO, Vec4::ONE) * 255.0 + 0.5;
                [c.x as u8, c.y as u8, c.z as u8, c.w as u8]
            })
            .collect()
    }
}

impl Default for TransferCurve {
    fn default() -> Self {
        Self::grayscale_ramp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ramp_lut_ends() {
        let lut = TransferCurve::grayscale_ramp().to_lut();
        assert_eq!(lut.len(), 256);
        assert_eq!(lut[0], [0, 0, 0, 0]);
        assert_eq!(lut[255], [255, 255, 255, 255]);
        assert_eq!(lut[128], [128, 128, 128, 128]);
    }

    #[test]
    fn test_points_sorted_and_interpolated() {
        let curve = TransferCurve::new(
            vec![
                ControlPoint {
                    intensity: 1.0,
                    color: Vec4::new(1.0, 0.0, 0.0, 1.0),
                },
                ControlPoint {
                    intensity: 0.5,
                    color: Vec4::new(0.0, 0.0, 1.0, 0.0),
                },
            ],
            0.2,
        );
        assert_eq!(curve.points()[0].intensity, 0.5);
        assert_eq!(curve.sample(0.1), Vec4::new(0.0, 0.0, 1.0, 0.0));
        let mid = curve.sample(0.75);
        assert!((mid - Vec4::new(0.5, 0.0, 0.5, 0.5)).length() < 1e-6);
        assert_eq!(curve.threshold(), 0.2);
    }

    #[test]
    fn test_empty_curve_is_transparent() {
        let curve = TransferCurve::new(Vec::new(), 2.0);
        assert_eq!(curve.sample(0.5), Vec4::ZERO);
        assert_eq!(curve.threshold(), 1.0);
    }
}
