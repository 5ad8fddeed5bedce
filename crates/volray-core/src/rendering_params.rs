//! Exposure, gamma and FXAA settings shared with the host's post-processing.

use serde::{Deserialize, Serialize};

/// Upper bound for gamma.
pub const MAX_GAMMA: f32 = 10.0;
/// Upper bound for exposure.
pub const MAX_EXPOSURE: f32 = 8.0;

/// Output tone mapping parameters.
///
/// Passed by reference into each draw; the renderer never mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderingParams {
    gamma: f32,
    exposure: f32,
    fxaa: bool,
}

impl Default for RenderingParams {
    fn default() -> Self {
        Self {
            gamma: 2.2,
            exposure: 1.0,
            fxaa: true,
        }
    }
}

impl RenderingParams {
    /// Creates parameters with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Gamma correction exponent.
    pub fn gamma(&self) -> f32 {
        self.gamma
    }

    /// Sets gamma, clamped to `[EPSILON, MAX_GAMMA]`.
    pub fn set_gamma(&mut self, gamma: f32) {
        self.gamma = gamma.max(f32::EPSILON).min(MAX_GAMMA);
    }

    /// Exposure multiplier.
    pub fn exposure(&self) -> f32 {
        self.exposure
    }

    /// Sets exposure, clamped to `[EPSILON, MAX_EXPOSURE]`.
    pub fn set_exposure(&mut self, exposure: f32) {
        self.exposure = exposure.max(f32::EPSILON).min(MAX_EXPOSURE);
    }

    /// Whether the host should run FXAA after compositing.
    pub fn fxaa_enabled(&self) -> bool {
        self.fxaa
    }

    /// Enables or disables FXAA.
    pub fn set_fxaa_enabled(&mut self, enabled: bool) {
        self.fxaa = enabled;
    }

    /// Sets the gamma value.
    pub fn with_gamma(mut self, gamma: f32) -> Self {
        self.set_gamma(gamma);
        self
    }

    /// Sets the exposure value.
    pub fn with_exposure(mut self, exposure: f32) -> Self {
        self.set_exposure(exposure);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_rendering_params_default() {
        let params = RenderingParams::default();
        assert_eq!(params.gamma(), 2.2);
        assert_eq!(params.exposure(), 1.0);
        assert!(params.fxaa_enabled());
    }

    #[test]
    fn test_rendering_params_builder() {
        let params = RenderingParams::new().with_exposure(1.5).with_gamma(20.0);
        assert_eq!(params.exposure(), 1.5);
        assert_eq!(params.gamma(), MAX_GAMMA);
    }

    proptest! {
        #[test]
        fn prop_params_stay_in_range(gamma in -50.0f32..50.0, exposure in -50.0f32..50.0) {
            let params = RenderingParams::new().with_gamma(gamma).with_exposure(exposure);
            prop_assert!(params.gamma() > 0.0 && params.gamma() <= MAX_GAMMA);
            prop_assert!(params.exposure() > 0.0 && params.exposure() <= MAX_EXPOSURE);
        }
    }
}
