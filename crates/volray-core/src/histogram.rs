//! Intensity histogram of a volume.

use serde::{Deserialize, Serialize};

use crate::volume::{Volume, INTENSITY_BINS};

/// Max-normalized 256-bin intensity histogram.
///
/// The most populated bin maps to 1.0. An all-zero count array stays all zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    bins: Vec<f32>,
}

impl Default for Histogram {
    fn default() -> Self {
        Self {
            bins: vec![0.0; INTENSITY_BINS],
        }
    }
}

impl Histogram {
    /// Normalizes raw bin counts by their maximum.
    #[must_use]
    pub fn from_counts(counts: &[u32; INTENSITY_BINS]) -> Self {
        let max = counts.iter().copied().max().unwrap_or(0);
        if max == 0 {
            return Self::default();
        }
        let max = max as f32;
        Self {
            bins: counts.iter().map(|&count| count as f32 / max).collect(),
        }
    }

    /// Computes the histogram on the CPU.
    ///
    /// For 8-bit volumes this matches the GPU reduction bin for bin; 16-bit
    /// volumes may differ by one bin where half-float upload rounds.
    #[must_use]
    pub fn from_volume(volume: &Volume) -> Self {
        Self::from_counts(&count_intensities(volume))
    }

    /// Normalized bins.
    #[must_use]
    pub fn bins(&self) -> &[f32] {
        &self.bins
    }

    /// Serializes the bins as a JSON array for external display.
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(&self.bins)?)
    }
}

/// Counts voxels per quantized intensity.
#[must_use]
pub fn count_intensities(volume: &Volume) -> [u32; INTENSITY_BINS] {
    let mut counts = [0u32; INTENSITY_BINS];
    for index in 0..volume.voxel_count() {
        counts[volume.intensity_bin(index)] += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::UVec3;

    #[test]
    fn test_zero_volume_histogram() {
        let volume = Volume::from_u8(UVec3::splat(4), vec![0; 64]).unwrap();
        let histogram = Histogram::from_volume(&volume);
        assert_eq!(histogram.bins().len(), 256);
        assert_eq!(histogram.bins()[0], 1.0);
        assert!(histogram.bins()[1..].iter().all(|&bin| bin == 0.0));
    }

    #[test]
    fn test_mode_is_one_and_bins_in_range() {
        let mut samples = vec![10u8; 30];
        samples.extend(vec![200u8; 15]);
        samples.extend(vec![255u8; 3]);
        let volume = Volume::from_u8(UVec3::new(4, 4, 3), samples).unwrap();
        let histogram = Histogram::from_volume(&volume);

        assert_eq!(histogram.bins()[10], 1.0);
        assert_eq!(histogram.bins()[200], 0.5);
        assert_eq!(histogram.bins()[255], 0.1);
        assert!(histogram.bins().iter().all(|&bin| (0.0..=1.0).contains(&bin)));
    }

    #[test]
    fn test_16bit_quantization() {
        let volume = Volume::from_u16(UVec3::new(3, 1, 1), vec![0, 32768, 65535]).unwrap();
        let counts = count_intensities(&volume);
        assert_eq!(counts[0], 1);
        assert_eq!(counts[128], 1);
        assert_eq!(counts[255], 1);
    }

    #[test]
    fn test_empty_counts_stay_zero() {
        let histogram = Histogram::from_counts(&[0; INTENSITY_BINS]);
        assert!(histogram.bins().iter().all(|&bin| bin == 0.0));
    }

    #[test]
    fn test_to_json() {
        let mut counts = [0; INTENSITY_BINS];
        counts[3] = 2;
        let json = Histogram::from_counts(&counts).to_json().unwrap();
        let parsed: Vec<f32> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.len(), 256);
        assert_eq!(parsed[3], 1.0);
    }
}
