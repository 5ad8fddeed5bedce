//! JSON sidecar describing a headerless raw volume.

use std::path::{Path, PathBuf};

use glam::{UVec3, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::volume::{BitDepth, Volume};

/// Everything needed to ingest a raw file.
///
/// ```json
/// { "path": "head.raw", "dimensions": [256, 256, 113],
///   "aspect_ratios": [1.0, 1.0, 2.0], "bit_depth": 16 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeDescriptor {
    /// Raw file; relative paths resolve against the descriptor's directory.
    pub path: PathBuf,
    /// Voxel dimensions.
    pub dimensions: UVec3,
    /// Physical voxel spacing ratios.
    #[serde(default = "default_aspect_ratios")]
    pub aspect_ratios: Vec3,
    /// Sample width.
    #[serde(default)]
    pub bit_depth: BitDepth,
}

fn default_aspect_ratios() -> Vec3 {
    Vec3::ONE
}

impl VolumeDescriptor {
    /// Parses a descriptor from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads a descriptor file and resolves its raw path.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut descriptor = Self::from_json(&std::fs::read_to_string(path)?)?;
        if descriptor.path.is_relative() {
            if let Some(dir) = path.parent() {
                descriptor.path = dir.join(&descriptor.path);
            }
        }
        log::debug!("read volume descriptor {}", path.display());
        Ok(descriptor)
    }

    /// Serializes to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reads the described raw file.
    pub fn read_volume(&self) -> Result<Volume> {
        Volume::read_raw(&self.path, self.dimensions, self.bit_depth)
    }
}
