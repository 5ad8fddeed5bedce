//! Core data model for volray.
//!
//! This crate holds everything about a volume that does not need a GPU:
//! - Raw volume ingestion ([`Volume`], [`BitDepth`], [`VolumeDescriptor`])
//! - Scale and step derivation for anisotropic grids ([`VolumeGeometry`])
//! - Raycast tunables ([`RaycastSettings`], [`Light`], [`ModelTransform`])
//! - Histogram normalization and CPU reference kernels
//! - Transfer curves and output tone-mapping parameters

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Builder patterns return Self which doesn't need must_use
#![allow(clippy::must_use_candidate)]
// Voxel math converts between u32 grid indices and f32 freely
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]

pub mod descriptor;
pub mod error;
pub mod geometry;
pub mod gradient;
pub mod histogram;
pub mod rendering_params;
pub mod settings;
pub mod transfer;
pub mod volume;

pub use descriptor::VolumeDescriptor;
pub use error::{Result, VolrayError};
pub use geometry::VolumeGeometry;
pub use gradient::GradientField;
pub use histogram::Histogram;
pub use rendering_params::RenderingParams;
pub use settings::{Light, ModelTransform, RaycastSettings, MIN_STEP_SCALE};
pub use transfer::{ControlPoint, TransferCurve};
pub use volume::{BitDepth, Volume, VoxelData, INTENSITY_BINS};

// Re-export glam types for convenience
pub use glam::{Quat, UVec3, Vec3, Vec4};
