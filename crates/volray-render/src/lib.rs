//! Rendering backend for volray.
//!
//! This crate provides the wgpu-based volume renderer, including:
//! - Headless device setup and pixel readback
//! - Volume, gradient, transfer-function and noise textures
//! - The entry/exit position passes over a unit-cube proxy
//! - Histogram and gradient compute passes
//! - The raycast pass and its orchestrator, [`RaycastVolume`]

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Builder patterns return Self which doesn't need must_use
#![allow(clippy::must_use_candidate)]
// Texture sizes and indices convert between u32, usize and f32 freely
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
// GPU uniform padding fields
#![allow(clippy::pub_underscore_fields)]
#![allow(clippy::used_underscore_binding)]

pub mod buffer;
pub mod camera;
pub mod cube;
pub mod engine;
pub mod entry_exit_pass;
pub mod error;
pub mod gradient_compute;
pub mod histogram_compute;
pub mod noise;
pub mod raycast_pass;
pub mod raycast_volume;
pub mod render_targets;
pub mod screenshot;
pub mod transfer_function;
pub mod volume_texture;

pub use camera::Camera;
pub use cube::CubeGeometry;
pub use engine::{RenderEngine, OUTPUT_FORMAT};
pub use entry_exit_pass::{EntryExitPass, PositionUniforms};
pub use error::{RenderError, RenderResult};
pub use gradient_compute::{GradientCompute, GradientTexture, GRADIENT_FORMAT};
pub use histogram_compute::HistogramCompute;
pub use noise::{NoiseTexture, NOISE_SIZE};
pub use raycast_pass::{RaycastPass, RaycastUniforms};
pub use raycast_volume::{DrawTarget, RaycastVolume};
pub use render_targets::{RenderTargets, TargetTexture};
pub use screenshot::{read_texture, save_image, save_to_buffer, ScreenshotError};
pub use transfer_function::{TransferFunction, TransferFunctionTexture, LOOKUP_RESOLUTION};
pub use volume_texture::VolumeTexture;
