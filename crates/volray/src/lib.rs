//! volray: GPU-accelerated direct volume rendering.
//!
//! A raw 8- or 16-bit voxel grid is uploaded as a 3D texture, preprocessed on
//! the GPU (intensity histogram, smoothed gradient field) and rendered by
//! marching rays between the entry and exit faces of a proxy cube.
//!
//! # Quick Start
//!
//! ```no_run
//! use volray::*;
//!
//! fn main() -> Result<()> {
//!     init_logging();
//!
//!     let mut viewer = HeadlessViewer::new(800, 600)?;
//!     viewer.load_from_file(UVec3::new(128, 128, 64), Vec3::ONE, "scan.raw", BitDepth::Eight)?;
//!     viewer.volume_mut().set_step_scale(0.5);
//!     viewer.fit_camera();
//!     viewer.render_to_file("scan.png")?;
//!
//!     let bins = viewer.volume().histogram().bins();
//!     println!("most common bin: {:?}", bins.iter().position(|&b| b == 1.0));
//!     Ok(())
//! }
//! ```
//!
//! # Crates
//!
//! - `volray-core`: GPU-free data model and CPU reference kernels
//! - `volray-render`: the wgpu passes and [`RaycastVolume`]
//! - `volray`: re-exports and [`HeadlessViewer`]

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::cast_precision_loss)]

mod error;
mod headless;

pub use error::{Result, ViewerError};
pub use headless::HeadlessViewer;

// Re-export core types
pub use volray_core::{
    BitDepth, ControlPoint, GradientField, Histogram, Light, ModelTransform, RaycastSettings,
    RenderingParams, TransferCurve, Volume, VolumeDescriptor, VolumeGeometry, VolrayError,
    INTENSITY_BINS, MIN_STEP_SCALE,
};

// Re-export render types
pub use volray_render::{
    Camera, DrawTarget, GradientTexture, RaycastVolume, RenderEngine, RenderError,
    TransferFunction, TransferFunctionTexture, OUTPUT_FORMAT,
};

pub use glam::{Mat4, Quat, UVec3, Vec3, Vec4};

/// Initializes `env_logger` from `RUST_LOG`. Safe to call more than once.
pub fn init_logging() {
    if env_logger::try_init().is_ok() {
        log::debug!("logging initialized");
    }
}
