//! Rendering error types.

use thiserror::Error;

/// Errors that can occur during rendering operations.
#[derive(Error, Debug)]
pub enum RenderError {
    /// Failed to create wgpu adapter.
    #[error("failed to create graphics adapter")]
    AdapterCreationFailed,

    /// Failed to create wgpu device.
    #[error("failed to create graphics device: {0}")]
    DeviceCreationFailed(#[from] wgpu::RequestDeviceError),

    /// Texture creation failed.
    #[error("texture creation failed: {0}")]
    TextureCreationFailed(String),

    /// A requested size exceeds what the device supports.
    #[error("{what} of {requested} exceeds device limit {limit}")]
    LimitExceeded {
        what: &'static str,
        requested: u32,
        limit: u32,
    },

    /// The adapter lacks a downlevel capability the operation needs.
    #[error("adapter does not support {0:?}")]
    DownlevelUnsupported(wgpu::DownlevelFlags),

    /// Mapping a readback buffer failed.
    #[error("GPU buffer mapping failed")]
    BufferMapFailed,

    /// Decoding an image resource failed.
    #[error("image loading failed: {0}")]
    ImageError(#[from] image::ImageError),

    /// Volume ingestion failed.
    #[error(transparent)]
    Volume(#[from] volray_core::VolrayError),
}

/// A specialized Result type for rendering operations.
pub type RenderResult<T> = std::result::Result<T, RenderError>;
