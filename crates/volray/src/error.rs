//! Facade error type.

use thiserror::Error;

/// Errors surfaced by the headless viewer.
#[derive(Error, Debug)]
pub enum ViewerError {
    /// GPU setup or rendering failed.
    #[error(transparent)]
    Render(#[from] volray_render::RenderError),

    /// Volume ingestion or configuration failed.
    #[error(transparent)]
    Volume(#[from] volray_core::VolrayError),

    /// Saving the rendered image failed.
    #[error("failed to save image: {0}")]
    Screenshot(#[from] volray_render::ScreenshotError),
}

/// A specialized Result type for the facade.
pub type Result<T> = std::result::Result<T, ViewerError>;
