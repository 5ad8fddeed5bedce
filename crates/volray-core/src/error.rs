//! Error types for volray.

use thiserror::Error;

/// The main error type for volray core operations.
#[derive(Error, Debug)]
pub enum VolrayError {
    /// A volume dimension was zero.
    #[error("invalid volume dimensions {0}x{1}x{2}")]
    InvalidDimensions(u32, u32, u32),

    /// Unsupported sample width.
    #[error("unsupported bit depth {0} (expected 8 or 16)")]
    UnsupportedBitDepth(u32),

    /// The raw file does not hold exactly the declared number of samples.
    #[error("volume size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// A specialized Result type for volray core operations.
pub type Result<T> = std::result::Result<T, VolrayError>;
