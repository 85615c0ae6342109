use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Why a photo could not be acquired. The `Display` text is shown to the
/// player as-is.
#[derive(Debug, Error)]
pub enum PhotoError {
    #[error("Camera not supported in this terminal. Please use the upload option instead.")]
    CameraUnsupported,
    #[error("Camera access failed ({0}). Please use the upload option instead.")]
    CameraFailed(String),
    #[error("Please select a valid image file (JPG, PNG).")]
    NotAnImage,
    #[error("Image file is too large. Please choose a file under {limit_mb}MB.")]
    TooLarge { limit_mb: u64 },
    #[error("Failed to load image. Please try another photo.")]
    Decode(#[source] image::ImageError),
    #[error("Failed to read image file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image processing timed out. Please try a different image.")]
    Timeout,
}

impl PhotoError {
    /// Camera failures fall back to the upload screen; upload failures
    /// stay where they are.
    pub fn is_camera(&self) -> bool {
        matches!(self, PhotoError::CameraUnsupported | PhotoError::CameraFailed(_))
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("best score storage unavailable: {0}")]
    Unavailable(String),
}
