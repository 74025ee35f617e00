//! Rendering error types.

use thiserror::Error;

/// Errors that can occur during rendering operations.
#[derive(Error, Debug)]
pub enum RenderError {
    /// Pixel data does not match the image size.
    #[error("invalid image data")]
    InvalidImageData,

    /// The image file extension is not supported.
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// Image decoding or encoding failed.
    #[error("image error: {0}")]
    ImageError(#[from] image::ImageError),

    /// The texture handle does not refer to a live texture.
    #[error("texture {0} not found")]
    TextureNotFound(usize),

    /// The framebuffer has no pixels.
    #[error("framebuffer is empty")]
    EmptyFramebuffer,

    /// A key frame path has fewer key frames than required.
    #[error("path has {0} key frames, need at least 2")]
    PathTooShort(usize),

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// A specialized Result type for rendering operations.
pub type RenderResult<T> = std::result::Result<T, RenderError>;
