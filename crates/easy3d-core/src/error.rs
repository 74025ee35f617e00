//! Error types for easy3d-rs.

use thiserror::Error;

/// The main error type for easy3d-rs operations.
#[derive(Error, Debug)]
pub enum Easy3dError {
    /// A model with the given name is already owned by the viewer.
    #[error("model '{0}' already exists")]
    ModelExists(String),

    /// A model with the given name was not found.
    #[error("model '{0}' not found")]
    ModelNotFound(String),

    /// The model has no vertices.
    #[error("model '{0}' has no vertices")]
    EmptyModel(String),

    /// A property with the given name already exists.
    #[error("property '{0}' already exists")]
    PropertyExists(String),

    /// A property with the given name was not found.
    #[error("property '{0}' not found")]
    PropertyNotFound(String),

    /// A property exists but holds a different element type.
    #[error("property '{name}' holds {actual} values, not {expected}")]
    PropertyType {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// Data size mismatch.
    #[error("data size mismatch: expected {expected}, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// A face refers to missing or repeated vertices.
    #[error("invalid face: {0}")]
    InvalidFace(String),

    /// An edge is a self loop, a duplicate, or refers to a missing vertex.
    #[error("invalid edge ({0}, {1})")]
    InvalidEdge(usize, usize),

    /// The file extension is not handled by any reader or writer.
    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// A file was readable but its content was malformed.
    #[error("parse error: {0}")]
    Parse(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// A specialized Result type for easy3d-rs operations.
pub type Result<T> = std::result::Result<T, Easy3dError>;
