//! Error types for the geometry algorithms.

use easy3d_core::Easy3dError;
use thiserror::Error;

/// Errors reported by the mesh algorithms.
#[derive(Error, Debug)]
pub enum AlgoError {
    /// The mesh has no faces to work on.
    #[error("mesh '{0}' has no faces")]
    EmptyMesh(String),

    /// The algorithm only handles triangle meshes.
    #[error("mesh '{0}' is not a triangle mesh")]
    NotTriangleMesh(String),

    /// A model operation failed.
    #[error(transparent)]
    Core(#[from] Easy3dError),
}

/// A specialized Result type for the mesh algorithms.
pub type AlgoResult<T> = std::result::Result<T, AlgoError>;
