//! Geometry processing algorithms for easy3d-rs.
//!
//! - [`SurfaceMeshSampler`]: near-uniform sampling of a mesh into a point cloud
//! - [`SurfaceMeshSimplification`]: quadric error decimation with fairness constraints
//! - [`Polygonizer`]: planarity estimation and planar chart partitioning

#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
// Element counts and indices
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::many_single_char_names)]
#![allow(clippy::similar_names)]

pub mod error;
pub mod polygonizer;
mod queue;
pub mod surface_mesh_sampler;
pub mod surface_mesh_simplification;

pub use error::{AlgoError, AlgoResult};
pub use polygonizer::Polygonizer;
pub use surface_mesh_sampler::SurfaceMeshSampler;
pub use surface_mesh_simplification::{NormalCone, Quadric, SurfaceMeshSimplification};
