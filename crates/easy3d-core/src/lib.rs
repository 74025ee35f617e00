//! Core types for easy3d-rs.
//!
//! This crate holds everything the viewer and the algorithms share:
//! - [`Model`] trait and the three model kinds ([`PointCloud`], [`SurfaceMesh`], [`Graph`])
//! - Named per-element properties ([`PropertyContainer`])
//! - The per-drawable coloring configuration ([`State`])
//! - Global settings, version info, the resource directory and a [`Timer`]

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Settings and rendering states legitimately have many boolean flags
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
// Index arithmetic on element counts
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]

pub mod bounding_box;
pub mod error;
pub mod graph;
pub mod model;
pub mod point_cloud;
pub mod property;
pub mod resource;
pub mod setting;
pub mod state;
pub mod surface_mesh;
pub mod timer;
pub mod version;

pub use bounding_box::Box3;
pub use error::{Easy3dError, Result};
pub use graph::Graph;
pub use model::Model;
pub use point_cloud::PointCloud;
pub use property::{PropertyContainer, PropertyData, PropertyValue};
pub use setting::{settings, with_settings, with_settings_mut, Settings};
pub use state::{Location, Material, Method, State, TextureId};
pub use surface_mesh::SurfaceMesh;
pub use timer::Timer;

// Re-export glam types for convenience
pub use glam::{Mat3, Mat4, Quat, Vec2, Vec3, Vec4};
