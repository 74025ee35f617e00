//! easy3d-rs: processing and viewing 3D point clouds, surface meshes and graphs.
//!
//! # Quick Start
//!
//! ```no_run
//! use easy3d::*;
//!
//! fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
//!     initialize()?;
//!
//!     let mesh = fileio::surface_mesh_io::load(resource::file("data/bunny.ply"))?;
//!     let mut viewer = Viewer::new("Tutorial", 800, 600);
//!     viewer.add_model(Box::new(mesh))?;
//!
//!     let frames = [Event::Redraw { dt: 0.016 }, Event::Close];
//!     viewer.run(frames.into_iter());
//!     let name = viewer.default_snapshot_name();
//!     viewer.snapshot(name)?;
//!     Ok(())
//! }
//! ```
//!
//! # Crates
//!
//! - `easy3d-core`: models, properties, rendering states, settings
//! - `easy3d-render`: camera, drawables, the software rasterizer, textures
//! - `easy3d-algo`: simplification, sampling, polygonization
//! - this crate: file I/O, the [`Viewer`] and [`VideoEncoder`]
//!
//! Enable the `winit` feature to translate winit window events into viewer
//! events with `viewer::winit_adapter::WinitInput`.

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
// Pixel and index arithmetic
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]

pub mod fileio;
mod initializer;
pub mod video;
pub mod viewer;

pub use easy3d_core::{
    resource, version, with_settings, with_settings_mut, Box3, Easy3dError, Graph, Location,
    Mat3, Mat4, Material, Method, Model, PointCloud, PropertyContainer, PropertyData,
    PropertyValue, Quat, Result, Settings, State, SurfaceMesh, TextureId, Timer, Vec2, Vec3,
    Vec4,
};

pub use easy3d_render::{
    AxisDirection, Camera, ColorMap, ColorMapRegistry, ColorScheme, Drawable, DrawableKind, Frame,
    Framebuffer, KeyFrame, KeyFrameInterpolator, ManipulatedFrame, ProjectionMode, RenderError,
    RenderResult, Renderer, ScreenAxis, Texture, TextureManager,
};

pub use easy3d_algo::{
    AlgoError, AlgoResult, Polygonizer, SurfaceMeshSampler, SurfaceMeshSimplification,
};

pub use initializer::{initialize, initialize_with, is_initialized, InitOptions};
pub use video::{FrameSink, PixelFormat, VideoEncoder, VideoError};
pub use viewer::{Event, EventSource, ExitHandle, Key, Modifiers, MouseButton, Viewer};
