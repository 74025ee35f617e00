//! Camera and rendering for easy3d-rs.
//!
//! This crate provides:
//! - Frames, the mouse-driven [`ManipulatedFrame`] and key-frame animation
//! - The [`Camera`] with projection, fitting and interpolation
//! - [`Drawable`] buffers built from models and the per-model [`Renderer`]
//! - Textures and color maps
//! - A software rasterizer producing color, depth and id buffers
//! - Picking helpers and image output

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
// Pixel and index arithmetic
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::similar_names)]
#![allow(clippy::many_single_char_names)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::module_name_repetitions)]

pub mod buffer;
pub mod camera;
pub mod color_maps;
pub mod drawable;
pub mod error;
pub mod frame;
pub mod key_frame_interpolator;
pub mod manipulated_frame;
pub mod pick;
pub mod raster;
pub mod renderer;
pub mod screenshot;
pub mod texture;

pub use camera::{AxisDirection, Camera, ProjectionMode};
pub use color_maps::{ColorMap, ColorMapRegistry, DEFAULT_COLOR_MAP};
pub use drawable::{Drawable, DrawableKind, Vertex};
pub use error::{RenderError, RenderResult};
pub use frame::Frame;
pub use key_frame_interpolator::{KeyFrame, KeyFrameInterpolator};
pub use manipulated_frame::{ManipulatedFrame, ScreenAxis, ViewParams};
pub use pick::{intersect_triangle, pick_face, pick_vertex, FacePick, RayHit};
pub use raster::{draw, Framebuffer, Pass, RenderContext, NO_ID};
pub use renderer::{ColorScheme, Renderer};
pub use screenshot::{save_depth_image, save_framebuffer, save_image, save_to_buffer};
pub use texture::{FilterMode, Texture, TextureManager, WrapMode};
