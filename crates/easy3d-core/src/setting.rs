//! Global default settings.
//!
//! Rendering states, drawables and the viewer take their initial values from a
//! process-wide [`Settings`] instance. The instance is created lazily with
//! [`Settings::default`] and can be replaced or loaded from a JSON file.

use std::path::Path;
use std::sync::{OnceLock, PoisonError, RwLock};

use glam::{Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Global settings singleton.
static SETTINGS: OnceLock<RwLock<Settings>> = OnceLock::new();

/// Default values used when creating states, drawables and viewers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Viewer background color.
    pub background_color: Vec4,
    /// Color of highlighted primitives.
    pub highlight_color: Vec4,

    /// Ambient reflectance of the default material.
    pub material_ambient: Vec3,
    /// Specular reflectance of the default material.
    pub material_specular: Vec3,
    /// Specular exponent of the default material.
    pub material_shininess: f32,

    /// Light direction in camera coordinates (w = 0 for a directional light).
    pub light_position: Vec4,
    /// Whether back faces are lit as well.
    pub light_two_sides: bool,
    /// Whether back faces get [`Settings::light_back_color`].
    pub light_distinct_back_color: bool,
    /// Color of back faces when a distinct back color is enabled.
    pub light_back_color: Vec4,

    /// Whether scalar fields clamp their value range by default.
    pub clamp_range: bool,
    /// Lower fraction of scalar values cut off when clamping.
    pub clamp_lower: f32,
    /// Upper fraction of scalar values cut off when clamping.
    pub clamp_upper: f32,

    pub point_cloud_vertices_color: Vec4,
    pub point_cloud_point_size: f32,

    pub surface_mesh_faces_color: Vec4,
    pub surface_mesh_faces_smooth_shading: bool,
    pub surface_mesh_vertices_color: Vec4,
    pub surface_mesh_vertices_point_size: f32,
    pub surface_mesh_edges_color: Vec4,
    pub surface_mesh_edges_line_width: f32,
    pub surface_mesh_borders_color: Vec4,
    pub surface_mesh_borders_line_width: f32,
    pub surface_mesh_locks_color: Vec4,
    pub surface_mesh_locks_point_size: f32,

    pub graph_vertices_color: Vec4,
    pub graph_vertices_point_size: f32,
    pub graph_edges_color: Vec4,
    pub graph_edges_line_width: f32,

    /// How long the pivot point hint stays visible, in seconds.
    pub pivot_hint_duration: f32,
    /// Duration of camera interpolations (fit scene, look at), in seconds.
    pub camera_interpolation_duration: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            background_color: Vec4::new(0.9, 0.9, 1.0, 1.0),
            highlight_color: Vec4::new(1.0, 0.0, 0.0, 1.0),
            material_ambient: Vec3::splat(0.05),
            material_specular: Vec3::splat(0.4),
            material_shininess: 64.0,
            light_position: Vec4::new(0.27, 0.27, 0.92, 0.0),
            light_two_sides: false,
            light_distinct_back_color: false,
            light_back_color: Vec4::new(0.8, 0.4, 0.4, 1.0),
            clamp_range: true,
            clamp_lower: 0.05,
            clamp_upper: 0.05,
            point_cloud_vertices_color: Vec4::new(0.85, 0.85, 0.85, 1.0),
            point_cloud_point_size: 4.0,
            surface_mesh_faces_color: Vec4::new(1.0, 0.8, 0.4, 1.0),
            surface_mesh_faces_smooth_shading: false,
            surface_mesh_vertices_color: Vec4::new(0.0, 1.0, 0.0, 1.0),
            surface_mesh_vertices_point_size: 5.0,
            surface_mesh_edges_color: Vec4::new(0.0, 0.0, 0.0, 1.0),
            surface_mesh_edges_line_width: 1.0,
            surface_mesh_borders_color: Vec4::new(1.0, 0.0, 0.0, 1.0),
            surface_mesh_borders_line_width: 2.0,
            surface_mesh_locks_color: Vec4::new(1.0, 1.0, 0.0, 1.0),
            surface_mesh_locks_point_size: 7.0,
            graph_vertices_color: Vec4::new(0.8, 0.0, 0.8, 1.0),
            graph_vertices_point_size: 15.0,
            graph_edges_color: Vec4::new(1.0, 0.67, 0.5, 1.0),
            graph_edges_line_width: 5.0,
            pivot_hint_duration: 10.0,
            camera_interpolation_duration: 1.0,
        }
    }
}

impl Settings {
    /// Reads settings from a JSON file. Missing fields keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let settings = serde_json::from_str(&text)?;
        log::info!("settings loaded from {}", path.as_ref().display());
        Ok(settings)
    }

    /// Writes settings to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), text)?;
        log::info!("settings saved to {}", path.as_ref().display());
        Ok(())
    }
}

fn global() -> &'static RwLock<Settings> {
    SETTINGS.get_or_init(|| RwLock::new(Settings::default()))
}

/// Access the global settings for reading.
pub fn with_settings<F, R>(f: F) -> R
where
    F: FnOnce(&Settings) -> R,
{
    let guard = global().read().unwrap_or_else(PoisonError::into_inner);
    f(&guard)
}

/// Access the global settings for writing.
pub fn with_settings_mut<F, R>(f: F) -> R
where
    F: FnOnce(&mut Settings) -> R,
{
    let mut guard = global().write().unwrap_or_else(PoisonError::into_inner);
    f(&mut guard)
}

/// Returns a copy of the global settings.
pub fn settings() -> Settings {
    with_settings(Clone::clone)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert!((s.material_shininess - 64.0).abs() < f32::EPSILON);
        assert!(s.clamp_range);
        assert!((s.pivot_hint_duration - 10.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let s: Settings = serde_json::from_str(r#"{"light_two_sides": true}"#).unwrap();
        assert!(s.light_two_sides);
        assert_eq!(s.light_back_color, Settings::default().light_back_color);
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("easy3d_settings_{}.json", std::process::id()));
        let mut s = Settings::default();
        s.point_cloud_point_size = 9.0;
        s.save(&path).unwrap();
        let loaded = Settings::load(&path).unwrap();
        assert_eq!(loaded, s);
        let _ = std::fs::remove_file(&path);
    }
}
