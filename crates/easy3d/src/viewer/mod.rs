//! The viewer: models, drawables, camera and the event loop.
//!
//! A [`Viewer`] owns every model added to it together with the model's
//! [`Renderer`], a list of model-independent drawables, the camera, the
//! texture manager and the color maps. It renders into an off-screen
//! [`Framebuffer`] and reacts to toolkit-neutral [`Event`]s: mouse drags move
//! the camera, key presses toggle drawables and drive camera paths.
//!
//! ```no_run
//! use easy3d::{Event, SurfaceMesh, Vec3, Viewer};
//!
//! # fn main() -> easy3d::Result<()> {
//! easy3d::initialize()?;
//! let mut viewer = Viewer::new("Tutorial", 800, 600);
//! let mesh = SurfaceMesh::from_polygons("tri", [Vec3::ZERO, Vec3::X, Vec3::Y], [[0, 1, 2]])?;
//! viewer.add_model(Box::new(mesh))?;
//! viewer.run([Event::Redraw { dt: 0.016 }, Event::Close].into_iter());
//! # Ok(())
//! # }
//! ```

mod callbacks;
pub mod input;
mod render;
#[cfg(feature = "winit")]
pub mod winit_adapter;

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use easy3d_core::{resource, with_settings, Box3, Easy3dError, Model, Result, Vec2, Vec4};
use easy3d_render::{Camera, ColorMapRegistry, Drawable, Framebuffer, Renderer, TextureManager};

pub use input::{Event, EventSource, Key, Modifiers, MouseButton};

/// A model and the drawables rendering it.
struct ModelEntry {
    model: Box<dyn Model>,
    renderer: Renderer,
}

/// Mouse state between a press and the matching release.
#[derive(Debug, Clone, Copy, Default)]
struct MouseState {
    /// Button held down, with the modifiers of the press and its position.
    pressed: Option<(MouseButton, Modifiers, Vec2)>,
    /// Last cursor position.
    last: Vec2,
}

/// Lets another thread end [`Viewer::run`].
#[derive(Debug, Clone, Default)]
pub struct ExitHandle(Arc<AtomicBool>);

impl ExitHandle {
    pub fn request_exit(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_exit_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Interactive viewer of point clouds, surface meshes and graphs.
pub struct Viewer {
    title: String,
    camera: Camera,
    models: Vec<ModelEntry>,
    current: Option<usize>,
    drawables: Vec<Drawable>,
    textures: TextureManager,
    color_maps: ColorMapRegistry,
    framebuffer: Framebuffer,
    background: Vec4,
    /// Seconds the pivot point stays visible.
    pivot_hint: f32,
    show_axes: bool,
    mouse: MouseState,
    exit: ExitHandle,
}

impl Viewer {
    /// Creates a viewer with a `width` x `height` render target.
    pub fn new(title: impl Into<String>, width: u32, height: u32) -> Self {
        let title = title.into();
        log::debug!("creating viewer '{title}' ({width}x{height})");
        Self {
            title,
            camera: Camera::new(width, height),
            models: Vec::new(),
            current: None,
            drawables: Vec::new(),
            textures: TextureManager::new(),
            color_maps: Self::default_color_maps(),
            framebuffer: Framebuffer::new(width, height),
            background: with_settings(|s| s.background_color),
            pivot_hint: 0.0,
            show_axes: true,
            mouse: MouseState::default(),
            exit: ExitHandle::default(),
        }
    }

    /// Built-in color maps plus any found in the `colormaps/` resource directory.
    fn default_color_maps() -> ColorMapRegistry {
        let mut maps = ColorMapRegistry::new();
        let dir = resource::file("colormaps");
        if dir.is_dir() {
            if let Err(e) = maps.load_directory(&dir) {
                log::warn!("failed to read color maps from {}: {e}", dir.display());
            }
        }
        maps
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.camera.screen_width()
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.camera.screen_height()
    }

    /// Changes the size of the render target.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.camera.set_screen_width_and_height(width, height);
        self.framebuffer.resize(width, height);
    }

    #[must_use]
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    #[must_use]
    pub fn background_color(&self) -> Vec4 {
        self.background
    }

    pub fn set_background_color(&mut self, color: Vec4) {
        self.background = color;
    }

    #[must_use]
    pub fn textures(&self) -> &TextureManager {
        &self.textures
    }

    pub fn textures_mut(&mut self) -> &mut TextureManager {
        &mut self.textures
    }

    #[must_use]
    pub fn color_maps(&self) -> &ColorMapRegistry {
        &self.color_maps
    }

    pub fn color_maps_mut(&mut self) -> &mut ColorMapRegistry {
        &mut self.color_maps
    }

    /// The last rendered image.
    #[must_use]
    pub fn framebuffer(&self) -> &Framebuffer {
        &self.framebuffer
    }

    #[must_use]
    pub fn show_axes(&self) -> bool {
        self.show_axes
    }

    pub fn set_show_axes(&mut self, show: bool) {
        self.show_axes = show;
    }

    /// Whether the picked pivot point is currently shown.
    #[must_use]
    pub fn is_pivot_hint_visible(&self) -> bool {
        self.pivot_hint > 0.0
    }

    #[must_use]
    pub fn exit_handle(&self) -> ExitHandle {
        self.exit.clone()
    }

    // ---- models ----

    /// Adds a model with its default drawables and makes it current.
    ///
    /// Returns the index of the model. Empty models and models whose name is
    /// already taken are rejected.
    pub fn add_model(&mut self, model: Box<dyn Model>) -> Result<usize> {
        self.add_model_with(model, true)
    }

    /// Adds a model, optionally without default drawables.
    pub fn add_model_with(
        &mut self,
        model: Box<dyn Model>,
        create_default_drawables: bool,
    ) -> Result<usize> {
        let name = model.name().to_string();
        if model.is_empty() {
            log::warn!("model '{name}' has no vertices and is not added");
            return Err(Easy3dError::EmptyModel(name));
        }
        if self.find_model(&name).is_some() {
            log::warn!("model '{name}' has already been added to the viewer");
            return Err(Easy3dError::ModelExists(name));
        }

        let renderer = Renderer::new(&*model, create_default_drawables);
        self.models.push(ModelEntry { model, renderer });
        let index = self.models.len() - 1;
        self.current = Some(index);
        log::debug!("model '{name}' added ({} models)", self.models.len());
        Ok(index)
    }

    /// Loads a model from a file and adds it.
    pub fn add_model_from_file(&mut self, path: impl AsRef<Path>) -> Result<usize> {
        let model = crate::fileio::load_model(path)?;
        self.add_model(model)
    }

    /// Removes a model and its drawables. The last model becomes current.
    pub fn delete_model(&mut self, index: usize) -> Option<Box<dyn Model>> {
        if index >= self.models.len() {
            log::warn!("no model at index {index}");
            return None;
        }
        let entry = self.models.remove(index);
        self.current = self.models.len().checked_sub(1);
        log::debug!("model '{}' deleted", entry.model.name());
        Some(entry.model)
    }

    /// Removes the model called `name`.
    pub fn delete_model_named(&mut self, name: &str) -> Result<Box<dyn Model>> {
        let index = self
            .find_model(name)
            .ok_or_else(|| Easy3dError::ModelNotFound(name.to_string()))?;
        self.delete_model(index)
            .ok_or_else(|| Easy3dError::ModelNotFound(name.to_string()))
    }

    /// Index of the model called `name`.
    #[must_use]
    pub fn find_model(&self, name: &str) -> Option<usize> {
        self.models.iter().position(|e| e.model.name() == name)
    }

    #[must_use]
    pub fn n_models(&self) -> usize {
        self.models.len()
    }

    pub fn models(&self) -> impl Iterator<Item = &dyn Model> {
        self.models.iter().map(|e| &*e.model)
    }

    #[must_use]
    pub fn model(&self, index: usize) -> Option<&dyn Model> {
        self.models.get(index).map(|e| &*e.model)
    }

    /// Mutable access to a model. Its drawables are rebuilt before the next
    /// render.
    pub fn model_mut(&mut self, index: usize) -> Option<&mut dyn Model> {
        let entry = self.models.get_mut(index)?;
        entry.renderer.set_update_needed();
        Some(&mut *entry.model)
    }

    #[must_use]
    pub fn renderer(&self, index: usize) -> Option<&Renderer> {
        self.models.get(index).map(|e| &e.renderer)
    }

    pub fn renderer_mut(&mut self, index: usize) -> Option<&mut Renderer> {
        self.models.get_mut(index).map(|e| &mut e.renderer)
    }

    #[must_use]
    pub fn current_model_index(&self) -> Option<usize> {
        self.current
    }

    #[must_use]
    pub fn current_model(&self) -> Option<&dyn Model> {
        self.current.and_then(|i| self.model(i))
    }

    /// Makes the model at `index` current. Returns `false` for a bad index.
    pub fn set_current_model(&mut self, index: usize) -> bool {
        if index < self.models.len() {
            self.current = Some(index);
            true
        } else {
            false
        }
    }

    // ---- model-independent drawables ----

    /// Adds a drawable that belongs to no model. Names must be unique.
    pub fn add_drawable(&mut self, drawable: Drawable) -> bool {
        if self.drawables.iter().any(|d| d.name() == drawable.name()) {
            log::warn!("drawable '{}' has already been added to the viewer", drawable.name());
            return false;
        }
        self.drawables.push(drawable);
        true
    }

    /// Removes the model-independent drawable called `name`.
    pub fn delete_drawable(&mut self, name: &str) -> bool {
        match self.drawables.iter().position(|d| d.name() == name) {
            Some(i) => {
                self.drawables.remove(i);
                true
            }
            None => {
                log::warn!("drawable '{name}' does not exist in the viewer");
                false
            }
        }
    }

    #[must_use]
    pub fn drawables(&self) -> &[Drawable] {
        &self.drawables
    }

    pub fn drawable_mut(&mut self, name: &str) -> Option<&mut Drawable> {
        self.drawables.iter_mut().find(|d| d.name() == name)
    }

    // ---- scene ----

    /// Bounding box of all models and drawables.
    #[must_use]
    pub fn scene_bounding_box(&self) -> Box3 {
        let mut bbox = Box3::new();
        for entry in &self.models {
            bbox.grow_box(&entry.model.bounding_box());
        }
        for d in &self.drawables {
            bbox.grow_box(&d.bounding_box());
        }
        bbox
    }

    /// Fits the model at `index`, or the whole scene with `None`, to the screen.
    pub fn fit_screen(&mut self, index: Option<usize>) {
        let bbox = match index {
            Some(i) => match self.models.get(i) {
                Some(entry) => entry.model.bounding_box(),
                None => {
                    log::warn!("no model at index {i}");
                    return;
                }
            },
            None => self.scene_bounding_box(),
        };
        if !bbox.is_valid() {
            return;
        }
        self.camera
            .set_scene_bounding_box(bbox.min_point(), bbox.max_point());
        self.camera.show_entire_scene();
    }

    /// Advances camera animations and the pivot hint by `dt` seconds.
    /// Returns whether anything changed on screen.
    pub fn update(&mut self, dt: f32) -> bool {
        let mut changed = self.camera.update(dt);
        if self.pivot_hint > 0.0 {
            self.pivot_hint = (self.pivot_hint - dt).max(0.0);
            changed = true;
        }
        changed
    }

    /// Processes events until the source is exhausted, a [`Event::Close`]
    /// arrives, or exit is requested through the [`ExitHandle`]. Returns the
    /// number of frames rendered.
    pub fn run<S: EventSource>(&mut self, mut source: S) -> usize {
        self.fit_screen(None);
        self.render();
        let mut frames = 1;
        while !self.exit.is_exit_requested() {
            let Some(event) = source.next_event() else {
                break;
            };
            if event == Event::Close {
                break;
            }
            if let Event::Redraw { dt } = event {
                self.update(dt);
                self.render();
                frames += 1;
            } else {
                self.handle_event(&event);
            }
        }
        log::debug!("viewer '{}' finished after {frames} frames", self.title);
        frames
    }

    /// Key and mouse bindings.
    #[must_use]
    pub fn usage() -> &'static str {
        USAGE
    }
}

const USAGE: &str = r" ------------------------------------------------------------------
 Easy3D viewer usage:
 ------------------------------------------------------------------
  F1:                  Help
 ------------------------------------------------------------------
  Left:                Turn camera left
  Right:               Turn camera right
  Up:                  Move camera forward
  Down:                Move camera backward
  Ctrl + Left/Right:   Move camera left/right
  Ctrl + Up/Down:      Move camera up/down
 ------------------------------------------------------------------
  'a':                 Toggle axes
  'c':                 Fit current model
  'f':                 Fit all models
  'p':                 Toggle perspective/orthographic projection
  Space:               Align camera with the pivot frame
  Ctrl + '-'/'=':      Zoom out/in
 ------------------------------------------------------------------
  Alt + 'k':           Add a key frame to the camera path
  Ctrl + 'd':          Delete the camera path
  Ctrl + 'k':          Play/stop the camera path
 ------------------------------------------------------------------
  '[' / ']':           Decrease/increase line width (all models)
  '-' / '=':           Decrease/increase point size (all models)
  ',' / '.':           Switch between models
  Delete:              Delete the current model
  'e':                 Toggle edges
  'v':                 Toggle vertices
  'b':                 Toggle borders
  'l':                 Toggle locked vertices
  'm':                 Toggle smooth shading
  'd':                 Print model info
 ------------------------------------------------------------------
  Left drag:           Rotate the camera
  Right drag:          Move the camera
  Middle drag/wheel:   Zoom in/out
  Alt + Left drag:     Rotate around the view direction
  Alt + Right drag:    Move horizontally or vertically
  Shift + Left click:  Pick the pivot point
  Shift + Right click: Fit the whole scene
  Ctrl + Left drag:    Zoom to the dragged region
 ------------------------------------------------------------------
";

#[cfg(test)]
mod tests {
    use super::*;
    use easy3d_core::{PointCloud, SurfaceMesh, Vec3};

    fn triangle(name: &str) -> Box<dyn Model> {
        Box::new(
            SurfaceMesh::from_polygons(name, [Vec3::ZERO, Vec3::X, Vec3::Y], [[0, 1, 2]]).unwrap(),
        )
    }

    #[test]
    fn test_add_model_makes_it_current() {
        let mut viewer = Viewer::new("test", 64, 64);
        assert_eq!(viewer.add_model(triangle("a")).unwrap(), 0);
        assert_eq!(viewer.add_model(triangle("b")).unwrap(), 1);
        assert_eq!(viewer.current_model_index(), Some(1));
        assert_eq!(viewer.current_model().unwrap().name(), "b");
        assert!(viewer.renderer(1).unwrap().get_triangles_drawable("faces").is_some());
    }

    #[test]
    fn test_add_model_rejects_duplicates_and_empty() {
        let mut viewer = Viewer::new("test", 64, 64);
        viewer.add_model(triangle("a")).unwrap();
        assert!(matches!(
            viewer.add_model(triangle("a")),
            Err(Easy3dError::ModelExists(_))
        ));
        assert!(matches!(
            viewer.add_model(Box::new(PointCloud::new("empty"))),
            Err(Easy3dError::EmptyModel(_))
        ));
        assert_eq!(viewer.n_models(), 1);
    }

    #[test]
    fn test_delete_model_makes_last_current() {
        let mut viewer = Viewer::new("test", 64, 64);
        for name in ["a", "b", "c"] {
            viewer.add_model(triangle(name)).unwrap();
        }
        viewer.set_current_model(0);
        let removed = viewer.delete_model(1).unwrap();
        assert_eq!(removed.name(), "b");
        assert_eq!(viewer.current_model().unwrap().name(), "c");
        assert!(viewer.delete_model(5).is_none());

        viewer.delete_model_named("a").unwrap();
        viewer.delete_model_named("c").unwrap();
        assert_eq!(viewer.current_model_index(), None);
        assert!(matches!(
            viewer.delete_model_named("c"),
            Err(Easy3dError::ModelNotFound(_))
        ));
    }

    #[test]
    fn test_drawables_by_name() {
        let mut viewer = Viewer::new("test", 64, 64);
        let d = Drawable::new("path", easy3d_render::DrawableKind::Lines);
        assert!(viewer.add_drawable(d.clone()));
        assert!(!viewer.add_drawable(d));
        assert!(viewer.drawable_mut("path").is_some());
        assert!(viewer.delete_drawable("path"));
        assert!(!viewer.delete_drawable("path"));
    }

    #[test]
    fn test_fit_screen_uses_model_box() {
        let mut viewer = Viewer::new("test", 64, 64);
        viewer.add_model(triangle("a")).unwrap();
        let far = SurfaceMesh::from_polygons(
            "far",
            [Vec3::splat(10.0), Vec3::new(12.0, 10.0, 10.0), Vec3::new(10.0, 12.0, 10.0)],
            [[0, 1, 2]],
        )
        .unwrap();
        viewer.add_model(Box::new(far)).unwrap();

        viewer.fit_screen(Some(1));
        assert!((viewer.camera().scene_center() - Vec3::new(11.0, 11.0, 10.0)).length() < 1e-5);
        viewer.fit_screen(None);
        let center = viewer.camera().scene_center();
        assert!((center - Vec3::new(6.0, 6.0, 5.0)).length() < 1e-5);
    }

    #[test]
    fn test_exit_handle_stops_run() {
        let mut viewer = Viewer::new("test", 16, 16);
        viewer.add_model(triangle("a")).unwrap();
        let handle = viewer.exit_handle();
        handle.request_exit();
        let frames = viewer.run(std::iter::repeat(Event::Redraw { dt: 0.1 }));
        assert_eq!(frames, 1);
    }

    #[test]
    fn test_run_stops_on_close() {
        let mut viewer = Viewer::new("test", 16, 16);
        viewer.add_model(triangle("a")).unwrap();
        let events = [
            Event::Redraw { dt: 0.1 },
            Event::Redraw { dt: 0.1 },
            Event::Close,
            Event::Redraw { dt: 0.1 },
        ];
        assert_eq!(viewer.run(events.into_iter()), 3);
    }
}
