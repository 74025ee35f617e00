//! Rendering, read-back and image output of the viewer.

use std::path::{Path, PathBuf};

use easy3d_core::{Location, Mat4, SurfaceMesh, Vec3, Vec4};
use easy3d_render::{
    draw, pick_face, pick_vertex, save_depth_image, save_framebuffer, Drawable, DrawableKind,
    FacePick, Framebuffer, Pass, RenderContext, RenderResult,
};

use super::Viewer;

/// Side of the corner axes, in pixels.
const AXES_SIZE: f32 = 40.0;
/// Distance of the axes origin from the lower-left corner, in pixels.
const AXES_OFFSET: f32 = 50.0;

impl Viewer {
    fn context(&self) -> RenderContext<'_> {
        RenderContext::new(
            self.camera.view_matrix(),
            self.camera.projection_matrix(),
            &self.textures,
            &self.color_maps,
        )
    }

    /// Rebuilds model drawables marked for update.
    fn update_renderers(&mut self) {
        for entry in &mut self.models {
            entry.renderer.update_if_needed(&*entry.model);
        }
    }

    /// Draws every visible model and drawable into `fb` without clearing it.
    fn draw_scene(&self, fb: &mut Framebuffer, pass: Pass) {
        let ctx = self.context();
        for (i, entry) in self.models.iter().enumerate() {
            if !entry.renderer.is_visible() {
                continue;
            }
            let pass = match pass {
                Pass::Id(_) => Pass::Id(i as u32),
                other => other,
            };
            for d in entry.renderer.drawables() {
                draw(fb, d, &ctx, pass);
            }
        }
        if !matches!(pass, Pass::Id(_)) {
            for d in &self.drawables {
                draw(fb, d, &ctx, pass);
            }
        }
    }

    /// Renders the scene with its overlays into the viewer's framebuffer.
    pub fn render(&mut self) -> &Framebuffer {
        self.update_renderers();
        let mut fb = std::mem::replace(&mut self.framebuffer, Framebuffer::new(0, 0));
        fb.resize(self.width(), self.height());
        fb.clear(self.background);
        self.draw_scene(&mut fb, Pass::Color);

        // Overlays are drawn on top of the scene.
        fb.clear_depth();
        if self.pivot_hint > 0.0 {
            let ctx = self.context();
            draw(&mut fb, &self.pivot_drawable(), &ctx, Pass::Color);
        }
        if self.show_axes {
            self.draw_corner_axes(&mut fb);
        }
        self.framebuffer = fb;
        &self.framebuffer
    }

    fn pivot_drawable(&self) -> Drawable {
        let mut pivot = Drawable::new("pivot", DrawableKind::Points);
        pivot.update_vertex_buffer(vec![self.camera.pivot_point()]);
        pivot.set_point_size(10.0);
        pivot
            .state_mut()
            .set_uniform_coloring(Vec4::new(0.0, 0.0, 1.0, 1.0));
        pivot.state_mut().set_lighting(false);
        pivot
    }

    /// Axes rotating with the camera in the lower-left corner.
    fn draw_corner_axes(&self, fb: &mut Framebuffer) {
        let (w, h) = (self.width() as f32, self.height() as f32);
        if w < 2.0 * AXES_OFFSET || h < 2.0 * AXES_OFFSET {
            return;
        }
        let mut axes = Drawable::new("axes", DrawableKind::Lines);
        axes.update_vertex_buffer(vec![
            Vec3::ZERO,
            Vec3::X,
            Vec3::ZERO,
            Vec3::Y,
            Vec3::ZERO,
            Vec3::Z,
        ]);
        axes.update_color_buffer(vec![Vec3::X, Vec3::X, Vec3::Y, Vec3::Y, Vec3::Z, Vec3::Z]);
        axes.set_line_width(2.0);
        axes.state_mut()
            .set_property_coloring(Location::Vertex, "v:color");
        axes.state_mut().set_lighting(false);

        // Pixel-space orthographic projection placing the origin at the corner.
        let projection = Mat4::orthographic_rh_gl(
            -AXES_OFFSET,
            w - AXES_OFFSET,
            -AXES_OFFSET,
            h - AXES_OFFSET,
            -2.0 * AXES_SIZE,
            2.0 * AXES_SIZE,
        );
        let view = Mat4::from_scale(Vec3::splat(AXES_SIZE))
            * Mat4::from_quat(self.camera.orientation().inverse());
        let ctx = RenderContext::new(view, projection, &self.textures, &self.color_maps);
        draw(fb, &axes, &ctx, Pass::Color);
    }

    /// The world point rendered at pixel `(x, y)`, if any.
    ///
    /// The scene is rendered into an off-screen depth buffer; a depth below
    /// 1 means a surface was hit and the pixel center is unprojected. Models
    /// changed through [`Viewer::model_mut`] are rebuilt first.
    #[must_use]
    pub fn point_under_pixel(&mut self, x: f32, y: f32) -> Option<Vec3> {
        let (w, h) = (self.width(), self.height());
        if x < 0.0 || y < 0.0 || w == 0 || h == 0 {
            return None;
        }
        self.update_renderers();
        let (px, py) = (x.floor() as u32, y.floor() as u32);
        let mut fb = Framebuffer::new(w, h);
        self.draw_scene(&mut fb, Pass::DepthOnly);
        let depth = fb.depth_at(px, py)?;
        (depth < 1.0).then(|| {
            self.camera
                .unprojected_coordinates_of(Vec3::new(px as f32 + 0.5, py as f32 + 0.5, depth))
        })
    }

    /// Index of the model rendered at pixel `(x, y)`.
    #[must_use]
    pub fn pick_model(&mut self, x: f32, y: f32) -> Option<usize> {
        let (w, h) = (self.width(), self.height());
        if x < 0.0 || y < 0.0 || w == 0 || h == 0 {
            return None;
        }
        self.update_renderers();
        let mut fb = Framebuffer::new(w, h);
        self.draw_scene(&mut fb, Pass::Id(0));
        fb.id_at(x.floor() as u32, y.floor() as u32)
            .map(|id| id as usize)
    }

    /// The model under pixel `(x, y)` and, if it is a surface mesh, the face hit.
    #[must_use]
    pub fn pick_face(&mut self, x: f32, y: f32) -> Option<(usize, FacePick)> {
        let index = self.pick_model(x, y)?;
        let mesh = self.models[index]
            .model
            .as_any()
            .downcast_ref::<SurfaceMesh>()?;
        pick_face(mesh, &self.camera, x, y).map(|hit| (index, hit))
    }

    /// The vertex of the current model nearest to pixel `(x, y)`, within
    /// `max_distance` pixels.
    #[must_use]
    pub fn pick_vertex(&self, x: f32, y: f32, max_distance: f32) -> Option<usize> {
        let model = self.current_model()?;
        pick_vertex(model, &self.camera, x, y, max_distance)
    }

    /// Renders the scene on a white background and saves it as an image.
    pub fn snapshot(&mut self, path: impl AsRef<Path>) -> RenderResult<()> {
        let path = path.as_ref();
        self.update_renderers();
        let mut fb = Framebuffer::new(self.width(), self.height());
        fb.clear(Vec4::ONE);
        self.draw_scene(&mut fb, Pass::Color);
        if let Err(e) = save_framebuffer(path, &fb) {
            log::error!("failed to save snapshot {}: {e}", path.display());
            return Err(e);
        }
        log::info!("snapshot saved to {}", path.display());
        Ok(())
    }

    /// Saves the depth buffer of the scene as a grayscale image.
    pub fn save_depth_map(&mut self, path: impl AsRef<Path>) -> RenderResult<()> {
        let path = path.as_ref();
        self.update_renderers();
        let mut fb = Framebuffer::new(self.width(), self.height());
        self.draw_scene(&mut fb, Pass::DepthOnly);
        save_depth_image(path, &fb)?;
        log::info!("depth map saved to {}", path.display());
        Ok(())
    }

    /// A time-stamped snapshot file name in the current directory.
    #[must_use]
    pub fn default_snapshot_name(&self) -> PathBuf {
        let stem = self
            .current_model()
            .map_or_else(|| self.title.clone(), |m| m.name().to_string());
        let stem: String = stem
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
            .collect();
        PathBuf::from(format!(
            "{stem}_{}.png",
            chrono::Local::now().format("%Y%m%d_%H%M%S")
        ))
    }
}
