//! The viewing camera.
//!
//! The camera is a [`ManipulatedFrame`] looking down its local -Z axis, plus a
//! projection. Near and far planes are derived from the scene sphere so that the
//! whole scene is always inside the view volume. Screen coordinates are in
//! pixels with the origin at the upper-left corner; depth is in `[0, 1]`.

use glam::{Mat3, Mat4, Quat, Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::frame::Frame;
use crate::key_frame_interpolator::KeyFrameInterpolator;
use crate::manipulated_frame::{ManipulatedFrame, ScreenAxis, ViewParams};

/// How the camera projects onto the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProjectionMode {
    /// Perspective projection.
    #[default]
    Perspective,
    /// Orthographic projection.
    Orthographic,
}

/// Axis direction for up vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AxisDirection {
    PosX,
    NegX,
    /// Positive Y axis (default up).
    #[default]
    PosY,
    NegY,
    PosZ,
    NegZ,
}

impl AxisDirection {
    /// Returns the unit vector for this direction.
    #[must_use]
    pub fn to_vec3(self) -> Vec3 {
        match self {
            AxisDirection::PosX => Vec3::X,
            AxisDirection::NegX => Vec3::NEG_X,
            AxisDirection::PosY => Vec3::Y,
            AxisDirection::NegY => Vec3::NEG_Y,
            AxisDirection::PosZ => Vec3::Z,
            AxisDirection::NegZ => Vec3::NEG_Z,
        }
    }

    /// Short label such as `+Z`.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            AxisDirection::PosX => "+X",
            AxisDirection::NegX => "-X",
            AxisDirection::PosY => "+Y",
            AxisDirection::NegY => "-Y",
            AxisDirection::PosZ => "+Z",
            AxisDirection::NegZ => "-Z",
        }
    }

    /// A viewing direction perpendicular to this up direction, following
    /// right-hand conventions (+Y up looks down -Z, +Z up looks along +X).
    #[must_use]
    pub fn default_view_direction(self) -> Vec3 {
        match self {
            AxisDirection::PosY => Vec3::NEG_Z,
            AxisDirection::NegY => Vec3::Z,
            AxisDirection::PosZ => Vec3::X,
            AxisDirection::NegZ => Vec3::NEG_X,
            AxisDirection::PosX => Vec3::Y,
            AxisDirection::NegX => Vec3::NEG_Y,
        }
    }
}

/// Perspective or orthographic camera orbiting a scene sphere.
#[derive(Debug, Clone)]
pub struct Camera {
    frame: ManipulatedFrame,
    projection_mode: ProjectionMode,
    field_of_view: f32,
    screen_width: u32,
    screen_height: u32,
    scene_center: Vec3,
    scene_radius: f32,
    z_near_coefficient: f32,
    z_clipping_coefficient: f32,
    /// Scales the orthographic view volume with the distance to the pivot point.
    ortho_coef: f32,
    /// Drives the short fit-scene and look-at animations.
    interpolation: KeyFrameInterpolator,
    /// User-defined camera path.
    keyframes: KeyFrameInterpolator,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(600, 400)
    }
}

impl Camera {
    /// Creates a perspective camera looking down -Z at a unit scene sphere.
    #[must_use]
    pub fn new(screen_width: u32, screen_height: u32) -> Self {
        let field_of_view = std::f32::consts::FRAC_PI_4;
        let mut camera = Self {
            frame: ManipulatedFrame::default(),
            projection_mode: ProjectionMode::Perspective,
            field_of_view,
            screen_width: screen_width.max(1),
            screen_height: screen_height.max(1),
            scene_center: Vec3::ZERO,
            scene_radius: 1.0,
            z_near_coefficient: 0.005,
            z_clipping_coefficient: 3.0_f32.sqrt(),
            ortho_coef: (field_of_view / 2.0).tan(),
            interpolation: KeyFrameInterpolator::new(),
            keyframes: KeyFrameInterpolator::new(),
        };
        camera.show_entire_scene();
        camera
    }

    #[must_use]
    pub fn frame(&self) -> &ManipulatedFrame {
        &self.frame
    }

    pub fn frame_mut(&mut self) -> &mut ManipulatedFrame {
        &mut self.frame
    }

    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.frame.frame().position()
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.frame.frame_mut().set_position(position);
    }

    #[must_use]
    pub fn orientation(&self) -> Quat {
        self.frame.frame().orientation()
    }

    pub fn set_orientation(&mut self, orientation: Quat) {
        self.frame.frame_mut().set_orientation(orientation);
    }

    /// World-space direction the camera looks at.
    #[must_use]
    pub fn view_direction(&self) -> Vec3 {
        self.frame.frame().inverse_transform_of(Vec3::NEG_Z)
    }

    #[must_use]
    pub fn up_vector(&self) -> Vec3 {
        self.frame.frame().inverse_transform_of(Vec3::Y)
    }

    #[must_use]
    pub fn right_vector(&self) -> Vec3 {
        self.frame.frame().inverse_transform_of(Vec3::X)
    }

    #[must_use]
    pub fn projection_mode(&self) -> ProjectionMode {
        self.projection_mode
    }

    pub fn set_projection_mode(&mut self, mode: ProjectionMode) {
        // Keep the apparent size of the pivot plane when switching to orthographic.
        if mode == ProjectionMode::Orthographic && self.projection_mode == ProjectionMode::Perspective
        {
            self.ortho_coef = (self.field_of_view / 2.0).tan();
        }
        self.projection_mode = mode;
    }

    pub fn toggle_projection_mode(&mut self) {
        let mode = match self.projection_mode {
            ProjectionMode::Perspective => ProjectionMode::Orthographic,
            ProjectionMode::Orthographic => ProjectionMode::Perspective,
        };
        self.set_projection_mode(mode);
    }

    /// Vertical field of view in radians.
    #[must_use]
    pub fn field_of_view(&self) -> f32 {
        self.field_of_view
    }

    pub fn set_field_of_view(&mut self, fov: f32) {
        self.field_of_view = fov.clamp(0.1, std::f32::consts::PI - 0.1);
    }

    #[must_use]
    pub fn horizontal_field_of_view(&self) -> f32 {
        2.0 * ((self.field_of_view / 2.0).tan() * self.aspect_ratio()).atan()
    }

    #[must_use]
    pub fn screen_width(&self) -> u32 {
        self.screen_width
    }

    #[must_use]
    pub fn screen_height(&self) -> u32 {
        self.screen_height
    }

    pub fn set_screen_width_and_height(&mut self, width: u32, height: u32) {
        self.screen_width = width.max(1);
        self.screen_height = height.max(1);
    }

    #[must_use]
    pub fn aspect_ratio(&self) -> f32 {
        self.screen_width as f32 / self.screen_height as f32
    }

    #[must_use]
    pub fn scene_center(&self) -> Vec3 {
        self.scene_center
    }

    /// Sets the scene center; the pivot point moves there too.
    pub fn set_scene_center(&mut self, center: Vec3) {
        self.scene_center = center;
        self.set_pivot_point(center);
    }

    #[must_use]
    pub fn scene_radius(&self) -> f32 {
        self.scene_radius
    }

    pub fn set_scene_radius(&mut self, radius: f32) {
        if radius <= 0.0 {
            log::warn!("scene radius must be positive, got {radius}");
            return;
        }
        self.scene_radius = radius;
    }

    /// Sets the scene center and radius from a bounding box.
    pub fn set_scene_bounding_box(&mut self, min: Vec3, max: Vec3) {
        self.set_scene_center((min + max) * 0.5);
        self.set_scene_radius(0.5 * (max - min).length());
    }

    #[must_use]
    pub fn pivot_point(&self) -> Vec3 {
        self.frame.pivot_point()
    }

    /// Sets the point the camera orbits around.
    ///
    /// In orthographic mode the view volume scales with the distance to the
    /// pivot, so the scale factor is compensated to keep the image unchanged.
    pub fn set_pivot_point(&mut self, point: Vec3) {
        let prev = self.frame.frame().coordinates_of(self.pivot_point()).z.abs();
        self.frame.set_pivot_point(point);
        let new = self.frame.frame().coordinates_of(point).z.abs();
        if prev > 1e-9 && new > 1e-9 {
            self.ortho_coef *= prev / new;
        }
    }

    /// Distance from the camera to the scene center along the view direction.
    #[must_use]
    pub fn distance_to_scene_center(&self) -> f32 {
        self.frame.frame().coordinates_of(self.scene_center).z.abs()
    }

    #[must_use]
    pub fn z_near(&self) -> f32 {
        let z_near_scene = self.z_clipping_coefficient * self.scene_radius;
        let z = self.distance_to_scene_center() - z_near_scene;
        let z_min = self.z_near_coefficient * z_near_scene;
        if z < z_min {
            match self.projection_mode {
                ProjectionMode::Perspective => z_min,
                ProjectionMode::Orthographic => 0.0,
            }
        } else {
            z
        }
    }

    #[must_use]
    pub fn z_far(&self) -> f32 {
        self.distance_to_scene_center() + self.z_clipping_coefficient * self.scene_radius
    }

    /// Half width and half height of the orthographic view volume.
    #[must_use]
    pub fn ortho_width_height(&self) -> (f32, f32) {
        let dist = self.ortho_coef * self.frame.frame().coordinates_of(self.pivot_point()).z.abs();
        let aspect = self.aspect_ratio();
        if aspect < 1.0 {
            (dist, dist / aspect)
        } else {
            (dist * aspect, dist)
        }
    }

    /// Returns the view matrix.
    #[must_use]
    pub fn view_matrix(&self) -> Mat4 {
        self.frame.frame().inverse_matrix()
    }

    /// Returns the projection matrix (OpenGL clip conventions).
    #[must_use]
    pub fn projection_matrix(&self) -> Mat4 {
        let (near, far) = (self.z_near(), self.z_far());
        match self.projection_mode {
            ProjectionMode::Perspective => {
                Mat4::perspective_rh_gl(self.field_of_view, self.aspect_ratio(), near, far)
            }
            ProjectionMode::Orthographic => {
                let (w, h) = self.ortho_width_height();
                Mat4::orthographic_rh_gl(-w, w, -h, h, near, far)
            }
        }
    }

    /// Returns the combined view-projection matrix.
    #[must_use]
    pub fn model_view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Screen coordinates `(x, y, depth)` of the world point `p`.
    #[must_use]
    pub fn projected_coordinates_of(&self, p: Vec3) -> Vec3 {
        let clip = self.model_view_projection_matrix() * p.extend(1.0);
        let ndc = clip.truncate() / clip.w;
        Vec3::new(
            (ndc.x + 1.0) * 0.5 * self.screen_width as f32,
            (1.0 - ndc.y) * 0.5 * self.screen_height as f32,
            (ndc.z + 1.0) * 0.5,
        )
    }

    /// World point at screen coordinates `(x, y, depth)`.
    #[must_use]
    pub fn unprojected_coordinates_of(&self, s: Vec3) -> Vec3 {
        let ndc = Vec4::new(
            2.0 * s.x / self.screen_width as f32 - 1.0,
            1.0 - 2.0 * s.y / self.screen_height as f32,
            2.0 * s.z - 1.0,
            1.0,
        );
        let p = self.model_view_projection_matrix().inverse() * ndc;
        p.truncate() / p.w
    }

    /// Ray `(origin, unit direction)` through the pixel `(x, y)`.
    #[must_use]
    pub fn convert_click_to_line(&self, x: f32, y: f32) -> (Vec3, Vec3) {
        let w = self.screen_width as f32;
        let h = self.screen_height as f32;
        let frame = self.frame.frame();
        match self.projection_mode {
            ProjectionMode::Perspective => {
                let t = (self.field_of_view / 2.0).tan();
                let local = Vec3::new(
                    (2.0 * x / w - 1.0) * t * self.aspect_ratio(),
                    (2.0 * (h - y) / h - 1.0) * t,
                    -1.0,
                );
                let origin = frame.position();
                let dir = (frame.inverse_coordinates_of(local) - origin).normalize();
                (origin, dir)
            }
            ProjectionMode::Orthographic => {
                let (hw, hh) = self.ortho_width_height();
                let local = Vec3::new((2.0 * x / w - 1.0) * hw, -(2.0 * y / h - 1.0) * hh, 0.0);
                (frame.inverse_coordinates_of(local), self.view_direction())
            }
        }
    }

    /// Rotates the camera to look along `direction`, keeping the up vector if possible.
    pub fn set_view_direction(&mut self, direction: Vec3) {
        if direction.length_squared() < 1e-10 {
            return;
        }
        let mut x_axis = direction.cross(self.up_vector());
        if x_axis.length_squared() < 1e-10 {
            // Looking along the up vector: keep the current X axis.
            x_axis = self.right_vector();
        }
        let frame = self.frame.frame_mut();
        frame.set_from_rotated_basis(x_axis, x_axis.cross(direction), -direction);
    }

    /// Turns the camera toward `target` without moving it.
    pub fn look_at(&mut self, target: Vec3) {
        self.set_view_direction(target - self.position());
    }

    /// Rotates the camera around its view direction so that `up` appears vertical.
    ///
    /// Without `no_move` the camera also orbits around the pivot point so that
    /// the pivot keeps its screen position.
    pub fn set_up_vector(&mut self, up: Vec3, no_move: bool) {
        let local_up = self.frame.frame().transform_of(up).normalize_or_zero();
        if local_up == Vec3::ZERO {
            return;
        }
        let q = Quat::from_rotation_arc(Vec3::Y, local_up);
        if !no_move {
            let pivot = self.pivot_point();
            let frame = self.frame.frame();
            let position = pivot - (frame.orientation() * q) * frame.coordinates_of(pivot);
            self.frame.frame_mut().set_position(position);
        }
        self.frame.frame_mut().rotate(q);
    }

    /// Sets the up vector to an axis and looks along the matching default direction.
    pub fn set_up_direction(&mut self, direction: AxisDirection) {
        self.set_orientation_from_axes(direction.default_view_direction(), direction.to_vec3());
        self.show_entire_scene();
    }

    fn set_orientation_from_axes(&mut self, view_direction: Vec3, up: Vec3) {
        let z = -view_direction.normalize();
        let x = up.cross(z).normalize();
        let y = z.cross(x);
        self.set_orientation(Quat::from_mat3(&Mat3::from_cols(x, y, z)));
    }

    /// Moves the camera back along the view direction until the sphere fills the view.
    pub fn fit_sphere(&mut self, center: Vec3, radius: f32) {
        let distance = match self.projection_mode {
            ProjectionMode::Perspective => {
                let y_view = radius / (self.field_of_view / 2.0).sin();
                let x_view = radius / (self.horizontal_field_of_view() / 2.0).sin();
                x_view.max(y_view)
            }
            ProjectionMode::Orthographic => {
                (center - self.pivot_point()).dot(self.view_direction()) + radius / self.ortho_coef
            }
        };
        let position = center - distance * self.view_direction();
        self.set_position(position);
    }

    /// Fits the cube enclosing the box.
    pub fn fit_bounding_box(&mut self, min: Vec3, max: Vec3) {
        let extent = (max - min).abs();
        let diameter = extent.max_element();
        self.fit_sphere(0.5 * (min + max), 0.5 * diameter);
    }

    /// Fits the scene sphere.
    pub fn show_entire_scene(&mut self) {
        self.fit_sphere(self.scene_center, self.scene_radius);
    }

    /// Zooms so that the screen rectangle `(x0, y0)`-`(x1, y1)` fills the view.
    pub fn fit_screen_region(&mut self, x0: f32, y0: f32, x1: f32, y1: f32) {
        let (left, right) = (x0.min(x1), x0.max(x1));
        let (top, bottom) = (y0.min(y1), y0.max(y1));
        let vd = self.view_direction();
        let dist_to_plane = self.distance_to_scene_center();
        let (cx, cy) = ((left + right) * 0.5, (top + bottom) * 0.5);

        let on_plane = |camera: &Camera, x: f32, y: f32| {
            let (orig, dir) = camera.convert_click_to_line(x, y);
            orig + dist_to_plane / dir.dot(vd) * dir
        };
        let new_center = on_plane(self, cx, cy);
        let point_x = on_plane(self, left, cy);
        let point_y = on_plane(self, cx, top);

        let distance = match self.projection_mode {
            ProjectionMode::Perspective => {
                let dist_x =
                    (point_x - new_center).length() / (self.horizontal_field_of_view() / 2.0).sin();
                let dist_y = (point_y - new_center).length() / (self.field_of_view / 2.0).sin();
                dist_x.max(dist_y)
            }
            ProjectionMode::Orthographic => {
                let aspect = self.aspect_ratio();
                let dist = (new_center - self.pivot_point()).dot(vd);
                let dist_x = (point_x - new_center).length()
                    / self.ortho_coef
                    / if aspect < 1.0 { 1.0 } else { aspect };
                let dist_y = (point_y - new_center).length()
                    / self.ortho_coef
                    / if aspect < 1.0 { 1.0 / aspect } else { 1.0 };
                dist + dist_x.max(dist_y)
            }
        };
        self.set_position(new_center - distance * vd);
    }

    /// Parameters mouse actions need.
    #[must_use]
    pub fn view_params(&self) -> ViewParams {
        ViewParams {
            screen_width: self.screen_width,
            screen_height: self.screen_height,
            projection: self.projection_mode,
            field_of_view: self.field_of_view,
            ortho_half_size: self.ortho_width_height(),
            pivot_projected: self.projected_coordinates_of(self.pivot_point()),
            scene_radius: self.scene_radius,
        }
    }

    /// Orbits around the pivot for a mouse move ending at `(x, y)`.
    pub fn action_rotate(&mut self, x: f32, y: f32, dx: f32, dy: f32, axis: ScreenAxis) {
        let view = self.view_params();
        self.frame.action_rotate(x, y, dx, dy, &view, axis);
    }

    /// Pans for a mouse move of `(dx, dy)` pixels.
    pub fn action_translate(&mut self, dx: f32, dy: f32, axis: ScreenAxis) {
        let view = self.view_params();
        self.frame.action_translate(dx, dy, &view, axis);
    }

    /// Zooms in (positive) or out by a number of steps.
    pub fn action_zoom(&mut self, steps: f32) {
        let view = self.view_params();
        self.frame.action_zoom(steps, &view);
    }

    /// Animates the camera toward `target` and turns it to look at it.
    pub fn interpolate_to_look_at(&mut self, target: Vec3) {
        let duration = easy3d_core::with_settings(|s| s.camera_interpolation_duration);
        let current = *self.frame.frame();
        let mut end = self.clone();
        end.set_position(0.1 * current.position() + 0.9 * target);
        end.look_at(target);

        self.interpolation.delete_path();
        self.interpolation.add_keyframe_at(current, 0.0);
        self.interpolation.add_keyframe_at(
            Frame::new(0.3 * current.position() + 0.7 * target, current.orientation()),
            0.4 * duration,
        );
        self.interpolation
            .add_keyframe_at(*end.frame.frame(), duration);
        self.interpolation.start_interpolation();
    }

    /// Animates the camera to show the entire scene.
    pub fn interpolate_to_fit_scene(&mut self) {
        let duration = easy3d_core::with_settings(|s| s.camera_interpolation_duration);
        let current = *self.frame.frame();
        let mut end = self.clone();
        end.show_entire_scene();

        self.interpolation.delete_path();
        self.interpolation.add_keyframe_at(current, 0.0);
        self.interpolation
            .add_keyframe_at(*end.frame.frame(), duration);
        self.interpolation.start_interpolation();
    }

    /// Animates the camera along a list of frames spread over `duration` seconds.
    pub fn interpolate_to(&mut self, frames: &[Frame], duration: f32) {
        self.interpolation.delete_path();
        self.interpolation.add_keyframe_at(*self.frame.frame(), 0.0);
        let n = frames.len().max(1) as f32;
        for (i, f) in frames.iter().enumerate() {
            self.interpolation
                .add_keyframe_at(*f, duration * (i + 1) as f32 / n);
        }
        self.interpolation.start_interpolation();
    }

    /// Whether a camera animation (internal or along the user path) is running.
    #[must_use]
    pub fn is_animating(&self) -> bool {
        self.interpolation.is_interpolation_started() || self.keyframes.is_interpolation_started()
    }

    /// Advances running animations by `dt` seconds. Returns whether the camera moved.
    pub fn update(&mut self, dt: f32) -> bool {
        let mut moved = false;
        if let Some(f) = self.interpolation.update(dt) {
            *self.frame.frame_mut() = f;
            moved = true;
        }
        if let Some(f) = self.keyframes.update(dt) {
            *self.frame.frame_mut() = f;
            moved = true;
        }
        moved
    }

    /// The user-defined camera path.
    #[must_use]
    pub fn keyframe_interpolator(&self) -> &KeyFrameInterpolator {
        &self.keyframes
    }

    pub fn keyframe_interpolator_mut(&mut self) -> &mut KeyFrameInterpolator {
        &mut self.keyframes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn approx(a: Vec3, b: Vec3, eps: f32) -> bool {
        (a - b).length() < eps
    }

    #[test]
    fn test_axis_direction_to_vec3() {
        assert_eq!(AxisDirection::PosX.to_vec3(), Vec3::X);
        assert_eq!(AxisDirection::NegX.to_vec3(), Vec3::NEG_X);
        assert_eq!(AxisDirection::PosY.to_vec3(), Vec3::Y);
        assert_eq!(AxisDirection::NegY.to_vec3(), Vec3::NEG_Y);
        assert_eq!(AxisDirection::PosZ.to_vec3(), Vec3::Z);
        assert_eq!(AxisDirection::NegZ.to_vec3(), Vec3::NEG_Z);
    }

    #[test]
    fn test_camera_defaults() {
        let camera = Camera::default();
        assert_eq!(camera.projection_mode(), ProjectionMode::Perspective);
        assert!(approx(camera.view_direction(), Vec3::NEG_Z, 1e-6));
        assert!(approx(camera.up_vector(), Vec3::Y, 1e-6));
        assert!(camera.position().z > 1.0);
        assert!(camera.z_near() > 0.0);
        assert!(camera.z_far() > camera.z_near());
    }

    #[test]
    fn test_scene_center_projects_to_screen_center() {
        let camera = Camera::new(640, 480);
        let p = camera.projected_coordinates_of(Vec3::ZERO);
        assert!((p.x - 320.0).abs() < 1e-2);
        assert!((p.y - 240.0).abs() < 1e-2);
        assert!(p.z > 0.0 && p.z < 1.0);
    }

    #[test]
    fn test_screen_y_points_down() {
        let camera = Camera::new(640, 480);
        let above = camera.projected_coordinates_of(Vec3::new(0.0, 0.5, 0.0));
        assert!(above.y < 240.0);
    }

    #[test]
    fn test_fit_sphere_keeps_sphere_in_view() {
        let mut camera = Camera::new(300, 200);
        camera.set_scene_bounding_box(Vec3::splat(-2.0), Vec3::new(4.0, 2.0, 2.0));
        camera.show_entire_scene();
        let r = camera.scene_radius();
        let c = camera.scene_center();
        for d in [Vec3::X, Vec3::NEG_X, Vec3::Y, Vec3::NEG_Y] {
            let p = camera.projected_coordinates_of(c + d * r * 0.99);
            assert!(p.x >= 0.0 && p.x <= 300.0 && p.y >= 0.0 && p.y <= 200.0);
            assert!(p.z > 0.0 && p.z < 1.0);
        }
    }

    #[test]
    fn test_convert_click_to_line_hits_pivot() {
        let camera = Camera::new(640, 480);
        let p = camera.projected_coordinates_of(Vec3::new(0.3, -0.2, 0.1));
        let (origin, dir) = camera.convert_click_to_line(p.x, p.y);
        let to_point = Vec3::new(0.3, -0.2, 0.1) - origin;
        let dist = to_point.cross(dir).length();
        assert!(dist < 1e-3);
    }

    #[test]
    fn test_orthographic_projection() {
        let mut camera = Camera::new(400, 400);
        camera.set_projection_mode(ProjectionMode::Orthographic);
        let proj = camera.projection_matrix();
        assert!((proj.w_axis.w - 1.0).abs() < 0.001);
        let p = camera.projected_coordinates_of(Vec3::ZERO);
        assert!(approx(camera.unprojected_coordinates_of(p), Vec3::ZERO, 1e-3));
    }

    #[test]
    fn test_pivot_change_keeps_ortho_image() {
        let mut camera = Camera::new(400, 400);
        camera.set_projection_mode(ProjectionMode::Orthographic);
        let before = camera.ortho_width_height();
        camera.set_pivot_point(Vec3::new(0.0, 0.0, 0.5));
        let after = camera.ortho_width_height();
        assert!((before.0 - after.0).abs() < 1e-4);
    }

    #[test]
    fn test_set_view_direction_and_look_at() {
        let mut camera = Camera::new(400, 300);
        camera.set_position(Vec3::new(5.0, 0.0, 0.0));
        camera.look_at(Vec3::ZERO);
        assert!(approx(camera.view_direction(), Vec3::NEG_X, 1e-5));
        assert!(approx(camera.up_vector(), Vec3::Y, 1e-5));
    }

    #[test]
    fn test_set_up_vector() {
        let mut camera = Camera::new(400, 300);
        camera.set_up_vector(Vec3::X, true);
        assert!(approx(camera.up_vector(), Vec3::X, 1e-5));
        assert!(approx(camera.view_direction(), Vec3::NEG_Z, 1e-5));
    }

    #[test]
    fn test_set_up_direction_z() {
        let mut camera = Camera::new(400, 300);
        camera.set_up_direction(AxisDirection::PosZ);
        assert!(approx(camera.up_vector(), Vec3::Z, 1e-5));
        assert!(approx(camera.view_direction(), Vec3::X, 1e-5));
    }

    #[test]
    fn test_fit_screen_region_zooms_in() {
        let mut camera = Camera::new(400, 400);
        let before = camera.position().distance(Vec3::ZERO);
        camera.fit_screen_region(150.0, 150.0, 250.0, 250.0);
        let after = camera.position().distance(Vec3::ZERO);
        assert!(after < before);
        let p = camera.projected_coordinates_of(Vec3::ZERO);
        assert!((p.x - 200.0).abs() < 1.0 && (p.y - 200.0).abs() < 1.0);
    }

    #[test]
    fn test_interpolate_to_look_at_reaches_target_view() {
        let mut camera = Camera::new(400, 400);
        let target = Vec3::new(0.5, 0.2, 0.0);
        camera.interpolate_to_look_at(target);
        assert!(camera.is_animating());
        for _ in 0..200 {
            camera.update(0.01);
        }
        assert!(!camera.is_animating());
        let dir = (target - camera.position()).normalize();
        assert!(approx(dir, camera.view_direction(), 1e-3));
    }

    #[test]
    fn test_interpolate_to_fit_scene() {
        let mut camera = Camera::new(400, 400);
        camera.set_position(Vec3::new(0.0, 0.0, 50.0));
        camera.interpolate_to_fit_scene();
        while camera.update(0.05) {}
        let mut fitted = camera.clone();
        fitted.show_entire_scene();
        assert!(approx(camera.position(), fitted.position(), 1e-3));
    }

    #[test]
    fn test_toggle_projection() {
        let mut camera = Camera::default();
        camera.toggle_projection_mode();
        assert_eq!(camera.projection_mode(), ProjectionMode::Orthographic);
        camera.toggle_projection_mode();
        assert_eq!(camera.projection_mode(), ProjectionMode::Perspective);
    }

    #[test]
    fn test_set_fov_clamping() {
        let mut camera = Camera::default();
        camera.set_field_of_view(0.0);
        assert!(camera.field_of_view() >= 0.1);
        camera.set_field_of_view(std::f32::consts::PI);
        assert!(camera.field_of_view() < std::f32::consts::PI);
    }

    proptest! {
        #[test]
        fn prop_project_unproject(x in -0.8f32..0.8, y in -0.8f32..0.8, z in -0.8f32..0.8) {
            let camera = Camera::new(640, 480);
            let p = Vec3::new(x, y, z);
            let s = camera.projected_coordinates_of(p);
            let back = camera.unprojected_coordinates_of(s);
            prop_assert!((back - p).length() < 1e-2);
        }
    }
}
