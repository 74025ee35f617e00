//! Mouse-driven camera frame.
//!
//! The camera frame moves opposite to the mouse so that the scene appears to
//! follow it: dragging right turns the scene right, panning right moves the
//! scene right. Rotations orbit around the pivot point.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::camera::ProjectionMode;
use crate::frame::Frame;

/// Constrains a mouse action to one screen direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ScreenAxis {
    /// Free motion.
    #[default]
    None,
    /// Only horizontal mouse motion counts.
    Horizontal,
    /// Only vertical mouse motion counts.
    Vertical,
    /// Rotation around the view direction.
    Orthogonal,
}

/// Camera parameters that mouse actions depend on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewParams {
    pub screen_width: u32,
    pub screen_height: u32,
    pub projection: ProjectionMode,
    /// Vertical field of view in radians.
    pub field_of_view: f32,
    /// Half width and half height of the orthographic view volume.
    pub ortho_half_size: (f32, f32),
    /// Pivot point in screen coordinates (pixels, upper-left origin).
    pub pivot_projected: Vec3,
    pub scene_radius: f32,
}

/// A camera frame manipulated with mouse and keyboard actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManipulatedFrame {
    frame: Frame,
    pivot_point: Vec3,
    rotation_sensitivity: f32,
    translation_sensitivity: f32,
    wheel_sensitivity: f32,
    #[serde(skip)]
    manipulating: bool,
}

impl Default for ManipulatedFrame {
    fn default() -> Self {
        Self::new(Frame::default())
    }
}

/// Projects a point onto the deformed trackball of radius 1.
fn project_on_ball(x: f32, y: f32) -> f32 {
    const SIZE2: f32 = 1.0;
    const SIZE_LIMIT: f32 = SIZE2 * 0.5;
    let d = x * x + y * y;
    if d < SIZE_LIMIT {
        (SIZE2 - d).sqrt()
    } else {
        SIZE_LIMIT / d.sqrt()
    }
}

impl ManipulatedFrame {
    #[must_use]
    pub fn new(frame: Frame) -> Self {
        Self {
            frame,
            pivot_point: Vec3::ZERO,
            rotation_sensitivity: 1.0,
            translation_sensitivity: 1.0,
            wheel_sensitivity: 1.0,
            manipulating: false,
        }
    }

    #[must_use]
    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn frame_mut(&mut self) -> &mut Frame {
        &mut self.frame
    }

    /// The point rotations orbit around, in world coordinates.
    #[must_use]
    pub fn pivot_point(&self) -> Vec3 {
        self.pivot_point
    }

    pub fn set_pivot_point(&mut self, point: Vec3) {
        self.pivot_point = point;
    }

    #[must_use]
    pub fn rotation_sensitivity(&self) -> f32 {
        self.rotation_sensitivity
    }

    pub fn set_rotation_sensitivity(&mut self, s: f32) {
        self.rotation_sensitivity = s;
    }

    #[must_use]
    pub fn translation_sensitivity(&self) -> f32 {
        self.translation_sensitivity
    }

    pub fn set_translation_sensitivity(&mut self, s: f32) {
        self.translation_sensitivity = s;
    }

    #[must_use]
    pub fn wheel_sensitivity(&self) -> f32 {
        self.wheel_sensitivity
    }

    pub fn set_wheel_sensitivity(&mut self, s: f32) {
        self.wheel_sensitivity = s;
    }

    /// Marks the beginning of a mouse action.
    pub fn action_start(&mut self) {
        self.manipulating = true;
    }

    /// Marks the end of a mouse action.
    pub fn action_end(&mut self) {
        self.manipulating = false;
    }

    /// Whether a mouse action is in progress.
    #[must_use]
    pub fn is_manipulated(&self) -> bool {
        self.manipulating
    }

    /// Rotates around the pivot point for a mouse move from
    /// `(x - dx, y - dy)` to `(x, y)`.
    pub fn action_rotate(
        &mut self,
        x: f32,
        y: f32,
        dx: f32,
        dy: f32,
        view: &ViewParams,
        axis: ScreenAxis,
    ) {
        let w = view.screen_width.max(1) as f32;
        let h = view.screen_height.max(1) as f32;
        let (cx, cy) = (view.pivot_projected.x, view.pivot_projected.y);
        let rotation = match axis {
            ScreenAxis::Orthogonal => {
                let prev = (y - dy - cy).atan2(x - dx - cx);
                let angle = (y - cy).atan2(x - cx);
                Quat::from_axis_angle(Vec3::Z, angle - prev)
            }
            ScreenAxis::Horizontal => Quat::from_axis_angle(
                Vec3::Y,
                -std::f32::consts::PI * dx / w * self.rotation_sensitivity,
            ),
            ScreenAxis::Vertical => Quat::from_axis_angle(
                Vec3::X,
                -std::f32::consts::PI * dy / h * self.rotation_sensitivity,
            ),
            ScreenAxis::None => self.deformed_ball_quaternion(x, y, x - dx, y - dy, cx, cy, w, h),
        };
        self.frame.rotate_around_point(rotation, self.pivot_point);
    }

    #[allow(clippy::too_many_arguments)]
    fn deformed_ball_quaternion(
        &self,
        x: f32,
        y: f32,
        prev_x: f32,
        prev_y: f32,
        cx: f32,
        cy: f32,
        w: f32,
        h: f32,
    ) -> Quat {
        let s = self.rotation_sensitivity;
        let px = s * (prev_x - cx) / w;
        let py = s * (cy - prev_y) / h;
        let qx = s * (x - cx) / w;
        let qy = s * (cy - y) / h;
        let p1 = Vec3::new(px, py, project_on_ball(px, py));
        let p2 = Vec3::new(qx, qy, project_on_ball(qx, qy));
        let axis = p2.cross(p1);
        let denom = p1.length_squared() * p2.length_squared();
        if axis.length_squared() < 1e-12 || denom < 1e-12 {
            return Quat::IDENTITY;
        }
        let angle = 5.0 * (axis.length_squared() / denom).sqrt().min(1.0).asin();
        Quat::from_axis_angle(axis.normalize(), angle)
    }

    /// Pans the camera so that the scene follows a mouse move of `(dx, dy)` pixels.
    pub fn action_translate(&mut self, dx: f32, dy: f32, view: &ViewParams, axis: ScreenAxis) {
        let mut trans = Vec3::new(-dx, dy, 0.0);
        match axis {
            ScreenAxis::Horizontal => trans.y = 0.0,
            ScreenAxis::Vertical => trans.x = 0.0,
            ScreenAxis::None | ScreenAxis::Orthogonal => {}
        }
        let w = view.screen_width.max(1) as f32;
        let h = view.screen_height.max(1) as f32;
        match view.projection {
            ProjectionMode::Perspective => {
                let depth = self.frame.coordinates_of(self.pivot_point).z.abs();
                trans *= 2.0 * (view.field_of_view / 2.0).tan() * depth / h;
            }
            ProjectionMode::Orthographic => {
                trans.x *= 2.0 * view.ortho_half_size.0 / w;
                trans.y *= 2.0 * view.ortho_half_size.1 / h;
            }
        }
        let world = self
            .frame
            .inverse_transform_of(trans * self.translation_sensitivity);
        self.frame.translate(world);
    }

    /// Moves toward (positive `steps`) or away from the pivot point.
    ///
    /// Each step covers a tenth of the distance to the pivot, but at least a
    /// fiftieth of the scene radius.
    pub fn action_zoom(&mut self, steps: f32, view: &ViewParams) {
        let depth = self.frame.coordinates_of(self.pivot_point).z.abs();
        let coef = depth.max(0.2 * view.scene_radius);
        let trans = Vec3::new(0.0, 0.0, -coef * steps * 0.1 * self.wheel_sensitivity);
        let world = self.frame.inverse_transform_of(trans);
        self.frame.translate(world);
    }

    /// Turns the camera in place around its up axis; positive turns left.
    pub fn action_turn(&mut self, angle: f32) {
        self.frame.rotate(Quat::from_axis_angle(Vec3::Y, angle));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view() -> ViewParams {
        ViewParams {
            screen_width: 800,
            screen_height: 600,
            projection: ProjectionMode::Perspective,
            field_of_view: std::f32::consts::FRAC_PI_4,
            ortho_half_size: (1.0, 1.0),
            pivot_projected: Vec3::new(400.0, 300.0, 0.5),
            scene_radius: 1.0,
        }
    }

    fn camera_frame() -> ManipulatedFrame {
        ManipulatedFrame::new(Frame::new(Vec3::new(0.0, 0.0, 5.0), Quat::IDENTITY))
    }

    #[test]
    fn test_rotate_keeps_pivot_distance() {
        let mut mf = camera_frame();
        mf.action_rotate(500.0, 320.0, 40.0, 10.0, &view(), ScreenAxis::None);
        assert!((mf.frame().position().length() - 5.0).abs() < 1e-3);
    }

    #[test]
    fn test_drag_right_moves_camera_left() {
        let mut mf = camera_frame();
        mf.action_rotate(420.0, 300.0, 20.0, 0.0, &view(), ScreenAxis::None);
        assert!(mf.frame().position().x < 0.0);
    }

    #[test]
    fn test_horizontal_rotation_keeps_height() {
        let mut mf = camera_frame();
        mf.action_rotate(450.0, 350.0, 50.0, 50.0, &view(), ScreenAxis::Horizontal);
        assert!(mf.frame().position().y.abs() < 1e-4);
    }

    #[test]
    fn test_translate_perspective_scale() {
        let mut mf = camera_frame();
        mf.action_translate(100.0, 0.0, &view(), ScreenAxis::None);
        let expected = -100.0 * 2.0 * (std::f32::consts::FRAC_PI_8).tan() * 5.0 / 600.0;
        assert!((mf.frame().position().x - expected).abs() < 1e-4);
    }

    #[test]
    fn test_translate_vertical_axis() {
        let mut mf = camera_frame();
        mf.action_translate(100.0, 50.0, &view(), ScreenAxis::Vertical);
        assert!(mf.frame().position().x.abs() < 1e-6);
        assert!(mf.frame().position().y > 0.0);
    }

    #[test]
    fn test_zoom_moves_toward_pivot() {
        let mut mf = camera_frame();
        mf.action_zoom(1.0, &view());
        assert!((mf.frame().position().z - 4.5).abs() < 1e-4);
        mf.action_zoom(-1.0, &view());
        assert!(mf.frame().position().z > 4.5);
    }

    #[test]
    fn test_turn_left() {
        let mut mf = camera_frame();
        mf.action_turn(0.1);
        let dir = mf.frame().inverse_transform_of(Vec3::NEG_Z);
        assert!(dir.x < 0.0);
        assert_eq!(mf.frame().position(), Vec3::new(0.0, 0.0, 5.0));
    }

    #[test]
    fn test_action_flags() {
        let mut mf = camera_frame();
        mf.action_start();
        assert!(mf.is_manipulated());
        mf.action_end();
        assert!(!mf.is_manipulated());
    }
}
