//! Coordinate frames.
//!
//! A [`Frame`] is a position and an orientation in world space. It converts
//! points and vectors between its local coordinate system and the world.

use glam::{Mat3, Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// A rigid coordinate system: local-to-world rotation followed by a translation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    position: Vec3,
    orientation: Quat,
}

impl Default for Frame {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Quat::IDENTITY)
    }
}

impl Frame {
    #[must_use]
    pub fn new(position: Vec3, orientation: Quat) -> Self {
        Self {
            position,
            orientation: orientation.normalize(),
        }
    }

    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    #[must_use]
    pub fn orientation(&self) -> Quat {
        self.orientation
    }

    pub fn set_orientation(&mut self, orientation: Quat) {
        self.orientation = orientation.normalize();
    }

    pub fn set_position_and_orientation(&mut self, position: Vec3, orientation: Quat) {
        self.position = position;
        self.set_orientation(orientation);
    }

    /// Moves the frame by `t`, expressed in world coordinates.
    pub fn translate(&mut self, t: Vec3) {
        self.position += t;
    }

    /// Rotates the frame by `q`, expressed in local coordinates.
    pub fn rotate(&mut self, q: Quat) {
        self.orientation = (self.orientation * q).normalize();
    }

    /// Rotates the frame by `q` (local coordinates) around the world point `point`.
    pub fn rotate_around_point(&mut self, q: Quat, point: Vec3) {
        let (axis, angle) = q.normalize().to_axis_angle();
        let world_rotation = Quat::from_axis_angle(self.inverse_transform_of(axis), angle);
        self.position = point + world_rotation * (self.position - point);
        self.rotate(q);
    }

    /// Local coordinates of the world point `p`.
    #[must_use]
    pub fn coordinates_of(&self, p: Vec3) -> Vec3 {
        self.orientation.inverse() * (p - self.position)
    }

    /// World coordinates of the local point `p`.
    #[must_use]
    pub fn inverse_coordinates_of(&self, p: Vec3) -> Vec3 {
        self.orientation * p + self.position
    }

    /// Local components of the world vector `v`.
    #[must_use]
    pub fn transform_of(&self, v: Vec3) -> Vec3 {
        self.orientation.inverse() * v
    }

    /// World components of the local vector `v`.
    #[must_use]
    pub fn inverse_transform_of(&self, v: Vec3) -> Vec3 {
        self.orientation * v
    }

    /// Local-to-world matrix.
    #[must_use]
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.orientation, self.position)
    }

    /// World-to-local matrix.
    #[must_use]
    pub fn inverse_matrix(&self) -> Mat4 {
        let r = self.orientation.inverse();
        Mat4::from_rotation_translation(r, -(r * self.position))
    }

    /// Sets the orientation from three (not necessarily unit) local axes given in world space.
    pub fn set_from_rotated_basis(&mut self, x: Vec3, y: Vec3, z: Vec3) {
        let basis = Mat3::from_cols(x.normalize(), y.normalize(), z.normalize());
        self.orientation = Quat::from_mat3(&basis).normalize();
    }

    /// Rotates the frame so that its axes snap to the closest axes of `other`
    /// (the world frame when `None`).
    ///
    /// The best-aligned pair of axes is snapped first when its alignment
    /// (absolute cosine) is at least `threshold`, then a second pair is
    /// snapped under the same condition. With `move_frame` the frame is also
    /// translated so that the origin of `other` keeps its local coordinates.
    pub fn align_with_frame(&mut self, other: Option<&Frame>, move_frame: bool, threshold: f32) {
        let unit = [Vec3::X, Vec3::Y, Vec3::Z];
        let target: [Vec3; 3] = unit.map(|d| other.map_or(d, |f| f.inverse_transform_of(d)));
        let mut own: [Vec3; 3] = unit.map(|d| self.inverse_transform_of(d));

        let mut best = (0, 0);
        let mut max_proj = 0.0;
        for (i, t) in target.iter().enumerate() {
            for (j, o) in own.iter().enumerate() {
                let proj = t.dot(*o).abs();
                if proj >= max_proj {
                    best = (i, j);
                    max_proj = proj;
                }
            }
        }

        let old = *self;
        let coef = target[best.0].dot(own[best.1]);
        if coef.abs() >= threshold {
            self.snap_axis(target[best.0], own[best.1], coef);

            // Try to align a second axis direction.
            let d = (best.1 + 1) % 3;
            own[d] = self.inverse_transform_of(unit[d]);
            let mut index = 0;
            let mut max_proj = 0.0;
            for (i, t) in target.iter().enumerate() {
                let proj = t.dot(own[d]).abs();
                if proj >= max_proj {
                    index = i;
                    max_proj = proj;
                }
            }
            if max_proj >= threshold {
                let coef = target[index].dot(own[d]);
                self.snap_axis(target[index], own[d], coef);
            }
        }

        if move_frame {
            let center = other.map_or(Vec3::ZERO, Frame::position);
            self.position = center - self.orientation * old.coordinates_of(center);
        }
    }

    /// Applies the world rotation bringing `from` onto `to` (or its opposite).
    fn snap_axis(&mut self, to: Vec3, from: Vec3, coef: f32) {
        let axis = to.cross(from);
        let len = axis.length();
        if len < 1e-6 {
            return;
        }
        let mut angle = len.min(1.0).asin();
        if coef >= 0.0 {
            angle = -angle;
        }
        let rotation = Quat::from_axis_angle(axis / len, angle);
        self.orientation = (rotation * self.orientation).normalize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::f32::consts::FRAC_PI_2;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn test_coordinates_round_trip() {
        let frame = Frame::new(Vec3::new(1.0, 2.0, 3.0), Quat::from_rotation_y(0.7));
        let p = Vec3::new(-2.0, 0.5, 4.0);
        assert!(approx(frame.inverse_coordinates_of(frame.coordinates_of(p)), p));
        assert!(approx(frame.coordinates_of(frame.position()), Vec3::ZERO));
    }

    #[test]
    fn test_matrix_matches_conversions() {
        let frame = Frame::new(Vec3::new(0.0, 1.0, 0.0), Quat::from_rotation_x(0.3));
        let p = Vec3::new(0.2, -0.4, 1.0);
        assert!(approx(frame.matrix().transform_point3(p), frame.inverse_coordinates_of(p)));
        assert!(approx(frame.inverse_matrix().transform_point3(p), frame.coordinates_of(p)));
    }

    #[test]
    fn test_rotate_around_point_keeps_distance() {
        let mut frame = Frame::new(Vec3::new(0.0, 0.0, 5.0), Quat::IDENTITY);
        frame.rotate_around_point(Quat::from_rotation_y(FRAC_PI_2), Vec3::ZERO);
        assert!((frame.position().length() - 5.0).abs() < 1e-4);
        assert!(approx(frame.position(), Vec3::new(5.0, 0.0, 0.0)));
        // Still looking at the origin along local -Z.
        assert!(approx(frame.inverse_transform_of(Vec3::NEG_Z), Vec3::NEG_X));
    }

    #[test]
    fn test_align_with_world() {
        let mut frame = Frame::new(Vec3::ZERO, Quat::from_rotation_z(0.2) * Quat::from_rotation_x(0.1));
        frame.align_with_frame(None, false, 0.0);
        for axis in [Vec3::X, Vec3::Y, Vec3::Z] {
            let world = frame.inverse_transform_of(axis);
            let aligned = [Vec3::X, Vec3::Y, Vec3::Z]
                .iter()
                .any(|w| (world.dot(*w).abs() - 1.0).abs() < 1e-4);
            assert!(aligned, "axis {axis} not aligned: {world}");
        }
    }

    #[test]
    fn test_align_with_frame_moves_around_center() {
        let pivot = Frame::new(Vec3::new(1.0, 0.0, 0.0), Quat::IDENTITY);
        let mut frame = Frame::new(Vec3::new(1.0, 0.0, 4.0), Quat::from_rotation_y(0.1));
        let before = frame.coordinates_of(pivot.position()).length();
        frame.align_with_frame(Some(&pivot), true, 0.0);
        let after = frame.coordinates_of(pivot.position()).length();
        assert!((before - after).abs() < 1e-4);
        assert!(approx(frame.inverse_transform_of(Vec3::NEG_Z), Vec3::NEG_Z));
    }

    proptest! {
        #[test]
        fn prop_transform_preserves_length(x in -10.0f32..10.0, y in -10.0f32..10.0, z in -10.0f32..10.0, angle in -3.0f32..3.0) {
            let frame = Frame::new(Vec3::new(x, y, z), Quat::from_rotation_z(angle));
            let v = Vec3::new(z, x, y);
            prop_assert!((frame.transform_of(v).length() - v.length()).abs() < 1e-3);
        }
    }
}
