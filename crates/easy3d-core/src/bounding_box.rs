//! Axis-aligned bounding boxes.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// An axis-aligned box. A freshly created box is empty (invalid) until it grows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Box3 {
    min: Vec3,
    max: Vec3,
}

impl Default for Box3 {
    fn default() -> Self {
        Self::new()
    }
}

impl Box3 {
    /// Creates an empty box.
    #[must_use]
    pub fn new() -> Self {
        Self {
            min: Vec3::splat(f32::MAX),
            max: Vec3::splat(f32::MIN),
        }
    }

    /// Creates a box from two corners, in any order.
    #[must_use]
    pub fn from_corners(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Creates the smallest box containing all points.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Vec3>) -> Self {
        let mut bbox = Self::new();
        for p in points {
            bbox.grow(*p);
        }
        bbox
    }

    /// Returns whether the box contains at least one point.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y && self.min.z <= self.max.z
    }

    /// Resets the box to empty.
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    /// Extends the box to contain `p`.
    pub fn grow(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    /// Extends the box to contain `other`.
    pub fn grow_box(&mut self, other: &Box3) {
        if other.is_valid() {
            self.grow(other.min);
            self.grow(other.max);
        }
    }

    #[must_use]
    pub fn min_point(&self) -> Vec3 {
        self.min
    }

    #[must_use]
    pub fn max_point(&self) -> Vec3 {
        self.max
    }

    #[must_use]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Vector from the min corner to the max corner.
    #[must_use]
    pub fn diagonal_vector(&self) -> Vec3 {
        self.max - self.min
    }

    #[must_use]
    pub fn diagonal_length(&self) -> f32 {
        self.diagonal_vector().length()
    }

    /// Radius of the bounding sphere centered at [`Box3::center`].
    #[must_use]
    pub fn radius(&self) -> f32 {
        self.diagonal_length() * 0.5
    }

    /// Extent along one axis (0 = x, 1 = y, 2 = z).
    #[must_use]
    pub fn range(&self, axis: usize) -> f32 {
        self.max[axis] - self.min[axis]
    }

    /// Returns whether `p` lies inside or on the boundary.
    #[must_use]
    pub fn contains(&self, p: Vec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    /// The eight corners of the box.
    #[must_use]
    pub fn corners(&self) -> [Vec3; 8] {
        let (a, b) = (self.min, self.max);
        [
            Vec3::new(a.x, a.y, a.z),
            Vec3::new(b.x, a.y, a.z),
            Vec3::new(a.x, b.y, a.z),
            Vec3::new(b.x, b.y, a.z),
            Vec3::new(a.x, a.y, b.z),
            Vec3::new(b.x, a.y, b.z),
            Vec3::new(a.x, b.y, b.z),
            Vec3::new(b.x, b.y, b.z),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_box_is_invalid() {
        let bbox = Box3::new();
        assert!(!bbox.is_valid());
    }

    #[test]
    fn test_grow_and_measure() {
        let points = [Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0), Vec3::new(0.0, 2.0, 2.0)];
        let bbox = Box3::from_points(&points);
        assert!(bbox.is_valid());
        assert_eq!(bbox.center(), Vec3::new(1.0, 1.0, 1.0));
        assert!((bbox.radius() - 3.0_f32.sqrt()).abs() < 1e-6);
        assert!(bbox.contains(Vec3::ONE));
        assert!(!bbox.contains(Vec3::splat(3.0)));
    }

    #[test]
    fn test_grow_box_ignores_invalid() {
        let mut bbox = Box3::from_corners(Vec3::ZERO, Vec3::ONE);
        bbox.grow_box(&Box3::new());
        assert_eq!(bbox.max_point(), Vec3::ONE);
        bbox.grow_box(&Box3::from_corners(Vec3::splat(-1.0), Vec3::ZERO));
        assert_eq!(bbox.min_point(), Vec3::splat(-1.0));
    }
}
