//! Point clouds.

use std::any::Any;

use glam::Vec3;

use crate::model::Model;
use crate::property::PropertyContainer;

/// A set of points with per-point properties (normals, colors, scalars).
#[derive(Debug, Clone)]
pub struct PointCloud {
    name: String,
    vprops: PropertyContainer,
}

impl PointCloud {
    /// Creates an empty point cloud.
    pub fn new(name: impl Into<String>) -> Self {
        let mut vprops = PropertyContainer::new();
        // A fresh container cannot already hold "v:point".
        let _ = vprops.add("v:point", Vec3::ZERO);
        Self {
            name: name.into(),
            vprops,
        }
    }

    /// Creates a point cloud from positions.
    pub fn from_points(name: impl Into<String>, points: impl IntoIterator<Item = Vec3>) -> Self {
        let mut cloud = Self::new(name);
        for p in points {
            cloud.add_vertex(p);
        }
        cloud
    }

    /// Appends a point and returns its index.
    pub fn add_vertex(&mut self, p: Vec3) -> usize {
        let index = self.vprops.len();
        self.vprops.push();
        if let Some(points) = self.vprops.get_mut::<Vec3>("v:point") {
            points[index] = p;
        }
        index
    }

    /// Mutable positions.
    pub fn points_mut(&mut self) -> &mut [Vec3] {
        self.vprops.get_mut::<Vec3>("v:point").unwrap_or_default()
    }

    /// Per-point normals, when present.
    #[must_use]
    pub fn normals(&self) -> Option<&[Vec3]> {
        self.vprops.get::<Vec3>("v:normal")
    }

    /// Per-point colors, when present.
    #[must_use]
    pub fn colors(&self) -> Option<&[Vec3]> {
        self.vprops.get::<Vec3>("v:color")
    }

    pub fn vertex_properties_mut(&mut self) -> &mut PropertyContainer {
        &mut self.vprops
    }
}

impl Model for PointCloud {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    fn type_name(&self) -> &'static str {
        "PointCloud"
    }

    fn points(&self) -> &[Vec3] {
        self.vprops.get::<Vec3>("v:point").unwrap_or_default()
    }

    fn vertex_properties(&self) -> &PropertyContainer {
        &self.vprops
    }
}
