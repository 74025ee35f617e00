//! Model trait.
//!
//! A [`Model`] is a piece of geometry owned by the viewer: a point cloud, a
//! surface mesh or a graph. Renderers and algorithms downcast through
//! [`Model::as_any`] to reach the concrete type.

use std::any::Any;

use glam::Vec3;

use crate::bounding_box::Box3;
use crate::property::PropertyContainer;

/// Geometry that can be loaded, processed and visualized.
pub trait Model: Any + Send + Sync {
    /// Returns a reference to self as `Any` for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Returns a mutable reference to self as `Any` for downcasting.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Returns the name of this model, usually its file name.
    fn name(&self) -> &str;

    /// Renames the model.
    fn set_name(&mut self, name: &str);

    /// Returns the type name (e.g., "`PointCloud`", "`SurfaceMesh`").
    fn type_name(&self) -> &'static str;

    /// Vertex positions.
    fn points(&self) -> &[Vec3];

    /// Vertex properties, including the `v:point` positions.
    fn vertex_properties(&self) -> &PropertyContainer;

    /// Number of vertices.
    fn n_vertices(&self) -> usize {
        self.points().len()
    }

    /// A model without vertices cannot be visualized.
    fn is_empty(&self) -> bool {
        self.n_vertices() == 0
    }

    /// Axis-aligned bounding box of the vertices.
    fn bounding_box(&self) -> Box3 {
        Box3::from_points(self.points())
    }

    /// Element counts and properties, one line each.
    fn property_stats(&self) -> Vec<String> {
        let mut lines = vec![format!("vertex properties ({})", self.n_vertices())];
        lines.extend(
            self.vertex_properties()
                .describe()
                .into_iter()
                .map(|l| format!("    {l}")),
        );
        lines
    }
}
