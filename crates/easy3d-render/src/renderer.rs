//! Per-model renderer.
//!
//! A [`Renderer`] owns the drawables of one model. It creates a default set of
//! drawables when the model is added to a viewer, keeps them in sync with the
//! model, and lists the coloring schemes the model's properties allow.

use easy3d_core::{
    with_settings, Graph, Location, Method, Model, PointCloud, PropertyContainer, PropertyData,
    SurfaceMesh,
};
use glam::Vec4;

use crate::buffer::{self, LOCKED_PROPERTY};
use crate::drawable::{Drawable, DrawableKind};

/// A way a model can be colored, derived from its properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorScheme {
    pub method: Method,
    pub location: Location,
    pub name: String,
}

/// Drawables of one model.
#[derive(Debug, Clone)]
pub struct Renderer {
    visible: bool,
    selected: bool,
    points: Vec<Drawable>,
    lines: Vec<Drawable>,
    triangles: Vec<Drawable>,
}

impl Renderer {
    /// Creates the renderer of `model`, optionally with its default drawables.
    #[must_use]
    pub fn new(model: &dyn Model, create_default_drawables: bool) -> Self {
        let mut renderer = Self {
            visible: true,
            selected: false,
            points: Vec::new(),
            lines: Vec::new(),
            triangles: Vec::new(),
        };
        if create_default_drawables {
            renderer.create_default_drawables(model);
        }
        renderer
    }

    fn create_default_drawables(&mut self, model: &dyn Model) {
        let any = model.as_any();
        if let Some(cloud) = any.downcast_ref::<PointCloud>() {
            self.create_point_cloud_drawables(cloud);
        } else if let Some(mesh) = any.downcast_ref::<SurfaceMesh>() {
            self.create_mesh_drawables(mesh);
        } else if let Some(graph) = any.downcast_ref::<Graph>() {
            self.create_graph_drawables(graph);
        } else {
            log::warn!("no default drawables for model type {}", model.type_name());
        }
        self.update(model);
    }

    fn create_point_cloud_drawables(&mut self, cloud: &PointCloud) {
        let (color, size) =
            with_settings(|s| (s.point_cloud_vertices_color, s.point_cloud_point_size));
        let vertices = self.add_points_drawable("vertices");
        vertices.set_point_size(size);
        vertices.state_mut().set_uniform_coloring(color);
        if cloud.colors().is_some() {
            vertices
                .state_mut()
                .set_property_coloring(Location::Vertex, "v:color");
        }
    }

    fn create_mesh_drawables(&mut self, mesh: &SurfaceMesh) {
        let s = easy3d_core::settings();

        let faces = self.add_triangles_drawable("faces");
        faces.set_smooth_shading(s.surface_mesh_faces_smooth_shading);
        faces.state_mut().set_uniform_coloring(s.surface_mesh_faces_color);
        if mesh.face_properties().get::<glam::Vec3>("f:color").is_some() {
            faces
                .state_mut()
                .set_property_coloring(Location::Face, "f:color");
        } else if mesh.vertex_properties().get::<glam::Vec3>("v:color").is_some() {
            faces
                .state_mut()
                .set_property_coloring(Location::Vertex, "v:color");
        }

        let vertices = self.add_points_drawable("vertices");
        vertices.set_point_size(s.surface_mesh_vertices_point_size);
        vertices
            .state_mut()
            .set_uniform_coloring(s.surface_mesh_vertices_color);
        vertices.set_visible(false);

        let edges = self.add_lines_drawable("edges");
        edges.set_line_width(s.surface_mesh_edges_line_width);
        edges.state_mut().set_uniform_coloring(s.surface_mesh_edges_color);
        edges.set_visible(false);

        let borders = self.add_lines_drawable("borders");
        borders.set_line_width(s.surface_mesh_borders_line_width);
        borders
            .state_mut()
            .set_uniform_coloring(s.surface_mesh_borders_color);
        borders.set_visible(false);

        if mesh.vertex_properties().get::<bool>(LOCKED_PROPERTY).is_some() {
            let locks = self.add_points_drawable("locks");
            locks.set_point_size(s.surface_mesh_locks_point_size);
            locks.state_mut().set_uniform_coloring(s.surface_mesh_locks_color);
            locks.set_visible(false);
        }
    }

    fn create_graph_drawables(&mut self, graph: &Graph) {
        let s = easy3d_core::settings();

        let vertices = self.add_points_drawable("vertices");
        vertices.set_point_size(s.graph_vertices_point_size);
        vertices.state_mut().set_uniform_coloring(s.graph_vertices_color);
        if graph.vertex_properties().get::<glam::Vec3>("v:color").is_some() {
            vertices
                .state_mut()
                .set_property_coloring(Location::Vertex, "v:color");
        }

        let edges = self.add_lines_drawable("edges");
        edges.set_line_width(s.graph_edges_line_width);
        edges.state_mut().set_uniform_coloring(s.graph_edges_color);
        if graph.edge_properties().get::<glam::Vec3>("e:color").is_some() {
            edges
                .state_mut()
                .set_property_coloring(Location::Edge, "e:color");
        }
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    #[must_use]
    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }

    fn list_mut(&mut self, kind: DrawableKind) -> &mut Vec<Drawable> {
        match kind {
            DrawableKind::Points => &mut self.points,
            DrawableKind::Lines => &mut self.lines,
            DrawableKind::Triangles => &mut self.triangles,
        }
    }

    /// Adds a drawable, or returns the existing one with the same name and kind.
    fn add_drawable(&mut self, name: &str, kind: DrawableKind) -> &mut Drawable {
        let list = self.list_mut(kind);
        if let Some(i) = list.iter().position(|d| d.name() == name) {
            log::warn!("{kind:?} drawable '{name}' already exists");
            return &mut list[i];
        }
        list.push(Drawable::new(name, kind));
        let last = list.len() - 1;
        &mut list[last]
    }

    pub fn add_points_drawable(&mut self, name: &str) -> &mut Drawable {
        self.add_drawable(name, DrawableKind::Points)
    }

    pub fn add_lines_drawable(&mut self, name: &str) -> &mut Drawable {
        self.add_drawable(name, DrawableKind::Lines)
    }

    pub fn add_triangles_drawable(&mut self, name: &str) -> &mut Drawable {
        self.add_drawable(name, DrawableKind::Triangles)
    }

    #[must_use]
    pub fn get_points_drawable(&self, name: &str) -> Option<&Drawable> {
        self.points.iter().find(|d| d.name() == name)
    }

    #[must_use]
    pub fn get_lines_drawable(&self, name: &str) -> Option<&Drawable> {
        self.lines.iter().find(|d| d.name() == name)
    }

    #[must_use]
    pub fn get_triangles_drawable(&self, name: &str) -> Option<&Drawable> {
        self.triangles.iter().find(|d| d.name() == name)
    }

    pub fn get_points_drawable_mut(&mut self, name: &str) -> Option<&mut Drawable> {
        self.points.iter_mut().find(|d| d.name() == name)
    }

    pub fn get_lines_drawable_mut(&mut self, name: &str) -> Option<&mut Drawable> {
        self.lines.iter_mut().find(|d| d.name() == name)
    }

    pub fn get_triangles_drawable_mut(&mut self, name: &str) -> Option<&mut Drawable> {
        self.triangles.iter_mut().find(|d| d.name() == name)
    }

    #[must_use]
    pub fn points_drawables(&self) -> &[Drawable] {
        &self.points
    }

    #[must_use]
    pub fn lines_drawables(&self) -> &[Drawable] {
        &self.lines
    }

    #[must_use]
    pub fn triangles_drawables(&self) -> &[Drawable] {
        &self.triangles
    }

    /// All drawables, triangles first so that lines and points draw on top.
    pub fn drawables(&self) -> impl Iterator<Item = &Drawable> {
        self.triangles.iter().chain(&self.lines).chain(&self.points)
    }

    pub fn drawables_mut(&mut self) -> impl Iterator<Item = &mut Drawable> {
        self.triangles
            .iter_mut()
            .chain(&mut self.lines)
            .chain(&mut self.points)
    }

    /// Rebuilds every drawable from the model.
    pub fn update(&mut self, model: &dyn Model) {
        for d in self.drawables_mut() {
            buffer::update(model, d);
        }
    }

    /// Rebuilds the drawables whose state or model changed.
    pub fn update_if_needed(&mut self, model: &dyn Model) {
        for d in self.drawables_mut().filter(|d| d.update_needed()) {
            buffer::update(model, d);
        }
    }

    /// Marks every drawable for rebuilding, e.g. after the model was edited.
    pub fn set_update_needed(&mut self) {
        for d in self.drawables_mut() {
            d.set_update_needed(true);
        }
    }

    /// Coloring schemes offered by the model's properties, uniform coloring first.
    #[must_use]
    pub fn color_schemes(model: &dyn Model) -> Vec<ColorScheme> {
        const INTERNAL: [&str; 3] = ["v:point", "v:normal", "f:normal"];

        let mut schemes = vec![ColorScheme {
            method: Method::UniformColor,
            location: Location::Vertex,
            name: "uniform color".to_string(),
        }];
        let any = model.as_any();
        let mut containers: Vec<(Location, &PropertyContainer)> =
            vec![(Location::Vertex, model.vertex_properties())];
        if let Some(mesh) = any.downcast_ref::<SurfaceMesh>() {
            containers.push((Location::Face, mesh.face_properties()));
            containers.push((Location::Edge, mesh.edge_properties()));
            containers.push((Location::Halfedge, mesh.halfedge_properties()));
        } else if let Some(graph) = any.downcast_ref::<Graph>() {
            containers.push((Location::Edge, graph.edge_properties()));
        }

        for (location, container) in containers {
            for name in container.names() {
                if INTERNAL.contains(&name) {
                    continue;
                }
                let method = match container.data(name) {
                    Some(PropertyData::Vec3(_)) if name.contains("color") => Method::ColorProperty,
                    Some(PropertyData::Vec2(_)) => Method::Textured,
                    Some(PropertyData::Float(_) | PropertyData::Int(_) | PropertyData::Bool(_)) => {
                        Method::ScalarField
                    }
                    _ => continue,
                };
                schemes.push(ColorScheme {
                    method,
                    location,
                    name: name.to_string(),
                });
            }
        }
        schemes
    }

    /// Highlights the primitives `[lo, hi]` of the faces drawable (or clears it).
    pub fn highlight_faces(&mut self, range: Option<(i32, i32)>) {
        if let Some(faces) = self.get_triangles_drawable_mut("faces") {
            let state = faces.state_mut();
            state.set_highlight(range.is_some());
            state.set_highlight_range(range.unwrap_or((-1, -1)));
        }
    }

    /// Uniform color of a named drawable, if it exists.
    #[must_use]
    pub fn drawable_color(&self, name: &str) -> Option<Vec4> {
        self.drawables()
            .find(|d| d.name() == name)
            .map(|d| d.state().color())
    }
}
