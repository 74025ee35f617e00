//! Building drawable buffers from models.
//!
//! [`update`] fills a drawable's vertex buffers from its model according to the
//! drawable's coloring state. Triangles and lines are expanded per corner, so a
//! face or edge property can color its primitive without an element buffer.
//! A coloring property that does not exist (or has the wrong type) is reported
//! and the drawable falls back to uniform coloring.

use easy3d_core::{
    Graph, Location, Method, Model, PointCloud, PropertyContainer, PropertyData, SurfaceMesh,
};
use glam::{Vec2, Vec3};

use crate::drawable::{Drawable, DrawableKind};

/// Property marking vertices that must not move (shown by the `locks` drawable).
pub const LOCKED_PROPERTY: &str = "v:locked";

/// Values of a scalar property as `f32`. Booleans map to 0 and 1.
#[must_use]
pub fn scalar_values(container: &PropertyContainer, name: &str) -> Option<Vec<f32>> {
    match container.data(name)? {
        PropertyData::Float(v) => Some(v.clone()),
        PropertyData::Int(v) => Some(v.iter().map(|&x| x as f32).collect()),
        PropertyData::Bool(v) => Some(v.iter().map(|&b| if b { 1.0 } else { 0.0 }).collect()),
        PropertyData::Vec2(_) | PropertyData::Vec3(_) => None,
    }
}

/// Range used to map scalar values to `[0, 1]`.
///
/// With clamping, the lowest `lower` and highest `upper` fractions of the
/// sorted values are cut off.
#[must_use]
pub fn scalar_range(values: &[f32], clamp: bool, lower: f32, upper: f32) -> (f32, f32) {
    let mut sorted: Vec<f32> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return (0.0, 0.0);
    }
    sorted.sort_by(f32::total_cmp);
    let n = sorted.len();
    if !clamp {
        return (sorted[0], sorted[n - 1]);
    }
    // The small offset keeps exact products such as 100 * 0.95 from rounding down.
    let index = |fraction: f32| (n as f32 * fraction + 1e-3) as usize;
    let lo = index(lower.clamp(0.0, 1.0)).min(n - 1);
    let hi = index(1.0 - upper.clamp(0.0, 1.0))
        .saturating_sub(1)
        .min(n - 1)
        .max(lo);
    (sorted[lo], sorted[hi])
}

/// Maps scalar values to 1D texture coordinates in `[0, 1]`.
///
/// A degenerate range maps every value to 0.5.
#[must_use]
pub fn scalar_to_texcoords(values: &[f32], clamp: bool, lower: f32, upper: f32) -> Vec<f32> {
    let (min, max) = scalar_range(values, clamp, lower, upper);
    let span = max - min;
    values
        .iter()
        .map(|&v| {
            if span.abs() < f32::EPSILON || !v.is_finite() {
                0.5
            } else {
                ((v - min) / span).clamp(0.0, 1.0)
            }
        })
        .collect()
}

/// Per-element attribute resolved from the drawable state.
enum Coloring {
    Uniform,
    Colors(Vec<Vec3>),
    Texcoords(Vec<Vec2>),
}

/// Resolves the color or texture coordinate array for a location.
///
/// `container` holds the properties of the state's location.
fn resolve(drawable: &Drawable, container: Option<&PropertyContainer>) -> Option<Coloring> {
    let state = drawable.state();
    let name = state.property_name();
    match state.coloring_method() {
        Method::UniformColor => Some(Coloring::Uniform),
        Method::ColorProperty => container?
            .get::<Vec3>(name)
            .map(|c| Coloring::Colors(c.to_vec())),
        Method::Textured => container?
            .get::<Vec2>(name)
            .map(|t| Coloring::Texcoords(t.to_vec())),
        Method::ScalarField => {
            let values = scalar_values(container?, name)?;
            let u = scalar_to_texcoords(
                &values,
                state.clamp_range(),
                state.clamp_lower(),
                state.clamp_upper(),
            );
            Some(Coloring::Texcoords(
                u.into_iter().map(|u| Vec2::new(u, 0.5)).collect(),
            ))
        }
    }
}

fn resolve_or_uniform(
    model: &dyn Model,
    drawable: &mut Drawable,
    container: Option<&PropertyContainer>,
) -> Coloring {
    if let Some(c) = resolve(drawable, container) {
        return c;
    }
    let state = drawable.state();
    log::warn!(
        "{}: {:?} property '{}' not found on {:?} for drawable '{}', using uniform color",
        model.name(),
        state.coloring_method(),
        state.property_name(),
        state.property_location(),
        drawable.name()
    );
    let color = state.color();
    drawable.state_mut().set_uniform_coloring(color);
    Coloring::Uniform
}

/// Writes per-corner color or texcoord buffers; `corners` holds the element of each corner.
fn write_coloring(drawable: &mut Drawable, coloring: &Coloring, corners: &[usize]) {
    match coloring {
        Coloring::Uniform => {
            drawable.update_color_buffer(Vec::new());
            drawable.update_texcoord_buffer(Vec::new());
        }
        Coloring::Colors(c) => {
            let colors = corners
                .iter()
                .map(|&i| c.get(i).copied().unwrap_or(Vec3::ZERO))
                .collect();
            drawable.update_color_buffer(colors);
            drawable.update_texcoord_buffer(Vec::new());
        }
        Coloring::Texcoords(t) => {
            let texcoords = corners
                .iter()
                .map(|&i| t.get(i).copied().unwrap_or(Vec2::ZERO))
                .collect();
            drawable.update_texcoord_buffer(texcoords);
            drawable.update_color_buffer(Vec::new());
        }
    }
}

/// Rebuilds the buffers of `drawable` from `model`.
///
/// The drawable's kind and name select what is extracted: for surface meshes
/// a `borders` line drawable takes only border edges and a `locks` point
/// drawable only the vertices flagged in `v:locked`.
pub fn update(model: &dyn Model, drawable: &mut Drawable) {
    let any = model.as_any();
    if let Some(cloud) = any.downcast_ref::<PointCloud>() {
        match drawable.kind() {
            DrawableKind::Points => update_point_cloud_points(cloud, drawable),
            kind => log::warn!("point cloud cannot feed a {kind:?} drawable"),
        }
    } else if let Some(mesh) = any.downcast_ref::<SurfaceMesh>() {
        match drawable.kind() {
            DrawableKind::Triangles => update_mesh_triangles(mesh, drawable),
            DrawableKind::Lines => {
                let edges = if drawable.name() == "borders" {
                    mesh.border_edges()
                } else {
                    (0..mesh.n_edges()).collect()
                };
                update_mesh_edges(mesh, drawable, &edges);
            }
            DrawableKind::Points => {
                let vertices: Vec<usize> = if drawable.name() == "locks" {
                    mesh.vertex_properties()
                        .get::<bool>(LOCKED_PROPERTY)
                        .map(|locked| (0..locked.len()).filter(|&v| locked[v]).collect())
                        .unwrap_or_default()
                } else {
                    (0..mesh.n_vertices()).collect()
                };
                update_mesh_points(mesh, drawable, &vertices);
            }
        }
    } else if let Some(graph) = any.downcast_ref::<Graph>() {
        match drawable.kind() {
            DrawableKind::Points => update_graph_points(graph, drawable),
            DrawableKind::Lines => update_graph_edges(graph, drawable),
            DrawableKind::Triangles => log::warn!("graph cannot feed a triangles drawable"),
        }
    } else {
        log::warn!("unknown model type {}", model.type_name());
    }
    drawable.set_update_needed(false);
}

fn vertex_container<'a>(
    drawable: &Drawable,
    vprops: &'a PropertyContainer,
) -> Option<&'a PropertyContainer> {
    (drawable.state().property_location() == Location::Vertex).then_some(vprops)
}

/// Points of a point cloud, with normals and vertex colors when present.
pub fn update_point_cloud_points(cloud: &PointCloud, drawable: &mut Drawable) {
    let n = cloud.n_vertices();
    let corners: Vec<usize> = (0..n).collect();
    let container = vertex_container(drawable, cloud.vertex_properties());
    let coloring = resolve_or_uniform(cloud, drawable, container);
    drawable.update_vertex_buffer(cloud.points().to_vec());
    drawable.update_normal_buffer(cloud.normals().map(<[Vec3]>::to_vec).unwrap_or_default());
    drawable.update_element_buffer(Vec::new());
    drawable.update_element_ids(corners.iter().map(|&v| v as u32).collect());
    write_coloring(drawable, &coloring, &corners);
}

fn smooth_vertex_normals(mesh: &SurfaceMesh) -> Vec<Vec3> {
    if let Some(n) = mesh.vertex_properties().get::<Vec3>("v:normal") {
        return n.to_vec();
    }
    let mut normals = vec![Vec3::ZERO; mesh.n_vertices()];
    for f in 0..mesh.n_faces() {
        let n = mesh.face_normal(f) * mesh.face_area(f);
        for &v in mesh.face_vertices(f) {
            normals[v] += n;
        }
    }
    normals.iter().map(|n| n.normalize_or_zero()).collect()
}

/// Fan-triangulated faces, one vertex per triangle corner.
pub fn update_mesh_triangles(mesh: &SurfaceMesh, drawable: &mut Drawable) {
    let location = drawable.state().property_location();
    let container = match location {
        Location::Vertex => Some(mesh.vertex_properties()),
        Location::Face => Some(mesh.face_properties()),
        Location::Halfedge => Some(mesh.halfedge_properties()),
        Location::Edge => None,
    };
    let coloring = resolve_or_uniform(mesh, drawable, container);

    let points = mesh.points();
    let smooth = drawable.smooth_shading();
    let vertex_normals = if smooth {
        smooth_vertex_normals(mesh)
    } else {
        Vec::new()
    };

    let capacity = 3 * mesh.n_halfedges();
    let mut vertices = Vec::with_capacity(capacity);
    let mut normals = Vec::with_capacity(capacity);
    let mut corners = Vec::with_capacity(capacity);
    let mut ids = Vec::new();
    for f in 0..mesh.n_faces() {
        let face = mesh.face_vertices(f);
        let face_normal = mesh.face_normal(f);
        for k in 1..face.len() - 1 {
            for corner in [0, k, k + 1] {
                let v = face[corner];
                vertices.push(points[v]);
                normals.push(if smooth { vertex_normals[v] } else { face_normal });
                corners.push(match location {
                    Location::Vertex | Location::Edge => v,
                    Location::Face => f,
                    Location::Halfedge => mesh.halfedge(f, corner),
                });
            }
            ids.push(f as u32);
        }
    }

    drawable.update_vertex_buffer(vertices);
    drawable.update_normal_buffer(normals);
    drawable.update_element_buffer(Vec::new());
    drawable.update_element_ids(ids);
    write_coloring(drawable, &coloring, &corners);
}

fn edge_container<'a>(
    drawable: &Drawable,
    vprops: &'a PropertyContainer,
    eprops: &'a PropertyContainer,
) -> Option<&'a PropertyContainer> {
    match drawable.state().property_location() {
        Location::Vertex => Some(vprops),
        Location::Edge => Some(eprops),
        Location::Face | Location::Halfedge => None,
    }
}

fn write_lines(
    drawable: &mut Drawable,
    coloring: &Coloring,
    points: &[Vec3],
    edges: &[[usize; 2]],
    edge_ids: &[usize],
) {
    let by_vertex = drawable.state().property_location() == Location::Vertex;
    let mut vertices = Vec::with_capacity(2 * edges.len());
    let mut corners = Vec::with_capacity(2 * edges.len());
    for (&[a, b], &e) in edges.iter().zip(edge_ids) {
        vertices.push(points[a]);
        vertices.push(points[b]);
        if by_vertex {
            corners.extend([a, b]);
        } else {
            corners.extend([e, e]);
        }
    }
    drawable.update_vertex_buffer(vertices);
    drawable.update_normal_buffer(Vec::new());
    drawable.update_element_buffer(Vec::new());
    drawable.update_element_ids(edge_ids.iter().map(|&e| e as u32).collect());
    write_coloring(drawable, coloring, &corners);
}

/// The selected edges of a mesh as line segments.
pub fn update_mesh_edges(mesh: &SurfaceMesh, drawable: &mut Drawable, edge_ids: &[usize]) {
    let container = edge_container(drawable, mesh.vertex_properties(), mesh.edge_properties());
    let coloring = resolve_or_uniform(mesh, drawable, container);
    let edges: Vec<[usize; 2]> = edge_ids.iter().map(|&e| mesh.edges()[e]).collect();
    write_lines(drawable, &coloring, mesh.points(), &edges, edge_ids);
}

fn write_points(
    drawable: &mut Drawable,
    coloring: &Coloring,
    points: &[Vec3],
    normals: Option<&[Vec3]>,
    selection: &[usize],
) {
    drawable.update_vertex_buffer(selection.iter().map(|&v| points[v]).collect());
    drawable.update_normal_buffer(
        normals
            .map(|n| selection.iter().map(|&v| n[v]).collect())
            .unwrap_or_default(),
    );
    drawable.update_element_buffer(Vec::new());
    drawable.update_element_ids(selection.iter().map(|&v| v as u32).collect());
    write_coloring(drawable, coloring, selection);
}

/// The selected vertices of a mesh as points.
pub fn update_mesh_points(mesh: &SurfaceMesh, drawable: &mut Drawable, vertices: &[usize]) {
    let container = vertex_container(drawable, mesh.vertex_properties());
    let coloring = resolve_or_uniform(mesh, drawable, container);
    let normals = mesh.vertex_properties().get::<Vec3>("v:normal");
    write_points(drawable, &coloring, mesh.points(), normals, vertices);
}

/// Graph vertices as points.
pub fn update_graph_points(graph: &Graph, drawable: &mut Drawable) {
    let container = vertex_container(drawable, graph.vertex_properties());
    let coloring = resolve_or_uniform(graph, drawable, container);
    let all: Vec<usize> = (0..graph.n_vertices()).collect();
    write_points(drawable, &coloring, graph.points(), None, &all);
}

/// Graph edges as line segments.
pub fn update_graph_edges(graph: &Graph, drawable: &mut Drawable) {
    let container = edge_container(drawable, graph.vertex_properties(), graph.edge_properties());
    let coloring = resolve_or_uniform(graph, drawable, container);
    let ids: Vec<usize> = (0..graph.n_edges()).collect();
    write_lines(drawable, &coloring, graph.points(), graph.edges(), &ids);
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn quad_mesh() -> SurfaceMesh {
        SurfaceMesh::from_polygons(
            "quad",
            vec![
                Vec3::ZERO,
                Vec3::X,
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::Y,
            ],
            &[vec![0, 1, 2, 3]],
        )
        .unwrap()
    }

    #[test]
    fn test_scalar_range_clamps_outliers() {
        let mut values: Vec<f32> = (0..100).map(|i| i as f32).collect();
        values[99] = 1.0e6;
        let (min, max) = scalar_range(&values, true, 0.05, 0.05);
        assert!((min - 5.0).abs() < f32::EPSILON);
        assert!((max - 94.0).abs() < f32::EPSILON);
        let (min, max) = scalar_range(&values, false, 0.05, 0.05);
        assert!(min.abs() < f32::EPSILON);
        assert!((max - 1.0e6).abs() < 1.0);
    }

    #[test]
    fn test_degenerate_range_maps_to_half() {
        let u = scalar_to_texcoords(&[3.0, 3.0, 3.0], true, 0.05, 0.05);
        assert!(u.iter().all(|&x| (x - 0.5).abs() < f32::EPSILON));
    }

    #[test]
    fn test_mesh_triangles_uniform() {
        let mesh = quad_mesh();
        let mut d = Drawable::new("faces", DrawableKind::Triangles);
        update(&mesh, &mut d);
        assert_eq!(d.num_vertices(), 6);
        assert_eq!(d.num_primitives(), 2);
        assert_eq!(d.element_ids(), &[0, 0]);
        assert!(d.colors().is_empty());
        assert!(d.normals().iter().all(|n| (*n - Vec3::Z).length() < 1e-6));
        assert!(!d.update_needed());
    }

    #[test]
    fn test_face_color_property() {
        let mut mesh = quad_mesh();
        mesh.face_properties_mut()
            .set("f:color", vec![Vec3::new(1.0, 0.0, 0.0)])
            .unwrap();
        let mut d = Drawable::new("faces", DrawableKind::Triangles);
        d.state_mut().set_property_coloring(Location::Face, "f:color");
        update(&mesh, &mut d);
        assert_eq!(d.colors().len(), 6);
        assert!(d.colors().iter().all(|c| *c == Vec3::X));
    }

    #[test]
    fn test_missing_property_falls_back_to_uniform() {
        let mesh = quad_mesh();
        let mut d = Drawable::new("faces", DrawableKind::Triangles);
        d.state_mut().set_property_coloring(Location::Vertex, "v:nothing");
        update(&mesh, &mut d);
        assert_eq!(d.state().coloring_method(), Method::UniformColor);
        assert!(d.colors().is_empty());
    }

    #[test]
    fn test_vertex_scalar_field() {
        let mut mesh = quad_mesh();
        mesh.vertex_properties_mut()
            .set("v:height", vec![0.0f32, 1.0, 2.0, 3.0])
            .unwrap();
        let mut d = Drawable::new("faces", DrawableKind::Triangles);
        d.state_mut()
            .set_scalar_coloring(Location::Vertex, "v:height", None, 0.0, 0.0);
        d.state_mut().set_clamp_range(false);
        update(&mesh, &mut d);
        let u: Vec<f32> = d.texcoords().iter().map(|t| t.x).collect();
        // Corners of the first fan triangle are vertices 0, 1, 2
        assert!((u[0] - 0.0).abs() < 1e-6);
        assert!((u[1] - 1.0 / 3.0).abs() < 1e-6);
        assert!((u[2] - 2.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_borders_and_locks() {
        let mut mesh = quad_mesh();
        mesh.vertex_properties_mut()
            .set(LOCKED_PROPERTY, vec![true, false, false, true])
            .unwrap();
        let mut borders = Drawable::new("borders", DrawableKind::Lines);
        update(&mesh, &mut borders);
        assert_eq!(borders.num_primitives(), 4);
        let mut locks = Drawable::new("locks", DrawableKind::Points);
        update(&mesh, &mut locks);
        assert_eq!(locks.vertices(), &[Vec3::ZERO, Vec3::Y]);
    }

    #[test]
    fn test_graph_edge_colors() {
        let mut graph = Graph::new("g");
        graph.add_vertex(Vec3::ZERO);
        graph.add_vertex(Vec3::X);
        graph.add_edge(0, 1).unwrap();
        graph
            .edge_properties_mut()
            .set("e:color", vec![Vec3::Y])
            .unwrap();
        let mut d = Drawable::new("edges", DrawableKind::Lines);
        d.state_mut().set_property_coloring(Location::Edge, "e:color");
        update(&graph, &mut d);
        assert_eq!(d.colors(), &[Vec3::Y, Vec3::Y]);
    }

    proptest! {
        #[test]
        fn prop_texcoords_in_unit_range(values in proptest::collection::vec(-1.0e3f32..1.0e3, 1..64)) {
            let u = scalar_to_texcoords(&values, true, 0.05, 0.05);
            prop_assert_eq!(u.len(), values.len());
            prop_assert!(u.iter().all(|&x| (0.0..=1.0).contains(&x)));
        }
    }
}
