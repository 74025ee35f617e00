//! Polygonal surface meshes.
//!
//! Faces are stored as vertex index loops. Undirected edges are derived from the
//! faces, and every face corner is a halfedge running from the corner vertex to
//! the next vertex of the loop. Each element kind has its own
//! [`PropertyContainer`], so properties can live on vertices (`v:`), faces
//! (`f:`), edges (`e:`) or halfedges (`h:`).

use std::any::Any;
use std::collections::HashMap;

use glam::Vec3;

use crate::error::{Easy3dError, Result};
use crate::model::Model;
use crate::property::PropertyContainer;

/// A polygonal surface mesh.
#[derive(Debug, Clone)]
pub struct SurfaceMesh {
    name: String,
    vprops: PropertyContainer,
    fprops: PropertyContainer,
    eprops: PropertyContainer,
    hprops: PropertyContainer,
    faces: Vec<Vec<usize>>,
    face_offsets: Vec<usize>,
    /// (face, corner) of every halfedge.
    halfedges: Vec<(usize, usize)>,
    edges: Vec<[usize; 2]>,
    edge_lookup: HashMap<(usize, usize), usize>,
    edge_faces: Vec<Vec<usize>>,
    vertex_faces: Vec<Vec<usize>>,
    vertex_edges: Vec<Vec<usize>>,
}

impl SurfaceMesh {
    /// Creates an empty mesh.
    pub fn new(name: impl Into<String>) -> Self {
        let mut vprops = PropertyContainer::new();
        let _ = vprops.add("v:point", Vec3::ZERO);
        Self {
            name: name.into(),
            vprops,
            fprops: PropertyContainer::new(),
            eprops: PropertyContainer::new(),
            hprops: PropertyContainer::new(),
            faces: Vec::new(),
            face_offsets: Vec::new(),
            halfedges: Vec::new(),
            edges: Vec::new(),
            edge_lookup: HashMap::new(),
            edge_faces: Vec::new(),
            vertex_faces: Vec::new(),
            vertex_edges: Vec::new(),
        }
    }

    /// Creates a mesh from positions and polygons.
    pub fn from_polygons<F>(
        name: impl Into<String>,
        points: impl IntoIterator<Item = Vec3>,
        faces: impl IntoIterator<Item = F>,
    ) -> Result<Self>
    where
        F: AsRef<[usize]>,
    {
        let mut mesh = Self::new(name);
        for p in points {
            mesh.add_vertex(p);
        }
        for f in faces {
            mesh.add_face(f.as_ref())?;
        }
        Ok(mesh)
    }

    /// Appends a vertex and returns its index.
    pub fn add_vertex(&mut self, p: Vec3) -> usize {
        let index = self.vprops.len();
        self.vprops.push();
        if let Some(points) = self.vprops.get_mut::<Vec3>("v:point") {
            points[index] = p;
        }
        self.vertex_faces.push(Vec::new());
        self.vertex_edges.push(Vec::new());
        index
    }

    /// Appends a polygon given by its vertex loop and returns its index.
    ///
    /// The loop needs at least three distinct, existing vertices.
    pub fn add_face(&mut self, vertices: &[usize]) -> Result<usize> {
        if vertices.len() < 3 {
            return Err(Easy3dError::InvalidFace(format!(
                "{} vertices, need at least 3",
                vertices.len()
            )));
        }
        let n = self.n_vertices();
        if let Some(&v) = vertices.iter().find(|&&v| v >= n) {
            return Err(Easy3dError::InvalidFace(format!(
                "vertex {v} out of range ({n} vertices)"
            )));
        }
        for (i, v) in vertices.iter().enumerate() {
            if vertices[i + 1..].contains(v) {
                return Err(Easy3dError::InvalidFace(format!("vertex {v} repeated")));
            }
        }

        let f = self.faces.len();
        self.face_offsets.push(self.halfedges.len());
        for k in 0..vertices.len() {
            let a = vertices[k];
            let b = vertices[(k + 1) % vertices.len()];
            let e = self.find_or_add_edge(a, b);
            self.edge_faces[e].push(f);
            self.vertex_faces[a].push(f);
            self.halfedges.push((f, k));
            self.hprops.push();
        }
        self.faces.push(vertices.to_vec());
        self.fprops.push();
        Ok(f)
    }

    pub fn add_triangle(&mut self, a: usize, b: usize, c: usize) -> Result<usize> {
        self.add_face(&[a, b, c])
    }

    pub fn add_quad(&mut self, a: usize, b: usize, c: usize, d: usize) -> Result<usize> {
        self.add_face(&[a, b, c, d])
    }

    fn find_or_add_edge(&mut self, a: usize, b: usize) -> usize {
        let key = (a.min(b), a.max(b));
        if let Some(&e) = self.edge_lookup.get(&key) {
            return e;
        }
        let e = self.edges.len();
        self.edges.push([key.0, key.1]);
        self.edge_lookup.insert(key, e);
        self.edge_faces.push(Vec::new());
        self.vertex_edges[a].push(e);
        self.vertex_edges[b].push(e);
        self.eprops.push();
        e
    }

    #[must_use]
    pub fn n_faces(&self) -> usize {
        self.faces.len()
    }

    #[must_use]
    pub fn n_edges(&self) -> usize {
        self.edges.len()
    }

    #[must_use]
    pub fn n_halfedges(&self) -> usize {
        self.halfedges.len()
    }

    /// Vertex loops of all faces.
    #[must_use]
    pub fn faces(&self) -> &[Vec<usize>] {
        &self.faces
    }

    #[must_use]
    pub fn face_vertices(&self, f: usize) -> &[usize] {
        &self.faces[f]
    }

    /// Undirected edges as (smaller, larger) vertex index pairs.
    #[must_use]
    pub fn edges(&self) -> &[[usize; 2]] {
        &self.edges
    }

    /// Index of the edge joining `a` and `b`.
    #[must_use]
    pub fn find_edge(&self, a: usize, b: usize) -> Option<usize> {
        self.edge_lookup.get(&(a.min(b), a.max(b))).copied()
    }

    /// Faces incident to edge `e`.
    #[must_use]
    pub fn edge_faces(&self, e: usize) -> &[usize] {
        &self.edge_faces[e]
    }

    /// Faces incident to vertex `v`.
    #[must_use]
    pub fn vertex_faces(&self, v: usize) -> &[usize] {
        &self.vertex_faces[v]
    }

    /// Vertices sharing an edge with `v`.
    #[must_use]
    pub fn vertex_neighbors(&self, v: usize) -> Vec<usize> {
        self.vertex_edges[v]
            .iter()
            .map(|&e| {
                let [a, b] = self.edges[e];
                if a == v {
                    b
                } else {
                    a
                }
            })
            .collect()
    }

    /// Number of edges incident to `v`.
    #[must_use]
    pub fn valence(&self, v: usize) -> usize {
        self.vertex_edges[v].len()
    }

    /// An edge with a single incident face lies on the border.
    #[must_use]
    pub fn is_border_edge(&self, e: usize) -> bool {
        self.edge_faces[e].len() == 1
    }

    #[must_use]
    pub fn is_border_vertex(&self, v: usize) -> bool {
        self.vertex_edges[v].iter().any(|&e| self.is_border_edge(e))
    }

    /// Indices of all border edges.
    #[must_use]
    pub fn border_edges(&self) -> Vec<usize> {
        (0..self.n_edges())
            .filter(|&e| self.is_border_edge(e))
            .collect()
    }

    /// Halfedge index of corner `k` of face `f`.
    #[must_use]
    pub fn halfedge(&self, f: usize, k: usize) -> usize {
        self.face_offsets[f] + k
    }

    /// Face owning halfedge `h`.
    #[must_use]
    pub fn halfedge_face(&self, h: usize) -> usize {
        self.halfedges[h].0
    }

    /// Vertex halfedge `h` starts from.
    #[must_use]
    pub fn halfedge_source(&self, h: usize) -> usize {
        let (f, k) = self.halfedges[h];
        self.faces[f][k]
    }

    /// Vertex halfedge `h` points to.
    #[must_use]
    pub fn halfedge_target(&self, h: usize) -> usize {
        let (f, k) = self.halfedges[h];
        let face = &self.faces[f];
        face[(k + 1) % face.len()]
    }

    /// Undirected edge underlying halfedge `h`.
    #[must_use]
    pub fn halfedge_edge(&self, h: usize) -> usize {
        let key = {
            let (a, b) = (self.halfedge_source(h), self.halfedge_target(h));
            (a.min(b), a.max(b))
        };
        self.edge_lookup[&key]
    }

    /// Unnormalized polygon normal; its length is twice the polygon area.
    fn face_vector_area(&self, f: usize) -> Vec3 {
        let points = self.points();
        let face = &self.faces[f];
        let mut n = Vec3::ZERO;
        for k in 0..face.len() {
            let a = points[face[k]];
            let b = points[face[(k + 1) % face.len()]];
            n += a.cross(b);
        }
        n
    }

    /// Unit normal of face `f` (zero for degenerate faces).
    #[must_use]
    pub fn face_normal(&self, f: usize) -> Vec3 {
        self.face_vector_area(f).normalize_or_zero()
    }

    #[must_use]
    pub fn face_area(&self, f: usize) -> f32 {
        self.face_vector_area(f).length() * 0.5
    }

    #[must_use]
    pub fn face_center(&self, f: usize) -> Vec3 {
        let points = self.points();
        let face = &self.faces[f];
        face.iter().map(|&v| points[v]).sum::<Vec3>() / face.len() as f32
    }

    #[must_use]
    pub fn edge_length(&self, e: usize) -> f32 {
        let [a, b] = self.edges[e];
        let points = self.points();
        points[a].distance(points[b])
    }

    /// Computes unit face normals and stores them as `f:normal`.
    pub fn update_face_normals(&mut self) {
        let normals: Vec<Vec3> = (0..self.n_faces()).map(|f| self.face_normal(f)).collect();
        // The length always matches the face count.
        let _ = self.fprops.set("f:normal", normals);
    }

    /// Computes area-weighted vertex normals and stores them as `v:normal`.
    pub fn update_vertex_normals(&mut self) {
        let mut normals = vec![Vec3::ZERO; self.n_vertices()];
        for f in 0..self.n_faces() {
            let n = self.face_vector_area(f);
            for &v in &self.faces[f] {
                normals[v] += n;
            }
        }
        for n in &mut normals {
            *n = n.normalize_or_zero();
        }
        let _ = self.vprops.set("v:normal", normals);
    }

    /// Fan triangulation of every face, paired with the face it came from.
    #[must_use]
    pub fn triangles(&self) -> Vec<([usize; 3], usize)> {
        let mut tris = Vec::with_capacity(self.n_halfedges());
        for (f, face) in self.faces.iter().enumerate() {
            for k in 1..face.len() - 1 {
                tris.push(([face[0], face[k], face[k + 1]], f));
            }
        }
        tris
    }

    /// Returns whether every face is a triangle.
    #[must_use]
    pub fn is_triangle_mesh(&self) -> bool {
        self.faces.iter().all(|f| f.len() == 3)
    }

    pub fn points_mut(&mut self) -> &mut [Vec3] {
        self.vprops.get_mut::<Vec3>("v:point").unwrap_or_default()
    }

    pub fn vertex_properties_mut(&mut self) -> &mut PropertyContainer {
        &mut self.vprops
    }

    #[must_use]
    pub fn face_properties(&self) -> &PropertyContainer {
        &self.fprops
    }

    pub fn face_properties_mut(&mut self) -> &mut PropertyContainer {
        &mut self.fprops
    }

    #[must_use]
    pub fn edge_properties(&self) -> &PropertyContainer {
        &self.eprops
    }

    pub fn edge_properties_mut(&mut self) -> &mut PropertyContainer {
        &mut self.eprops
    }

    #[must_use]
    pub fn halfedge_properties(&self) -> &PropertyContainer {
        &self.hprops
    }

    pub fn halfedge_properties_mut(&mut self) -> &mut PropertyContainer {
        &mut self.hprops
    }
}

impl Model for SurfaceMesh {
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
        "SurfaceMesh"
    }

    fn points(&self) -> &[Vec3] {
        self.vprops.get::<Vec3>("v:point").unwrap_or_default()
    }

    fn vertex_properties(&self) -> &PropertyContainer {
        &self.vprops
    }

    fn property_stats(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for (kind, count, props) in [
            ("vertex", self.n_vertices(), &self.vprops),
            ("face", self.n_faces(), &self.fprops),
            ("edge", self.n_edges(), &self.eprops),
            ("halfedge", self.n_halfedges(), &self.hprops),
        ] {
            lines.push(format!("{kind} properties ({count})"));
            lines.extend(props.describe().into_iter().map(|l| format!("    {l}")));
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two triangles forming the unit square in the xy plane.
    fn square() -> SurfaceMesh {
        SurfaceMesh::from_polygons(
            "square",
            [Vec3::ZERO, Vec3::X, Vec3::new(1.0, 1.0, 0.0), Vec3::Y],
            [[0, 1, 2], [0, 2, 3]],
        )
        .unwrap()
    }

    #[test]
    fn test_counts() {
        let mesh = square();
        assert_eq!(mesh.n_vertices(), 4);
        assert_eq!(mesh.n_faces(), 2);
        assert_eq!(mesh.n_edges(), 5);
        assert_eq!(mesh.n_halfedges(), 6);
        assert_eq!(mesh.border_edges().len(), 4);
        assert!(!mesh.is_border_edge(mesh.find_edge(0, 2).unwrap()));
    }

    #[test]
    fn test_invalid_faces() {
        let mut mesh = square();
        assert!(mesh.add_face(&[0, 1]).is_err());
        assert!(mesh.add_face(&[0, 1, 9]).is_err());
        assert!(mesh.add_face(&[0, 1, 1]).is_err());
        assert_eq!(mesh.n_faces(), 2);
    }

    #[test]
    fn test_normals_and_area() {
        let mut mesh = square();
        assert!((mesh.face_area(0) - 0.5).abs() < 1e-6);
        assert!((mesh.face_normal(1) - Vec3::Z).length() < 1e-6);
        mesh.update_vertex_normals();
        let normals = mesh.vertex_properties().get::<Vec3>("v:normal").unwrap();
        assert!(normals.iter().all(|n| (*n - Vec3::Z).length() < 1e-6));
    }

    #[test]
    fn test_halfedges() {
        let mesh = square();
        let h = mesh.halfedge(1, 2);
        assert_eq!(mesh.halfedge_face(h), 1);
        assert_eq!(mesh.halfedge_source(h), 3);
        assert_eq!(mesh.halfedge_target(h), 0);
        assert_eq!(mesh.halfedge_edge(h), mesh.find_edge(0, 3).unwrap());
    }

    #[test]
    fn test_triangulation_of_polygon() {
        let mesh = SurfaceMesh::from_polygons(
            "pentagon",
            (0..5).map(|i| {
                let a = i as f32 * std::f32::consts::TAU / 5.0;
                Vec3::new(a.cos(), a.sin(), 0.0)
            }),
            [[0, 1, 2, 3, 4]],
        )
        .unwrap();
        let tris = mesh.triangles();
        assert_eq!(tris.len(), 3);
        assert!(tris.iter().all(|(_, f)| *f == 0));
        assert!(!mesh.is_triangle_mesh());
    }

    #[test]
    fn test_neighbors_and_valence() {
        let mesh = square();
        let mut n = mesh.vertex_neighbors(0);
        n.sort_unstable();
        assert_eq!(n, vec![1, 2, 3]);
        assert_eq!(mesh.valence(1), 2);
        assert!(mesh.is_border_vertex(0));
        assert_eq!(mesh.vertex_faces(2), &[0, 1]);
    }

    #[test]
    fn test_property_stats_lists_all_kinds() {
        let mut mesh = square();
        mesh.update_face_normals();
        let stats = mesh.property_stats();
        assert!(stats.iter().any(|l| l == "face properties (2)"));
        assert!(stats.iter().any(|l| l.contains("f:normal (vec3)")));
    }
}
