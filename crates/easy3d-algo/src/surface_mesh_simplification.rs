//! Surface mesh simplification based on approximation error and fairness criteria.
//!
//! Incremental greedy decimation by halfedge collapses, ordered by the
//! quadric error metric of Garland and Heckbert. Optional fairness
//! constraints (aspect ratio, edge length, valence, normal deviation) veto
//! collapses, following Kobbelt et al., "A general framework for mesh
//! decimation" (1998).
//!
//! A collapse of the halfedge `v0 -> v1` removes `v0`, keeps `v1` at its
//! position, and deletes the one or two faces incident to the edge:
//!
//! ```text
//!            vl
//!            *
//!           / \
//!          / fl\
//!      v0 *---->* v1
//!          \ fr/
//!           \ /
//!            *
//!            vr
//! ```

use std::collections::{BinaryHeap, HashSet};
use std::ops::{Add, AddAssign};

use easy3d_core::{Model, SurfaceMesh};
use glam::{DVec3, Vec3};

use crate::error::{AlgoError, AlgoResult};
use crate::queue::Candidate;

/// Vertex property marking vertices that must not be removed.
pub const LOCKED_PROPERTY: &str = "v:locked";

/// A quadric as a symmetric 4x4 matrix, stored as its upper triangle.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Quadric {
    m: [f64; 10],
}

impl Quadric {
    /// Quadric of the plane `ax + by + cz + d = 0`.
    #[must_use]
    pub fn from_plane(a: f64, b: f64, c: f64, d: f64) -> Self {
        Self {
            m: [
                a * a,
                a * b,
                a * c,
                a * d,
                b * b,
                b * c,
                b * d,
                c * c,
                c * d,
                d * d,
            ],
        }
    }

    /// Quadric of the plane through `p` with unit normal `n`.
    #[must_use]
    pub fn from_point_normal(p: Vec3, n: Vec3) -> Self {
        let n = n.as_dvec3();
        Self::from_plane(n.x, n.y, n.z, -n.dot(p.as_dvec3()))
    }

    /// Evaluates `p^T Q p`, the summed squared distance to the planes.
    #[must_use]
    pub fn evaluate(&self, p: Vec3) -> f64 {
        let DVec3 { x, y, z } = p.as_dvec3();
        let [a, b, c, d, e, f, g, h, i, j] = self.m;
        a * x * x + 2.0 * b * x * y + 2.0 * c * x * z + 2.0 * d * x
            + e * y * y
            + 2.0 * f * y * z
            + 2.0 * g * y
            + h * z * z
            + 2.0 * i * z
            + j
    }
}

impl AddAssign for Quadric {
    fn add_assign(&mut self, rhs: Self) {
        for (l, r) in self.m.iter_mut().zip(rhs.m) {
            *l += r;
        }
    }
}

impl Add for Quadric {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self {
        self += rhs;
        self
    }
}

/// The smallest cone (axis and half angle in radians) enclosing a set of normals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalCone {
    center: Vec3,
    angle: f32,
}

impl NormalCone {
    #[must_use]
    pub fn new(normal: Vec3, angle: f32) -> Self {
        Self {
            center: normal,
            angle,
        }
    }

    #[must_use]
    pub fn center_normal(&self) -> Vec3 {
        self.center
    }

    #[must_use]
    pub fn angle(&self) -> f32 {
        self.angle
    }

    /// Grows the cone to also enclose `other`.
    #[must_use]
    pub fn merged(self, other: NormalCone) -> NormalCone {
        let dp = self.center.dot(other.center);
        if dp > 0.99999 {
            return NormalCone::new(self.center, self.angle.max(other.angle));
        }
        if dp < -0.99999 {
            return NormalCone::new(self.center, 2.0 * std::f32::consts::PI);
        }
        let center_angle = dp.acos();
        let min_angle = (-self.angle).min(center_angle - other.angle);
        let max_angle = self.angle.max(center_angle + other.angle);
        let axis_angle = 0.5 * (min_angle + max_angle);
        let center = (self.center * (center_angle - axis_angle).sin()
            + other.center * axis_angle.sin())
            / center_angle.sin();
        NormalCone::new(center, 0.5 * (max_angle - min_angle))
    }

    #[must_use]
    pub fn merged_normal(self, n: Vec3) -> NormalCone {
        self.merged(NormalCone::new(n, 0.0))
    }
}

/// Greedy quadric-error decimation of a triangle mesh.
///
/// ```ignore
/// let mut simplifier = SurfaceMeshSimplification::new(&mut mesh);
/// simplifier.initialize(5.0, 0.0, 0, 0.0, 0.0);
/// simplifier.simplify(1000)?;
/// ```
pub struct SurfaceMeshSimplification<'a> {
    mesh: &'a mut SurfaceMesh,
    aspect_ratio: f32,
    edge_length: f32,
    max_valence: usize,
    normal_deviation: f32,
    initialized: bool,
}

impl<'a> SurfaceMeshSimplification<'a> {
    pub fn new(mesh: &'a mut SurfaceMesh) -> Self {
        Self {
            mesh,
            aspect_ratio: 0.0,
            edge_length: 0.0,
            max_valence: 0,
            normal_deviation: 0.0,
            initialized: false,
        }
    }

    /// Sets the fairness constraints. Zero disables a constraint.
    ///
    /// - `aspect_ratio`: collapses may not create faces above this aspect
    ///   ratio unless they improve on the current one.
    /// - `edge_length`: collapses may not create edges longer than this.
    /// - `max_valence`: collapses may not create vertices of higher valence.
    /// - `normal_deviation`: maximum deviation of face normals, in degrees.
    /// - `hausdorff_error`: not supported; a non-zero value is ignored.
    pub fn initialize(
        &mut self,
        aspect_ratio: f32,
        edge_length: f32,
        max_valence: usize,
        normal_deviation: f32,
        hausdorff_error: f32,
    ) {
        self.aspect_ratio = aspect_ratio.max(0.0);
        self.edge_length = edge_length.max(0.0);
        self.max_valence = max_valence;
        self.normal_deviation = normal_deviation.max(0.0).to_radians();
        if hausdorff_error > 0.0 {
            log::warn!("the Hausdorff error constraint is not supported and will be ignored");
        }
        self.initialized = true;
    }

    /// Simplifies the mesh down to `n_vertices` vertices, or as far as the
    /// constraints allow.
    pub fn simplify(&mut self, n_vertices: usize) -> AlgoResult<()> {
        if !self.mesh.is_triangle_mesh() {
            return Err(AlgoError::NotTriangleMesh(self.mesh.name().to_string()));
        }
        if !self.initialized {
            self.initialize(0.0, 0.0, 0, 0.0, 0.0);
        }

        let constraints = Constraints {
            aspect_ratio: self.aspect_ratio,
            edge_length: self.edge_length,
            max_valence: self.max_valence,
            normal_deviation: self.normal_deviation,
        };
        let mut decimator = Decimator::new(self.mesh, constraints);
        let before = self.mesh.n_vertices();
        decimator.run(n_vertices);
        *self.mesh = decimator.into_mesh(self.mesh)?;
        log::info!(
            "simplified '{}' from {before} to {} vertices",
            self.mesh.name(),
            self.mesh.n_vertices()
        );
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
struct Constraints {
    aspect_ratio: f32,
    edge_length: f32,
    max_valence: usize,
    normal_deviation: f32,
}

/// Indexed triangle soup with incidence lists, edited in place by collapses.
struct Decimator {
    points: Vec<Vec3>,
    faces: Vec<[usize; 3]>,
    face_alive: Vec<bool>,
    vertex_faces: Vec<Vec<usize>>,
    vertex_alive: Vec<bool>,
    locked: Vec<bool>,
    quadrics: Vec<Quadric>,
    cones: Vec<NormalCone>,
    stamps: Vec<u32>,
    queue: BinaryHeap<Candidate<(usize, usize)>>,
    constraints: Constraints,
}

impl Decimator {
    fn new(mesh: &SurfaceMesh, constraints: Constraints) -> Self {
        let points = mesh.points().to_vec();
        let n = points.len();
        let faces: Vec<[usize; 3]> = mesh
            .faces()
            .iter()
            .map(|f| [f[0], f[1], f[2]])
            .collect();

        let mut vertex_faces = vec![Vec::new(); n];
        let mut quadrics = vec![Quadric::default(); n];
        let mut cones = Vec::with_capacity(faces.len());
        for (i, f) in faces.iter().enumerate() {
            let normal = mesh.face_normal(i);
            let q = Quadric::from_point_normal(points[f[0]], normal);
            for &v in f {
                vertex_faces[v].push(i);
                quadrics[v] += q;
            }
            cones.push(NormalCone::new(normal, 0.0));
        }
        let locked = mesh
            .vertex_properties()
            .get::<bool>(LOCKED_PROPERTY)
            .map_or_else(|| vec![false; n], <[bool]>::to_vec);

        Self {
            points,
            face_alive: vec![true; faces.len()],
            faces,
            vertex_faces,
            vertex_alive: vec![true; n],
            locked,
            quadrics,
            cones,
            stamps: vec![0; n],
            queue: BinaryHeap::new(),
            constraints,
        }
    }

    fn run(&mut self, target: usize) {
        let mut alive = self.vertex_alive.iter().filter(|&&a| a).count();
        for v in 0..self.points.len() {
            self.enqueue(v);
        }

        while alive > target {
            let Some(candidate) = self.queue.pop() else {
                break;
            };
            let (v0, v1) = candidate.item;
            if !self.vertex_alive[v0] || candidate.stamp != self.stamps[v0] {
                continue;
            }
            if !self.vertex_alive[v1] || !self.is_collapse_ok(v0, v1) || !self.is_collapse_legal(v0, v1) {
                self.enqueue(v0);
                continue;
            }

            self.collapse(v0, v1);
            alive -= 1;

            self.enqueue(v1);
            for v in self.neighbors(v1) {
                self.enqueue(v);
            }
        }
    }

    /// Recomputes the cheapest legal collapse starting at `v0`.
    fn enqueue(&mut self, v0: usize) {
        self.stamps[v0] = self.stamps[v0].wrapping_add(1);
        if !self.vertex_alive[v0] || self.locked[v0] {
            return;
        }
        let best = self
            .neighbors(v0)
            .into_iter()
            .filter(|&v1| self.is_collapse_ok(v0, v1) && self.is_collapse_legal(v0, v1))
            .map(|v1| (self.priority(v0, v1), v1))
            .min_by(|a, b| a.0.total_cmp(&b.0));
        if let Some((cost, v1)) = best {
            self.queue.push(Candidate {
                cost,
                item: (v0, v1),
                stamp: self.stamps[v0],
            });
        }
    }

    fn priority(&self, v0: usize, v1: usize) -> f64 {
        (self.quadrics[v0] + self.quadrics[v1]).evaluate(self.points[v1])
    }

    fn neighbors(&self, v: usize) -> Vec<usize> {
        let mut out = Vec::new();
        for &f in &self.vertex_faces[v] {
            for &u in &self.faces[f] {
                if u != v && !out.contains(&u) {
                    out.push(u);
                }
            }
        }
        out
    }

    /// Faces incident to both `a` and `b`.
    fn edge_faces(&self, a: usize, b: usize) -> Vec<usize> {
        self.vertex_faces[a]
            .iter()
            .copied()
            .filter(|&f| self.faces[f].contains(&b))
            .collect()
    }

    fn is_border_vertex(&self, v: usize) -> bool {
        self.neighbors(v)
            .into_iter()
            .any(|u| self.edge_faces(v, u).len() == 1)
    }

    fn opposite_vertex(&self, f: usize, a: usize, b: usize) -> usize {
        self.faces[f]
            .iter()
            .copied()
            .find(|&v| v != a && v != b)
            .unwrap_or(a)
    }

    /// Topological validity: the collapse keeps the mesh a 2-manifold.
    fn is_collapse_ok(&self, v0: usize, v1: usize) -> bool {
        let shared = self.edge_faces(v0, v1);
        if shared.is_empty() || shared.len() > 2 {
            return false;
        }
        let border0 = self.is_border_vertex(v0);
        let border1 = self.is_border_vertex(v1);
        if border0 && border1 && shared.len() != 1 {
            return false;
        }

        let opposite: HashSet<usize> = shared
            .iter()
            .map(|&f| self.opposite_vertex(f, v0, v1))
            .collect();
        let n1 = self.neighbors(v1);
        let common = self
            .neighbors(v0)
            .into_iter()
            .filter(|u| n1.contains(u))
            .count();
        if common != opposite.len() {
            return false;
        }

        opposite.iter().all(|&v| {
            let n = self.vertex_faces[v].len();
            if self.is_border_vertex(v) {
                n >= 2
            } else {
                n > 3
            }
        })
    }

    /// Geometric validity and fairness constraints.
    fn is_collapse_legal(&self, v0: usize, v1: usize) -> bool {
        if self.locked[v0] {
            return false;
        }
        if self.is_border_vertex(v0) && !self.is_border_vertex(v1) {
            return false;
        }

        let c = self.constraints;
        let p1 = self.points[v1];

        if c.max_valence > 0 {
            let n0 = self.neighbors(v0);
            let n1 = self.neighbors(v1);
            let merged: HashSet<usize> = n0
                .iter()
                .chain(&n1)
                .copied()
                .filter(|&u| u != v0 && u != v1)
                .collect();
            let val = merged.len();
            if val > c.max_valence && val >= n0.len().max(n1.len()) {
                return false;
            }
        }

        if c.edge_length > 0.0 {
            let too_long = self
                .neighbors(v0)
                .into_iter()
                .filter(|&u| u != v1)
                .any(|u| self.points[u].distance(p1) > c.edge_length);
            if too_long {
                return false;
            }
        }

        let shared = self.edge_faces(v0, v1);
        let mut ar_before = 0.0f32;
        let mut ar_after = 0.0f32;
        for &f in &self.vertex_faces[v0] {
            if c.aspect_ratio > 0.0 {
                ar_before = ar_before.max(aspect_ratio(self.corners(f, v0, self.points[v0])));
            }
            if shared.contains(&f) {
                continue;
            }
            let before = self.corners(f, v0, self.points[v0]);
            let after = self.corners(f, v0, p1);
            let n_before = triangle_normal(before);
            let Some(n_after) = triangle_normal(after).try_normalize() else {
                return false;
            };
            if n_before.dot(n_after) < 0.0 {
                return false;
            }
            if c.normal_deviation > 0.0
                && self.merged_cone(f, n_after, (v0, v1), &shared).angle() > 0.5 * c.normal_deviation
            {
                return false;
            }
            if c.aspect_ratio > 0.0 {
                ar_after = ar_after.max(aspect_ratio(after));
            }
        }
        !(c.aspect_ratio > 0.0 && ar_after > c.aspect_ratio && ar_after > ar_before)
    }

    /// Positions of face `f` with vertex `v` moved to `p`.
    fn corners(&self, f: usize, v: usize, p: Vec3) -> [Vec3; 3] {
        self.faces[f].map(|u| if u == v { p } else { self.points[u] })
    }

    /// Cone of face `f` after the collapse: its old cone, its new normal and
    /// the cones of the removed faces it shares an edge with.
    fn merged_cone(
        &self,
        f: usize,
        n_after: Vec3,
        (v0, v1): (usize, usize),
        removed: &[usize],
    ) -> NormalCone {
        let mut cone = self.cones[f].merged_normal(n_after);
        for &r in removed {
            if self.faces[f].contains(&self.opposite_vertex(r, v0, v1)) {
                cone = cone.merged(self.cones[r]);
            }
        }
        cone
    }

    fn collapse(&mut self, v0: usize, v1: usize) {
        let shared = self.edge_faces(v0, v1);
        let p1 = self.points[v1];

        let survivors: Vec<usize> = self.vertex_faces[v0]
            .iter()
            .copied()
            .filter(|f| !shared.contains(f))
            .collect();
        if self.constraints.normal_deviation > 0.0 {
            for &f in &survivors {
                let n = triangle_normal(self.corners(f, v0, p1)).normalize_or_zero();
                self.cones[f] = self.merged_cone(f, n, (v0, v1), &shared);
            }
        }

        for &f in &shared {
            self.face_alive[f] = false;
            for v in self.faces[f] {
                self.vertex_faces[v].retain(|&g| g != f);
            }
        }
        for &f in &survivors {
            for v in &mut self.faces[f] {
                if *v == v0 {
                    *v = v1;
                }
            }
            self.vertex_faces[v1].push(f);
        }

        let q0 = self.quadrics[v0];
        self.quadrics[v1] += q0;
        self.vertex_faces[v0].clear();
        self.vertex_alive[v0] = false;
    }

    /// Builds the compacted mesh, carrying vertex and face properties over.
    fn into_mesh(self, source: &SurfaceMesh) -> AlgoResult<SurfaceMesh> {
        let alive_vertices: Vec<usize> = (0..self.points.len())
            .filter(|&v| self.vertex_alive[v])
            .collect();
        let mut remap = vec![usize::MAX; self.points.len()];
        for (i, &v) in alive_vertices.iter().enumerate() {
            remap[v] = i;
        }
        let alive_faces: Vec<usize> = (0..self.faces.len())
            .filter(|&f| self.face_alive[f])
            .collect();

        let mut mesh = SurfaceMesh::from_polygons(
            source.name(),
            alive_vertices.iter().map(|&v| self.points[v]),
            alive_faces.iter().map(|&f| self.faces[f].map(|v| remap[v])),
        )?;

        let mut vprops = source.vertex_properties().gathered(&alive_vertices);
        let had_vertex_normals = vprops.remove("v:normal");
        *mesh.vertex_properties_mut() = vprops;
        let mut fprops = source.face_properties().gathered(&alive_faces);
        let had_face_normals = fprops.remove("f:normal");
        *mesh.face_properties_mut() = fprops;

        if had_vertex_normals {
            mesh.update_vertex_normals();
        }
        if had_face_normals {
            mesh.update_face_normals();
        }
        Ok(mesh)
    }
}

fn triangle_normal([a, b, c]: [Vec3; 3]) -> Vec3 {
    (b - a).cross(c - a)
}

/// Longest squared edge over twice the area; infinite when degenerate.
fn aspect_ratio([a, b, c]: [Vec3; 3]) -> f32 {
    let l = (a - b)
        .length_squared()
        .max((b - c).length_squared())
        .max((c - a).length_squared());
    let area2 = (b - a).cross(c - a).length();
    if area2 <= f32::EPSILON {
        f32::INFINITY
    } else {
        l / area2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Octahedron subdivided once and projected on the unit sphere.
    fn sphere() -> SurfaceMesh {
        let mut points = vec![
            Vec3::X,
            Vec3::NEG_X,
            Vec3::Y,
            Vec3::NEG_Y,
            Vec3::Z,
            Vec3::NEG_Z,
        ];
        let coarse = [
            [0, 2, 4],
            [2, 1, 4],
            [1, 3, 4],
            [3, 0, 4],
            [2, 0, 5],
            [1, 2, 5],
            [3, 1, 5],
            [0, 3, 5],
        ];
        let mut midpoints = HashMap::new();
        let mut midpoint = |a: usize, b: usize, points: &mut Vec<Vec3>| {
            *midpoints.entry((a.min(b), a.max(b))).or_insert_with(|| {
                points.push(((points[a] + points[b]) * 0.5).normalize());
                points.len() - 1
            })
        };
        let mut faces = Vec::new();
        for [a, b, c] in coarse {
            let ab = midpoint(a, b, &mut points);
            let bc = midpoint(b, c, &mut points);
            let ca = midpoint(c, a, &mut points);
            faces.extend([[a, ab, ca], [ab, b, bc], [ca, bc, c], [ab, bc, ca]]);
        }
        SurfaceMesh::from_polygons("sphere", points, faces).unwrap()
    }

    fn euler(mesh: &SurfaceMesh) -> i64 {
        mesh.n_vertices() as i64 - mesh.n_edges() as i64 + mesh.n_faces() as i64
    }

    #[test]
    fn test_quadric_is_squared_distance() {
        let q = Quadric::from_point_normal(Vec3::new(0.0, 0.0, 1.0), Vec3::Z);
        assert!((q.evaluate(Vec3::new(5.0, -2.0, 3.0)) - 4.0).abs() < 1e-9);
        let sum = q + Quadric::from_point_normal(Vec3::ZERO, Vec3::X);
        assert!((sum.evaluate(Vec3::new(2.0, 0.0, 1.0)) - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_normal_cone_merge() {
        let cone = NormalCone::new(Vec3::X, 0.0).merged_normal(Vec3::Y);
        assert!((cone.angle() - std::f32::consts::FRAC_PI_4).abs() < 1e-5);
        let diag = Vec3::new(1.0, 1.0, 0.0).normalize();
        assert!((cone.center_normal() - diag).length() < 1e-5);

        let same = NormalCone::new(Vec3::Z, 0.1).merged_normal(Vec3::Z);
        assert!((same.angle() - 0.1).abs() < 1e-6);
        let opposite = NormalCone::new(Vec3::Z, 0.0).merged_normal(Vec3::NEG_Z);
        assert!(opposite.angle() > std::f32::consts::PI);
    }

    #[test]
    fn test_sphere_fixture() {
        let mesh = sphere();
        assert_eq!(mesh.n_vertices(), 18);
        assert_eq!(mesh.n_faces(), 32);
        assert_eq!(euler(&mesh), 2);
    }

    #[test]
    fn test_simplify_closed_mesh() {
        let mut mesh = sphere();
        SurfaceMeshSimplification::new(&mut mesh).simplify(10).unwrap();
        assert_eq!(mesh.n_vertices(), 10);
        assert_eq!(euler(&mesh), 2);
        assert!(mesh.is_triangle_mesh());
        assert!((0..mesh.n_faces()).all(|f| mesh.face_area(f) > 0.0));
    }

    #[test]
    fn test_simplify_with_constraints() {
        let mut mesh = sphere();
        let mut simplifier = SurfaceMeshSimplification::new(&mut mesh);
        simplifier.initialize(10.0, 3.0, 8, 120.0, 0.0);
        simplifier.simplify(12).unwrap();
        assert!(mesh.n_vertices() >= 12);
        assert!(mesh.n_vertices() < 18);
        assert_eq!(euler(&mesh), 2);
    }

    #[test]
    fn test_locked_vertices_survive() {
        let mut mesh = sphere();
        let mut locked = vec![false; 18];
        locked[..6].fill(true);
        mesh.vertex_properties_mut()
            .set(LOCKED_PROPERTY, locked)
            .unwrap();
        let corners: Vec<Vec3> = mesh.points()[..6].to_vec();

        SurfaceMeshSimplification::new(&mut mesh).simplify(0).unwrap();
        assert!(mesh.n_vertices() >= 6);
        for c in corners {
            assert!(mesh.points().iter().any(|p| (*p - c).length() < 1e-6));
        }
        let flags = mesh.vertex_properties().get::<bool>(LOCKED_PROPERTY).unwrap();
        assert_eq!(flags.iter().filter(|&&l| l).count(), 6);
    }

    #[test]
    fn test_vertex_properties_follow_vertices() {
        let mut mesh = sphere();
        let ids: Vec<i32> = (0..18).collect();
        mesh.vertex_properties_mut().set("v:id", ids).unwrap();
        mesh.update_vertex_normals();
        SurfaceMeshSimplification::new(&mut mesh).simplify(14).unwrap();

        let original = sphere();
        let ids = mesh.vertex_properties().get::<i32>("v:id").unwrap();
        for (p, &id) in mesh.points().iter().zip(ids) {
            assert_eq!(*p, original.points()[id as usize]);
        }
        assert!(mesh.vertex_properties().contains("v:normal"));
    }

    #[test]
    fn test_rejects_polygon_mesh() {
        let mut mesh = SurfaceMesh::from_polygons(
            "quad",
            [Vec3::ZERO, Vec3::X, Vec3::new(1.0, 1.0, 0.0), Vec3::Y],
            [[0, 1, 2, 3]],
        )
        .unwrap();
        assert!(matches!(
            SurfaceMeshSimplification::new(&mut mesh).simplify(3),
            Err(AlgoError::NotTriangleMesh(_))
        ));
    }
}
