//! Partitioning of surface meshes into planar charts.
//!
//! Faces are merged greedily into charts, most coplanar neighbors first,
//! until the requested number of charts is reached. Each chart is then
//! flattened onto its best fitting plane.

use std::collections::{BinaryHeap, HashSet, VecDeque};

use easy3d_core::{Model, SurfaceMesh};
use glam::Vec3;

use crate::error::{AlgoError, AlgoResult};
use crate::queue::Candidate;

/// Vertex property holding the planarity of the neighborhood, in `[0, 1]`.
pub const PLANARITY_PROPERTY: &str = "v:planarity";
/// Face property holding the chart index.
pub const CHART_PROPERTY: &str = "f:chart";
/// Face property holding the chart color.
pub const CHART_COLOR_PROPERTY: &str = "f:color";

pub struct Polygonizer<'a> {
    mesh: &'a mut SurfaceMesh,
}

/// A region of faces with its area-weighted plane.
#[derive(Debug, Clone, Copy)]
struct Chart {
    normal_sum: Vec3,
    center_sum: Vec3,
    area: f32,
    version: u32,
    alive: bool,
}

impl Chart {
    fn normal(&self) -> Vec3 {
        self.normal_sum.normalize_or_zero()
    }

    fn center(&self) -> Vec3 {
        if self.area > 0.0 {
            self.center_sum / self.area
        } else {
            Vec3::ZERO
        }
    }
}

impl<'a> Polygonizer<'a> {
    pub fn new(mesh: &'a mut SurfaceMesh) -> Self {
        Self { mesh }
    }

    /// Stores in `v:planarity` how flat the faces within `k_ring` rings of
    /// each vertex are: the length of their area-weighted mean normal, 1 for
    /// a flat neighborhood.
    pub fn compute_planarity(&mut self, k_ring: usize) -> AlgoResult<()> {
        let mesh = &*self.mesh;
        let planarity: Vec<f32> = (0..mesh.n_vertices())
            .map(|v| {
                let faces: HashSet<usize> = ring(mesh, v, k_ring)
                    .into_iter()
                    .flat_map(|u| mesh.vertex_faces(u).iter().copied())
                    .collect();
                let (sum, area) = faces.iter().fold((Vec3::ZERO, 0.0), |(sum, area), &f| {
                    let a = mesh.face_area(f);
                    (sum + mesh.face_normal(f) * a, area + a)
                });
                if area > 0.0 {
                    (sum.length() / area).min(1.0)
                } else {
                    0.0
                }
            })
            .collect();
        self.mesh
            .vertex_properties_mut()
            .set(PLANARITY_PROPERTY, planarity)?;
        Ok(())
    }

    /// Partitions the faces into at most `num_faces` planar charts and
    /// flattens them. Returns the number of charts.
    ///
    /// Results are stored in `f:chart` and `f:color`. Vertices shared by
    /// several charts move to the mean of their projections.
    pub fn polygonize(&mut self, num_faces: usize) -> AlgoResult<usize> {
        let n_faces = self.mesh.n_faces();
        if n_faces == 0 {
            return Err(AlgoError::EmptyMesh(self.mesh.name().to_string()));
        }
        let target = num_faces.max(1);

        let (charts, owner) = self.grow_charts(target);

        // Renumber the surviving charts in face order.
        let mut index = vec![usize::MAX; n_faces];
        let mut ids = Vec::with_capacity(n_faces);
        let mut planes = Vec::new();
        for f in 0..n_faces {
            let root = find(&owner, f);
            if index[root] == usize::MAX {
                index[root] = planes.len();
                planes.push((charts[root].normal(), charts[root].center()));
            }
            ids.push(index[root]);
        }
        let n_charts = planes.len();

        self.flatten(&ids, &planes);

        let colors: Vec<Vec3> = ids.iter().map(|&c| chart_color(c)).collect();
        let fprops = self.mesh.face_properties_mut();
        fprops.set(CHART_PROPERTY, ids.iter().map(|&c| c as i32).collect::<Vec<_>>())?;
        fprops.set(CHART_COLOR_PROPERTY, colors)?;
        if self.mesh.face_properties().contains("f:normal") {
            self.mesh.update_face_normals();
        }
        if self.mesh.vertex_properties().contains("v:normal") {
            self.mesh.update_vertex_normals();
        }

        log::info!(
            "polygonized '{}': {n_faces} faces into {n_charts} charts",
            self.mesh.name()
        );
        Ok(n_charts)
    }

    /// Greedy pairwise merging of adjacent charts. Returns the charts and the
    /// union-find parents of the faces.
    fn grow_charts(&self, target: usize) -> (Vec<Chart>, Vec<usize>) {
        let mesh = &*self.mesh;
        let n_faces = mesh.n_faces();
        let mut charts: Vec<Chart> = (0..n_faces)
            .map(|f| {
                let area = mesh.face_area(f);
                Chart {
                    normal_sum: mesh.face_normal(f) * area,
                    center_sum: mesh.face_center(f) * area,
                    area,
                    version: 0,
                    alive: true,
                }
            })
            .collect();
        let mut parent: Vec<usize> = (0..n_faces).collect();
        let mut adjacency: Vec<HashSet<usize>> = vec![HashSet::new(); n_faces];
        for e in 0..mesh.n_edges() {
            let faces = mesh.edge_faces(e);
            for (i, &a) in faces.iter().enumerate() {
                for &b in &faces[i + 1..] {
                    adjacency[a].insert(b);
                    adjacency[b].insert(a);
                }
            }
        }

        let mut queue = BinaryHeap::new();
        let push = |queue: &mut BinaryHeap<Candidate<(usize, usize, u32, u32)>>,
                    charts: &[Chart],
                    a: usize,
                    b: usize| {
            queue.push(Candidate {
                cost: merge_cost(&charts[a], &charts[b]),
                item: (a, b, charts[a].version, charts[b].version),
                stamp: 0,
            });
        };
        for a in 0..n_faces {
            for &b in &adjacency[a] {
                if a < b {
                    push(&mut queue, &charts, a, b);
                }
            }
        }

        let mut count = n_faces;
        while count > target {
            let Some(Candidate {
                item: (a, b, va, vb),
                ..
            }) = queue.pop()
            else {
                break;
            };
            if !charts[a].alive
                || !charts[b].alive
                || charts[a].version != va
                || charts[b].version != vb
            {
                continue;
            }

            let absorbed = charts[b];
            let chart = &mut charts[a];
            chart.normal_sum += absorbed.normal_sum;
            chart.center_sum += absorbed.center_sum;
            chart.area += absorbed.area;
            chart.version += 1;
            charts[b].alive = false;
            parent[b] = a;
            count -= 1;

            let neighbors = std::mem::take(&mut adjacency[b]);
            for n in neighbors {
                if n == a {
                    continue;
                }
                adjacency[n].remove(&b);
                adjacency[n].insert(a);
                adjacency[a].insert(n);
            }
            adjacency[a].remove(&b);
            for &n in &adjacency[a] {
                push(&mut queue, &charts, a, n);
            }
        }
        (charts, parent)
    }

    fn flatten(&mut self, ids: &[usize], planes: &[(Vec3, Vec3)]) {
        let n_vertices = self.mesh.n_vertices();
        let mut sums = vec![Vec3::ZERO; n_vertices];
        let mut counts = vec![0u32; n_vertices];
        let points = self.mesh.points();
        for v in 0..n_vertices {
            let charts: HashSet<usize> = self
                .mesh
                .vertex_faces(v)
                .iter()
                .map(|&f| ids[f])
                .collect();
            for c in charts {
                let (n, center) = planes[c];
                if n == Vec3::ZERO {
                    continue;
                }
                let p = points[v];
                sums[v] += p - n * n.dot(p - center);
                counts[v] += 1;
            }
        }
        for (v, p) in self.mesh.points_mut().iter_mut().enumerate() {
            if counts[v] > 0 {
                *p = sums[v] / counts[v] as f32;
            }
        }
    }
}

/// Vertices within `k` edges of `v`, `v` included.
fn ring(mesh: &SurfaceMesh, v: usize, k: usize) -> Vec<usize> {
    let mut seen = HashSet::from([v]);
    let mut out = vec![v];
    let mut frontier = VecDeque::from([(v, 0usize)]);
    while let Some((u, depth)) = frontier.pop_front() {
        if depth == k {
            continue;
        }
        for w in mesh.vertex_neighbors(u) {
            if seen.insert(w) {
                out.push(w);
                frontier.push_back((w, depth + 1));
            }
        }
    }
    out
}

fn find(parent: &[usize], mut f: usize) -> usize {
    while parent[f] != f {
        f = parent[f];
    }
    f
}

fn merge_cost(a: &Chart, b: &Chart) -> f64 {
    f64::from(1.0 - a.normal().dot(b.normal()))
}

/// Distinct color per chart index, spread around the hue circle.
fn chart_color(index: usize) -> Vec3 {
    let hue = (index as f32 * 0.618_034).fract() * 6.0;
    let (s, v) = (0.6, 0.9);
    let c = v * s;
    let x = c * (1.0 - ((hue % 2.0) - 1.0).abs());
    let (r, g, b) = match hue as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    Vec3::new(r, g, b) + Vec3::splat(v - c)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Unit cube with every side split into two triangles.
    fn cube() -> SurfaceMesh {
        let points = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(1.0, 0.0, 1.0),
            Vec3::new(1.0, 1.0, 1.0),
            Vec3::new(0.0, 1.0, 1.0),
        ];
        let quads = [
            [0, 3, 2, 1],
            [4, 5, 6, 7],
            [0, 1, 5, 4],
            [2, 3, 7, 6],
            [0, 4, 7, 3],
            [1, 2, 6, 5],
        ];
        let triangles = quads
            .iter()
            .flat_map(|&[a, b, c, d]| [[a, b, c], [a, c, d]]);
        SurfaceMesh::from_polygons("cube", points, triangles).unwrap()
    }

    /// A 4x4 grid of quads in the xy plane with a slight bump in z.
    fn bumpy_plane() -> SurfaceMesh {
        let mut points = Vec::new();
        for j in 0..5 {
            for i in 0..5 {
                let z = if (i + j) % 2 == 0 { 0.01 } else { -0.01 };
                points.push(Vec3::new(i as f32, j as f32, z));
            }
        }
        let mut quads = Vec::new();
        for j in 0..4 {
            for i in 0..4 {
                let v = j * 5 + i;
                quads.push([v, v + 1, v + 6, v + 5]);
            }
        }
        SurfaceMesh::from_polygons("plane", points, quads).unwrap()
    }

    #[test]
    fn test_cube_sides_become_charts() {
        let mut mesh = cube();
        let n = Polygonizer::new(&mut mesh).polygonize(6).unwrap();
        assert_eq!(n, 6);

        let charts = mesh.face_properties().get::<i32>(CHART_PROPERTY).unwrap();
        for f in 0..mesh.n_faces() {
            for g in 0..mesh.n_faces() {
                if charts[f] == charts[g] {
                    assert!(mesh.face_normal(f).dot(mesh.face_normal(g)) > 0.999);
                }
            }
        }
        assert_eq!(charts[0], 0);
        assert!(charts.iter().all(|&c| (0..6).contains(&c)));
        assert!(mesh.face_properties().contains(CHART_COLOR_PROPERTY));
        // Already planar: nothing moves.
        for (p, q) in mesh.points().iter().zip(cube().points()) {
            assert!((*p - *q).length() < 1e-5);
        }
    }

    #[test]
    fn test_single_chart_is_flattened() {
        let mut mesh = bumpy_plane();
        let n = Polygonizer::new(&mut mesh).polygonize(1).unwrap();
        assert_eq!(n, 1);
        for p in mesh.points() {
            assert!(p.z.abs() < 1e-5, "{p:?} not flattened");
        }
    }

    #[test]
    fn test_more_charts_than_faces() {
        let mut mesh = cube();
        let n = Polygonizer::new(&mut mesh).polygonize(100).unwrap();
        assert_eq!(n, 12);
    }

    #[test]
    fn test_planarity() {
        let mut mesh = bumpy_plane();
        Polygonizer::new(&mut mesh).compute_planarity(1).unwrap();
        let flat = mesh.vertex_properties().get::<f32>(PLANARITY_PROPERTY).unwrap();
        assert!(flat.iter().all(|&p| p > 0.99));

        let mut mesh = cube();
        Polygonizer::new(&mut mesh).compute_planarity(0).unwrap();
        let corners = mesh.vertex_properties().get::<f32>(PLANARITY_PROPERTY).unwrap();
        assert!(corners.iter().all(|&p| p < 0.9));
    }

    #[test]
    fn test_chart_colors_differ() {
        assert_ne!(chart_color(0), chart_color(1));
        let c = chart_color(7);
        assert!(c.min_element() >= 0.0 && c.max_element() <= 1.0);
    }

    #[test]
    fn test_empty_mesh() {
        let mut mesh = SurfaceMesh::new("empty");
        assert!(Polygonizer::new(&mut mesh).polygonize(3).is_err());
    }
}
