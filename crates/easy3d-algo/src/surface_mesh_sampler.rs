//! Near-uniform sampling of a surface mesh into a point cloud.

use easy3d_core::{Model, PointCloud, SurfaceMesh};
use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{AlgoError, AlgoResult};

/// Samples a surface mesh (near uniformly) into a point cloud.
///
/// All mesh vertices are kept; the remaining points are spread over the
/// faces in proportion to their area. Every point gets a normal interpolated
/// from the vertex normals, and a color when the mesh has `v:color`.
pub struct SurfaceMeshSampler;

impl SurfaceMeshSampler {
    /// Samples `mesh` into about `num` points.
    ///
    /// `num` should exceed the vertex count; otherwise only the vertices are
    /// returned.
    pub fn apply(mesh: &SurfaceMesh, num: usize) -> AlgoResult<PointCloud> {
        Self::apply_with_rng(mesh, num, &mut rand::thread_rng())
    }

    /// Same as [`SurfaceMeshSampler::apply`] with a reproducible random sequence.
    pub fn apply_seeded(mesh: &SurfaceMesh, num: usize, seed: u64) -> AlgoResult<PointCloud> {
        Self::apply_with_rng(mesh, num, &mut StdRng::seed_from_u64(seed))
    }

    pub fn apply_with_rng<R: Rng + ?Sized>(
        mesh: &SurfaceMesh,
        num: usize,
        rng: &mut R,
    ) -> AlgoResult<PointCloud> {
        if mesh.n_faces() == 0 {
            return Err(AlgoError::EmptyMesh(mesh.name().to_string()));
        }

        let points = mesh.points();
        let vertex_normals = mesh
            .vertex_properties()
            .get::<Vec3>("v:normal")
            .map_or_else(|| area_weighted_normals(mesh), <[Vec3]>::to_vec);
        let vertex_colors = mesh.vertex_properties().get::<Vec3>("v:color");

        let mut positions = points.to_vec();
        let mut normals = vertex_normals.clone();
        let mut colors = vertex_colors.map(<[Vec3]>::to_vec);

        let nv = mesh.n_vertices();
        if num <= nv {
            log::warn!(
                "requested {num} points but the mesh has {nv} vertices, keeping the vertices only"
            );
        } else {
            let triangles = mesh.triangles();
            let areas: Vec<f64> = triangles
                .iter()
                .map(|&([a, b, c], _)| {
                    f64::from((points[b] - points[a]).cross(points[c] - points[a]).length() * 0.5)
                })
                .collect();
            let total: f64 = areas.iter().sum();
            if total <= 0.0 {
                log::warn!("mesh '{}' has zero area, keeping the vertices only", mesh.name());
            } else {
                let extra = num - nv;
                let mut cumulative = 0.0;
                let mut emitted = 0usize;
                for (&([a, b, c], f), &area) in triangles.iter().zip(&areas) {
                    cumulative += area;
                    let target = (((cumulative / total) * extra as f64).round() as usize).min(extra);
                    let count = target.saturating_sub(emitted);
                    emitted += count;

                    let face_normal = mesh.face_normal(f);
                    for _ in 0..count {
                        let s = rng.gen::<f32>().sqrt();
                        let r = rng.gen::<f32>();
                        let w = [1.0 - s, s * (1.0 - r), s * r];

                        positions.push(points[a] * w[0] + points[b] * w[1] + points[c] * w[2]);
                        let n = vertex_normals[a] * w[0]
                            + vertex_normals[b] * w[1]
                            + vertex_normals[c] * w[2];
                        normals.push(n.try_normalize().unwrap_or(face_normal));
                        if let (Some(out), Some(src)) = (colors.as_mut(), vertex_colors) {
                            out.push(src[a] * w[0] + src[b] * w[1] + src[c] * w[2]);
                        }
                    }
                }
            }
        }

        let mut cloud = PointCloud::from_points(format!("{}_sampled", mesh.name()), positions);
        cloud.vertex_properties_mut().set("v:normal", normals)?;
        if let Some(colors) = colors {
            cloud.vertex_properties_mut().set("v:color", colors)?;
        }
        log::debug!("sampled {} points from '{}'", cloud.n_vertices(), mesh.name());
        Ok(cloud)
    }
}

fn area_weighted_normals(mesh: &SurfaceMesh) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; mesh.n_vertices()];
    for f in 0..mesh.n_faces() {
        let n = mesh.face_normal(f) * mesh.face_area(f);
        for &v in mesh.face_vertices(f) {
            normals[v] += n;
        }
    }
    normals.iter().map(|n| n.normalize_or_zero()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn square() -> SurfaceMesh {
        SurfaceMesh::from_polygons(
            "square",
            [Vec3::ZERO, Vec3::X, Vec3::new(1.0, 1.0, 0.0), Vec3::Y],
            [[0, 1, 2], [0, 2, 3]],
        )
        .unwrap()
    }

    #[test]
    fn test_samples_lie_on_the_surface() {
        let cloud = SurfaceMeshSampler::apply_seeded(&square(), 104, 7).unwrap();
        assert_eq!(cloud.n_vertices(), 104);
        assert_eq!(cloud.name(), "square_sampled");
        for p in cloud.points() {
            assert!(p.z.abs() < 1e-6);
            assert!((-1e-6..=1.0 + 1e-6).contains(&p.x));
            assert!((-1e-6..=1.0 + 1e-6).contains(&p.y));
        }
        for n in cloud.normals().unwrap() {
            assert!((n.z - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_area_proportional() {
        // The second face is four times larger than the first.
        let mesh = SurfaceMesh::from_polygons(
            "two",
            [
                Vec3::ZERO,
                Vec3::X,
                Vec3::Y,
                Vec3::new(10.0, 0.0, 0.0),
                Vec3::new(12.0, 0.0, 0.0),
                Vec3::new(10.0, 2.0, 0.0),
            ],
            [[0, 1, 2], [3, 4, 5]],
        )
        .unwrap();
        let cloud = SurfaceMeshSampler::apply_seeded(&mesh, 1006, 1).unwrap();
        let far = cloud.points()[6..].iter().filter(|p| p.x >= 10.0).count();
        assert_eq!(far, 800);
    }

    #[test]
    fn test_keeps_vertices_and_colors() {
        let mut mesh = square();
        mesh.vertex_properties_mut()
            .set("v:color", vec![Vec3::X; 4])
            .unwrap();
        let cloud = SurfaceMeshSampler::apply_seeded(&mesh, 20, 3).unwrap();
        assert_eq!(&cloud.points()[..4], mesh.points());
        assert!(cloud
            .colors()
            .unwrap()
            .iter()
            .all(|c| (*c - Vec3::X).length() < 1e-5));
    }

    #[test]
    fn test_too_few_points_keeps_vertices() {
        let cloud = SurfaceMeshSampler::apply_seeded(&square(), 2, 0).unwrap();
        assert_eq!(cloud.n_vertices(), 4);
    }

    #[test]
    fn test_empty_mesh() {
        let mesh = SurfaceMesh::new("empty");
        assert!(matches!(
            SurfaceMeshSampler::apply(&mesh, 10),
            Err(AlgoError::EmptyMesh(_))
        ));
    }

    proptest! {
        #[test]
        fn prop_point_count(num in 0usize..500, seed in any::<u64>()) {
            let cloud = SurfaceMeshSampler::apply_seeded(&square(), num, seed).unwrap();
            prop_assert_eq!(cloud.n_vertices(), num.max(4));
        }
    }
}
