//! Ray-cast picking of mesh faces and model vertices.
//!
//! Model picking goes through the id plane of a framebuffer; these helpers
//! refine a hit down to a single face or vertex without rendering.

use easy3d_core::{Model, SurfaceMesh};
use glam::{Vec2, Vec3};

use crate::camera::Camera;

const PARALLEL_EPSILON: f32 = 1e-7;

/// Where a ray crosses a triangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Distance along the (unit) ray direction.
    pub t: f32,
    /// Barycentric weights of the second and third corners.
    pub uv: Vec2,
}

/// Intersects the ray `origin + t * dir` (t > 0) with triangle `tri`.
#[must_use]
pub fn intersect_triangle(origin: Vec3, dir: Vec3, tri: [Vec3; 3]) -> Option<RayHit> {
    let e1 = tri[1] - tri[0];
    let e2 = tri[2] - tri[0];
    let p = dir.cross(e2);
    let det = e1.dot(p);
    if det.abs() < PARALLEL_EPSILON {
        return None;
    }
    let inv = det.recip();
    let to_origin = origin - tri[0];
    let u = to_origin.dot(p) * inv;
    let q = to_origin.cross(e1);
    let v = dir.dot(q) * inv;
    if u < 0.0 || v < 0.0 || u + v > 1.0 {
        return None;
    }
    let t = e2.dot(q) * inv;
    (t > PARALLEL_EPSILON).then_some(RayHit {
        t,
        uv: Vec2::new(u, v),
    })
}

/// Result of picking a face.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FacePick {
    pub face: usize,
    /// Hit point in world coordinates.
    pub point: Vec3,
}

/// The face of `mesh` under pixel `(x, y)`, nearest to the camera.
#[must_use]
pub fn pick_face(mesh: &SurfaceMesh, camera: &Camera, x: f32, y: f32) -> Option<FacePick> {
    let (origin, dir) = camera.convert_click_to_line(x, y);
    let points = mesh.points();
    let (t, face) = mesh
        .triangles()
        .into_iter()
        .filter_map(|([a, b, c], face)| {
            intersect_triangle(origin, dir, [points[a], points[b], points[c]])
                .map(|hit| (hit.t, face))
        })
        .min_by(|l, r| l.0.total_cmp(&r.0))?;
    Some(FacePick {
        face,
        point: origin + dir * t,
    })
}

/// The vertex of `model` whose projection is closest to pixel `(x, y)`,
/// within `max_distance` pixels and in front of the camera.
#[must_use]
pub fn pick_vertex(
    model: &dyn Model,
    camera: &Camera,
    x: f32,
    y: f32,
    max_distance: f32,
) -> Option<usize> {
    let cursor = Vec2::new(x, y);
    let mut best: Option<(f32, usize)> = None;
    for (i, &p) in model.points().iter().enumerate() {
        let s = camera.projected_coordinates_of(p);
        if !(0.0..=1.0).contains(&s.z) {
            continue;
        }
        let d = s.truncate().distance(cursor);
        if d <= max_distance && best.map_or(true, |(bd, _)| d < bd) {
            best = Some((d, i));
        }
    }
    best.map(|(_, i)| i)
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNIT: [Vec3; 3] = [Vec3::ZERO, Vec3::X, Vec3::Y];

    #[test]
    fn test_intersect_triangle() {
        let hit = intersect_triangle(Vec3::new(0.2, 0.3, 5.0), Vec3::NEG_Z, UNIT).unwrap();
        assert!((hit.t - 5.0).abs() < 1e-5);
        assert!((hit.uv - Vec2::new(0.2, 0.3)).length() < 1e-5);

        // Outside the triangle
        assert!(intersect_triangle(Vec3::new(0.8, 0.8, 5.0), Vec3::NEG_Z, UNIT).is_none());
        // Triangle behind the ray
        assert!(intersect_triangle(Vec3::new(0.2, 0.2, -5.0), Vec3::NEG_Z, UNIT).is_none());
        // Ray parallel to the plane
        assert!(intersect_triangle(Vec3::new(-1.0, 0.2, 0.0), Vec3::X, UNIT).is_none());
    }

    fn two_layers() -> SurfaceMesh {
        SurfaceMesh::from_polygons(
            "layers",
            vec![
                Vec3::new(-1.0, -1.0, 0.0),
                Vec3::new(1.0, -1.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
                Vec3::new(-1.0, -1.0, 0.5),
                Vec3::new(1.0, -1.0, 0.5),
                Vec3::new(0.0, 1.0, 0.5),
            ],
            &[[0usize, 1, 2], [3, 4, 5]],
        )
        .unwrap()
    }

    #[test]
    fn test_pick_face_nearest() {
        let mesh = two_layers();
        let camera = Camera::new(100, 100);
        let hit = pick_face(&mesh, &camera, 50.0, 50.0).unwrap();
        assert_eq!(hit.face, 1);
        assert!((hit.point.z - 0.5).abs() < 1e-4);
        assert!(pick_face(&mesh, &camera, 0.0, 0.0).is_none());
    }

    #[test]
    fn test_pick_vertex() {
        let mesh = two_layers();
        let camera = Camera::new(100, 100);
        let s = camera.projected_coordinates_of(Vec3::new(0.0, 1.0, 0.5));
        assert_eq!(pick_vertex(&mesh, &camera, s.x + 1.0, s.y, 5.0), Some(5));
        assert_eq!(pick_vertex(&mesh, &camera, 1.0, 99.0, 2.0), None);
    }
}
