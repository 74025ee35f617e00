//! Colors a surface mesh by a per-vertex scalar field.
//!
//! Usage: `cargo run --example scalar_field [mesh file]`. Without a file a
//! torus is generated. The result is written to `scalar_field.png`.

use std::f32::consts::TAU;

use easy3d::fileio::surface_mesh_io;
use easy3d::*;

fn torus(major: f32, minor: f32, nu: usize, nv: usize) -> Result<SurfaceMesh> {
    let mut points = Vec::with_capacity(nu * nv);
    for i in 0..nu {
        let u = TAU * i as f32 / nu as f32;
        for j in 0..nv {
            let v = TAU * j as f32 / nv as f32;
            let r = major + minor * v.cos();
            points.push(Vec3::new(r * u.cos(), r * u.sin(), minor * v.sin()));
        }
    }
    let mut faces = Vec::with_capacity(nu * nv);
    for i in 0..nu {
        for j in 0..nv {
            let (i1, j1) = ((i + 1) % nu, (j + 1) % nv);
            faces.push([i * nv + j, i1 * nv + j, i1 * nv + j1, i * nv + j1]);
        }
    }
    SurfaceMesh::from_polygons("torus", points, faces)
}

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    initialize()?;

    let mut mesh = match std::env::args().nth(1) {
        Some(path) => surface_mesh_io::load(path)?,
        None => torus(1.0, 0.35, 48, 24)?,
    };

    // Height above the lowest vertex.
    let bbox = mesh.bounding_box();
    let heights: Vec<f32> = mesh
        .points()
        .iter()
        .map(|p| p.z - bbox.min_point().z)
        .collect();
    mesh.vertex_properties_mut().set("v:height", heights)?;

    let mut viewer = Viewer::new("Tutorial_ScalarField", 800, 600);
    let index = viewer.add_model(Box::new(mesh))?;
    if let Some(faces) = viewer
        .renderer_mut(index)
        .and_then(|r| r.get_triangles_drawable_mut("faces"))
    {
        // Default color map, 5% of the values clamped at each end.
        faces
            .state_mut()
            .set_scalar_coloring(Location::Vertex, "v:height", None, 0.05, 0.05);
    }

    viewer.fit_screen(None);
    viewer.snapshot("scalar_field.png")?;
    println!("scalar field written to scalar_field.png");
    Ok(())
}
