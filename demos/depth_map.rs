//! Renders a model and exports its depth buffer.
//!
//! Usage: `cargo run --example depth_map [model file]`. Without a file a
//! height field is generated. Writes `depth_map.png` and `color.png`.

use easy3d::*;

fn height_field(n: usize) -> Result<SurfaceMesh> {
    let mut points = Vec::with_capacity(n * n);
    for j in 0..n {
        for i in 0..n {
            let (x, y) = (i as f32 / (n - 1) as f32 - 0.5, j as f32 / (n - 1) as f32 - 0.5);
            let z = 0.15 * (8.0 * x).sin() * (6.0 * y).cos();
            points.push(Vec3::new(x, y, z));
        }
    }
    let mut faces = Vec::new();
    for j in 0..n - 1 {
        for i in 0..n - 1 {
            let v = j * n + i;
            faces.push([v, v + 1, v + n + 1]);
            faces.push([v, v + n + 1, v + n]);
        }
    }
    SurfaceMesh::from_polygons("height_field", points, faces)
}

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    initialize()?;

    let model: Box<dyn Model> = match std::env::args().nth(1) {
        Some(path) => fileio::load_model(path)?,
        None => Box::new(height_field(64)?),
    };

    let mut viewer = Viewer::new("Tutorial_DepthMap", 640, 480);
    viewer.add_model(model)?;
    viewer.fit_screen(None);
    // Look at the surface from an angle so the depth varies.
    let center = viewer.camera().scene_center();
    viewer
        .camera_mut()
        .frame_mut()
        .frame_mut()
        .rotate_around_point(Quat::from_rotation_x(0.8), center);

    viewer.save_depth_map("depth_map.png")?;
    viewer.snapshot("color.png")?;
    Ok(())
}
