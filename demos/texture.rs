//! Maps a texture onto a quad.
//!
//! Usage: `cargo run --example texture [image file]`. Without an image a
//! checkerboard is generated. The result is written to `texture.png`.

use easy3d::*;

fn checkerboard(size: u32, cells: u32) -> Texture {
    let cell = (size / cells).max(1);
    let pixels = (0..size * size)
        .map(|i| {
            let (x, y) = (i % size / cell, i / size / cell);
            if (x + y) % 2 == 0 {
                Vec4::new(0.9, 0.9, 0.9, 1.0)
            } else {
                Vec4::new(0.2, 0.3, 0.6, 1.0)
            }
        })
        .collect();
    Texture::from_pixels("checkerboard", size, size, pixels)
}

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    initialize()?;

    let mut mesh = SurfaceMesh::from_polygons(
        "quad",
        [
            Vec3::new(-1.0, -1.0, 0.0),
            Vec3::new(1.0, -1.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(-1.0, 1.0, 0.0),
        ],
        [[0, 1, 2, 3]],
    )?;
    mesh.vertex_properties_mut().set(
        "v:texcoord",
        vec![Vec2::ZERO, Vec2::X, Vec2::ONE, Vec2::Y],
    )?;

    let mut viewer = Viewer::new("Tutorial_Texture", 800, 600);
    let texture = match std::env::args().nth(1) {
        Some(path) => viewer.textures_mut().request(path)?,
        None => viewer.textures_mut().insert(checkerboard(256, 8)),
    };

    let index = viewer.add_model(Box::new(mesh))?;
    if let Some(faces) = viewer
        .renderer_mut(index)
        .and_then(|r| r.get_triangles_drawable_mut("faces"))
    {
        // Repeat the texture twice along each direction.
        faces
            .state_mut()
            .set_texture_coloring(Location::Vertex, "v:texcoord", Some(texture), 2.0, 0.0);
    }

    viewer.fit_screen(None);
    viewer.snapshot("texture.png")?;
    println!("textured quad written to texture.png");
    Ok(())
}
