//! Records a camera path around a model into an animation.
//!
//! Usage: `cargo run --example camera_path_video [model file] [output]`.
//! The output defaults to `camera_path.gif`; image extensions such as `.png`
//! produce a numbered image sequence instead.

use std::f32::consts::TAU;

use easy3d::*;

const FPS: u32 = 25;

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    initialize()?;
    let mut args = std::env::args().skip(1);

    let model: Box<dyn Model> = match args.next() {
        Some(path) => fileio::load_model(path)?,
        None => {
            let cloud = SurfaceMeshSampler::apply_seeded(&icosahedron()?, 2000, 1)?;
            Box::new(cloud)
        }
    };
    let output = args.next().unwrap_or_else(|| "camera_path.gif".to_string());

    let mut viewer = Viewer::new("Tutorial_CameraPath", 480, 360);
    viewer.add_model(model)?;
    viewer.fit_screen(None);

    // Eight key frames on a circle around the scene.
    let center = viewer.camera().scene_center();
    for _ in 0..8 {
        viewer.handle_event(&Event::KeyPress {
            key: Key::Char('k'),
            modifiers: Modifiers::ALT,
        });
        viewer
            .camera_mut()
            .frame_mut()
            .frame_mut()
            .rotate_around_point(Quat::from_rotation_y(TAU / 8.0), center);
    }
    viewer.handle_event(&Event::KeyPress {
        key: Key::Char('k'),
        modifiers: Modifiers::CTRL,
    });

    let mut encoder = VideoEncoder::new(&output, FPS, 4 * 1024 * 1024);
    let dt = 1.0 / FPS as f32;
    while viewer.camera().is_animating() {
        viewer.update(dt);
        let fb = viewer.render();
        let (w, h) = (fb.width(), fb.height());
        encoder.encode(&fb.to_rgba8(), w, h, PixelFormat::Rgba8888)?;
    }
    let frames = encoder.end()?;
    println!("{frames} frames written to {output}");
    Ok(())
}

fn icosahedron() -> Result<SurfaceMesh> {
    let t = (1.0 + 5.0_f32.sqrt()) / 2.0;
    let points = [
        Vec3::new(-1.0, t, 0.0),
        Vec3::new(1.0, t, 0.0),
        Vec3::new(-1.0, -t, 0.0),
        Vec3::new(1.0, -t, 0.0),
        Vec3::new(0.0, -1.0, t),
        Vec3::new(0.0, 1.0, t),
        Vec3::new(0.0, -1.0, -t),
        Vec3::new(0.0, 1.0, -t),
        Vec3::new(t, 0.0, -1.0),
        Vec3::new(t, 0.0, 1.0),
        Vec3::new(-t, 0.0, -1.0),
        Vec3::new(-t, 0.0, 1.0),
    ];
    let faces = [
        [0, 11, 5],
        [0, 5, 1],
        [0, 1, 7],
        [0, 7, 10],
        [0, 10, 11],
        [1, 5, 9],
        [5, 11, 4],
        [11, 10, 2],
        [10, 7, 6],
        [7, 1, 8],
        [3, 9, 4],
        [3, 4, 2],
        [3, 2, 6],
        [3, 6, 8],
        [3, 8, 9],
        [4, 9, 5],
        [2, 4, 11],
        [6, 2, 10],
        [8, 6, 7],
        [9, 8, 1],
    ];
    SurfaceMesh::from_polygons("icosahedron", points, faces)
}
