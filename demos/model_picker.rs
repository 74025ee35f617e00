//! Picks models under the cursor.
//!
//! Three boxes are placed side by side and a row of simulated clicks reports
//! which model each one hits. The picked model is selected and drawn with its
//! edges; the final view is written to `model_picker.png`.

use easy3d::*;

fn boxed(name: &str, center: Vec3, half: Vec3) -> Result<SurfaceMesh> {
    let corners: Vec<Vec3> = (0..8)
        .map(|i| {
            let sign = |bit: usize| if i & bit == 0 { -1.0 } else { 1.0 };
            center + half * Vec3::new(sign(1), sign(2), sign(4))
        })
        .collect();
    let faces = [
        [0, 2, 3, 1],
        [4, 5, 7, 6],
        [0, 1, 5, 4],
        [2, 6, 7, 3],
        [0, 4, 6, 2],
        [1, 3, 7, 5],
    ];
    SurfaceMesh::from_polygons(name, corners, faces)
}

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    initialize()?;

    let mut viewer = Viewer::new("Tutorial_ModelPicker", 600, 300);
    for (i, name) in ["left", "middle", "right"].into_iter().enumerate() {
        let x = (i as f32 - 1.0) * 2.5;
        let half = Vec3::new(0.8, 0.4 + 0.3 * i as f32, 0.8);
        viewer.add_model(Box::new(boxed(name, Vec3::new(x, 0.0, 0.0), half)?))?;
    }
    viewer.fit_screen(None);

    let y = viewer.height() as f32 / 2.0;
    let mut picked = None;
    for step in 0..=10 {
        let x = viewer.width() as f32 * step as f32 / 10.0;
        match viewer.pick_model(x, y) {
            Some(i) => {
                let name = viewer.model(i).map_or("?", |m| m.name());
                println!("click ({x:.0}, {y:.0}): {name}");
                picked = Some(i);
            }
            None => println!("click ({x:.0}, {y:.0}): nothing"),
        }
    }

    if let Some(renderer) = picked.and_then(|i| viewer.renderer_mut(i)) {
        renderer.set_selected(true);
        if let Some(edges) = renderer.get_lines_drawable_mut("edges") {
            edges.set_visible(true);
        }
    }
    viewer.snapshot("model_picker.png")?;
    Ok(())
}
