//! Load, process and save models end to end.

use easy3d::fileio::{self, point_cloud_io, surface_mesh_io};
use easy3d::*;

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
    let faces = [
        [0, 2, 1],
        [0, 3, 2],
        [4, 5, 6],
        [4, 6, 7],
        [0, 1, 5],
        [0, 5, 4],
        [3, 7, 6],
        [3, 6, 2],
        [0, 4, 7],
        [0, 7, 3],
        [1, 2, 6],
        [1, 6, 5],
    ];
    SurfaceMesh::from_polygons("cube", points, faces).expect("valid cube")
}

fn temp_dir(name: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("easy3d_{name}_{}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("temp dir");
    dir
}

#[test]
fn test_sample_saved_mesh() {
    let _ = initialize();
    let dir = temp_dir("sample");

    surface_mesh_io::save(dir.join("cube.off"), &cube()).unwrap();
    let loaded = fileio::load_model(dir.join("cube.off")).unwrap();
    let mesh = loaded
        .as_any()
        .downcast_ref::<SurfaceMesh>()
        .expect("an OFF file holds a mesh");
    assert_eq!(mesh.n_faces(), 12);
    assert_eq!(mesh.name(), "cube.off");

    let cloud = SurfaceMeshSampler::apply_seeded(mesh, 500, 7).unwrap();
    assert_eq!(cloud.n_vertices(), 500);
    assert!(cloud
        .points()
        .iter()
        .all(|p| p.min_element() >= -1e-5 && p.max_element() <= 1.0 + 1e-5));

    point_cloud_io::save(dir.join("samples.ply"), &cloud).unwrap();
    let reloaded = point_cloud_io::load(dir.join("samples.ply")).unwrap();
    assert_eq!(reloaded.n_vertices(), 500);
    let normals = reloaded.normals().expect("normals survive");
    assert!(normals.iter().all(|n| (n.length() - 1.0).abs() < 1e-3));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_polygonize_and_save_charts() {
    let dir = temp_dir("charts");
    let mut mesh = cube();

    let mut polygonizer = Polygonizer::new(&mut mesh);
    polygonizer.compute_planarity(1).unwrap();
    assert_eq!(polygonizer.polygonize(6).unwrap(), 6);

    let path = dir.join("charts.ply");
    surface_mesh_io::save(&path, &mesh).unwrap();
    let reloaded = surface_mesh_io::load(&path).unwrap();
    assert_eq!(reloaded.n_faces(), 12);
    assert_eq!(
        reloaded.face_properties().get::<i32>("f:chart"),
        mesh.face_properties().get::<i32>("f:chart")
    );
    assert!(reloaded.face_properties().contains("f:color"));
    assert!(reloaded.vertex_properties().get::<f32>("v:planarity").is_some());

    // The viewer colors the charts by the face color property.
    let mut viewer = Viewer::new("charts", 64, 64);
    viewer.add_model(Box::new(reloaded)).unwrap();
    let schemes = Renderer::color_schemes(viewer.model(0).unwrap());
    assert!(schemes.iter().any(|s| s.name == "f:color"));
    assert!(schemes.iter().any(|s| s.name == "f:chart"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_simplify_keeps_mesh_closed() {
    let mut mesh = cube();
    let mut simplifier = SurfaceMeshSimplification::new(&mut mesh);
    simplifier.initialize(0.0, 0.0, 0, 0.0, 0.0);
    simplifier.simplify(20).unwrap();
    // Nothing to do above the vertex count.
    assert_eq!(mesh.n_vertices(), 8);
    assert_eq!(mesh.n_faces(), 12);

    let mut quads = SurfaceMesh::from_polygons(
        "quad",
        [Vec3::ZERO, Vec3::X, Vec3::new(1.0, 1.0, 0.0), Vec3::Y],
        [[0, 1, 2, 3]],
    )
    .unwrap();
    assert!(SurfaceMeshSimplification::new(&mut quads).simplify(3).is_err());
}

#[test]
fn test_graph_and_cloud_files() {
    let dir = temp_dir("graph");
    let mut graph = Graph::new("path");
    for i in 0..4 {
        graph.add_vertex(Vec3::new(i as f32, 0.0, 0.0));
    }
    for i in 0..3 {
        graph.add_edge(i, i + 1).unwrap();
    }
    fileio::save_model(dir.join("path.ply"), &graph).unwrap();
    let loaded = fileio::load_model(dir.join("path.ply")).unwrap();
    let loaded = loaded.as_any().downcast_ref::<Graph>().expect("a graph");
    assert_eq!(loaded.n_edges(), 3);
    assert_eq!(loaded.degree(1), 2);

    let cloud = PointCloud::from_points("pts", [Vec3::ZERO, Vec3::ONE]);
    fileio::save_model(dir.join("pts.xyz"), &cloud).unwrap();
    let loaded = fileio::load_model(dir.join("pts.xyz")).unwrap();
    assert_eq!(loaded.points(), cloud.points());

    assert!(fileio::save_model(dir.join("path.obj"), &graph).is_err());
    let _ = std::fs::remove_dir_all(&dir);
}
