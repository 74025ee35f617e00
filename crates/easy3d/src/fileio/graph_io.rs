//! Graph reading and writing.
//!
//! Graphs are stored as PLY files with a `vertex` element and an `edge`
//! element holding `vertex1 vertex2` index pairs.

use std::path::Path;

use easy3d_core::{Easy3dError, Graph, Model, Result};

use super::ply::{self, PlyElement, ScalarKind};
use super::{extension, model_name};

/// Loads a graph from a `.ply` file.
pub fn load(path: impl AsRef<Path>) -> Result<Graph> {
    let path = path.as_ref();
    if extension(path) != "ply" {
        return Err(Easy3dError::UnsupportedFormat(extension(path)));
    }
    let graph = from_ply(path, &ply::read(path)?)?;
    log::info!(
        "graph loaded: {} ({} vertices, {} edges)",
        path.display(),
        graph.n_vertices(),
        graph.n_edges()
    );
    Ok(graph)
}

/// Saves a graph to a `.ply` file.
pub fn save(path: impl AsRef<Path>, graph: &Graph) -> Result<()> {
    let path = path.as_ref();
    if extension(path) != "ply" {
        return Err(Easy3dError::UnsupportedFormat(extension(path)));
    }
    let mut edge = PlyElement::new("edge", graph.n_edges());
    for (k, name) in ["vertex1", "vertex2"].into_iter().enumerate() {
        edge.push_scalar(
            name,
            ScalarKind::Int,
            graph.edges().iter().map(|e| e[k] as f64).collect(),
        );
    }
    edge.add_properties(graph.edge_properties(), &[]);
    ply::write(path, &[ply::vertex_element(graph), edge])
}

pub(crate) fn from_ply(path: &Path, elements: &[PlyElement]) -> Result<Graph> {
    let vertex = ply::element(elements, "vertex")
        .ok_or_else(|| Easy3dError::Parse(format!("{}: no vertex element", path.display())))?;
    let edge = ply::element(elements, "edge")
        .ok_or_else(|| Easy3dError::Parse(format!("{}: no edge element", path.display())))?;
    let (Some(first), Some(second)) = (edge.scalar("vertex1"), edge.scalar("vertex2")) else {
        return Err(Easy3dError::Parse(format!(
            "{}: edges have no vertex1/vertex2",
            path.display()
        )));
    };

    let mut graph = Graph::new(model_name(path));
    for p in vertex.positions()? {
        graph.add_vertex(p);
    }
    for (&a, &b) in first.values.iter().zip(&second.values) {
        if a < 0.0 || b < 0.0 {
            return Err(Easy3dError::InvalidEdge(a as usize, b as usize));
        }
        graph.add_edge(a as usize, b as usize)?;
    }
    vertex.copy_properties("v", graph.vertex_properties_mut(), &[])?;
    edge.copy_properties("e", graph.edge_properties_mut(), &["vertex1", "vertex2"])?;
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use easy3d_core::Vec3;

    #[test]
    fn test_round_trip_with_edge_property() {
        let path = std::env::temp_dir().join(format!("easy3d_graph_{}.ply", std::process::id()));
        let mut graph = Graph::new("g");
        for p in [Vec3::ZERO, Vec3::X, Vec3::Y] {
            graph.add_vertex(p);
        }
        graph.add_edge(0, 1).unwrap();
        graph.add_edge(1, 2).unwrap();
        graph
            .edge_properties_mut()
            .set("e:weight", vec![0.5f32, 2.0])
            .unwrap();
        save(&path, &graph).unwrap();

        let loaded = load(&path).unwrap();
        assert_eq!(loaded.edges(), graph.edges());
        assert_eq!(loaded.points(), graph.points());
        assert_eq!(
            loaded.edge_properties().get::<f32>("e:weight").unwrap(),
            &[0.5, 2.0]
        );
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_duplicate_edge_is_rejected() {
        let path = std::env::temp_dir().join(format!("easy3d_graph_dup_{}.ply", std::process::id()));
        std::fs::write(
            &path,
            "ply\nformat ascii 1.0\nelement vertex 2\nproperty float x\nproperty float y\n\
             property float z\nelement edge 2\nproperty int vertex1\nproperty int vertex2\n\
             end_header\n0 0 0\n1 0 0\n0 1\n1 0\n",
        )
        .unwrap();
        assert!(matches!(load(&path), Err(Easy3dError::InvalidEdge(1, 0))));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_only_ply() {
        assert!(matches!(
            load("graph.obj"),
            Err(Easy3dError::UnsupportedFormat(_))
        ));
    }
}
