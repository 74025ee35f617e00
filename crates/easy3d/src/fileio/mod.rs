//! Reading and writing models.
//!
//! | model        | read            | write           |
//! |--------------|-----------------|-----------------|
//! | point cloud  | ply, xyz        | ply, xyz        |
//! | surface mesh | ply, obj, off   | ply, obj, off   |
//! | graph        | ply             | ply             |
//!
//! [`load_model`] picks the model kind from the file: a PLY file with faces is
//! a mesh, one with edges a graph, anything else a point cloud.

pub mod graph_io;
mod ply;
pub mod point_cloud_io;
pub mod surface_mesh_io;

use std::path::Path;

use easy3d_core::{Easy3dError, Graph, Model, PointCloud, Result, SurfaceMesh};

/// Lower-case extension of `path`, empty when there is none.
pub(crate) fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default()
}

/// Name given to a model read from `path`: its file name.
pub(crate) fn model_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .map_or_else(|| path.display().to_string(), str::to_string)
}

/// Loads any model from a file.
pub fn load_model(path: impl AsRef<Path>) -> Result<Box<dyn Model>> {
    let path = path.as_ref();
    match extension(path).as_str() {
        "ply" => {
            let elements = ply::read(path)?;
            let has = |name: &str| ply::element(&elements, name).is_some_and(|e| e.count > 0);
            let model: Box<dyn Model> = if has("face") {
                Box::new(surface_mesh_io::from_ply(path, &elements)?)
            } else if has("edge") {
                Box::new(graph_io::from_ply(path, &elements)?)
            } else {
                Box::new(point_cloud_io::from_ply(path, &elements)?)
            };
            log::info!(
                "{} loaded: {} ({} vertices)",
                model.type_name(),
                path.display(),
                model.n_vertices()
            );
            Ok(model)
        }
        "obj" | "off" => Ok(Box::new(surface_mesh_io::load(path)?)),
        "xyz" => Ok(Box::new(point_cloud_io::load(path)?)),
        other => Err(Easy3dError::UnsupportedFormat(other.to_string())),
    }
}

/// Saves any model to a file in a format its kind supports.
pub fn save_model(path: impl AsRef<Path>, model: &dyn Model) -> Result<()> {
    let any = model.as_any();
    if let Some(cloud) = any.downcast_ref::<PointCloud>() {
        point_cloud_io::save(path, cloud)
    } else if let Some(mesh) = any.downcast_ref::<SurfaceMesh>() {
        surface_mesh_io::save(path, mesh)
    } else if let Some(graph) = any.downcast_ref::<Graph>() {
        graph_io::save(path, graph)
    } else {
        Err(Easy3dError::UnsupportedFormat(model.type_name().to_string()))
    }
}
