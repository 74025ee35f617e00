//! Point cloud reading and writing (PLY, XYZ).

use std::fmt::Write as _;
use std::path::Path;

use easy3d_core::{Easy3dError, Model, PointCloud, Result, Vec3};

use super::ply::{self, PlyElement};
use super::{extension, model_name};

/// Loads a point cloud from a `.ply` or `.xyz` file.
pub fn load(path: impl AsRef<Path>) -> Result<PointCloud> {
    let path = path.as_ref();
    let cloud = match extension(path).as_str() {
        "ply" => from_ply(path, &ply::read(path)?)?,
        "xyz" => load_xyz(path)?,
        other => return Err(Easy3dError::UnsupportedFormat(other.to_string())),
    };
    log::info!("point cloud loaded: {} ({} points)", path.display(), cloud.n_vertices());
    Ok(cloud)
}

/// Saves a point cloud to a `.ply` or `.xyz` file.
pub fn save(path: impl AsRef<Path>, cloud: &PointCloud) -> Result<()> {
    let path = path.as_ref();
    match extension(path).as_str() {
        "ply" => ply::write(path, &[ply::vertex_element(cloud)]),
        "xyz" => save_xyz(path, cloud),
        other => Err(Easy3dError::UnsupportedFormat(other.to_string())),
    }
}

pub(crate) fn from_ply(path: &Path, elements: &[PlyElement]) -> Result<PointCloud> {
    let vertex = ply::element(elements, "vertex")
        .ok_or_else(|| Easy3dError::Parse(format!("{}: no vertex element", path.display())))?;
    let mut cloud = PointCloud::from_points(model_name(path), vertex.positions()?);
    vertex.copy_properties("v", cloud.vertex_properties_mut(), &[])?;
    Ok(cloud)
}

/// `x y z [nx ny nz]` per line; `#` starts a comment.
fn load_xyz(path: &Path) -> Result<PointCloud> {
    let text = std::fs::read_to_string(path)?;
    let mut points = Vec::new();
    let mut normals = Vec::new();
    for (line_no, line) in text.lines().enumerate() {
        let line = line.split('#').next().unwrap_or_default().trim();
        if line.is_empty() {
            continue;
        }
        let values = line
            .split_whitespace()
            .map(str::parse::<f32>)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| {
                Easy3dError::Parse(format!("{}:{}: {e}", path.display(), line_no + 1))
            })?;
        if values.len() < 3 {
            return Err(Easy3dError::Parse(format!(
                "{}:{}: expected at least 3 coordinates",
                path.display(),
                line_no + 1
            )));
        }
        points.push(Vec3::new(values[0], values[1], values[2]));
        if values.len() >= 6 {
            normals.push(Vec3::new(values[3], values[4], values[5]));
        }
    }

    let n = points.len();
    let mut cloud = PointCloud::from_points(model_name(path), points);
    if n > 0 && normals.len() == n {
        cloud.vertex_properties_mut().set("v:normal", normals)?;
    }
    Ok(cloud)
}

fn save_xyz(path: &Path, cloud: &PointCloud) -> Result<()> {
    let mut out = String::new();
    let normals = cloud.normals();
    for (i, p) in cloud.points().iter().enumerate() {
        let _ = write!(out, "{} {} {}", p.x, p.y, p.z);
        if let Some(n) = normals {
            let _ = write!(out, " {} {} {}", n[i].x, n[i].y, n[i].z);
        }
        out.push('\n');
    }
    std::fs::write(path, out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("easy3d_pc_{}_{name}", std::process::id()))
    }

    #[test]
    fn test_xyz_with_normals() {
        let path = temp("normals.xyz");
        std::fs::write(&path, "# header\n0 0 0 0 0 1\n1 2 3 0 1 0\n\n").unwrap();
        let cloud = load(&path).unwrap();
        assert_eq!(cloud.n_vertices(), 2);
        assert_eq!(cloud.points()[1], Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(cloud.normals().unwrap()[1], Vec3::Y);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_xyz_bad_line() {
        let path = temp("bad.xyz");
        std::fs::write(&path, "0 0\n").unwrap();
        assert!(matches!(load(&path), Err(Easy3dError::Parse(_))));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_ply_keeps_colors_and_scalars() {
        let path = temp("colors.ply");
        let mut cloud = PointCloud::from_points("c", [Vec3::ZERO, Vec3::ONE]);
        cloud
            .vertex_properties_mut()
            .set("v:color", vec![Vec3::X, Vec3::Z])
            .unwrap();
        cloud
            .vertex_properties_mut()
            .set("v:height", vec![0.25f32, 0.75])
            .unwrap();
        save(&path, &cloud).unwrap();

        let loaded = load(&path).unwrap();
        assert_eq!(loaded.points(), cloud.points());
        assert_eq!(loaded.colors().unwrap(), &[Vec3::X, Vec3::Z]);
        assert_eq!(
            loaded.vertex_properties().get::<f32>("v:height").unwrap(),
            &[0.25, 0.75]
        );
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_unknown_extension() {
        assert!(matches!(
            load("cloud.las"),
            Err(Easy3dError::UnsupportedFormat(ext)) if ext == "las"
        ));
    }
}
