//! Surface mesh reading and writing (PLY, OBJ, OFF).

use std::fmt::Write as _;
use std::path::Path;

use easy3d_core::{Easy3dError, Model, Result, SurfaceMesh, Vec2, Vec3};

use super::ply::{self, ListColumn, PlyElement};
use super::{extension, model_name};

const FACE_LISTS: [&str; 2] = ["vertex_indices", "vertex_index"];

/// Loads a surface mesh from a `.ply`, `.obj` or `.off` file.
pub fn load(path: impl AsRef<Path>) -> Result<SurfaceMesh> {
    let path = path.as_ref();
    let mesh = match extension(path).as_str() {
        "ply" => from_ply(path, &ply::read(path)?)?,
        "obj" => load_obj(path)?,
        "off" => load_off(path)?,
        other => return Err(Easy3dError::UnsupportedFormat(other.to_string())),
    };
    log::info!(
        "surface mesh loaded: {} ({} vertices, {} faces)",
        path.display(),
        mesh.n_vertices(),
        mesh.n_faces()
    );
    Ok(mesh)
}

/// Saves a surface mesh to a `.ply`, `.obj` or `.off` file.
pub fn save(path: impl AsRef<Path>, mesh: &SurfaceMesh) -> Result<()> {
    let path = path.as_ref();
    match extension(path).as_str() {
        "ply" => save_ply(path, mesh),
        "obj" => save_obj(path, mesh),
        "off" => save_off(path, mesh),
        other => Err(Easy3dError::UnsupportedFormat(other.to_string())),
    }
}

pub(crate) fn from_ply(path: &Path, elements: &[PlyElement]) -> Result<SurfaceMesh> {
    let vertex = ply::element(elements, "vertex")
        .ok_or_else(|| Easy3dError::Parse(format!("{}: no vertex element", path.display())))?;
    let face = ply::element(elements, "face")
        .ok_or_else(|| Easy3dError::Parse(format!("{}: no face element", path.display())))?;
    let indices = face.list(&FACE_LISTS).ok_or_else(|| {
        Easy3dError::Parse(format!("{}: faces have no vertex_indices", path.display()))
    })?;

    let mut mesh = SurfaceMesh::from_polygons(model_name(path), vertex.positions()?, &indices.values)?;
    vertex.copy_properties("v", mesh.vertex_properties_mut(), &[])?;
    face.copy_properties("f", mesh.face_properties_mut(), &[])?;
    Ok(mesh)
}

fn save_ply(path: &Path, mesh: &SurfaceMesh) -> Result<()> {
    let mut face = PlyElement::new("face", mesh.n_faces());
    face.lists.push(ListColumn {
        name: "vertex_indices".to_string(),
        values: mesh.faces().to_vec(),
    });
    face.add_properties(mesh.face_properties(), &["f:normal"]);
    ply::write(path, &[ply::vertex_element(mesh), face])
}

/// Reads an OBJ file with `tobj`. All objects of the file are merged into one
/// mesh; polygons are kept as they are.
fn load_obj(path: &Path) -> Result<SurfaceMesh> {
    let (models, _materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            triangulate: false,
            single_index: true,
            ..Default::default()
        },
    )
    .map_err(|e| Easy3dError::Parse(format!("{}: {e}", path.display())))?;

    let mut mesh = SurfaceMesh::new(model_name(path));
    let mut normals = Vec::new();
    let mut texcoords = Vec::new();
    let mut colors = Vec::new();
    let (mut has_normals, mut has_texcoords, mut has_colors) = (true, true, true);

    for model in &models {
        let m = &model.mesh;
        let offset = mesh.n_vertices();
        let n = m.positions.len() / 3;
        for p in m.positions.chunks_exact(3) {
            mesh.add_vertex(Vec3::new(p[0], p[1], p[2]));
        }

        has_normals &= m.normals.len() == n * 3;
        has_texcoords &= m.texcoords.len() == n * 2;
        has_colors &= m.vertex_color.len() == n * 3;
        normals.extend(m.normals.chunks_exact(3).map(|v| Vec3::new(v[0], v[1], v[2])));
        texcoords.extend(m.texcoords.chunks_exact(2).map(|t| Vec2::new(t[0], t[1])));
        colors.extend(m.vertex_color.chunks_exact(3).map(|c| Vec3::new(c[0], c[1], c[2])));

        let mut start = 0;
        let arities = if m.face_arities.is_empty() {
            vec![3; m.indices.len() / 3]
        } else {
            m.face_arities.clone()
        };
        for arity in arities {
            let end = start + arity as usize;
            let face: Vec<usize> = m.indices[start..end]
                .iter()
                .map(|&i| offset + i as usize)
                .collect();
            if let Err(e) = mesh.add_face(&face) {
                log::warn!("skipping face of '{}': {e}", model.name);
            }
            start = end;
        }
    }

    let nv = mesh.n_vertices();
    if nv > 0 {
        let props = mesh.vertex_properties_mut();
        if has_normals && normals.len() == nv {
            props.set("v:normal", normals)?;
        }
        if has_texcoords && texcoords.len() == nv {
            props.set("v:texcoord", texcoords)?;
        }
        if has_colors && colors.len() == nv {
            props.set("v:color", colors)?;
        }
    }
    Ok(mesh)
}

fn save_obj(path: &Path, mesh: &SurfaceMesh) -> Result<()> {
    let props = mesh.vertex_properties();
    let normals = props.get::<Vec3>("v:normal");
    let texcoords = props.get::<Vec2>("v:texcoord");

    let mut out = format!("# {} written by easy3d-rs\n", mesh.name());
    for p in mesh.points() {
        let _ = writeln!(out, "v {} {} {}", p.x, p.y, p.z);
    }
    for t in texcoords.unwrap_or_default() {
        let _ = writeln!(out, "vt {} {}", t.x, t.y);
    }
    for n in normals.unwrap_or_default() {
        let _ = writeln!(out, "vn {} {} {}", n.x, n.y, n.z);
    }
    for face in mesh.faces() {
        out.push('f');
        for &v in face {
            let i = v + 1;
            let _ = match (texcoords.is_some(), normals.is_some()) {
                (true, true) => write!(out, " {i}/{i}/{i}"),
                (true, false) => write!(out, " {i}/{i}"),
                (false, true) => write!(out, " {i}//{i}"),
                (false, false) => write!(out, " {i}"),
            };
        }
        out.push('\n');
    }
    std::fs::write(path, out)?;
    Ok(())
}

/// Reads OFF, including the `C` (vertex colors) and `N` (vertex normals)
/// header variants. Face colors after the indices become `f:color`.
fn load_off(path: &Path) -> Result<SurfaceMesh> {
    let text = std::fs::read_to_string(path)?;
    let parse_error = |msg: &str| Easy3dError::Parse(format!("{}: {msg}", path.display()));

    let mut lines = text
        .lines()
        .map(|l| l.split('#').next().unwrap_or_default().trim())
        .filter(|l| !l.is_empty());

    let header = lines.next().ok_or_else(|| parse_error("empty file"))?;
    let mut tokens = header.split_whitespace();
    let keyword = tokens.next().unwrap_or_default();
    let Some(flags) = keyword.strip_suffix("OFF") else {
        return Err(parse_error("missing OFF header"));
    };
    let with_normals = flags.contains('N');
    let with_colors = flags.contains('C');

    // The counts may follow the keyword on the same line.
    let mut counts: Vec<&str> = tokens.collect();
    if counts.is_empty() {
        counts = lines
            .next()
            .ok_or_else(|| parse_error("missing element counts"))?
            .split_whitespace()
            .collect();
    }
    let number = |s: Option<&&str>| -> Result<usize> {
        s.and_then(|s| s.parse().ok())
            .ok_or_else(|| parse_error("invalid element counts"))
    };
    let nv = number(counts.first())?;
    let nf = number(counts.get(1))?;
    // Every element takes at least one line; the header counts are not trusted.
    let max_rows = text.lines().count();

    let mut points = Vec::with_capacity(nv.min(max_rows));
    let mut normals = Vec::new();
    let mut colors = Vec::new();
    for _ in 0..nv {
        let values = parse_floats(lines.next().ok_or_else(|| parse_error("too few vertices"))?)
            .ok_or_else(|| parse_error("invalid vertex"))?;
        let expected = 3 + if with_normals { 3 } else { 0 } + if with_colors { 3 } else { 0 };
        if values.len() < expected {
            return Err(parse_error("invalid vertex"));
        }
        points.push(Vec3::new(values[0], values[1], values[2]));
        let mut rest = &values[3..];
        if with_normals {
            normals.push(Vec3::new(rest[0], rest[1], rest[2]));
            rest = &rest[3..];
        }
        if with_colors {
            colors.push(normalize_color(Vec3::new(rest[0], rest[1], rest[2])));
        }
    }

    let mut faces = Vec::with_capacity(nf.min(max_rows));
    let mut face_colors = Vec::new();
    for _ in 0..nf {
        let line = lines.next().ok_or_else(|| parse_error("too few faces"))?;
        let mut tokens = line.split_whitespace();
        let n: usize = tokens
            .next()
            .and_then(|t| t.parse().ok())
            .ok_or_else(|| parse_error("invalid face"))?;
        let face = tokens
            .by_ref()
            .take(n)
            .map(str::parse::<usize>)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|_| parse_error("invalid face"))?;
        if face.len() != n {
            return Err(parse_error("invalid face"));
        }
        faces.push(face);
        let color: Vec<f32> = tokens.filter_map(|t| t.parse().ok()).collect();
        if color.len() >= 3 {
            face_colors.push(normalize_color(Vec3::new(color[0], color[1], color[2])));
        }
    }

    let mut mesh = SurfaceMesh::from_polygons(model_name(path), points, &faces)?;
    if with_normals {
        mesh.vertex_properties_mut().set("v:normal", normals)?;
    }
    if with_colors {
        mesh.vertex_properties_mut().set("v:color", colors)?;
    }
    if nf > 0 && face_colors.len() == nf {
        mesh.face_properties_mut().set("f:color", face_colors)?;
    }
    Ok(mesh)
}

fn parse_floats(line: &str) -> Option<Vec<f32>> {
    line.split_whitespace().map(|t| t.parse().ok()).collect()
}

/// Integer colors are given in [0, 255].
fn normalize_color(c: Vec3) -> Vec3 {
    if c.max_element() > 1.0 {
        c / 255.0
    } else {
        c
    }
}

fn save_off(path: &Path, mesh: &SurfaceMesh) -> Result<()> {
    let mut out = format!("OFF\n{} {} {}\n", mesh.n_vertices(), mesh.n_faces(), mesh.n_edges());
    for p in mesh.points() {
        let _ = writeln!(out, "{} {} {}", p.x, p.y, p.z);
    }
    for face in mesh.faces() {
        let _ = write!(out, "{}", face.len());
        for v in face {
            let _ = write!(out, " {v}");
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
        std::env::temp_dir().join(format!("easy3d_mesh_{}_{name}", std::process::id()))
    }

    fn quad_and_triangle() -> SurfaceMesh {
        SurfaceMesh::from_polygons(
            "shape",
            [
                Vec3::ZERO,
                Vec3::X,
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::Y,
                Vec3::new(2.0, 0.5, 0.0),
            ],
            [vec![0, 1, 2, 3], vec![1, 4, 2]],
        )
        .unwrap()
    }

    #[test]
    fn test_off_round_trip_keeps_polygons() {
        let path = temp("shape.off");
        let mesh = quad_and_triangle();
        save(&path, &mesh).unwrap();
        let loaded = load(&path).unwrap();
        assert_eq!(loaded.faces(), mesh.faces());
        assert_eq!(loaded.points(), mesh.points());
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_off_colors() {
        let path = temp("colored.off");
        std::fs::write(
            &path,
            "COFF\n# comment\n3 1 0\n0 0 0 255 0 0 255\n1 0 0 0 255 0 255\n0 1 0 0 0 255 255\n3 0 1 2 0 0 255\n",
        )
        .unwrap();
        let mesh = load(&path).unwrap();
        assert_eq!(mesh.vertex_properties().get::<Vec3>("v:color").unwrap()[1], Vec3::Y);
        assert_eq!(mesh.face_properties().get::<Vec3>("f:color").unwrap()[0], Vec3::Z);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_off_truncated() {
        let path = temp("truncated.off");
        std::fs::write(&path, "OFF\n3 1 0\n0 0 0\n1 0 0\n").unwrap();
        assert!(matches!(load(&path), Err(Easy3dError::Parse(_))));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_off_huge_counts_are_an_error() {
        let path = temp("huge.off");
        std::fs::write(&path, "OFF\n100000000000000 100000000000000 0\n0 0 0\n").unwrap();
        assert!(matches!(load(&path), Err(Easy3dError::Parse(_))));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_obj_keeps_quads_and_texcoords() {
        let path = temp("quad.obj");
        std::fs::write(
            &path,
            "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nvt 0 0\nvt 1 0\nvt 1 1\nvt 0 1\nf 1/1 2/2 3/3 4/4\n",
        )
        .unwrap();
        let mesh = load(&path).unwrap();
        assert_eq!(mesh.n_vertices(), 4);
        assert_eq!(mesh.n_faces(), 1);
        assert_eq!(mesh.face_vertices(0).len(), 4);
        let texcoords = mesh.vertex_properties().get::<Vec2>("v:texcoord").unwrap();
        assert_eq!(texcoords[2], Vec2::ONE);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_obj_round_trip() {
        let path = temp("shape.obj");
        let mut mesh = quad_and_triangle();
        mesh.update_vertex_normals();
        save(&path, &mesh).unwrap();
        let loaded = load(&path).unwrap();
        assert_eq!(loaded.n_faces(), 2);
        assert_eq!(loaded.n_vertices(), 5);
        assert!(loaded.vertex_properties().get::<Vec3>("v:normal").is_some());
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_ply_round_trip_with_face_properties() {
        let path = temp("shape.ply");
        let mut mesh = quad_and_triangle();
        mesh.face_properties_mut()
            .set("f:segment", vec![7i32, 9])
            .unwrap();
        mesh.face_properties_mut()
            .set("f:color", vec![Vec3::X, Vec3::Y])
            .unwrap();
        save(&path, &mesh).unwrap();

        let loaded = load(&path).unwrap();
        assert_eq!(loaded.faces(), mesh.faces());
        assert_eq!(loaded.face_properties().get::<i32>("f:segment").unwrap(), &[7, 9]);
        assert_eq!(loaded.face_properties().get::<Vec3>("f:color").unwrap()[1], Vec3::Y);
        let _ = std::fs::remove_file(&path);
    }
}
