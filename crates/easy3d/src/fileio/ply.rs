//! PLY reading and writing through `ply-rs`.
//!
//! Files are read into a list of [`PlyElement`]s (one column per property)
//! that the model readers interpret. Well-known vertex properties map to
//! model properties: `x y z` to the positions, `nx ny nz` to `v:normal`,
//! `red green blue` to `v:color` (or `f:color`, `e:color`) and `s t` / `u v`
//! to `v:texcoord`. Any other scalar property `name` becomes `v:name`,
//! `f:name` or `e:name` depending on its element.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use easy3d_core::{Easy3dError, Model, PropertyContainer, PropertyData, Result, Vec2, Vec3};
use ply_rs::parser::Parser;
use ply_rs::ply::{
    Addable, DefaultElement, ElementDef, Encoding, Ply, Property, PropertyDef, PropertyType,
    ScalarType,
};
use ply_rs::writer::Writer;

/// Storage type of a scalar column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScalarKind {
    Float,
    Int,
    UChar,
}

#[derive(Debug, Clone)]
pub(crate) struct ScalarColumn {
    pub name: String,
    pub kind: ScalarKind,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone)]
pub(crate) struct ListColumn {
    pub name: String,
    pub values: Vec<Vec<usize>>,
}

/// One PLY element with its properties stored column-wise.
#[derive(Debug, Clone)]
pub(crate) struct PlyElement {
    pub name: String,
    pub count: usize,
    pub scalars: Vec<ScalarColumn>,
    pub lists: Vec<ListColumn>,
}

impl PlyElement {
    pub fn new(name: &str, count: usize) -> Self {
        Self {
            name: name.to_string(),
            count,
            scalars: Vec::new(),
            lists: Vec::new(),
        }
    }

    pub fn scalar(&self, name: &str) -> Option<&ScalarColumn> {
        self.scalars.iter().find(|c| c.name == name)
    }

    /// The first list column whose name is one of `names`.
    pub fn list(&self, names: &[&str]) -> Option<&ListColumn> {
        self.lists.iter().find(|c| names.contains(&c.name.as_str()))
    }

    pub fn push_scalar(&mut self, name: &str, kind: ScalarKind, values: Vec<f64>) {
        self.scalars.push(ScalarColumn {
            name: name.to_string(),
            kind,
            values,
        });
    }

    fn vec3(&self, names: [&str; 3]) -> Option<Vec<Vec3>> {
        let [x, y, z] = names.map(|n| self.scalar(n));
        let (x, y, z) = (x?, y?, z?);
        Some(
            (0..self.count)
                .map(|i| Vec3::new(x.values[i] as f32, y.values[i] as f32, z.values[i] as f32))
                .collect(),
        )
    }

    /// The positions stored in `x y z`.
    pub fn positions(&self) -> Result<Vec<Vec3>> {
        self.vec3(["x", "y", "z"]).ok_or_else(|| {
            Easy3dError::Parse(format!("element '{}' has no x/y/z properties", self.name))
        })
    }

    /// Colors in `red green blue`, scaled to [0, 1] when stored as integers.
    fn colors(&self) -> Option<Vec<Vec3>> {
        let integral = self.scalar("red")?.kind != ScalarKind::Float;
        let colors = self.vec3(["red", "green", "blue"])?;
        Some(if integral {
            colors.into_iter().map(|c| c / 255.0).collect()
        } else {
            colors
        })
    }

    fn texcoords(&self) -> Option<Vec<Vec2>> {
        let pair = [("s", "t"), ("u", "v"), ("texture_u", "texture_v")]
            .into_iter()
            .find_map(|(u, v)| Some((self.scalar(u)?, self.scalar(v)?)))?;
        Some(
            (0..self.count)
                .map(|i| Vec2::new(pair.0.values[i] as f32, pair.1.values[i] as f32))
                .collect(),
        )
    }

    /// Copies the known and the extra scalar columns into `container` with
    /// `prefix` ("v", "f" or "e"). Columns named in `skip` are left out.
    pub fn copy_properties(
        &self,
        prefix: &str,
        container: &mut PropertyContainer,
        skip: &[&str],
    ) -> Result<()> {
        const RESERVED: [&str; 14] = [
            "x", "y", "z", "nx", "ny", "nz", "red", "green", "blue", "alpha", "s", "t",
            "texture_u", "texture_v",
        ];

        if prefix == "v" {
            if let Some(normals) = self.vec3(["nx", "ny", "nz"]) {
                container.set("v:normal", normals)?;
            }
            if let Some(texcoords) = self.texcoords() {
                container.set("v:texcoord", texcoords)?;
            }
        }
        if let Some(colors) = self.colors() {
            container.set(&format!("{prefix}:color"), colors)?;
        }

        // `u v` hold texture coordinates only when `s t` are absent.
        let uv_texcoords = prefix == "v"
            && self.scalar("s").is_none()
            && self.scalar("u").is_some()
            && self.scalar("v").is_some();
        for column in &self.scalars {
            let name = column.name.as_str();
            if RESERVED.contains(&name) || skip.contains(&name) {
                continue;
            }
            if uv_texcoords && (name == "u" || name == "v") {
                continue;
            }
            let key = format!("{prefix}:{name}");
            match column.kind {
                ScalarKind::Float => container.set(
                    &key,
                    column.values.iter().map(|&v| v as f32).collect::<Vec<f32>>(),
                )?,
                ScalarKind::UChar if name == "locked" => container.set(
                    &key,
                    column.values.iter().map(|&v| v != 0.0).collect::<Vec<bool>>(),
                )?,
                ScalarKind::Int | ScalarKind::UChar => container.set(
                    &key,
                    column.values.iter().map(|&v| v as i32).collect::<Vec<i32>>(),
                )?,
            }
        }
        Ok(())
    }

    /// Adds columns for the properties of `container`. Names listed in
    /// `skip` are left out; other vector properties without a PLY
    /// counterpart are skipped with a debug message.
    pub fn add_properties(&mut self, container: &PropertyContainer, skip: &[&str]) {
        for name in container.names() {
            if skip.contains(&name) {
                continue;
            }
            let short = name.split_once(':').map_or(name, |(_, s)| s);
            match container.data(name) {
                Some(PropertyData::Float(v)) => {
                    self.push_scalar(short, ScalarKind::Float, v.iter().map(|&x| f64::from(x)).collect());
                }
                Some(PropertyData::Int(v)) => {
                    self.push_scalar(short, ScalarKind::Int, v.iter().map(|&x| f64::from(x)).collect());
                }
                Some(PropertyData::Bool(v)) => {
                    self.push_scalar(
                        short,
                        ScalarKind::UChar,
                        v.iter().map(|&b| if b { 1.0 } else { 0.0 }).collect(),
                    );
                }
                Some(PropertyData::Vec3(v)) if short == "normal" => {
                    for (axis, column) in ["nx", "ny", "nz"].into_iter().enumerate() {
                        self.push_scalar(
                            column,
                            ScalarKind::Float,
                            v.iter().map(|n| f64::from(n[axis])).collect(),
                        );
                    }
                }
                Some(PropertyData::Vec3(v)) if short == "color" => {
                    for (axis, column) in ["red", "green", "blue"].into_iter().enumerate() {
                        self.push_scalar(
                            column,
                            ScalarKind::UChar,
                            v.iter()
                                .map(|c| f64::from((c[axis].clamp(0.0, 1.0) * 255.0).round()))
                                .collect(),
                        );
                    }
                }
                Some(PropertyData::Vec2(v)) if short == "texcoord" => {
                    self.push_scalar("s", ScalarKind::Float, v.iter().map(|t| f64::from(t.x)).collect());
                    self.push_scalar("t", ScalarKind::Float, v.iter().map(|t| f64::from(t.y)).collect());
                }
                _ => log::debug!("property '{name}' is not written to PLY"),
            }
        }
    }
}

fn scalar_value(property: &Property) -> Option<f64> {
    Some(match *property {
        Property::Char(v) => f64::from(v),
        Property::UChar(v) => f64::from(v),
        Property::Short(v) => f64::from(v),
        Property::UShort(v) => f64::from(v),
        Property::Int(v) => f64::from(v),
        Property::UInt(v) => f64::from(v),
        Property::Float(v) => f64::from(v),
        Property::Double(v) => v,
        _ => return None,
    })
}

fn list_value(property: &Property) -> Option<Vec<i64>> {
    fn widen<T: Copy + Into<i64>>(v: &[T]) -> Vec<i64> {
        v.iter().map(|&x| x.into()).collect()
    }
    Some(match property {
        Property::ListChar(v) => widen(v),
        Property::ListUChar(v) => widen(v),
        Property::ListShort(v) => widen(v),
        Property::ListUShort(v) => widen(v),
        Property::ListInt(v) => widen(v),
        Property::ListUInt(v) => widen(v),
        _ => return None,
    })
}

fn scalar_kind(ty: &ScalarType) -> ScalarKind {
    match ty {
        ScalarType::Float | ScalarType::Double => ScalarKind::Float,
        ScalarType::Char | ScalarType::UChar => ScalarKind::UChar,
        _ => ScalarKind::Int,
    }
}

/// Reads every element of a PLY file (ASCII or binary).
pub(crate) fn read(path: &Path) -> Result<Vec<PlyElement>> {
    let mut reader = BufReader::new(File::open(path)?);
    let ply = Parser::<DefaultElement>::new()
        .read_ply(&mut reader)
        .map_err(|e| Easy3dError::Parse(format!("{}: {e}", path.display())))?;

    let mut elements = Vec::new();
    for (name, def) in &ply.header.elements {
        let rows = ply.payload.get(name).map_or(&[][..], Vec::as_slice);
        let mut element = PlyElement::new(name, rows.len());
        for (key, property) in &def.properties {
            match &property.data_type {
                PropertyType::Scalar(ty) => element.scalars.push(ScalarColumn {
                    name: key.clone(),
                    kind: scalar_kind(ty),
                    values: rows
                        .iter()
                        .map(|row| row.get(key).and_then(scalar_value).unwrap_or(0.0))
                        .collect(),
                }),
                PropertyType::List(..) => {
                    let mut values = Vec::with_capacity(rows.len());
                    for row in rows {
                        let list = row.get(key).and_then(list_value).unwrap_or_default();
                        let indices = list
                            .into_iter()
                            .map(usize::try_from)
                            .collect::<std::result::Result<Vec<_>, _>>()
                            .map_err(|_| {
                                Easy3dError::Parse(format!(
                                    "{}: negative index in '{name}.{key}'",
                                    path.display()
                                ))
                            })?;
                        values.push(indices);
                    }
                    element.lists.push(ListColumn {
                        name: key.clone(),
                        values,
                    });
                }
            }
        }
        elements.push(element);
    }
    log::debug!(
        "read {}: {}",
        path.display(),
        elements
            .iter()
            .map(|e| format!("{} {}", e.count, e.name))
            .collect::<Vec<_>>()
            .join(", ")
    );
    Ok(elements)
}

/// Writes the elements as an ASCII PLY file.
pub(crate) fn write(path: &Path, elements: &[PlyElement]) -> Result<()> {
    let mut ply = Ply::<DefaultElement>::new();
    ply.header.encoding = Encoding::Ascii;
    ply.header.comments.push(format!(
        "written by easy3d-rs {}",
        easy3d_core::version::version_string()
    ));

    for element in elements {
        let mut def = ElementDef::new(element.name.clone());
        for column in &element.scalars {
            let ty = match column.kind {
                ScalarKind::Float => ScalarType::Float,
                ScalarKind::Int => ScalarType::Int,
                ScalarKind::UChar => ScalarType::UChar,
            };
            def.properties
                .add(PropertyDef::new(column.name.clone(), PropertyType::Scalar(ty)));
        }
        for column in &element.lists {
            def.properties.add(PropertyDef::new(
                column.name.clone(),
                PropertyType::List(ScalarType::UChar, ScalarType::Int),
            ));
        }
        ply.header.elements.add(def);

        let mut rows = Vec::with_capacity(element.count);
        for i in 0..element.count {
            let mut row = DefaultElement::new();
            for column in &element.scalars {
                let v = column.values[i];
                let value = match column.kind {
                    ScalarKind::Float => Property::Float(v as f32),
                    ScalarKind::Int => Property::Int(v as i32),
                    ScalarKind::UChar => Property::UChar(v.clamp(0.0, 255.0) as u8),
                };
                row.insert(column.name.clone(), value);
            }
            for column in &element.lists {
                let list = column.values[i].iter().map(|&x| x as i32).collect();
                row.insert(column.name.clone(), Property::ListInt(list));
            }
            rows.push(row);
        }
        ply.payload.insert(element.name.clone(), rows);
    }

    ply.make_consistent()
        .map_err(|e| Easy3dError::Parse(format!("inconsistent PLY data: {e:?}")))?;
    let mut writer = BufWriter::new(File::create(path)?);
    Writer::<DefaultElement>::new().write_ply(&mut writer, &mut ply)?;
    writer.flush()?;
    Ok(())
}

/// The `vertex` element of a model: positions plus its vertex properties.
pub(crate) fn vertex_element(model: &dyn Model) -> PlyElement {
    let points = model.points();
    let mut vertex = PlyElement::new("vertex", points.len());
    for (axis, name) in ["x", "y", "z"].into_iter().enumerate() {
        vertex.push_scalar(
            name,
            ScalarKind::Float,
            points.iter().map(|p| f64::from(p[axis])).collect(),
        );
    }
    vertex.add_properties(model.vertex_properties(), &["v:point"]);
    vertex
}

/// Finds an element by name.
pub(crate) fn element<'a>(elements: &'a [PlyElement], name: &str) -> Option<&'a PlyElement> {
    elements.iter().find(|e| e.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_then_read_columns() {
        let path = std::env::temp_dir().join(format!("easy3d_ply_{}.ply", std::process::id()));
        let mut vertex = PlyElement::new("vertex", 2);
        vertex.push_scalar("x", ScalarKind::Float, vec![0.0, 1.0]);
        vertex.push_scalar("y", ScalarKind::Float, vec![0.5, 1.5]);
        vertex.push_scalar("z", ScalarKind::Float, vec![-1.0, 2.0]);
        vertex.push_scalar("red", ScalarKind::UChar, vec![255.0, 0.0]);
        vertex.push_scalar("green", ScalarKind::UChar, vec![0.0, 255.0]);
        vertex.push_scalar("blue", ScalarKind::UChar, vec![0.0, 0.0]);
        vertex.push_scalar("label", ScalarKind::Int, vec![3.0, -4.0]);
        write(&path, &[vertex]).unwrap();

        let elements = read(&path).unwrap();
        let v = element(&elements, "vertex").unwrap();
        assert_eq!(v.count, 2);
        assert_eq!(v.positions().unwrap()[1], Vec3::new(1.0, 1.5, 2.0));

        let mut container = PropertyContainer::new();
        container.resize(2);
        v.copy_properties("v", &mut container, &[]).unwrap();
        assert_eq!(container.get::<Vec3>("v:color").unwrap()[0], Vec3::X);
        assert_eq!(container.get::<i32>("v:label").unwrap(), &[3, -4]);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_reads_ascii_text() {
        let path = std::env::temp_dir().join(format!("easy3d_ply_text_{}.ply", std::process::id()));
        std::fs::write(
            &path,
            "ply\nformat ascii 1.0\nelement vertex 3\nproperty float x\nproperty float y\n\
             property float z\nproperty float u\nproperty float v\nelement face 1\n\
             property list uchar int vertex_indices\nend_header\n\
             0 0 0 0 0\n1 0 0 1 0\n0 1 0 0 1\n3 0 1 2\n",
        )
        .unwrap();
        let elements = read(&path).unwrap();
        let v = element(&elements, "vertex").unwrap();
        let mut container = PropertyContainer::new();
        container.resize(3);
        v.copy_properties("v", &mut container, &[]).unwrap();
        assert_eq!(container.get::<Vec2>("v:texcoord").unwrap()[2], Vec2::Y);
        assert!(!container.contains("v:u"));

        let f = element(&elements, "face").unwrap();
        assert_eq!(f.list(&["vertex_indices"]).unwrap().values, vec![vec![0, 1, 2]]);
        let _ = std::fs::remove_file(&path);
    }
}
