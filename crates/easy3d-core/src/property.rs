//! Named per-element properties.
//!
//! Every model element kind (vertices, faces, edges, halfedges) carries a
//! [`PropertyContainer`]: an ordered set of named arrays that all have the same
//! length as the number of elements. Properties are typed; the supported element
//! types implement [`PropertyValue`].

use glam::{Vec2, Vec3};

use crate::error::{Easy3dError, Result};

/// The storage of one property.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyData {
    Float(Vec<f32>),
    Int(Vec<i32>),
    Bool(Vec<bool>),
    Vec2(Vec<Vec2>),
    Vec3(Vec<Vec3>),
}

impl PropertyData {
    /// Number of elements stored.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            PropertyData::Float(v) => v.len(),
            PropertyData::Int(v) => v.len(),
            PropertyData::Bool(v) => v.len(),
            PropertyData::Vec2(v) => v.len(),
            PropertyData::Vec3(v) => v.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Short name of the element type.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            PropertyData::Float(_) => f32::TYPE_NAME,
            PropertyData::Int(_) => i32::TYPE_NAME,
            PropertyData::Bool(_) => bool::TYPE_NAME,
            PropertyData::Vec2(_) => Vec2::TYPE_NAME,
            PropertyData::Vec3(_) => Vec3::TYPE_NAME,
        }
    }

    fn resize(&mut self, n: usize) {
        match self {
            PropertyData::Float(v) => v.resize(n, 0.0),
            PropertyData::Int(v) => v.resize(n, 0),
            PropertyData::Bool(v) => v.resize(n, false),
            PropertyData::Vec2(v) => v.resize(n, Vec2::ZERO),
            PropertyData::Vec3(v) => v.resize(n, Vec3::ZERO),
        }
    }

    fn gather(&self, indices: &[usize]) -> PropertyData {
        fn pick<T: Copy>(v: &[T], indices: &[usize]) -> Vec<T> {
            indices.iter().map(|&i| v[i]).collect()
        }
        match self {
            PropertyData::Float(v) => PropertyData::Float(pick(v, indices)),
            PropertyData::Int(v) => PropertyData::Int(pick(v, indices)),
            PropertyData::Bool(v) => PropertyData::Bool(pick(v, indices)),
            PropertyData::Vec2(v) => PropertyData::Vec2(pick(v, indices)),
            PropertyData::Vec3(v) => PropertyData::Vec3(pick(v, indices)),
        }
    }

    /// Min and max of a scalar property, `None` for vector or empty properties.
    #[must_use]
    pub fn scalar_range(&self) -> Option<(f32, f32)> {
        let values: Vec<f32> = match self {
            PropertyData::Float(v) => v.clone(),
            PropertyData::Int(v) => v.iter().map(|&x| x as f32).collect(),
            _ => return None,
        };
        let first = *values.first()?;
        Some(
            values
                .iter()
                .fold((first, first), |(lo, hi), &x| (lo.min(x), hi.max(x))),
        )
    }
}

/// Element types that can be stored in a [`PropertyContainer`].
pub trait PropertyValue: Copy + Default + 'static {
    /// Short name used in diagnostics.
    const TYPE_NAME: &'static str;

    /// Wraps a vector of values.
    fn wrap(values: Vec<Self>) -> PropertyData;

    /// Borrows the values if `data` holds this type.
    fn slice(data: &PropertyData) -> Option<&[Self]>;

    /// Mutably borrows the values if `data` holds this type.
    fn slice_mut(data: &mut PropertyData) -> Option<&mut [Self]>;
}

macro_rules! impl_property_value {
    ($ty:ty, $variant:ident, $name:literal) => {
        impl PropertyValue for $ty {
            const TYPE_NAME: &'static str = $name;

            fn wrap(values: Vec<Self>) -> PropertyData {
                PropertyData::$variant(values)
            }

            fn slice(data: &PropertyData) -> Option<&[Self]> {
                match data {
                    PropertyData::$variant(v) => Some(v),
                    _ => None,
                }
            }

            fn slice_mut(data: &mut PropertyData) -> Option<&mut [Self]> {
                match data {
                    PropertyData::$variant(v) => Some(v),
                    _ => None,
                }
            }
        }
    };
}

impl_property_value!(f32, Float, "float");
impl_property_value!(i32, Int, "int");
impl_property_value!(bool, Bool, "bool");
impl_property_value!(Vec2, Vec2, "vec2");
impl_property_value!(Vec3, Vec3, "vec3");

/// An ordered set of named properties sharing one element count.
#[derive(Debug, Clone, Default)]
pub struct PropertyContainer {
    len: usize,
    properties: Vec<(String, PropertyData)>,
}

impl PropertyContainer {
    /// Creates an empty container with zero elements.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of elements (the length of every property).
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of properties.
    #[must_use]
    pub fn n_properties(&self) -> usize {
        self.properties.len()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.properties.iter().position(|(n, _)| n == name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Property names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.properties.iter().map(|(n, _)| n.as_str())
    }

    /// Raw access to a property regardless of its type.
    #[must_use]
    pub fn data(&self, name: &str) -> Option<&PropertyData> {
        self.position(name).map(|i| &self.properties[i].1)
    }

    /// Adds a property filled with `default`.
    ///
    /// Fails if a property with this name exists already.
    pub fn add<T: PropertyValue>(&mut self, name: &str, default: T) -> Result<&mut [T]> {
        if self.contains(name) {
            return Err(Easy3dError::PropertyExists(name.to_string()));
        }
        self.properties
            .push((name.to_string(), T::wrap(vec![default; self.len])));
        let last = self.properties.len() - 1;
        Self::typed_mut(name, &mut self.properties[last].1)
    }

    /// Returns the property, adding it filled with `default` when missing.
    pub fn get_or_add<T: PropertyValue>(&mut self, name: &str, default: T) -> Result<&mut [T]> {
        match self.position(name) {
            Some(i) => Self::typed_mut(name, &mut self.properties[i].1),
            None => self.add(name, default),
        }
    }

    /// Replaces (or creates) a property with the given values.
    pub fn set<T: PropertyValue>(&mut self, name: &str, values: Vec<T>) -> Result<()> {
        if values.len() != self.len {
            return Err(Easy3dError::SizeMismatch {
                expected: self.len,
                actual: values.len(),
            });
        }
        match self.position(name) {
            Some(i) => self.properties[i].1 = T::wrap(values),
            None => self.properties.push((name.to_string(), T::wrap(values))),
        }
        Ok(())
    }

    /// Typed read access. `None` when missing or of another type.
    #[must_use]
    pub fn get<T: PropertyValue>(&self, name: &str) -> Option<&[T]> {
        self.data(name).and_then(T::slice)
    }

    /// Typed write access. `None` when missing or of another type.
    pub fn get_mut<T: PropertyValue>(&mut self, name: &str) -> Option<&mut [T]> {
        let i = self.position(name)?;
        T::slice_mut(&mut self.properties[i].1)
    }

    /// Removes a property. Returns whether it existed.
    pub fn remove(&mut self, name: &str) -> bool {
        match self.position(name) {
            Some(i) => {
                self.properties.remove(i);
                true
            }
            None => false,
        }
    }

    /// Appends one element (default valued) to every property.
    pub fn push(&mut self) {
        self.resize(self.len + 1);
    }

    /// Resizes every property to `n` elements.
    pub fn resize(&mut self, n: usize) {
        for (_, data) in &mut self.properties {
            data.resize(n);
        }
        self.len = n;
    }

    /// Builds a container holding only the elements at `indices`, in that order.
    #[must_use]
    pub fn gathered(&self, indices: &[usize]) -> PropertyContainer {
        PropertyContainer {
            len: indices.len(),
            properties: self
                .properties
                .iter()
                .map(|(n, d)| (n.clone(), d.gather(indices)))
                .collect(),
        }
    }

    /// One line per property: name, type and, for scalars, the value range.
    #[must_use]
    pub fn describe(&self) -> Vec<String> {
        self.properties
            .iter()
            .map(|(name, data)| match data.scalar_range() {
                Some((lo, hi)) => format!("{name} ({}) [{lo}, {hi}]", data.type_name()),
                None => format!("{name} ({})", data.type_name()),
            })
            .collect()
    }

    fn typed_mut<'a, T: PropertyValue>(
        name: &str,
        data: &'a mut PropertyData,
    ) -> Result<&'a mut [T]> {
        let actual = data.type_name();
        T::slice_mut(data).ok_or_else(|| Easy3dError::PropertyType {
            name: name.to_string(),
            expected: T::TYPE_NAME,
            actual,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_get() {
        let mut props = PropertyContainer::new();
        props.resize(3);
        props.add("v:elevation", 1.5_f32).unwrap()[2] = 4.0;
        assert_eq!(props.get::<f32>("v:elevation"), Some(&[1.5, 1.5, 4.0][..]));
        assert!(props.get::<i32>("v:elevation").is_none());
    }

    #[test]
    fn test_add_existing_fails() {
        let mut props = PropertyContainer::new();
        props.add("v:color", Vec3::ZERO).unwrap();
        assert!(matches!(
            props.add("v:color", Vec3::ONE),
            Err(Easy3dError::PropertyExists(_))
        ));
    }

    #[test]
    fn test_get_or_add_type_mismatch() {
        let mut props = PropertyContainer::new();
        props.add("f:chart", 0_i32).unwrap();
        assert!(matches!(
            props.get_or_add("f:chart", 0.0_f32),
            Err(Easy3dError::PropertyType { .. })
        ));
    }

    #[test]
    fn test_push_keeps_lengths_equal() {
        let mut props = PropertyContainer::new();
        props.add("a", 0.0_f32).unwrap();
        props.add("b", false).unwrap();
        props.push();
        props.push();
        assert_eq!(props.len(), 2);
        assert_eq!(props.get::<f32>("a").map(<[f32]>::len), Some(2));
        assert_eq!(props.get::<bool>("b").map(<[bool]>::len), Some(2));
    }

    #[test]
    fn test_set_rejects_wrong_length() {
        let mut props = PropertyContainer::new();
        props.resize(2);
        assert!(props.set("x", vec![1_i32]).is_err());
        assert!(props.set("x", vec![1_i32, 2]).is_ok());
    }

    #[test]
    fn test_gathered() {
        let mut props = PropertyContainer::new();
        props.resize(4);
        props.set("id", vec![10_i32, 11, 12, 13]).unwrap();
        let g = props.gathered(&[3, 1]);
        assert_eq!(g.len(), 2);
        assert_eq!(g.get::<i32>("id"), Some(&[13, 11][..]));
    }

    #[test]
    fn test_remove_and_describe() {
        let mut props = PropertyContainer::new();
        props.resize(2);
        props.set("s", vec![-1.0_f32, 3.0]).unwrap();
        props.set("n", vec![Vec3::X, Vec3::Y]).unwrap();
        let lines = props.describe();
        assert_eq!(lines[0], "s (float) [-1, 3]");
        assert_eq!(lines[1], "n (vec3)");
        assert!(props.remove("s"));
        assert!(!props.remove("s"));
        assert_eq!(props.names().collect::<Vec<_>>(), vec!["n"]);
    }
}
