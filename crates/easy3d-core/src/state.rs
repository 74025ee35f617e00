//! Rendering state of a drawable.
//!
//! A [`State`] decides how a drawable is colored. Exactly one coloring
//! [`Method`] is active at a time. The setters switch the method together with
//! the parameters it needs; parameters the active method does not use are kept
//! as they are so that switching back restores them.

use glam::{Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::setting::with_settings;

/// How a drawable is colored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Method {
    /// One color for the whole drawable.
    #[default]
    UniformColor,
    /// A per-element color property.
    ColorProperty,
    /// Texture coordinates looked up in a texture.
    Textured,
    /// A scalar property mapped through a color map.
    ScalarField,
}

/// The element kind a coloring property is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Location {
    #[default]
    Vertex,
    Face,
    Edge,
    Halfedge,
}

impl Location {
    /// Property name prefix used for this location (`v:`, `f:`, `e:`, `h:`).
    #[must_use]
    pub fn prefix(self) -> &'static str {
        match self {
            Location::Vertex => "v:",
            Location::Face => "f:",
            Location::Edge => "e:",
            Location::Halfedge => "h:",
        }
    }
}

/// Non-owning handle to a texture held by a texture manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextureId(pub usize);

/// Surface reflectance used by the lighting model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub ambient: Vec3,
    pub specular: Vec3,
    pub shininess: f32,
}

impl Material {
    #[must_use]
    pub fn new(ambient: Vec3, specular: Vec3, shininess: f32) -> Self {
        Self {
            ambient,
            specular,
            shininess,
        }
    }
}

impl Default for Material {
    /// Material taken from the global settings.
    fn default() -> Self {
        with_settings(|s| Self::new(s.material_ambient, s.material_specular, s.material_shininess))
    }
}

/// Coloring and lighting configuration of one drawable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct State {
    visible: bool,
    method: Method,
    color: Vec4,
    location: Location,
    property_name: String,
    lighting: bool,
    lighting_two_sides: bool,
    distinct_back_color: bool,
    back_color: Vec4,
    highlight: bool,
    highlight_range: (i32, i32),
    texture: Option<TextureId>,
    texture_repeat: f32,
    texture_fractional_repeat: f32,
    clamp_range: bool,
    clamp_lower: f32,
    clamp_upper: f32,
    material: Material,
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

impl State {
    /// Creates a visible, lit state with uniform coloring.
    ///
    /// Two-sided lighting, the back color and the material come from the
    /// global settings.
    #[must_use]
    pub fn new() -> Self {
        let (two_sides, distinct, back) = with_settings(|s| {
            (
                s.light_two_sides,
                s.light_distinct_back_color,
                s.light_back_color,
            )
        });
        Self {
            visible: true,
            method: Method::UniformColor,
            color: Vec4::new(0.8, 0.8, 0.8, 1.0),
            location: Location::Vertex,
            property_name: "uniform color".to_string(),
            lighting: true,
            lighting_two_sides: two_sides,
            distinct_back_color: distinct,
            back_color: back,
            highlight: false,
            highlight_range: (-1, -1),
            texture: None,
            texture_repeat: 1.0,
            texture_fractional_repeat: 0.0,
            clamp_range: true,
            clamp_lower: 0.05,
            clamp_upper: 0.05,
            material: Material::default(),
        }
    }

    /// Colors everything with `color`.
    pub fn set_uniform_coloring(&mut self, color: Vec4) {
        self.method = Method::UniformColor;
        self.color = color;
        self.location = Location::Vertex;
        self.property_name = "uniform color".to_string();
    }

    /// Colors with the per-element color property `name` at `location`.
    pub fn set_property_coloring(&mut self, location: Location, name: &str) {
        self.method = Method::ColorProperty;
        self.location = location;
        self.property_name = name.to_string();
    }

    /// Maps the texture coordinates `texcoord_name` into `texture`.
    ///
    /// `repeat` is the number of whole repetitions, `repeat_fraction` adds a
    /// fractional part (in 1/100).
    pub fn set_texture_coloring(
        &mut self,
        location: Location,
        texcoord_name: &str,
        texture: Option<TextureId>,
        repeat: f32,
        repeat_fraction: f32,
    ) {
        self.method = Method::Textured;
        self.location = location;
        self.property_name = texcoord_name.to_string();
        self.texture = texture;
        self.texture_repeat = repeat;
        self.texture_fractional_repeat = repeat_fraction;
    }

    /// Maps the scalar property `scalar_name` through a color map texture.
    ///
    /// `None` selects the default color map. `clamp_lower` and `clamp_upper`
    /// are the fractions of values cut off at each end when clamping is on.
    /// Repeats are reset since color maps are sampled once.
    pub fn set_scalar_coloring(
        &mut self,
        location: Location,
        scalar_name: &str,
        texture: Option<TextureId>,
        clamp_lower: f32,
        clamp_upper: f32,
    ) {
        self.method = Method::ScalarField;
        self.location = location;
        self.property_name = scalar_name.to_string();
        self.texture = texture;
        self.texture_repeat = 1.0;
        self.texture_fractional_repeat = 0.0;
        self.clamp_lower = clamp_lower;
        self.clamp_upper = clamp_upper;
    }

    /// Switches the method and property without touching other parameters.
    pub fn set_coloring(&mut self, method: Method, location: Location, name: &str) {
        self.method = method;
        self.location = location;
        self.property_name = name.to_string();
    }

    #[must_use]
    pub fn coloring_method(&self) -> Method {
        self.method
    }

    #[must_use]
    pub fn property_location(&self) -> Location {
        self.location
    }

    #[must_use]
    pub fn property_name(&self) -> &str {
        &self.property_name
    }

    #[must_use]
    pub fn color(&self) -> Vec4 {
        self.color
    }

    /// Changes the uniform color without switching the coloring method.
    pub fn set_color(&mut self, color: Vec4) {
        self.color = color;
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    #[must_use]
    pub fn lighting(&self) -> bool {
        self.lighting
    }

    pub fn set_lighting(&mut self, lighting: bool) {
        self.lighting = lighting;
    }

    #[must_use]
    pub fn lighting_two_sides(&self) -> bool {
        self.lighting_two_sides
    }

    pub fn set_lighting_two_sides(&mut self, two_sides: bool) {
        self.lighting_two_sides = two_sides;
    }

    #[must_use]
    pub fn distinct_back_color(&self) -> bool {
        self.distinct_back_color
    }

    pub fn set_distinct_back_color(&mut self, distinct: bool) {
        self.distinct_back_color = distinct;
    }

    #[must_use]
    pub fn back_color(&self) -> Vec4 {
        self.back_color
    }

    pub fn set_back_color(&mut self, color: Vec4) {
        self.back_color = color;
    }

    #[must_use]
    pub fn is_highlight(&self) -> bool {
        self.highlight
    }

    pub fn set_highlight(&mut self, highlight: bool) {
        self.highlight = highlight;
    }

    /// Inclusive range of highlighted primitive indices; `(-1, -1)` for none.
    #[must_use]
    pub fn highlight_range(&self) -> (i32, i32) {
        self.highlight_range
    }

    pub fn set_highlight_range(&mut self, range: (i32, i32)) {
        self.highlight_range = range;
    }

    /// Returns whether primitive `index` falls into the highlight range.
    #[must_use]
    pub fn is_highlighted(&self, index: usize) -> bool {
        let (lo, hi) = self.highlight_range;
        self.highlight
            && lo >= 0
            && i64::try_from(index).is_ok_and(|i| i >= i64::from(lo) && i <= i64::from(hi))
    }

    #[must_use]
    pub fn texture(&self) -> Option<TextureId> {
        self.texture
    }

    pub fn set_texture(&mut self, texture: Option<TextureId>) {
        self.texture = texture;
    }

    #[must_use]
    pub fn texture_repeat(&self) -> f32 {
        self.texture_repeat
    }

    pub fn set_texture_repeat(&mut self, repeat: f32) {
        self.texture_repeat = repeat;
    }

    #[must_use]
    pub fn texture_fractional_repeat(&self) -> f32 {
        self.texture_fractional_repeat
    }

    pub fn set_texture_fractional_repeat(&mut self, fraction: f32) {
        self.texture_fractional_repeat = fraction;
    }

    /// Total repeat factor applied to texture coordinates.
    #[must_use]
    pub fn effective_repeat(&self) -> f32 {
        self.texture_repeat + self.texture_fractional_repeat / 100.0
    }

    #[must_use]
    pub fn clamp_range(&self) -> bool {
        self.clamp_range
    }

    pub fn set_clamp_range(&mut self, clamp: bool) {
        self.clamp_range = clamp;
    }

    #[must_use]
    pub fn clamp_lower(&self) -> f32 {
        self.clamp_lower
    }

    pub fn set_clamp_lower(&mut self, lower: f32) {
        self.clamp_lower = lower;
    }

    #[must_use]
    pub fn clamp_upper(&self) -> f32 {
        self.clamp_upper
    }

    pub fn set_clamp_upper(&mut self, upper: f32) {
        self.clamp_upper = upper;
    }

    #[must_use]
    pub fn material(&self) -> &Material {
        &self.material
    }

    pub fn set_material(&mut self, material: Material) {
        self.material = material;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_state_defaults() {
        let state = State::new();
        assert!(state.is_visible());
        assert_eq!(state.coloring_method(), Method::UniformColor);
        assert_eq!(state.color(), Vec4::new(0.8, 0.8, 0.8, 1.0));
        assert_eq!(state.property_location(), Location::Vertex);
        assert_eq!(state.property_name(), "uniform color");
        assert!(state.lighting());
        assert!(!state.is_highlight());
        assert_eq!(state.highlight_range(), (-1, -1));
        assert!(state.texture().is_none());
        assert!(state.clamp_range());
        assert!((state.clamp_lower() - 0.05).abs() < f32::EPSILON);
        assert!((state.clamp_upper() - 0.05).abs() < f32::EPSILON);
    }

    #[test]
    fn test_uniform_coloring_resets_location_and_name() {
        let mut state = State::new();
        state.set_property_coloring(Location::Face, "f:color");
        state.set_uniform_coloring(Vec4::ONE);
        assert_eq!(state.coloring_method(), Method::UniformColor);
        assert_eq!(state.property_location(), Location::Vertex);
        assert_eq!(state.property_name(), "uniform color");
        assert_eq!(state.color(), Vec4::ONE);
    }

    #[test]
    fn test_scalar_coloring_resets_repeat() {
        let mut state = State::new();
        state.set_texture_coloring(Location::Halfedge, "h:texcoord", Some(TextureId(3)), 4.0, 20.0);
        assert!((state.effective_repeat() - 4.2).abs() < 1e-6);

        state.set_scalar_coloring(Location::Vertex, "v:elevation", None, 0.0, 0.0);
        assert_eq!(state.coloring_method(), Method::ScalarField);
        assert_eq!(state.texture(), None);
        assert!((state.texture_repeat() - 1.0).abs() < f32::EPSILON);
        assert!(state.texture_fractional_repeat().abs() < f32::EPSILON);
        assert!(state.clamp_lower().abs() < f32::EPSILON);
    }

    #[test]
    fn test_switching_keeps_unused_parameters() {
        let mut state = State::new();
        state.set_texture_coloring(Location::Vertex, "v:texcoord", Some(TextureId(1)), 2.0, 0.0);
        state.set_property_coloring(Location::Face, "f:color");
        assert_eq!(state.texture(), Some(TextureId(1)));
        assert!((state.texture_repeat() - 2.0).abs() < f32::EPSILON);

        state.set_coloring(Method::Textured, Location::Vertex, "v:texcoord");
        assert_eq!(state.coloring_method(), Method::Textured);
        assert_eq!(state.texture(), Some(TextureId(1)));
    }

    #[test]
    fn test_highlight_range() {
        let mut state = State::new();
        state.set_highlight_range((2, 4));
        assert!(!state.is_highlighted(3));
        state.set_highlight(true);
        assert!(state.is_highlighted(2));
        assert!(state.is_highlighted(4));
        assert!(!state.is_highlighted(5));
    }

    proptest! {
        #[test]
        fn prop_property_coloring_keeps_clamp(lower in 0.0f32..0.5, upper in 0.0f32..0.5) {
            let mut state = State::new();
            state.set_scalar_coloring(Location::Face, "f:s", None, lower, upper);
            state.set_property_coloring(Location::Vertex, "v:color");
            prop_assert_eq!(state.coloring_method(), Method::ColorProperty);
            prop_assert_eq!(state.clamp_lower(), lower);
            prop_assert_eq!(state.clamp_upper(), upper);
        }
    }
}
