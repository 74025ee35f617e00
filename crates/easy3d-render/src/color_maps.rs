//! Color maps for scalar fields.
//!
//! A scalar field is drawn by looking up its normalized value in a color map.
//! Maps are either built in or read from images (one row of pixels, left to
//! right) in the `colormaps/` resource directory. Any map can be baked into a
//! texture so that it goes through the same lookup path as image textures.

use std::collections::BTreeMap;
use std::path::Path;

use glam::{Vec2, Vec3};

use crate::error::RenderResult;
use crate::texture::{Texture, WrapMode};

/// Name of the color map used when a scalar field has no texture.
pub const DEFAULT_COLOR_MAP: &str = "default";

/// Piecewise linear ramp of colors over `[0, 1]`.
#[derive(Debug, Clone)]
pub struct ColorMap {
    pub name: String,
    /// Evenly spaced control colors; the first sits at 0 and the last at 1.
    pub stops: Vec<Vec3>,
}

impl ColorMap {
    pub fn new(name: impl Into<String>, stops: Vec<Vec3>) -> Self {
        Self {
            name: name.into(),
            stops,
        }
    }

    /// Reads the middle row of a texture as the control colors.
    #[must_use]
    pub fn from_texture(texture: &Texture) -> Self {
        let width = texture.width().max(1);
        let stops = (0..width)
            .map(|i| {
                let u = (i as f32 + 0.5) / width as f32;
                texture.sample(Vec2::new(u, 0.5)).truncate()
            })
            .collect();
        Self::new(texture.name(), stops)
    }

    /// Color at `t`. Values outside `[0, 1]` are clamped and NaN maps to 0.
    #[must_use]
    pub fn sample(&self, t: f32) -> Vec3 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let Some(last) = self.stops.len().checked_sub(1) else {
            return Vec3::ZERO;
        };
        if last == 0 {
            return self.stops[0];
        }

        let x = t * last as f32;
        let lo = (x as usize).min(last - 1);
        self.stops[lo].lerp(self.stops[lo + 1], x - lo as f32)
    }

    /// Bakes the map into a `width` x 1 texture clamped at both ends.
    #[must_use]
    pub fn to_texture(&self, width: u32) -> Texture {
        let width = width.max(2);
        let step = 1.0 / (width - 1) as f32;
        let pixels = (0..width)
            .map(|i| self.sample(i as f32 * step).extend(1.0))
            .collect();
        Texture::from_pixels(&self.name, width, 1, pixels).with_wrap(WrapMode::ClampToEdge)
    }
}

/// Named color maps known to a viewer.
#[derive(Debug, Default)]
pub struct ColorMapRegistry {
    maps: BTreeMap<String, ColorMap>,
}

impl ColorMapRegistry {
    /// A registry holding the built-in maps.
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self::default();
        for map in builtin_maps() {
            registry.register(map);
        }
        registry
    }

    /// Registers a color map, replacing one with the same name.
    pub fn register(&mut self, map: ColorMap) {
        self.maps.insert(map.name.clone(), map);
    }

    /// Registers every PNG image in `dir`, named after its file stem.
    ///
    /// Returns the number of maps added. Images that fail to decode are
    /// skipped with a warning.
    pub fn load_directory(&mut self, dir: impl AsRef<Path>) -> RenderResult<usize> {
        let mut count = 0;
        for entry in std::fs::read_dir(dir.as_ref())? {
            let path = entry?.path();
            let is_png = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("png"));
            if !is_png {
                continue;
            }
            match Texture::load(&path) {
                Ok(texture) => {
                    let map = ColorMap::from_texture(&texture);
                    log::debug!("color map '{}' ({} stops)", map.name, map.stops.len());
                    self.register(map);
                    count += 1;
                }
                Err(e) => log::warn!("skipping color map {}: {e}", path.display()),
            }
        }
        Ok(count)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ColorMap> {
        self.maps.get(name)
    }

    /// The map used for scalar fields without an explicit texture.
    #[must_use]
    pub fn default_map(&self) -> Option<&ColorMap> {
        self.get(DEFAULT_COLOR_MAP)
    }

    /// Names of all registered maps, in alphabetical order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.maps.keys().map(String::as_str).collect()
    }
}

fn builtin_maps() -> Vec<ColorMap> {
    let rgb = |r, g, b| Vec3::new(r, g, b);
    vec![
        // blue, cyan, green, yellow, red
        ColorMap::new(
            DEFAULT_COLOR_MAP,
            vec![Vec3::Z, rgb(0.0, 1.0, 1.0), Vec3::Y, rgb(1.0, 1.0, 0.0), Vec3::X],
        ),
        ColorMap::new(
            "viridis",
            vec![
                rgb(0.267, 0.004, 0.329),
                rgb(0.282, 0.140, 0.457),
                rgb(0.253, 0.265, 0.529),
                rgb(0.206, 0.371, 0.553),
                rgb(0.163, 0.471, 0.558),
                rgb(0.127, 0.566, 0.550),
                rgb(0.134, 0.658, 0.517),
                rgb(0.266, 0.749, 0.440),
                rgb(0.477, 0.821, 0.318),
                rgb(0.741, 0.873, 0.150),
                rgb(0.993, 0.906, 0.144),
            ],
        ),
        ColorMap::new("blue_white", vec![rgb(0.031, 0.188, 0.420), Vec3::ONE]),
        ColorMap::new(
            "coolwarm",
            vec![
                rgb(0.230, 0.299, 0.754),
                rgb(0.552, 0.690, 0.996),
                rgb(0.866, 0.866, 0.866),
                rgb(0.956, 0.604, 0.486),
                rgb(0.706, 0.016, 0.150),
            ],
        ),
        ColorMap::new(
            "rainbow",
            vec![
                rgb(0.5, 0.0, 1.0),
                Vec3::Z,
                rgb(0.0, 1.0, 1.0),
                Vec3::Y,
                rgb(1.0, 1.0, 0.0),
                Vec3::X,
            ],
        ),
        // Alternating bands show iso-lines of a scalar field.
        ColorMap::new(
            "stripes",
            (0..16)
                .map(|i| if i % 2 == 0 { Vec3::splat(0.9) } else { rgb(0.2, 0.2, 0.6) })
                .collect(),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_clamps_and_interpolates() {
        let map = ColorMap::new("bw", vec![Vec3::ZERO, Vec3::ONE]);
        assert_eq!(map.sample(0.0), Vec3::ZERO);
        assert_eq!(map.sample(1.0), Vec3::ONE);
        assert!((map.sample(0.25) - Vec3::splat(0.25)).length() < 1e-6);
        assert_eq!(map.sample(-3.0), Vec3::ZERO);
        assert_eq!(map.sample(7.0), Vec3::ONE);
        assert_eq!(map.sample(f32::NAN), Vec3::ZERO);

        assert_eq!(ColorMap::new("empty", vec![]).sample(0.5), Vec3::ZERO);
        assert_eq!(ColorMap::new("one", vec![Vec3::X]).sample(0.9), Vec3::X);
    }

    #[test]
    fn test_builtin_maps() {
        let registry = ColorMapRegistry::new();
        assert_eq!(registry.default_map().map(|m| m.sample(0.0)), Some(Vec3::Z));
        assert_eq!(registry.default_map().map(|m| m.sample(1.0)), Some(Vec3::X));
        let names = registry.names();
        assert!(names.contains(&"viridis") && names.contains(&"stripes"));
        assert!(names.windows(2).all(|w| w[0] < w[1]));
        assert!(registry.get("jet").is_none());
    }

    #[test]
    fn test_texture_round_trip_keeps_ramp() {
        let map = ColorMap::new("bw", vec![Vec3::ZERO, Vec3::ONE]);
        let texture = map.to_texture(16);
        assert_eq!((texture.width(), texture.height()), (16, 1));

        let back = ColorMap::from_texture(&texture);
        assert_eq!(back.name, "bw");
        assert_eq!(back.stops.len(), 16);
        assert!(back.sample(0.0).x < 0.1);
        assert!(back.sample(1.0).x > 0.9);
    }

    #[test]
    fn test_load_directory() {
        let dir = std::env::temp_dir().join(format!("easy3d_cmaps_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let img = image::RgbaImage::from_fn(8, 2, |x, _| image::Rgba([(x * 32) as u8, 0, 0, 255]));
        img.save(dir.join("reds.png")).unwrap();
        std::fs::write(dir.join("notes.txt"), "not a map").unwrap();

        let mut registry = ColorMapRegistry::default();
        assert_eq!(registry.load_directory(&dir).unwrap(), 1);
        let reds = registry.get("reds").expect("registered by file stem");
        assert_eq!(reds.stops.len(), 8);
        assert!(reds.sample(1.0).x > reds.sample(0.0).x);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
