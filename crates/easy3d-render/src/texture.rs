//! Textures and the texture manager.
//!
//! Textures are kept on the CPU as linear float RGBA. Drawables refer to them
//! through [`TextureId`] handles owned by a [`TextureManager`], which also
//! caches textures loaded from files so that a file is decoded only once.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use easy3d_core::TextureId;
use glam::{Vec2, Vec4};
use image::GenericImageView;

use crate::error::{RenderError, RenderResult};

/// How texture coordinates outside `[0, 1]` are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WrapMode {
    #[default]
    Repeat,
    ClampToEdge,
}

/// How texels are combined when sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterMode {
    Nearest,
    #[default]
    Linear,
}

/// A 2D RGBA texture.
#[derive(Debug, Clone)]
pub struct Texture {
    name: String,
    width: u32,
    height: u32,
    /// Row-major, first row at the top of the image.
    pixels: Vec<Vec4>,
    wrap: WrapMode,
    filter: FilterMode,
}

impl Texture {
    /// Creates a texture from row-major pixels.
    ///
    /// Missing pixels are filled with white; extra pixels are dropped.
    #[must_use]
    pub fn from_pixels(name: &str, width: u32, height: u32, mut pixels: Vec<Vec4>) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        pixels.resize((width * height) as usize, Vec4::ONE);
        Self {
            name: name.to_string(),
            width,
            height,
            pixels,
            wrap: WrapMode::default(),
            filter: FilterMode::default(),
        }
    }

    /// Decodes an image file.
    pub fn load(path: impl AsRef<Path>) -> RenderResult<Self> {
        let path = path.as_ref();
        let img = image::open(path)?;
        let (width, height) = img.dimensions();
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidImageData);
        }
        let rgba = img.to_rgba32f();
        let pixels = rgba
            .as_raw()
            .chunks_exact(4)
            .map(|c| Vec4::new(c[0], c[1], c[2], c[3]))
            .collect();
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("texture");
        log::debug!("texture loaded from {} ({width}x{height})", path.display());
        Ok(Self::from_pixels(name, width, height, pixels))
    }

    #[must_use]
    pub fn with_wrap(mut self, wrap: WrapMode) -> Self {
        self.wrap = wrap;
        self
    }

    #[must_use]
    pub fn with_filter(mut self, filter: FilterMode) -> Self {
        self.filter = filter;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[must_use]
    pub fn wrap(&self) -> WrapMode {
        self.wrap
    }

    #[must_use]
    pub fn filter(&self) -> FilterMode {
        self.filter
    }

    fn texel(&self, x: i64, y: i64) -> Vec4 {
        let (w, h) = (i64::from(self.width), i64::from(self.height));
        let (x, y) = match self.wrap {
            WrapMode::Repeat => (x.rem_euclid(w), y.rem_euclid(h)),
            WrapMode::ClampToEdge => (x.clamp(0, w - 1), y.clamp(0, h - 1)),
        };
        self.pixels[(y * w + x) as usize]
    }

    /// Samples the texture. `v = 0` is the bottom row of the image.
    #[must_use]
    pub fn sample(&self, uv: Vec2) -> Vec4 {
        let x = uv.x * self.width as f32;
        let y = (1.0 - uv.y) * self.height as f32;
        match self.filter {
            FilterMode::Nearest => self.texel(x.floor() as i64, y.floor() as i64),
            FilterMode::Linear => {
                let (x, y) = (x - 0.5, y - 0.5);
                let (x0, y0) = (x.floor(), y.floor());
                let (fx, fy) = (x - x0, y - y0);
                let (x0, y0) = (x0 as i64, y0 as i64);
                let top = self.texel(x0, y0).lerp(self.texel(x0 + 1, y0), fx);
                let bottom = self.texel(x0, y0 + 1).lerp(self.texel(x0 + 1, y0 + 1), fx);
                top.lerp(bottom, fy)
            }
        }
    }
}

/// Owns textures and hands out [`TextureId`] handles.
#[derive(Debug, Default)]
pub struct TextureManager {
    textures: Vec<Option<Texture>>,
    files: HashMap<PathBuf, TextureId>,
}

impl TextureManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the texture for an image file, loading it on first request.
    pub fn request(&mut self, path: impl AsRef<Path>) -> RenderResult<TextureId> {
        let path = path.as_ref();
        if let Some(id) = self.files.get(path) {
            if self.get(*id).is_some() {
                return Ok(*id);
            }
        }
        let texture = Texture::load(path).map_err(|e| {
            log::error!("failed to load texture {}: {e}", path.display());
            e
        })?;
        let id = self.insert(texture);
        self.files.insert(path.to_path_buf(), id);
        Ok(id)
    }

    /// Takes ownership of a texture.
    pub fn insert(&mut self, texture: Texture) -> TextureId {
        self.textures.push(Some(texture));
        TextureId(self.textures.len() - 1)
    }

    #[must_use]
    pub fn get(&self, id: TextureId) -> Option<&Texture> {
        self.textures.get(id.0).and_then(Option::as_ref)
    }

    /// Drops a texture. Handles to it resolve to nothing afterwards.
    pub fn release(&mut self, id: TextureId) -> RenderResult<()> {
        let slot = self
            .textures
            .get_mut(id.0)
            .ok_or(RenderError::TextureNotFound(id.0))?;
        if slot.take().is_none() {
            return Err(RenderError::TextureNotFound(id.0));
        }
        self.files.retain(|_, v| *v != id);
        Ok(())
    }

    /// Number of live textures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.textures.iter().flatten().count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
