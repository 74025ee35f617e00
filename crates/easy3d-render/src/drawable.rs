//! Drawables: renderable buffers derived from models.
//!
//! A drawable holds the per-vertex buffers (positions, normals, colors,
//! texture coordinates) and an optional element buffer for one kind of
//! primitive. Its [`State`] decides how the buffers are colored.

use easy3d_core::{Box3, State};
use glam::{Vec2, Vec3};

/// Primitive type of a drawable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrawableKind {
    Points,
    Lines,
    Triangles,
}

impl DrawableKind {
    /// Number of vertices per primitive.
    #[must_use]
    pub fn vertices_per_primitive(self) -> usize {
        match self {
            DrawableKind::Points => 1,
            DrawableKind::Lines => 2,
            DrawableKind::Triangles => 3,
        }
    }
}

/// Interleaved vertex layout, for exporting buffers as raw bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 3],
    pub texcoord: [f32; 2],
}

/// A renderable set of points, lines or triangles.
#[derive(Debug, Clone)]
pub struct Drawable {
    name: String,
    kind: DrawableKind,
    state: State,
    vertices: Vec<Vec3>,
    normals: Vec<Vec3>,
    colors: Vec<Vec3>,
    texcoords: Vec<Vec2>,
    indices: Vec<u32>,
    /// Id of the model element each primitive comes from (e.g. face of a triangle).
    element_ids: Vec<u32>,
    point_size: f32,
    line_width: f32,
    smooth_shading: bool,
    update_needed: bool,
}

impl Drawable {
    pub fn new(name: impl Into<String>, kind: DrawableKind) -> Self {
        Self {
            name: name.into(),
            kind,
            state: State::new(),
            vertices: Vec::new(),
            normals: Vec::new(),
            colors: Vec::new(),
            texcoords: Vec::new(),
            indices: Vec::new(),
            element_ids: Vec::new(),
            point_size: 2.0,
            line_width: 1.0,
            smooth_shading: false,
            update_needed: true,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    #[must_use]
    pub fn kind(&self) -> DrawableKind {
        self.kind
    }

    #[must_use]
    pub fn state(&self) -> &State {
        &self.state
    }

    /// Mutable coloring state. Changing it marks the buffers for rebuilding.
    pub fn state_mut(&mut self) -> &mut State {
        self.update_needed = true;
        &mut self.state
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.state.is_visible()
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.state.set_visible(visible);
    }

    #[must_use]
    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    #[must_use]
    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    #[must_use]
    pub fn colors(&self) -> &[Vec3] {
        &self.colors
    }

    #[must_use]
    pub fn texcoords(&self) -> &[Vec2] {
        &self.texcoords
    }

    #[must_use]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    #[must_use]
    pub fn element_ids(&self) -> &[u32] {
        &self.element_ids
    }

    pub fn update_vertex_buffer(&mut self, vertices: Vec<Vec3>) {
        self.vertices = vertices;
    }

    pub fn update_normal_buffer(&mut self, normals: Vec<Vec3>) {
        self.normals = normals;
    }

    pub fn update_color_buffer(&mut self, colors: Vec<Vec3>) {
        self.colors = colors;
    }

    pub fn update_texcoord_buffer(&mut self, texcoords: Vec<Vec2>) {
        self.texcoords = texcoords;
    }

    /// Sets the element buffer. An empty buffer draws the vertices in order.
    pub fn update_element_buffer(&mut self, indices: Vec<u32>) {
        self.indices = indices;
    }

    pub fn update_element_ids(&mut self, ids: Vec<u32>) {
        self.element_ids = ids;
    }

    /// Drops all buffers.
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.normals.clear();
        self.colors.clear();
        self.texcoords.clear();
        self.indices.clear();
        self.element_ids.clear();
    }

    #[must_use]
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Number of complete primitives.
    #[must_use]
    pub fn num_primitives(&self) -> usize {
        let n = if self.indices.is_empty() {
            self.vertices.len()
        } else {
            self.indices.len()
        };
        n / self.kind.vertices_per_primitive()
    }

    /// Vertex indices of primitive `i`, skipping out-of-range indices.
    #[must_use]
    pub fn primitive(&self, i: usize) -> Option<[usize; 3]> {
        let k = self.kind.vertices_per_primitive();
        let mut out = [0usize; 3];
        for (j, slot) in out.iter_mut().enumerate().take(k) {
            let pos = i * k + j;
            let v = if self.indices.is_empty() {
                pos
            } else {
                *self.indices.get(pos)? as usize
            };
            if v >= self.vertices.len() {
                return None;
            }
            *slot = v;
        }
        Some(out)
    }

    /// Model element the primitive `i` was generated from.
    #[must_use]
    pub fn element_id(&self, i: usize) -> usize {
        self.element_ids.get(i).map_or(i, |&id| id as usize)
    }

    #[must_use]
    pub fn point_size(&self) -> f32 {
        self.point_size
    }

    pub fn set_point_size(&mut self, size: f32) {
        self.point_size = size.max(1.0);
    }

    #[must_use]
    pub fn line_width(&self) -> f32 {
        self.line_width
    }

    pub fn set_line_width(&mut self, width: f32) {
        self.line_width = width.max(1.0);
    }

    #[must_use]
    pub fn smooth_shading(&self) -> bool {
        self.smooth_shading
    }

    pub fn set_smooth_shading(&mut self, smooth: bool) {
        self.smooth_shading = smooth;
        self.update_needed = true;
    }

    /// Whether the buffers must be rebuilt from the model.
    #[must_use]
    pub fn update_needed(&self) -> bool {
        self.update_needed
    }

    pub fn set_update_needed(&mut self, needed: bool) {
        self.update_needed = needed;
    }

    #[must_use]
    pub fn bounding_box(&self) -> Box3 {
        Box3::from_points(&self.vertices)
    }

    /// Vertices in the interleaved [`Vertex`] layout. Missing attributes are zero.
    #[must_use]
    pub fn interleaved(&self) -> Vec<Vertex> {
        self.vertices
            .iter()
            .enumerate()
            .map(|(i, p)| Vertex {
                position: p.to_array(),
                normal: self.normals.get(i).copied().unwrap_or(Vec3::ZERO).to_array(),
                color: self.colors.get(i).copied().unwrap_or(Vec3::ZERO).to_array(),
                texcoord: self.texcoords.get(i).copied().unwrap_or(Vec2::ZERO).to_array(),
            })
            .collect()
    }

    /// Size in bytes of the vertex and element buffers.
    #[must_use]
    pub fn buffer_size(&self) -> usize {
        let vertex_bytes: usize = [
            bytemuck::cast_slice::<Vec3, u8>(&self.vertices).len(),
            bytemuck::cast_slice::<Vec3, u8>(&self.normals).len(),
            bytemuck::cast_slice::<Vec3, u8>(&self.colors).len(),
            bytemuck::cast_slice::<Vec2, u8>(&self.texcoords).len(),
        ]
        .iter()
        .sum();
        vertex_bytes + bytemuck::cast_slice::<u32, u8>(&self.indices).len()
    }
}
