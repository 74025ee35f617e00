//! Software rasterizer.
//!
//! Draws drawables into a [`Framebuffer`] holding color, depth and id planes.
//! It is the off-screen target the viewer renders snapshots into and reads
//! depth and ids back from. Depth is window depth in `[0, 1]` (1 is the far
//! plane and the cleared value); pixel `(0, 0)` is the upper-left corner and
//! is sampled at its center.

use easy3d_core::{with_settings, Method, State};
use glam::{Mat4, Vec2, Vec3, Vec4, Vec4Swizzles};

use crate::color_maps::ColorMapRegistry;
use crate::drawable::{Drawable, DrawableKind};
use crate::texture::{Texture, TextureManager};

/// Id of pixels no primitive covers.
pub const NO_ID: u32 = u32::MAX;

/// Offset pulling lines and points in front of the surfaces they lie on.
const DEPTH_BIAS: f32 = 1e-4;

/// Color, depth and id planes of an off-screen render target.
#[derive(Debug, Clone)]
pub struct Framebuffer {
    width: u32,
    height: u32,
    color: Vec<Vec4>,
    depth: Vec<f32>,
    ids: Vec<u32>,
}

impl Framebuffer {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        let n = (width as usize) * (height as usize);
        Self {
            width,
            height,
            color: vec![Vec4::ZERO; n],
            depth: vec![1.0; n],
            ids: vec![NO_ID; n],
        }
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Resizes and clears all planes.
    pub fn resize(&mut self, width: u32, height: u32) {
        if (width, height) != (self.width, self.height) {
            *self = Self::new(width, height);
        }
    }

    /// Fills the color plane with `background`, depth with 1 and ids with [`NO_ID`].
    pub fn clear(&mut self, background: Vec4) {
        self.color.fill(background);
        self.depth.fill(1.0);
        self.ids.fill(NO_ID);
    }

    /// Resets depth to 1 so that later draws land on top of everything.
    pub fn clear_depth(&mut self) {
        self.depth.fill(1.0);
    }

    fn index(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height).then(|| (y as usize) * (self.width as usize) + x as usize)
    }

    #[must_use]
    pub fn color_at(&self, x: u32, y: u32) -> Option<Vec4> {
        self.index(x, y).map(|i| self.color[i])
    }

    /// Depth at a pixel; 1.0 where nothing was drawn.
    #[must_use]
    pub fn depth_at(&self, x: u32, y: u32) -> Option<f32> {
        self.index(x, y).map(|i| self.depth[i])
    }

    /// Id at a pixel, `None` outside the buffer or where nothing was drawn.
    #[must_use]
    pub fn id_at(&self, x: u32, y: u32) -> Option<u32> {
        self.index(x, y).map(|i| self.ids[i]).filter(|&id| id != NO_ID)
    }

    #[must_use]
    pub fn color_buffer(&self) -> &[Vec4] {
        &self.color
    }

    #[must_use]
    pub fn depth_buffer(&self) -> &[f32] {
        &self.depth
    }

    /// Color plane as 8-bit RGBA, rows top to bottom.
    #[must_use]
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.color
            .iter()
            .flat_map(|c| c.to_array().map(|v| (v.clamp(0.0, 1.0) * 255.0).round() as u8))
            .collect()
    }

    /// Depth plane as 8-bit gray levels, nearest surfaces darkest.
    ///
    /// Depths of drawn pixels are stretched over the full gray range; the
    /// background stays white.
    #[must_use]
    pub fn depth_to_gray8(&self) -> Vec<u8> {
        let drawn = self.depth.iter().copied().filter(|&d| d < 1.0);
        let (lo, hi) = drawn.fold((f32::MAX, f32::MIN), |(lo, hi), d| (lo.min(d), hi.max(d)));
        let span = hi - lo;
        self.depth
            .iter()
            .map(|&d| {
                if d >= 1.0 {
                    255
                } else if span <= f32::EPSILON {
                    0
                } else {
                    (((d - lo) / span) * 254.0).round() as u8
                }
            })
            .collect()
    }

    fn write(&mut self, i: usize, depth: f32, pass: Pass, color: impl FnOnce() -> Vec4) -> bool {
        if !(0.0..1.0).contains(&depth) || depth >= self.depth[i] {
            return false;
        }
        self.depth[i] = depth;
        match pass {
            Pass::Color => self.color[i] = color(),
            Pass::DepthOnly => {}
            Pass::Id(id) => self.ids[i] = id,
        }
        true
    }
}

/// What a draw call writes besides depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    /// Shaded colors.
    Color,
    /// Depth only.
    DepthOnly,
    /// The given id, for picking.
    Id(u32),
}

/// Camera matrices and resources a draw call needs.
pub struct RenderContext<'a> {
    pub view: Mat4,
    pub projection: Mat4,
    pub textures: &'a TextureManager,
    pub color_maps: &'a ColorMapRegistry,
    /// Directional light in eye coordinates.
    pub light_direction: Vec3,
    pub highlight_color: Vec4,
}

impl<'a> RenderContext<'a> {
    /// Context with light and highlight color taken from the settings.
    #[must_use]
    pub fn new(
        view: Mat4,
        projection: Mat4,
        textures: &'a TextureManager,
        color_maps: &'a ColorMapRegistry,
    ) -> Self {
        let (light, highlight) = with_settings(|s| (s.light_position, s.highlight_color));
        Self {
            view,
            projection,
            textures,
            color_maps,
            light_direction: light.xyz().normalize_or_zero(),
            highlight_color: highlight,
        }
    }
}

/// Where the base color of a fragment comes from.
enum Shade<'a> {
    Uniform(Vec3),
    PerVertex(&'a [Vec3]),
    Texture(&'a Texture, &'a [Vec2], f32),
    ColorMap(&'a crate::color_maps::ColorMap, &'a [Vec2]),
}

impl<'a> Shade<'a> {
    fn new(drawable: &'a Drawable, ctx: &RenderContext<'a>) -> Self {
        let state = drawable.state();
        let uniform = Shade::Uniform(state.color().truncate());
        let n = drawable.num_vertices();
        match state.coloring_method() {
            Method::UniformColor => uniform,
            Method::ColorProperty if drawable.colors().len() == n => {
                Shade::PerVertex(drawable.colors())
            }
            Method::Textured | Method::ScalarField if drawable.texcoords().len() == n => {
                let texcoords = drawable.texcoords();
                match state.texture().and_then(|id| ctx.textures.get(id)) {
                    Some(texture) => Shade::Texture(texture, texcoords, state.effective_repeat()),
                    None if state.coloring_method() == Method::ScalarField => ctx
                        .color_maps
                        .default_map()
                        .map_or(uniform, |map| Shade::ColorMap(map, texcoords)),
                    None => uniform,
                }
            }
            _ => uniform,
        }
    }

    /// Base color at barycentric weights `w` over the vertices `v`.
    fn color(&self, v: [usize; 3], w: Vec3) -> Vec3 {
        match self {
            Shade::Uniform(c) => *c,
            Shade::PerVertex(c) => c[v[0]] * w.x + c[v[1]] * w.y + c[v[2]] * w.z,
            Shade::Texture(t, uv, repeat) => {
                let uv = uv[v[0]] * w.x + uv[v[1]] * w.y + uv[v[2]] * w.z;
                t.sample(uv * *repeat).truncate()
            }
            Shade::ColorMap(map, uv) => map.sample(uv[v[0]].x * w.x + uv[v[1]].x * w.y + uv[v[2]].x * w.z),
        }
    }
}

/// Blinn-Phong shading in eye space.
fn shade(base: Vec3, normal: Vec3, eye_pos: Vec3, state: &State, ctx: &RenderContext) -> Vec3 {
    if !state.lighting() || normal == Vec3::ZERO {
        return base;
    }
    let view_dir = (-eye_pos).normalize_or_zero();
    let mut n = normal;
    let mut base = base;
    if n.dot(view_dir) < 0.0 && state.lighting_two_sides() {
        n = -n;
        if state.distinct_back_color() {
            base = state.back_color().truncate();
        }
    }
    let material = state.material();
    let l = ctx.light_direction;
    let df = n.dot(l).max(0.0);
    let half = (l + view_dir).normalize_or_zero();
    let sf = n.dot(half).max(0.0).powf(material.shininess);
    base * df + material.specular * sf + material.ambient
}

/// Vertex in clip space with its barycentric weights over the source primitive.
#[derive(Debug, Clone, Copy)]
struct ClipVertex {
    clip: Vec4,
    bary: Vec3,
}

/// Clips a polygon against the near plane (`z >= -w`).
fn clip_near(polygon: &[ClipVertex]) -> Vec<ClipVertex> {
    let inside = |v: &ClipVertex| v.clip.z + v.clip.w >= 0.0;
    let mut out = Vec::with_capacity(polygon.len() + 2);
    for (i, a) in polygon.iter().enumerate() {
        let b = &polygon[(i + 1) % polygon.len()];
        if inside(a) {
            out.push(*a);
        }
        if inside(a) != inside(b) {
            let da = a.clip.z + a.clip.w;
            let db = b.clip.z + b.clip.w;
            let t = da / (da - db);
            out.push(ClipVertex {
                clip: a.clip.lerp(b.clip, t),
                bary: a.bary.lerp(b.bary, t),
            });
        }
    }
    out
}

/// Window coordinates `(x, y, depth)` and `1/w` of a clip-space position.
fn to_window(clip: Vec4, width: f32, height: f32) -> (Vec3, f32) {
    let inv_w = 1.0 / clip.w;
    let ndc = clip.xyz() * inv_w;
    (
        Vec3::new(
            (ndc.x + 1.0) * 0.5 * width,
            (1.0 - ndc.y) * 0.5 * height,
            (ndc.z + 1.0) * 0.5,
        ),
        inv_w,
    )
}

fn edge(a: Vec2, b: Vec2, p: Vec2) -> f32 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

/// Draws one drawable. Invisible drawables are skipped.
pub fn draw(fb: &mut Framebuffer, drawable: &Drawable, ctx: &RenderContext, pass: Pass) {
    if !drawable.is_visible() || drawable.num_vertices() == 0 || fb.width == 0 || fb.height == 0 {
        return;
    }
    match drawable.kind() {
        DrawableKind::Triangles => draw_triangles(fb, drawable, ctx, pass),
        DrawableKind::Lines => draw_lines(fb, drawable, ctx, pass),
        DrawableKind::Points => draw_points(fb, drawable, ctx, pass),
    }
}

/// Final color of a fragment of primitive `element`.
fn fragment_color(state: &State, element: usize, ctx: &RenderContext, base: Vec3) -> Vec4 {
    if state.is_highlighted(element) {
        ctx.highlight_color
    } else {
        base.extend(state.color().w)
    }
}

fn draw_triangles(fb: &mut Framebuffer, drawable: &Drawable, ctx: &RenderContext, pass: Pass) {
    let mvp = ctx.projection * ctx.view;
    let (w, h) = (fb.width as f32, fb.height as f32);
    let vertices = drawable.vertices();
    let normals = drawable.normals();
    let shade_src = Shade::new(drawable, ctx);
    let state = drawable.state();

    for t in 0..drawable.num_primitives() {
        let Some(v) = drawable.primitive(t) else {
            continue;
        };
        let element = drawable.element_id(t);
        let world = v.map(|i| vertices[i]);
        let eye = world.map(|p| ctx.view.transform_point3(p));
        let face_normal = (eye[1] - eye[0]).cross(eye[2] - eye[0]).normalize_or_zero();
        let eye_normals = if normals.len() == vertices.len() {
            v.map(|i| ctx.view.transform_vector3(normals[i]))
        } else {
            [face_normal; 3]
        };

        let polygon: Vec<ClipVertex> = world
            .iter()
            .zip([Vec3::X, Vec3::Y, Vec3::Z])
            .map(|(p, bary)| ClipVertex {
                clip: mvp * p.extend(1.0),
                bary,
            })
            .collect();
        let clipped = clip_near(&polygon);
        if clipped.len() < 3 {
            continue;
        }
        let win: Vec<(Vec3, f32)> = clipped.iter().map(|c| to_window(c.clip, w, h)).collect();

        for k in 1..clipped.len() - 1 {
            let tri = [0, k, k + 1];
            let s = tri.map(|i| win[i].0);
            let inv_w = tri.map(|i| win[i].1);
            let bary = tri.map(|i| clipped[i].bary);
            let (a, b, c) = (s[0].truncate(), s[1].truncate(), s[2].truncate());
            let area = edge(a, b, c);
            if area.abs() < 1e-12 {
                continue;
            }

            let min_x = a.x.min(b.x).min(c.x).floor().max(0.0) as u32;
            let min_y = a.y.min(b.y).min(c.y).floor().max(0.0) as u32;
            let max_x = (a.x.max(b.x).max(c.x).ceil().min(w) as u32).min(fb.width);
            let max_y = (a.y.max(b.y).max(c.y).ceil().min(h) as u32).min(fb.height);

            for py in min_y..max_y {
                for px in min_x..max_x {
                    let p = Vec2::new(px as f32 + 0.5, py as f32 + 0.5);
                    let l = Vec3::new(edge(b, c, p), edge(c, a, p), edge(a, b, p)) / area;
                    if l.min_element() < 0.0 {
                        continue;
                    }
                    let depth = l.x * s[0].z + l.y * s[1].z + l.z * s[2].z;
                    let persp = Vec3::new(l.x * inv_w[0], l.y * inv_w[1], l.z * inv_w[2]);
                    let persp = persp / persp.element_sum();
                    let weights = bary[0] * persp.x + bary[1] * persp.y + bary[2] * persp.z;
                    let i = (py as usize) * (fb.width as usize) + px as usize;
                    fb.write(i, depth, pass, || {
                        let base = shade_src.color(v, weights);
                        let n = (eye_normals[0] * weights.x
                            + eye_normals[1] * weights.y
                            + eye_normals[2] * weights.z)
                            .normalize_or_zero();
                        let pos = eye[0] * weights.x + eye[1] * weights.y + eye[2] * weights.z;
                        let lit = shade(base, n, pos, state, ctx);
                        fragment_color(state, element, ctx, lit)
                    });
                }
            }
        }
    }
}

/// Fills a `size` x `size` square centered at `(x, y)`.
fn splat(
    fb: &mut Framebuffer,
    center: Vec2,
    size: f32,
    depth: f32,
    pass: Pass,
    color: Vec4,
) {
    let half = size * 0.5;
    let x0 = (center.x - half).round().max(0.0) as u32;
    let y0 = (center.y - half).round().max(0.0) as u32;
    let x1 = ((center.x + half).round().max(0.0) as u32).min(fb.width);
    let y1 = ((center.y + half).round().max(0.0) as u32).min(fb.height);
    // Always cover the pixel containing the center.
    let (x1, y1) = (x1.max((x0 + 1).min(fb.width)), y1.max((y0 + 1).min(fb.height)));
    for py in y0..y1 {
        for px in x0..x1 {
            let i = (py as usize) * (fb.width as usize) + px as usize;
            fb.write(i, depth, pass, || color);
        }
    }
}

fn draw_lines(fb: &mut Framebuffer, drawable: &Drawable, ctx: &RenderContext, pass: Pass) {
    let mvp = ctx.projection * ctx.view;
    let (w, h) = (fb.width as f32, fb.height as f32);
    let vertices = drawable.vertices();
    let shade_src = Shade::new(drawable, ctx);

    for l in 0..drawable.num_primitives() {
        let Some([i0, i1, _]) = drawable.primitive(l) else {
            continue;
        };
        let element = drawable.element_id(l);
        let mut a = ClipVertex {
            clip: mvp * vertices[i0].extend(1.0),
            bary: Vec3::X,
        };
        let mut b = ClipVertex {
            clip: mvp * vertices[i1].extend(1.0),
            bary: Vec3::Y,
        };
        let (da, db) = (a.clip.z + a.clip.w, b.clip.z + b.clip.w);
        if da < 0.0 && db < 0.0 {
            continue;
        }
        if da < 0.0 || db < 0.0 {
            let t = da / (da - db);
            let cut = ClipVertex {
                clip: a.clip.lerp(b.clip, t),
                bary: a.bary.lerp(b.bary, t),
            };
            if da < 0.0 {
                a = cut;
            } else {
                b = cut;
            }
        }
        let (sa, wa) = to_window(a.clip, w, h);
        let (sb, wb) = to_window(b.clip, w, h);
        let steps = (sb.truncate() - sa.truncate()).abs().max_element().ceil().max(1.0) as usize;
        for k in 0..=steps {
            let t = k as f32 / steps as f32;
            let p = sa.lerp(sb, t);
            // Perspective-correct position along the segment.
            let tw = t * wb / ((1.0 - t) * wa + t * wb);
            let bary = a.bary.lerp(b.bary, tw);
            let base = shade_src.color([i0, i1, i1], bary);
            let color = fragment_color(drawable.state(), element, ctx, base);
            splat(
                fb,
                p.truncate(),
                drawable.line_width(),
                p.z - DEPTH_BIAS,
                pass,
                color,
            );
        }
    }
}

fn draw_points(fb: &mut Framebuffer, drawable: &Drawable, ctx: &RenderContext, pass: Pass) {
    let mvp = ctx.projection * ctx.view;
    let (w, h) = (fb.width as f32, fb.height as f32);
    let shade_src = Shade::new(drawable, ctx);

    for (i, p) in drawable.vertices().iter().enumerate() {
        let clip = mvp * p.extend(1.0);
        if clip.z + clip.w < 0.0 || clip.w <= 0.0 {
            continue;
        }
        let (s, _) = to_window(clip, w, h);
        let base = shade_src.color([i, i, i], Vec3::X);
        let color = fragment_color(drawable.state(), drawable.element_id(i), ctx, base);
        splat(
            fb,
            s.truncate(),
            drawable.point_size(),
            s.z - DEPTH_BIAS,
            pass,
            color,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Camera;

    fn quad(z: f32) -> Drawable {
        let mut d = Drawable::new("faces", DrawableKind::Triangles);
        d.update_vertex_buffer(vec![
            Vec3::new(-0.5, -0.5, z),
            Vec3::new(0.5, -0.5, z),
            Vec3::new(0.5, 0.5, z),
            Vec3::new(-0.5, 0.5, z),
        ]);
        d.update_element_buffer(vec![0, 1, 2, 0, 2, 3]);
        d.state_mut().set_uniform_coloring(Vec4::new(1.0, 0.0, 0.0, 1.0));
        d.state_mut().set_lighting(false);
        d
    }

    fn render(drawables: &[Drawable], pass: Pass) -> (Framebuffer, Camera) {
        let camera = Camera::new(64, 64);
        let textures = TextureManager::new();
        let maps = ColorMapRegistry::new();
        let ctx = RenderContext::new(
            camera.view_matrix(),
            camera.projection_matrix(),
            &textures,
            &maps,
        );
        let mut fb = Framebuffer::new(64, 64);
        fb.clear(Vec4::ONE);
        for d in drawables {
            draw(&mut fb, d, &ctx, pass);
        }
        (fb, camera)
    }

    #[test]
    fn test_triangle_coverage_and_depth() {
        let (fb, camera) = render(&[quad(0.0)], Pass::Color);
        assert_eq!(fb.color_at(32, 32), Some(Vec4::new(1.0, 0.0, 0.0, 1.0)));
        assert_eq!(fb.color_at(0, 0), Some(Vec4::ONE));
        let depth = fb.depth_at(32, 32).unwrap();
        let expected = camera.projected_coordinates_of(Vec3::ZERO).z;
        assert!((depth - expected).abs() < 1e-4);
        assert_eq!(fb.depth_at(0, 0), Some(1.0));
    }

    #[test]
    fn test_depth_test_keeps_nearest() {
        let mut near = quad(0.5);
        near.state_mut().set_uniform_coloring(Vec4::new(0.0, 1.0, 0.0, 1.0));
        let (fb, _) = render(&[near.clone(), quad(0.0)], Pass::Color);
        assert_eq!(fb.color_at(32, 32), Some(Vec4::new(0.0, 1.0, 0.0, 1.0)));
        let (fb, _) = render(&[quad(0.0), near], Pass::Color);
        assert_eq!(fb.color_at(32, 32), Some(Vec4::new(0.0, 1.0, 0.0, 1.0)));
    }

    #[test]
    fn test_id_and_depth_only_passes() {
        let (fb, _) = render(&[quad(0.0)], Pass::Id(7));
        assert_eq!(fb.id_at(32, 32), Some(7));
        assert_eq!(fb.id_at(0, 0), None);
        assert_eq!(fb.color_at(32, 32), Some(Vec4::ONE));

        let (fb, _) = render(&[quad(0.0)], Pass::DepthOnly);
        assert!(fb.depth_at(32, 32).unwrap() < 1.0);
        assert_eq!(fb.color_at(32, 32), Some(Vec4::ONE));
    }

    #[test]
    fn test_invisible_drawables_skipped() {
        let mut d = quad(0.0);
        d.set_visible(false);
        let (fb, _) = render(&[d], Pass::Color);
        assert_eq!(fb.depth_at(32, 32), Some(1.0));
    }

    #[test]
    fn test_near_plane_clipping() {
        // A triangle reaching behind the camera still covers the center.
        let mut d = Drawable::new("big", DrawableKind::Triangles);
        d.update_vertex_buffer(vec![
            Vec3::new(-2.0, -2.0, -1.0),
            Vec3::new(2.0, -2.0, -1.0),
            Vec3::new(0.0, 8.0, 10.0),
        ]);
        d.state_mut().set_lighting(false);
        let (fb, _) = render(&[d], Pass::DepthOnly);
        assert!(fb.depth_at(32, 32).unwrap() < 1.0);
    }

    #[test]
    fn test_lines_and_points_on_top() {
        let mut line = Drawable::new("edges", DrawableKind::Lines);
        line.update_vertex_buffer(vec![Vec3::new(-0.5, 0.0, 0.0), Vec3::new(0.5, 0.0, 0.0)]);
        line.state_mut().set_uniform_coloring(Vec4::new(0.0, 0.0, 1.0, 1.0));
        line.set_line_width(3.0);
        let mut point = Drawable::new("vertices", DrawableKind::Points);
        point.update_vertex_buffer(vec![Vec3::new(0.25, 0.25, 0.0)]);
        point.state_mut().set_uniform_coloring(Vec4::new(0.0, 1.0, 1.0, 1.0));
        point.set_point_size(5.0);
        let (fb, camera) = render(&[quad(0.0), line, point], Pass::Color);
        assert_eq!(fb.color_at(32, 32), Some(Vec4::new(0.0, 0.0, 1.0, 1.0)));
        let s = camera.projected_coordinates_of(Vec3::new(0.25, 0.25, 0.0));
        assert_eq!(
            fb.color_at(s.x as u32, s.y as u32),
            Some(Vec4::new(0.0, 1.0, 1.0, 1.0))
        );
    }

    #[test]
    fn test_highlight_overrides_color() {
        let mut d = quad(0.0);
        d.update_element_ids(vec![0, 1]);
        d.state_mut().set_highlight(true);
        d.state_mut().set_highlight_range((0, 1));
        let (fb, _) = render(&[d], Pass::Color);
        let highlight = with_settings(|s| s.highlight_color);
        assert_eq!(fb.color_at(32, 32), Some(highlight));
    }

    #[test]
    fn test_scalar_field_uses_default_color_map() {
        let mut d = quad(0.0);
        d.update_texcoord_buffer(vec![Vec2::new(0.0, 0.5); 4]);
        d.state_mut()
            .set_scalar_coloring(easy3d_core::Location::Vertex, "v:s", None, 0.0, 0.0);
        let (fb, _) = render(&[d], Pass::Color);
        let c = fb.color_at(32, 32).unwrap();
        let expected = ColorMapRegistry::new().default_map().unwrap().sample(0.0);
        assert!((c.truncate() - expected).length() < 1e-5);
    }

    #[test]
    fn test_gray_depth_export() {
        let (fb, _) = render(&[quad(0.0)], Pass::DepthOnly);
        let gray = fb.depth_to_gray8();
        assert_eq!(gray.len(), 64 * 64);
        assert_eq!(gray[0], 255);
        assert!(gray[32 * 64 + 32] < 255);
    }
}
