//! Vertex and pixel stages.
//!
//! A [`Shader`] is a pair of plain function pointers sharing a
//! [`ShaderContext`]. The vertex stage runs once per triangle and fills the
//! context with screen-space positions and world-space data; the pixel stage
//! runs for every covered pixel and returns its colour.
//!
//! # Barycentric Coordinates
//!
//! The pixel stage receives three weights `[λ₀, λ₁, λ₂]` that sum to 1 inside
//! the triangle. Any per-vertex attribute is interpolated as
//! `λ₀·a₀ + λ₁·a₁ + λ₂·a₂`.

use crate::camera::ViewData;
use crate::colors::{self, Color};
use crate::light::DirectionalLight;
use crate::math::{Mat4, Rect, Vec2, Vec3};
use crate::mesh::Vertex;
use crate::texture::Texture;

use super::rasterizer::edge_fn;

/// Screen-space doubled areas below this are treated as degenerate.
pub const AREA_EPSILON: f32 = 1e-6;

/// Runs once per triangle. Returns `false` to reject it.
pub type VertexFn = fn(&mut ShaderContext<'_>, &[Vertex; 3]) -> bool;

/// Runs once per covered pixel: `(ctx, x, y, λ, world position) -> colour`.
pub type PixelFn = fn(&ShaderContext<'_>, i32, i32, [f32; 3], Vec3) -> Color;

#[derive(Clone, Copy)]
pub struct Shader {
    pub vertex: VertexFn,
    pub pixel: PixelFn,
}

impl std::fmt::Debug for Shader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shader").finish_non_exhaustive()
    }
}

impl Default for Shader {
    fn default() -> Self {
        default_shader()
    }
}

/// Per-draw state shared by the two stages.
///
/// Everything up to `backface_culling` is set by the caller before the draw;
/// the remaining fields are written by the vertex stage.
#[derive(Clone, Debug)]
pub struct ShaderContext<'a> {
    pub view: ViewData,
    pub model: Mat4,
    pub normal_matrix: Mat4,
    /// `view_projection * model`.
    pub model_view_projection: Mat4,
    pub light: DirectionalLight,
    pub base_color: Color,
    pub texture: Option<&'a Texture>,
    pub backface_culling: bool,

    /// Screen-space `(x, y, depth)`, counter-clockwise after the vertex stage.
    pub screen: [Vec3; 3],
    pub screen_bounds: Rect,
    pub world_positions: [Vec3; 3],
    pub world_normals: [Vec3; 3],
    pub world_normal: Vec3,
    pub vertices: [Vertex; 3],
}

impl<'a> ShaderContext<'a> {
    pub fn new(view: ViewData) -> Self {
        Self {
            view,
            model: Mat4::identity(),
            normal_matrix: Mat4::identity(),
            model_view_projection: view.view_projection,
            light: DirectionalLight::default(),
            base_color: colors::FILL,
            texture: None,
            backface_culling: false,
            screen: [Vec3::ZERO; 3],
            screen_bounds: Rect::default(),
            world_positions: [Vec3::ZERO; 3],
            world_normals: [Vec3::ZERO; 3],
            world_normal: Vec3::ZERO,
            vertices: [Vertex::default(); 3],
        }
    }

    /// Set the model matrix; the normal matrix is its inverse transpose.
    pub fn set_model(&mut self, model: Mat4) {
        self.model = model;
        self.normal_matrix = model
            .inverse()
            .map(|inv| inv.transpose())
            .unwrap_or_else(Mat4::identity);
        self.model_view_projection = self.view.view_projection * model;
    }

    pub fn with_model(mut self, model: Mat4) -> Self {
        self.set_model(model);
        self
    }

    pub fn with_light(mut self, light: DirectionalLight) -> Self {
        self.light = light;
        self
    }

    pub fn with_base_color(mut self, color: Color) -> Self {
        self.base_color = color;
        self
    }

    pub fn with_texture(mut self, texture: Option<&'a Texture>) -> Self {
        self.texture = texture;
        self
    }

    pub fn with_backface_culling(mut self, enabled: bool) -> Self {
        self.backface_culling = enabled;
        self
    }

    /// Interpolate the three vertex UVs.
    #[inline]
    pub fn interpolate_uv(&self, lambda: [f32; 3]) -> Vec2 {
        let [a, b, c] = self.vertices.map(|v| v.tex_coord);
        a * lambda[0] + b * lambda[1] + c * lambda[2]
    }

    /// Interpolate the world-space vertex normals (not normalised).
    #[inline]
    pub fn interpolate_normal(&self, lambda: [f32; 3]) -> Vec3 {
        let [a, b, c] = self.world_normals;
        a * lambda[0] + b * lambda[1] + c * lambda[2]
    }

    /// Make the screen triangle counter-clockwise.
    ///
    /// Returns `false` for degenerate triangles, and for clockwise ones when
    /// backface culling is on. Otherwise a clockwise triangle has its second
    /// and third vertices swapped, along with every per-vertex field.
    pub fn order_counter_clockwise(&mut self) -> bool {
        let [s0, s1, s2] = self.screen;
        let area = edge_fn(xy(s0), xy(s1), xy(s2));
        if area.abs() < AREA_EPSILON || !area.is_finite() {
            return false;
        }
        if area < 0.0 {
            if self.backface_culling {
                return false;
            }
            self.screen.swap(1, 2);
            self.world_positions.swap(1, 2);
            self.world_normals.swap(1, 2);
            self.vertices.swap(1, 2);
        }
        true
    }

    /// Bounding box of the screen triangle; `false` when it misses the viewport.
    pub fn compute_screen_bounds(&mut self) -> bool {
        self.screen_bounds = Rect::from_points(&self.screen.map(xy));
        let viewport = Rect::new(
            Vec2::ZERO,
            Vec2::new(self.view.width as f32, self.view.height as f32),
        );
        self.screen_bounds.intersects(&viewport)
    }
}

#[inline]
pub(crate) fn xy(v: Vec3) -> Vec2 {
    Vec2::new(v.x, v.y)
}

/// World → clip → screen for three vertices.
///
/// Rejects the triangle when any vertex is at or behind the eye
/// (`clip.w ≤ 0`), when it is degenerate or culled, or when its bounds miss
/// the viewport.
pub fn transform_vertices(ctx: &mut ShaderContext<'_>, vertices: &[Vertex; 3]) -> bool {
    let (width, height) = (ctx.view.width as f32, ctx.view.height as f32);

    for (i, vertex) in vertices.iter().enumerate() {
        let clip = ctx.model_view_projection.transform_point4(vertex.position);
        if clip.w <= 0.0 {
            return false;
        }
        let ndc = clip.project();
        ctx.screen[i] = Vec3::new(
            (ndc.x / 2.0 + 0.5) * width,
            (ndc.y / 2.0 + 0.5) * height,
            (ndc.z + 1.0) / 2.0,
        );
        ctx.world_positions[i] = ctx.model.transform_point(vertex.position);
        ctx.world_normals[i] = ctx.normal_matrix.transform_vector(vertex.normal).normalize();
    }
    ctx.vertices = *vertices;

    let average = ctx.world_normals[0] + ctx.world_normals[1] + ctx.world_normals[2];
    ctx.world_normal = if average.length_squared() > f32::EPSILON {
        average.normalize()
    } else {
        let [a, b, c] = ctx.world_positions;
        (b - a).cross(c - a).normalize()
    };

    ctx.order_counter_clockwise() && ctx.compute_screen_bounds()
}

/// Vertex stage for geometry already in screen space: positions are copied
/// straight to `(x, y, depth)`.
pub fn screen_space_vertices(ctx: &mut ShaderContext<'_>, vertices: &[Vertex; 3]) -> bool {
    for (i, vertex) in vertices.iter().enumerate() {
        ctx.screen[i] = vertex.position;
        ctx.world_positions[i] = vertex.position;
        ctx.world_normals[i] = vertex.normal;
    }
    ctx.vertices = *vertices;
    ctx.world_normal = Vec3::FORWARD;
    ctx.order_counter_clockwise() && ctx.compute_screen_bounds()
}

/// Texture (or base colour) lit by the directional light using the
/// interpolated vertex normal.
pub fn lit_pixel(ctx: &ShaderContext<'_>, _x: i32, _y: i32, lambda: [f32; 3], _p: Vec3) -> Color {
    let albedo = match ctx.texture {
        Some(texture) => {
            let uv = ctx.interpolate_uv(lambda);
            texture.sample(uv.x, uv.y)
        }
        None => ctx.base_color,
    };
    albedo.modulate(ctx.light.intensity(ctx.interpolate_normal(lambda)))
}

/// Unlit constant colour.
pub fn flat_pixel(ctx: &ShaderContext<'_>, _x: i32, _y: i32, _lambda: [f32; 3], _p: Vec3) -> Color {
    ctx.base_color
}

/// Normal-lit, optionally textured.
pub fn default_shader() -> Shader {
    Shader {
        vertex: transform_vertices,
        pixel: lit_pixel,
    }
}

/// Constant colour through the regular vertex transform.
pub fn flat_shader() -> Shader {
    Shader {
        vertex: transform_vertices,
        pixel: flat_pixel,
    }
}
