//! Edge-function triangle rasterization.
//!
//! Every pixel whose centre lies in the triangle's screen bounding box is
//! tested against the three edges. For an edge from `a` to `b`:
//!
//! ```text
//! E(a, b, p) = (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
//! ```
//!
//! This is the 2D cross product `(b - a) × (p - a)`: positive when `p` is to
//! the left of `a → b`, zero on the line. The vertex stage orders triangles
//! counter-clockwise, so a pixel is covered when all three edge values are
//! strictly positive. Pixels exactly on an edge are left out, which can leave
//! a crack between two triangles that share that edge.
//!
//! # Barycentric Coordinates
//!
//! `E` for the edge opposite vertex `i`, divided by the doubled triangle area,
//! is the barycentric weight `λᵢ`. The weights drive depth and attribute
//! interpolation.
//!
//! # References
//!
//! - Juan Pineda, "A Parallel Algorithm for Polygon Rasterization" (1988)

use crate::camera::project_world_to_screen;
use crate::colors;
use crate::math::{Rect, Vec2, Vec3};
use crate::mesh::Vertex;

use super::framebuffer::{ColorBuffer, DepthBuffer};
use super::line::draw_line;
use super::shader::{xy, PixelFn, Shader, ShaderContext, AREA_EPSILON};
use super::RenderFlags;

/// World-space length of the per-vertex normal lines.
const VERTEX_NORMAL_LENGTH: f32 = 0.25;

/// Signed doubled area of `(a, b, p)`.
#[inline]
pub fn edge_fn(a: Vec2, b: Vec2, p: Vec2) -> f32 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

/// Call `visit(x, y, λ)` for every pixel centre strictly inside the
/// counter-clockwise triangle `screen`, row by row within `bounds`.
///
/// `bounds` must already be clipped to the target. Returns without visiting
/// anything for degenerate or clockwise input.
pub fn scan_triangle(screen: &[Vec3; 3], bounds: Rect, mut visit: impl FnMut(i32, i32, [f32; 3])) {
    let [s0, s1, s2] = screen.map(xy);
    let area = edge_fn(s0, s1, s2);
    if area < AREA_EPSILON || bounds.is_empty() {
        return;
    }
    let inv_area = 1.0 / area;

    let (min_x, max_x) = (bounds.min.x.floor() as i32, bounds.max.x.floor() as i32);
    let (min_y, max_y) = (bounds.min.y.floor() as i32, bounds.max.y.floor() as i32);

    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
            let w0 = edge_fn(s1, s2, p);
            let w1 = edge_fn(s2, s0, p);
            let w2 = edge_fn(s0, s1, p);
            if w0 <= 0.0 || w1 <= 0.0 || w2 <= 0.0 {
                continue;
            }
            visit(x, y, [w0 * inv_area, w1 * inv_area, w2 * inv_area]);
        }
    }
}

/// Fill the triangle prepared by the vertex stage.
///
/// With [`RenderFlags::DEPTH`] a pixel is skipped when its interpolated depth
/// is greater than the stored one; otherwise (ties included) the depth is
/// stored and the pixel shaded. Without it every covered pixel is shaded and
/// the later triangle wins. Returns the number of pixels written.
pub fn rasterize_triangle(
    ctx: &ShaderContext<'_>,
    pixel: PixelFn,
    flags: RenderFlags,
    color: &mut ColorBuffer,
    depth: &mut DepthBuffer,
) -> usize {
    let bounds = ctx.screen_bounds.clamp_to(&Rect::from_size(color.width(), color.height()));
    let depth_test = flags.contains(RenderFlags::DEPTH);
    let [s0, s1, s2] = ctx.screen;
    let [w0, w1, w2] = ctx.world_positions;
    let mut written = 0;

    scan_triangle(&ctx.screen, bounds, |x, y, lambda| {
        let z = lambda[0] * s0.z + lambda[1] * s1.z + lambda[2] * s2.z;
        if depth_test {
            let stored = depth.get(x, y).unwrap_or(f32::INFINITY);
            if z > stored {
                return;
            }
            depth.set(x, y, z);
        }

        let world = w0 * lambda[0] + w1 * lambda[1] + w2 * lambda[2];
        color.set(x, y, pixel(ctx, x, y, lambda, world));
        written += 1;
    });
    written
}

/// Run one triangle through the whole pipeline: vertex stage, then
/// wireframe, fill, and normal overlays as `flags` ask.
///
/// Returns `None` if the vertex stage rejected the triangle, otherwise the
/// number of filled pixels.
pub fn draw_triangle(
    shader: &Shader,
    ctx: &mut ShaderContext<'_>,
    vertices: &[Vertex; 3],
    flags: RenderFlags,
    color: &mut ColorBuffer,
    depth: &mut DepthBuffer,
) -> Option<usize> {
    if !(shader.vertex)(ctx, vertices) {
        return None;
    }

    let mut filled = 0;
    if flags.contains(RenderFlags::SHADED) {
        filled = rasterize_triangle(ctx, shader.pixel, flags, color, depth);
    }

    if flags.contains(RenderFlags::WIREFRAME) {
        let [a, b, c] = ctx.screen.map(xy);
        draw_line(color, a, b, colors::WIREFRAME);
        draw_line(color, b, c, colors::WIREFRAME);
        draw_line(color, c, a, colors::WIREFRAME);
    }

    if flags.contains(RenderFlags::NORMALS) {
        let [a, b, c] = ctx.world_positions;
        let center = (a + b + c) / 3.0;
        draw_world_segment(ctx, color, center, center + ctx.world_normal, colors::NORMAL);
    }

    if flags.contains(RenderFlags::VERTEX_NORMALS) {
        for (p, n) in ctx.world_positions.iter().zip(ctx.world_normals) {
            let tip = *p + n * VERTEX_NORMAL_LENGTH;
            draw_world_segment(ctx, color, *p, tip, colors::VERTEX_NORMAL);
        }
    }

    Some(filled)
}

/// Project both ends; draw only when both are in front of the eye.
fn draw_world_segment(ctx: &ShaderContext<'_>, color: &mut ColorBuffer, a: Vec3, b: Vec3, c: colors::Color) {
    let project = |p| project_world_to_screen(p, &ctx.view.view_projection, ctx.view.width, ctx.view.height);
    if let (Some(sa), Some(sb)) = (project(a), project(b)) {
        draw_line(color, xy(sa), xy(sb), c);
    }
}
