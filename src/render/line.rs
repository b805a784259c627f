//! Line clipping (Cohen–Sutherland) and integer line plotting (Bresenham).

use super::framebuffer::ColorBuffer;
use crate::colors::Color;
use crate::math::{Rect, Vec2, Vec2i};

const INSIDE: u8 = 0;
const LEFT: u8 = 1;
const RIGHT: u8 = 2;
const BOTTOM: u8 = 4;
const TOP: u8 = 8;

const MAX_CLIP_PASSES: usize = 8;

#[inline]
fn region_code(p: Vec2, rect: &Rect) -> u8 {
    let mut code = INSIDE;
    if p.x < rect.min.x {
        code |= LEFT;
    } else if p.x > rect.max.x {
        code |= RIGHT;
    }
    if p.y < rect.min.y {
        code |= BOTTOM;
    } else if p.y > rect.max.y {
        code |= TOP;
    }
    code
}

/// Clip the segment `a → b` against the closed rectangle `rect`.
///
/// Returns the clipped endpoints, or `None` if the segment misses the
/// rectangle. Each returned endpoint is either the corresponding input or a
/// point on the rectangle's boundary.
///
/// A segment whose clipped endpoint lands exactly on `(0, 0)` is rejected:
/// intersection arithmetic that degenerates to the origin is treated as a
/// miss. Inputs already at the origin are kept.
pub fn clip_segment(a: Vec2, b: Vec2, rect: &Rect) -> Option<(Vec2, Vec2)> {
    if rect.is_empty() {
        return None;
    }

    let (mut p0, mut p1) = (a, b);
    let mut code0 = region_code(p0, rect);
    let mut code1 = region_code(p1, rect);

    // Each pass pins one coordinate to an edge; rounding at a corner can
    // bounce between two edges, so bound the passes.
    for _ in 0..MAX_CLIP_PASSES {
        if code0 | code1 == INSIDE {
            let clamped_to_origin = |p: Vec2, input: Vec2| p != input && p == Vec2::ZERO;
            if clamped_to_origin(p0, a) || clamped_to_origin(p1, b) {
                return None;
            }
            return Some((p0, p1));
        }
        if code0 & code1 != INSIDE {
            return None;
        }

        // At least one endpoint is outside; move it onto the edge named by
        // its first set bit.
        let out = if code0 != INSIDE { code0 } else { code1 };
        let (dx, dy) = (p1.x - p0.x, p1.y - p0.y);
        let p = if out & TOP != 0 {
            Vec2::new(p0.x + dx * (rect.max.y - p0.y) / dy, rect.max.y)
        } else if out & BOTTOM != 0 {
            Vec2::new(p0.x + dx * (rect.min.y - p0.y) / dy, rect.min.y)
        } else if out & RIGHT != 0 {
            Vec2::new(rect.max.x, p0.y + dy * (rect.max.x - p0.x) / dx)
        } else {
            Vec2::new(rect.min.x, p0.y + dy * (rect.min.x - p0.x) / dx)
        };

        if !(p.x.is_finite() && p.y.is_finite()) {
            return None;
        }

        if out == code0 {
            p0 = p;
            code0 = region_code(p0, rect);
        } else {
            p1 = p;
            code1 = region_code(p1, rect);
        }
    }
    None
}

/// Visit every pixel of the Bresenham line between `a` and `b`, both inclusive.
///
/// The pixel set does not depend on the endpoint order.
pub fn plot_line(a: Vec2i, b: Vec2i, mut plot: impl FnMut(i32, i32)) {
    let (mut x0, mut y0, mut x1, mut y1) = (a.x, a.y, b.x, b.y);

    let steep = (y1 - y0).abs() > (x1 - x0).abs();
    if steep {
        std::mem::swap(&mut x0, &mut y0);
        std::mem::swap(&mut x1, &mut y1);
    }
    if x0 > x1 || (x0 == x1 && y0 > y1) {
        std::mem::swap(&mut x0, &mut x1);
        std::mem::swap(&mut y0, &mut y1);
    }

    let dx = x1 - x0;
    let dy = (y1 - y0).abs();
    let y_step = if y0 < y1 { 1 } else { -1 };

    // Error doubled to stay in integers.
    let mut err = 2 * dy - dx;
    let mut y = y0;
    for x in x0..=x1 {
        if steep {
            plot(y, x);
        } else {
            plot(x, y);
        }
        if err > 0 {
            y += y_step;
            err -= 2 * dx;
        }
        err += 2 * dy;
    }
}

/// Clip `a → b` to the buffer and draw it.
pub fn draw_line(buffer: &mut ColorBuffer, a: Vec2, b: Vec2, color: Color) {
    // Canonical order so both directions clip to the same float endpoints.
    let (a, b) = if (a.x, a.y) <= (b.x, b.y) { (a, b) } else { (b, a) };
    let bounds = Rect::from_size(buffer.width(), buffer.height());
    let Some((p0, p1)) = clip_segment(a, b, &bounds) else {
        return;
    };
    plot_line(p0.to_pixel(), p1.to_pixel(), |x, y| buffer.set(x, y, color));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colors::{BLACK, WHITE};
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn rect() -> Rect {
        Rect::new(Vec2::new(0.0, 0.0), Vec2::new(99.0, 79.0))
    }

    fn grown(r: &Rect, d: f32) -> Rect {
        Rect::new(r.min - Vec2::new(d, d), r.max + Vec2::new(d, d))
    }

    /// Liang–Barsky overlap test, used as an independent oracle.
    fn segment_hits(a: Vec2, b: Vec2, r: &Rect) -> bool {
        let d = b - a;
        let (mut t0, mut t1) = (0.0f32, 1.0f32);
        for (p, q) in [
            (-d.x, a.x - r.min.x),
            (d.x, r.max.x - a.x),
            (-d.y, a.y - r.min.y),
            (d.y, r.max.y - a.y),
        ] {
            if p == 0.0 {
                if q < 0.0 {
                    return false;
                }
            } else {
                let t = q / p;
                if p < 0.0 {
                    t0 = t0.max(t);
                } else {
                    t1 = t1.min(t);
                }
            }
        }
        t0 <= t1
    }

    fn on_boundary(p: Vec2, r: &Rect) -> bool {
        let eps = 1e-3;
        let inside = grown(r, eps).contains(p);
        let near_edge = (p.x - r.min.x).abs() < eps
            || (p.x - r.max.x).abs() < eps
            || (p.y - r.min.y).abs() < eps
            || (p.y - r.max.y).abs() < eps;
        inside && near_edge
    }

    #[test]
    fn inside_segment_is_unchanged() {
        let a = Vec2::new(10.0, 10.0);
        let b = Vec2::new(20.0, 30.0);
        assert_eq!(clip_segment(a, b, &rect()), Some((a, b)));
    }

    #[test]
    fn crossing_segment_is_clipped_to_edges() {
        let (p0, p1) = clip_segment(Vec2::new(-50.0, 40.0), Vec2::new(150.0, 40.0), &rect())
            .expect("segment crosses the rect");
        assert_eq!(p0, Vec2::new(0.0, 40.0));
        assert_eq!(p1, Vec2::new(99.0, 40.0));
    }

    #[test]
    fn segment_outside_one_side_is_rejected() {
        assert_eq!(clip_segment(Vec2::new(-5.0, 0.0), Vec2::new(-1.0, 70.0), &rect()), None);
    }

    #[test]
    fn diagonal_miss_past_a_corner_is_rejected() {
        // Left and top codes differ, but the segment passes outside the corner.
        assert_eq!(clip_segment(Vec2::new(-10.0, 70.0), Vec2::new(10.0, 100.0), &rect()), None);
    }

    #[test]
    fn endpoint_clamped_to_origin_is_rejected() {
        let through_corner = clip_segment(Vec2::new(-10.0, -10.0), Vec2::new(10.0, 10.0), &rect());
        assert_eq!(through_corner, None);
        let reversed = clip_segment(Vec2::new(10.0, 10.0), Vec2::new(-10.0, -10.0), &rect());
        assert_eq!(reversed, None);

        // Starting on the origin is not a clamp.
        let from_origin = clip_segment(Vec2::ZERO, Vec2::new(10.0, 10.0), &rect());
        assert_eq!(from_origin, Some((Vec2::ZERO, Vec2::new(10.0, 10.0))));
        // Clipping onto the left edge away from the corner is unaffected.
        let (p0, _) = clip_segment(Vec2::new(-10.0, 0.0), Vec2::new(10.0, 10.0), &rect()).unwrap();
        assert_eq!(p0, Vec2::new(0.0, 5.0));
    }

    #[test]
    fn horizontal_line_pixels() {
        let mut pixels = Vec::new();
        plot_line(Vec2i::new(2, 3), Vec2i::new(6, 3), |x, y| pixels.push((x, y)));
        assert_eq!(pixels, vec![(2, 3), (3, 3), (4, 3), (5, 3), (6, 3)]);
    }

    #[test]
    fn single_point_line() {
        let mut pixels = Vec::new();
        plot_line(Vec2i::new(4, 4), Vec2i::new(4, 4), |x, y| pixels.push((x, y)));
        assert_eq!(pixels, vec![(4, 4)]);
    }

    #[test]
    fn fully_rejected_line_writes_nothing() {
        let mut buf = ColorBuffer::new(10, 10, BLACK);
        draw_line(&mut buf, Vec2::new(-20.0, -5.0), Vec2::new(-1.0, 30.0), WHITE);
        assert!(buf.pixels().iter().all(|&c| c == BLACK));
    }

    proptest! {
        #[test]
        fn clip_agrees_with_liang_barsky(
            ax in -200.0f32..300.0, ay in -200.0f32..300.0,
            bx in -200.0f32..300.0, by in -200.0f32..300.0,
        ) {
            let (a, b) = (Vec2::new(ax, ay), Vec2::new(bx, by));
            let r = rect();
            let clipped = clip_segment(a, b, &r);

            if segment_hits(a, b, &grown(&r, -0.01)) {
                prop_assert!(clipped.is_some());
            }
            if !segment_hits(a, b, &grown(&r, 0.01)) {
                prop_assert!(clipped.is_none());
            }
            if let Some((p0, p1)) = clipped {
                prop_assert!(p0 == a || on_boundary(p0, &r));
                prop_assert!(p1 == b || on_boundary(p1, &r));
            }
        }

        #[test]
        fn plot_visits_each_pixel_once(
            ax in -40i32..40, ay in -40i32..40, bx in -40i32..40, by in -40i32..40,
        ) {
            let (a, b) = (Vec2i::new(ax, ay), Vec2i::new(bx, by));
            let mut pixels = Vec::new();
            plot_line(a, b, |x, y| pixels.push((x, y)));

            let unique: HashSet<_> = pixels.iter().copied().collect();
            prop_assert_eq!(unique.len(), pixels.len());
            prop_assert_eq!(pixels.len() as i32, (bx - ax).abs().max((by - ay).abs()) + 1);
            prop_assert!(unique.contains(&(ax, ay)));
            prop_assert!(unique.contains(&(bx, by)));
        }

        #[test]
        fn draw_line_is_symmetric(
            ax in -60.0f32..160.0, ay in -60.0f32..140.0,
            bx in -60.0f32..160.0, by in -60.0f32..140.0,
        ) {
            let (a, b) = (Vec2::new(ax, ay), Vec2::new(bx, by));
            let mut forward = ColorBuffer::new(100, 80, BLACK);
            let mut backward = ColorBuffer::new(100, 80, BLACK);
            draw_line(&mut forward, a, b, WHITE);
            draw_line(&mut backward, b, a, WHITE);
            prop_assert_eq!(forward.pixels(), backward.pixels());
        }
    }
}
