//! Ear-clipping triangulation of simple polygons.
//!
//! Works on integer coordinates so the orientation and inside tests are exact.
//! Output triangles keep the winding of the input polygon.

use crate::error::TriangulateError;
use crate::math::Vec2i;

/// Twice the signed area of `(a, b, c)`; positive when counter-clockwise.
#[inline]
fn area2(a: Vec2i, b: Vec2i, c: Vec2i) -> i64 {
    let (ax, ay) = (a.x as i64, a.y as i64);
    let (bx, by) = (b.x as i64, b.y as i64);
    let (cx, cy) = (c.x as i64, c.y as i64);
    (bx - ax) * (cy - ay) - (by - ay) * (cx - ax)
}

/// Twice the signed area of the whole polygon (shoelace formula).
pub fn signed_area2(polygon: &[Vec2i]) -> i64 {
    let n = polygon.len();
    (0..n)
        .map(|i| {
            let (p, q) = (polygon[i], polygon[(i + 1) % n]);
            p.x as i64 * q.y as i64 - p.y as i64 * q.x as i64
        })
        .sum()
}

/// True when `p` lies strictly inside the triangle of orientation `sign`.
#[inline]
fn strictly_inside(p: Vec2i, a: Vec2i, b: Vec2i, c: Vec2i, sign: i64) -> bool {
    area2(a, b, p).signum() == sign && area2(b, c, p).signum() == sign && area2(c, a, p).signum() == sign
}

/// Triangulate a simple polygon given in ring order.
///
/// Returns index triples into `polygon`, `n - 2` of them for a well-formed
/// input. When no ear can be found (self-intersecting or collinear input) the
/// ears found so far and the unclipped residue are returned inside
/// [`TriangulateError::Degenerate`].
pub fn triangulate(polygon: &[Vec2i]) -> Result<Vec<[usize; 3]>, TriangulateError> {
    let n = polygon.len();
    if n < 3 {
        return Err(TriangulateError::TooFewVertices(n));
    }
    if n == 3 {
        return Ok(vec![[0, 1, 2]]);
    }

    let orientation = signed_area2(polygon).signum();
    if orientation == 0 {
        return Err(TriangulateError::Degenerate {
            triangles: Vec::new(),
            remaining: (0..n).collect(),
        });
    }

    let mut prev: Vec<usize> = (0..n).map(|i| (i + n - 1) % n).collect();
    let mut next: Vec<usize> = (0..n).map(|i| (i + 1) % n).collect();
    let mut triangles = Vec::with_capacity(n - 2);

    let mut remaining = n;
    let mut ear = 0;
    let mut failures = 0;

    while remaining > 3 {
        let (p, q) = (prev[ear], next[ear]);
        let (a, b, c) = (polygon[p], polygon[ear], polygon[q]);

        let is_ear = area2(a, b, c).signum() == orientation && {
            // Walk the other active vertices.
            let mut v = next[q];
            let mut clear = true;
            while v != p {
                if strictly_inside(polygon[v], a, b, c, orientation) {
                    clear = false;
                    break;
                }
                v = next[v];
            }
            clear
        };

        if is_ear {
            triangles.push([p, ear, q]);
            next[p] = q;
            prev[q] = p;
            remaining -= 1;
            failures = 0;
            ear = p;
        } else {
            ear = q;
            failures += 1;
            if failures >= remaining {
                let mut ring = Vec::with_capacity(remaining);
                let mut v = ear;
                for _ in 0..remaining {
                    ring.push(v);
                    v = next[v];
                }
                return Err(TriangulateError::Degenerate {
                    triangles,
                    remaining: ring,
                });
            }
        }
    }

    triangles.push([prev[ear], ear, next[ear]]);
    Ok(triangles)
}

/// Fan triangulation around vertex 0. Correct only for convex input.
pub fn fan(n: usize) -> Vec<[usize; 3]> {
    (1..n.saturating_sub(1)).map(|i| [0, i, i + 1]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn poly(points: &[(i32, i32)]) -> Vec<Vec2i> {
        points.iter().map(|&p| p.into()).collect()
    }

    fn triangle_area_sum(polygon: &[Vec2i], triangles: &[[usize; 3]]) -> i64 {
        triangles
            .iter()
            .map(|&[a, b, c]| area2(polygon[a], polygon[b], polygon[c]))
            .sum()
    }

    #[test]
    fn too_few_vertices() {
        assert_eq!(
            triangulate(&poly(&[(0, 0), (1, 0)])),
            Err(TriangulateError::TooFewVertices(2))
        );
    }

    #[test]
    fn single_triangle_is_returned_as_is() {
        assert_eq!(triangulate(&poly(&[(0, 0), (4, 0), (0, 4)])), Ok(vec![[0, 1, 2]]));
    }

    #[test]
    fn convex_quad_splits_along_a_diagonal() {
        let square = poly(&[(0, 0), (10, 0), (10, 10), (0, 10)]);
        let tris = triangulate(&square).expect("square is simple");
        assert_eq!(tris.len(), 2);
        assert_eq!(triangle_area_sum(&square, &tris), 200);

        // The two triangles share exactly two vertices: the diagonal.
        let shared: Vec<usize> = tris[0].iter().copied().filter(|i| tris[1].contains(i)).collect();
        assert_eq!(shared.len(), 2);
        let (a, b) = (square[shared[0]], square[shared[1]]);
        let len = (((b.x - a.x).pow(2) + (b.y - a.y).pow(2)) as f32).sqrt();
        assert!((len - 10.0 * 2f32.sqrt()).abs() < 1e-4 || (len - 10.0).abs() < 1e-4);
    }

    #[test]
    fn concave_polygon_keeps_winding() {
        // An arrow head with a reflex vertex at (5, 3).
        let arrow = poly(&[(0, 0), (5, 3), (10, 0), (5, 10)]);
        let tris = triangulate(&arrow).expect("arrow is simple");
        assert_eq!(tris.len(), 2);
        let orientation = signed_area2(&arrow).signum();
        for &[a, b, c] in &tris {
            assert_eq!(area2(arrow[a], arrow[b], arrow[c]).signum(), orientation);
        }
        assert_eq!(triangle_area_sum(&arrow, &tris), signed_area2(&arrow));
    }

    #[test]
    fn clockwise_input_stays_clockwise() {
        let square = poly(&[(0, 0), (0, 10), (10, 10), (10, 0)]);
        let tris = triangulate(&square).expect("square is simple");
        assert_eq!(triangle_area_sum(&square, &tris), -200);
    }

    #[test]
    fn collinear_polygon_is_degenerate() {
        let line = poly(&[(0, 0), (1, 1), (2, 2), (3, 3)]);
        assert!(matches!(
            triangulate(&line),
            Err(TriangulateError::Degenerate { .. })
        ));
    }

    #[test]
    fn degenerate_residue_accounts_for_every_vertex() {
        let bowtie = poly(&[(0, 0), (10, 10), (10, 0), (0, 10), (-5, 5)]);
        match triangulate(&bowtie) {
            Ok(tris) => assert_eq!(tris.len(), bowtie.len() - 2),
            Err(TriangulateError::Degenerate { triangles, remaining }) => {
                assert!(remaining.len() > 3);
                assert_eq!(triangles.len() + remaining.len(), bowtie.len());
            }
            Err(other) => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn fan_of_pentagon() {
        assert_eq!(fan(5), vec![[0, 1, 2], [0, 2, 3], [0, 3, 4]]);
        assert!(fan(2).is_empty());
    }

    /// Star-shaped polygon around the origin: strictly increasing angles make it simple.
    fn star_polygon() -> impl Strategy<Value = Vec<Vec2i>> {
        (4usize..12).prop_flat_map(|n| {
            (
                proptest::collection::vec(100.0f64..1000.0, n),
                proptest::collection::vec(0.1f64..0.9, n),
            )
                .prop_map(move |(radii, jitter)| {
                    let step = std::f64::consts::TAU / n as f64;
                    radii
                        .iter()
                        .zip(&jitter)
                        .enumerate()
                        .map(|(i, (r, j))| {
                            let angle = (i as f64 + j) * step;
                            Vec2i::new((r * angle.cos()).round() as i32, (r * angle.sin()).round() as i32)
                        })
                        .collect()
                })
        })
    }

    fn has_collinear_triple(polygon: &[Vec2i]) -> bool {
        let n = polygon.len();
        (0..n).any(|i| {
            (i + 1..n).any(|j| (j + 1..n).any(|k| area2(polygon[i], polygon[j], polygon[k]) == 0))
        })
    }

    proptest! {
        #[test]
        fn simple_polygons_yield_n_minus_2_disjoint_triangles(polygon in star_polygon()) {
            prop_assume!(!has_collinear_triple(&polygon));

            let tris = triangulate(&polygon).expect("star polygons are simple");
            prop_assert_eq!(tris.len(), polygon.len() - 2);

            // Same winding everywhere and areas summing to the polygon's area
            // means the triangles tile it without overlap.
            let orientation = signed_area2(&polygon).signum();
            for &[a, b, c] in &tris {
                prop_assert_eq!(area2(polygon[a], polygon[b], polygon[c]).signum(), orientation);
            }
            prop_assert_eq!(triangle_area_sum(&polygon, &tris), signed_area2(&polygon));
        }
    }
}
