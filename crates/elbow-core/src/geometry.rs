//! Geometry primitives shared by the router and the edit pipeline.
//!
//! All alignment tests use [`DEDUP_THRESHOLD`] as tolerance rather than exact
//! equality: points reach this code after several float round-trips (local ⇄
//! world transforms, midpoint splits), so exact comparisons would report
//! spurious diagonals.

use crate::model::{Axis, Heading, Point, Rect};

/// Coordinates closer than this are treated as equal.
pub const DEDUP_THRESHOLD: f64 = 1.0;

/// Obstacles are shrunk by this much before intersection tests so that
/// segments grazing a boundary stay legal.
pub const INTERSECTION_EPSILON: f64 = 1e-3;

// ─── Headings ────────────────────────────────────────────────────────────

/// Heading of the dominant axis of `(dx, dy)`. Ties resolve horizontal.
pub fn heading_for_vector(dx: f64, dy: f64) -> Heading {
    if dx.abs() >= dy.abs() {
        if dx >= 0.0 { Heading::Right } else { Heading::Left }
    } else if dy >= 0.0 {
        Heading::Down
    } else {
        Heading::Up
    }
}

/// Heading travelled from `a` to `b`.
pub fn heading_for_segment(a: Point, b: Point) -> Heading {
    heading_for_vector(b.x - a.x, b.y - a.y)
}

/// Which side of `rect` the point `p` belongs to.
///
/// The rect's corners are scaled 2× about its center and joined with the
/// center into four triangles; the containing triangle names the side.
/// Points outside every triangle fall back to `Left`.
pub fn heading_for_point_on_bounds(rect: &Rect, p: Point) -> Heading {
    let c = rect.center();
    let [tl, tr, br, bl] = rect
        .corners()
        .map(|q| Point::new(c.x + (q.x - c.x) * 2.0, c.y + (q.y - c.y) * 2.0));

    if triangle_contains([tl, tr, c], p) {
        Heading::Up
    } else if triangle_contains([tr, br, c], p) {
        Heading::Right
    } else if triangle_contains([br, bl, c], p) {
        Heading::Down
    } else {
        Heading::Left
    }
}

fn triangle_contains([a, b, c]: [Point; 3], p: Point) -> bool {
    let cross = |o: Point, u: Point, v: Point| (u.x - o.x) * (v.y - o.y) - (u.y - o.y) * (v.x - o.x);
    let d1 = cross(p, a, b);
    let d2 = cross(p, b, c);
    let d3 = cross(p, c, a);
    let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
    !(has_neg && has_pos)
}

// ─── Alignment ───────────────────────────────────────────────────────────

/// Same `x` within tolerance (a vertical segment).
pub fn is_aligned_x(a: Point, b: Point) -> bool {
    (a.x - b.x).abs() <= DEDUP_THRESHOLD
}

/// Same `y` within tolerance (a horizontal segment).
pub fn is_aligned_y(a: Point, b: Point) -> bool {
    (a.y - b.y).abs() <= DEDUP_THRESHOLD
}

/// Both coordinates within tolerance.
pub fn is_near(a: Point, b: Point) -> bool {
    is_aligned_x(a, b) && is_aligned_y(a, b)
}

/// Orientation of `a → b`, or `None` for diagonal and zero-length segments.
pub fn segment_axis(a: Point, b: Point) -> Option<Axis> {
    match (is_aligned_x(a, b), is_aligned_y(a, b)) {
        (true, false) => Some(Axis::Vertical),
        (false, true) => Some(Axis::Horizontal),
        _ => None,
    }
}

/// No diagonal component beyond tolerance.
pub fn is_orthogonal_segment(a: Point, b: Point) -> bool {
    is_aligned_x(a, b) || is_aligned_y(a, b)
}

pub fn has_diagonal(points: &[Point]) -> bool {
    points.windows(2).any(|w| !is_orthogonal_segment(w[0], w[1]))
}

/// Heading of the first non-degenerate segment.
pub fn first_heading(points: &[Point]) -> Option<Heading> {
    let start = *points.first()?;
    points
        .iter()
        .skip(1)
        .find(|p| !is_near(start, **p))
        .map(|p| heading_for_segment(start, *p))
}

/// Heading travelled along the last non-degenerate segment.
pub fn last_heading(points: &[Point]) -> Option<Heading> {
    let end = *points.last()?;
    points
        .iter()
        .rev()
        .skip(1)
        .find(|p| !is_near(end, **p))
        .map(|p| heading_for_segment(*p, end))
}

pub fn path_length(points: &[Point]) -> f64 {
    points.windows(2).map(|w| w[0].manhattan(w[1])).sum()
}

/// Whether `a → b` stays clear of every obstacle (grazing allowed).
pub fn segment_is_clear(a: Point, b: Point, obstacles: &[Rect]) -> bool {
    obstacles
        .iter()
        .all(|r| !r.shrink(INTERSECTION_EPSILON).intersects_segment(a, b))
}

pub fn clamp_point(p: Point, max: f64) -> Point {
    Point::new(p.x.clamp(-max, max), p.y.clamp(-max, max))
}

// ─── Path simplification ─────────────────────────────────────────────────

/// Drop redundant points while keeping every index listed in `pinned`.
///
/// Pass 1 removes interior points whose neighbouring segments share an
/// orientation; pass 2 removes points within [`DEDUP_THRESHOLD`] of the
/// previously kept point. Both passes repeat until nothing changes, so the
/// result is a fixed point. The first and last points are always kept.
pub fn simplify_path(points: &[Point], pinned: &[usize]) -> Vec<Point> {
    if points.len() <= 2 {
        return points.to_vec();
    }
    let last_index = points.len() - 1;
    let is_pinned = |orig: usize| orig == 0 || orig == last_index || pinned.contains(&orig);

    let mut current: Vec<(usize, Point)> = points.iter().copied().enumerate().collect();
    loop {
        let before = current.len();

        let mut collinear_free: Vec<(usize, Point)> = Vec::with_capacity(current.len());
        for i in 0..current.len() {
            let (orig, p) = current[i];
            if i == 0 || i == current.len() - 1 || is_pinned(orig) {
                collinear_free.push((orig, p));
                continue;
            }
            let prev = collinear_free[collinear_free.len() - 1].1;
            let next = current[i + 1].1;
            let incoming = segment_axis(prev, p);
            if incoming.is_some() && incoming == segment_axis(p, next) {
                continue;
            }
            collinear_free.push((orig, p));
        }

        let mut deduped: Vec<(usize, Point)> = Vec::with_capacity(collinear_free.len());
        for (orig, p) in collinear_free {
            if let Some(&(last_orig, last)) = deduped.last()
                && is_near(last, p)
            {
                if !is_pinned(orig) {
                    continue;
                }
                if !is_pinned(last_orig) {
                    deduped.pop();
                }
            }
            deduped.push((orig, p));
        }

        current = deduped;
        if current.len() == before {
            break;
        }
    }
    current.into_iter().map(|(_, p)| p).collect()
}

/// Keep only the points where the path changes orientation, plus both ends.
pub fn corner_points(points: &[Point]) -> Vec<Point> {
    if points.len() <= 2 {
        return points.to_vec();
    }
    let horizontal = |a: Point, b: Point| (a.y - b.y).abs() < (a.x - b.x).abs();
    let mut previous = horizontal(points[0], points[1]);
    let mut out = vec![points[0]];
    for i in 1..points.len() - 1 {
        let next = horizontal(points[i], points[i + 1]);
        if next != previous {
            out.push(points[i]);
        }
        previous = next;
    }
    out.push(points[points.len() - 1]);
    out
}

/// Drop points that sit on top of the previously kept point.
///
/// The last point always survives (it replaces a near-duplicate
/// predecessor), and at least the two original ends are returned.
pub fn remove_zero_length(points: &[Point]) -> Vec<Point> {
    let Some((&last, rest)) = points.split_last() else {
        return Vec::new();
    };
    let mut out: Vec<Point> = Vec::with_capacity(points.len());
    for p in rest {
        if out.last().is_some_and(|q| is_near(*q, *p)) {
            continue;
        }
        out.push(*p);
    }
    if out.len() > 1 && out.last().is_some_and(|q| is_near(*q, last)) {
        out.pop();
    }
    out.push(last);
    if out.len() < 2 && points.len() >= 2 {
        return vec![points[0], last];
    }
    out
}

/// Insert a corner between every diagonal pair of consecutive points.
///
/// The corner continues the previous segment's axis when there is one (so no
/// extra bend appears at the first point), otherwise it is chosen so the
/// last leg matches the following segment's axis.
pub fn orthogonalize(points: &[Point]) -> Vec<Point> {
    let Some(&first) = points.first() else {
        return Vec::new();
    };
    let mut out = vec![first];
    for i in 1..points.len() {
        let a = out[out.len() - 1];
        let b = points[i];
        if !is_orthogonal_segment(a, b) {
            let prev_axis = (out.len() >= 2)
                .then(|| segment_axis(out[out.len() - 2], a))
                .flatten();
            let next_axis = points.get(i + 1).and_then(|n| segment_axis(b, *n));
            let horizontal_first = match (prev_axis, next_axis) {
                (Some(axis), _) => axis == Axis::Horizontal,
                (None, Some(axis)) => axis == Axis::Vertical,
                (None, None) => (b.x - a.x).abs() >= (b.y - a.y).abs(),
            };
            out.push(elbow_corner(a, b, horizontal_first));
        }
        out.push(b);
    }
    out
}

/// Corner of the L from `a` to `b`.
pub fn elbow_corner(a: Point, b: Point, horizontal_first: bool) -> Point {
    if horizontal_first {
        Point::new(b.x, a.y)
    } else {
        Point::new(a.x, b.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(raw: &[(f64, f64)]) -> Vec<Point> {
        raw.iter().map(|(x, y)| Point::new(*x, *y)).collect()
    }

    #[test]
    fn heading_for_point_on_each_side() {
        let r = Rect::new(0.0, 0.0, 100.0, 50.0);
        assert_eq!(heading_for_point_on_bounds(&r, Point::new(50.0, 0.0)), Heading::Up);
        assert_eq!(heading_for_point_on_bounds(&r, Point::new(100.0, 25.0)), Heading::Right);
        assert_eq!(heading_for_point_on_bounds(&r, Point::new(50.0, 50.0)), Heading::Down);
        assert_eq!(heading_for_point_on_bounds(&r, Point::new(0.0, 25.0)), Heading::Left);
        // Far outside every triangle.
        assert_eq!(heading_for_point_on_bounds(&r, Point::new(1000.0, 1000.0)), Heading::Left);
    }

    #[test]
    fn vector_ties_resolve_horizontal() {
        assert_eq!(heading_for_vector(5.0, 5.0), Heading::Right);
        assert_eq!(heading_for_vector(-5.0, 5.0), Heading::Left);
        assert_eq!(heading_for_vector(1.0, -5.0), Heading::Up);
        assert_eq!(heading_for_segment(Point::new(0.0, 0.0), Point::new(0.0, 3.0)), Heading::Down);
    }

    #[test]
    fn segment_axis_uses_threshold() {
        let a = Point::new(0.0, 0.0);
        assert_eq!(segment_axis(a, Point::new(50.0, 0.5)), Some(Axis::Horizontal));
        assert_eq!(segment_axis(a, Point::new(0.9, 50.0)), Some(Axis::Vertical));
        assert_eq!(segment_axis(a, Point::new(10.0, 10.0)), None);
        assert_eq!(segment_axis(a, Point::new(0.5, 0.5)), None);
    }

    #[test]
    fn simplify_drops_collinear_but_keeps_pinned() {
        let path = pts(&[(0.0, 0.0), (50.0, 0.0), (100.0, 0.0), (100.0, 80.0)]);
        assert_eq!(simplify_path(&path, &[]), pts(&[(0.0, 0.0), (100.0, 0.0), (100.0, 80.0)]));
        assert_eq!(simplify_path(&path, &[1]), path);
    }

    #[test]
    fn simplify_reaches_a_fixed_point() {
        // Removing the near-duplicate exposes a collinear triple.
        let path = pts(&[
            (0.0, 0.0),
            (0.0, 40.0),
            (0.4, 40.3),
            (0.0, 90.0),
            (60.0, 90.0),
        ]);
        let once = simplify_path(&path, &[]);
        assert_eq!(once, pts(&[(0.0, 0.0), (0.0, 90.0), (60.0, 90.0)]));
        assert_eq!(simplify_path(&once, &[]), once);
    }

    #[test]
    fn corner_points_keep_turns_only() {
        let path = pts(&[(0.0, 0.0), (10.0, 0.0), (20.0, 0.0), (20.0, 10.0), (20.0, 30.0), (40.0, 30.0)]);
        assert_eq!(corner_points(&path), pts(&[(0.0, 0.0), (20.0, 0.0), (20.0, 30.0), (40.0, 30.0)]));
    }

    #[test]
    fn orthogonalize_continues_previous_axis() {
        let path = pts(&[(0.0, 0.0), (20.0, 0.0), (60.0, 40.0)]);
        let fixed = orthogonalize(&path);
        assert_eq!(fixed, pts(&[(0.0, 0.0), (20.0, 0.0), (60.0, 0.0), (60.0, 40.0)]));
        assert!(!has_diagonal(&fixed));
    }

    #[test]
    fn zero_length_segments_are_removed() {
        let path = pts(&[(0.0, 0.0), (0.2, 0.0), (0.0, 50.0), (0.0, 50.5)]);
        assert_eq!(remove_zero_length(&path), pts(&[(0.0, 0.0), (0.0, 50.5)]));
        let tiny = pts(&[(0.0, 0.0), (0.1, 0.1)]);
        assert_eq!(remove_zero_length(&tiny), tiny);
    }

    #[test]
    fn first_and_last_headings_skip_degenerate_segments() {
        let path = pts(&[(0.0, 0.0), (0.2, 0.0), (0.0, 50.0), (30.0, 50.0), (30.3, 50.0)]);
        assert_eq!(first_heading(&path), Some(Heading::Down));
        assert_eq!(last_heading(&path), Some(Heading::Right));
    }
}
