//! Post-processing applied to every raw routed path.

use crate::config::RouteConfig;
use crate::endpoint::ResolvedEndpoint;
use crate::geometry::{
    DEDUP_THRESHOLD, clamp_point, corner_points, heading_for_segment, orthogonalize,
    remove_zero_length, segment_axis, segment_is_clear,
};
use crate::model::{Point, Rect};
use crate::route::validate_path;
use smallvec::SmallVec;

/// Bounds of every bound end's element.
pub fn bound_shapes(start: &ResolvedEndpoint, end: &ResolvedEndpoint) -> SmallVec<[Rect; 2]> {
    [start, end]
        .into_iter()
        .filter(|e| e.is_bound)
        .filter_map(|e| e.element_bounds)
        .collect()
}

/// Every segment stays out of every shape (grazing allowed).
pub fn path_avoids(points: &[Point], shapes: &[Rect]) -> bool {
    points.windows(2).all(|w| segment_is_clear(w[0], w[1], shapes))
}

/// Orthogonalize, collapse backtracks, drop zero-length segments, reduce to
/// corners, clamp, and balance clearances when both ends are bound.
pub fn finalize_path(
    points: &[Point],
    start: &ResolvedEndpoint,
    end: &ResolvedEndpoint,
    config: &RouteConfig,
) -> Vec<Point> {
    let shapes = bound_shapes(start, end);
    let path = orthogonalize(points);
    let path = collapse_backtracks(path, start, end, &shapes);
    let path = remove_zero_length(&path);
    let path: Vec<Point> = corner_points(&path)
        .into_iter()
        .map(|p| clamp_point(p, config.max_coordinate))
        .collect();

    if start.is_bound && end.is_bound {
        balance_clearances(path, start, end, &shapes, config)
    } else {
        path
    }
}

/// Splice together any two non-adjacent points on a shared line when
/// everything between them stays on that line and the shortcut is clear.
fn collapse_backtracks(
    mut path: Vec<Point>,
    start: &ResolvedEndpoint,
    end: &ResolvedEndpoint,
    shapes: &[Rect],
) -> Vec<Point> {
    'outer: loop {
        let n = path.len();
        for i in 0..n {
            for j in (i + 2..n).rev() {
                let Some(axis) = segment_axis(path[i], path[j]) else {
                    continue;
                };
                let line = path[i].across(axis);
                if !path[i + 1..j]
                    .iter()
                    .all(|p| (p.across(axis) - line).abs() <= DEDUP_THRESHOLD)
                {
                    continue;
                }
                if !segment_is_clear(path[i], path[j], shapes) {
                    continue;
                }
                let shortcut = heading_for_segment(path[i], path[j]);
                if i == 0 && start.requires_heading() && shortcut != start.heading {
                    continue;
                }
                if j == n - 1 && end.requires_heading() && shortcut != end.heading.opposite() {
                    continue;
                }
                path.drain(i + 1..j);
                continue 'outer;
            }
        }
        return path;
    }
}

/// Distance from the shape side facing `heading` to the segment `a → b`,
/// when that segment runs parallel to the side and lies outside it.
fn clearance(a: Point, b: Point, endpoint: &ResolvedEndpoint, bounds: &Rect) -> Option<f64> {
    let h = endpoint.heading;
    if segment_axis(a, b) != Some(h.axis().perpendicular()) {
        return None;
    }
    let c = (a.along(h.axis()) - bounds.side(h)) * h.sign();
    (c > 0.0).then_some(c)
}

fn balance_clearances(
    path: Vec<Point>,
    start: &ResolvedEndpoint,
    end: &ResolvedEndpoint,
    shapes: &[Rect],
    config: &RouteConfig,
) -> Vec<Point> {
    let (Some(start_bounds), Some(end_bounds)) = (start.element_bounds, end.element_bounds) else {
        return path;
    };
    let accepts = |candidate: &[Point]| validate_path(candidate, start, end) && path_avoids(candidate, shapes);
    let n = path.len();

    // Facing shapes joined by one perpendicular run: center that run.
    if n == 4 && end.heading == start.heading.opposite() {
        let h = start.heading;
        let lo = start_bounds.side(h);
        let hi = end_bounds.side(end.heading);
        if (hi - lo) * h.sign() > 0.0 {
            let mid = (lo + hi) / 2.0;
            let mut candidate = path.clone();
            candidate[1] = candidate[1].with_along(h.axis(), mid);
            candidate[2] = candidate[2].with_along(h.axis(), mid);
            if accepts(&candidate) {
                return candidate;
            }
        }
        return path;
    }

    if n < 5 {
        return path;
    }
    let (Some(start_gap), Some(end_gap)) = (
        clearance(path[1], path[2], start, &start_bounds),
        clearance(path[n - 2], path[n - 3], end, &end_bounds),
    ) else {
        return path;
    };
    let smaller = start_gap.min(end_gap);

    let mut path = path;
    for (indices, endpoint, bounds) in [([1, 2], start, start_bounds), ([n - 2, n - 3], end, end_bounds)] {
        let h = endpoint.heading;
        let target = smaller.max(config.min_spacing(endpoint.has_arrowhead));
        let value = bounds.side(h) + h.sign() * target;
        let mut candidate = path.clone();
        for i in indices {
            candidate[i] = candidate[i].with_along(h.axis(), value);
        }
        if accepts(&candidate) {
            path = candidate;
        }
    }
    path
}
