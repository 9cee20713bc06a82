//! Fresh routing: direct shortcut, grid search, heuristic fallback.
//!
//! [`route`] never fails. Each stage returns `Option` and the chain falls
//! through to the unconstrained fallback, which always yields a usable
//! orthogonal path.

use crate::config::{RouteConfig, RouteStrategy};
use crate::endpoint::{Endpoint, ResolvedEndpoint, resolve_endpoints};
use crate::finalize::{bound_shapes, finalize_path, path_avoids};
use crate::geometry::{
    clamp_point, elbow_corner, first_heading, has_diagonal, heading_for_segment, is_near,
    last_heading, path_length, remove_zero_length, segment_axis, segment_is_clear, simplify_path,
};
use crate::grid::find_path;
use crate::layout::build_obstacle_layout;
use crate::model::{Axis, ElementLookup, Point, Rect};
use smallvec::SmallVec;

/// Below this Manhattan distance the unconstrained fallback uses a single
/// elbow instead of a midpoint Z.
const SHORT_DETOUR_DISTANCE: f64 = 10.0;

/// Route between two caller endpoints, resolving bindings through `lookup`.
pub fn route(
    start: Endpoint,
    end: Endpoint,
    lookup: &impl ElementLookup,
    config: &RouteConfig,
) -> Vec<Point> {
    let (start, end) = resolve_endpoints(&start, &end, lookup);
    route_resolved(&start, &end, config)
}

/// Route between two already-resolved endpoints.
pub fn route_resolved(
    start: &ResolvedEndpoint,
    end: &ResolvedEndpoint,
    config: &RouteConfig,
) -> Vec<Point> {
    let path = if is_near(start.point, end.point) {
        vec![start.point, end.point]
    } else if let Some(path) = direct_path(start, end) {
        log::debug!("route: direct");
        path
    } else {
        let searched = match config.strategy {
            RouteStrategy::Grid => grid_route(start, end, config),
            RouteStrategy::FallbackOnly => None,
        };
        match searched {
            Some(path) => {
                log::debug!("route: grid path with {} points", path.len());
                path
            }
            None => {
                log::debug!("route: fallback ({:?})", config.strategy);
                fallback_route(start, end, config)
            }
        }
    };
    path.into_iter()
        .map(|p| clamp_point(p, config.max_coordinate))
        .collect()
}

/// Heading compliance and orthogonality of a candidate path.
///
/// A constrained start must leave along its heading, a constrained end must
/// be reached travelling opposite to its heading, and no segment may be
/// diagonal. Degenerate (single-point) paths pass the heading checks.
pub fn validate_path(points: &[Point], start: &ResolvedEndpoint, end: &ResolvedEndpoint) -> bool {
    if points.len() < 2 || has_diagonal(points) {
        return false;
    }
    if start.requires_heading() && first_heading(points).is_some_and(|h| h != start.heading) {
        return false;
    }
    if end.requires_heading()
        && last_heading(points).is_some_and(|h| h != end.heading.opposite())
    {
        return false;
    }
    true
}

/// The straight segment between the ends when it satisfies every heading
/// and passes clear of the bound shapes.
pub fn direct_path(start: &ResolvedEndpoint, end: &ResolvedEndpoint) -> Option<Vec<Point>> {
    let axis = segment_axis(start.point, end.point)?;
    if start.heading.axis() != axis || end.heading.axis() != axis {
        return None;
    }
    let forward = heading_for_segment(start.point, end.point);
    if start.requires_heading() && start.heading != forward {
        return None;
    }
    if end.requires_heading() && end.heading != forward.opposite() {
        return None;
    }
    let shapes = bound_shapes(start, end);
    segment_is_clear(start.point, end.point, &shapes).then(|| vec![start.point, end.point])
}

fn grid_route(
    start: &ResolvedEndpoint,
    end: &ResolvedEndpoint,
    config: &RouteConfig,
) -> Option<Vec<Point>> {
    let layout = build_obstacle_layout(start, end, config);
    let raw = find_path(&layout, start, end)?;

    let mut path = Vec::with_capacity(raw.len() + 2);
    path.push(start.point);
    path.extend(raw);
    path.push(end.point);

    let path = finalize_path(&path, start, end, config);
    if validate_path(&path, start, end) {
        Some(path)
    } else {
        log::debug!("route: grid path rejected after finalization");
        None
    }
}

/// Heuristic path used when the grid search fails or is disabled.
pub fn fallback_route(
    start: &ResolvedEndpoint,
    end: &ResolvedEndpoint,
    config: &RouteConfig,
) -> Vec<Point> {
    if !start.requires_heading() && !end.requires_heading() {
        return unconstrained_fallback(start.point, end.point);
    }

    let shapes = bound_shapes(start, end);
    let best = constrained_candidates(start, end, &shapes, config.fallback_padding)
        .into_iter()
        .map(|c| simplify_path(&remove_zero_length(&c), &[]))
        .filter(|c| validate_path(c, start, end))
        .map(|c| (!path_avoids(&c, &shapes), path_length(&c), c))
        .min_by(|a, b| a.0.cmp(&b.0).then(a.1.total_cmp(&b.1)));

    match best {
        Some((_, _, path)) => path,
        None => {
            log::debug!("route: no constrained candidate is valid");
            unconstrained_fallback(start.point, end.point)
        }
    }
}

/// Direct when aligned, a single elbow when very close, otherwise a Z
/// through the midpoint of the dominant axis.
pub fn unconstrained_fallback(s: Point, e: Point) -> Vec<Point> {
    if is_near(s, e) || segment_axis(s, e).is_some() {
        return vec![s, e];
    }
    let (dx, dy) = (e.x - s.x, e.y - s.y);
    if dx.abs() + dy.abs() < SHORT_DETOUR_DISTANCE {
        return vec![s, elbow_corner(s, e, true), e];
    }
    if dx.abs() >= dy.abs() {
        let mid = (s.x + e.x) / 2.0;
        vec![s, Point::new(mid, s.y), Point::new(mid, e.y), e]
    } else {
        let mid = (s.y + e.y) / 2.0;
        vec![s, Point::new(s.x, mid), Point::new(e.x, mid), e]
    }
}

/// Midpoint of `a` and `b` along `axis`, pushed `pad` past a constrained
/// end whenever the plain midpoint would sit behind its heading.
fn pushed_mid(
    a: f64,
    b: f64,
    start: &ResolvedEndpoint,
    end: &ResolvedEndpoint,
    axis: Axis,
    pad: f64,
) -> f64 {
    let mut mid = (a + b) / 2.0;
    for (endpoint, origin) in [(start, a), (end, b)] {
        let h = endpoint.heading;
        if endpoint.requires_heading() && h.axis() == axis && (mid - origin) * h.sign() <= 0.0 {
            mid = origin + h.sign() * pad;
        }
    }
    mid
}

/// Lowest and highest coordinate across `axis` touched by `points` or
/// `shapes`.
fn extent_across(points: &[Point], shapes: &[Rect], axis: Axis) -> (f64, f64) {
    let coords = points
        .iter()
        .map(|p| (p.across(axis), p.across(axis)))
        .chain(shapes.iter().map(|r| r.span(axis.perpendicular())));
    coords.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), (a, b)| {
        (lo.min(a), hi.max(b))
    })
}

fn constrained_candidates(
    start: &ResolvedEndpoint,
    end: &ResolvedEndpoint,
    shapes: &[Rect],
    pad: f64,
) -> SmallVec<[Vec<Point>; 13]> {
    let (s, e) = (start.point, end.point);
    let mut out: SmallVec<[Vec<Point>; 13]> = SmallVec::new();

    out.push(vec![s, e]);
    out.push(vec![s, elbow_corner(s, e, true), e]);
    out.push(vec![s, elbow_corner(s, e, false), e]);

    let mx = pushed_mid(s.x, e.x, start, end, Axis::Horizontal, pad);
    out.push(vec![s, Point::new(mx, s.y), Point::new(mx, e.y), e]);
    let my = pushed_mid(s.y, e.y, start, end, Axis::Vertical, pad);
    out.push(vec![s, Point::new(s.x, my), Point::new(e.x, my), e]);

    // Stub out of each constrained end first, then connect the stubs.
    let s2 = if start.requires_heading() { s.offset(start.heading, pad) } else { s };
    let e2 = if end.requires_heading() { e.offset(end.heading, pad) } else { e };
    for horizontal_first in [true, false] {
        out.push(vec![s, s2, elbow_corner(s2, e2, horizontal_first), e2, e]);
    }
    let mid_x = (s2.x + e2.x) / 2.0;
    out.push(vec![s, s2, Point::new(mid_x, s2.y), Point::new(mid_x, e2.y), e2, e]);
    let mid_y = (s2.y + e2.y) / 2.0;
    out.push(vec![s, s2, Point::new(s2.x, mid_y), Point::new(e2.x, mid_y), e2, e]);

    // U-turns on a lane past both shapes, for stubs that face the same way
    // or that sit on one line.
    for axis in [Axis::Horizontal, Axis::Vertical] {
        let (lo, hi) = extent_across(&[s, e, s2, e2], shapes, axis);
        for lane in [lo - pad, hi + pad] {
            out.push(vec![s, s2, s2.with_across(axis, lane), e2.with_across(axis, lane), e2, e]);
        }
    }
    out
}
