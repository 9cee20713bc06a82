//! Obstacle layout builder.
//!
//! Turns two resolved endpoints into two padded obstacle rects, the exit
//! point on each, and the rect bounding the whole search. Obstacles are
//! grown toward each other until they touch so the grid gets useful axis
//! lines between the shapes, then trimmed back to stay near their shapes.

use crate::config::RouteConfig;
use crate::endpoint::ResolvedEndpoint;
use crate::model::{Axis, Heading, Padding, Point, Rect};

/// Everything the grid search needs for one routing call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObstacleLayout {
    /// Universe of the search: both obstacles plus a margin.
    pub common_bounds: Rect,
    pub start_exit: Point,
    pub end_exit: Point,
    /// `[start, end]`.
    pub obstacles: [Rect; 2],
    /// Both shapes were too close to route around; obstacles shrank to
    /// point squares and the search ignores them.
    pub overlap: bool,
}

impl ObstacleLayout {
    /// Obstacles the grid search must avoid.
    pub fn search_obstacles(&self) -> &[Rect] {
        if self.overlap { &[] } else { &self.obstacles }
    }
}

/// Shape bounds of a bound end, or a zero-size rect at a free end.
pub fn shape_rect(endpoint: &ResolvedEndpoint) -> Rect {
    endpoint
        .element_bounds
        .unwrap_or_else(|| Rect::from_point(endpoint.point))
}

fn routing_padding(endpoint: &ResolvedEndpoint, config: &RouteConfig) -> Padding {
    if endpoint.is_bound {
        Padding::for_heading(
            endpoint.heading,
            config.head_clearance(endpoint.has_arrowhead),
            config.side_padding,
        )
    } else {
        Padding::ZERO
    }
}

pub fn build_obstacle_layout(
    start: &ResolvedEndpoint,
    end: &ResolvedEndpoint,
    config: &RouteConfig,
) -> ObstacleLayout {
    let start_shape = shape_rect(start);
    let end_shape = shape_rect(end);
    let start_padding = routing_padding(start, config);
    let end_padding = routing_padding(end, config);

    let overlap = start.is_bound
        && end.is_bound
        && start_shape
            .inflate(start_padding)
            .overlaps(&end_shape.inflate(end_padding));

    let obstacles = if overlap {
        overlap_obstacles(start, end, config)
    } else {
        separated_obstacles(start, end, [start_shape, end_shape], [start_padding, end_padding], config)
    };

    let common_bounds = obstacles[0]
        .union(&obstacles[1])
        .inflate(Padding::uniform(config.base_padding));

    log::trace!(
        "layout overlap={overlap} start={:?} end={:?}",
        obstacles[0],
        obstacles[1]
    );

    ObstacleLayout {
        common_bounds,
        start_exit: exit_point(start.point, start.heading, &obstacles[0]),
        end_exit: exit_point(end.point, end.heading, &obstacles[1]),
        obstacles,
        overlap,
    }
}

/// Point squares around both ends, padded on the heading side only. Each
/// exit then sits just past its own end, clear of the other shape.
fn overlap_obstacles(
    start: &ResolvedEndpoint,
    end: &ResolvedEndpoint,
    config: &RouteConfig,
) -> [Rect; 2] {
    [start, end].map(|endpoint| {
        Rect::around(endpoint.point, config.exit_point_padding).inflate(Padding::for_heading(
            endpoint.heading,
            config.overlap_padding,
            0.0,
        ))
    })
}

fn separated_obstacles(
    start: &ResolvedEndpoint,
    end: &ResolvedEndpoint,
    shapes: [Rect; 2],
    padding: [Padding; 2],
    config: &RouteConfig,
) -> [Rect; 2] {
    let [a, b] = shapes;
    let common = a.union(&b);
    let mut obstacles = [
        dynamic_aabb(&a, &b, &common, padding[0]),
        dynamic_aabb(&b, &a, &common, padding[1]),
    ];
    split_residual_overlap(&mut obstacles, &a, &b);

    let limit = |shape: Rect| shape.inflate(Padding::uniform(config.base_padding));
    obstacles[0] = intersect_within(&obstacles[0], &limit(a));
    obstacles[1] = intersect_within(&obstacles[1], &limit(b));

    if start.is_bound && end.is_bound {
        harmonize_exit_spacing(&mut obstacles, shapes, [start, end], config);
    }
    obstacles
}

/// Grow `a` side by side relative to `b`.
///
/// A side facing `b` across a gap stops at the midpoint between the two
/// (pushed out to the padded side when the rects are also apart on the other
/// axis). A side where `b` reaches further gets plain padding, and any other
/// side extends to the common bound.
fn dynamic_aabb(a: &Rect, b: &Rect, common: &Rect, pad: Padding) -> Rect {
    let apart_x = a.min_x > b.max_x || a.max_x < b.min_x;
    let apart_y = a.min_y > b.max_y || a.max_y < b.min_y;

    let min_x = if a.min_x > b.max_x {
        let mid = (a.min_x + b.max_x) / 2.0;
        if apart_y { mid.min(a.min_x - pad.left) } else { mid }
    } else if a.min_x > b.min_x {
        a.min_x - pad.left
    } else {
        common.min_x - pad.left
    };

    let min_y = if a.min_y > b.max_y {
        let mid = (a.min_y + b.max_y) / 2.0;
        if apart_x { mid.min(a.min_y - pad.up) } else { mid }
    } else if a.min_y > b.min_y {
        a.min_y - pad.up
    } else {
        common.min_y - pad.up
    };

    let max_x = if a.max_x < b.min_x {
        let mid = (a.max_x + b.min_x) / 2.0;
        if apart_y { mid.max(a.max_x + pad.right) } else { mid }
    } else if a.max_x < b.max_x {
        a.max_x + pad.right
    } else {
        common.max_x + pad.right
    };

    let max_y = if a.max_y < b.min_y {
        let mid = (a.max_y + b.min_y) / 2.0;
        if apart_x { mid.max(a.max_y + pad.down) } else { mid }
    } else if a.max_y < b.max_y {
        a.max_y + pad.down
    } else {
        common.max_y + pad.down
    };

    Rect::new(min_x, min_y, max_x, max_y)
}

/// Split overlapping obstacles along the axis where their shapes' centers
/// are furthest apart. The plane sits in the gap between the shapes, or
/// halfway between the centers when the shapes intrude on each other.
pub(crate) fn split_residual_overlap(obstacles: &mut [Rect; 2], a: &Rect, b: &Rect) {
    if !obstacles[0].overlaps(&obstacles[1]) {
        return;
    }
    let (ca, cb) = (a.center(), b.center());
    let axis = if (ca.x - cb.x).abs() >= (ca.y - cb.y).abs() {
        Axis::Horizontal
    } else {
        Axis::Vertical
    };

    let (lower, upper) = if ca.along(axis) <= cb.along(axis) { (0, 1) } else { (1, 0) };
    let shapes = [a, b];
    let (_, lower_max) = shapes[lower].span(axis);
    let (upper_min, _) = shapes[upper].span(axis);
    let plane = if lower_max < upper_min {
        (lower_max + upper_min) / 2.0
    } else {
        (ca.along(axis) + cb.along(axis)) / 2.0
    };

    let (low_side, high_side) = match axis {
        Axis::Horizontal => (Heading::Left, Heading::Right),
        Axis::Vertical => (Heading::Up, Heading::Down),
    };
    let lo = &mut obstacles[lower];
    lo.set_side(high_side, lo.side(high_side).min(plane));
    if lo.side(low_side) > lo.side(high_side) {
        lo.set_side(low_side, lo.side(high_side));
    }
    let hi = &mut obstacles[upper];
    hi.set_side(low_side, hi.side(low_side).max(plane));
    if hi.side(high_side) < hi.side(low_side) {
        hi.set_side(high_side, hi.side(low_side));
    }
    log::trace!("split overlapping obstacles on {axis:?} at {plane}");
}

/// Intersection of `r` with `limit`, collapsing onto `r`'s nearest edge when
/// they are disjoint so the result always stays inside `r`.
fn intersect_within(r: &Rect, limit: &Rect) -> Rect {
    let clip = |lo: f64, hi: f64, limit_lo: f64, limit_hi: f64| {
        if lo > limit_hi {
            (lo, lo)
        } else if hi < limit_lo {
            (hi, hi)
        } else {
            (lo.max(limit_lo), hi.min(limit_hi))
        }
    };
    let (min_x, max_x) = clip(r.min_x, r.max_x, limit.min_x, limit.max_x);
    let (min_y, max_y) = clip(r.min_y, r.max_y, limit.min_y, limit.max_y);
    Rect::new(min_x, min_y, max_x, max_y)
}

/// Give both bound ends the same gap between shape and exit: the smaller of
/// the two, floored at the per-end minimum. Skipped if the adjusted
/// obstacles would overlap.
fn harmonize_exit_spacing(
    obstacles: &mut [Rect; 2],
    shapes: [Rect; 2],
    ends: [&ResolvedEndpoint; 2],
    config: &RouteConfig,
) {
    let spacing = |i: usize| {
        let h = ends[i].heading;
        (obstacles[i].side(h) - shapes[i].side(h)) * h.sign()
    };
    let smaller = spacing(0).min(spacing(1));

    let mut candidate = *obstacles;
    for i in 0..2 {
        let h = ends[i].heading;
        let target = smaller.max(config.min_spacing(ends[i].has_arrowhead));
        candidate[i].set_side(h, shapes[i].side(h) + h.sign() * target);
    }
    if candidate[0].overlaps(&candidate[1]) {
        log::trace!("exit spacing harmonization rejected: obstacles would overlap");
        return;
    }
    *obstacles = candidate;
}

/// Projection of `p` along `heading` onto the matching side of `obstacle`.
pub fn exit_point(p: Point, heading: Heading, obstacle: &Rect) -> Point {
    match heading {
        Heading::Up => Point::new(p.x, obstacle.min_y),
        Heading::Down => Point::new(p.x, obstacle.max_y),
        Heading::Left => Point::new(obstacle.min_x, p.y),
        Heading::Right => Point::new(obstacle.max_x, p.y),
    }
}
