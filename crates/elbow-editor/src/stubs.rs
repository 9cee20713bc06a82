//! Sub-span routing and hand-built stubs that join an end to a fixed
//! segment.

use elbow_core::config::RouteConfig;
use elbow_core::endpoint::ResolvedEndpoint;
use elbow_core::geometry::{DEDUP_THRESHOLD, remove_zero_length, simplify_path};
use elbow_core::model::{Axis, Heading, Point};
use elbow_core::route::{route_resolved, validate_path};

/// Heading leaving `q` perpendicular to a segment on `axis`, on the side of
/// `toward`.
pub fn perpendicular_heading(axis: Axis, q: Point, toward: Point) -> Heading {
    let normal = axis.perpendicular();
    Heading::from_axis(normal, toward.along(normal) >= q.along(normal))
}

/// Route between two sub-span boundaries. `None` when the result breaks a
/// pinned heading or leaves a diagonal.
pub fn route_span(
    start: &ResolvedEndpoint,
    end: &ResolvedEndpoint,
    config: &RouteConfig,
) -> Option<Vec<Point>> {
    let path = route_resolved(start, end, config);
    if validate_path(&path, start, end) {
        Some(path)
    } else {
        log::trace!("span {:?} → {:?} rejected", start.point, end.point);
        None
    }
}

/// Short orthogonal path from `from` to `q`, arriving perpendicular to the
/// fixed segment on `fixed_axis` that starts at `q`.
///
/// A constrained end first leaves along its heading for `pad`. When that
/// heading already runs perpendicular to the segment, one corner lines the
/// path up with `q`. When it runs parallel, the path turns straight toward
/// `q` if `q` lies ahead, otherwise it loops around through a lane `pad`
/// beyond `q`. Free ends use a single elbow.
pub fn stub_to_fixed(from: &ResolvedEndpoint, q: Point, fixed_axis: Axis, pad: f64) -> Vec<Point> {
    let p = from.point;
    let arrive = fixed_axis.perpendicular();

    let raw = if !from.requires_heading() {
        vec![p, q.with_along(arrive, p.along(arrive)), q]
    } else {
        let h = from.heading;
        let s = p.offset(h, pad);
        if h.axis() == arrive {
            vec![p, s, q.with_along(arrive, s.along(arrive)), q]
        } else if (q.along(fixed_axis) - p.along(fixed_axis)) * h.sign() > pad {
            vec![p, q.with_along(arrive, p.along(arrive)), q]
        } else {
            let side = if p.along(arrive) >= q.along(arrive) { 1.0 } else { -1.0 };
            let lane = q.along(arrive) + side * pad;
            vec![p, s, s.with_along(arrive, lane), q.with_along(arrive, lane), q]
        }
    };
    simplify_path(&remove_zero_length(&raw), &[])
}

/// Whether a path already leaves its first point along `heading`.
pub fn leaves_along(points: &[Point], heading: Heading) -> bool {
    let (Some(a), Some(b)) = (points.first(), points.get(1)) else {
        return false;
    };
    let travel = (b.along(heading.axis()) - a.along(heading.axis())) * heading.sign();
    (b.across(heading.axis()) - a.across(heading.axis())).abs() <= f64::EPSILON && travel > DEDUP_THRESHOLD
}
