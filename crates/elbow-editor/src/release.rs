//! Releasing fixed segments: reconnect the path around the ones that stay.

use crate::context::EditContext;
use crate::fixed::{FixedSegment, merge_collinear, reindex_fixed_segments, retain_locatable};
use crate::stubs::{perpendicular_heading, route_span};
use elbow_core::config::RouteConfig;
use elbow_core::endpoint::ResolvedEndpoint;
use elbow_core::geometry::{remove_zero_length, segment_axis};
use elbow_core::model::{Axis, Point};
use elbow_core::route::unconstrained_fallback;

/// Connector from `a` to `b` between two remaining fixed segments.
///
/// The last leg runs perpendicular to the segment after the gap (`after`).
/// Without one, the first leg runs perpendicular to the segment before it.
pub fn release_connector(a: Point, b: Point, before: Option<Axis>, after: Option<Axis>) -> Vec<Point> {
    if segment_axis(a, b).is_some() {
        return vec![a, b];
    }
    let corner = match (before, after) {
        (_, Some(axis)) => {
            let arrive = axis.perpendicular();
            b.with_along(arrive, a.along(arrive))
        }
        (Some(axis), None) => {
            let leave = axis.perpendicular();
            a.with_along(leave, b.along(leave))
        }
        (None, None) => return unconstrained_fallback(a, b),
    };
    vec![a, corner, b]
}

/// Rebuild the span the released segments used to cover. Points outside
/// that span are carried over unchanged.
pub fn release_fixed_segments(ctx: &EditContext, config: &RouteConfig) -> (Vec<Point>, Vec<FixedSegment>) {
    let mut base = ctx.previous_points.clone();
    let last = base.len() - 1;
    base[0] = ctx.start.resolved.point;
    base[last] = ctx.end.resolved.point;

    let before = retain_locatable(&base, &ctx.previous_fixed);
    let kept = retain_locatable(&base, &ctx.fixed);
    let removed: Vec<usize> = before
        .iter()
        .map(|f| f.index)
        .filter(|i| kept.iter().all(|k| k.index != *i))
        .collect();
    let (Some(&lo), Some(&hi)) = (removed.iter().min(), removed.iter().max()) else {
        return (base, kept);
    };

    let left = kept.iter().rev().find(|f| f.index < lo);
    let right = kept.iter().find(|f| f.index > hi);
    let left_index = left.map_or(0, |f| f.index);
    let right_index = right.map_or(last, |f| f.index - 1);
    let (a, b) = (base[left_index], base[right_index]);
    log::debug!("release: reconnecting points {left_index}..={right_index}");

    let start = match left {
        Some(f) => ResolvedEndpoint::pinned(a, perpendicular_heading(f.axis().unwrap_or(Axis::Horizontal), a, b)),
        None => ctx.start.resolved,
    };
    let end = match right {
        Some(f) => ResolvedEndpoint::pinned(b, perpendicular_heading(f.axis().unwrap_or(Axis::Horizontal), b, a)),
        None => ctx.end.resolved,
    };
    let heuristic = || release_connector(a, b, left.and_then(|f| f.axis()), right.and_then(|f| f.axis()));
    let connector = if start.is_bound || end.is_bound {
        route_span(&start, &end, config).unwrap_or_else(heuristic)
    } else {
        heuristic()
    };

    let mut points = base[..left_index].to_vec();
    points.extend(connector);
    points.extend_from_slice(&base[right_index + 1..]);
    let points = remove_zero_length(&points);

    let fixed = reindex_fixed_segments(&points, &kept).unwrap_or_else(|| retain_locatable(&points, &kept));
    merge_collinear(&points, &fixed, false)
}
