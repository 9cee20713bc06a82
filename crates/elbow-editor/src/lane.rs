//! Keep the fixed lane nearest a bound end from cutting through its shape.

use crate::drag::DragState;
use crate::stubs::leaves_along;
use elbow_core::endpoint::ResolvedEndpoint;
use elbow_core::geometry::{DEDUP_THRESHOLD, INTERSECTION_EPSILON, has_diagonal};

/// Slide the first fixed segment crossing the end's heading, together with
/// the collinear run it belongs to, just outside the nearer edge of the
/// bound shape. Written for the start of the path.
pub fn align_lane(state: &mut DragState, endpoint: &ResolvedEndpoint, spacing: f64) -> bool {
    let Some(bounds) = endpoint.element_bounds else {
        return false;
    };
    let h = endpoint.heading;
    let axis = h.axis();
    let Some(segment) = state
        .fixed
        .iter()
        .find(|f| f.axis() == Some(axis.perpendicular()))
        .copied()
    else {
        return false;
    };
    if !bounds.shrink(INTERSECTION_EPSILON).intersects_segment(segment.start, segment.end) {
        return false;
    }

    let value = segment.axis_value();
    let on_lane = |i: usize| (state.points[i].along(axis) - value).abs() <= DEDUP_THRESHOLD;
    let n = state.points.len();
    let mut first = segment.index - 1;
    while first > 1 && on_lane(first - 1) {
        first -= 1;
    }
    let mut last = segment.index;
    while last + 2 < n && on_lane(last + 1) {
        last += 1;
    }

    let (lo, hi) = bounds.span(axis);
    let mut targets = [lo - spacing, hi + spacing];
    targets.sort_by(|a, b| (a - value).abs().total_cmp(&(b - value).abs()));

    for target in targets {
        let mut candidate = state.points.clone();
        for p in &mut candidate[first..=last] {
            *p = p.with_along(axis, target);
        }
        if has_diagonal(&candidate) || !leaves_along(&candidate, h) {
            continue;
        }
        let fixed: Vec<_> = state
            .fixed
            .iter()
            .map(|f| if f.index == segment.index { f.with_axis_value(target) } else { *f })
            .collect();
        if state.commit_with(candidate, &fixed) {
            log::debug!("lane: moved {value} → {target}");
            return true;
        }
    }
    false
}
