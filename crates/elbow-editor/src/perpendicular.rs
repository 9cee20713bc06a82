//! Make the first leg of the path leave a bound end along its heading.
//!
//! Written for the start of the path; the end is handled through
//! [`crate::drag::DragState::oriented`].

use crate::drag::DragState;
use crate::stubs::leaves_along;
use elbow_core::config::RouteConfig;
use elbow_core::endpoint::ResolvedEndpoint;
use elbow_core::geometry::{DEDUP_THRESHOLD, has_diagonal, segment_axis};
use elbow_core::model::{Heading, Point};

/// Repair the first leg. Returns whether the path now complies.
///
/// Cases, in order:
/// (a) the leg already runs along the heading: only stretch it when it has
///     collapsed below the minimum stub;
/// (b) the leg runs backwards: flip the neighbour across the end by `pad`;
/// (c) the leg is off-axis but the second leg allows it: slide the neighbour
///     onto the end's line;
/// (d) otherwise insert an explicit stub and connector, going around the
///     shape on a side lane when the path continues behind the end.
pub fn enforce_perpendicular(
    state: &mut DragState,
    endpoint: &ResolvedEndpoint,
    pad: f64,
    config: &RouteConfig,
) -> bool {
    let h = endpoint.heading;
    if state.points.len() < 2 {
        return false;
    }
    if leaves_along(&state.points, h) {
        stretch_stub(state, h, pad, config.min_stub_length);
        return true;
    }

    let mut candidates = Vec::new();
    let backwards = leaves_along(&state.points, h.opposite());
    if backwards {
        candidates.extend(rejoin(&state.points, h, pad, 2));
    } else if let Some(slid) = slide_neighbor(&state.points, h) {
        candidates.push(slid);
    }
    for target in 1..state.points.len().min(4) {
        candidates.extend(rejoin(&state.points, h, pad, target));
    }
    for target in 1..state.points.len().min(4) {
        candidates.extend(detour(&state.points, endpoint, pad, target));
    }

    for candidate in candidates {
        if !leaves_along(&candidate, h) || has_diagonal(&candidate) {
            continue;
        }
        let before = state.clone();
        if state.commit_clean(candidate) && leaves_along(&state.points, h) {
            return true;
        }
        *state = before;
    }
    log::debug!("perpendicular: no candidate leaves {h:?} from {:?}", endpoint.point);
    false
}

/// Push the second leg out to `pad` when the first leg is shorter than
/// `min_len`.
fn stretch_stub(state: &mut DragState, h: Heading, pad: f64, min_len: f64) {
    let points = &state.points;
    if points.len() < 4 || points[0].manhattan(points[1]) + DEDUP_THRESHOLD >= min_len {
        return;
    }
    let axis = h.axis();
    if segment_axis(points[1], points[2]) != Some(axis.perpendicular())
        || segment_axis(points[2], points[3]) != Some(axis)
    {
        return;
    }
    let value = points[0].along(axis) + h.sign() * pad;
    let ahead = |p: Point| (p.along(axis) - value) * h.sign();
    if ahead(points[3]) <= DEDUP_THRESHOLD {
        return;
    }
    let mut candidate = points.clone();
    candidate[1] = candidate[1].with_along(axis, value);
    candidate[2] = candidate[2].with_along(axis, value);
    state.commit(candidate);
}

/// Move the second point onto the end's line when the second leg runs
/// perpendicular to the heading, so that leg stays orthogonal.
fn slide_neighbor(points: &[Point], h: Heading) -> Option<Vec<Point>> {
    if points.len() < 3 {
        return None;
    }
    let axis = h.axis();
    if segment_axis(points[1], points[2]) != Some(axis.perpendicular()) {
        return None;
    }
    let slid = points[1].with_across(axis, points[0].across(axis));
    if (slid.along(axis) - points[0].along(axis)) * h.sign() <= DEDUP_THRESHOLD {
        return None;
    }
    let mut candidate = points.to_vec();
    candidate[1] = slid;
    Some(candidate)
}

/// Replace `points[1..target]` with a stub of length `pad` along `h` and a
/// one-corner connector to `points[target]`. Both corner choices are
/// returned.
fn rejoin(points: &[Point], h: Heading, pad: f64, target: usize) -> Vec<Vec<Point>> {
    let Some(&t) = points.get(target) else {
        return Vec::new();
    };
    let axis = h.axis();
    let s = points[0].offset(h, pad);
    [s.with_across(axis, t.across(axis)), s.with_along(axis, t.along(axis))]
        .into_iter()
        .map(|corner| {
            let mut candidate = vec![points[0], s, corner];
            candidate.extend_from_slice(&points[target..]);
            candidate
        })
        .collect()
}

/// Stub along the heading, step sideways onto a lane just past the shape,
/// then run back to `points[target]` along that lane. When the lane lines up
/// with the following segment the path joins it directly. Nearer lane
/// first.
fn detour(points: &[Point], endpoint: &ResolvedEndpoint, pad: f64, target: usize) -> Vec<Vec<Point>> {
    let Some(&t) = points.get(target) else {
        return Vec::new();
    };
    let h = endpoint.heading;
    let axis = h.axis();
    let p0 = points[0];
    let (lo, hi) = match endpoint.element_bounds {
        Some(bounds) => {
            let (lo, hi) = bounds.span(axis.perpendicular());
            (lo.min(p0.across(axis)), hi.max(p0.across(axis)))
        }
        None => (p0.across(axis), p0.across(axis)),
    };
    let mut lanes = [lo - pad, hi + pad];
    lanes.sort_by(|a, b| (a - t.across(axis)).abs().total_cmp(&(b - t.across(axis)).abs()));

    let s = p0.offset(h, pad);
    let mut out = Vec::new();
    for lane in lanes {
        let o = s.with_across(axis, lane);
        let j = o.with_along(axis, t.along(axis));
        if let Some(rest) = points.get(target + 1..).filter(|rest| !rest.is_empty()) {
            let mut joined = vec![p0, s, o, j];
            joined.extend_from_slice(rest);
            out.push(joined);
        }
        let mut through = vec![p0, s, o, j];
        through.extend_from_slice(&points[target..]);
        out.push(through);
    }
    out
}
