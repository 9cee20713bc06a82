//! Endpoint drags and re-binding with fixed segments in place.
//!
//! The pipeline works on a [`DragState`]. Every step proposes candidate
//! points and only keeps them when all fixed segments can still be located,
//! so a step that cannot preserve them is simply skipped.
//!
//! Steps that concern one end are written for the start; the end is handled
//! by running them on the reversed path (see [`DragState::oriented`]).

use crate::baseline::Baseline;
use crate::context::{ArrowEnd, EditContext};
use crate::fixed::{
    FixedSegment, merge_collinear, pinned_indices, reindex_fixed_segments, retain_locatable,
    snap_points_to_fixed,
};
use crate::lane::align_lane;
use crate::perpendicular::enforce_perpendicular;
use crate::release::release_connector;
use crate::stubs::{leaves_along, perpendicular_heading, route_span, stub_to_fixed};
use elbow_core::config::RouteConfig;
use elbow_core::endpoint::ResolvedEndpoint;
use elbow_core::geometry::{
    DEDUP_THRESHOLD, has_diagonal, is_near, orthogonalize, remove_zero_length, segment_axis,
    simplify_path,
};
use elbow_core::model::{Axis, Point};
use elbow_core::route::{route_resolved, validate_path};

// ─── Working state ──────────────────────────────────────────────────────

/// Points and fixed segments being edited.
#[derive(Debug, Clone, PartialEq)]
pub struct DragState {
    pub points: Vec<Point>,
    pub fixed: Vec<FixedSegment>,
}

impl DragState {
    /// The requested path with both ends in place, snapped onto the fixed
    /// segments that can still be found in it.
    pub fn seed(ctx: &EditContext) -> Self {
        let interior_unchanged = ctx.points.len() == ctx.previous_points.len()
            && ctx.points.len() > 2
            && ctx.points[1..ctx.points.len() - 1] == ctx.previous_points[1..ctx.previous_points.len() - 1];
        let mut points = if interior_unchanged {
            ctx.previous_points.clone()
        } else {
            ctx.points.clone()
        };
        let last = points.len() - 1;
        points[0] = ctx.start.resolved.point;
        points[last] = ctx.end.resolved.point;
        snap_points_to_fixed(&mut points, &ctx.fixed);
        let fixed = retain_locatable(&points, &ctx.fixed);
        Self { points, fixed }
    }

    pub fn into_parts(self) -> (Vec<Point>, Vec<FixedSegment>) {
        (self.points, self.fixed)
    }

    /// Accept `points` if every current fixed segment can be located in it.
    pub fn commit(&mut self, points: Vec<Point>) -> bool {
        let fixed = self.fixed.clone();
        self.commit_with(points, &fixed)
    }

    /// Accept `points` together with a replacement set of fixed segments.
    pub fn commit_with(&mut self, points: Vec<Point>, fixed: &[FixedSegment]) -> bool {
        if points.len() < 2 {
            return false;
        }
        match reindex_fixed_segments(&points, fixed) {
            Some(found) => {
                self.points = points;
                self.fixed = found;
                true
            }
            None => {
                log::trace!("drag: candidate loses a fixed segment");
                false
            }
        }
    }

    /// Drop zero-length and redundant points from `points` without touching
    /// fixed segment ends, then commit.
    pub fn commit_clean(&mut self, points: Vec<Point>) -> bool {
        let points = remove_zero_length(&points);
        let Some(fixed) = reindex_fixed_segments(&points, &self.fixed) else {
            log::trace!("drag: candidate loses a fixed segment");
            return false;
        };
        let pins = pinned_indices(&fixed, points.len());
        let simplified = simplify_path(&points, &pins);
        self.commit_with(simplified, &fixed)
    }

    /// Simplify around the fixed segments and merge collinear runs.
    pub fn tidy(&mut self, allow_flip: bool) {
        let pins = pinned_indices(&self.fixed, self.points.len());
        let simplified = simplify_path(&self.points, &pins);
        self.commit(simplified);
        let (points, fixed) = merge_collinear(&self.points, &self.fixed, allow_flip);
        self.points = points;
        self.fixed = fixed;
    }

    /// The same path walked from the other end.
    pub fn reversed(&self) -> Self {
        let n = self.points.len();
        let mut fixed: Vec<FixedSegment> = self
            .fixed
            .iter()
            .map(|f| FixedSegment::new(n - f.index, f.end, f.start))
            .collect();
        fixed.sort_by_key(|f| f.index);
        Self {
            points: self.points.iter().rev().copied().collect(),
            fixed,
        }
    }

    /// Run `step` with `end` as the first point of the path.
    pub fn oriented<R>(&mut self, end: ArrowEnd, step: impl FnOnce(&mut DragState) -> R) -> R {
        match end {
            ArrowEnd::Start => step(self),
            ArrowEnd::End => {
                let mut reversed = self.reversed();
                let result = step(&mut reversed);
                *self = reversed.reversed();
                result
            }
        }
    }
}

// ─── Pipeline ───────────────────────────────────────────────────────────

/// Re-route the arrow after its ends moved, keeping every fixed segment.
pub fn drag_endpoints(ctx: &EditContext, config: &RouteConfig) -> (Vec<Point>, Vec<FixedSegment>) {
    let mut state = DragState::seed(ctx);
    if state.fixed.is_empty() {
        log::debug!("drag: no fixed segment survives, routing fresh");
        let points = route_resolved(&ctx.start.resolved, &ctx.end.resolved, config);
        return (points, Vec::new());
    }
    let baseline = Baseline::route(ctx, config);
    let pads = ArrowEnd::BOTH.map(|end| baseline.stub_length(end, config));

    let mut rewritten = [false; 2];
    if ctx.start.active != ctx.end.active {
        let end = if ctx.start.active { ArrowEnd::Start } else { ArrowEnd::End };
        let endpoint = ctx.end_state(end).resolved;
        let pad = pads[end.index()];
        rewritten[end.index()] = state.oriented(end, |s| reroute_to_fixed(s, &endpoint, pad, config));
        log::debug!("drag: {end:?} span rerouted: {}", rewritten[end.index()]);
    }

    if !rewritten.contains(&true) && ctx.binding_changed() {
        adopt_baseline(&mut state, ctx, &baseline, &pads, config);
    }

    for end in ArrowEnd::BOTH {
        let end_state = ctx.end_state(end);
        if end_state.binding_removed && !rewritten[end.index()] {
            let endpoint = end_state.resolved;
            rewritten[end.index()] = state.oriented(end, |s| reconnect_free_end(s, &endpoint));
        }
    }

    restore_orthogonality(&mut state, ctx, &baseline, config);
    state.tidy(ctx.start.binding_removed || ctx.end.binding_removed);

    if ctx.fully_unbound() {
        return state.into_parts();
    }
    for end in ArrowEnd::BOTH {
        let endpoint = ctx.end_state(end).resolved;
        if !endpoint.is_bound {
            continue;
        }
        let pad = pads[end.index()];
        let spacing = config.min_spacing(endpoint.has_arrowhead);
        state.oriented(end, |s| {
            enforce_perpendicular(s, &endpoint, pad, config);
            align_lane(s, &endpoint, spacing);
            s.tidy(true);
        });
    }
    let (points, fixed) = state.into_parts();
    if validate_path(&points, &ctx.start.resolved, &ctx.end.resolved) {
        return (points, fixed);
    }
    log::debug!("drag: pinned lanes break an end heading, releasing them");
    (route_resolved(&ctx.start.resolved, &ctx.end.resolved, config), Vec::new())
}

// ─── Steps ──────────────────────────────────────────────────────────────

/// Replace the span between the first point and the first fixed segment.
/// Tries a routed span first and a hand-built stub second.
fn reroute_to_fixed(
    state: &mut DragState,
    endpoint: &ResolvedEndpoint,
    pad: f64,
    config: &RouteConfig,
) -> bool {
    let Some(segment) = state.fixed.first().copied() else {
        return false;
    };
    let Some(axis) = segment.axis() else {
        return false;
    };
    let q = state.points[segment.index - 1];
    let tail = state.points[segment.index..].to_vec();
    let target = ResolvedEndpoint::pinned(q, perpendicular_heading(axis, q, endpoint.point));

    let routed = route_span(endpoint, &target, config);
    let stub = stub_to_fixed(endpoint, q, axis, pad);
    for head in routed.into_iter().chain([stub]) {
        let mut candidate = head;
        candidate.extend_from_slice(&tail);
        let before = state.clone();
        if state.commit_clean(candidate) && keeps_segment(state, &segment, endpoint) {
            return true;
        }
        *state = before;
    }
    false
}

/// The first fixed segment kept its lane and direction, and the first leg
/// honours the endpoint's heading.
fn keeps_segment(state: &DragState, segment: &FixedSegment, endpoint: &ResolvedEndpoint) -> bool {
    let Some(first) = state.fixed.first() else {
        return false;
    };
    first.axis() == segment.axis()
        && (first.axis_value() - segment.axis_value()).abs() <= DEDUP_THRESHOLD
        && first.direction() == segment.direction()
        && (!endpoint.requires_heading() || leaves_along(&state.points, endpoint.heading))
}

/// A freshly unbound end: join it to the first fixed segment with a plain
/// elbow.
fn reconnect_free_end(state: &mut DragState, endpoint: &ResolvedEndpoint) -> bool {
    let Some(segment) = state.fixed.first().copied() else {
        return false;
    };
    let q = state.points[segment.index - 1];
    let mut candidate = release_connector(endpoint.point, q, None, segment.axis());
    candidate.extend_from_slice(&state.points[segment.index..]);
    state.commit_clean(candidate)
}

/// After a binding change, rebuild around a fresh route.
///
/// Tries, in order: re-projecting every fixed segment onto the baseline,
/// rebuilding both spans around a single fixed segment, and a stub on the
/// side whose binding changed.
fn adopt_baseline(
    state: &mut DragState,
    ctx: &EditContext,
    baseline: &Baseline,
    pads: &[f64; 2],
    config: &RouteConfig,
) -> bool {
    let (start, end) = (&ctx.start.resolved, &ctx.end.resolved);
    let changed = if ctx.start.binding_changed { ArrowEnd::Start } else { ArrowEnd::End };
    let active = match changed {
        ArrowEnd::Start => 0,
        ArrowEnd::End => state.fixed.len().saturating_sub(1),
    };

    if let Some((points, fixed)) = baseline.remap(&state.fixed, Some(active), config.remap_tolerance)
        && validate_path(&points, start, end)
        && state.commit_with(points, &fixed)
    {
        log::debug!("drag: adopted baseline");
        return true;
    }

    if let [segment] = state.fixed[..]
        && let Some(axis) = segment.axis()
    {
        let (q1, q2) = (segment.start, segment.end);
        let head = route_span(start, &ResolvedEndpoint::pinned(q1, perpendicular_heading(axis, q1, start.point)), config);
        let tail = route_span(&ResolvedEndpoint::pinned(q2, perpendicular_heading(axis, q2, end.point)), end, config);
        if let (Some(mut head), Some(tail)) = (head, tail) {
            head.extend(tail);
            if state.commit_clean(head) {
                log::debug!("drag: rebuilt around the single fixed segment");
                return true;
            }
        }
    }

    let endpoint = ctx.end_state(changed).resolved;
    let pad = pads[changed.index()];
    state.oriented(changed, |s| {
        let Some(segment) = s.fixed.first().copied() else {
            return false;
        };
        let Some(axis) = segment.axis() else {
            return false;
        };
        let mut candidate = stub_to_fixed(&endpoint, s.points[segment.index - 1], axis, pad);
        candidate.extend_from_slice(&s.points[segment.index..]);
        s.commit_clean(candidate)
    })
}

/// Snap onto the fixed segments and remove any diagonal left by the moves.
fn restore_orthogonality(state: &mut DragState, ctx: &EditContext, baseline: &Baseline, config: &RouteConfig) {
    let mut points = state.points.clone();
    snap_points_to_fixed(&mut points, &state.fixed);
    state.commit(points);

    if ctx.fully_unbound()
        && has_diagonal(&state.points)
        && let Some((points, fixed)) = baseline.remap(&state.fixed, None, config.remap_tolerance)
    {
        state.commit_with(points, &fixed);
    }

    for end in ArrowEnd::BOTH {
        if !ctx.end_state(end).resolved.is_bound {
            state.oriented(end, snap_free_neighbor);
        }
    }

    if has_diagonal(&state.points) {
        let points = orthogonalize(&state.points);
        state.commit_clean(points);
    }
    if ctx.fully_unbound() {
        state.tidy(false);
    }
}

/// Slide the second point so the first leg is orthogonal, along whichever
/// axis keeps the second leg intact.
fn snap_free_neighbor(state: &mut DragState) -> bool {
    if state.points.len() < 3 {
        return false;
    }
    let (p0, p1, p2) = (state.points[0], state.points[1], state.points[2]);
    if segment_axis(p0, p1).is_some() || is_near(p0, p1) {
        return false;
    }
    let moved = match segment_axis(p1, p2) {
        Some(Axis::Horizontal) => Point::new(p0.x, p1.y),
        Some(Axis::Vertical) => Point::new(p1.x, p0.y),
        None if (p1.x - p0.x).abs() <= (p1.y - p0.y).abs() => Point::new(p0.x, p1.y),
        None => Point::new(p1.x, p0.y),
    };
    let mut points = state.points.clone();
    points[1] = moved;
    state.commit(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(raw: &[(f64, f64)]) -> Vec<Point> {
        raw.iter().map(|(x, y)| Point::new(*x, *y)).collect()
    }

    fn state() -> DragState {
        let points = pts(&[
            (0.0, 0.0),
            (0.0, 50.0),
            (100.0, 50.0),
            (100.0, 150.0),
            (200.0, 150.0),
            (200.0, 250.0),
        ]);
        let fixed = vec![FixedSegment::at(&points, 3).unwrap()];
        DragState { points, fixed }
    }

    #[test]
    fn commit_rejects_losing_a_segment() {
        let mut state = state();
        let before = state.clone();
        assert!(!state.commit(pts(&[(0.0, 0.0), (200.0, 0.0), (200.0, 250.0)])));
        assert_eq!(state, before);
    }

    #[test]
    fn commit_reindexes_shifted_segments() {
        let mut state = state();
        let mut points = state.points.clone();
        points.insert(1, Point::new(0.0, 20.0));
        assert!(state.commit(points));
        assert_eq!(state.fixed[0].index, 4);
    }

    #[test]
    fn reversal_round_trips() {
        let state = state();
        let reversed = state.reversed();
        assert_eq!(reversed.fixed[0].index, 3);
        assert_eq!(reversed.fixed[0].start, Point::new(100.0, 150.0));
        assert_eq!(reversed.reversed(), state);
    }

    #[test]
    fn free_neighbor_slides_along_the_next_leg() {
        let mut state = state();
        state.points[0] = Point::new(-30.0, 0.0);
        assert!(snap_free_neighbor(&mut state));
        assert_eq!(state.points[1], Point::new(-30.0, 50.0));
    }

    #[test]
    fn stub_joins_start_to_first_segment() {
        let mut state = state();
        let endpoint = ResolvedEndpoint::free(Point::new(-80.0, 200.0), elbow_core::model::Heading::Up);
        state.points[0] = endpoint.point;
        assert!(reconnect_free_end(&mut state, &endpoint));
        assert_eq!(state.points[0], endpoint.point);
        assert!(!has_diagonal(&state.points));
        assert_eq!(state.fixed[0].axis_value(), 100.0);
    }
}
