//! Everything an edit derives up front from the arrow, the live elements and
//! the caller's updates.
//!
//! All geometry here is in the arrow's local frame. Bound ends are resolved
//! in world space and brought back, so the rest of the pipeline never
//! converts coordinates it did not change.

use crate::arrow::{ArrowUpdates, ElbowArrow};
use crate::fixed::{FixedSegment, sanitize_fixed_segments};
use elbow_core::endpoint::{Endpoint, ResolvedEndpoint, resolve_endpoints, rotate_heading};
use elbow_core::geometry::heading_for_segment;
use elbow_core::model::{Binding, ElementLookup, Point, Rect};
use elbow_core::transform::LocalFrame;

/// One end of the arrow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrowEnd {
    Start,
    End,
}

impl ArrowEnd {
    pub const BOTH: [ArrowEnd; 2] = [ArrowEnd::Start, ArrowEnd::End];

    pub fn index(self) -> usize {
        match self {
            ArrowEnd::Start => 0,
            ArrowEnd::End => 1,
        }
    }
}

/// How an edit is carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditMode {
    /// No fixed segments: route from scratch.
    RouteFresh,
    /// The caller dropped fixed segments: reconnect around the rest.
    ReleaseFixedSegments,
    /// An end moved or re-bound while segments stay pinned.
    DragEndpoints,
    /// Only the fixed segments changed: snap the path onto them.
    ApplyFixedSegments,
}

/// Per-end facts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EndState {
    /// Local-frame endpoint as the router sees it.
    pub resolved: ResolvedEndpoint,
    /// The end moved or its binding changed.
    pub active: bool,
    pub binding_changed: bool,
    pub binding_removed: bool,
}

#[derive(Debug, Clone)]
pub struct EditContext {
    pub frame: LocalFrame,
    pub previous_points: Vec<Point>,
    /// Requested points with both ends written back from resolution.
    pub points: Vec<Point>,
    pub previous_fixed: Vec<FixedSegment>,
    /// Requested fixed segments, sanitized against `points`.
    pub fixed: Vec<FixedSegment>,
    pub start: EndState,
    pub end: EndState,
    pub points_changed: bool,
    pub fixed_changed: bool,
    /// The caller supplied fewer fixed segments than the arrow had.
    pub released: bool,
}

impl EditContext {
    pub fn new(arrow: &ElbowArrow, lookup: &impl ElementLookup, updates: &ArrowUpdates) -> Self {
        let frame = arrow.frame();
        let mut points = match &updates.points {
            Some(points) if points.len() >= 2 => points.clone(),
            Some(points) => {
                log::warn!("edit {}: ignoring {} requested point(s)", arrow.id, points.len());
                arrow.points.clone()
            }
            None => arrow.points.clone(),
        };
        let last = points.len() - 1;

        let start_binding = updates.start_binding.unwrap_or(arrow.start_binding);
        let end_binding = updates.end_binding.unwrap_or(arrow.end_binding);
        let world = |point: Point, binding: Option<Binding>, arrowhead: bool| Endpoint {
            point: frame.to_world(point),
            binding,
            arrowhead,
        };
        let (world_start, world_end) = resolve_endpoints(
            &world(points[0], start_binding, arrow.start_arrowhead),
            &world(points[last], end_binding, arrow.end_arrowhead),
            lookup,
        );

        let mut start = localize(&world_start, points[0], &frame);
        let mut end = localize(&world_end, points[last], &frame);
        if !start.is_bound {
            start.heading = heading_for_segment(start.point, end.point);
        }
        if !end.is_bound {
            end.heading = heading_for_segment(end.point, start.point);
        }
        points[0] = start.point;
        points[last] = end.point;

        let previous_fixed = sanitize_fixed_segments(&arrow.fixed_segments, arrow.points.len());
        let fixed = match &updates.fixed_segments {
            Some(segments) => sanitize_fixed_segments(segments, points.len()),
            None => sanitize_fixed_segments(&arrow.fixed_segments, points.len()),
        };
        let fixed_changed = updates.fixed_segments.is_some() && fixed != previous_fixed;
        let released = updates.fixed_segments.is_some() && fixed.len() < previous_fixed.len();

        let end_state = |resolved: ResolvedEndpoint, index: usize, before: Option<Binding>, after: Option<Binding>| {
            let binding_changed = before != after;
            EndState {
                resolved,
                active: binding_changed || arrow.points.get(index) != Some(&resolved.point),
                binding_changed,
                binding_removed: before.is_some() && after.is_none(),
            }
        };
        let start = end_state(start, 0, arrow.start_binding, start_binding);
        let end = end_state(end, arrow.points.len() - 1, arrow.end_binding, end_binding);

        Self {
            frame,
            points_changed: points != arrow.points,
            previous_points: arrow.points.clone(),
            points,
            previous_fixed,
            fixed,
            start,
            end,
            fixed_changed,
            released,
        }
    }

    pub fn mode(&self) -> EditMode {
        if self.fixed.is_empty() {
            EditMode::RouteFresh
        } else if self.released {
            EditMode::ReleaseFixedSegments
        } else if self.binding_changed() || (self.points_changed && !self.fixed_changed) {
            EditMode::DragEndpoints
        } else {
            EditMode::ApplyFixedSegments
        }
    }

    pub fn end_state(&self, end: ArrowEnd) -> &EndState {
        match end {
            ArrowEnd::Start => &self.start,
            ArrowEnd::End => &self.end,
        }
    }

    pub fn binding_changed(&self) -> bool {
        self.start.binding_changed || self.end.binding_changed
    }

    pub fn fully_unbound(&self) -> bool {
        !self.start.resolved.is_bound && !self.end.resolved.is_bound
    }
}

/// Bring a world-space resolution into the local frame.
///
/// A point that resolution did not move is taken verbatim from the request
/// so unchanged ends stay bit-identical.
fn localize(resolved: &ResolvedEndpoint, requested: Point, frame: &LocalFrame) -> ResolvedEndpoint {
    let point = if resolved.point == resolved.anchor_or_point {
        requested
    } else {
        frame.to_local(resolved.point)
    };
    let element_bounds = resolved.element_bounds.and_then(|bounds| {
        let corners = bounds.corners().map(|c| frame.to_local(c));
        Rect::bounding(&corners)
    });
    ResolvedEndpoint {
        point,
        heading: rotate_heading(resolved.heading, -frame.rotation),
        element_bounds,
        anchor_or_point: requested,
        ..*resolved
    }
}
