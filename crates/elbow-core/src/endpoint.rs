//! Binding resolution: a raw endpoint plus an optional binding becomes the
//! router's normalized [`ResolvedEndpoint`].
//!
//! Bindings are resolved against the live [`ElementLookup`] on every call.
//! A binding whose element is missing degrades to an unbound endpoint.

use crate::geometry::{heading_for_point_on_bounds, heading_for_segment, heading_for_vector};
use crate::model::{Anchor, Binding, Element, ElementLookup, Heading, Point, Rect};
use crate::transform::rotate_point;
use serde::{Deserialize, Serialize};

/// One end of a connector as the caller describes it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Endpoint {
    pub point: Point,
    #[serde(default)]
    pub binding: Option<Binding>,
    #[serde(default)]
    pub arrowhead: bool,
}

impl Endpoint {
    pub fn free(point: Point) -> Self {
        Self {
            point,
            binding: None,
            arrowhead: false,
        }
    }

    pub fn bound(point: Point, binding: Binding) -> Self {
        Self {
            point,
            binding: Some(binding),
            arrowhead: false,
        }
    }

    pub fn with_arrowhead(mut self, arrowhead: bool) -> Self {
        self.arrowhead = arrowhead;
        self
    }
}

/// The router's view of one end.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedEndpoint {
    /// World-space attachment point.
    pub point: Point,
    /// Outward heading: the start leaves along it, the end arrives along
    /// its opposite. For free ends it points toward the other end.
    pub heading: Heading,
    /// Rotated AABB of the bound element.
    pub element_bounds: Option<Rect>,
    pub is_bound: bool,
    /// A free end whose heading is still a hard constraint, e.g. a sub-span
    /// boundary sitting on a fixed segment.
    pub pinned_heading: bool,
    pub has_arrowhead: bool,
    /// The point the caller supplied before anchoring.
    pub anchor_or_point: Point,
}

impl ResolvedEndpoint {
    /// Unbound end with a soft heading.
    pub fn free(point: Point, heading: Heading) -> Self {
        Self {
            point,
            heading,
            element_bounds: None,
            is_bound: false,
            pinned_heading: false,
            has_arrowhead: false,
            anchor_or_point: point,
        }
    }

    /// Unbound end whose heading must be honoured.
    pub fn pinned(point: Point, heading: Heading) -> Self {
        Self {
            pinned_heading: true,
            ..Self::free(point, heading)
        }
    }

    /// Whether the path must leave (or arrive) along `heading`.
    pub fn requires_heading(&self) -> bool {
        self.is_bound || self.pinned_heading
    }
}

/// Rotate a heading by `angle` radians, snapping to the nearest cardinal.
pub fn rotate_heading(heading: Heading, angle: f64) -> Heading {
    if angle == 0.0 {
        return heading;
    }
    let (dx, dy) = heading.vector();
    let (sin, cos) = angle.sin_cos();
    heading_for_vector(dx * cos - dy * sin, dx * sin + dy * cos)
}

/// Attachment point and outward heading of `binding` for an endpoint
/// currently at `point`. `None` when the element no longer exists.
pub fn resolve_binding(
    binding: &Binding,
    point: Point,
    lookup: &impl ElementLookup,
) -> Option<(Point, Heading, Element)> {
    let element = lookup.element(binding.element_id)?;
    let rect = element.rect;
    let center = rect.center();

    let (local, world) = match binding.anchor {
        Anchor::Outline => (rotate_point(point, center, -element.rotation), point),
        Anchor::Fixed { ratio_x, ratio_y } => {
            let local = Point::new(
                rect.min_x + ratio_x * rect.width(),
                rect.min_y + ratio_y * rect.height(),
            );
            (local, rotate_point(local, center, element.rotation))
        }
    };

    let heading = rotate_heading(heading_for_point_on_bounds(&rect, local), element.rotation);
    Some((world, heading, element))
}

fn resolve_one(endpoint: &Endpoint, lookup: &impl ElementLookup) -> (Point, Option<(Heading, Rect)>) {
    let resolved = endpoint
        .binding
        .as_ref()
        .and_then(|b| resolve_binding(b, endpoint.point, lookup));
    match resolved {
        Some((point, heading, element)) => (point, Some((heading, element.bounds()))),
        None => {
            if let Some(binding) = &endpoint.binding {
                log::debug!("binding to {} is dangling; treating end as free", binding.element_id);
            }
            (endpoint.point, None)
        }
    }
}

/// Resolve both ends together: free ends head toward the other end's
/// resolved point.
pub fn resolve_endpoints(
    start: &Endpoint,
    end: &Endpoint,
    lookup: &impl ElementLookup,
) -> (ResolvedEndpoint, ResolvedEndpoint) {
    let (start_point, start_bound) = resolve_one(start, lookup);
    let (end_point, end_bound) = resolve_one(end, lookup);

    let build = |endpoint: &Endpoint, point: Point, bound: Option<(Heading, Rect)>, other: Point| {
        let free_heading = heading_for_segment(point, other);
        ResolvedEndpoint {
            point,
            heading: bound.map_or(free_heading, |(h, _)| h),
            element_bounds: bound.map(|(_, r)| r),
            is_bound: bound.is_some(),
            pinned_heading: false,
            has_arrowhead: endpoint.arrowhead,
            anchor_or_point: endpoint.point,
        }
    };

    (
        build(start, start_point, start_bound, end_point),
        build(end, end_point, end_bound, start_point),
    )
}
