//! The elbow arrow element and the update record fed to [`crate::edit`].

use crate::fixed::FixedSegment;
use elbow_core::id::ElementId;
use elbow_core::model::{Binding, Point};
use elbow_core::transform::LocalFrame;
use serde::{Deserialize, Serialize};

/// An elbow connector. `points` and `fixed_segments` are local to `origin`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElbowArrow {
    pub id: ElementId,
    pub origin: Point,
    #[serde(default)]
    pub rotation: f64,
    pub points: Vec<Point>,
    #[serde(default)]
    pub fixed_segments: Vec<FixedSegment>,
    #[serde(default)]
    pub start_binding: Option<Binding>,
    #[serde(default)]
    pub end_binding: Option<Binding>,
    #[serde(default)]
    pub start_arrowhead: bool,
    #[serde(default)]
    pub end_arrowhead: bool,
}

impl ElbowArrow {
    pub fn new(id: ElementId, origin: Point, points: Vec<Point>) -> Result<Self, String> {
        if points.len() < 2 {
            return Err(format!("arrow {id} needs at least two points, got {}", points.len()));
        }
        Ok(Self {
            id,
            origin,
            rotation: 0.0,
            points,
            fixed_segments: Vec::new(),
            start_binding: None,
            end_binding: None,
            start_arrowhead: false,
            end_arrowhead: false,
        })
    }

    pub fn with_bindings(mut self, start: Option<Binding>, end: Option<Binding>) -> Self {
        self.start_binding = start;
        self.end_binding = end;
        self
    }

    pub fn with_fixed_segments(mut self, segments: Vec<FixedSegment>) -> Self {
        self.fixed_segments = segments;
        self
    }

    pub fn with_arrowheads(mut self, start: bool, end: bool) -> Self {
        self.start_arrowhead = start;
        self.end_arrowhead = end;
        self
    }

    /// Local ⇄ world mapping. Rotation pivots on the origin so the frame
    /// does not move while the points are being edited.
    pub fn frame(&self) -> LocalFrame {
        LocalFrame {
            origin: self.origin,
            rotation: self.rotation,
            pivot: self.origin,
        }
    }

    /// World-space points.
    pub fn world_points(&self) -> Vec<Point> {
        self.frame().points_to_world(&self.points)
    }

    /// Store the result of an edit.
    pub fn apply(&mut self, edit: ArrowEdit) {
        self.points = edit.points;
        self.fixed_segments = edit.fixed_segments;
    }
}

/// Caller-supplied changes for one edit. `None` means unchanged; for the
/// bindings, `Some(None)` unbinds that end.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArrowUpdates {
    pub points: Option<Vec<Point>>,
    pub fixed_segments: Option<Vec<FixedSegment>>,
    pub start_binding: Option<Option<Binding>>,
    pub end_binding: Option<Option<Binding>>,
}

impl ArrowUpdates {
    pub fn points(mut self, points: Vec<Point>) -> Self {
        self.points = Some(points);
        self
    }

    pub fn fixed_segments(mut self, segments: Vec<FixedSegment>) -> Self {
        self.fixed_segments = Some(segments);
        self
    }

    pub fn start_binding(mut self, binding: Option<Binding>) -> Self {
        self.start_binding = Some(binding);
        self
    }

    pub fn end_binding(mut self, binding: Option<Binding>) -> Self {
        self.end_binding = Some(binding);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// The points and fixed segments produced by an edit, in the arrow's local
/// frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrowEdit {
    pub points: Vec<Point>,
    pub fixed_segments: Vec<FixedSegment>,
}
