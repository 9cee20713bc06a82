//! Core value types for elbow connectors.
//!
//! Everything here is a plain value recomputed per call: points and rects in
//! world or local space, the four cardinal headings, and the element/binding
//! records the router reads from the host document. The document itself is
//! never owned; it is consulted through the [`ElementLookup`] trait.

use crate::id::ElementId;
use crate::transform::rotate_point;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ─── Points ──────────────────────────────────────────────────────────────

/// A 2-D coordinate. Screen convention: `y` grows downward.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn manhattan(self, other: Point) -> f64 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    /// Move `distance` units in the direction of `heading`.
    pub fn offset(self, heading: Heading, distance: f64) -> Point {
        let (dx, dy) = heading.vector();
        Point::new(self.x + dx * distance, self.y + dy * distance)
    }

    /// The coordinate that varies along a segment of `axis`
    /// (`x` for horizontal runs, `y` for vertical runs).
    pub fn along(self, axis: Axis) -> f64 {
        match axis {
            Axis::Horizontal => self.x,
            Axis::Vertical => self.y,
        }
    }

    /// The coordinate that stays constant along a segment of `axis`.
    pub fn across(self, axis: Axis) -> f64 {
        match axis {
            Axis::Horizontal => self.y,
            Axis::Vertical => self.x,
        }
    }

    pub fn with_along(self, axis: Axis, value: f64) -> Point {
        match axis {
            Axis::Horizontal => Point::new(value, self.y),
            Axis::Vertical => Point::new(self.x, value),
        }
    }

    pub fn with_across(self, axis: Axis, value: f64) -> Point {
        match axis {
            Axis::Horizontal => Point::new(self.x, value),
            Axis::Vertical => Point::new(value, self.y),
        }
    }
}

// ─── Headings & axes ─────────────────────────────────────────────────────

/// Orientation of an axis-aligned segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    /// Runs along x; `y` is constant.
    Horizontal,
    /// Runs along y; `x` is constant.
    Vertical,
}

impl Axis {
    pub fn perpendicular(self) -> Axis {
        match self {
            Axis::Horizontal => Axis::Vertical,
            Axis::Vertical => Axis::Horizontal,
        }
    }
}

/// One of the four directions a path may travel.
///
/// For a bound endpoint this is the outward normal of the shape side the
/// endpoint sits on: the path leaves the start travelling `heading` and
/// arrives at the end travelling `heading.opposite()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Heading {
    Up,
    Right,
    Down,
    Left,
}

impl Heading {
    pub const ALL: [Heading; 4] = [Heading::Up, Heading::Right, Heading::Down, Heading::Left];

    pub fn opposite(self) -> Heading {
        match self {
            Heading::Up => Heading::Down,
            Heading::Right => Heading::Left,
            Heading::Down => Heading::Up,
            Heading::Left => Heading::Right,
        }
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Heading::Left | Heading::Right)
    }

    pub fn axis(self) -> Axis {
        if self.is_horizontal() {
            Axis::Horizontal
        } else {
            Axis::Vertical
        }
    }

    /// Unit vector in screen coordinates.
    pub fn vector(self) -> (f64, f64) {
        match self {
            Heading::Up => (0.0, -1.0),
            Heading::Right => (1.0, 0.0),
            Heading::Down => (0.0, 1.0),
            Heading::Left => (-1.0, 0.0),
        }
    }

    /// `+1` when travelling toward larger coordinates, `-1` otherwise.
    pub fn sign(self) -> f64 {
        match self {
            Heading::Right | Heading::Down => 1.0,
            Heading::Up | Heading::Left => -1.0,
        }
    }

    /// The heading that travels along `axis` with the given sign.
    pub fn from_axis(axis: Axis, positive: bool) -> Heading {
        match (axis, positive) {
            (Axis::Horizontal, true) => Heading::Right,
            (Axis::Horizontal, false) => Heading::Left,
            (Axis::Vertical, true) => Heading::Down,
            (Axis::Vertical, false) => Heading::Up,
        }
    }
}

// ─── Rectangles ──────────────────────────────────────────────────────────

/// Per-side clearance, ordered like CSS: up, right, down, left.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Padding {
    pub up: f64,
    pub right: f64,
    pub down: f64,
    pub left: f64,
}

impl Padding {
    pub const ZERO: Padding = Padding {
        up: 0.0,
        right: 0.0,
        down: 0.0,
        left: 0.0,
    };

    pub fn uniform(value: f64) -> Self {
        Self {
            up: value,
            right: value,
            down: value,
            left: value,
        }
    }

    /// `head` on the side facing `heading`, `side` everywhere else.
    pub fn for_heading(heading: Heading, head: f64, side: f64) -> Self {
        let mut padding = Self::uniform(side);
        padding.set(heading, head);
        padding
    }

    pub fn get(&self, heading: Heading) -> f64 {
        match heading {
            Heading::Up => self.up,
            Heading::Right => self.right,
            Heading::Down => self.down,
            Heading::Left => self.left,
        }
    }

    pub fn set(&mut self, heading: Heading, value: f64) {
        match heading {
            Heading::Up => self.up = value,
            Heading::Right => self.right = value,
            Heading::Down => self.down = value,
            Heading::Left => self.left = value,
        }
    }
}

/// Axis-aligned box, used for shape bounds and padded obstacles alike.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Rect {
    pub const fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Zero-size rect at `p`.
    pub fn from_point(p: Point) -> Self {
        Self::new(p.x, p.y, p.x, p.y)
    }

    /// Square of half-size `half` centered at `p`.
    pub fn around(p: Point, half: f64) -> Self {
        Self::new(p.x - half, p.y - half, p.x + half, p.y + half)
    }

    /// Smallest rect containing all of `points`.
    pub fn bounding(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        Some(
            points
                .iter()
                .fold(Rect::from_point(*first), |acc, p| acc.union(&Rect::from_point(*p))),
        )
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> Point {
        Point::new((self.min_x + self.max_x) / 2.0, (self.min_y + self.max_y) / 2.0)
    }

    pub fn union(&self, other: &Rect) -> Rect {
        Rect::new(
            self.min_x.min(other.min_x),
            self.min_y.min(other.min_y),
            self.max_x.max(other.max_x),
            self.max_y.max(other.max_y),
        )
    }

    /// Interior overlap. Rects that merely touch do not overlap.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.min_x < other.max_x
            && self.max_x > other.min_x
            && self.min_y < other.max_y
            && self.max_y > other.min_y
    }

    /// Inclusive containment.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }

    pub fn inflate(&self, padding: Padding) -> Rect {
        Rect::new(
            self.min_x - padding.left,
            self.min_y - padding.up,
            self.max_x + padding.right,
            self.max_y + padding.down,
        )
    }

    /// Shrink every side by `eps`, collapsing onto the center when too small.
    pub fn shrink(&self, eps: f64) -> Rect {
        let c = self.center();
        Rect::new(
            (self.min_x + eps).min(c.x),
            (self.min_y + eps).min(c.y),
            (self.max_x - eps).max(c.x),
            (self.max_y - eps).max(c.y),
        )
    }

    /// Coordinate of the side facing `heading`.
    pub fn side(&self, heading: Heading) -> f64 {
        match heading {
            Heading::Up => self.min_y,
            Heading::Right => self.max_x,
            Heading::Down => self.max_y,
            Heading::Left => self.min_x,
        }
    }

    pub fn set_side(&mut self, heading: Heading, value: f64) {
        match heading {
            Heading::Up => self.min_y = value,
            Heading::Right => self.max_x = value,
            Heading::Down => self.max_y = value,
            Heading::Left => self.min_x = value,
        }
    }

    /// Span of the rect along `axis` as `(min, max)`.
    pub fn span(&self, axis: Axis) -> (f64, f64) {
        match axis {
            Axis::Horizontal => (self.min_x, self.max_x),
            Axis::Vertical => (self.min_y, self.max_y),
        }
    }

    /// Top-left, top-right, bottom-right, bottom-left.
    pub fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.min_x, self.min_y),
            Point::new(self.max_x, self.min_y),
            Point::new(self.max_x, self.max_y),
            Point::new(self.min_x, self.max_y),
        ]
    }

    /// Whether the segment `a → b` passes through the open interior.
    ///
    /// Segments touching the boundary do not intersect; callers shrink the
    /// rect first when grazing must be tolerated with some slack.
    pub fn intersects_segment(&self, a: Point, b: Point) -> bool {
        let seg = Rect::new(a.x.min(b.x), a.y.min(b.y), a.x.max(b.x), a.y.max(b.y));
        // Degenerate axis-aligned segments have a zero-width bbox, so the strict
        // overlap test is done per axis with the open interval on the rect only.
        let x_hit = seg.max_x > self.min_x && seg.min_x < self.max_x;
        let y_hit = seg.max_y > self.min_y && seg.min_y < self.max_y;
        if !x_hit || !y_hit {
            return false;
        }
        if a.x == b.x || a.y == b.y {
            return true;
        }

        // Liang–Barsky clip against the rect for diagonal segments.
        let dx = b.x - a.x;
        let dy = b.y - a.y;
        let mut t0: f64 = 0.0;
        let mut t1: f64 = 1.0;
        for (p, q) in [
            (-dx, a.x - self.min_x),
            (dx, self.max_x - a.x),
            (-dy, a.y - self.min_y),
            (dy, self.max_y - a.y),
        ] {
            if p == 0.0 {
                if q < 0.0 {
                    return false;
                }
                continue;
            }
            let r = q / p;
            if p < 0.0 {
                t0 = t0.max(r);
            } else {
                t1 = t1.min(r);
            }
            if t0 > t1 {
                return false;
            }
        }
        t0 < t1
    }
}

// ─── Elements & bindings ─────────────────────────────────────────────────

/// A bindable shape as seen by the router.
///
/// `rect` is the unrotated bounding box in world space; `rotation` (radians)
/// turns it about its center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub id: ElementId,
    pub rect: Rect,
    #[serde(default)]
    pub rotation: f64,
}

impl Element {
    pub fn new(id: ElementId, rect: Rect) -> Self {
        Self {
            id,
            rect,
            rotation: 0.0,
        }
    }

    pub fn with_rotation(mut self, rotation: f64) -> Self {
        self.rotation = rotation;
        self
    }

    /// World-space AABB of the (possibly rotated) element.
    pub fn bounds(&self) -> Rect {
        if self.rotation == 0.0 {
            return self.rect;
        }
        let center = self.rect.center();
        let corners = self
            .rect
            .corners()
            .map(|c| rotate_point(c, center, self.rotation));
        Rect::bounding(&corners).unwrap_or(self.rect)
    }
}

/// Where on the element an arrow end attaches.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum Anchor {
    /// Attach wherever the endpoint currently sits; the heading comes from
    /// the side of the element the point is nearest to.
    #[default]
    Outline,
    /// Attach at a normalized position of the element frame
    /// (`0,0` = top-left, `1,1` = bottom-right, before rotation).
    Fixed { ratio_x: f64, ratio_y: f64 },
}

/// An arrow end's attachment to an element.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Binding {
    pub element_id: ElementId,
    #[serde(default)]
    pub anchor: Anchor,
}

impl Binding {
    pub fn outline(element_id: ElementId) -> Self {
        Self {
            element_id,
            anchor: Anchor::Outline,
        }
    }

    pub fn fixed(element_id: ElementId, ratio_x: f64, ratio_y: f64) -> Self {
        Self {
            element_id,
            anchor: Anchor::Fixed { ratio_x, ratio_y },
        }
    }
}

// ─── Element lookup ──────────────────────────────────────────────────────

/// Read-only access to the live element set.
///
/// Implemented by each host: the editor's document, a test `HashMap`, or
/// [`ElementMap`]. Lookups are never cached past one computation.
pub trait ElementLookup {
    fn element(&self, id: ElementId) -> Option<Element>;
}

impl ElementLookup for HashMap<ElementId, Element> {
    fn element(&self, id: ElementId) -> Option<Element> {
        self.get(&id).copied()
    }
}

impl<T: ElementLookup + ?Sized> ElementLookup for &T {
    fn element(&self, id: ElementId) -> Option<Element> {
        (**self).element(id)
    }
}

/// A lookup with no elements: every binding resolves as unbound.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoElements;

impl ElementLookup for NoElements {
    fn element(&self, _id: ElementId) -> Option<Element> {
        None
    }
}

/// Owned element set keyed by id.
#[derive(Debug, Clone, Default)]
pub struct ElementMap {
    elements: HashMap<ElementId, Element>,
}

impl ElementMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, element: Element) -> Option<Element> {
        self.elements.insert(element.id, element)
    }

    pub fn remove(&mut self, id: ElementId) -> Option<Element> {
        self.elements.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

impl FromIterator<Element> for ElementMap {
    fn from_iter<I: IntoIterator<Item = Element>>(iter: I) -> Self {
        Self {
            elements: iter.into_iter().map(|e| (e.id, e)).collect(),
        }
    }
}

impl ElementLookup for ElementMap {
    fn element(&self, id: ElementId) -> Option<Element> {
        self.elements.get(&id).copied()
    }
}
