//! Coordinate-space transforms between an arrow's local frame and world space.
//!
//! Arrow points and fixed segments are stored relative to the arrow's origin
//! (local space). The router and obstacle builder work in world space. A
//! [`LocalFrame`] maps between the two, including an optional rotation about a
//! world-space pivot.

use crate::model::{Point, Rect};

/// Rotate `p` about `center` by `angle` radians (clockwise on screen).
pub fn rotate_point(p: Point, center: Point, angle: f64) -> Point {
    if angle == 0.0 {
        return p;
    }
    let (sin, cos) = angle.sin_cos();
    let dx = p.x - center.x;
    let dy = p.y - center.y;
    Point::new(
        center.x + dx * cos - dy * sin,
        center.y + dx * sin + dy * cos,
    )
}

/// Local ⇄ world mapping for one element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalFrame {
    /// World position of the local origin (before rotation).
    pub origin: Point,
    /// Rotation in radians about `pivot`.
    pub rotation: f64,
    /// World-space pivot of the rotation.
    pub pivot: Point,
}

impl LocalFrame {
    /// Unrotated frame: local = world − origin.
    pub fn translation(origin: Point) -> Self {
        Self {
            origin,
            rotation: 0.0,
            pivot: origin,
        }
    }

    /// Frame of an element whose unrotated bounds are `rect`, with the local
    /// origin at the top-left corner and rotation about the center.
    pub fn for_rect(rect: Rect, rotation: f64) -> Self {
        Self {
            origin: Point::new(rect.min_x, rect.min_y),
            rotation,
            pivot: rect.center(),
        }
    }

    pub fn to_world(&self, p: Point) -> Point {
        let unrotated = Point::new(self.origin.x + p.x, self.origin.y + p.y);
        rotate_point(unrotated, self.pivot, self.rotation)
    }

    pub fn to_local(&self, p: Point) -> Point {
        let unrotated = rotate_point(p, self.pivot, -self.rotation);
        Point::new(unrotated.x - self.origin.x, unrotated.y - self.origin.y)
    }

    pub fn points_to_world(&self, points: &[Point]) -> Vec<Point> {
        points.iter().map(|p| self.to_world(*p)).collect()
    }

    pub fn points_to_local(&self, points: &[Point]) -> Vec<Point> {
        points.iter().map(|p| self.to_local(*p)).collect()
    }
}

/// Map `p` from normalized coordinates of `from` onto `to`.
///
/// Degenerate spans (zero width or height) translate instead of scaling.
pub fn remap_point(p: Point, from: Rect, to: Rect) -> Point {
    let map = |v: f64, a0: f64, a1: f64, b0: f64, b1: f64| {
        let span = a1 - a0;
        if span.abs() < f64::EPSILON {
            b0 + (v - a0)
        } else {
            b0 + (v - a0) / span * (b1 - b0)
        }
    };
    Point::new(
        map(p.x, from.min_x, from.max_x, to.min_x, to.max_x),
        map(p.y, from.min_y, from.max_y, to.min_y, to.max_y),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9
    }

    #[test]
    fn translation_frame_roundtrip() {
        let frame = LocalFrame::translation(Point::new(100.0, 50.0));
        assert_eq!(frame.to_world(Point::new(10.0, 5.0)), Point::new(110.0, 55.0));
        assert_eq!(frame.to_local(Point::new(110.0, 55.0)), Point::new(10.0, 5.0));
    }

    #[test]
    fn rotated_frame_roundtrip() {
        let frame = LocalFrame::for_rect(Rect::new(0.0, 0.0, 100.0, 40.0), 0.7);
        let p = Point::new(13.0, 27.0);
        assert!(close(frame.to_local(frame.to_world(p)), p));
    }

    #[test]
    fn quarter_turn_rotation() {
        let p = rotate_point(Point::new(10.0, 0.0), Point::new(0.0, 0.0), std::f64::consts::FRAC_PI_2);
        assert!(close(p, Point::new(0.0, 10.0)));
    }

    #[test]
    fn remap_scales_and_translates() {
        let from = Rect::new(0.0, 0.0, 100.0, 0.0);
        let to = Rect::new(10.0, 10.0, 210.0, 10.0);
        assert_eq!(remap_point(Point::new(50.0, 0.0), from, to), Point::new(110.0, 10.0));
    }
}
