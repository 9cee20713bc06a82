//! Integration tests: arrow + element scene + updates → edited arrow.
//!
//! Exercises every edit mode through the public `edit` entry point and
//! checks the properties the editor promises: orthogonal paths, fixed
//! segments kept off the end legs, stable re-edits and pinned lanes that
//! survive unrelated changes.

use elbow_core::endpoint::{Endpoint, resolve_endpoints};
use elbow_core::geometry::has_diagonal;
use elbow_core::model::*;
use elbow_core::{ElementId, RouteConfig, validate_path};
use elbow_editor::fixed::is_interior;
use elbow_editor::{
    ArrowEdit, ArrowUpdates, EditContext, EditMode, ElbowArrow, FixedSegment, edit,
    transform_fixed_segments,
};
use pretty_assertions::assert_eq;
use serde::Deserialize;

#[derive(Deserialize)]
struct Scene {
    elements: Vec<Element>,
    arrows: Vec<ElbowArrow>,
}

fn scene() -> (ElementMap, Vec<ElbowArrow>) {
    let _ = env_logger::builder().is_test(true).try_init();
    let scene: Scene = serde_json::from_str(include_str!("fixtures/edit_scene.json")).unwrap();
    (scene.elements.into_iter().collect(), scene.arrows)
}

fn arrow(arrows: &[ElbowArrow], name: &str) -> ElbowArrow {
    arrows
        .iter()
        .find(|a| a.id.as_str() == name)
        .cloned()
        .unwrap_or_else(|| panic!("no arrow {name} in fixture"))
}

fn pts(raw: &[(f64, f64)]) -> Vec<Point> {
    raw.iter().map(|(x, y)| Point::new(*x, *y)).collect()
}

fn assert_well_formed(result: &ArrowEdit) {
    assert!(!has_diagonal(&result.points), "diagonal in {:?}", result.points);
    for segment in &result.fixed_segments {
        assert!(
            is_interior(segment.index, result.points.len()),
            "segment {} touches an end of {:?}",
            segment.index,
            result.points
        );
        assert_eq!(result.points[segment.index - 1], segment.start);
        assert_eq!(result.points[segment.index], segment.end);
    }
}

/// Apply `result`, edit again with no updates, and expect no change.
fn assert_settled(arrow: &ElbowArrow, result: &ArrowEdit, lookup: &impl ElementLookup) {
    let mut settled = arrow.clone();
    settled.apply(result.clone());
    let again = edit(&settled, lookup, &ArrowUpdates::default(), &RouteConfig::default());
    assert_eq!(&again, result);
}

// ─── Fresh routing ──────────────────────────────────────────────────────

#[test]
fn free_ends_on_one_line_route_directly() {
    let arrow = ElbowArrow::new(
        ElementId::intern("direct"),
        Point::default(),
        pts(&[(0.0, 0.0), (80.0, 40.0), (200.0, 0.0)]),
    )
    .unwrap();
    let result = edit(&arrow, &NoElements, &ArrowUpdates::default(), &RouteConfig::default());
    assert_eq!(result.points, pts(&[(0.0, 0.0), (200.0, 0.0)]));
    assert!(result.fixed_segments.is_empty());
}

#[test]
fn bound_ends_are_written_back_from_their_anchors() {
    let (elements, _) = scene();
    let arrow = ElbowArrow::new(
        ElementId::intern("fresh"),
        Point::default(),
        pts(&[(0.0, 0.0), (10.0, 10.0)]),
    )
    .unwrap()
    .with_bindings(
        Some(Binding::fixed(ElementId::intern("src"), 0.5, 1.0)),
        Some(Binding::fixed(ElementId::intern("dst"), 0.5, 0.0)),
    );

    let result = edit(&arrow, &elements, &ArrowUpdates::default(), &RouteConfig::default());
    assert_eq!(
        result.points,
        pts(&[(50.0, 100.0), (50.0, 150.0), (350.0, 150.0), (350.0, 200.0)])
    );
    assert_settled(&arrow, &result, &elements);
}

#[test]
fn malformed_fixed_segments_are_ignored() {
    let (_, arrows) = scene();
    let mut arrow = arrow(&arrows, "staircase");
    arrow.fixed_segments = vec![
        FixedSegment::new(1, Point::new(0.0, 0.0), Point::new(100.0, 0.0)),
        FixedSegment::new(4, Point::new(200.0, 100.0), Point::new(260.0, 200.0)),
    ];
    let ctx = EditContext::new(&arrow, &NoElements, &ArrowUpdates::default());
    assert_eq!(ctx.mode(), EditMode::RouteFresh);

    let result = edit(&arrow, &NoElements, &ArrowUpdates::default(), &RouteConfig::default());
    assert!(result.fixed_segments.is_empty());
    assert_well_formed(&result);
}

// ─── Applying fixed segments ────────────────────────────────────────────

#[test]
fn moved_segment_drags_its_neighbours_along() {
    let (elements, _) = scene();
    let arrow = ElbowArrow::new(
        ElementId::intern("pinned"),
        Point::default(),
        pts(&[(50.0, 100.0), (50.0, 150.0), (350.0, 150.0), (350.0, 200.0)]),
    )
    .unwrap()
    .with_bindings(
        Some(Binding::fixed(ElementId::intern("src"), 0.5, 1.0)),
        Some(Binding::fixed(ElementId::intern("dst"), 0.5, 0.0)),
    );
    let moved = FixedSegment::new(2, Point::new(50.0, 170.0), Point::new(350.0, 170.0));
    let updates = ArrowUpdates::default().fixed_segments(vec![moved]);
    assert_eq!(EditContext::new(&arrow, &elements, &updates).mode(), EditMode::ApplyFixedSegments);

    let result = edit(&arrow, &elements, &updates, &RouteConfig::default());
    assert_eq!(
        result.points,
        pts(&[(50.0, 100.0), (50.0, 170.0), (350.0, 170.0), (350.0, 200.0)])
    );
    assert_eq!(result.fixed_segments, vec![moved]);
    assert_settled(&arrow, &result, &elements);
}

// ─── Dragging ends ──────────────────────────────────────────────────────

#[test]
fn dragging_a_free_end_keeps_the_pinned_lane() {
    let (_, arrows) = scene();
    let arrow = arrow(&arrows, "staircase");
    let mut points = arrow.points.clone();
    points[5] = Point::new(400.0, 260.0);
    let updates = ArrowUpdates::default().points(points);
    assert_eq!(EditContext::new(&arrow, &NoElements, &updates).mode(), EditMode::DragEndpoints);

    let result = edit(&arrow, &NoElements, &updates, &RouteConfig::default());
    assert_well_formed(&result);
    assert_eq!(result.points.last(), Some(&Point::new(400.0, 260.0)));
    assert_eq!(result.points[..4], arrow.points[..4]);
    assert_eq!(result.fixed_segments.len(), 1);
    assert!(result.fixed_segments[0].is_horizontal());
    assert_eq!(result.fixed_segments[0].axis_value(), 100.0);
    assert_settled(&arrow, &result, &NoElements);
}

#[test]
fn end_drag_sweep_stays_well_formed() {
    let (_, arrows) = scene();
    let arrow = arrow(&arrows, "staircase");
    for x in [-120.0, 40.0, 150.0, 350.0, 520.0] {
        for y in [-80.0, 100.0, 180.0, 400.0] {
            let mut points = arrow.points.clone();
            points[5] = Point::new(x, y);
            let result = edit(&arrow, &NoElements, &ArrowUpdates::default().points(points), &RouteConfig::default());
            assert_well_formed(&result);
            assert_eq!(result.points[0], Point::new(0.0, 0.0));
            assert_eq!(result.points.last(), Some(&Point::new(x, y)));
            assert_settled(&arrow, &result, &NoElements);
        }
    }
}

#[test]
fn moving_a_bound_shape_keeps_both_headings() {
    let (mut elements, arrows) = scene();
    let arrow = arrow(&arrows, "linked");
    let dst = ElementId::intern("dst");
    elements.insert(Element::new(dst, Rect::new(300.0, 300.0, 400.0, 400.0)));

    let ctx = EditContext::new(&arrow, &elements, &ArrowUpdates::default());
    assert_eq!(ctx.mode(), EditMode::DragEndpoints);
    assert!(ctx.end.active && !ctx.start.active);

    let result = edit(&arrow, &elements, &ArrowUpdates::default(), &RouteConfig::default());
    assert_well_formed(&result);
    assert_eq!(result.points[0], Point::new(100.0, 50.0));
    assert_eq!(result.points.last(), Some(&Point::new(300.0, 350.0)));

    let (start, end) = resolve_endpoints(
        &Endpoint::bound(result.points[0], Binding::fixed(ElementId::intern("src"), 1.0, 0.5)),
        &Endpoint::bound(Point::new(300.0, 350.0), Binding::fixed(dst, 0.0, 0.5)).with_arrowhead(true),
        &elements,
    );
    assert!(validate_path(&result.points, &start, &end), "{:?}", result.points);
    assert!(
        result
            .fixed_segments
            .iter()
            .any(|f| f.axis() == Some(Axis::Vertical) && f.axis_value() == 200.0)
    );
    assert_settled(&arrow, &result, &elements);
}

/// Edit the `linked` arrow with `dst` at `rect` and the end bound to
/// `(ratio_x, ratio_y)` on it; check the result and return it.
fn rebind_linked_end(elements: &mut ElementMap, arrow: &ElbowArrow, rect: Rect, ratio: (f64, f64)) -> ArrowEdit {
    let src = ElementId::intern("src");
    let dst = ElementId::intern("dst");
    elements.insert(Element::new(dst, rect));
    let binding = Binding::fixed(dst, ratio.0, ratio.1);
    let updates = ArrowUpdates::default().end_binding(Some(binding));
    let result = edit(arrow, &*elements, &updates, &RouteConfig::default());
    assert_well_formed(&result);

    let last = result.points[result.points.len() - 1];
    let (start, end) = resolve_endpoints(
        &Endpoint::bound(result.points[0], Binding::fixed(src, 1.0, 0.5)),
        &Endpoint::bound(last, binding).with_arrowhead(true),
        &*elements,
    );
    assert_eq!(last, end.point);
    assert!(
        validate_path(&result.points, &start, &end),
        "dst at {rect:?}, anchor {ratio:?}: {:?}",
        result.points
    );

    let mut rebound = arrow.clone();
    rebound.end_binding = Some(binding);
    assert_settled(&rebound, &result, &*elements);
    result
}

#[test]
fn end_facing_away_from_the_lane_goes_around_its_shape() {
    let (mut elements, arrows) = scene();
    let arrow = arrow(&arrows, "linked");
    let result = rebind_linked_end(&mut elements, &arrow, Rect::new(250.0, 200.0, 350.0, 300.0), (1.0, 0.5));

    assert_eq!(result.points.last(), Some(&Point::new(350.0, 250.0)));
    let before_last = result.points[result.points.len() - 2];
    assert!(before_last.x > 350.0, "{:?}", result.points);
}

#[test]
fn rebinding_sweep_keeps_headings() {
    let (mut elements, arrows) = scene();
    let arrow = arrow(&arrows, "linked");
    for x in [250.0, 300.0, 450.0] {
        for y in [-150.0, 200.0, 350.0] {
            for ratio in [(1.0, 0.5), (0.0, 0.5), (0.5, 0.0), (0.5, 1.0)] {
                rebind_linked_end(&mut elements, &arrow, Rect::new(x, y, x + 100.0, y + 100.0), ratio);
            }
        }
    }
}

#[test]
fn unbinding_an_end_keeps_the_pinned_lane() {
    let (elements, arrows) = scene();
    let arrow = arrow(&arrows, "linked");
    let mut points = arrow.points.clone();
    points[3] = Point::new(500.0, 400.0);
    let updates = ArrowUpdates::default().points(points).end_binding(None);
    assert_eq!(EditContext::new(&arrow, &elements, &updates).mode(), EditMode::DragEndpoints);

    let result = edit(&arrow, &elements, &updates, &RouteConfig::default());
    assert_well_formed(&result);
    assert_eq!(result.points[0], Point::new(100.0, 50.0));
    assert_eq!(result.points[1].y, 50.0);
    assert!(result.points[1].x > 100.0);
    assert_eq!(result.points.last(), Some(&Point::new(500.0, 400.0)));
    assert!(
        result
            .fixed_segments
            .iter()
            .any(|f| f.axis() == Some(Axis::Vertical) && f.axis_value() == 200.0)
    );
}

// ─── Releasing segments ─────────────────────────────────────────────────

#[test]
fn releasing_a_segment_leaves_the_far_side_untouched() {
    let (_, arrows) = scene();
    let arrow = arrow(&arrows, "two_pins");
    let kept = arrow.fixed_segments[1];
    let updates = ArrowUpdates::default().fixed_segments(vec![kept]);
    assert_eq!(EditContext::new(&arrow, &NoElements, &updates).mode(), EditMode::ReleaseFixedSegments);

    let result = edit(&arrow, &NoElements, &updates, &RouteConfig::default());
    assert_well_formed(&result);
    assert_eq!(
        result.points,
        pts(&[(0.0, 0.0), (200.0, 0.0), (200.0, 200.0), (300.0, 200.0), (300.0, 300.0), (400.0, 300.0)])
    );
    assert_eq!(result.points[2..], arrow.points[4..]);
    assert_eq!(result.fixed_segments, vec![FixedSegment::new(3, kept.start, kept.end)]);
    assert_settled(&arrow, &result, &NoElements);
}

// ─── Resizing ───────────────────────────────────────────────────────────

#[test]
fn resize_remaps_fixed_segments() {
    let (_, arrows) = scene();
    let arrow = arrow(&arrows, "staircase");
    let old = Rect::new(0.0, 0.0, 400.0, 200.0);
    let new = Rect::new(0.0, 0.0, 800.0, 100.0);
    let moved = transform_fixed_segments(&arrow.fixed_segments, old, new, 0.0);
    assert_eq!(
        moved,
        vec![FixedSegment::new(3, Point::new(200.0, 50.0), Point::new(400.0, 50.0))]
    );
}
