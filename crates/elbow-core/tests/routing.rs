//! Integration tests: endpoints + element scene → routed elbow path.
//!
//! Exercises the full `elbow-core` pipeline: binding resolution, obstacle
//! layout, grid search, fallback and finalization.

use elbow_core::endpoint::{Endpoint, resolve_endpoints};
use elbow_core::geometry::has_diagonal;
use elbow_core::layout::build_obstacle_layout;
use elbow_core::model::*;
use elbow_core::{ElementId, RouteConfig, route, validate_path};
use pretty_assertions::assert_eq;
use serde::Deserialize;

#[derive(Deserialize)]
struct Scene {
    elements: Vec<Element>,
}

fn scene() -> ElementMap {
    let _ = env_logger::builder().is_test(true).try_init();
    let scene: Scene = serde_json::from_str(include_str!("fixtures/scene.json")).unwrap();
    scene.elements.into_iter().collect()
}

fn anchored(name: &str, ratio_x: f64, ratio_y: f64) -> Endpoint {
    Endpoint::bound(
        Point::default(),
        Binding::fixed(ElementId::intern(name), ratio_x, ratio_y),
    )
}

const SIDE_ANCHORS: [(f64, f64); 4] = [(1.0, 0.5), (0.0, 0.5), (0.5, 0.0), (0.5, 1.0)];

/// Offsets of the second shape: far apart, touching, overlapping, collinear.
const OFFSETS: [f64; 9] = [-400.0, -160.0, -60.0, -20.0, 0.0, 40.0, 100.0, 200.0, 400.0];

/// Shape `a` at the origin and shape `b` moved by `(dx, dy)`, both 100×100.
fn pair_scene(dx: f64, dy: f64) -> ElementMap {
    let _ = env_logger::builder().is_test(true).try_init();
    [
        Element::new(ElementId::intern("a"), Rect::new(0.0, 0.0, 100.0, 100.0)),
        Element::new(ElementId::intern("b"), Rect::new(dx, dy, dx + 100.0, dy + 100.0)),
    ]
    .into_iter()
    .collect()
}

fn sweep_shape_pairs(config: &RouteConfig) {
    for dx in OFFSETS {
        for dy in OFFSETS {
            let elements = pair_scene(dx, dy);
            for (sx, sy) in SIDE_ANCHORS {
                for (ex, ey) in SIDE_ANCHORS {
                    let start = anchored("a", sx, sy);
                    let end = anchored("b", ex, ey);
                    let (rs, re) = resolve_endpoints(&start, &end, &elements);
                    let path = route(start, end, &elements, config);

                    assert!(
                        validate_path(&path, &rs, &re),
                        "b at ({dx},{dy}), {sx},{sy} → {ex},{ey}: {path:?}"
                    );
                    assert_eq!(path.first(), Some(&rs.point));
                    assert_eq!(path.last(), Some(&re.point));
                }
            }
        }
    }
}

// ─── Direct shortcut ────────────────────────────────────────────────────

#[test]
fn facing_shapes_on_one_line_route_directly() {
    let elements = scene();
    let start = Endpoint::bound(Point::new(0.0, 0.0), Binding::outline(ElementId::intern("left")));
    let end = Endpoint::bound(Point::new(200.0, 0.0), Binding::outline(ElementId::intern("right")));

    let path = route(start, end, &elements, &RouteConfig::default());
    assert_eq!(path, vec![Point::new(0.0, 0.0), Point::new(200.0, 0.0)]);
}

// ─── Grid search ────────────────────────────────────────────────────────

#[test]
fn bottom_to_top_route_crosses_the_gap_once() {
    let elements = scene();
    let path = route(
        anchored("upper", 0.5, 1.0),
        anchored("lower", 0.5, 0.0),
        &elements,
        &RouteConfig::default(),
    );
    assert_eq!(
        path,
        vec![
            Point::new(50.0, 100.0),
            Point::new(50.0, 150.0),
            Point::new(350.0, 150.0),
            Point::new(350.0, 200.0),
        ]
    );
}

#[test]
fn every_side_pairing_is_compliant_and_anchored() {
    let elements = scene();
    let config = RouteConfig::default();
    for (sx, sy) in SIDE_ANCHORS {
        for (ex, ey) in SIDE_ANCHORS {
            for arrowhead in [false, true] {
                let start = anchored("upper", sx, sy);
                let end = anchored("lower", ex, ey).with_arrowhead(arrowhead);
                let (rs, re) = resolve_endpoints(&start, &end, &elements);
                let path = route(start, end, &elements, &config);

                assert!(validate_path(&path, &rs, &re), "{sx},{sy} → {ex},{ey}: {path:?}");
                assert_eq!(path.first(), Some(&rs.point));
                assert_eq!(path.last(), Some(&re.point));
            }
        }
    }
}

#[test]
fn shape_pair_sweep_keeps_headings() {
    sweep_shape_pairs(&RouteConfig::default());
}

#[test]
fn arrowhead_does_not_break_heading_compliance() {
    let elements = scene();
    let start = anchored("upper", 0.5, 1.0);
    let end = anchored("lower", 0.5, 0.0).with_arrowhead(true);
    let (rs, re) = resolve_endpoints(&start, &end, &elements);
    let path = route(start, end, &elements, &RouteConfig::default());
    assert!(validate_path(&path, &rs, &re), "{path:?}");
}

// ─── Overlapping shapes ─────────────────────────────────────────────────

#[test]
fn overlapping_shapes_route_from_point_obstacles() {
    let elements = scene();
    let start = anchored("overlap_a", 1.0, 0.5);
    let end = anchored("overlap_b", 0.0, 0.5);
    let (rs, re) = resolve_endpoints(&start, &end, &elements);

    let layout = build_obstacle_layout(&rs, &re, &RouteConfig::default());
    assert!(layout.overlap);
    assert!(!layout.obstacles[0].overlaps(&layout.obstacles[1]));

    let path = route(start, end, &elements, &RouteConfig::default());
    assert!(validate_path(&path, &rs, &re), "{path:?}");
    assert_eq!(path.first(), Some(&rs.point));
    assert_eq!(path.last(), Some(&re.point));
}

#[test]
fn overlapping_shapes_facing_the_same_way() {
    let elements = pair_scene(-60.0, 0.0);
    let start = anchored("a", 1.0, 0.5);
    let end = anchored("b", 1.0, 0.5);
    let (rs, re) = resolve_endpoints(&start, &end, &elements);
    assert_eq!(re.point, Point::new(40.0, 50.0));

    let path = route(start, end, &elements, &RouteConfig::default());
    assert!(validate_path(&path, &rs, &re), "{path:?}");
    assert!(path.len() > 2);
}

// ─── Fallback ───────────────────────────────────────────────────────────

#[test]
fn fallback_only_sweep_keeps_headings() {
    sweep_shape_pairs(&RouteConfig::fallback_only());
}

#[test]
fn fallback_turns_around_collinear_ends() {
    let elements = pair_scene(-400.0, 0.0);
    let start = anchored("a", 1.0, 0.5);
    let end = anchored("b", 1.0, 0.5);
    let (rs, re) = resolve_endpoints(&start, &end, &elements);

    let path = route(start, end, &elements, &RouteConfig::fallback_only());
    assert!(validate_path(&path, &rs, &re), "{path:?}");
    assert_eq!(
        path,
        vec![
            Point::new(100.0, 50.0),
            Point::new(120.0, 50.0),
            Point::new(120.0, -20.0),
            Point::new(-280.0, -20.0),
            Point::new(-280.0, 50.0),
            Point::new(-300.0, 50.0),
        ]
    );
}

#[test]
fn dangling_binding_routes_as_free_endpoint() {
    let elements = scene();
    let start = Endpoint::bound(Point::new(0.0, 600.0), Binding::outline(ElementId::intern("deleted")));
    let end = Endpoint::free(Point::new(160.0, 680.0));
    let path = route(start, end, &elements, &RouteConfig::default());
    assert!(!has_diagonal(&path));
    assert_eq!(path.first(), Some(&Point::new(0.0, 600.0)));
    assert_eq!(path.last(), Some(&Point::new(160.0, 680.0)));
}

// ─── Rotation ───────────────────────────────────────────────────────────

#[test]
fn rotated_element_anchor_is_respected() {
    let elements = scene();
    let start = anchored("tilted", 1.0, 0.5);
    let end = Endpoint::free(Point::new(400.0, 600.0));
    let (rs, _) = resolve_endpoints(&start, &end, &elements);
    assert!(rs.is_bound);
    assert!((rs.point.x - 50.0 - 50.0 * 0.5f64.cos()).abs() < 1e-9);

    let path = route(start, end, &elements, &RouteConfig::default());
    assert!(!has_diagonal(&path));
    assert_eq!(path.first(), Some(&rs.point));
}
