//! Incremental edit entry point.
//!
//! [`edit`] derives an [`EditContext`], dispatches on its [`EditMode`] and
//! runs every result through [`finish`], which snaps onto the fixed
//! segments and simplifies around them until nothing changes. Calling
//! `edit` again with no updates therefore returns the same arrow.

use crate::arrow::{ArrowEdit, ArrowUpdates, ElbowArrow};
use crate::context::{EditContext, EditMode};
use crate::drag::drag_endpoints;
use crate::fixed::{
    FixedSegment, pinned_indices, reindex_fixed_segments, retain_locatable, sanitize_fixed_segments,
    snap_points_to_fixed,
};
use crate::release::release_fixed_segments;
use elbow_core::config::RouteConfig;
use elbow_core::geometry::{has_diagonal, orthogonalize, simplify_path};
use elbow_core::model::{ElementLookup, Point};
use elbow_core::route::route_resolved;

/// Upper bound on normalization rounds; two are enough in practice.
const FINISH_ROUNDS: usize = 4;

/// Recompute an arrow's points and fixed segments after `updates`.
pub fn edit(
    arrow: &ElbowArrow,
    lookup: &impl ElementLookup,
    updates: &ArrowUpdates,
    config: &RouteConfig,
) -> ArrowEdit {
    let ctx = EditContext::new(arrow, lookup, updates);
    let mode = ctx.mode();
    log::debug!("edit {}: {mode:?}", arrow.id);

    let (points, fixed) = match mode {
        EditMode::RouteFresh => (route_fresh(&ctx, config), Vec::new()),
        EditMode::ReleaseFixedSegments => release_fixed_segments(&ctx, config),
        EditMode::DragEndpoints => drag_endpoints(&ctx, config),
        EditMode::ApplyFixedSegments => (ctx.points.clone(), ctx.fixed.clone()),
    };
    let (points, fixed_segments) = finish(&ctx, points, fixed);
    if !has_diagonal(&points) {
        return ArrowEdit { points, fixed_segments };
    }

    let (points, fixed_segments) = finish(&ctx, ctx.previous_points.clone(), ctx.fixed.clone());
    if !has_diagonal(&points) {
        log::warn!("edit {}: {mode:?} left a diagonal, kept the previous path", arrow.id);
        return ArrowEdit { points, fixed_segments };
    }

    log::warn!("edit {}: {mode:?} left a diagonal, routing fresh", arrow.id);
    let fresh = route_fresh(&ctx, config);
    let fixed = reindex_fixed_segments(&fresh, &ctx.fixed).unwrap_or_default();
    let (points, fixed_segments) = finish(&ctx, fresh, fixed);
    ArrowEdit { points, fixed_segments }
}

/// Apply [`edit`] and store the result on the arrow.
pub fn edit_in_place(
    arrow: &mut ElbowArrow,
    lookup: &impl ElementLookup,
    updates: &ArrowUpdates,
    config: &RouteConfig,
) {
    let result = edit(arrow, lookup, updates, config);
    arrow.apply(result);
}

fn route_fresh(ctx: &EditContext, config: &RouteConfig) -> Vec<Point> {
    route_resolved(&ctx.start.resolved, &ctx.end.resolved, config)
}

/// Write the resolved ends back, then snap, orthogonalize and simplify
/// around the fixed segments until a round changes nothing.
pub fn finish(
    ctx: &EditContext,
    points: Vec<Point>,
    fixed: Vec<FixedSegment>,
) -> (Vec<Point>, Vec<FixedSegment>) {
    let mut points = if points.len() < 2 {
        vec![ctx.start.resolved.point, ctx.end.resolved.point]
    } else {
        points
    };
    let last = points.len() - 1;
    points[0] = ctx.start.resolved.point;
    points[last] = ctx.end.resolved.point;
    let mut fixed = fixed;

    for _ in 0..FINISH_ROUNDS {
        let before = (points.clone(), fixed.clone());

        fixed = sanitize_fixed_segments(&fixed, points.len());
        snap_points_to_fixed(&mut points, &fixed);

        if has_diagonal(&points) {
            let orthogonal = orthogonalize(&points);
            if let Some(found) = reindex_fixed_segments(&orthogonal, &fixed) {
                points = orthogonal;
                fixed = found;
            }
        }

        let pins = pinned_indices(&fixed, points.len());
        let simplified = simplify_path(&points, &pins);
        match reindex_fixed_segments(&simplified, &fixed) {
            Some(found) => {
                points = simplified;
                fixed = found;
            }
            None => fixed = retain_locatable(&points, &fixed),
        }
        fixed = sanitize_fixed_segments(&fixed, points.len());

        if (&points, &fixed) == (&before.0, &before.1) {
            break;
        }
    }
    (points, fixed)
}
