//! Fixed (user-pinned) segments.
//!
//! A fixed segment is identified by its axis and constant coordinate. The
//! `index` it carries is a cache into the current point list: every mutation
//! of the points is followed by [`reindex_fixed_segments`], and a mutation
//! that loses a segment is rejected by the caller.

use elbow_core::geometry::{DEDUP_THRESHOLD, segment_axis};
use elbow_core::model::{Axis, Point, Rect};
use elbow_core::transform::{LocalFrame, remap_point, rotate_point};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Axis values closer than this are considered the same lane.
const SAME_LANE_EPSILON: f64 = 1e-6;

/// The segment between `points[index - 1]` and `points[index]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FixedSegment {
    pub index: usize,
    pub start: Point,
    pub end: Point,
}

impl FixedSegment {
    pub fn new(index: usize, start: Point, end: Point) -> Self {
        Self { index, start, end }
    }

    /// Segment `index` of `points`, if it exists.
    pub fn at(points: &[Point], index: usize) -> Option<Self> {
        if index == 0 || index >= points.len() {
            return None;
        }
        Some(Self::new(index, points[index - 1], points[index]))
    }

    /// `None` for diagonal or zero-length segments.
    pub fn axis(&self) -> Option<Axis> {
        segment_axis(self.start, self.end)
    }

    pub fn is_horizontal(&self) -> bool {
        self.axis() == Some(Axis::Horizontal)
    }

    /// The coordinate shared by both ends (`y` when horizontal, else `x`).
    pub fn axis_value(&self) -> f64 {
        self.start.across(self.axis().unwrap_or(Axis::Horizontal))
    }

    /// `+1` when running toward larger coordinates along its axis.
    pub fn direction(&self) -> f64 {
        let axis = self.axis().unwrap_or(Axis::Horizontal);
        (self.end.along(axis) - self.start.along(axis)).signum()
    }

    pub fn length(&self) -> f64 {
        self.start.manhattan(self.end)
    }

    /// Same segment with its constant coordinate moved to `value`.
    pub fn with_axis_value(mut self, value: f64) -> Self {
        if let Some(axis) = self.axis() {
            self.start = self.start.with_across(axis, value);
            self.end = self.end.with_across(axis, value);
        }
        self
    }
}

/// Whether `index` may carry a fixed segment in a path of `len` points.
pub fn is_interior(index: usize, len: usize) -> bool {
    index > 1 && index + 1 < len
}

/// Drop diagonal, too-short, out-of-range and duplicate segments, then sort
/// by index.
pub fn sanitize_fixed_segments(segments: &[FixedSegment], len: usize) -> Vec<FixedSegment> {
    let mut out: Vec<FixedSegment> = Vec::with_capacity(segments.len());
    for segment in segments {
        if segment.axis().is_none()
            || segment.length() <= DEDUP_THRESHOLD
            || !is_interior(segment.index, len)
            || out.iter().any(|s| s.index == segment.index)
        {
            log::trace!("dropping malformed fixed segment at {}", segment.index);
            continue;
        }
        out.push(*segment);
    }
    out.sort_by_key(|s| s.index);
    out
}

/// Locate every segment in `points` by axis and value, preferring the
/// candidate closest to its previous index. Indices stay strictly
/// increasing. `None` if any segment cannot be found.
pub fn reindex_fixed_segments(points: &[Point], segments: &[FixedSegment]) -> Option<Vec<FixedSegment>> {
    let len = points.len();
    let mut out = Vec::with_capacity(segments.len());
    let mut floor = 2;
    for segment in segments {
        let axis = segment.axis()?;
        let value = segment.axis_value();
        let found = (floor..len.saturating_sub(1))
            .filter(|&i| segment_axis(points[i - 1], points[i]) == Some(axis))
            .map(|i| (i, (points[i].across(axis) - value).abs()))
            .filter(|(_, diff)| *diff <= DEDUP_THRESHOLD)
            .min_by(|(ia, da), (ib, db)| {
                let da = if *da <= SAME_LANE_EPSILON { 0.0 } else { *da };
                let db = if *db <= SAME_LANE_EPSILON { 0.0 } else { *db };
                da.total_cmp(&db)
                    .then(ia.abs_diff(segment.index).cmp(&ib.abs_diff(segment.index)))
            })
            .map(|(i, _)| i)?;
        out.push(FixedSegment::new(found, points[found - 1], points[found]));
        floor = found + 1;
    }
    Some(out)
}

/// Keep only the segments that can still be located, one at a time.
pub fn retain_locatable(points: &[Point], segments: &[FixedSegment]) -> Vec<FixedSegment> {
    let mut kept: Vec<FixedSegment> = Vec::with_capacity(segments.len());
    for segment in segments {
        let mut trial = kept.clone();
        trial.push(*segment);
        match reindex_fixed_segments(points, &trial) {
            Some(found) => kept = found,
            None => log::debug!("fixed segment at {} no longer matches the path", segment.index),
        }
    }
    kept
}

/// Move both ends of each segment onto its stored axis value.
pub fn snap_points_to_fixed(points: &mut [Point], segments: &[FixedSegment]) {
    for segment in segments {
        let (Some(axis), true) = (segment.axis(), segment.index < points.len()) else {
            continue;
        };
        let value = segment.axis_value();
        for i in [segment.index - 1, segment.index] {
            points[i] = points[i].with_across(axis, value);
        }
    }
}

/// Both path ends plus both ends of every fixed segment.
pub fn pinned_indices(segments: &[FixedSegment], len: usize) -> SmallVec<[usize; 8]> {
    let mut pins: SmallVec<[usize; 8]> = SmallVec::new();
    pins.push(0);
    pins.push(len.saturating_sub(1));
    for segment in segments {
        pins.push(segment.index - 1);
        pins.push(segment.index);
    }
    pins
}

/// Remove interior points joining two collinear segments, as long as every
/// fixed segment can still be located afterwards.
///
/// Two fixed segments are never merged into one. With `allow_flip`, points
/// where the path doubles back on itself are removed too, except next to
/// either end where that would change the end heading.
pub fn merge_collinear(
    points: &[Point],
    fixed: &[FixedSegment],
    allow_flip: bool,
) -> (Vec<Point>, Vec<FixedSegment>) {
    let mut points = points.to_vec();
    let mut fixed = fixed.to_vec();
    let mut i = 1;
    while i + 1 < points.len() {
        match try_merge_at(&points, &fixed, i, allow_flip) {
            Some((merged, refixed)) => {
                points = merged;
                fixed = refixed;
                i = i.saturating_sub(1).max(1);
            }
            None => i += 1,
        }
    }
    (points, fixed)
}

fn try_merge_at(
    points: &[Point],
    fixed: &[FixedSegment],
    i: usize,
    allow_flip: bool,
) -> Option<(Vec<Point>, Vec<FixedSegment>)> {
    let (a, b, c) = (points[i - 1], points[i], points[i + 1]);
    let axis = segment_axis(a, b)?;
    if segment_axis(b, c)? != axis {
        return None;
    }
    let flips = (b.along(axis) - a.along(axis)).signum() != (c.along(axis) - b.along(axis)).signum();
    if flips && (!allow_flip || i == 1 || i + 2 == points.len()) {
        return None;
    }
    if fixed.iter().any(|f| f.index == i) && fixed.iter().any(|f| f.index == i + 1) {
        return None;
    }

    let mut merged = points.to_vec();
    merged.remove(i);
    let refixed = reindex_fixed_segments(&merged, fixed)?;
    if refixed.iter().any(|f| !is_interior(f.index, merged.len())) {
        return None;
    }
    Some((merged, refixed))
}

/// Re-project fixed segments when the owning arrow's box changes from
/// `old_rect` to `new_rect` (both unrotated, world space) under `rotation`.
///
/// Segments are local to the box's top-left corner. Each end is taken to
/// world space, unrotated, remapped proportionally, rotated about the new
/// center and brought back to the new local frame. The result is re-snapped
/// so each segment keeps its axis.
pub fn transform_fixed_segments(
    segments: &[FixedSegment],
    old_rect: Rect,
    new_rect: Rect,
    rotation: f64,
) -> Vec<FixedSegment> {
    let old_frame = LocalFrame::for_rect(old_rect, rotation);
    let new_frame = LocalFrame::for_rect(new_rect, rotation);
    let map = |p: Point| {
        let unrotated = rotate_point(old_frame.to_world(p), old_rect.center(), -rotation);
        let remapped = remap_point(unrotated, old_rect, new_rect);
        new_frame.to_local(rotate_point(remapped, new_rect.center(), rotation))
    };

    segments
        .iter()
        .map(|segment| {
            let mut moved = FixedSegment::new(segment.index, map(segment.start), map(segment.end));
            if let Some(axis) = segment.axis() {
                let value = moved.start.across(axis);
                moved.end = moved.end.with_across(axis, value);
            }
            moved
        })
        .collect()
}
