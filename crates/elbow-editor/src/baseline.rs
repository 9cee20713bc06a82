//! A fresh route between the current ends, used as a template when the
//! edited path can no longer be repaired locally.

use crate::context::{ArrowEnd, EditContext};
use crate::fixed::FixedSegment;
use elbow_core::config::RouteConfig;
use elbow_core::geometry::segment_axis;
use elbow_core::model::Point;
use elbow_core::route::route_resolved;

#[derive(Debug, Clone, PartialEq)]
pub struct Baseline {
    pub points: Vec<Point>,
}

impl Baseline {
    pub fn route(ctx: &EditContext, config: &RouteConfig) -> Self {
        Self {
            points: route_resolved(&ctx.start.resolved, &ctx.end.resolved, config),
        }
    }

    /// Length of the leg touching `end`, never shorter than the configured
    /// minimum stub.
    pub fn stub_length(&self, end: ArrowEnd, config: &RouteConfig) -> f64 {
        let n = self.points.len();
        let leg = match end {
            ArrowEnd::Start => self.points[0].manhattan(self.points[1.min(n - 1)]),
            ArrowEnd::End => self.points[n - 1].manhattan(self.points[n.saturating_sub(2)]),
        };
        leg.max(config.min_stub_length)
    }

    /// Re-project `fixed` onto the baseline, matching each segment to the
    /// nearest baseline segment on the same axis in order.
    ///
    /// The segment at `active` may match at any distance and takes the
    /// baseline's position. Every other segment must lie within `tolerance`
    /// and pulls its baseline segment onto its own lane.
    pub fn remap(
        &self,
        fixed: &[FixedSegment],
        active: Option<usize>,
        tolerance: f64,
    ) -> Option<(Vec<Point>, Vec<FixedSegment>)> {
        let mut points = self.points.clone();
        let n = points.len();
        let mut floor = 2;
        let mut indices = Vec::with_capacity(fixed.len());

        for (k, segment) in fixed.iter().enumerate() {
            let axis = segment.axis()?;
            let value = segment.axis_value();
            let is_active = active == Some(k);
            let (i, _) = (floor..n.saturating_sub(1))
                .filter(|&i| segment_axis(points[i - 1], points[i]) == Some(axis))
                .map(|i| (i, (points[i].across(axis) - value).abs()))
                .filter(|(_, diff)| is_active || *diff <= tolerance)
                .min_by(|a, b| a.1.total_cmp(&b.1))?;
            if !is_active {
                points[i - 1] = points[i - 1].with_across(axis, value);
                points[i] = points[i].with_across(axis, value);
            }
            indices.push(i);
            floor = i + 1;
        }

        let remapped = indices
            .into_iter()
            .map(|i| FixedSegment::new(i, points[i - 1], points[i]))
            .collect();
        Some((points, remapped))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn baseline() -> Baseline {
        Baseline {
            points: vec![
                Point::new(0.0, 0.0),
                Point::new(40.0, 0.0),
                Point::new(40.0, 100.0),
                Point::new(200.0, 100.0),
                Point::new(200.0, 150.0),
            ],
        }
    }

    #[test]
    fn nearby_segment_pulls_baseline_onto_its_lane() {
        let fixed = [FixedSegment::new(2, Point::new(60.0, 10.0), Point::new(60.0, 90.0))];
        let (points, remapped) = baseline().remap(&fixed, None, 40.0).unwrap();
        assert_eq!(points[1], Point::new(60.0, 0.0));
        assert_eq!(points[2], Point::new(60.0, 100.0));
        assert_eq!(remapped[0].index, 2);
    }

    #[test]
    fn distant_segment_only_matches_when_active() {
        let fixed = [FixedSegment::new(2, Point::new(140.0, 10.0), Point::new(140.0, 90.0))];
        assert!(baseline().remap(&fixed, None, 40.0).is_none());

        let (points, remapped) = baseline().remap(&fixed, Some(0), 40.0).unwrap();
        assert_eq!(points, baseline().points);
        assert_eq!(remapped[0].axis_value(), 40.0);
    }

    #[test]
    fn stub_length_is_floored() {
        let config = RouteConfig::default();
        assert_eq!(baseline().stub_length(ArrowEnd::Start, &config), 40.0);
        assert_eq!(baseline().stub_length(ArrowEnd::End, &config), 50.0);
        let short = Baseline {
            points: vec![Point::new(0.0, 0.0), Point::new(5.0, 0.0)],
        };
        assert_eq!(short.stub_length(ArrowEnd::Start, &config), config.min_stub_length);
    }
}
