//! Router configuration: clearances, tolerances and search strategy.

/// How the router looks for a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RouteStrategy {
    /// Direct shortcut, then sparse-grid A*, then heuristic fallback.
    #[default]
    Grid,
    /// Skip the grid search entirely. Used to exercise the fallback
    /// generators in isolation.
    FallbackOnly,
}

/// Configuration for [`route`](crate::route::route) and the edit pipeline.
///
/// Defaults match the on-canvas look of Fast Draft connectors; hosts
/// rendering at a different scale should scale every length together.
#[derive(Debug, Clone)]
pub struct RouteConfig {
    /// Upper bound on how far an obstacle may extend beyond its shape, and
    /// the margin around both obstacles that forms the search universe.
    /// Default: **40**.
    pub base_padding: f64,

    /// Clearance on the side a bound path exits/enters. Default: **30**.
    pub head_padding: f64,

    /// Exit clearance when that end carries an arrowhead. Default: **40**.
    pub arrowhead_head_padding: f64,

    /// Clearance on the three other sides of a bound shape. Default: **20**.
    pub side_padding: f64,

    /// Half-size of the point squares that replace overlapping shapes.
    /// Default: **2**.
    pub exit_point_padding: f64,

    /// Exit clearance used when the two bound shapes overlap. Default: **10**.
    pub overlap_padding: f64,

    /// Lowest exit spacing harmonization may settle on. Default: **10**.
    pub min_exit_spacing: f64,

    /// Extra minimum exit spacing for ends carrying an arrowhead.
    /// Default: **10**.
    pub arrowhead_exit_spacing: f64,

    /// How far fallback elbows push a midpoint past a bound endpoint.
    /// Default: **20**.
    pub fallback_padding: f64,

    /// Shortest first/last segment the editor keeps at a bound endpoint.
    /// Default: **20**.
    pub min_stub_length: f64,

    /// How far a non-active fixed segment may sit from a baseline segment
    /// and still be re-projected onto it. Default: **40**.
    pub remap_tolerance: f64,

    /// Every returned coordinate is clamped to `±max_coordinate`.
    /// Default: **1e6**.
    pub max_coordinate: f64,

    /// Search strategy. Default: [`RouteStrategy::Grid`].
    pub strategy: RouteStrategy,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            base_padding: 40.0,
            head_padding: 30.0,
            arrowhead_head_padding: 40.0,
            side_padding: 20.0,
            exit_point_padding: 2.0,
            overlap_padding: 10.0,
            min_exit_spacing: 10.0,
            arrowhead_exit_spacing: 10.0,
            fallback_padding: 20.0,
            min_stub_length: 20.0,
            remap_tolerance: 40.0,
            max_coordinate: 1e6,
            strategy: RouteStrategy::Grid,
        }
    }
}

impl RouteConfig {
    /// Same configuration with the grid search disabled.
    pub fn fallback_only() -> Self {
        Self {
            strategy: RouteStrategy::FallbackOnly,
            ..Self::default()
        }
    }

    /// Exit clearance for a bound end.
    pub fn head_clearance(&self, has_arrowhead: bool) -> f64 {
        if has_arrowhead {
            self.arrowhead_head_padding
        } else {
            self.head_padding
        }
    }

    /// Minimum exit spacing for an end.
    pub fn min_spacing(&self, has_arrowhead: bool) -> f64 {
        if has_arrowhead {
            self.min_exit_spacing + self.arrowhead_exit_spacing
        } else {
            self.min_exit_spacing
        }
    }
}
