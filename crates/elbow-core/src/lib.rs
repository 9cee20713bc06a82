pub mod config;
pub mod endpoint;
pub mod finalize;
pub mod geometry;
pub mod grid;
pub mod id;
pub mod layout;
pub mod model;
pub mod route;
pub mod transform;

pub use config::{RouteConfig, RouteStrategy};
pub use endpoint::{Endpoint, ResolvedEndpoint, resolve_binding, resolve_endpoints};
pub use geometry::{DEDUP_THRESHOLD, INTERSECTION_EPSILON, simplify_path};
pub use id::ElementId;
pub use layout::{ObstacleLayout, build_obstacle_layout};
pub use model::*;
pub use route::{route, route_resolved, validate_path};
pub use transform::LocalFrame;
