pub mod arrow;
pub mod baseline;
pub mod context;
pub mod drag;
pub mod edit;
pub mod fixed;
pub mod lane;
pub mod perpendicular;
pub mod release;
pub mod stubs;

pub use arrow::{ArrowEdit, ArrowUpdates, ElbowArrow};
pub use context::{ArrowEnd, EditContext, EditMode};
pub use edit::{edit, edit_in_place};
pub use fixed::{FixedSegment, sanitize_fixed_segments, transform_fixed_segments};
