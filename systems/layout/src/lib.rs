#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Procedural layout generation for Tower Siege matches.
//!
//! [`SpatialSampler`] produces minimum-separation point sets and
//! [`LayoutPlanner`] turns them into a [`tower_siege_core::MatchLayout`],
//! placing obstacles first and towers second. Running short of room is never
//! fatal: the planner relaxes the separation, places what fits, and records a
//! [`LayoutWarning`] alongside the layout.

mod planner;
mod sampler;

pub use planner::{EntityKind, LayoutPlan, LayoutPlanner, LayoutWarning};
pub use sampler::{SpatialSampler, DEFAULT_ATTEMPTS};
