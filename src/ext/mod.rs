//! Extended reduction: bounded DFS over extension trees with reduced-cost
//! and MST/special-distance bounds.
//!
//! Entry points live in [`check`]; everything else is the machinery behind
//! them. A check borrows shared state through [`ReductionContext`] and runs
//! one [`engine::ExtEngine`] to completion per candidate.

pub mod check;
pub mod config;
pub mod context;
pub mod engine;
pub mod mst_bound;
pub mod redcost_bound;
pub mod stack;
pub mod tree;

#[cfg(feature = "parallel")]
pub use check::check_edges_parallel;
pub use check::{check_arc, check_edge, check_node};
pub use config::ExtConfig;
pub use context::{ExtPermanent, ReductionContext};
pub use engine::{ExtEngine, ExtStats};
pub use stack::{CompStack, CompState};
pub use tree::ExtTree;
