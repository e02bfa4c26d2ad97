//! Search limits and numerics for extension checks.

use serde::{Deserialize, Serialize};

use crate::fp::DEFAULT_EPS;

/// Resource caps and tuning knobs for one extension check.
///
/// Every cap is a *truncation* point: hitting it ends the affected branch
/// with "could not prove removable", it never aborts the check or skews a
/// verdict toward removable. Defaults follow the sizes the engine was tuned
/// with; larger values prove more at higher cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtConfig {
    /// Maximum DFS depth (component nesting).
    pub max_depth: usize,
    /// A leaf whose graph degree exceeds this is not extended further.
    pub max_leaf_degree: u32,
    /// Maximum number of edges in the extension tree.
    pub max_tree_edges: usize,
    /// Maximum number of tree leaves (also bounds MST slot counts).
    pub max_tree_leaves: usize,
    /// Capacity of the shared component-stack edge buffer.
    pub max_stack_edges: usize,
    /// Maximum number of stacked components.
    pub max_stack_components: usize,
    /// Close-node list length per source in the distance oracle.
    pub max_close_nodes: usize,
    /// Recompute the tree's accumulated reduced cost every this many merges.
    pub recompute_interval: u32,
    /// Rule out when the reduced-cost bound reaches the cutoff, not only
    /// when it exceeds it. Requires the caller to hold a solution realizing
    /// the cutoff: the verdict then only promises that no strictly better
    /// solution uses the candidate.
    pub prune_on_equality: bool,
    /// Absolute tolerance for all cost comparisons.
    pub eps: f64,
}

impl Default for ExtConfig {
    fn default() -> Self {
        Self {
            max_depth: 6,
            max_leaf_degree: 8,
            max_tree_edges: 500,
            max_tree_leaves: 20,
            max_stack_edges: 5000,
            max_stack_components: 128,
            max_close_nodes: 32,
            recompute_interval: 10,
            prune_on_equality: true,
            eps: DEFAULT_EPS,
        }
    }
}

impl ExtConfig {
    /// Upper bound on MST slot counts (leaves plus one extending node).
    #[inline]
    pub fn max_mst_slots(&self) -> usize {
        self.max_tree_leaves + 1
    }
}
