#![cfg_attr(docsrs, feature(doc_cfg))]
//! # steiner-reduce
//!
//! steiner-reduce is the extended-reduction core of a Steiner-tree solver: given a graph,
//! dual information from a relaxation (reduced costs, distances, a cutoff), it proves that
//! individual arcs, edges, or nodes cannot occur in any optimal solution. Verdicts are pure
//! booleans; the surrounding reduction driver owns the actual graph surgery.
//!
//! ## Features
//! - Bounded backtracking DFS over partial extension trees with an explicit component stack
//! - Two independent lower bounds per tree: a reduced-cost bound against the cutoff and an
//!   MST/special-distance bottleneck bound
//! - Depth-tied distance caches and a lazily-refreshed close-node distance oracle
//! - Pseudo-ancestor conflict tracking so stacked reduction techniques never double-count
//! - Optional rayon-parallel batch checking over independent candidates
//!
//! ## Determinism
//!
//! Checks are deterministic: verdicts depend only on the graph, the reduced-cost bundle and
//! the configured caps, never on iteration order of internal hash maps or on the worker
//! count of a parallel batch.
//!
//! ## Usage
//! Add `steiner-reduce` as a dependency in your `Cargo.toml` and enable features as needed:
//!
//! ```toml
//! [dependencies]
//! steiner-reduce = "0.3"
//! # Optional features:
//! # features = ["parallel","check-invariants"]
//! ```
//!
//! A check needs a frozen [`StpGraph`](graph::StpGraph), a validated
//! [`RedCosts`](redcost::RedCosts) bundle, and the long-lived buffers built once per
//! reduction round ([`ExtPermanent`](ext::ExtPermanent), [`DistOracle`](dist::DistOracle)).
//! Wire them into a [`ReductionContext`](ext::ReductionContext) and call
//! [`ext::check_arc`], [`ext::check_edge`] or [`ext::check_node`].

pub mod debug_invariants;
pub mod dist;
pub mod ext;
pub mod fp;
pub mod graph;
pub mod mst;
pub mod redcost;
pub mod reduce_error;

pub use debug_invariants::DebugInvariants;
pub use reduce_error::ReduceError;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::debug_invariants::DebugInvariants;
    pub use crate::dist::DistOracle;
    #[cfg(feature = "parallel")]
    pub use crate::ext::check_edges_parallel;
    pub use crate::ext::{
        ExtConfig, ExtPermanent, ReductionContext, check_arc, check_edge, check_node,
    };
    pub use crate::graph::{
        ArcId, DeletedArcs, GraphVariant, NodeId, PseudoAncestors, StpGraph, StpGraphBuilder,
    };
    pub use crate::redcost::RedCosts;
    pub use crate::reduce_error::ReduceError;
}
