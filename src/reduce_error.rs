//! ReduceError: unified error type for steiner-reduce public APIs.
//!
//! This error type is used throughout the library to provide robust,
//! non-panicking error handling for all public entry points. Note that hitting
//! a search resource limit is *not* an error: limit-bounded checks simply
//! report "not proven removable" (`Ok(false)`). Errors are reserved for
//! malformed inputs and broken preconditions.

use std::fmt::Debug;
use thiserror::Error;

/// Unified error type for reduction-engine operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReduceError {
    /// A node id does not exist in the graph.
    #[error("node `{node}` out of range (graph has {nnodes} nodes)")]
    NodeOutOfRange { node: u32, nnodes: usize },
    /// An arc id does not exist in the graph.
    #[error("arc `{arc}` out of range (graph has {narcs} arcs)")]
    ArcOutOfRange { arc: u32, narcs: usize },
    /// The candidate arc was already eliminated by an earlier reduction.
    #[error("candidate arc `{0}` is already marked deleted")]
    ArcAlreadyDeleted(u32),
    /// The engine only supports the plain Steiner tree variant.
    #[error("unsupported graph variant: {0}")]
    UnsupportedVariant(String),
    /// A graph under construction contains a self-loop.
    #[error("self-loop at node `{0}` (edges must join distinct nodes)")]
    SelfLoop(u32),
    /// An edge endpoint was never declared as a node.
    #[error("edge endpoint `{node}` out of range (graph has {nnodes} nodes)")]
    DanglingEndpoint { node: u32, nnodes: usize },
    /// Edge costs must be finite and non-negative.
    #[error("invalid cost {cost} on edge ({tail}, {head})")]
    InvalidCost { tail: u32, head: u32, cost: String },
    /// The arc index space is limited to `u32`.
    #[error("too many edges: {0} (arc indices must fit in u32)")]
    TooManyEdges(usize),
    /// Extended reduction needs at least one terminal to bound against.
    #[error("graph has no terminals")]
    NoTerminals,
    /// A reduced-cost bundle does not match the graph shape.
    #[error("reduced-cost bundle mismatch: {0}")]
    BundleShape(String),
    /// A reduced-cost bundle carries a non-finite or negative entry.
    #[error("reduced-cost bundle invalid: {0}")]
    BundleValue(String),
    /// An internal consistency check failed (see [`crate::DebugInvariants`]).
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
}
