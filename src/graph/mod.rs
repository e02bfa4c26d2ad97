//! Graph surface consumed by the reduction engine.
//!
//! The engine never mutates a graph. It reads a frozen CSR view
//! ([`StpGraph`]), consults a deletion overlay ([`DeletedArcs`]) maintained by
//! the surrounding reduction driver, and tracks elimination witnesses through
//! [`PseudoAncestors`].

pub mod csr;
pub mod deleted;
pub mod id;
pub mod pseudo_ancestors;

pub use csr::{GraphVariant, StpGraph, StpGraphBuilder};
pub use deleted::DeletedArcs;
pub use id::{ArcId, NodeId};
pub use pseudo_ancestors::{AncestorMarks, PseudoAncestors};
