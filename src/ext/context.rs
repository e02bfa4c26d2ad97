//! Borrow bundles threaded through every check.
//!
//! All long-lived buffers sit in [`ExtPermanent`] so repeated checks on the
//! same graph reuse their allocations; everything else is borrowed read-only
//! per call. No hidden globals, no interior mutability.

use crate::dist::DistOracle;
use crate::ext::config::ExtConfig;
use crate::graph::csr::StpGraph;
use crate::graph::deleted::DeletedArcs;
use crate::graph::id::NodeId;
use crate::graph::pseudo_ancestors::{AncestorMarks, PseudoAncestors};
use crate::mst::{DynamicMst, MstLevels};
use crate::redcost::RedCosts;
use crate::reduce_error::ReduceError;

/// Long-lived workspace shared by consecutive checks on one graph.
///
/// Every buffer is handed back clean: a check that returns leaves the MST
/// levels empty, the ancestor marks cleared and the scratch vectors empty.
/// [`ExtPermanent::debug_assert_clean`] pins that down at the check
/// boundaries.
#[derive(Clone, Debug)]
pub struct ExtPermanent {
    /// Add-one-node MST workspace.
    pub dyn_mst: DynamicMst,
    /// Per-depth leaf-set MST snapshots.
    pub mst_levels: MstLevels,
    /// Pseudo-ancestor witness marks.
    pub marks: AncestorMarks,
    /// Cached terminal bitmap; avoids graph lookups in the hot loops.
    pub term_mark: Vec<bool>,
    /// Ancestor-chain scratch for tree bottleneck walks.
    pub bneck_path: Vec<NodeId>,
    /// Leaf grouping scratch for the reduced-cost bound: (nearest terminal,
    /// first distance, second distance) per counted leaf.
    pub conn_scratch: Vec<(NodeId, f64, f64)>,
}

impl ExtPermanent {
    pub fn new(g: &StpGraph, ancestors: &PseudoAncestors, cfg: &ExtConfig) -> Self {
        let term_mark = g.nodes().map(|v| g.is_term(v)).collect();
        Self {
            dyn_mst: DynamicMst::new(cfg.max_mst_slots()),
            mst_levels: MstLevels::new(),
            marks: AncestorMarks::new(ancestors.mark_len()),
            term_mark,
            bneck_path: Vec::new(),
            conn_scratch: Vec::new(),
        }
    }

    #[inline]
    pub fn is_term(&self, v: NodeId) -> bool {
        self.term_mark[v.index()]
    }

    pub fn is_clean(&self) -> bool {
        self.dyn_mst.is_clean()
            && self.mst_levels.is_empty()
            && self.marks.is_clean()
            && self.bneck_path.is_empty()
            && self.conn_scratch.is_empty()
    }

    /// Checks begin and end with clean permanent state; anything else is a
    /// programming error in the engine.
    #[inline]
    pub fn debug_assert_clean(&self) {
        debug_assert!(self.is_clean(), "permanent buffers left unclean");
    }
}

/// Everything one check needs, borrowed.
pub struct ReductionContext<'a> {
    pub graph: &'a StpGraph,
    pub redcosts: &'a RedCosts,
    pub deleted: Option<&'a DeletedArcs>,
    pub ancestors: &'a PseudoAncestors,
    pub cfg: &'a ExtConfig,
    pub perm: &'a mut ExtPermanent,
    pub oracle: &'a mut DistOracle,
}

impl<'a> ReductionContext<'a> {
    /// Bundle the borrows after validating that they belong together.
    pub fn new(
        graph: &'a StpGraph,
        redcosts: &'a RedCosts,
        deleted: Option<&'a DeletedArcs>,
        ancestors: &'a PseudoAncestors,
        cfg: &'a ExtConfig,
        perm: &'a mut ExtPermanent,
        oracle: &'a mut DistOracle,
    ) -> Result<Self, ReduceError> {
        redcosts.validate(graph)?;
        if let Some(d) = deleted {
            if d.narcs() != graph.narcs() {
                return Err(ReduceError::BundleShape(format!(
                    "deleted-arc markers cover {} arcs, graph has {}",
                    d.narcs(),
                    graph.narcs()
                )));
            }
        }
        if ancestors.nedges() != graph.nedges() {
            return Err(ReduceError::BundleShape(format!(
                "pseudo-ancestor lists cover {} edges, graph has {}",
                ancestors.nedges(),
                graph.nedges()
            )));
        }
        if perm.term_mark.len() != graph.nnodes() {
            return Err(ReduceError::BundleShape(format!(
                "permanent buffers sized for {} nodes, graph has {}",
                perm.term_mark.len(),
                graph.nnodes()
            )));
        }
        // witnesses may have been added since the buffers were built
        perm.marks.ensure_len(ancestors.mark_len());
        Ok(Self {
            graph,
            redcosts,
            deleted,
            ancestors,
            cfg,
            perm,
            oracle,
        })
    }
}
