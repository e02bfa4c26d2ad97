//! Reduced-cost bundle: the dual information a check runs against.
//!
//! Produced by the surrounding solver's relaxation (outside this crate) and
//! passed in read-only. Layout mirrors the graph: one reduced cost per arc,
//! one root distance per node, and per node the three nearest terminals in
//! reduced-cost metric, interleaved as `[3v], [3v+1], [3v+2]` in ascending
//! distance order. Missing entries (fewer than three reachable terminals)
//! carry [`RedCosts::NO_BASE`] and an infinite distance.

use crate::graph::csr::StpGraph;
use crate::graph::id::{ArcId, NodeId};
use crate::reduce_error::ReduceError;

/// Read-only dual data for one reduction round.
#[derive(Clone, Debug)]
pub struct RedCosts {
    root: NodeId,
    redcost: Vec<f64>,
    root_to_node: Vec<f64>,
    term_dist: Vec<f64>,
    term_base: Vec<NodeId>,
    cutoff: f64,
}

impl RedCosts {
    /// Sentinel terminal id for missing nearest-terminal entries.
    pub const NO_BASE: NodeId = NodeId::new(u32::MAX);

    pub fn new(
        root: NodeId,
        redcost: Vec<f64>,
        root_to_node: Vec<f64>,
        term_dist: Vec<f64>,
        term_base: Vec<NodeId>,
        cutoff: f64,
    ) -> Self {
        Self {
            root,
            redcost,
            root_to_node,
            term_dist,
            term_base,
            cutoff,
        }
    }

    /// Check shapes and value ranges against `g`.
    ///
    /// Verifies array lengths, non-negative finite reduced costs, ascending
    /// nearest-terminal distances, and agreement between the base sentinel
    /// and an infinite distance.
    pub fn validate(&self, g: &StpGraph) -> Result<(), ReduceError> {
        g.check_node(self.root)?;
        if self.redcost.len() != g.narcs() {
            return Err(ReduceError::BundleShape(format!(
                "{} reduced costs for {} arcs",
                self.redcost.len(),
                g.narcs()
            )));
        }
        if self.root_to_node.len() != g.nnodes() {
            return Err(ReduceError::BundleShape(format!(
                "{} root distances for {} nodes",
                self.root_to_node.len(),
                g.nnodes()
            )));
        }
        if self.term_dist.len() != 3 * g.nnodes() || self.term_base.len() != 3 * g.nnodes() {
            return Err(ReduceError::BundleShape(format!(
                "nearest-terminal arrays must hold 3 entries per node \
                 (got {} dists, {} bases for {} nodes)",
                self.term_dist.len(),
                self.term_base.len(),
                g.nnodes()
            )));
        }
        if !self.cutoff.is_finite() || self.cutoff < 0.0 {
            return Err(ReduceError::BundleValue(format!(
                "cutoff {} must be finite and non-negative",
                self.cutoff
            )));
        }
        for (i, &c) in self.redcost.iter().enumerate() {
            if !c.is_finite() || c < 0.0 {
                return Err(ReduceError::BundleValue(format!(
                    "reduced cost {c} on arc {i}"
                )));
            }
        }
        for (i, &d) in self.root_to_node.iter().enumerate() {
            if d.is_nan() || d < 0.0 {
                return Err(ReduceError::BundleValue(format!(
                    "root distance {d} at node {i}"
                )));
            }
        }
        for v in 0..g.nnodes() {
            let dists = &self.term_dist[3 * v..3 * v + 3];
            let bases = &self.term_base[3 * v..3 * v + 3];
            if dists.windows(2).any(|w| w[0] > w[1]) {
                return Err(ReduceError::BundleValue(format!(
                    "nearest-terminal distances of node {v} not ascending"
                )));
            }
            for k in 0..3 {
                let missing = bases[k] == Self::NO_BASE;
                if dists[k].is_nan() || dists[k] < 0.0 {
                    return Err(ReduceError::BundleValue(format!(
                        "terminal distance {} at node {v}",
                        dists[k]
                    )));
                }
                if missing != dists[k].is_infinite() {
                    return Err(ReduceError::BundleValue(format!(
                        "node {v}: missing-terminal sentinel and distance disagree \
                         (base {}, dist {})",
                        bases[k], dists[k]
                    )));
                }
                if !missing {
                    g.check_node(bases[k])?;
                }
            }
        }
        Ok(())
    }

    /// Root of the reduced-cost arborescence.
    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Prune threshold: upper bound minus dual bound.
    #[inline]
    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    /// Reduced cost of an arc.
    #[inline]
    pub fn arc(&self, a: ArcId) -> f64 {
        self.redcost[a.index()]
    }

    /// Reduced-cost distance from the root to `v`.
    #[inline]
    pub fn root_dist(&self, v: NodeId) -> f64 {
        self.root_to_node[v.index()]
    }

    /// The three nearest-terminal distances of `v`, ascending.
    #[inline]
    pub fn term_dists(&self, v: NodeId) -> &[f64] {
        &self.term_dist[3 * v.index()..3 * v.index() + 3]
    }

    /// The three nearest-terminal ids of `v` ([`RedCosts::NO_BASE`] when
    /// missing), matching [`RedCosts::term_dists`] entry for entry.
    #[inline]
    pub fn term_bases(&self, v: NodeId) -> &[NodeId] {
        &self.term_base[3 * v.index()..3 * v.index() + 3]
    }

    /// Nearest terminal of `v` with its distance.
    #[inline]
    pub fn nearest_term(&self, v: NodeId) -> (NodeId, f64) {
        (self.term_base[3 * v.index()], self.term_dist[3 * v.index()])
    }

    /// Distance of `v` to its nearest terminal other than `skip`: the second
    /// entry if `skip` is the nearest, the first otherwise.
    pub fn nearest_term_avoiding(&self, v: NodeId, skip: NodeId) -> f64 {
        let base = 3 * v.index();
        if self.term_base[base] == skip {
            self.term_dist[base + 1]
        } else {
            self.term_dist[base]
        }
    }
}
