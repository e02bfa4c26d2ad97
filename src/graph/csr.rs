//! Frozen CSR (Compressed Sparse Row) representation of a Steiner problem graph.
//!
//! Immutable, cache-friendly adjacency structure with deterministic iteration
//! order. Arcs are stored in antiparallel pairs (`2k` forward, `2k+1` reverse),
//! so [`ArcId::flip`] and [`ArcId::edge`] are pure bit operations. Out-arc
//! lists per node are sorted by head, and global iteration is deterministic.
//! Built once via [`StpGraphBuilder`] and read-only afterwards; mutable
//! reduction state (deleted arcs, changed costs) lives in overlay structures.

use once_cell::sync::OnceCell;

use crate::debug_invariants::DebugInvariants;
use crate::graph::id::{ArcId, NodeId};
use crate::reduce_error::ReduceError;

/// Problem flavor a graph was built for.
///
/// The reduction engine only operates on plain Steiner tree instances;
/// prize-collecting variants carry node weights that the bounds here do not
/// account for, so [`StpGraphBuilder::build`] rejects them.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum GraphVariant {
    /// Classic Steiner tree in graphs: terminals must be spanned, edge costs only.
    SteinerTree,
    /// Prize-collecting / maximum-weight variants (not supported).
    PrizeCollecting,
}

/// Hard cap on the number of undirected edges so that arc ids (`2 * nedges`)
/// stay representable as `u32` with room for sentinel values.
pub const MAX_EDGES: usize = (u32::MAX / 2 - 1) as usize;

/// Immutable Steiner graph in CSR form.
///
/// Node ids index dense arrays `0..nnodes`; arc ids index dense arrays
/// `0..2*nedges`. The two arcs of edge `k` are `2k` (as inserted) and `2k+1`
/// (its reverse), sharing one cost.
#[derive(Clone, Debug)]
pub struct StpGraph {
    variant: GraphVariant,
    nnodes: usize,

    /// Per-arc tails, heads and costs; `cost[2k] == cost[2k+1]`.
    tail: Vec<NodeId>,
    head: Vec<NodeId>,
    cost: Vec<f64>,

    /// CSR arrays: out-arc ids of node `v` live in
    /// `out_arcs[out_offsets[v]..out_offsets[v + 1]]`, sorted by head id.
    out_offsets: Vec<u32>,
    out_arcs: Vec<ArcId>,

    term: Vec<bool>,
    grad: Vec<u32>,

    /// Lazily materialized, ascending terminal list.
    terminals: OnceCell<Vec<NodeId>>,
}

impl StpGraph {
    #[inline]
    pub fn variant(&self) -> GraphVariant {
        self.variant
    }

    #[inline]
    pub fn nnodes(&self) -> usize {
        self.nnodes
    }

    #[inline]
    pub fn nedges(&self) -> usize {
        self.cost.len() / 2
    }

    #[inline]
    pub fn narcs(&self) -> usize {
        self.cost.len()
    }

    /// Tail (source) of an arc.
    #[inline]
    pub fn tail(&self, a: ArcId) -> NodeId {
        self.tail[a.index()]
    }

    /// Head (target) of an arc.
    #[inline]
    pub fn head(&self, a: ArcId) -> NodeId {
        self.head[a.index()]
    }

    /// Cost of an arc; shared with its antiparallel twin.
    #[inline]
    pub fn cost(&self, a: ArcId) -> f64 {
        self.cost[a.index()]
    }

    #[inline]
    pub fn is_term(&self, v: NodeId) -> bool {
        self.term[v.index()]
    }

    /// Degree of `v` in the underlying undirected graph.
    #[inline]
    pub fn grad(&self, v: NodeId) -> u32 {
        self.grad[v.index()]
    }

    /// Out-arcs of `v`, sorted by head id.
    #[inline]
    pub fn out_arcs(&self, v: NodeId) -> &[ArcId] {
        let lo = self.out_offsets[v.index()] as usize;
        let hi = self.out_offsets[v.index() + 1] as usize;
        &self.out_arcs[lo..hi]
    }

    /// Deterministic `(arc, head, cost)` walk of the out-star of `v`.
    #[inline]
    pub fn outgoing(&self, v: NodeId) -> impl Iterator<Item = (ArcId, NodeId, f64)> + '_ {
        self.out_arcs(v)
            .iter()
            .map(move |&a| (a, self.head(a), self.cost(a)))
    }

    /// All node ids, ascending.
    #[inline]
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + 'static {
        (0..self.nnodes as u32).map(NodeId::new)
    }

    /// Ascending terminal list, computed on first use.
    pub fn terminals(&self) -> &[NodeId] {
        self.terminals.get_or_init(|| {
            (0..self.nnodes as u32)
                .map(NodeId::new)
                .filter(|&v| self.term[v.index()])
                .collect()
        })
    }

    pub fn nterms(&self) -> usize {
        self.terminals().len()
    }

    /// Bounds-check a node id against this graph.
    #[inline]
    pub fn check_node(&self, v: NodeId) -> Result<(), ReduceError> {
        if v.index() < self.nnodes {
            Ok(())
        } else {
            Err(ReduceError::NodeOutOfRange {
                node: v.get(),
                nnodes: self.nnodes,
            })
        }
    }

    /// Bounds-check an arc id against this graph.
    #[inline]
    pub fn check_arc(&self, a: ArcId) -> Result<(), ReduceError> {
        if a.index() < self.narcs() {
            Ok(())
        } else {
            Err(ReduceError::ArcOutOfRange {
                arc: a.get(),
                narcs: self.narcs(),
            })
        }
    }
}

impl DebugInvariants for StpGraph {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "StpGraph invalid");
    }

    fn validate_invariants(&self) -> Result<(), ReduceError> {
        let n = self.nnodes;
        let m = self.narcs();
        if self.tail.len() != m || self.head.len() != m {
            return Err(ReduceError::InvariantViolation(
                "arc arrays out of sync".into(),
            ));
        }
        if self.out_offsets.len() != n + 1 || self.out_offsets[n] as usize != m {
            return Err(ReduceError::InvariantViolation(
                "CSR offsets inconsistent with arc count".into(),
            ));
        }
        for w in self.out_offsets.windows(2) {
            if w[0] > w[1] {
                return Err(ReduceError::InvariantViolation(
                    "CSR offsets not monotone".into(),
                ));
            }
        }
        for e in 0..self.nedges() {
            let (f, r) = (ArcId::new(2 * e as u32), ArcId::new(2 * e as u32 + 1));
            if self.tail(f) != self.head(r)
                || self.head(f) != self.tail(r)
                || self.cost(f) != self.cost(r)
            {
                return Err(ReduceError::InvariantViolation(format!(
                    "edge {e} arcs are not antiparallel twins"
                )));
            }
        }
        for v in self.nodes() {
            if self.out_arcs(v).len() as u32 != self.grad(v) {
                return Err(ReduceError::InvariantViolation(format!(
                    "degree of {v} disagrees with its out-star"
                )));
            }
            for &a in self.out_arcs(v) {
                if self.tail(a) != v {
                    return Err(ReduceError::InvariantViolation(format!(
                        "arc {a} filed under wrong tail"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Incremental builder for [`StpGraph`].
///
/// Nodes are added first (implicitly via [`StpGraphBuilder::add_nodes`]),
/// then edges; [`StpGraphBuilder::build`] freezes everything into CSR form.
/// Endpoint, cost and size validation happens eagerly so errors point at the
/// offending insertion.
#[derive(Clone, Debug)]
pub struct StpGraphBuilder {
    variant: GraphVariant,
    nnodes: usize,
    term: Vec<bool>,
    /// One entry per inserted edge: `(u, v, cost)`.
    edges: Vec<(NodeId, NodeId, f64)>,
}

impl StpGraphBuilder {
    pub fn new(variant: GraphVariant) -> Self {
        Self {
            variant,
            nnodes: 0,
            term: Vec::new(),
            edges: Vec::new(),
        }
    }

    /// Append `n` fresh non-terminal nodes; returns the id of the first one.
    pub fn add_nodes(&mut self, n: usize) -> NodeId {
        let first = NodeId::new(self.nnodes as u32);
        self.nnodes += n;
        self.term.resize(self.nnodes, false);
        first
    }

    /// Mark an existing node as terminal.
    pub fn set_terminal(&mut self, v: NodeId) -> Result<(), ReduceError> {
        if v.index() >= self.nnodes {
            return Err(ReduceError::NodeOutOfRange {
                node: v.get(),
                nnodes: self.nnodes,
            });
        }
        self.term[v.index()] = true;
        Ok(())
    }

    /// Insert the undirected edge `{u, v}` with the given cost.
    ///
    /// Returns the edge index (arc ids are `2*idx` for `u -> v` and
    /// `2*idx + 1` for `v -> u`).
    pub fn add_edge(&mut self, u: NodeId, v: NodeId, cost: f64) -> Result<usize, ReduceError> {
        for &w in &[u, v] {
            if w.index() >= self.nnodes {
                return Err(ReduceError::DanglingEndpoint {
                    node: w.get(),
                    nnodes: self.nnodes,
                });
            }
        }
        if u == v {
            return Err(ReduceError::SelfLoop(u.get()));
        }
        if !cost.is_finite() || cost < 0.0 {
            return Err(ReduceError::InvalidCost {
                tail: u.get(),
                head: v.get(),
                cost: format!("{cost}"),
            });
        }
        if self.edges.len() >= MAX_EDGES {
            return Err(ReduceError::TooManyEdges(self.edges.len() + 1));
        }
        self.edges.push((u, v, cost));
        Ok(self.edges.len() - 1)
    }

    /// Freeze into an immutable [`StpGraph`].
    pub fn build(self) -> Result<StpGraph, ReduceError> {
        if self.variant != GraphVariant::SteinerTree {
            return Err(ReduceError::UnsupportedVariant(format!("{:?}", self.variant)));
        }
        if !self.term.iter().any(|&t| t) {
            return Err(ReduceError::NoTerminals);
        }

        let n = self.nnodes;
        let m = 2 * self.edges.len();

        let mut tail = Vec::with_capacity(m);
        let mut head = Vec::with_capacity(m);
        let mut cost = Vec::with_capacity(m);
        for &(u, v, c) in &self.edges {
            tail.push(u);
            head.push(v);
            cost.push(c);
            tail.push(v);
            head.push(u);
            cost.push(c);
        }

        // degree counts, then prefix sums
        let mut grad = vec![0u32; n];
        for &t in &tail {
            grad[t.index()] += 1;
        }
        let mut out_offsets = vec![0u32; n + 1];
        for v in 0..n {
            out_offsets[v + 1] = out_offsets[v] + grad[v];
        }

        // populate out-stars, then sort each by head for deterministic walks
        let mut out_arcs = vec![ArcId::new(0); m];
        let mut write = out_offsets.clone();
        for a in 0..m {
            let t = tail[a].index();
            out_arcs[write[t] as usize] = ArcId::new(a as u32);
            write[t] += 1;
        }
        for v in 0..n {
            let lo = out_offsets[v] as usize;
            let hi = out_offsets[v + 1] as usize;
            out_arcs[lo..hi].sort_unstable_by_key(|a| (head[a.index()], a.get()));
        }

        let g = StpGraph {
            variant: self.variant,
            nnodes: n,
            tail,
            head,
            cost,
            out_offsets,
            out_arcs,
            term: self.term,
            grad,
            terminals: OnceCell::new(),
        };
        g.debug_assert_invariants();
        Ok(g)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny() -> StpGraph {
        // triangle 0-1-2 plus pendant 3 off node 2
        let mut b = StpGraphBuilder::new(GraphVariant::SteinerTree);
        b.add_nodes(4);
        b.set_terminal(NodeId::new(0)).unwrap();
        b.set_terminal(NodeId::new(3)).unwrap();
        b.add_edge(NodeId::new(0), NodeId::new(1), 1.0).unwrap();
        b.add_edge(NodeId::new(1), NodeId::new(2), 2.0).unwrap();
        b.add_edge(NodeId::new(0), NodeId::new(2), 2.5).unwrap();
        b.add_edge(NodeId::new(2), NodeId::new(3), 0.5).unwrap();
        b.build().unwrap()
    }

    #[test]
    fn build_and_query() {
        let g = tiny();
        assert_eq!(g.nnodes(), 4);
        assert_eq!(g.nedges(), 4);
        assert_eq!(g.narcs(), 8);
        assert_eq!(g.grad(NodeId::new(2)), 3);
        assert_eq!(g.terminals(), &[NodeId::new(0), NodeId::new(3)]);
        assert!(g.is_term(NodeId::new(3)));
        assert!(!g.is_term(NodeId::new(1)));
    }

    #[test]
    fn arc_pairing_is_flip() {
        let g = tiny();
        for e in 0..g.nedges() {
            let f = ArcId::new(2 * e as u32);
            assert_eq!(g.tail(f), g.head(f.flip()));
            assert_eq!(g.head(f), g.tail(f.flip()));
            assert_eq!(g.cost(f), g.cost(f.flip()));
        }
    }

    #[test]
    fn out_stars_sorted_by_head() {
        let g = tiny();
        for v in g.nodes() {
            let heads: Vec<_> = g.out_arcs(v).iter().map(|&a| g.head(a)).collect();
            let mut sorted = heads.clone();
            sorted.sort();
            assert_eq!(heads, sorted);
            for &a in g.out_arcs(v) {
                assert_eq!(g.tail(a), v);
            }
        }
    }

    #[test]
    fn builder_rejects_bad_input() {
        let mut b = StpGraphBuilder::new(GraphVariant::SteinerTree);
        b.add_nodes(2);
        assert_eq!(
            b.add_edge(NodeId::new(0), NodeId::new(0), 1.0),
            Err(ReduceError::SelfLoop(0))
        );
        assert!(matches!(
            b.add_edge(NodeId::new(0), NodeId::new(7), 1.0),
            Err(ReduceError::DanglingEndpoint { node: 7, .. })
        ));
        assert!(matches!(
            b.add_edge(NodeId::new(0), NodeId::new(1), f64::NAN),
            Err(ReduceError::InvalidCost { .. })
        ));
        assert!(matches!(
            b.add_edge(NodeId::new(0), NodeId::new(1), -1.0),
            Err(ReduceError::InvalidCost { .. })
        ));
        // still no terminal set
        b.add_edge(NodeId::new(0), NodeId::new(1), 1.0).unwrap();
        assert_eq!(b.build().unwrap_err(), ReduceError::NoTerminals);
    }

    #[test]
    fn builder_rejects_prize_collecting() {
        let mut b = StpGraphBuilder::new(GraphVariant::PrizeCollecting);
        b.add_nodes(2);
        b.set_terminal(NodeId::new(0)).unwrap();
        b.add_edge(NodeId::new(0), NodeId::new(1), 1.0).unwrap();
        assert!(matches!(
            b.build(),
            Err(ReduceError::UnsupportedVariant(_))
        ));
    }

    #[test]
    fn invariants_hold_on_built_graph() {
        let g = tiny();
        assert!(g.validate_invariants().is_ok());
    }
}
