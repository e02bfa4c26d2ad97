//! Special-distance oracle over bounded close-node lists.
//!
//! [`DistOracle`] answers `sd(u, v)` queries: an upper bound on the cheapest
//! u-v connection, taken from `u`'s and `v`'s close-node lists (direct hit in
//! either direction, or the best sum through a common intermediate). Lists
//! are built by bounded Dijkstra, at most [`CloseNodeLists::max_close`]
//! settled nodes per source, and the shortest-path tree arcs of every list
//! are registered so that a later arc deletion can *lazily* invalidate
//! exactly the sources whose stored paths used it. A dirty source is rebuilt
//! on its next query, bumping its recompute generation; consistency is
//! amortized, never eager.

use hashbrown::HashMap as FastMap;

use crate::debug_invariants::DebugInvariants;
use crate::dist::close_nodes::CloseNodeLists;
use crate::dist::heap::NodeHeap;
use crate::graph::csr::StpGraph;
use crate::graph::deleted::DeletedArcs;
use crate::graph::id::{ArcId, NodeId};
use crate::reduce_error::ReduceError;

/// Close-node state plus reusable Dijkstra scratch.
///
/// Long-lived: built once per reduction round and shared (mutably, one check
/// at a time) by all extension checks of that round.
#[derive(Clone, Debug)]
pub struct DistOracle {
    lists: CloseNodeLists,
    /// Edge index → sources whose close-node paths run over that edge,
    /// tagged with the source generation at registration time. Entries with
    /// an outdated generation are ignored when the edge fires. Iteration
    /// order of this map never influences results.
    path_roots: FastMap<u32, Vec<(NodeId, u32)>>,

    // -- Dijkstra scratch, version-stamped --
    heap: NodeHeap,
    dist: Vec<f64>,
    pred: Vec<ArcId>,
    stamp: Vec<u32>,
    round: u32,
    settled: Vec<(NodeId, f64)>,
    tree_edges: Vec<u32>,
}

impl DistOracle {
    /// Build close-node lists for every node of `g`, skipping deleted arcs.
    pub fn build(g: &StpGraph, deleted: Option<&DeletedArcs>, max_close: usize) -> Self {
        let n = g.nnodes();
        let mut oracle = Self {
            lists: CloseNodeLists::new(n, max_close),
            path_roots: FastMap::new(),
            heap: NodeHeap::new(n),
            dist: vec![f64::INFINITY; n],
            pred: vec![ArcId::new(0); n],
            stamp: vec![0; n],
            round: 0,
            settled: Vec::with_capacity(max_close),
            tree_edges: Vec::new(),
        };
        for v in g.nodes() {
            oracle.rebuild_source(g, deleted, v);
        }
        oracle
    }

    /// Special distance between `u` and `v`: the cheapest witnessed
    /// connection, or `f64::INFINITY` when neither list knows one.
    ///
    /// Dirty sources are rebuilt before answering.
    pub fn sd(
        &mut self,
        g: &StpGraph,
        deleted: Option<&DeletedArcs>,
        u: NodeId,
        v: NodeId,
    ) -> f64 {
        if u == v {
            return 0.0;
        }
        self.refresh(g, deleted, u);
        self.refresh(g, deleted, v);
        let mut best = self.lists.common_min(u, v);
        if let Some(d) = self.lists.direct(u, v) {
            best = best.min(d);
        }
        if let Some(d) = self.lists.direct(v, u) {
            best = best.min(d);
        }
        best
    }

    /// An arc was deleted elsewhere: dirty every source whose stored paths
    /// used its edge. No recomputation happens here.
    pub fn notify_arc_deleted(&mut self, a: ArcId) {
        if let Some(regs) = self.path_roots.remove(&(a.edge() as u32)) {
            for (s, generation) in regs {
                if generation == self.lists.generation(s) {
                    self.lists.mark_dirty(s);
                }
            }
        }
    }

    #[inline]
    pub fn is_dirty(&self, v: NodeId) -> bool {
        self.lists.is_dirty(v)
    }

    /// How many times `v`'s list has been (re)built.
    #[inline]
    pub fn recomputations(&self, v: NodeId) -> u32 {
        self.lists.generation(v)
    }

    #[inline]
    pub fn close_nodes(&self, v: NodeId) -> (&[NodeId], &[f64]) {
        self.lists.list(v)
    }

    fn refresh(&mut self, g: &StpGraph, deleted: Option<&DeletedArcs>, v: NodeId) {
        if self.lists.is_dirty(v) {
            self.rebuild_source(g, deleted, v);
        }
    }

    /// Bounded Dijkstra from `s`; overwrites its close-node list and
    /// registers the new shortest-path tree edges.
    fn rebuild_source(&mut self, g: &StpGraph, deleted: Option<&DeletedArcs>, s: NodeId) {
        self.next_round();
        self.heap.reset();
        self.settled.clear();
        self.tree_edges.clear();

        self.stamp[s.index()] = self.round;
        self.dist[s.index()] = 0.0;
        self.heap.push_or_decrease(s, 0.0);

        let max_close = self.lists.max_close();
        while let Some((v, d)) = self.heap.pop() {
            if v != s {
                self.settled.push((v, d));
                if self.settled.len() == max_close {
                    break;
                }
            }
            for (a, w, c) in g.outgoing(v) {
                if deleted.is_some_and(|del| del.is_deleted(a)) {
                    continue;
                }
                let nd = d + c;
                let wi = w.index();
                if self.stamp[wi] != self.round {
                    self.stamp[wi] = self.round;
                    self.dist[wi] = nd;
                    self.pred[wi] = a;
                    self.heap.push_or_decrease(w, nd);
                } else if nd < self.dist[wi] {
                    self.dist[wi] = nd;
                    self.pred[wi] = a;
                    self.heap.push_or_decrease(w, nd);
                }
            }
        }

        log::trace!(
            "close nodes of {s}: {} entries (generation {})",
            self.settled.len(),
            self.lists.generation(s) + 1
        );

        self.settled.sort_unstable_by_key(|&(v, _)| v);
        // local borrow dance: set_list wants the entries by slice
        let mut entries = std::mem::take(&mut self.settled);
        self.lists.set_list(s, &entries);
        let generation = self.lists.mark_rebuilt(s);

        // register the path tree so deletions can dirty this source
        for &(t, _) in &entries {
            let mut v = t;
            while v != s {
                let a = self.pred[v.index()];
                self.tree_edges.push(a.edge() as u32);
                v = g.tail(a);
            }
        }
        self.tree_edges.sort_unstable();
        self.tree_edges.dedup();
        for &e in &self.tree_edges {
            self.path_roots.entry(e).or_default().push((s, generation));
        }

        entries.clear();
        self.settled = entries;
    }

    fn next_round(&mut self) {
        if self.round == u32::MAX {
            self.stamp.fill(0);
            self.round = 0;
        }
        self.round += 1;
    }
}

impl DebugInvariants for DistOracle {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "DistOracle invalid");
    }

    fn validate_invariants(&self) -> Result<(), ReduceError> {
        for raw in 0..self.lists.nnodes() as u32 {
            let v = NodeId::new(raw);
            let (nodes, dists) = self.lists.list(v);
            if !nodes.windows(2).all(|w| w[0] < w[1]) {
                return Err(ReduceError::InvariantViolation(format!(
                    "close-node list of {v} not strictly sorted"
                )));
            }
            if nodes.contains(&v) {
                return Err(ReduceError::InvariantViolation(format!(
                    "close-node list of {v} contains itself"
                )));
            }
            if dists.iter().any(|d| !d.is_finite() || *d < 0.0) {
                return Err(ReduceError::InvariantViolation(format!(
                    "close-node list of {v} has an invalid distance"
                )));
            }
        }
        Ok(())
    }
}
