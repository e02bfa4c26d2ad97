//! The partial extension tree grown from the arc under test.
//!
//! Arena-indexed: all per-node state lives in parallel arrays keyed by node
//! id, components are merged and removed as edge slices, and the leaf list is
//! maintained in place (root always at index 0). No pointer-linked nodes, no
//! per-step allocation.
//!
//! Degree encoding per node: `0` unused, `1` leaf, `> 1` internal, `-1`
//! forbidden (excluded as an extension target for the whole check).
//!
//! Two cost accumulators run along: the plain graph cost of all tree edges
//! and the reduced cost of those tree edges whose upward (reverse) arc still
//! exists. An edge whose reverse arc is deleted cannot take part in a root
//! swap; it is counted in `ndel_up_arcs` instead of the reduced-cost sum.
//! Floating-point drift in the accumulator is bounded by periodic
//! recomputation from scratch.

use crate::debug_invariants::DebugInvariants;
use crate::graph::csr::StpGraph;
use crate::graph::deleted::DeletedArcs;
use crate::graph::id::{ArcId, NodeId};
use crate::graph::pseudo_ancestors::{AncestorMarks, PseudoAncestors};
use crate::redcost::RedCosts;
use crate::reduce_error::ReduceError;

/// Degree value marking a node as excluded from extension for this check.
pub const DEG_FORBIDDEN: i32 = -1;

/// Partial candidate tree with arena-indexed bookkeeping.
#[derive(Clone, Debug)]
pub struct ExtTree {
    root: NodeId,
    deg: Vec<i32>,
    leaves: Vec<NodeId>,
    edges: Vec<ArcId>,
    /// Arc from the parent into `v`; meaningful while `deg[v] >= 1` and
    /// `v != root`.
    parent_arc: Vec<ArcId>,
    /// Reduced-cost delta of re-rooting the tree at `v` (reversing the
    /// root-to-`v` path); infinite when some arc on it cannot be reversed.
    swap_cost: Vec<f64>,
    tree_cost: f64,
    tree_redcost: f64,
    ndel_up_arcs: u32,
    depth: usize,
}

impl ExtTree {
    /// Empty tree over a graph with `nnodes` nodes.
    pub fn new(nnodes: usize) -> Self {
        Self {
            root: NodeId::new(0),
            deg: vec![0; nnodes],
            leaves: Vec::new(),
            edges: Vec::new(),
            parent_arc: vec![ArcId::new(0); nnodes],
            swap_cost: vec![f64::INFINITY; nnodes],
            tree_cost: 0.0,
            tree_redcost: 0.0,
            ndel_up_arcs: 0,
            depth: 0,
        }
    }

    // --- accessors ---------------------------------------------------------

    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Current leaves; the root sits at index 0 for the whole check.
    #[inline]
    pub fn leaves(&self) -> &[NodeId] {
        &self.leaves
    }

    #[inline]
    pub fn nleaves(&self) -> usize {
        self.leaves.len()
    }

    #[inline]
    pub fn edges(&self) -> &[ArcId] {
        &self.edges
    }

    #[inline]
    pub fn nedges(&self) -> usize {
        self.edges.len()
    }

    /// Component nesting depth (1 after seeding).
    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    #[inline]
    pub fn deg(&self, v: NodeId) -> i32 {
        self.deg[v.index()]
    }

    #[inline]
    pub fn in_tree(&self, v: NodeId) -> bool {
        self.deg[v.index()] >= 1
    }

    #[inline]
    pub fn is_forbidden(&self, v: NodeId) -> bool {
        self.deg[v.index()] == DEG_FORBIDDEN
    }

    /// Accumulated graph cost of all tree edges.
    #[inline]
    pub fn tree_cost(&self) -> f64 {
        self.tree_cost
    }

    /// Accumulated reduced cost of tree edges with a live upward arc.
    #[inline]
    pub fn tree_redcost(&self) -> f64 {
        self.tree_redcost
    }

    /// Tree edges whose upward arc is deleted ("virtually included").
    #[inline]
    pub fn ndel_up_arcs(&self) -> u32 {
        self.ndel_up_arcs
    }

    #[inline]
    pub fn swap_cost(&self, v: NodeId) -> f64 {
        self.swap_cost[v.index()]
    }

    #[inline]
    pub fn parent_arc(&self, v: NodeId) -> ArcId {
        debug_assert!(self.in_tree(v) && v != self.root);
        self.parent_arc[v.index()]
    }

    /// Exclude `v` as an extension target for the rest of this check.
    ///
    /// # Panics
    /// Panics if `v` is already in the tree.
    pub fn set_forbidden(&mut self, v: NodeId) {
        assert!(
            self.deg[v.index()] <= 0,
            "cannot forbid a node already in the tree"
        );
        self.deg[v.index()] = DEG_FORBIDDEN;
    }

    // --- growth and unwinding ---------------------------------------------

    /// Seed the tree with the candidate arc: root at its tail, one edge, two
    /// leaves. Hashes the edge's pseudo-ancestors (a single edge never
    /// conflicts with clean marks).
    ///
    /// # Preconditions
    /// The tree is empty and `marks` are clean.
    pub fn seed(
        &mut self,
        g: &StpGraph,
        rc: &RedCosts,
        deleted: Option<&DeletedArcs>,
        ancestors: &PseudoAncestors,
        marks: &mut AncestorMarks,
        arc: ArcId,
    ) {
        debug_assert!(self.edges.is_empty() && self.depth == 0);
        let (tail, head) = (g.tail(arc), g.head(arc));
        self.root = tail;
        self.deg[tail.index()] = 1;
        self.swap_cost[tail.index()] = 0.0;
        self.leaves.push(tail);

        let hashed = ancestors.hash_edge(arc, marks);
        debug_assert!(hashed, "seed edge conflicts with non-clean marks");
        self.attach(g, rc, deleted, arc, head);
        self.depth = 1;
    }

    /// Merge a component (edge slice) into the tree. Every edge's tail must
    /// be a current tree node and every head a fresh node.
    ///
    /// All edges are hashed against the pseudo-ancestor marks first; on a
    /// witness conflict the hashed prefix is unwound and `false` is returned
    /// with the tree untouched. A conflicting component cannot occur inside
    /// any optimal solution, so the caller treats it as ruled out.
    pub fn add_component(
        &mut self,
        g: &StpGraph,
        rc: &RedCosts,
        deleted: Option<&DeletedArcs>,
        ancestors: &PseudoAncestors,
        marks: &mut AncestorMarks,
        comp: &[ArcId],
    ) -> bool {
        debug_assert!(!comp.is_empty());
        for (i, &a) in comp.iter().enumerate() {
            if !ancestors.hash_edge(a, marks) {
                for &b in comp[..i].iter().rev() {
                    ancestors.unhash_edge(b, marks);
                }
                return false;
            }
        }

        // tails first so extended leaves drop out of the leaf list in order
        for &a in comp {
            let t = g.tail(a);
            debug_assert!(self.deg[t.index()] >= 1, "component tail not in tree");
            self.deg[t.index()] += 1;
        }
        let deg = &self.deg;
        self.leaves.retain(|l| deg[l.index()] == 1);

        for &a in comp {
            let head = g.head(a);
            debug_assert_eq!(self.deg[head.index()], 0, "component head already used");
            self.attach(g, rc, deleted, a, head);
        }
        self.depth += 1;
        true
    }

    /// Exact inverse of [`ExtTree::add_component`] for the most recently
    /// merged component (also unwinds the seed when handed the seed arc).
    pub fn remove_component(
        &mut self,
        g: &StpGraph,
        rc: &RedCosts,
        deleted: Option<&DeletedArcs>,
        ancestors: &PseudoAncestors,
        marks: &mut AncestorMarks,
        comp: &[ArcId],
    ) {
        for &a in comp.iter().rev() {
            let head = g.head(a);
            debug_assert_eq!(self.deg[head.index()], 1, "removing a non-leaf head");
            debug_assert_eq!(self.edges.last(), Some(&a), "components unwind LIFO");
            self.deg[head.index()] = 0;
            self.edges.pop();
            self.tree_cost -= g.cost(a);
            if deleted.is_some_and(|d| d.is_deleted(a.flip())) {
                self.ndel_up_arcs -= 1;
            } else {
                self.tree_redcost -= rc.arc(a);
            }
        }
        for &a in comp {
            let t = g.tail(a);
            self.deg[t.index()] -= 1;
        }
        let deg = &self.deg;
        self.leaves.retain(|l| deg[l.index()] >= 1);
        for &a in comp {
            let t = g.tail(a);
            if self.deg[t.index()] == 1 && !self.leaves.contains(&t) {
                self.leaves.push(t);
            }
        }
        for &a in comp.iter().rev() {
            ancestors.unhash_edge(a, marks);
        }
        self.depth -= 1;
        if self.depth == 0 {
            // seed removed: drop the root remnants
            debug_assert!(self.edges.is_empty());
            self.deg[self.root.index()] = 0;
            self.swap_cost[self.root.index()] = f64::INFINITY;
            self.leaves.clear();
        }
    }

    fn attach(
        &mut self,
        g: &StpGraph,
        rc: &RedCosts,
        deleted: Option<&DeletedArcs>,
        a: ArcId,
        head: NodeId,
    ) {
        let tail = g.tail(a);
        self.deg[head.index()] = 1;
        self.parent_arc[head.index()] = a;
        self.leaves.push(head);
        self.edges.push(a);
        self.tree_cost += g.cost(a);

        let up_deleted = deleted.is_some_and(|d| d.is_deleted(a.flip()));
        if up_deleted {
            self.ndel_up_arcs += 1;
            self.swap_cost[head.index()] = f64::INFINITY;
        } else {
            self.tree_redcost += rc.arc(a);
            self.swap_cost[head.index()] =
                self.swap_cost[tail.index()] + rc.arc(a.flip()) - rc.arc(a);
        }
    }

    // --- derived quantities ------------------------------------------------

    /// Recompute the reduced-cost accumulator from scratch and install it.
    /// Returns the absolute drift that had built up.
    pub fn recompute_redcost(
        &mut self,
        rc: &RedCosts,
        deleted: Option<&DeletedArcs>,
    ) -> f64 {
        let mut sum = 0.0;
        let mut ndel = 0u32;
        for &a in &self.edges {
            if deleted.is_some_and(|d| d.is_deleted(a.flip())) {
                ndel += 1;
            } else {
                sum += rc.arc(a);
            }
        }
        debug_assert_eq!(ndel, self.ndel_up_arcs);
        let drift = (sum - self.tree_redcost).abs();
        self.tree_redcost = sum;
        drift
    }

    /// Maximum elementary-subpath cost on the tree path between `u` and `v`.
    ///
    /// Elementary subpaths are the segments obtained by cutting the path at
    /// every terminal and at every tree-branching node (degree ≥ 3); the two
    /// dangling segments concatenate when they meet in a pass-through node.
    ///
    /// # Preconditions
    /// Both nodes are in the tree. `path_scratch` is any reusable buffer;
    /// it is overwritten.
    pub fn bottleneck(
        &self,
        g: &StpGraph,
        u: NodeId,
        v: NodeId,
        path_scratch: &mut Vec<NodeId>,
    ) -> f64 {
        debug_assert!(self.in_tree(u) && self.in_tree(v));
        if u == v {
            return 0.0;
        }

        // ancestor chain of u, root-terminated
        path_scratch.clear();
        let mut x = u;
        path_scratch.push(x);
        while x != self.root {
            x = g.tail(self.parent_arc[x.index()]);
            path_scratch.push(x);
        }

        // climb from v until the chain is hit
        let (mut max_v, mut cur_v) = (0.0_f64, 0.0_f64);
        let mut y = v;
        let meet_i = loop {
            if let Some(i) = path_scratch.iter().position(|&p| p == y) {
                break i;
            }
            let a = self.parent_arc[y.index()];
            cur_v += g.cost(a);
            let p = g.tail(a);
            if !path_scratch.contains(&p) && self.resets_segment(g, p) {
                max_v = max_v.max(cur_v);
                cur_v = 0.0;
            }
            y = p;
        };

        // climb u's chain to the meet node
        let (mut max_u, mut cur_u) = (0.0_f64, 0.0_f64);
        for i in 0..meet_i {
            let a = self.parent_arc[path_scratch[i].index()];
            cur_u += g.cost(a);
            if i + 1 < meet_i && self.resets_segment(g, path_scratch[i + 1]) {
                max_u = max_u.max(cur_u);
                cur_u = 0.0;
            }
        }

        let meet = path_scratch[meet_i];
        let bneck = if self.resets_segment(g, meet) {
            max_u.max(cur_u).max(max_v).max(cur_v)
        } else {
            max_u.max(max_v).max(cur_u + cur_v)
        };
        path_scratch.clear();
        bneck
    }

    #[inline]
    fn resets_segment(&self, g: &StpGraph, v: NodeId) -> bool {
        g.is_term(v) || self.deg[v.index()] >= 3
    }

    /// Cost-accumulator agreement check, split out of
    /// [`DebugInvariants::validate_invariants`] because it needs the inputs.
    pub fn validate_costs(
        &self,
        g: &StpGraph,
        rc: &RedCosts,
        deleted: Option<&DeletedArcs>,
    ) -> Result<(), ReduceError> {
        let mut cost = 0.0;
        let mut red = 0.0;
        let mut ndel = 0u32;
        for &a in &self.edges {
            cost += g.cost(a);
            if deleted.is_some_and(|d| d.is_deleted(a.flip())) {
                ndel += 1;
            } else {
                red += rc.arc(a);
            }
        }
        let tol = 1e-6 * (1.0 + cost.abs() + red.abs());
        if (cost - self.tree_cost).abs() > tol {
            return Err(ReduceError::InvariantViolation(format!(
                "tree cost accumulator off by {}",
                (cost - self.tree_cost).abs()
            )));
        }
        if (red - self.tree_redcost).abs() > tol {
            return Err(ReduceError::InvariantViolation(format!(
                "tree reduced-cost accumulator off by {}",
                (red - self.tree_redcost).abs()
            )));
        }
        if ndel != self.ndel_up_arcs {
            return Err(ReduceError::InvariantViolation(format!(
                "deleted-upward-arc counter {} should be {ndel}",
                self.ndel_up_arcs
            )));
        }
        Ok(())
    }
}

impl DebugInvariants for ExtTree {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "ExtTree invalid");
    }

    fn validate_invariants(&self) -> Result<(), ReduceError> {
        if self.edges.is_empty() {
            return Ok(());
        }
        if self.leaves.first() != Some(&self.root) {
            return Err(ReduceError::InvariantViolation(
                "root must sit at leaf index 0".into(),
            ));
        }
        let mut nleaf_degree = 0usize;
        let mut degsum = 0i64;
        for &d in &self.deg {
            if d == 1 {
                nleaf_degree += 1;
            }
            if d >= 1 {
                degsum += d as i64;
            }
        }
        let in_list_with_deg1 = self
            .leaves
            .iter()
            .filter(|l| self.deg[l.index()] == 1)
            .count();
        if in_list_with_deg1 != self.leaves.len() || nleaf_degree != self.leaves.len() {
            return Err(ReduceError::InvariantViolation(format!(
                "leaf list ({}) disagrees with degree-1 nodes ({nleaf_degree})",
                self.leaves.len()
            )));
        }
        if degsum != 2 * self.edges.len() as i64 {
            return Err(ReduceError::InvariantViolation(format!(
                "degree sum {degsum} does not match {} edges",
                self.edges.len()
            )));
        }
        for w in self.leaves.windows(2) {
            if w[1..].contains(&w[0]) {
                return Err(ReduceError::InvariantViolation(
                    "duplicate leaf entry".into(),
                ));
            }
        }
        Ok(())
    }
}
