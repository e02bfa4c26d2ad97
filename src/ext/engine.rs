//! Bounded DFS over extension components.
//!
//! The search asks one question: can every tree that contains the seed arc
//! and fits under the cutoff be ruled out? Components of candidate arcs are
//! pushed on an explicit stack and move through three states. A `Pending`
//! component holds raw candidates per extendable leaf; expansion screens
//! them and pushes every sensible subset as an `Expanded` component. Syncing
//! merges the top `Expanded` component into the tree and runs the periphery
//! bounds; survivors are `Marked` and extended further. A `Marked` component
//! back on top means its whole subtree was ruled out, so it resolves and
//! unwinds.
//!
//! Failure is sticky: one surviving shape that can neither be ruled out nor
//! refined (depth, capacity or degree caps, or a complete tree) decides the
//! whole check. Truncation is therefore reported as a plain `false` verdict,
//! never as a silent narrowing of the search space.
//!
//! Cache lockstep: each merge pushes one MST level and one horizontal
//! distance level, popped again on unmerge. Each expansion round closes one
//! vertical distance level whose release is owed by the component that
//! spawned it (the seed owes its own round too).

use itertools::Itertools;

use crate::debug_invariants::DebugInvariants;
use crate::dist::SdLevels;
#[cfg(test)]
use crate::ext::config::ExtConfig;
use crate::ext::context::ReductionContext;
use crate::ext::mst_bound;
use crate::ext::redcost_bound;
use crate::ext::stack::{CompStack, CompState};
use crate::ext::tree::ExtTree;
use crate::graph::csr::StpGraph;
use crate::graph::id::ArcId;

/// Search counters, reported through `log` after every check.
#[derive(Clone, Copy, Debug, Default)]
pub struct ExtStats {
    pub nchecks: u64,
    pub nexpansions: u64,
    pub nbacktracks: u64,
    pub nruled_periphery: u64,
    pub nruled_screen_groups: u64,
    pub nruled_conflict: u64,
    pub nruled_zero_candidates: u64,
    pub ntruncations: u64,
}

enum SyncOutcome {
    /// Merge succeeded but a periphery bound killed the tree.
    RuledOut,
    /// Pseudo-ancestor conflict: the component cannot occur in any optimum.
    Conflict,
    /// Merging would push the tree past its leaf or edge cap.
    Truncated,
    Survived,
}

enum ExtendOutcome {
    /// Some extendable leaf has no legal continuation at all.
    RuledOut,
    /// A cap was hit or no leaf is extendable; the check fails.
    Truncated,
    Pushed,
}

enum ExpandOutcome {
    /// Screening emptied a whole candidate group, killing the parent.
    ParentRuledOut,
    Truncated,
    Pushed,
}

/// One extension check: per-call tree, stack and distance levels around the
/// shared context.
pub struct ExtEngine<'c, 'a> {
    ctx: &'c mut ReductionContext<'a>,
    tree: ExtTree,
    stack: CompStack,
    vertical: SdLevels,
    horizontal: SdLevels,
    cand_buf: Vec<ArcId>,
    survivors: Vec<ArcId>,
    subset_buf: Vec<ArcId>,
    nmerges: u32,
    stats: ExtStats,
}

impl<'c, 'a> ExtEngine<'c, 'a> {
    pub fn new(ctx: &'c mut ReductionContext<'a>) -> Self {
        let nnodes = ctx.graph.nnodes();
        let cfg = ctx.cfg;
        let stack = CompStack::new(cfg.max_stack_edges, cfg.max_stack_components);
        Self {
            ctx,
            tree: ExtTree::new(nnodes),
            stack,
            vertical: SdLevels::new(),
            horizontal: SdLevels::new(),
            cand_buf: Vec::new(),
            survivors: Vec::new(),
            subset_buf: Vec::new(),
            nmerges: 0,
            stats: ExtStats::default(),
        }
    }

    #[inline]
    pub fn stats(&self) -> &ExtStats {
        &self.stats
    }

    /// Is the seed arc provably absent from every solution whose cost stays
    /// within the cutoff?
    ///
    /// The engine is reusable: every run starts from and returns to an empty
    /// tree, empty stack and clean permanent buffers.
    pub fn run(&mut self, seed: ArcId) -> bool {
        debug_assert!(self.stack.is_empty() && self.tree.depth() == 0);
        self.ctx.perm.debug_assert_clean();
        self.stats.nchecks += 1;
        self.nmerges = 0;

        if !self.stack.push(CompState::Expanded, &[seed]) {
            self.stats.ntruncations += 1;
            return false;
        }

        let mut verdict = true;
        'search: while !self.stack.is_empty() {
            match self.stack.top_state() {
                CompState::Expanded => match self.sync() {
                    SyncOutcome::Conflict => {
                        self.stats.nruled_conflict += 1;
                        self.stats.nbacktracks += 1;
                        self.stack.pop();
                    }
                    SyncOutcome::Truncated => {
                        verdict = false;
                        break 'search;
                    }
                    SyncOutcome::RuledOut => {
                        self.stats.nruled_periphery += 1;
                        self.resolve_top();
                    }
                    SyncOutcome::Survived => {
                        self.stack.advance_top(CompState::Marked);
                        match self.extend() {
                            ExtendOutcome::RuledOut => {
                                self.stats.nruled_zero_candidates += 1;
                                self.resolve_top();
                            }
                            ExtendOutcome::Truncated => {
                                verdict = false;
                                break 'search;
                            }
                            ExtendOutcome::Pushed => {}
                        }
                    }
                },
                CompState::Pending => match self.expand() {
                    ExpandOutcome::ParentRuledOut => {
                        self.stats.nruled_screen_groups += 1;
                        self.stack.pop();
                        self.resolve_top();
                    }
                    ExpandOutcome::Truncated => {
                        verdict = false;
                        break 'search;
                    }
                    ExpandOutcome::Pushed => {}
                },
                CompState::Marked => self.resolve_top(),
            }
        }

        if !verdict {
            // failure is final: unwind whatever is left
            while !self.stack.is_empty() {
                match self.stack.top_state() {
                    CompState::Marked => self.resolve_top(),
                    _ => self.stack.pop(),
                }
            }
        }

        debug_assert_eq!(self.tree.depth(), 0);
        debug_assert!(self.vertical.is_empty() && self.horizontal.is_empty());
        self.ctx.perm.debug_assert_clean();
        log::debug!(
            "extension check of arc {seed}: removable={verdict} \
             (expansions={}, backtracks={}, truncations={})",
            self.stats.nexpansions,
            self.stats.nbacktracks,
            self.stats.ntruncations
        );
        verdict
    }

    /// Merge the top `Expanded` component into the tree and run the
    /// periphery bounds.
    fn sync(&mut self) -> SyncOutcome {
        let g = self.ctx.graph;
        let rc = self.ctx.redcosts;
        let del = self.ctx.deleted;
        let pa = self.ctx.ancestors;
        let eq = self.ctx.cfg.prune_on_equality;
        let eps = self.ctx.cfg.eps;

        if self.tree.depth() == 0 {
            // the seed merges via its own entry point and screens itself
            let seed = self.stack.top_edges()[0];
            self.tree
                .seed(g, rc, del, pa, &mut self.ctx.perm.marks, seed);
            let (root, head) = (g.tail(seed), g.head(seed));
            self.vertical.open_level();
            self.vertical.open_slot(head);
            let sd = self.ctx.oracle.sd(g, del, head, root);
            self.vertical.push_target(root, sd);
            self.vertical.commit_slot();
            self.vertical.close_level();
            self.stack.add_top_cache_level();
        } else {
            let comp = self.stack.top_edges();
            let ntails = distinct_tails(g, comp);
            if self.tree.nleaves() - ntails + comp.len() > self.ctx.cfg.max_tree_leaves
                || self.tree.nedges() + comp.len() > self.ctx.cfg.max_tree_edges
            {
                self.stats.ntruncations += 1;
                return SyncOutcome::Truncated;
            }
            if !self.tree.add_component(
                g,
                rc,
                del,
                pa,
                &mut self.ctx.perm.marks,
                comp,
            ) {
                return SyncOutcome::Conflict;
            }
        }

        self.nmerges += 1;
        let interval = self.ctx.cfg.recompute_interval;
        if interval != 0 && self.nmerges % interval == 0 {
            let drift = self.tree.recompute_redcost(rc, del);
            if drift > 0.0 {
                log::trace!("reduced-cost accumulator drift {drift:e} corrected");
            }
        }
        crate::debug_invariants!(self.tree.validate_invariants(), "tree after merge");
        crate::debug_invariants!(self.tree.validate_costs(g, rc, del), "tree accumulators");

        let mst_ruled = mst_bound::merge_periphery(
            g,
            del,
            self.ctx.oracle,
            &self.tree,
            self.stack.top_edges(),
            &mut self.ctx.perm.mst_levels,
            &mut self.ctx.perm.dyn_mst,
            &self.vertical,
            &mut self.horizontal,
            eps,
        );
        if mst_ruled {
            return SyncOutcome::RuledOut;
        }
        let bound = redcost_bound::tree_bound(
            &self.tree,
            rc,
            &self.ctx.perm.term_mark,
            &mut self.ctx.perm.conn_scratch,
        );
        if redcost_bound::rules_out(bound, rc.cutoff(), eq, eps) {
            return SyncOutcome::RuledOut;
        }
        SyncOutcome::Survived
    }

    /// Collect candidate arcs for every extendable leaf of the freshly
    /// marked tree and push them as one pending component.
    fn extend(&mut self) -> ExtendOutcome {
        let cfg = self.ctx.cfg;
        if self.tree.depth() >= cfg.max_depth
            || self.tree.nedges() >= cfg.max_tree_edges
            || self.tree.nleaves() >= cfg.max_tree_leaves
        {
            self.stats.ntruncations += 1;
            return ExtendOutcome::Truncated;
        }

        let g = self.ctx.graph;
        let del = self.ctx.deleted;
        let pa = self.ctx.ancestors;
        self.cand_buf.clear();
        let mut any_extendable = false;
        for &leaf in self.tree.leaves() {
            if leaf == self.tree.root() || self.ctx.perm.is_term(leaf) {
                continue;
            }
            if g.grad(leaf) > cfg.max_leaf_degree {
                // too wide to enumerate; other leaves may still refine
                continue;
            }
            any_extendable = true;
            let before = self.cand_buf.len();
            for (a, head, _) in g.outgoing(leaf) {
                if self.tree.deg(head) != 0 {
                    continue;
                }
                if del.is_some_and(|d| d.is_deleted(a)) {
                    continue;
                }
                if pa.edge_conflicts(a, &self.ctx.perm.marks) {
                    continue;
                }
                self.cand_buf.push(a);
            }
            if self.cand_buf.len() == before {
                // a non-terminal leaf that cannot continue: no tree through
                // this shape exists
                return ExtendOutcome::RuledOut;
            }
        }
        if !any_extendable {
            self.stats.ntruncations += 1;
            return ExtendOutcome::Truncated;
        }
        if !self.stack.push(CompState::Pending, &self.cand_buf) {
            log::warn!("component stack capacity exhausted, giving up on the check");
            self.stats.ntruncations += 1;
            return ExtendOutcome::Truncated;
        }
        ExtendOutcome::Pushed
    }

    /// Screen the pending top component and replace it by expanded subsets
    /// of the survivors.
    fn expand(&mut self) -> ExpandOutcome {
        self.stats.nexpansions += 1;
        let g = self.ctx.graph;
        let del = self.ctx.deleted;
        let eps = self.ctx.cfg.eps;

        self.survivors.clear();
        self.vertical.open_level();
        let mut group_died = false;
        {
            let comp = self.stack.top_edges();
            let mut i = 0;
            while i < comp.len() {
                let tail = g.tail(comp[i]);
                let group_mark = self.survivors.len();
                let mut j = i;
                while j < comp.len() && g.tail(comp[j]) == tail {
                    let a = comp[j];
                    let dead = self.tree.deg(g.head(a)) != 0
                        || self
                            .ctx
                            .ancestors
                            .edge_conflicts(a, &self.ctx.perm.marks)
                        || mst_bound::screen_candidate(
                            g,
                            del,
                            self.ctx.oracle,
                            &self.tree,
                            &self.ctx.perm.mst_levels,
                            &mut self.ctx.perm.dyn_mst,
                            &mut self.vertical,
                            &mut self.ctx.perm.bneck_path,
                            a,
                            eps,
                        );
                    if !dead {
                        self.survivors.push(a);
                    }
                    j += 1;
                }
                if self.survivors.len() == group_mark {
                    // every continuation of this leaf is dead, so the parent
                    // tree shape cannot occur
                    group_died = true;
                    break;
                }
                i = j;
            }
        }
        self.vertical.close_level();
        if group_died {
            self.vertical.pop_level();
            return ExpandOutcome::ParentRuledOut;
        }

        self.stack.pop();
        debug_assert_eq!(self.stack.top_state(), CompState::Marked);
        // the screening level now belongs to the parent of the subsets
        self.stack.add_top_cache_level();

        let k = self.survivors.len();
        let over_caps = k > 32 || {
            let ncomps = (1u64 << k) - 1;
            let nedges = k as u64 * (1u64 << (k - 1));
            self.stack.ncomps() as u64 + ncomps > self.ctx.cfg.max_stack_components as u64
                || self.stack.nedges_buffered() as u64 + nedges
                    > self.ctx.cfg.max_stack_edges as u64
        };
        if over_caps {
            log::warn!("subset expansion of {k} survivors would overflow the stack, giving up");
            self.stats.ntruncations += 1;
            return ExpandOutcome::Truncated;
        }

        // counter order leaves the full set on top, explored first
        for mask in 1u64..(1u64 << k) {
            self.subset_buf.clear();
            for (b, &a) in self.survivors.iter().enumerate() {
                if mask & (1 << b) != 0 {
                    self.subset_buf.push(a);
                }
            }
            if subset_repeats_a_head(g, &self.subset_buf) {
                // two arcs into one node never form a tree together
                continue;
            }
            let pushed = self.stack.push(CompState::Expanded, &self.subset_buf);
            debug_assert!(pushed, "subset capacity was pre-checked");
        }
        ExpandOutcome::Pushed
    }

    /// Unwind the merged top component: release its owed screening levels,
    /// pop the MST and horizontal levels of its merge, undo the merge, pop.
    fn resolve_top(&mut self) {
        self.stats.nbacktracks += 1;
        for _ in 0..self.stack.top_cache_levels() {
            self.vertical.pop_level();
        }
        self.ctx.perm.mst_levels.pop_level();
        self.horizontal.pop_level();
        self.tree.remove_component(
            self.ctx.graph,
            self.ctx.redcosts,
            self.ctx.deleted,
            self.ctx.ancestors,
            &mut self.ctx.perm.marks,
            self.stack.top_edges(),
        );
        self.stack.pop();
    }
}

/// Component arcs are grouped by tail, so counting runs counts tails.
fn distinct_tails(g: &StpGraph, comp: &[ArcId]) -> usize {
    comp.iter().map(|&a| g.tail(a)).dedup().count()
}

fn subset_repeats_a_head(g: &StpGraph, subset: &[ArcId]) -> bool {
    !subset.iter().map(|&a| g.head(a)).all_unique()
}
