//! Special-distance and MST rule-outs.
//!
//! Two call sites. During expansion every surviving candidate arc is
//! screened on its own: each tree leaf offers a bypass if its special
//! distance to the candidate head undercuts the extended tree bottleneck,
//! and the leaf MST extended by the head must not beat tree cost plus
//! candidate cost. After a merge the whole new leaf set is tested: a leaf
//! MST cheaper than the tree proves the tree is not part of any optimum.
//!
//! All comparisons here are strict. A special distance is a witnessed
//! connection that may run over the candidate edge or the tree itself, so a
//! tie proves nothing; only a strictly cheaper bypass is a real replacement.
//! Equality-tolerant pruning exists solely in the cutoff comparison of the
//! reduced-cost bound.
//!
//! Both sites feed the depth-tied caches. Screening fills one vertical slot
//! per surviving candidate (discarded again when the candidate dies) and the
//! merge fills the same-depth horizontal level before the leaf MST is built.

use crate::dist::{DistOracle, SdLevels};
use crate::ext::tree::ExtTree;
use crate::fp;
use crate::graph::csr::StpGraph;
use crate::graph::deleted::DeletedArcs;
use crate::graph::id::{ArcId, NodeId};
use crate::mst::{DynamicMst, MstLevels};

/// Screen one candidate arc against the current tree.
///
/// Returns `true` when the candidate is provably useless. On survival the
/// vertical cache keeps a slot `head -> (leaf, sd)` for every current leaf,
/// in top-MST slot order; on rule-out the slot is discarded.
///
/// # Preconditions
/// The top MST level snapshots the current leaves and `vertical` has an open
/// unfinished level for this expansion round.
#[allow(clippy::too_many_arguments)]
pub fn screen_candidate(
    g: &StpGraph,
    deleted: Option<&DeletedArcs>,
    oracle: &mut DistOracle,
    tree: &ExtTree,
    mst_levels: &MstLevels,
    dyn_mst: &mut DynamicMst,
    vertical: &mut SdLevels,
    bneck_scratch: &mut Vec<NodeId>,
    cand: ArcId,
    eps: f64,
) -> bool {
    let lf = g.tail(cand);
    let head = g.head(cand);
    let ext_cost = g.cost(cand);
    let leaves = mst_levels.top_leaves();
    debug_assert_eq!(leaves.len(), tree.nleaves());
    dyn_mst.debug_assert_clean();

    vertical.open_slot(head);
    let mut dominated = false;
    for &leaf in leaves {
        let sd = oracle.sd(g, deleted, head, leaf);
        let bneck = tree.bottleneck(g, leaf, lf, bneck_scratch).max(ext_cost);
        dominated = fp::lt(sd, bneck, eps);
        if dominated {
            break;
        }
        vertical.push_target(leaf, sd);
        dyn_mst.push_adj_cost(sd);
    }
    if dominated {
        vertical.discard_slot();
        dyn_mst.clear_adj();
        return true;
    }

    let with_cand = dyn_mst.mst_with_extra(mst_levels.top_mst()).weight();
    if fp::lt(with_cand, tree.tree_cost() + ext_cost, eps) {
        vertical.discard_slot();
        return true;
    }
    vertical.commit_slot();
    false
}

/// Periphery test after merging `comp`: fill the horizontal level for the
/// new heads, build the complete leaf MST (cache-assisted), push it as the
/// new MST level and compare against the tree cost.
///
/// The level push happens regardless of the outcome so that unmerging can
/// pop in lockstep.
#[allow(clippy::too_many_arguments)]
pub fn merge_periphery(
    g: &StpGraph,
    deleted: Option<&DeletedArcs>,
    oracle: &mut DistOracle,
    tree: &ExtTree,
    comp: &[ArcId],
    mst_levels: &mut MstLevels,
    dyn_mst: &mut DynamicMst,
    vertical: &SdLevels,
    horizontal: &mut SdLevels,
    eps: f64,
) -> bool {
    horizontal.open_level();
    for &a in comp {
        let hi = g.head(a);
        horizontal.open_slot(hi);
        for &b in comp {
            let hj = g.head(b);
            if hi != hj {
                let sd = oracle.sd(g, deleted, hi, hj);
                horizontal.push_target(hj, sd);
            }
        }
        horizontal.commit_slot();
    }
    horizontal.close_level();

    let leaves = tree.leaves();
    let mst = dyn_mst.build_complete(leaves.len(), |i, j| {
        cached_sd(g, deleted, oracle, vertical, horizontal, leaves[i], leaves[j])
    });
    let weight = mst.weight();
    mst_levels.push_level(leaves, mst);

    fp::lt(weight, tree.tree_cost(), eps)
}

/// Special distance with depth-tied cache lookups in front of the oracle.
fn cached_sd(
    g: &StpGraph,
    deleted: Option<&DeletedArcs>,
    oracle: &mut DistOracle,
    vertical: &SdLevels,
    horizontal: &SdLevels,
    u: NodeId,
    v: NodeId,
) -> f64 {
    for levels in [vertical, horizontal] {
        if !levels.is_empty() && levels.top_closed() {
            if let Some(d) = levels.lookup(u, v).or_else(|| levels.lookup(v, u)) {
                return d;
            }
        }
    }
    oracle.sd(g, deleted, u, v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::csr::{GraphVariant, StpGraph, StpGraphBuilder};
    use crate::graph::pseudo_ancestors::{AncestorMarks, PseudoAncestors};
    use crate::redcost::RedCosts;

    fn n(v: u32) -> NodeId {
        NodeId::new(v)
    }

    fn a(i: u32) -> ArcId {
        ArcId::new(i)
    }

    fn cost_redcosts(g: &StpGraph) -> RedCosts {
        let nn = g.nnodes();
        RedCosts::new(
            n(0),
            (0..g.narcs()).map(|i| g.cost(a(i as u32))).collect(),
            vec![0.0; nn],
            (0..nn).flat_map(|_| [0.0, 0.0, 0.0]).collect(),
            (0..nn).flat_map(|_| [n(0), n(0), n(0)]).collect(),
            1e9,
        )
    }

    struct Rig {
        g: StpGraph,
        rc: RedCosts,
        pa: PseudoAncestors,
        marks: AncestorMarks,
        tree: ExtTree,
        oracle: DistOracle,
        mst_levels: MstLevels,
        dyn_mst: DynamicMst,
        vertical: SdLevels,
        horizontal: SdLevels,
        scratch: Vec<NodeId>,
    }

    impl Rig {
        /// Seed with the given arc and run the seed-depth cache fills plus
        /// periphery, the way the engine does.
        fn seed(g: StpGraph, seed: ArcId) -> (Self, bool) {
            let rc = cost_redcosts(&g);
            let pa = PseudoAncestors::new(g.nedges());
            let mut marks = AncestorMarks::new(pa.mark_len());
            let mut tree = ExtTree::new(g.nnodes());
            let mut oracle = DistOracle::build(&g, None, 8);
            let mut mst_levels = MstLevels::new();
            let mut dyn_mst = DynamicMst::new(8);
            let mut vertical = SdLevels::new();
            let mut horizontal = SdLevels::new();

            tree.seed(&g, &rc, None, &pa, &mut marks, seed);
            let (root, head) = (g.tail(seed), g.head(seed));
            vertical.open_level();
            vertical.open_slot(head);
            let sd = oracle.sd(&g, None, head, root);
            vertical.push_target(root, sd);
            vertical.commit_slot();
            vertical.close_level();
            let ruled = merge_periphery(
                &g,
                None,
                &mut oracle,
                &tree,
                &[seed],
                &mut mst_levels,
                &mut dyn_mst,
                &vertical,
                &mut horizontal,
                1e-9,
            );
            let rig = Rig {
                g,
                rc,
                pa,
                marks,
                tree,
                oracle,
                mst_levels,
                dyn_mst,
                vertical,
                horizontal,
                scratch: Vec::new(),
            };
            (rig, ruled)
        }

        fn merge(&mut self, comp: &[ArcId]) -> bool {
            assert!(self.tree.add_component(
                &self.g,
                &self.rc,
                None,
                &self.pa,
                &mut self.marks,
                comp
            ));
            merge_periphery(
                &self.g,
                None,
                &mut self.oracle,
                &self.tree,
                comp,
                &mut self.mst_levels,
                &mut self.dyn_mst,
                &self.vertical,
                &mut self.horizontal,
                1e-9,
            )
        }

        fn screen(&mut self, cand: ArcId) -> bool {
            screen_candidate(
                &self.g,
                None,
                &mut self.oracle,
                &self.tree,
                &self.mst_levels,
                &mut self.dyn_mst,
                &mut self.vertical,
                &mut self.scratch,
                cand,
                1e-9,
            )
        }
    }

    /// Path 0-1-2 (unit costs) with a cheap chord 0-2.
    #[test]
    fn bottleneck_domination_rules_out_bypassed_candidate() {
        let mut b = StpGraphBuilder::new(GraphVariant::SteinerTree);
        b.add_nodes(3);
        b.set_terminal(n(0)).unwrap();
        b.set_terminal(n(2)).unwrap();
        b.add_edge(n(0), n(1), 1.0).unwrap(); // arcs 0/1
        b.add_edge(n(1), n(2), 1.0).unwrap(); // arcs 2/3
        b.add_edge(n(0), n(2), 0.5).unwrap(); // arcs 4/5
        let (mut rig, seed_ruled) = Rig::seed(b.build().unwrap(), a(0));
        assert!(!seed_ruled);

        rig.vertical.open_level();
        // sd(2, 0) = 0.5 beats the extended bottleneck max(1.0, 1.0)
        assert!(rig.screen(a(2)));
        rig.vertical.close_level();
        assert!(!rig.vertical.top_has_base(n(2)));
        assert!(rig.dyn_mst.is_clean());
    }

    /// Star tree 1-{0,2,3} plus a hub 4 touching every spoke end.
    fn hub_graph(hub_cost: f64) -> StpGraph {
        let mut b = StpGraphBuilder::new(GraphVariant::SteinerTree);
        b.add_nodes(5);
        b.set_terminal(n(0)).unwrap();
        b.add_edge(n(0), n(1), 5.0).unwrap(); // arcs 0/1
        b.add_edge(n(1), n(2), 5.0).unwrap(); // arcs 2/3
        b.add_edge(n(1), n(3), 5.0).unwrap(); // arcs 4/5
        b.add_edge(n(0), n(4), hub_cost).unwrap(); // arcs 6/7
        b.add_edge(n(2), n(4), hub_cost).unwrap(); // arcs 8/9
        b.add_edge(n(3), n(4), 5.0).unwrap(); // arcs 10/11
        b.build().unwrap()
    }

    #[test]
    fn cheap_hub_fails_the_extension_mst_test() {
        let (mut rig, seed_ruled) = Rig::seed(hub_graph(5.0), a(0));
        assert!(!seed_ruled);
        assert!(!rig.merge(&[a(2), a(4)]));

        // all sd(4, leaf) = 5 match the bottlenecks, so only the MST fires:
        // star through the hub spans {0,2,3,4} for 15 < tree 15 + cand 5
        rig.vertical.open_level();
        assert!(rig.screen(a(10)));
        rig.vertical.close_level();
        assert!(!rig.vertical.top_has_base(n(4)));
    }

    #[test]
    fn expensive_hub_survives_and_commits_its_cache_slot() {
        let (mut rig, seed_ruled) = Rig::seed(hub_graph(50.0), a(0));
        assert!(!seed_ruled);
        assert!(!rig.merge(&[a(2), a(4)]));

        rig.vertical.open_level();
        assert!(!rig.screen(a(10)));
        rig.vertical.close_level();
        // committed slot: head 4 against every leaf, oracle-exact values
        assert_eq!(rig.vertical.lookup(n(4), n(0)), Some(15.0));
        assert_eq!(rig.vertical.lookup(n(4), n(2)), Some(15.0));
        assert_eq!(rig.vertical.lookup(n(4), n(3)), Some(5.0));
        assert!(rig.dyn_mst.is_clean());
    }

    /// A cheap chord between two spoke ends makes the merged star tree lose
    /// against its own leaf MST.
    #[test]
    fn merge_periphery_detects_cheaper_leaf_mst() {
        let mut b = StpGraphBuilder::new(GraphVariant::SteinerTree);
        b.add_nodes(4);
        b.set_terminal(n(0)).unwrap();
        b.add_edge(n(0), n(1), 5.0).unwrap(); // arcs 0/1
        b.add_edge(n(1), n(2), 5.0).unwrap(); // arcs 2/3
        b.add_edge(n(1), n(3), 5.0).unwrap(); // arcs 4/5
        b.add_edge(n(0), n(2), 1.0).unwrap(); // arcs 6/7
        let (mut rig, seed_ruled) = Rig::seed(b.build().unwrap(), a(0));
        assert!(!seed_ruled);

        // leaf MST {0,2,3}: 0-2 (1) + 3 via 10 = 11 < tree cost 15
        assert!(rig.merge(&[a(2), a(4)]));
        assert_eq!(rig.mst_levels.nlevels(), 2);
        assert_eq!(rig.horizontal.lookup(n(2), n(3)), Some(10.0));
    }
}
