//! Reduced-cost lower bound on any solution containing the current tree.
//!
//! Every leaf is tried as the alternate entry point: re-root the tree there
//! (root-swap delta), walk in from the reduced-cost root (root-to-node
//! distance), and connect every other non-terminal leaf onward to a terminal.
//! Leaves sharing their nearest terminal are grouped: at most one of them may
//! claim the shared terminal, the rest fall back to their second-nearest.
//! The cheapest entry is the bound; it rules the tree out when it beats the
//! cutoff.

use crate::ext::tree::ExtTree;
use crate::fp;
use crate::graph::id::NodeId;
use crate::redcost::RedCosts;

/// Lower bound over all entry leaves, `f64::INFINITY` when no entry works.
///
/// `term_mark` is the cached terminal bitmap; `scratch` is reused across
/// calls and handed back empty.
pub fn tree_bound(
    tree: &ExtTree,
    rc: &RedCosts,
    term_mark: &[bool],
    scratch: &mut Vec<(NodeId, f64, f64)>,
) -> f64 {
    let mut best = f64::INFINITY;
    for &entry in tree.leaves() {
        let swap = tree.swap_cost(entry);
        if swap.is_infinite() {
            continue;
        }
        scratch.clear();
        for &leaf in tree.leaves() {
            if leaf == entry || term_mark[leaf.index()] {
                continue;
            }
            let bases = rc.term_bases(leaf);
            let dists = rc.term_dists(leaf);
            scratch.push((bases[0], dists[0], dists[1]));
        }
        let conn = connection_sum(scratch);
        best = best.min(tree.tree_redcost() + swap + rc.root_dist(entry) + conn);
    }
    scratch.clear();
    best
}

/// Does `bound` prove the tree cannot sit inside any solution under the
/// cutoff?
#[inline]
pub fn rules_out(bound: f64, cutoff: f64, prune_on_equality: bool, eps: f64) -> bool {
    if prune_on_equality {
        fp::ge(bound, cutoff, eps)
    } else {
        fp::gt(bound, cutoff, eps)
    }
}

/// Sum of leaf-to-terminal connections with shared-terminal grouping.
///
/// Entries are (nearest terminal, nearest distance, second-nearest distance).
/// Within a group sharing the nearest terminal, one member keeps its nearest
/// distance and the others take their second-nearest; the assignment is
/// minimized jointly. Sums stay NaN-free because infinities are only ever
/// added, never subtracted.
fn connection_sum(scratch: &mut [(NodeId, f64, f64)]) -> f64 {
    scratch.sort_unstable_by_key(|e| e.0);
    let mut total = 0.0;
    let mut i = 0;
    while i < scratch.len() {
        let mut j = i + 1;
        while j < scratch.len() && scratch[j].0 == scratch[i].0 {
            j += 1;
        }
        let group = &scratch[i..j];
        if group.len() == 1 {
            total += group[0].1;
        } else {
            let mut best = f64::INFINITY;
            for (m, claimant) in group.iter().enumerate() {
                let mut cand = claimant.1;
                for (o, other) in group.iter().enumerate() {
                    if o != m {
                        cand += other.2;
                    }
                }
                best = best.min(cand);
            }
            total += best;
        }
        i = j;
    }
    total
}
