//! Removability checks, the public face of the extension engine.
//!
//! A `true` verdict is a proof: no optimal solution within the context's
//! cutoff uses the arc (edge, node). `false` promises nothing; it covers
//! both "a viable extension survived" and "a resource cap cut the search
//! short". The caller owns the actual graph mutation and must feed any
//! deletion back through [`crate::dist::DistOracle::notify_arc_deleted`]
//! and the pseudo-ancestor layer before the next check.

use crate::ext::context::ReductionContext;
use crate::ext::engine::ExtEngine;
use crate::graph::id::{ArcId, NodeId};
use crate::reduce_error::ReduceError;

/// Can `arc` be proven absent from every within-cutoff optimum?
///
/// # Errors
/// Rejects out-of-range ids and arcs already marked deleted; a candidate
/// that was eliminated earlier points at a stale driver loop.
pub fn check_arc(ctx: &mut ReductionContext<'_>, arc: ArcId) -> Result<bool, ReduceError> {
    ctx.graph.check_arc(arc)?;
    if ctx.deleted.is_some_and(|d| d.is_deleted(arc)) {
        return Err(ReduceError::ArcAlreadyDeleted(arc.get()));
    }
    let mut engine = ExtEngine::new(ctx);
    Ok(engine.run(arc))
}

/// Can the undirected edge of `arc` be proven removable?
///
/// An edge goes only when both of its orientations do; the second run is
/// skipped when the first already fails.
pub fn check_edge(ctx: &mut ReductionContext<'_>, arc: ArcId) -> Result<bool, ReduceError> {
    ctx.graph.check_arc(arc)?;
    if ctx.deleted.is_some_and(|d| d.is_deleted(arc)) {
        return Err(ReduceError::ArcAlreadyDeleted(arc.get()));
    }
    let mut engine = ExtEngine::new(ctx);
    if !engine.run(arc) {
        return Ok(false);
    }
    Ok(engine.run(arc.flip()))
}

/// Whole-node elimination via extension trees seeded at every incident arc.
///
/// Not implemented: always answers `Ok(false)` ("not proven"), which is a
/// sound verdict for any node. Seeding per incident arc is not enough; the
/// star around the node has to be checked as one initial component, and the
/// bookkeeping for multi-edge initial components is not built yet.
pub fn check_node(ctx: &mut ReductionContext<'_>, node: NodeId) -> Result<bool, ReduceError> {
    ctx.graph.check_node(node)?;
    log::debug!("node check of {node}: not implemented, answering not-proven");
    Ok(false)
}

#[cfg(feature = "parallel")]
pub use self::par::check_edges_parallel;

#[cfg(feature = "parallel")]
mod par {
    use rayon::prelude::*;

    use super::check_edge;
    use crate::dist::DistOracle;
    use crate::ext::config::ExtConfig;
    use crate::ext::context::{ExtPermanent, ReductionContext};
    use crate::graph::csr::StpGraph;
    use crate::graph::deleted::DeletedArcs;
    use crate::graph::id::ArcId;
    use crate::graph::pseudo_ancestors::PseudoAncestors;
    use crate::redcost::RedCosts;
    use crate::reduce_error::ReduceError;

    /// Edge checks across a candidate batch, one worker-local mutable state
    /// per rayon split.
    ///
    /// `perm` and `oracle` act as prototypes; every split clones them, so
    /// close-node refreshes done by one worker are invisible to the others.
    /// Verdicts land in candidate order and are independent of the worker
    /// count. No deletions happen here, so checks cannot invalidate each
    /// other mid-batch.
    #[allow(clippy::too_many_arguments)]
    pub fn check_edges_parallel(
        g: &StpGraph,
        redcosts: &RedCosts,
        deleted: Option<&DeletedArcs>,
        ancestors: &PseudoAncestors,
        cfg: &ExtConfig,
        perm: &ExtPermanent,
        oracle: &DistOracle,
        cands: &[ArcId],
    ) -> Result<Vec<bool>, ReduceError> {
        cands
            .par_iter()
            .map_init(
                || (perm.clone(), oracle.clone()),
                |(perm, oracle), &arc| {
                    let mut ctx =
                        ReductionContext::new(g, redcosts, deleted, ancestors, cfg, perm, oracle)?;
                    check_edge(&mut ctx, arc)
                },
            )
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dist::DistOracle;
    use crate::ext::config::ExtConfig;
    use crate::ext::context::ExtPermanent;
    use crate::graph::csr::{GraphVariant, StpGraph, StpGraphBuilder};
    use crate::graph::deleted::DeletedArcs;
    use crate::graph::pseudo_ancestors::PseudoAncestors;
    use crate::redcost::RedCosts;

    fn n(v: u32) -> NodeId {
        NodeId::new(v)
    }

    fn a(i: u32) -> ArcId {
        ArcId::new(i)
    }

    /// Terminals 0/2 on a unit path 0-1-2, plus a cost-9 chord 0-2.
    fn chord_graph() -> StpGraph {
        let mut b = StpGraphBuilder::new(GraphVariant::SteinerTree);
        b.add_nodes(3);
        b.set_terminal(n(0)).unwrap();
        b.set_terminal(n(2)).unwrap();
        b.add_edge(n(0), n(1), 1.0).unwrap(); // arcs 0/1
        b.add_edge(n(1), n(2), 1.0).unwrap(); // arcs 2/3
        b.add_edge(n(0), n(2), 9.0).unwrap(); // arcs 4/5
        b.build().unwrap()
    }

    fn cost_bundle(g: &StpGraph, cutoff: f64) -> RedCosts {
        let redcost: Vec<f64> = (0..g.narcs()).map(|i| g.cost(a(i as u32))).collect();
        // exact values for the 3-node chord fixture rooted at 0
        let root_dist = vec![0.0, 1.0, 2.0];
        let term_dist = vec![0.0, 2.0, f64::INFINITY, 1.0, 1.0, f64::INFINITY, 0.0, 2.0, f64::INFINITY];
        let term_base = vec![
            n(0),
            n(2),
            RedCosts::NO_BASE,
            n(0),
            n(2),
            RedCosts::NO_BASE,
            n(2),
            n(0),
            RedCosts::NO_BASE,
        ];
        RedCosts::new(n(0), redcost, root_dist, term_dist, term_base, cutoff)
    }

    struct Bundle {
        g: StpGraph,
        rc: RedCosts,
        pa: PseudoAncestors,
        cfg: ExtConfig,
        perm: ExtPermanent,
        oracle: DistOracle,
    }

    impl Bundle {
        fn new(cutoff: f64) -> Self {
            let g = chord_graph();
            let rc = cost_bundle(&g, cutoff);
            let pa = PseudoAncestors::new(g.nedges());
            let cfg = ExtConfig::default();
            let perm = ExtPermanent::new(&g, &pa, &cfg);
            let oracle = DistOracle::build(&g, None, cfg.max_close_nodes);
            Bundle {
                g,
                rc,
                pa,
                cfg,
                perm,
                oracle,
            }
        }

        fn ctx(&mut self) -> ReductionContext<'_> {
            ReductionContext::new(
                &self.g,
                &self.rc,
                None,
                &self.pa,
                &self.cfg,
                &mut self.perm,
                &mut self.oracle,
            )
            .unwrap()
        }
    }

    #[test]
    fn chord_arc_is_removable_but_path_arcs_stay() {
        let mut bundle = Bundle::new(4.0);
        let mut ctx = bundle.ctx();
        // both chord orientations cost >= 9 against cutoff 4
        assert_eq!(check_arc(&mut ctx, a(4)), Ok(true));
        assert_eq!(check_arc(&mut ctx, a(5)), Ok(true));
        assert_eq!(check_edge(&mut ctx, a(4)), Ok(true));
        // the unit path is the optimum
        assert_eq!(check_edge(&mut ctx, a(0)), Ok(false));
        assert_eq!(check_edge(&mut ctx, a(2)), Ok(false));
    }

    #[test]
    fn out_of_range_ids_are_rejected() {
        let mut bundle = Bundle::new(4.0);
        let mut ctx = bundle.ctx();
        assert!(matches!(
            check_arc(&mut ctx, a(6)),
            Err(ReduceError::ArcOutOfRange { arc: 6, narcs: 6 })
        ));
        assert!(matches!(
            check_node(&mut ctx, n(3)),
            Err(ReduceError::NodeOutOfRange { node: 3, nnodes: 3 })
        ));
    }

    #[test]
    fn deleted_candidate_is_an_error() {
        let mut bundle = Bundle::new(4.0);
        let mut del = DeletedArcs::new(bundle.g.narcs());
        del.mark_edge(a(4));
        let mut ctx = ReductionContext::new(
            &bundle.g,
            &bundle.rc,
            Some(&del),
            &bundle.pa,
            &bundle.cfg,
            &mut bundle.perm,
            &mut bundle.oracle,
        )
        .unwrap();
        assert_eq!(
            check_arc(&mut ctx, a(4)),
            Err(ReduceError::ArcAlreadyDeleted(4))
        );
        // the path arcs still check fine next to the deletion
        assert_eq!(check_arc(&mut ctx, a(0)), Ok(false));
    }

    #[test]
    fn node_check_is_a_sound_stub() {
        let mut bundle = Bundle::new(4.0);
        let mut ctx = bundle.ctx();
        // node 1 sits in the optimum; "not proven" is the only sound answer
        assert_eq!(check_node(&mut ctx, n(1)), Ok(false));
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn parallel_batch_matches_serial_verdicts() {
        let mut bundle = Bundle::new(4.0);
        let cands = [a(0), a(2), a(4)];

        let par = check_edges_parallel(
            &bundle.g,
            &bundle.rc,
            None,
            &bundle.pa,
            &bundle.cfg,
            &bundle.perm,
            &bundle.oracle,
            &cands,
        )
        .unwrap();

        let mut ctx = bundle.ctx();
        let serial: Vec<bool> = cands
            .iter()
            .map(|&c| check_edge(&mut ctx, c).unwrap())
            .collect();
        assert_eq!(par, serial);
        assert_eq!(par, [false, false, true]);
    }
}
