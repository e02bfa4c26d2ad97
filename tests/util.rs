#![allow(dead_code)]
use steiner_reduce::graph::{ArcId, GraphVariant, NodeId, StpGraph, StpGraphBuilder};
use steiner_reduce::redcost::RedCosts;

pub fn n(v: u32) -> NodeId {
    NodeId::new(v)
}

pub fn a(i: u32) -> ArcId {
    ArcId::new(i)
}

/// Build a Steiner instance from an edge list and a terminal set.
pub fn graph_from(nnodes: usize, terms: &[u32], edges: &[(u32, u32, f64)]) -> StpGraph {
    let mut b = StpGraphBuilder::new(GraphVariant::SteinerTree);
    b.add_nodes(nnodes);
    for &t in terms {
        b.set_terminal(n(t)).unwrap();
    }
    for &(u, v, c) in edges {
        b.add_edge(n(u), n(v), c).unwrap();
    }
    b.build().unwrap()
}

/// Single-source shortest distances, Bellman-Ford. Fine for test sizes.
pub fn shortest_dists(g: &StpGraph, s: NodeId) -> Vec<f64> {
    let mut d = vec![f64::INFINITY; g.nnodes()];
    d[s.index()] = 0.0;
    for _ in 0..g.nnodes() {
        for v in g.nodes() {
            for (_, h, c) in g.outgoing(v) {
                if d[v.index()] + c < d[h.index()] {
                    d[h.index()] = d[v.index()] + c;
                }
            }
        }
    }
    d
}

/// Reduced costs that mirror plain edge costs: redcost(a) = cost(a), root
/// distances and terminal tables from true shortest paths. Under this bundle
/// the reduced-cost bound is a genuine cost lower bound, so verdicts can be
/// compared against brute force.
pub fn cost_bundle(g: &StpGraph, root: NodeId, cutoff: f64) -> RedCosts {
    let redcost: Vec<f64> = (0..g.narcs()).map(|i| g.cost(a(i as u32))).collect();
    let root_dist = shortest_dists(g, root);
    let terms = g.terminals().to_vec();
    let per_term: Vec<Vec<f64>> = terms.iter().map(|&t| shortest_dists(g, t)).collect();

    let mut term_dist = Vec::with_capacity(3 * g.nnodes());
    let mut term_base = Vec::with_capacity(3 * g.nnodes());
    for v in g.nodes() {
        let mut near: Vec<(f64, NodeId)> = terms
            .iter()
            .enumerate()
            .map(|(k, &t)| (per_term[k][v.index()], t))
            .collect();
        near.sort_by(|x, y| x.partial_cmp(y).unwrap());
        for k in 0..3 {
            match near.get(k) {
                Some(&(d, t)) if d.is_finite() => {
                    term_dist.push(d);
                    term_base.push(t);
                }
                _ => {
                    term_dist.push(f64::INFINITY);
                    term_base.push(RedCosts::NO_BASE);
                }
            }
        }
    }
    let rc = RedCosts::new(root, redcost, root_dist, term_dist, term_base, cutoff);
    rc.validate(g).unwrap();
    rc
}

/// Minimum cost of a Steiner tree spanning all terminals, by exhaustive
/// enumeration of edge subsets, optionally excluding trees that use
/// `forbidden` in its root-away orientation. Only for small fixtures; the
/// subset count is 2^nedges.
pub fn steiner_optimum(g: &StpGraph, root: NodeId, forbidden: Option<ArcId>) -> f64 {
    let ne = g.nedges();
    assert!(ne <= 16, "enumeration fixture too large");
    let terms: Vec<NodeId> = g.terminals().to_vec();
    let mut best = f64::INFINITY;

    'subsets: for mask in 0u32..(1u32 << ne) {
        let mut cost = 0.0;
        let mut touched = vec![false; g.nnodes()];
        let mut nedges_used = 0;
        for e in 0..ne {
            if mask & (1 << e) != 0 {
                let arc = a(2 * e as u32);
                cost += g.cost(arc);
                touched[g.tail(arc).index()] = true;
                touched[g.head(arc).index()] = true;
                nedges_used += 1;
            }
        }
        touched[root.index()] = true;

        // orient away from the root over subset edges
        let mut parent: Vec<Option<ArcId>> = vec![None; g.nnodes()];
        let mut seen = vec![false; g.nnodes()];
        let mut queue = vec![root];
        seen[root.index()] = true;
        let mut reached = 1;
        while let Some(v) = queue.pop() {
            for (arc, h, _) in g.outgoing(v) {
                let e = arc.index() / 2;
                if mask & (1 << e) != 0 && !seen[h.index()] {
                    seen[h.index()] = true;
                    parent[h.index()] = Some(arc);
                    queue.push(h);
                    reached += 1;
                }
            }
        }

        // keep trees only: connected over the touched nodes, acyclic
        let ntouched = touched.iter().filter(|&&t| t).count();
        if reached != ntouched || nedges_used != ntouched - 1 {
            continue;
        }
        for &t in &terms {
            if !seen[t.index()] {
                continue 'subsets;
            }
        }
        if let Some(f) = forbidden {
            if parent[g.head(f).index()] == Some(f) {
                continue;
            }
        }
        best = best.min(cost);
    }
    best
}
