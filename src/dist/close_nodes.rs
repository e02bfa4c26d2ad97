//! Per-node bounded close-node lists.
//!
//! For every node the oracle keeps up to `max_close` of its nearest neighbors
//! with their shortest-path distances, stored in a fixed-stride flat layout so
//! a single source can be rebuilt in place. Entries within a list are sorted
//! by node id, which makes the direct lookup a binary search and the
//! common-intermediate scan a linear merge.

use crate::graph::id::NodeId;

/// Fixed-stride storage for close-node lists plus staleness bookkeeping.
#[derive(Clone, Debug)]
pub struct CloseNodeLists {
    stride: usize,
    len: Vec<u32>,
    nodes: Vec<NodeId>,
    dists: Vec<f64>,
    dirty: Vec<bool>,
    nrecomps: Vec<u32>,
}

impl CloseNodeLists {
    pub fn new(nnodes: usize, max_close: usize) -> Self {
        Self {
            stride: max_close,
            len: vec![0; nnodes],
            nodes: vec![NodeId::new(0); nnodes * max_close],
            dists: vec![0.0; nnodes * max_close],
            dirty: vec![false; nnodes],
            nrecomps: vec![0; nnodes],
        }
    }

    #[inline]
    pub fn max_close(&self) -> usize {
        self.stride
    }

    #[inline]
    pub fn nnodes(&self) -> usize {
        self.len.len()
    }

    /// Close nodes of `v` and their distances, sorted by node id.
    #[inline]
    pub fn list(&self, v: NodeId) -> (&[NodeId], &[f64]) {
        let lo = v.index() * self.stride;
        let n = self.len[v.index()] as usize;
        (&self.nodes[lo..lo + n], &self.dists[lo..lo + n])
    }

    /// Distance from `v` to `target` if `target` is in `v`'s list.
    pub fn direct(&self, v: NodeId, target: NodeId) -> Option<f64> {
        let (nodes, dists) = self.list(v);
        nodes.binary_search(&target).ok().map(|i| dists[i])
    }

    /// Cheapest `d(u, w) + d(v, w)` over nodes `w` common to both lists.
    /// Returns `f64::INFINITY` when the lists are disjoint.
    pub fn common_min(&self, u: NodeId, v: NodeId) -> f64 {
        let (un, ud) = self.list(u);
        let (vn, vd) = self.list(v);
        let mut best = f64::INFINITY;
        let (mut i, mut j) = (0, 0);
        while i < un.len() && j < vn.len() {
            match un[i].cmp(&vn[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    let sum = ud[i] + vd[j];
                    if sum < best {
                        best = sum;
                    }
                    i += 1;
                    j += 1;
                }
            }
        }
        best
    }

    /// Overwrite `v`'s list. `entries` must be sorted by node id, free of
    /// duplicates and of `v` itself, and no longer than the stride.
    ///
    /// # Panics
    /// Panics if `entries` exceeds the stride.
    pub fn set_list(&mut self, v: NodeId, entries: &[(NodeId, f64)]) {
        assert!(
            entries.len() <= self.stride,
            "close-node list overflow: {} > {}",
            entries.len(),
            self.stride
        );
        debug_assert!(entries.windows(2).all(|w| w[0].0 < w[1].0));
        debug_assert!(entries.iter().all(|&(t, _)| t != v));
        let lo = v.index() * self.stride;
        for (k, &(t, d)) in entries.iter().enumerate() {
            self.nodes[lo + k] = t;
            self.dists[lo + k] = d;
        }
        self.len[v.index()] = entries.len() as u32;
    }

    #[inline]
    pub fn is_dirty(&self, v: NodeId) -> bool {
        self.dirty[v.index()]
    }

    #[inline]
    pub fn mark_dirty(&mut self, v: NodeId) {
        self.dirty[v.index()] = true;
    }

    /// Clear the dirty flag and bump the recompute generation, invalidating
    /// every path-root registration made under the previous generation.
    pub fn mark_rebuilt(&mut self, v: NodeId) -> u32 {
        self.dirty[v.index()] = false;
        self.nrecomps[v.index()] += 1;
        self.nrecomps[v.index()]
    }

    /// Recompute generation of `v`; registrations carrying an older value are
    /// stale.
    #[inline]
    pub fn generation(&self, v: NodeId) -> u32 {
        self.nrecomps[v.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(v: u32) -> NodeId {
        NodeId::new(v)
    }

    #[test]
    fn set_and_lookup() {
        let mut lists = CloseNodeLists::new(4, 3);
        lists.set_list(n(0), &[(n(1), 1.0), (n(3), 2.5)]);
        assert_eq!(lists.direct(n(0), n(3)), Some(2.5));
        assert_eq!(lists.direct(n(0), n(2)), None);
        let (nodes, dists) = lists.list(n(0));
        assert_eq!(nodes, &[n(1), n(3)]);
        assert_eq!(dists, &[1.0, 2.5]);
        // unset node has an empty list
        assert_eq!(lists.list(n(2)).0.len(), 0);
    }

    #[test]
    fn common_min_merges_sorted_lists() {
        let mut lists = CloseNodeLists::new(4, 3);
        lists.set_list(n(0), &[(n(1), 1.0), (n(2), 4.0), (n(3), 2.0)]);
        lists.set_list(n(1), &[(n(2), 1.5), (n(3), 9.0)]);
        // via node 2: 4.0 + 1.5; via node 3: 2.0 + 9.0
        assert_eq!(lists.common_min(n(0), n(1)), 5.5);
        // disjoint lists
        lists.set_list(n(2), &[(n(0), 1.0)]);
        lists.set_list(n(3), &[(n(1), 1.0)]);
        assert_eq!(lists.common_min(n(2), n(3)), f64::INFINITY);
    }

    #[test]
    fn rebuild_advances_generation() {
        let mut lists = CloseNodeLists::new(2, 2);
        assert_eq!(lists.generation(n(1)), 0);
        lists.mark_dirty(n(1));
        assert!(lists.is_dirty(n(1)));
        assert_eq!(lists.mark_rebuilt(n(1)), 1);
        assert!(!lists.is_dirty(n(1)));
        assert_eq!(lists.generation(n(1)), 1);
        assert_eq!(lists.generation(n(0)), 0);
    }
}
