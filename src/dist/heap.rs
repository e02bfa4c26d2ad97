//! Resettable indexed min-heap for repeated bounded Dijkstra runs.
//!
//! A single close-node rebuild touches only a handful of nodes, but the
//! position index is sized by the whole graph. Version stamps make
//! [`NodeHeap::reset`] O(1): stale positions from earlier rounds are simply
//! ignored, so thousands of small Dijkstra runs share one allocation.
//!
//! Keys are finite `f64` distances (builder-validated costs only ever sum to
//! finite values here). Ties are broken by node id so heap order, and with it
//! every downstream verdict, is deterministic.

use crate::graph::id::NodeId;

/// Indexed binary min-heap keyed by distance, with decrease-key.
#[derive(Clone, Debug)]
pub struct NodeHeap {
    /// Implicit binary tree of `(key, node)` entries.
    heap: Vec<(f64, NodeId)>,
    /// Node → slot in `heap`; valid only when `stamp` matches `round`.
    pos: Vec<u32>,
    stamp: Vec<u32>,
    round: u32,
}

#[inline]
fn before(a: (f64, NodeId), b: (f64, NodeId)) -> bool {
    a.0 < b.0 || (a.0 == b.0 && a.1 < b.1)
}

impl NodeHeap {
    pub fn new(nnodes: usize) -> Self {
        // round starts at 1 so the zeroed stamps are stale from the outset
        Self {
            heap: Vec::new(),
            pos: vec![0; nnodes],
            stamp: vec![0; nnodes],
            round: 1,
        }
    }

    /// Forget all entries.
    ///
    /// # Complexity
    /// O(1) amortized; O(n) only when the round counter wraps.
    pub fn reset(&mut self) {
        self.heap.clear();
        if self.round == u32::MAX {
            self.stamp.fill(0);
            self.round = 0;
        }
        self.round += 1;
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    #[inline]
    fn contains(&self, v: NodeId) -> bool {
        self.stamp[v.index()] == self.round
    }

    /// Insert `v` with `key`, or lower its key if already queued with a larger
    /// one. Returns `true` if the heap changed.
    pub fn push_or_decrease(&mut self, v: NodeId, key: f64) -> bool {
        if self.contains(v) {
            let slot = self.pos[v.index()] as usize;
            if key >= self.heap[slot].0 {
                return false;
            }
            self.heap[slot].0 = key;
            self.sift_up(slot);
        } else {
            self.stamp[v.index()] = self.round;
            self.pos[v.index()] = self.heap.len() as u32;
            self.heap.push((key, v));
            self.sift_up(self.heap.len() - 1);
        }
        true
    }

    /// Remove and return the minimum entry.
    pub fn pop(&mut self) -> Option<(NodeId, f64)> {
        let n = self.heap.len();
        if n == 0 {
            return None;
        }
        self.heap.swap(0, n - 1);
        let (key, v) = self.heap.pop()?;
        // invalidate the popped node's slot so it may be requeued later
        self.stamp[v.index()] = self.round - 1;
        if let Some(&(_, top)) = self.heap.first() {
            self.pos[top.index()] = 0;
            self.sift_down(0);
        }
        Some((v, key))
    }

    fn sift_up(&mut self, mut i: usize) {
        while i > 0 {
            let parent = (i - 1) / 2;
            if before(self.heap[i], self.heap[parent]) {
                self.swap_slots(i, parent);
                i = parent;
            } else {
                break;
            }
        }
    }

    fn sift_down(&mut self, mut i: usize) {
        let n = self.heap.len();
        loop {
            let (l, r) = (2 * i + 1, 2 * i + 2);
            let mut best = i;
            if l < n && before(self.heap[l], self.heap[best]) {
                best = l;
            }
            if r < n && before(self.heap[r], self.heap[best]) {
                best = r;
            }
            if best == i {
                break;
            }
            self.swap_slots(i, best);
            i = best;
        }
    }

    #[inline]
    fn swap_slots(&mut self, a: usize, b: usize) {
        self.heap.swap(a, b);
        self.pos[self.heap[a].1.index()] = a as u32;
        self.pos[self.heap[b].1.index()] = b as u32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_in_key_order() {
        let mut h = NodeHeap::new(8);
        h.reset();
        for (v, k) in [(3u32, 2.5), (1, 0.5), (7, 9.0), (2, 1.5)] {
            assert!(h.push_or_decrease(NodeId::new(v), k));
        }
        let order: Vec<_> = std::iter::from_fn(|| h.pop()).map(|(v, _)| v.get()).collect();
        assert_eq!(order, vec![1, 2, 3, 7]);
    }

    #[test]
    fn decrease_key_reorders() {
        let mut h = NodeHeap::new(4);
        h.reset();
        h.push_or_decrease(NodeId::new(0), 5.0);
        h.push_or_decrease(NodeId::new(1), 1.0);
        // larger key is a no-op
        assert!(!h.push_or_decrease(NodeId::new(0), 6.0));
        assert!(h.push_or_decrease(NodeId::new(0), 0.5));
        assert_eq!(h.pop(), Some((NodeId::new(0), 0.5)));
        assert_eq!(h.pop(), Some((NodeId::new(1), 1.0)));
        assert_eq!(h.pop(), None);
    }

    #[test]
    fn ties_break_by_node_id() {
        let mut h = NodeHeap::new(8);
        h.reset();
        for v in [5u32, 2, 7, 0] {
            h.push_or_decrease(NodeId::new(v), 1.0);
        }
        let order: Vec<_> = std::iter::from_fn(|| h.pop()).map(|(v, _)| v.get()).collect();
        assert_eq!(order, vec![0, 2, 5, 7]);
    }

    #[test]
    fn reset_discards_entries() {
        let mut h = NodeHeap::new(4);
        h.reset();
        h.push_or_decrease(NodeId::new(2), 1.0);
        h.reset();
        assert!(h.is_empty());
        assert_eq!(h.pop(), None);
        // node can be requeued fresh after reset
        assert!(h.push_or_decrease(NodeId::new(2), 3.0));
        assert_eq!(h.pop(), Some((NodeId::new(2), 3.0)));
    }

    #[test]
    fn popped_node_can_reenter() {
        let mut h = NodeHeap::new(4);
        h.reset();
        h.push_or_decrease(NodeId::new(1), 2.0);
        assert_eq!(h.pop(), Some((NodeId::new(1), 2.0)));
        assert!(h.push_or_decrease(NodeId::new(1), 4.0));
        assert_eq!(h.pop(), Some((NodeId::new(1), 4.0)));
    }
}
