//! Small dense MSTs over extension-tree leaves.
//!
//! The MST bound never spans more than a couple dozen nodes (the leaf cap
//! plus one), so everything here is O(k²) with dense scratch arrays and no
//! per-call allocation. [`ParentMst`] is the stored form: one parent link and
//! edge weight per slot. [`DynamicMst`] is the long-lived workspace that
//! builds base MSTs from a pairwise-distance callback and extends a base MST
//! by one node ("with the extending node") into a reusable output buffer.
//!
//! Slots are positions in the caller's leaf list, not graph node ids; the
//! caller keeps the mapping.

use crate::debug_invariants::DebugInvariants;
use crate::reduce_error::ReduceError;

/// Sentinel parent of the MST root slot.
pub const NO_PARENT: u32 = u32::MAX;

/// Parent-array MST over `k` slots: slot 0 is the root.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParentMst {
    parent: Vec<u32>,
    pweight: Vec<f64>,
    total: f64,
}

impl ParentMst {
    #[inline]
    pub fn nslots(&self) -> usize {
        self.parent.len()
    }

    /// Sum of all parent-edge weights.
    #[inline]
    pub fn weight(&self) -> f64 {
        self.total
    }

    #[inline]
    pub fn parent(&self, slot: usize) -> u32 {
        self.parent[slot]
    }

    #[inline]
    pub fn parent_weight(&self, slot: usize) -> f64 {
        self.pweight[slot]
    }

    fn clear(&mut self) {
        self.parent.clear();
        self.pweight.clear();
        self.total = 0.0;
    }

    fn push_slot(&mut self, parent: u32, weight: f64) {
        self.parent.push(parent);
        self.pweight.push(weight);
        if parent != NO_PARENT {
            self.total += weight;
        }
    }
}

impl DebugInvariants for ParentMst {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "ParentMst invalid");
    }

    fn validate_invariants(&self) -> Result<(), ReduceError> {
        let k = self.nslots();
        let mut sum = 0.0;
        for s in 0..k {
            let p = self.parent[s];
            if p == NO_PARENT {
                continue;
            }
            if p as usize >= k || p as usize == s {
                return Err(ReduceError::InvariantViolation(format!(
                    "slot {s} has parent {p} outside the slot range"
                )));
            }
            sum += self.pweight[s];
        }
        if k > 0 && self.parent.iter().filter(|&&p| p == NO_PARENT).count() != 1 {
            return Err(ReduceError::InvariantViolation(
                "MST must have exactly one root slot".into(),
            ));
        }
        let agree = if sum.is_finite() && self.total.is_finite() {
            (sum - self.total).abs() <= 1e-6 * (1.0 + sum.abs())
        } else {
            sum.is_finite() == self.total.is_finite()
        };
        if !agree {
            return Err(ReduceError::InvariantViolation(
                "stored MST weight disagrees with parent edges".into(),
            ));
        }
        Ok(())
    }
}

/// Long-lived MST workspace shared by all checks of a reduction round.
///
/// Protocol for the one-node extension: push the new node's distance to every
/// base slot with [`DynamicMst::push_adj_cost`], call
/// [`DynamicMst::mst_with_extra`], read the result, done — the adjacency
/// buffer is consumed by the call. Between checks the workspace must be
/// clean ([`DynamicMst::debug_assert_clean`]).
#[derive(Clone, Debug)]
pub struct DynamicMst {
    adj: Vec<f64>,
    best: Vec<f64>,
    from: Vec<u32>,
    in_tree: Vec<bool>,
    out: ParentMst,
}

impl DynamicMst {
    /// Workspace for MSTs of up to `max_slots` slots (including any extending
    /// node).
    pub fn new(max_slots: usize) -> Self {
        Self {
            adj: Vec::with_capacity(max_slots),
            best: vec![f64::INFINITY; max_slots],
            from: vec![NO_PARENT; max_slots],
            in_tree: vec![false; max_slots],
            out: ParentMst::default(),
        }
    }

    /// `true` when no extension is mid-flight.
    #[inline]
    pub fn is_clean(&self) -> bool {
        self.adj.is_empty()
    }

    pub fn debug_assert_clean(&self) {
        debug_assert!(self.is_clean(), "MST workspace left with adjacency costs");
    }

    /// Append the extending node's distance to the next base slot.
    pub fn push_adj_cost(&mut self, d: f64) {
        self.adj.push(d);
    }

    #[inline]
    pub fn adj_len(&self) -> usize {
        self.adj.len()
    }

    /// Drop a half-prepared extension.
    pub fn clear_adj(&mut self) {
        self.adj.clear();
    }

    /// Build an MST over the complete graph on `k` slots with pairwise
    /// distances from `dist` (called with `i < j` only).
    ///
    /// # Complexity
    /// O(k²) time, no allocation beyond the returned MST.
    pub fn build_complete<F>(&mut self, k: usize, mut dist: F) -> ParentMst
    where
        F: FnMut(usize, usize) -> f64,
    {
        let mut mst = ParentMst::default();
        if k == 0 {
            return mst;
        }
        self.reset_scratch(k);
        self.best[0] = 0.0;

        for _ in 0..k {
            let u = self.cheapest_open(k);
            self.in_tree[u] = true;
            for j in 0..k {
                if !self.in_tree[j] {
                    let d = if u < j { dist(u, j) } else { dist(j, u) };
                    if d < self.best[j] {
                        self.best[j] = d;
                        self.from[j] = u as u32;
                    }
                }
            }
        }
        self.emit_slots(k, &mut mst);
        mst
    }

    /// MST over `base`'s slots plus one extending node whose distances were
    /// pushed via [`DynamicMst::push_adj_cost`] (one per base slot, in slot
    /// order). The extending node occupies the last slot of the result.
    ///
    /// Candidate edges are the base MST edges plus the extension star; that
    /// set always contains an MST of the grown slot set.
    ///
    /// # Panics
    /// Panics if the adjacency buffer length differs from `base.nslots()`.
    ///
    /// # Complexity
    /// O(k²) time; the adjacency buffer is cleared before returning.
    pub fn mst_with_extra(&mut self, base: &ParentMst) -> &ParentMst {
        let k = base.nslots();
        assert_eq!(
            self.adj.len(),
            k,
            "extension needs one adjacency cost per base slot"
        );
        let n = k + 1;
        self.reset_scratch(n);
        self.best[0] = 0.0;

        for _ in 0..n {
            let u = self.cheapest_open(n);
            self.in_tree[u] = true;
            // relax base MST edges incident to u, and the star edge
            if u < k {
                for v in 0..k {
                    let p = base.parent(v);
                    if p == NO_PARENT {
                        continue;
                    }
                    let (a, b, w) = (v, p as usize, base.parent_weight(v));
                    let other = if a == u {
                        b
                    } else if b == u {
                        a
                    } else {
                        continue;
                    };
                    if !self.in_tree[other] && w < self.best[other] {
                        self.best[other] = w;
                        self.from[other] = u as u32;
                    }
                }
                if !self.in_tree[k] && self.adj[u] < self.best[k] {
                    self.best[k] = self.adj[u];
                    self.from[k] = u as u32;
                }
            } else {
                for (v, &w) in self.adj.iter().enumerate() {
                    if !self.in_tree[v] && w < self.best[v] {
                        self.best[v] = w;
                        self.from[v] = u as u32;
                    }
                }
            }
        }

        let mut out = std::mem::take(&mut self.out);
        out.clear();
        self.emit_slots(n, &mut out);
        self.out = out;
        self.adj.clear();
        &self.out
    }

    /// Write the Prim result for `n` slots into `mst`. A slot never reached
    /// (infinite best key) is attached to the root with its infinite weight,
    /// so a disconnected extension shows up as an infinite total.
    fn emit_slots(&self, n: usize, mst: &mut ParentMst) {
        mst.push_slot(NO_PARENT, 0.0);
        for s in 1..n {
            let p = if self.from[s] == NO_PARENT {
                0
            } else {
                self.from[s]
            };
            mst.push_slot(p, self.best[s]);
        }
    }

    /// Smallest open slot by key, ties to the lowest index.
    fn cheapest_open(&self, n: usize) -> usize {
        let mut u = usize::MAX;
        let mut ubest = f64::INFINITY;
        for j in 0..n {
            if !self.in_tree[j] && (u == usize::MAX || self.best[j] < ubest) {
                u = j;
                ubest = self.best[j];
            }
        }
        u
    }

    fn reset_scratch(&mut self, n: usize) {
        if self.best.len() < n {
            self.best.resize(n, f64::INFINITY);
            self.from.resize(n, NO_PARENT);
            self.in_tree.resize(n, false);
        }
        for j in 0..n {
            self.best[j] = f64::INFINITY;
            self.from[j] = NO_PARENT;
            self.in_tree[j] = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_mst_on_three_slots() {
        let mut ws = DynamicMst::new(8);
        // d(0,1)=1, d(0,2)=4, d(1,2)=2
        let d = [[0.0, 1.0, 4.0], [1.0, 0.0, 2.0], [4.0, 2.0, 0.0]];
        let mst = ws.build_complete(3, |i, j| d[i][j]);
        assert_eq!(mst.nslots(), 3);
        assert_eq!(mst.weight(), 3.0);
        mst.debug_assert_invariants();
    }

    #[test]
    fn singleton_and_empty() {
        let mut ws = DynamicMst::new(4);
        let empty = ws.build_complete(0, |_, _| unreachable!());
        assert_eq!(empty.weight(), 0.0);
        let single = ws.build_complete(1, |_, _| unreachable!());
        assert_eq!(single.nslots(), 1);
        assert_eq!(single.weight(), 0.0);
    }

    #[test]
    fn extension_matches_rebuilt_mst() {
        let mut ws = DynamicMst::new(8);
        let d = [
            [0.0, 3.0, 1.0, 2.5],
            [3.0, 0.0, 2.0, 0.5],
            [1.0, 2.0, 0.0, 9.0],
            [2.5, 0.5, 9.0, 0.0],
        ];
        let base = ws.build_complete(3, |i, j| d[i][j]);
        for s in 0..3 {
            ws.push_adj_cost(d[s][3]);
        }
        let grown_weight = ws.mst_with_extra(&base).weight();
        let full = ws.build_complete(4, |i, j| d[i][j]);
        assert_eq!(grown_weight, full.weight());
        assert!(ws.is_clean());
    }

    #[test]
    fn extension_can_reroute_base_edges() {
        let mut ws = DynamicMst::new(8);
        // base MST on {0,1}: edge of weight 10; new node is close to both
        let base = ws.build_complete(2, |_, _| 10.0);
        assert_eq!(base.weight(), 10.0);
        ws.push_adj_cost(1.0);
        ws.push_adj_cost(1.0);
        let grown = ws.mst_with_extra(&base);
        // expensive base edge replaced by the two star edges
        assert_eq!(grown.weight(), 2.0);
        grown.debug_assert_invariants();
    }

    #[test]
    fn infinite_distances_stay_in_weight() {
        let mut ws = DynamicMst::new(4);
        let base = ws.build_complete(2, |_, _| 4.0);
        ws.push_adj_cost(f64::INFINITY);
        ws.push_adj_cost(f64::INFINITY);
        let grown = ws.mst_with_extra(&base);
        assert!(grown.weight().is_infinite());
    }

    #[test]
    #[should_panic(expected = "one adjacency cost per base slot")]
    fn wrong_adjacency_count_panics() {
        let mut ws = DynamicMst::new(4);
        let base = ws.build_complete(2, |_, _| 1.0);
        ws.push_adj_cost(1.0);
        let _ = ws.mst_with_extra(&base);
    }
}
