//! Pseudo-ancestor witness bookkeeping.
//!
//! When a reduction technique eliminates a structure (a node, a chain, a
//! reconnection) by rerouting through surviving edges, those edges receive a
//! *witness id* recording what they stand in for. Two edges carrying the same
//! witness must never both be assumed inside one candidate tree: that would
//! count the eliminated structure twice and make the combined bound unsound.
//!
//! The extension engine therefore *hashes* every edge it merges into a dense
//! mark array and treats a second occurrence of any witness as a conflict. A
//! conflicting edge reverts its own partial hash before reporting, so the mark
//! array always reflects a set of fully-hashed edges and the caller can unwind
//! the rest of the component edge by edge.

use crate::graph::id::ArcId;

/// Per-edge witness id lists, owned by the reduction driver.
///
/// Lists are keyed by undirected edge index ([`ArcId::edge`]) since both
/// orientations stand in for the same eliminations. Witness ids are small
/// dense integers; [`PseudoAncestors::mark_len`] bounds the mark array needed
/// to hash against them.
#[derive(Clone, Debug, Default)]
pub struct PseudoAncestors {
    lists: Vec<Vec<u32>>,
    nwitnesses: usize,
}

impl PseudoAncestors {
    /// Empty witness lists for a graph with `nedges` undirected edges.
    pub fn new(nedges: usize) -> Self {
        Self {
            lists: vec![Vec::new(); nedges],
            nwitnesses: 0,
        }
    }

    #[inline]
    pub fn nedges(&self) -> usize {
        self.lists.len()
    }

    /// Size a mark array must have to hash any edge of this registry.
    #[inline]
    pub fn mark_len(&self) -> usize {
        self.nwitnesses
    }

    /// Witnesses recorded on an edge, in insertion order.
    #[inline]
    pub fn witnesses(&self, edge: usize) -> &[u32] {
        &self.lists[edge]
    }

    /// Record that `edge` stands in for eliminated structure `witness`.
    /// Duplicate witnesses on one edge are ignored.
    ///
    /// # Panics
    /// Panics if `edge` is out of range.
    pub fn add_witness(&mut self, edge: usize, witness: u32) {
        let list = &mut self.lists[edge];
        if !list.contains(&witness) {
            list.push(witness);
            self.nwitnesses = self.nwitnesses.max(witness as usize + 1);
        }
    }

    /// Copy all witnesses of `src` onto `dst` (used when an edge replaces
    /// another during contraction). Returns `false` if the two lists already
    /// share a witness, in which case `dst` is left unchanged.
    pub fn append_copy(&mut self, dst: usize, src: usize) -> bool {
        if dst == src {
            return false;
        }
        let conflict = self.lists[src]
            .iter()
            .any(|w| self.lists[dst].contains(w));
        if conflict {
            return false;
        }
        let mut copied = self.lists[src].clone();
        self.lists[dst].append(&mut copied);
        true
    }

    /// Hash all witnesses of the edge containing `arc` into `marks`.
    ///
    /// Returns `true` on success. On a conflict (some witness already marked)
    /// the witnesses marked so far *by this call* are reverted and `false` is
    /// returned; marks then still describe exactly the previously hashed edges.
    pub fn hash_edge(&self, arc: ArcId, marks: &mut AncestorMarks) -> bool {
        let list = &self.lists[arc.edge()];
        for (i, &w) in list.iter().enumerate() {
            if marks.set[w as usize] {
                for &u in &list[..i] {
                    marks.set[u as usize] = false;
                }
                return false;
            }
            marks.set[w as usize] = true;
        }
        true
    }

    /// Exact inverse of a successful [`PseudoAncestors::hash_edge`] call.
    pub fn unhash_edge(&self, arc: ArcId, marks: &mut AncestorMarks) {
        for &w in &self.lists[arc.edge()] {
            debug_assert!(marks.set[w as usize], "unhashing a witness not marked");
            marks.set[w as usize] = false;
        }
    }

    /// Would hashing this edge conflict with the current marks?
    /// Read-only variant of [`PseudoAncestors::hash_edge`] used for screening.
    pub fn edge_conflicts(&self, arc: ArcId, marks: &AncestorMarks) -> bool {
        self.lists[arc.edge()]
            .iter()
            .any(|&w| marks.set[w as usize])
    }
}

/// Dense witness mark array used while a single check is running.
///
/// Lives in the permanent scratch so repeated checks reuse the allocation;
/// every check must leave it clean (all false).
#[derive(Clone, Debug, Default)]
pub struct AncestorMarks {
    set: Vec<bool>,
}

impl AncestorMarks {
    pub fn new(len: usize) -> Self {
        Self {
            set: vec![false; len],
        }
    }

    /// Grow to cover at least `len` witness ids; existing marks keep.
    pub fn ensure_len(&mut self, len: usize) {
        if self.set.len() < len {
            self.set.resize(len, false);
        }
    }

    /// `true` when no witness is marked (the between-checks resting state).
    pub fn is_clean(&self) -> bool {
        self.set.iter().all(|&m| !m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fwd(edge: u32) -> ArcId {
        ArcId::new(2 * edge)
    }

    #[test]
    fn hash_unhash_roundtrip() {
        let mut pa = PseudoAncestors::new(3);
        pa.add_witness(0, 2);
        pa.add_witness(0, 5);
        pa.add_witness(1, 7);
        let mut marks = AncestorMarks::new(pa.mark_len());

        assert!(pa.hash_edge(fwd(0), &mut marks));
        assert!(pa.hash_edge(fwd(1), &mut marks));
        pa.unhash_edge(fwd(1), &mut marks);
        pa.unhash_edge(fwd(0), &mut marks);
        assert!(marks.is_clean());
    }

    #[test]
    fn conflict_reverts_partial_hash() {
        let mut pa = PseudoAncestors::new(2);
        // edge 1 marks witness 9 first, then hits the conflict on 3
        pa.add_witness(0, 3);
        pa.add_witness(1, 9);
        pa.add_witness(1, 3);
        let mut marks = AncestorMarks::new(pa.mark_len());

        assert!(pa.hash_edge(fwd(0), &mut marks));
        assert!(!pa.hash_edge(fwd(1), &mut marks));
        // only edge 0's witnesses remain marked
        assert!(pa.edge_conflicts(fwd(1), &marks));
        pa.unhash_edge(fwd(0), &mut marks);
        assert!(marks.is_clean());
    }

    #[test]
    fn both_orientations_share_witnesses() {
        let mut pa = PseudoAncestors::new(1);
        pa.add_witness(0, 1);
        let mut marks = AncestorMarks::new(pa.mark_len());
        assert!(pa.hash_edge(ArcId::new(1), &mut marks));
        assert!(pa.edge_conflicts(ArcId::new(0), &marks));
        pa.unhash_edge(ArcId::new(1), &mut marks);
        assert!(marks.is_clean());
    }

    #[test]
    fn empty_lists_never_conflict() {
        let pa = PseudoAncestors::new(4);
        let mut marks = AncestorMarks::new(pa.mark_len());
        for e in 0..4 {
            assert!(pa.hash_edge(fwd(e), &mut marks));
        }
        assert!(marks.is_clean());
    }

    #[test]
    fn append_copy_detects_overlap() {
        let mut pa = PseudoAncestors::new(3);
        pa.add_witness(0, 1);
        pa.add_witness(1, 2);
        pa.add_witness(2, 1);
        assert!(pa.append_copy(0, 1));
        assert_eq!(pa.witnesses(0), &[1, 2]);
        // overlap on witness 1
        assert!(!pa.append_copy(0, 2));
        assert_eq!(pa.witnesses(0), &[1, 2]);
    }
}
