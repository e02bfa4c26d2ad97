//! Deletion marker overlay for arcs eliminated by earlier reductions.
//!
//! The graph itself is frozen; reductions record eliminations here instead.
//! The extension engine consults this overlay when accumulating tree reduced
//! costs (a tree edge whose reverse arc is deleted counts as "virtually
//! included" rather than contributing its reduced cost) and when screening
//! candidate arcs.

use crate::graph::id::ArcId;

/// Dense per-arc deletion flags, maintained by the reduction driver.
///
/// Orientations are independent: a directed rule-out marks one arc, an edge
/// elimination marks both via [`DeletedArcs::mark_edge`].
#[derive(Clone, Debug)]
pub struct DeletedArcs {
    del: Vec<bool>,
    ndeleted: usize,
}

impl DeletedArcs {
    /// All-alive marker array for a graph with `narcs` arcs.
    pub fn new(narcs: usize) -> Self {
        Self {
            del: vec![false; narcs],
            ndeleted: 0,
        }
    }

    #[inline]
    pub fn narcs(&self) -> usize {
        self.del.len()
    }

    /// Number of arcs currently marked deleted.
    #[inline]
    pub fn ndeleted(&self) -> usize {
        self.ndeleted
    }

    /// # Panics
    /// Panics if `a` is out of range for the graph this overlay was sized for.
    #[inline]
    pub fn is_deleted(&self, a: ArcId) -> bool {
        self.del[a.index()]
    }

    /// Mark a single orientation deleted. Idempotent.
    ///
    /// # Panics
    /// Panics if `a` is out of range.
    pub fn mark(&mut self, a: ArcId) {
        if !self.del[a.index()] {
            self.del[a.index()] = true;
            self.ndeleted += 1;
        }
    }

    /// Mark both orientations of the edge containing `a` deleted.
    ///
    /// # Panics
    /// Panics if `a` is out of range.
    pub fn mark_edge(&mut self, a: ArcId) {
        self.mark(a);
        self.mark(a.flip());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mark_single_orientation() {
        let mut d = DeletedArcs::new(8);
        assert!(!d.is_deleted(ArcId::new(4)));
        d.mark(ArcId::new(4));
        assert!(d.is_deleted(ArcId::new(4)));
        assert!(!d.is_deleted(ArcId::new(5)));
        assert_eq!(d.ndeleted(), 1);
        // idempotent
        d.mark(ArcId::new(4));
        assert_eq!(d.ndeleted(), 1);
    }

    #[test]
    fn mark_edge_hits_both() {
        let mut d = DeletedArcs::new(8);
        d.mark_edge(ArcId::new(7));
        assert!(d.is_deleted(ArcId::new(6)));
        assert!(d.is_deleted(ArcId::new(7)));
        assert_eq!(d.ndeleted(), 2);
    }
}
