//! Per-depth stack of leaf-set snapshots and their special-distance MSTs.
//!
//! Pushed and popped in lockstep with extension-tree depth: each level holds
//! the tree's leaf list as it looked when that depth was entered, plus the
//! MST over those leaves under special distances ("without the extending
//! node"). The engine extends the top MST by one candidate node during
//! screening, into the [`DynamicMst`](crate::mst::DynamicMst) output buffer.

use crate::debug_invariants::DebugInvariants;
use crate::graph::id::NodeId;
use crate::mst::dynamic::ParentMst;
use crate::reduce_error::ReduceError;

/// Depth-synchronized MST storage. Slot `i` of a level's MST corresponds to
/// `leaves()[i]` of the same level.
#[derive(Clone, Debug, Default)]
pub struct MstLevels {
    leaves: Vec<NodeId>,
    leaf_start: Vec<u32>,
    msts: Vec<ParentMst>,
}

impl MstLevels {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn nlevels(&self) -> usize {
        self.msts.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.msts.is_empty()
    }

    /// Snapshot `leaves` and its MST as the new top level.
    ///
    /// # Panics
    /// Panics if the MST slot count differs from the leaf count.
    pub fn push_level(&mut self, leaves: &[NodeId], mst: ParentMst) {
        assert_eq!(
            mst.nslots(),
            leaves.len(),
            "MST slots must correspond to the leaf snapshot"
        );
        self.leaf_start.push(self.leaves.len() as u32);
        self.leaves.extend_from_slice(leaves);
        self.msts.push(mst);
    }

    /// Remove the top level.
    ///
    /// # Panics
    /// Panics if no level exists.
    pub fn pop_level(&mut self) {
        let start = self
            .leaf_start
            .pop()
            .unwrap_or_else(|| panic!("no MST level to pop"));
        self.leaves.truncate(start as usize);
        self.msts.pop();
    }

    /// Leaf snapshot of the top level.
    ///
    /// # Panics
    /// Panics if no level exists.
    pub fn top_leaves(&self) -> &[NodeId] {
        let start = *self
            .leaf_start
            .last()
            .unwrap_or_else(|| panic!("no MST level on the stack"));
        &self.leaves[start as usize..]
    }

    /// MST of the top level's leaf snapshot.
    ///
    /// # Panics
    /// Panics if no level exists.
    pub fn top_mst(&self) -> &ParentMst {
        self.msts
            .last()
            .unwrap_or_else(|| panic!("no MST level on the stack"))
    }

    /// Drop all levels (end of a check).
    pub fn clear(&mut self) {
        self.leaves.clear();
        self.leaf_start.clear();
        self.msts.clear();
    }
}

impl DebugInvariants for MstLevels {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "MstLevels invalid");
    }

    fn validate_invariants(&self) -> Result<(), ReduceError> {
        if self.leaf_start.len() != self.msts.len() {
            return Err(ReduceError::InvariantViolation(
                "leaf ranges out of sync with MSTs".into(),
            ));
        }
        if self.leaf_start.windows(2).any(|w| w[0] > w[1]) {
            return Err(ReduceError::InvariantViolation(
                "leaf ranges not monotone".into(),
            ));
        }
        for (i, mst) in self.msts.iter().enumerate() {
            let lo = self.leaf_start[i] as usize;
            let hi = self
                .leaf_start
                .get(i + 1)
                .map_or(self.leaves.len(), |&s| s as usize);
            if mst.nslots() != hi - lo {
                return Err(ReduceError::InvariantViolation(format!(
                    "level {i}: {} MST slots for {} leaves",
                    mst.nslots(),
                    hi - lo
                )));
            }
            mst.validate_invariants()?;
        }
        Ok(())
    }
}
