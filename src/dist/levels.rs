//! Depth-indexed distance cache with stack discipline.
//!
//! Levels correspond 1:1 to DFS depth. While the search sits at depth `d` it
//! may open one level, fill it slot by slot (one slot per base node, each
//! holding `(target, distance)` pairs computed as a side effect of rule-out
//! tests), close the level, and from then on query it. Backtracking pops the
//! level and restores the exact pre-open state, so cache memory is
//! O(search depth · slot width), never O(graph).
//!
//! Misuse is a programming error, not a recoverable condition: opening a new
//! level while the top one is still unclosed, or popping with a slot half
//! filled, panics. The engine owns the discipline; these panics only fire on
//! engine bugs.

use crate::debug_invariants::DebugInvariants;
use crate::graph::id::NodeId;
use crate::reduce_error::ReduceError;

#[derive(Clone, Copy, Debug)]
struct SlotRec {
    base: NodeId,
    target_start: u32,
    target_len: u32,
}

#[derive(Clone, Copy, Debug)]
struct LevelRec {
    slot_start: u32,
    target_start: u32,
    closed: bool,
}

/// Stack of per-depth distance levels. Two instances live in each check:
/// one keyed by the deepest leaf against all other leaves, one keyed by
/// same-depth leaves against each other.
#[derive(Clone, Debug, Default)]
pub struct SdLevels {
    slots: Vec<SlotRec>,
    targets: Vec<NodeId>,
    dists: Vec<f64>,
    levels: Vec<LevelRec>,
    slot_open: bool,
}

impl SdLevels {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn nlevels(&self) -> usize {
        self.levels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// `true` once the top level has been sealed for querying.
    ///
    /// # Panics
    /// Panics if no level exists.
    #[inline]
    pub fn top_closed(&self) -> bool {
        self.top().closed
    }

    /// Open a fresh level at the next depth.
    ///
    /// # Panics
    /// Panics if the current top level is still unclosed.
    pub fn open_level(&mut self) {
        assert!(
            self.levels.last().is_none_or(|l| l.closed),
            "opening a level while the top level is unclosed"
        );
        self.levels.push(LevelRec {
            slot_start: self.slots.len() as u32,
            target_start: self.targets.len() as u32,
            closed: false,
        });
    }

    /// Start a slot for `base` on the open top level.
    ///
    /// # Panics
    /// Panics if no unclosed level is on top, or a slot is already open.
    pub fn open_slot(&mut self, base: NodeId) {
        assert!(!self.slot_open, "a slot is already open");
        assert!(!self.top().closed, "top level is closed");
        self.slots.push(SlotRec {
            base,
            target_start: self.targets.len() as u32,
            target_len: 0,
        });
        self.slot_open = true;
    }

    /// Append a `(target, dist)` pair to the open slot.
    ///
    /// # Panics
    /// Panics if no slot is open.
    pub fn push_target(&mut self, target: NodeId, dist: f64) {
        assert!(self.slot_open, "no open slot");
        self.targets.push(target);
        self.dists.push(dist);
    }

    /// Seal the open slot; its entries become part of the level.
    ///
    /// # Panics
    /// Panics if no slot is open.
    pub fn commit_slot(&mut self) {
        assert!(self.slot_open, "no open slot");
        let slot = self
            .slots
            .last_mut()
            .expect("slot_open implies a slot record");
        slot.target_len = self.targets.len() as u32 - slot.target_start;
        self.slot_open = false;
    }

    /// Roll the open slot back as if it was never opened.
    ///
    /// # Panics
    /// Panics if no slot is open.
    pub fn discard_slot(&mut self) {
        assert!(self.slot_open, "no open slot");
        let slot = self
            .slots
            .pop()
            .expect("slot_open implies a slot record");
        self.targets.truncate(slot.target_start as usize);
        self.dists.truncate(slot.target_start as usize);
        self.slot_open = false;
    }

    /// Freeze the top level for querying; no further slots may be added.
    ///
    /// # Panics
    /// Panics if no level exists, a slot is open, or the level is already
    /// closed.
    pub fn close_level(&mut self) {
        assert!(!self.slot_open, "closing a level with an open slot");
        let top = self
            .levels
            .last_mut()
            .unwrap_or_else(|| panic!("no level to close"));
        assert!(!top.closed, "top level already closed");
        top.closed = true;
    }

    /// Remove the top level, closed or not, restoring the exact pre-open
    /// state.
    ///
    /// # Panics
    /// Panics if no level exists or a slot is open.
    pub fn pop_level(&mut self) {
        assert!(!self.slot_open, "popping a level with an open slot");
        let rec = self
            .levels
            .pop()
            .unwrap_or_else(|| panic!("no level to pop"));
        self.slots.truncate(rec.slot_start as usize);
        self.targets.truncate(rec.target_start as usize);
        self.dists.truncate(rec.target_start as usize);
    }

    /// Cached distance from `base` to `target` on the closed top level.
    ///
    /// # Panics
    /// Panics if no level exists or the top level is still open for filling.
    pub fn lookup(&self, base: NodeId, target: NodeId) -> Option<f64> {
        let top = self.top();
        assert!(top.closed, "querying an unclosed level");
        let slots = &self.slots[top.slot_start as usize..];
        let slot = slots.iter().find(|s| s.base == base)?;
        let lo = slot.target_start as usize;
        let hi = lo + slot.target_len as usize;
        self.targets[lo..hi]
            .iter()
            .position(|&t| t == target)
            .map(|i| self.dists[lo + i])
    }

    /// Does the closed top level carry a slot for `base`?
    ///
    /// # Panics
    /// Panics if no level exists or the top level is still open for filling.
    pub fn top_has_base(&self, base: NodeId) -> bool {
        let top = self.top();
        assert!(top.closed, "querying an unclosed level");
        self.slots[top.slot_start as usize..]
            .iter()
            .any(|s| s.base == base)
    }

    #[inline]
    fn top(&self) -> &LevelRec {
        self.levels
            .last()
            .unwrap_or_else(|| panic!("no level on the stack"))
    }
}

impl DebugInvariants for SdLevels {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "SdLevels invalid");
    }

    fn validate_invariants(&self) -> Result<(), ReduceError> {
        if self.targets.len() != self.dists.len() {
            return Err(ReduceError::InvariantViolation(
                "target/dist arrays out of sync".into(),
            ));
        }
        if self.levels.windows(2).any(|w| {
            w[0].slot_start > w[1].slot_start || w[0].target_start > w[1].target_start
        }) {
            return Err(ReduceError::InvariantViolation(
                "level offsets not monotone".into(),
            ));
        }
        let committed = if self.slot_open {
            self.slots.len().saturating_sub(1)
        } else {
            self.slots.len()
        };
        let mut expect = self.slots.first().map_or(0, |s| s.target_start);
        for s in &self.slots[..committed] {
            if s.target_start != expect {
                return Err(ReduceError::InvariantViolation(
                    "slot target ranges not contiguous".into(),
                ));
            }
            expect += s.target_len;
        }
        if !self.slot_open && expect as usize != self.targets.len() {
            return Err(ReduceError::InvariantViolation(
                "trailing targets not owned by any slot".into(),
            ));
        }
        Ok(())
    }
}
