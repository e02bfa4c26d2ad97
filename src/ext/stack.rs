//! Explicit DFS stack of extension components.
//!
//! Components share one flat edge buffer; each stack record is a range start
//! plus a lifecycle tag. Ranges nest LIFO, so popping truncates the buffer.
//! Both the buffer and the record count carry hard caps; a push that would
//! overflow reports failure and leaves the stack untouched, the caller
//! backtracks.

use crate::debug_invariants::DebugInvariants;
use crate::graph::id::ArcId;
use crate::reduce_error::ReduceError;

/// Lifecycle of a component. Transitions only ever advance:
/// `Pending` → `Expanded` → `Marked`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum CompState {
    /// Raw candidate set awaiting screening and subset expansion.
    Pending,
    /// Concrete subset awaiting merge into the tree.
    Expanded,
    /// Merged into the tree and not ruled out; awaiting its subtree.
    Marked,
}

#[derive(Clone, Debug)]
struct CompRec {
    start: u32,
    state: CompState,
    /// Engine bookkeeping: number of screening-cache levels this component
    /// owns and must release when it resolves.
    cache_levels: u32,
}

/// Array-backed component stack with capacity caps.
#[derive(Clone, Debug)]
pub struct CompStack {
    edges: Vec<ArcId>,
    comps: Vec<CompRec>,
    max_edges: usize,
    max_comps: usize,
}

impl CompStack {
    pub fn new(max_edges: usize, max_comps: usize) -> Self {
        Self {
            edges: Vec::new(),
            comps: Vec::new(),
            max_edges,
            max_comps,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.comps.is_empty()
    }

    #[inline]
    pub fn ncomps(&self) -> usize {
        self.comps.len()
    }

    #[inline]
    pub fn nedges_buffered(&self) -> usize {
        self.edges.len()
    }

    /// Would `nedges` more edges and one more component fit?
    #[inline]
    pub fn can_push(&self, nedges: usize) -> bool {
        self.comps.len() < self.max_comps && self.edges.len() + nedges <= self.max_edges
    }

    /// Push a component. Returns `false` (stack untouched) on a capacity
    /// overflow; the caller treats that as check failure, never as silent
    /// truncation.
    #[must_use]
    pub fn push(&mut self, state: CompState, comp: &[ArcId]) -> bool {
        if !self.can_push(comp.len()) {
            return false;
        }
        self.comps.push(CompRec {
            start: self.edges.len() as u32,
            state,
            cache_levels: 0,
        });
        self.edges.extend_from_slice(comp);
        true
    }

    /// Drop the top component and its edge range.
    ///
    /// # Panics
    /// Panics on an empty stack.
    pub fn pop(&mut self) {
        let rec = self.comps.pop().expect("pop on empty component stack");
        self.edges.truncate(rec.start as usize);
    }

    fn top(&self) -> &CompRec {
        self.comps.last().expect("empty component stack")
    }

    /// # Panics
    /// Panics on an empty stack.
    #[inline]
    pub fn top_state(&self) -> CompState {
        self.top().state
    }

    /// # Panics
    /// Panics on an empty stack.
    #[inline]
    pub fn top_edges(&self) -> &[ArcId] {
        &self.edges[self.top().start as usize..]
    }

    /// Advance the top component's lifecycle tag.
    pub fn advance_top(&mut self, state: CompState) {
        let rec = self.comps.last_mut().expect("empty component stack");
        debug_assert!(rec.state < state, "component state may only advance");
        rec.state = state;
    }

    #[inline]
    pub fn top_cache_levels(&self) -> u32 {
        self.top().cache_levels
    }

    /// Record one more screening-cache level owed by the top component.
    pub fn add_top_cache_level(&mut self) {
        self.comps.last_mut().expect("empty component stack").cache_levels += 1;
    }
}

impl DebugInvariants for CompStack {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "CompStack invalid");
    }

    fn validate_invariants(&self) -> Result<(), ReduceError> {
        if self.comps.len() > self.max_comps || self.edges.len() > self.max_edges {
            return Err(ReduceError::InvariantViolation(format!(
                "stack exceeds caps: {} comps, {} edges",
                self.comps.len(),
                self.edges.len()
            )));
        }
        let mut prev = 0u32;
        for rec in &self.comps {
            if rec.start < prev || rec.start as usize > self.edges.len() {
                return Err(ReduceError::InvariantViolation(format!(
                    "component starts not monotone at {}",
                    rec.start
                )));
            }
            prev = rec.start;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arcs(ids: &[u32]) -> Vec<ArcId> {
        ids.iter().map(|&i| ArcId::new(i)).collect()
    }

    #[test]
    fn push_pop_tracks_ranges() {
        let mut s = CompStack::new(16, 4);
        assert!(s.push(CompState::Expanded, &arcs(&[0])));
        assert!(s.push(CompState::Pending, &arcs(&[2, 4, 6])));
        assert_eq!(s.ncomps(), 2);
        assert_eq!(s.top_edges(), &arcs(&[2, 4, 6])[..]);
        assert_eq!(s.top_state(), CompState::Pending);

        s.pop();
        assert_eq!(s.top_edges(), &arcs(&[0])[..]);
        assert_eq!(s.nedges_buffered(), 1);
        s.debug_assert_invariants();
    }

    #[test]
    fn capacity_overflow_leaves_stack_untouched() {
        let mut s = CompStack::new(4, 2);
        assert!(s.push(CompState::Expanded, &arcs(&[0, 2])));
        // edge cap
        assert!(!s.push(CompState::Pending, &arcs(&[4, 6, 8])));
        assert_eq!(s.ncomps(), 1);
        assert_eq!(s.nedges_buffered(), 2);
        // component cap
        assert!(s.push(CompState::Pending, &arcs(&[4])));
        assert!(!s.push(CompState::Pending, &arcs(&[6])));
        assert_eq!(s.ncomps(), 2);
        s.debug_assert_invariants();
    }

    #[test]
    fn states_advance_and_cache_flags_stick() {
        let mut s = CompStack::new(8, 4);
        assert!(s.push(CompState::Pending, &arcs(&[0, 2])));
        s.advance_top(CompState::Expanded);
        s.advance_top(CompState::Marked);
        assert_eq!(s.top_state(), CompState::Marked);
        assert_eq!(s.top_cache_levels(), 0);
        s.add_top_cache_level();
        s.add_top_cache_level();
        assert_eq!(s.top_cache_levels(), 2);
    }

    #[test]
    #[should_panic(expected = "empty component stack")]
    fn pop_on_empty_panics() {
        let mut s = CompStack::new(8, 4);
        s.pop();
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "only advance")]
    fn state_regression_is_rejected() {
        let mut s = CompStack::new(8, 4);
        assert!(s.push(CompState::Marked, &arcs(&[0])));
        s.advance_top(CompState::Pending);
    }
}
