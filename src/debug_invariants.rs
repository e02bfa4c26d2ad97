//! Debug-only self-checks for the shared search state.
//!
//! Checks run millions of times per reduction round, so structural
//! validation never runs in release builds. Debug builds, and release
//! builds with the `strict-invariants` or `check-invariants` feature,
//! verify the full structure after every mutation batch. A failed
//! validation panics: it means the shared scratch is corrupted and any
//! further verdict would be untrustworthy.

use crate::reduce_error::ReduceError;

/// Structural self-validation, implemented by every long-lived search
/// structure (graph, tree, stack, caches, MST workspace).
pub trait DebugInvariants {
    /// Panic on a broken invariant when checking is compiled in; no-op
    /// otherwise.
    fn debug_assert_invariants(&self);
    /// Walk the whole structure and report the first inconsistency as
    /// [`ReduceError::InvariantViolation`].
    fn validate_invariants(&self) -> Result<(), ReduceError>;
}

/// Run a fallible consistency check and panic with context on `Err`.
///
/// Compiles to nothing in plain release builds; the checked expression
/// still type-checks there.
#[macro_export]
macro_rules! debug_invariants {
    ($check:expr, $($ctx:tt)*) => {{
        #[cfg(any(
            debug_assertions,
            feature = "strict-invariants",
            feature = "check-invariants"
        ))]
        {
            if let Err(e) = $check {
                panic!(concat!("invariant broken, ", $($ctx)*, ": {}"), e);
            }
        }
        #[cfg(not(any(
            debug_assertions,
            feature = "strict-invariants",
            feature = "check-invariants"
        )))]
        {
            let _ = || $check;
        }
    }};
}
