//! Epsilon-tolerant floating-point predicates.
//!
//! Every bound/cutoff comparison in the engine goes through these helpers so
//! that accumulated rounding noise cannot flip a verdict. The tolerance is
//! absolute and small; drift in the long-running accumulators is additionally
//! bounded by periodic recomputation in the search loop.

use num_traits::Float;

/// Default absolute tolerance for cost comparisons.
pub const DEFAULT_EPS: f64 = 1e-9;

/// `a < b` beyond tolerance.
#[inline]
pub fn lt<T: Float>(a: T, b: T, eps: T) -> bool {
    a < b - eps
}

/// `a <= b` within tolerance.
#[inline]
pub fn le<T: Float>(a: T, b: T, eps: T) -> bool {
    a <= b + eps
}

/// `a > b` beyond tolerance.
#[inline]
pub fn gt<T: Float>(a: T, b: T, eps: T) -> bool {
    a > b + eps
}

/// `a >= b` within tolerance.
#[inline]
pub fn ge<T: Float>(a: T, b: T, eps: T) -> bool {
    a >= b - eps
}

/// `a == b` within tolerance.
#[inline]
pub fn eq<T: Float>(a: T, b: T, eps: T) -> bool {
    (a - b).abs() <= eps
}
