//! MST machinery for the bottleneck bound: small parent-array MSTs over
//! extension-tree leaves, a reusable add-one-node workspace, and the
//! depth-synchronized level store.

pub mod dynamic;
pub mod levels;

pub use dynamic::{DynamicMst, NO_PARENT, ParentMst};
pub use levels::MstLevels;
