//! `NodeId`/`ArcId`: strong, zero-cost handles for graph entities.
//!
//! The reduction engine works on dense arrays indexed by node and arc, so both
//! handles wrap a plain `u32` index. Arcs always occur in antiparallel pairs
//! stored at consecutive indices: arc `2k` and arc `2k + 1` are the two
//! orientations of undirected edge `k`. [`ArcId::flip`] toggles between them
//! and [`ArcId::edge`] recovers the pair index; both are branch-free.
//!
//! This module provides:
//! - Transparent newtypes with the same layout as `u32` (checked by
//!   `static_assertions`).
//! - Constructors and accessors, plus `Display`/`Debug`/ordering/hashing so the
//!   handles can be used in maps, sorted slices, and log messages.

use std::fmt;

/// Identifier of a graph node (vertex).
///
/// # Memory layout
/// `repr(transparent)` over `u32`: node ids can be bulk-stored in dense arrays
/// without conversion cost.
#[derive(
    Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[repr(transparent)]
pub struct NodeId(u32);

impl NodeId {
    /// Creates a new `NodeId` from a raw index.
    #[inline]
    pub const fn new(raw: u32) -> Self {
        NodeId(raw)
    }

    /// Returns the raw index.
    #[inline]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Returns the raw index widened for slice indexing.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Identifier of a directed arc.
///
/// Arcs come in antiparallel pairs: for every undirected edge `k` the arcs
/// `2k` (forward) and `2k + 1` (backward) exist, with equal cost. All
/// engine-internal arrays sized "per arc" use this index directly.
#[derive(
    Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[repr(transparent)]
pub struct ArcId(u32);

impl ArcId {
    /// Creates a new `ArcId` from a raw index.
    #[inline]
    pub const fn new(raw: u32) -> Self {
        ArcId(raw)
    }

    /// Returns the raw index.
    #[inline]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Returns the raw index widened for slice indexing.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Returns the antiparallel partner arc (`2k ↔ 2k + 1`).
    #[inline]
    pub const fn flip(self) -> Self {
        ArcId(self.0 ^ 1)
    }

    /// Returns the undirected edge index this arc belongs to.
    #[inline]
    pub const fn edge(self) -> usize {
        (self.0 >> 1) as usize
    }

    /// `true` for the even (forward) orientation of the pair.
    #[inline]
    pub const fn is_forward(self) -> bool {
        self.0 & 1 == 0
    }
}

// -----------------------------------------------------------------------------
// Formatting traits
// -----------------------------------------------------------------------------

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NodeId").field(&self.0).finish()
    }
}

/// Prints the numeric id without any wrapper text.
impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for ArcId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ArcId").field(&self.0).finish()
    }
}

impl fmt::Display for ArcId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// -----------------------------------------------------------------------------
// Testing and assertions
// -----------------------------------------------------------------------------


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_and_get() {
        let v = NodeId::new(42);
        assert_eq!(v.get(), 42);
        assert_eq!(v.index(), 42usize);
    }

    #[test]
    fn arc_pairing() {
        let a = ArcId::new(6);
        assert_eq!(a.flip(), ArcId::new(7));
        assert_eq!(a.flip().flip(), a);
        assert_eq!(a.edge(), 3);
        assert_eq!(a.flip().edge(), 3);
        assert!(a.is_forward());
        assert!(!a.flip().is_forward());
    }

    #[test]
    fn debug_and_display() {
        let v = NodeId::new(7);
        assert_eq!(format!("{:?}", v), "NodeId(7)");
        assert_eq!(format!("{}", v), "7");
        let a = ArcId::new(9);
        assert_eq!(format!("{:?}", a), "ArcId(9)");
        assert_eq!(format!("{}", a), "9");
    }

    #[test]
    fn ordering_and_hash() {
        let a = NodeId::new(1);
        let b = NodeId::new(2);
        assert!(a < b);
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(a);
        set.insert(b);
        assert_eq!(set.len(), 2);
    }
}

#[cfg(test)]
mod serde_tests {
    use super::*;
    #[test]
    fn json_roundtrip() {
        let v = NodeId::new(123);
        let s = serde_json::to_string(&v).unwrap();
        let v2: NodeId = serde_json::from_str(&s).unwrap();
        assert_eq!(v2, v);
    }
    #[test]
    fn bincode_roundtrip() {
        let a = ArcId::new(456);
        let bytes = bincode::serialize(&a).unwrap();
        let a2: ArcId = bincode::deserialize(&bytes).unwrap();
        assert_eq!(a2, a);
    }
}
