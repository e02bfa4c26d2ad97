//! Distance machinery: bounded close-node lists, the special-distance
//! oracle, and the depth-tied distance cache used during the DFS.

pub mod close_nodes;
pub mod heap;
pub mod levels;
pub mod oracle;

pub use close_nodes::CloseNodeLists;
pub use heap::NodeHeap;
pub use levels::SdLevels;
pub use oracle::DistOracle;
