//! Node host infrastructure module

mod memory_node;

pub use memory_node::{MemoryNode, NodeChange, NodeObserver, NodeSnapshot};
