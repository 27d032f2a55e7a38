//! Infrastructure layer - adapters implementing application ports

pub mod capture;
pub mod config;
pub mod logging;
pub mod node;

pub use capture::CpalCapture;
pub use config::XdgConfigStore;
pub use logging::init_logging;
pub use node::{MemoryNode, NodeChange, NodeSnapshot};
