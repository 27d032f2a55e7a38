//! Application layer - Use cases and port interfaces
//!
//! Contains the recorder controller, its event loop and the trait
//! definitions for external system interactions.

pub mod ports;
pub mod recorder;
pub mod recorder_node;

// Re-export use cases
pub use recorder::{EventSender, RecorderController, RecorderEvent, RecorderStatus};
pub use recorder_node::{spawn_recorder, RecorderClosed, RecorderCommand, RecorderHandle};
