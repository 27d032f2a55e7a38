//! Domain layer - Core business logic
//!
//! Contains value objects, the recorder state machine and domain errors.
//! This layer has no dependencies on external systems.

pub mod config;
pub mod error;
pub mod node;
pub mod payload;
pub mod recorder;

// Re-export common types
pub use config::AppConfig;
pub use error::*;
pub use node::WidgetValue;
pub use payload::{AudioMimeType, Payload, PayloadError};
pub use recorder::{MaxDuration, RecorderMachine, RecorderState, SessionId};
