//! Port interfaces (traits) for external systems
//!
//! These traits define the boundaries between the application
//! and infrastructure layers.

pub mod capture;
pub mod config;
pub mod node;

// Re-export common types
pub use capture::{AudioCapture, CaptureCallback, CaptureError, CaptureSignal, CaptureStream};
pub use config::ConfigStore;
pub use node::NodeWidgets;
