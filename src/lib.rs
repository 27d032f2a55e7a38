//! Recorder node - microphone capture widget for node-based editors
//!
//! A recorder node carries a START/STOP button and a countdown. Clicking it
//! captures audio from the microphone until clicked again or until the
//! node's maximum duration elapses, then stores the recording as a base64
//! payload in the node's `base64_data` input and shows it in an inline
//! preview.
//!
//! # Architecture
//!
//! The crate follows hexagonal (ports & adapters) architecture:
//!
//! - **Domain**: Recorder state machine, countdown, payload and node contract
//! - **Application**: The recorder controller, its event loop and the port traits
//! - **Infrastructure**: Adapter implementations (cpal capture, Opus/WebM, in-memory node, XDG config)
//! - **CLI**: Command-line interface, argument parsing and output formatting

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
