//! Audio capture adapters

mod cpal_capture;
mod opus_encoder;
mod webm;

pub use cpal_capture::{CpalCapture, CpalStream, FRAGMENT_SIZE};
pub use opus_encoder::{encode_to_webm, EncodingError};
