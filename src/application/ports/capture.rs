//! Audio capture port interfaces

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::payload::AudioMimeType;

/// Capture errors
#[derive(Debug, Clone, Error)]
pub enum CaptureError {
    #[error("No audio input device available")]
    NoInputDevice,

    #[error("Failed to acquire audio stream: {0}")]
    AcquisitionFailed(String),

    #[error("Audio stream failed: {0}")]
    StreamFailed(String),
}

/// Signal delivered by a running capture stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureSignal {
    /// A chunk of encoded container data, in capture order
    Data(Vec<u8>),
    /// The stream hit a runtime error
    Error(String),
    /// The stream was finalized; no further data follows
    Finished,
}

/// Callback receiving capture signals. May be called from any thread.
pub type CaptureCallback = Arc<dyn Fn(CaptureSignal) + Send + Sync>;

/// Handle to one acquired microphone stream
pub trait CaptureStream: Send {
    /// MIME type of the container the stream produces
    fn mime_type(&self) -> AudioMimeType;

    /// Start delivering signals to `on_signal`
    fn begin(&mut self, on_signal: CaptureCallback) -> Result<(), CaptureError>;

    /// Finish the capture. Remaining data is delivered asynchronously,
    /// followed by exactly one `CaptureSignal::Finished`.
    fn finalize(self: Box<Self>);

    /// Stop the capture and release the device without delivering anything
    fn release(self: Box<Self>);
}

/// Port for the platform audio-capture capability
#[async_trait]
pub trait AudioCapture: Send + Sync + 'static {
    /// Check if microphone capture is supported at all
    fn is_available(&self) -> bool;

    /// Request a microphone stream.
    ///
    /// # Returns
    /// A stream that has not started delivering data yet
    async fn acquire(&self) -> Result<Box<dyn CaptureStream>, CaptureError>;
}
