//! Microphone capture using cpal
//!
//! The cpal stream is not Send, so each acquired stream lives on its own
//! thread until the session ends. Samples are mixed down to mono i16 at the
//! device rate and encoded into a single WebM container on finalize; the
//! container is then handed to the controller as ordered fragments.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BuildStreamError, SampleFormat, StreamConfig};
use tokio::sync::oneshot;

use super::opus_encoder::encode_to_webm;
use crate::application::ports::{
    AudioCapture, CaptureCallback, CaptureError, CaptureSignal, CaptureStream,
};
use crate::domain::payload::AudioMimeType;

/// Size of the fragments the encoded container is split into
pub const FRAGMENT_SIZE: usize = 16 * 1024;

/// How often the stream thread checks for shutdown
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// State shared between the stream thread, the cpal callbacks and the handle
struct Shared {
    samples: Mutex<Vec<i16>>,
    capturing: AtomicBool,
    running: AtomicBool,
    callback: Mutex<Option<CaptureCallback>>,
}

impl Shared {
    fn new() -> Self {
        Self {
            samples: Mutex::new(Vec::new()),
            capturing: AtomicBool::new(false),
            running: AtomicBool::new(true),
            callback: Mutex::new(None),
        }
    }

    fn record(&self, mono: &[i16]) {
        if self.capturing.load(Ordering::SeqCst) {
            if let Ok(mut samples) = self.samples.lock() {
                samples.extend_from_slice(mono);
            }
        }
    }

    fn emit(&self, signal: CaptureSignal) {
        let callback = self.callback.lock().ok().and_then(|cb| cb.clone());
        if let Some(callback) = callback {
            callback(signal);
        }
    }

    fn shut_down(&self) {
        self.capturing.store(false, Ordering::SeqCst);
        self.running.store(false, Ordering::SeqCst);
    }

    /// Encode everything captured and deliver it, then signal completion
    fn deliver(&self, sample_rate: u32) {
        let samples = self
            .samples
            .lock()
            .map(|mut samples| std::mem::take(&mut *samples))
            .unwrap_or_default();

        if !samples.is_empty() {
            match encode_to_webm(&samples, sample_rate) {
                Ok(webm) => {
                    for chunk in webm.chunks(FRAGMENT_SIZE) {
                        self.emit(CaptureSignal::Data(chunk.to_vec()));
                    }
                }
                Err(e) => self.emit(CaptureSignal::Error(e.to_string())),
            }
        }

        self.emit(CaptureSignal::Finished);
    }
}

/// Audio capture backed by the default cpal input device.
///
/// Whether an input device exists is checked once at construction, so
/// `is_available` never enumerates devices on the caller's thread.
pub struct CpalCapture {
    available: bool,
}

impl CpalCapture {
    /// Create a new cpal-based capture, looking up the default input device
    pub fn new() -> Self {
        let available = Self::input_device().is_ok();
        if !available {
            tracing::warn!("No default audio input device found");
        }
        Self::with_availability(available)
    }

    /// Create a capture with a known device availability
    pub fn with_availability(available: bool) -> Self {
        Self { available }
    }

    /// Get the default input device
    fn input_device() -> Result<cpal::Device, CaptureError> {
        cpal::default_host()
            .default_input_device()
            .ok_or(CaptureError::NoInputDevice)
    }

    /// Open and start the input stream. Runs on the stream thread.
    fn open_stream(shared: &Arc<Shared>) -> Result<(cpal::Stream, u32), CaptureError> {
        let device = Self::input_device()?;
        let supported = device
            .default_input_config()
            .map_err(|e| CaptureError::AcquisitionFailed(e.to_string()))?;

        let sample_format = supported.sample_format();
        let config: StreamConfig = supported.into();
        let channels = config.channels;
        let sample_rate = config.sample_rate.0;

        let error_shared = Arc::clone(shared);
        let on_error = move |err: cpal::StreamError| {
            error_shared.emit(CaptureSignal::Error(err.to_string()));
        };

        let data_shared = Arc::clone(shared);
        let stream = match sample_format {
            SampleFormat::I16 => device.build_input_stream(
                &config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    data_shared.record(&mix_to_mono(data, channels));
                },
                on_error,
                None,
            ),
            SampleFormat::F32 => device.build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    let i16_data: Vec<i16> = data
                        .iter()
                        .map(|&s| (s.clamp(-1.0, 1.0) * 32767.0) as i16)
                        .collect();
                    data_shared.record(&mix_to_mono(&i16_data, channels));
                },
                on_error,
                None,
            ),
            other => {
                return Err(CaptureError::AcquisitionFailed(format!(
                    "Unsupported sample format: {:?}",
                    other
                )))
            }
        }
        .map_err(|e| match e {
            BuildStreamError::DeviceNotAvailable => CaptureError::NoInputDevice,
            other => CaptureError::AcquisitionFailed(other.to_string()),
        })?;

        stream
            .play()
            .map_err(|e| CaptureError::AcquisitionFailed(e.to_string()))?;

        Ok((stream, sample_rate))
    }

    /// Body of the stream thread: keep the stream alive until shut down
    fn run_stream(shared: Arc<Shared>, ready: oneshot::Sender<Result<u32, CaptureError>>) {
        let stream = match Self::open_stream(&shared) {
            Ok((stream, sample_rate)) => {
                if ready.send(Ok(sample_rate)).is_err() {
                    // acquisition future dropped
                    return;
                }
                stream
            }
            Err(e) => {
                let _ = ready.send(Err(e));
                return;
            }
        };

        while shared.running.load(Ordering::SeqCst) {
            std::thread::sleep(POLL_INTERVAL);
        }
        drop(stream);
    }
}

impl Default for CpalCapture {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AudioCapture for CpalCapture {
    fn is_available(&self) -> bool {
        self.available
    }

    async fn acquire(&self) -> Result<Box<dyn CaptureStream>, CaptureError> {
        if !self.available {
            return Err(CaptureError::NoInputDevice);
        }

        let shared = Arc::new(Shared::new());
        let (ready_tx, ready_rx) = oneshot::channel();

        let thread_shared = Arc::clone(&shared);
        let thread = std::thread::Builder::new()
            .name("audio-capture".into())
            .spawn(move || CpalCapture::run_stream(thread_shared, ready_tx))
            .map_err(|e| CaptureError::AcquisitionFailed(e.to_string()))?;

        let sample_rate = ready_rx.await.map_err(|_| {
            CaptureError::AcquisitionFailed("capture thread exited unexpectedly".into())
        })??;

        tracing::debug!(sample_rate, "Input stream opened");
        Ok(Box::new(CpalStream {
            shared,
            thread: Some(thread),
            sample_rate,
        }))
    }
}

/// One open cpal input stream
pub struct CpalStream {
    shared: Arc<Shared>,
    thread: Option<JoinHandle<()>>,
    sample_rate: u32,
}

impl CaptureStream for CpalStream {
    fn mime_type(&self) -> AudioMimeType {
        AudioMimeType::Webm
    }

    fn begin(&mut self, on_signal: CaptureCallback) -> Result<(), CaptureError> {
        if !self.shared.running.load(Ordering::SeqCst) {
            return Err(CaptureError::StreamFailed("stream already closed".into()));
        }

        let mut callback = self
            .shared
            .callback
            .lock()
            .map_err(|_| CaptureError::StreamFailed("callback lock poisoned".into()))?;
        *callback = Some(on_signal);
        drop(callback);

        self.shared.capturing.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn finalize(mut self: Box<Self>) {
        self.shared.shut_down();

        let shared = Arc::clone(&self.shared);
        let thread = self.thread.take();
        let sample_rate = self.sample_rate;

        let spawned = std::thread::Builder::new()
            .name("audio-finalize".into())
            .spawn(move || {
                if let Some(thread) = thread {
                    let _ = thread.join();
                }
                shared.deliver(sample_rate);
            });

        if let Err(e) = spawned {
            self.shared
                .emit(CaptureSignal::Error(format!("Failed to start encoder: {}", e)));
            self.shared.emit(CaptureSignal::Finished);
        }
    }

    fn release(self: Box<Self>) {
        // Drop shuts the stream thread down
    }
}

impl Drop for CpalStream {
    fn drop(&mut self) {
        self.shared.shut_down();
    }
}

/// Mix interleaved multi-channel samples down to mono
fn mix_to_mono(samples: &[i16], channels: u16) -> Vec<i16> {
    if channels <= 1 {
        return samples.to_vec();
    }

    samples
        .chunks(channels as usize)
        .map(|frame| {
            let sum: i32 = frame.iter().map(|&s| s as i32).sum();
            (sum / frame.len() as i32) as i16
        })
        .collect()
}
