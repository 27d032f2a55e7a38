//! Recorder widget controller use case
//!
//! Applies recorder state transitions to one host node. Every asynchronous
//! completion (stream acquisition, captured data, encoded payload) comes
//! back as a [`RecorderEvent`] tagged with the session that caused it, so
//! late or duplicated signals are recognized and dropped.

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::domain::node::{
    ControlKind, WidgetValue, BASE64_DATA_WIDGET, BUTTON_WIDGET, COUNTDOWN_WIDGET,
    MAX_DURATION_WIDGET,
};
use crate::domain::payload::{Payload, PayloadError};
use crate::domain::recorder::{
    countdown_text, CompletedSession, CountdownTick, FragmentOutcome, MaxDuration,
    RecorderMachine, RecorderState, SessionId,
};

use super::ports::{AudioCapture, CaptureCallback, CaptureError, CaptureSignal, CaptureStream, NodeWidgets};

/// Asynchronous completion signals fed back into the controller
pub enum RecorderEvent {
    /// The stream request issued by `start` resolved
    Acquired {
        session: SessionId,
        result: Result<Box<dyn CaptureStream>, CaptureError>,
    },
    /// A capture stream delivered a signal
    Capture {
        session: SessionId,
        signal: CaptureSignal,
    },
    /// Encoding of a completed session finished
    Encoded {
        session: SessionId,
        result: Result<Payload, PayloadError>,
    },
}

impl fmt::Debug for RecorderEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Acquired { session, result } => f
                .debug_struct("Acquired")
                .field("session", session)
                .field("ok", &result.is_ok())
                .finish(),
            Self::Capture { session, signal } => f
                .debug_struct("Capture")
                .field("session", session)
                .field("signal", signal)
                .finish(),
            Self::Encoded { session, result } => f
                .debug_struct("Encoded")
                .field("session", session)
                .field("result", result)
                .finish(),
        }
    }
}

/// Sender half of the controller's event queue
pub type EventSender = mpsc::UnboundedSender<RecorderEvent>;

/// Snapshot of a recorder, published after every processed input
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecorderStatus {
    pub state: RecorderState,
    /// Session currently recording
    pub session: Option<SessionId>,
    /// Seconds left before auto-stop, once the stream is capturing
    pub remaining_secs: Option<u32>,
    /// Number of sessions begun so far
    pub started: u64,
    /// Stopped sessions whose payload is still on its way
    pub pending: usize,
    /// Number of payloads published so far
    pub published: u64,
    pub removed: bool,
}

impl RecorderStatus {
    /// True once the microphone stream is delivering data
    pub fn is_capturing(&self) -> bool {
        self.remaining_secs.is_some()
    }

    /// True when idle and no stopped session is still delivering
    pub fn is_settled(&self) -> bool {
        self.state == RecorderState::Idle && self.pending == 0
    }
}

/// Per-node recorder controller
pub struct RecorderController<C, N>
where
    C: AudioCapture,
    N: NodeWidgets,
{
    capture: Arc<C>,
    node: N,
    machine: RecorderMachine,
    stream: Option<(SessionId, Box<dyn CaptureStream>)>,
    events: EventSender,
    payload: Option<Payload>,
    started: u64,
    encoding: usize,
    published: u64,
    removed: bool,
}

impl<C, N> RecorderController<C, N>
where
    C: AudioCapture,
    N: NodeWidgets,
{
    /// Create a controller for one node. Completion signals are sent to
    /// `events` and must be handed back through [`Self::handle_event`].
    pub fn new(capture: C, node: N, events: EventSender) -> Self {
        Self {
            capture: Arc::new(capture),
            node,
            machine: RecorderMachine::new(),
            stream: None,
            events,
            payload: None,
            started: 0,
            encoding: 0,
            published: 0,
            removed: false,
        }
    }

    /// Install the recorder controls on the node
    pub fn attach(&mut self) {
        self.node.hide_widget(BASE64_DATA_WIDGET);
        self.node
            .add_control(BUTTON_WIDGET, ControlKind::Button, RecorderState::Idle.button_label());
        self.node.add_control(COUNTDOWN_WIDGET, ControlKind::Text, "");
        self.node.set_serialize_widgets(true);
    }

    /// Get current recorder state
    pub fn state(&self) -> RecorderState {
        self.machine.state()
    }

    /// Current status snapshot
    pub fn status(&self) -> RecorderStatus {
        RecorderStatus {
            state: self.machine.state(),
            session: self.machine.active_session(),
            remaining_secs: self.machine.remaining_secs(),
            started: self.started,
            pending: self.machine.finalizing_count() + self.encoding,
            published: self.published,
            removed: self.removed,
        }
    }

    /// Session whose countdown is running, if any
    pub fn countdown_session(&self) -> Option<SessionId> {
        self.machine.countdown_session()
    }

    /// Last payload published by this controller
    pub fn payload(&self) -> Option<&Payload> {
        self.payload.as_ref()
    }

    /// The node this controller is attached to
    pub fn node(&self) -> &N {
        &self.node
    }

    /// Detach and return the node
    pub fn into_node(self) -> N {
        self.node
    }

    /// Start if idle, stop if recording
    pub fn toggle(&mut self) {
        match self.machine.state() {
            RecorderState::Idle => self.start(),
            RecorderState::Recording => self.stop(),
        }
    }

    /// Begin a session: request a microphone stream and show STOP.
    /// No-op while recording or after removal.
    pub fn start(&mut self) {
        if self.removed {
            return;
        }
        if self.machine.is_recording() {
            debug!("Start ignored, already recording");
            return;
        }
        if !self.capture.is_available() {
            warn!("No audio capture support, recording not started");
            return;
        }

        let max_duration =
            MaxDuration::from_widget(self.node.widget_value(MAX_DURATION_WIDGET).as_ref());
        let session = match self.machine.begin(max_duration) {
            Ok(session) => session,
            Err(e) => {
                debug!(error = %e, "Start ignored");
                return;
            }
        };
        self.started += 1;

        self.node
            .set_control_text(BUTTON_WIDGET, RecorderState::Recording.button_label());

        let capture = Arc::clone(&self.capture);
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = capture.acquire().await;
            let _ = events.send(RecorderEvent::Acquired { session, result });
        });

        info!(%session, %max_duration, "Requesting microphone");
    }

    /// End the active session. No-op while idle.
    pub fn stop(&mut self) {
        let Some(stopped) = self.machine.end() else {
            return;
        };

        if let Some((session, stream)) = self.stream.take() {
            if session == stopped.id {
                stream.finalize();
            } else {
                stream.release();
            }
        }

        self.node.set_control_text(COUNTDOWN_WIDGET, "");
        self.node
            .set_control_text(BUTTON_WIDGET, RecorderState::Idle.button_label());
        info!(session = %stopped.id, acquired = stopped.acquired, "Stopped");
    }

    /// Advance the countdown by one second, auto-stopping at zero
    pub fn on_tick(&mut self) {
        match self.machine.tick() {
            Some(CountdownTick::Remaining(remaining)) => {
                self.node
                    .set_control_text(COUNTDOWN_WIDGET, &countdown_text(remaining));
            }
            Some(CountdownTick::Expired) => {
                info!("Maximum duration reached");
                self.stop();
            }
            None => {}
        }
    }

    /// Cancel the countdown, release the stream and ignore every later
    /// signal. Called when the node is removed from the graph.
    pub fn remove(&mut self) {
        if self.removed {
            return;
        }
        self.removed = true;
        self.machine.clear();
        if let Some((session, stream)) = self.stream.take() {
            debug!(%session, "Releasing stream of removed node");
            stream.release();
        }
        info!("Recorder removed");
    }

    /// Feed an asynchronous completion signal into the state machine
    pub fn handle_event(&mut self, event: RecorderEvent) {
        match event {
            RecorderEvent::Acquired { session, result } => self.on_acquired(session, result),
            RecorderEvent::Capture { session, signal } => self.on_capture(session, signal),
            RecorderEvent::Encoded { session, result } => self.on_encoded(session, result),
        }
    }

    fn on_acquired(
        &mut self,
        session: SessionId,
        result: Result<Box<dyn CaptureStream>, CaptureError>,
    ) {
        let mut stream = match result {
            Ok(stream) => stream,
            Err(e) => {
                error!(%session, error = %e, "Microphone request failed");
                self.abort(session);
                return;
            }
        };

        if self.removed || self.machine.active_session() != Some(session) {
            debug!(%session, "Releasing stream acquired for a stopped session");
            stream.release();
            return;
        }

        let mime_type = stream.mime_type();
        if let Err(e) = stream.begin(self.capture_callback(session)) {
            error!(%session, error = %e, "Failed to start capture stream");
            stream.release();
            self.abort(session);
            return;
        }

        if let Some(countdown) = self.machine.mark_acquired(session, mime_type) {
            self.node
                .set_control_text(COUNTDOWN_WIDGET, &countdown.display_text());
        }
        self.stream = Some((session, stream));
        info!(%session, %mime_type, "Recording...");
    }

    fn on_capture(&mut self, session: SessionId, signal: CaptureSignal) {
        if self.removed {
            return;
        }

        match signal {
            CaptureSignal::Data(fragment) => {
                if self.machine.push_fragment(session, fragment) == FragmentOutcome::Stale {
                    debug!(%session, "Dropping fragment of finished session");
                }
            }
            CaptureSignal::Error(message) => {
                error!(%session, error = %message, "Capture stream error");
                if self.machine.active_session() == Some(session) {
                    self.stop();
                }
            }
            CaptureSignal::Finished => match self.machine.complete(session) {
                Some(completed) => self.encode(completed),
                None => debug!(%session, "Ignoring duplicate finish signal"),
            },
        }
    }

    fn on_encoded(&mut self, session: SessionId, result: Result<Payload, PayloadError>) {
        self.encoding = self.encoding.saturating_sub(1);
        if self.removed {
            return;
        }

        let payload = match result {
            Ok(payload) => payload,
            Err(e) => {
                warn!(%session, error = %e, "Nothing to publish");
                return;
            }
        };

        if !self.machine.accept_publish(session) {
            debug!(%session, "Dropping payload older than the published one");
            return;
        }

        self.node.set_widget_value(
            BASE64_DATA_WIDGET,
            WidgetValue::Text(payload.base64().to_string()),
        );
        self.node.set_preview_source(&payload.data_uri());
        self.node.set_preview_empty(false);
        info!(%session, size = %payload.human_readable_size(), "Payload published");

        self.payload = Some(payload);
        self.published += 1;
    }

    fn abort(&mut self, session: SessionId) {
        if self.machine.abort(session) {
            self.node.set_control_text(COUNTDOWN_WIDGET, "");
            self.node
                .set_control_text(BUTTON_WIDGET, RecorderState::Idle.button_label());
        }
    }

    fn encode(&mut self, completed: CompletedSession) {
        self.encoding += 1;
        let session = completed.id;
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = tokio::task::spawn_blocking(move || completed.into_payload())
                .await
                .unwrap_or_else(|e| Err(PayloadError::EncodingFailed(e.to_string())));
            let _ = events.send(RecorderEvent::Encoded { session, result });
        });
    }

    fn capture_callback(&self, session: SessionId) -> CaptureCallback {
        let events = self.events.clone();
        Arc::new(move |signal: CaptureSignal| {
            let _ = events.send(RecorderEvent::Capture { session, signal });
        })
    }
}
