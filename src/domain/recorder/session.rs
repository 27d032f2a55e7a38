//! Recorder session state machine

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

use super::countdown::{Countdown, CountdownTick, MaxDuration};
use super::fragments::FragmentBuffer;
use super::state::RecorderState;
use crate::domain::payload::{AudioMimeType, Payload, PayloadError};

/// Identifier of one recording attempt, unique per node
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionId(u64);

impl SessionId {
    /// Raw sequence number
    pub const fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Error when an invalid state transition is attempted
#[derive(Debug, Clone, Error)]
#[error("Invalid state transition: cannot {action} while in {current_state} state")]
pub struct InvalidStateTransition {
    pub current_state: RecorderState,
    pub action: String,
}

/// What happened to a fragment handed to the machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentOutcome {
    Buffered,
    /// Zero-length fragment, dropped
    Empty,
    /// The session is neither recording nor finalizing
    Stale,
}

/// Session that left the Recording state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoppedSession {
    pub id: SessionId,
    /// False if the stream was never acquired; nothing will be finalized
    pub acquired: bool,
}

/// Session whose capture stream has delivered its last fragment
#[derive(Debug)]
pub struct CompletedSession {
    pub id: SessionId,
    pub mime_type: AudioMimeType,
    pub fragments: FragmentBuffer,
}

impl CompletedSession {
    /// Concatenate the fragments and encode them as a payload
    pub fn into_payload(self) -> Result<Payload, PayloadError> {
        if self.fragments.is_empty() {
            return Err(PayloadError::Empty);
        }
        Ok(Payload::encode(&self.fragments.concat(), self.mime_type))
    }
}

#[derive(Debug)]
struct ActiveSession {
    id: SessionId,
    max_duration: MaxDuration,
    countdown: Option<Countdown>,
    mime_type: Option<AudioMimeType>,
    fragments: FragmentBuffer,
}

#[derive(Debug)]
struct FinalizingSession {
    mime_type: AudioMimeType,
    fragments: FragmentBuffer,
}

/// Recorder state machine.
///
/// State machine:
///   IDLE -> RECORDING (begin)
///   RECORDING -> IDLE (end, abort)
///
/// A stopped session whose stream was acquired stays in the finalizing set
/// until its stream reports completion, so fragments delivered after the
/// stop are still buffered in order.
#[derive(Debug, Default)]
pub struct RecorderMachine {
    active: Option<ActiveSession>,
    finalizing: BTreeMap<SessionId, FinalizingSession>,
    next_id: u64,
    last_published: Option<SessionId>,
}

impl RecorderMachine {
    /// Create a new machine in idle state
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the current state
    pub fn state(&self) -> RecorderState {
        if self.active.is_some() {
            RecorderState::Recording
        } else {
            RecorderState::Idle
        }
    }

    /// Check if currently recording
    pub fn is_recording(&self) -> bool {
        self.active.is_some()
    }

    /// Id of the session currently recording
    pub fn active_session(&self) -> Option<SessionId> {
        self.active.as_ref().map(|s| s.id)
    }

    /// Session whose countdown is running
    pub fn countdown_session(&self) -> Option<SessionId> {
        self.active
            .as_ref()
            .filter(|s| s.countdown.is_some())
            .map(|s| s.id)
    }

    /// Seconds left on the running countdown
    pub fn remaining_secs(&self) -> Option<u32> {
        self.active
            .as_ref()
            .and_then(|s| s.countdown)
            .map(|c| c.remaining())
    }

    /// Number of stopped sessions still waiting for their stream
    pub fn finalizing_count(&self) -> usize {
        self.finalizing.len()
    }

    /// Transition from IDLE to RECORDING
    pub fn begin(&mut self, max_duration: MaxDuration) -> Result<SessionId, InvalidStateTransition> {
        if let Some(active) = &self.active {
            return Err(InvalidStateTransition {
                current_state: RecorderState::Recording,
                action: format!("start session while {} is active", active.id),
            });
        }

        self.next_id += 1;
        let id = SessionId(self.next_id);
        self.active = Some(ActiveSession {
            id,
            max_duration,
            countdown: None,
            mime_type: None,
            fragments: FragmentBuffer::new(),
        });
        Ok(id)
    }

    /// Record that the capture stream of `id` is running and arm the
    /// countdown. Returns the fresh countdown, or None if `id` is not the
    /// active session.
    pub fn mark_acquired(&mut self, id: SessionId, mime_type: AudioMimeType) -> Option<Countdown> {
        let active = self.active.as_mut().filter(|s| s.id == id)?;
        let countdown = Countdown::start(active.max_duration);
        active.countdown = Some(countdown);
        active.mime_type = Some(mime_type);
        Some(countdown)
    }

    /// Transition from RECORDING to IDLE after a failed acquisition.
    /// Returns false if `id` is not the active session.
    pub fn abort(&mut self, id: SessionId) -> bool {
        if self.active_session() != Some(id) {
            return false;
        }
        self.active = None;
        true
    }

    /// Transition from RECORDING to IDLE. No-op while idle.
    pub fn end(&mut self) -> Option<StoppedSession> {
        let active = self.active.take()?;
        let acquired = match active.mime_type {
            Some(mime_type) => {
                self.finalizing.insert(
                    active.id,
                    FinalizingSession {
                        mime_type,
                        fragments: active.fragments,
                    },
                );
                true
            }
            None => false,
        };

        Some(StoppedSession {
            id: active.id,
            acquired,
        })
    }

    /// Advance the running countdown by one second
    pub fn tick(&mut self) -> Option<CountdownTick> {
        self.active
            .as_mut()
            .and_then(|s| s.countdown.as_mut())
            .map(|c| c.tick())
    }

    /// Buffer a fragment for a recording or finalizing session
    pub fn push_fragment(&mut self, id: SessionId, fragment: Vec<u8>) -> FragmentOutcome {
        let buffer = match self.active.as_mut() {
            Some(active) if active.id == id && active.mime_type.is_some() => &mut active.fragments,
            _ => match self.finalizing.get_mut(&id) {
                Some(finalizing) => &mut finalizing.fragments,
                None => return FragmentOutcome::Stale,
            },
        };

        if buffer.push(fragment) {
            FragmentOutcome::Buffered
        } else {
            FragmentOutcome::Empty
        }
    }

    /// Take a stopped session once its stream has finished.
    /// Returns None for unknown or already completed sessions.
    pub fn complete(&mut self, id: SessionId) -> Option<CompletedSession> {
        let finalizing = self.finalizing.remove(&id)?;
        Some(CompletedSession {
            id,
            mime_type: finalizing.mime_type,
            fragments: finalizing.fragments,
        })
    }

    /// Decide whether the payload of `id` may overwrite the current one.
    /// Payloads of sessions older than the last published one are refused.
    pub fn accept_publish(&mut self, id: SessionId) -> bool {
        match self.last_published {
            Some(last) if last >= id => false,
            _ => {
                self.last_published = Some(id);
                true
            }
        }
    }

    /// Drop every session, active or finalizing
    pub fn clear(&mut self) {
        self.active = None;
        self.finalizing.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recording_machine() -> (RecorderMachine, SessionId) {
        let mut machine = RecorderMachine::new();
        let id = machine.begin(MaxDuration::from_secs(3)).unwrap();
        machine.mark_acquired(id, AudioMimeType::Webm).unwrap();
        (machine, id)
    }

    #[test]
    fn new_machine_is_idle() {
        let machine = RecorderMachine::new();
        assert_eq!(machine.state(), RecorderState::Idle);
        assert!(machine.active_session().is_none());
        assert!(machine.countdown_session().is_none());
    }

    #[test]
    fn begin_from_idle() {
        let mut machine = RecorderMachine::new();
        let id = machine.begin(MaxDuration::default()).unwrap();
        assert_eq!(machine.state(), RecorderState::Recording);
        assert_eq!(machine.active_session(), Some(id));
        // countdown only runs once the stream is acquired
        assert!(machine.countdown_session().is_none());
    }

    #[test]
    fn begin_while_recording_fails() {
        let mut machine = RecorderMachine::new();
        machine.begin(MaxDuration::default()).unwrap();

        let err = machine.begin(MaxDuration::default()).unwrap_err();
        assert_eq!(err.current_state, RecorderState::Recording);
        assert!(err.to_string().contains("recording"));
    }

    #[test]
    fn session_ids_increase() {
        let mut machine = RecorderMachine::new();
        let first = machine.begin(MaxDuration::default()).unwrap();
        machine.end();
        let second = machine.begin(MaxDuration::default()).unwrap();
        assert!(second > first);
    }

    #[test]
    fn mark_acquired_arms_countdown() {
        let (machine, id) = recording_machine();
        assert_eq!(machine.countdown_session(), Some(id));
        assert_eq!(machine.remaining_secs(), Some(3));
    }

    #[test]
    fn mark_acquired_for_stale_session() {
        let mut machine = RecorderMachine::new();
        let id = machine.begin(MaxDuration::default()).unwrap();
        machine.end();
        assert!(machine.mark_acquired(id, AudioMimeType::Webm).is_none());
    }

    #[test]
    fn end_while_idle_is_noop() {
        let mut machine = RecorderMachine::new();
        assert!(machine.end().is_none());
    }

    #[test]
    fn end_before_acquisition_finalizes_nothing() {
        let mut machine = RecorderMachine::new();
        let id = machine.begin(MaxDuration::default()).unwrap();
        let stopped = machine.end().unwrap();
        assert_eq!(stopped, StoppedSession { id, acquired: false });
        assert_eq!(machine.finalizing_count(), 0);
    }

    #[test]
    fn abort_only_matches_active_session() {
        let mut machine = RecorderMachine::new();
        let id = machine.begin(MaxDuration::default()).unwrap();
        machine.end();
        let next = machine.begin(MaxDuration::default()).unwrap();
        assert!(!machine.abort(id));
        assert!(machine.abort(next));
        assert_eq!(machine.state(), RecorderState::Idle);
    }

    #[test]
    fn countdown_expires_after_max_ticks() {
        let (mut machine, _) = recording_machine();
        assert_eq!(machine.tick(), Some(CountdownTick::Remaining(2)));
        assert_eq!(machine.tick(), Some(CountdownTick::Remaining(1)));
        assert_eq!(machine.tick(), Some(CountdownTick::Expired));
    }

    #[test]
    fn tick_while_idle_is_none() {
        let mut machine = RecorderMachine::new();
        assert!(machine.tick().is_none());
    }

    #[test]
    fn fragments_after_stop_are_still_buffered() {
        let (mut machine, id) = recording_machine();
        assert_eq!(machine.push_fragment(id, vec![1; 10]), FragmentOutcome::Buffered);
        machine.end();
        assert_eq!(machine.push_fragment(id, Vec::new()), FragmentOutcome::Empty);
        assert_eq!(machine.push_fragment(id, vec![2; 20]), FragmentOutcome::Buffered);

        let completed = machine.complete(id).unwrap();
        assert_eq!(completed.fragments.len(), 2);
        assert_eq!(completed.fragments.total_bytes(), 30);
    }

    #[test]
    fn fragments_for_unknown_session_are_stale() {
        let (mut machine, id) = recording_machine();
        machine.end();
        machine.complete(id).unwrap();
        assert_eq!(machine.push_fragment(id, vec![1]), FragmentOutcome::Stale);
        assert!(machine.complete(id).is_none());
    }

    #[test]
    fn completed_session_encodes_in_order() {
        let (mut machine, id) = recording_machine();
        machine.push_fragment(id, vec![1, 2]);
        machine.push_fragment(id, vec![3]);
        machine.end();

        let payload = machine.complete(id).unwrap().into_payload().unwrap();
        assert_eq!(payload.decode().unwrap(), vec![1, 2, 3]);
        assert_eq!(payload.mime_type(), AudioMimeType::Webm);
    }

    #[test]
    fn completed_session_without_fragments_is_empty() {
        let (mut machine, id) = recording_machine();
        machine.end();
        let err = machine.complete(id).unwrap().into_payload().unwrap_err();
        assert!(matches!(err, PayloadError::Empty));
    }

    #[test]
    fn older_payloads_are_refused() {
        let mut machine = RecorderMachine::new();
        let first = machine.begin(MaxDuration::default()).unwrap();
        machine.end();
        let second = machine.begin(MaxDuration::default()).unwrap();
        machine.end();

        assert!(machine.accept_publish(second));
        assert!(!machine.accept_publish(first));
        assert!(!machine.accept_publish(second));
    }

    #[test]
    fn clear_drops_everything() {
        let (mut machine, id) = recording_machine();
        machine.end();
        machine.begin(MaxDuration::default()).unwrap();
        machine.clear();
        assert_eq!(machine.state(), RecorderState::Idle);
        assert!(machine.complete(id).is_none());
    }

    #[test]
    fn session_id_display() {
        let mut machine = RecorderMachine::new();
        let id = machine.begin(MaxDuration::default()).unwrap();
        assert_eq!(id.to_string(), "#1");
        assert_eq!(id.get(), 1);
    }
}
