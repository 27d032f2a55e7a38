//! Recorder domain: lifecycle state machine, countdown and fragment buffer

mod countdown;
mod fragments;
mod session;
mod state;

pub use countdown::{
    countdown_text, Countdown, CountdownTick, MaxDuration, DEFAULT_MAX_DURATION_SECS,
    MAX_MAX_DURATION_SECS, MIN_MAX_DURATION_SECS, TICK_INTERVAL,
};
pub use fragments::FragmentBuffer;
pub use session::{
    CompletedSession, FragmentOutcome, InvalidStateTransition, RecorderMachine, SessionId,
    StoppedSession,
};
pub use state::{RecorderState, START_LABEL, STOP_LABEL};
