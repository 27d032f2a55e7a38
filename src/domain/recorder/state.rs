//! Recorder state value object

use std::fmt;

/// Button label shown while idle
pub const START_LABEL: &str = "START";

/// Button label shown while recording
pub const STOP_LABEL: &str = "STOP";

/// Recorder states.
///
/// A node cycles between the two states for its whole lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RecorderState {
    #[default]
    Idle,
    Recording,
}

impl RecorderState {
    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Recording => "recording",
        }
    }

    /// Label of the toggle button in this state
    pub const fn button_label(&self) -> &'static str {
        match self {
            Self::Idle => START_LABEL,
            Self::Recording => STOP_LABEL,
        }
    }
}

impl fmt::Display for RecorderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_idle() {
        assert_eq!(RecorderState::default(), RecorderState::Idle);
    }

    #[test]
    fn button_labels() {
        assert_eq!(RecorderState::Idle.button_label(), "START");
        assert_eq!(RecorderState::Recording.button_label(), "STOP");
    }

    #[test]
    fn display() {
        assert_eq!(RecorderState::Idle.to_string(), "idle");
        assert_eq!(RecorderState::Recording.to_string(), "recording");
    }
}
