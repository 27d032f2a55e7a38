//! Vocabulary shared with the host editor: widget names and values

use std::fmt;

use serde::{Deserialize, Serialize};

/// Node class name registered with the host
pub const NODE_TYPE: &str = "AudioRecorderNode";

/// Hidden text widget receiving the base64 payload
pub const BASE64_DATA_WIDGET: &str = "base64_data";

/// Playable preview element
pub const AUDIO_UI_WIDGET: &str = "audioUI";

/// Numeric input holding the maximum duration in seconds
pub const MAX_DURATION_WIDGET: &str = "record_duration_max";

/// Start/stop toggle button inserted by the controller
pub const BUTTON_WIDGET: &str = "button_widget";

/// Countdown text display inserted by the controller
pub const COUNTDOWN_WIDGET: &str = "text_widget";

/// Value held by a node widget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WidgetValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl WidgetValue {
    /// Text content, if this is a text value
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for WidgetValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{}", b),
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Kind of custom control inserted into the node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlKind {
    /// Clickable start/stop button
    Button,
    /// Read-only text line
    Text,
}
