//! Maximum duration and countdown value objects

use std::fmt;
use std::time::Duration as StdDuration;

use crate::domain::node::WidgetValue;

/// Default maximum recording duration (10 seconds)
pub const DEFAULT_MAX_DURATION_SECS: u32 = 10;

/// Smallest accepted maximum duration
pub const MIN_MAX_DURATION_SECS: u32 = 1;

/// Largest accepted maximum duration (10 minutes)
pub const MAX_MAX_DURATION_SECS: u32 = 600;

/// Countdown granularity
pub const TICK_INTERVAL: StdDuration = StdDuration::from_secs(1);

/// Maximum recording duration in whole seconds, always within
/// `MIN_MAX_DURATION_SECS..=MAX_MAX_DURATION_SECS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MaxDuration {
    secs: u32,
}

impl MaxDuration {
    /// Create from seconds, clamping into the accepted range
    pub const fn from_secs(secs: u32) -> Self {
        let secs = if secs < MIN_MAX_DURATION_SECS {
            MIN_MAX_DURATION_SECS
        } else if secs > MAX_MAX_DURATION_SECS {
            MAX_MAX_DURATION_SECS
        } else {
            secs
        };
        Self { secs }
    }

    /// Default maximum duration (10 seconds)
    pub const fn default_duration() -> Self {
        Self::from_secs(DEFAULT_MAX_DURATION_SECS)
    }

    /// Read the duration from the node's numeric input.
    ///
    /// A missing, empty, zero or non-numeric value falls back to the
    /// default. Fractional values round up; negative values clamp to the
    /// minimum.
    pub fn from_widget(value: Option<&WidgetValue>) -> Self {
        let raw = match value {
            Some(WidgetValue::Number(n)) => Some(*n),
            Some(WidgetValue::Text(s)) => s.trim().parse::<f64>().ok(),
            Some(WidgetValue::Bool(_)) | None => None,
        };

        match raw {
            Some(n) if n.is_finite() && n != 0.0 => {
                if n < 0.0 {
                    Self::from_secs(MIN_MAX_DURATION_SECS)
                } else if n > MAX_MAX_DURATION_SECS as f64 {
                    Self::from_secs(MAX_MAX_DURATION_SECS)
                } else {
                    Self::from_secs(n.ceil() as u32)
                }
            }
            _ => Self::default_duration(),
        }
    }

    /// Get the duration in seconds
    pub const fn as_secs(&self) -> u32 {
        self.secs
    }

    /// Convert to std::time::Duration
    pub const fn as_std(&self) -> StdDuration {
        StdDuration::from_secs(self.secs as u64)
    }
}

impl Default for MaxDuration {
    fn default() -> Self {
        Self::default_duration()
    }
}

impl fmt::Display for MaxDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.secs)
    }
}

/// Result of one countdown tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownTick {
    /// Seconds left before auto-stop
    Remaining(u32),
    /// The countdown reached zero
    Expired,
}

/// One-second countdown driving auto-stop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    remaining: u32,
}

impl Countdown {
    /// Start a countdown from the maximum duration
    pub const fn start(max: MaxDuration) -> Self {
        Self {
            remaining: max.as_secs(),
        }
    }

    /// Seconds left before auto-stop
    pub const fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Advance by one second
    pub fn tick(&mut self) -> CountdownTick {
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            CountdownTick::Expired
        } else {
            CountdownTick::Remaining(self.remaining)
        }
    }

    /// Text for the countdown display
    pub fn display_text(&self) -> String {
        countdown_text(self.remaining)
    }
}

/// Format the countdown display for the given remaining seconds
pub fn countdown_text(remaining: u32) -> String {
    format!("Will stop in {}s", remaining)
}
