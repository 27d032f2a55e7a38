//! CLI presenter for output formatting

use std::io::{self, Write};

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

/// Presenter for CLI output formatting
pub struct Presenter {
    spinner: Option<ProgressBar>,
}

impl Presenter {
    /// Create a new presenter
    pub fn new() -> Self {
        Self { spinner: None }
    }

    /// Start a spinner with message
    pub fn start_spinner(&mut self, message: &str) {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        spinner.set_style(style);
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        self.spinner = Some(spinner);
    }

    /// Update spinner message
    pub fn update_spinner(&self, message: &str) {
        if let Some(ref spinner) = self.spinner {
            spinner.set_message(message.to_string());
        }
    }

    /// Mark spinner as success and finish
    pub fn spinner_success(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_with_message(format!("{} {}", "✓".green(), message));
        }
    }

    /// Mark spinner as failed and finish
    pub fn spinner_fail(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_with_message(format!("{} {}", "✗".red(), message));
        }
    }

    /// Stop spinner without status
    pub fn stop_spinner(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }

    /// Print info message to stderr
    pub fn info(&self, message: &str) {
        eprintln!("{} {}", "ℹ".cyan(), message);
    }

    /// Print success message to stderr
    pub fn success(&self, message: &str) {
        eprintln!("{} {}", "✓".green(), message);
    }

    /// Print warning message to stderr
    pub fn warn(&self, message: &str) {
        eprintln!("{} {}", "⚠".yellow(), message);
    }

    /// Print error message to stderr
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Output text to stdout (node JSON, config values)
    pub fn output(&self, text: &str) {
        println!("{}", text);
        let _ = io::stdout().flush();
    }

    /// Format the countdown as a bar that empties as time runs out
    pub fn format_countdown(&self, remaining_secs: u32, total_secs: u32) -> String {
        let remaining = remaining_secs.min(total_secs);
        let fraction = if total_secs > 0 {
            remaining as f64 / total_secs as f64
        } else {
            0.0
        };

        let bar_width = 20;
        let filled = (fraction * bar_width as f64).round() as usize;
        let empty = bar_width - filled;

        format!(
            "[{}{}] {:>3}s left",
            "█".repeat(filled).cyan(),
            "░".repeat(empty),
            remaining
        )
    }

    /// Show the recording countdown in the spinner
    pub fn update_countdown(&self, remaining_secs: u32, total_secs: u32) {
        let bar = self.format_countdown(remaining_secs, total_secs);
        self.update_spinner(&format!("Recording... {}  (Enter to stop)", bar));
    }

    /// Print a key-value pair (for config list)
    pub fn key_value(&self, key: &str, value: &str) {
        println!("{}: {}", key.cyan(), value);
    }
}

impl Default for Presenter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn countdown_full_at_start() {
        let presenter = Presenter::new();
        let bar = presenter.format_countdown(10, 10);
        assert!(bar.contains(" 10s left"));
        assert!(!bar.contains('░'));
    }

    #[test]
    fn countdown_half_way() {
        let presenter = Presenter::new();
        let bar = presenter.format_countdown(5, 10);
        assert!(bar.contains("  5s left"));
        assert_eq!(bar.matches('░').count(), 10);
    }

    #[test]
    fn countdown_empty_at_end() {
        let presenter = Presenter::new();
        let bar = presenter.format_countdown(0, 10);
        assert!(bar.contains("  0s left"));
        assert_eq!(bar.matches('░').count(), 20);
    }

    #[test]
    fn countdown_with_zero_total() {
        let presenter = Presenter::new();
        assert!(presenter.format_countdown(3, 0).contains("0s left"));
    }
}
