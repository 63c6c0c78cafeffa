//! CLI presenter for output formatting

use std::path::Path;
use std::sync::Mutex;
use std::time::Duration as StdDuration;

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

use crate::domain::recorder::RecorderState;

/// Presenter for CLI output formatting.
///
/// Shared between event listeners, so every method takes `&self`. Status
/// lines printed while the spinner runs go above it instead of through it.
pub struct Presenter {
    spinner: Mutex<Option<ProgressBar>>,
}

impl Presenter {
    /// Create a new presenter
    pub fn new() -> Self {
        Self {
            spinner: Mutex::new(None),
        }
    }

    fn spinner(&self) -> std::sync::MutexGuard<'_, Option<ProgressBar>> {
        self.spinner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Start a spinner with message
    pub fn start_spinner(&self, message: &str) {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        spinner.set_style(style);
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(StdDuration::from_millis(80));
        *self.spinner() = Some(spinner);
    }

    /// Update spinner message
    pub fn update_spinner(&self, message: &str) {
        if let Some(ref spinner) = *self.spinner() {
            spinner.set_message(message.to_string());
        }
    }

    /// Mark spinner as success and finish
    pub fn spinner_success(&self, message: &str) {
        let spinner = self.spinner().take();
        match spinner {
            Some(spinner) => spinner.finish_with_message(format!("{} {}", "✓".green(), message)),
            None => self.success(message),
        }
    }

    /// Mark spinner as failed and finish
    pub fn spinner_fail(&self, message: &str) {
        let spinner = self.spinner().take();
        match spinner {
            Some(spinner) => spinner.finish_with_message(format!("{} {}", "✗".red(), message)),
            None => self.error(message),
        }
    }

    /// Stop spinner without status
    pub fn stop_spinner(&self) {
        let spinner = self.spinner().take();
        if let Some(spinner) = spinner {
            spinner.finish_and_clear();
        }
    }

    fn status_line(&self, line: String) {
        match *self.spinner() {
            Some(ref spinner) => spinner.println(line),
            None => eprintln!("{}", line),
        }
    }

    /// Print info message to stderr
    pub fn info(&self, message: &str) {
        self.status_line(format!("{} {}", "ℹ".cyan(), message));
    }

    /// Print success message to stderr
    pub fn success(&self, message: &str) {
        self.status_line(format!("{} {}", "✓".green(), message));
    }

    /// Print warning message to stderr
    pub fn warn(&self, message: &str) {
        self.status_line(format!("{} {}", "⚠".yellow(), message));
    }

    /// Print error message to stderr
    pub fn error(&self, message: &str) {
        self.status_line(format!("{} {}", "✗".red(), message));
    }

    /// Output text to stdout
    pub fn output(&self, text: &str) {
        println!("{}", text);
    }

    /// Print a key-value pair (for config list)
    pub fn key_value(&self, key: &str, value: &str) {
        println!("{}: {}", key.cyan(), value);
    }

    /// Report a slice written to disk
    pub fn slice_written(&self, path: &Path, size: &str) {
        self.success(&format!("{} ({})", path.display(), size));
    }

    /// One-line summary of the stdin commands
    pub fn controls_hint(&self) {
        self.info(&format!(
            "Type {} pause, {} resume, {} flush a slice, {} stop (Ctrl+C also stops)",
            "p".bold(),
            "r".bold(),
            "d".bold(),
            "s".bold()
        ));
    }

    /// Format the live status shown next to the spinner
    pub fn format_status(&self, state: RecorderState, elapsed_ms: u64, limit_ms: Option<u64>) -> String {
        let label = match state {
            RecorderState::Recording => "Recording".red().to_string(),
            RecorderState::Paused => "Paused".yellow().to_string(),
            RecorderState::Inactive => "Stopping".dimmed().to_string(),
        };

        match limit_ms {
            Some(total_ms) => format!("{}... {}", label, self.format_progress(elapsed_ms, total_ms)),
            None => format!("{}... {}s", label, elapsed_ms / 1000),
        }
    }

    /// Format recording progress bar
    pub fn format_progress(&self, elapsed_ms: u64, total_ms: u64) -> String {
        let elapsed_secs = elapsed_ms / 1000;
        let total_secs = total_ms / 1000;
        let percent = if total_ms > 0 {
            (elapsed_ms as f64 / total_ms as f64 * 100.0).min(100.0)
        } else {
            0.0
        };

        let bar_width = 20;
        let filled = ((percent / 100.0) * bar_width as f64) as usize;
        let empty = bar_width - filled;

        format!(
            "[{}{}] {:>3}s / {}s",
            "█".repeat(filled).cyan(),
            "░".repeat(empty),
            elapsed_secs,
            total_secs
        )
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
    fn format_progress_at_start() {
        let presenter = Presenter::new();
        let progress = presenter.format_progress(0, 10000);
        assert!(progress.contains("0s / 10s"));
    }

    #[test]
    fn format_progress_clamps_past_limit() {
        let presenter = Presenter::new();
        let progress = presenter.format_progress(15000, 10000);
        assert!(progress.contains("15s / 10s"));
        assert!(!progress.contains('░'));
    }

    #[test]
    fn status_without_limit_shows_seconds() {
        colored::control::set_override(false);
        let presenter = Presenter::new();
        let status = presenter.format_status(RecorderState::Paused, 4200, None);
        assert_eq!(status, "Paused... 4s");
    }

    #[test]
    fn status_with_limit_shows_progress() {
        let presenter = Presenter::new();
        let status = presenter.format_status(RecorderState::Recording, 5000, Some(10000));
        assert!(status.contains("5s / 10s"));
    }

    #[test]
    fn spinner_methods_are_safe_without_spinner() {
        let presenter = Presenter::new();
        presenter.update_spinner("ignored");
        presenter.stop_spinner();
    }
}
