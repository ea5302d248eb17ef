//! Progress reporting for long-running pipeline steps.

use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;
use std::time::Duration;

/// Receiver for pipeline progress updates.
pub trait ProgressReporter: Send + Sync {
    /// Report progress of a named step.
    ///
    /// `percent` is clamped to 0..=100. `remaining_seconds` is an estimate, if known.
    fn update(&self, step: &str, percent: f64, message: &str, remaining_seconds: Option<f64>);

    /// Mark the whole operation as finished.
    fn finish(&self) {}
}

/// Snapshot of the most recent progress update.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProgressState {
    pub step: String,
    pub percent: f64,
    pub message: String,
    pub remaining_seconds: Option<f64>,
}

impl ProgressState {
    pub fn new(step: &str, percent: f64, message: &str, remaining_seconds: Option<f64>) -> Self {
        Self {
            step: step.to_string(),
            percent: percent.clamp(0.0, 100.0),
            message: message.to_string(),
            remaining_seconds,
        }
    }

    /// Render as "step: 42.0% - message (Est. remaining: 1m 5s)".
    pub fn format_status(&self) -> String {
        let mut status = format!("{}: {:.1}% - {}", self.step, self.percent, self.message);
        if let Some(remaining) = self.remaining_seconds {
            status.push_str(&format!(" (Est. remaining: {})", format_remaining(remaining)));
        }
        status
    }
}

/// Format a remaining-time estimate.
pub fn format_remaining(seconds: f64) -> String {
    let total = seconds.max(0.0).round() as u64;
    if total <= 60 {
        return format!("{}s", total);
    }

    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m {}s", minutes, secs)
    }
}

/// Reporter that discards every update.
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn update(&self, _step: &str, _percent: f64, _message: &str, _remaining_seconds: Option<f64>) {}
}

/// Terminal progress bar driven by pipeline updates.
pub struct CliProgress {
    bar: ProgressBar,
    state: Mutex<ProgressState>,
}

impl CliProgress {
    pub fn new() -> Self {
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:30.cyan/blue}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        bar.enable_steady_tick(Duration::from_millis(120));

        Self {
            bar,
            state: Mutex::new(ProgressState::default()),
        }
    }

    /// Most recent update received.
    pub fn state(&self) -> ProgressState {
        self.state
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }
}

impl Default for CliProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for CliProgress {
    fn update(&self, step: &str, percent: f64, message: &str, remaining_seconds: Option<f64>) {
        let state = ProgressState::new(step, percent, message, remaining_seconds);
        self.bar.set_position(state.percent.round() as u64);
        self.bar.set_message(state.format_status());

        if let Ok(mut current) = self.state.lock() {
            *current = state;
        }
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}
