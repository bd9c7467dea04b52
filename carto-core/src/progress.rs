//! Progress reporting for long-running ingestion runs.
//!
//! The CLI wires up `BarReporter` for user-visible progress; library callers
//! default to `NoopReporter` or bring their own implementation.

use indicatif::{ProgressBar, ProgressStyle};

/// Trait for reporting progress of pipeline passes.
pub trait ProgressReporter: Send + Sync {
    /// Begin a pass with an optional total unit count.
    fn begin_pass(&self, pass: &str, total: Option<u64>);

    /// Advance progress by the given number of units.
    fn advance(&self, amount: u64);

    /// Mark the current pass as finished.
    fn end_pass(&self);
}

/// No-op reporter for library callers that don't need progress output.
#[derive(Debug, Default)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn begin_pass(&self, _pass: &str, _total: Option<u64>) {}
    fn advance(&self, _amount: u64) {}
    fn end_pass(&self) {}
}

/// Reporter backed by an `indicatif` progress bar for CLI use.
#[derive(Debug)]
pub struct BarReporter {
    bar: ProgressBar,
}

impl Default for BarReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl BarReporter {
    pub fn new() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }
}

impl ProgressReporter for BarReporter {
    fn begin_pass(&self, pass: &str, total: Option<u64>) {
        self.bar.reset();
        if let Some(total) = total {
            self.bar.set_length(total);
            self.bar.set_style(
                ProgressStyle::with_template("{spinner:.green} {msg:12} [{bar:32}] {pos}/{len}")
                    .expect("static template")
                    .progress_chars("=> "),
            );
        } else {
            self.bar.set_style(
                ProgressStyle::with_template("{spinner:.green} {msg:12} {pos}")
                    .expect("static template"),
            );
        }
        self.bar.set_message(pass.to_string());
    }

    fn advance(&self, amount: u64) {
        self.bar.inc(amount);
    }

    fn end_pass(&self) {
        self.bar.finish_and_clear();
    }
}
