//! Progress reporting for the issue page fan-out.
//!
//! The CLI uses `IndicatifReporter` for a progress bar on stderr.
//! Library callers and tests use `NoopReporter` or their own implementation.

use indicatif::{ProgressBar, ProgressStyle};

/// Sink for page-level progress of the issue collector.
pub trait ProgressReporter: Send + Sync {
    /// A new counted task begins; `total` is `None` when unknown.
    fn start(&self, task: &str, total: Option<u64>);

    /// `amount` more units are done.
    fn advance(&self, amount: u64);

    /// The task is done; clear any display.
    fn finish(&self);
}

/// Discards all progress.
#[derive(Debug, Default)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn start(&self, _task: &str, _total: Option<u64>) {}
    fn advance(&self, _amount: u64) {}
    fn finish(&self) {}
}

/// Page counter drawn as an `indicatif` bar on stderr.
#[derive(Debug)]
pub struct IndicatifReporter {
    bar: ProgressBar,
}

impl Default for IndicatifReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl IndicatifReporter {
    pub fn new() -> Self {
        Self {
            bar: ProgressBar::new(0),
        }
    }

    /// Reporter that tracks progress without drawing anything.
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }
}

impl ProgressReporter for IndicatifReporter {
    fn start(&self, task: &str, total: Option<u64>) {
        let template = if total.is_some() {
            "{spinner:.green} {msg} [{bar:30.cyan/blue}] {pos}/{len}"
        } else {
            "{spinner:.green} {msg} {pos}"
        };
        if let Ok(style) = ProgressStyle::with_template(template) {
            self.bar.set_style(style.progress_chars("=> "));
        }
        self.bar.set_length(total.unwrap_or(0));
        self.bar.set_message(task.to_string());
        self.bar.reset();
    }

    fn advance(&self, amount: u64) {
        self.bar.inc(amount);
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}
