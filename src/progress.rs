//! Progress reporting
//!
//! The exporter announces the number of screens once, then ticks once per
//! finished primary download. Version downloads are not counted.

use std::io::{self, Write};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tracing_subscriber::fmt::MakeWriter;

/// Receiver of progress events
pub trait ProgressSink: Send + Sync {
    /// Number of primary downloads the run will perform
    fn start(&self, total: u64);
    /// One primary download finished, successfully or not
    fn tick(&self);
    /// All downloads finished
    fn finish(&self);
}

/// Discards progress events
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn start(&self, _total: u64) {}
    fn tick(&self) {}
    fn finish(&self) {}
}

/// Terminal progress bar showing rate, percentage and time remaining
pub struct ProgressBarSink {
    bar: ProgressBar,
}

impl ProgressBarSink {
    /// A bar drawn on stderr
    #[must_use]
    pub fn new() -> Self {
        Self::with_bar(ProgressBar::new(0))
    }

    /// A bar that never draws, for non-interactive runs
    #[must_use]
    pub fn hidden() -> Self {
        Self::with_bar(ProgressBar::with_draw_target(
            Some(0),
            ProgressDrawTarget::hidden(),
        ))
    }

    fn with_bar(bar: ProgressBar) -> Self {
        bar.set_style(
            ProgressStyle::with_template(
                "  Fetching screens [{bar:20}] {per_sec} {percent}% {eta}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("= "),
        );
        Self { bar }
    }

    /// Primary downloads counted so far
    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    /// Writer for log output that clears the bar while a line is printed
    pub fn log_writer(&self) -> BarLogWriter {
        BarLogWriter {
            bar: self.bar.clone(),
        }
    }
}

/// Stderr writer that suspends a progress bar around every write
#[derive(Clone)]
pub struct BarLogWriter {
    bar: ProgressBar,
}

impl Write for BarLogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bar.suspend(|| io::stderr().write(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.bar.suspend(|| io::stderr().flush())
    }
}

impl<'a> MakeWriter<'a> for BarLogWriter {
    type Writer = BarLogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

impl Default for ProgressBarSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for ProgressBarSink {
    fn start(&self, total: u64) {
        self.bar.set_length(total);
        self.bar.set_position(0);
        self.bar.enable_steady_tick(Duration::from_millis(250));
    }

    fn tick(&self) {
        self.bar.inc(1);
    }

    fn finish(&self) {
        self.bar.finish();
    }
}
