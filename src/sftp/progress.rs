//! Transfer progress reporting
//!
//! The engine pushes [`TransferProgress`] snapshots to a [`ProgressObserver`]
//! synchronously from the transfer task. [`ProgressThrottle`] keeps the rate
//! at no more than one report per interval; the final snapshot of a file is
//! always delivered.

use std::io::{self, Write};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use super::types::{format_size, TransferProgress};

/// Receiver of progress snapshots.
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, progress: &TransferProgress);

    /// Called once per file after the last `on_progress`.
    fn on_finished(&self, _progress: &TransferProgress) {}
}

/// Observer that ignores everything.
pub struct NoOpObserver;

impl ProgressObserver for NoOpObserver {
    fn on_progress(&self, _progress: &TransferProgress) {}
}

/// Closure-backed observer.
pub struct FnObserver<F>
where
    F: Fn(&TransferProgress) + Send + Sync,
{
    f: F,
}

impl<F> FnObserver<F>
where
    F: Fn(&TransferProgress) + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> ProgressObserver for FnObserver<F>
where
    F: Fn(&TransferProgress) + Send + Sync,
{
    fn on_progress(&self, progress: &TransferProgress) {
        (self.f)(progress)
    }
}

/// Helper to create an Arc-wrapped observer from a closure.
pub fn observer<F>(f: F) -> Arc<dyn ProgressObserver>
where
    F: Fn(&TransferProgress) + Send + Sync + 'static,
{
    Arc::new(FnObserver::new(f))
}

/// Single-line terminal renderer: `[name] wrote X of Y`, rewritten in place.
#[derive(Default)]
pub struct ConsoleProgress {
    /// Width of the previous line so a shorter one can blank it out
    last_width: Mutex<usize>,
}

impl ConsoleProgress {
    pub fn new() -> Self {
        Self::default()
    }

    fn render(progress: &TransferProgress) -> String {
        format!(
            "[{}] wrote {} of {}",
            progress.name,
            format_size(progress.transferred_bytes),
            format_size(progress.total_bytes)
        )
    }
}

impl ProgressObserver for ConsoleProgress {
    fn on_progress(&self, progress: &TransferProgress) {
        let line = Self::render(progress);
        let mut last_width = self.last_width.lock();
        let pad = last_width.saturating_sub(line.len());
        *last_width = line.len();

        let mut stdout = io::stdout().lock();
        let _ = write!(stdout, "\r{}{:pad$}", line, "", pad = pad);
        let _ = stdout.flush();
    }

    fn on_finished(&self, _progress: &TransferProgress) {
        *self.last_width.lock() = 0;
        let mut stdout = io::stdout().lock();
        let _ = writeln!(stdout);
        let _ = stdout.flush();
    }
}

/// Rate limiter for progress reports.
#[derive(Debug)]
pub struct ProgressThrottle {
    interval: Duration,
    last_report: Instant,
}

impl ProgressThrottle {
    /// The first report is due one `interval` after creation.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_report: Instant::now(),
        }
    }

    /// Returns true (and restarts the interval) if a report is due.
    pub fn ready(&mut self) -> bool {
        let now = Instant::now();
        if now.duration_since(self.last_report) >= self.interval {
            self.last_report = now;
            true
        } else {
            false
        }
    }
}
