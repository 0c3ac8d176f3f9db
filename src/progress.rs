//! Progress reporting and cancellation support.
//!
//! This module provides [`ProgressCallback`] for monitoring a burn,
//! [`CancellationToken`] for cooperative cancellation, and [`ProgressInfo`]
//! for detailed progress snapshots.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use subburn::{BurnOptions, ProgressCallback, ProgressInfo};
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         println!("[{:?}] {}% complete", info.operation, info.percent);
//!     }
//!
//!     fn on_failure(&self, message: &str) {
//!         eprintln!("burn failed: {message}");
//!     }
//! }
//!
//! let options = BurnOptions::new().with_progress(Arc::new(PrintProgress));
//! ```

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::{Duration, Instant};

/// The kind of operation currently in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum OperationType {
    /// Compositing cues into frames and encoding them.
    Burning,
    /// Decoding an embedded subtitle stream.
    SubtitleExtraction,
}

/// A snapshot of burn progress.
///
/// Delivered to [`ProgressCallback::on_progress`] at a cadence controlled
/// by [`BurnOptions::with_batch_size`](crate::BurnOptions::with_batch_size).
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// What kind of work is being performed.
    pub operation: OperationType,
    /// Completion percentage in `0..=100`. Never decreases within a job.
    pub percent: u8,
    /// How many output frames have been produced so far.
    pub current: u64,
    /// Total output frames expected, if the duration is known.
    pub total: Option<u64>,
    /// Encoded bytes written so far.
    pub bytes_written: u64,
    /// Wall-clock time elapsed since the operation started.
    pub elapsed: Duration,
    /// Estimated time remaining, based on current throughput.
    pub estimated_remaining: Option<Duration>,
    /// Playback time of the frame just produced.
    pub current_timestamp: Option<Duration>,
}

/// Trait for receiving progress updates during a burn.
///
/// Implementations must be [`Send`] and [`Sync`] so one callback can be
/// shared between jobs running on different threads.
///
/// Progress callbacks are **infallible**: they observe but cannot halt
/// the operation. Use [`CancellationToken`] for cooperative cancellation.
pub trait ProgressCallback: Send + Sync {
    /// Called after output frames are produced, and once with `100` when the
    /// job completes.
    fn on_progress(&self, info: &ProgressInfo);

    /// Called exactly once if the job fails, with the error message.
    fn on_failure(&self, _message: &str) {}
}

/// A no-op implementation that discards all progress notifications.
///
/// This is the default when no callback is configured.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

/// Cooperative cancellation token backed by an [`AtomicBool`].
///
/// Clone this token and share it between threads; call
/// [`cancel`](CancellationToken::cancel) from any thread to request
/// cancellation. A burn job checks
/// [`is_cancelled`](CancellationToken::is_cancelled) before each frame.
///
/// # Example
///
/// ```
/// use subburn::CancellationToken;
///
/// let token = CancellationToken::new();
/// assert!(!token.is_cancelled());
///
/// // From another thread (or a signal handler, etc.):
/// token.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a new, non-cancelled token.
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Request cancellation.
    ///
    /// All clones of this token will observe the cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Check whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Tracks progress timing, keeps the percentage monotonic and emits callbacks.
pub(crate) struct ProgressTracker {
    callback: Arc<dyn ProgressCallback>,
    operation: OperationType,
    total: Option<u64>,
    current: u64,
    percent: u8,
    bytes_written: u64,
    batch_size: u64,
    start_time: Instant,
    items_since_last_report: u64,
}

impl ProgressTracker {
    pub(crate) fn new(
        callback: Arc<dyn ProgressCallback>,
        operation: OperationType,
        total: Option<u64>,
        batch_size: u64,
    ) -> Self {
        Self {
            callback,
            operation,
            total,
            current: 0,
            percent: 0,
            bytes_written: 0,
            batch_size: batch_size.max(1),
            start_time: Instant::now(),
            items_since_last_report: 0,
        }
    }

    /// Last percentage handed to the callback (or about to be).
    pub(crate) fn percent(&self) -> u8 {
        self.percent
    }

    /// Record one produced frame and fire the callback if the batch
    /// threshold is reached. `percent` lower than a previous value is
    /// raised to it. Returns whether the callback fired.
    pub(crate) fn advance(&mut self, percent: u8, timestamp: Duration, bytes_written: u64) -> bool {
        self.current += 1;
        self.percent = self.percent.max(percent.min(100));
        self.bytes_written = bytes_written;
        self.items_since_last_report += 1;

        if self.items_since_last_report < self.batch_size {
            return false;
        }
        self.report(Some(timestamp));
        self.items_since_last_report = 0;
        true
    }

    /// Report completion at 100%.
    pub(crate) fn finish(&mut self, bytes_written: u64) {
        self.percent = 100;
        self.bytes_written = bytes_written;
        self.report(None);
    }

    fn report(&self, timestamp: Option<Duration>) {
        let elapsed = self.start_time.elapsed();

        let estimated_remaining = if self.current > 0 {
            self.total.map(|t| {
                let remaining = t.saturating_sub(self.current);
                elapsed.mul_f64(remaining as f64 / self.current as f64)
            })
        } else {
            None
        };

        let info = ProgressInfo {
            operation: self.operation,
            percent: self.percent,
            current: self.current,
            total: self.total,
            bytes_written: self.bytes_written,
            elapsed,
            estimated_remaining,
            current_timestamp: timestamp,
        };

        self.callback.on_progress(&info);
    }
}
