//! Progress reporting and cancellation support.
//!
//! This module provides [`AnalysisCallback`] for observing an analysis run,
//! and [`CancellationToken`] for cooperative cancellation.
//!
//! # Example
//!
//! ```no_run
//! use dropmerge::{
//!     AnalysisCallback, AnalysisReport, AnalyzerConfig, FrameClass,
//!     VideoAnalyzer, VideoSource,
//! };
//!
//! struct PrintProgress;
//!
//! impl AnalysisCallback for PrintProgress {
//!     fn on_progress(&self, processed: usize, total: usize, class: FrameClass) {
//!         println!("{processed}/{total}: {class}");
//!     }
//!     fn on_complete(&self, report: &AnalysisReport) {
//!         println!("{} drops, {} merges", report.drop_count, report.merge_count);
//!     }
//!     fn on_error(&self, message: &str) {
//!         eprintln!("analysis failed: {message}");
//!     }
//! }
//!
//! let mut source = VideoSource::open("input.mp4").unwrap();
//! let analyzer = VideoAnalyzer::new(AnalyzerConfig::default());
//! let _ = analyzer.analyze(&mut source, &PrintProgress);
//! ```

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use crate::classify::FrameClass;
use crate::report::AnalysisReport;

/// Trait for observing an analysis run.
///
/// Implementations must be [`Send`] and [`Sync`] because an analysis is
/// typically run off the interactive thread.
///
/// Delivery guarantees:
/// - [`on_progress`](AnalysisCallback::on_progress) fires exactly once per
///   sampled frame, in increasing index order, boundary frames included.
/// - Exactly one of [`on_complete`](AnalysisCallback::on_complete) or
///   [`on_error`](AnalysisCallback::on_error) fires per run, after all
///   progress events.
///
/// Callbacks are invoked synchronously from the analysis thread and must
/// not block for long; buffering or throttling is the observer's job.
pub trait AnalysisCallback: Send + Sync {
    /// Called once per processed frame.
    fn on_progress(&self, processed: usize, total: usize, current_class: FrameClass);

    /// Called once when the analysis finishes successfully.
    fn on_complete(&self, report: &AnalysisReport);

    /// Called once when the analysis fails; no report is produced.
    fn on_error(&self, message: &str);
}

/// A no-op observer that discards all notifications.
///
/// Useful when only the returned [`AnalysisReport`] is of interest.
pub struct NoOpCallback;

impl AnalysisCallback for NoOpCallback {
    fn on_progress(&self, _processed: usize, _total: usize, _current_class: FrameClass) {}
    fn on_complete(&self, _report: &AnalysisReport) {}
    fn on_error(&self, _message: &str) {}
}

/// Cooperative cancellation token backed by an [`AtomicBool`].
///
/// Clone this token and share it between threads; call
/// [`cancel`](CancellationToken::cancel) from any thread to request
/// cancellation. The analysis loop checks
/// [`is_cancelled`](CancellationToken::is_cancelled) at the top of each
/// per-frame iteration — cancellation is best-effort and never interrupts
/// a frame mid-computation.
///
/// # Example
///
/// ```
/// use dropmerge::CancellationToken;
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
