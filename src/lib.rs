//! # dropmerge
//!
//! Offline detection of frame drops and frame merges in video files.
//!
//! `dropmerge` samples a video at its nominal frame rate, extracts five
//! temporal signals per frame (pixel difference, dense optical-flow
//! magnitude, neighbor SSIM, SSIM against a synthetic 50/50 blend of the
//! neighbors, and Canny edge count), and judges each frame against
//! rolling baselines with frame-rate-adaptive thresholds. Decoding is
//! powered by FFmpeg via the
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next) crate.
//!
//! ## Quick Start
//!
//! ```no_run
//! use dropmerge::{AnalyzerConfig, NoOpCallback, VideoAnalyzer, VideoSource};
//!
//! let mut source = VideoSource::open("input.mp4").unwrap();
//! let analyzer = VideoAnalyzer::new(AnalyzerConfig::new());
//! let report = analyzer.analyze(&mut source, &NoOpCallback).unwrap();
//!
//! println!(
//!     "{}: {} drops, {} merges in {} frames",
//!     report.video, report.drop_count, report.merge_count, report.total_frames
//! );
//! for defect in report.defects() {
//!     println!("  frame {} @ {}ms: {}", defect.index, defect.timestamp_ms, defect.reason);
//! }
//! ```
//!
//! ## Features
//!
//! - **Drop detection** — duplicate frames left by transcoders that masked
//!   a true drop, motion spikes corroborated by a structural-similarity
//!   dip, and extreme motion discontinuities
//! - **Merge detection** — frames matching a synthetic blend of their
//!   neighbors, with double-edge ghosting as corroborating evidence
//! - **Frame-rate adaptation** — thresholds tighten or relax with the
//!   source frame rate, with stricter corroboration above 45 fps
//! - **Per-frame explanations** — every verdict carries a human-readable
//!   reason string with the measurements that drove it
//! - **Diagnostic overlays** — flagged frames can be rendered with borders
//!   and tints showing the offending regions
//! - **Progress & cancellation** — cooperative callbacks and
//!   `CancellationToken` for long-running analyses
//! - **Source abstraction** — the [`FrameSource`] trait lets tests drive
//!   the full pipeline with synthetic frame sequences
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system.

pub mod analyzer;
pub mod annotate;
pub mod classify;
pub mod config;
pub mod error;
pub mod flow;
pub mod metrics;
pub mod progress;
pub mod report;
pub mod sampler;
pub mod source;
pub mod ssim;
pub mod stats;

pub use analyzer::VideoAnalyzer;
pub use classify::{FrameClass, SignalBaselines, classify};
pub use config::AnalyzerConfig;
pub use error::AnalyzeError;
pub use flow::{FlowField, dense_flow};
pub use metrics::{FrameSignals, SignalExtraction, extract_signals, mean_abs_diff, synthetic_blend};
pub use progress::{AnalysisCallback, CancellationToken, NoOpCallback};
pub use report::{AnalysisReport, FrameResult};
pub use sampler::SamplePlan;
pub use source::{FrameSource, VideoSource};
pub use ssim::ssim;
pub use stats::RollingWindow;
