//! Analyzer configuration.
//!
//! [`AnalyzerConfig`] collects every tunable of the detection pipeline as a
//! named field with a named default constant, so tests can drive the
//! pipeline with synthetic fixtures instead of relying on magic numbers
//! buried in the code. It also owns the frame-rate-adaptive threshold
//! calculations, since those are pure functions of the configured bases.
//!
//! # Example
//!
//! ```
//! use dropmerge::AnalyzerConfig;
//!
//! let config = AnalyzerConfig::new()
//!     .with_max_frames(100)
//!     .with_working_resolution(320, 180);
//!
//! // Thresholds tighten as the frame rate rises above the 30 fps base.
//! assert!(config.duplicate_threshold(120.0) < config.duplicate_threshold(30.0));
//! assert!(config.merge_ssim_threshold(120.0) > config.merge_ssim_threshold(30.0));
//! ```

use crate::progress::CancellationToken;

/// Reference frame rate the base thresholds were calibrated at.
pub const BASE_FPS: f64 = 30.0;
/// Mean-absolute-difference threshold for duplicate detection at [`BASE_FPS`].
pub const BASE_DUPLICATE_THRESHOLD: f64 = 1.5;
/// SSIM-to-synthetic-blend threshold for merge detection at [`BASE_FPS`].
pub const BASE_MERGE_SSIM_THRESHOLD: f64 = 0.92;
/// Neighbor-SSIM level above which a frame is a true duplicate.
pub const TRUE_DUPLICATE_SSIM: f64 = 0.997;
/// Sigma multiplier for the motion-spike drop rule.
pub const DROP_MOTION_SIGMA: f64 = 2.5;
/// Sigma multiplier for the SSIM-drop half of the motion+structure rule.
pub const DROP_SSIM_SIGMA: f64 = 2.0;
/// Sigma multiplier for the edge-spike merge evidence.
pub const MERGE_EDGE_SIGMA: f64 = 2.0;
/// Capacity of the rolling statistics windows.
pub const ROLLING_WINDOW: usize = 30;
/// Minimum window fill before adaptive thresholds become reachable.
pub const MIN_HISTORY: usize = 5;
/// Hard cap on the number of sampled frames per analysis.
pub const MAX_FRAMES: usize = 300;
/// Working frame width in pixels.
pub const FRAME_WIDTH: u32 = 640;
/// Working frame height in pixels.
pub const FRAME_HEIGHT: u32 = 360;
/// Sigma of the pre-analysis Gaussian smoothing.
///
/// Matches what OpenCV derives for a 5×5 kernel with sigma 0:
/// `0.3 * ((5 - 1) * 0.5 - 1) + 0.8 = 1.1`.
pub const SMOOTHING_SIGMA: f32 = 1.1;

/// Configuration for an analysis run.
///
/// All fields have defaults matching the named constants in this module; a
/// default-constructed config reproduces the reference detector behavior.
#[derive(Debug, Clone)]
#[must_use]
pub struct AnalyzerConfig {
    /// Working frame width; frames are downscaled to this before analysis.
    pub frame_width: u32,
    /// Working frame height.
    pub frame_height: u32,
    /// Hard cap on sampled frames (memory/time bound, not a rejection).
    pub max_frames: usize,
    /// Capacity of the motion/SSIM/edge rolling windows.
    pub rolling_window: usize,
    /// Window fill below which adaptive thresholds are unreachable.
    pub min_history: usize,
    /// Base duplicate pixel-diff threshold, calibrated at [`BASE_FPS`].
    pub base_duplicate_threshold: f64,
    /// Base merge SSIM-synthetic threshold, calibrated at [`BASE_FPS`].
    pub base_merge_ssim_threshold: f64,
    /// Neighbor-SSIM level identifying a true duplicate.
    pub true_duplicate_ssim: f64,
    /// Sigma multiplier for the motion-spike rules.
    pub drop_motion_sigma: f64,
    /// Sigma multiplier for the SSIM-drop rule.
    pub drop_ssim_sigma: f64,
    /// Sigma multiplier for edge-spike merge evidence.
    pub merge_edge_sigma: f64,
    /// Sigma of the Gaussian pre-smooth applied to every sampled frame.
    pub smoothing_sigma: f32,
    /// Whether to render diagnostic overlay images for flagged frames.
    pub annotate: bool,
    /// Cancellation token. `None` means never cancelled.
    pub(crate) cancellation: Option<CancellationToken>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalyzerConfig {
    /// Create a configuration with the reference defaults.
    pub fn new() -> Self {
        Self {
            frame_width: FRAME_WIDTH,
            frame_height: FRAME_HEIGHT,
            max_frames: MAX_FRAMES,
            rolling_window: ROLLING_WINDOW,
            min_history: MIN_HISTORY,
            base_duplicate_threshold: BASE_DUPLICATE_THRESHOLD,
            base_merge_ssim_threshold: BASE_MERGE_SSIM_THRESHOLD,
            true_duplicate_ssim: TRUE_DUPLICATE_SSIM,
            drop_motion_sigma: DROP_MOTION_SIGMA,
            drop_ssim_sigma: DROP_SSIM_SIGMA,
            merge_edge_sigma: MERGE_EDGE_SIGMA,
            smoothing_sigma: SMOOTHING_SIGMA,
            annotate: true,
            cancellation: None,
        }
    }

    /// Set the working resolution frames are downscaled to.
    pub fn with_working_resolution(mut self, width: u32, height: u32) -> Self {
        self.frame_width = width.max(1);
        self.frame_height = height.max(1);
        self
    }

    /// Cap the number of sampled frames. Clamped to a minimum of 3.
    pub fn with_max_frames(mut self, max_frames: usize) -> Self {
        self.max_frames = max_frames.max(3);
        self
    }

    /// Set the rolling-window capacity. Clamped to a minimum of 1.
    pub fn with_rolling_window(mut self, capacity: usize) -> Self {
        self.rolling_window = capacity.max(1);
        self
    }

    /// Enable or disable diagnostic overlay rendering for flagged frames.
    pub fn with_annotations(mut self, annotate: bool) -> Self {
        self.annotate = annotate;
        self
    }

    /// Attach a cancellation token.
    ///
    /// When the token is cancelled, the analysis loop stops before the next
    /// frame and the run fails with
    /// [`AnalyzeError::Cancelled`](crate::AnalyzeError::Cancelled).
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Returns `true` if cancellation has been requested.
    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(|token| token.is_cancelled())
    }

    /// Duplicate-detection pixel-diff threshold, rescaled for `fps`.
    ///
    /// At or below [`BASE_FPS`] this is the base threshold; above it the
    /// threshold shrinks as `base / ln(fps/30 + 1)`, because consecutive
    /// frames of a high-rate capture are naturally more alike.
    pub fn duplicate_threshold(&self, fps: f64) -> f64 {
        let ratio = (fps / BASE_FPS).max(1.0);
        if ratio <= 1.0 {
            return self.base_duplicate_threshold;
        }
        self.base_duplicate_threshold / (ratio + 1.0).ln()
    }

    /// Merge SSIM-synthetic threshold, rescaled for `fps`.
    ///
    /// At or below [`BASE_FPS`] this is the base threshold; above it the
    /// threshold rises toward (and is capped at) 0.995, because natural
    /// neighbor similarity already approaches the 50/50 blend at high
    /// frame rates.
    pub fn merge_ssim_threshold(&self, fps: f64) -> f64 {
        let ratio = (fps / BASE_FPS).max(1.0);
        if ratio <= 1.0 {
            return self.base_merge_ssim_threshold;
        }
        let scale = 1.0 - 1.0 / ratio;
        (self.base_merge_ssim_threshold + (1.0 - self.base_merge_ssim_threshold) * scale)
            .min(0.995)
    }

    /// Whether `fps` counts as high frame rate (1.5× the 30 fps base).
    ///
    /// High-fps videos require stricter corroboration in several classifier
    /// branches. The gate is hand-tuned; see the classifier rules.
    pub fn is_high_fps(&self, fps: f64) -> bool {
        fps > BASE_FPS * 1.5
    }
}
