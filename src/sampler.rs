//! Frame sampling schedule and frame conditioning.
//!
//! The sampler turns a source's metadata into a fixed timestamp plan (one
//! sample per nominal frame interval, capped), then conditions each
//! fetched frame for metric extraction: resize to the working resolution
//! if the source delivered a different size, then a light Gaussian
//! pre-smooth to suppress sensor and compression noise.

use std::time::Duration;

use image::{GrayImage, imageops};
use imageproc::filter::gaussian_blur_f32;

use crate::{config::AnalyzerConfig, error::AnalyzeError, source::FrameSource};

/// Bounds for the frame rate estimated from frame count and duration.
const MIN_ESTIMATED_FPS: f64 = 1.0;
const MAX_ESTIMATED_FPS: f64 = 240.0;

/// Frame rate assumed when the container declares neither a rate nor a
/// frame count.
const FALLBACK_FPS: f64 = 30.0;

/// The sampling schedule for one analysis run.
#[derive(Debug, Clone)]
pub struct SamplePlan {
    /// Effective frame rate: declared, estimated, or the fallback.
    pub fps: f64,
    /// Spacing between consecutive samples.
    pub interval: Duration,
    /// Timestamps to fetch, in ascending order.
    pub timestamps: Vec<Duration>,
}

impl SamplePlan {
    /// Build the schedule for `source` under `config`.
    ///
    /// One sample is taken per nominal frame interval
    /// (`round(1000 / fps)` milliseconds, at least 1), up to
    /// [`max_frames`](AnalyzerConfig::max_frames) samples.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyzeError::InvalidDuration`] when the source reports a
    /// zero or unusable duration.
    pub fn build(source: &dyn FrameSource, config: &AnalyzerConfig) -> Result<Self, AnalyzeError> {
        let duration = source.duration();
        let duration_ms = duration.as_millis() as u64;
        if duration_ms == 0 {
            return Err(AnalyzeError::InvalidDuration);
        }

        let fps = effective_fps(source);
        let interval_ms = ((1000.0 / fps).round() as u64).max(1);
        let sample_count = (duration_ms / interval_ms).min(config.max_frames as u64);

        let timestamps = (0..sample_count)
            .map(|index| Duration::from_millis(index * interval_ms))
            .collect();

        log::debug!(
            "Sampling plan: fps={fps:.2} interval={interval_ms}ms samples={sample_count}"
        );

        Ok(Self {
            fps,
            interval: Duration::from_millis(interval_ms),
            timestamps,
        })
    }

    /// Number of scheduled samples.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Whether the schedule is empty.
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}

/// Resolve the frame rate to sample at: the declared rate when the
/// container has one, otherwise `frame_count / duration` clamped to a
/// plausible range, otherwise a 30 fps fallback.
fn effective_fps(source: &dyn FrameSource) -> f64 {
    if let Some(fps) = source.declared_fps() {
        if fps.is_finite() && fps > 0.0 {
            return fps;
        }
    }

    let seconds = source.duration().as_secs_f64();
    if let Some(count) = source.frame_count() {
        if seconds > 0.0 && count > 0 {
            return (count as f64 / seconds).clamp(MIN_ESTIMATED_FPS, MAX_ESTIMATED_FPS);
        }
    }

    FALLBACK_FPS
}

/// Condition a fetched frame for metric extraction: resize to the working
/// resolution when needed, then pre-smooth.
pub fn prepare_frame(frame: GrayImage, config: &AnalyzerConfig) -> GrayImage {
    let (width, height) = (config.frame_width, config.frame_height);
    let sized = if frame.dimensions() == (width, height) {
        frame
    } else {
        imageops::resize(&frame, width, height, imageops::FilterType::Triangle)
    };
    gaussian_blur_f32(&sized, config.smoothing_sigma)
}
