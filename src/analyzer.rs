//! The analysis pipeline.
//!
//! [`VideoAnalyzer`] drives a single pass over a [`FrameSource`]: build the
//! sampling schedule, fetch and condition frames, extract temporal signals
//! for each interior frame, judge them against rolling baselines, and
//! assemble the [`AnalysisReport`].

use std::time::Instant;

use image::GrayImage;

use crate::{
    annotate::annotate_frame,
    classify::{FrameClass, SignalBaselines, classify},
    config::AnalyzerConfig,
    error::AnalyzeError,
    metrics::extract_signals,
    progress::AnalysisCallback,
    report::{AnalysisReport, FrameResult},
    sampler::{SamplePlan, prepare_frame},
    source::FrameSource,
    stats::RollingWindow,
};

/// Fewer surviving frames than this and no interior frame has both
/// neighbors, so nothing can be classified.
const MIN_ANALYZABLE_FRAMES: usize = 3;

/// Offline drop/merge detector.
///
/// # Example
///
/// ```no_run
/// use dropmerge::{AnalyzerConfig, NoOpCallback, VideoAnalyzer, VideoSource};
///
/// let mut source = VideoSource::open("input.mp4").unwrap();
/// let analyzer = VideoAnalyzer::new(AnalyzerConfig::new());
/// let report = analyzer.analyze(&mut source, &NoOpCallback).unwrap();
/// println!("{} drops, {} merges", report.drop_count, report.merge_count);
/// ```
pub struct VideoAnalyzer {
    config: AnalyzerConfig,
}

impl VideoAnalyzer {
    /// Create an analyzer with the given configuration.
    pub fn new(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    /// Analyze one video and produce a report.
    ///
    /// The observer receives one
    /// [`on_progress`](AnalysisCallback::on_progress) per analyzed frame,
    /// then exactly one of
    /// [`on_complete`](AnalysisCallback::on_complete) or
    /// [`on_error`](AnalysisCallback::on_error) depending on the outcome.
    /// The same outcome is also the return value.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyzeError::InvalidDuration`] for an empty source,
    /// [`AnalyzeError::NotEnoughFrames`] when fewer than 3 frames could be
    /// decoded, and [`AnalyzeError::Cancelled`] when the configured
    /// cancellation token fires mid-run.
    pub fn analyze(
        &self,
        source: &mut dyn FrameSource,
        observer: &dyn AnalysisCallback,
    ) -> Result<AnalysisReport, AnalyzeError> {
        match self.run(source, observer) {
            Ok(report) => {
                observer.on_complete(&report);
                Ok(report)
            }
            Err(error) => {
                observer.on_error(&error.to_string());
                Err(error)
            }
        }
    }

    fn run(
        &self,
        source: &mut dyn FrameSource,
        observer: &dyn AnalysisCallback,
    ) -> Result<AnalysisReport, AnalyzeError> {
        let started = Instant::now();

        let plan = SamplePlan::build(source, &self.config)?;
        let frames = self.collect_frames(source, &plan)?;

        if frames.len() < MIN_ANALYZABLE_FRAMES {
            return Err(AnalyzeError::NotEnoughFrames {
                found: frames.len(),
            });
        }

        log::debug!(
            "Analyzing {} frames of {} at {:.2} fps",
            frames.len(),
            source.identifier(),
            plan.fps,
        );

        let mut motion_window = RollingWindow::new(self.config.rolling_window);
        let mut ssim_window = RollingWindow::new(self.config.rolling_window);
        let mut edge_window = RollingWindow::new(self.config.rolling_window);

        let total = frames.len();
        let mut results = Vec::with_capacity(total);
        let mut drop_count = 0;
        let mut merge_count = 0;
        let mut normal_count = 0;

        for (index, (timestamp, frame)) in frames.iter().enumerate() {
            if self.config.is_cancelled() {
                return Err(AnalyzeError::Cancelled);
            }

            let result = if index == 0 || index == total - 1 {
                boundary_result(index, *timestamp)
            } else {
                let (_, prev) = &frames[index - 1];
                let (_, next) = &frames[index + 1];
                let extraction = extract_signals(prev, frame, next);
                let signals = extraction.signals;

                // Current frame's own values enter the windows before the
                // baselines are read.
                motion_window.push(signals.motion_magnitude);
                ssim_window.push(signals.ssim_neighbor);
                edge_window.push(f64::from(signals.edge_count));

                let baselines = SignalBaselines {
                    motion_mean: motion_window.mean(),
                    motion_std: motion_window.std_dev(),
                    ssim_mean: ssim_window.mean(),
                    ssim_std: ssim_window.std_dev(),
                    edge_mean: edge_window.mean(),
                    edge_std: edge_window.std_dev(),
                    window_len: motion_window.len(),
                };

                let (class, reason) = classify(&signals, &baselines, plan.fps, &self.config);

                let annotated = if self.config.annotate {
                    annotate_frame(class, frame, &extraction.flow, &extraction.edges)
                } else {
                    None
                };

                FrameResult {
                    index,
                    timestamp_ms: timestamp.as_millis() as u64,
                    classification: class,
                    mean_abs_diff: signals.mean_abs_diff,
                    motion_magnitude: signals.motion_magnitude,
                    ssim_neighbor: signals.ssim_neighbor,
                    ssim_synthetic: signals.ssim_synthetic,
                    edge_count: signals.edge_count,
                    reason,
                    annotated,
                }
            };

            match result.classification {
                FrameClass::Normal => normal_count += 1,
                FrameClass::FrameDrop => drop_count += 1,
                FrameClass::FrameMerge => merge_count += 1,
            }

            observer.on_progress(index + 1, total, result.classification);
            results.push(result);
        }

        Ok(AnalysisReport {
            video: source.identifier(),
            total_frames: total,
            fps: plan.fps,
            duration: source.duration(),
            drop_count,
            merge_count,
            normal_count,
            frames: results,
            processing_time: started.elapsed(),
        })
    }

    /// Fetch and condition every scheduled frame. Fetches that yield no
    /// frame are skipped without error.
    fn collect_frames(
        &self,
        source: &mut dyn FrameSource,
        plan: &SamplePlan,
    ) -> Result<Vec<(std::time::Duration, GrayImage)>, AnalyzeError> {
        let mut frames = Vec::with_capacity(plan.len());
        for &timestamp in &plan.timestamps {
            if self.config.is_cancelled() {
                return Err(AnalyzeError::Cancelled);
            }
            match source.frame_near(timestamp, self.config.frame_width, self.config.frame_height)? {
                Some(frame) => frames.push((timestamp, prepare_frame(frame, &self.config))),
                None => log::debug!("No frame decodable near {timestamp:?}, skipping"),
            }
        }
        Ok(frames)
    }
}

/// The first and last samples have no triplet, so they carry neutral
/// metrics and a fixed verdict.
fn boundary_result(index: usize, timestamp: std::time::Duration) -> FrameResult {
    FrameResult {
        index,
        timestamp_ms: timestamp.as_millis() as u64,
        classification: FrameClass::Normal,
        mean_abs_diff: 0.0,
        motion_magnitude: 0.0,
        ssim_neighbor: 1.0,
        ssim_synthetic: 0.0,
        edge_count: 0,
        reason: "Boundary frame".to_string(),
        annotated: None,
    }
}
