//! Analysis results.

use std::time::Duration;

use image::RgbImage;

use crate::classify::FrameClass;

/// Per-frame verdict with the measurements that produced it.
#[derive(Debug, Clone)]
pub struct FrameResult {
    /// Position of this frame in the sampled sequence, starting at 0.
    pub index: usize,
    /// Timestamp of the sample in the source video.
    pub timestamp_ms: u64,
    /// The classifier's verdict.
    pub classification: FrameClass,
    /// Mean absolute pixel difference against the previous frame.
    pub mean_abs_diff: f64,
    /// Mean optical-flow magnitude against the previous frame, in pixels.
    pub motion_magnitude: f64,
    /// Structural similarity against the previous frame.
    pub ssim_neighbor: f64,
    /// Structural similarity against the 50/50 blend of the neighbors.
    pub ssim_synthetic: f64,
    /// Count of edge pixels in the current frame.
    pub edge_count: u32,
    /// Human-readable explanation for the verdict.
    pub reason: String,
    /// Annotated visualization, present only for defect frames when
    /// annotation is enabled.
    pub annotated: Option<RgbImage>,
}

/// Complete result of analyzing one video.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    /// Identifier of the analyzed source.
    pub video: String,
    /// Number of frames actually analyzed (decode gaps excluded).
    pub total_frames: usize,
    /// Frame rate used for sampling and threshold adaptation.
    pub fps: f64,
    /// Duration of the source video.
    pub duration: Duration,
    /// Frames classified as dropped.
    pub drop_count: usize,
    /// Frames classified as merged.
    pub merge_count: usize,
    /// Frames classified as normal.
    pub normal_count: usize,
    /// Per-frame results in sample order.
    pub frames: Vec<FrameResult>,
    /// Wall-clock time the analysis took.
    pub processing_time: Duration,
}

impl AnalysisReport {
    /// Number of frames flagged as either kind of defect.
    pub fn defect_count(&self) -> usize {
        self.drop_count + self.merge_count
    }

    /// Fraction of analyzed frames flagged as defective, in `[0, 1]`.
    pub fn defect_ratio(&self) -> f64 {
        if self.total_frames == 0 {
            0.0
        } else {
            self.defect_count() as f64 / self.total_frames as f64
        }
    }

    /// Results for defect frames only, in sample order.
    pub fn defects(&self) -> impl Iterator<Item = &FrameResult> {
        self.frames
            .iter()
            .filter(|frame| frame.classification != FrameClass::Normal)
    }
}
