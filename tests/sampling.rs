use std::time::Duration;

use dropmerge::{AnalyzeError, AnalyzerConfig, FrameSource, SamplePlan};
use image::GrayImage;

/// Metadata-only source; plan construction never fetches frames.
struct MetaSource {
    duration: Duration,
    fps: Option<f64>,
    frame_count: Option<u64>,
}

impl FrameSource for MetaSource {
    fn identifier(&self) -> String {
        "meta".to_string()
    }

    fn duration(&self) -> Duration {
        self.duration
    }

    fn declared_fps(&self) -> Option<f64> {
        self.fps
    }

    fn frame_count(&self) -> Option<u64> {
        self.frame_count
    }

    fn frame_near(
        &mut self,
        _timestamp: Duration,
        _width: u32,
        _height: u32,
    ) -> Result<Option<GrayImage>, AnalyzeError> {
        unreachable!("plan construction does not fetch frames")
    }
}

#[test]
fn declared_fps_drives_the_interval() {
    let source = MetaSource {
        duration: Duration::from_secs(10),
        fps: Some(30.0),
        frame_count: None,
    };
    let plan = SamplePlan::build(&source, &AnalyzerConfig::new()).unwrap();

    assert_eq!(plan.fps, 30.0);
    assert_eq!(plan.interval, Duration::from_millis(33));
    assert_eq!(plan.timestamps[0], Duration::ZERO);
    assert_eq!(plan.timestamps[1], Duration::from_millis(33));
}

#[test]
fn missing_fps_is_estimated_from_frame_count() {
    let source = MetaSource {
        duration: Duration::from_secs(10),
        fps: None,
        frame_count: Some(600),
    };
    let plan = SamplePlan::build(&source, &AnalyzerConfig::new()).unwrap();

    assert_eq!(plan.fps, 60.0);
    assert_eq!(plan.interval, Duration::from_millis(17));
}

#[test]
fn estimated_fps_is_clamped_to_a_plausible_range() {
    let slow = MetaSource {
        duration: Duration::from_secs(100),
        fps: None,
        frame_count: Some(10),
    };
    let plan = SamplePlan::build(&slow, &AnalyzerConfig::new()).unwrap();
    assert_eq!(plan.fps, 1.0);

    let fast = MetaSource {
        duration: Duration::from_secs(1),
        fps: None,
        frame_count: Some(100_000),
    };
    let plan = SamplePlan::build(&fast, &AnalyzerConfig::new()).unwrap();
    assert_eq!(plan.fps, 240.0);
}

#[test]
fn no_metadata_falls_back_to_30_fps() {
    let source = MetaSource {
        duration: Duration::from_secs(5),
        fps: None,
        frame_count: None,
    };
    let plan = SamplePlan::build(&source, &AnalyzerConfig::new()).unwrap();
    assert_eq!(plan.fps, 30.0);
}

#[test]
fn nonsensical_declared_fps_is_ignored() {
    let source = MetaSource {
        duration: Duration::from_secs(5),
        fps: Some(0.0),
        frame_count: Some(150),
    };
    let plan = SamplePlan::build(&source, &AnalyzerConfig::new()).unwrap();
    assert_eq!(plan.fps, 30.0);
}

#[test]
fn sample_count_is_capped_by_max_frames() {
    let source = MetaSource {
        duration: Duration::from_secs(3600),
        fps: Some(30.0),
        frame_count: None,
    };
    let plan = SamplePlan::build(&source, &AnalyzerConfig::new()).unwrap();
    assert_eq!(plan.len(), 300);

    let config = AnalyzerConfig::new().with_max_frames(50);
    let plan = SamplePlan::build(&source, &config).unwrap();
    assert_eq!(plan.len(), 50);
}

#[test]
fn zero_duration_is_rejected() {
    let source = MetaSource {
        duration: Duration::ZERO,
        fps: Some(30.0),
        frame_count: None,
    };
    let error = SamplePlan::build(&source, &AnalyzerConfig::new()).unwrap_err();
    assert!(matches!(error, AnalyzeError::InvalidDuration));
}
