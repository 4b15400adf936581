use std::time::Duration;

use dropmerge::{
    AnalyzeError, AnalyzerConfig, FrameClass, FrameSource, NoOpCallback, VideoAnalyzer,
};
use image::{GrayImage, Luma};

/// In-memory source: one stored frame per nominal frame interval.
struct SyntheticSource {
    frames: Vec<GrayImage>,
    fps: f64,
    interval_ms: u64,
}

impl SyntheticSource {
    fn new(frames: Vec<GrayImage>, fps: f64) -> Self {
        let interval_ms = ((1000.0 / fps).round() as u64).max(1);
        Self {
            frames,
            fps,
            interval_ms,
        }
    }
}

impl FrameSource for SyntheticSource {
    fn identifier(&self) -> String {
        "synthetic".to_string()
    }

    fn duration(&self) -> Duration {
        Duration::from_millis(self.frames.len() as u64 * self.interval_ms)
    }

    fn declared_fps(&self) -> Option<f64> {
        Some(self.fps)
    }

    fn frame_count(&self) -> Option<u64> {
        Some(self.frames.len() as u64)
    }

    fn frame_near(
        &mut self,
        timestamp: Duration,
        _width: u32,
        _height: u32,
    ) -> Result<Option<GrayImage>, AnalyzeError> {
        let index = (timestamp.as_millis() as u64 / self.interval_ms) as usize;
        Ok(self.frames.get(index).cloned())
    }
}

/// Same as [`SyntheticSource`] but with holes: listed indices decode to
/// nothing.
struct GappySource {
    inner: SyntheticSource,
    missing: Vec<usize>,
}

impl FrameSource for GappySource {
    fn identifier(&self) -> String {
        self.inner.identifier()
    }

    fn duration(&self) -> Duration {
        self.inner.duration()
    }

    fn declared_fps(&self) -> Option<f64> {
        self.inner.declared_fps()
    }

    fn frame_count(&self) -> Option<u64> {
        self.inner.frame_count()
    }

    fn frame_near(
        &mut self,
        timestamp: Duration,
        width: u32,
        height: u32,
    ) -> Result<Option<GrayImage>, AnalyzeError> {
        let index = (timestamp.as_millis() as u64 / self.inner.interval_ms) as usize;
        if self.missing.contains(&index) {
            return Ok(None);
        }
        self.inner.frame_near(timestamp, width, height)
    }
}

fn noise(seed: u64, width: u32, height: u32) -> GrayImage {
    let mut state = seed;
    GrayImage::from_fn(width, height, |_, _| {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        Luma([(state >> 33) as u8])
    })
}

fn test_config() -> AnalyzerConfig {
    AnalyzerConfig::new()
        .with_working_resolution(64, 64)
        .with_annotations(false)
}

#[test]
fn static_scene_flags_every_interior_frame_as_a_drop() {
    let frame = noise(42, 64, 64);
    let frames = vec![frame; 8];
    let mut source = SyntheticSource::new(frames, 30.0);

    let analyzer = VideoAnalyzer::new(test_config());
    let report = analyzer.analyze(&mut source, &NoOpCallback).unwrap();

    assert_eq!(report.total_frames, 8);
    assert_eq!(report.drop_count, 6);
    assert_eq!(report.normal_count, 2);
    assert_eq!(report.merge_count, 0);

    for frame in &report.frames[1..7] {
        assert_eq!(frame.classification, FrameClass::FrameDrop);
        assert!(frame.reason.starts_with("Duplicate frame"), "{}", frame.reason);
    }
}

#[test]
fn boundary_frames_carry_neutral_metrics() {
    let frames = vec![noise(1, 64, 64), noise(2, 64, 64), noise(3, 64, 64)];
    let mut source = SyntheticSource::new(frames, 30.0);

    let analyzer = VideoAnalyzer::new(test_config());
    let report = analyzer.analyze(&mut source, &NoOpCallback).unwrap();

    for boundary in [&report.frames[0], report.frames.last().unwrap()] {
        assert_eq!(boundary.classification, FrameClass::Normal);
        assert_eq!(boundary.reason, "Boundary frame");
        assert_eq!(boundary.mean_abs_diff, 0.0);
        assert_eq!(boundary.motion_magnitude, 0.0);
        assert_eq!(boundary.ssim_neighbor, 1.0);
        assert_eq!(boundary.ssim_synthetic, 0.0);
        assert_eq!(boundary.edge_count, 0);
        assert!(boundary.annotated.is_none());
    }
}

#[test]
fn blended_middle_frame_is_a_merge() {
    let prev = noise(10, 64, 64);
    let next = noise(20, 64, 64);
    let merged = dropmerge::synthetic_blend(&prev, &next);
    let mut source = SyntheticSource::new(vec![prev, merged, next], 30.0);

    let analyzer = VideoAnalyzer::new(test_config());
    let report = analyzer.analyze(&mut source, &NoOpCallback).unwrap();

    assert_eq!(report.merge_count, 1);
    assert_eq!(report.frames[1].classification, FrameClass::FrameMerge);
    assert!(
        report.frames[1].reason.starts_with("Blend similarity"),
        "{}",
        report.frames[1].reason
    );
}

#[test]
fn counts_are_consistent_with_per_frame_results() {
    let frames = vec![noise(5, 64, 64); 10];
    let mut source = SyntheticSource::new(frames, 30.0);

    let analyzer = VideoAnalyzer::new(test_config());
    let report = analyzer.analyze(&mut source, &NoOpCallback).unwrap();

    assert_eq!(
        report.drop_count + report.merge_count + report.normal_count,
        report.total_frames
    );
    assert_eq!(report.frames.len(), report.total_frames);
    assert_eq!(report.defect_count(), report.defects().count());

    let drops = report
        .frames
        .iter()
        .filter(|f| f.classification == FrameClass::FrameDrop)
        .count();
    assert_eq!(drops, report.drop_count);
}

#[test]
fn analysis_is_deterministic() {
    let frames: Vec<GrayImage> = (0..6).map(|i| noise(100 + i, 64, 64)).collect();
    let analyzer = VideoAnalyzer::new(test_config());

    let mut first_source = SyntheticSource::new(frames.clone(), 30.0);
    let first = analyzer.analyze(&mut first_source, &NoOpCallback).unwrap();

    let mut second_source = SyntheticSource::new(frames, 30.0);
    let second = analyzer.analyze(&mut second_source, &NoOpCallback).unwrap();

    assert_eq!(first.total_frames, second.total_frames);
    for (a, b) in first.frames.iter().zip(second.frames.iter()) {
        assert_eq!(a.classification, b.classification);
        assert_eq!(a.reason, b.reason);
        assert_eq!(a.mean_abs_diff, b.mean_abs_diff);
        assert_eq!(a.motion_magnitude, b.motion_magnitude);
    }
}

#[test]
fn too_few_frames_is_an_error() {
    let frames = vec![noise(1, 64, 64), noise(2, 64, 64)];
    let mut source = SyntheticSource::new(frames, 30.0);

    let analyzer = VideoAnalyzer::new(test_config());
    let error = analyzer.analyze(&mut source, &NoOpCallback).unwrap_err();
    assert!(matches!(error, AnalyzeError::NotEnoughFrames { found: 2 }));
}

#[test]
fn empty_source_is_an_invalid_duration() {
    let mut source = SyntheticSource::new(Vec::new(), 30.0);

    let analyzer = VideoAnalyzer::new(test_config());
    let error = analyzer.analyze(&mut source, &NoOpCallback).unwrap_err();
    assert!(matches!(error, AnalyzeError::InvalidDuration));
}

#[test]
fn decode_gaps_are_skipped_silently() {
    let frames = vec![noise(9, 64, 64); 8];
    let mut source = GappySource {
        inner: SyntheticSource::new(frames, 30.0),
        missing: vec![2, 5],
    };

    let analyzer = VideoAnalyzer::new(test_config());
    let report = analyzer.analyze(&mut source, &NoOpCallback).unwrap();
    assert_eq!(report.total_frames, 6);
}

#[test]
fn gaps_below_the_minimum_are_an_error() {
    let frames = vec![noise(9, 64, 64); 5];
    let mut source = GappySource {
        inner: SyntheticSource::new(frames, 30.0),
        missing: vec![1, 2, 3],
    };

    let analyzer = VideoAnalyzer::new(test_config());
    let error = analyzer.analyze(&mut source, &NoOpCallback).unwrap_err();
    assert!(matches!(error, AnalyzeError::NotEnoughFrames { found: 2 }));
}

#[test]
fn max_frames_caps_the_sample_count() {
    let frames = vec![noise(3, 64, 64); 20];
    let mut source = SyntheticSource::new(frames, 30.0);

    let analyzer = VideoAnalyzer::new(test_config().with_max_frames(10));
    let report = analyzer.analyze(&mut source, &NoOpCallback).unwrap();
    assert_eq!(report.total_frames, 10);
}

#[test]
fn annotations_are_rendered_only_when_enabled() {
    let frame = noise(42, 64, 64);
    let frames = vec![frame; 6];

    let analyzer = VideoAnalyzer::new(test_config().with_annotations(true));
    let mut source = SyntheticSource::new(frames.clone(), 30.0);
    let report = analyzer.analyze(&mut source, &NoOpCallback).unwrap();
    assert!(report.defects().all(|f| f.annotated.is_some()));

    let analyzer = VideoAnalyzer::new(test_config());
    let mut source = SyntheticSource::new(frames, 30.0);
    let report = analyzer.analyze(&mut source, &NoOpCallback).unwrap();
    assert!(report.frames.iter().all(|f| f.annotated.is_none()));
}
