use std::{
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use dropmerge::{
    AnalysisCallback, AnalysisReport, AnalyzeError, AnalyzerConfig, CancellationToken, FrameClass,
    FrameSource, VideoAnalyzer,
};
use image::{GrayImage, Luma};

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

#[derive(Default)]
struct RecordingCallback {
    progress: Mutex<Vec<(usize, usize)>>,
    completions: AtomicUsize,
    errors: Mutex<Vec<String>>,
}

impl AnalysisCallback for RecordingCallback {
    fn on_progress(&self, processed: usize, total: usize, _current_class: FrameClass) {
        self.progress.lock().unwrap().push((processed, total));
    }

    fn on_complete(&self, _report: &AnalysisReport) {
        self.completions.fetch_add(1, Ordering::SeqCst);
    }

    fn on_error(&self, message: &str) {
        self.errors.lock().unwrap().push(message.to_string());
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
fn progress_fires_once_per_frame_in_order() {
    let frames = vec![noise(1, 64, 64); 6];
    let mut source = SyntheticSource::new(frames, 30.0);

    let observer = RecordingCallback::default();
    let analyzer = VideoAnalyzer::new(test_config());
    analyzer.analyze(&mut source, &observer).unwrap();

    let progress = observer.progress.lock().unwrap();
    let expected: Vec<(usize, usize)> = (1..=6).map(|i| (i, 6)).collect();
    assert_eq!(*progress, expected);
}

#[test]
fn successful_run_completes_exactly_once_without_errors() {
    let frames = vec![noise(2, 64, 64); 5];
    let mut source = SyntheticSource::new(frames, 30.0);

    let observer = RecordingCallback::default();
    let analyzer = VideoAnalyzer::new(test_config());
    let result = analyzer.analyze(&mut source, &observer);

    assert!(result.is_ok());
    assert_eq!(observer.completions.load(Ordering::SeqCst), 1);
    assert!(observer.errors.lock().unwrap().is_empty());
}

#[test]
fn failed_run_reports_the_error_and_never_completes() {
    let frames = vec![noise(3, 64, 64); 2];
    let mut source = SyntheticSource::new(frames, 30.0);

    let observer = RecordingCallback::default();
    let analyzer = VideoAnalyzer::new(test_config());
    let result = analyzer.analyze(&mut source, &observer);

    assert!(result.is_err());
    assert_eq!(observer.completions.load(Ordering::SeqCst), 0);
    let errors = observer.errors.lock().unwrap();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("Not enough frames"), "{}", errors[0]);
}

#[test]
fn cancelled_token_aborts_the_run() {
    let frames = vec![noise(4, 64, 64); 6];
    let mut source = SyntheticSource::new(frames, 30.0);

    let token = CancellationToken::new();
    token.cancel();

    let observer = RecordingCallback::default();
    let analyzer = VideoAnalyzer::new(test_config().with_cancellation(token));
    let error = analyzer.analyze(&mut source, &observer).unwrap_err();

    assert!(matches!(error, AnalyzeError::Cancelled));
    assert_eq!(observer.completions.load(Ordering::SeqCst), 0);
    assert_eq!(observer.errors.lock().unwrap().len(), 1);
    assert!(observer.progress.lock().unwrap().is_empty());
}
