//! Per-frame signal extraction.
//!
//! For each interior frame of the sampled sequence, five signals are
//! computed against its immediate neighbors: mean absolute pixel
//! difference, dense optical-flow magnitude, structural similarity to the
//! previous frame, structural similarity to a 50/50 blend of the two
//! neighbors (the hallmark test for interpolated frames), and the Canny
//! edge-pixel count (merged frames often show doubled edges).

use image::GrayImage;
use imageproc::edges::canny;

use crate::flow::{self, FlowField};
use crate::ssim::ssim;

/// Canny hysteresis low threshold.
pub const CANNY_LOW: f32 = 50.0;
/// Canny hysteresis high threshold.
pub const CANNY_HIGH: f32 = 150.0;

/// The five temporal signals for one interior frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameSignals {
    /// Mean of `|curr - prev|` over all pixels.
    pub mean_abs_diff: f64,
    /// Mean magnitude of the dense prev→curr flow field, in pixels.
    pub motion_magnitude: f64,
    /// SSIM between curr and prev.
    pub ssim_neighbor: f64,
    /// SSIM between curr and the 50/50 blend of prev and next.
    pub ssim_synthetic: f64,
    /// Non-zero pixels after Canny edge detection on curr.
    pub edge_count: u32,
}

/// Signals plus the intermediates kept for diagnostic overlays.
#[derive(Debug, Clone)]
pub struct SignalExtraction {
    /// The five classification signals.
    pub signals: FrameSignals,
    /// The dense flow field (consumed by drop-frame overlays).
    pub flow: FlowField,
    /// The Canny edge map (consumed by merge-frame overlays).
    pub edges: GrayImage,
}

/// Compute all five signals for `curr` given its neighbors.
///
/// # Panics
///
/// Panics if the three images differ in dimensions; the sampler guarantees
/// a uniform working resolution.
pub fn extract_signals(prev: &GrayImage, curr: &GrayImage, next: &GrayImage) -> SignalExtraction {
    let mean_abs_diff = mean_abs_diff(curr, prev);

    let flow = flow::dense_flow(prev, curr);
    let motion_magnitude = flow.mean_magnitude();

    let ssim_neighbor = ssim(curr, prev);

    let blend = synthetic_blend(prev, next);
    let ssim_synthetic = ssim(curr, &blend);

    let edges = canny(curr, CANNY_LOW, CANNY_HIGH);
    let edge_count = edges.as_raw().iter().filter(|&&p| p != 0).count() as u32;

    SignalExtraction {
        signals: FrameSignals {
            mean_abs_diff,
            motion_magnitude,
            ssim_neighbor,
            ssim_synthetic,
            edge_count,
        },
        flow,
        edges,
    }
}

/// Mean absolute difference between two equally-sized grayscale images.
pub fn mean_abs_diff(a: &GrayImage, b: &GrayImage) -> f64 {
    assert_eq!(
        a.dimensions(),
        b.dimensions(),
        "pixel difference requires equally-sized images"
    );
    let pixels = a.as_raw().len();
    if pixels == 0 {
        return 0.0;
    }
    let sum: u64 = a
        .as_raw()
        .iter()
        .zip(b.as_raw())
        .map(|(&x, &y)| u64::from(x.abs_diff(y)))
        .sum();
    sum as f64 / pixels as f64
}

/// Rounded 8-bit 50/50 pixelwise blend of two equally-sized images.
///
/// This is the synthetic midpoint a frame-rate converter would produce;
/// comparing the real frame against it exposes merged frames.
pub fn synthetic_blend(prev: &GrayImage, next: &GrayImage) -> GrayImage {
    assert_eq!(
        prev.dimensions(),
        next.dimensions(),
        "blend requires equally-sized images"
    );
    let data: Vec<u8> = prev
        .as_raw()
        .iter()
        .zip(next.as_raw())
        .map(|(&p, &n)| ((u16::from(p) + u16::from(n) + 1) / 2) as u8)
        .collect();
    GrayImage::from_raw(prev.width(), prev.height(), data)
        .expect("buffer length matches dimensions")
}
