//! Diagnostic overlays for flagged frames.
//!
//! Drop frames get a red border and a red tint over the pixels whose
//! optical-flow magnitude stands out; merge frames get an amber border and
//! a tint over detected edge pixels, where ghosting doubles contours.
//! Normal frames get no overlay.

use image::{GrayImage, Rgb, RgbImage};

use crate::{classify::FrameClass, flow::FlowField};

const BORDER_THICKNESS: u32 = 6;
const DROP_COLOR: Rgb<u8> = Rgb([220, 40, 40]);
const MERGE_COLOR: Rgb<u8> = Rgb([255, 170, 0]);

/// Normalized flow magnitude (0-255 across the field) above which a pixel
/// is tinted in a drop overlay.
const MOTION_TINT_THRESHOLD: f32 = 180.0;

/// Blend factor of the tint color over the underlying pixel.
const TINT_ALPHA: f64 = 0.45;

/// Render the diagnostic overlay for a flagged frame.
///
/// Returns `None` for [`FrameClass::Normal`].
pub fn annotate_frame(
    class: FrameClass,
    frame: &GrayImage,
    flow: &FlowField,
    edges: &GrayImage,
) -> Option<RgbImage> {
    match class {
        FrameClass::Normal => None,
        FrameClass::FrameDrop => {
            let mut canvas = to_rgb(frame);
            tint_high_motion(&mut canvas, flow);
            draw_border(&mut canvas, DROP_COLOR);
            Some(canvas)
        }
        FrameClass::FrameMerge => {
            let mut canvas = to_rgb(frame);
            tint_edges(&mut canvas, edges);
            draw_border(&mut canvas, MERGE_COLOR);
            Some(canvas)
        }
    }
}

fn to_rgb(frame: &GrayImage) -> RgbImage {
    let mut canvas = RgbImage::new(frame.width(), frame.height());
    for (source, target) in frame.pixels().zip(canvas.pixels_mut()) {
        let value = source.0[0];
        *target = Rgb([value, value, value]);
    }
    canvas
}

/// Tint the pixels whose flow magnitude, rescaled so the field maximum
/// maps to 255, exceeds the tint threshold.
fn tint_high_motion(canvas: &mut RgbImage, flow: &FlowField) {
    let magnitudes = flow.magnitudes();
    let max = magnitudes.iter().copied().fold(0.0f32, f32::max);
    if max <= f32::EPSILON {
        return;
    }

    let width = canvas.width() as usize;
    for (index, magnitude) in magnitudes.iter().enumerate() {
        if magnitude / max * 255.0 > MOTION_TINT_THRESHOLD {
            let x = (index % width) as u32;
            let y = (index / width) as u32;
            if x < canvas.width() && y < canvas.height() {
                blend(canvas.get_pixel_mut(x, y), DROP_COLOR);
            }
        }
    }
}

fn tint_edges(canvas: &mut RgbImage, edges: &GrayImage) {
    for (x, y, edge) in edges.enumerate_pixels() {
        if edge.0[0] > 0 && x < canvas.width() && y < canvas.height() {
            blend(canvas.get_pixel_mut(x, y), MERGE_COLOR);
        }
    }
}

fn blend(pixel: &mut Rgb<u8>, color: Rgb<u8>) {
    for channel in 0..3 {
        let base = f64::from(pixel.0[channel]);
        let over = f64::from(color.0[channel]);
        pixel.0[channel] = (base * (1.0 - TINT_ALPHA) + over * TINT_ALPHA).round() as u8;
    }
}

fn draw_border(canvas: &mut RgbImage, color: Rgb<u8>) {
    let (width, height) = canvas.dimensions();
    let thickness = BORDER_THICKNESS.min(width / 2).min(height / 2);
    for y in 0..height {
        for x in 0..width {
            let on_border = x < thickness
                || y < thickness
                || x >= width - thickness
                || y >= height - thickness;
            if on_border {
                *canvas.get_pixel_mut(x, y) = color;
            }
        }
    }
}
