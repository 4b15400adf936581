//! Dense optical flow between consecutive grayscale frames.
//!
//! A multi-scale, iterative dense estimator in the Farneback mold: a
//! 3-level image pyramid, a 15×15 integration window, and 3 refinement
//! iterations per level. Each refinement solves the Lucas–Kanade normal
//! equations per pixel, with window sums taken from summed-area tables so a
//! full pass stays O(pixels) regardless of window size.
//!
//! The classifier only consumes the mean flow magnitude, so the estimator's
//! contract is stability across frames of the same video rather than
//! agreement with any particular reference implementation. Two properties
//! matter for the detector: identical frames produce (numerically) zero
//! flow, and large displacements grow the mean magnitude monotonically.

use image::{GrayImage, imageops};

/// Number of pyramid levels.
pub const PYRAMID_LEVELS: usize = 3;
/// Side of the square integration window, in pixels.
pub const WINDOW_SIZE: usize = 15;
/// Refinement iterations per pyramid level.
pub const ITERATIONS: usize = 3;

/// Minimum determinant of the 2×2 structure tensor before a pixel's
/// increment is considered solvable. Below this the pixel keeps the flow
/// propagated from the coarser level.
const MIN_DETERMINANT: f64 = 1e-6;

/// A dense 2D displacement field, prev → curr.
#[derive(Debug, Clone)]
pub struct FlowField {
    width: u32,
    height: u32,
    dx: Vec<f32>,
    dy: Vec<f32>,
}

impl FlowField {
    /// Field width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Field height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Mean magnitude of the displacement vectors, in pixels.
    pub fn mean_magnitude(&self) -> f64 {
        if self.dx.is_empty() {
            return 0.0;
        }
        let sum: f64 = self
            .dx
            .iter()
            .zip(&self.dy)
            .map(|(&dx, &dy)| f64::from(dx).hypot(f64::from(dy)))
            .sum();
        sum / self.dx.len() as f64
    }

    /// Per-pixel displacement magnitudes, row-major.
    pub fn magnitudes(&self) -> Vec<f32> {
        self.dx
            .iter()
            .zip(&self.dy)
            .map(|(&dx, &dy)| dx.hypot(dy))
            .collect()
    }
}

/// Estimate the dense displacement field from `prev` to `curr`.
///
/// # Panics
///
/// Panics if the images differ in dimensions.
pub fn dense_flow(prev: &GrayImage, curr: &GrayImage) -> FlowField {
    assert_eq!(
        prev.dimensions(),
        curr.dimensions(),
        "optical flow requires equally-sized images"
    );

    let prev_pyramid = build_pyramid(prev);
    let curr_pyramid = build_pyramid(curr);

    // Coarse-to-fine: start from zero flow at the top of the pyramid.
    let top = prev_pyramid.len() - 1;
    let mut dx = vec![0.0f32; prev_pyramid[top].len()];
    let mut dy = vec![0.0f32; prev_pyramid[top].len()];

    for level in (0..prev_pyramid.len()).rev() {
        let prev_plane = &prev_pyramid[level];
        let curr_plane = &curr_pyramid[level];

        if level < top {
            // Propagate the coarser estimate: resample and double it.
            let coarse = &prev_pyramid[level + 1];
            dx = upsample(&dx, coarse, prev_plane);
            dy = upsample(&dy, coarse, prev_plane);
        }

        for _ in 0..ITERATIONS {
            refine(prev_plane, curr_plane, &mut dx, &mut dy);
        }
    }

    FlowField {
        width: prev.width(),
        height: prev.height(),
        dx,
        dy,
    }
}

/// A single-channel f32 image plane.
struct Plane {
    width: usize,
    height: usize,
    data: Vec<f32>,
}

impl Plane {
    fn from_gray(image: &GrayImage) -> Self {
        Self {
            width: image.width() as usize,
            height: image.height() as usize,
            data: image.as_raw().iter().map(|&p| f32::from(p)).collect(),
        }
    }

    fn len(&self) -> usize {
        self.data.len()
    }

    fn at(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.width + x]
    }

    /// Bilinear sample with coordinates clamped to the image bounds.
    fn sample(&self, x: f32, y: f32) -> f32 {
        bilinear(&self.data, self.width, self.height, x, y)
    }
}

/// Build the pyramid, finest level first. Levels stop early if the image
/// becomes too small for the integration window.
fn build_pyramid(image: &GrayImage) -> Vec<Plane> {
    let mut levels = Vec::with_capacity(PYRAMID_LEVELS);
    let mut current = image.clone();
    for _ in 0..PYRAMID_LEVELS {
        levels.push(Plane::from_gray(&current));
        let (w, h) = (current.width() / 2, current.height() / 2);
        if (w as usize) < WINDOW_SIZE || (h as usize) < WINDOW_SIZE {
            break;
        }
        current = imageops::resize(&current, w, h, imageops::FilterType::Triangle);
    }
    levels
}

/// Resample a coarse flow component onto a finer grid, doubling values.
fn upsample(coarse_flow: &[f32], coarse: &Plane, fine: &Plane) -> Vec<f32> {
    let sx = coarse.width as f32 / fine.width as f32;
    let sy = coarse.height as f32 / fine.height as f32;
    let mut out = vec![0.0f32; fine.len()];
    for y in 0..fine.height {
        for x in 0..fine.width {
            let cx = (x as f32 + 0.5) * sx - 0.5;
            let cy = (y as f32 + 0.5) * sy - 0.5;
            out[y * fine.width + x] =
                2.0 * bilinear(coarse_flow, coarse.width, coarse.height, cx, cy);
        }
    }
    out
}

fn bilinear(data: &[f32], width: usize, height: usize, x: f32, y: f32) -> f32 {
    let x = x.clamp(0.0, (width - 1) as f32);
    let y = y.clamp(0.0, (height - 1) as f32);
    let x0 = x.floor() as usize;
    let y0 = y.floor() as usize;
    let x1 = (x0 + 1).min(width - 1);
    let y1 = (y0 + 1).min(height - 1);
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let top = data[y0 * width + x0] * (1.0 - fx) + data[y0 * width + x1] * fx;
    let bottom = data[y1 * width + x0] * (1.0 - fx) + data[y1 * width + x1] * fx;
    top * (1.0 - fy) + bottom * fy
}

/// One Lucas–Kanade refinement pass over a pyramid level.
fn refine(prev: &Plane, curr: &Plane, dx: &mut [f32], dy: &mut [f32]) {
    let (w, h) = (prev.width, prev.height);
    let n = w * h;

    // Spatial gradients of the previous frame (central differences) and the
    // temporal difference against the warped current frame.
    let mut ix = vec![0.0f32; n];
    let mut iy = vec![0.0f32; n];
    let mut it = vec![0.0f32; n];
    for y in 0..h {
        for x in 0..w {
            let i = y * w + x;
            let xm = x.saturating_sub(1);
            let xp = (x + 1).min(w - 1);
            let ym = y.saturating_sub(1);
            let yp = (y + 1).min(h - 1);
            ix[i] = (prev.at(xp, y) - prev.at(xm, y)) * 0.5;
            iy[i] = (prev.at(x, yp) - prev.at(x, ym)) * 0.5;
            it[i] = curr.sample(x as f32 + dx[i], y as f32 + dy[i]) - prev.at(x, y);
        }
    }

    // Window sums of the five gradient products via summed-area tables.
    let sxx = integral(&ix, &ix, w, h);
    let sxy = integral(&ix, &iy, w, h);
    let syy = integral(&iy, &iy, w, h);
    let sxt = integral(&ix, &it, w, h);
    let syt = integral(&iy, &it, w, h);

    let half = WINDOW_SIZE / 2;
    let max_step = WINDOW_SIZE as f32;
    for y in 0..h {
        for x in 0..w {
            let i = y * w + x;
            let x0 = x.saturating_sub(half);
            let y0 = y.saturating_sub(half);
            let x1 = (x + half + 1).min(w);
            let y1 = (y + half + 1).min(h);

            let gxx = window_sum(&sxx, w, x0, y0, x1, y1);
            let gxy = window_sum(&sxy, w, x0, y0, x1, y1);
            let gyy = window_sum(&syy, w, x0, y0, x1, y1);
            let bx = -window_sum(&sxt, w, x0, y0, x1, y1);
            let by = -window_sum(&syt, w, x0, y0, x1, y1);

            let det = gxx * gyy - gxy * gxy;
            if det.abs() < MIN_DETERMINANT {
                continue;
            }
            let inc_x = ((gyy * bx - gxy * by) / det) as f32;
            let inc_y = ((gxx * by - gxy * bx) / det) as f32;
            dx[i] = (dx[i] + inc_x).clamp(-max_step, max_step);
            dy[i] = (dy[i] + inc_y).clamp(-max_step, max_step);
        }
    }
}

/// Summed-area table of the elementwise product `a[i] * b[i]`.
///
/// The table has `(w + 1) * (h + 1)` entries with a zero first row/column,
/// so any rectangle sum is four lookups.
fn integral(a: &[f32], b: &[f32], w: usize, h: usize) -> Vec<f64> {
    let stride = w + 1;
    let mut table = vec![0.0f64; stride * (h + 1)];
    for y in 0..h {
        let mut row_sum = 0.0f64;
        for x in 0..w {
            let i = y * w + x;
            row_sum += f64::from(a[i]) * f64::from(b[i]);
            table[(y + 1) * stride + (x + 1)] = table[y * stride + (x + 1)] + row_sum;
        }
    }
    table
}

/// Sum of the half-open rectangle `[x0, x1) × [y0, y1)` from a table
/// produced by [`integral`].
fn window_sum(table: &[f64], w: usize, x0: usize, y0: usize, x1: usize, y1: usize) -> f64 {
    let stride = w + 1;
    table[y1 * stride + x1] - table[y0 * stride + x1] - table[y1 * stride + x0]
        + table[y0 * stride + x0]
}
