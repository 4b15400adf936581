//! Structural similarity (SSIM) between grayscale frames.
//!
//! Implements the standard Gaussian-windowed SSIM: local luminance,
//! contrast, and structure statistics are computed under an 11-tap Gaussian
//! window (σ = 1.5), combined per pixel as
//!
//! ```text
//! SSIM = ((2·μ1·μ2 + C1)·(2·σ12 + C2)) / ((μ1² + μ2² + C1)·(σ1² + σ2² + C2))
//! ```
//!
//! with `C1 = (0.01·255)²` and `C2 = (0.03·255)²`, then averaged over the
//! image and clamped to [-1, 1]. The Gaussian filtering is done by
//! `imageproc` over `f32` planes; border handling differs slightly from
//! OpenCV's, which is within the accepted approximation for this detector.

use image::{GrayImage, ImageBuffer, Luma};
use imageproc::filter::gaussian_blur_f32;

/// Luminance stabilization constant, `(0.01 * 255)^2`.
const C1: f32 = 6.5025;
/// Contrast stabilization constant, `(0.03 * 255)^2`.
const C2: f32 = 58.5225;
/// Sigma of the local-statistics window (11-tap at this sigma).
const WINDOW_SIGMA: f32 = 1.5;

type FloatImage = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Mean SSIM between two equally-sized grayscale images.
///
/// Returns a value in [-1, 1]; 1.0 means structurally identical.
///
/// # Panics
///
/// Panics if the images differ in dimensions.
pub fn ssim(a: &GrayImage, b: &GrayImage) -> f64 {
    assert_eq!(
        a.dimensions(),
        b.dimensions(),
        "SSIM requires equally-sized images"
    );

    let i1 = to_float(a);
    let i2 = to_float(b);

    let mu1 = gaussian_blur_f32(&i1, WINDOW_SIGMA);
    let mu2 = gaussian_blur_f32(&i2, WINDOW_SIGMA);

    let mu1_sq = multiply(&mu1, &mu1);
    let mu2_sq = multiply(&mu2, &mu2);
    let mu1_mu2 = multiply(&mu1, &mu2);

    // Second moments: blur the products, then subtract the squared means.
    let sigma1_sq = subtract(&gaussian_blur_f32(&multiply(&i1, &i1), WINDOW_SIGMA), &mu1_sq);
    let sigma2_sq = subtract(&gaussian_blur_f32(&multiply(&i2, &i2), WINDOW_SIGMA), &mu2_sq);
    let sigma12 = subtract(&gaussian_blur_f32(&multiply(&i1, &i2), WINDOW_SIGMA), &mu1_mu2);

    let pixels = mu1_mu2.as_raw().len();
    let mut sum = 0.0f64;
    for i in 0..pixels {
        let numerator = (2.0 * mu1_mu2.as_raw()[i] + C1) * (2.0 * sigma12.as_raw()[i] + C2);
        let denominator = (mu1_sq.as_raw()[i] + mu2_sq.as_raw()[i] + C1)
            * (sigma1_sq.as_raw()[i] + sigma2_sq.as_raw()[i] + C2);
        sum += f64::from(numerator / denominator);
    }

    (sum / pixels as f64).clamp(-1.0, 1.0)
}

fn to_float(image: &GrayImage) -> FloatImage {
    let data: Vec<f32> = image.as_raw().iter().map(|&p| f32::from(p)).collect();
    FloatImage::from_raw(image.width(), image.height(), data)
        .expect("buffer length matches dimensions")
}

fn multiply(a: &FloatImage, b: &FloatImage) -> FloatImage {
    let data: Vec<f32> = a
        .as_raw()
        .iter()
        .zip(b.as_raw())
        .map(|(&x, &y)| x * y)
        .collect();
    FloatImage::from_raw(a.width(), a.height(), data).expect("buffer length matches dimensions")
}

fn subtract(a: &FloatImage, b: &FloatImage) -> FloatImage {
    let data: Vec<f32> = a
        .as_raw()
        .iter()
        .zip(b.as_raw())
        .map(|(&x, &y)| x - y)
        .collect();
    FloatImage::from_raw(a.width(), a.height(), data).expect("buffer length matches dimensions")
}
