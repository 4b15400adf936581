use dropmerge::{extract_signals, mean_abs_diff, ssim, synthetic_blend};
use image::{GrayImage, Luma};

fn flat(width: u32, height: u32, value: u8) -> GrayImage {
    GrayImage::from_pixel(width, height, Luma([value]))
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

#[test]
fn mean_abs_diff_of_identical_images_is_zero() {
    let image = noise(1, 32, 32);
    assert_eq!(mean_abs_diff(&image, &image), 0.0);
}

#[test]
fn mean_abs_diff_of_uniform_offset_is_the_offset() {
    let a = flat(16, 16, 100);
    let b = flat(16, 16, 110);
    assert_eq!(mean_abs_diff(&a, &b), 10.0);
    assert_eq!(mean_abs_diff(&b, &a), 10.0);
}

#[test]
fn synthetic_blend_averages_with_rounding() {
    let a = flat(8, 8, 100);
    let b = flat(8, 8, 101);
    let blend = synthetic_blend(&a, &b);
    // (100 + 101 + 1) / 2 rounds up.
    assert!(blend.pixels().all(|p| p.0[0] == 101));

    let c = flat(8, 8, 200);
    let blend = synthetic_blend(&a, &c);
    assert!(blend.pixels().all(|p| p.0[0] == 150));
}

#[test]
fn ssim_of_identical_images_is_one() {
    let image = noise(7, 64, 64);
    let score = ssim(&image, &image);
    assert!(score > 0.999, "got {score}");
    assert!(score <= 1.0);
}

#[test]
fn ssim_penalizes_structural_change() {
    let a = noise(7, 64, 64);
    let b = noise(99, 64, 64);
    let score = ssim(&a, &b);
    assert!(score < 0.5, "got {score}");
}

#[test]
fn ssim_is_symmetric() {
    let a = noise(3, 64, 64);
    let b = noise(4, 64, 64);
    assert!((ssim(&a, &b) - ssim(&b, &a)).abs() < 1e-9);
}

#[test]
fn flat_triplet_yields_neutral_signals() {
    let frame = flat(64, 64, 128);
    let extraction = extract_signals(&frame, &frame, &frame);
    let signals = extraction.signals;

    assert_eq!(signals.mean_abs_diff, 0.0);
    assert_eq!(signals.motion_magnitude, 0.0);
    assert!(signals.ssim_neighbor > 0.999);
    assert!(signals.ssim_synthetic > 0.999);
    assert_eq!(signals.edge_count, 0);
}

#[test]
fn blended_frame_matches_its_synthetic_reconstruction() {
    let prev = noise(11, 64, 64);
    let next = noise(12, 64, 64);
    let merged = synthetic_blend(&prev, &next);

    let extraction = extract_signals(&prev, &merged, &next);
    let signals = extraction.signals;

    assert!(signals.ssim_synthetic > 0.99, "got {}", signals.ssim_synthetic);
    assert!(signals.ssim_synthetic > signals.ssim_neighbor);
}
