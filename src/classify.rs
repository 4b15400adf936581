//! Frame classification.
//!
//! An ordered rule tree turns the five per-frame signals plus the adaptive
//! baselines into one of three classifications with a human-readable reason
//! string. Rule order matters: the first matching rule wins, and the reason
//! strings embed the numeric evidence at fixed precisions (pixel diff one
//! decimal, flow two, SSIM three) because downstream consumers display them
//! verbatim.
//!
//! The sigma multipliers and the high-fps gate are hand-tuned against real
//! transcoder output; they are preserved exactly.

use std::fmt;

use crate::config::AnalyzerConfig;
use crate::metrics::FrameSignals;

/// Classification of a sampled frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameClass {
    /// Temporal continuity is normal.
    Normal,
    /// A duplicated/lost frame, typically a transcoder masking a skipped
    /// capture by repeating the previous frame.
    FrameDrop,
    /// A blended/ghosted frame produced by frame-rate conversion.
    FrameMerge,
}

impl fmt::Display for FrameClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameClass::Normal => write!(f, "NORMAL"),
            FrameClass::FrameDrop => write!(f, "FRAME_DROP"),
            FrameClass::FrameMerge => write!(f, "FRAME_MERGE"),
        }
    }
}

/// Rolling-window baselines the classifier judges a frame against.
///
/// Means and population standard deviations of the motion, neighbor-SSIM,
/// and edge-count windows, read *after* the current frame's own values were
/// pushed. `window_len` is the current fill of the windows (they advance in
/// lockstep) and gates the history-dependent rules.
#[derive(Debug, Clone, Copy)]
pub struct SignalBaselines {
    /// Mean of the motion-magnitude window.
    pub motion_mean: f64,
    /// Population stddev of the motion-magnitude window.
    pub motion_std: f64,
    /// Mean of the neighbor-SSIM window.
    pub ssim_mean: f64,
    /// Population stddev of the neighbor-SSIM window.
    pub ssim_std: f64,
    /// Mean of the edge-count window.
    pub edge_mean: f64,
    /// Population stddev of the edge-count window.
    pub edge_std: f64,
    /// Current fill of the rolling windows.
    pub window_len: usize,
}

/// Classify one interior frame.
///
/// Rules, first match wins:
/// 1. low pixel diff → duplicate/masked drop (or high-fps normal),
/// 2. motion spike corroborated by an SSIM drop → drop,
/// 3. extreme motion spike alone → drop,
/// 4. synthetic-blend match → merge (high-fps requires corroboration),
/// 5. edge spike with moderate blend similarity → merge,
/// 6. default → normal.
pub fn classify(
    signals: &FrameSignals,
    baselines: &SignalBaselines,
    fps: f64,
    config: &AnalyzerConfig,
) -> (FrameClass, String) {
    let has_enough_history = baselines.window_len >= config.min_history;
    let is_high_fps = config.is_high_fps(fps);

    let dup_threshold = config.duplicate_threshold(fps);
    let merge_ssim_threshold = config.merge_ssim_threshold(fps);

    let FrameSignals {
        mean_abs_diff,
        motion_magnitude: motion,
        ssim_neighbor,
        ssim_synthetic,
        edge_count,
    } = *signals;

    // Rule 1: duplicate / masked drop.
    if mean_abs_diff < dup_threshold {
        let has_high_ssim = ssim_neighbor > config.true_duplicate_ssim;
        let has_zero_motion = motion < 0.15;
        let has_both_signals =
            ssim_neighbor > (config.true_duplicate_ssim - 0.005) && motion < 0.5;

        if has_high_ssim || has_zero_motion || has_both_signals {
            return (
                FrameClass::FrameDrop,
                format!(
                    "Duplicate frame (Δpx={mean_abs_diff:.1}, SSIM={ssim_neighbor:.3}, \
                     flow={motion:.2}). Transcoder masked a true drop."
                ),
            );
        }
        if is_high_fps {
            return (
                FrameClass::Normal,
                format!(
                    "High-FPS normal (Δpx={mean_abs_diff:.1}, SSIM={ssim_neighbor:.3}, \
                     flow={motion:.2})"
                ),
            );
        }
        return (
            FrameClass::FrameDrop,
            format!(
                "Duplicate frame (Δpx={mean_abs_diff:.1} < {dup_threshold:.1}). \
                 Transcoder masked a true drop."
            ),
        );
    }

    // Rules 2 and 3: motion spikes. Without history the thresholds are
    // unreachable, so early frames fall through toward NORMAL.
    let motion_threshold = if has_enough_history {
        baselines.motion_mean + config.drop_motion_sigma * baselines.motion_std
    } else {
        f64::INFINITY
    };
    let ssim_drop_threshold = if has_enough_history {
        baselines.ssim_mean - config.drop_ssim_sigma * baselines.ssim_std
    } else {
        f64::NEG_INFINITY
    };

    if has_enough_history && motion > motion_threshold && ssim_neighbor < ssim_drop_threshold {
        return (
            FrameClass::FrameDrop,
            format!(
                "Motion spike: {motion:.2} > threshold {motion_threshold:.2} | \
                 SSIM drop: {ssim_neighbor:.3} < {ssim_drop_threshold:.3}"
            ),
        );
    }

    if has_enough_history && motion > motion_threshold * 1.5 {
        return (
            FrameClass::FrameDrop,
            format!("Strong motion spike: {motion:.2} >> threshold {motion_threshold:.2}"),
        );
    }

    // Rule 4: blend/merge match.
    let edge_threshold = if has_enough_history {
        baselines.edge_mean + config.merge_edge_sigma * baselines.edge_std
    } else {
        f64::INFINITY
    };
    if ssim_synthetic > merge_ssim_threshold {
        let has_edge_evidence = has_enough_history && f64::from(edge_count) > edge_threshold;

        if is_high_fps {
            let is_extreme_blend_match = ssim_synthetic > merge_ssim_threshold + 0.005;
            let has_motion = motion > 0.5;

            if has_edge_evidence {
                return (
                    FrameClass::FrameMerge,
                    format!(
                        "Merge (blend={ssim_synthetic:.3}, edges={edge_count} > \
                         {edge_threshold:.0})"
                    ),
                );
            }
            if is_extreme_blend_match && has_motion {
                return (
                    FrameClass::FrameMerge,
                    format!(
                        "Merge (blend={ssim_synthetic:.3} >> {merge_ssim_threshold:.3}, \
                         flow={motion:.2})"
                    ),
                );
            }
            return (
                FrameClass::Normal,
                format!(
                    "High-FPS normal (blend={ssim_synthetic:.3}, \
                     threshold={merge_ssim_threshold:.3})"
                ),
            );
        }

        let edge_reason = if has_edge_evidence {
            format!(" + double-edge ghosting (edges={edge_count} > {edge_threshold:.0})")
        } else {
            String::new()
        };
        return (
            FrameClass::FrameMerge,
            format!(
                "Blend similarity: SSIM(F_t, synthetic)={ssim_synthetic:.3} > \
                 {merge_ssim_threshold:.3}{edge_reason}"
            ),
        );
    }

    // Rule 5: edge spike alone, with a moderate blend-similarity floor.
    let ssim_floor = if is_high_fps {
        merge_ssim_threshold - 0.02
    } else {
        0.80
    };
    if has_enough_history && f64::from(edge_count) > edge_threshold && ssim_synthetic > ssim_floor
    {
        return (
            FrameClass::FrameMerge,
            format!(
                "Edge spike (ghosting): {edge_count} > {edge_threshold:.0} | \
                 blend sim={ssim_synthetic:.3}"
            ),
        );
    }

    (FrameClass::Normal, "Temporal continuity normal".to_string())
}
