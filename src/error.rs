//! Error types for the `dropmerge` crate.
//!
//! This module defines [`AnalyzeError`], the unified error type returned by
//! all fallible operations in the crate. Errors carry enough context to
//! diagnose the problem without additional logging at the call site.

use std::{io::Error as IoError, path::PathBuf};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;

/// The unified error type for all `dropmerge` operations.
///
/// Every public method that can fail returns `Result<T, AnalyzeError>`.
/// A failed analysis is never surfaced as a partial report: the caller
/// restarts the whole run, which is deterministic for a given input.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AnalyzeError {
    /// The media file could not be opened.
    #[error("Failed to open media file at {path}: {reason}")]
    FileOpen {
        /// Path that was passed to [`crate::VideoSource::open`].
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The file does not contain a video stream.
    #[error("No video stream found in file")]
    NoVideoStream,

    /// The container reports no usable duration.
    #[error("Cannot read video duration")]
    InvalidDuration,

    /// Fewer than the minimum number of frames could be decoded.
    ///
    /// Individual frame-fetch failures are skipped silently during
    /// sampling; this error fires only when too few frames survive for
    /// the analysis to be meaningful.
    #[error("Not enough frames to analyze (need at least 3, got {found})")]
    NotEnoughFrames {
        /// Number of frames that were successfully decoded.
        found: usize,
    },

    /// A video frame could not be decoded.
    #[error("Failed to decode video frame: {0}")]
    VideoDecodeError(String),

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate during frame conversion.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),

    /// The operation was cancelled via a [`CancellationToken`](crate::CancellationToken).
    #[error("Operation cancelled")]
    Cancelled,
}

impl From<FfmpegError> for AnalyzeError {
    fn from(error: FfmpegError) -> Self {
        AnalyzeError::FfmpegError(error.to_string())
    }
}
