//! Frame sources.
//!
//! [`FrameSource`] is the analyzer's input contract: a duration, an
//! optional declared frame rate, and nearest-frame fetches by timestamp.
//! [`VideoSource`] implements it on top of FFmpeg for real video files;
//! tests drive the pipeline with synthetic in-memory sources instead.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use ffmpeg_next::{
    codec::context::Context as CodecContext,
    format::{Pixel, context::Input},
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use image::GrayImage;

use crate::error::AnalyzeError;

/// A provider of decoded grayscale frames for analysis.
///
/// The analyzer owns the sampling schedule; the source only answers
/// nearest-frame fetches. A `None` from
/// [`frame_near`](FrameSource::frame_near) is a silent skip (a decode
/// gap), not an error — the analysis fails only if too few frames survive
/// overall.
pub trait FrameSource {
    /// Identifier used in reports (a path, URI, or synthetic label).
    fn identifier(&self) -> String;

    /// Total duration of the video.
    fn duration(&self) -> Duration;

    /// Frame rate declared by the container, if any.
    fn declared_fps(&self) -> Option<f64>;

    /// Total frame count reported by the container, if any. Used to
    /// estimate the frame rate when none is declared.
    fn frame_count(&self) -> Option<u64>;

    /// Fetch the decoded frame nearest to `timestamp`, as grayscale at
    /// `width`×`height`. Returns `Ok(None)` when no frame could be
    /// decoded near that position.
    fn frame_near(
        &mut self,
        timestamp: Duration,
        width: u32,
        height: u32,
    ) -> Result<Option<GrayImage>, AnalyzeError>;
}

/// A [`FrameSource`] backed by an FFmpeg demuxer.
///
/// Opens the file once and caches stream-level metadata; each
/// [`frame_near`](FrameSource::frame_near) call seeks to the nearest
/// keyframe before the target and decodes forward, returning the first
/// frame at or past the requested timestamp (or the closest one before it
/// when the target lies past the last frame).
///
/// # Example
///
/// ```no_run
/// use dropmerge::{FrameSource, VideoSource};
///
/// let source = VideoSource::open("input.mp4").unwrap();
/// println!("{:?} at {:?} fps", source.duration(), source.declared_fps());
/// ```
pub struct VideoSource {
    input_context: Input,
    video_stream_index: usize,
    duration: Duration,
    declared_fps: Option<f64>,
    frame_count: Option<u64>,
    file_path: PathBuf,
}

impl VideoSource {
    /// Open a video file for frame extraction.
    ///
    /// Initializes FFmpeg (idempotent), opens the file, locates the best
    /// video stream, and caches duration, frame rate, and frame count.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyzeError::FileOpen`] if the file cannot be opened and
    /// [`AnalyzeError::NoVideoStream`] if it has no video stream.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, AnalyzeError> {
        let path = path.as_ref();
        let file_path = path.to_path_buf();

        log::debug!("Opening media file: {}", file_path.display());

        ffmpeg_next::init().map_err(|error| AnalyzeError::FileOpen {
            path: file_path.clone(),
            reason: format!("FFmpeg initialisation failed: {error}"),
        })?;

        let input_context =
            ffmpeg_next::format::input(&path).map_err(|error| AnalyzeError::FileOpen {
                path: file_path.clone(),
                reason: error.to_string(),
            })?;

        let stream = input_context
            .streams()
            .best(Type::Video)
            .ok_or(AnalyzeError::NoVideoStream)?;
        let video_stream_index = stream.index();

        let rate = stream.avg_frame_rate();
        let declared_fps = if rate.numerator() > 0 && rate.denominator() > 0 {
            Some(f64::from(rate.numerator()) / f64::from(rate.denominator()))
        } else {
            None
        };

        let frame_count = u64::try_from(stream.frames()).ok().filter(|&count| count > 0);

        let duration_microseconds = input_context.duration();
        let duration = if duration_microseconds > 0 {
            Duration::from_micros(duration_microseconds as u64)
        } else {
            Duration::ZERO
        };

        log::debug!(
            "Video stream {}: duration={:?} fps={:?} frames={:?}",
            video_stream_index,
            duration,
            declared_fps,
            frame_count,
        );

        Ok(Self {
            input_context,
            video_stream_index,
            duration,
            declared_fps,
            frame_count,
            file_path,
        })
    }
}

impl FrameSource for VideoSource {
    fn identifier(&self) -> String {
        self.file_path.display().to_string()
    }

    fn duration(&self) -> Duration {
        self.duration
    }

    fn declared_fps(&self) -> Option<f64> {
        self.declared_fps
    }

    fn frame_count(&self) -> Option<u64> {
        self.frame_count
    }

    fn frame_near(
        &mut self,
        timestamp: Duration,
        width: u32,
        height: u32,
    ) -> Result<Option<GrayImage>, AnalyzeError> {
        let target_seconds = timestamp.as_secs_f64();

        let stream = match self.input_context.stream(self.video_stream_index) {
            Some(stream) => stream,
            None => return Ok(None),
        };
        let time_base = stream.time_base();
        let tb_num = f64::from(time_base.numerator());
        let tb_den = f64::from(time_base.denominator().max(1));

        let decoder_context = match CodecContext::from_parameters(stream.parameters()) {
            Ok(context) => context,
            Err(error) => {
                log::debug!("Decoder setup failed at {timestamp:?}: {error}");
                return Ok(None);
            }
        };
        let mut decoder = match decoder_context.decoder().video() {
            Ok(decoder) => decoder,
            Err(error) => {
                log::debug!("Decoder setup failed at {timestamp:?}: {error}");
                return Ok(None);
            }
        };

        let mut scaler = match ScalingContext::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            Pixel::GRAY8,
            width,
            height,
            ScalingFlags::BILINEAR,
        ) {
            Ok(scaler) => scaler,
            Err(error) => {
                log::debug!("Scaler setup failed at {timestamp:?}: {error}");
                return Ok(None);
            }
        };

        // Seek backward to the nearest keyframe, then decode forward.
        let seek_target = timestamp.as_micros() as i64;
        if let Err(error) = self.input_context.seek(seek_target, ..seek_target) {
            log::debug!("Seek to {timestamp:?} failed: {error}");
            return Ok(None);
        }

        let mut decoded_frame = VideoFrame::empty();
        let mut gray_frame = VideoFrame::empty();
        let mut nearest_before: Option<GrayImage> = None;

        for (stream, packet) in self.input_context.packets() {
            if stream.index() != self.video_stream_index {
                continue;
            }
            if decoder.send_packet(&packet).is_err() {
                // Corrupt packet: keep scanning, this fetch can still land
                // on a later frame.
                continue;
            }
            while decoder.receive_frame(&mut decoded_frame).is_ok() {
                let pts_seconds =
                    decoded_frame.pts().unwrap_or(0) as f64 * tb_num / tb_den;
                let image = match scale_to_gray(
                    &mut scaler,
                    &decoded_frame,
                    &mut gray_frame,
                    width,
                    height,
                ) {
                    Some(image) => image,
                    None => continue,
                };
                if pts_seconds >= target_seconds {
                    return Ok(Some(image));
                }
                nearest_before = Some(image);
            }
        }

        // Flush: the target may sit past the last packet.
        let _ = decoder.send_eof();
        while decoder.receive_frame(&mut decoded_frame).is_ok() {
            if let Some(image) =
                scale_to_gray(&mut scaler, &decoded_frame, &mut gray_frame, width, height)
            {
                let pts_seconds =
                    decoded_frame.pts().unwrap_or(0) as f64 * tb_num / tb_den;
                if pts_seconds >= target_seconds {
                    return Ok(Some(image));
                }
                nearest_before = Some(image);
            }
        }

        Ok(nearest_before)
    }
}

/// Run the scaler and copy the GRAY8 plane into an owned image,
/// honoring the frame's row stride.
fn scale_to_gray(
    scaler: &mut ScalingContext,
    decoded: &VideoFrame,
    gray: &mut VideoFrame,
    width: u32,
    height: u32,
) -> Option<GrayImage> {
    if scaler.run(decoded, gray).is_err() {
        return None;
    }

    let stride = gray.stride(0);
    let row_len = width as usize;
    let data = gray.data(0);

    let buffer = if stride == row_len {
        data[..row_len * height as usize].to_vec()
    } else {
        let mut buffer = Vec::with_capacity(row_len * height as usize);
        for row in 0..height as usize {
            let start = row * stride;
            buffer.extend_from_slice(&data[start..start + row_len]);
        }
        buffer
    };

    GrayImage::from_raw(width, height, buffer)
}
