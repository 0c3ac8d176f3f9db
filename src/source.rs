//! Decoded frame sources.
//!
//! A [`FrameSource`] is a lazy, restartable sequence of [`TimedFrame`]s in
//! presentation order. [`MediaSource`] decodes a media file with FFmpeg at its
//! native resolution; [`MemorySource`] serves frames already in memory.
//!
//! [`FrameRateResampler`] maps a source's own frame timing onto the fixed
//! output frame rate, repeating or skipping source frames as needed.
//!
//! # Example
//!
//! ```no_run
//! use subburn::{FrameSource, MediaSource};
//!
//! let mut source = MediaSource::new("input.mp4");
//! let metadata = source.open()?;
//! while let Some(frame) = source.next_frame() {
//!     let frame = frame?;
//!     println!("{:.3}s {}x{}", frame.timestamp, frame.image.width(), frame.image.height());
//! }
//! # Ok::<(), subburn::BurnError>(())
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};
use std::time::Duration;

use ffmpeg_next::{
    Error as FfmpegError, Packet, Rational,
    codec::context::Context as CodecContext,
    decoder::Video as VideoDecoder,
    format::{Pixel, context::Input},
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
    util::error::EAGAIN,
};
use image::RgbaImage;

use crate::error::BurnError;
use crate::metadata::SourceMetadata;
use crate::utilities::{frame_to_buffer, pts_to_seconds, rational_to_fps};

/// Consecutive demuxer read failures tolerated before giving up.
const MAX_READ_ERRORS: u32 = 64;

/// Tolerance for comparing frame timestamps against output ticks.
const TIME_EPSILON: f64 = 1e-6;

/// A decoded frame and its presentation time in seconds from stream start.
#[derive(Debug, Clone, PartialEq)]
pub struct TimedFrame {
    /// Presentation time in seconds.
    pub timestamp: f64,
    /// Frame pixels.
    pub image: RgbaImage,
}

/// A lazy, restartable sequence of decoded frames.
pub trait FrameSource {
    /// Open the source and report its intrinsic properties.
    ///
    /// Calling `open` again on an open source reopens it from the start.
    fn open(&mut self) -> Result<SourceMetadata, BurnError>;

    /// Where the frames come from, for error messages.
    fn describe(&self) -> PathBuf;

    /// Decode the next frame, or `None` at end of stream.
    fn next_frame(&mut self) -> Option<Result<TimedFrame, BurnError>>;

    /// Restart from the first frame.
    fn rewind(&mut self) -> Result<(), BurnError>;

    /// Release any decoder or file handles.
    fn close(&mut self);
}

struct OpenMedia {
    input: Input,
    decoder: VideoDecoder,
    scaler: ScalingContext,
    stream_index: usize,
    time_base: Rational,
    start_pts: i64,
    width: u32,
    height: u32,
    decoded: VideoFrame,
    converted: VideoFrame,
    read_errors: u32,
    eof_sent: bool,
    done: bool,
}

/// Frames decoded from a media file with FFmpeg.
///
/// Frames are converted to RGBA at the stream's native resolution.
pub struct MediaSource {
    path: PathBuf,
    media: Option<OpenMedia>,
}

impl Debug for MediaSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("MediaSource")
            .field("path", &self.path)
            .field("open", &self.media.is_some())
            .finish()
    }
}

impl MediaSource {
    /// Create a source for `path`. Nothing is opened until [`FrameSource::open`].
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            media: None,
        }
    }

    /// The file this source reads.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn metadata_error(&self, reason: impl Into<String>) -> BurnError {
        BurnError::MetadataError {
            path: self.path.clone(),
            reason: reason.into(),
        }
    }
}

impl FrameSource for MediaSource {
    fn describe(&self) -> PathBuf {
        self.path.clone()
    }

    fn open(&mut self) -> Result<SourceMetadata, BurnError> {
        self.media = None;
        log::debug!("Opening source media: {}", self.path.display());

        ffmpeg_next::init()
            .map_err(|e| self.metadata_error(format!("FFmpeg initialisation failed: {e}")))?;

        let input = ffmpeg_next::format::input(&self.path)
            .map_err(|e| self.metadata_error(e.to_string()))?;

        let stream = input
            .streams()
            .best(Type::Video)
            .ok_or_else(|| self.metadata_error("no video stream found"))?;
        let stream_index = stream.index();
        let time_base = stream.time_base();
        let start_pts = match stream.start_time() {
            pts if pts > 0 => pts,
            _ => 0,
        };

        let frames_per_second = match rational_to_fps(stream.avg_frame_rate()) {
            fps if fps > 0.0 => fps,
            _ => rational_to_fps(stream.rate()),
        };

        let stream_duration = if stream.duration() > 0 {
            pts_to_seconds(stream.duration(), time_base)
        } else {
            0.0
        };

        let codec_parameters = stream.parameters();
        let codec = codec_parameters.id().name().to_string();
        let decoder = CodecContext::from_parameters(codec_parameters)
            .and_then(|context| context.decoder().video())
            .map_err(|e| self.metadata_error(format!("cannot create video decoder: {e}")))?;

        let width = decoder.width();
        let height = decoder.height();
        if width == 0 || height == 0 {
            return Err(self.metadata_error(format!("invalid video dimensions {width}x{height}")));
        }

        let container_duration = input.duration();
        let duration = if container_duration > 0 {
            Duration::from_micros(container_duration as u64)
        } else {
            Duration::from_secs_f64(stream_duration.max(0.0))
        };

        let scaler = ScalingContext::get(
            decoder.format(),
            width,
            height,
            Pixel::RGBA,
            width,
            height,
            ScalingFlags::BILINEAR,
        )
        .map_err(|e| self.metadata_error(format!("cannot create scaler: {e}")))?;

        let metadata = SourceMetadata {
            width,
            height,
            duration,
            frames_per_second,
            codec,
            format: input.format().name().to_string(),
        };
        log::info!(
            "Opened {} ({}x{}, {:.3}s, {:.2} fps, {})",
            self.path.display(),
            width,
            height,
            metadata.duration_seconds(),
            frames_per_second,
            metadata.codec,
        );

        self.media = Some(OpenMedia {
            input,
            decoder,
            scaler,
            stream_index,
            time_base,
            start_pts,
            width,
            height,
            decoded: VideoFrame::empty(),
            converted: VideoFrame::empty(),
            read_errors: 0,
            eof_sent: false,
            done: false,
        });

        Ok(metadata)
    }

    fn next_frame(&mut self) -> Option<Result<TimedFrame, BurnError>> {
        let media = self.media.as_mut()?;
        let result = media.decode_next();
        if matches!(result, Some(Err(_))) {
            media.done = true;
        }
        result
    }

    fn rewind(&mut self) -> Result<(), BurnError> {
        self.open().map(|_| ())
    }

    fn close(&mut self) {
        if self.media.take().is_some() {
            log::debug!("Closed source media: {}", self.path.display());
        }
    }
}

impl OpenMedia {
    fn decode_next(&mut self) -> Option<Result<TimedFrame, BurnError>> {
        loop {
            if self.done {
                return None;
            }

            match self.decoder.receive_frame(&mut self.decoded) {
                Ok(()) => return Some(self.convert_current_frame()),
                Err(FfmpegError::Eof) => {
                    self.done = true;
                    return None;
                }
                Err(FfmpegError::Other { errno }) if errno == EAGAIN => {}
                Err(e) => {
                    return Some(Err(BurnError::PlaybackError(format!(
                        "receive_frame failed: {e}"
                    ))));
                }
            }

            if self.eof_sent {
                self.done = true;
                return None;
            }

            let mut packet = Packet::empty();
            match packet.read(&mut self.input) {
                Ok(()) => {
                    self.read_errors = 0;
                    if packet.stream() == self.stream_index {
                        if let Err(e) = self.decoder.send_packet(&packet) {
                            return Some(Err(BurnError::PlaybackError(format!(
                                "cannot decode packet: {e}"
                            ))));
                        }
                    }
                }
                Err(FfmpegError::Eof) => {
                    if let Err(e) = self.decoder.send_eof() {
                        return Some(Err(BurnError::PlaybackError(format!(
                            "send_eof failed: {e}"
                        ))));
                    }
                    self.eof_sent = true;
                }
                Err(e) => {
                    self.read_errors += 1;
                    log::warn!("Skipping unreadable packet: {e}");
                    if self.read_errors >= MAX_READ_ERRORS {
                        return Some(Err(BurnError::PlaybackError(format!(
                            "{MAX_READ_ERRORS} consecutive read errors, last: {e}"
                        ))));
                    }
                }
            }
        }
    }

    fn convert_current_frame(&mut self) -> Result<TimedFrame, BurnError> {
        let pts = self
            .decoded
            .timestamp()
            .or_else(|| self.decoded.pts())
            .unwrap_or(self.start_pts);
        let timestamp = pts_to_seconds(pts - self.start_pts, self.time_base).max(0.0);

        self.scaler
            .run(&self.decoded, &mut self.converted)
            .map_err(|e| BurnError::PlaybackError(format!("pixel conversion failed: {e}")))?;

        let buffer = frame_to_buffer(&self.converted, self.width, self.height, 4);
        let image = RgbaImage::from_raw(self.width, self.height, buffer).ok_or_else(|| {
            BurnError::PlaybackError(
                "Failed to construct RGBA image from decoded frame data".to_string(),
            )
        })?;

        Ok(TimedFrame { timestamp, image })
    }
}

/// Frames held in memory.
///
/// Useful when frames come from somewhere other than a media file, and for
/// exercising a burn job without FFmpeg.
#[derive(Debug, Clone)]
pub struct MemorySource {
    metadata: SourceMetadata,
    frames: Vec<TimedFrame>,
    label: PathBuf,
    position: usize,
    is_open: bool,
}

impl MemorySource {
    /// Serve `frames` (in the given order) with `metadata`.
    pub fn new(metadata: SourceMetadata, frames: Vec<TimedFrame>) -> Self {
        Self {
            metadata,
            frames,
            label: PathBuf::from("memory"),
            position: 0,
            is_open: false,
        }
    }

    /// Name the source in error messages instead of `memory`.
    pub fn with_label<P: Into<PathBuf>>(mut self, label: P) -> Self {
        self.label = label.into();
        self
    }

    /// Whether the source is currently open.
    pub fn is_open(&self) -> bool {
        self.is_open
    }
}

impl FrameSource for MemorySource {
    fn describe(&self) -> PathBuf {
        self.label.clone()
    }

    fn open(&mut self) -> Result<SourceMetadata, BurnError> {
        if !self.metadata.has_dimensions() {
            return Err(BurnError::MetadataError {
                path: self.label.clone(),
                reason: format!(
                    "invalid video dimensions {}x{}",
                    self.metadata.width, self.metadata.height
                ),
            });
        }
        self.position = 0;
        self.is_open = true;
        Ok(self.metadata.clone())
    }

    fn next_frame(&mut self) -> Option<Result<TimedFrame, BurnError>> {
        if !self.is_open {
            return None;
        }
        let frame = self.frames.get(self.position)?.clone();
        self.position += 1;
        Some(Ok(frame))
    }

    fn rewind(&mut self) -> Result<(), BurnError> {
        self.position = 0;
        Ok(())
    }

    fn close(&mut self) {
        self.is_open = false;
    }
}

/// Resamples a [`FrameSource`] to a fixed output frame rate.
///
/// Output tick `n` is at `n / fps` seconds and shows the latest source frame
/// whose timestamp is at or before the tick. Ticks stop at the declared
/// duration, or one source frame interval after the last frame if the
/// stream ends first.
#[derive(Debug)]
pub struct FrameRateResampler {
    fps: f64,
    end_time: Option<f64>,
    source_interval: f64,
    tick: u64,
    current: Option<TimedFrame>,
    lookahead: Option<TimedFrame>,
    exhausted: bool,
}

impl FrameRateResampler {
    /// Create a resampler producing `fps` frames per second for a source
    /// described by `metadata`.
    pub fn new(fps: u32, metadata: &SourceMetadata) -> Self {
        let fps = f64::from(fps.max(1));
        let duration = metadata.duration_seconds();
        let source_interval = if metadata.frames_per_second > 0.0 {
            1.0 / metadata.frames_per_second
        } else {
            1.0 / fps
        };
        Self {
            fps,
            end_time: (duration > 0.0).then_some(duration),
            source_interval,
            tick: 0,
            current: None,
            lookahead: None,
            exhausted: false,
        }
    }

    /// Number of ticks produced so far.
    pub fn ticks_emitted(&self) -> u64 {
        self.tick
    }

    /// Ticks a full pass will produce, when the duration is known.
    pub fn expected_ticks(&self) -> Option<u64> {
        self.end_time
            .map(|end| (end * self.fps - TIME_EPSILON).ceil().max(1.0) as u64)
    }

    /// Produce the next output tick time and the frame to show at it.
    ///
    /// Returns `None` once the output covers the source.
    pub fn next_tick<S>(&mut self, source: &mut S) -> Option<Result<(f64, &RgbaImage), BurnError>>
    where
        S: FrameSource + ?Sized,
    {
        let time = self.tick as f64 / self.fps;
        if self.tick > 0 && self.end_time.is_some_and(|end| time >= end - TIME_EPSILON) {
            return None;
        }

        loop {
            if self.lookahead.is_none() && !self.exhausted {
                match source.next_frame() {
                    Some(Ok(frame)) => self.lookahead = Some(frame),
                    Some(Err(e)) => return Some(Err(e)),
                    None => self.exhausted = true,
                }
            }
            let take = match &self.lookahead {
                Some(next) => self.current.is_none() || next.timestamp <= time + TIME_EPSILON,
                None => false,
            };
            if !take {
                break;
            }
            self.current = self.lookahead.take();
        }

        let last_timestamp = self.current.as_ref()?.timestamp;
        if self.tick > 0
            && self.exhausted
            && self.lookahead.is_none()
            && time >= last_timestamp + self.source_interval - TIME_EPSILON
        {
            return None;
        }

        self.tick += 1;
        self.current.as_ref().map(|frame| Ok((time, &frame.image)))
    }
}
