//! Video encoding of composited frames.
//!
//! A burn job writes frames through a [`FrameSink`] opened by an
//! [`EncoderFactory`]. [`FileEncoderFactory`] produces FFmpeg-backed
//! [`VideoEncoder`]s that try each codec of
//! [`EncoderOptions::codec_preference`] in order and keep the first one the
//! local FFmpeg build and the output container accept.
//!
//! Frames are written to `<name>.partial.<ext>` next to the requested output
//! and renamed into place when the encoder finishes, so an aborted or failed
//! burn never leaves a truncated file at the output path.
//!
//! # Example
//!
//! ```no_run
//! use subburn::{EncoderFactory, EncoderOptions, FileEncoderFactory};
//! use image::RgbaImage;
//!
//! let factory = FileEncoderFactory::new("output.mp4");
//! let mut sink = factory.open(640, 360, &EncoderOptions::default().with_fps(25))?;
//! for _ in 0..25 {
//!     sink.push_frame(&RgbaImage::new(640, 360))?;
//! }
//! let artifact = sink.finish()?;
//! println!("{} ({})", artifact.path.display(), artifact.media_type);
//! # Ok::<(), subburn::BurnError>(())
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};

use ffmpeg_next::codec::Id;
use ffmpeg_next::codec::context::Context as CodecContext;
use ffmpeg_next::codec::encoder::video::Encoder as OpenVideoEncoder;
use ffmpeg_next::format::context::Output;
use ffmpeg_next::format::{Flags as FormatFlags, Pixel};
use ffmpeg_next::frame::Video as VideoFrame;
use ffmpeg_next::software::scaling::{Context as ScalingContext, Flags as ScalingFlags};
use ffmpeg_next::{Dictionary, Packet, Rational};
use image::RgbaImage;

use crate::error::BurnError;
use crate::utilities::buffer_to_frame;

/// Default output frame rate.
pub const DEFAULT_FPS: u32 = 30;

/// Default target bitrate in bits per second.
pub const DEFAULT_BITRATE: usize = 5_000_000;

/// Output video codecs, in the order they are normally preferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VideoCodec {
    /// H.265 / HEVC.
    H265,
    /// H.264 / AVC.
    H264,
    /// VP9.
    Vp9,
    /// VP8.
    Vp8,
    /// MPEG-4 Part 2.
    Mpeg4,
}

impl VideoCodec {
    /// Every codec, most preferred first.
    pub const ALL: [VideoCodec; 5] = [
        VideoCodec::H265,
        VideoCodec::H264,
        VideoCodec::Vp9,
        VideoCodec::Vp8,
        VideoCodec::Mpeg4,
    ];

    /// FFmpeg codec id.
    pub fn codec_id(self) -> Id {
        match self {
            VideoCodec::H265 => Id::HEVC,
            VideoCodec::H264 => Id::H264,
            VideoCodec::Vp9 => Id::VP9,
            VideoCodec::Vp8 => Id::VP8,
            VideoCodec::Mpeg4 => Id::MPEG4,
        }
    }

    /// Codec tag used in a media type's `codecs=` parameter.
    pub fn codecs_tag(self) -> &'static str {
        match self {
            VideoCodec::H265 => "hvc1",
            VideoCodec::H264 => "avc1",
            VideoCodec::Vp9 => "vp9",
            VideoCodec::Vp8 => "vp8",
            VideoCodec::Mpeg4 => "mp4v",
        }
    }

    /// Parse a codec name such as `"h264"`, `"hevc"` or `"vp9"`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "h265" | "hevc" | "hvc1" | "x265" => Some(VideoCodec::H265),
            "h264" | "avc" | "avc1" | "x264" => Some(VideoCodec::H264),
            "vp9" => Some(VideoCodec::Vp9),
            "vp8" => Some(VideoCodec::Vp8),
            "mpeg4" | "mp4v" => Some(VideoCodec::Mpeg4),
            _ => None,
        }
    }
}

impl Display for VideoCodec {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            VideoCodec::H265 => "h265",
            VideoCodec::H264 => "h264",
            VideoCodec::Vp9 => "vp9",
            VideoCodec::Vp8 => "vp8",
            VideoCodec::Mpeg4 => "mpeg4",
        };
        f.write_str(name)
    }
}

/// Container media type for `path`'s extension, without codec parameter.
///
/// Unknown extensions fall back to `video/mp4`.
pub fn container_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match extension.as_str() {
        "mov" => "video/quicktime",
        "mkv" => "video/x-matroska",
        "webm" => "video/webm",
        "avi" => "video/x-msvideo",
        _ => "video/mp4",
    }
}

/// Full media type of an output file, e.g. `video/mp4; codecs=avc1`.
pub fn media_type_for(path: &Path, codec: VideoCodec) -> String {
    format!("{}; codecs={}", container_type_for(path), codec.codecs_tag())
}

/// Path frames are written to before the output is finished.
pub fn partial_path_for(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let name = match path.extension() {
        Some(ext) => format!("{stem}.partial.{}", ext.to_string_lossy()),
        None => format!("{stem}.partial"),
    };
    path.with_file_name(name)
}

/// Encoder settings.
///
/// # Example
///
/// ```
/// use subburn::{EncoderOptions, VideoCodec};
///
/// let options = EncoderOptions::default()
///     .with_fps(24)
///     .with_bitrate(2_000_000)
///     .with_codec_preference(vec![VideoCodec::H264]);
/// assert_eq!(options.fps, 24);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct EncoderOptions {
    /// Output frames per second (default: 30).
    pub fps: u32,
    /// Target bitrate in bits per second (default: 5 Mbit/s).
    pub bitrate: Option<usize>,
    /// Constant Rate Factor passed to encoders that support it.
    pub crf: Option<u32>,
    /// Codecs to try, in order.
    pub codec_preference: Vec<VideoCodec>,
}

impl Default for EncoderOptions {
    fn default() -> Self {
        Self {
            fps: DEFAULT_FPS,
            bitrate: Some(DEFAULT_BITRATE),
            crf: None,
            codec_preference: VideoCodec::ALL.to_vec(),
        }
    }
}

impl EncoderOptions {
    /// Set the output frame rate. Zero is treated as one.
    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = fps.max(1);
        self
    }

    /// Set the target bitrate in bits per second.
    pub fn with_bitrate(mut self, bitrate: usize) -> Self {
        self.bitrate = Some(bitrate);
        self
    }

    /// Leave the bitrate to the encoder.
    pub fn without_bitrate(mut self) -> Self {
        self.bitrate = None;
        self
    }

    /// Set the CRF quality value (lower is better).
    pub fn with_crf(mut self, crf: u32) -> Self {
        self.crf = Some(crf);
        self
    }

    /// Replace the codec preference list.
    pub fn with_codec_preference(mut self, codecs: Vec<VideoCodec>) -> Self {
        self.codec_preference = codecs;
        self
    }

    /// Move `codec` to the front of the preference list.
    pub fn prefer(mut self, codec: VideoCodec) -> Self {
        self.codec_preference.retain(|c| *c != codec);
        self.codec_preference.insert(0, codec);
        self
    }
}

/// A finished output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedArtifact {
    /// Final output path.
    pub path: PathBuf,
    /// Media type, e.g. `video/mp4; codecs=avc1`.
    pub media_type: String,
    /// Codec the frames were encoded with.
    pub codec: VideoCodec,
    /// Number of frames written.
    pub frame_count: u64,
    /// Encoded bytes written.
    pub byte_size: u64,
}

/// Destination for composited frames.
pub trait FrameSink {
    /// Codec selected for this sink.
    fn codec(&self) -> VideoCodec;

    /// Encode one frame. Returns the total encoded bytes so far.
    fn push_frame(&mut self, frame: &RgbaImage) -> Result<u64, BurnError>;

    /// Flush pending frames and finalise the output.
    fn finish(self: Box<Self>) -> Result<EncodedArtifact, BurnError>;

    /// Stop without producing an output, discarding anything written.
    fn abort(self: Box<Self>);
}

/// Opens a [`FrameSink`] once the output dimensions are known.
pub trait EncoderFactory {
    /// Open a sink for `width` x `height` frames.
    fn open(
        &self,
        width: u32,
        height: u32,
        options: &EncoderOptions,
    ) -> Result<Box<dyn FrameSink>, BurnError>;
}

/// Opens FFmpeg encoders writing to a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEncoderFactory {
    path: PathBuf,
}

impl FileEncoderFactory {
    /// Write to `path`. The container is inferred from its extension.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// The final output path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EncoderFactory for FileEncoderFactory {
    fn open(
        &self,
        width: u32,
        height: u32,
        options: &EncoderOptions,
    ) -> Result<Box<dyn FrameSink>, BurnError> {
        ffmpeg_next::init().map_err(|e| BurnError::FfmpegError(e.to_string()))?;

        let mut attempts = Vec::new();
        for &codec in &options.codec_preference {
            match VideoEncoder::open(&self.path, width, height, codec, options) {
                Ok(encoder) => {
                    log::info!(
                        "Encoding {}x{} at {} fps with {} to {}",
                        width,
                        height,
                        options.fps,
                        codec,
                        self.path.display(),
                    );
                    return Ok(Box::new(encoder));
                }
                Err(e) => {
                    log::debug!("Codec {codec} unavailable: {e}");
                    attempts.push(format!("{codec}: {e}"));
                }
            }
        }

        Err(BurnError::EncoderUnavailable(if attempts.is_empty() {
            "no codecs requested".to_string()
        } else {
            attempts.join("; ")
        }))
    }
}

/// FFmpeg encoder writing one video stream to a file.
pub struct VideoEncoder {
    output: Output,
    encoder: OpenVideoEncoder,
    scaler: ScalingContext,
    codec: VideoCodec,
    stream_index: usize,
    encoder_time_base: Rational,
    stream_time_base: Rational,
    width: u32,
    height: u32,
    frame_index: i64,
    byte_size: u64,
    partial_path: PathBuf,
    final_path: PathBuf,
}

impl VideoEncoder {
    /// Open an encoder for `codec`, writing to the partial path of `path`.
    ///
    /// # Errors
    ///
    /// - [`BurnError::VideoEncodeError`] if the codec is missing or refuses
    ///   the settings.
    /// - [`BurnError::VideoWriteError`] if the output cannot be created.
    pub fn open(
        path: &Path,
        width: u32,
        height: u32,
        codec: VideoCodec,
        options: &EncoderOptions,
    ) -> Result<Self, BurnError> {
        let partial_path = partial_path_for(path);
        let result = Self::open_at(&partial_path, width, height, codec, options);
        match result {
            Ok(mut encoder) => {
                encoder.final_path = path.to_path_buf();
                Ok(encoder)
            }
            Err(e) => {
                remove_partial(&partial_path);
                Err(e)
            }
        }
    }

    fn open_at(
        partial_path: &Path,
        width: u32,
        height: u32,
        codec: VideoCodec,
        options: &EncoderOptions,
    ) -> Result<Self, BurnError> {
        let fps = options.fps.max(1) as i32;
        let encoder_time_base = Rational::new(1, fps);

        let encoder_codec = ffmpeg_next::encoder::find(codec.codec_id()).ok_or_else(|| {
            BurnError::VideoEncodeError(format!("codec {codec} not available"))
        })?;

        let mut output = ffmpeg_next::format::output(partial_path)
            .map_err(|e| BurnError::VideoWriteError(format!("cannot open output: {e}")))?;

        let needs_global_header = output.format().flags().contains(FormatFlags::GLOBAL_HEADER);

        let mut stream = output
            .add_stream(encoder_codec)
            .map_err(|e| BurnError::VideoWriteError(format!("cannot add stream: {e}")))?;
        let stream_index = stream.index();

        let mut encoder = CodecContext::from_parameters(stream.parameters())
            .and_then(|context| context.encoder().video())
            .map_err(|e| BurnError::VideoEncodeError(format!("cannot create codec context: {e}")))?;

        encoder.set_width(width);
        encoder.set_height(height);
        encoder.set_format(Pixel::YUV420P);
        encoder.set_time_base(encoder_time_base);
        encoder.set_frame_rate(Some(Rational::new(fps, 1)));
        if let Some(bitrate) = options.bitrate {
            encoder.set_bit_rate(bitrate);
        }

        if needs_global_header {
            unsafe {
                (*encoder.as_mut_ptr()).flags |=
                    ffmpeg_sys_next::AV_CODEC_FLAG_GLOBAL_HEADER as i32;
            }
        }

        let mut codec_options = Dictionary::new();
        if let Some(crf) = options.crf {
            codec_options.set("crf", &crf.to_string());
        }

        let encoder = encoder
            .open_as_with(encoder_codec, codec_options)
            .map_err(|e| BurnError::VideoEncodeError(format!("cannot open encoder: {e}")))?;

        stream.set_parameters(&encoder);
        if let Some(tag) = container_codec_tag(partial_path, codec) {
            unsafe {
                (*(*stream.as_mut_ptr()).codecpar).codec_tag = tag;
            }
        }
        stream.set_time_base(encoder_time_base);

        output
            .write_header()
            .map_err(|e| BurnError::VideoWriteError(format!("cannot write header: {e}")))?;

        let stream_time_base = output
            .stream(stream_index)
            .map(|s| s.time_base())
            .unwrap_or(encoder_time_base);

        let scaler = ScalingContext::get(
            Pixel::RGBA,
            width,
            height,
            Pixel::YUV420P,
            width,
            height,
            ScalingFlags::BILINEAR,
        )
        .map_err(|e| BurnError::VideoEncodeError(format!("cannot create scaler: {e}")))?;

        Ok(Self {
            output,
            encoder,
            scaler,
            codec,
            stream_index,
            encoder_time_base,
            stream_time_base,
            width,
            height,
            frame_index: 0,
            byte_size: 0,
            partial_path: partial_path.to_path_buf(),
            final_path: PathBuf::new(),
        })
    }

    /// Write every packet the encoder has ready.
    fn drain_packets(&mut self) -> Result<(), BurnError> {
        let mut packet = Packet::empty();
        while self.encoder.receive_packet(&mut packet).is_ok() {
            packet.set_stream(self.stream_index);
            packet.rescale_ts(self.encoder_time_base, self.stream_time_base);
            self.byte_size += packet.size() as u64;
            packet
                .write_interleaved(&mut self.output)
                .map_err(|e| BurnError::VideoWriteError(format!("write packet failed: {e}")))?;
        }
        Ok(())
    }

    fn finish_inner(&mut self) -> Result<(), BurnError> {
        self.encoder
            .send_eof()
            .map_err(|e| BurnError::VideoEncodeError(format!("send_eof failed: {e}")))?;
        self.drain_packets()?;
        self.output
            .write_trailer()
            .map_err(|e| BurnError::VideoWriteError(format!("cannot write trailer: {e}")))?;
        Ok(())
    }
}

impl FrameSink for VideoEncoder {
    fn codec(&self) -> VideoCodec {
        self.codec
    }

    fn push_frame(&mut self, frame: &RgbaImage) -> Result<u64, BurnError> {
        if frame.dimensions() != (self.width, self.height) {
            return Err(BurnError::VideoEncodeError(format!(
                "frame is {}x{}, encoder expects {}x{}",
                frame.width(),
                frame.height(),
                self.width,
                self.height,
            )));
        }

        let mut source_frame = VideoFrame::new(Pixel::RGBA, self.width, self.height);
        buffer_to_frame(frame.as_raw(), &mut source_frame, self.width, self.height, 4);

        let mut yuv_frame = VideoFrame::empty();
        self.scaler
            .run(&source_frame, &mut yuv_frame)
            .map_err(|e| BurnError::VideoEncodeError(format!("scaling failed: {e}")))?;

        yuv_frame.set_pts(Some(self.frame_index));
        self.frame_index += 1;

        self.encoder
            .send_frame(&yuv_frame)
            .map_err(|e| BurnError::VideoEncodeError(format!("send_frame failed: {e}")))?;
        self.drain_packets()?;

        Ok(self.byte_size)
    }

    fn finish(mut self: Box<Self>) -> Result<EncodedArtifact, BurnError> {
        if let Err(e) = self.finish_inner() {
            remove_partial(&self.partial_path);
            return Err(e);
        }

        let VideoEncoder {
            output,
            codec,
            frame_index,
            byte_size,
            partial_path,
            final_path,
            ..
        } = *self;
        // Close the file before moving it.
        drop(output);

        if let Err(e) = std::fs::rename(&partial_path, &final_path) {
            remove_partial(&partial_path);
            return Err(BurnError::VideoWriteError(format!(
                "cannot move {} to {}: {e}",
                partial_path.display(),
                final_path.display(),
            )));
        }

        log::info!(
            "Wrote {} frames ({} bytes) to {}",
            frame_index,
            byte_size,
            final_path.display(),
        );

        Ok(EncodedArtifact {
            media_type: media_type_for(&final_path, codec),
            path: final_path,
            codec,
            frame_count: frame_index as u64,
            byte_size,
        })
    }

    fn abort(self: Box<Self>) {
        let partial_path = self.partial_path.clone();
        drop(self);
        remove_partial(&partial_path);
        log::debug!("Discarded partial output {}", partial_path.display());
    }
}

/// Codec tag to force in containers that default to a different one.
///
/// MP4 and MOV default HEVC to `hev1`; `hvc1` is what players expect.
fn container_codec_tag(path: &Path, codec: VideoCodec) -> Option<u32> {
    let container = container_type_for(path);
    let is_iso_media = container == "video/mp4" || container == "video/quicktime";
    if is_iso_media && codec == VideoCodec::H265 {
        Some(u32::from_le_bytes(*b"hvc1"))
    } else {
        None
    }
}

fn remove_partial(path: &Path) {
    if path.exists() {
        if let Err(e) = std::fs::remove_file(path) {
            log::warn!("Could not remove {}: {e}", path.display());
        }
    }
}
