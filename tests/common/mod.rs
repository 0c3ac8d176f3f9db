//! Helpers shared by the integration tests.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use image::{Rgba, RgbaImage};
use subburn::{
    BurnError, EncodedArtifact, EncoderFactory, EncoderOptions, FrameSink, GlyphRasterizer,
    LineMask, ProgressCallback, ProgressInfo, SharedRasterizer, SourceMetadata, TextMeasure,
    TimedFrame, VideoCodec, media_type_for,
};

pub fn sample_video_path() -> &'static str {
    "tests/fixtures/sample_video.mp4"
}

/// Every character advances half the font size and renders as a solid block.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedRasterizer;

impl FixedRasterizer {
    pub const ADVANCE: f32 = 0.5;

    pub fn shared() -> SharedRasterizer {
        Arc::new(FixedRasterizer)
    }
}

impl TextMeasure for FixedRasterizer {
    fn measure(&self, text: &str, font_size: f32) -> f32 {
        text.chars().count() as f32 * font_size * Self::ADVANCE
    }
}

impl GlyphRasterizer for FixedRasterizer {
    fn rasterize_line(&self, text: &str, font_size: f32) -> LineMask {
        let width = self.measure(text, font_size).round() as u32;
        if width == 0 {
            return LineMask::empty();
        }
        let height = font_size.ceil() as u32;
        LineMask {
            width,
            height,
            left: 0,
            ascent: (font_size * 0.8).round() as i32,
            coverage: vec![255; (width * height) as usize],
        }
    }
}

pub fn solid_frame(width: u32, height: u32, value: u8) -> RgbaImage {
    RgbaImage::from_pixel(width, height, Rgba([value, value, value, 255]))
}

pub fn metadata(width: u32, height: u32, seconds: f64, fps: f64) -> SourceMetadata {
    SourceMetadata {
        width,
        height,
        duration: std::time::Duration::from_secs_f64(seconds),
        frames_per_second: fps,
        codec: "rawvideo".to_string(),
        format: "memory".to_string(),
    }
}

/// `count` frames at `fps`, frame `i` filled with grey level `i * step`.
pub fn timed_frames(width: u32, height: u32, count: usize, fps: f64, step: u8) -> Vec<TimedFrame> {
    (0..count)
        .map(|i| TimedFrame {
            timestamp: i as f64 / fps,
            image: solid_frame(width, height, (i as u8).wrapping_mul(step)),
        })
        .collect()
}

pub fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-3
}

// ── Recording encoder ──────────────────────────────────────────────

/// Everything a [`RecordingFactory`] and its sinks observed.
#[derive(Debug, Default)]
pub struct SinkLog {
    pub opened: usize,
    pub options: Option<EncoderOptions>,
    pub dimensions: Option<(u32, u32)>,
    pub frames: Vec<RgbaImage>,
    pub finished: bool,
    pub aborted: bool,
}

/// An encoder that keeps frames in memory.
#[derive(Debug, Clone)]
pub struct RecordingFactory {
    pub log: Arc<Mutex<SinkLog>>,
    pub codec: VideoCodec,
    pub fail_open: bool,
}

impl RecordingFactory {
    pub const OUTPUT: &'static str = "burned.mp4";
    pub const BYTES_PER_FRAME: u64 = 100;

    pub fn new(codec: VideoCodec) -> Self {
        Self {
            log: Arc::new(Mutex::new(SinkLog::default())),
            codec,
            fail_open: false,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            fail_open: true,
            ..Self::new(VideoCodec::H264)
        }
    }

    pub fn frames(&self) -> Vec<RgbaImage> {
        self.log.lock().unwrap().frames.clone()
    }
}

impl EncoderFactory for RecordingFactory {
    fn open(
        &self,
        width: u32,
        height: u32,
        options: &EncoderOptions,
    ) -> Result<Box<dyn FrameSink>, BurnError> {
        if self.fail_open {
            return Err(BurnError::EncoderUnavailable("no encoders in this build".to_string()));
        }
        let mut log = self.log.lock().unwrap();
        log.opened += 1;
        log.options = Some(options.clone());
        log.dimensions = Some((width, height));
        Ok(Box::new(RecordingSink {
            log: Arc::clone(&self.log),
            codec: self.codec,
            frames: 0,
        }))
    }
}

struct RecordingSink {
    log: Arc<Mutex<SinkLog>>,
    codec: VideoCodec,
    frames: u64,
}

impl FrameSink for RecordingSink {
    fn codec(&self) -> VideoCodec {
        self.codec
    }

    fn push_frame(&mut self, frame: &RgbaImage) -> Result<u64, BurnError> {
        self.log.lock().unwrap().frames.push(frame.clone());
        self.frames += 1;
        Ok(self.frames * RecordingFactory::BYTES_PER_FRAME)
    }

    fn finish(self: Box<Self>) -> Result<EncodedArtifact, BurnError> {
        self.log.lock().unwrap().finished = true;
        let path = PathBuf::from(RecordingFactory::OUTPUT);
        Ok(EncodedArtifact {
            media_type: media_type_for(&path, self.codec),
            path,
            codec: self.codec,
            frame_count: self.frames,
            byte_size: self.frames * RecordingFactory::BYTES_PER_FRAME,
        })
    }

    fn abort(self: Box<Self>) {
        self.log.lock().unwrap().aborted = true;
    }
}

// ── Recording progress ─────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct RecordingProgress {
    pub reports: Mutex<Vec<ProgressInfo>>,
    pub failures: Mutex<Vec<String>>,
}

impl RecordingProgress {
    pub fn percents(&self) -> Vec<u8> {
        self.reports.lock().unwrap().iter().map(|info| info.percent).collect()
    }

    pub fn failures(&self) -> Vec<String> {
        self.failures.lock().unwrap().clone()
    }
}

impl ProgressCallback for RecordingProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        self.reports.lock().unwrap().push(info.clone());
    }

    fn on_failure(&self, message: &str) {
        self.failures.lock().unwrap().push(message.to_string());
    }
}
