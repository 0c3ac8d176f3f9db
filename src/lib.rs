//! # subburn
//!
//! Burn timed subtitles permanently into a video's pixels and re-encode it.
//!
//! `subburn` decodes a video with FFmpeg via the
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next) crate, resolves the
//! cue active at each output frame's time, lays out and paints the cue text
//! (word-wrapped, on a background box, with an outline, drop shadow or glow),
//! and streams the composited frames into an encoder, reporting an integer
//! progress percentage as it goes.
//!
//! ## Quick Start
//!
//! ### Burn an SRT file
//!
//! ```no_run
//! use subburn::{BurnOptions, SubtitleStyle, burn_subtitles, parse_srt};
//!
//! let cues = parse_srt(&std::fs::read_to_string("captions.srt")?)?;
//! let artifact = burn_subtitles(
//!     "input.mp4",
//!     "output.mp4",
//!     cues,
//!     SubtitleStyle::default(),
//!     BurnOptions::default(),
//! )?;
//! println!("{} ({})", artifact.path.display(), artifact.media_type);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ### Resolve the cue on screen at a time
//!
//! ```
//! use subburn::{Cue, find_active_cue, parse_timecode};
//!
//! let cues = vec![
//!     Cue::new("1", 1.0, 3.0, "First"),
//!     Cue::new("2", 2.5, 5.0, "Overlapping"),
//! ];
//! let active = find_active_cue(&cues, parse_timecode("00:00:02,750"));
//! assert_eq!(active.map(|cue| cue.text.as_str()), Some("First"));
//! ```
//!
//! ### Drive a burn step by step
//!
//! ```no_run
//! use subburn::{BurnJob, BurnOptions, BurnState, FileEncoderFactory, MediaSource, SubtitleStyle};
//!
//! let mut job = BurnJob::new(
//!     MediaSource::new("input.mp4"),
//!     FileEncoderFactory::new("output.webm"),
//!     Vec::new(),
//!     SubtitleStyle::default(),
//!     BurnOptions::default(),
//! );
//! job.load_metadata()?;
//! job.start_encoding()?;
//! while job.step()? {}
//! job.finalize()?;
//! assert_eq!(job.state(), BurnState::Done);
//! # Ok::<(), subburn::BurnError>(())
//! ```
//!
//! ## Features
//!
//! - **Timed text**: SRT and WebVTT parsing and formatting, timecodes with
//!   either `,` or `.` millisecond separators
//! - **Embedded subtitles**: decode a container's own text subtitle stream
//!   to cues
//! - **Styling**: font size scaled to frame height, colours, background box,
//!   outline, drop shadow or glow, vertical position, opacity; loadable from
//!   JSON
//! - **Fonts**: system font lookup by CSS-style family list, or a font file
//! - **Explicit state machine**: `BurnJob` with named transitions, explicit
//!   cancellation and monotonic progress
//! - **Codec negotiation**: H.265, H.264, VP9, VP8 and MPEG-4 tried in order
//! - **Atomic output**: frames go to a partial file renamed on success
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system.

pub mod compositor;
pub mod configuration;
pub mod cue;
pub mod encode;
pub mod error;
pub mod ffmpeg;
pub mod font;
pub mod layout;
pub mod metadata;
pub mod paint;
pub mod pipeline;
pub mod progress;
pub mod source;
pub mod srt;
pub mod style;
pub mod subtitle;
pub mod timecode;
mod utilities;

pub use compositor::{Compositor, composite_frame, progress_percent};
pub use configuration::{BurnOptions, FontSource};
pub use cue::{Cue, CueTrack, find_active_cue};
pub use encode::{
    EncodedArtifact, EncoderFactory, EncoderOptions, FileEncoderFactory, FrameSink, VideoCodec,
    VideoEncoder, media_type_for,
};
pub use error::BurnError;
pub use ffmpeg::{FfmpegLogLevel, get_ffmpeg_log_level, set_ffmpeg_log_level};
pub use font::{FontRasterizer, GlyphRasterizer, LineMask, SharedRasterizer};
pub use layout::{BoxGeometry, EffectParams, TextMeasure, compute_box_geometry, line_baselines, wrap};
pub use metadata::SourceMetadata;
pub use paint::{OverlayLayer, blend_layer, render_cue_layer};
pub use pipeline::{BurnJob, BurnState, burn_subtitles};
pub use progress::{CancellationToken, OperationType, ProgressCallback, ProgressInfo};
pub use source::{FrameRateResampler, FrameSource, MediaSource, MemorySource, TimedFrame};
pub use srt::{format_srt, format_vtt, parse_srt};
pub use style::{Effect, OverlayGeometry, Paint, SubtitleStyle};
pub use subtitle::{extract_embedded_cues, extract_embedded_cues_with_options, strip_ass_tags};
pub use timecode::{format_timecode, format_vtt_timecode, parse_timecode};
