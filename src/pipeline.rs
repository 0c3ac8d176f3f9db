//! The burn job state machine.
//!
//! A [`BurnJob`] owns one burn from start to finish:
//!
//! ```text
//! Idle -> MetadataLoading -> Encoding -> Finalizing -> Done
//!               |               |            |
//!               +---------------+------------+-> Failed
//!               +---------------+--------------> Cancelled
//! ```
//!
//! Each arrow is a named method. [`BurnJob::run`] drives the job from
//! whatever state it is in to completion; the individual transitions are
//! public so callers can interleave their own work between frames.
//!
//! # Example
//!
//! ```no_run
//! use subburn::{BurnJob, BurnOptions, Cue, FileEncoderFactory, MediaSource, SubtitleStyle};
//!
//! let cues = vec![Cue::new("1", 0.5, 2.0, "Hello")];
//! let mut job = BurnJob::new(
//!     MediaSource::new("input.mp4"),
//!     FileEncoderFactory::new("output.mp4"),
//!     cues,
//!     SubtitleStyle::default(),
//!     BurnOptions::default(),
//! );
//!
//! job.load_metadata()?;
//! job.start_encoding()?;
//! while job.step()? {
//!     println!("{}%", job.last_reported_progress());
//! }
//! let artifact = job.finalize()?;
//! println!("{}", artifact.media_type);
//! # Ok::<(), subburn::BurnError>(())
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::Path;
use std::time::Duration;

use crate::compositor::Compositor;
use crate::configuration::BurnOptions;
use crate::cue::{Cue, CueTrack};
use crate::encode::{EncodedArtifact, EncoderFactory, FileEncoderFactory, FrameSink};
use crate::error::BurnError;
use crate::metadata::SourceMetadata;
use crate::progress::{OperationType, ProgressTracker};
use crate::source::{FrameRateResampler, FrameSource, MediaSource};
use crate::style::SubtitleStyle;

/// Lifecycle state of a [`BurnJob`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BurnState {
    /// Created, nothing opened yet.
    Idle,
    /// The source is being (or has been) opened; no encoder yet.
    MetadataLoading,
    /// Frames are being composited and encoded.
    Encoding,
    /// The encoder is being flushed and the output finalised.
    Finalizing,
    /// The output artifact was produced.
    Done,
    /// The job stopped on an error. No artifact exists.
    Failed,
    /// The job was cancelled. No artifact exists.
    Cancelled,
}

impl BurnState {
    /// `true` for `Done`, `Failed` and `Cancelled`.
    pub fn is_terminal(self) -> bool {
        matches!(self, BurnState::Done | BurnState::Failed | BurnState::Cancelled)
    }
}

impl Display for BurnState {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            BurnState::Idle => "idle",
            BurnState::MetadataLoading => "loading metadata",
            BurnState::Encoding => "encoding",
            BurnState::Finalizing => "finalizing",
            BurnState::Done => "done",
            BurnState::Failed => "failed",
            BurnState::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// One burn of a cue list into a video.
///
/// The cue list and style are fixed for the job's lifetime. Source and
/// encoder handles are released when the job reaches a terminal state.
pub struct BurnJob<S, F> {
    source: S,
    factory: F,
    cues: CueTrack,
    style: SubtitleStyle,
    options: BurnOptions,
    state: BurnState,
    metadata: Option<SourceMetadata>,
    compositor: Option<Compositor>,
    resampler: Option<FrameRateResampler>,
    sink: Option<Box<dyn FrameSink>>,
    tracker: Option<ProgressTracker>,
    elapsed_output_bytes: u64,
    last_reported_progress: u8,
    end_of_stream: bool,
}

impl<S, F> BurnJob<S, F>
where
    S: FrameSource,
    F: EncoderFactory,
{
    /// Create a job in [`BurnState::Idle`]. Nothing is opened yet.
    pub fn new(
        source: S,
        factory: F,
        cues: impl Into<CueTrack>,
        style: SubtitleStyle,
        options: BurnOptions,
    ) -> Self {
        Self {
            source,
            factory,
            cues: cues.into(),
            style,
            options,
            state: BurnState::Idle,
            metadata: None,
            compositor: None,
            resampler: None,
            sink: None,
            tracker: None,
            elapsed_output_bytes: 0,
            last_reported_progress: 0,
            end_of_stream: false,
        }
    }

    /// Current state.
    pub fn state(&self) -> BurnState {
        self.state
    }

    /// Source metadata, once loaded.
    pub fn metadata(&self) -> Option<&SourceMetadata> {
        self.metadata.as_ref()
    }

    /// Encoded bytes produced so far.
    pub fn elapsed_output_bytes(&self) -> u64 {
        self.elapsed_output_bytes
    }

    /// Last progress percentage reported to the callback.
    pub fn last_reported_progress(&self) -> u8 {
        self.last_reported_progress
    }

    /// The cues being burned.
    pub fn cues(&self) -> &CueTrack {
        &self.cues
    }

    /// The style snapshot in use.
    pub fn style(&self) -> &SubtitleStyle {
        &self.style
    }

    /// The frame source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// `Idle -> MetadataLoading`: validate the style and open the source.
    ///
    /// # Errors
    ///
    /// [`BurnError::InvalidState`] unless `Idle`. Style or source failures
    /// move the job to `Failed` and are returned.
    pub fn load_metadata(&mut self) -> Result<&SourceMetadata, BurnError> {
        self.expect_state("load metadata", BurnState::Idle)?;
        self.transition(BurnState::MetadataLoading);

        if let Err(e) = self.style.validate() {
            return Err(self.fail(e));
        }

        match self.source.open() {
            Ok(metadata) if metadata.has_dimensions() => {
                log::debug!(
                    "Source is {}x{}, {:.3}s",
                    metadata.width,
                    metadata.height,
                    metadata.duration_seconds(),
                );
                Ok(self.metadata.insert(metadata))
            }
            Ok(metadata) => Err(self.fail(BurnError::MetadataError {
                path: self.source.describe(),
                reason: format!(
                    "invalid video dimensions {}x{}",
                    metadata.width, metadata.height
                ),
            })),
            Err(e) => Err(self.fail(e)),
        }
    }

    /// `MetadataLoading -> Encoding`: resolve the font and open the encoder
    /// at the source's dimensions.
    ///
    /// No font is loaded when there are no cues.
    ///
    /// # Errors
    ///
    /// [`BurnError::InvalidState`] unless metadata has been loaded. Font or
    /// encoder failures move the job to `Failed` and are returned.
    pub fn start_encoding(&mut self) -> Result<(), BurnError> {
        self.expect_state("start encoding", BurnState::MetadataLoading)?;
        let Some(metadata) = self.metadata.clone() else {
            return Err(self.invalid_state("start encoding"));
        };

        let rasterizer = if self.cues.is_empty() {
            None
        } else {
            match self.options.font.resolve(&self.style) {
                Ok(rasterizer) => Some(rasterizer),
                Err(e) => return Err(self.fail(e)),
            }
        };

        let sink = match self
            .factory
            .open(metadata.width, metadata.height, &self.options.encoder)
        {
            Ok(sink) => sink,
            Err(e) => return Err(self.fail(e)),
        };
        log::info!(
            "Burning {} cues into {}x{} video with {}",
            self.cues.len(),
            metadata.width,
            metadata.height,
            sink.codec(),
        );

        let resampler = FrameRateResampler::new(self.options.encoder.fps, &metadata);
        self.tracker = Some(ProgressTracker::new(
            self.options.progress.clone(),
            OperationType::Burning,
            resampler.expected_ticks(),
            self.options.batch_size,
        ));
        self.compositor = Some(Compositor::new(
            metadata.width,
            metadata.height,
            self.style.clone(),
            rasterizer,
        ));
        self.resampler = Some(resampler);
        self.sink = Some(sink);
        self.transition(BurnState::Encoding);
        Ok(())
    }

    /// Produce one output frame.
    ///
    /// Returns `Ok(true)` when a frame was encoded and `Ok(false)` once the
    /// source is exhausted, at which point [`finalize`](Self::finalize)
    /// should be called. Cancellation is checked before the frame.
    ///
    /// # Errors
    ///
    /// [`BurnError::Cancelled`] if the cancellation token fired (the job is
    /// then `Cancelled`). Decode or encode failures move the job to
    /// `Failed` and are returned.
    pub fn step(&mut self) -> Result<bool, BurnError> {
        self.expect_state("encode a frame", BurnState::Encoding)?;

        if self.options.is_cancelled() {
            self.cancel()?;
            return Err(BurnError::Cancelled);
        }

        let duration = self
            .metadata
            .as_ref()
            .map(SourceMetadata::duration_seconds)
            .unwrap_or(0.0);

        let (Some(resampler), Some(compositor), Some(sink)) = (
            self.resampler.as_mut(),
            self.compositor.as_mut(),
            self.sink.as_mut(),
        ) else {
            return Err(self.invalid_state("encode a frame"));
        };

        let outcome = match resampler.next_tick(&mut self.source) {
            None => Ok(None),
            Some(Err(e)) => Err(e),
            Some(Ok((time, frame))) => {
                let (surface, percent) =
                    compositor.composite(frame, time, self.cues.cues(), duration);
                // Without a duration there is nothing to measure against.
                let percent = if duration > 0.0 { percent } else { 0 };
                sink.push_frame(&surface)
                    .map(|bytes| Some((time, percent, bytes)))
            }
        };

        match outcome {
            Ok(Some((time, percent, bytes))) => {
                self.elapsed_output_bytes = bytes;
                if let Some(tracker) = self.tracker.as_mut() {
                    if tracker.advance(percent, Duration::from_secs_f64(time.max(0.0)), bytes) {
                        self.last_reported_progress = tracker.percent();
                    }
                }
                Ok(true)
            }
            Ok(None) => {
                self.end_of_stream = true;
                Ok(false)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// `Encoding -> Finalizing -> Done`: flush the encoder, finalise the
    /// output and report 100%.
    ///
    /// # Errors
    ///
    /// [`BurnError::InvalidState`] unless `Encoding` and [`step`](Self::step)
    /// has reported the end of the source; the job is left untouched. A
    /// source that produced no frames, or an encoder that fails to finish,
    /// moves the job to `Failed`.
    pub fn finalize(&mut self) -> Result<EncodedArtifact, BurnError> {
        self.expect_state("finalize", BurnState::Encoding)?;
        if !self.end_of_stream {
            return Err(self.invalid_state("finalize before the end of the source"));
        }
        self.transition(BurnState::Finalizing);

        let produced = self
            .resampler
            .as_ref()
            .map(FrameRateResampler::ticks_emitted)
            .unwrap_or(0);
        if produced == 0 {
            return Err(self.fail(BurnError::PlaybackError(
                "source produced no frames".to_string(),
            )));
        }

        let Some(sink) = self.sink.take() else {
            return Err(self.fail(BurnError::VideoEncodeError(
                "encoder is not open".to_string(),
            )));
        };
        let artifact = match sink.finish() {
            Ok(artifact) => artifact,
            Err(e) => return Err(self.fail(e)),
        };

        self.elapsed_output_bytes = artifact.byte_size;
        if let Some(tracker) = self.tracker.as_mut() {
            tracker.finish(artifact.byte_size);
        }
        self.last_reported_progress = 100;
        self.release();
        self.transition(BurnState::Done);
        log::info!(
            "Burn finished: {} frames, {} bytes, {}",
            artifact.frame_count,
            artifact.byte_size,
            artifact.media_type,
        );
        Ok(artifact)
    }

    /// Cancel the job, discarding anything encoded so far.
    ///
    /// Allowed from `Idle`, `MetadataLoading` and `Encoding`.
    ///
    /// # Errors
    ///
    /// [`BurnError::InvalidState`] from any other state.
    pub fn cancel(&mut self) -> Result<(), BurnError> {
        match self.state {
            BurnState::Idle | BurnState::MetadataLoading | BurnState::Encoding => {
                log::info!("Burn cancelled while {}", self.state);
                self.abort_sink();
                self.release();
                self.transition(BurnState::Cancelled);
                Ok(())
            }
            _ => Err(self.invalid_state("cancel")),
        }
    }

    /// Drive the job from its current state to `Done`.
    ///
    /// # Errors
    ///
    /// The first error of any transition. The job is then `Failed` or
    /// `Cancelled`.
    pub fn run(&mut self) -> Result<EncodedArtifact, BurnError> {
        if self.state == BurnState::Idle {
            self.load_metadata()?;
        }
        if self.state == BurnState::MetadataLoading {
            self.start_encoding()?;
        }
        while self.step()? {}
        self.finalize()
    }

    fn transition(&mut self, next: BurnState) {
        log::debug!("Burn job {} -> {}", self.state, next);
        self.state = next;
    }

    fn expect_state(&self, operation: &'static str, expected: BurnState) -> Result<(), BurnError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(self.invalid_state(operation))
        }
    }

    fn invalid_state(&self, operation: &'static str) -> BurnError {
        BurnError::InvalidState {
            operation,
            state: self.state,
        }
    }

    /// Move to `Failed`, release everything and tell the callback once.
    fn fail(&mut self, error: BurnError) -> BurnError {
        log::warn!("Burn failed while {}: {error}", self.state);
        self.abort_sink();
        self.release();
        self.transition(BurnState::Failed);
        self.options.progress.on_failure(&error.to_string());
        error
    }

    fn abort_sink(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.abort();
        }
    }

    fn release(&mut self) {
        self.source.close();
        self.compositor = None;
        self.resampler = None;
    }
}

/// Burn `cues` into the video at `input`, writing the result to `output`.
///
/// The container is chosen from `output`'s extension.
///
/// # Errors
///
/// Any [`BurnError`] from the job's transitions.
///
/// # Example
///
/// ```no_run
/// use subburn::{BurnOptions, SubtitleStyle, burn_subtitles, parse_srt};
///
/// let cues = parse_srt(&std::fs::read_to_string("captions.srt")?)?;
/// let artifact = burn_subtitles(
///     "input.mp4",
///     "output.mp4",
///     cues,
///     SubtitleStyle::default(),
///     BurnOptions::default(),
/// )?;
/// println!("wrote {} frames", artifact.frame_count);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn burn_subtitles<P, Q>(
    input: P,
    output: Q,
    cues: Vec<Cue>,
    style: SubtitleStyle,
    options: BurnOptions,
) -> Result<EncodedArtifact, BurnError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let mut job = BurnJob::new(
        MediaSource::new(input),
        FileEncoderFactory::new(output),
        cues,
        style,
        options,
    );
    job.run()
}
