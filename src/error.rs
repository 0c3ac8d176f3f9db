//! Error types for the `subburn` crate.
//!
//! This module defines [`BurnError`], the unified error type returned by all
//! fallible operations in the crate. Each variant renders as a single
//! human-readable sentence, which is what callers surface to users when a
//! burn job fails.

use std::{io::Error as IoError, path::PathBuf};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;

use crate::pipeline::BurnState;

/// The unified error type for all `subburn` operations.
///
/// Every public method that can fail returns `Result<T, BurnError>`.
/// Variants carry enough context to diagnose the problem without needing
/// additional logging at the call site.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BurnError {
    /// The source media could not be opened or has no usable dimensions.
    #[error("Failed to load media metadata from {path}: {reason}")]
    MetadataError {
        /// Path of the source that was being opened.
        path: PathBuf,
        /// Underlying reason the metadata could not be read.
        reason: String,
    },

    /// Decoding failed part-way through the source.
    #[error("Playback failed while decoding source: {0}")]
    PlaybackError(String),

    /// None of the preferred output codecs could be opened.
    #[error("No supported output codec available: {0}")]
    EncoderUnavailable(String),

    /// A frame could not be encoded.
    #[error("Video encoding error: {0}")]
    VideoEncodeError(String),

    /// The output container could not be written.
    #[error("Video write error: {0}")]
    VideoWriteError(String),

    /// A font could not be found or parsed.
    #[error("Font error: {0}")]
    FontError(String),

    /// A style value (colour, effect, dimension) is not valid.
    #[error("Invalid style: {0}")]
    InvalidStyle(String),

    /// A timed-text document could not be parsed.
    #[error("Failed to parse subtitles at line {line}: {reason}")]
    SubtitleParseError {
        /// 1-based line number where parsing failed.
        line: usize,
        /// What was wrong with the input.
        reason: String,
    },

    /// The media file does not contain a text subtitle stream.
    #[error("No subtitle stream found in file")]
    NoSubtitleStream,

    /// An embedded subtitle stream could not be decoded.
    #[error("Failed to decode subtitle: {0}")]
    SubtitleDecodeError(String),

    /// A burn job transition was requested from a state that does not allow it.
    #[error("Cannot {operation} while burn job is {state:?}")]
    InvalidState {
        /// The transition that was requested.
        operation: &'static str,
        /// The state the job was in.
        state: BurnState,
    },

    /// The operation was cancelled via a [`CancellationToken`](crate::CancellationToken).
    #[error("Operation cancelled")]
    Cancelled,

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),
}

impl From<FfmpegError> for BurnError {
    fn from(error: FfmpegError) -> Self {
        BurnError::FfmpegError(error.to_string())
    }
}
