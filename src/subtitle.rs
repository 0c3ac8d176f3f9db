//! Embedded subtitle extraction.
//!
//! Text subtitle streams (SubRip, ASS/SSA, mov_text, WebVTT) carried inside a
//! media container can be decoded straight into a cue list and burned like
//! any external file.
//!
//! # Example
//!
//! ```no_run
//! use subburn::{extract_embedded_cues, format_srt};
//!
//! let cues = extract_embedded_cues("input.mkv")?;
//! std::fs::write("captions.srt", format_srt(&cues))?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::path::Path;
use std::time::Duration;

use ffmpeg_next::{Subtitle, codec::context::Context as CodecContext, media::Type, subtitle::Rect};

use crate::configuration::BurnOptions;
use crate::cue::Cue;
use crate::error::BurnError;
use crate::progress::{OperationType, ProgressTracker};
use crate::utilities::pts_to_seconds;

/// Decode the best text subtitle stream of `path` into cues.
///
/// Cues are sorted by start time and numbered from 1.
///
/// # Errors
///
/// - [`BurnError::MetadataError`] if the file cannot be opened.
/// - [`BurnError::NoSubtitleStream`] if it has no subtitle stream.
/// - [`BurnError::SubtitleDecodeError`] if decoding fails.
pub fn extract_embedded_cues<P: AsRef<Path>>(path: P) -> Result<Vec<Cue>, BurnError> {
    extract_embedded_cues_with_options(path, &BurnOptions::default())
}

/// Like [`extract_embedded_cues`], reporting progress and honouring
/// cancellation through `options`.
///
/// # Errors
///
/// As [`extract_embedded_cues`], plus [`BurnError::Cancelled`].
pub fn extract_embedded_cues_with_options<P: AsRef<Path>>(
    path: P,
    options: &BurnOptions,
) -> Result<Vec<Cue>, BurnError> {
    let path = path.as_ref();
    ffmpeg_next::init()?;

    let mut input = ffmpeg_next::format::input(&path).map_err(|e| BurnError::MetadataError {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let stream = input
        .streams()
        .best(Type::Subtitle)
        .ok_or(BurnError::NoSubtitleStream)?;
    let stream_index = stream.index();
    let time_base = stream.time_base();
    log::debug!("Extracting subtitles from stream {stream_index} of {}", path.display());

    let mut decoder = CodecContext::from_parameters(stream.parameters())
        .and_then(|context| context.decoder().subtitle())
        .map_err(|e| {
            BurnError::SubtitleDecodeError(format!("Failed to create subtitle decoder: {e}"))
        })?;

    let container_duration = input.duration();
    let duration = if container_duration > 0 {
        container_duration as f64 / 1_000_000.0
    } else {
        0.0
    };
    let mut tracker = ProgressTracker::new(
        options.progress.clone(),
        OperationType::SubtitleExtraction,
        None,
        options.batch_size,
    );

    let mut cues = Vec::new();
    let mut subtitle = Subtitle::new();

    for (stream, packet) in input.packets() {
        if options.is_cancelled() {
            return Err(BurnError::Cancelled);
        }
        if stream.index() != stream_index {
            continue;
        }

        let got_subtitle = decoder.decode(&packet, &mut subtitle).map_err(|e| {
            BurnError::SubtitleDecodeError(format!("Subtitle decode error: {e}"))
        })?;
        if !got_subtitle {
            continue;
        }

        // Subtitle pts is in microseconds; the display times are
        // millisecond offsets from it.
        let base = match subtitle.pts() {
            Some(pts) => pts.max(0) as f64 / 1_000_000.0,
            None => pts_to_seconds(packet.pts().unwrap_or(0).max(0), time_base),
        };
        let start_time = base + f64::from(subtitle.start()) / 1000.0;
        let mut end_time = base + f64::from(subtitle.end()) / 1000.0;
        if end_time <= start_time && packet.duration() > 0 {
            end_time = start_time + pts_to_seconds(packet.duration(), time_base);
        }

        let text = subtitle
            .rects()
            .filter_map(|rect| match rect {
                Rect::Text(text) => Some(text.get().trim().to_string()),
                Rect::Ass(ass) => Some(strip_ass_tags(ass.get())),
                _ => None,
            })
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        if !text.is_empty() {
            cues.push(Cue::new(String::new(), start_time, end_time, text));
            let percent = if duration > 0.0 {
                (start_time / duration * 100.0).round().clamp(0.0, 100.0) as u8
            } else {
                0
            };
            tracker.advance(percent, Duration::from_secs_f64(start_time), 0);
        }
    }

    cues.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));
    for (index, cue) in cues.iter_mut().enumerate() {
        cue.id = (index + 1).to_string();
    }
    tracker.finish(0);

    log::info!("Extracted {} cues from {}", cues.len(), path.display());
    Ok(cues)
}

/// Reduce an ASS event to plain text.
///
/// Accepts both a full `Dialogue:` line and the bare event fields FFmpeg
/// emits (`ReadOrder,Layer,Style,Name,MarginL,MarginR,MarginV,Effect,Text`).
/// Override blocks like `{\i1}` are removed and `\N` becomes a line break.
pub fn strip_ass_tags(input: &str) -> String {
    let input = input.trim();
    let text = if let Some(dialogue) = input.strip_prefix("Dialogue:") {
        after_nth_comma(dialogue, 9).unwrap_or(dialogue)
    } else if input.starts_with(|c: char| c.is_ascii_digit()) {
        after_nth_comma(input, 8).unwrap_or(input)
    } else {
        input
    };

    let mut result = String::with_capacity(text.len());
    let mut in_tag = false;
    for c in text.chars() {
        match c {
            '{' if !in_tag => in_tag = true,
            '}' if in_tag => in_tag = false,
            _ if !in_tag => result.push(c),
            _ => {}
        }
    }

    result
        .replace("\\N", "\n")
        .replace("\\n", "\n")
        .replace("\\h", " ")
        .trim()
        .to_string()
}

fn after_nth_comma(text: &str, n: usize) -> Option<&str> {
    text.match_indices(',')
        .nth(n.checked_sub(1)?)
        .map(|(index, _)| &text[index + 1..])
}
