//! SubRip and WebVTT reading and writing.
//!
//! Converts between the line-oriented timed-text block format and an
//! in-memory [`Cue`] list:
//!
//! ```text
//! 1
//! 00:00:01,000 --> 00:00:04,000
//! First line
//! Second line
//! ```
//!
//! [`parse_srt`] also accepts WebVTT documents: the `WEBVTT` header and
//! `NOTE`/`STYLE`/`REGION` blocks are skipped and cue settings after the end
//! timestamp are ignored.
//!
//! # Example
//!
//! ```
//! use subburn::{format_srt, parse_srt};
//!
//! let cues = parse_srt("1\n00:00:01,000 --> 00:00:02,500\nHi\n").unwrap();
//! assert_eq!(cues[0].end_time, 2.5);
//! assert!(format_srt(&cues).contains("00:00:01,000 --> 00:00:02,500"));
//! ```

use crate::cue::Cue;
use crate::error::BurnError;
use crate::timecode::{format_timecode, format_vtt_timecode, parse_timecode};

/// Parse a SubRip (or WebVTT) document into cues.
///
/// Blocks are separated by blank lines. The optional line before the
/// `start --> end` line becomes the cue id; blocks without one are numbered
/// by position (1-based). Cue order is preserved.
///
/// # Errors
///
/// Returns [`BurnError::SubtitleParseError`] if a block has no timing line.
pub fn parse_srt(text: &str) -> Result<Vec<Cue>, BurnError> {
    let normalized = text.trim_start_matches('\u{feff}').replace("\r\n", "\n").replace('\r', "\n");

    let mut cues = Vec::new();
    let mut block: Vec<(usize, &str)> = Vec::new();

    for (index, line) in normalized.lines().enumerate() {
        if line.trim().is_empty() {
            if !block.is_empty() {
                if let Some(cue) = parse_block(&block, cues.len() + 1)? {
                    cues.push(cue);
                }
                block.clear();
            }
        } else {
            block.push((index + 1, line));
        }
    }
    if !block.is_empty() {
        if let Some(cue) = parse_block(&block, cues.len() + 1)? {
            cues.push(cue);
        }
    }

    log::debug!("Parsed {} cues", cues.len());
    Ok(cues)
}

fn parse_block(block: &[(usize, &str)], ordinal: usize) -> Result<Option<Cue>, BurnError> {
    let (first_line, first) = block[0];
    let first = first.trim();
    if first.starts_with("WEBVTT")
        || first.starts_with("NOTE")
        || first.starts_with("STYLE")
        || first.starts_with("REGION")
    {
        return Ok(None);
    }

    let timing_index = block
        .iter()
        .position(|(_, line)| line.contains("-->"))
        .ok_or_else(|| BurnError::SubtitleParseError {
            line: first_line,
            reason: format!("expected a `start --> end` line, found {first:?}"),
        })?;

    let id = if timing_index > 0 {
        block[0].1.trim().to_string()
    } else {
        ordinal.to_string()
    };

    let (_, timing) = block[timing_index];
    let (start, end) = timing.split_once("-->").unwrap_or((timing, ""));
    let end = end.split_whitespace().next().unwrap_or("");

    let text = block[timing_index + 1..]
        .iter()
        .map(|(_, line)| *line)
        .collect::<Vec<_>>()
        .join("\n");

    Ok(Some(Cue {
        id,
        start_time: parse_timecode(start),
        end_time: parse_timecode(end),
        text,
    }))
}

/// Format cues as a SubRip document.
///
/// Cues are numbered by position; their ids are not written.
pub fn format_srt(cues: &[Cue]) -> String {
    let mut output = String::new();
    for (i, cue) in cues.iter().enumerate() {
        output.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            i + 1,
            format_timecode(cue.start_time),
            format_timecode(cue.end_time),
            cue.text,
        ));
    }
    output
}

/// Format cues as a WebVTT document.
pub fn format_vtt(cues: &[Cue]) -> String {
    let mut output = String::from("WEBVTT\n\n");
    for (i, cue) in cues.iter().enumerate() {
        output.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            i + 1,
            format_vtt_timecode(cue.start_time),
            format_vtt_timecode(cue.end_time),
            cue.text,
        ));
    }
    output
}
