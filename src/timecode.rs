//! Conversion between textual timestamps and seconds.
//!
//! Cue times are carried as `f64` seconds throughout the crate. This module
//! converts them to and from the `HH:MM:SS,mmm` representation used by SubRip
//! files (and the `HH:MM:SS.mmm` variant used by WebVTT).
//!
//! # Example
//!
//! ```
//! use subburn::{format_timecode, parse_timecode};
//!
//! assert_eq!(parse_timecode("00:01:15,500"), 75.5);
//! assert_eq!(format_timecode(75.5), "00:01:15,500");
//! ```

/// Parse a timestamp into seconds.
///
/// Accepted forms:
///
/// - `HH:MM:SS,mmm` and `HH:MM:SS.mmm`
/// - `MM:SS.mmm` (and `MM:SS`)
/// - a bare number of seconds such as `75` or `75.5`
///
/// The fractional part is a decimal fraction of a second, so `.5` and `.500`
/// both mean half a second. A missing fraction counts as zero.
///
/// Never fails: empty, malformed, or negative input yields `0.0`.
pub fn parse_timecode(text: &str) -> f64 {
    parse_fields(text.trim()).unwrap_or(0.0)
}

fn parse_fields(text: &str) -> Option<f64> {
    if text.is_empty() {
        return None;
    }

    let normalized = text.replace(',', ".");
    let fields: Vec<&str> = normalized.split(':').collect();

    let (hours, minutes, seconds) = match fields.as_slice() {
        [h, m, s] => (parse_whole(h)?, parse_whole(m)?, parse_seconds(s)?),
        [m, s] => (0, parse_whole(m)?, parse_seconds(s)?),
        [s] => (0, 0, parse_seconds(s)?),
        _ => return None,
    };

    Some(hours as f64 * 3600.0 + minutes as f64 * 60.0 + seconds)
}

fn parse_whole(field: &str) -> Option<u64> {
    let field = field.trim();
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse().ok()
}

fn parse_seconds(field: &str) -> Option<f64> {
    let field = field.trim();
    let (whole, fraction) = match field.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (field, ""),
    };

    let whole = parse_whole(whole)? as f64;
    if fraction.is_empty() {
        return Some(whole);
    }
    if !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let digits = fraction.len().min(9);
    let value: u64 = fraction[..digits].parse().ok()?;
    Some(whole + value as f64 / 10f64.powi(digits as i32))
}

/// Format seconds as a SubRip timestamp (`HH:MM:SS,mmm`).
///
/// Hours are not wrapped at 24. Negative and non-finite input formats as
/// zero. The value is rounded to the nearest millisecond first, so
/// `parse_timecode(&format_timecode(x))` recovers `x` within 1 ms.
pub fn format_timecode(seconds: f64) -> String {
    format_with_separator(seconds, ',')
}

/// Format seconds as a WebVTT timestamp (`HH:MM:SS.mmm`).
pub fn format_vtt_timecode(seconds: f64) -> String {
    format_with_separator(seconds, '.')
}

fn format_with_separator(seconds: f64, separator: char) -> String {
    let total_millis = if seconds.is_finite() && seconds > 0.0 {
        (seconds * 1000.0).round() as u64
    } else {
        0
    };

    let hours = total_millis / 3_600_000;
    let minutes = (total_millis % 3_600_000) / 60_000;
    let secs = (total_millis % 60_000) / 1000;
    let millis = total_millis % 1000;
    format!("{hours:02}:{minutes:02}:{secs:02}{separator}{millis:03}")
}
