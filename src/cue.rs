//! Timed text cues and active-cue resolution.
//!
//! A [`Cue`] is one subtitle entry with inclusive start and end times in
//! seconds. [`find_active_cue`] picks the cue to display at a given time.
//!
//! # Example
//!
//! ```
//! use subburn::{Cue, find_active_cue};
//!
//! let cues = vec![
//!     Cue::new("1", 0.0, 2.0, "Hello"),
//!     Cue::new("2", 2.5, 4.0, "World"),
//! ];
//! assert_eq!(find_active_cue(&cues, 3.0).map(|c| c.text.as_str()), Some("World"));
//! assert!(find_active_cue(&cues, 2.2).is_none());
//! ```

use serde::{Deserialize, Serialize};

/// A single timed text entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cue {
    /// Opaque identifier, unique within a track by convention only.
    pub id: String,
    /// When the cue starts displaying, in seconds.
    pub start_time: f64,
    /// When the cue stops displaying, in seconds (inclusive).
    pub end_time: f64,
    /// Text to display. May contain `\n` line breaks.
    pub text: String,
}

impl Cue {
    /// Create a cue.
    pub fn new(id: impl Into<String>, start_time: f64, end_time: f64, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            start_time,
            end_time,
            text: text.into(),
        }
    }

    /// Whether `time` falls inside `[start_time, end_time]`.
    pub fn contains(&self, time: f64) -> bool {
        time >= self.start_time && time <= self.end_time
    }

    /// Display duration in seconds (zero for inverted cues).
    pub fn duration(&self) -> f64 {
        (self.end_time - self.start_time).max(0.0)
    }
}

/// Find the cue to display at `time`.
///
/// Scans `cues` in list order and returns the first cue whose inclusive
/// interval contains `time`. The list is not assumed to be sorted. When cues
/// overlap, the earliest one in the list wins even if a later one also
/// matches.
pub fn find_active_cue(cues: &[Cue], time: f64) -> Option<&Cue> {
    cues.iter().find(|cue| cue.contains(time))
}

/// A read-only snapshot of the cues for one burn job.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CueTrack {
    cues: Vec<Cue>,
}

impl CueTrack {
    /// Wrap a cue list. Order is preserved as given.
    pub fn new(cues: Vec<Cue>) -> Self {
        Self { cues }
    }

    /// The cue active at `time`, using [`find_active_cue`].
    pub fn active_at(&self, time: f64) -> Option<&Cue> {
        find_active_cue(&self.cues, time)
    }

    /// Latest end time across all cues, or `0.0` for an empty track.
    pub fn end_time(&self) -> f64 {
        self.cues.iter().map(|cue| cue.end_time).fold(0.0, f64::max)
    }

    /// Number of cues.
    pub fn len(&self) -> usize {
        self.cues.len()
    }

    /// `true` when the track holds no cues.
    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    /// The cues in list order.
    pub fn cues(&self) -> &[Cue] {
        &self.cues
    }
}

impl From<Vec<Cue>> for CueTrack {
    fn from(cues: Vec<Cue>) -> Self {
        Self::new(cues)
    }
}
