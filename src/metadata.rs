//! Source media metadata.
//!
//! [`SourceMetadata`] is read once when a burn job leaves `Idle` and fixes
//! the output dimensions and the duration progress is measured against.
//!
//! # Example
//!
//! ```no_run
//! use subburn::{FrameSource, MediaSource};
//!
//! let mut source = MediaSource::new("input.mp4");
//! let metadata = source.open()?;
//! println!("{}x{} for {:?}", metadata.width, metadata.height, metadata.duration);
//! # Ok::<(), subburn::BurnError>(())
//! ```

use std::time::Duration;

/// Intrinsic properties of a video source.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct SourceMetadata {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Total duration. Zero when the container does not report one.
    pub duration: Duration,
    /// Average frames per second (may be approximate for variable-frame-rate content).
    pub frames_per_second: f64,
    /// Codec name (e.g. `"h264"`, `"vp9"`).
    pub codec: String,
    /// Container format name (e.g. `"mov,mp4,m4a,3gp,3g2,mj2"`).
    pub format: String,
}

impl SourceMetadata {
    /// Duration in seconds.
    pub fn duration_seconds(&self) -> f64 {
        self.duration.as_secs_f64()
    }

    /// `true` when both dimensions are non-zero.
    pub fn has_dimensions(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}
