//! Burn configuration.
//!
//! [`BurnOptions`] is a builder that threads progress callbacks, cancellation
//! tokens, encoder settings and font selection into a
//! [`BurnJob`](crate::BurnJob) without polluting every signature.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use subburn::{
//!     BurnOptions, CancellationToken, EncoderOptions, ProgressCallback, ProgressInfo,
//! };
//!
//! struct LogProgress;
//! impl ProgressCallback for LogProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         println!("{}% ({} frames)", info.percent, info.current);
//!     }
//! }
//!
//! let token = CancellationToken::new();
//! let options = BurnOptions::new()
//!     .with_progress(Arc::new(LogProgress))
//!     .with_cancellation(token.clone())
//!     .with_encoder(EncoderOptions::default().with_fps(25))
//!     .with_batch_size(10);
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::path::PathBuf;
use std::sync::Arc;

use crate::encode::EncoderOptions;
use crate::error::BurnError;
use crate::font::{FontRasterizer, SharedRasterizer};
use crate::progress::{CancellationToken, NoOpProgress, ProgressCallback};
use crate::style::SubtitleStyle;

/// Where the font used to draw cue text comes from.
#[derive(Clone, Default)]
pub enum FontSource {
    /// Look up the style's `font_family` list among the system fonts.
    #[default]
    Family,
    /// Load a font file.
    Path(PathBuf),
    /// Use a rasterizer the caller already built.
    Rasterizer(SharedRasterizer),
}

impl Debug for FontSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            FontSource::Family => f.write_str("Family"),
            FontSource::Path(path) => f.debug_tuple("Path").field(path).finish(),
            FontSource::Rasterizer(_) => f.write_str("Rasterizer(..)"),
        }
    }
}

impl FontSource {
    /// Produce a rasterizer for `style`.
    ///
    /// # Errors
    ///
    /// Returns [`BurnError::FontError`] or [`BurnError::IoError`] if the font
    /// cannot be found or loaded.
    pub fn resolve(&self, style: &SubtitleStyle) -> Result<SharedRasterizer, BurnError> {
        match self {
            FontSource::Family => Ok(Arc::new(FontRasterizer::from_family(&style.font_family)?)),
            FontSource::Path(path) => Ok(Arc::new(FontRasterizer::from_path(path)?)),
            FontSource::Rasterizer(rasterizer) => Ok(Arc::clone(rasterizer)),
        }
    }
}

/// Configuration for a burn job.
///
/// All fields have sensible defaults: no progress callback, no cancellation,
/// a report after every frame, default encoder settings and the style's
/// font family.
#[derive(Clone)]
pub struct BurnOptions {
    pub(crate) progress: Arc<dyn ProgressCallback>,
    pub(crate) cancellation: Option<CancellationToken>,
    pub(crate) batch_size: u64,
    pub(crate) encoder: EncoderOptions,
    pub(crate) font: FontSource,
}

impl Debug for BurnOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("BurnOptions")
            .field("has_progress", &true)
            .field("has_cancellation", &self.cancellation.is_some())
            .field("batch_size", &self.batch_size)
            .field("encoder", &self.encoder)
            .field("font", &self.font)
            .finish()
    }
}

impl Default for BurnOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl BurnOptions {
    /// Create options with default settings.
    pub fn new() -> Self {
        Self {
            progress: Arc::new(NoOpProgress),
            cancellation: None,
            batch_size: 1,
            encoder: EncoderOptions::default(),
            font: FontSource::default(),
        }
    }

    /// Attach a progress callback.
    ///
    /// The callback is invoked every [`batch_size`](BurnOptions::with_batch_size)
    /// frames and once more at completion.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Attach a cancellation token.
    ///
    /// When the token is cancelled, the job stops before its next frame and
    /// returns [`BurnError::Cancelled`].
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Set how often the progress callback fires.
    ///
    /// A value of 1 means every frame; 10 means every 10th frame.
    /// Clamped to a minimum of 1.
    #[must_use]
    pub fn with_batch_size(mut self, size: u64) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Set encoder settings.
    #[must_use]
    pub fn with_encoder(mut self, encoder: EncoderOptions) -> Self {
        self.encoder = encoder;
        self
    }

    /// Choose the font used for cue text.
    #[must_use]
    pub fn with_font(mut self, font: FontSource) -> Self {
        self.font = font;
        self
    }

    /// Encoder settings in effect.
    pub fn encoder(&self) -> &EncoderOptions {
        &self.encoder
    }

    /// Font selection in effect.
    pub fn font(&self) -> &FontSource {
        &self.font
    }

    /// Progress batch size in effect.
    pub fn batch_size(&self) -> u64 {
        self.batch_size
    }

    /// Returns `true` if cancellation has been requested.
    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(|token| token.is_cancelled())
    }
}
