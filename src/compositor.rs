//! Per-frame compositing of the active cue onto a decoded frame.
//!
//! [`composite_frame`] is the stateless form: copy the frame, resolve the
//! active cue, paint it, and compute the progress percentage. [`Compositor`]
//! does the same but keeps the rendered overlay of the current cue between
//! frames, since a cue usually stays on screen for dozens of frames.

use std::fmt::{Debug, Formatter, Result as FmtResult};

use image::{RgbaImage, imageops, imageops::FilterType};

use crate::cue::{Cue, find_active_cue};
use crate::font::{GlyphRasterizer, SharedRasterizer};
use crate::paint::{OverlayLayer, blend_layer, render_cue_layer};
use crate::style::{OverlayGeometry, SubtitleStyle};

/// Percentage of `total_duration` reached at `query_time`, rounded and
/// clamped to `0..=100`.
///
/// A zero or negative duration counts as complete.
pub fn progress_percent(query_time: f64, total_duration: f64) -> u8 {
    if !(total_duration > 0.0) {
        return 100;
    }
    let percent = (query_time / total_duration * 100.0).round();
    if percent.is_nan() {
        return 0;
    }
    percent.clamp(0.0, 100.0) as u8
}

/// Draw `source` onto a fresh `width` x `height` surface, scaling it to fill
/// when sizes differ.
fn draw_frame(source: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    if source.dimensions() == (width, height) {
        source.clone()
    } else {
        imageops::resize(source, width, height, FilterType::Triangle)
    }
}

/// Composite the cue active at `query_time` onto `source`.
///
/// The output has the same dimensions as `source`. Returns the painted
/// surface and the progress percentage for `query_time`.
pub fn composite_frame<R>(
    source: &RgbaImage,
    query_time: f64,
    cues: &[Cue],
    style: &SubtitleStyle,
    total_duration: f64,
    rasterizer: &R,
) -> (RgbaImage, u8)
where
    R: GlyphRasterizer + ?Sized,
{
    let (width, height) = source.dimensions();
    let mut surface = draw_frame(source, width, height);

    if let Some(cue) = find_active_cue(cues, query_time) {
        let geometry = OverlayGeometry::for_frame(width, height, style);
        if let Some(layer) = render_cue_layer(&cue.text, style, &geometry, rasterizer) {
            blend_layer(&mut surface, &layer, style.opacity);
        }
    }

    (surface, progress_percent(query_time, total_duration))
}

/// Stateful compositor for a fixed output size and style.
///
/// Without a rasterizer no text is painted and frames pass through
/// unchanged; a job with no cues never needs a font.
pub struct Compositor {
    style: SubtitleStyle,
    geometry: OverlayGeometry,
    width: u32,
    height: u32,
    rasterizer: Option<SharedRasterizer>,
    /// Text of the last cue painted and its rendered layer.
    cached: Option<(String, Option<OverlayLayer>)>,
}

impl Debug for Compositor {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Compositor")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("style", &self.style)
            .field("has_rasterizer", &self.rasterizer.is_some())
            .finish_non_exhaustive()
    }
}

impl Compositor {
    /// Create a compositor producing `width` x `height` surfaces.
    pub fn new(
        width: u32,
        height: u32,
        style: SubtitleStyle,
        rasterizer: Option<SharedRasterizer>,
    ) -> Self {
        let geometry = OverlayGeometry::for_frame(width, height, &style);
        Self {
            style,
            geometry,
            width,
            height,
            rasterizer,
            cached: None,
        }
    }

    /// Output surface dimensions.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Geometry derived for the output size.
    pub fn geometry(&self) -> &OverlayGeometry {
        &self.geometry
    }

    /// Composite one frame. Same output as [`composite_frame`].
    pub fn composite(
        &mut self,
        source: &RgbaImage,
        query_time: f64,
        cues: &[Cue],
        total_duration: f64,
    ) -> (RgbaImage, u8) {
        let mut surface = draw_frame(source, self.width, self.height);

        let active = find_active_cue(cues, query_time);
        if let (Some(cue), Some(rasterizer)) = (active, self.rasterizer.as_deref()) {
            let stale = self
                .cached
                .as_ref()
                .is_none_or(|(text, _)| text != &cue.text);
            if stale {
                let layer = render_cue_layer(&cue.text, &self.style, &self.geometry, rasterizer);
                self.cached = Some((cue.text.clone(), layer));
            }
            if let Some((_, Some(layer))) = &self.cached {
                blend_layer(&mut surface, layer, self.style.opacity);
            }
        }

        (surface, progress_percent(query_time, total_duration))
    }
}
