//! Text layout: wrapping, box geometry, and paint order.
//!
//! Layout is independent of any particular font backend; widths come from a
//! [`TextMeasure`] implementation (normally [`FontRasterizer`](crate::FontRasterizer)).
//!
//! # Example
//!
//! ```
//! use subburn::wrap;
//!
//! // One unit per character.
//! let lines = wrap("a b c d", 3.5, |s: &str| s.chars().count() as f32);
//! assert_eq!(lines, vec!["a b", "c d"]);
//! ```

use crate::style::{Effect, OverlayGeometry, Paint};

/// Horizontal box padding per side, as a fraction of the font size.
pub const BOX_PADDING_X: f32 = 0.6;
/// Vertical box padding per side, as a fraction of the font size.
pub const BOX_PADDING_Y: f32 = 0.3;
/// Descent allowance below the last baseline, as a fraction of the font size.
pub const BOX_DESCENT: f32 = 0.2;

/// Something that can report the advance width of a run of text.
pub trait TextMeasure {
    /// Width in pixels of `text` set at `font_size` pixels.
    fn measure(&self, text: &str, font_size: f32) -> f32;
}

/// Wrap `text` into lines no wider than `max_width`.
///
/// Explicit `\n` breaks always start a new line, and every paragraph yields
/// at least one line, so blank lines in the input survive as empty strings.
/// Within a paragraph words are packed greedily; a line is flushed as soon as
/// appending the next word would make it wider than `max_width`. A single
/// word wider than `max_width` is emitted on its own line unbroken.
pub fn wrap<F>(text: &str, max_width: f32, measure: F) -> Vec<String>
where
    F: Fn(&str) -> f32,
{
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            if line.is_empty() {
                line.push_str(word);
                continue;
            }

            let candidate = format!("{line} {word}");
            if measure(&candidate) > max_width {
                lines.push(std::mem::replace(&mut line, word.to_string()));
            } else {
                line = candidate;
            }
        }
        lines.push(line);
    }

    lines
}

/// Background box around a block of wrapped lines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxGeometry {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub top: f32,
    /// Total width including padding.
    pub width: f32,
    /// Total height including padding.
    pub height: f32,
}

impl BoxGeometry {
    /// Bottom edge.
    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }
}

/// Compute the background box for `lines`.
///
/// The box is as wide as the widest line plus horizontal padding, as tall as
/// the lines plus vertical padding, centred on the anchor, with its bottom
/// edge a small descent allowance below the anchor baseline.
pub fn compute_box_geometry<F>(lines: &[String], geometry: &OverlayGeometry, measure: F) -> BoxGeometry
where
    F: Fn(&str) -> f32,
{
    let widest = lines
        .iter()
        .map(|line| measure(line))
        .fold(0.0_f32, f32::max);

    let font_size = geometry.font_size;
    let width = widest + 2.0 * font_size * BOX_PADDING_X;
    let height = lines.len() as f32 * geometry.line_height + 2.0 * font_size * BOX_PADDING_Y;
    let bottom = geometry.anchor_y + font_size * BOX_DESCENT;

    BoxGeometry {
        x: geometry.anchor_x - width / 2.0,
        top: bottom - height,
        width,
        height,
    }
}

/// Baseline y for each of `line_count` lines, in paint order.
///
/// The last line sits on the anchor baseline and each earlier line is one
/// line height above the next.
pub fn line_baselines(line_count: usize, geometry: &OverlayGeometry) -> Vec<f32> {
    (0..line_count)
        .map(|i| geometry.anchor_y - (line_count - 1 - i) as f32 * geometry.line_height)
        .collect()
}

/// Colour used for shadows, glows and outlines.
pub const EFFECT_COLOR: Paint = Paint::Rgba([0, 0, 0, 204]);

/// Concrete parameters for painting an [`Effect`] at a given scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EffectParams {
    /// Fill only.
    Plain,
    /// A blurred copy of the glyphs drawn behind the fill.
    Shadow {
        /// Shadow colour.
        color: Paint,
        /// Gaussian blur sigma in pixels.
        blur_radius: f32,
        /// Horizontal offset in pixels.
        offset_x: f32,
        /// Vertical offset in pixels.
        offset_y: f32,
    },
    /// A solid stroke around the glyphs, drawn before the fill.
    Stroke {
        /// Stroke colour.
        color: Paint,
        /// Stroke width in pixels (half lies outside the glyph edge).
        width: f32,
    },
}

impl EffectParams {
    /// Resolve `effect` with magnitudes multiplied by `scale`.
    pub fn for_effect(effect: Effect, scale: f32) -> Self {
        match effect {
            Effect::Glow => EffectParams::Shadow {
                color: EFFECT_COLOR,
                blur_radius: 10.0 * scale,
                offset_x: 0.0,
                offset_y: 0.0,
            },
            Effect::DropShadow => EffectParams::Shadow {
                color: EFFECT_COLOR,
                blur_radius: 4.0 * scale,
                offset_x: 2.0 * scale,
                offset_y: 2.0 * scale,
            },
            Effect::Outline => EffectParams::Stroke {
                color: Paint::BLACK,
                width: 4.0 * scale,
            },
            Effect::None => EffectParams::Plain,
        }
    }
}
