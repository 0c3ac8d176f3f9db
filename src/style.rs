//! Subtitle style record and per-frame geometry.
//!
//! [`SubtitleStyle`] is the immutable snapshot of how cues are rendered for
//! one burn job. [`OverlayGeometry`] derives the pixel-space layout values
//! for a given output resolution.
//!
//! Styles deserialize from camelCase JSON, so a style file looks like:
//!
//! ```json
//! {
//!   "fontSizePx": 28,
//!   "color": "#ffffff",
//!   "backgroundColor": "rgba(0, 0, 0, 0.5)",
//!   "fontFamily": "sans-serif",
//!   "effect": "outline",
//!   "positionPercent": 10,
//!   "opacity": 1
//! }
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};

use crate::error::BurnError;

/// Preview height the style's pixel sizes are authored against.
pub const REFERENCE_HEIGHT: f32 = 600.0;

/// Fraction of the output width text may occupy before wrapping.
pub const MAX_TEXT_WIDTH_RATIO: f32 = 0.8;

/// Line height as a multiple of the effective font size.
pub const LINE_HEIGHT_RATIO: f32 = 1.25;

/// A colour, or the `transparent` sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Paint {
    /// Nothing is painted.
    Transparent,
    /// Straight (non-premultiplied) RGBA.
    Rgba([u8; 4]),
}

impl Paint {
    /// Opaque white.
    pub const WHITE: Paint = Paint::Rgba([255, 255, 255, 255]);
    /// Opaque black.
    pub const BLACK: Paint = Paint::Rgba([0, 0, 0, 255]);

    /// Parse a CSS-style colour.
    ///
    /// Accepts `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa`, `rgb(r, g, b)`,
    /// `rgba(r, g, b, a)` with `a` in `0..=1`, a handful of named colours,
    /// and `transparent`.
    ///
    /// # Errors
    ///
    /// Returns [`BurnError::InvalidStyle`] for anything else.
    pub fn parse(value: &str) -> Result<Self, BurnError> {
        let value = value.trim().to_ascii_lowercase();
        let invalid = || BurnError::InvalidStyle(format!("unrecognised colour {value:?}"));

        if value == "transparent" {
            return Ok(Paint::Transparent);
        }
        if let Some(hex) = value.strip_prefix('#') {
            return parse_hex(hex).map(Paint::Rgba).ok_or_else(invalid);
        }
        if let Some(args) = value
            .strip_prefix("rgba(")
            .or_else(|| value.strip_prefix("rgb("))
            .and_then(|rest| rest.strip_suffix(')'))
        {
            return parse_rgb_function(args).map(Paint::Rgba).ok_or_else(invalid);
        }

        let rgb = match value.as_str() {
            "white" => [255, 255, 255],
            "black" => [0, 0, 0],
            "red" => [255, 0, 0],
            "green" => [0, 128, 0],
            "lime" => [0, 255, 0],
            "blue" => [0, 0, 255],
            "yellow" => [255, 255, 0],
            "cyan" | "aqua" => [0, 255, 255],
            "magenta" | "fuchsia" => [255, 0, 255],
            "orange" => [255, 165, 0],
            "gray" | "grey" => [128, 128, 128],
            _ => return Err(invalid()),
        };
        Ok(Paint::Rgba([rgb[0], rgb[1], rgb[2], 255]))
    }

    /// The RGBA value, or `None` for [`Paint::Transparent`].
    pub fn rgba(self) -> Option<[u8; 4]> {
        match self {
            Paint::Transparent => None,
            Paint::Rgba(rgba) => Some(rgba),
        }
    }

    /// `true` for the `transparent` sentinel.
    pub fn is_transparent(self) -> bool {
        matches!(self, Paint::Transparent)
    }
}

fn parse_hex(hex: &str) -> Option<[u8; 4]> {
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let nibble = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|v| v * 17);
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    match hex.len() {
        3 => Some([nibble(0)?, nibble(1)?, nibble(2)?, 255]),
        4 => Some([nibble(0)?, nibble(1)?, nibble(2)?, nibble(3)?]),
        6 => Some([byte(0)?, byte(2)?, byte(4)?, 255]),
        8 => Some([byte(0)?, byte(2)?, byte(4)?, byte(6)?]),
        _ => None,
    }
}

fn parse_rgb_function(args: &str) -> Option<[u8; 4]> {
    let parts: Vec<&str> = args.split(',').map(str::trim).collect();
    let channel = |s: &str| s.parse::<f32>().ok().map(|v| v.clamp(0.0, 255.0).round() as u8);
    match parts.as_slice() {
        [r, g, b] => Some([channel(r)?, channel(g)?, channel(b)?, 255]),
        [r, g, b, a] => {
            let alpha = a.parse::<f32>().ok()?.clamp(0.0, 1.0);
            Some([channel(r)?, channel(g)?, channel(b)?, (alpha * 255.0).round() as u8])
        }
        _ => None,
    }
}

impl Display for Paint {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Paint::Transparent => write!(f, "transparent"),
            Paint::Rgba([r, g, b, 255]) => write!(f, "#{r:02x}{g:02x}{b:02x}"),
            Paint::Rgba([r, g, b, a]) => write!(f, "#{r:02x}{g:02x}{b:02x}{a:02x}"),
        }
    }
}

impl TryFrom<String> for Paint {
    type Error = BurnError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Paint::parse(&value)
    }
}

impl From<Paint> for String {
    fn from(paint: Paint) -> Self {
        paint.to_string()
    }
}

/// Text treatment applied behind the fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Effect {
    /// Plain fill.
    None,
    /// Offset, blurred dark shadow.
    DropShadow,
    /// Solid stroke with rounded joins.
    #[default]
    Outline,
    /// Blurred dark halo centred on the glyphs.
    Glow,
}

impl Effect {
    /// Pick an effect from a free-form descriptor.
    ///
    /// Matching is case-insensitive by substring, checked in the order
    /// glow, shadow, outline/stroke. Anything else is [`Effect::None`].
    pub fn from_descriptor(descriptor: &str) -> Self {
        let descriptor = descriptor.to_ascii_lowercase();
        if descriptor.contains("glow") {
            Effect::Glow
        } else if descriptor.contains("shadow") {
            Effect::DropShadow
        } else if descriptor.contains("outline") || descriptor.contains("stroke") {
            Effect::Outline
        } else {
            Effect::None
        }
    }
}

impl Display for Effect {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Effect::None => write!(f, "none"),
            Effect::DropShadow => write!(f, "drop-shadow"),
            Effect::Outline => write!(f, "outline"),
            Effect::Glow => write!(f, "glow"),
        }
    }
}

impl From<String> for Effect {
    fn from(descriptor: String) -> Self {
        Effect::from_descriptor(&descriptor)
    }
}

impl From<Effect> for String {
    fn from(effect: Effect) -> Self {
        effect.to_string()
    }
}

/// How cues are drawn onto frames.
///
/// Captured once per burn job and never re-read mid-job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubtitleStyle {
    /// Font size in pixels at the 600 px reference height.
    pub font_size_px: f32,
    /// Text fill colour.
    pub color: Paint,
    /// Box colour behind the text, or `transparent` for no box.
    pub background_color: Paint,
    /// Font family name used to look up a system font.
    pub font_family: String,
    /// Effect painted behind the fill.
    pub effect: Effect,
    /// Distance of the text baseline from the bottom edge, 0–100.
    pub position_percent: f32,
    /// Overall overlay opacity, 0–1.
    pub opacity: f32,
}

impl Default for SubtitleStyle {
    fn default() -> Self {
        Self {
            font_size_px: 24.0,
            color: Paint::WHITE,
            background_color: Paint::Rgba([0, 0, 0, 128]),
            font_family: "sans-serif".to_string(),
            effect: Effect::Outline,
            position_percent: 10.0,
            opacity: 1.0,
        }
    }
}

impl SubtitleStyle {
    /// Load a style from JSON. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`BurnError::InvalidStyle`] if the JSON is malformed or a
    /// colour cannot be parsed.
    pub fn from_json(json: &str) -> Result<Self, BurnError> {
        let style: SubtitleStyle = serde_json::from_str(json)
            .map_err(|e| BurnError::InvalidStyle(e.to_string()))?;
        style.validate()?;
        Ok(style)
    }

    /// Check numeric fields are in range.
    ///
    /// # Errors
    ///
    /// Returns [`BurnError::InvalidStyle`] naming the offending field.
    pub fn validate(&self) -> Result<(), BurnError> {
        if !(self.font_size_px.is_finite() && self.font_size_px > 0.0) {
            return Err(BurnError::InvalidStyle(format!(
                "fontSizePx must be positive, got {}",
                self.font_size_px
            )));
        }
        if !(0.0..=100.0).contains(&self.position_percent) {
            return Err(BurnError::InvalidStyle(format!(
                "positionPercent must be within 0-100, got {}",
                self.position_percent
            )));
        }
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(BurnError::InvalidStyle(format!(
                "opacity must be within 0-1, got {}",
                self.opacity
            )));
        }
        Ok(())
    }
}

/// Pixel-space layout values for one output resolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayGeometry {
    /// Output height divided by [`REFERENCE_HEIGHT`].
    pub scale: f32,
    /// Style font size multiplied by `scale`.
    pub font_size: f32,
    /// Horizontal centre of the text.
    pub anchor_x: f32,
    /// Baseline of the last text line.
    pub anchor_y: f32,
    /// Maximum line width before wrapping.
    pub max_text_width: f32,
    /// Distance between consecutive baselines.
    pub line_height: f32,
}

impl OverlayGeometry {
    /// Derive geometry for a `width` x `height` surface.
    pub fn for_frame(width: u32, height: u32, style: &SubtitleStyle) -> Self {
        let width = width as f32;
        let height = height as f32;
        let scale = height / REFERENCE_HEIGHT;
        let font_size = style.font_size_px * scale;
        Self {
            scale,
            font_size,
            anchor_x: width / 2.0,
            anchor_y: height * (1.0 - style.position_percent / 100.0),
            max_text_width: width * MAX_TEXT_WIDTH_RATIO,
            line_height: font_size * LINE_HEIGHT_RATIO,
        }
    }
}
