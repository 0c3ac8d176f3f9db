//! Font loading and glyph rasterization.
//!
//! [`FontRasterizer`] wraps a [`fontdue::Font`] and implements both
//! [`TextMeasure`] (for layout) and [`GlyphRasterizer`] (for painting). Fonts
//! are loaded from a file or looked up by family name among the system fonts
//! with [`fontdb`].

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::path::Path;
use std::sync::Arc;

use fontdb::{Database as FontDatabase, Family, Query};
use fontdue::{Font, FontSettings};
use image::GrayImage;

use crate::error::BurnError;
use crate::layout::TextMeasure;

/// Coverage mask for one rendered line of text.
///
/// Pixel `(0, 0)` of the mask sits at `(pen_x + left, baseline - ascent)`,
/// where `pen_x` is where the line's advance starts.
#[derive(Debug, Clone, PartialEq)]
pub struct LineMask {
    /// Mask width in pixels.
    pub width: u32,
    /// Mask height in pixels.
    pub height: u32,
    /// Horizontal offset of the mask from the pen start.
    pub left: i32,
    /// Distance from the top of the mask to the baseline.
    pub ascent: i32,
    /// Row-major coverage, `width * height` bytes.
    pub coverage: Vec<u8>,
}

impl LineMask {
    /// An empty mask (for blank lines).
    pub fn empty() -> Self {
        Self {
            width: 0,
            height: 0,
            left: 0,
            ascent: 0,
            coverage: Vec::new(),
        }
    }

    /// Coverage at `(x, y)`, zero outside the mask.
    pub fn get(&self, x: i32, y: i32) -> u8 {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return 0;
        }
        self.coverage[y as usize * self.width as usize + x as usize]
    }

    /// Copy the coverage into a grayscale image.
    pub fn to_gray(&self) -> GrayImage {
        GrayImage::from_raw(self.width, self.height, self.coverage.clone())
            .unwrap_or_else(|| GrayImage::new(self.width, self.height))
    }
}

/// Something that can turn a line of text into a coverage mask.
pub trait GlyphRasterizer: TextMeasure {
    /// Render `text` at `font_size` pixels.
    fn rasterize_line(&self, text: &str, font_size: f32) -> LineMask;
}

/// A rasterizer that can be shared between jobs and threads.
pub type SharedRasterizer = Arc<dyn GlyphRasterizer + Send + Sync>;

/// A font ready for measuring and rasterizing.
pub struct FontRasterizer {
    font: Font,
    family: String,
}

impl Debug for FontRasterizer {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("FontRasterizer")
            .field("family", &self.family)
            .finish_non_exhaustive()
    }
}

impl FontRasterizer {
    /// Load a font from raw TrueType/OpenType bytes.
    ///
    /// # Errors
    ///
    /// Returns [`BurnError::FontError`] if the data cannot be parsed.
    pub fn from_bytes(data: &[u8], collection_index: u32) -> Result<Self, BurnError> {
        let settings = FontSettings {
            collection_index,
            ..FontSettings::default()
        };
        let font = Font::from_bytes(data, settings)
            .map_err(|e| BurnError::FontError(format!("cannot parse font: {e}")))?;
        let family = font.name().unwrap_or("unknown").to_string();
        Ok(Self { font, family })
    }

    /// Load a font file.
    ///
    /// # Errors
    ///
    /// Returns [`BurnError::IoError`] if the file cannot be read, or
    /// [`BurnError::FontError`] if it is not a font.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, BurnError> {
        let path = path.as_ref();
        log::debug!("Loading font from {}", path.display());
        let data = std::fs::read(path)?;
        Self::from_bytes(&data, 0)
    }

    /// Find a system font for a CSS-style family list such as
    /// `"Inter, Arial, sans-serif"`.
    ///
    /// Each entry is tried in order; the generic names `sans-serif`, `serif`
    /// and `monospace` map to their system defaults. If nothing matches the
    /// system sans-serif font is used.
    ///
    /// # Errors
    ///
    /// Returns [`BurnError::FontError`] if no usable font is installed.
    pub fn from_family(family_list: &str) -> Result<Self, BurnError> {
        let mut database = FontDatabase::new();
        database.load_system_fonts();

        let mut candidates: Vec<Family<'_>> = family_list
            .split(',')
            .map(|name| name.trim().trim_matches(|c| c == '"' || c == '\''))
            .filter(|name| !name.is_empty())
            .map(|name| match name.to_ascii_lowercase().as_str() {
                "sans-serif" => Family::SansSerif,
                "serif" => Family::Serif,
                "monospace" => Family::Monospace,
                "cursive" => Family::Cursive,
                "fantasy" => Family::Fantasy,
                _ => Family::Name(name),
            })
            .collect();
        candidates.push(Family::SansSerif);

        for family in &candidates {
            let query = Query {
                families: std::slice::from_ref(family),
                ..Query::default()
            };
            let Some(id) = database.query(&query) else {
                continue;
            };
            let loaded = database
                .with_face_data(id, |data, index| Self::from_bytes(data, index));
            match loaded {
                Some(Ok(rasterizer)) => {
                    log::debug!("Resolved font {family_list:?} to {}", rasterizer.family);
                    return Ok(rasterizer);
                }
                Some(Err(e)) => log::warn!("Skipping unreadable font for {family:?}: {e}"),
                None => {}
            }
        }

        Err(BurnError::FontError(format!(
            "no installed font matches {family_list:?}"
        )))
    }

    /// Family name reported by the font.
    pub fn family(&self) -> &str {
        &self.family
    }

    /// Pen x position of every character, plus the total advance.
    fn pen_positions(&self, text: &str, font_size: f32) -> (Vec<(char, f32)>, f32) {
        let mut positions = Vec::with_capacity(text.len());
        let mut pen = 0.0;
        let mut previous: Option<char> = None;
        for ch in text.chars() {
            if let Some(prev) = previous {
                pen += self.font.horizontal_kern(prev, ch, font_size).unwrap_or(0.0);
            }
            positions.push((ch, pen));
            pen += self.font.metrics(ch, font_size).advance_width;
            previous = Some(ch);
        }
        (positions, pen)
    }
}

impl TextMeasure for FontRasterizer {
    fn measure(&self, text: &str, font_size: f32) -> f32 {
        self.pen_positions(text, font_size).1
    }
}

impl GlyphRasterizer for FontRasterizer {
    fn rasterize_line(&self, text: &str, font_size: f32) -> LineMask {
        let (positions, _) = self.pen_positions(text, font_size);
        let glyphs: Vec<_> = positions
            .into_iter()
            .filter(|(ch, _)| !ch.is_whitespace())
            .map(|(ch, pen)| {
                let (metrics, bitmap) = self.font.rasterize(ch, font_size);
                let x = (pen + metrics.xmin as f32).round() as i32;
                (metrics, bitmap, x)
            })
            .filter(|(metrics, _, _)| metrics.width > 0 && metrics.height > 0)
            .collect();

        if glyphs.is_empty() {
            return LineMask::empty();
        }

        let (ascent, descent) = match self.font.horizontal_line_metrics(font_size) {
            Some(line) => (line.ascent.ceil() as i32, (-line.descent).ceil() as i32),
            None => (font_size.ceil() as i32, (font_size * 0.25).ceil() as i32),
        };
        // Glyphs may poke outside the nominal line metrics.
        let ascent = glyphs
            .iter()
            .map(|(m, _, _)| m.height as i32 + m.ymin)
            .fold(ascent, i32::max);
        let descent = glyphs.iter().map(|(m, _, _)| -m.ymin).fold(descent, i32::max);

        let left = glyphs.iter().map(|(_, _, x)| *x).min().unwrap_or(0);
        let right = glyphs
            .iter()
            .map(|(m, _, x)| x + m.width as i32)
            .max()
            .unwrap_or(0);

        let width = (right - left).max(1) as u32;
        let height = (ascent + descent).max(1) as u32;
        let mut coverage = vec![0u8; (width * height) as usize];

        for (metrics, bitmap, x) in &glyphs {
            let origin_x = x - left;
            let origin_y = ascent - (metrics.height as i32 + metrics.ymin);
            for gy in 0..metrics.height {
                for gx in 0..metrics.width {
                    let value = bitmap[gy * metrics.width + gx];
                    if value == 0 {
                        continue;
                    }
                    let px = origin_x + gx as i32;
                    let py = origin_y + gy as i32;
                    if px < 0 || py < 0 || px >= width as i32 || py >= height as i32 {
                        continue;
                    }
                    let slot = &mut coverage[py as usize * width as usize + px as usize];
                    *slot = (*slot).max(value);
                }
            }
        }

        LineMask {
            width,
            height,
            left,
            ascent,
            coverage,
        }
    }
}
