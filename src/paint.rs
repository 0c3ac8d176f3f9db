//! Painting wrapped cue text onto an RGBA surface.
//!
//! A cue is rendered once into an [`OverlayLayer`], a transparent image
//! positioned in frame coordinates, which is then blended onto each frame the
//! cue is active for. Within the layer the background box is drawn first,
//! then each line from the bottom line upward, effect before fill.

use image::{GrayImage, Luma, Rgba, RgbaImage, imageops};

use crate::font::{GlyphRasterizer, LineMask};
use crate::layout::{EffectParams, compute_box_geometry, line_baselines, wrap};
use crate::style::{OverlayGeometry, SubtitleStyle};

/// A rendered cue, ready to blend onto frames.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayLayer {
    /// Straight-alpha RGBA pixels.
    pub image: RgbaImage,
    /// Frame x of the layer's left edge.
    pub x: i32,
    /// Frame y of the layer's top edge.
    pub y: i32,
}

/// Integer rectangle in frame coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Bounds {
    left: i32,
    top: i32,
    right: i32,
    bottom: i32,
}

impl Bounds {
    fn from_f32(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left: left.floor() as i32,
            top: top.floor() as i32,
            right: right.ceil() as i32,
            bottom: bottom.ceil() as i32,
        }
    }

    fn union(self, other: Bounds) -> Bounds {
        Bounds {
            left: self.left.min(other.left),
            top: self.top.min(other.top),
            right: self.right.max(other.right),
            bottom: self.bottom.max(other.bottom),
        }
    }

    fn grow(self, margin: i32) -> Bounds {
        Bounds {
            left: self.left - margin,
            top: self.top - margin,
            right: self.right + margin,
            bottom: self.bottom + margin,
        }
    }
}

/// A line mask placed in frame coordinates.
struct PlacedLine {
    mask: LineMask,
    x: i32,
    y: i32,
}

/// Render `text` with `style` into an overlay layer.
///
/// Returns `None` when there is nothing to draw (blank text and a
/// transparent background).
pub fn render_cue_layer<R>(
    text: &str,
    style: &SubtitleStyle,
    geometry: &OverlayGeometry,
    rasterizer: &R,
) -> Option<OverlayLayer>
where
    R: GlyphRasterizer + ?Sized,
{
    let font_size = geometry.font_size;
    let measure = |line: &str| rasterizer.measure(line, font_size);

    let lines = wrap(text, geometry.max_text_width, measure);
    if lines.iter().all(|line| line.is_empty()) && style.background_color.is_transparent() {
        return None;
    }

    let baselines = line_baselines(lines.len(), geometry);
    let placed: Vec<PlacedLine> = lines
        .iter()
        .zip(&baselines)
        .filter(|(line, _)| !line.is_empty())
        .map(|(line, &baseline)| {
            let mask = rasterizer.rasterize_line(line, font_size);
            let pen_x = geometry.anchor_x - measure(line) / 2.0;
            PlacedLine {
                x: pen_x.round() as i32 + mask.left,
                y: baseline.round() as i32 - mask.ascent,
                mask,
            }
        })
        .filter(|line| line.mask.width > 0)
        .collect();

    let effect = EffectParams::for_effect(style.effect, geometry.scale);
    let effect_margin = match effect {
        EffectParams::Plain => 0.0,
        EffectParams::Shadow {
            blur_radius,
            offset_x,
            offset_y,
            ..
        } => blur_radius * 3.0 + offset_x.abs().max(offset_y.abs()),
        EffectParams::Stroke { width, .. } => width,
    };

    let box_geometry = (!style.background_color.is_transparent())
        .then(|| compute_box_geometry(&lines, geometry, measure));

    let text_bounds = placed
        .iter()
        .map(|line| Bounds {
            left: line.x,
            top: line.y,
            right: line.x + line.mask.width as i32,
            bottom: line.y + line.mask.height as i32,
        })
        .reduce(Bounds::union)
        .map(|bounds| bounds.grow(effect_margin.ceil() as i32 + 1));

    let box_bounds = box_geometry
        .map(|b| Bounds::from_f32(b.x, b.top, b.x + b.width, b.bottom()));

    let bounds = match (text_bounds, box_bounds) {
        (Some(t), Some(b)) => t.union(b),
        (Some(t), None) => t,
        (None, Some(b)) => b,
        (None, None) => return None,
    };

    let width = (bounds.right - bounds.left).max(1) as u32;
    let height = (bounds.bottom - bounds.top).max(1) as u32;
    let mut image = RgbaImage::new(width, height);

    if let (Some(b), Some(rgba)) = (box_geometry, style.background_color.rgba()) {
        fill_rect(
            &mut image,
            Bounds::from_f32(b.x, b.top, b.x + b.width, b.bottom()),
            bounds,
            rgba,
        );
    }

    let fill = style.color.rgba();
    for line in placed.iter().rev() {
        let local_x = line.x - bounds.left;
        let local_y = line.y - bounds.top;
        match effect {
            EffectParams::Plain => {}
            EffectParams::Shadow {
                color,
                blur_radius,
                offset_x,
                offset_y,
            } => {
                if let Some(rgba) = color.rgba() {
                    paint_shadow(
                        &mut image,
                        &line.mask,
                        local_x + offset_x.round() as i32,
                        local_y + offset_y.round() as i32,
                        blur_radius,
                        rgba,
                    );
                }
            }
            EffectParams::Stroke { color, width } => {
                if let Some(rgba) = color.rgba() {
                    let stroke = dilate(&line.mask, width / 2.0);
                    let margin = (width / 2.0).ceil() as i32;
                    paint_mask(&mut image, &stroke, local_x - margin, local_y - margin, rgba);
                }
            }
        }
        if let Some(rgba) = fill {
            paint_mask(&mut image, &line.mask.to_gray(), local_x, local_y, rgba);
        }
    }

    Some(OverlayLayer {
        image,
        x: bounds.left,
        y: bounds.top,
    })
}

/// Blend `layer` onto `target` with an extra `opacity` multiplier.
///
/// Pixels falling outside `target` are clipped.
pub fn blend_layer(target: &mut RgbaImage, layer: &OverlayLayer, opacity: f32) {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 {
        return;
    }
    let (target_width, target_height) = target.dimensions();

    for (lx, ly, pixel) in layer.image.enumerate_pixels() {
        let alpha = pixel[3] as f32 / 255.0 * opacity;
        if alpha <= 0.0 {
            continue;
        }
        let tx = layer.x + lx as i32;
        let ty = layer.y + ly as i32;
        if tx < 0 || ty < 0 || tx >= target_width as i32 || ty >= target_height as i32 {
            continue;
        }
        blend_pixel(
            target.get_pixel_mut(tx as u32, ty as u32),
            [pixel[0], pixel[1], pixel[2]],
            alpha,
        );
    }
}

/// Source-over blend of a straight-alpha colour onto a straight-alpha pixel.
fn blend_pixel(destination: &mut Rgba<u8>, color: [u8; 3], alpha: f32) {
    let destination_alpha = destination[3] as f32 / 255.0;
    let out_alpha = alpha + destination_alpha * (1.0 - alpha);
    if out_alpha <= 0.0 {
        return;
    }
    for channel in 0..3 {
        let source = color[channel] as f32;
        let existing = destination[channel] as f32;
        let value = (source * alpha + existing * destination_alpha * (1.0 - alpha)) / out_alpha;
        destination[channel] = value.round().clamp(0.0, 255.0) as u8;
    }
    destination[3] = (out_alpha * 255.0).round().clamp(0.0, 255.0) as u8;
}

fn fill_rect(image: &mut RgbaImage, rect: Bounds, origin: Bounds, rgba: [u8; 4]) {
    let alpha = rgba[3] as f32 / 255.0;
    let (width, height) = image.dimensions();
    let left = (rect.left - origin.left).clamp(0, width as i32) as u32;
    let right = (rect.right - origin.left).clamp(0, width as i32) as u32;
    let top = (rect.top - origin.top).clamp(0, height as i32) as u32;
    let bottom = (rect.bottom - origin.top).clamp(0, height as i32) as u32;
    for y in top..bottom {
        for x in left..right {
            blend_pixel(image.get_pixel_mut(x, y), [rgba[0], rgba[1], rgba[2]], alpha);
        }
    }
}

/// Paint `rgba` through a coverage mask placed at `(x, y)` in the image.
fn paint_mask(image: &mut RgbaImage, mask: &GrayImage, x: i32, y: i32, rgba: [u8; 4]) {
    let color_alpha = rgba[3] as f32 / 255.0;
    let (width, height) = image.dimensions();
    for (mx, my, coverage) in mask.enumerate_pixels() {
        if coverage[0] == 0 {
            continue;
        }
        let px = x + mx as i32;
        let py = y + my as i32;
        if px < 0 || py < 0 || px >= width as i32 || py >= height as i32 {
            continue;
        }
        let alpha = coverage[0] as f32 / 255.0 * color_alpha;
        blend_pixel(image.get_pixel_mut(px as u32, py as u32), [rgba[0], rgba[1], rgba[2]], alpha);
    }
}

fn paint_shadow(image: &mut RgbaImage, mask: &LineMask, x: i32, y: i32, sigma: f32, rgba: [u8; 4]) {
    let margin = (sigma * 3.0).ceil() as i32;
    let mut padded = GrayImage::new(
        mask.width + 2 * margin as u32,
        mask.height + 2 * margin as u32,
    );
    for my in 0..mask.height {
        for mx in 0..mask.width {
            let value = mask.get(mx as i32, my as i32);
            padded.put_pixel(mx + margin as u32, my + margin as u32, Luma([value]));
        }
    }
    let blurred = if sigma > 0.0 {
        imageops::blur(&padded, sigma)
    } else {
        padded
    };
    paint_mask(image, &blurred, x - margin, y - margin, rgba);
}

/// Grow a mask by `radius` pixels with a disc, giving rounded joins.
///
/// The result is padded by `ceil(radius)` on every side.
fn dilate(mask: &LineMask, radius: f32) -> GrayImage {
    let margin = radius.ceil() as i32;
    let offsets: Vec<(i32, i32)> = (-margin..=margin)
        .flat_map(|dy| (-margin..=margin).map(move |dx| (dx, dy)))
        .filter(|&(dx, dy)| ((dx * dx + dy * dy) as f32).sqrt() <= radius + 0.5)
        .collect();

    let width = mask.width + 2 * margin as u32;
    let height = mask.height + 2 * margin as u32;
    let mut output = GrayImage::new(width, height);
    for y in 0..height as i32 {
        for x in 0..width as i32 {
            let value = offsets
                .iter()
                .map(|&(dx, dy)| mask.get(x - margin + dx, y - margin + dy))
                .max()
                .unwrap_or(0);
            if value > 0 {
                output.put_pixel(x as u32, y as u32, Luma([value]));
            }
        }
    }
    output
}
