//! Style, colour and geometry tests.

mod common;

use common::approx;
use subburn::{BurnError, Effect, OverlayGeometry, Paint, SubtitleStyle};

// ── Paint ──────────────────────────────────────────────────────────

#[test]
fn parses_hex_forms() {
    assert_eq!(Paint::parse("#fff").unwrap(), Paint::Rgba([255, 255, 255, 255]));
    assert_eq!(Paint::parse("#f008").unwrap(), Paint::Rgba([255, 0, 0, 136]));
    assert_eq!(Paint::parse("#1e90ff").unwrap(), Paint::Rgba([30, 144, 255, 255]));
    assert_eq!(Paint::parse("#00000080").unwrap(), Paint::Rgba([0, 0, 0, 128]));
}

#[test]
fn parses_rgb_functions() {
    assert_eq!(Paint::parse("rgb(10, 20, 30)").unwrap(), Paint::Rgba([10, 20, 30, 255]));
    assert_eq!(Paint::parse("rgba(0,0,0,0.5)").unwrap(), Paint::Rgba([0, 0, 0, 128]));
    assert_eq!(Paint::parse("RGBA(255, 255, 255, 1)").unwrap(), Paint::WHITE);
}

#[test]
fn parses_names_and_transparent() {
    assert_eq!(Paint::parse("white").unwrap(), Paint::WHITE);
    assert_eq!(Paint::parse(" Black ").unwrap(), Paint::BLACK);
    assert!(Paint::parse("transparent").unwrap().is_transparent());
    assert_eq!(Paint::Transparent.rgba(), None);
}

#[test]
fn rejects_unknown_colours() {
    for value in ["", "#12", "#ggg", "rgb(1,2)", "chartreuse-ish"] {
        match Paint::parse(value) {
            Err(BurnError::InvalidStyle(_)) => {}
            other => panic!("Expected InvalidStyle for {value:?}, got: {other:?}"),
        }
    }
}

#[test]
fn display_is_parseable() {
    for paint in [Paint::WHITE, Paint::Rgba([1, 2, 3, 4]), Paint::Transparent] {
        assert_eq!(Paint::parse(&paint.to_string()).unwrap(), paint);
    }
}

// ── Effect ─────────────────────────────────────────────────────────

#[test]
fn effect_descriptor_matching() {
    assert_eq!(Effect::from_descriptor("Glow"), Effect::Glow);
    assert_eq!(Effect::from_descriptor("drop shadow"), Effect::DropShadow);
    assert_eq!(Effect::from_descriptor("thick OUTLINE"), Effect::Outline);
    assert_eq!(Effect::from_descriptor("stroke"), Effect::Outline);
    assert_eq!(Effect::from_descriptor("shadow glow"), Effect::Glow);
    assert_eq!(Effect::from_descriptor("plain"), Effect::None);
}

// ── SubtitleStyle ──────────────────────────────────────────────────

#[test]
fn default_style() {
    let style = SubtitleStyle::default();
    assert_eq!(style.font_size_px, 24.0);
    assert_eq!(style.color, Paint::WHITE);
    assert_eq!(style.background_color, Paint::Rgba([0, 0, 0, 128]));
    assert_eq!(style.effect, Effect::Outline);
    assert_eq!(style.position_percent, 10.0);
    assert_eq!(style.opacity, 1.0);
    assert!(style.validate().is_ok());
}

#[test]
fn style_from_partial_json() {
    let style = SubtitleStyle::from_json(
        r#"{"fontSizePx": 32, "effect": "drop shadow", "backgroundColor": "transparent"}"#,
    )
    .unwrap();
    assert_eq!(style.font_size_px, 32.0);
    assert_eq!(style.effect, Effect::DropShadow);
    assert!(style.background_color.is_transparent());
    assert_eq!(style.color, Paint::WHITE);
}

#[test]
fn style_json_round_trip() {
    let style = SubtitleStyle {
        color: Paint::Rgba([255, 255, 0, 255]),
        effect: Effect::Glow,
        ..SubtitleStyle::default()
    };
    let json = serde_json::to_string(&style).unwrap();
    assert!(json.contains("\"positionPercent\""));
    assert_eq!(SubtitleStyle::from_json(&json).unwrap(), style);
}

#[test]
fn style_json_rejects_bad_values() {
    assert!(matches!(
        SubtitleStyle::from_json(r##"{"color": "#zzz"}"##),
        Err(BurnError::InvalidStyle(_))
    ));
    assert!(matches!(
        SubtitleStyle::from_json(r#"{"opacity": 2.0}"#),
        Err(BurnError::InvalidStyle(_))
    ));
    assert!(matches!(
        SubtitleStyle::from_json(r#"{"fontSizePx": 0}"#),
        Err(BurnError::InvalidStyle(_))
    ));
}

// ── OverlayGeometry ────────────────────────────────────────────────

#[test]
fn geometry_at_reference_height() {
    let geometry = OverlayGeometry::for_frame(800, 600, &SubtitleStyle::default());
    assert!(approx(geometry.scale, 1.0));
    assert!(approx(geometry.font_size, 24.0));
    assert!(approx(geometry.anchor_x, 400.0));
    assert!(approx(geometry.anchor_y, 540.0));
    assert!(approx(geometry.max_text_width, 640.0));
    assert!(approx(geometry.line_height, 30.0));
}

#[test]
fn geometry_scales_with_height() {
    let geometry = OverlayGeometry::for_frame(1280, 720, &SubtitleStyle::default());
    assert!(approx(geometry.scale, 1.2));
    assert!(approx(geometry.font_size, 28.8));
    assert!(approx(geometry.anchor_y, 648.0));
    assert!(approx(geometry.max_text_width, 1024.0));
    assert!(approx(geometry.line_height, 36.0));
}

#[test]
fn geometry_follows_position() {
    let style = SubtitleStyle {
        position_percent: 50.0,
        ..SubtitleStyle::default()
    };
    let geometry = OverlayGeometry::for_frame(640, 480, &style);
    assert!(approx(geometry.anchor_y, 240.0));
}
