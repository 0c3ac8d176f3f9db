//! Text layout tests.
//!
//! Widths come from a character-count measure so geometry is exact.

mod common;

use common::approx;
use subburn::layout::{BOX_DESCENT, BOX_PADDING_X, BOX_PADDING_Y, EFFECT_COLOR};
use subburn::{Effect, EffectParams, OverlayGeometry, Paint, compute_box_geometry, line_baselines, wrap};

fn chars(text: &str) -> f32 {
    text.chars().count() as f32
}

fn geometry() -> OverlayGeometry {
    OverlayGeometry {
        scale: 1.0,
        font_size: 20.0,
        anchor_x: 400.0,
        anchor_y: 540.0,
        max_text_width: 640.0,
        line_height: 25.0,
    }
}

// ── wrap ───────────────────────────────────────────────────────────

#[test]
fn packs_words_greedily() {
    assert_eq!(wrap("a b c d", 3.5, chars), vec!["a b", "c d"]);
    assert_eq!(wrap("the quick brown fox", 9.0, chars), vec!["the quick", "brown fox"]);
}

#[test]
fn multi_word_lines_never_exceed_the_limit() {
    let text = "burned subtitles should wrap cleanly at every width we try here\nwith a second paragraph";
    for max_width in [4.0, 7.5, 12.0, 18.0, 25.0, 40.0, 80.0] {
        let lines = wrap(text, max_width, chars);
        for line in &lines {
            if line.contains(' ') {
                assert!(
                    chars(line) <= max_width,
                    "{line:?} is wider than {max_width}"
                );
            }
        }
        let words: Vec<&str> = lines.iter().flat_map(|line| line.split_whitespace()).collect();
        assert_eq!(words, text.split_whitespace().collect::<Vec<_>>());
    }
}

#[test]
fn fitting_text_stays_on_one_line() {
    assert_eq!(wrap("short line", 100.0, chars), vec!["short line"]);
}

#[test]
fn width_equal_to_limit_fits() {
    assert_eq!(wrap("ab cd", 5.0, chars), vec!["ab cd"]);
}

#[test]
fn explicit_breaks_are_kept() {
    assert_eq!(wrap("one\ntwo", 100.0, chars), vec!["one", "two"]);
    assert_eq!(wrap("one\n\ntwo", 100.0, chars), vec!["one", "", "two"]);
}

#[test]
fn overlong_word_gets_its_own_line() {
    assert_eq!(
        wrap("supercalifragilistic is long", 5.0, chars),
        vec!["supercalifragilistic", "is", "long"]
    );
}

#[test]
fn runs_of_whitespace_collapse() {
    assert_eq!(wrap("a    b\tc", 100.0, chars), vec!["a b c"]);
}

#[test]
fn empty_text_is_one_empty_line() {
    assert_eq!(wrap("", 100.0, chars), vec![""]);
}

// ── Box geometry ───────────────────────────────────────────────────

#[test]
fn box_fits_widest_line_with_padding() {
    let lines = vec!["abcd".to_string(), "ab".to_string()];
    let measure = |line: &str| chars(line) * 10.0;
    let b = compute_box_geometry(&lines, &geometry(), measure);

    let width = 40.0 + 2.0 * 20.0 * BOX_PADDING_X;
    let height = 2.0 * 25.0 + 2.0 * 20.0 * BOX_PADDING_Y;
    let bottom = 540.0 + 20.0 * BOX_DESCENT;

    assert!(approx(b.width, width));
    assert!(approx(b.height, height));
    assert!(approx(b.bottom(), bottom));
    assert!(approx(b.x, 400.0 - width / 2.0));
    assert!(approx(b.top, bottom - height));
}

#[test]
fn box_is_centred_on_anchor() {
    let lines = vec!["xyz".to_string()];
    let b = compute_box_geometry(&lines, &geometry(), |line: &str| chars(line) * 7.0);
    assert!(approx(b.x + b.width / 2.0, 400.0));
}

// ── Baselines ──────────────────────────────────────────────────────

#[test]
fn last_line_sits_on_anchor() {
    let baselines = line_baselines(3, &geometry());
    assert_eq!(baselines.len(), 3);
    assert!(approx(baselines[0], 490.0));
    assert!(approx(baselines[1], 515.0));
    assert!(approx(baselines[2], 540.0));
}

#[test]
fn no_lines_no_baselines() {
    assert!(line_baselines(0, &geometry()).is_empty());
}

// ── Effects ────────────────────────────────────────────────────────

#[test]
fn effect_magnitudes_scale() {
    assert_eq!(
        EffectParams::for_effect(Effect::Glow, 2.0),
        EffectParams::Shadow {
            color: EFFECT_COLOR,
            blur_radius: 20.0,
            offset_x: 0.0,
            offset_y: 0.0,
        }
    );
    assert_eq!(
        EffectParams::for_effect(Effect::DropShadow, 2.0),
        EffectParams::Shadow {
            color: EFFECT_COLOR,
            blur_radius: 8.0,
            offset_x: 4.0,
            offset_y: 4.0,
        }
    );
    assert_eq!(
        EffectParams::for_effect(Effect::Outline, 0.5),
        EffectParams::Stroke {
            color: Paint::BLACK,
            width: 2.0,
        }
    );
    assert_eq!(EffectParams::for_effect(Effect::None, 3.0), EffectParams::Plain);
}
