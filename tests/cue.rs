//! Active-cue resolution tests.

use subburn::{Cue, CueTrack, find_active_cue};

fn sample_cues() -> Vec<Cue> {
    vec![
        Cue::new("1", 1.0, 3.0, "First"),
        Cue::new("2", 5.0, 7.0, "Second"),
    ]
}

// ── Boundaries ─────────────────────────────────────────────────────

#[test]
fn interval_is_inclusive_at_both_ends() {
    let cues = sample_cues();
    assert_eq!(find_active_cue(&cues, 1.0).map(|c| c.id.as_str()), Some("1"));
    assert_eq!(find_active_cue(&cues, 3.0).map(|c| c.id.as_str()), Some("1"));
    assert_eq!(find_active_cue(&cues, 7.0).map(|c| c.id.as_str()), Some("2"));
}

#[test]
fn gaps_and_outside_times_have_no_cue() {
    let cues = sample_cues();
    assert!(find_active_cue(&cues, 0.999).is_none());
    assert!(find_active_cue(&cues, 4.0).is_none());
    assert!(find_active_cue(&cues, 7.001).is_none());
    assert!(find_active_cue(&cues, -1.0).is_none());
}

#[test]
fn empty_list_has_no_cue() {
    assert!(find_active_cue(&[], 1.0).is_none());
}

// ── Overlap ────────────────────────────────────────────────────────

#[test]
fn overlapping_cues_resolve_to_first_in_list_order() {
    let cues = vec![
        Cue::new("late", 2.0, 6.0, "Listed first"),
        Cue::new("early", 0.0, 4.0, "Listed second"),
    ];
    assert_eq!(find_active_cue(&cues, 1.0).map(|c| c.id.as_str()), Some("early"));
    assert_eq!(find_active_cue(&cues, 3.0).map(|c| c.id.as_str()), Some("late"));
    assert_eq!(find_active_cue(&cues, 5.0).map(|c| c.id.as_str()), Some("late"));
}

#[test]
fn inverted_cue_never_matches() {
    let cues = vec![Cue::new("x", 5.0, 2.0, "Backwards")];
    assert!(find_active_cue(&cues, 3.0).is_none());
    assert_eq!(cues[0].duration(), 0.0);
}

// ── CueTrack ───────────────────────────────────────────────────────

#[test]
fn track_wraps_the_resolver() {
    let track = CueTrack::from(sample_cues());
    assert_eq!(track.len(), 2);
    assert!(!track.is_empty());
    assert_eq!(track.active_at(6.0).map(|c| c.text.as_str()), Some("Second"));
    assert_eq!(track.end_time(), 7.0);
}

#[test]
fn empty_track() {
    let track = CueTrack::new(Vec::new());
    assert!(track.is_empty());
    assert_eq!(track.end_time(), 0.0);
    assert!(track.active_at(0.0).is_none());
}

#[test]
fn cue_serializes_camel_case() {
    let json = serde_json::to_value(Cue::new("7", 1.5, 2.5, "Hi")).unwrap();
    assert_eq!(json["startTime"], 1.5);
    assert_eq!(json["endTime"], 2.5);
    assert_eq!(json["id"], "7");
}
