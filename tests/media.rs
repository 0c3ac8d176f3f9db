//! End-to-end burns through FFmpeg.
//!
//! Tests require fixture files from `tests/fixtures/generate_fixtures.sh`
//! and return early when they are missing.

mod common;

use std::path::Path;
use std::sync::Arc;

use common::{RecordingProgress, sample_video_path};
use subburn::encode::partial_path_for;
use subburn::{
    BurnError, BurnOptions, Cue, EncoderOptions, FrameSource, MediaSource, SubtitleStyle,
    VideoCodec, burn_subtitles,
};

fn fixture_missing() -> bool {
    !Path::new(sample_video_path()).exists()
}

// ── MediaSource ────────────────────────────────────────────────────

#[test]
fn missing_file_is_metadata_error() {
    let mut source = MediaSource::new("tests/fixtures/does_not_exist.mp4");
    let err = source.open().unwrap_err();
    assert!(
        matches!(err, BurnError::MetadataError { ref path, .. } if path.ends_with("does_not_exist.mp4"))
    );
    assert!(source.next_frame().is_none());
}

#[test]
fn probe_sample_video() {
    if fixture_missing() {
        return;
    }
    let mut source = MediaSource::new(sample_video_path());
    let metadata = source.open().unwrap();

    assert_eq!((metadata.width, metadata.height), (640, 480));
    assert!((metadata.frames_per_second - 30.0).abs() < 0.5);
    assert!((metadata.duration_seconds() - 5.0).abs() < 0.2);
    assert!(!metadata.codec.is_empty());
}

#[test]
fn decoded_frames_have_native_size_and_rising_timestamps() {
    if fixture_missing() {
        return;
    }
    let mut source = MediaSource::new(sample_video_path());
    source.open().unwrap();

    let mut last = f64::NEG_INFINITY;
    for _ in 0..10 {
        let frame = source.next_frame().unwrap().unwrap();
        assert_eq!(frame.image.dimensions(), (640, 480));
        assert!(frame.timestamp > last);
        last = frame.timestamp;
    }
}

#[test]
fn rewind_restarts_from_the_beginning() {
    if fixture_missing() {
        return;
    }
    let mut source = MediaSource::new(sample_video_path());
    source.open().unwrap();
    let first = source.next_frame().unwrap().unwrap();
    for _ in 0..5 {
        source.next_frame().unwrap().unwrap();
    }

    source.rewind().unwrap();
    let again = source.next_frame().unwrap().unwrap();
    assert!((again.timestamp - first.timestamp).abs() < 1e-6);
    source.close();
    assert!(source.next_frame().is_none());
}

// ── burn_subtitles ─────────────────────────────────────────────────

#[test]
fn burn_sample_video_to_mp4() {
    if fixture_missing() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("burned.mp4");
    let progress = Arc::new(RecordingProgress::default());
    let cues = vec![
        Cue::new("1", 0.5, 2.0, "Hello from the first cue"),
        Cue::new("2", 2.5, 4.0, "And a second\nwith two lines"),
    ];

    let artifact = match burn_subtitles(
        sample_video_path(),
        &output,
        cues,
        SubtitleStyle::default(),
        BurnOptions::new()
            .with_progress(progress.clone())
            .with_encoder(EncoderOptions::default().with_fps(10))
            .with_batch_size(5),
    ) {
        Ok(artifact) => artifact,
        // Machines without system fonts or any encoder cannot run this.
        Err(BurnError::FontError(_) | BurnError::EncoderUnavailable(_)) => return,
        Err(e) => panic!("burn failed: {e}"),
    };

    assert_eq!(artifact.path, output);
    assert!(output.exists());
    assert!(!partial_path_for(&output).exists());
    assert!(artifact.media_type.starts_with("video/mp4; codecs="));
    assert!(artifact.frame_count >= 45);
    assert!(artifact.byte_size > 0);

    let percents = progress.percents();
    assert_eq!(percents.last(), Some(&100));
    assert!(percents.windows(2).all(|pair| pair[0] <= pair[1]));
    assert!(progress.failures().is_empty());

    let mut burned = MediaSource::new(&output);
    let metadata = burned.open().unwrap();
    assert_eq!((metadata.width, metadata.height), (640, 480));
}

#[test]
fn burn_without_cues_needs_no_font() {
    if fixture_missing() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("plain.webm");

    let result = burn_subtitles(
        sample_video_path(),
        &output,
        Vec::new(),
        SubtitleStyle::default(),
        BurnOptions::new().with_encoder(
            EncoderOptions::default()
                .with_fps(5)
                .with_codec_preference(vec![VideoCodec::Vp9, VideoCodec::Vp8]),
        ),
    );
    match result {
        Ok(artifact) => {
            assert!(artifact.media_type.starts_with("video/webm; codecs=vp"));
            assert!(output.exists());
        }
        Err(BurnError::EncoderUnavailable(_)) => {}
        Err(e) => panic!("burn failed: {e}"),
    }
    assert!(!partial_path_for(&output).exists());
}

#[test]
fn burn_missing_input_leaves_no_output() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("never.mp4");
    let progress = Arc::new(RecordingProgress::default());

    let err = burn_subtitles(
        "tests/fixtures/does_not_exist.mp4",
        &output,
        vec![Cue::new("1", 0.0, 1.0, "Unused")],
        SubtitleStyle::default(),
        BurnOptions::new().with_progress(progress.clone()),
    )
    .unwrap_err();

    assert!(matches!(err, BurnError::MetadataError { .. }));
    assert!(!output.exists());
    assert!(!partial_path_for(&output).exists());
    assert_eq!(progress.failures().len(), 1);
}
