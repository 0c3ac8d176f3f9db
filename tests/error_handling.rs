//! Error messages and conversions.
//!
//! Every error is surfaced to users as a single sentence, so the messages
//! are part of the contract.

use std::path::PathBuf;

use subburn::{BurnError, BurnState, Paint, parse_srt};

#[test]
fn metadata_error_names_the_path() {
    let err = BurnError::MetadataError {
        path: PathBuf::from("clips/input.mp4"),
        reason: "no video stream found".to_string(),
    };
    assert_eq!(
        err.to_string(),
        "Failed to load media metadata from clips/input.mp4: no video stream found"
    );
}

#[test]
fn encoder_unavailable_lists_attempts() {
    let err = BurnError::EncoderUnavailable("h265: codec h265 not available".to_string());
    assert_eq!(
        err.to_string(),
        "No supported output codec available: h265: codec h265 not available"
    );
}

#[test]
fn invalid_state_names_operation_and_state() {
    let err = BurnError::InvalidState {
        operation: "finalize",
        state: BurnState::Idle,
    };
    assert_eq!(err.to_string(), "Cannot finalize while burn job is Idle");
}

#[test]
fn parse_error_carries_line_number() {
    let err = parse_srt("1\n00:00:01,000 --> 00:00:02,000\nOk\n\nbroken block\n").unwrap_err();
    match err {
        BurnError::SubtitleParseError { line, .. } => assert_eq!(line, 5),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn io_errors_convert() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
    let err: BurnError = io.into();
    assert!(matches!(err, BurnError::IoError(_)));
    assert_eq!(err.to_string(), "I/O error: gone");
}

#[test]
fn bad_colour_is_invalid_style() {
    let err = Paint::parse("not-a-colour").unwrap_err();
    assert!(matches!(err, BurnError::InvalidStyle(_)));
    assert!(err.to_string().starts_with("Invalid style: "));
}

#[test]
fn cancelled_message() {
    assert_eq!(BurnError::Cancelled.to_string(), "Operation cancelled");
}
