//! Progress reporting and cancellation tests.

mod common;

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use common::{FixedRasterizer, RecordingFactory, RecordingProgress, metadata, timed_frames};
use subburn::{
    BurnError, BurnJob, BurnOptions, BurnState, CancellationToken, Cue, EncoderOptions,
    FontSource, MemorySource, OperationType, ProgressCallback, ProgressInfo, SubtitleStyle,
    VideoCodec,
};

fn burn_with(options: BurnOptions, frames: usize) -> (Result<(), BurnError>, BurnState) {
    let source = MemorySource::new(
        metadata(64, 48, frames as f64 / 10.0, 10.0),
        timed_frames(64, 48, frames, 10.0, 1),
    );
    let mut job = BurnJob::new(
        source,
        RecordingFactory::new(VideoCodec::H264),
        vec![Cue::new("1", 0.0, 100.0, "Progress")],
        SubtitleStyle::default(),
        options
            .with_encoder(EncoderOptions::default().with_fps(10))
            .with_font(FontSource::Rasterizer(FixedRasterizer::shared())),
    );
    let result = job.run().map(|_| ());
    (result, job.state())
}

// ── CancellationToken ──────────────────────────────────────────────

#[test]
fn cancellation_token_default_not_cancelled() {
    let token = CancellationToken::default();
    assert!(!token.is_cancelled());
}

#[test]
fn cancellation_token_cancel() {
    let token = CancellationToken::new();
    token.cancel();
    assert!(token.is_cancelled());
    // Idempotent.
    token.cancel();
    assert!(token.is_cancelled());
}

#[test]
fn cancellation_token_clone_shares_state() {
    let token = CancellationToken::new();
    let clone = token.clone();
    assert!(!clone.is_cancelled());

    token.cancel();
    assert!(clone.is_cancelled());
}

#[test]
fn cancellation_token_crosses_threads() {
    let token = CancellationToken::new();
    let remote = token.clone();
    thread::spawn(move || remote.cancel()).join().unwrap();
    assert!(token.is_cancelled());
}

#[test]
fn cancelled_before_start_stops_at_first_frame() {
    let token = CancellationToken::new();
    token.cancel();
    let progress = Arc::new(RecordingProgress::default());

    let (result, state) = burn_with(
        BurnOptions::new()
            .with_progress(progress.clone())
            .with_cancellation(token),
        10,
    );

    assert!(matches!(result, Err(BurnError::Cancelled)));
    assert_eq!(state, BurnState::Cancelled);
    assert!(progress.percents().is_empty());
    assert!(progress.failures().is_empty());
}

/// Cancels the token once a given frame count is reported.
struct CancelAfter {
    token: CancellationToken,
    frames: u64,
}

impl ProgressCallback for CancelAfter {
    fn on_progress(&self, info: &ProgressInfo) {
        if info.current >= self.frames {
            self.token.cancel();
        }
    }
}

#[test]
fn callback_can_request_cancellation() {
    let token = CancellationToken::new();
    let (result, state) = burn_with(
        BurnOptions::new()
            .with_progress(Arc::new(CancelAfter {
                token: token.clone(),
                frames: 4,
            }))
            .with_cancellation(token),
        10,
    );
    assert!(matches!(result, Err(BurnError::Cancelled)));
    assert_eq!(state, BurnState::Cancelled);
}

// ── ProgressInfo ───────────────────────────────────────────────────

#[test]
fn progress_reports_burning_operation() {
    let progress = Arc::new(RecordingProgress::default());
    let (result, _) = burn_with(BurnOptions::new().with_progress(progress.clone()), 10);
    result.unwrap();

    let reports = progress.reports.lock().unwrap();
    assert_eq!(reports.len(), 11);
    assert!(reports.iter().all(|info| info.operation == OperationType::Burning));
    assert!(reports.iter().all(|info| info.total == Some(10)));
}

#[test]
fn progress_current_increases() {
    let progress = Arc::new(RecordingProgress::default());
    let (result, _) = burn_with(BurnOptions::new().with_progress(progress.clone()), 10);
    result.unwrap();

    let reports = progress.reports.lock().unwrap();
    let currents: Vec<u64> = reports.iter().map(|info| info.current).collect();
    assert_eq!(currents, vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 10]);
}

#[test]
fn progress_carries_frame_timestamps() {
    let progress = Arc::new(RecordingProgress::default());
    let (result, _) = burn_with(BurnOptions::new().with_progress(progress.clone()), 10);
    result.unwrap();

    let reports = progress.reports.lock().unwrap();
    assert_eq!(reports[0].current_timestamp, Some(Duration::ZERO));
    assert_eq!(reports[5].current_timestamp, Some(Duration::from_secs_f64(0.5)));
    // The completion report is not tied to a frame.
    assert_eq!(reports[10].current_timestamp, None);
    assert_eq!(reports[10].estimated_remaining, Some(Duration::ZERO));
}

#[test]
fn progress_has_elapsed() {
    let progress = Arc::new(RecordingProgress::default());
    let (result, _) = burn_with(BurnOptions::new().with_progress(progress.clone()), 5);
    result.unwrap();

    let reports = progress.reports.lock().unwrap();
    assert!(
        reports
            .windows(2)
            .all(|pair| pair[0].elapsed <= pair[1].elapsed)
    );
}

#[test]
fn large_batch_still_reports_completion() {
    let progress = Arc::new(RecordingProgress::default());
    let (result, _) = burn_with(
        BurnOptions::new()
            .with_progress(progress.clone())
            .with_batch_size(1000),
        10,
    );
    result.unwrap();
    assert_eq!(progress.percents(), vec![100]);
}

#[test]
fn operation_type_debug() {
    assert_eq!(format!("{:?}", OperationType::Burning), "Burning");
    assert_eq!(
        format!("{:?}", OperationType::SubtitleExtraction),
        "SubtitleExtraction"
    );
}
