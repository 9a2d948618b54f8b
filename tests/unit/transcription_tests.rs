/*!
 * Tests for the chunked transcription merge
 */

use anyhow::Result;
use vidscribe::transcription::ChunkedTranscriber;
use crate::common;
use crate::common::mock_providers::MockRecognizer;

/// Test end-to-end: 125s of audio with 60s windows produces 3 windows
/// whose segments land at absolute offsets
#[tokio::test]
async fn test_transcribe_with125SecondInput_shouldOffsetWindowsAbsolutely() -> Result<()> {
    let recognizer = MockRecognizer::new(
        "en",
        vec![
            vec![MockRecognizer::segment(0.0, 5.0, "window one")],
            vec![MockRecognizer::segment(0.0, 5.0, "window two")],
            vec![MockRecognizer::segment(0.0, 5.0, "window three")],
        ],
    );

    let samples = common::make_samples(125.0);
    let transcriber = ChunkedTranscriber::new(&recognizer, 60);
    let (track, report) = transcriber.transcribe(&samples, None).await?;

    assert_eq!(report.chunks_processed, 3);
    assert_eq!(report.chunk_size_seconds, 60);
    assert_eq!(report.detected_language, "en");
    assert!((report.duration_seconds - 125.0).abs() < 1e-6);

    assert_eq!(track.language, "en");
    assert_eq!(track.entries.len(), 3);
    assert_eq!(track.entries[0].start_time_ms, 0);
    assert_eq!(track.entries[0].end_time_ms, 5_000);
    assert_eq!(track.entries[1].start_time_ms, 60_000);
    assert_eq!(track.entries[1].end_time_ms, 65_000);
    assert_eq!(track.entries[2].start_time_ms, 120_000);
    assert_eq!(track.entries[2].end_time_ms, 125_000);

    let seq_nums: Vec<usize> = track.entries.iter().map(|e| e.seq_num).collect();
    assert_eq!(seq_nums, vec![1, 2, 3]);
    Ok(())
}

/// Test merged timestamps never decrease across windows
#[tokio::test]
async fn test_transcribe_withMultipleSegmentsPerWindow_shouldKeepStartsMonotonic() -> Result<()> {
    let recognizer = MockRecognizer::new(
        "fr",
        vec![
            vec![
                MockRecognizer::segment(0.0, 2.0, "a"),
                MockRecognizer::segment(2.5, 4.0, "b"),
            ],
            vec![
                MockRecognizer::segment(1.0, 3.0, "c"),
                MockRecognizer::segment(3.5, 9.5, "d"),
            ],
        ],
    );

    let samples = common::make_samples(70.0);
    let transcriber = ChunkedTranscriber::new(&recognizer, 60);
    let (track, _) = transcriber.transcribe(&samples, None).await?;

    assert_eq!(track.entries.len(), 4);
    let starts: Vec<u64> = track.entries.iter().map(|e| e.start_time_ms).collect();
    let mut sorted = starts.clone();
    sorted.sort_unstable();
    assert_eq!(starts, sorted);

    // Second window offsets by the first window's full 60s duration
    assert_eq!(track.entries[2].start_time_ms, 61_000);
    assert_eq!(track.entries[3].end_time_ms, 69_500);
    Ok(())
}

/// Test the first window is sent without a hint and every window after
/// detection is pinned to the detected language
#[tokio::test]
async fn test_transcribe_withTwoWindows_shouldPinDetectedLanguage() -> Result<()> {
    let recognizer = MockRecognizer::new(
        "es",
        vec![
            vec![MockRecognizer::segment(0.0, 1.0, "hola")],
            vec![MockRecognizer::segment(0.0, 1.0, "mundo")],
        ],
    );

    let samples = common::make_samples(90.0);
    let transcriber = ChunkedTranscriber::new(&recognizer, 60);
    transcriber.transcribe(&samples, None).await?;

    let hints = recognizer.hints.lock().clone();
    // Detection call plus one pinned call per window (window 0 re-run included)
    assert_eq!(hints.len(), 3);
    assert_eq!(hints[0], None);
    assert_eq!(hints[1].as_deref(), Some("es"));
    assert_eq!(hints[2].as_deref(), Some("es"));
    Ok(())
}

/// Test segments with whitespace-only text are filtered out
#[tokio::test]
async fn test_transcribe_withWhitespaceOnlySegment_shouldDropIt() -> Result<()> {
    let recognizer = MockRecognizer::new(
        "en",
        vec![vec![MockRecognizer::segment(0.0, 5.0, "   ")]],
    );

    let samples = common::make_samples(10.0);
    let transcriber = ChunkedTranscriber::new(&recognizer, 60);
    let (track, report) = transcriber.transcribe(&samples, None).await?;

    assert_eq!(report.chunks_processed, 1);
    assert!(track.entries.is_empty());
    Ok(())
}

/// Test re-indexing stays contiguous after empty segments are dropped
#[tokio::test]
async fn test_transcribe_withMixedEmptySegments_shouldReindexContiguously() -> Result<()> {
    let recognizer = MockRecognizer::new(
        "en",
        vec![vec![
            MockRecognizer::segment(0.0, 1.0, "keep one"),
            MockRecognizer::segment(1.0, 2.0, ""),
            MockRecognizer::segment(2.0, 3.0, "keep two"),
        ]],
    );

    let samples = common::make_samples(5.0);
    let transcriber = ChunkedTranscriber::new(&recognizer, 60);
    let (track, _) = transcriber.transcribe(&samples, None).await?;

    assert_eq!(track.entries.len(), 2);
    assert_eq!(track.entries[0].seq_num, 1);
    assert_eq!(track.entries[0].text, "keep one");
    assert_eq!(track.entries[1].seq_num, 2);
    assert_eq!(track.entries[1].text, "keep two");
    Ok(())
}

/// Test a recognizer failure in any window aborts the whole merge
#[tokio::test]
async fn test_transcribe_withFailingWindow_shouldAbortWithoutPartialTrack() {
    let recognizer = MockRecognizer::new(
        "en",
        vec![
            vec![MockRecognizer::segment(0.0, 5.0, "ok")],
            vec![MockRecognizer::segment(0.0, 5.0, "never returned")],
        ],
    )
    .failing_on_window(1);

    let samples = common::make_samples(90.0);
    let transcriber = ChunkedTranscriber::new(&recognizer, 60);
    let result = transcriber.transcribe(&samples, None).await;

    assert!(result.is_err());
}

/// Test empty input is rejected before any recognizer call
#[tokio::test]
async fn test_transcribe_withNoSamples_shouldFail() {
    let recognizer = MockRecognizer::new("en", vec![]);
    let transcriber = ChunkedTranscriber::new(&recognizer, 60);

    let result = transcriber.transcribe(&[], None).await;

    assert!(result.is_err());
    assert!(recognizer.hints.lock().is_empty());
}
