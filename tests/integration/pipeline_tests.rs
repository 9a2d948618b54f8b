/*!
 * Transcription-to-translation pipeline tests with scripted providers
 */

use anyhow::Result;

use vidscribe::subtitle_processor::SubtitleTrack;
use vidscribe::transcription::ChunkedTranscriber;
use vidscribe::translation::TranslationRouter;
use crate::common;
use crate::common::mock_providers::{MockRecognizer, MockTranslator};

/// Test the full chain: chunked recognition, merge, translation and SRT
/// serialization round-trip
#[tokio::test]
async fn test_pipeline_withChunkedAudio_shouldProduceAllTracks() -> Result<()> {
    common::init_test_logging();
    let recognizer = MockRecognizer::new(
        "fr",
        vec![
            vec![
                MockRecognizer::segment(0.0, 4.0, "Bonjour"),
                MockRecognizer::segment(5.0, 9.0, "   "),
            ],
            vec![MockRecognizer::segment(2.0, 6.0, "Au revoir")],
        ],
    );
    let translator = MockTranslator::working();

    // Transcribe 100s of audio in 60s windows
    let samples = common::make_samples(100.0);
    let transcriber = ChunkedTranscriber::new(&recognizer, 60);
    let (track, report) = transcriber.transcribe(&samples, None).await?;

    assert_eq!(report.chunks_processed, 2);
    assert_eq!(track.language, "fr");
    // The whitespace-only segment was dropped and the rest renumbered
    assert_eq!(track.entries.len(), 2);
    assert_eq!(track.entries[1].start_time_ms, 62_000);

    // Translate into English directly and Hebrew through the pivot
    let router = TranslationRouter::new(&translator);
    let results = router
        .translate_track(&track, "fr", &["en".to_string(), "he".to_string()], None)
        .await;

    assert_eq!(results.len(), 2);
    let english = &results["en"];
    let hebrew = &results["he"];
    assert_eq!(english.entries.len(), 2);
    assert_eq!(hebrew.entries.len(), 2);

    // The Hebrew track went source -> English -> Hebrew
    assert!(hebrew.entries[0].text.contains("opus-mt-en-heb"));
    assert!(hebrew.entries[0].text.contains("opus-mt-fr-en"));

    // Timing survived both stages
    assert_eq!(hebrew.entries[1].start_time_ms, track.entries[1].start_time_ms);
    assert_eq!(hebrew.entries[1].end_time_ms, track.entries[1].end_time_ms);
    Ok(())
}

/// Test serialized tracks from the pipeline re-parse losslessly
#[tokio::test]
async fn test_pipeline_withSerializedOutput_shouldRoundTripThroughSrt() -> Result<()> {
    let recognizer = MockRecognizer::new(
        "en",
        vec![vec![
            MockRecognizer::segment(0.0, 3.5, "First line of speech"),
            MockRecognizer::segment(4.0, 8.0, "Second line of speech"),
        ]],
    );

    let samples = common::make_samples(10.0);
    let transcriber = ChunkedTranscriber::new(&recognizer, 60);
    let (track, _) = transcriber.transcribe(&samples, None).await?;

    let temp = common::create_temp_dir()?;
    let path = temp.path().join("out.en.srt");
    track.write_to_srt(&path)?;

    let reread = SubtitleTrack::parse_srt_file(&path, "en")?;
    assert_eq!(reread, track);
    Ok(())
}

/// Test translation failures do not shrink the output track
#[tokio::test]
async fn test_pipeline_withFlakyTranslator_shouldKeepTrackComplete() -> Result<()> {
    let recognizer = MockRecognizer::new(
        "en",
        vec![vec![
            MockRecognizer::segment(0.0, 2.0, "One"),
            MockRecognizer::segment(2.0, 4.0, "Two"),
            MockRecognizer::segment(4.0, 6.0, "Three"),
        ]],
    );
    let translator = MockTranslator::new(
        crate::common::mock_providers::MockTranslatorBehavior::FailOnCall(1),
    );

    let samples = common::make_samples(8.0);
    let transcriber = ChunkedTranscriber::new(&recognizer, 60);
    let (track, _) = transcriber.transcribe(&samples, None).await?;

    let router = TranslationRouter::new(&translator);
    let results = router.translate_track(&track, "en", &["de".to_string()], None).await;

    let german = &results["de"];
    assert_eq!(german.entries.len(), 3);
    // The failed segment fell back to its original text
    assert_eq!(german.entries[1].text, "Two");
    assert!(german.entries[0].text.contains("opus-mt-en-de"));
    Ok(())
}
