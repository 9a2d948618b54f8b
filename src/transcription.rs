use anyhow::{Result, anyhow};
use indicatif::ProgressBar;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::media::SAMPLE_RATE;
use crate::providers::Recognizer;
use crate::subtitle_processor::{SubtitleEntry, SubtitleTrack};

// @module: Chunked transcription and timeline reassembly

/// Default window length sent to the recognizer, in seconds
pub const DEFAULT_WINDOW_SECONDS: u64 = 60;

/// Summary of one transcription run, recorded in job metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionReport {
    /// Language detected from the first window
    pub detected_language: String,
    /// Number of audio windows processed
    pub chunks_processed: usize,
    /// Window length in seconds
    pub chunk_size_seconds: u64,
    /// Total audio duration in seconds
    pub duration_seconds: f64,
}

/// Drives a bounded-window recognizer over arbitrarily long audio and
/// reassembles one coherent timeline.
///
/// The first window is transcribed with no language hint to detect the
/// language; every window (the first one re-run included) is then
/// transcribed with that language pinned so terminology stays consistent
/// across the whole track.
pub struct ChunkedTranscriber<'a> {
    /// External recognition capability
    recognizer: &'a dyn Recognizer,
    /// Window length in seconds
    window_seconds: u64,
}

impl<'a> ChunkedTranscriber<'a> {
    /// Create a transcriber with the given window length
    pub fn new(recognizer: &'a dyn Recognizer, window_seconds: u64) -> Self {
        ChunkedTranscriber {
            recognizer,
            window_seconds: window_seconds.max(1),
        }
    }

    /// Transcribe a full 16 kHz mono sample buffer into one subtitle track.
    ///
    /// Any recognizer failure aborts the whole merge - a partial track is
    /// never returned.
    pub async fn transcribe(
        &self,
        samples: &[f32],
        progress: Option<&ProgressBar>,
    ) -> Result<(SubtitleTrack, TranscriptionReport)> {
        if samples.is_empty() {
            return Err(anyhow!("Audio stream produced no samples"));
        }

        let window_len = (self.window_seconds as usize) * (SAMPLE_RATE as usize);
        let windows: Vec<&[f32]> = samples.chunks(window_len).collect();
        let total_windows = windows.len();
        info!(
            "Processing {} windows of {} seconds each",
            total_windows, self.window_seconds
        );

        // First window only: no hint, to obtain the language for the whole track
        let initial = self
            .recognizer
            .transcribe(windows[0], None)
            .await
            .map_err(|e| anyhow!("Language detection failed: {}", e))?;
        let detected_language = initial.language;
        info!("Detected language: {}", detected_language);

        let mut entries: Vec<SubtitleEntry> = Vec::new();
        let mut current_time = 0.0_f64;

        for window in &windows {
            let result = self
                .recognizer
                .transcribe(window, Some(&detected_language))
                .await
                .map_err(|e| anyhow!("Window transcription failed: {}", e))?;

            // Window-relative timestamps become absolute via the running offset
            for segment in result.segments {
                entries.push(SubtitleEntry::from_seconds(
                    0,
                    segment.start + current_time,
                    segment.end + current_time,
                    segment.text,
                ));
            }

            current_time += window.len() as f64 / SAMPLE_RATE as f64;
            if let Some(bar) = progress {
                bar.inc(1);
            }
        }

        // Drop segments with no text, then re-index the survivors 1..N.
        // Window order is chronological and within-window segments arrive
        // pre-ordered, so the merge never reorders.
        entries.retain(|entry| !entry.text.trim().is_empty());
        for (i, entry) in entries.iter_mut().enumerate() {
            entry.seq_num = i + 1;
            entry.text = entry.text.trim().to_string();
        }
        debug!("Merged {} segments across {} windows", entries.len(), total_windows);

        let report = TranscriptionReport {
            detected_language: detected_language.clone(),
            chunks_processed: total_windows,
            chunk_size_seconds: self.window_seconds,
            duration_seconds: samples.len() as f64 / SAMPLE_RATE as f64,
        };

        Ok((SubtitleTrack::with_entries(detected_language, entries), report))
    }
}
