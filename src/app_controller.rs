use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use futures::future::join_all;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{error, info, warn};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::app_config::Config;
use crate::errors::PipelineError;
use crate::job_coordinator::{ClaimRecord, JobCoordinator};
use crate::language_utils;
use crate::media;
use crate::media::SAMPLE_RATE;
use crate::object_store::{FsStore, ObjectStore};
use crate::providers::{OpusMtHttp, Recognizer, Translator, WhisperHttp};
use crate::stats::RunStatistics;
use crate::transcription::{ChunkedTranscriber, TranscriptionReport};
use crate::translation::TranslationRouter;

// @module: Worker loop orchestration

/// Counts reported when a run finishes
#[derive(Debug, Clone, Copy)]
pub struct RunSummary {
    /// Candidates visible under the input prefix at startup
    pub candidates: usize,
    /// Units this worker attempted
    pub processed: u64,
    /// Units that completed successfully
    pub succeeded: u64,
}

/// Everything a successful job hands back for finalization
struct JobSuccess {
    /// Label -> store path of each uploaded track
    output_paths: Map<String, Value>,
    /// Transcription summary
    report: TranscriptionReport,
    /// Input media size in bytes
    input_size: u64,
    /// Original-language SRT size in bytes
    output_size: u64,
}

impl JobSuccess {
    /// Build the terminal catalog metadata for this job
    fn into_detail(self) -> Map<String, Value> {
        let mut processing_results = serde_json::to_value(&self.report)
            .ok()
            .and_then(|v| v.as_object().cloned())
            .unwrap_or_default();
        processing_results.insert("input_size".to_string(), Value::from(self.input_size));
        processing_results.insert("output_size".to_string(), Value::from(self.output_size));

        let mut detail = Map::new();
        detail.insert(
            "processed_date".to_string(),
            Value::String(Utc::now().format("%Y-%m-%d").to_string()),
        );
        detail.insert("output_paths".to_string(), Value::Object(self.output_paths));
        detail.insert("success".to_string(), Value::Bool(true));
        detail.insert(
            "processing_results".to_string(),
            Value::Object(processing_results),
        );
        detail.insert(
            "detected_language".to_string(),
            Value::String(self.report.detected_language.clone()),
        );
        detail
    }
}

/// Main application controller for the batch transcription worker
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Shared object store
    store: Arc<dyn ObjectStore>,
    // @field: Speech recognition capability
    recognizer: Arc<dyn Recognizer>,
    // @field: Translation capability
    translator: Arc<dyn Translator>,
}

impl Controller {
    /// Create a controller with the bundled store and HTTP providers
    pub fn with_config(config: Config) -> Result<Self> {
        let store = FsStore::new(&config.store_root)
            .with_context(|| format!("Failed to open object store at {:?}", config.store_root))?;
        let recognizer = WhisperHttp::new(
            config.recognizer.endpoint.clone(),
            config.recognizer.model.clone(),
            config.recognizer.timeout_secs,
        )?;
        let translator = OpusMtHttp::new(
            config.translator.endpoint.clone(),
            config.translator.timeout_secs,
        )?;

        Ok(Self {
            config,
            store: Arc::new(store),
            recognizer: Arc::new(recognizer),
            translator: Arc::new(translator),
        })
    }

    /// Create a controller over explicit components
    pub fn with_components(
        config: Config,
        store: Arc<dyn ObjectStore>,
        recognizer: Arc<dyn Recognizer>,
        translator: Arc<dyn Translator>,
    ) -> Self {
        Self {
            config,
            store,
            recognizer,
            translator,
        }
    }

    /// Run the worker loop until no unclaimed work remains.
    ///
    /// Per-unit failures are recorded and counted, never fatal; errors from
    /// setup or the claim listing propagate and terminate the run.
    pub async fn run(&self) -> Result<RunSummary> {
        let coordinator = JobCoordinator::new(
            Arc::clone(&self.store),
            &self.config.metadata_prefix,
            self.config.lock_lease_secs,
        );
        let mut stats = RunStatistics::new(&self.config.metadata_prefix, &self.config.recognizer.model);

        let candidates = coordinator.list_candidates(&self.config.input_prefix).await?;
        let total = candidates.len();
        info!("Found {} videos to process", total);

        let multi_progress = MultiProgress::new();
        let overall = multi_progress.add(ProgressBar::new(total as u64));
        overall.set_style(
            ProgressStyle::with_template("Processing Files [{bar:30}] {pos}/{len}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );

        let loop_result = async {
            while let Some(unit) = coordinator.claim_next(&self.config.input_prefix).await? {
                info!("Processing video: {}", unit);
                let started = Instant::now();
                let outcome = self.process_unit(&unit, &multi_progress).await;
                let elapsed = started.elapsed().as_secs_f64();

                match outcome {
                    Ok(success) => {
                        stats.record_success(&unit, elapsed, &success.report);
                        let record = ClaimRecord::finished(true, success.into_detail());
                        coordinator.finalize(&unit, record).await?;
                        info!("Success: {}", unit);
                        overall.inc(1);
                    }
                    Err(e) => {
                        error!("Error processing {}: {:#}", unit, e);
                        stats.record_failure(&unit, elapsed, &format!("{:#}", e));

                        let mut detail = Map::new();
                        detail.insert(
                            "processed_date".to_string(),
                            Value::String(Utc::now().format("%Y-%m-%d").to_string()),
                        );
                        detail.insert("success".to_string(), Value::Bool(false));
                        detail.insert("error".to_string(), Value::String(format!("{:#}", e)));
                        if let Err(fe) = coordinator.finalize(&unit, ClaimRecord::finished(false, detail)).await {
                            warn!("Failed to record failure for {}: {}", unit, fe);
                        }
                    }
                }
            }
            Ok::<(), anyhow::Error>(())
        }
        .await;

        overall.finish_and_clear();

        // Flush what we have even when the loop broke early
        if let Err(e) = stats.flush(self.store.as_ref()).await {
            warn!("Failed to flush run statistics: {}", e);
        }

        loop_result?;

        Ok(RunSummary {
            candidates: total,
            processed: stats.files_processed(),
            succeeded: stats.successful(),
        })
    }

    /// Drive one work unit through the full pipeline.
    ///
    /// The scoped working directory is removed on every exit path when the
    /// guard drops, including failures in any stage.
    async fn process_unit(&self, unit: &str, multi_progress: &MultiProgress) -> Result<JobSuccess> {
        let temp_dir = tempfile::Builder::new()
            .prefix("vidscribe_")
            .tempdir()
            .context("Failed to create working directory")?;

        let file_name = unit.rsplit('/').next().unwrap_or(unit);
        let base_name = Path::new(file_name)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| file_name.to_string());

        // Download
        info!("Downloading: {}", unit);
        let local_video = temp_dir.path().join(file_name);
        self.store
            .download(unit, &local_video)
            .await
            .map_err(|e| anyhow!("Download error: {}", e))?;
        let media_info = media::probe_media(&local_video).await?;
        info!("Media duration: {:.2} seconds", media_info.duration_secs);

        // Extract audio
        info!("Extracting audio from video...");
        let audio_path = temp_dir.path().join("audio.pcm");
        media::extract_audio(&local_video, &audio_path)
            .await
            .map_err(|e| PipelineError::Extraction(e.to_string()))?;
        let samples = media::load_samples(&audio_path)?;

        // Transcribe
        info!("Starting transcription...");
        let window_len = (self.config.window_seconds as usize) * (SAMPLE_RATE as usize);
        let window_count = samples.len().div_ceil(window_len.max(1));
        let window_bar = multi_progress.add(ProgressBar::new(window_count as u64));
        window_bar.set_style(
            ProgressStyle::with_template("Transcribing [{bar:30}] {pos}/{len}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );

        let transcriber = ChunkedTranscriber::new(self.recognizer.as_ref(), self.config.window_seconds);
        let (track, report) = transcriber
            .transcribe(&samples, Some(&window_bar))
            .await
            .map_err(|e| PipelineError::Transcription(e.to_string()))?;
        window_bar.finish_and_clear();

        if let Ok(name) = language_utils::get_language_name(&track.language) {
            info!("Detected language: {} ({})", track.language, name);
        }

        // Write the original-language track
        let original_local = temp_dir
            .path()
            .join(format!("{}.{}.srt", base_name, track.language));
        track.write_to_srt(&original_local)?;
        let output_size = std::fs::metadata(&original_local).map(|m| m.len()).unwrap_or(0);

        // Translate
        info!("Translating transcriptions...");
        let router = TranslationRouter::new(self.translator.as_ref());
        let translated = router
            .translate_track(
                &track,
                &track.language,
                &self.config.target_languages,
                Some(multi_progress),
            )
            .await;

        // Stage every track for upload
        let remote_dir = format!(
            "{}{}/{}",
            self.config.output_prefix,
            Utc::now().format("%Y-%m-%d"),
            base_name
        );
        let mut uploads: Vec<(String, String, PathBuf)> = vec![(
            "original".to_string(),
            format!("{}/{}.{}.srt", remote_dir, base_name, track.language),
            original_local,
        )];
        for (lang, target_track) in &translated {
            let local = temp_dir.path().join(format!("{}.{}.srt", base_name, lang));
            target_track.write_to_srt(&local)?;
            uploads.push((
                lang.clone(),
                format!("{}/{}.{}.srt", remote_dir, base_name, lang),
                local,
            ));
        }

        // Upload all tracks
        let results = join_all(
            uploads
                .iter()
                .map(|(_, remote, local)| self.store.upload(local, remote)),
        )
        .await;
        for ((_, remote, _), result) in uploads.iter().zip(results) {
            result.map_err(|e| anyhow!("Upload error for {}: {}", remote, e))?;
            info!("Uploaded: {}", remote);
        }

        let mut output_paths = Map::new();
        for (label, remote, _) in uploads {
            output_paths.insert(label, Value::String(remote));
        }

        Ok(JobSuccess {
            output_paths,
            report,
            input_size: media_info.file_size,
            output_size,
        })
    }
}
