use chrono::Utc;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::errors::StoreError;
use crate::object_store::ObjectStore;
use crate::transcription::TranscriptionReport;

// @module: Per-run and cumulative processing statistics

/// Derived rates computed at flush time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DerivedStats {
    /// Percentage of processed files that succeeded
    pub success_rate: f64,
    /// Mean processing time per file in seconds
    pub average_processing_time: f64,
    /// Total media duration processed, in hours
    pub total_hours_processed: f64,
}

/// Host facts recorded once per run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemInfo {
    /// Operating system name
    pub os: String,
    /// CPU architecture
    pub arch: String,
}

/// Recognition model facts recorded once per run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Model name requested from the recognition server
    pub name: String,
    /// Provider identifier
    pub provider: String,
}

/// One job's outcome within a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobLogEntry {
    /// Store path of the processed file
    pub file: String,
    /// Wall-clock timestamp of completion
    pub timestamp: String,
    /// Whether the job succeeded
    pub success: bool,
    /// Elapsed processing time in seconds
    pub processing_time_seconds: f64,

    /// Media duration in seconds (successful jobs only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
    /// Number of audio windows processed (successful jobs only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunks_processed: Option<usize>,
    /// Media seconds transcribed per wall-clock second (successful jobs only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_speed: Option<f64>,
    /// Error text (failed jobs only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Accumulated log for one worker run, flushed to a dated path at shutdown
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunLog {
    /// Unique identifier of this run
    pub run_id: String,
    /// Run date, YYYY-MM-DD
    pub date: String,
    /// Host facts
    pub system_info: SystemInfo,
    /// Recognition model facts
    pub model_info: ModelInfo,
    /// Total files attempted
    pub files_processed: u64,
    /// Files that completed successfully
    pub successful: u64,
    /// Files that failed
    pub failed: u64,
    /// Total media duration processed, seconds
    pub total_duration_processed: f64,
    /// Total wall-clock processing time, seconds
    pub total_processing_time: f64,
    /// Ordered per-job entries
    pub processing_details: Vec<JobLogEntry>,
    /// Derived rates, computed at flush time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistics: Option<DerivedStats>,
}

/// Longer-lived totals merged across all historical runs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CumulativeStats {
    #[serde(default)]
    created_date: String,
    #[serde(default)]
    total_processed: u64,
    #[serde(default)]
    total_successful: u64,
    #[serde(default)]
    total_failed: u64,
    #[serde(default)]
    total_duration_processed: f64,
    #[serde(default)]
    total_processing_time: f64,
    #[serde(default)]
    last_update: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    cumulative_statistics: Option<DerivedStats>,
}

/// Accumulates observability data for one run and persists it at shutdown.
///
/// Never on the critical path of correctness: recording is in-memory, and
/// the cumulative half of `flush` swallows its own failures.
#[derive(Debug)]
pub struct RunStatistics {
    /// Metadata prefix under which logs and stats live
    metadata_prefix: String,
    /// The accumulating run log
    log: RunLog,
}

impl RunStatistics {
    /// Create statistics for a new run
    pub fn new(metadata_prefix: &str, model_name: &str) -> Self {
        let run_id = Uuid::new_v4().simple().to_string();
        RunStatistics {
            metadata_prefix: metadata_prefix.trim_end_matches('/').to_string(),
            log: RunLog {
                run_id,
                date: Utc::now().format("%Y-%m-%d").to_string(),
                system_info: SystemInfo {
                    os: std::env::consts::OS.to_string(),
                    arch: std::env::consts::ARCH.to_string(),
                },
                model_info: ModelInfo {
                    name: model_name.to_string(),
                    provider: "whisper-http".to_string(),
                },
                files_processed: 0,
                successful: 0,
                failed: 0,
                total_duration_processed: 0.0,
                total_processing_time: 0.0,
                processing_details: Vec::new(),
                statistics: None,
            },
        }
    }

    /// Record a successfully processed unit
    pub fn record_success(&mut self, unit: &str, elapsed_secs: f64, report: &TranscriptionReport) {
        self.log.processing_details.push(JobLogEntry {
            file: unit.to_string(),
            timestamp: Utc::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            success: true,
            processing_time_seconds: elapsed_secs,
            duration_seconds: Some(report.duration_seconds),
            chunks_processed: Some(report.chunks_processed),
            processing_speed: if elapsed_secs > 0.0 {
                Some(report.duration_seconds / elapsed_secs)
            } else {
                Some(0.0)
            },
            error: None,
        });
        self.log.successful += 1;
        self.log.total_duration_processed += report.duration_seconds;
        self.log.files_processed += 1;
        self.log.total_processing_time += elapsed_secs;
    }

    /// Record a failed unit with its error text
    pub fn record_failure(&mut self, unit: &str, elapsed_secs: f64, error: &str) {
        self.log.processing_details.push(JobLogEntry {
            file: unit.to_string(),
            timestamp: Utc::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            success: false,
            processing_time_seconds: elapsed_secs,
            duration_seconds: None,
            chunks_processed: None,
            processing_speed: None,
            error: Some(error.to_string()),
        });
        self.log.failed += 1;
        self.log.files_processed += 1;
        self.log.total_processing_time += elapsed_secs;
    }

    /// Files attempted so far
    pub fn files_processed(&self) -> u64 {
        self.log.files_processed
    }

    /// Files that succeeded so far
    pub fn successful(&self) -> u64 {
        self.log.successful
    }

    /// Store path the run log flushes to
    pub fn run_log_path(&self) -> String {
        format!(
            "{}/logs/{}_processing_log_{}.json",
            self.metadata_prefix, self.log.date, self.log.run_id
        )
    }

    /// Store path of the cumulative stats document
    pub fn cumulative_stats_path(&self) -> String {
        format!("{}/stats.json", self.metadata_prefix)
    }

    /// Persist the run log, then fold this run into the cumulative totals.
    ///
    /// The run log write is authoritative and its errors propagate. The
    /// cumulative update is best-effort: once the run log is durable, a
    /// failure there is logged and swallowed.
    pub async fn flush(&mut self, store: &dyn ObjectStore) -> Result<(), StoreError> {
        if self.log.files_processed > 0 {
            self.log.statistics = Some(DerivedStats {
                success_rate: (self.log.successful as f64 / self.log.files_processed as f64) * 100.0,
                average_processing_time: self.log.total_processing_time / self.log.files_processed as f64,
                total_hours_processed: self.log.total_duration_processed / 3600.0,
            });
        }

        let document = serde_json::to_value(&self.log).map_err(|e| StoreError::InvalidDocument {
            path: self.run_log_path(),
            message: e.to_string(),
        })?;
        store.write_json(&document, &self.run_log_path()).await?;
        info!("Run log written to {}", self.run_log_path());

        if let Err(e) = self.update_cumulative(store).await {
            warn!("Error updating cumulative stats: {}", e);
        }

        Ok(())
    }

    /// Read-modify-write the cumulative stats document.
    ///
    /// Unsynchronized: concurrent flushes can lose each other's update.
    /// Accepted for this low-cardinality observability document.
    async fn update_cumulative(&self, store: &dyn ObjectStore) -> Result<(), StoreError> {
        let path = self.cumulative_stats_path();
        let existing = store.read_json(&path).await.unwrap_or_default();

        let mut stats: CumulativeStats = serde_json::from_value(Value::Object(existing))
            .unwrap_or_else(|e| {
                warn!("Cumulative stats document unreadable, starting fresh: {}", e);
                CumulativeStats::default()
            });

        if stats.created_date.is_empty() {
            stats.created_date = self.log.date.clone();
        }
        stats.total_processed += self.log.files_processed;
        stats.total_successful += self.log.successful;
        stats.total_failed += self.log.failed;
        stats.total_duration_processed += self.log.total_duration_processed;
        stats.total_processing_time += self.log.total_processing_time;
        stats.last_update = Utc::now().format("%Y-%m-%d %H:%M:%S").to_string();

        if stats.total_processed > 0 {
            stats.cumulative_statistics = Some(DerivedStats {
                success_rate: (stats.total_successful as f64 / stats.total_processed as f64) * 100.0,
                average_processing_time: stats.total_processing_time / stats.total_processed as f64,
                total_hours_processed: stats.total_duration_processed / 3600.0,
            });
        }

        let document = serde_json::to_value(&stats).map_err(|e| StoreError::InvalidDocument {
            path: path.clone(),
            message: e.to_string(),
        })?;
        store.write_json(&document, &path).await
    }
}
