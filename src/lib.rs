/*!
 * # vidscribe - Batch Video Transcription Worker
 *
 * A Rust library for coordinated batch transcription of video files stored
 * in a shared object store, with multilingual subtitle generation.
 *
 * ## Features
 *
 * - Claim-based work distribution across cooperating workers sharing one
 *   object store (optimistic locking, no direct communication channel)
 * - Chunked speech recognition over fixed-length audio windows with
 *   automatic language detection
 * - Subtitle translation into multiple target languages, with pivot
 *   routing through English when no direct model exists
 * - SRT parsing and serialization
 * - Per-run and cumulative processing statistics
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `object_store`: Object store abstraction and the directory-rooted backend
 * - `job_coordinator`: Work-unit claiming over the shared catalog
 * - `subtitle_processor`: Subtitle parsing, serialization and manipulation
 * - `transcription`: Chunked transcription and timeline reassembly
 * - `translation`: Translation path resolution and segment routing
 * - `stats`: Per-run and cumulative statistics
 * - `media`: ffmpeg/ffprobe wrappers for audio extraction
 * - `providers`: Clients for the external model services:
 *   - `providers::whisper_http`: Speech recognition client
 *   - `providers::opus_mt`: Translation client
 * - `app_controller`: Main worker loop
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod errors;
pub mod job_coordinator;
pub mod language_utils;
pub mod media;
pub mod object_store;
pub mod providers;
pub mod stats;
pub mod subtitle_processor;
pub mod transcription;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::{Controller, RunSummary};
pub use errors::{AppError, PipelineError, ProviderError, StoreError};
pub use job_coordinator::{ClaimRecord, ClaimStatus, JobCoordinator};
pub use object_store::{CreateOutcome, FsStore, ObjectStore};
pub use stats::RunStatistics;
pub use subtitle_processor::{SubtitleEntry, SubtitleTrack};
pub use transcription::{ChunkedTranscriber, TranscriptionReport};
pub use translation::{TranslationPath, TranslationRouter, resolve_path};
