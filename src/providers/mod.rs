/*!
 * Provider implementations for the external model services.
 *
 * This module contains client implementations for the two capabilities the
 * pipeline consumes as black boxes:
 * - Recognizer: speech-to-text over one window of audio samples
 * - Translator: sentence translation through a named model
 */

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::errors::ProviderError;

pub mod whisper_http;
pub mod opus_mt;

pub use opus_mt::OpusMtHttp;
pub use whisper_http::WhisperHttp;

/// One recognized segment with window-relative timestamps in seconds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSegment {
    /// Segment start, seconds from the window start
    pub start: f64,
    /// Segment end, seconds from the window start
    pub end: f64,
    /// Recognized text
    pub text: String,
}

/// Result of transcribing one audio window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcription {
    /// Language the recognizer detected (or was pinned to)
    pub language: String,
    /// Recognized segments, pre-ordered by the recognizer
    pub segments: Vec<RawSegment>,
}

/// Speech recognition capability
///
/// Implementations receive 16 kHz mono samples for a single window and
/// return window-local segments. Passing `None` as the hint asks the
/// recognizer to detect the language itself.
#[async_trait]
pub trait Recognizer: Send + Sync + Debug {
    /// Transcribe one window of audio samples
    async fn transcribe(
        &self,
        samples: &[f32],
        language_hint: Option<&str>,
    ) -> Result<Transcription, ProviderError>;

    /// Test the connection to the recognizer service
    async fn test_connection(&self) -> Result<(), ProviderError>;
}

/// Sentence translation capability
///
/// Models are addressed by their external name and loaded lazily on the
/// serving side; callers never deal with model lifecycle.
#[async_trait]
pub trait Translator: Send + Sync + Debug {
    /// Translate a single sentence through the named model
    async fn translate(&self, sentence: &str, model_name: &str) -> Result<String, ProviderError>;

    /// Test the connection to the translation service
    async fn test_connection(&self) -> Result<(), ProviderError>;
}
