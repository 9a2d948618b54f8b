/*!
 * Mock provider implementations for testing.
 *
 * This module provides scripted recognizer and translator doubles:
 * - `MockRecognizer` replays per-window segment scripts and records the
 *   language hints it was called with
 * - `MockTranslator` tags translated text with the model name so routing
 *   (including pivot hops) is visible in the output
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use vidscribe::errors::ProviderError;
use vidscribe::providers::{RawSegment, Recognizer, Transcription, Translator};

/// Scripted recognizer double
#[derive(Debug)]
pub struct MockRecognizer {
    /// Language reported for every window
    language: String,
    /// Segments returned per hinted window, in call order
    segments_per_window: Vec<Vec<RawSegment>>,
    /// Hinted call index that should fail, if any
    fail_on_window: Option<usize>,
    /// Counter of hinted calls
    hinted_calls: AtomicUsize,
    /// Every language hint received, detection call included
    pub hints: Mutex<Vec<Option<String>>>,
}

impl MockRecognizer {
    /// Recognizer that replays one segment script per window
    pub fn new(language: &str, segments_per_window: Vec<Vec<RawSegment>>) -> Self {
        Self {
            language: language.to_string(),
            segments_per_window,
            fail_on_window: None,
            hinted_calls: AtomicUsize::new(0),
            hints: Mutex::new(Vec::new()),
        }
    }

    /// Make the nth hinted window call fail (0-based)
    pub fn failing_on_window(mut self, window: usize) -> Self {
        self.fail_on_window = Some(window);
        self
    }

    /// Convenience: one segment at window-relative [start, end]
    pub fn segment(start: f64, end: f64, text: &str) -> RawSegment {
        RawSegment {
            start,
            end,
            text: text.to_string(),
        }
    }
}

#[async_trait]
impl Recognizer for MockRecognizer {
    async fn transcribe(
        &self,
        _samples: &[f32],
        language_hint: Option<&str>,
    ) -> Result<Transcription, ProviderError> {
        self.hints.lock().push(language_hint.map(|s| s.to_string()));

        // Detection pass: report the language from the first window's content
        if language_hint.is_none() {
            return Ok(Transcription {
                language: self.language.clone(),
                segments: self.segments_per_window.first().cloned().unwrap_or_default(),
            });
        }

        let index = self.hinted_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_on_window == Some(index) {
            return Err(ProviderError::RequestFailed(format!(
                "scripted failure on window {}",
                index
            )));
        }

        Ok(Transcription {
            language: self.language.clone(),
            segments: self.segments_per_window.get(index).cloned().unwrap_or_default(),
        })
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        Ok(())
    }
}

/// Behavior mode for the mock translator
#[derive(Debug, Clone, PartialEq)]
pub enum MockTranslatorBehavior {
    /// Always succeeds, tagging output with the model name
    Working,
    /// Fails the nth translate call (0-based), succeeds otherwise
    FailOnCall(usize),
    /// Fails every call through the named model
    FailModel(String),
    /// Always fails
    Failing,
}

/// Scripted translator double
#[derive(Debug)]
pub struct MockTranslator {
    /// Behavior mode
    behavior: MockTranslatorBehavior,
    /// Counter of translate calls
    call_count: AtomicUsize,
    /// Every (sentence, model) pair received
    pub calls: Mutex<Vec<(String, String)>>,
}

impl MockTranslator {
    /// Create a mock translator with the specified behavior
    pub fn new(behavior: MockTranslatorBehavior) -> Self {
        Self {
            behavior,
            call_count: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Create a working mock translator that always succeeds
    pub fn working() -> Self {
        Self::new(MockTranslatorBehavior::Working)
    }

    /// Model names seen so far, in call order
    pub fn models_called(&self) -> Vec<String> {
        self.calls.lock().iter().map(|(_, model)| model.clone()).collect()
    }
}

#[async_trait]
impl Translator for MockTranslator {
    async fn translate(&self, sentence: &str, model_name: &str) -> Result<String, ProviderError> {
        self.calls
            .lock()
            .push((sentence.to_string(), model_name.to_string()));
        let index = self.call_count.fetch_add(1, Ordering::SeqCst);

        match &self.behavior {
            MockTranslatorBehavior::Working => {}
            MockTranslatorBehavior::FailOnCall(n) if *n == index => {
                return Err(ProviderError::RequestFailed(format!(
                    "scripted failure on call {}",
                    index
                )));
            }
            MockTranslatorBehavior::FailOnCall(_) => {}
            MockTranslatorBehavior::FailModel(model) if model == model_name => {
                return Err(ProviderError::ApiError {
                    status_code: 500,
                    message: format!("model unavailable: {}", model_name),
                });
            }
            MockTranslatorBehavior::FailModel(_) => {}
            MockTranslatorBehavior::Failing => {
                return Err(ProviderError::ConnectionError("scripted outage".to_string()));
            }
        }

        Ok(format!("[{}] {}", model_name, sentence))
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        Ok(())
    }
}
