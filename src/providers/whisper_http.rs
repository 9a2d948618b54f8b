use async_trait::async_trait;
use log::error;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::errors::ProviderError;
use crate::providers::{RawSegment, Recognizer, Transcription};

/// Client for a whisper-style speech recognition server.
///
/// The server accepts raw little-endian f32 PCM (16 kHz mono) on its
/// transcribe endpoint and returns the detected language plus
/// window-relative segments.
#[derive(Debug)]
pub struct WhisperHttp {
    /// Base URL of the recognition service
    base_url: String,
    /// Model name requested from the server
    model: String,
    /// HTTP client for making requests
    client: Client,
}

/// Transcription response from the recognition server
#[derive(Debug, Serialize, Deserialize)]
struct TranscribeResponse {
    /// Detected or pinned language code
    language: String,
    /// Recognized segments with window-relative timestamps
    #[serde(default)]
    segments: Vec<WireSegment>,
}

/// One segment on the wire
#[derive(Debug, Serialize, Deserialize)]
struct WireSegment {
    start: f64,
    end: f64,
    text: String,
}

impl WhisperHttp {
    /// Create a new client for the given endpoint and model
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>, timeout_secs: u64) -> Result<Self, ProviderError> {
        let endpoint = endpoint.into();

        // Validate the endpoint up front - a bad URL should fail setup, not the first job
        let parsed = Url::parse(&endpoint)
            .map_err(|e| ProviderError::ConnectionError(format!("Invalid recognizer endpoint '{}': {}", endpoint, e)))?;

        Ok(Self {
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
            model: model.into(),
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_default(),
        })
    }

    /// Model name this client requests
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Encode samples as little-endian f32 bytes for the request body
    fn encode_samples(samples: &[f32]) -> Vec<u8> {
        let mut body = Vec::with_capacity(samples.len() * 4);
        for sample in samples {
            body.extend_from_slice(&sample.to_le_bytes());
        }
        body
    }
}

#[async_trait]
impl Recognizer for WhisperHttp {
    async fn transcribe(
        &self,
        samples: &[f32],
        language_hint: Option<&str>,
    ) -> Result<Transcription, ProviderError> {
        let url = format!("{}/v1/transcribe", self.base_url);

        let mut request = self
            .client
            .post(&url)
            .query(&[("model", self.model.as_str())])
            .header("content-type", "application/octet-stream")
            .body(Self::encode_samples(samples));

        if let Some(language) = language_hint {
            request = request.query(&[("language", language)]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    ProviderError::ConnectionError(e.to_string())
                } else {
                    ProviderError::RequestFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            error!("Recognition server returned {}: {}", status, message);
            return Err(ProviderError::ApiError {
                status_code: status.as_u16(),
                message,
            });
        }

        let parsed: TranscribeResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        Ok(Transcription {
            language: parsed.language,
            segments: parsed
                .segments
                .into_iter()
                .map(|s| RawSegment {
                    start: s.start,
                    end: s.end,
                    text: s.text,
                })
                .collect(),
        })
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        let url = format!("{}/health", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ProviderError::ConnectionError(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(ProviderError::ApiError {
                status_code: response.status().as_u16(),
                message: "recognizer health check failed".to_string(),
            })
        }
    }
}
