use async_trait::async_trait;
use log::{debug, info};
use parking_lot::Mutex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use url::Url;

use crate::errors::ProviderError;
use crate::providers::Translator;

/// Client for an opus-mt style translation server.
///
/// Models are addressed by their external name (e.g.
/// `Helsinki-NLP/opus-mt-en-he`) and loaded lazily: the first request
/// naming a model asks the server to load it, and the name is remembered
/// for the rest of the process so the load round-trip happens once.
#[derive(Debug)]
pub struct OpusMtHttp {
    /// Base URL of the translation service
    base_url: String,
    /// HTTP client for making requests
    client: Client,
    /// Model names already loaded on the serving side
    loaded_models: Mutex<HashSet<String>>,
}

/// Load request for the translation server
#[derive(Debug, Serialize)]
struct LoadRequest<'a> {
    model: &'a str,
}

/// Translation request for the translation server
#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    model: &'a str,
    text: &'a str,
}

/// Translation response from the translation server
#[derive(Debug, Deserialize)]
struct TranslateResponse {
    translation: String,
}

impl OpusMtHttp {
    /// Create a new client for the given endpoint
    pub fn new(endpoint: impl Into<String>, timeout_secs: u64) -> Result<Self, ProviderError> {
        let endpoint = endpoint.into();

        let parsed = Url::parse(&endpoint)
            .map_err(|e| ProviderError::ConnectionError(format!("Invalid translator endpoint '{}': {}", endpoint, e)))?;

        Ok(Self {
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_default(),
            loaded_models: Mutex::new(HashSet::new()),
        })
    }

    /// Ask the server to load a model, once per model name per process
    async fn ensure_model_loaded(&self, model_name: &str) -> Result<(), ProviderError> {
        if self.loaded_models.lock().contains(model_name) {
            return Ok(());
        }

        info!("Loading translation model: {}", model_name);
        let url = format!("{}/v1/models/load", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&LoadRequest { model: model_name })
            .send()
            .await
            .map_err(|e| ProviderError::ConnectionError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError {
                status_code: status.as_u16(),
                message: format!("failed to load model {}: {}", model_name, message),
            });
        }

        self.loaded_models.lock().insert(model_name.to_string());
        debug!("Model loaded: {}", model_name);
        Ok(())
    }
}

#[async_trait]
impl Translator for OpusMtHttp {
    async fn translate(&self, sentence: &str, model_name: &str) -> Result<String, ProviderError> {
        self.ensure_model_loaded(model_name).await?;

        let url = format!("{}/v1/translate", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&TranslateRequest {
                model: model_name,
                text: sentence,
            })
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
            return Err(ProviderError::ApiError {
                status_code: status.as_u16(),
                message,
            });
        }

        let parsed: TranslateResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        Ok(parsed.translation)
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
                message: "translator health check failed".to_string(),
            })
        }
    }
}
