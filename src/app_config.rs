use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::language_utils;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Root of the shared object store
    #[serde(default = "default_store_root")]
    pub store_root: PathBuf,

    /// Prefix holding input media objects
    #[serde(default = "default_input_prefix")]
    pub input_prefix: String,

    /// Prefix receiving output subtitle tracks
    #[serde(default = "default_output_prefix")]
    pub output_prefix: String,

    /// Prefix holding the claim catalog, lock and statistics
    #[serde(default = "default_metadata_prefix")]
    pub metadata_prefix: String,

    /// Target language codes to translate each transcript into
    #[serde(default = "default_target_languages")]
    pub target_languages: Vec<String>,

    /// Audio window length sent to the recognizer, seconds
    #[serde(default = "default_window_seconds")]
    pub window_seconds: u64,

    /// Catalog lock lease duration, seconds
    #[serde(default = "default_lock_lease_secs")]
    pub lock_lease_secs: i64,

    /// Recognition service config
    #[serde(default)]
    pub recognizer: RecognizerConfig,

    /// Translation service config
    #[serde(default)]
    pub translator: TranslatorConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Recognition service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RecognizerConfig {
    /// Service endpoint URL
    #[serde(default = "default_recognizer_endpoint")]
    pub endpoint: String,

    /// Model name (e.g. "whisper-large-v3-turbo")
    #[serde(default = "default_recognizer_model")]
    pub model: String,

    /// Request timeout in seconds
    #[serde(default = "default_recognizer_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            endpoint: default_recognizer_endpoint(),
            model: default_recognizer_model(),
            timeout_secs: default_recognizer_timeout_secs(),
        }
    }
}

/// Translation service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslatorConfig {
    /// Service endpoint URL
    #[serde(default = "default_translator_endpoint")]
    pub endpoint: String,

    /// Request timeout in seconds
    #[serde(default = "default_translator_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            endpoint: default_translator_endpoint(),
            timeout_secs: default_translator_timeout_secs(),
        }
    }
}

/// Log level configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Error level
    Error,
    /// Warning level
    Warn,
    /// Info level
    #[default]
    Info,
    /// Debug level
    Debug,
    /// Trace level
    Trace,
}

fn default_store_root() -> PathBuf {
    PathBuf::from("store")
}

fn default_input_prefix() -> String {
    "transcription_workplace/input_directory/".to_string()
}

fn default_output_prefix() -> String {
    "transcription_workplace/output_directory/".to_string()
}

fn default_metadata_prefix() -> String {
    "transcription_workplace/metadata_directory/".to_string()
}

fn default_target_languages() -> Vec<String> {
    vec!["en".to_string(), "he".to_string()]
}

fn default_window_seconds() -> u64 {
    60
}

fn default_lock_lease_secs() -> i64 {
    120
}

fn default_recognizer_endpoint() -> String {
    "http://localhost:9000".to_string()
}

fn default_recognizer_model() -> String {
    "whisper-large-v3-turbo".to_string()
}

fn default_recognizer_timeout_secs() -> u64 {
    300
}

fn default_translator_endpoint() -> String {
    "http://localhost:9001".to_string()
}

fn default_translator_timeout_secs() -> u64 {
    120
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_root: default_store_root(),
            input_prefix: default_input_prefix(),
            output_prefix: default_output_prefix(),
            metadata_prefix: default_metadata_prefix(),
            target_languages: default_target_languages(),
            window_seconds: default_window_seconds(),
            lock_lease_secs: default_lock_lease_secs(),
            recognizer: RecognizerConfig::default(),
            translator: TranslatorConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;
        let reader = BufReader::new(file);
        let config: Config = serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Write this configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.input_prefix.is_empty() || self.output_prefix.is_empty() || self.metadata_prefix.is_empty() {
            return Err(anyhow!("Store prefixes must not be empty"));
        }

        if self.window_seconds == 0 {
            return Err(anyhow!("window_seconds must be at least 1"));
        }

        if self.target_languages.is_empty() {
            return Err(anyhow!("At least one target language is required"));
        }

        for code in &self.target_languages {
            language_utils::validate_language_code(code)
                .with_context(|| format!("Invalid target language code: {}", code))?;
        }

        Ok(())
    }
}
