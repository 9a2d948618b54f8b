/*!
 * Error types for the vidscribe application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

// Allow dead code - error types are for library consumers
#![allow(dead_code)]

use thiserror::Error;

/// Errors that can occur when talking to the object store
#[derive(Error, Debug)]
pub enum StoreError {
    /// Object does not exist at the given path
    #[error("Object not found: {0}")]
    NotFound(String),

    /// A download completed but produced no usable file
    #[error("Download produced an empty or missing file: {0}")]
    EmptyDownload(String),

    /// A stored catalog/metadata document could not be interpreted
    #[error("Invalid stored document at {path}: {message}")]
    InvalidDocument {
        /// Store path of the document
        path: String,
        /// Parse failure detail
        message: String,
    },

    /// Underlying I/O failure
    #[error("Store I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for StoreError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

/// Errors that can occur when working with model server APIs
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),
}

/// Errors raised by one stage of the per-file processing pipeline.
///
/// A pipeline error aborts the file it belongs to, never the whole run.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Audio extraction from the source video failed
    #[error("Audio extraction failed: {0}")]
    Extraction(String),

    /// Speech recognition failed for one of the audio windows
    #[error("Transcription failed: {0}")]
    Transcription(String),

    /// A whole target language could not be produced
    #[error("Translation failed for target '{target}': {message}")]
    Translation {
        /// Requested target language code
        target: String,
        /// Failure detail
        message: String,
    },
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from the object store
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Error from a model provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from a pipeline stage
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
