//! Error types for Keyprint
//!
//! Only the boundary layers (JSON decoding, encoding, FFI, CLI) can fail. The
//! capture, feature and similarity stages are total and never return these.

use thiserror::Error;

/// Errors that can occur at the edges of the pipeline
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("Failed to parse interaction stream: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Encoding error: {0}")]
    EncodingError(String),

    #[error("Invalid enrolled profile: {0}")]
    InvalidProfile(String),
}
