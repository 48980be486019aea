// THEORY:
// Every fallible operation in the crate reports through one of two error enums.
// `AnalysisError` covers the local pipeline (loading, decoding, logging, config).
// `ProxyError` covers the optional remote generation services. The two are kept
// apart because they have different fates: analysis errors reach the caller,
// proxy errors are absorbed by the session and turned into a local fallback.

use std::time::Duration;
use thiserror::Error;

/// Errors raised by the local analysis flow.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// An operation needed a loaded image or a prior analysis and found none.
    #[error("Input missing: {0}")]
    InputMissing(&'static str),

    #[error("Image decode failed: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Image has no pixels ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    #[error("RGBA buffer has {actual} bytes, expected {expected}")]
    BufferSize { expected: usize, actual: usize },

    #[error("Malformed data URL: {0}")]
    DataUrl(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Errors raised while talking to the captioning/generation proxy.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("No proxy endpoint configured")]
    NotConfigured,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Remote error: {0}")]
    Remote(String),

    #[error("Timed out after {0:?} waiting for a queued result")]
    Timeout(Duration),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Generated image could not be decoded: {0}")]
    Decode(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
