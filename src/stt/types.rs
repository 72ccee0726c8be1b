// src/stt/types.rs
// Transcription result and error definitions

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Transcription result from any speech path
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transcript {
    pub text: String,
    /// Language hint passed to or reported by the provider
    pub language: Option<String>,
    /// Audio duration in seconds
    pub duration_secs: f32,
    /// Provider name (e.g. "Whisper.cpp", "Server")
    pub provider: String,
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SttError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    TimeoutError,

    #[error("Invalid audio")]
    InvalidAudio,

    #[error("Empty transcript")]
    EmptyTranscript,

    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("No transcription path succeeded")]
    TranscriptionUnavailable,
}
