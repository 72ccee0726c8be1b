// src/stt/mod.rs
// Speech-to-text for voice answers: on-device capability first, server fallback

mod server;
mod types;
pub mod wav;
mod whisper;

pub use server::ServerTranscriber;
pub use types::{SttError, Transcript};
pub use whisper::WhisperTranscriber;

use crate::audio::AudioClip;
use crate::config::TranscriptionConfig;
use async_trait::async_trait;
use regex::Regex;
use std::sync::{Arc, OnceLock};

pub const UNAVAILABLE_PLACEHOLDER: &str =
    "Voice transcription not available. Please type your answer.";

#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, clip: &AudioClip) -> Result<Transcript, SttError>;

    fn name(&self) -> &str;
}

/// Result of probing for an on-device speech capability. Probed once when a
/// voice-capture session begins and kept for that session.
#[derive(Clone)]
pub enum SpeechCapability {
    Available(Arc<dyn Transcriber>),
    Unavailable,
}

impl SpeechCapability {
    pub fn probe(config: &TranscriptionConfig) -> Self {
        match WhisperTranscriber::from_config(config) {
            Some(whisper) => SpeechCapability::Available(Arc::new(whisper)),
            None => SpeechCapability::Unavailable,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, SpeechCapability::Available(_))
    }
}

impl std::fmt::Debug for SpeechCapability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpeechCapability::Available(t) => write!(f, "Available({})", t.name()),
            SpeechCapability::Unavailable => write!(f, "Unavailable"),
        }
    }
}

/// Probe function used by the answer capture; swapped out in tests
pub type CapabilityProbe = Arc<dyn Fn() -> SpeechCapability + Send + Sync>;

pub fn config_probe(config: TranscriptionConfig) -> CapabilityProbe {
    Arc::new(move || SpeechCapability::probe(&config))
}

/// Tries the local capability, then the server. Never retries a path.
pub async fn transcribe_with_fallback(
    local: &SpeechCapability,
    server: Option<&Arc<dyn Transcriber>>,
    clip: &AudioClip,
) -> Result<Transcript, SttError> {
    if clip.is_empty() {
        return Err(SttError::InvalidAudio);
    }

    // 1. On-device
    if let SpeechCapability::Available(transcriber) = local {
        match transcriber.transcribe(clip).await {
            Ok(transcript) => {
                tracing::info!(
                    "{} STT success: {} chars",
                    transcriber.name(),
                    transcript.text.len()
                );
                return Ok(transcript);
            }
            Err(e) => {
                tracing::warn!("{} STT failed: {:?}, trying server...", transcriber.name(), e);
            }
        }
    }

    // 2. Server
    if let Some(transcriber) = server {
        match transcriber.transcribe(clip).await {
            Ok(transcript) => {
                tracing::info!(
                    "{} STT success: {} chars",
                    transcriber.name(),
                    transcript.text.len()
                );
                return Ok(transcript);
            }
            Err(e) => {
                tracing::error!("{} STT failed: {:?}", transcriber.name(), e);
            }
        }
    }

    Err(SttError::TranscriptionUnavailable)
}

/// Drop timestamp markers like `[00:01.000 --> 00:03.000]` and collapse whitespace
pub fn clean_transcript(text: &str) -> String {
    static TS_RE: OnceLock<Regex> = OnceLock::new();
    let re = TS_RE.get_or_init(|| {
        Regex::new(r"\[\d{2}:\d{2}.*?\]|\(\d{2}:\d{2}\)").expect("valid timestamp regex")
    });
    let stripped = re.replace_all(text, "");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}


#[cfg(test)]
mod tests {
    use super::testing::FixedTranscriber;
    use super::*;

    fn clip() -> AudioClip {
        let mut clip = AudioClip::new(16_000, 1);
        clip.append(&[10; 1600]);
        clip
    }

    #[tokio::test]
    async fn local_capability_wins_when_it_succeeds() {
        let local = FixedTranscriber::ok("local", "from device");
        let server = FixedTranscriber::ok("server", "from server");
        let server_dyn: Arc<dyn Transcriber> = server.clone();

        let transcript = transcribe_with_fallback(
            &SpeechCapability::Available(local.clone()),
            Some(&server_dyn),
            &clip(),
        )
        .await
        .unwrap();

        assert_eq!(transcript.text, "from device");
        assert_eq!(server.call_count(), 0);
    }

    #[tokio::test]
    async fn server_is_used_when_local_fails_or_is_missing() {
        let server = FixedTranscriber::ok("server", "from server");
        let server_dyn: Arc<dyn Transcriber> = server.clone();

        let failing_local = FixedTranscriber::failing("local");
        let transcript = transcribe_with_fallback(
            &SpeechCapability::Available(failing_local.clone()),
            Some(&server_dyn),
            &clip(),
        )
        .await
        .unwrap();
        assert_eq!(transcript.provider, "server");
        assert_eq!(failing_local.call_count(), 1);

        let transcript =
            transcribe_with_fallback(&SpeechCapability::Unavailable, Some(&server_dyn), &clip())
                .await
                .unwrap();
        assert_eq!(transcript.text, "from server");
        assert_eq!(server.call_count(), 2);
    }

    #[tokio::test]
    async fn no_path_means_unavailable() {
        let result = transcribe_with_fallback(&SpeechCapability::Unavailable, None, &clip()).await;
        assert_eq!(result.unwrap_err(), SttError::TranscriptionUnavailable);

        let server: Arc<dyn Transcriber> = FixedTranscriber::failing("server");
        let result =
            transcribe_with_fallback(&SpeechCapability::Unavailable, Some(&server), &clip()).await;
        assert_eq!(result.unwrap_err(), SttError::TranscriptionUnavailable);
    }

    #[test]
    fn cleans_timestamps_and_whitespace() {
        let raw = "[00:00.000 --> 00:02.000]  A closure   captures\n(00:03) its scope.";
        assert_eq!(clean_transcript(raw), "A closure captures its scope.");
    }
}
