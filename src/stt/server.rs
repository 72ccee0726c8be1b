// src/stt/server.rs
// Backend speech-to-text endpoint (fallback path)

use super::{wav, SttError, Transcriber, Transcript};
use crate::api::paths;
use crate::audio::AudioClip;
use crate::auth::AuthContext;
use async_trait::async_trait;
use reqwest::multipart;
use serde::Deserialize;
use std::time::Duration;

const TIMEOUT_SECS: u64 = 30;
const MAX_DURATION_SECS: f32 = 300.0;

#[derive(Deserialize)]
#[serde(untagged)]
enum SpeechResponse {
    Transcript { transcript: String },
    Text { text: String },
}

pub struct ServerTranscriber {
    client: reqwest::Client,
    url: String,
    auth: AuthContext,
    language: String,
}

impl ServerTranscriber {
    pub fn new(base_url: &str, auth: AuthContext, language: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .build()
            .unwrap_or_default();

        Self {
            client,
            url: format!("{}{}", base_url.trim_end_matches('/'), paths::SPEECH_TO_TEXT),
            auth,
            language: language.to_string(),
        }
    }
}

#[async_trait]
impl Transcriber for ServerTranscriber {
    async fn transcribe(&self, clip: &AudioClip) -> Result<Transcript, SttError> {
        let duration_secs = clip.duration_secs();
        if duration_secs > MAX_DURATION_SECS {
            tracing::warn!(
                "Audio too long for server transcription: {:.1}s > {:.1}s",
                duration_secs,
                MAX_DURATION_SECS
            );
            return Err(SttError::InvalidAudio);
        }

        tracing::info!("Server STT: transcribing {:.1}s audio...", duration_secs);

        let wav_bytes = wav::to_wav_16k_mono(clip)?;
        let file_part = multipart::Part::bytes(wav_bytes)
            .file_name("answer.wav")
            .mime_str("audio/wav")
            .map_err(|e| SttError::ProviderError(e.to_string()))?;

        let form = multipart::Form::new()
            .text("language", self.language.clone())
            .part("audio", file_part);

        let mut request = self.client.post(&self.url).multipart(form);
        if let Some(token) = self.auth.bearer_token() {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                SttError::TimeoutError
            } else {
                SttError::NetworkError(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(SttError::ProviderError(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let body: SpeechResponse = response
            .json()
            .await
            .map_err(|e| SttError::ProviderError(e.to_string()))?;
        let raw = match body {
            SpeechResponse::Transcript { transcript } => transcript,
            SpeechResponse::Text { text } => text,
        };

        let cleaned = super::clean_transcript(&raw);
        if cleaned.is_empty() {
            return Err(SttError::EmptyTranscript);
        }

        Ok(Transcript {
            text: cleaned,
            language: Some(self.language.clone()),
            duration_secs,
            provider: self.name().to_string(),
        })
    }

    fn name(&self) -> &str {
        "Server"
    }
}
