// src/stt/whisper.rs
// whisper.cpp on-device transcription (preferred path when installed)

use super::{wav, SttError, Transcriber, Transcript};
use crate::audio::AudioClip;
use crate::config::TranscriptionConfig;
use async_trait::async_trait;
use std::{
    env,
    ffi::OsStr,
    fs,
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};
use tokio::process::Command;

pub struct WhisperTranscriber {
    bin_path: PathBuf,
    model_path: PathBuf,
    language: String,
}

impl WhisperTranscriber {
    /// `None` when the binary or the model cannot be found
    pub fn from_config(config: &TranscriptionConfig) -> Option<Self> {
        let bin_path = match config.whisper_bin.clone().or_else(default_whisper_bin) {
            Some(p) if p.exists() => p,
            Some(p) => {
                tracing::warn!("Whisper bin not found at {}", p.display());
                return None;
            }
            None => {
                tracing::debug!("Whisper bin not configured");
                return None;
            }
        };

        let model_path = match config.whisper_model.clone().or_else(default_whisper_model) {
            Some(p) if p.exists() => p,
            Some(p) => {
                tracing::warn!("Whisper model not found at {}", p.display());
                return None;
            }
            None => {
                tracing::warn!("Whisper model not configured. Set WHISPER_MODEL.");
                return None;
            }
        };

        tracing::info!(
            "Whisper transcriber available: bin={}, model={}",
            bin_path.display(),
            model_path.display()
        );

        Some(Self {
            bin_path,
            model_path,
            language: config.language.clone(),
        })
    }

    async fn run_whisper(&self, wav_path: &Path, out_base: &Path) -> Result<String, SttError> {
        let output = Command::new(&self.bin_path)
            .arg("--model")
            .arg(&self.model_path)
            .arg("--file")
            .arg(wav_path)
            .arg("--output-txt")
            .arg("--output-file")
            .arg(out_base)
            .arg("--language")
            .arg(&self.language)
            .output()
            .await
            .map_err(|e| SttError::ProviderError(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SttError::ProviderError(format!(
                "Whisper failed: {}",
                stderr.trim()
            )));
        }

        if let Ok(text) = fs::read_to_string(out_base.with_extension("txt")) {
            return Ok(text);
        }

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        if !stdout.trim().is_empty() {
            return Ok(stdout);
        }

        Err(SttError::EmptyTranscript)
    }
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    async fn transcribe(&self, clip: &AudioClip) -> Result<Transcript, SttError> {
        let wav_bytes = wav::to_wav_16k_mono(clip)?;

        let tmp_dir = env::temp_dir();
        let ts = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| SttError::ProviderError(e.to_string()))?
            .as_millis();
        let pid = std::process::id();

        let input_path = tmp_dir.join(format!("answer_input_{}_{}.wav", pid, ts));
        let output_base = tmp_dir.join(format!("answer_out_{}_{}", pid, ts));

        fs::write(&input_path, wav_bytes).map_err(|e| SttError::ProviderError(e.to_string()))?;

        let result = self.run_whisper(&input_path, &output_base).await;

        let _ = fs::remove_file(&input_path);
        let _ = fs::remove_file(output_base.with_extension("txt"));

        let text = super::clean_transcript(&result?);
        if text.is_empty() {
            return Err(SttError::EmptyTranscript);
        }

        Ok(Transcript {
            text,
            language: Some(self.language.clone()),
            duration_secs: clip.duration_secs(),
            provider: self.name().to_string(),
        })
    }

    fn name(&self) -> &str {
        "Whisper.cpp"
    }
}

fn default_whisper_bin() -> Option<PathBuf> {
    let candidates = [
        "bin/whisper-cli.exe",
        "bin/whisper-cli",
        "bin/main.exe",
        "bin/main",
    ];

    candidates.into_iter().map(PathBuf::from).find(|p| p.exists())
}

fn default_whisper_model() -> Option<PathBuf> {
    let candidates = [
        "models/ggml-base.en.bin",
        "models/ggml-base.bin",
        "models/ggml-small.en.bin",
        "models/ggml-small.bin",
    ];

    if let Some(found) = candidates.into_iter().map(PathBuf::from).find(|p| p.exists()) {
        return Some(found);
    }

    // any ggml-*.bin in models/
    let entries = fs::read_dir("models").ok()?;
    entries.flatten().map(|e| e.path()).find(|path| {
        path.extension() == Some(OsStr::new("bin"))
            && path
                .file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.starts_with("ggml-"))
                .unwrap_or(false)
    })
}
